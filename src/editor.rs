//! Editor session: the single owner of the document and its history.
//!
//! Every mutation builds a fresh `Document` and swaps it in, so consumers
//! can rely on reference identity for change detection and undo/redo works
//! on whole snapshots. Operations are synchronous and atomic with respect
//! to the caller's event loop; nothing here is interleaved mid-patch.

use std::collections::{HashMap, HashSet};

use log::debug;
use thiserror::Error;

use crate::models::{Document, ElementKind, Style, SvgElement, Transform, Tspan};
use crate::parser::{generate_id, ParseOptions};
use crate::transform_utils::{compose_transform_strings, parse_transform, transform_attr};
use crate::validation::{validate_svg, ValidationError, ValidationReport};

/// Undo history is bounded; the oldest snapshot is dropped beyond this.
pub const HISTORY_LIMIT: usize = 100;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum EditError {
    #[error("no element with id {0:?}")]
    UnknownId(String),
    #[error("{0:?} is not a group")]
    NotAGroup(String),
    #[error("{0:?} is not a text element")]
    NotText(String),
    #[error("elements {0:?} do not share a parent")]
    NotSiblings(Vec<String>),
    #[error("nothing selected to group")]
    EmptySelection,
    #[error("import rejected: {0}")]
    ImportRejected(ValidationError),
}

/// Where to move an element within its sibling list.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ZOrder {
    Front,
    Back,
    Forward,
    Backward,
}

pub struct EditorSession {
    document: Document,
    undo: Vec<Document>,
    redo: Vec<Document>,
    selected: Vec<String>,
    gesture_snapshot: Option<Document>,
    parse_options: ParseOptions,
}

impl EditorSession {
    pub fn new(document: Document) -> Self {
        EditorSession {
            document,
            undo: Vec::new(),
            redo: Vec::new(),
            selected: Vec::new(),
            gesture_snapshot: None,
            parse_options: ParseOptions::default(),
        }
    }

    pub fn with_parse_options(mut self, options: ParseOptions) -> Self {
        self.parse_options = options;
        self
    }

    pub fn document(&self) -> &Document {
        &self.document
    }

    pub fn selected_ids(&self) -> &[String] {
        &self.selected
    }

    pub fn can_undo(&self) -> bool {
        !self.undo.is_empty()
    }

    pub fn can_redo(&self) -> bool {
        !self.redo.is_empty()
    }

    /// Swap in the next document state. Inside a gesture the history is not
    /// touched; the pre-gesture snapshot is committed once at gesture end.
    fn commit(&mut self, next: Document) {
        if self.gesture_snapshot.is_some() {
            self.document = next;
            return;
        }
        self.undo.push(std::mem::replace(&mut self.document, next));
        if self.undo.len() > HISTORY_LIMIT {
            self.undo.remove(0);
        }
        self.redo.clear();
    }

    // ---- selection ----

    pub fn select(&mut self, ids: Vec<String>) {
        self.selected = ids
            .into_iter()
            .filter(|id| self.document.contains(id))
            .collect();
    }

    pub fn clear_selection(&mut self) {
        self.selected.clear();
    }

    // ---- gestures (drag / resize previews) ----

    /// Snapshot the document before a pointer gesture. Mutations made until
    /// `end_gesture` or `cancel_gesture` do not create history entries.
    pub fn begin_gesture(&mut self) {
        if self.gesture_snapshot.is_none() {
            self.gesture_snapshot = Some(self.document.clone());
        }
    }

    /// Pointer-up: fold the whole gesture into one undo step.
    pub fn end_gesture(&mut self) {
        if let Some(snapshot) = self.gesture_snapshot.take() {
            if snapshot != self.document {
                self.undo.push(snapshot);
                if self.undo.len() > HISTORY_LIMIT {
                    self.undo.remove(0);
                }
                self.redo.clear();
            }
        }
    }

    /// Escape: revert to the pre-gesture document.
    pub fn cancel_gesture(&mut self) {
        if let Some(snapshot) = self.gesture_snapshot.take() {
            self.document = snapshot;
        }
    }

    // ---- history ----

    pub fn undo(&mut self) -> bool {
        match self.undo.pop() {
            Some(previous) => {
                self.redo.push(std::mem::replace(&mut self.document, previous));
                self.retain_live_selection();
                true
            }
            None => false,
        }
    }

    pub fn redo(&mut self) -> bool {
        match self.redo.pop() {
            Some(next) => {
                self.undo.push(std::mem::replace(&mut self.document, next));
                self.retain_live_selection();
                true
            }
            None => false,
        }
    }

    fn retain_live_selection(&mut self) {
        let doc = &self.document;
        self.selected.retain(|id| doc.contains(id));
    }

    // ---- mutations ----

    pub fn translate_by(&mut self, ids: &[String], dx: f64, dy: f64) -> Result<(), EditError> {
        let mut doc = self.document.clone();
        for id in ids {
            let element = find_mut(&mut doc.elements, id)
                .ok_or_else(|| EditError::UnknownId(id.clone()))?;
            if element.locked {
                debug!("translate skipped for locked element {id:?}");
                continue;
            }
            offset_element(element, dx, dy);
        }
        self.commit(doc);
        Ok(())
    }

    pub fn resize(&mut self, id: &str, width: f64, height: f64) -> Result<(), EditError> {
        let mut doc = self.document.clone();
        let element =
            find_mut(&mut doc.elements, id).ok_or_else(|| EditError::UnknownId(id.to_string()))?;
        if element.locked {
            debug!("resize skipped for locked element {id:?}");
            return Ok(());
        }
        match &mut element.kind {
            ElementKind::Rect { width: w, height: h, .. }
            | ElementKind::Image { width: w, height: h, .. } => {
                *w = width.max(0.0);
                *h = height.max(0.0);
            }
            ElementKind::Circle { r, .. } => {
                *r = (width.min(height) / 2.0).max(0.0);
            }
            ElementKind::Ellipse { rx, ry, .. } => {
                *rx = (width / 2.0).max(0.0);
                *ry = (height / 2.0).max(0.0);
            }
            ElementKind::Line { x1, y1, x2, y2, .. } => {
                *x2 = *x1 + width;
                *y2 = *y1 + height;
            }
            ElementKind::Use { width: w, height: h, .. } => {
                *w = Some(width.max(0.0));
                *h = Some(height.max(0.0));
            }
            ElementKind::Path { .. } | ElementKind::Text { .. } | ElementKind::Group { .. } => {
                debug!("resize has no geometric meaning for {:?}, ignored", element.kind.tag_name());
                return Ok(());
            }
        }
        self.commit(doc);
        Ok(())
    }

    /// Apply the `Some` fields of `patch` to every addressed element.
    pub fn restyle(&mut self, ids: &[String], patch: &Style) -> Result<(), EditError> {
        let mut doc = self.document.clone();
        for id in ids {
            let element = find_mut(&mut doc.elements, id)
                .ok_or_else(|| EditError::UnknownId(id.clone()))?;
            if element.locked {
                debug!("restyle skipped for locked element {id:?}");
                continue;
            }
            apply_style_patch(&mut element.style, patch);
        }
        self.commit(doc);
        Ok(())
    }

    pub fn set_visible(&mut self, id: &str, visible: bool) -> Result<(), EditError> {
        let mut doc = self.document.clone();
        let element =
            find_mut(&mut doc.elements, id).ok_or_else(|| EditError::UnknownId(id.to_string()))?;
        element.visible = visible;
        self.commit(doc);
        Ok(())
    }

    pub fn set_locked(&mut self, id: &str, locked: bool) -> Result<(), EditError> {
        let mut doc = self.document.clone();
        let element =
            find_mut(&mut doc.elements, id).ok_or_else(|| EditError::UnknownId(id.to_string()))?;
        element.locked = locked;
        self.commit(doc);
        Ok(())
    }

    pub fn set_text(&mut self, id: &str, new_text: &str) -> Result<(), EditError> {
        let mut doc = self.document.clone();
        let element =
            find_mut(&mut doc.elements, id).ok_or_else(|| EditError::UnknownId(id.to_string()))?;
        match &mut element.kind {
            ElementKind::Text { text, tspans, .. } => {
                text.clear();
                text.push_str(new_text);
                tspans.clear();
            }
            _ => return Err(EditError::NotText(id.to_string())),
        }
        self.commit(doc);
        Ok(())
    }

    pub fn set_tspans(&mut self, id: &str, new_tspans: Vec<Tspan>) -> Result<(), EditError> {
        let mut doc = self.document.clone();
        let element =
            find_mut(&mut doc.elements, id).ok_or_else(|| EditError::UnknownId(id.to_string()))?;
        match &mut element.kind {
            ElementKind::Text { tspans, .. } => *tspans = new_tspans,
            _ => return Err(EditError::NotText(id.to_string())),
        }
        self.commit(doc);
        Ok(())
    }

    /// Copy elements with fresh ids throughout their subtrees. Connector
    /// refs are rewritten only when their target lives inside the same
    /// duplicated subtree; refs out of the copy keep pointing at the
    /// originals. Returns the new root ids.
    pub fn duplicate(&mut self, ids: &[String]) -> Result<Vec<String>, EditError> {
        let mut doc = self.document.clone();
        let mut taken: HashSet<String> = doc.all_ids().into_iter().collect();
        let mut new_ids = Vec::with_capacity(ids.len());
        for id in ids {
            let mut copy = doc
                .find(id)
                .ok_or_else(|| EditError::UnknownId(id.clone()))?
                .clone();
            let mut id_map = HashMap::new();
            assign_fresh_ids(&mut copy, &mut id_map, &mut taken);
            rewrite_refs(&mut copy, &id_map);
            offset_element(&mut copy, 12.0, 12.0);
            new_ids.push(copy.id.clone());
            doc.elements.push(copy);
        }
        self.commit(doc);
        Ok(new_ids)
    }

    /// Delete elements and, for groups, their whole subtree. References to
    /// deleted ids from surviving lines are left dangling on purpose; the
    /// renderer tolerates them.
    pub fn delete(&mut self, ids: &[String]) -> Result<(), EditError> {
        let mut doc = self.document.clone();
        for id in ids {
            match doc.find(id) {
                Some(element) if element.locked => {
                    // A locked element is not deletable; it stays exactly
                    // where it is, position and parent included.
                    debug!("delete skipped for locked element {id:?}");
                }
                Some(_) => {
                    remove_element(&mut doc.elements, id);
                }
                None => return Err(EditError::UnknownId(id.clone())),
            }
        }
        self.selected.retain(|id| !ids.contains(id));
        self.commit(doc);
        Ok(())
    }

    pub fn reorder(&mut self, id: &str, order: ZOrder) -> Result<(), EditError> {
        let mut doc = self.document.clone();
        let siblings = sibling_list_of(&mut doc.elements, id)
            .ok_or_else(|| EditError::UnknownId(id.to_string()))?;
        let index = siblings
            .iter()
            .position(|el| el.id == id)
            .ok_or_else(|| EditError::UnknownId(id.to_string()))?;
        let last = siblings.len() - 1;
        let target = match order {
            ZOrder::Front => last,
            ZOrder::Back => 0,
            ZOrder::Forward => (index + 1).min(last),
            ZOrder::Backward => index.saturating_sub(1),
        };
        if target != index {
            let element = siblings.remove(index);
            siblings.insert(target, element);
            self.commit(doc);
        }
        Ok(())
    }

    /// Wrap root-level siblings into a new group at the position of the
    /// backmost member, preserving their relative paint order. Returns the
    /// group id.
    pub fn group(&mut self, ids: &[String]) -> Result<String, EditError> {
        if ids.is_empty() {
            return Err(EditError::EmptySelection);
        }
        let mut doc = self.document.clone();
        let mut group_id = generate_id();
        while doc.contains(&group_id) {
            group_id = generate_id();
        }
        let positions: Vec<usize> = doc
            .elements
            .iter()
            .enumerate()
            .filter(|(_, el)| ids.contains(&el.id))
            .map(|(i, _)| i)
            .collect();
        if positions.len() != ids.len() {
            return Err(EditError::NotSiblings(ids.to_vec()));
        }
        let insert_at = positions[0];
        let mut children = Vec::with_capacity(positions.len());
        for index in positions.into_iter().rev() {
            children.push(doc.elements.remove(index));
        }
        children.reverse();
        doc.elements.insert(
            insert_at,
            SvgElement::new(group_id.clone(), ElementKind::Group { children }),
        );
        self.selected = vec![group_id.clone()];
        self.commit(doc);
        Ok(group_id)
    }

    /// Splice a group's children back into its place in paint order. The
    /// group's transform and inheritable style are pushed down so the
    /// rendered output does not change.
    pub fn ungroup(&mut self, id: &str) -> Result<Vec<String>, EditError> {
        let mut doc = self.document.clone();
        let siblings = sibling_list_of(&mut doc.elements, id)
            .ok_or_else(|| EditError::UnknownId(id.to_string()))?;
        let index = siblings
            .iter()
            .position(|el| el.id == id)
            .ok_or_else(|| EditError::UnknownId(id.to_string()))?;
        let group = siblings.remove(index);
        let (group_style, group_transform, children) = match group.kind {
            ElementKind::Group { children } => (group.style, group.transform, children),
            _ => {
                // Not a group: put it back untouched.
                siblings.insert(index, group);
                return Err(EditError::NotAGroup(id.to_string()));
            }
        };
        let group_attr = group_transform.as_ref().and_then(transform_attr);
        let mut child_ids = Vec::with_capacity(children.len());
        for (offset, mut child) in children.into_iter().enumerate() {
            child.style.inherit_from(&group_style);
            let child_attr = child.transform.as_ref().and_then(transform_attr);
            child.transform =
                compose_transform_strings(group_attr.as_deref(), child_attr.as_deref())
                    .as_deref()
                    .and_then(parse_transform);
            child_ids.push(child.id.clone());
            siblings.insert(index + offset, child);
        }
        self.selected = child_ids.clone();
        self.commit(doc);
        Ok(child_ids)
    }

    /// Add a new element on top of the paint order.
    pub fn add_element(&mut self, element: SvgElement) -> String {
        let mut doc = self.document.clone();
        let mut element = element;
        while element.id.is_empty() || doc.contains(&element.id) {
            element.id = generate_id();
        }
        let id = element.id.clone();
        doc.elements.push(element);
        self.commit(doc);
        id
    }

    pub fn clear(&mut self) {
        let empty = Document::new(self.document.width, self.document.height);
        self.selected.clear();
        self.commit(empty);
    }

    /// Replace the document from imported markup. Validation and parsing
    /// run first; any failure leaves the current document untouched.
    pub fn import(&mut self, markup: &str) -> Result<ValidationReport, EditError> {
        let report = validate_svg(markup, None);
        if !report.valid {
            let error = report.error.unwrap_or(ValidationError::Unparseable);
            return Err(EditError::ImportRejected(error));
        }
        let doc = Document::from_markup(markup, self.parse_options)
            .ok_or(EditError::ImportRejected(ValidationError::Unparseable))?;
        self.selected.clear();
        self.commit(doc);
        Ok(report)
    }
}

// ---- tree helpers ----

fn find_mut<'a>(elements: &'a mut Vec<SvgElement>, id: &str) -> Option<&'a mut SvgElement> {
    for element in elements.iter_mut() {
        if element.id == id {
            return Some(element);
        }
        if let Some(children) = element.children_mut() {
            if let Some(found) = find_mut(children, id) {
                return Some(found);
            }
        }
    }
    None
}

fn remove_element(elements: &mut Vec<SvgElement>, id: &str) -> Option<SvgElement> {
    if let Some(index) = elements.iter().position(|el| el.id == id) {
        return Some(elements.remove(index));
    }
    for element in elements.iter_mut() {
        if let Some(children) = element.children_mut() {
            if let Some(removed) = remove_element(children, id) {
                return Some(removed);
            }
        }
    }
    None
}

fn sibling_list_of<'a>(
    elements: &'a mut Vec<SvgElement>,
    id: &str,
) -> Option<&'a mut Vec<SvgElement>> {
    if elements.iter().any(|el| el.id == id) {
        return Some(elements);
    }
    for element in elements.iter_mut() {
        if let Some(children) = element.children_mut() {
            if let Some(found) = sibling_list_of(children, id) {
                return Some(found);
            }
        }
    }
    None
}

/// Move an element by adjusting its kind geometry; kinds without editable
/// coordinates (path, group) move through their transform record instead.
fn offset_element(element: &mut SvgElement, dx: f64, dy: f64) {
    match &mut element.kind {
        ElementKind::Rect { x, y, .. }
        | ElementKind::Text { x, y, .. }
        | ElementKind::Image { x, y, .. } => {
            *x += dx;
            *y += dy;
        }
        ElementKind::Circle { cx, cy, .. } | ElementKind::Ellipse { cx, cy, .. } => {
            *cx += dx;
            *cy += dy;
        }
        ElementKind::Line { x1, y1, x2, y2, .. } => {
            *x1 += dx;
            *y1 += dy;
            *x2 += dx;
            *y2 += dy;
        }
        ElementKind::Use { x, y, .. } => {
            *x = Some(x.unwrap_or(0.0) + dx);
            *y = Some(y.unwrap_or(0.0) + dy);
        }
        ElementKind::Path { .. } | ElementKind::Group { .. } => {
            let transform = element.transform.get_or_insert_with(Transform::default);
            transform.x = Some(transform.x.unwrap_or(0.0) + dx);
            transform.y = Some(transform.y.unwrap_or(0.0) + dy);
        }
    }
}

fn apply_style_patch(style: &mut Style, patch: &Style) {
    macro_rules! patch_field {
        ($field:ident) => {
            if patch.$field.is_some() {
                style.$field = patch.$field.clone();
            }
        };
    }
    patch_field!(fill);
    patch_field!(stroke);
    patch_field!(stroke_width);
    patch_field!(stroke_dasharray);
    patch_field!(stroke_linecap);
    patch_field!(stroke_linejoin);
    patch_field!(marker_start);
    patch_field!(marker_end);
    patch_field!(opacity);
    patch_field!(filter);
    patch_field!(class_name);
    patch_field!(font_size);
    patch_field!(font_weight);
    patch_field!(font_family);
    patch_field!(text_anchor);
    patch_field!(dominant_baseline);
}

/// `taken` holds every id already live in the document plus the ones handed
/// out so far, so generated ids stay unique rather than just improbable.
fn assign_fresh_ids(
    element: &mut SvgElement,
    id_map: &mut HashMap<String, String>,
    taken: &mut HashSet<String>,
) {
    let mut fresh = generate_id();
    while !taken.insert(fresh.clone()) {
        fresh = generate_id();
    }
    id_map.insert(element.id.clone(), fresh.clone());
    element.id = fresh;
    if let Some(children) = element.children_mut() {
        for child in children {
            assign_fresh_ids(child, id_map, taken);
        }
    }
}

fn rewrite_refs(element: &mut SvgElement, id_map: &HashMap<String, String>) {
    if let ElementKind::Line { start_ref, end_ref, .. } = &mut element.kind {
        if let Some(target) = start_ref.as_ref().and_then(|id| id_map.get(id)) {
            *start_ref = Some(target.clone());
        }
        if let Some(target) = end_ref.as_ref().and_then(|id| id_map.get(id)) {
            *end_ref = Some(target.clone());
        }
    }
    if let Some(children) = element.children_mut() {
        for child in children {
            rewrite_refs(child, id_map);
        }
    }
}
