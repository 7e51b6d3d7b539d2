//! Editor-view rendering: export-shaped markup decorated with interaction
//! state. The host canvas styles the emitted class tokens (`selected`,
//! `hovered`) and wires pointer events; this module only owns the data
//! contract.
//!
//! Hidden elements are emitted dimmed rather than dropped so the layers
//! panel and the canvas agree on what exists. Dangling connector refs are
//! fine by construction: a line always renders at its literal coordinates.

use std::collections::HashSet;
use std::fmt::Write as _;

use crate::exporter::element_markup;
use crate::models::{Document, ElementKind, SvgElement};

#[derive(Debug, Clone, Default)]
pub struct RenderState {
    pub selected_ids: HashSet<String>,
    pub hovered_id: Option<String>,
}

impl RenderState {
    pub fn with_selection<I: IntoIterator<Item = String>>(ids: I) -> Self {
        RenderState {
            selected_ids: ids.into_iter().collect(),
            hovered_id: None,
        }
    }

    fn class_tokens(&self, element: &SvgElement) -> String {
        let mut tokens = vec!["cursor-default"];
        if self.selected_ids.contains(&element.id) {
            tokens.push("selected");
        }
        if self.hovered_id.as_deref() == Some(element.id.as_str()) {
            tokens.push("hovered");
        }
        if element.locked {
            tokens.push("locked");
        }
        tokens.join(" ")
    }
}

/// Stroke width of the invisible twin that makes thin lines clickable.
const LINE_HIT_STROKE: f64 = 12.0;

fn decorate(element: &SvgElement, state: &RenderState) -> SvgElement {
    let mut decorated = element.clone();
    let tokens = state.class_tokens(element);
    decorated.style.class_name = Some(match &element.style.class_name {
        Some(existing) => format!("{existing} {tokens}"),
        None => tokens,
    });
    if let ElementKind::Group { children } = &element.kind {
        decorated.kind = ElementKind::Group {
            children: children.iter().map(|child| decorate(child, state)).collect(),
        };
    }
    decorated
}

fn render_element(out: &mut String, element: &SvgElement, state: &RenderState, indent: usize) {
    let dimmed = !element.visible;
    let pad = "  ".repeat(indent);
    let body_indent = if dimmed { indent + 1 } else { indent };

    if dimmed {
        let _ = writeln!(out, "{pad}<g opacity=\"0.3\">");
    }

    if let ElementKind::Line { x1, y1, x2, y2, .. } = &element.kind {
        // Fat transparent twin first, so the visible line paints on top.
        let _ = writeln!(
            out,
            "{}<line x1=\"{x1}\" y1=\"{y1}\" x2=\"{x2}\" y2=\"{y2}\" stroke=\"transparent\" stroke-width=\"{LINE_HIT_STROKE}\" class=\"cursor-pointer\" data-hit-for=\"{}\"/>",
            "  ".repeat(body_indent),
            element.id,
        );
    }

    out.push_str(&element_markup(&decorate(element, state), body_indent));
    out.push('\n');

    if dimmed {
        let _ = writeln!(out, "{pad}</g>");
    }
}

/// Render the document for the editor canvas.
pub fn render_scene(document: &Document, state: &RenderState) -> String {
    let mut out = String::new();
    let _ = writeln!(
        out,
        "<svg width=\"{w}\" height=\"{h}\" viewBox=\"0 0 {w} {h}\" xmlns=\"http://www.w3.org/2000/svg\" xmlns:xlink=\"http://www.w3.org/1999/xlink\">",
        w = document.width,
        h = document.height,
    );
    if let Some(defs) = &document.defs_markup {
        let _ = writeln!(out, "  {defs}");
    }
    for element in &document.elements {
        render_element(&mut out, element, state, 1);
    }
    out.push_str("</svg>");
    out
}
