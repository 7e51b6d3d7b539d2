use serde::{Deserialize, Serialize};

/// Normalized decomposition of a `transform` attribute.
///
/// Fields are optional so that serialization can distinguish "never set"
/// from an explicit value; `rotation_cx`/`rotation_cy` are only meaningful
/// together with `rotation`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Transform {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub x: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub y: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub scale_x: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub scale_y: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rotation: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rotation_cx: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rotation_cy: Option<f64>,
}

impl Transform {
    pub fn is_empty(&self) -> bool {
        *self == Transform::default()
    }
}

/// Style attributes shared across element kinds.
///
/// `None` means "unset, inheritable" and must never be conflated with an
/// explicit value: `fill: Some("none")` is a deliberate no-fill and wins
/// over any inherited fill.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Style {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fill: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stroke: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stroke_width: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stroke_dasharray: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stroke_linecap: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stroke_linejoin: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub marker_start: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub marker_end: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub opacity: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub filter: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub class_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub font_size: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub font_weight: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub font_family: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub text_anchor: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dominant_baseline: Option<String>,
}

impl Style {
    /// Fill unset inheritable fields from an ancestor style. An explicit
    /// value on `self` (including `"none"`) always wins.
    pub fn inherit_from(&mut self, parent: &Style) {
        if self.fill.is_none() {
            self.fill = parent.fill.clone();
        }
        if self.stroke.is_none() {
            self.stroke = parent.stroke.clone();
        }
        if self.stroke_width.is_none() {
            self.stroke_width = parent.stroke_width;
        }
        if self.font_size.is_none() {
            self.font_size = parent.font_size;
        }
        if self.font_weight.is_none() {
            self.font_weight = parent.font_weight.clone();
        }
        if self.font_family.is_none() {
            self.font_family = parent.font_family.clone();
        }
        if self.text_anchor.is_none() {
            self.text_anchor = parent.text_anchor.clone();
        }
        if self.dominant_baseline.is_none() {
            self.dominant_baseline = parent.dominant_baseline.clone();
        }
    }
}

/// One independently styled span of a text element.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Tspan {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub x: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub y: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dx: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dy: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub font_size: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub font_weight: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub font_family: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fill: Option<String>,
    pub text: String,
}

/// Kind-specific geometry, tagged by element type.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum ElementKind {
    Rect {
        x: f64,
        y: f64,
        width: f64,
        height: f64,
        #[serde(skip_serializing_if = "Option::is_none")]
        rx: Option<f64>,
        #[serde(skip_serializing_if = "Option::is_none")]
        ry: Option<f64>,
    },
    Circle {
        cx: f64,
        cy: f64,
        r: f64,
    },
    Ellipse {
        cx: f64,
        cy: f64,
        rx: f64,
        ry: f64,
    },
    Line {
        x1: f64,
        y1: f64,
        x2: f64,
        y2: f64,
        /// Soft link to the element id this line starts at. Diagram
        /// connector metadata, never an ownership edge; may dangle.
        #[serde(skip_serializing_if = "Option::is_none")]
        start_ref: Option<String>,
        #[serde(skip_serializing_if = "Option::is_none")]
        end_ref: Option<String>,
    },
    Path {
        d: String,
    },
    Text {
        x: f64,
        y: f64,
        text: String,
        #[serde(default, skip_serializing_if = "Vec::is_empty")]
        tspans: Vec<Tspan>,
    },
    Image {
        x: f64,
        y: f64,
        width: f64,
        height: f64,
        href: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        preserve_aspect_ratio: Option<String>,
    },
    Use {
        href: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        x: Option<f64>,
        #[serde(skip_serializing_if = "Option::is_none")]
        y: Option<f64>,
        #[serde(skip_serializing_if = "Option::is_none")]
        width: Option<f64>,
        #[serde(skip_serializing_if = "Option::is_none")]
        height: Option<f64>,
    },
    #[serde(rename = "g")]
    Group {
        children: Vec<SvgElement>,
    },
}

impl ElementKind {
    pub fn tag_name(&self) -> &'static str {
        match self {
            ElementKind::Rect { .. } => "rect",
            ElementKind::Circle { .. } => "circle",
            ElementKind::Ellipse { .. } => "ellipse",
            ElementKind::Line { .. } => "line",
            ElementKind::Path { .. } => "path",
            ElementKind::Text { .. } => "text",
            ElementKind::Image { .. } => "image",
            ElementKind::Use { .. } => "use",
            ElementKind::Group { .. } => "g",
        }
    }
}

fn default_visible() -> bool {
    true
}

/// One node of the scene graph.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SvgElement {
    pub id: String,
    #[serde(flatten)]
    pub kind: ElementKind,
    #[serde(flatten)]
    pub style: Style,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub transform: Option<Transform>,
    #[serde(default = "default_visible")]
    pub visible: bool,
    #[serde(default)]
    pub locked: bool,
}

impl SvgElement {
    pub fn new(id: impl Into<String>, kind: ElementKind) -> Self {
        SvgElement {
            id: id.into(),
            kind,
            style: Style::default(),
            transform: None,
            visible: true,
            locked: false,
        }
    }

    pub fn children(&self) -> &[SvgElement] {
        match &self.kind {
            ElementKind::Group { children } => children,
            _ => &[],
        }
    }

    pub fn children_mut(&mut self) -> Option<&mut Vec<SvgElement>> {
        match &mut self.kind {
            ElementKind::Group { children } => Some(children),
            _ => None,
        }
    }

    /// Depth-first count of this node and everything it owns.
    pub fn subtree_len(&self) -> usize {
        1 + self.children().iter().map(SvgElement::subtree_len).sum::<usize>()
    }
}

/// The editable document: canvas size plus root elements in paint order
/// (back to front). `defs_markup` carries non-visual resource subtrees
/// (`<defs>`, `<marker>`, ...) verbatim so `url(#...)` references survive
/// the round trip without entering the element tree.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Document {
    pub width: f64,
    pub height: f64,
    pub elements: Vec<SvgElement>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub defs_markup: Option<String>,
}

impl Default for Document {
    fn default() -> Self {
        Document {
            width: 800.0,
            height: 600.0,
            elements: Vec::new(),
            defs_markup: None,
        }
    }
}

impl Document {
    pub fn new(width: f64, height: f64) -> Self {
        Document {
            width,
            height,
            ..Document::default()
        }
    }

    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }

    /// Total element count including nested group children.
    pub fn len(&self) -> usize {
        self.elements.iter().map(SvgElement::subtree_len).sum()
    }

    pub fn find(&self, id: &str) -> Option<&SvgElement> {
        fn walk<'a>(elements: &'a [SvgElement], id: &str) -> Option<&'a SvgElement> {
            for el in elements {
                if el.id == id {
                    return Some(el);
                }
                if let Some(found) = walk(el.children(), id) {
                    return Some(found);
                }
            }
            None
        }
        walk(&self.elements, id)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.find(id).is_some()
    }

    /// All ids in the document in paint order, groups before their children.
    pub fn all_ids(&self) -> Vec<String> {
        fn walk(elements: &[SvgElement], out: &mut Vec<String>) {
            for el in elements {
                out.push(el.id.clone());
                walk(el.children(), out);
            }
        }
        let mut out = Vec::new();
        walk(&self.elements, &mut out);
        out
    }
}
