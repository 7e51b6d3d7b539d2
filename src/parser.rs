//! SVG markup to scene graph.
//!
//! The walker is depth-first pre-order, so element order in the result is
//! document order, which is paint order. An inherited transform string and
//! an inherited style are threaded down the recursion, never up.

use std::collections::HashSet;

use log::debug;
use roxmltree::Node;
use uuid::Uuid;

use crate::models::{Document, ElementKind, Style, SvgElement, Tspan};
use crate::transform_utils::{compose_transform_strings, parse_transform};

/// Container tags consumed as side-channel resources, never as elements.
/// Their subtrees are captured verbatim into `defs_markup`.
pub const NON_VISUAL_TAGS: &[&str] = &[
    "defs", "symbol", "marker", "pattern", "mask", "clippath", "style", "script", "title",
    "desc", "metadata",
];

#[derive(Debug, Clone, Copy, Default)]
pub struct ParseOptions {
    /// When set, `g` nodes contribute no element of their own: children are
    /// lifted to the parent level with the group's transform and inheritable
    /// style baked in (the reference-parser behavior). The default preserves
    /// groups as first-class nodes and leaves inheritance to render time.
    pub flatten_groups: bool,
}

/// Result of one parse pass. `valid: false` means no `<svg>` root was found
/// and the element list is empty; it is a hard precondition failure, not a
/// partial result.
#[derive(Debug, Clone, Default)]
pub struct ParsedSvg {
    pub elements: Vec<SvgElement>,
    pub valid: bool,
    pub defs_markup: Option<String>,
    pub width: Option<f64>,
    pub height: Option<f64>,
}

/// Generated element ids are short, like the original nanoid-based ones.
pub fn generate_id() -> String {
    let id = Uuid::new_v4().simple().to_string();
    id[..8].to_string()
}

/// Tolerant numeric attribute parsing: accepts plain numbers and values with
/// a trailing unit ("12px", "50%"). Missing or unparsable values fall back.
fn parse_number(value: Option<&str>, fallback: f64) -> f64 {
    parse_optional_number(value).unwrap_or(fallback)
}

/// `None` here means "not set, inheritable" and is distinct from an explicit
/// zero, which callers of [`parse_number`] get via the fallback.
fn parse_optional_number(value: Option<&str>) -> Option<f64> {
    let value = value?.trim();
    if value.is_empty() {
        return None;
    }
    if let Ok(parsed) = value.parse::<f64>() {
        return parsed.is_finite().then_some(parsed);
    }
    // Strip a unit suffix, e.g. "1200px".
    let numeric: String = value
        .chars()
        .take_while(|c| c.is_ascii_digit() || *c == '.' || *c == '-' || *c == '+')
        .collect();
    numeric.parse::<f64>().ok().filter(|v| v.is_finite())
}

fn attr_string(node: Node, name: &str) -> Option<String> {
    node.attribute(name)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

fn extract_style(node: Node) -> Style {
    Style {
        fill: attr_string(node, "fill"),
        stroke: attr_string(node, "stroke"),
        stroke_width: parse_optional_number(node.attribute("stroke-width")),
        stroke_dasharray: attr_string(node, "stroke-dasharray"),
        stroke_linecap: attr_string(node, "stroke-linecap"),
        stroke_linejoin: attr_string(node, "stroke-linejoin"),
        marker_start: attr_string(node, "marker-start"),
        marker_end: attr_string(node, "marker-end"),
        opacity: parse_optional_number(node.attribute("opacity")),
        filter: attr_string(node, "filter"),
        class_name: attr_string(node, "class"),
        font_size: parse_optional_number(node.attribute("font-size")),
        font_weight: attr_string(node, "font-weight"),
        font_family: attr_string(node, "font-family"),
        text_anchor: attr_string(node, "text-anchor"),
        dominant_baseline: attr_string(node, "dominant-baseline"),
    }
}

fn extract_tspans(node: Node) -> Vec<Tspan> {
    node.children()
        .filter(|c| c.is_element() && c.tag_name().name().eq_ignore_ascii_case("tspan"))
        .map(|tspan| Tspan {
            x: parse_optional_number(tspan.attribute("x")),
            y: parse_optional_number(tspan.attribute("y")),
            dx: parse_optional_number(tspan.attribute("dx")),
            dy: parse_optional_number(tspan.attribute("dy")),
            font_size: parse_optional_number(tspan.attribute("font-size")),
            font_weight: attr_string(tspan, "font-weight"),
            font_family: attr_string(tspan, "font-family"),
            fill: attr_string(tspan, "fill"),
            text: text_content(tspan),
        })
        .collect()
}

fn text_content(node: Node) -> String {
    let mut out = String::new();
    for descendant in node.descendants() {
        if descendant.is_text() {
            if let Some(text) = descendant.text() {
                out.push_str(text);
            }
        }
    }
    out.trim().to_string()
}

/// Map one markup node to a typed element, or `None` for unrecognized tags.
/// The walker still recurses into an unrecognized node's children, so a
/// wrapping unknown element never hides recognized descendants.
fn extract_element(node: Node, transform_str: Option<&str>) -> Option<SvgElement> {
    let tag = node.tag_name().name().to_ascii_lowercase();

    let kind = match tag.as_str() {
        "rect" => ElementKind::Rect {
            x: parse_number(node.attribute("x"), 0.0),
            y: parse_number(node.attribute("y"), 0.0),
            width: parse_number(node.attribute("width"), 0.0),
            height: parse_number(node.attribute("height"), 0.0),
            rx: parse_optional_number(node.attribute("rx")),
            ry: parse_optional_number(node.attribute("ry")),
        },
        "circle" => ElementKind::Circle {
            cx: parse_number(node.attribute("cx"), 0.0),
            cy: parse_number(node.attribute("cy"), 0.0),
            r: parse_number(node.attribute("r"), 0.0),
        },
        "ellipse" => ElementKind::Ellipse {
            cx: parse_number(node.attribute("cx"), 0.0),
            cy: parse_number(node.attribute("cy"), 0.0),
            rx: parse_number(node.attribute("rx"), 0.0),
            ry: parse_number(node.attribute("ry"), 0.0),
        },
        "line" => ElementKind::Line {
            x1: parse_number(node.attribute("x1"), 0.0),
            y1: parse_number(node.attribute("y1"), 0.0),
            x2: parse_number(node.attribute("x2"), 0.0),
            y2: parse_number(node.attribute("y2"), 0.0),
            start_ref: attr_string(node, "data-start-ref"),
            end_ref: attr_string(node, "data-end-ref"),
        },
        "path" => ElementKind::Path {
            d: node.attribute("d").unwrap_or_default().to_string(),
        },
        "text" => {
            let tspans = extract_tspans(node);
            let text = if tspans.is_empty() {
                text_content(node)
            } else {
                String::new()
            };
            ElementKind::Text {
                x: parse_number(node.attribute("x"), 0.0),
                y: parse_number(node.attribute("y"), 0.0),
                text,
                tspans,
            }
        }
        "image" => ElementKind::Image {
            x: parse_number(node.attribute("x"), 0.0),
            y: parse_number(node.attribute("y"), 0.0),
            width: parse_number(node.attribute("width"), 0.0),
            height: parse_number(node.attribute("height"), 0.0),
            href: node
                .attribute("href")
                .or_else(|| node.attribute(("http://www.w3.org/1999/xlink", "href")))
                .unwrap_or_default()
                .to_string(),
            preserve_aspect_ratio: attr_string(node, "preserveAspectRatio"),
        },
        "use" => ElementKind::Use {
            href: node
                .attribute("href")
                .or_else(|| node.attribute(("http://www.w3.org/1999/xlink", "href")))
                .unwrap_or_default()
                .to_string(),
            x: parse_optional_number(node.attribute("x")),
            y: parse_optional_number(node.attribute("y")),
            width: parse_optional_number(node.attribute("width")),
            height: parse_optional_number(node.attribute("height")),
        },
        _ => return None,
    };

    Some(SvgElement {
        id: node.attribute("id").map(str::to_string).unwrap_or_else(generate_id),
        kind,
        style: extract_style(node),
        transform: transform_str.and_then(parse_transform),
        visible: node.attribute("data-visible") != Some("false"),
        locked: node.attribute("data-locked") == Some("true"),
    })
}

struct Walker<'a> {
    markup: &'a str,
    options: ParseOptions,
    seen_ids: HashSet<String>,
    defs: String,
}

impl<'a> Walker<'a> {
    fn claim_id(&mut self, mut id: String) -> String {
        while !self.seen_ids.insert(id.clone()) {
            debug!("duplicate id {id:?} in source markup, regenerating");
            id = generate_id();
        }
        id
    }

    fn walk(
        &mut self,
        parent: Node<'_, 'a>,
        inherited_transform: Option<&str>,
        inherited_style: &Style,
        out: &mut Vec<SvgElement>,
    ) {
        for node in parent.children().filter(|n| n.is_element()) {
            let tag = node.tag_name().name().to_ascii_lowercase();

            if NON_VISUAL_TAGS.contains(&tag.as_str()) {
                // Retain the raw subtree so url(#...) references keep
                // resolving; never walk it for elements.
                self.defs.push_str(&self.markup[node.range()]);
                self.defs.push('\n');
                continue;
            }

            let own_transform = node.attribute("transform");
            let combined =
                compose_transform_strings(inherited_transform, own_transform);

            if tag == "g" {
                let mut group_style = extract_style(node);
                group_style.inherit_from(inherited_style);

                if self.options.flatten_groups {
                    // Reference behavior: the group contributes no node,
                    // children receive the composed transform and style.
                    self.walk(node, combined.as_deref(), &group_style, out);
                } else {
                    let mut children = Vec::new();
                    // The preserved group carries the transform composed down
                    // to this point (including any inherited from unrecognized
                    // wrappers), so the children start from a clean accumulator.
                    self.walk(node, None, &Style::default(), &mut children);
                    let id = self.claim_id(
                        node.attribute("id").map(str::to_string).unwrap_or_else(generate_id),
                    );
                    out.push(SvgElement {
                        id,
                        kind: ElementKind::Group { children },
                        style: extract_style(node),
                        transform: combined.as_deref().and_then(parse_transform),
                        visible: node.attribute("data-visible") != Some("false"),
                        locked: node.attribute("data-locked") == Some("true"),
                    });
                }
                continue;
            }

            match extract_element(node, combined.as_deref()) {
                Some(mut element) => {
                    element.id = self.claim_id(element.id);
                    element.style.inherit_from(inherited_style);
                    out.push(element);
                    if !element_consumes_children(&tag) {
                        self.walk(node, combined.as_deref(), inherited_style, out);
                    }
                }
                None => {
                    debug!("skipping unrecognized tag <{tag}>, walking its children");
                    self.walk(node, combined.as_deref(), inherited_style, out);
                }
            }
        }
    }
}

/// Tags whose children are consumed by the extractor itself.
fn element_consumes_children(tag: &str) -> bool {
    tag == "text"
}

/// Parse raw SVG markup into scene-graph elements.
///
/// Failure to find an `<svg>` root fails closed: `valid: false`, no
/// elements, and the prior document (owned by the caller) stays intact.
pub fn parse_svg_markup(markup: &str, options: ParseOptions) -> ParsedSvg {
    let doc = match roxmltree::Document::parse(markup) {
        Ok(doc) => doc,
        Err(err) => {
            debug!("markup is not well-formed XML: {err}");
            return ParsedSvg::default();
        }
    };

    let Some(svg) = doc
        .descendants()
        .find(|n| n.is_element() && n.tag_name().name().eq_ignore_ascii_case("svg"))
    else {
        return ParsedSvg::default();
    };

    let (width, height) = canvas_size(svg);

    let mut walker = Walker {
        markup,
        options,
        seen_ids: HashSet::new(),
        defs: String::new(),
    };
    let mut elements = Vec::new();
    walker.walk(svg, None, &Style::default(), &mut elements);

    ParsedSvg {
        elements,
        valid: true,
        defs_markup: (!walker.defs.is_empty()).then(|| walker.defs.trim_end().to_string()),
        width,
        height,
    }
}

/// Canvas size from `width`/`height` attributes, falling back to `viewBox`.
fn canvas_size(svg: Node) -> (Option<f64>, Option<f64>) {
    let width = parse_optional_number(svg.attribute("width"));
    let height = parse_optional_number(svg.attribute("height"));
    if width.is_some() && height.is_some() {
        return (width, height);
    }
    if let Some(viewbox) = svg.attribute("viewBox") {
        let nums: Vec<f64> = viewbox
            .split(|ch: char| ch == ',' || ch.is_whitespace())
            .filter(|s| !s.is_empty())
            .filter_map(|s| s.parse::<f64>().ok())
            .collect();
        if nums.len() == 4 {
            return (width.or(Some(nums[2])), height.or(Some(nums[3])));
        }
    }
    (width, height)
}

impl Document {
    /// Build a full document from markup. `None` when no `<svg>` root exists.
    pub fn from_markup(markup: &str, options: ParseOptions) -> Option<Document> {
        let parsed = parse_svg_markup(markup, options);
        if !parsed.valid {
            return None;
        }
        Some(Document {
            width: parsed.width.unwrap_or(800.0),
            height: parsed.height.unwrap_or(600.0),
            elements: parsed.elements,
            defs_markup: parsed.defs_markup,
        })
    }
}
