//! Scene graph back to SVG markup.
//!
//! Output must re-parse to an equivalent document: editor-only state
//! (`visible`, `locked`, connector refs) rides along as `data-*` attributes,
//! defs captured at import are re-emitted verbatim, and transform records
//! serialize in the fixed order translate, scale, rotate.

use std::fmt::Write as _;

use crate::models::{Document, ElementKind, Style, SvgElement, Tspan};
use crate::transform_utils::transform_attr;

pub fn escape_xml(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&apos;")
}

fn push_attr(out: &mut String, name: &str, value: &str) {
    let _ = write!(out, " {}=\"{}\"", name, escape_xml(value));
}

fn push_num_attr(out: &mut String, name: &str, value: f64) {
    let _ = write!(out, " {name}=\"{value}\"");
}

fn push_opt_num(out: &mut String, name: &str, value: Option<f64>) {
    if let Some(value) = value {
        push_num_attr(out, name, value);
    }
}

fn push_opt_str(out: &mut String, name: &str, value: &Option<String>) {
    if let Some(value) = value {
        push_attr(out, name, value);
    }
}

fn style_attrs(out: &mut String, style: &Style) {
    push_opt_str(out, "fill", &style.fill);
    push_opt_str(out, "stroke", &style.stroke);
    push_opt_num(out, "stroke-width", style.stroke_width);
    push_opt_str(out, "stroke-dasharray", &style.stroke_dasharray);
    push_opt_str(out, "stroke-linecap", &style.stroke_linecap);
    push_opt_str(out, "stroke-linejoin", &style.stroke_linejoin);
    push_opt_str(out, "marker-start", &style.marker_start);
    push_opt_str(out, "marker-end", &style.marker_end);
    push_opt_num(out, "opacity", style.opacity);
    push_opt_str(out, "filter", &style.filter);
    push_opt_str(out, "class", &style.class_name);
    push_opt_num(out, "font-size", style.font_size);
    push_opt_str(out, "font-weight", &style.font_weight);
    push_opt_str(out, "font-family", &style.font_family);
    push_opt_str(out, "text-anchor", &style.text_anchor);
    push_opt_str(out, "dominant-baseline", &style.dominant_baseline);
}

fn editor_attrs(out: &mut String, element: &SvgElement) {
    if let Some(attr) = element.transform.as_ref().and_then(transform_attr) {
        push_attr(out, "transform", &attr);
    }
    if !element.visible {
        // Hidden elements are emitted, not dropped, so a re-import
        // recovers the hidden state.
        push_attr(out, "data-visible", "false");
    }
    if element.locked {
        push_attr(out, "data-locked", "true");
    }
}

fn tspan_markup(out: &mut String, tspan: &Tspan) {
    out.push_str("<tspan");
    push_opt_num(out, "x", tspan.x);
    push_opt_num(out, "y", tspan.y);
    push_opt_num(out, "dx", tspan.dx);
    push_opt_num(out, "dy", tspan.dy);
    push_opt_num(out, "font-size", tspan.font_size);
    push_opt_str(out, "font-weight", &tspan.font_weight);
    push_opt_str(out, "font-family", &tspan.font_family);
    push_opt_str(out, "fill", &tspan.fill);
    out.push('>');
    out.push_str(&escape_xml(&tspan.text));
    out.push_str("</tspan>");
}

pub fn element_markup(element: &SvgElement, indent: usize) -> String {
    let mut out = String::new();
    let pad = "  ".repeat(indent);
    out.push_str(&pad);

    match &element.kind {
        ElementKind::Rect { x, y, width, height, rx, ry } => {
            out.push_str("<rect");
            push_attr(&mut out, "id", &element.id);
            push_num_attr(&mut out, "x", *x);
            push_num_attr(&mut out, "y", *y);
            push_num_attr(&mut out, "width", *width);
            push_num_attr(&mut out, "height", *height);
            push_opt_num(&mut out, "rx", *rx);
            push_opt_num(&mut out, "ry", *ry);
            style_attrs(&mut out, &element.style);
            editor_attrs(&mut out, element);
            out.push_str("/>");
        }
        ElementKind::Circle { cx, cy, r } => {
            out.push_str("<circle");
            push_attr(&mut out, "id", &element.id);
            push_num_attr(&mut out, "cx", *cx);
            push_num_attr(&mut out, "cy", *cy);
            push_num_attr(&mut out, "r", *r);
            style_attrs(&mut out, &element.style);
            editor_attrs(&mut out, element);
            out.push_str("/>");
        }
        ElementKind::Ellipse { cx, cy, rx, ry } => {
            out.push_str("<ellipse");
            push_attr(&mut out, "id", &element.id);
            push_num_attr(&mut out, "cx", *cx);
            push_num_attr(&mut out, "cy", *cy);
            push_num_attr(&mut out, "rx", *rx);
            push_num_attr(&mut out, "ry", *ry);
            style_attrs(&mut out, &element.style);
            editor_attrs(&mut out, element);
            out.push_str("/>");
        }
        ElementKind::Line { x1, y1, x2, y2, start_ref, end_ref } => {
            out.push_str("<line");
            push_attr(&mut out, "id", &element.id);
            push_num_attr(&mut out, "x1", *x1);
            push_num_attr(&mut out, "y1", *y1);
            push_num_attr(&mut out, "x2", *x2);
            push_num_attr(&mut out, "y2", *y2);
            push_opt_str(&mut out, "data-start-ref", start_ref);
            push_opt_str(&mut out, "data-end-ref", end_ref);
            style_attrs(&mut out, &element.style);
            editor_attrs(&mut out, element);
            out.push_str("/>");
        }
        ElementKind::Path { d } => {
            out.push_str("<path");
            push_attr(&mut out, "id", &element.id);
            push_attr(&mut out, "d", d);
            style_attrs(&mut out, &element.style);
            editor_attrs(&mut out, element);
            out.push_str("/>");
        }
        ElementKind::Text { x, y, text, tspans } => {
            out.push_str("<text");
            push_attr(&mut out, "id", &element.id);
            push_num_attr(&mut out, "x", *x);
            push_num_attr(&mut out, "y", *y);
            style_attrs(&mut out, &element.style);
            editor_attrs(&mut out, element);
            out.push('>');
            if tspans.is_empty() {
                out.push_str(&escape_xml(text));
            } else {
                for tspan in tspans {
                    tspan_markup(&mut out, tspan);
                }
            }
            out.push_str("</text>");
        }
        ElementKind::Image { x, y, width, height, href, preserve_aspect_ratio } => {
            out.push_str("<image");
            push_attr(&mut out, "id", &element.id);
            push_num_attr(&mut out, "x", *x);
            push_num_attr(&mut out, "y", *y);
            push_num_attr(&mut out, "width", *width);
            push_num_attr(&mut out, "height", *height);
            push_attr(&mut out, "href", href);
            push_opt_str(&mut out, "preserveAspectRatio", preserve_aspect_ratio);
            style_attrs(&mut out, &element.style);
            editor_attrs(&mut out, element);
            out.push_str("/>");
        }
        ElementKind::Use { href, x, y, width, height } => {
            out.push_str("<use");
            push_attr(&mut out, "id", &element.id);
            push_attr(&mut out, "href", href);
            push_opt_num(&mut out, "x", *x);
            push_opt_num(&mut out, "y", *y);
            push_opt_num(&mut out, "width", *width);
            push_opt_num(&mut out, "height", *height);
            style_attrs(&mut out, &element.style);
            editor_attrs(&mut out, element);
            out.push_str("/>");
        }
        ElementKind::Group { children } => {
            out.push_str("<g");
            push_attr(&mut out, "id", &element.id);
            style_attrs(&mut out, &element.style);
            editor_attrs(&mut out, element);
            out.push_str(">\n");
            for child in children {
                out.push_str(&element_markup(child, indent + 1));
                out.push('\n');
            }
            out.push_str(&pad);
            out.push_str("</g>");
        }
    }

    out
}

/// Serialize the document body without the welcome fallback. Used by both
/// the exporter and the editor-view renderer.
pub fn document_markup(document: &Document) -> String {
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
        out.push_str(&element_markup(element, 1));
        out.push('\n');
    }
    out.push_str("</svg>");
    out
}

/// Export the document as SVG markup. An empty document falls back to the
/// decorative welcome placeholder instead of a blank canvas; the fallback
/// is itself valid, parseable SVG.
pub fn export_svg(document: &Document) -> String {
    if document.is_empty() {
        return DEFAULT_WELCOME_SVG.trim().to_string();
    }
    document_markup(document)
}

/// Placeholder shown when no real content exists yet.
pub const DEFAULT_WELCOME_SVG: &str = r##"
<svg width="960" height="540" viewBox="0 0 960 540" xmlns="http://www.w3.org/2000/svg">
  <defs>
    <linearGradient id="brandGrad" x1="0%" y1="0%" x2="100%" y2="0%">
      <stop offset="0%" stop-color="#4F46E5"/>
      <stop offset="100%" stop-color="#9333EA"/>
    </linearGradient>
    <pattern id="dotGrid" x="0" y="0" width="40" height="40" patternUnits="userSpaceOnUse">
      <circle cx="2" cy="2" r="1.5" fill="#E5E7EB"/>
    </pattern>
  </defs>
  <rect width="100%" height="100%" fill="url(#dotGrid)"/>
  <circle cx="120" cy="110" r="15" fill="none" stroke="#CBD5E1" stroke-width="4"/>
  <rect x="840" y="420" width="30" height="30" fill="none" stroke="#CBD5E1" stroke-width="4" transform="rotate(45 855 435)"/>
  <g transform="translate(240 150)">
    <rect width="140" height="32" rx="16" fill="#EEF2FF" stroke="#C7D2FE" stroke-width="1"/>
    <text x="70" y="21" font-size="14" fill="#4F46E5" font-weight="bold" text-anchor="middle">Flow Pilot</text>
    <text x="0" y="110" font-size="56" font-weight="900" fill="#1E293B">Draw it with words</text>
    <path d="M 0 150 L 320 150" stroke="url(#brandGrad)" stroke-width="6" stroke-linecap="round"/>
    <text x="0" y="200" font-size="18" fill="#64748B">
      <tspan x="0" dy="0">Paste an SVG, sketch a diagram, or ask the</tspan>
      <tspan x="0" dy="30">assistant to generate one for you.</tspan>
    </text>
    <g transform="translate(0 250)">
      <rect width="200" height="56" rx="12" fill="url(#brandGrad)"/>
      <text x="100" y="35" font-size="18" fill="white" font-weight="bold" text-anchor="middle">Start drawing</text>
    </g>
  </g>
  <path d="M 620 270 L 760 270" stroke="#CBD5E1" stroke-width="2" stroke-dasharray="6 6"/>
  <circle cx="760" cy="270" r="4" fill="#94A3B8"/>
  <circle cx="620" cy="270" r="4" fill="#94A3B8"/>
</svg>
"##;
