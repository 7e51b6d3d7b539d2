//! Parsing and serialization of `transform` attribute strings.
//!
//! Only `translate`, `scale` and `rotate` are recognized for structured
//! editing; other functions (`matrix`, `skewX`, ...) are dropped. Composition
//! across nested containers is done by concatenating the ancestor string in
//! front of the node's own string and parsing the result once. The first
//! occurrence of each function wins, which is an approximation valid for the
//! simple non-conflicting transforms the editor produces — not matrix math.

use crate::models::Transform;
use log::debug;

/// Extract the argument list of the first `name(...)` occurrence.
fn function_args<'a>(transform: &'a str, name: &str) -> Option<&'a str> {
    let start = transform.find(name)? + name.len();
    let rest = &transform[start..];
    let rest = rest.trim_start();
    let rest = rest.strip_prefix('(')?;
    let end = rest.find(')')?;
    Some(&rest[..end])
}

fn split_numbers(args: &str) -> Vec<f64> {
    args.split(|ch: char| ch == ',' || ch.is_whitespace())
        .filter(|s| !s.is_empty())
        .filter_map(|s| s.parse::<f64>().ok())
        .collect()
}

/// Parse a transform attribute into a normalized record, or `None` when no
/// recognized transform function is present.
pub fn parse_transform(transform: &str) -> Option<Transform> {
    let transform = transform.trim();
    if transform.is_empty() {
        return None;
    }

    let mut result = Transform::default();

    if let Some(args) = function_args(transform, "translate") {
        let nums = split_numbers(args);
        if let Some(x) = nums.first() {
            result.x = Some(*x);
            // y defaults to 0 when omitted
            result.y = Some(nums.get(1).copied().unwrap_or(0.0));
        }
    }

    if let Some(args) = function_args(transform, "scale") {
        let nums = split_numbers(args);
        if let Some(sx) = nums.first() {
            result.scale_x = Some(*sx);
            // sy defaults to sx when omitted
            result.scale_y = Some(nums.get(1).copied().unwrap_or(*sx));
        }
    }

    if let Some(args) = function_args(transform, "rotate") {
        let nums = split_numbers(args);
        if let Some(angle) = nums.first() {
            result.rotation = Some(*angle);
        }
        if let (Some(cx), Some(cy)) = (nums.get(1), nums.get(2)) {
            result.rotation_cx = Some(*cx);
            result.rotation_cy = Some(*cy);
        }
    }

    for dropped in ["matrix(", "skewX(", "skewY("] {
        if transform.contains(dropped) {
            debug!("ignoring unsupported transform function in {transform:?}");
        }
    }

    if result.is_empty() {
        None
    } else {
        Some(result)
    }
}

/// Concatenate an inherited transform string with a node's own, ancestor
/// first, so a single parse reflects the full composition.
pub fn compose_transform_strings(
    inherited: Option<&str>,
    own: Option<&str>,
) -> Option<String> {
    let parts: Vec<&str> = [inherited, own]
        .into_iter()
        .flatten()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .collect();
    if parts.is_empty() {
        None
    } else {
        Some(parts.join(" "))
    }
}

/// Reconstruct the attribute string in the fixed order
/// translate, scale, rotate. Returns `None` when nothing would be emitted.
pub fn transform_attr(transform: &Transform) -> Option<String> {
    let mut parts = Vec::new();

    let x = transform.x.unwrap_or(0.0);
    let y = transform.y.unwrap_or(0.0);
    if x != 0.0 || y != 0.0 {
        parts.push(format!("translate({x} {y})"));
    }

    if transform.scale_x.is_some() || transform.scale_y.is_some() {
        let sx = transform.scale_x.unwrap_or(1.0);
        let sy = transform.scale_y.unwrap_or(sx);
        if sx != 1.0 || sy != 1.0 {
            parts.push(format!("scale({sx} {sy})"));
        }
    }

    if let Some(rotation) = transform.rotation {
        if rotation != 0.0 {
            match (transform.rotation_cx, transform.rotation_cy) {
                (Some(cx), Some(cy)) => parts.push(format!("rotate({rotation} {cx} {cy})")),
                _ => parts.push(format!("rotate({rotation})")),
            }
        }
    }

    if parts.is_empty() {
        None
    } else {
        Some(parts.join(" "))
    }
}
