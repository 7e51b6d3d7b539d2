//! Geometry helpers shared by the editor and the CLI summary.

use crate::models::{Document, ElementKind, SvgElement};

/// Rotate a point around a center by an angle in radians.
pub fn rotate_point<T>(px: T, py: T, cx: T, cy: T, angle_rad: T) -> (T, T)
where
    T: num_traits::Float,
{
    let dx = px - cx;
    let dy = py - cy;
    let ca = angle_rad.cos();
    let sa = angle_rad.sin();
    (cx + dx * ca - dy * sa, cy + dx * sa + dy * ca)
}

pub fn distance<T>(p1: (T, T), p2: (T, T)) -> T
where
    T: num_traits::Float,
{
    let dx = p2.0 - p1.0;
    let dy = p2.1 - p1.1;
    (dx * dx + dy * dy).sqrt()
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bounds {
    pub min_x: f64,
    pub min_y: f64,
    pub max_x: f64,
    pub max_y: f64,
}

impl Bounds {
    fn empty() -> Self {
        Bounds {
            min_x: f64::INFINITY,
            min_y: f64::INFINITY,
            max_x: f64::NEG_INFINITY,
            max_y: f64::NEG_INFINITY,
        }
    }

    fn is_empty(&self) -> bool {
        self.min_x > self.max_x
    }

    fn include(&mut self, x: f64, y: f64) {
        self.min_x = self.min_x.min(x);
        self.min_y = self.min_y.min(y);
        self.max_x = self.max_x.max(x);
        self.max_y = self.max_y.max(y);
    }

    pub fn width(&self) -> f64 {
        self.max_x - self.min_x
    }

    pub fn height(&self) -> f64 {
        self.max_y - self.min_y
    }
}

/// Axis-aligned bounds of one element's untransformed geometry with its own
/// translate/rotate applied. Paths and `use` references have no cheaply
/// computable extent and contribute nothing.
pub fn element_bounds(element: &SvgElement) -> Option<Bounds> {
    let mut corners: Vec<(f64, f64)> = match &element.kind {
        ElementKind::Rect { x, y, width, height, .. }
        | ElementKind::Image { x, y, width, height, .. } => vec![
            (*x, *y),
            (x + width, *y),
            (x + width, y + height),
            (*x, y + height),
        ],
        ElementKind::Circle { cx, cy, r } => {
            vec![(cx - r, cy - r), (cx + r, cy + r)]
        }
        ElementKind::Ellipse { cx, cy, rx, ry } => {
            vec![(cx - rx, cy - ry), (cx + rx, cy + ry)]
        }
        ElementKind::Line { x1, y1, x2, y2, .. } => vec![(*x1, *y1), (*x2, *y2)],
        ElementKind::Text { x, y, .. } => vec![(*x, *y)],
        ElementKind::Group { children } => {
            let mut bounds = Bounds::empty();
            for child in children {
                if let Some(b) = element_bounds(child) {
                    bounds.include(b.min_x, b.min_y);
                    bounds.include(b.max_x, b.max_y);
                }
            }
            if bounds.is_empty() {
                return None;
            }
            vec![
                (bounds.min_x, bounds.min_y),
                (bounds.max_x, bounds.max_y),
            ]
        }
        ElementKind::Path { .. } | ElementKind::Use { .. } => return None,
    };

    if let Some(transform) = &element.transform {
        // Attribute order is translate, scale, rotate; applied to a point
        // innermost first, so scale the corners before translating.
        let sx = transform.scale_x.unwrap_or(1.0);
        let sy = transform.scale_y.unwrap_or(1.0);
        if sx != 1.0 || sy != 1.0 {
            for corner in corners.iter_mut() {
                corner.0 *= sx;
                corner.1 *= sy;
            }
        }
        let tx = transform.x.unwrap_or(0.0);
        let ty = transform.y.unwrap_or(0.0);
        for corner in corners.iter_mut() {
            corner.0 += tx;
            corner.1 += ty;
        }
        if let Some(rotation) = transform.rotation {
            let angle = rotation.to_radians();
            let cx = transform.rotation_cx.unwrap_or(0.0);
            let cy = transform.rotation_cy.unwrap_or(0.0);
            for corner in corners.iter_mut() {
                *corner = rotate_point(corner.0, corner.1, cx, cy, angle);
            }
        }
    }

    let mut bounds = Bounds::empty();
    for (x, y) in corners {
        bounds.include(x, y);
    }
    Some(bounds)
}

const CONTENT_PADDING: f64 = 40.0;

/// Padded bounds of all visible content; the default canvas when the
/// document has none.
pub fn content_bounds(document: &Document) -> Bounds {
    let mut bounds = Bounds::empty();
    for element in &document.elements {
        if !element.visible {
            continue;
        }
        if let Some(b) = element_bounds(element) {
            bounds.include(b.min_x, b.min_y);
            bounds.include(b.max_x, b.max_y);
        }
    }
    if bounds.is_empty() {
        return Bounds {
            min_x: 0.0,
            min_y: 0.0,
            max_x: document.width,
            max_y: document.height,
        };
    }
    Bounds {
        min_x: bounds.min_x - CONTENT_PADDING,
        min_y: bounds.min_y - CONTENT_PADDING,
        max_x: bounds.max_x + CONTENT_PADDING,
        max_y: bounds.max_y + CONTENT_PADDING,
    }
}
