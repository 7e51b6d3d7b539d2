//! Import-boundary policy checks.
//!
//! Size and height limits are enforced before any structural parsing is
//! attempted; a rejected document never touches the editor session. Errors
//! are structured values with human-readable reasons naming the measured
//! value and the limit.

use serde::Serialize;
use thiserror::Error;

use crate::parser::{parse_svg_markup, ParseOptions};

/// Maximum accepted input size in bytes (5 MiB).
pub const MAX_FILE_SIZE: usize = 5 * 1024 * 1024;
/// Maximum accepted rendered height in pixels.
pub const MAX_HEIGHT: f64 = 1200.0;
/// Soft threshold above which editing performance degrades noticeably.
pub const ELEMENT_WARNING_THRESHOLD: usize = 500;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum ValidationError {
    #[error("content is empty")]
    Empty,
    #[error("content does not contain an <svg> tag")]
    MissingSvgTag,
    #[error("file size {size_mb:.1}MB exceeds the {limit_mb}MB limit")]
    FileTooLarge { size_mb: f64, limit_mb: usize },
    #[error("height {height}px exceeds the {limit}px limit")]
    TooTall { height: i64, limit: i64 },
    #[error("cannot parse SVG structure")]
    Unparseable,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Dimensions {
    pub width: f64,
    pub height: f64,
}

/// Outcome of validating one import candidate. Mirrors the shape the import
/// dialog renders inline: either an error, or success with optional warning
/// and the gathered stats.
#[derive(Debug, Clone, Default)]
pub struct ValidationReport {
    pub valid: bool,
    pub error: Option<ValidationError>,
    pub warning: Option<String>,
    pub dimensions: Option<Dimensions>,
    pub element_count: Option<usize>,
    pub file_size: Option<usize>,
}

impl ValidationReport {
    fn rejected(error: ValidationError) -> Self {
        ValidationReport {
            valid: false,
            error: Some(error),
            ..ValidationReport::default()
        }
    }
}

/// Validate SVG content ahead of import. `declared_size` is the file size
/// for uploads; pasted content is measured from the string itself.
pub fn validate_svg(content: &str, declared_size: Option<usize>) -> ValidationReport {
    if content.trim().is_empty() {
        return ValidationReport::rejected(ValidationError::Empty);
    }

    if !content.to_lowercase().contains("<svg") {
        return ValidationReport::rejected(ValidationError::MissingSvgTag);
    }

    let size = declared_size.unwrap_or(content.len());
    if size > MAX_FILE_SIZE {
        return ValidationReport::rejected(ValidationError::FileTooLarge {
            size_mb: size as f64 / 1024.0 / 1024.0,
            limit_mb: MAX_FILE_SIZE / 1024 / 1024,
        });
    }

    let parsed = parse_svg_markup(content, ParseOptions::default());
    if !parsed.valid {
        return ValidationReport::rejected(ValidationError::Unparseable);
    }

    let dimensions = match (parsed.width, parsed.height) {
        (Some(width), Some(height)) => Some(Dimensions { width, height }),
        _ => None,
    };

    if let Some(height) = parsed.height {
        if height > MAX_HEIGHT {
            return ValidationReport {
                valid: false,
                error: Some(ValidationError::TooTall {
                    height: height.round() as i64,
                    limit: MAX_HEIGHT as i64,
                }),
                dimensions,
                ..ValidationReport::default()
            };
        }
    }

    let element_count = parsed.elements.iter().map(|el| el.subtree_len()).sum::<usize>();
    let warning = (element_count > ELEMENT_WARNING_THRESHOLD).then(|| {
        format!("document contains {element_count} elements, editing may be slow")
    });

    ValidationReport {
        valid: true,
        error: None,
        warning,
        dimensions,
        element_count: Some(element_count),
        file_size: declared_size,
    }
}
