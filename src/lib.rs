pub mod converter;
pub mod editor;
pub mod exporter;
pub mod math_utils;
pub mod models;
pub mod parser;
pub mod registry;
pub mod renderer;
pub mod transform_utils;
pub mod validation;

pub use converter::{convert_svg_to_png, render_document_png};
pub use editor::{EditError, EditorSession, ZOrder};
pub use exporter::{export_svg, DEFAULT_WELCOME_SVG};
pub use models::{Document, ElementKind, Style, SvgElement, Transform, Tspan};
pub use parser::{parse_svg_markup, ParseOptions, ParsedSvg};
pub use renderer::{render_scene, RenderState};
pub use validation::{validate_svg, ValidationReport};
