//! Rasterization of documents for PNG preview/export.

use std::path::Path;

use anyhow::Result;
use resvg::usvg::{self, Tree};
use tiny_skia::Pixmap;

use crate::exporter::export_svg;
use crate::models::Document;

/// Rasterize SVG markup to a PNG file.
///
/// `background` defaults to opaque white; `quality` (0-100) selects the PNG
/// compression tier; `dpi` scales relative to the 96 DPI source resolution.
pub fn convert_svg_to_png(
    svg_content: &str,
    output_path: &Path,
    background: Option<(u8, u8, u8, u8)>,
    quality: u8,
    dpi: Option<u32>,
) -> Result<()> {
    let options = usvg::Options::default();
    let mut fontdb = fontdb::Database::new();
    fontdb.load_system_fonts();

    let tree = Tree::from_str(svg_content, &options, &fontdb)?;

    const SOURCE_DPI: f32 = 96.0;
    let scale = dpi.map(|d| d as f32 / SOURCE_DPI).unwrap_or(1.0);

    let size = tree.size();
    let width = ((size.width() * scale).ceil() as u32).max(100);
    let height = ((size.height() * scale).ceil() as u32).max(100);

    let mut pixmap = Pixmap::new(width, height)
        .ok_or_else(|| anyhow::anyhow!("Failed to create pixmap"))?;

    if let Some((r, g, b, a)) = background.or(Some((255, 255, 255, 255))) {
        if a > 0 {
            let mut paint = tiny_skia::Paint::default();
            paint.set_color_rgba8(r, g, b, a);
            if let Some(rect) =
                tiny_skia::Rect::from_xywh(0.0, 0.0, width as f32, height as f32)
            {
                pixmap.fill_rect(rect, &paint, tiny_skia::Transform::identity(), None);
            }
        }
    }

    let transform = tiny_skia::Transform::from_scale(scale, scale);
    resvg::render(&tree, transform, &mut pixmap.as_mut());

    save_png_with_quality(&pixmap, output_path, quality)?;

    Ok(())
}

/// Export a document and rasterize it in one step. An empty document
/// rasterizes the welcome placeholder, same as the SVG export path.
pub fn render_document_png(
    document: &Document,
    output_path: &Path,
    quality: u8,
    dpi: Option<u32>,
) -> Result<()> {
    let markup = export_svg(document);
    convert_svg_to_png(&markup, output_path, None, quality, dpi)
}

/// Save a pixmap to PNG. Quality 0-100 maps to compression tiers:
/// 0-25 fast, 26-75 default, 76-100 best.
fn save_png_with_quality(pixmap: &Pixmap, output_path: &Path, quality: u8) -> Result<()> {
    use std::fs::File;
    use std::io::BufWriter;

    let file = File::create(output_path)
        .map_err(|e| anyhow::anyhow!("Failed to create PNG file: {e}"))?;
    let writer = BufWriter::new(file);

    let mut encoder = png::Encoder::new(writer, pixmap.width(), pixmap.height());
    encoder.set_color(png::ColorType::Rgba);
    encoder.set_depth(png::BitDepth::Eight);
    encoder.set_filter(png::FilterType::Paeth);

    let compression_type = if quality <= 25 {
        png::Compression::Fast
    } else if quality <= 75 {
        png::Compression::Default
    } else {
        png::Compression::Best
    };
    encoder.set_compression(compression_type);

    let mut writer = encoder
        .write_header()
        .map_err(|e| anyhow::anyhow!("Failed to write PNG header: {e}"))?;

    writer
        .write_image_data(pixmap.data())
        .map_err(|e| anyhow::anyhow!("Failed to write PNG data: {e}"))?;

    Ok(())
}
