use anyhow::{bail, Context, Result};
use clap::Parser;
use flowcanvas::math_utils::content_bounds;
use flowcanvas::{
    render_document_png, validate_svg, Document, ParseOptions, DEFAULT_WELCOME_SVG,
};
use std::fs;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "flowcanvas")]
#[command(about = "Parse, round-trip and rasterize editable SVG documents", long_about = None)]
struct Args {
    /// Path to the SVG file (optional with --welcome)
    #[arg(value_name = "FILE", required_unless_present = "welcome")]
    input: Option<PathBuf>,

    /// Output file path; .svg round-trips through the scene graph,
    /// .png rasterizes, .json dumps the parsed document
    #[arg(short, long, value_name = "FILE")]
    output: Option<PathBuf>,

    /// Flatten groups into their children instead of preserving them
    #[arg(long)]
    flatten_groups: bool,

    /// Print the parsed document as JSON instead of the element summary
    #[arg(long)]
    json: bool,

    /// Emit the decorative welcome document and exit
    #[arg(long)]
    welcome: bool,
}

fn main() -> Result<()> {
    env_logger::init();
    let args = Args::parse();

    if args.welcome {
        match &args.output {
            Some(path) => fs::write(path, DEFAULT_WELCOME_SVG.trim())
                .with_context(|| format!("Failed to write welcome SVG: {path:?}"))?,
            None => println!("{}", DEFAULT_WELCOME_SVG.trim()),
        }
        return Ok(());
    }

    let Some(input) = args.input else {
        bail!("FILE is required unless --welcome is given");
    };
    let content = fs::read_to_string(&input)
        .with_context(|| format!("Failed to read input file: {input:?}"))?;

    let report = validate_svg(&content, Some(content.len()));
    if let Some(error) = report.error {
        bail!("validation failed: {error}");
    }
    if let Some(warning) = &report.warning {
        eprintln!("warning: {warning}");
    }

    let options = ParseOptions {
        flatten_groups: args.flatten_groups,
    };
    let document = Document::from_markup(&content, options)
        .context("Failed to parse SVG structure")?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&document)?);
    } else {
        print_summary(&document);
    }

    if let Some(output_path) = &args.output {
        let extension = output_path
            .extension()
            .and_then(|s| s.to_str())
            .unwrap_or("svg");
        match extension.to_lowercase().as_str() {
            "png" => {
                render_document_png(&document, output_path, 75, None)
                    .with_context(|| format!("Failed to render PNG: {output_path:?}"))?;
            }
            "json" => {
                fs::write(output_path, serde_json::to_string_pretty(&document)?)
                    .with_context(|| format!("Failed to write JSON: {output_path:?}"))?;
            }
            _ => {
                fs::write(output_path, flowcanvas::export_svg(&document))
                    .with_context(|| format!("Failed to write SVG: {output_path:?}"))?;
            }
        }
        println!(
            "Successfully converted {} to {}",
            input.display(),
            output_path.display()
        );
    }

    Ok(())
}

fn print_summary(document: &Document) {
    println!(
        "canvas: {}x{}  elements: {}",
        document.width,
        document.height,
        document.len()
    );
    let bounds = content_bounds(document);
    println!(
        "content bounds: ({:.1}, {:.1}) to ({:.1}, {:.1})",
        bounds.min_x, bounds.min_y, bounds.max_x, bounds.max_y
    );
    for (index, element) in document.elements.iter().enumerate() {
        describe(index, element, 0);
    }
}

fn describe(index: usize, element: &flowcanvas::SvgElement, depth: usize) {
    let pad = "  ".repeat(depth);
    println!("{pad}{index} {} id={}", element.kind.tag_name(), element.id);
    for (child_index, child) in element.children().iter().enumerate() {
        describe(child_index, child, depth + 1);
    }
}
