use anyhow::Context;
use clap::{ArgGroup, Parser};
use std::path::{Path, PathBuf};
use tracing::info;
use tracing_subscriber::EnvFilter;

use barcode_digits::annotate::{draw_rectangles, draw_report, load_font, system_font};
use barcode_digits::{
    build_engine, load_image, DebugConfig, DigitRecognizer, EngineKind, EngineSettings, Rectangle,
};

#[derive(Parser)]
#[command(name = "barcode-digits")]
#[command(about = "Read the printed digits under barcodes")]
#[command(group(
    ArgGroup::new("regions")
        .required(true)
        .multiple(true)
        .args(["rects", "rects_file", "full_image"])
))]
struct Cli {
    /// Input image files
    #[arg(value_name = "IMAGE", required = true)]
    images: Vec<PathBuf>,

    /// Barcode rectangle as x1,y1,x2,y2 (repeatable)
    #[arg(long = "rect", value_name = "X1,Y1,X2,Y2")]
    rects: Vec<Rectangle>,

    /// JSON file with an array of {"x1","y1","x2","y2"} rectangles
    #[arg(long, value_name = "FILE")]
    rects_file: Option<PathBuf>,

    /// Treat each whole image as one rectangle
    #[arg(long)]
    full_image: bool,

    /// OCR backend
    #[arg(long, value_enum, default_value_t = EngineKind::Tesseract)]
    engine: EngineKind,

    /// Tesseract executable (probed from common install locations when omitted)
    #[arg(long, value_name = "PATH")]
    tesseract: Option<PathBuf>,

    /// Tesseract tessdata directory
    #[arg(long, value_name = "DIR")]
    tessdata: Option<PathBuf>,

    /// Tesseract language code
    #[arg(long, value_name = "LANG")]
    lang: Option<String>,

    /// Directory holding the ocrs models
    #[arg(long, value_name = "DIR")]
    models: Option<PathBuf>,

    /// Process rectangles in parallel
    #[arg(long)]
    parallel: bool,

    /// Save normalization stages to directory (must be empty)
    #[arg(long, value_name = "DIR")]
    debug_out: Option<PathBuf>,

    /// Write images with the rectangles outlined to directory
    #[arg(long, value_name = "DIR")]
    annotate: Option<PathBuf>,

    /// Font for the report text on annotated images (a system font is tried when omitted)
    #[arg(long, value_name = "FILE", requires = "annotate")]
    font: Option<PathBuf>,

    /// Print results as JSON
    #[arg(long)]
    json: bool,

    /// Enable verbose output
    #[arg(short, long)]
    verbose: bool,
}

fn init_tracing(verbose: bool) {
    let default_level = if verbose { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn read_rects_file(path: &Path) -> anyhow::Result<Vec<Rectangle>> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    serde_json::from_str(&content)
        .with_context(|| format!("Invalid rectangle file {}", path.display()))
}

/// Rectangles for one image: the explicit list, or the whole image with `--full-image`
fn rects_for_image(args: &Cli, fixed: &[Rectangle], image_path: &Path) -> Vec<Rectangle> {
    if !args.full_image {
        return fixed.to_vec();
    }
    match image::image_dimensions(image_path) {
        Ok((w, h)) => vec![Rectangle::new(0, 0, w, h)],
        Err(_) => Vec::new(),
    }
}

fn annotated_path(dir: &Path, image_path: &Path) -> PathBuf {
    let stem = image_path
        .file_stem()
        .map(|s| s.to_string_lossy().to_string())
        .unwrap_or_else(|| "image".to_string());
    dir.join(format!("{}_annotated.png", stem))
}

fn main() -> anyhow::Result<()> {
    let args = Cli::parse();
    init_tracing(args.verbose);

    let mut rects = args.rects.clone();
    if let Some(path) = &args.rects_file {
        rects.extend(read_rects_file(path)?);
    }

    let engine = build_engine(&EngineSettings {
        kind: args.engine,
        tesseract: args.tesseract.clone(),
        tessdata_dir: args.tessdata.clone(),
        language: args.lang.clone(),
        model_dir: args.models.clone(),
    })?;

    let debug = args.debug_out.clone().map(DebugConfig::new).transpose()?;
    let recognizer = DigitRecognizer::new(engine)
        .with_parallel(args.parallel)
        .with_debug(debug);

    let font = match (&args.annotate, &args.font) {
        (None, _) => None,
        (Some(_), Some(path)) => Some(load_font(path)?),
        (Some(_), None) => system_font(),
    };
    if let Some(dir) = &args.annotate {
        std::fs::create_dir_all(dir)?;
    }

    let mut json_results = Vec::new();

    for (i, image_path) in args.images.iter().enumerate() {
        let image_rects = rects_for_image(&args, &rects, image_path);
        info!("{}: {} rectangles", image_path.display(), image_rects.len());

        let result = recognizer.recognize_file(image_path, Some(image_rects.as_slice()));

        if let Some(dir) = &args.annotate {
            match load_image(image_path) {
                Ok(img) => {
                    let out = annotated_path(dir, image_path);
                    let mut canvas = draw_rectangles(&img, &image_rects);
                    if let Some(font) = &font {
                        draw_report(&mut canvas, &result, font);
                    }
                    canvas
                        .save(&out)
                        .with_context(|| format!("Failed to write {}", out.display()))?;
                    info!("Annotated image saved to {}", out.display());
                }
                Err(e) => tracing::warn!("Not annotating {}: {:#}", image_path.display(), e),
            }
        }

        if args.json {
            json_results.push(serde_json::json!({
                "image": image_path.display().to_string(),
                "text": result.text(),
                "regions": result.regions,
            }));
        } else {
            println!("\n--- Processing image {}: {} ---", i + 1, image_path.display());
            for line in result.report_lines() {
                println!("{}", line);
            }
        }
    }

    if args.json {
        println!("{}", serde_json::to_string_pretty(&json_results)?);
    }

    Ok(())
}
