use ab_glyph::{FontVec, PxScale};
use anyhow::{Context, Result};
use image::{DynamicImage, Rgb, RgbImage};
use imageproc::drawing::{draw_hollow_rect_mut, draw_text_mut};
use imageproc::rect::Rect;
use std::path::Path;
use tracing::{debug, info};

use crate::models::{RecognitionResult, Rectangle};

pub const OUTLINE_COLOR: Rgb<u8> = Rgb([0, 255, 0]);
pub const OUTLINE_THICKNESS: i32 = 3;

pub const TEXT_COLOR: Rgb<u8> = Rgb([255, 0, 0]);
const TEXT_ORIGIN: (i32, i32) = (10, 10);
const LINE_HEIGHT: i32 = 35;
const WINNER_SCALE: f32 = 24.0;
const NOT_RECOGNIZED_SCALE: f32 = 18.0;

const SYSTEM_FONT_PATHS: [&str; 4] = [
    "/usr/share/fonts/truetype/dejavu/DejaVuSans.ttf",
    "/usr/share/fonts/TTF/DejaVuSans.ttf",
    "/System/Library/Fonts/Supplemental/Arial.ttf",
    "C:\\Windows\\Fonts\\arial.ttf",
];

/// Load a TrueType/OpenType font from `path`.
pub fn load_font(path: &Path) -> Result<FontVec> {
    let data = std::fs::read(path)
        .with_context(|| format!("Failed to read font {}", path.display()))?;
    FontVec::try_from_vec(data)
        .map_err(|_| anyhow::anyhow!("Failed to parse font file: {}", path.display()))
}

/// First loadable font from the common system locations
pub fn system_font() -> Option<FontVec> {
    for path in SYSTEM_FONT_PATHS {
        if let Ok(font) = load_font(Path::new(path)) {
            info!("Loaded system font: {}", path);
            return Some(font);
        }
    }

    debug!("No system font found, report text will be skipped");
    None
}

/// Write the report lines in the top-left corner, one per winner,
/// or a single "not recognized" line.
pub fn draw_report(canvas: &mut RgbImage, result: &RecognitionResult, font: &FontVec) {
    let scale = if result.is_empty() { NOT_RECOGNIZED_SCALE } else { WINNER_SCALE };
    let (x, y) = TEXT_ORIGIN;

    for (i, line) in result.report_lines().iter().enumerate() {
        draw_text_mut(canvas, TEXT_COLOR, x, y + i as i32 * LINE_HEIGHT, PxScale::from(scale), font, line);
    }
}

/// Copy of `img` with every rectangle outlined.
///
/// Degenerate rectangles are skipped.
pub fn draw_rectangles(img: &DynamicImage, rects: &[Rectangle]) -> RgbImage {
    let mut canvas = img.to_rgb8();

    for rect in rects.iter().filter(|r| !r.is_degenerate()) {
        // Centered on the rectangle edge: one pixel outside, one inside
        for inset in -(OUTLINE_THICKNESS / 2)..=(OUTLINE_THICKNESS / 2) {
            let width = rect.width() as i32 - 2 * inset;
            let height = rect.height() as i32 - 2 * inset;
            if width <= 0 || height <= 0 {
                continue;
            }
            let outline = Rect::at(rect.x1 as i32 + inset, rect.y1 as i32 + inset)
                .of_size(width as u32, height as u32);
            draw_hollow_rect_mut(&mut canvas, outline, OUTLINE_COLOR);
        }
    }

    canvas
}
