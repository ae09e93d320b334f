pub mod preprocessing;
pub mod ocr;
pub mod scoring;
pub mod steps;

use anyhow::Result;
use image::{DynamicImage, ImageReader};
use rayon::prelude::*;
use std::path::Path;
use std::sync::Arc;
use tracing::{debug, warn};

use crate::models::{ReadingSource, RecognitionResult, Rectangle, RegionReading};
use crate::pipeline::{DebugConfig, Normalizer, PipelineContext};
use ocr::OcrEngine;

pub const UPSCALE_FACTOR: f32 = 2.0;
pub const THRESHOLD_BLOCK_SIZE: u32 = 51;
pub const THRESHOLD_BIAS: i16 = 4;

/// Build the standard normalizer: grayscale, 2x cubic upscale, Gaussian
/// adaptive threshold (51x51, bias 4), polarity correction, 2x2 closing.
pub fn build_standard_normalizer() -> Normalizer {
    use steps::*;

    Normalizer::new()
        .add_step(Arc::new(UpscaleStep { factor: UPSCALE_FACTOR }))
        .add_step(Arc::new(AdaptiveThresholdStep {
            block_size: THRESHOLD_BLOCK_SIZE,
            bias: THRESHOLD_BIAS,
        }))
        .add_step(Arc::new(PolarityStep))
        .add_step(Arc::new(CloseStep::new()))
}

/// Decode an image file
pub fn load_image(path: &Path) -> Result<DynamicImage> {
    ImageReader::open(path)?
        .with_guessed_format()?
        .decode()
        .map_err(|e| anyhow::anyhow!("Failed to decode image {}: {}", path.display(), e))
}

/// Recovers the printed digit string for each candidate barcode rectangle.
///
/// Every rectangle is read in full first; only when that yields no candidate
/// at all is its lower half tried. Failures never escape: an unreadable image,
/// a degenerate crop, or a failing engine just mean fewer winners.
#[derive(Clone)]
pub struct DigitRecognizer {
    engine: Arc<dyn OcrEngine>,
    normalizer: Normalizer,
    parallel: bool,
    debug: Option<DebugConfig>,
}

impl DigitRecognizer {
    pub fn new(engine: Arc<dyn OcrEngine>) -> Self {
        Self {
            engine,
            normalizer: build_standard_normalizer(),
            parallel: false,
            debug: None,
        }
    }

    pub fn with_normalizer(mut self, normalizer: Normalizer) -> Self {
        self.normalizer = normalizer;
        self
    }

    /// Process rectangles on the rayon pool. Output order is unchanged.
    pub fn with_parallel(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }

    /// Save every normalization stage under the debug directory
    pub fn with_debug(mut self, debug: Option<DebugConfig>) -> Self {
        self.debug = debug;
        self
    }

    /// Normalize one crop, try every engine configuration and keep the best candidate.
    pub fn read_crop(&self, region: &DynamicImage, label: &str) -> Option<String> {
        let context = PipelineContext::new(self.debug.clone(), label);
        let normalized = self.normalizer.run(region, &context);
        let candidates = ocr::attempt_digits(self.engine.as_ref(), &normalized);

        debug!("{}: candidates {:?}", label, candidates);
        scoring::select_winner(candidates.as_slice()).map(str::to_string)
    }

    /// Full-area attempt, then the lower-half fallback.
    pub fn read_rectangle(&self, img: &DynamicImage, index: usize, rect: Rectangle) -> RegionReading {
        let full_label = format!("rect{:02}-full", index + 1);
        if let Some(roi) = rect.extract_roi(img) {
            if let Some(digits) = self.read_crop(&roi, &full_label) {
                debug!("Rectangle {} {}: '{}' from full area", index + 1, rect, digits);
                return RegionReading {
                    index,
                    rect,
                    digits: Some(digits),
                    source: Some(ReadingSource::FullArea),
                };
            }
        } else {
            debug!("Rectangle {} {}: empty crop", index + 1, rect);
        }

        let lower_label = format!("rect{:02}-lower", index + 1);
        let Some(roi) = rect.lower_half().extract_roi(img) else {
            debug!("Rectangle {} {}: empty lower half", index + 1, rect);
            return RegionReading::unrecognized(index, rect);
        };

        match self.read_crop(&roi, &lower_label) {
            Some(digits) => {
                debug!("Rectangle {} {}: '{}' from lower half", index + 1, rect, digits);
                RegionReading {
                    index,
                    rect,
                    digits: Some(digits),
                    source: Some(ReadingSource::LowerHalf),
                }
            }
            None => {
                debug!("Rectangle {} {}: no digits", index + 1, rect);
                RegionReading::unrecognized(index, rect)
            }
        }
    }

    /// Read every rectangle of an already-decoded image.
    ///
    /// `None` or an empty list returns an empty result without touching the engine.
    pub fn recognize(&self, img: &DynamicImage, rects: Option<&[Rectangle]>) -> RecognitionResult {
        let rects = match rects {
            Some(rects) if !rects.is_empty() => rects,
            _ => return RecognitionResult::empty(),
        };

        let regions = if self.parallel {
            rects
                .par_iter()
                .enumerate()
                .map(|(i, rect)| self.read_rectangle(img, i, *rect))
                .collect()
        } else {
            rects
                .iter()
                .enumerate()
                .map(|(i, rect)| self.read_rectangle(img, i, *rect))
                .collect()
        };

        RecognitionResult { regions }
    }

    /// Load `path` and read every rectangle. An unreadable image gives an empty result.
    pub fn recognize_file(&self, path: &Path, rects: Option<&[Rectangle]>) -> RecognitionResult {
        if rects.is_none_or(|r| r.is_empty()) {
            return RecognitionResult::empty();
        }

        match load_image(path) {
            Ok(img) => self.recognize(&img, rects),
            Err(e) => {
                warn!("Skipping {}: {:#}", path.display(), e);
                RecognitionResult::empty()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::recognition::ocr::OcrConfig;
    use image::{GrayImage, Luma, Rgb, RgbImage};

    fn label_image() -> DynamicImage {
        // White label with a dark block in the lower part
        DynamicImage::ImageRgb8(RgbImage::from_fn(120, 60, |x, y| {
            if (20..100).contains(&x) && (40..50).contains(&y) {
                Rgb([10, 10, 10])
            } else {
                Rgb([240, 240, 240])
            }
        }))
    }

    #[test]
    fn test_standard_normalizer_steps() {
        assert_eq!(
            build_standard_normalizer().step_names(),
            vec!["Upscale", "Adaptive Threshold", "Polarity Correction", "Closing"]
        );
    }

    #[test]
    fn test_normalized_output_is_binary_and_light() {
        let normalizer = build_standard_normalizer();
        let out = normalizer.run(&label_image(), &PipelineContext::default());

        assert_eq!(out.dimensions(), (240, 120));
        assert!(out.pixels().all(|p| p[0] == 0 || p[0] == 255));
        assert!(preprocessing::mean_intensity(&out) >= preprocessing::MID_INTENSITY);
    }

    #[test]
    fn test_dark_label_normalizes_to_light_background() {
        let dark = DynamicImage::ImageLuma8(GrayImage::from_fn(80, 40, |x, y| {
            if (30..50).contains(&x) && (10..30).contains(&y) { Luma([250u8]) } else { Luma([5u8]) }
        }));
        let out = build_standard_normalizer().run(&dark, &PipelineContext::default());
        assert!(preprocessing::mean_intensity(&out) >= preprocessing::MID_INTENSITY);
    }

    #[test]
    fn test_read_crop_picks_plausible_length() {
        let engine = |_: &GrayImage, config: &OcrConfig| -> Result<String> {
            Ok(match config.mode.psm() {
                7 => "4821".to_string(),
                6 => "4821 2345".to_string(),
                _ => String::new(),
            })
        };
        let recognizer = DigitRecognizer::new(Arc::new(engine));
        assert_eq!(recognizer.read_crop(&label_image(), "t"), Some("48212345".to_string()));
    }

    #[test]
    fn test_degenerate_rectangle_reports_nothing() {
        let engine = |_: &GrayImage, _: &OcrConfig| -> Result<String> { Ok("12345678".to_string()) };
        let recognizer = DigitRecognizer::new(Arc::new(engine));

        let reading = recognizer.read_rectangle(&label_image(), 0, Rectangle::new(10, 10, 10, 50));
        assert_eq!(reading.digits, None);
        assert_eq!(reading.source, None);
    }
}
