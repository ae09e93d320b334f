use anyhow::Result;
use image::{DynamicImage, GrayImage};
use ::ocrs::{ImageSource, OcrEngineParams};
use rten::Model;
use std::path::{Path, PathBuf};

use crate::recognition::ocr::{OcrConfig, OcrEngine, SegmentationMode};

pub const DETECTION_MODEL: &str = "text-detection.rten";
pub const RECOGNITION_MODEL: &str = "text-recognition.rten";

/// Standard model cache location, `$HOME/.cache/ocrs`
pub fn default_model_dir() -> Result<PathBuf> {
    let home_dir = std::env::var("HOME")
        .or_else(|_| std::env::var("USERPROFILE"))?;
    Ok(Path::new(&home_dir).join(".cache/ocrs"))
}

/// Pure-Rust engine backed by `ocrs`.
///
/// `ocrs` has no segmentation modes or whitelist; the mode only decides how
/// much of the recognized text is returned and digit filtering does the rest.
pub struct OcrsEngine {
    engine: ::ocrs::OcrEngine,
}

impl OcrsEngine {
    /// Load the detection and recognition models from `model_dir`
    pub fn from_model_dir(model_dir: &Path) -> Result<Self> {
        let detection_model_path = model_dir.join(DETECTION_MODEL);
        let recognition_model_path = model_dir.join(RECOGNITION_MODEL);

        if !detection_model_path.exists() || !recognition_model_path.exists() {
            anyhow::bail!(
                "OCR models not found. Please run: ocrs-cli --help (or download models manually)\n\
                 Expected locations:\n  - {}\n  - {}",
                detection_model_path.display(),
                recognition_model_path.display()
            );
        }

        let detection_model = Model::load_file(&detection_model_path)?;
        let recognition_model = Model::load_file(&recognition_model_path)?;

        let engine = ::ocrs::OcrEngine::new(OcrEngineParams {
            detection_model: Some(detection_model),
            recognition_model: Some(recognition_model),
            ..Default::default()
        })?;

        Ok(Self { engine })
    }
}

/// Cut full-page text down to what the segmentation mode asks for
pub fn select_for_mode(text: &str, mode: SegmentationMode) -> String {
    match mode {
        SegmentationMode::UniformBlock => text.to_string(),
        SegmentationMode::SingleLine => text
            .lines()
            .map(str::trim)
            .find(|l| !l.is_empty())
            .unwrap_or_default()
            .to_string(),
        SegmentationMode::SingleWord => text
            .split_whitespace()
            .next()
            .unwrap_or_default()
            .to_string(),
    }
}

impl OcrEngine for OcrsEngine {
    fn name(&self) -> &str {
        "ocrs"
    }

    fn recognize(&self, image: &GrayImage, config: &OcrConfig) -> Result<String> {
        let img = DynamicImage::ImageLuma8(image.clone()).to_rgb8();

        let img_source = ImageSource::from_bytes(img.as_raw(), img.dimensions())
            .map_err(|e| anyhow::anyhow!("Invalid OCR input: {:?}", e))?;
        let ocr_input = self.engine.prepare_input(img_source)?;
        let text = self.engine.get_text(&ocr_input)?;

        Ok(select_for_mode(&text, config.mode))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const PAGE: &str = "\n  4006381 333931 \n 12 34\n";

    #[test]
    fn test_block_keeps_everything() {
        assert_eq!(select_for_mode(PAGE, SegmentationMode::UniformBlock), PAGE);
    }

    #[test]
    fn test_single_line_takes_first_non_empty_line() {
        assert_eq!(select_for_mode(PAGE, SegmentationMode::SingleLine), "4006381 333931");
    }

    #[test]
    fn test_single_word_takes_first_token() {
        assert_eq!(select_for_mode(PAGE, SegmentationMode::SingleWord), "4006381");
        assert_eq!(select_for_mode("   ", SegmentationMode::SingleWord), "");
    }

    #[test]
    fn test_missing_models_is_an_error() -> Result<()> {
        let dir = tempfile::TempDir::new()?;
        let err = OcrsEngine::from_model_dir(dir.path()).err().map(|e| e.to_string());
        assert!(err.is_some_and(|msg| msg.contains("OCR models not found")));
        Ok(())
    }
}
