use anyhow::Result;
use image::GrayImage;
use std::fmt;
use tracing::debug;

/// Character whitelist handed to the engine
pub const DIGIT_WHITELIST: &str = "0123456789";

/// Page segmentation mode the engine should assume
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SegmentationMode {
    /// Treat the image as a single text line
    SingleLine,
    /// Assume a single uniform block of text
    UniformBlock,
    /// Treat the image as a single word
    SingleWord,
}

impl SegmentationMode {
    /// Tesseract `--psm` value
    pub fn psm(self) -> u8 {
        match self {
            SegmentationMode::SingleLine => 7,
            SegmentationMode::UniformBlock => 6,
            SegmentationMode::SingleWord => 8,
        }
    }
}

/// One engine configuration: segmentation mode plus character whitelist.
///
/// Renders as a Tesseract-style argument string, e.g.
/// `--oem 3 --psm 7 -c tessedit_char_whitelist=0123456789`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OcrConfig {
    pub mode: SegmentationMode,
    pub whitelist: &'static str,
}

impl OcrConfig {
    pub const fn digits(mode: SegmentationMode) -> Self {
        Self {
            mode,
            whitelist: DIGIT_WHITELIST,
        }
    }

    pub fn args(&self) -> Vec<String> {
        vec![
            "--oem".to_string(),
            "3".to_string(),
            "--psm".to_string(),
            self.mode.psm().to_string(),
            "-c".to_string(),
            format!("tessedit_char_whitelist={}", self.whitelist),
        ]
    }
}

impl fmt::Display for OcrConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.args().join(" "))
    }
}

/// The configurations tried for every normalized bitmap, in order
pub const DIGIT_CONFIGS: [OcrConfig; 3] = [
    OcrConfig::digits(SegmentationMode::SingleLine),
    OcrConfig::digits(SegmentationMode::UniformBlock),
    OcrConfig::digits(SegmentationMode::SingleWord),
];

/// An OCR backend: binary image + configuration in, raw text out.
pub trait OcrEngine: Send + Sync {
    /// Human-readable name for this engine (used in log output)
    fn name(&self) -> &str {
        "ocr"
    }

    fn recognize(&self, image: &GrayImage, config: &OcrConfig) -> Result<String>;
}

impl<F> OcrEngine for F
where
    F: Fn(&GrayImage, &OcrConfig) -> Result<String> + Send + Sync,
{
    fn name(&self) -> &str {
        "fn"
    }

    fn recognize(&self, image: &GrayImage, config: &OcrConfig) -> Result<String> {
        self(image, config)
    }
}

/// Keep only ASCII digits
pub fn filter_digits(raw: &str) -> String {
    raw.chars().filter(|c| c.is_ascii_digit()).collect()
}

/// Run `image` through every configuration in [`DIGIT_CONFIGS`].
///
/// A configuration that fails counts as producing no text; the others still
/// run. Returns the non-empty digit strings in configuration order.
pub fn attempt_digits(engine: &dyn OcrEngine, image: &GrayImage) -> Vec<String> {
    attempt_digits_with(engine, image, &DIGIT_CONFIGS)
}

pub fn attempt_digits_with(
    engine: &dyn OcrEngine,
    image: &GrayImage,
    configs: &[OcrConfig],
) -> Vec<String> {
    let mut candidates = Vec::new();

    for config in configs {
        let raw = match engine.recognize(image, config) {
            Ok(text) => text,
            Err(e) => {
                debug!(engine = engine.name(), psm = config.mode.psm(), "OCR attempt failed: {:#}", e);
                continue;
            }
        };

        let digits = filter_digits(&raw);
        debug!(engine = engine.name(), psm = config.mode.psm(), raw = %raw.trim(), digits = %digits, "OCR attempt");
        if !digits.is_empty() {
            candidates.push(digits);
        }
    }

    candidates
}
