use anyhow::{anyhow, Result};
use image::GrayImage;
use std::path::{Path, PathBuf};
use std::process::Command;
use tempfile::NamedTempFile;
use tracing::debug;

use crate::recognition::ocr::{OcrConfig, OcrEngine};

/// Well-known install locations, checked in order
pub const CANDIDATE_PATHS: [&str; 5] = [
    r"C:\Program Files\Tesseract-OCR\tesseract.exe",
    r"C:\Program Files (x86)\Tesseract-OCR\tesseract.exe",
    "/usr/bin/tesseract",
    "/usr/local/bin/tesseract",
    "/opt/homebrew/bin/tesseract",
];

/// Resolve the Tesseract executable once at startup.
///
/// An explicit path always wins; otherwise the first existing well-known
/// location, falling back to `tesseract` on `PATH`.
pub fn resolve_executable(explicit: Option<&Path>) -> PathBuf {
    if let Some(path) = explicit {
        return path.to_path_buf();
    }

    CANDIDATE_PATHS
        .iter()
        .map(PathBuf::from)
        .find(|p| p.exists())
        .unwrap_or_else(|| PathBuf::from("tesseract"))
}

/// Runs the Tesseract command-line tool
#[derive(Debug, Clone)]
pub struct TesseractEngine {
    pub executable: PathBuf,
    pub tessdata_dir: Option<PathBuf>,
    pub language: String,
}

impl TesseractEngine {
    pub fn new(executable: impl Into<PathBuf>) -> Self {
        Self {
            executable: executable.into(),
            tessdata_dir: None,
            language: "eng".to_string(),
        }
    }

    pub fn with_tessdata_dir(mut self, dir: Option<PathBuf>) -> Self {
        self.tessdata_dir = dir;
        self
    }

    pub fn with_language(mut self, language: impl Into<String>) -> Self {
        self.language = language.into();
        self
    }

    /// Arguments following the input image path
    fn command_args(&self, config: &OcrConfig) -> Vec<String> {
        let mut args = vec!["stdout".to_string()];
        if let Some(dir) = &self.tessdata_dir {
            args.push("--tessdata-dir".to_string());
            args.push(dir.to_string_lossy().to_string());
        }
        args.push("-l".to_string());
        args.push(self.language.clone());
        args.extend(config.args());
        args
    }
}

impl OcrEngine for TesseractEngine {
    fn name(&self) -> &str {
        "tesseract"
    }

    fn recognize(&self, image: &GrayImage, config: &OcrConfig) -> Result<String> {
        // Save image to temporary file
        let temp_input = NamedTempFile::with_suffix(".png")?;
        image.save(temp_input.path())?;

        let args = self.command_args(config);
        debug!("Running {} {:?}", self.executable.display(), args);

        let output = Command::new(&self.executable)
            .arg(temp_input.path())
            .args(&args)
            .output()
            .map_err(|e| anyhow!("Failed to run {}: {}", self.executable.display(), e))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(anyhow!("Tesseract failed: {}", stderr.trim()));
        }

        Ok(String::from_utf8_lossy(&output.stdout).to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::recognition::ocr::DIGIT_CONFIGS;
    use image::Luma;

    #[test]
    fn test_explicit_path_wins() {
        let path = Path::new("/opt/custom/tesseract");
        assert_eq!(resolve_executable(Some(path)), PathBuf::from("/opt/custom/tesseract"));
    }

    #[test]
    fn test_resolve_without_explicit_path() {
        let resolved = resolve_executable(None);
        let known = CANDIDATE_PATHS.iter().any(|p| resolved == Path::new(p));
        assert!(known || resolved == Path::new("tesseract"));
    }

    #[test]
    fn test_command_args() {
        let engine = TesseractEngine::new("tesseract")
            .with_tessdata_dir(Some(PathBuf::from("/data/tessdata")))
            .with_language("deu");

        assert_eq!(
            engine.command_args(&DIGIT_CONFIGS[0]),
            vec![
                "stdout", "--tessdata-dir", "/data/tessdata", "-l", "deu",
                "--oem", "3", "--psm", "7", "-c", "tessedit_char_whitelist=0123456789",
            ]
        );
    }

    #[test]
    fn test_missing_executable_is_an_error() {
        let engine = TesseractEngine::new("/nonexistent/bin/tesseract-for-tests");
        let img = GrayImage::from_pixel(4, 4, Luma([255u8]));
        assert!(engine.recognize(&img, &DIGIT_CONFIGS[1]).is_err());
    }
}
