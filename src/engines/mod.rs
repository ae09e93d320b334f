pub mod ocrs;
pub mod tesseract;

use anyhow::Result;
use clap::ValueEnum;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::info;

use crate::recognition::ocr::OcrEngine;
pub use self::ocrs::OcrsEngine;
pub use self::tesseract::TesseractEngine;

/// Available OCR backends
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum EngineKind {
    /// Tesseract command-line tool
    #[default]
    Tesseract,
    /// Pure-Rust ocrs models
    Ocrs,
}

/// Engine setup, resolved once at process start
#[derive(Debug, Clone, Default)]
pub struct EngineSettings {
    pub kind: EngineKind,
    /// Tesseract executable; probed from well-known locations when unset
    pub tesseract: Option<PathBuf>,
    pub tessdata_dir: Option<PathBuf>,
    pub language: Option<String>,
    /// ocrs model directory; `$HOME/.cache/ocrs` when unset
    pub model_dir: Option<PathBuf>,
}

/// Construct the configured engine
pub fn build_engine(settings: &EngineSettings) -> Result<Arc<dyn OcrEngine>> {
    match settings.kind {
        EngineKind::Tesseract => {
            let executable = tesseract::resolve_executable(settings.tesseract.as_deref());
            info!("Using Tesseract at {}", executable.display());

            let mut engine = TesseractEngine::new(executable)
                .with_tessdata_dir(settings.tessdata_dir.clone());
            if let Some(language) = &settings.language {
                engine = engine.with_language(language.clone());
            }
            Ok(Arc::new(engine))
        }
        EngineKind::Ocrs => {
            let model_dir = match &settings.model_dir {
                Some(dir) => dir.clone(),
                None => self::ocrs::default_model_dir()?,
            };
            info!("Loading ocrs models from {}", model_dir.display());
            Ok(Arc::new(OcrsEngine::from_model_dir(&model_dir)?))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_build_tesseract_engine() -> Result<()> {
        let settings = EngineSettings {
            tesseract: Some(PathBuf::from("/usr/bin/tesseract")),
            ..Default::default()
        };
        let engine = build_engine(&settings)?;
        assert_eq!(engine.name(), "tesseract");
        Ok(())
    }

    #[test]
    fn test_build_ocrs_engine_without_models_fails() -> Result<()> {
        let dir = tempfile::TempDir::new()?;
        let settings = EngineSettings {
            kind: EngineKind::Ocrs,
            model_dir: Some(dir.path().to_path_buf()),
            ..Default::default()
        };
        assert!(build_engine(&settings).is_err());
        Ok(())
    }
}
