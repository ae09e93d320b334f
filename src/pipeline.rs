use image::{DynamicImage, GrayImage};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use anyhow::Result;
use tracing::{debug, warn};

use crate::recognition::preprocessing::to_grayscale;

/// Debug configuration for pipeline execution
#[derive(Clone, Debug)]
pub struct DebugConfig {
    /// Root directory for debug outputs
    pub output_dir: PathBuf,
}

impl DebugConfig {
    /// The directory must be empty or non-existent; it is created if missing.
    pub fn new(output_dir: PathBuf) -> Result<Self> {
        if output_dir.exists() {
            let entries = std::fs::read_dir(&output_dir)?;
            if entries.count() > 0 {
                return Err(anyhow::anyhow!(
                    "Debug directory is not empty: {}",
                    output_dir.display()
                ));
            }
        } else {
            std::fs::create_dir_all(&output_dir)?;
        }

        Ok(Self { output_dir })
    }

    fn save(&self, label: &str, file_name: &str, image: &GrayImage) -> Result<PathBuf> {
        let dir = self.output_dir.join(label);
        std::fs::create_dir_all(&dir)?;
        let path = dir.join(file_name);
        image
            .save(&path)
            .map_err(|e| anyhow::anyhow!("Failed to save debug image: {}", e))?;
        Ok(path)
    }
}

/// Context available to all normalization steps
#[derive(Clone, Default)]
pub struct PipelineContext {
    pub debug: Option<DebugConfig>,
    /// Identifies the crop being processed in debug output, e.g. `rect01-full`
    pub label: String,
}

impl PipelineContext {
    pub fn new(debug: Option<DebugConfig>, label: impl Into<String>) -> Self {
        Self {
            debug,
            label: label.into(),
        }
    }

    fn save_debug_output(&self, step_index: usize, step_name: &str, image: &GrayImage) {
        let Some(debug_config) = &self.debug else {
            return;
        };

        let file_name = format!(
            "{:02}_{}.png",
            step_index,
            step_name.to_lowercase().replace(' ', "_")
        );
        match debug_config.save(&self.label, &file_name, image) {
            Ok(path) => debug!("Debug: saved {}", display_relative(&path, &debug_config.output_dir)),
            Err(e) => warn!("Debug output for {} skipped: {:#}", self.label, e),
        }
    }
}

fn display_relative(path: &Path, root: &Path) -> String {
    path.strip_prefix(root).unwrap_or(path).display().to_string()
}

/// A single image transform in the normalization pipeline
pub trait NormalizeStep: Send + Sync {
    fn apply(&self, image: GrayImage) -> GrayImage;

    /// Human-readable name for this step (used in logs and debug file names)
    fn name(&self) -> &str;
}

/// Composable normalizer: a region bitmap goes in, the OCR-ready binary image comes out.
#[derive(Clone, Default)]
pub struct Normalizer {
    steps: Vec<Arc<dyn NormalizeStep>>,
}

impl Normalizer {
    /// Create a normalizer with no steps (grayscale conversion only)
    pub fn new() -> Self {
        Self { steps: Vec::new() }
    }

    /// Add a processing step to the pipeline
    pub fn add_step(mut self, step: Arc<dyn NormalizeStep>) -> Self {
        self.steps.push(step);
        self
    }

    /// Helper method to add a step from a Box (for convenience)
    pub fn add_step_boxed(mut self, step: Box<dyn NormalizeStep>) -> Self {
        self.steps.push(Arc::from(step));
        self
    }

    pub fn step_names(&self) -> Vec<&str> {
        self.steps.iter().map(|s| s.name()).collect()
    }

    /// Run every step in order on a grayscale copy of `region`.
    pub fn run(&self, region: &DynamicImage, context: &PipelineContext) -> GrayImage {
        let mut image = to_grayscale(region);
        context.save_debug_output(0, "input", &image);

        for (idx, step) in self.steps.iter().enumerate() {
            image = step.apply(image);
            context.save_debug_output(idx + 1, step.name(), &image);
        }

        image
    }
}
