use crate::pipeline::NormalizeStep;
use crate::recognition::preprocessing;
use image::GrayImage;
use imageproc::morphology::Mask;

/// Upscale by a fixed factor with cubic interpolation
pub struct UpscaleStep {
    pub factor: f32,
}

impl NormalizeStep for UpscaleStep {
    fn apply(&self, image: GrayImage) -> GrayImage {
        preprocessing::upscale(&image, self.factor)
    }

    fn name(&self) -> &str {
        "Upscale"
    }
}

/// Gaussian adaptive threshold
pub struct AdaptiveThresholdStep {
    pub block_size: u32,
    pub bias: i16,
}

impl NormalizeStep for AdaptiveThresholdStep {
    fn apply(&self, image: GrayImage) -> GrayImage {
        preprocessing::adaptive_threshold_gaussian(&image, self.block_size, self.bias)
    }

    fn name(&self) -> &str {
        "Adaptive Threshold"
    }
}

/// Flip to dark-on-light when the background reads as dark
pub struct PolarityStep;

impl NormalizeStep for PolarityStep {
    fn apply(&self, image: GrayImage) -> GrayImage {
        preprocessing::correct_polarity(image)
    }

    fn name(&self) -> &str {
        "Polarity Correction"
    }
}

/// Morphological closing with a 2x2 square
pub struct CloseStep {
    mask: Mask,
}

impl CloseStep {
    pub fn new() -> Self {
        Self {
            mask: preprocessing::square_mask_2x2(),
        }
    }
}

impl Default for CloseStep {
    fn default() -> Self {
        Self::new()
    }
}

impl NormalizeStep for CloseStep {
    fn apply(&self, image: GrayImage) -> GrayImage {
        preprocessing::close(&image, &self.mask)
    }

    fn name(&self) -> &str {
        "Closing"
    }
}
