use barcode_digits::{OcrConfig, OcrEngine};
use image::{DynamicImage, GrayImage, Rgb, RgbImage};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use tempfile::NamedTempFile;

/// A 200x120 light label with vertical bars in the top half and a dark
/// digit-like strip in the bottom half.
pub fn label_image() -> DynamicImage {
    DynamicImage::ImageRgb8(RgbImage::from_fn(200, 120, |x, y| {
        let bar = y < 60 && x % 6 < 3;
        let digits = (80..100).contains(&y) && x % 10 < 6;
        if bar || digits {
            Rgb([15u8, 15u8, 15u8])
        } else {
            Rgb([235u8, 235u8, 235u8])
        }
    }))
}

/// Writes [`label_image`] to a temporary PNG.
/// The file will be automatically cleaned up when dropped.
pub fn label_image_file() -> NamedTempFile {
    let file = tempfile::Builder::new()
        .suffix(".png")
        .tempfile()
        .expect("Failed to create temp image file");
    label_image()
        .save_with_format(file.path(), image::ImageFormat::Png)
        .expect("Failed to save test image");
    file
}

/// Wraps a scripted engine and counts its invocations.
pub fn scripted<F>(f: F) -> (Arc<dyn OcrEngine>, Arc<AtomicUsize>)
where
    F: Fn(&GrayImage, &OcrConfig) -> anyhow::Result<String> + Send + Sync + 'static,
{
    let calls = Arc::new(AtomicUsize::new(0));
    let counter = calls.clone();
    let engine: Arc<dyn OcrEngine> = Arc::new(move |img: &GrayImage, config: &OcrConfig| {
        counter.fetch_add(1, Ordering::SeqCst);
        f(img, config)
    });
    (engine, calls)
}

/// Engine whose answer depends only on the normalized pixels
pub fn pixel_engine() -> (Arc<dyn OcrEngine>, Arc<AtomicUsize>) {
    scripted(|img, config| {
        let dark = img.pixels().filter(|p| p[0] == 0).count();
        Ok(format!("{}-{}", config.mode.psm(), dark))
    })
}

pub fn call_count(calls: &AtomicUsize) -> usize {
    calls.load(Ordering::SeqCst)
}
