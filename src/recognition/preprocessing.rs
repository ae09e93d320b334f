use image::{DynamicImage, GrayImage, ImageBuffer, Luma};
use image::imageops::FilterType;
use imageproc::filter::separable_filter_equal;
use imageproc::morphology::{grayscale_close, Mask};

/// Single-channel floating point image for intermediate results
pub type FloatImage = ImageBuffer<Luma<f32>, Vec<f32>>;

/// Intensity separating "dark" from "light" binary images
pub const MID_INTENSITY: f64 = 127.0;

/// Convert image to grayscale
pub fn to_grayscale(img: &DynamicImage) -> GrayImage {
    img.to_luma8()
}

/// Scale both dimensions by `factor` using cubic (Catmull-Rom) interpolation
pub fn upscale(img: &GrayImage, factor: f32) -> GrayImage {
    let (width, height) = img.dimensions();
    let scaled_w = ((width as f32 * factor) as u32).max(1);
    let scaled_h = ((height as f32 * factor) as u32).max(1);

    image::imageops::resize(img, scaled_w, scaled_h, FilterType::CatmullRom)
}

/// Normalized 1-D Gaussian kernel with `size` taps.
///
/// Sigma is derived from the size the same way common vision libraries do
/// when none is given: `0.3 * ((size - 1) / 2 - 1) + 0.8`.
pub fn gaussian_kernel(size: u32) -> Vec<f32> {
    let size = size.max(1);
    let sigma = 0.3 * ((size as f32 - 1.0) * 0.5 - 1.0) + 0.8;
    let center = (size as f32 - 1.0) / 2.0;

    let weights: Vec<f32> = (0..size)
        .map(|i| {
            let d = i as f32 - center;
            (-(d * d) / (2.0 * sigma * sigma)).exp()
        })
        .collect();
    let sum: f32 = weights.iter().sum();

    weights.into_iter().map(|w| w / sum).collect()
}

/// Gaussian-weighted mean of the `block_size` x `block_size` neighborhood of
/// every pixel, kept in floating point. Edges replicate border pixels.
pub fn gaussian_local_mean(img: &GrayImage, block_size: u32) -> FloatImage {
    let kernel = gaussian_kernel(block_size);
    let (width, height) = img.dimensions();
    let float_img = FloatImage::from_fn(width, height, |x, y| Luma([img.get_pixel(x, y)[0] as f32]));

    separable_filter_equal(&float_img, kernel.as_slice())
}

/// Binarize with a per-pixel threshold: the Gaussian-weighted mean of the
/// `block_size` x `block_size` neighborhood, rounded, minus `bias`.
///
/// Pixels brighter than their local threshold become 255, all others 0.
pub fn adaptive_threshold_gaussian(img: &GrayImage, block_size: u32, bias: i16) -> GrayImage {
    let local_mean = gaussian_local_mean(img, block_size);
    let bias = bias as f32;

    let (width, height) = img.dimensions();
    GrayImage::from_fn(width, height, |x, y| {
        let src = img.get_pixel(x, y)[0] as f32;
        let mean = local_mean.get_pixel(x, y)[0].round();
        if src > mean - bias {
            Luma([255u8])
        } else {
            Luma([0u8])
        }
    })
}

/// Average pixel intensity (0.0 for an empty image)
pub fn mean_intensity(img: &GrayImage) -> f64 {
    let count = img.as_raw().len();
    if count == 0 {
        return 0.0;
    }
    let sum: u64 = img.as_raw().iter().map(|&p| p as u64).sum();
    sum as f64 / count as f64
}

/// Invert the image when its background reads as dark, so ink ends up
/// dark on a light background.
pub fn correct_polarity(mut img: GrayImage) -> GrayImage {
    if mean_intensity(&img) < MID_INTENSITY {
        image::imageops::invert(&mut img);
    }
    img
}

/// 2x2 square structuring element anchored at its bottom-right cell
pub fn square_mask_2x2() -> Mask {
    Mask::from_image(&GrayImage::from_pixel(2, 2, Luma([255u8])), 1, 1)
}

/// Morphological closing (dilation then erosion with the same mask)
pub fn close(img: &GrayImage, mask: &Mask) -> GrayImage {
    grayscale_close(img, mask)
}
