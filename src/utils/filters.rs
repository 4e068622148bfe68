//! Pixel-level filters used by boundary localization and segmentation
//!
//! Thin wrappers over `imageproc` where it has the operation, plain loops over
//! the raw buffer where it does not.

use image::{GrayImage, Luma};
use imageproc::distance_transform::Norm;
use imageproc::filter::{gaussian_blur_f32, median_filter};
use imageproc::morphology::dilate;

/// Median filter over a (2 * radius + 1) square window
pub fn median_blur(image: &GrayImage, radius: u32) -> GrayImage {
    median_filter(image, radius, radius)
}

/// Inverse binary threshold: pixels above `thresh` become 0, the rest 255
pub fn threshold_binary_inv(image: &GrayImage, thresh: u8) -> GrayImage {
    let mut out = image.clone();
    for p in out.iter_mut() {
        *p = if *p > thresh { 0 } else { 255 };
    }
    out
}

/// To-zero threshold in place: pixels at or below `thresh` become 0
pub fn threshold_to_zero(image: &mut GrayImage, thresh: u8) {
    for p in image.iter_mut() {
        if *p <= thresh {
            *p = 0;
        }
    }
}

/// Fill every hole of the foreground (non-zero) regions
///
/// Background pixels that cannot reach the image border through
/// 4-connected background are enclosed by an outer contour and become 255.
pub fn fill_external_contours(binary: &GrayImage) -> GrayImage {
    let (width, height) = (binary.width() as usize, binary.height() as usize);
    let src = binary.as_raw();
    let mut outside = vec![false; width * height];
    let mut stack: Vec<usize> = Vec::new();

    let seed = |idx: usize, outside: &mut Vec<bool>, stack: &mut Vec<usize>| {
        if src[idx] == 0 && !outside[idx] {
            outside[idx] = true;
            stack.push(idx);
        }
    };

    // Step 1: seed from the border
    for x in 0..width {
        seed(x, &mut outside, &mut stack);
        if height > 1 {
            seed((height - 1) * width + x, &mut outside, &mut stack);
        }
    }
    for y in 0..height {
        seed(y * width, &mut outside, &mut stack);
        if width > 1 {
            seed(y * width + width - 1, &mut outside, &mut stack);
        }
    }

    // Step 2: flood the background
    while let Some(idx) = stack.pop() {
        let (x, y) = (idx % width, idx / width);
        if x > 0 {
            seed(idx - 1, &mut outside, &mut stack);
        }
        if x + 1 < width {
            seed(idx + 1, &mut outside, &mut stack);
        }
        if y > 0 {
            seed(idx - width, &mut outside, &mut stack);
        }
        if y + 1 < height {
            seed(idx + width, &mut outside, &mut stack);
        }
    }

    // Step 3: everything not reached is foreground or an enclosed hole
    let data = outside.iter().map(|&o| if o { 0 } else { 255 }).collect();
    GrayImage::from_raw(binary.width(), binary.height(), data)
        .unwrap_or_else(|| GrayImage::new(binary.width(), binary.height()))
}

/// Dilate with a 3x3 square element applied `iterations` times
pub fn dilate_square(image: &GrayImage, iterations: u8) -> GrayImage {
    if iterations == 0 {
        return image.clone();
    }
    // n passes of a 3x3 square equal one pass of the L∞ ball of radius n
    dilate(image, Norm::LInf, iterations)
}

/// Gaussian sigma implied by an odd kernel size when none is given
pub fn gaussian_sigma_for_kernel(ksize: u32) -> f32 {
    0.3 * ((ksize as f32 - 1.0) * 0.5 - 1.0) + 0.8
}

/// Gaussian blur sized by an odd kernel width
pub fn gaussian_blur_kernel(image: &GrayImage, ksize: u32) -> GrayImage {
    gaussian_blur_f32(image, gaussian_sigma_for_kernel(ksize))
}

/// Histogram equalization
///
/// The lowest occupied intensity maps to 0 and the cumulative histogram
/// above it is stretched to [0, 255]. Constant images are returned as-is.
pub fn equalize_histogram(image: &GrayImage) -> GrayImage {
    let mut histogram = [0u32; 256];
    for &pixel in image.as_raw() {
        histogram[pixel as usize] += 1;
    }

    let total = image.as_raw().len() as u64;
    let Some(first) = histogram.iter().position(|&count| count > 0) else {
        return image.clone();
    };
    if histogram[first] as u64 == total {
        return image.clone();
    }

    let scale = 255.0 / (total - histogram[first] as u64) as f64;
    let mut lut = [0u8; 256];
    let mut sum = 0u64;
    for i in (first + 1)..256 {
        sum += histogram[i] as u64;
        lut[i] = (sum as f64 * scale).round().clamp(0.0, 255.0) as u8;
    }

    let mut out = image.clone();
    for p in out.iter_mut() {
        *p = lut[*p as usize];
    }
    out
}

/// Saturating `alpha * a + beta * b + gamma`
pub fn add_weighted(a: &GrayImage, alpha: f32, b: &GrayImage, beta: f32, gamma: f32) -> GrayImage {
    let mut out = GrayImage::new(a.width(), a.height());
    for (x, y, pixel) in out.enumerate_pixels_mut() {
        let va = a.get_pixel(x, y)[0] as f32;
        let vb = b.get_pixel(x, y)[0] as f32;
        let v = (alpha * va + beta * vb + gamma).round().clamp(0.0, 255.0);
        *pixel = Luma([v as u8]);
    }
    out
}

/// Keep `image` pixels where `mask` is non-zero, zero elsewhere
pub fn apply_mask(image: &GrayImage, mask: &GrayImage) -> GrayImage {
    let mut out = image.clone();
    for (p, &m) in out.iter_mut().zip(mask.as_raw()) {
        if m == 0 {
            *p = 0;
        }
    }
    out
}
