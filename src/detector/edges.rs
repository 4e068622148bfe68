//! Edge maps fed to circle estimation
//!
//! Canny edges are thickened by dilation and smoothed by a Gaussian whose
//! odd kernel size is drawn at random per call, which spreads the Hough votes
//! of repeated passes over slightly different edge profiles.

use super::canny::{Aperture, canny};
use crate::utils::filters::{
    dilate_square, fill_external_contours, gaussian_blur_kernel, median_blur, threshold_binary_inv,
};
use image::GrayImage;
use rand::Rng;

/// Parameters of one edge extraction pass
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EdgeParams {
    /// Canny hysteresis low threshold
    pub canny_low: f32,
    /// Canny hysteresis high threshold
    pub canny_high: f32,
    /// Sobel aperture used by Canny
    pub aperture: Aperture,
    /// 3x3 dilation passes after Canny
    pub dilate_iterations: u8,
    /// Inclusive range of odd Gaussian kernel sizes to sample from
    pub blur_kernel_range: (u32, u32),
}

/// Canny → dilate → randomized Gaussian blur
#[derive(Debug, Clone, Copy)]
pub struct EdgeExtractor {
    params: EdgeParams,
}

impl EdgeExtractor {
    /// Create an extractor with fixed thresholds
    pub fn new(params: EdgeParams) -> Self {
        Self { params }
    }

    /// Parameters in use
    pub fn params(&self) -> &EdgeParams {
        &self.params
    }

    /// Produce a blurred edge map of `image`
    pub fn extract<R: Rng + ?Sized>(&self, image: &GrayImage, rng: &mut R) -> GrayImage {
        let p = &self.params;
        let edges = canny(image, p.canny_low, p.canny_high, p.aperture);
        let thick = dilate_square(&edges, p.dilate_iterations);
        let ksize = random_odd_kernel(rng, p.blur_kernel_range);
        gaussian_blur_kernel(&thick, ksize)
    }
}

/// Draw an odd kernel size from `[lo, hi]` (both rounded to odd values)
pub fn random_odd_kernel<R: Rng + ?Sized>(rng: &mut R, (lo, hi): (u32, u32)) -> u32 {
    let (lo, hi) = (lo / 2, (hi / 2).max(lo / 2));
    2 * rng.gen_range(lo..=hi) + 1
}

/// Dark-blob mask: median smoothing, inverse threshold, holes filled
///
/// Pixels at or below `threshold` (the pupil) become 255, and specular
/// highlights enclosed by the blob are filled in.
pub fn dark_blob_mask(image: &GrayImage, median_radius: u32, threshold: u8) -> GrayImage {
    let smoothed = median_blur(image, median_radius);
    let binary = threshold_binary_inv(&smoothed, threshold);
    fill_external_contours(&binary)
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Luma;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    #[test]
    fn test_random_odd_kernel_in_range() {
        let mut rng = StdRng::seed_from_u64(7);
        for _ in 0..200 {
            let k = random_odd_kernel(&mut rng, (11, 21));
            assert!(k % 2 == 1);
            assert!((11..=21).contains(&k));
        }
    }

    #[test]
    fn test_dark_blob_mask_fills_highlight() {
        let mut img = GrayImage::from_pixel(40, 40, Luma([200]));
        for y in 10..30 {
            for x in 10..30 {
                img.put_pixel(x, y, Luma([5]));
            }
        }
        // specular highlight inside the pupil
        for y in 18..21 {
            for x in 18..21 {
                img.put_pixel(x, y, Luma([255]));
            }
        }
        let mask = dark_blob_mask(&img, 0, 30);
        assert_eq!(mask.get_pixel(19, 19)[0], 255);
        assert_eq!(mask.get_pixel(12, 12)[0], 255);
        assert_eq!(mask.get_pixel(2, 2)[0], 0);
    }

    #[test]
    fn test_extract_blurs_edges() {
        let img = GrayImage::from_fn(40, 40, |x, _| if x < 20 { Luma([0]) } else { Luma([255]) });
        let extractor = EdgeExtractor::new(EdgeParams {
            canny_low: 20.0,
            canny_high: 100.0,
            aperture: Aperture::Three,
            dilate_iterations: 1,
            blur_kernel_range: (5, 5),
        });
        let mut rng = StdRng::seed_from_u64(1);
        let edges = extractor.extract(&img, &mut rng);
        let peak = edges.get_pixel(19, 20)[0];
        assert!(peak > 100);
        assert!(edges.get_pixel(21, 20)[0] < peak || edges.get_pixel(22, 20)[0] < peak);
        assert_eq!(edges.get_pixel(2, 20)[0], 0);
    }
}
