//! Iris annulus segmentation
//!
//! The annulus between the pupil and iris circles is masked, cleared of the
//! upper eyelid band, equalized, and copied into four region canvases. Each
//! canvas places the iris center at a fixed spot, so region-local circles
//! depend only on the iris radius and the pupil offset.

use crate::models::{Circle, RegionName, RegionRecord, Regions};
use crate::utils::filters::{add_weighted, apply_mask, equalize_histogram, threshold_to_zero};
use crate::utils::geometry::angle_v;
use image::{GrayImage, Luma};
use imageproc::drawing::draw_filled_circle_mut;
use tracing::debug;

/// Polar band (degrees, exclusive) occluded by the upper eyelid
pub const EYELID_BAND: (f64, f64) = (50.0, 130.0);

/// Residual values at or below this are cleared before equalization
pub const NOISE_FLOOR: u8 = 50;

/// Masked, eyelid-cleared and equalized iris annulus in source coordinates
pub fn equalized_annulus(image: &GrayImage, pupil: &Circle, ext: &Circle) -> GrayImage {
    // Step 1: keep only the ring between the two circles
    let mut mask = GrayImage::new(image.width(), image.height());
    draw_filled_circle_mut(&mut mask, (ext.center_x, ext.center_y), ext.radius, Luma([255]));
    draw_filled_circle_mut(&mut mask, (pupil.center_x, pupil.center_y), pupil.radius, Luma([0]));
    let mut roi = apply_mask(image, &mask);

    // Step 2: clear the eyelid band and residual noise
    let (ecx, ecy) = ext.center();
    for (x, y, pixel) in roi.enumerate_pixels_mut() {
        let theta = angle_v(ecx, ecy, x as f64, y as f64);
        if theta > EYELID_BAND.0 && theta < EYELID_BAND.1 {
            *pixel = Luma([0]);
        }
    }
    threshold_to_zero(&mut roi, NOISE_FLOOR);

    // Step 3: equalize
    let equalized = equalize_histogram(&roi);
    add_weighted(&roi, 0.0, &equalized, 1.0, 0.0)
}

/// Copy annulus pixels into each region's canvas
///
/// A pixel is eligible when it lies outside the pupil disk and inside the
/// iris disk; it lands in every region whose pixel band contains its angle.
pub fn route_regions(annulus: &GrayImage, pupil: &Circle, ext: &Circle) -> Regions {
    let mut canvases: Vec<(GrayImage, (i32, i32))> = RegionName::ALL
        .iter()
        .map(|&name| {
            let (w, h) = name.canvas_size(ext.radius);
            let (cx, cy) = name.canonical_center(ext.radius);
            (GrayImage::new(w, h), (cx - ext.center_x, cy - ext.center_y))
        })
        .collect();

    let (ecx, ecy) = ext.center();
    for (x, y, pixel) in annulus.enumerate_pixels() {
        let (fx, fy) = (x as f64, y as f64);
        if pupil.contains(fx, fy) || !ext.contains(fx, fy) {
            continue;
        }
        let theta = angle_v(ecx, ecy, fx, fy);
        for (name, (canvas, (dx, dy))) in RegionName::ALL.iter().zip(canvases.iter_mut()) {
            if !name.contains_pixel_angle(theta) {
                continue;
            }
            let (tx, ty) = (x as i64 + *dx as i64, y as i64 + *dy as i64);
            if tx >= 0 && ty >= 0 && (tx as u32) < canvas.width() && (ty as u32) < canvas.height() {
                canvas.put_pixel(tx as u32, ty as u32, *pixel);
            }
        }
    }

    let mut canvases = canvases.into_iter();
    Regions::from_fn(|name| {
        let (image, (dx, dy)) = canvases
            .next()
            .unwrap_or_else(|| (GrayImage::new(0, 0), (0, 0)));
        let (cx, cy) = name.canonical_center(ext.radius);
        RegionRecord::new(
            name,
            image,
            pupil.translate(dx, dy),
            Circle::new(cx, cy, ext.radius),
        )
    })
}

/// Splits an eye image into the four iris regions
#[derive(Debug, Clone, Copy, Default)]
pub struct RegionSegmenter;

impl RegionSegmenter {
    /// Create a segmenter
    pub fn new() -> Self {
        Self
    }

    /// Equalize the annulus and route it into region canvases
    pub fn segment(&self, image: &GrayImage, pupil: &Circle, ext: &Circle) -> Regions {
        let annulus = equalized_annulus(image, pupil, ext);
        let regions = route_regions(&annulus, pupil, ext);
        for record in &regions {
            debug!(
                region = %record.name,
                width = record.image.width(),
                height = record.image.height(),
                pupil = %record.pupil_circle,
                "region segmented"
            );
        }
        regions
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_eyelid_band_cleared() {
        let img = GrayImage::from_pixel(101, 101, Luma([200]));
        let pupil = Circle::new(50, 50, 10);
        let ext = Circle::new(50, 50, 40);
        let eq = equalized_annulus(&img, &pupil, &ext);
        // straight up is inside the band
        assert_eq!(eq.get_pixel(50, 20)[0], 0);
        // straight right is not
        assert_eq!(eq.get_pixel(80, 50)[0], 255);
        // pupil and outside stay dark
        assert_eq!(eq.get_pixel(50, 50)[0], 0);
        assert_eq!(eq.get_pixel(0, 0)[0], 0);
    }

    #[test]
    fn test_noise_floor_cleared() {
        let img = GrayImage::from_pixel(101, 101, Luma([40]));
        let eq = equalized_annulus(&img, &Circle::new(50, 50, 10), &Circle::new(50, 50, 40));
        assert!(eq.as_raw().iter().all(|&v| v == 0));
    }

    #[test]
    fn test_region_circles_are_canonical() {
        let img = GrayImage::from_pixel(200, 200, Luma([180]));
        let pupil = Circle::new(102, 98, 20);
        let ext = Circle::new(100, 100, 60);
        let regions = RegionSegmenter::new().segment(&img, &pupil, &ext);

        let right = &regions[RegionName::RightSide];
        assert_eq!(right.ext_circle, Circle::new(0, 75, 60));
        assert_eq!(right.pupil_circle, Circle::new(2, 73, 20));
        assert_eq!(right.image.dimensions(), (75, 150));

        let bottom = &regions[RegionName::Bottom];
        assert_eq!(bottom.ext_circle, Circle::new(75, 0, 60));
        assert_eq!(bottom.image.dimensions(), (150, 75));

        let complete = &regions[RegionName::Complete];
        assert_eq!(complete.ext_circle, Circle::new(75, 75, 60));
        assert_eq!(complete.pupil_circle, Circle::new(77, 73, 20));
    }

    #[test]
    fn test_side_regions_only_hold_their_band() {
        let img = GrayImage::from_pixel(200, 200, Luma([180]));
        let pupil = Circle::new(100, 100, 20);
        let ext = Circle::new(100, 100, 60);
        let regions = RegionSegmenter::new().segment(&img, &pupil, &ext);

        // right of center at 40px: θ = 0
        let right = &regions[RegionName::RightSide];
        assert_eq!(right.image.get_pixel(40, 75)[0], 255);
        let left = &regions[RegionName::LeftSide];
        assert_eq!(left.image.get_pixel(35, 75)[0], 255);
        // below center at 40px: θ = -90, bottom only
        let bottom = &regions[RegionName::Bottom];
        assert_eq!(bottom.image.get_pixel(75, 40)[0], 255);
        assert_eq!(regions[RegionName::Complete].image.get_pixel(75, 115)[0], 255);
    }
}
