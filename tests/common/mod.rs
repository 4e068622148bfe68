//! Synthetic eye images shared by the integration tests

#![allow(dead_code)]

use image::{GrayImage, Luma};
use imageproc::drawing::draw_filled_circle_mut;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rust_iris::Circle;

pub const SCLERA: u8 = 200;
pub const IRIS: u8 = 110;
pub const PUPIL: u8 = 10;

/// Geometry of [`synthetic_eye`]
pub fn eye_circles() -> (Circle, Circle) {
    (Circle::new(122, 118, 25), Circle::new(120, 120, 70))
}

/// A black disk on a white background
pub fn disk(width: u32, height: u32, circle: Circle) -> GrayImage {
    let mut img = GrayImage::from_pixel(width, height, Luma([255]));
    draw_filled_circle_mut(&mut img, (circle.center_x, circle.center_y), circle.radius, Luma([0]));
    img
}

/// 240x240 eye: bright sclera, textured iris disk and a dark pupil
///
/// Texture spots are placed strictly inside the iris ring so they never touch
/// either boundary.
pub fn synthetic_eye(seed: u64) -> GrayImage {
    let (pupil, iris) = eye_circles();
    synthetic_eye_with(pupil, iris, seed)
}

/// [`synthetic_eye`] with explicit pupil and iris circles
pub fn synthetic_eye_with(pupil: Circle, iris: Circle, seed: u64) -> GrayImage {
    let mut img = GrayImage::from_pixel(240, 240, Luma([SCLERA]));
    draw_filled_circle_mut(&mut img, (iris.center_x, iris.center_y), iris.radius, Luma([IRIS]));

    let mut rng = StdRng::seed_from_u64(seed);
    let mut placed = 0;
    while placed < 45 {
        let theta = rng.gen_range(0.0..std::f64::consts::TAU);
        let rho = rng.gen_range(36.0..60.0);
        let x = iris.center_x + (rho * theta.cos()).round() as i32;
        let y = iris.center_y + (rho * theta.sin()).round() as i32;
        let r = rng.gen_range(2..=4);
        let v = if placed % 2 == 0 { 160 } else { 70 };
        draw_filled_circle_mut(&mut img, (x, y), r, Luma([v]));
        placed += 1;
    }

    draw_filled_circle_mut(&mut img, (pupil.center_x, pupil.center_y), pupil.radius, Luma([PUPIL]));
    img
}

pub fn within(found: Circle, expected: Circle, center_tol: i32, radius_tol: i32) -> bool {
    (found.center_x - expected.center_x).abs() <= center_tol
        && (found.center_y - expected.center_y).abs() <= center_tol
        && (found.radius - expected.radius).abs() <= radius_tol
}
