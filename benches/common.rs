#![allow(dead_code)]

use image::{GrayImage, Luma};
use imageproc::drawing::draw_filled_circle_mut;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rust_iris::Circle;

/// Pupil and iris circles of [`synthetic_eye`]
pub fn eye_circles() -> (Circle, Circle) {
    (Circle::new(122, 118, 25), Circle::new(120, 120, 70))
}

/// 240x240 eye with a speckled iris ring
pub fn synthetic_eye(seed: u64) -> GrayImage {
    let (pupil, iris) = eye_circles();
    let mut img = GrayImage::from_pixel(240, 240, Luma([200]));
    draw_filled_circle_mut(&mut img, (iris.center_x, iris.center_y), iris.radius, Luma([110]));

    let mut rng = StdRng::seed_from_u64(seed);
    for i in 0..45 {
        let theta = rng.gen_range(0.0..std::f64::consts::TAU);
        let rho = rng.gen_range(36.0..60.0);
        let x = iris.center_x + (rho * theta.cos()).round() as i32;
        let y = iris.center_y + (rho * theta.sin()).round() as i32;
        let v = if i % 2 == 0 { 160 } else { 70 };
        draw_filled_circle_mut(&mut img, (x, y), rng.gen_range(2..=4), Luma([v]));
    }

    draw_filled_circle_mut(&mut img, (pupil.center_x, pupil.center_y), pupil.radius, Luma([10]));
    img
}
