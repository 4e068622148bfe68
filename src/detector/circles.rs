//! Candidate accumulation over an accumulator-threshold sweep
//!
//! A sweep starts at a strict accumulator threshold and relaxes it one step at
//! a time, running a batch of Hough passes per step, until enough candidates
//! are collected or the threshold floor is reached.

use super::hough::{HoughParams, hough_circles};
use crate::models::Circle;
use image::GrayImage;
use tracing::debug;

/// Accumulator threshold schedule
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SweepSchedule {
    /// First (strictest) threshold
    pub start: u32,
    /// Exclusive floor
    pub stop: u32,
    /// Candidate count that ends the sweep
    pub max_candidates: usize,
}

impl SweepSchedule {
    /// Run `pass` once per threshold, collecting what it returns
    ///
    /// The candidate count is checked before each step, so the last step may
    /// overshoot `max_candidates`.
    pub fn run<F>(&self, mut pass: F) -> Vec<Circle>
    where
        F: FnMut(u32) -> Vec<Circle>,
    {
        let mut found = Vec::new();
        let mut param2 = self.start;
        while param2 > self.stop && found.len() < self.max_candidates {
            let batch = pass(param2);
            debug!(param2, batch = batch.len(), total = found.len() + batch.len(), "sweep step");
            found.extend(batch);
            param2 -= 1;
        }
        found
    }
}

/// Hough-circle pass on an edge map, rounded to integer circles
pub fn estimate_circles(edges: &GrayImage, param1: f32, param2: u32) -> Vec<Circle> {
    let params = HoughParams {
        min_dist: 1.0,
        param1,
        param2,
        min_radius: 0,
        max_radius: 0,
    };
    hough_circles(edges, &params)
        .iter()
        .map(|c| c.to_circle())
        .collect()
}

/// Component-wise mean of a candidate set, truncated toward zero
pub fn mean_circle(circles: &[Circle]) -> Option<Circle> {
    if circles.is_empty() {
        return None;
    }
    let n = circles.len() as f64;
    let mean = |f: fn(&Circle) -> i32| (circles.iter().map(|c| f(c) as f64).sum::<f64>() / n) as i32;
    Some(Circle::new(
        mean(|c| c.center_x),
        mean(|c| c.center_y),
        mean(|c| c.radius),
    ))
}
