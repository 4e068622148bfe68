//! Gradient Hough transform for circles
//!
//! Each Canny edge pixel votes along its gradient line (both directions) for
//! every radius in range. The accumulator is summed over 3x3 neighbourhoods so
//! votes scattered by quantized gradient directions on sharp edges still
//! pile up on one cell. Peaks become center candidates; for each
//! center the radius is the distance band with the highest edge density
//! (count / radius), and the circle is kept when that band has enough support.

use super::canny::{Aperture, canny_from_gradients, sobel};
use crate::models::Circle;
use image::GrayImage;

/// Hough circle search parameters
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HoughParams {
    /// Minimum distance between accepted centers
    pub min_dist: f32,
    /// Upper Canny threshold (the lower one is half of it)
    pub param1: f32,
    /// Accumulator threshold for centers and minimum radius support
    pub param2: u32,
    /// Smallest radius considered
    pub min_radius: u32,
    /// Largest radius considered; 0 means the larger image side
    pub max_radius: u32,
}

impl Default for HoughParams {
    fn default() -> Self {
        Self {
            min_dist: 1.0,
            param1: 200.0,
            param2: 100,
            min_radius: 0,
            max_radius: 0,
        }
    }
}

/// A detected circle with sub-pixel radius and its support
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HoughCircle {
    /// Center column
    pub x: f32,
    /// Center row
    pub y: f32,
    /// Radius in pixels
    pub radius: f32,
    /// Edge pixels in the chosen radius band
    pub support: usize,
}

impl HoughCircle {
    /// Round to an integer circle (ties to even)
    pub fn to_circle(&self) -> Circle {
        Circle::new(
            self.x.round_ties_even() as i32,
            self.y.round_ties_even() as i32,
            self.radius.round_ties_even() as i32,
        )
    }
}

/// Width of a radius band
const RADIUS_BIN: f32 = 1.0;

/// Find circles in `image`, strongest centers first
pub fn hough_circles(image: &GrayImage, params: &HoughParams) -> Vec<HoughCircle> {
    let (w, h) = (image.width() as usize, image.height() as usize);
    if w < 3 || h < 3 {
        return Vec::new();
    }

    let grad = sobel(image, Aperture::Three);
    let edges = canny_from_gradients(&grad, (params.param1 / 2.0).max(1.0), params.param1);

    let min_r = params.min_radius.max(1) as f32;
    let max_r = if params.max_radius == 0 {
        w.max(h) as f32
    } else {
        params.max_radius as f32
    };
    if max_r < min_r {
        return Vec::new();
    }

    // Step 1: vote along gradient rays
    let mut acc = vec![0u32; w * h];
    let mut points: Vec<(f32, f32)> = Vec::new();
    for (idx, &e) in edges.as_raw().iter().enumerate() {
        if e == 0 {
            continue;
        }
        let (gx, gy) = (grad.gx[idx], grad.gy[idx]);
        let mag = gx.hypot(gy);
        if mag <= f32::EPSILON {
            continue;
        }
        let (x, y) = ((idx % w) as f32, (idx / w) as f32);
        points.push((x, y));

        let (ux, uy) = (gx / mag, gy / mag);
        for sign in [1.0f32, -1.0] {
            let mut r = min_r;
            while r <= max_r {
                let cx = (x + sign * ux * r).round();
                let cy = (y + sign * uy * r).round();
                if cx < 0.0 || cy < 0.0 || cx >= w as f32 || cy >= h as f32 {
                    break;
                }
                acc[cy as usize * w + cx as usize] += 1;
                r += 1.0;
            }
        }
    }
    if points.is_empty() {
        return Vec::new();
    }

    // Step 2: local maxima of the neighbourhood sums above threshold
    let acc = box_sum3(&acc, w, h);
    let mut centers: Vec<(usize, u32)> = Vec::new();
    for y in 1..h - 1 {
        for x in 1..w - 1 {
            let idx = y * w + x;
            let v = acc[idx];
            if v > params.param2
                && v > acc[idx - 1]
                && v >= acc[idx + 1]
                && v > acc[idx - w]
                && v >= acc[idx + w]
            {
                centers.push((idx, v));
            }
        }
    }
    centers.sort_by(|a, b| b.1.cmp(&a.1).then(a.0.cmp(&b.0)));

    // Step 3: radius per center from the densest distance band
    let min_dist2 = params.min_dist * params.min_dist;
    let (min_r2, max_r2) = (min_r * min_r, max_r * max_r);
    let mut circles: Vec<HoughCircle> = Vec::new();
    let mut dists: Vec<f32> = Vec::with_capacity(points.len());

    for (idx, _) in centers {
        let (cx, cy) = ((idx % w) as f32, (idx / w) as f32);
        let too_close = circles.iter().any(|c| {
            let (dx, dy) = (c.x - cx, c.y - cy);
            dx * dx + dy * dy < min_dist2
        });
        if too_close {
            continue;
        }

        dists.clear();
        for &(px, py) in &points {
            let (dx, dy) = (px - cx, py - cy);
            let d2 = dx * dx + dy * dy;
            if d2 >= min_r2 && d2 <= max_r2 {
                dists.push(d2.sqrt());
            }
        }
        dists.sort_by(f32::total_cmp);

        let Some((radius, support)) = densest_radius(&dists) else {
            continue;
        };
        if support > params.param2 as usize {
            circles.push(HoughCircle {
                x: cx,
                y: cy,
                radius,
                support,
            });
        }
    }

    circles
}

/// Sum of each cell and its 8 neighbours (cells outside the grid count as 0)
fn box_sum3(acc: &[u32], w: usize, h: usize) -> Vec<u32> {
    let mut rows = vec![0u32; w * h];
    for y in 0..h {
        let row = &acc[y * w..(y + 1) * w];
        for x in 0..w {
            let lo = x.saturating_sub(1);
            let hi = (x + 1).min(w - 1);
            rows[y * w + x] = row[lo..=hi].iter().sum();
        }
    }
    let mut out = vec![0u32; w * h];
    for y in 0..h {
        let lo = y.saturating_sub(1);
        let hi = (y + 1).min(h - 1);
        for x in 0..w {
            out[y * w + x] = (lo..=hi).map(|yy| rows[yy * w + x]).sum();
        }
    }
    out
}

/// Pick the radius band maximizing count / radius from sorted distances
fn densest_radius(sorted: &[f32]) -> Option<(f32, usize)> {
    let mut best: Option<(f32, usize)> = None;
    let mut start = 0usize;
    for j in 1..=sorted.len() {
        if j < sorted.len() && sorted[j] - sorted[start] <= RADIUS_BIN {
            continue;
        }
        let count = j - start;
        let r = sorted[start + count / 2];
        let better = match best {
            None => true,
            Some((best_r, best_count)) => count as f32 * best_r > best_count as f32 * r,
        };
        if better {
            best = Some((r, count));
        }
        start = j;
    }
    best
}
