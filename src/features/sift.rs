//! Difference-of-Gaussians keypoint detector and 128-d gradient descriptor
//!
//! The input is upsampled 2x and normalized to [0, 1]; each octave holds
//! `octave_layers + 3` Gaussian images and `octave_layers + 2` differences.
//! Keypoint coordinates and sizes are reported in input image pixels, and the
//! packed octave lets [`Sift::compute`] find the Gaussian layer again from a
//! deserialized keypoint.

use crate::models::{DescriptorMatrix, Keypoint};
use crate::utils::geometry::solve_linear_system;
use image::imageops::{FilterType, resize};
use image::{GrayImage, ImageBuffer, Luma};
use imageproc::filter::gaussian_blur_f32;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Descriptor length: 4x4 spatial cells of 8 orientation bins
pub const DESCRIPTOR_SIZE: usize = DESCR_WIDTH * DESCR_WIDTH * DESCR_BINS;

const DESCR_WIDTH: usize = 4;
const DESCR_BINS: usize = 8;
const DESCR_SCALE_FACTOR: f32 = 3.0;
const DESCR_MAG_THRESHOLD: f32 = 0.2;
const DESCR_INT_FACTOR: f32 = 512.0;

const ORI_HIST_BINS: usize = 36;
const ORI_SIGMA_FACTOR: f32 = 1.5;
const ORI_RADIUS: f32 = 3.0 * ORI_SIGMA_FACTOR;
const ORI_PEAK_RATIO: f32 = 0.8;

/// Blur assumed on the input image
const INIT_SIGMA: f32 = 0.5;
const IMAGE_BORDER: i32 = 5;
const MAX_INTERP_STEPS: usize = 5;

type FloatImage = ImageBuffer<Luma<f32>, Vec<f32>>;

/// Detector settings
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SiftConfig {
    /// Keep only the strongest N keypoints, 0 keeps all
    pub max_features: usize,
    /// Scale layers per octave
    pub octave_layers: usize,
    /// Minimum DoG contrast (scaled by layers per octave)
    pub contrast_threshold: f32,
    /// Maximum principal curvature ratio
    pub edge_threshold: f32,
    /// Blur of the base octave image
    pub sigma: f32,
}

impl Default for SiftConfig {
    fn default() -> Self {
        Self {
            max_features: 0,
            octave_layers: 3,
            contrast_threshold: 0.04,
            edge_threshold: 10.0,
            sigma: 1.6,
        }
    }
}

/// Scale-space pyramid of one image
struct Pyramid {
    /// `gaussians[o][i]`, `octave_layers + 3` images per octave
    gaussians: Vec<Vec<FloatImage>>,
    /// `dogs[o][i] = gaussians[o][i + 1] - gaussians[o][i]`
    dogs: Vec<Vec<FloatImage>>,
}

/// SIFT detector/descriptor
#[derive(Debug, Clone, Copy, Default)]
pub struct Sift {
    config: SiftConfig,
}

impl Sift {
    /// Create a detector
    pub fn new(config: SiftConfig) -> Self {
        Self { config }
    }

    /// Active settings
    pub fn config(&self) -> &SiftConfig {
        &self.config
    }

    /// Detect oriented keypoints, strongest first when `max_features` applies
    pub fn detect(&self, image: &GrayImage) -> Vec<Keypoint> {
        let Some(base) = self.base_image(image) else {
            return Vec::new();
        };
        let octaves = octave_count(base.width(), base.height());
        let pyramid = self.build_pyramid(base, octaves);

        let mut keypoints = Vec::new();
        for o in 0..pyramid.dogs.len() {
            for layer in 1..=self.layers() {
                self.scan_layer(&pyramid, o, layer, &mut keypoints);
            }
        }

        keypoints.sort_by(|a, b| {
            b.response
                .total_cmp(&a.response)
                .then(a.x.total_cmp(&b.x))
                .then(a.y.total_cmp(&b.y))
                .then(a.size.total_cmp(&b.size))
                .then(a.angle.total_cmp(&b.angle))
        });
        keypoints.dedup_by(|a, b| a.x == b.x && a.y == b.y && a.size == b.size && a.angle == b.angle);
        if self.config.max_features > 0 {
            keypoints.truncate(self.config.max_features);
        }
        debug!(keypoints = keypoints.len(), octaves, "keypoints detected");
        keypoints
    }

    /// Compute one descriptor row per keypoint, in order
    ///
    /// Keypoints whose octave does not exist for `image` get an all-zero row.
    pub fn compute(&self, image: &GrayImage, keypoints: &[Keypoint]) -> DescriptorMatrix {
        let mut out = DescriptorMatrix::new(DESCRIPTOR_SIZE);
        if keypoints.is_empty() {
            return out;
        }
        let Some(base) = self.base_image(image) else {
            for _ in keypoints {
                out.push_row(&[0.0; DESCRIPTOR_SIZE]);
            }
            return out;
        };

        let needed = keypoints.iter().map(|kp| kp.octave_layer().0 + 1).max().unwrap_or(1);
        let octaves = octave_count(base.width(), base.height()).max(needed);
        let pyramid = self.build_pyramid(base, octaves);

        let rows: Vec<[f32; DESCRIPTOR_SIZE]> = keypoints
            .par_iter()
            .map(|kp| {
                let (o, layer) = kp.octave_layer();
                let layer = layer.clamp(1, self.layers());
                let Some(img) = pyramid.gaussians.get(o).and_then(|g| g.get(layer)) else {
                    return [0.0; DESCRIPTOR_SIZE];
                };
                let scale = 2.0 / (1u32 << o) as f32;
                let mut angle = 360.0 - kp.angle;
                if (angle - 360.0).abs() < f32::EPSILON {
                    angle = 0.0;
                }
                descriptor(img, kp.x * scale, kp.y * scale, angle, kp.size * scale * 0.5)
            })
            .collect();
        for row in &rows {
            out.push_row(row);
        }
        out
    }

    /// Detect then describe
    pub fn detect_and_compute(&self, image: &GrayImage) -> (Vec<Keypoint>, DescriptorMatrix) {
        let keypoints = self.detect(image);
        let descriptors = self.compute(image, &keypoints);
        (keypoints, descriptors)
    }

    /// Scale layers per octave, at least one
    fn layers(&self) -> usize {
        self.config.octave_layers.max(1)
    }

    fn base_image(&self, image: &GrayImage) -> Option<FloatImage> {
        let (w, h) = image.dimensions();
        if w == 0 || h == 0 {
            return None;
        }
        let float: FloatImage =
            ImageBuffer::from_fn(w, h, |x, y| Luma([image.get_pixel(x, y)[0] as f32 / 255.0]));
        let upsampled = resize(&float, w * 2, h * 2, FilterType::Triangle);
        let sig_diff = (self.config.sigma * self.config.sigma - 4.0 * INIT_SIGMA * INIT_SIGMA)
            .max(0.01)
            .sqrt();
        Some(gaussian_blur_f32(&upsampled, sig_diff))
    }

    fn build_pyramid(&self, base: FloatImage, octaves: usize) -> Pyramid {
        let layers = self.layers();

        // Step 1: incremental blur between consecutive layers
        let k = 2f32.powf(1.0 / layers as f32);
        let mut sigmas = vec![self.config.sigma; layers + 3];
        for (i, s) in sigmas.iter_mut().enumerate().skip(1) {
            let prev = k.powi(i as i32 - 1) * self.config.sigma;
            let total = prev * k;
            *s = (total * total - prev * prev).sqrt();
        }

        // Step 2: Gaussian octaves, each seeded from layer `layers` of the previous one
        let mut gaussians: Vec<Vec<FloatImage>> = Vec::with_capacity(octaves);
        let mut seed = Some(base);
        while let Some(first) = seed.take() {
            let mut octave = Vec::with_capacity(layers + 3);
            octave.push(first);
            for sigma in sigmas.iter().skip(1) {
                let blurred = match octave.last() {
                    Some(prev) => gaussian_blur_f32(prev, *sigma),
                    None => break,
                };
                octave.push(blurred);
            }
            if gaussians.len() + 1 < octaves {
                seed = octave.get(layers).and_then(halve);
            }
            gaussians.push(octave);
        }

        // Step 3: differences
        let dogs = gaussians
            .iter()
            .map(|octave| octave.windows(2).map(|w| subtract(&w[1], &w[0])).collect())
            .collect();

        Pyramid { gaussians, dogs }
    }

    fn scan_layer(&self, pyramid: &Pyramid, o: usize, layer: usize, out: &mut Vec<Keypoint>) {
        let dogs = &pyramid.dogs[o];
        let (prev, cur, next) = (&dogs[layer - 1], &dogs[layer], &dogs[layer + 1]);
        let (w, h) = (cur.width() as i32, cur.height() as i32);
        let threshold = 0.5 * self.config.contrast_threshold / self.layers() as f32;

        for r in IMAGE_BORDER..h - IMAGE_BORDER {
            for c in IMAGE_BORDER..w - IMAGE_BORDER {
                let val = at(cur, c, r);
                if val.abs() <= threshold || !is_extremum(prev, cur, next, c, r, val) {
                    continue;
                }
                let Some(found) = self.refine(dogs, c, r, layer) else {
                    continue;
                };
                let scl_octv = found.size;
                let gaussian = &pyramid.gaussians[o][found.layer];
                let hist = orientation_histogram(
                    gaussian,
                    found.col,
                    found.row,
                    (ORI_RADIUS * scl_octv).round() as i32,
                    ORI_SIGMA_FACTOR * scl_octv,
                );
                let octave_scale = (1u32 << o) as f32 * 0.5;
                for angle in dominant_orientations(&hist) {
                    out.push(Keypoint {
                        x: found.x * octave_scale,
                        y: found.y * octave_scale,
                        size: found.size * (1u32 << o) as f32,
                        angle,
                        response: found.response,
                        octave: Keypoint::pack_octave(o, found.layer),
                        class_id: -1,
                    });
                }
            }
        }
    }

    /// Quadratic refinement of a DoG extremum plus contrast and edge tests
    fn refine(&self, dogs: &[FloatImage], c: i32, r: i32, layer: usize) -> Option<Refined> {
        let layers = self.layers();
        let (w, h) = (dogs[0].width() as i32, dogs[0].height() as i32);
        let (mut c, mut r, mut layer) = (c, r, layer);
        let (mut xc, mut xr, mut xi) = (0.0f32, 0.0f32, 0.0f32);

        let mut converged = false;
        for _ in 0..MAX_INTERP_STEPS {
            let (prev, cur, next) = (&dogs[layer - 1], &dogs[layer], &dogs[layer + 1]);
            let grad = gradient(prev, cur, next, c, r);
            let hessian = hessian(prev, cur, next, c, r);
            let x = solve_linear_system(&hessian, &grad)?;
            (xc, xr, xi) = (-x[0], -x[1], -x[2]);

            if xc.abs() < 0.5 && xr.abs() < 0.5 && xi.abs() < 0.5 {
                converged = true;
                break;
            }
            if xc.abs() > (i32::MAX / 3) as f32
                || xr.abs() > (i32::MAX / 3) as f32
                || xi.abs() > (i32::MAX / 3) as f32
            {
                return None;
            }

            c += xc.round() as i32;
            r += xr.round() as i32;
            let next_layer = layer as i32 + xi.round() as i32;
            if next_layer < 1
                || next_layer > layers as i32
                || c < IMAGE_BORDER
                || c >= w - IMAGE_BORDER
                || r < IMAGE_BORDER
                || r >= h - IMAGE_BORDER
            {
                return None;
            }
            layer = next_layer as usize;
        }
        if !converged {
            return None;
        }

        let (prev, cur, next) = (&dogs[layer - 1], &dogs[layer], &dogs[layer + 1]);
        let grad = gradient(prev, cur, next, c, r);
        let t = grad[0] * xc + grad[1] * xr + grad[2] * xi;
        let contrast = at(cur, c, r) + t * 0.5;
        if contrast.abs() * (layers as f32) < self.config.contrast_threshold {
            return None;
        }

        // Principal curvature ratio
        let v2 = at(cur, c, r) * 2.0;
        let dxx = at(cur, c + 1, r) + at(cur, c - 1, r) - v2;
        let dyy = at(cur, c, r + 1) + at(cur, c, r - 1) - v2;
        let dxy = (at(cur, c + 1, r + 1) - at(cur, c - 1, r + 1) - at(cur, c + 1, r - 1)
            + at(cur, c - 1, r - 1))
            * 0.25;
        let tr = dxx + dyy;
        let det = dxx * dyy - dxy * dxy;
        let edge = self.config.edge_threshold;
        if det <= 0.0 || tr * tr * edge >= (edge + 1.0) * (edge + 1.0) * det {
            return None;
        }

        Some(Refined {
            col: c,
            row: r,
            layer,
            x: c as f32 + xc,
            y: r as f32 + xr,
            size: self.config.sigma * 2f32.powf((layer as f32 + xi) / layers as f32),
            response: contrast.abs(),
        })
    }
}

/// Refined extremum in octave coordinates; `size` is the octave-local scale
struct Refined {
    col: i32,
    row: i32,
    layer: usize,
    x: f32,
    y: f32,
    size: f32,
    response: f32,
}

fn octave_count(width: u32, height: u32) -> usize {
    let min = width.min(height).max(1) as f32;
    ((min.log2() - 2.0).round() as i32).max(1) as usize
}

fn halve(image: &FloatImage) -> Option<FloatImage> {
    let (w, h) = (image.width() / 2, image.height() / 2);
    if w == 0 || h == 0 {
        return None;
    }
    Some(ImageBuffer::from_fn(w, h, |x, y| *image.get_pixel(x * 2, y * 2)))
}

fn subtract(a: &FloatImage, b: &FloatImage) -> FloatImage {
    let data = a.as_raw().iter().zip(b.as_raw()).map(|(x, y)| x - y).collect();
    FloatImage::from_raw(a.width(), a.height(), data)
        .unwrap_or_else(|| FloatImage::new(a.width(), a.height()))
}

#[inline]
fn at(image: &FloatImage, x: i32, y: i32) -> f32 {
    image.as_raw()[y as usize * image.width() as usize + x as usize]
}

fn is_extremum(prev: &FloatImage, cur: &FloatImage, next: &FloatImage, c: i32, r: i32, val: f32) -> bool {
    let mut greatest = true;
    let mut least = true;
    for img in [prev, cur, next] {
        for dy in -1..=1 {
            for dx in -1..=1 {
                let v = at(img, c + dx, r + dy);
                greatest &= val >= v;
                least &= val <= v;
            }
        }
    }
    (val > 0.0 && greatest) || (val < 0.0 && least)
}

fn gradient(prev: &FloatImage, cur: &FloatImage, next: &FloatImage, c: i32, r: i32) -> [f32; 3] {
    [
        (at(cur, c + 1, r) - at(cur, c - 1, r)) * 0.5,
        (at(cur, c, r + 1) - at(cur, c, r - 1)) * 0.5,
        (at(next, c, r) - at(prev, c, r)) * 0.5,
    ]
}

fn hessian(prev: &FloatImage, cur: &FloatImage, next: &FloatImage, c: i32, r: i32) -> [[f32; 3]; 3] {
    let v2 = at(cur, c, r) * 2.0;
    let dxx = at(cur, c + 1, r) + at(cur, c - 1, r) - v2;
    let dyy = at(cur, c, r + 1) + at(cur, c, r - 1) - v2;
    let dss = at(next, c, r) + at(prev, c, r) - v2;
    let dxy = (at(cur, c + 1, r + 1) - at(cur, c - 1, r + 1) - at(cur, c + 1, r - 1)
        + at(cur, c - 1, r - 1))
        * 0.25;
    let dxs = (at(next, c + 1, r) - at(next, c - 1, r) - at(prev, c + 1, r) + at(prev, c - 1, r)) * 0.25;
    let dys = (at(next, c, r + 1) - at(next, c, r - 1) - at(prev, c, r + 1) + at(prev, c, r - 1)) * 0.25;
    [[dxx, dxy, dxs], [dxy, dyy, dys], [dxs, dys, dss]]
}

/// Gradient angle in degrees, [0, 360)
#[inline]
fn angle_deg(dy: f32, dx: f32) -> f32 {
    let a = dy.atan2(dx).to_degrees();
    if a < 0.0 { a + 360.0 } else { a }
}

/// Smoothed, Gaussian-weighted histogram of gradient orientations
fn orientation_histogram(image: &FloatImage, col: i32, row: i32, radius: i32, sigma: f32) -> [f32; ORI_HIST_BINS] {
    let n = ORI_HIST_BINS as i32;
    let (w, h) = (image.width() as i32, image.height() as i32);
    let exp_scale = -1.0 / (2.0 * sigma * sigma);
    let mut raw = [0.0f32; ORI_HIST_BINS];

    for i in -radius..=radius {
        let y = row + i;
        if y <= 0 || y >= h - 1 {
            continue;
        }
        for j in -radius..=radius {
            let x = col + j;
            if x <= 0 || x >= w - 1 {
                continue;
            }
            let dx = at(image, x + 1, y) - at(image, x - 1, y);
            let dy = at(image, x, y - 1) - at(image, x, y + 1);
            let weight = (((i * i + j * j) as f32) * exp_scale).exp();
            let mut bin = ((n as f32 / 360.0) * angle_deg(dy, dx)).round() as i32;
            if bin >= n {
                bin -= n;
            }
            if bin < 0 {
                bin += n;
            }
            raw[bin as usize] += weight * (dx * dx + dy * dy).sqrt();
        }
    }

    // [1 4 6 4 1] / 16, circular
    let mut hist = [0.0f32; ORI_HIST_BINS];
    for (i, h) in hist.iter_mut().enumerate() {
        let t = |d: i32| raw[(i as i32 + d).rem_euclid(n) as usize];
        *h = (t(-2) + t(2)) * (1.0 / 16.0) + (t(-1) + t(1)) * (4.0 / 16.0) + t(0) * (6.0 / 16.0);
    }
    hist
}

/// Interpolated angles of every histogram peak within the ratio of the maximum
fn dominant_orientations(hist: &[f32; ORI_HIST_BINS]) -> Vec<f32> {
    let n = ORI_HIST_BINS;
    let max = hist.iter().copied().fold(0.0f32, f32::max);
    let threshold = max * ORI_PEAK_RATIO;
    let mut angles = Vec::new();
    for j in 0..n {
        let l = if j > 0 { j - 1 } else { n - 1 };
        let r = if j < n - 1 { j + 1 } else { 0 };
        if hist[j] > hist[l] && hist[j] > hist[r] && hist[j] >= threshold {
            let mut bin = j as f32 + 0.5 * (hist[l] - hist[r]) / (hist[l] - 2.0 * hist[j] + hist[r]);
            if bin < 0.0 {
                bin += n as f32;
            } else if bin >= n as f32 {
                bin -= n as f32;
            }
            let mut angle = 360.0 - (360.0 / n as f32) * bin;
            if (angle - 360.0).abs() < f32::EPSILON {
                angle = 0.0;
            }
            angles.push(angle);
        }
    }
    angles
}

/// Trilinearly interpolated 4x4x8 gradient histogram around (x, y)
fn descriptor(image: &FloatImage, x: f32, y: f32, angle: f32, scale: f32) -> [f32; DESCRIPTOR_SIZE] {
    let d = DESCR_WIDTH as i32;
    let n = DESCR_BINS as i32;
    let (w, h) = (image.width() as i32, image.height() as i32);
    let (pc, pr) = (x.round() as i32, y.round() as i32);

    let bins_per_deg = n as f32 / 360.0;
    let exp_scale = -1.0 / (d as f32 * d as f32 * 0.5);
    let hist_width = DESCR_SCALE_FACTOR * scale;
    let max_radius = ((w * w + h * h) as f32).sqrt();
    let radius = (hist_width * std::f32::consts::SQRT_2 * (d + 1) as f32 * 0.5)
        .round()
        .min(max_radius) as i32;
    let (sin_t, cos_t) = angle.to_radians().sin_cos();
    let (cos_t, sin_t) = (cos_t / hist_width, sin_t / hist_width);

    let stride_o = (n + 2) as usize;
    let stride_c = stride_o;
    let stride_r = (d + 2) as usize * stride_c;
    let mut hist = vec![0.0f32; (d + 2) as usize * stride_r];

    // Step 1: accumulate rotated samples
    for i in -radius..=radius {
        for j in -radius..=radius {
            let c_rot = j as f32 * cos_t - i as f32 * sin_t;
            let r_rot = j as f32 * sin_t + i as f32 * cos_t;
            let rbin = r_rot + d as f32 / 2.0 - 0.5;
            let cbin = c_rot + d as f32 / 2.0 - 0.5;
            let (r, c) = (pr + i, pc + j);
            if !(rbin > -1.0 && rbin < d as f32 && cbin > -1.0 && cbin < d as f32) {
                continue;
            }
            if r <= 0 || r >= h - 1 || c <= 0 || c >= w - 1 {
                continue;
            }

            let dx = at(image, c + 1, r) - at(image, c - 1, r);
            let dy = at(image, c, r - 1) - at(image, c, r + 1);
            let mag = (dx * dx + dy * dy).sqrt() * ((c_rot * c_rot + r_rot * r_rot) * exp_scale).exp();
            let obin = (angle_deg(dy, dx) - angle) * bins_per_deg;

            let (r0, c0, mut o0) = (rbin.floor(), cbin.floor(), obin.floor() as i32);
            let (rf, cf, of) = (rbin - r0, cbin - c0, obin - o0 as f32);
            if o0 < 0 {
                o0 += n;
            }
            if o0 >= n {
                o0 -= n;
            }

            let v_r1 = mag * rf;
            let v_r0 = mag - v_r1;
            let v_rc11 = v_r1 * cf;
            let v_rc10 = v_r1 - v_rc11;
            let v_rc01 = v_r0 * cf;
            let v_rc00 = v_r0 - v_rc01;

            let idx = (r0 as i32 + 1) as usize * stride_r + (c0 as i32 + 1) as usize * stride_c + o0 as usize;
            for (offset, v) in [
                (idx, v_rc00),
                (idx + stride_c, v_rc01),
                (idx + stride_r, v_rc10),
                (idx + stride_r + stride_c, v_rc11),
            ] {
                let v1 = v * of;
                hist[offset] += v - v1;
                hist[offset + 1] += v1;
            }
        }
    }

    // Step 2: fold the wrapped orientation bins and flatten
    let mut out = [0.0f32; DESCRIPTOR_SIZE];
    for i in 0..d as usize {
        for j in 0..d as usize {
            let idx = (i + 1) * stride_r + (j + 1) * stride_c;
            hist[idx] += hist[idx + n as usize];
            hist[idx + 1] += hist[idx + n as usize + 1];
            let dst = (i * d as usize + j) * n as usize;
            out[dst..dst + n as usize].copy_from_slice(&hist[idx..idx + n as usize]);
        }
    }

    // Step 3: clip large gradients, renormalize, quantize to 0..=255
    let norm = out.iter().map(|v| v * v).sum::<f32>().sqrt();
    let clip = norm * DESCR_MAG_THRESHOLD;
    for v in out.iter_mut() {
        *v = v.min(clip);
    }
    let norm = out.iter().map(|v| v * v).sum::<f32>().sqrt();
    let factor = DESCR_INT_FACTOR / norm.max(f32::EPSILON);
    for v in out.iter_mut() {
        *v = (*v * factor).round().clamp(0.0, 255.0);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use imageproc::drawing::draw_filled_circle_mut;

    fn blobs() -> GrayImage {
        let mut img = GrayImage::from_pixel(96, 96, Luma([30]));
        draw_filled_circle_mut(&mut img, (30, 30), 6, Luma([220]));
        draw_filled_circle_mut(&mut img, (66, 40), 4, Luma([200]));
        draw_filled_circle_mut(&mut img, (45, 70), 9, Luma([240]));
        img
    }

    #[test]
    fn test_blank_image_has_no_keypoints() {
        let img = GrayImage::from_pixel(64, 64, Luma([128]));
        assert!(Sift::default().detect(&img).is_empty());
    }

    #[test]
    fn test_empty_image() {
        let sift = Sift::default();
        assert!(sift.detect(&GrayImage::new(0, 0)).is_empty());
        let kp = [Keypoint::new(1.0, 1.0, 2.0)];
        let desc = sift.compute(&GrayImage::new(0, 0), &kp);
        assert_eq!(desc.rows(), 1);
    }

    #[test]
    fn test_blobs_yield_keypoints_near_centers() {
        let kps = Sift::default().detect(&blobs());
        assert!(!kps.is_empty());
        let near = |cx: f32, cy: f32| kps.iter().any(|k| (k.x - cx).hypot(k.y - cy) < 5.0);
        assert!(near(30.0, 30.0));
        assert!(near(45.0, 70.0));
        for kp in &kps {
            assert_eq!(kp.class_id, -1);
            assert!((0.0..360.0).contains(&kp.angle));
            assert!(kp.response > 0.0);
        }
    }

    #[test]
    fn test_descriptor_rows_match_keypoints() {
        let img = blobs();
        let sift = Sift::default();
        let (kps, desc) = sift.detect_and_compute(&img);
        assert_eq!(desc.rows(), kps.len());
        assert_eq!(desc.cols(), DESCRIPTOR_SIZE);
        for row in desc.iter_rows() {
            assert!(row.iter().all(|v| (0.0..=255.0).contains(v) && v.fract() == 0.0));
            assert!(row.iter().any(|&v| v > 0.0));
        }
    }

    #[test]
    fn test_detection_is_deterministic() {
        let img = blobs();
        let sift = Sift::default();
        let (a, da) = sift.detect_and_compute(&img);
        let (b, db) = sift.detect_and_compute(&img);
        assert_eq!(a, b);
        assert_eq!(da, db);
    }

    #[test]
    fn test_max_features_keeps_strongest() {
        let img = blobs();
        let all = Sift::default().detect(&img);
        let limited = Sift::new(SiftConfig { max_features: 2, ..SiftConfig::default() }).detect(&img);
        assert_eq!(limited.len(), all.len().min(2));
        assert_eq!(&all[..limited.len()], &limited[..]);
    }

    #[test]
    fn test_zero_layers_do_not_panic() {
        let img = blobs();
        let sift = Sift::new(SiftConfig { octave_layers: 0, ..SiftConfig::default() });
        let mut kp = Keypoint::new(20.0, 20.0, 4.0);
        kp.octave = Keypoint::pack_octave(0, 2);
        let desc = sift.compute(&img, &[kp]);
        assert_eq!(desc.rows(), 1);
        let (kps, desc) = sift.detect_and_compute(&img);
        assert_eq!(desc.rows(), kps.len());
    }

    #[test]
    fn test_orientation_of_horizontal_ramp() {
        // intensity grows to the right: gradient angle 0, keypoint angle 0
        let img = FloatImage::from_fn(21, 21, |x, _| Luma([x as f32 / 20.0]));
        let hist = orientation_histogram(&img, 10, 10, 6, 3.0);
        let angles = dominant_orientations(&hist);
        assert_eq!(angles.len(), 1);
        assert!(angles[0] < 1.0 || angles[0] > 359.0);
    }
}
