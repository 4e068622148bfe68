use super::circles::{SweepSchedule, estimate_circles, mean_circle};
use super::edges::{EdgeExtractor, EdgeParams};
use super::filter::filter_circles;
use super::pupil::PupilLocator;
use crate::config::{IrisSweepConfig, RecognizerConfig};
use crate::error::{IrisError, Result};
use crate::models::Circle;
use crate::utils::filters::median_blur;
use image::GrayImage;
use rand::Rng;
use std::cell::OnceCell;
use tracing::{debug, info, warn};

/// Locates the outer iris boundary around a known pupil
///
/// Candidates must have their center within `center_range` of the pupil
/// center and a radius strictly above `radius_range`. Accepted candidates are
/// outlier-filtered and averaged.
pub struct IrisLocator<'a> {
    config: &'a IrisSweepConfig,
    edges: Vec<EdgeExtractor>,
    primary: Vec<GrayImage>,
    fallback: OnceCell<Vec<GrayImage>>,
    image: &'a GrayImage,
}

impl<'a> IrisLocator<'a> {
    /// Prepare a locator for `image`
    pub fn new(config: &'a IrisSweepConfig, blur_range: (u32, u32), image: &'a GrayImage) -> Self {
        let edges = config
            .canny_thresholds
            .iter()
            .map(|&high| {
                EdgeExtractor::new(EdgeParams {
                    canny_low: 0.0,
                    canny_high: high,
                    aperture: config.aperture,
                    dilate_iterations: config.dilate_iterations,
                    blur_kernel_range: blur_range,
                })
            })
            .collect();
        let primary = medians(image, &config.median_radii);
        Self {
            config,
            edges,
            primary,
            fallback: OnceCell::new(),
            image,
        }
    }

    /// Candidate radius floor for a pupil
    pub fn radius_range(&self, pupil: &Circle) -> i32 {
        (pupil.radius as f32 * self.config.radius_factor).ceil() as i32
    }

    /// Candidate center tolerance for a pupil and multiplier
    pub fn center_range(&self, pupil: &Circle, multiplier: f32) -> i32 {
        (pupil.radius as f32 * multiplier).ceil() as i32
    }

    /// Accepted candidates, trying the fallback median radii when the
    /// primary sweep accepts nothing
    pub fn candidates<R: Rng + ?Sized>(
        &self,
        pupil: &Circle,
        center_range: i32,
        radius_range: i32,
        rng: &mut R,
    ) -> Vec<Circle> {
        let found = self.sweep(&self.primary, pupil, center_range, radius_range, rng);
        if !found.is_empty() {
            return found;
        }

        warn!(center_range, "no iris candidates, retrying with fallback median radii");
        let fallback = self
            .fallback
            .get_or_init(|| medians(self.image, &self.config.fallback_median_radii));
        self.sweep(fallback, pupil, center_range, radius_range, rng)
    }

    /// Filtered mean of the accepted candidates
    pub fn locate<R: Rng + ?Sized>(
        &self,
        pupil: &Circle,
        center_range: i32,
        radius_range: i32,
        rng: &mut R,
    ) -> Option<Circle> {
        let candidates = self.candidates(pupil, center_range, radius_range, rng);
        if candidates.is_empty() {
            return None;
        }
        let filtered = filter_circles(&candidates);
        debug!(
            candidates = candidates.len(),
            filtered = filtered.len(),
            "iris candidates filtered"
        );
        mean_circle(&filtered)
    }

    fn sweep<R: Rng + ?Sized>(
        &self,
        smoothed: &[GrayImage],
        pupil: &Circle,
        center_range: i32,
        radius_range: i32,
        rng: &mut R,
    ) -> Vec<Circle> {
        let schedule = SweepSchedule {
            start: self.config.param2_start,
            stop: self.config.param2_stop,
            max_candidates: self.config.max_candidates,
        };
        schedule.run(|param2| {
            let mut accepted = Vec::new();
            for median in smoothed {
                for extractor in &self.edges {
                    let edges = extractor.extract(median, rng);
                    accepted.extend(
                        estimate_circles(&edges, self.config.hough_param1, param2)
                            .into_iter()
                            .filter(|c| {
                                pupil.contains_with_radius(
                                    c.center_x as f64,
                                    c.center_y as f64,
                                    center_range as f64,
                                ) && c.radius > radius_range
                            }),
                    );
                }
            }
            accepted
        })
    }
}

fn medians(image: &GrayImage, radii: &[u32]) -> Vec<GrayImage> {
    radii.iter().map(|&r| median_blur(image, r)).collect()
}

/// Locate pupil and outer iris circles
///
/// The center tolerance starts at `multiplier_start` pupil radii and widens
/// by `multiplier_step` until a circle is found or `multiplier_max` is passed.
pub fn find_boundaries<R: Rng + ?Sized>(
    image: &GrayImage,
    config: &RecognizerConfig,
    rng: &mut R,
) -> Result<(Circle, Circle)> {
    let pupil = PupilLocator::new(&config.pupil, config.edge_blur_range)
        .locate(image, rng)
        .ok_or(IrisError::PupilNotFound)?;

    let locator = IrisLocator::new(&config.iris, config.edge_blur_range, image);
    let radius_range = locator.radius_range(&pupil);
    let multipliers = config.iris.multipliers();

    for (attempt, &multiplier) in multipliers.iter().enumerate() {
        if attempt > 0 {
            warn!(multiplier, "widening iris center tolerance");
        }
        let center_range = locator.center_range(&pupil, multiplier);
        if let Some(ext) = locator.locate(&pupil, center_range, radius_range, rng) {
            info!(pupil = %pupil, iris = %ext, multiplier, "iris boundaries located");
            return Ok((pupil, ext));
        }
    }

    Err(IrisError::IrisNotFound {
        max_multiplier: multipliers.last().copied().unwrap_or(config.iris.multiplier_start),
    })
}
