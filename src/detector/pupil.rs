use super::circles::{SweepSchedule, estimate_circles, mean_circle};
use super::edges::{EdgeExtractor, EdgeParams, dark_blob_mask};
use super::canny::Aperture;
use crate::config::PupilSweepConfig;
use crate::models::Circle;
use image::GrayImage;
use rand::Rng;
use tracing::{debug, info};

/// Locates the pupil as the mean of many Hough candidates
///
/// For every accumulator threshold of the sweep, each (median radius,
/// threshold) pair yields a dark-blob mask whose blurred edges are searched
/// for circles.
pub struct PupilLocator<'a> {
    config: &'a PupilSweepConfig,
    edges: EdgeExtractor,
}

impl<'a> PupilLocator<'a> {
    /// Create a locator using `blur_range` for edge smoothing
    pub fn new(config: &'a PupilSweepConfig, blur_range: (u32, u32)) -> Self {
        let edges = EdgeExtractor::new(EdgeParams {
            canny_low: config.canny_low,
            canny_high: config.canny_high,
            aperture: Aperture::Three,
            dilate_iterations: config.dilate_iterations,
            blur_kernel_range: blur_range,
        });
        Self { config, edges }
    }

    /// Every candidate circle collected by the sweep
    pub fn candidates<R: Rng + ?Sized>(&self, image: &GrayImage, rng: &mut R) -> Vec<Circle> {
        // Masks depend only on the image, so build them once for the whole sweep
        let masks: Vec<GrayImage> = self
            .config
            .median_radii
            .iter()
            .flat_map(|&m| self.config.thresholds.iter().map(move |&t| (m, t)))
            .map(|(m, t)| dark_blob_mask(image, m, t))
            .collect();
        debug!(masks = masks.len(), "pupil masks ready");

        let schedule = SweepSchedule {
            start: self.config.param2_start,
            stop: self.config.param2_stop,
            max_candidates: self.config.max_candidates,
        };
        schedule.run(|param2| {
            masks
                .iter()
                .flat_map(|mask| {
                    let edges = self.edges.extract(mask, rng);
                    estimate_circles(&edges, self.config.hough_param1, param2)
                })
                .collect()
        })
    }

    /// Mean candidate circle, `None` if the sweep found nothing
    pub fn locate<R: Rng + ?Sized>(&self, image: &GrayImage, rng: &mut R) -> Option<Circle> {
        let candidates = self.candidates(image, rng);
        let pupil = mean_circle(&candidates);
        if let Some(p) = pupil {
            info!(candidates = candidates.len(), pupil = %p, "pupil located");
        }
        pupil
    }
}
