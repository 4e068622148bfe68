//! rust_iris - iris recognition from grayscale eye images
//!
//! The pipeline locates the pupil and outer iris boundaries with swept Hough
//! transforms, splits the iris annulus into four regions, extracts
//! scale-invariant keypoints per region and matches two captures region by
//! region.

#![warn(missing_docs)]
#![allow(clippy::missing_docs_in_private_items)]

/// Recognizer settings
pub mod config;
/// Pupil and iris boundary localization
pub mod detector;
/// Error type
pub mod error;
/// Keypoints and descriptors
pub mod features;
/// Record matching
pub mod matcher;
/// Core data structures (circles, keypoints, regions, records)
pub mod models;
/// Annulus segmentation into regions
pub mod segmentation;
/// Record persistence
pub mod store;
/// CLI helpers (image loading, record files)
pub mod tools;
/// Filters, geometry and statistics
pub mod utils;

pub use config::{MatchParams, RecognizerConfig};
pub use error::{IrisError, Result};
pub use models::{Circle, IrisMetadata, IrisRecord, Keypoint, MatchResult, RegionName, RegionRecord};

use features::KeypointExtractor;
use image::GrayImage;
use rand::SeedableRng;
use rand::rngs::StdRng;
use rayon::prelude::*;
use segmentation::RegionSegmenter;
use tracing::info;

/// End-to-end recognizer owning its configuration and jitter source
pub struct IrisRecognizer {
    config: RecognizerConfig,
    rng: StdRng,
}

impl IrisRecognizer {
    /// Create a recognizer seeded from `config.seed`
    pub fn new(config: RecognizerConfig) -> Self {
        let rng = StdRng::seed_from_u64(config.seed);
        Self { config, rng }
    }

    /// Active configuration
    pub fn config(&self) -> &RecognizerConfig {
        &self.config
    }

    /// Locate (pupil, iris) circles in source coordinates
    pub fn find_boundaries(&mut self, image: &GrayImage) -> Result<(Circle, Circle)> {
        detector::find_boundaries(image, &self.config, &mut self.rng)
    }

    /// Localize, segment and extract features from one eye image
    pub fn extract(&mut self, image: &GrayImage) -> Result<IrisRecord> {
        // Step 1: boundaries (fatal on failure)
        let (pupil, ext) = self.find_boundaries(image)?;

        // Step 2: regions
        let mut regions = RegionSegmenter::new().segment(image, &pupil, &ext);

        // Step 3: keypoints and descriptors, regions are disjoint
        let extractor = KeypointExtractor::new(self.config.sift);
        let stats: Vec<_> = regions
            .as_mut_slice()
            .par_iter_mut()
            .map(|record| (record.name, extractor.fill(record)))
            .collect();

        // Step 4: metadata from the complete region
        let complete = &regions[RegionName::Complete];
        let detected = stats
            .iter()
            .find(|(name, _)| *name == RegionName::Complete)
            .map(|(_, s)| s.detected)
            .unwrap_or(0);
        let metadata = IrisMetadata {
            kp_len: detected,
            kp_filtered_len: complete.keypoints.len(),
            desc_len: complete.descriptors.rows(),
            kp_desc_len: complete.keypoints.len(),
        };
        info!(
            pupil = %pupil,
            iris = %ext,
            kp_len = metadata.kp_len,
            kp_filtered_len = metadata.kp_filtered_len,
            "iris features extracted"
        );

        Ok(IrisRecord {
            pupil_circle: pupil,
            ext_circle: ext,
            regions,
            metadata,
        })
    }

    /// [`IrisRecognizer::extract`] on a raw row-major 8-bit buffer
    pub fn extract_from_grayscale(&mut self, pixels: &[u8], width: usize, height: usize) -> Result<IrisRecord> {
        let image = gray_from_raw(pixels, width, height)?;
        self.extract(&image)
    }

    /// Compare two records with the configured tolerances
    pub fn compare(&self, a: &IrisRecord, b: &IrisRecord) -> Result<MatchResult> {
        self.compare_with(a, b, &self.config.matching)
    }

    /// Compare two records with explicit tolerances
    pub fn compare_with(&self, a: &IrisRecord, b: &IrisRecord, params: &MatchParams) -> Result<MatchResult> {
        matcher::compare(a, b, params)
    }
}

impl Default for IrisRecognizer {
    fn default() -> Self {
        Self::new(RecognizerConfig::default())
    }
}

fn gray_from_raw(pixels: &[u8], width: usize, height: usize) -> Result<GrayImage> {
    let invalid = || IrisError::InvalidImage {
        width,
        height,
        expected: width.saturating_mul(height),
        len: pixels.len(),
    };
    if width == 0 || height == 0 || width.checked_mul(height) != Some(pixels.len()) {
        return Err(invalid());
    }
    let (w, h) = (u32::try_from(width).map_err(|_| invalid())?, u32::try_from(height).map_err(|_| invalid())?);
    GrayImage::from_raw(w, h, pixels.to_vec()).ok_or_else(invalid)
}

/// Extract a record from a raw grayscale buffer with default settings
///
/// # Arguments
/// * `pixels` - Row-major 8-bit grayscale bytes
/// * `width` - Image width in pixels
/// * `height` - Image height in pixels
pub fn extract(pixels: &[u8], width: usize, height: usize) -> Result<IrisRecord> {
    IrisRecognizer::default().extract_from_grayscale(pixels, width, height)
}

/// Compare two records with default tolerances
pub fn compare(a: &IrisRecord, b: &IrisRecord) -> Result<MatchResult> {
    matcher::compare(a, b, &MatchParams::default())
}
