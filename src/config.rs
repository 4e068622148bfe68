//! Recognizer configuration
//!
//! Every tunable of the pipeline lives in [`RecognizerConfig`]. Defaults
//! reproduce the reference sweeps; a JSON file may override any subset, and a
//! few knobs can be overridden from the environment (read once per process).

use crate::detector::canny::Aperture;
use crate::error::{IrisError, Result};
use crate::features::sift::SiftConfig;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::sync::OnceLock;

/// Pupil search sweep
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PupilSweepConfig {
    /// Upper Canny threshold inside the Hough transform
    pub hough_param1: f32,
    /// First accumulator threshold of the sweep
    pub param2_start: u32,
    /// Sweep runs while the accumulator threshold is above this value
    pub param2_stop: u32,
    /// Sweep stops once this many candidates were collected
    pub max_candidates: usize,
    /// Median filter radii (window = 2r + 1)
    pub median_radii: Vec<u32>,
    /// Inverse binary thresholds isolating the dark pupil
    pub thresholds: Vec<u8>,
    /// Canny low threshold on the pupil mask
    pub canny_low: f32,
    /// Canny high threshold on the pupil mask
    pub canny_high: f32,
    /// Dilation passes on the mask edges
    pub dilate_iterations: u8,
}

impl Default for PupilSweepConfig {
    fn default() -> Self {
        Self {
            hough_param1: 200.0,
            param2_start: 120,
            param2_stop: 35,
            max_candidates: 100,
            median_radii: vec![3, 5, 7],
            thresholds: vec![20, 40, 45, 50],
            canny_low: 20.0,
            canny_high: 100.0,
            dilate_iterations: 2,
        }
    }
}

/// Outer iris (limbus) search sweep
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct IrisSweepConfig {
    /// Upper Canny threshold inside the Hough transform
    pub hough_param1: f32,
    /// First accumulator threshold of the sweep
    pub param2_start: u32,
    /// Sweep runs while the accumulator threshold is above this value
    pub param2_stop: u32,
    /// Sweep stops once this many accepted candidates were collected
    pub max_candidates: usize,
    /// Median filter radii tried first
    pub median_radii: Vec<u32>,
    /// Median filter radii tried when the first sweep finds nothing
    pub fallback_median_radii: Vec<u32>,
    /// Canny high thresholds (5x5 aperture, low threshold 0)
    pub canny_thresholds: Vec<f32>,
    /// Canny aperture
    pub aperture: Aperture,
    /// Dilation passes on the edges
    pub dilate_iterations: u8,
    /// Candidate radius must exceed `ceil(pupil.radius * radius_factor)`
    pub radius_factor: f32,
    /// Initial center tolerance as a fraction of the pupil radius
    pub multiplier_start: f32,
    /// Tolerance growth per retry
    pub multiplier_step: f32,
    /// Largest tolerance tried
    pub multiplier_max: f32,
}

impl Default for IrisSweepConfig {
    fn default() -> Self {
        Self {
            hough_param1: 200.0,
            param2_start: 120,
            param2_stop: 40,
            max_candidates: 50,
            median_radii: vec![8, 10, 12, 14, 16, 18, 20],
            fallback_median_radii: vec![3, 5, 7, 21, 23, 25],
            canny_thresholds: vec![430.0, 480.0, 530.0],
            aperture: Aperture::Five,
            dilate_iterations: 1,
            radius_factor: 1.5,
            multiplier_start: 0.25,
            multiplier_step: 0.05,
            multiplier_max: 0.7,
        }
    }
}

impl IrisSweepConfig {
    /// Center tolerance multipliers in the order they are tried
    pub fn multipliers(&self) -> Vec<f32> {
        if self.multiplier_step <= 0.0 {
            return vec![self.multiplier_start];
        }
        (0..)
            .map(|k| self.multiplier_start + k as f32 * self.multiplier_step)
            .take_while(|m| *m <= self.multiplier_max + 1e-4)
            .collect()
    }
}

/// Geometric consistency tolerances for matching
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MatchParams {
    /// Lowe ratio: best / second-best distance must be below this
    pub dratio: f32,
    /// Allowed deviation of the relative angle from its median, degrees
    pub stdev_angle: f64,
    /// Allowed deviation of the normalized radial offset from its median
    pub stdev_dist: f64,
}

impl Default for MatchParams {
    fn default() -> Self {
        Self {
            dratio: 0.8,
            stdev_angle: 10.0,
            stdev_dist: 0.15,
        }
    }
}

/// Full pipeline configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RecognizerConfig {
    /// Pupil sweep
    pub pupil: PupilSweepConfig,
    /// Outer iris sweep
    pub iris: IrisSweepConfig,
    /// Inclusive range of odd Gaussian kernel sizes for edge smoothing
    pub edge_blur_range: (u32, u32),
    /// Keypoint detector settings
    pub sift: SiftConfig,
    /// Matching tolerances
    pub matching: MatchParams,
    /// Seed for the edge-smoothing kernel draws
    pub seed: u64,
}

impl Default for RecognizerConfig {
    fn default() -> Self {
        Self {
            pupil: PupilSweepConfig::default(),
            iris: IrisSweepConfig::default(),
            edge_blur_range: (11, 21),
            sift: SiftConfig::default(),
            matching: MatchParams::default(),
            seed: 0,
        }
    }
}

impl RecognizerConfig {
    /// Parse a JSON document; missing fields keep their defaults
    pub fn from_json_str(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Reject values the pipeline cannot run with
    pub fn validate(&self) -> Result<()> {
        let invalid = |msg: &str| Err(IrisError::InvalidConfig(msg.to_string()));
        if self.sift.octave_layers == 0 {
            return invalid("sift.octave_layers must be at least 1");
        }
        if self.sift.sigma.is_nan() || self.sift.sigma <= 0.0 {
            return invalid("sift.sigma must be positive");
        }
        if self.edge_blur_range.0 > self.edge_blur_range.1 {
            return invalid("edge_blur_range must be ordered (low, high)");
        }
        Ok(())
    }

    /// Read a JSON config file
    pub fn from_json_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        Self::from_json_str(&text)
    }

    /// Apply environment overrides (`IRIS_SEED`, `IRIS_DRATIO`)
    pub fn with_env_overrides(mut self) -> Self {
        if let Some(seed) = seed_override() {
            self.seed = seed;
        }
        if let Some(dratio) = dratio_override() {
            self.matching.dratio = dratio;
        }
        self
    }
}

fn parse_env<T: std::str::FromStr>(name: &str) -> Option<T> {
    std::env::var(name).ok().and_then(|v| v.trim().parse::<T>().ok())
}

static SEED_OVERRIDE: OnceLock<Option<u64>> = OnceLock::new();

pub(crate) fn seed_override() -> Option<u64> {
    *SEED_OVERRIDE.get_or_init(|| parse_env::<u64>("IRIS_SEED"))
}

static DRATIO_OVERRIDE: OnceLock<Option<f32>> = OnceLock::new();

pub(crate) fn dratio_override() -> Option<f32> {
    *DRATIO_OVERRIDE.get_or_init(|| {
        parse_env::<f32>("IRIS_DRATIO").filter(|v| v.is_finite() && *v > 0.0 && *v <= 1.0)
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_multipliers() {
        let m = IrisSweepConfig::default().multipliers();
        assert_eq!(m.len(), 10);
        assert!((m[0] - 0.25).abs() < 1e-6);
        assert!((m[9] - 0.70).abs() < 1e-5);
    }

    #[test]
    fn test_zero_octave_layers_rejected() {
        let err = RecognizerConfig::from_json_str(r#"{"sift": {"octave_layers": 0}}"#).unwrap_err();
        assert!(matches!(err, IrisError::InvalidConfig(_)));
        assert!(RecognizerConfig::default().validate().is_ok());
    }

    #[test]
    fn test_partial_json_keeps_defaults() {
        let cfg = RecognizerConfig::from_json_str(
            r#"{"seed": 42, "matching": {"dratio": 0.7}, "pupil": {"max_candidates": 10}}"#,
        )
        .unwrap();
        assert_eq!(cfg.seed, 42);
        assert_eq!(cfg.matching.dratio, 0.7);
        assert_eq!(cfg.matching.stdev_angle, 10.0);
        assert_eq!(cfg.pupil.max_candidates, 10);
        assert_eq!(cfg.pupil.thresholds, vec![20, 40, 45, 50]);
        assert_eq!(cfg.iris.aperture, Aperture::Five);
    }

    #[test]
    fn test_bad_json_is_an_error() {
        assert!(RecognizerConfig::from_json_str("{not json").is_err());
    }
}
