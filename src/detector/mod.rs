//! Iris boundary detection
//!
//! This module contains the localization stages:
//! - Canny edges and Sobel gradients
//! - Randomized edge smoothing and pupil masks
//! - Gradient Hough transform for circles
//! - Threshold sweeps and candidate averaging
//! - Outlier rejection over candidate sets
//! - Pupil and outer iris locators

/// Sobel gradients and Canny edges
pub mod canny;
/// Candidate sweeps and mean circles
pub mod circles;
/// Edge maps for circle estimation
pub mod edges;
/// Candidate outlier rejection
pub mod filter;
/// Hough circle transform
pub mod hough;
/// Outer iris boundary search
pub mod iris;
/// Pupil boundary search
pub mod pupil;

pub use iris::{IrisLocator, find_boundaries};
pub use pupil::PupilLocator;
