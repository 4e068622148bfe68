//! Utility functions for image processing
//!
//! This module provides helpers shared across the pipeline:
//! - Filters (median, thresholds, hole filling, dilation, equalization)
//! - Geometry (polar angles, distances, small linear solves)
//! - Statistics (mean, population standard deviation, median)

pub mod filters;
pub mod geometry;
pub mod stats;
