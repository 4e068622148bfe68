use crate::models::RegionName;
use thiserror::Error;

/// Errors raised by the recognition pipeline and its persistence layer
#[derive(Debug, Error)]
pub enum IrisError {
    /// The pupil sweep produced no candidate circle
    #[error("pupil circle not found")]
    PupilNotFound,

    /// No outer iris circle passed acceptance, even at the widest center tolerance
    #[error("exterior iris circle not found (center tolerance widened to {max_multiplier:.2} x pupil radius)")]
    IrisNotFound {
        /// Last center tolerance multiplier tried
        max_multiplier: f32,
    },

    /// A raw pixel buffer does not match its declared dimensions
    #[error("invalid image buffer: {width}x{height} needs {expected} bytes, got {len}")]
    InvalidImage {
        /// Declared width
        width: usize,
        /// Declared height
        height: usize,
        /// width * height
        expected: usize,
        /// Actual buffer length
        len: usize,
    },

    /// Keypoint and descriptor counts disagree within a region
    #[error("region {region}: {keypoints} keypoints but {descriptors} descriptor rows")]
    RegionMismatch {
        /// Offending region
        region: RegionName,
        /// Keypoint count
        keypoints: usize,
        /// Descriptor row count
        descriptors: usize,
    },

    /// A configuration value is out of range
    #[error("invalid config: {0}")]
    InvalidConfig(String),

    /// Record store failure (missing or duplicate tag, bad layout)
    #[error("store: {0}")]
    Store(String),

    /// Filesystem failure
    #[error(transparent)]
    Io(#[from] std::io::Error),

    /// JSON (de)serialization failure
    #[error(transparent)]
    Json(#[from] serde_json::Error),

    /// Image decoding failure
    #[error(transparent)]
    Image(#[from] image::ImageError),
}

/// Result alias for pipeline operations
pub type Result<T> = std::result::Result<T, IrisError>;
