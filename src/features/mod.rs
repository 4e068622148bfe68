//! Region keypoints and descriptors
//!
//! [`sift`] is the scale-invariant detector; [`extractor`] applies the
//! per-region radial and angular filters before descriptors are computed.

/// Keypoint filtering and region extraction
pub mod extractor;
/// DoG detector and gradient descriptor
pub mod sift;

pub use extractor::{ExtractionStats, KeypointExtractor};
pub use sift::{DESCRIPTOR_SIZE, Sift, SiftConfig};
