/// Integer circles
pub mod circle;
/// Flat descriptor matrix
pub mod descriptor;
/// Scale-space keypoints
pub mod keypoint;
/// Per-capture records and match counts
pub mod record;
/// Iris regions and their records
pub mod region;

pub use circle::Circle;
pub use descriptor::DescriptorMatrix;
pub use keypoint::{Keypoint, KeypointTuple};
pub use record::{IrisMetadata, IrisRecord, MatchResult};
pub use region::{RegionName, RegionRecord, Regions};
