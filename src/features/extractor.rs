use super::sift::{Sift, SiftConfig};
use crate::models::{Circle, Keypoint, RegionName, RegionRecord};
use crate::utils::geometry::{angle_v, distance};
use image::GrayImage;
use tracing::{debug, warn};

/// Keypoints this close to the pupil boundary are dropped (pixels)
pub const PUPIL_MARGIN: f64 = 3.0;

/// Keypoints closer than this to the iris boundary are dropped (pixels)
pub const IRIS_MARGIN: f64 = 5.0;

/// Whether a keypoint survives the region filter
///
/// Rejects keypoints inside `pupil.radius + PUPIL_MARGIN` of the pupil center,
/// beyond `ext.radius - IRIS_MARGIN` of the iris center, or outside the
/// region's angular band around the iris center.
pub fn keep_keypoint(region: RegionName, pupil: &Circle, ext: &Circle, kp: &Keypoint) -> bool {
    let (x, y) = (kp.x as f64, kp.y as f64);
    let (px, py) = pupil.center();
    if distance(px, py, x, y) <= pupil.radius as f64 + PUPIL_MARGIN {
        return false;
    }
    let (ex, ey) = ext.center();
    if distance(ex, ey, x, y) > ext.radius as f64 - IRIS_MARGIN {
        return false;
    }
    region.keeps_keypoint_angle(angle_v(ex, ey, x, y))
}

/// Keypoints passing [`keep_keypoint`], in input order
pub fn filter_keypoints(region: RegionName, pupil: &Circle, ext: &Circle, keypoints: &[Keypoint]) -> Vec<Keypoint> {
    keypoints
        .iter()
        .filter(|kp| keep_keypoint(region, pupil, ext, kp))
        .copied()
        .collect()
}

/// Keypoint counts of one extraction
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ExtractionStats {
    /// Raw detector output
    pub detected: usize,
    /// After the region filter
    pub filtered: usize,
}

/// Detects, filters and describes keypoints for a region
#[derive(Debug, Clone, Copy, Default)]
pub struct KeypointExtractor {
    sift: Sift,
}

impl KeypointExtractor {
    /// Create an extractor with the given detector settings
    pub fn new(config: SiftConfig) -> Self {
        Self {
            sift: Sift::new(config),
        }
    }

    /// Detect and filter keypoints for a region image and its circles
    pub fn keypoints(&self, region: RegionName, image: &GrayImage, pupil: &Circle, ext: &Circle) -> (usize, Vec<Keypoint>) {
        let raw = self.sift.detect(image);
        let kept = filter_keypoints(region, pupil, ext, &raw);
        (raw.len(), kept)
    }

    /// Fill `record.keypoints` and `record.descriptors` in place
    pub fn fill(&self, record: &mut RegionRecord) -> ExtractionStats {
        let (detected, keypoints) =
            self.keypoints(record.name, &record.image, &record.pupil_circle, &record.ext_circle);
        if keypoints.is_empty() {
            warn!(region = %record.name, detected, "no keypoints left after filtering");
        }
        record.descriptors = self.sift.compute(&record.image, &keypoints);
        record.keypoints = keypoints;

        let stats = ExtractionStats {
            detected,
            filtered: record.keypoints.len(),
        };
        debug!(
            region = %record.name,
            detected = stats.detected,
            filtered = stats.filtered,
            "keypoints extracted"
        );
        stats
    }

    /// Owned variant of [`KeypointExtractor::fill`]
    pub fn extract(&self, mut record: RegionRecord) -> RegionRecord {
        self.fill(&mut record);
        record
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Luma;
    use imageproc::drawing::draw_filled_circle_mut;

    fn kp(x: f32, y: f32) -> Keypoint {
        Keypoint::new(x, y, 4.0)
    }

    #[test]
    fn test_radial_rules() {
        let pupil = Circle::new(50, 50, 10);
        let ext = Circle::new(50, 50, 40);
        let c = RegionName::Complete;
        // on the pupil margin
        assert!(!keep_keypoint(c, &pupil, &ext, &kp(63.0, 50.0)));
        assert!(keep_keypoint(c, &pupil, &ext, &kp(64.0, 50.0)));
        // on the iris margin
        assert!(keep_keypoint(c, &pupil, &ext, &kp(85.0, 50.0)));
        assert!(!keep_keypoint(c, &pupil, &ext, &kp(86.0, 50.0)));
    }

    #[test]
    fn test_angular_rules() {
        let pupil = Circle::new(50, 50, 5);
        let ext = Circle::new(50, 50, 40);
        let right = kp(70.0, 50.0);
        let left = kp(30.0, 50.0);
        let below = kp(50.0, 70.0);
        let above = kp(50.0, 30.0);

        assert!(keep_keypoint(RegionName::RightSide, &pupil, &ext, &right));
        assert!(!keep_keypoint(RegionName::RightSide, &pupil, &ext, &below));
        assert!(keep_keypoint(RegionName::LeftSide, &pupil, &ext, &left));
        assert!(!keep_keypoint(RegionName::LeftSide, &pupil, &ext, &above));
        assert!(keep_keypoint(RegionName::Bottom, &pupil, &ext, &below));
        assert!(!keep_keypoint(RegionName::Bottom, &pupil, &ext, &right));
        for p in [right, left, below, above] {
            assert!(keep_keypoint(RegionName::Complete, &pupil, &ext, &p));
        }
        // exactly 45 degrees is outside the right-side band
        assert!(!keep_keypoint(RegionName::RightSide, &pupil, &ext, &kp(65.0, 35.0)));
    }

    #[test]
    fn test_filter_is_idempotent() {
        let pupil = Circle::new(40, 40, 8);
        let ext = Circle::new(40, 40, 35);
        let kps: Vec<Keypoint> = (0..80)
            .map(|i| kp((i % 9) as f32 * 10.0, (i / 9) as f32 * 10.0))
            .collect();
        for region in RegionName::ALL {
            let once = filter_keypoints(region, &pupil, &ext, &kps);
            let twice = filter_keypoints(region, &pupil, &ext, &once);
            assert_eq!(once, twice);
        }
    }

    #[test]
    fn test_empty_region_is_not_an_error() {
        let record = RegionRecord::new(
            RegionName::LeftSide,
            GrayImage::new(40, 80),
            Circle::new(40, 40, 8),
            Circle::new(40, 40, 32),
        );
        let out = KeypointExtractor::default().extract(record);
        assert!(out.keypoints.is_empty());
        assert_eq!(out.descriptors.rows(), 0);
    }

    #[test]
    fn test_fill_keeps_counts_consistent() {
        let mut image = GrayImage::new(100, 100);
        draw_filled_circle_mut(&mut image, (50, 50), 45, Luma([90]));
        for (i, (x, y)) in [(75, 50), (25, 55), (50, 78), (30, 70), (70, 72)].into_iter().enumerate() {
            draw_filled_circle_mut(&mut image, (x, y), 3 + i as i32 % 3, Luma([230]));
        }
        draw_filled_circle_mut(&mut image, (50, 50), 12, Luma([0]));
        let mut record = RegionRecord::new(
            RegionName::Complete,
            image,
            Circle::new(50, 50, 12),
            Circle::new(50, 50, 45),
        );
        let stats = KeypointExtractor::default().fill(&mut record);
        assert!(stats.filtered <= stats.detected);
        assert_eq!(stats.filtered, record.keypoints.len());
        assert_eq!(record.descriptors.rows(), record.keypoints.len());
        assert!(record.validate().is_ok());
    }
}
