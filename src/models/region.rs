use super::{Circle, DescriptorMatrix, Keypoint};
use image::GrayImage;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::{Index, IndexMut};
use std::str::FromStr;

/// The four angular sub-regions of an unwrapped iris
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum RegionName {
    /// θ ∈ [-50°, 50°]
    RightSide,
    /// θ ∈ [130°, 180°] ∪ [-180°, -130°]
    LeftSide,
    /// θ ∈ [-140°, -40°]
    Bottom,
    /// Whole annulus
    Complete,
}

impl RegionName {
    /// All regions in canonical order
    pub const ALL: [RegionName; 4] = [
        RegionName::RightSide,
        RegionName::LeftSide,
        RegionName::Bottom,
        RegionName::Complete,
    ];

    /// Position in [`RegionName::ALL`]
    pub fn index(self) -> usize {
        match self {
            RegionName::RightSide => 0,
            RegionName::LeftSide => 1,
            RegionName::Bottom => 2,
            RegionName::Complete => 3,
        }
    }

    /// Stable tag used in records and logs
    pub fn as_str(self) -> &'static str {
        match self {
            RegionName::RightSide => "right-side",
            RegionName::LeftSide => "left-side",
            RegionName::Bottom => "bottom",
            RegionName::Complete => "complete",
        }
    }

    /// Whether a pixel at polar angle `theta` (degrees, from the iris
    /// center) is routed into this region. Band edges are inclusive.
    pub fn contains_pixel_angle(self, theta: f64) -> bool {
        match self {
            RegionName::RightSide => (-50.0..=50.0).contains(&theta),
            RegionName::LeftSide => {
                (130.0..=180.0).contains(&theta) || (-180.0..=-130.0).contains(&theta)
            }
            RegionName::Bottom => (-140.0..=-40.0).contains(&theta),
            RegionName::Complete => true,
        }
    }

    /// Whether a keypoint at polar angle `theta` (degrees, from the region's
    /// iris center) lies in this region's valid band. Tighter than the pixel
    /// bands so descriptors near a cut edge are dropped.
    pub fn keeps_keypoint_angle(self, theta: f64) -> bool {
        match self {
            RegionName::RightSide => theta > -45.0 && theta < 45.0,
            RegionName::LeftSide => !(-135.0..=135.0).contains(&theta),
            RegionName::Bottom => theta > -135.0 && theta < -45.0,
            RegionName::Complete => true,
        }
    }

    /// Canvas (width, height) for an iris of outer radius `radius`
    pub fn canvas_size(self, radius: i32) -> (u32, u32) {
        let quarter = scaled(radius, 1.25).max(0) as u32;
        let full = scaled(radius, 2.5).max(0) as u32;
        match self {
            RegionName::RightSide | RegionName::LeftSide => (quarter, full),
            RegionName::Bottom => (full, quarter),
            RegionName::Complete => (full, full),
        }
    }

    /// Where the iris center lands in this region's canvas
    pub fn canonical_center(self, radius: i32) -> (i32, i32) {
        let offset = scaled(radius, 1.25);
        match self {
            RegionName::RightSide => (0, offset),
            RegionName::LeftSide => (offset, offset),
            RegionName::Bottom => (offset, 0),
            RegionName::Complete => (offset, offset),
        }
    }
}

fn scaled(radius: i32, factor: f64) -> i32 {
    // Truncating cast: canvases round down like integer slicing does.
    (radius as f64 * factor) as i32
}

impl fmt::Display for RegionName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RegionName {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        RegionName::ALL
            .into_iter()
            .find(|name| name.as_str() == s)
            .ok_or_else(|| format!("unknown region name '{}'", s))
    }
}

/// One segmented iris sub-region in its own local frame
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegionRecord {
    /// Which sub-region this is
    pub name: RegionName,
    /// Region canvas
    #[serde(with = "gray_image")]
    pub image: GrayImage,
    /// Pupil boundary in region coordinates
    pub pupil_circle: Circle,
    /// Iris boundary in region coordinates
    pub ext_circle: Circle,
    /// Filtered keypoints
    pub keypoints: Vec<Keypoint>,
    /// One descriptor row per keypoint
    pub descriptors: DescriptorMatrix,
}

impl RegionRecord {
    /// Region with image and circles but no features yet
    pub fn new(name: RegionName, image: GrayImage, pupil_circle: Circle, ext_circle: Circle) -> Self {
        Self {
            name,
            image,
            pupil_circle,
            ext_circle,
            keypoints: Vec::new(),
            descriptors: DescriptorMatrix::default(),
        }
    }

    /// Check that keypoints and descriptor rows line up
    pub fn validate(&self) -> crate::Result<()> {
        if self.keypoints.len() != self.descriptors.rows() {
            return Err(crate::IrisError::RegionMismatch {
                region: self.name,
                keypoints: self.keypoints.len(),
                descriptors: self.descriptors.rows(),
            });
        }
        Ok(())
    }
}

/// The four region records of one capture, indexed by [`RegionName`]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Regions([RegionRecord; 4]);

impl Regions {
    /// Build every region in canonical order
    pub fn from_fn<F: FnMut(RegionName) -> RegionRecord>(mut f: F) -> Self {
        Self(std::array::from_fn(|i| f(RegionName::ALL[i])))
    }

    /// Iterate in canonical order
    pub fn iter(&self) -> std::slice::Iter<'_, RegionRecord> {
        self.0.iter()
    }

    /// Mutable access to all records, in canonical order
    pub fn as_mut_slice(&mut self) -> &mut [RegionRecord] {
        &mut self.0
    }

    /// Check names are in canonical slots and every record is consistent
    pub fn validate(&self) -> crate::Result<()> {
        for (expected, record) in RegionName::ALL.iter().zip(self.0.iter()) {
            if record.name != *expected {
                return Err(crate::IrisError::Store(format!(
                    "region slot {} holds '{}'",
                    expected, record.name
                )));
            }
            record.validate()?;
        }
        Ok(())
    }
}

impl Index<RegionName> for Regions {
    type Output = RegionRecord;

    fn index(&self, name: RegionName) -> &RegionRecord {
        &self.0[name.index()]
    }
}

impl IndexMut<RegionName> for Regions {
    fn index_mut(&mut self, name: RegionName) -> &mut RegionRecord {
        &mut self.0[name.index()]
    }
}

impl<'a> IntoIterator for &'a Regions {
    type Item = &'a RegionRecord;
    type IntoIter = std::slice::Iter<'a, RegionRecord>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

mod gray_image {
    use image::GrayImage;
    use serde::de::Error;
    use serde::{Deserialize, Deserializer, Serialize, Serializer};

    #[derive(Serialize, Deserialize)]
    struct RawImage {
        width: u32,
        height: u32,
        pixels: Vec<u8>,
    }

    pub fn serialize<S: Serializer>(image: &GrayImage, serializer: S) -> Result<S::Ok, S::Error> {
        RawImage {
            width: image.width(),
            height: image.height(),
            pixels: image.as_raw().clone(),
        }
        .serialize(serializer)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<GrayImage, D::Error> {
        let raw = RawImage::deserialize(deserializer)?;
        GrayImage::from_raw(raw.width, raw.height, raw.pixels)
            .ok_or_else(|| D::Error::custom("pixel buffer does not match image dimensions"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pixel_band_edges_inclusive() {
        assert!(RegionName::RightSide.contains_pixel_angle(50.0));
        assert!(RegionName::RightSide.contains_pixel_angle(-50.0));
        assert!(RegionName::LeftSide.contains_pixel_angle(130.0));
        assert!(RegionName::LeftSide.contains_pixel_angle(-130.0));
        assert!(RegionName::LeftSide.contains_pixel_angle(180.0));
        assert!(RegionName::Bottom.contains_pixel_angle(-40.0));
        assert!(RegionName::Bottom.contains_pixel_angle(-140.0));
        assert!(!RegionName::Bottom.contains_pixel_angle(-39.9));
        // Overlaps: -45° is both right-side and bottom
        assert!(RegionName::RightSide.contains_pixel_angle(-45.0));
        assert!(RegionName::Bottom.contains_pixel_angle(-45.0));
    }

    #[test]
    fn test_keypoint_band_edges_exclusive() {
        assert!(!RegionName::RightSide.keeps_keypoint_angle(45.0));
        assert!(!RegionName::RightSide.keeps_keypoint_angle(-45.0));
        assert!(RegionName::RightSide.keeps_keypoint_angle(0.0));
        assert!(!RegionName::LeftSide.keeps_keypoint_angle(135.0));
        assert!(RegionName::LeftSide.keeps_keypoint_angle(135.5));
        assert!(RegionName::LeftSide.keeps_keypoint_angle(-170.0));
        assert!(!RegionName::Bottom.keeps_keypoint_angle(-45.0));
        assert!(RegionName::Bottom.keeps_keypoint_angle(-90.0));
        assert!(RegionName::Complete.keeps_keypoint_angle(90.0));
    }

    #[test]
    fn test_canvas_geometry() {
        assert_eq!(RegionName::Complete.canvas_size(30), (75, 75));
        assert_eq!(RegionName::RightSide.canvas_size(30), (37, 75));
        assert_eq!(RegionName::Bottom.canvas_size(30), (75, 37));
        assert_eq!(RegionName::RightSide.canonical_center(30), (0, 37));
        assert_eq!(RegionName::LeftSide.canonical_center(30), (37, 37));
        assert_eq!(RegionName::Bottom.canonical_center(30), (37, 0));
    }

    #[test]
    fn test_names_round_trip_through_str() {
        for name in RegionName::ALL {
            assert_eq!(name.as_str().parse::<RegionName>(), Ok(name));
            assert_eq!(
                serde_json::to_string(&name).unwrap(),
                format!("\"{}\"", name.as_str())
            );
        }
        assert!("top".parse::<RegionName>().is_err());
    }

    #[test]
    fn test_validate_flags_descriptor_mismatch() {
        let mut record = RegionRecord::new(
            RegionName::Bottom,
            GrayImage::new(4, 2),
            Circle::new(2, 0, 1),
            Circle::new(2, 0, 2),
        );
        record.keypoints.push(Keypoint::new(1.0, 1.0, 2.0));
        assert!(record.validate().is_err());
        record.descriptors.push_row(&[0.0; 128]);
        assert!(record.validate().is_ok());
    }
}
