use super::{Circle, RegionName, Regions};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Keypoint and descriptor counts recorded at extraction time
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct IrisMetadata {
    /// Keypoints detected on the complete region before filtering
    pub kp_len: usize,
    /// Keypoints kept on the complete region
    pub kp_filtered_len: usize,
    /// Descriptor rows on the complete region
    pub desc_len: usize,
    /// Keypoints that received a descriptor on the complete region
    pub kp_desc_len: usize,
}

/// Everything extracted from one eye capture
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IrisRecord {
    /// Pupil boundary in source image coordinates
    pub pupil_circle: Circle,
    /// Iris boundary in source image coordinates
    pub ext_circle: Circle,
    /// Segmented regions with their features
    pub regions: Regions,
    /// Extraction counts
    pub metadata: IrisMetadata,
}

impl IrisRecord {
    /// Check region layout and keypoint/descriptor consistency
    pub fn validate(&self) -> crate::Result<()> {
        self.regions.validate()
    }
}

/// Geometrically consistent match count per region
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct MatchResult {
    /// Matches in the right-side region
    #[serde(rename = "right-side")]
    pub right_side: usize,
    /// Matches in the left-side region
    #[serde(rename = "left-side")]
    pub left_side: usize,
    /// Matches in the bottom region
    pub bottom: usize,
    /// Matches over the whole annulus
    pub complete: usize,
}

impl MatchResult {
    /// Count for one region
    pub fn get(&self, name: RegionName) -> usize {
        match name {
            RegionName::RightSide => self.right_side,
            RegionName::LeftSide => self.left_side,
            RegionName::Bottom => self.bottom,
            RegionName::Complete => self.complete,
        }
    }

    /// Set the count for one region
    pub fn set(&mut self, name: RegionName, count: usize) {
        match name {
            RegionName::RightSide => self.right_side = count,
            RegionName::LeftSide => self.left_side = count,
            RegionName::Bottom => self.bottom = count,
            RegionName::Complete => self.complete = count,
        }
    }

    /// (region, count) pairs in canonical order
    pub fn iter(&self) -> impl Iterator<Item = (RegionName, usize)> + '_ {
        RegionName::ALL.into_iter().map(move |name| (name, self.get(name)))
    }
}

impl FromIterator<(RegionName, usize)> for MatchResult {
    fn from_iter<I: IntoIterator<Item = (RegionName, usize)>>(iter: I) -> Self {
        let mut result = MatchResult::default();
        for (name, count) in iter {
            result.set(name, count);
        }
        result
    }
}

impl fmt::Display for MatchResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let parts: Vec<String> = self
            .iter()
            .map(|(name, count)| format!("{}={}", name, count))
            .collect();
        f.write_str(&parts.join(" "))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_match_result_collects_by_name() {
        let result: MatchResult = [(RegionName::Bottom, 4), (RegionName::Complete, 9)]
            .into_iter()
            .collect();
        assert_eq!(result.get(RegionName::Bottom), 4);
        assert_eq!(result.get(RegionName::Complete), 9);
        assert_eq!(result.get(RegionName::RightSide), 0);
        assert_eq!(result.to_string(), "right-side=0 left-side=0 bottom=4 complete=9");
    }

    #[test]
    fn test_match_result_json_keys() {
        let result = MatchResult {
            right_side: 1,
            left_side: 2,
            bottom: 3,
            complete: 4,
        };
        let json = serde_json::to_value(result).unwrap();
        assert_eq!(json["right-side"], 1);
        assert_eq!(json["left-side"], 2);
        assert_eq!(json["complete"], 4);
    }
}
