use super::knn::knn_match;
use crate::config::MatchParams;
use crate::error::Result;
use crate::models::{Circle, Keypoint, RegionRecord};
use crate::utils::geometry::{angle_v, distance};
use crate::utils::stats::median;

/// A ratio-test survivor with its geometric offsets
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RegionMatch {
    /// Keypoint index in the query region
    pub query_idx: usize,
    /// Keypoint index in the train region
    pub train_idx: usize,
    /// Descriptor distance to the nearest neighbour
    pub distance: f32,
    /// Difference of the polar angles around each pupil, degrees
    pub diff_angle: f64,
    /// Difference of the normalized radial offsets
    pub diff_dist: f64,
}

/// Median offsets that every kept match must stay close to
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GeometricWindow {
    /// Median of `diff_angle`
    pub angle: f64,
    /// Median of `diff_dist`
    pub dist: f64,
}

/// Radial position of a keypoint between pupil (0) and iris (1) boundaries
pub fn radial_offset(kp: &Keypoint, pupil: &Circle, ext: &Circle) -> f64 {
    let (px, py) = pupil.center();
    let d = distance(kp.x as f64, kp.y as f64, px, py) - pupil.radius as f64;
    let span = (ext.radius - pupil.radius) as f64;
    if span <= 0.0 { 0.0 } else { d / span }
}

/// Angle of the pupil center as seen from the keypoint
pub fn pupil_angle(kp: &Keypoint, pupil: &Circle) -> f64 {
    let (px, py) = pupil.center();
    angle_v(kp.x as f64, kp.y as f64, px, py)
}

/// Nearest-neighbour matches passing the ratio test
///
/// A zero second distance counts as ratio 0. Queries with fewer than two
/// train neighbours are skipped.
pub fn ratio_candidates(query: &RegionRecord, train: &RegionRecord, dratio: f32) -> Vec<RegionMatch> {
    knn_match(&query.descriptors, &train.descriptors, 2)
        .into_iter()
        .filter_map(|pair| {
            let [m, n] = pair.as_slice() else {
                return None;
            };
            let ratio = if n.distance > 0.0 { m.distance / n.distance } else { 0.0 };
            if ratio >= dratio {
                return None;
            }
            let (ka, kb) = (&query.keypoints[m.query_idx], &train.keypoints[m.train_idx]);
            Some(RegionMatch {
                query_idx: m.query_idx,
                train_idx: m.train_idx,
                distance: m.distance,
                diff_angle: pupil_angle(ka, &query.pupil_circle) - pupil_angle(kb, &train.pupil_circle),
                diff_dist: radial_offset(ka, &query.pupil_circle, &query.ext_circle)
                    - radial_offset(kb, &train.pupil_circle, &train.ext_circle),
            })
        })
        .collect()
}

/// Median offsets of a candidate set, `None` when it is empty
pub fn geometric_window(candidates: &[RegionMatch]) -> Option<GeometricWindow> {
    let angles: Vec<f64> = candidates.iter().map(|m| m.diff_angle).collect();
    let dists: Vec<f64> = candidates.iter().map(|m| m.diff_dist).collect();
    Some(GeometricWindow {
        angle: median(&angles)?,
        dist: median(&dists)?,
    })
}

/// Candidates within `stdev_angle` and `stdev_dist` of the window (closed bounds)
pub fn filter_by_window(candidates: &[RegionMatch], window: &GeometricWindow, params: &MatchParams) -> Vec<RegionMatch> {
    let angle_range = (window.angle - params.stdev_angle)..=(window.angle + params.stdev_angle);
    let dist_range = (window.dist - params.stdev_dist)..=(window.dist + params.stdev_dist);
    candidates
        .iter()
        .filter(|m| angle_range.contains(&m.diff_angle) && dist_range.contains(&m.diff_dist))
        .copied()
        .collect()
}

/// Ratio test followed by the median-centered geometric filter
pub fn match_regions(query: &RegionRecord, train: &RegionRecord, params: &MatchParams) -> Result<Vec<RegionMatch>> {
    query.validate()?;
    train.validate()?;
    if query.keypoints.is_empty() || train.keypoints.is_empty() {
        return Ok(Vec::new());
    }

    let candidates = ratio_candidates(query, train, params.dratio);
    let Some(window) = geometric_window(&candidates) else {
        return Ok(Vec::new());
    };
    Ok(filter_by_window(&candidates, &window, params))
}
