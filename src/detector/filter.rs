//! Outlier rejection over a set of candidate circles
//!
//! Two passes: centers farther than 1.5 standard deviations from the mean
//! center (per axis) are dropped, then radii outside one standard deviation of
//! the "alpha" radius (the one closest to all others in L1) are dropped.

use crate::models::Circle;
use crate::utils::stats::standard_dev;
use tracing::warn;

/// Center deviation ratio of the positional pass
pub const POSITION_SIGMA_RATIO: f64 = 1.5;

/// Result of the positional pass
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PositionSplit {
    /// Circles whose center lies within the window on both axes
    pub kept: Vec<Circle>,
    /// Everything else
    pub rejected: Vec<Circle>,
}

/// Keep circles whose center x and y are each within `ratio` standard
/// deviations of the mean (window bounds inclusive)
pub fn filter_by_position(circles: &[Circle], ratio: f64) -> PositionSplit {
    let xs: Vec<f64> = circles.iter().map(|c| c.center_x as f64).collect();
    let ys: Vec<f64> = circles.iter().map(|c| c.center_y as f64).collect();
    let (Some((mx, sx)), Some((my, sy))) = (standard_dev(&xs), standard_dev(&ys)) else {
        return PositionSplit::default();
    };

    let mut split = PositionSplit::default();
    for &c in circles {
        let (x, y) = (c.center_x as f64, c.center_y as f64);
        let outside = x < mx - ratio * sx
            || x > mx + ratio * sx
            || y < my - ratio * sy
            || y > my + ratio * sy;
        if outside {
            split.rejected.push(c);
        } else {
            split.kept.push(c);
        }
    }
    split
}

/// Radius minimizing the summed absolute radius difference to all circles;
/// the first one wins ties
pub fn alpha_radius(circles: &[Circle]) -> Option<i32> {
    let mut best: Option<(i64, i32)> = None;
    for c in circles {
        let spread: i64 = circles
            .iter()
            .map(|o| (c.radius as i64 - o.radius as i64).abs())
            .sum();
        if best.is_none_or(|(min, _)| spread < min) {
            best = Some((spread, c.radius));
        }
    }
    best.map(|(_, r)| r)
}

/// Positional pass followed by the alpha-radius pass
///
/// With fewer than three positional survivors the radius pass is skipped.
pub fn filter_circles(circles: &[Circle]) -> Vec<Circle> {
    if circles.is_empty() {
        warn!("empty candidate set, nothing to filter");
        return Vec::new();
    }

    let positioned = filter_by_position(circles, POSITION_SIGMA_RATIO).kept;
    if positioned.len() < 3 {
        return positioned;
    }

    let radii: Vec<f64> = positioned.iter().map(|c| c.radius as f64).collect();
    let (Some(alpha), Some((_, dev))) = (alpha_radius(&positioned), standard_dev(&radii)) else {
        return positioned;
    };
    let (lo, hi) = (alpha as f64 - dev, alpha as f64 + dev);
    positioned
        .into_iter()
        .filter(|c| (lo..=hi).contains(&(c.radius as f64)))
        .collect()
}
