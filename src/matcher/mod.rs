//! Iris record matching
//!
//! Each of the four regions is matched independently: a k = 2 descriptor
//! search with the ratio test, then a geometric filter that keeps matches
//! agreeing with the median angular and radial offset. The per-region counts
//! form the [`MatchResult`].

/// Brute-force nearest neighbours
pub mod knn;
/// Single region matching
pub mod region;

pub use knn::{DMatch, knn_match};
pub use region::{RegionMatch, match_regions};

use crate::config::MatchParams;
use crate::error::Result;
use crate::models::{IrisRecord, MatchResult, RegionName};
use rayon::prelude::*;
use tracing::{info, warn};

/// Count geometrically consistent matches per region
///
/// A region where either side has no keypoints scores 0. The ratio test needs
/// two neighbours, so a region whose other side has a single keypoint also
/// scores 0, even when matched against itself. Fails only when a record's
/// keypoints and descriptors disagree.
pub fn compare(a: &IrisRecord, b: &IrisRecord, params: &MatchParams) -> Result<MatchResult> {
    let counts: Vec<(RegionName, usize)> = RegionName::ALL
        .par_iter()
        .map(|&name| {
            let (ra, rb) = (&a.regions[name], &b.regions[name]);
            if ra.keypoints.is_empty() || rb.keypoints.is_empty() {
                warn!(
                    region = %name,
                    a = ra.keypoints.len(),
                    b = rb.keypoints.len(),
                    "no keypoints on one side, skipping region"
                );
                return Ok((name, 0));
            }
            Ok((name, match_regions(ra, rb, params)?.len()))
        })
        .collect::<Result<_>>()?;

    let result: MatchResult = counts.into_iter().collect();
    info!(%result, dratio = params.dratio, "iris records compared");
    Ok(result)
}
