use crate::models::DescriptorMatrix;
use rayon::prelude::*;

/// One nearest-neighbour hit
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DMatch {
    /// Row in the query matrix
    pub query_idx: usize,
    /// Row in the train matrix
    pub train_idx: usize,
    /// Euclidean descriptor distance
    pub distance: f32,
}

#[inline]
fn l2(a: &[f32], b: &[f32]) -> f32 {
    a.iter()
        .zip(b)
        .map(|(x, y)| {
            let d = x - y;
            d * d
        })
        .sum::<f32>()
        .sqrt()
}

/// Brute-force k nearest train rows for every query row
///
/// Each inner list is sorted by distance (train index breaks ties) and holds
/// at most `k` entries. Query rows are processed in parallel.
pub fn knn_match(query: &DescriptorMatrix, train: &DescriptorMatrix, k: usize) -> Vec<Vec<DMatch>> {
    (0..query.rows())
        .into_par_iter()
        .map(|qi| {
            let q = query.row(qi);
            let mut hits: Vec<DMatch> = train
                .iter_rows()
                .enumerate()
                .map(|(ti, t)| DMatch {
                    query_idx: qi,
                    train_idx: ti,
                    distance: l2(q, t),
                })
                .collect();
            hits.sort_by(|a, b| a.distance.total_cmp(&b.distance).then(a.train_idx.cmp(&b.train_idx)));
            hits.truncate(k);
            hits
        })
        .collect()
}
