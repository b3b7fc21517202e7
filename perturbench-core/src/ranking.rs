//! Feature ranking — turns one attribution vector into a processing order.
//!
//! Ranking is a stable sort on a per-order key: equal keys keep their original
//! index order, so identical inputs always yield identical curves.

use ndarray::ArrayView1;
use std::cmp::Ordering;

use crate::config::SortOrder;
use crate::error::Result;

/// Produces the order in which features are perturbed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RankingStrategy {
    order: SortOrder,
}

impl RankingStrategy {
    pub fn new(order: SortOrder) -> Self {
        Self { order }
    }

    /// Build from a sort order name. Unknown names fail here, before any model call.
    pub fn from_name(name: &str) -> Result<Self> {
        Ok(Self::new(name.parse()?))
    }

    pub fn order(&self) -> SortOrder {
        self.order
    }

    /// Sort key for one attribution; ranking is ascending on this key.
    pub fn key(&self, attribution: f64) -> f64 {
        match self.order {
            SortOrder::Positive => -attribution,
            SortOrder::Negative => attribution,
            SortOrder::Absolute => -attribution.abs(),
        }
    }

    /// Return a permutation of `0..attributions.len()`.
    pub fn rank(&self, attributions: ArrayView1<'_, f64>) -> Vec<usize> {
        let keys: Vec<f64> = attributions.iter().map(|&a| self.key(a)).collect();
        let mut indices: Vec<usize> = (0..keys.len()).collect();
        // `sort_by` is stable; ties keep ascending index order.
        indices.sort_by(|&a, &b| compare_keys(keys[a], keys[b]));
        indices
    }

    /// Convenience wrapper for plain slices.
    pub fn rank_slice(&self, attributions: &[f64]) -> Vec<usize> {
        self.rank(ArrayView1::from(attributions))
    }
}

/// Total order on keys: numeric comparison with `0.0 == -0.0`, NaN after everything.
fn compare_keys(a: f64, b: f64) -> Ordering {
    match (a.is_nan(), b.is_nan()) {
        (true, true) => Ordering::Equal,
        (true, false) => Ordering::Greater,
        (false, true) => Ordering::Less,
        (false, false) => a.partial_cmp(&b).unwrap_or(Ordering::Equal),
    }
}
