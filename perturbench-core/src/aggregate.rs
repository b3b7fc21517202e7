//! Curve aggregation — per-sample AUC and resampling onto a shared grid.
//!
//! Curves of different lengths are compared by mapping each onto `[0, 1]`:
//! a curve with `m` points sits on `linspace(0, 1, m)`.

use serde::{Deserialize, Serialize};

use crate::config::SortOrder;

/// Number of points in an aggregate curve.
pub const GRID_POINTS: usize = 100;

/// `n` evenly spaced values from `start` to `end` inclusive.
pub fn linspace(start: f64, end: f64, n: usize) -> Vec<f64> {
    match n {
        0 => Vec::new(),
        1 => vec![start],
        _ => {
            let step = (end - start) / (n - 1) as f64;
            let mut xs: Vec<f64> = (0..n).map(|i| start + step * i as f64).collect();
            xs[n - 1] = end;
            xs
        }
    }
}

/// Trapezoidal integral of `ys` over `xs`. Fewer than two points integrate to 0.
pub fn trapezoid(ys: &[f64], xs: &[f64]) -> f64 {
    xs.windows(2)
        .zip(ys.windows(2))
        .map(|(x, y)| (x[1] - x[0]) * (y[0] + y[1]) / 2.0)
        .sum()
}

/// Piecewise-linear interpolation of `(xp, fp)` at `x`; `xp` must be increasing.
///
/// Outside the sampled range the nearest endpoint value is returned. An empty
/// table yields NaN.
pub fn interp(x: f64, xp: &[f64], fp: &[f64]) -> f64 {
    let n = xp.len().min(fp.len());
    if n == 0 {
        return f64::NAN;
    }
    if x <= xp[0] {
        return fp[0];
    }
    if x >= xp[n - 1] {
        return fp[n - 1];
    }
    // xp[i] <= x < xp[i + 1]
    let i = xp[..n].partition_point(|&p| p <= x) - 1;
    let t = (x - xp[i]) / (xp[i + 1] - xp[i]);
    fp[i] + t * (fp[i + 1] - fp[i])
}

/// A curve on the shared `[0, 1]` grid.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AggregateCurve {
    pub xs: Vec<f64>,
    pub ys: Vec<f64>,
}

impl AggregateCurve {
    pub fn len(&self) -> usize {
        self.xs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.xs.is_empty()
    }
}

/// Reduces per-sample curves to AUCs and a representative curve.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CurveAggregator {
    order: SortOrder,
}

impl CurveAggregator {
    pub fn new(order: SortOrder) -> Self {
        Self { order }
    }

    /// -1 for negative ordering, +1 otherwise.
    pub fn sign(&self) -> f64 {
        self.order.curve_sign()
    }

    /// Signed area between the curve and its baseline over `[0, 1]`.
    ///
    /// Single-point curves (no features) have zero width and an AUC of 0.
    pub fn auc(&self, curve: &[f64]) -> f64 {
        let Some(&baseline) = curve.first() else {
            return 0.0;
        };
        let xs = linspace(0.0, 1.0, curve.len());
        let deviation: Vec<f64> = curve.iter().map(|v| v - baseline).collect();
        self.sign() * trapezoid(&deviation, &xs)
    }

    pub fn aucs<C: AsRef<[f64]>>(&self, curves: &[C]) -> Vec<f64> {
        curves.iter().map(|c| self.auc(c.as_ref())).collect()
    }

    /// Resample one curve onto `grid` using its own normalized x-axis.
    pub fn resample(curve: &[f64], grid: &[f64]) -> Vec<f64> {
        let xp = linspace(0.0, 1.0, curve.len());
        grid.iter().map(|&x| interp(x, &xp, curve)).collect()
    }

    /// Pointwise mean of all curves resampled onto the `GRID_POINTS` grid.
    ///
    /// Zero-length curves have nothing to resample and are left out. A batch
    /// with no usable curve yields zeros.
    pub fn aggregate<C: AsRef<[f64]>>(curves: &[C]) -> AggregateCurve {
        let xs = linspace(0.0, 1.0, GRID_POINTS);
        let mut ys = vec![0.0; GRID_POINTS];
        let usable: Vec<&[f64]> = curves
            .iter()
            .map(|c| c.as_ref())
            .filter(|c| !c.is_empty())
            .collect();
        if usable.is_empty() {
            return AggregateCurve { xs, ys };
        }
        for curve in &usable {
            for (acc, v) in ys.iter_mut().zip(Self::resample(curve, &xs)) {
                *acc += v;
            }
        }
        let count = usable.len() as f64;
        for y in &mut ys {
            *y /= count;
        }
        AggregateCurve { xs, ys }
    }
}
