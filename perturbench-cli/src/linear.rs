//! Built-in linear model used to drive benchmarks from the command line.

use ndarray::{Array1, Array2, Axis};
use perturbench_core::Model;
use serde::{Deserialize, Serialize};

/// Output transform applied after the linear predictor.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Link {
    /// Raw margin.
    #[default]
    Identity,
    /// Probability via the logistic function.
    Logistic,
}

/// Model description as it appears in a benchmark document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LinearSpec {
    pub weights: Vec<f64>,
    #[serde(default)]
    pub bias: f64,
    #[serde(default)]
    pub link: Link,
}

/// `link(x . w + b)` with a single output column.
#[derive(Debug, Clone)]
pub struct LinearModel {
    weights: Array1<f64>,
    bias: f64,
    link: Link,
}

impl LinearModel {
    pub fn new(spec: &LinearSpec) -> Self {
        Self {
            weights: Array1::from(spec.weights.clone()),
            bias: spec.bias,
            link: spec.link,
        }
    }

    pub fn n_features(&self) -> usize {
        self.weights.len()
    }
}

impl Model for LinearModel {
    fn predict(&self, batch: &Array2<f64>) -> anyhow::Result<Array2<f64>> {
        anyhow::ensure!(
            batch.ncols() == self.weights.len(),
            "linear model expects {} features, got {}",
            self.weights.len(),
            batch.ncols()
        );
        let margin = batch.dot(&self.weights) + self.bias;
        let output = match self.link {
            Link::Identity => margin,
            Link::Logistic => margin.mapv(|z| 1.0 / (1.0 + (-z).exp())),
        };
        Ok(output.insert_axis(Axis(1)))
    }
}
