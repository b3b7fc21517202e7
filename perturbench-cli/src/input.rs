//! Benchmark documents read by `perturbench score`.
//!
//! ```json
//! {
//!   "features": [[1.0, 2.0], [3.0, 4.0]],
//!   "background": [[0.0, 0.0]],
//!   "model": { "weights": [0.5, -1.0], "bias": 0.0, "link": "identity" },
//!   "runs": [
//!     { "label": "shap", "attributions": [[0.5, -2.0], [1.5, -4.0]] }
//!   ]
//! }
//! ```

use anyhow::Context;
use ndarray::{Array1, Array2};
use perturbench_core::adapter::scalar_labels;
use perturbench_core::{BackgroundMasker, Batch, ScoreFunction};
use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::linear::LinearSpec;

/// How each model output is turned into a curve value.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScoreKind {
    /// The model output itself.
    #[default]
    Output,
    /// Absolute difference between output and the sample's label.
    AbsoluteError,
}

impl ScoreFunction for ScoreKind {
    fn score(&self, label: Option<&Array1<f64>>, output: &Array1<f64>) -> anyhow::Result<f64> {
        let value = *output
            .get(0)
            .context("model produced an empty output row")?;
        match self {
            ScoreKind::Output => Ok(value),
            ScoreKind::AbsoluteError => {
                let label = label.context("absolute_error scoring requires labels")?;
                let target = *label.get(0).context("empty label row")?;
                Ok((value - target).abs())
            }
        }
    }
}

/// One explanation method's attributions.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunInput {
    #[serde(default)]
    pub label: Option<String>,
    pub attributions: Vec<Vec<f64>>,
}

/// A complete benchmark: data, model and the attribution sets to compare.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BenchmarkInput {
    pub features: Vec<Vec<f64>>,
    /// Reference rows for masked-out features; a zero row when absent.
    #[serde(default)]
    pub background: Option<Vec<Vec<f64>>>,
    #[serde(default)]
    pub labels: Option<Vec<f64>>,
    pub model: LinearSpec,
    #[serde(default)]
    pub score: ScoreKind,
    pub runs: Vec<RunInput>,
}

impl BenchmarkInput {
    pub fn from_path(path: &Path) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read benchmark input {}", path.display()))?;
        Self::from_json(&content)
            .with_context(|| format!("Invalid benchmark input {}", path.display()))
    }

    pub fn from_json(content: &str) -> anyhow::Result<Self> {
        let input: Self = serde_json::from_str(content)?;
        anyhow::ensure!(!input.runs.is_empty(), "benchmark input has no runs");
        Ok(input)
    }

    pub fn n_features(&self) -> usize {
        self.model.weights.len()
    }

    pub fn features(&self) -> anyhow::Result<Array2<f64>> {
        Ok(Batch::from(self.features.clone()).into_matrix()?)
    }

    pub fn labels(&self) -> Option<Array2<f64>> {
        self.labels.as_deref().map(scalar_labels)
    }

    pub fn masker(&self) -> anyhow::Result<BackgroundMasker> {
        match &self.background {
            Some(rows) => {
                let background = Batch::from(rows.clone()).into_matrix()?;
                Ok(BackgroundMasker::new(background)?)
            }
            None => Ok(BackgroundMasker::from_row(Array1::zeros(self.n_features()))),
        }
    }
}
