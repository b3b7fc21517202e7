//! Run registry — ordered results of repeated scoring passes.

use serde::{Deserialize, Serialize};

use crate::aggregate::{AggregateCurve, CurveAggregator};
use crate::curve::ScoreCurve;

/// Results of one scoring pass (one explanation method or configuration).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunResult {
    pub label: String,
    pub curves: Vec<ScoreCurve>,
    pub aucs: Vec<f64>,
    /// Chart hint: flip the y axis when rendering this run.
    pub invert_display: bool,
}

impl RunResult {
    /// Mean of the per-sample AUCs; 0.0 for a run without samples.
    pub fn mean_auc(&self) -> f64 {
        if self.aucs.is_empty() {
            return 0.0;
        }
        self.aucs.iter().sum::<f64>() / self.aucs.len() as f64
    }

    /// Recomputed from the stored curves on every call.
    pub fn aggregate_curve(&self) -> AggregateCurve {
        CurveAggregator::aggregate(&self.curves)
    }

    /// Legend text, e.g. `"shap AUC 0.1234"`.
    pub fn display_label(&self) -> String {
        format!("{} AUC {:.4}", self.label, self.mean_auc())
    }

    pub fn sample_count(&self) -> usize {
        self.curves.len()
    }

    pub fn summary(&self) -> RunSummary {
        RunSummary {
            label: self.label.clone(),
            display_label: self.display_label(),
            mean_auc: self.mean_auc(),
            curve: self.aggregate_curve(),
            invert_display: self.invert_display,
        }
    }
}

/// What a renderer needs to draw one run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunSummary {
    pub label: String,
    /// Legend text, label and mean AUC together.
    pub display_label: String,
    pub mean_auc: f64,
    pub curve: AggregateCurve,
    pub invert_display: bool,
}

/// Append-only list of runs; insertion order is display order.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RunRegistry {
    runs: Vec<RunResult>,
}

impl RunRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Label used when a run is recorded without one.
    pub fn default_label(&self) -> String {
        format!("Score {}", self.runs.len())
    }

    pub fn record(
        &mut self,
        label: Option<String>,
        curves: Vec<ScoreCurve>,
        aucs: Vec<f64>,
        invert_display: bool,
    ) -> &RunResult {
        let label = label.unwrap_or_else(|| self.default_label());
        self.runs.push(RunResult {
            label,
            curves,
            aucs,
            invert_display,
        });
        &self.runs[self.runs.len() - 1]
    }

    pub fn len(&self) -> usize {
        self.runs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.runs.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&RunResult> {
        self.runs.get(index)
    }

    pub fn runs(&self) -> &[RunResult] {
        &self.runs
    }

    pub fn summaries(&self) -> Vec<RunSummary> {
        self.runs.iter().map(RunResult::summary).collect()
    }

    pub fn summaries_json(&self) -> crate::error::Result<String> {
        Ok(serde_json::to_string_pretty(&self.summaries())?)
    }
}
