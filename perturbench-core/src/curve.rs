//! Per-sample perturbation curves.
//!
//! A curve has `n + 1` entries for a sample with `n` features. Entry 0 is the
//! baseline score with the mask at its initial constant; entry `j + 1` is the
//! score after the `j`-th ranked feature was processed. Features on the wrong
//! side of zero for the sort order are skipped and the previous score is carried
//! forward, so the curve plateaus once the informative features run out.

use ndarray::{Array1, ArrayView1};

use crate::config::{PerturbationMode, SortOrder};
use crate::error::{BenchError, Result};
use crate::model::Evaluator;
use crate::ranking::RankingStrategy;

/// Scores of one sample, baseline first.
pub type ScoreCurve = Vec<f64>;

/// Mutable state of one sample's masking loop.
///
/// `current` starts at the baseline, so a sample whose every step is skipped
/// yields a flat curve at the baseline value.
#[derive(Debug, Clone, PartialEq)]
pub struct MaskState {
    pub mask: Vec<bool>,
    pub current: f64,
    pub model_calls: usize,
}

impl MaskState {
    pub fn new(n_features: usize, mode: PerturbationMode, baseline: f64) -> Self {
        Self {
            mask: vec![mode.initial_mask_value(); n_features],
            current: baseline,
            model_calls: 1,
        }
    }
}

/// Outcome of a single ranking step.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Step {
    /// The feature was left alone and the previous score carried forward.
    Skipped(f64),
    /// The feature's mask entry was flipped and the model re-queried.
    Perturbed(f64),
}

impl Step {
    pub fn value(&self) -> f64 {
        match *self {
            Step::Skipped(v) | Step::Perturbed(v) => v,
        }
    }
}

/// Builds one curve per sample by walking the ranking and flipping mask entries.
#[derive(Debug, Clone, Copy)]
pub struct CurveBuilder {
    ranking: RankingStrategy,
    mode: PerturbationMode,
}

impl CurveBuilder {
    pub fn new(ranking: RankingStrategy, mode: PerturbationMode) -> Self {
        Self { ranking, mode }
    }

    pub fn sort_order(&self) -> SortOrder {
        self.ranking.order()
    }

    pub fn mode(&self) -> PerturbationMode {
        self.mode
    }

    /// Process one ranked feature.
    ///
    /// Mask entries only ever move from the initial constant to the perturbed
    /// constant; a skipped feature leaves `state` untouched.
    pub fn step(
        &self,
        state: &mut MaskState,
        feature: usize,
        attribution: f64,
        evaluate: impl FnOnce(&[bool]) -> Result<f64>,
    ) -> Result<Step> {
        if self.ranking.order().skips(attribution) {
            return Ok(Step::Skipped(state.current));
        }
        let len = state.mask.len();
        let entry = state
            .mask
            .get_mut(feature)
            .ok_or_else(|| BenchError::out_of_range("feature", feature, len))?;
        *entry = self.mode.perturbed_mask_value();
        state.current = evaluate(&state.mask)?;
        state.model_calls += 1;
        Ok(Step::Perturbed(state.current))
    }

    /// Build the full curve for one sample.
    ///
    /// Errors from the collaborators abort the sample; no partial curve is kept.
    pub fn build(
        &self,
        attributions: ArrayView1<'_, f64>,
        sample: &Array1<f64>,
        label: Option<&Array1<f64>>,
        evaluator: &Evaluator<'_>,
    ) -> Result<ScoreCurve> {
        let n = sample.len();
        let order = self.ranking.rank(attributions);

        let initial = vec![self.mode.initial_mask_value(); n];
        let baseline = evaluator.evaluate(&initial, sample, label)?;
        let mut state = MaskState::new(n, self.mode, baseline);

        let mut curve = Vec::with_capacity(n + 1);
        curve.push(baseline);
        for j in 0..n {
            let feature = *order
                .get(j)
                .ok_or_else(|| BenchError::out_of_range("rank position", j, order.len()))?;
            let step = self.step(&mut state, feature, attributions[feature], |mask| {
                evaluator.evaluate(mask, sample, label)
            })?;
            tracing::trace!(position = j, feature, ?step, "perturbation step");
            curve.push(step.value());
        }

        tracing::debug!(
            features = n,
            baseline,
            last = state.current,
            model_calls = state.model_calls,
            "built perturbation curve"
        );
        Ok(curve)
    }
}
