//! Sequential perturbation benchmark.
//!
//! [`SequentialPerturbation`] owns the collaborators for one benchmark setup
//! (model, masker, score function, sort order, perturbation mode) and scores
//! any number of explanation methods against it. Every call to
//! [`SequentialPerturbation::score`] appends one run to the registry.

use ndarray::Array2;

use crate::adapter::Batch;
use crate::aggregate::{AggregateCurve, CurveAggregator};
use crate::config::{PerturbationConfig, PerturbationMode, SortOrder};
use crate::curve::{CurveBuilder, ScoreCurve};
use crate::error::{BenchError, Result};
use crate::model::{Evaluator, Masking, Model, ScoreFunction};
use crate::progress::{ProgressGate, ProgressObserver, TracingProgress};
use crate::ranking::RankingStrategy;
use crate::registry::{RunRegistry, RunResult, RunSummary};

/// Insertion/deletion benchmark for feature attributions.
pub struct SequentialPerturbation {
    model: Box<dyn Model>,
    masking: Masking,
    score_fn: Box<dyn ScoreFunction>,
    config: PerturbationConfig,
    builder: CurveBuilder,
    aggregator: CurveAggregator,
    registry: RunRegistry,
    progress: Box<dyn ProgressObserver>,
}

impl SequentialPerturbation {
    /// Build from sort order and perturbation names.
    ///
    /// Unknown names fail with `InvalidConfiguration` before any model call.
    pub fn new(
        model: impl Model + 'static,
        masking: impl Into<Masking>,
        sort_order: &str,
        score_fn: impl ScoreFunction + 'static,
        perturbation: &str,
    ) -> Result<Self> {
        let config = PerturbationConfig::from_names(sort_order, perturbation)?;
        Ok(Self::from_config(model, masking, score_fn, config))
    }

    pub fn from_config(
        model: impl Model + 'static,
        masking: impl Into<Masking>,
        score_fn: impl ScoreFunction + 'static,
        config: PerturbationConfig,
    ) -> Self {
        let ranking = RankingStrategy::new(config.sort_order);
        Self {
            model: Box::new(model),
            masking: masking.into(),
            score_fn: Box::new(score_fn),
            builder: CurveBuilder::new(ranking, config.perturbation),
            aggregator: CurveAggregator::new(config.sort_order),
            config,
            registry: RunRegistry::new(),
            progress: Box::new(TracingProgress::new()),
        }
    }

    /// Replace the default `tracing` progress reporter.
    pub fn with_progress_observer(mut self, observer: impl ProgressObserver + 'static) -> Self {
        self.progress = Box::new(observer);
        self
    }

    pub fn config(&self) -> &PerturbationConfig {
        &self.config
    }

    pub fn sort_order(&self) -> SortOrder {
        self.config.sort_order
    }

    pub fn perturbation(&self) -> PerturbationMode {
        self.config.perturbation
    }

    pub fn invert_display(&self) -> bool {
        self.config.invert_display()
    }

    /// Score one explanation method.
    ///
    /// `attributions` and `x` hold one row per sample; `y`, when given, holds
    /// one label row per sample. Returns the run's 100-point aggregate curve and
    /// records the run. Any collaborator error aborts the whole call and nothing
    /// is recorded.
    pub fn score(
        &mut self,
        attributions: impl Into<Batch>,
        x: impl Into<Batch>,
        y: Option<&Array2<f64>>,
        label: Option<&str>,
    ) -> Result<AggregateCurve> {
        let attributions = attributions.into().into_matrix()?;
        let x = x.into().into_matrix()?;
        let label = label
            .map(str::to_owned)
            .unwrap_or_else(|| self.registry.default_label());
        let n_samples = x.nrows();

        let span = tracing::info_span!(
            "score",
            label = %label,
            samples = n_samples,
            features = x.ncols(),
            sort_order = %self.config.sort_order,
            perturbation = %self.config.perturbation,
        );
        let _enter = span.enter();

        let evaluator = Evaluator::new(
            self.model.as_ref(),
            &self.masking,
            self.score_fn.as_ref(),
        );
        let mut gate =
            ProgressGate::from_secs(self.config.progress_threshold_secs, self.config.silent);

        let mut curves: Vec<ScoreCurve> = Vec::with_capacity(n_samples);
        for i in 0..n_samples {
            if i >= attributions.nrows() {
                return Err(BenchError::out_of_range(
                    "attribution row",
                    i,
                    attributions.nrows(),
                ));
            }
            let sample = x.row(i).to_owned();
            let sample_label = match y {
                Some(labels) if i < labels.nrows() => Some(labels.row(i).to_owned()),
                Some(labels) => {
                    return Err(BenchError::out_of_range("label row", i, labels.nrows()));
                }
                None => None,
            };
            let curve = self.builder.build(
                attributions.row(i),
                &sample,
                sample_label.as_ref(),
                &evaluator,
            )?;
            curves.push(curve);
            gate.sample_done(i, n_samples, self.progress.as_mut());
        }
        gate.finish(self.progress.as_mut());

        let aucs = self.aggregator.aucs(&curves);
        let run = self
            .registry
            .record(Some(label), curves, aucs, self.config.invert_display());
        let mean_auc = run.mean_auc();
        tracing::info!(label = %run.label, mean_auc, "recorded perturbation run");
        Ok(run.aggregate_curve())
    }

    pub fn registry(&self) -> &RunRegistry {
        &self.registry
    }

    pub fn runs(&self) -> &[RunResult] {
        self.registry.runs()
    }

    /// Per-run label, mean AUC, aggregate curve and display hint, in recording order.
    pub fn summaries(&self) -> Vec<RunSummary> {
        self.registry.summaries()
    }
}

impl std::fmt::Debug for SequentialPerturbation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SequentialPerturbation")
            .field("masking", &self.masking)
            .field("config", &self.config)
            .field("runs", &self.registry.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{BackgroundMasker, model_output};
    use crate::progress::NoProgress;
    use ndarray::{Array1, Axis, array};
    use std::cell::RefCell;
    use std::rc::Rc;

    fn row_sum(batch: &Array2<f64>) -> anyhow::Result<Array2<f64>> {
        Ok(batch.sum_axis(Axis(1)).insert_axis(Axis(1)))
    }

    fn bench(sort_order: &str, perturbation: &str) -> SequentialPerturbation {
        SequentialPerturbation::new(
            row_sum,
            BackgroundMasker::from_row(Array1::zeros(3)),
            sort_order,
            model_output,
            perturbation,
        )
        .unwrap()
        .with_progress_observer(NoProgress)
    }

    #[test]
    fn test_invalid_sort_order_rejected_at_construction() {
        let err = SequentialPerturbation::new(
            row_sum,
            BackgroundMasker::from_row(Array1::zeros(3)),
            "largest",
            model_output,
            "keep",
        )
        .unwrap_err();
        assert!(matches!(err, BenchError::InvalidConfiguration(_)));
    }

    #[test]
    fn test_score_records_run_with_default_label() {
        let mut sp = bench("absolute", "keep");
        let curve = sp
            .score(vec![0.5, -0.2, 0.1], vec![1.0, 2.0, 3.0], None, None)
            .unwrap();
        assert_eq!(curve.xs.len(), 100);
        assert_eq!(curve.ys.len(), 100);
        assert_eq!(sp.runs().len(), 1);
        assert_eq!(sp.runs()[0].label, "Score 0");
        assert_eq!(sp.runs()[0].curves[0], vec![0.0, 1.0, 3.0, 6.0]);
    }

    #[test]
    fn test_missing_attribution_rows_abort() {
        let mut sp = bench("absolute", "keep");
        let err = sp
            .score(
                vec![0.5, -0.2, 0.1],
                array![[1.0, 2.0, 3.0], [4.0, 5.0, 6.0]],
                None,
                Some("short"),
            )
            .unwrap_err();
        assert!(matches!(err, BenchError::IndexOutOfRange { .. }));
        assert!(sp.registry().is_empty());
    }

    #[derive(Clone, Default)]
    struct SharedLog(Rc<RefCell<Vec<String>>>);

    impl ProgressObserver for SharedLog {
        fn on_start(&mut self, total: usize, completed: usize) {
            self.0.borrow_mut().push(format!("start {completed}/{total}"));
        }
        fn on_advance(&mut self, delta: usize) {
            self.0.borrow_mut().push(format!("advance {delta}"));
        }
        fn on_finish(&mut self) {
            self.0.borrow_mut().push("finish".into());
        }
    }

    #[test]
    fn test_progress_reporting_does_not_change_results() {
        fn slow_row_sum(batch: &Array2<f64>) -> anyhow::Result<Array2<f64>> {
            std::thread::sleep(std::time::Duration::from_millis(1));
            row_sum(batch)
        }
        let attributions = array![[0.5, -0.2, 0.1], [0.0, 0.3, -0.6], [0.2, 0.2, 0.2]];
        let x = array![[1.0, 2.0, 3.0], [4.0, 5.0, 6.0], [7.0, 8.0, 9.0]];

        let mut quiet = bench("absolute", "remove");
        let quiet_curve = quiet.score(&attributions, &x, None, None).unwrap();

        let mut config = PerturbationConfig::new(SortOrder::Absolute, PerturbationMode::Remove);
        config.progress_threshold_secs = 0.0;
        let log = SharedLog::default();
        let mut reported = SequentialPerturbation::from_config(
            slow_row_sum,
            BackgroundMasker::from_row(Array1::zeros(3)),
            model_output,
            config,
        )
        .with_progress_observer(log.clone());
        let reported_curve = reported.score(&attributions, &x, None, None).unwrap();

        assert_eq!(
            *log.0.borrow(),
            vec!["start 1/3", "advance 1", "advance 1", "finish"]
        );
        assert_eq!(reported.runs()[0].curves, quiet.runs()[0].curves);
        assert_eq!(reported.runs()[0].aucs, quiet.runs()[0].aucs);
        assert_eq!(reported_curve, quiet_curve);
    }

    #[test]
    fn test_labels_reach_score_function() {
        fn label_error(label: Option<&Array1<f64>>, output: &Array1<f64>) -> anyhow::Result<f64> {
            let y = label.ok_or_else(|| anyhow::anyhow!("label required"))?;
            Ok((output[0] - y[0]).abs())
        }
        let mut sp = SequentialPerturbation::new(
            row_sum,
            BackgroundMasker::from_row(Array1::zeros(2)),
            "positive",
            label_error,
            "keep",
        )
        .unwrap()
        .with_progress_observer(NoProgress);

        let y = crate::adapter::scalar_labels(&[3.0]);
        sp.score(vec![1.0, 2.0], vec![1.0, 2.0], Some(&y), None)
            .unwrap();
        // baseline |0 - 3|, then reveal feature 1 (|2 - 3|), then feature 0 (|3 - 3|)
        assert_eq!(sp.runs()[0].curves[0], vec![3.0, 1.0, 0.0]);

        let err = sp.score(vec![1.0, 2.0], vec![1.0, 2.0], None, None);
        assert_eq!(err.unwrap_err().to_string(), "label required");
        assert_eq!(sp.runs().len(), 1);
    }
}
