//! Collaborator contracts — the model, masker and score function being benchmarked.
//!
//! The scoring core never looks inside these. It hands a boolean activation mask
//! and a sample to the masker, runs the model on whatever batch comes back,
//! averages the output over that batch and passes the mean to the score function.

use ndarray::{Array1, Array2, Axis};

use crate::error::{BenchError, Result};

/// Predictive model: one row per perturbed sample in, one row of outputs per sample out.
pub trait Model {
    fn predict(&self, batch: &Array2<f64>) -> anyhow::Result<Array2<f64>>;
}

impl<F> Model for F
where
    F: Fn(&Array2<f64>) -> anyhow::Result<Array2<f64>>,
{
    fn predict(&self, batch: &Array2<f64>) -> anyhow::Result<Array2<f64>> {
        self(batch)
    }
}

/// Turns an activation mask and a sample into one or more perturbed variants (rows).
pub trait Masker {
    fn mask(&self, mask: &[bool], sample: &Array1<f64>) -> anyhow::Result<Array2<f64>>;
}

impl<F> Masker for F
where
    F: Fn(&[bool], &Array1<f64>) -> anyhow::Result<Array2<f64>>,
{
    fn mask(&self, mask: &[bool], sample: &Array1<f64>) -> anyhow::Result<Array2<f64>> {
        self(mask, sample)
    }
}

/// Reduces the batch-averaged model output (and the sample's label, if any) to a scalar.
pub trait ScoreFunction {
    fn score(&self, label: Option<&Array1<f64>>, output: &Array1<f64>) -> anyhow::Result<f64>;
}

impl<F> ScoreFunction for F
where
    F: Fn(Option<&Array1<f64>>, &Array1<f64>) -> anyhow::Result<f64>,
{
    fn score(&self, label: Option<&Array1<f64>>, output: &Array1<f64>) -> anyhow::Result<f64> {
        self(label, output)
    }
}

/// Score with the first component of the model output, ignoring the label.
pub fn model_output(_label: Option<&Array1<f64>>, output: &Array1<f64>) -> anyhow::Result<f64> {
    output
        .get(0)
        .copied()
        .ok_or_else(|| anyhow::anyhow!("model produced an empty output row"))
}

/// Score with a fixed output column, e.g. one class of a multi-output classifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OutputColumn(pub usize);

impl ScoreFunction for OutputColumn {
    fn score(&self, _label: Option<&Array1<f64>>, output: &Array1<f64>) -> anyhow::Result<f64> {
        output.get(self.0).copied().ok_or_else(|| {
            anyhow::anyhow!(
                "output column {} requested but model produced {} outputs",
                self.0,
                output.len()
            )
        })
    }
}

/// Masker built once from a fixed background matrix.
///
/// Each background row yields one variant: masked-in features come from the
/// sample, masked-out features from that background row.
#[derive(Debug, Clone)]
pub struct BackgroundMasker {
    background: Array2<f64>,
}

impl BackgroundMasker {
    pub fn new(background: Array2<f64>) -> Result<Self> {
        if background.nrows() == 0 {
            return Err(BenchError::invalid_input(
                "background data must contain at least one row",
            ));
        }
        Ok(Self { background })
    }

    /// Single reference row, e.g. all zeros or the feature means.
    pub fn from_row(row: Array1<f64>) -> Self {
        Self {
            background: row.insert_axis(Axis(0)),
        }
    }

    pub fn background(&self) -> &Array2<f64> {
        &self.background
    }

    pub fn apply(&self, mask: &[bool], sample: &Array1<f64>) -> Result<Array2<f64>> {
        let n = self.background.ncols();
        if sample.len() != n {
            return Err(BenchError::shape(
                format!("sample with {n} features"),
                format!("{} features", sample.len()),
            ));
        }
        if mask.len() != n {
            return Err(BenchError::shape(
                format!("mask of length {n}"),
                format!("length {}", mask.len()),
            ));
        }
        let mut out = self.background.clone();
        for mut row in out.rows_mut() {
            for (j, value) in row.iter_mut().enumerate() {
                if mask[j] {
                    *value = sample[j];
                }
            }
        }
        Ok(out)
    }
}

/// The masking capability, chosen once at construction.
pub enum Masking {
    /// Combines foreground and a fixed background per mask.
    Background(BackgroundMasker),
    /// Arbitrary user-supplied masker.
    Callable(Box<dyn Masker>),
}

impl Masking {
    pub fn callable(masker: impl Masker + 'static) -> Self {
        Masking::Callable(Box::new(masker))
    }

    pub fn apply(&self, mask: &[bool], sample: &Array1<f64>) -> Result<Array2<f64>> {
        match self {
            Masking::Background(masker) => masker.apply(mask, sample),
            Masking::Callable(masker) => Ok(masker.mask(mask, sample)?),
        }
    }
}

impl From<BackgroundMasker> for Masking {
    fn from(masker: BackgroundMasker) -> Self {
        Masking::Background(masker)
    }
}

impl std::fmt::Debug for Masking {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Masking::Background(m) => f
                .debug_tuple("Background")
                .field(&m.background.dim())
                .finish(),
            Masking::Callable(_) => f.write_str("Callable"),
        }
    }
}

/// Runs one mask through masker, model and score function.
pub struct Evaluator<'a> {
    model: &'a dyn Model,
    masking: &'a Masking,
    score_fn: &'a dyn ScoreFunction,
}

impl<'a> Evaluator<'a> {
    pub fn new(model: &'a dyn Model, masking: &'a Masking, score_fn: &'a dyn ScoreFunction) -> Self {
        Self {
            model,
            masking,
            score_fn,
        }
    }

    pub fn evaluate(
        &self,
        mask: &[bool],
        sample: &Array1<f64>,
        label: Option<&Array1<f64>>,
    ) -> Result<f64> {
        let perturbed = self.masking.apply(mask, sample)?;
        let output = self.model.predict(&perturbed)?;
        let averaged = output
            .mean_axis(Axis(0))
            .ok_or_else(|| BenchError::invalid_input("model returned an empty batch"))?;
        Ok(self.score_fn.score(label, &averaged)?)
    }
}
