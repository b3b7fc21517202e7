//! # perturbench-core — insertion/deletion benchmarks for feature attributions
//!
//! Measures how well an explanation ranks features by progressively revealing
//! (`keep`) or hiding (`remove`) them in attribution order, querying the model
//! after each step, and reducing the resulting curves to an area-under-curve score.
//!
//! The model, masker and score function are supplied by the caller; this crate
//! owns the ranking, the masking loop, the AUC and the cross-sample aggregation.

pub mod adapter;
pub mod aggregate;
pub mod config;
pub mod curve;
pub mod error;
pub mod model;
pub mod perturbation;
pub mod progress;
pub mod ranking;
pub mod registry;

pub use adapter::{Batch, Table};
pub use aggregate::{AggregateCurve, CurveAggregator, GRID_POINTS};
pub use config::{ConfigOverrides, PerturbationConfig, PerturbationMode, SortOrder};
pub use curve::{CurveBuilder, MaskState, ScoreCurve, Step};
pub use error::{BenchError, Result};
pub use model::{BackgroundMasker, Masker, Masking, Model, OutputColumn, ScoreFunction};
pub use perturbation::SequentialPerturbation;
pub use progress::{NoProgress, ProgressObserver, TracingProgress};
pub use ranking::RankingStrategy;
pub use registry::{RunRegistry, RunResult, RunSummary};
