//! Input adaptation at the API boundary.
//!
//! Callers hand over single vectors, row lists, matrices or named columns; the
//! scoring core only ever sees a rectangular `Array2<f64>` with one row per sample.

use ndarray::{Array1, Array2};

use crate::error::{BenchError, Result};

/// Named numeric columns, e.g. a tabular dataset with one `Vec` per feature.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Table {
    columns: Vec<(String, Vec<f64>)>,
}

impl Table {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_column(mut self, name: impl Into<String>, values: Vec<f64>) -> Self {
        self.columns.push((name.into(), values));
        self
    }

    pub fn column_names(&self) -> Vec<&str> {
        self.columns.iter().map(|(name, _)| name.as_str()).collect()
    }

    /// Rows are samples, columns keep insertion order.
    pub fn to_matrix(&self) -> Result<Array2<f64>> {
        let n_rows = self.columns.first().map(|(_, v)| v.len()).unwrap_or(0);
        if let Some((name, values)) = self.columns.iter().find(|(_, v)| v.len() != n_rows) {
            return Err(BenchError::shape(
                format!("{n_rows} rows in every column"),
                format!("{} rows in column \"{name}\"", values.len()),
            ));
        }
        Ok(Array2::from_shape_fn((n_rows, self.columns.len()), |(i, j)| {
            self.columns[j].1[i]
        }))
    }
}

/// Anything that can be coerced into a batch of samples (or attribution vectors).
#[derive(Debug, Clone, PartialEq)]
pub enum Batch {
    /// One sample; wrapped into a batch of one.
    Single(Vec<f64>),
    /// One `Vec` per sample.
    Rows(Vec<Vec<f64>>),
    Matrix(Array2<f64>),
    Table(Table),
}

impl Batch {
    pub fn into_matrix(self) -> Result<Array2<f64>> {
        match self {
            Batch::Single(values) => {
                let n = values.len();
                Array2::from_shape_vec((1, n), values)
                    .map_err(|e| BenchError::shape(format!("1 x {n}"), e.to_string()))
            }
            Batch::Rows(rows) => rows_to_matrix(rows),
            Batch::Matrix(matrix) => Ok(matrix),
            Batch::Table(table) => table.to_matrix(),
        }
    }
}

fn rows_to_matrix(rows: Vec<Vec<f64>>) -> Result<Array2<f64>> {
    let n_rows = rows.len();
    let n_cols = rows.first().map(Vec::len).unwrap_or(0);
    if let Some((i, row)) = rows.iter().enumerate().find(|(_, r)| r.len() != n_cols) {
        return Err(BenchError::shape(
            format!("{n_cols} values in every row"),
            format!("{} values in row {i}", row.len()),
        ));
    }
    let flat: Vec<f64> = rows.into_iter().flatten().collect();
    Array2::from_shape_vec((n_rows, n_cols), flat)
        .map_err(|e| BenchError::shape(format!("{n_rows} x {n_cols}"), e.to_string()))
}

impl From<Vec<f64>> for Batch {
    fn from(values: Vec<f64>) -> Self {
        Batch::Single(values)
    }
}

impl From<&[f64]> for Batch {
    fn from(values: &[f64]) -> Self {
        Batch::Single(values.to_vec())
    }
}

impl From<Array1<f64>> for Batch {
    fn from(values: Array1<f64>) -> Self {
        Batch::Single(values.to_vec())
    }
}

impl From<Vec<Vec<f64>>> for Batch {
    fn from(rows: Vec<Vec<f64>>) -> Self {
        Batch::Rows(rows)
    }
}

impl From<Array2<f64>> for Batch {
    fn from(matrix: Array2<f64>) -> Self {
        Batch::Matrix(matrix)
    }
}

impl From<&Array2<f64>> for Batch {
    fn from(matrix: &Array2<f64>) -> Self {
        Batch::Matrix(matrix.clone())
    }
}

impl From<Table> for Batch {
    fn from(table: Table) -> Self {
        Batch::Table(table)
    }
}

/// Scalar labels as a one-column label matrix.
pub fn scalar_labels(labels: &[f64]) -> Array2<f64> {
    Array2::from_shape_fn((labels.len(), 1), |(i, _)| labels[i])
}
