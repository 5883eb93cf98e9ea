// FeatureMatrix - row-major table of feature vectors
//
// Row order is input order. Label resolution addresses rows by position,
// so stacking and pushing always append and never reorder.

use serde::{Deserialize, Serialize};

use crate::analysis::features::{FeatureVector, FEATURE_COUNT};
use crate::error::ModelError;

/// Owned row-major matrix with a fixed column count
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureMatrix {
    n_rows: usize,
    n_cols: usize,
    data: Vec<f64>,
}

impl FeatureMatrix {
    /// Empty matrix with `n_cols` columns
    pub fn new(n_cols: usize) -> Self {
        Self {
            n_rows: 0,
            n_cols,
            data: Vec::new(),
        }
    }

    /// Build from explicit rows, all of equal length
    ///
    /// # Errors
    /// `EmptyMatrix` when `rows` is empty, `RaggedRow` on a length mismatch.
    pub fn from_rows(rows: &[Vec<f64>]) -> Result<Self, ModelError> {
        let first = rows.first().ok_or(ModelError::EmptyMatrix)?;
        let mut matrix = Self::new(first.len());
        for row in rows {
            matrix.push_row(row)?;
        }
        Ok(matrix)
    }

    /// One row per feature vector, in order
    pub fn from_vectors(vectors: &[FeatureVector]) -> Self {
        let mut data = Vec::with_capacity(vectors.len() * FEATURE_COUNT);
        for vector in vectors {
            data.extend_from_slice(&vector.to_array());
        }
        Self {
            n_rows: vectors.len(),
            n_cols: FEATURE_COUNT,
            data,
        }
    }

    /// Append a row
    pub fn push_row(&mut self, row: &[f64]) -> Result<(), ModelError> {
        if row.len() != self.n_cols {
            return Err(ModelError::RaggedRow {
                row: self.n_rows,
                expected: self.n_cols,
                actual: row.len(),
            });
        }
        self.data.extend_from_slice(row);
        self.n_rows += 1;
        Ok(())
    }

    /// Concatenate matrices top to bottom
    ///
    /// # Errors
    /// `EmptyMatrix` for an empty list, `DimensionMismatch` when column
    /// counts differ.
    pub fn vstack(parts: &[&FeatureMatrix]) -> Result<Self, ModelError> {
        let first = parts.first().ok_or(ModelError::EmptyMatrix)?;
        let mut stacked = Self::new(first.n_cols);
        for part in parts {
            if part.n_cols != stacked.n_cols {
                return Err(ModelError::DimensionMismatch {
                    expected: stacked.n_cols,
                    actual: part.n_cols,
                });
            }
            stacked.data.extend_from_slice(&part.data);
            stacked.n_rows += part.n_rows;
        }
        Ok(stacked)
    }

    pub fn n_rows(&self) -> usize {
        self.n_rows
    }

    pub fn n_cols(&self) -> usize {
        self.n_cols
    }

    pub fn is_empty(&self) -> bool {
        self.n_rows == 0
    }

    /// Row `index`
    ///
    /// # Panics
    /// When `index >= n_rows()`.
    pub fn row(&self, index: usize) -> &[f64] {
        assert!(index < self.n_rows, "row {} out of range", index);
        &self.data[index * self.n_cols..(index + 1) * self.n_cols]
    }

    pub fn rows(&self) -> impl Iterator<Item = &[f64]> + '_ {
        (0..self.n_rows).map(move |i| self.row(i))
    }

    /// Population mean and standard deviation of every column
    pub fn column_stats(&self) -> (Vec<f64>, Vec<f64>) {
        let n = self.n_rows.max(1) as f64;
        let mut mean = vec![0.0; self.n_cols];
        for row in self.rows() {
            for (m, v) in mean.iter_mut().zip(row) {
                *m += v;
            }
        }
        mean.iter_mut().for_each(|m| *m /= n);

        let mut var = vec![0.0; self.n_cols];
        for row in self.rows() {
            for ((s, v), m) in var.iter_mut().zip(row).zip(&mean) {
                *s += (v - m).powi(2);
            }
        }
        let std = var.into_iter().map(|s| (s / n).sqrt()).collect();
        (mean, std)
    }
}
