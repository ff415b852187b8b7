/////////////////////////////////////////////////////////////////////////////////////////////
//
// Implements the dense pose matrix container, its statistics, normalisation and linear solve.
//
// Created on: 19 Oct 2026     Author: Daniel Owen
//
// Copyright (c) 2026, Maptek Pty Ltd. All rights reserved. Licensed under the MIT License.
//
/////////////////////////////////////////////////////////////////////////////////////////////

//! Dense `f64` matrix used to hold pose samples, distances and weights.

use crate::{linalg, storage::StoredMatrix};
use faer::Mat;
use serde::{Deserialize, Serialize};
use std::{error::Error, fmt};

/// Errors raised by [`Matrix`] accessors and [`Matrix::solve`].
#[derive(Debug, Clone, PartialEq)]
pub enum MatrixError {
    /// A row or column index lies outside the matrix.
    IndexOutOfRange {
        row: usize,
        col: usize,
        nrows: usize,
        ncols: usize,
    },
    /// The operand of a solve is not square.
    DimensionMismatch { nrows: usize, ncols: usize },
    /// A vector argument does not have the length the matrix requires.
    LengthMismatch { expected: usize, found: usize },
    /// The pivot at `row` fell below the singularity tolerance after
    /// pivoting, i.e. that row is linearly dependent on the rows above it.
    SingularMatrix { row: usize, pivot: f64 },
}

impl MatrixError {
    /// Row (in elimination order) at which a solve broke down, if any.
    pub fn singular_row(&self) -> Option<usize> {
        match self {
            MatrixError::SingularMatrix { row, .. } => Some(*row),
            _ => None,
        }
    }
}

impl fmt::Display for MatrixError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MatrixError::IndexOutOfRange {
                row,
                col,
                nrows,
                ncols,
            } => write!(
                f,
                "index ({}, {}) out of range for a {}x{} matrix",
                row, col, nrows, ncols
            ),
            MatrixError::DimensionMismatch { nrows, ncols } => {
                write!(f, "cannot solve a non-square {}x{} matrix", nrows, ncols)
            }
            MatrixError::LengthMismatch { expected, found } => {
                write!(f, "expected {} values, found {}", expected, found)
            }
            MatrixError::SingularMatrix { row, pivot } => write!(
                f,
                "matrix is singular at row {} (pivot {:e} below {:e})",
                row,
                pivot,
                linalg::SINGULAR_PIVOT_TOLERANCE
            ),
        }
    }
}

impl Error for MatrixError {}

/// Divides each value by its factor, skipping factors `<= 0`.
///
/// Returns `false` without touching `values` when the lengths differ.
pub fn normalize_vector(values: &mut [f64], factors: &[f64]) -> bool {
    if values.len() != factors.len() {
        return false;
    }

    for (v, f) in values.iter_mut().zip(factors) {
        if *f > 0.0 {
            *v /= f;
        }
    }

    true
}

/// A dense `rows x cols` matrix of `f64` values.
///
/// Storage is a [`faer::Mat`]. Cloning produces an independent deep copy.
/// Serializes as `rows`, `cols` and a zero-padded flat value list, see
/// [`crate::storage`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(into = "StoredMatrix", try_from = "StoredMatrix")]
pub struct Matrix {
    data: Mat<f64>,
}

impl Default for Matrix {
    fn default() -> Self {
        Self { data: Mat::new() }
    }
}

impl From<Mat<f64>> for Matrix {
    fn from(data: Mat<f64>) -> Self {
        Self { data }
    }
}

impl Matrix {
    /// Creates a zero-filled matrix.
    pub fn zeros(nrows: usize, ncols: usize) -> Self {
        Self {
            data: Mat::zeros(nrows, ncols),
        }
    }

    /// Creates a matrix with every cell set to `value`.
    pub fn fill(nrows: usize, ncols: usize, value: f64) -> Self {
        Self::from_fn(nrows, ncols, |_, _| value)
    }

    /// Creates a matrix whose cell `(i, j)` is `f(i, j)`.
    pub fn from_fn(nrows: usize, ncols: usize, f: impl FnMut(usize, usize) -> f64) -> Self {
        Self {
            data: Mat::from_fn(nrows, ncols, f),
        }
    }

    /// Creates a matrix from a list of equally long rows.
    pub fn from_rows(rows: &[Vec<f64>]) -> Result<Self, MatrixError> {
        let ncols = rows.first().map_or(0, Vec::len);

        if let Some(bad) = rows.iter().find(|r| r.len() != ncols) {
            return Err(MatrixError::LengthMismatch {
                expected: ncols,
                found: bad.len(),
            });
        }

        Ok(Self::from_fn(rows.len(), ncols, |i, j| rows[i][j]))
    }

    /// Creates a matrix from exactly `nrows * ncols` row-major values.
    pub fn from_row_major(nrows: usize, ncols: usize, values: &[f64]) -> Result<Self, MatrixError> {
        if values.len() != nrows * ncols {
            return Err(MatrixError::LengthMismatch {
                expected: nrows * ncols,
                found: values.len(),
            });
        }

        Ok(Self::from_fn(nrows, ncols, |i, j| values[i * ncols + j]))
    }

    pub fn nrows(&self) -> usize {
        self.data.nrows()
    }

    pub fn ncols(&self) -> usize {
        self.data.ncols()
    }

    pub fn shape(&self) -> (usize, usize) {
        (self.nrows(), self.ncols())
    }

    /// Total number of cells, `rows * cols`.
    pub fn len(&self) -> usize {
        self.nrows() * self.ncols()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Borrows the underlying faer matrix.
    pub fn as_mat(&self) -> &Mat<f64> {
        &self.data
    }

    pub(crate) fn as_mat_mut(&mut self) -> &mut Mat<f64> {
        &mut self.data
    }

    pub fn into_mat(self) -> Mat<f64> {
        self.data
    }

    fn check_index(&self, row: usize, col: usize) -> Result<(), MatrixError> {
        if row >= self.nrows() || col >= self.ncols() {
            return Err(MatrixError::IndexOutOfRange {
                row,
                col,
                nrows: self.nrows(),
                ncols: self.ncols(),
            });
        }
        Ok(())
    }

    /// Returns the value at `(row, col)`.
    pub fn get(&self, row: usize, col: usize) -> Result<f64, MatrixError> {
        self.check_index(row, col)?;
        Ok(self.data[(row, col)])
    }

    /// Sets the value at `(row, col)`.
    pub fn set(&mut self, row: usize, col: usize, value: f64) -> Result<(), MatrixError> {
        self.check_index(row, col)?;
        self.data[(row, col)] = value;
        Ok(())
    }

    /// Returns a copy of row `row`.
    pub fn row(&self, row: usize) -> Result<Vec<f64>, MatrixError> {
        if row >= self.nrows() {
            return Err(MatrixError::IndexOutOfRange {
                row,
                col: 0,
                nrows: self.nrows(),
                ncols: self.ncols(),
            });
        }
        Ok(self.data.row(row).iter().copied().collect())
    }

    /// Returns a copy of column `col`.
    pub fn column(&self, col: usize) -> Result<Vec<f64>, MatrixError> {
        if col >= self.ncols() {
            return Err(MatrixError::IndexOutOfRange {
                row: 0,
                col,
                nrows: self.nrows(),
                ncols: self.ncols(),
            });
        }
        Ok(self.data.col(col).iter().copied().collect())
    }

    /// Resizes the matrix in place. The overlapping region is preserved and
    /// new cells are zero.
    pub fn set_size(&mut self, nrows: usize, ncols: usize) {
        let old = &self.data;
        let resized = Mat::from_fn(nrows, ncols, |i, j| {
            if i < old.nrows() && j < old.ncols() {
                old[(i, j)]
            } else {
                0.0
            }
        });
        self.data = resized;
    }

    /// Appends one row to the bottom of the matrix.
    pub fn append_row(&mut self, values: &[f64]) -> Result<(), MatrixError> {
        if values.len() != self.ncols() {
            return Err(MatrixError::LengthMismatch {
                expected: self.ncols(),
                found: values.len(),
            });
        }

        let last = self.nrows();
        self.set_size(last + 1, self.ncols());
        for (j, v) in values.iter().enumerate() {
            self.data[(last, j)] = *v;
        }
        Ok(())
    }

    /// Row-major linearisation of all cells.
    pub fn flatten(&self) -> Vec<f64> {
        self.data
            .row_iter()
            .flat_map(|row| row.iter().copied().collect::<Vec<_>>())
            .collect()
    }

    /// Euclidean norm of each row.
    pub fn row_norms(&self) -> Vec<f64> {
        self.data
            .row_iter()
            .map(|row| row.iter().map(|x| x * x).sum::<f64>().sqrt())
            .collect()
    }

    /// Euclidean norm of each column.
    pub fn column_norms(&self) -> Vec<f64> {
        self.data
            .col_iter()
            .map(|col| col.iter().map(|x| x * x).sum::<f64>().sqrt())
            .collect()
    }

    /// Divides every row (`by_rows`) or column by the matching factor.
    ///
    /// Rows or columns whose factor is `<= 0` are left unchanged. Returns
    /// `false`, leaving the matrix untouched, when the number of factors
    /// does not match the row (or column) count.
    pub fn normalize(&mut self, factors: &[f64], by_rows: bool) -> bool {
        let expected = if by_rows { self.nrows() } else { self.ncols() };
        if factors.len() != expected {
            return false;
        }

        for i in 0..self.nrows() {
            for j in 0..self.ncols() {
                let f = if by_rows { factors[i] } else { factors[j] };
                if f > 0.0 {
                    self.data[(i, j)] /= f;
                }
            }
        }

        true
    }

    /// Arithmetic mean of all cells. `0.0` for an empty matrix.
    pub fn mean(&self) -> f64 {
        if self.is_empty() {
            return 0.0;
        }
        self.data.row_iter().map(|row| row.iter().sum::<f64>()).sum::<f64>() / self.len() as f64
    }

    /// Population variance of all cells. `0.0` for an empty matrix.
    pub fn variance(&self) -> f64 {
        if self.is_empty() {
            return 0.0;
        }
        let mean = self.mean();
        self.data
            .row_iter()
            .map(|row| row.iter().map(|x| (x - mean).powi(2)).sum::<f64>())
            .sum::<f64>()
            / self.len() as f64
    }

    /// Solves `self * w = y` for `w` by Gaussian elimination with partial
    /// pivoting.
    ///
    /// The elimination runs on this matrix's own storage, so the matrix is
    /// consumed; clone first to keep it. Shape and length checks happen
    /// before any elimination.
    ///
    /// # Examples
    ///
    /// ```
    /// use rbf_nodes::Matrix;
    ///
    /// let a = Matrix::from_rows(&[vec![2.0, 1.0], vec![1.0, 3.0]])?;
    /// let w = a.clone().solve(&[3.0, 5.0])?;
    ///
    /// assert!((w[0] - 0.8).abs() < 1e-12);
    /// assert!((w[1] - 1.4).abs() < 1e-12);
    /// # Ok::<(), rbf_nodes::MatrixError>(())
    /// ```
    pub fn solve(self, y: &[f64]) -> Result<Vec<f64>, MatrixError> {
        linalg::gauss_solve(self.data, y.to_vec())
    }
}
