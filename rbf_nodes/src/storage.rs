/////////////////////////////////////////////////////////////////////////////////////////////
//
// Packs matrices into fixed-size host storage slots and enforces the host storage budget.
//
// Created on: 19 Oct 2026     Author: Daniel Owen
//
// Copyright (c) 2026, Maptek Pty Ltd. All rights reserved. Licensed under the MIT License.
//
/////////////////////////////////////////////////////////////////////////////////////////////

//! Fixed-size slot storage for solved matrices.
//!
//! The host persists matrices as a number of 32-value float slots plus the
//! row and column counts. A matrix is written row-major and the final slot
//! is padded with zeros.

use crate::{matrix::Matrix, rbf::RbfError};
use serde::{Deserialize, Serialize};
use std::{error::Error, fmt};

/// Number of values held by one host storage slot.
pub const STORAGE_SLOT_SIZE: usize = 32;

/// Errors raised when rebuilding a [`Matrix`] from stored values.
#[derive(Debug, Clone, PartialEq)]
pub enum StorageError {
    /// Fewer values were stored than `rows * cols`.
    TooFewValues { expected: usize, found: usize },
}

impl fmt::Display for StorageError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StorageError::TooFewValues { expected, found } => write!(
                f,
                "stored matrix needs {} values but only {} were found",
                expected, found
            ),
        }
    }
}

impl Error for StorageError {}

/// Host storage budget: `slot_count` slots of [`STORAGE_SLOT_SIZE`] values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StorageLimits {
    pub slot_count: usize,
}

impl StorageLimits {
    pub fn new(slot_count: usize) -> Self {
        Self { slot_count }
    }

    /// Maximum number of matrix cells the host can persist.
    pub fn max_storage_cells(&self) -> usize {
        self.slot_count * STORAGE_SLOT_SIZE
    }

    /// Fails with [`RbfError::CapacityExceeded`] when `matrix` has more
    /// cells than the host can persist.
    pub fn check(&self, matrix: &Matrix) -> Result<(), RbfError> {
        let cells = matrix.len();
        let max_cells = self.max_storage_cells();
        if cells > max_cells {
            return Err(RbfError::CapacityExceeded { cells, max_cells });
        }
        Ok(())
    }
}

/// Persisted form of a [`Matrix`]: shape plus zero-padded row-major values.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoredMatrix {
    pub rows: usize,
    pub cols: usize,
    pub values: Vec<f64>,
}

impl From<Matrix> for StoredMatrix {
    fn from(m: Matrix) -> Self {
        Self {
            rows: m.nrows(),
            cols: m.ncols(),
            values: m.to_padded_values(),
        }
    }
}

impl TryFrom<StoredMatrix> for Matrix {
    type Error = StorageError;

    fn try_from(s: StoredMatrix) -> Result<Self, Self::Error> {
        Matrix::from_padded_values(s.rows, s.cols, &s.values)
    }
}

/// Smallest multiple of [`STORAGE_SLOT_SIZE`] that holds `cells` values.
#[inline]
pub fn padded_len(cells: usize) -> usize {
    cells.div_ceil(STORAGE_SLOT_SIZE) * STORAGE_SLOT_SIZE
}

impl Matrix {
    /// Row-major values padded with zeros to a multiple of [`STORAGE_SLOT_SIZE`].
    ///
    /// # Examples
    ///
    /// ```
    /// use rbf_nodes::{Matrix, storage::STORAGE_SLOT_SIZE};
    ///
    /// let m = Matrix::fill(3, 3, 1.0);
    /// let values = m.to_padded_values();
    ///
    /// assert_eq!(values.len(), STORAGE_SLOT_SIZE);
    /// assert_eq!(values.iter().sum::<f64>(), 9.0);
    /// ```
    pub fn to_padded_values(&self) -> Vec<f64> {
        let mut values = self.flatten();
        values.resize(padded_len(values.len()), 0.0);
        values
    }

    /// The padded values split into host slots.
    pub fn to_storage_slots(&self) -> Vec<[f64; STORAGE_SLOT_SIZE]> {
        self.to_padded_values()
            .chunks_exact(STORAGE_SLOT_SIZE)
            .map(|chunk| {
                let mut slot = [0.0; STORAGE_SLOT_SIZE];
                slot.copy_from_slice(chunk);
                slot
            })
            .collect()
    }

    /// Rebuilds a matrix from stored values. Values beyond `rows * cols`
    /// are padding and ignored.
    pub fn from_padded_values(rows: usize, cols: usize, values: &[f64]) -> Result<Matrix, StorageError> {
        let cells = rows * cols;
        if values.len() < cells {
            return Err(StorageError::TooFewValues {
                expected: cells,
                found: values.len(),
            });
        }

        Ok(Matrix::from_fn(rows, cols, |i, j| values[i * cols + j]))
    }

    /// Rebuilds a matrix from host slots.
    pub fn from_storage_slots(
        rows: usize,
        cols: usize,
        slots: &[[f64; STORAGE_SLOT_SIZE]],
    ) -> Result<Matrix, StorageError> {
        let values: Vec<f64> = slots.iter().flatten().copied().collect();
        Matrix::from_padded_values(rows, cols, &values)
    }
}
