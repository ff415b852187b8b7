/////////////////////////////////////////////////////////////////////////////////////////////
//
// Implements the dense Gaussian elimination solve used for the RBF activation systems.
//
// Created on: 19 Oct 2026     Author: Daniel Owen
//
// Copyright (c) 2026, Maptek Pty Ltd. All rights reserved. Licensed under the MIT License.
//
/////////////////////////////////////////////////////////////////////////////////////////////

//! # linalg
//!
//! Gaussian elimination with partial pivoting on small dense systems.
//!
//! The pivot rule and singularity tolerance decide which pose sets are
//! rejected as linearly dependent, so both are fixed: the pivot is the
//! first row holding the strictly largest magnitude in the pivot column,
//! and a pivot whose magnitude is below [`SINGULAR_PIVOT_TOLERANCE`] after
//! the row swap is a failure.

use crate::matrix::MatrixError;
use faer::Mat;

/// Smallest pivot magnitude accepted during elimination.
pub const SINGULAR_PIVOT_TOLERANCE: f64 = 1e-4;

/// Swaps rows `r0` and `r1` of `a` in place.
#[inline]
fn swap_rows(a: &mut Mat<f64>, r0: usize, r1: usize) {
    for c in 0..a.ncols() {
        let tmp = a[(r0, c)];
        a[(r0, c)] = a[(r1, c)];
        a[(r1, c)] = tmp;
    }
}

/// Solves `a * w = y` in place and returns `w`.
///
/// Both `a` and `y` are consumed by the elimination.
#[allow(non_snake_case)]
pub(crate) fn gauss_solve(mut A: Mat<f64>, mut y: Vec<f64>) -> Result<Vec<f64>, MatrixError> {
    let n = A.nrows();

    if n != A.ncols() {
        return Err(MatrixError::DimensionMismatch {
            nrows: A.nrows(),
            ncols: A.ncols(),
        });
    }

    if y.len() != n {
        return Err(MatrixError::LengthMismatch {
            expected: n,
            found: y.len(),
        });
    }

    // Forward elimination
    for i in 0..n {
        let mut pivot = i;
        let mut max_val = A[(i, i)].abs();
        for row in (i + 1)..n {
            let val = A[(row, i)].abs();
            if val > max_val {
                max_val = val;
                pivot = row;
            }
        }

        if pivot != i {
            swap_rows(&mut A, i, pivot);
            y.swap(i, pivot);
        }

        let diag = A[(i, i)];
        if diag.abs() < SINGULAR_PIVOT_TOLERANCE {
            return Err(MatrixError::SingularMatrix { row: i, pivot: diag });
        }

        for j in (i + 1)..n {
            let mult = A[(j, i)] / diag;
            // Entries left of column i are never read again.
            for c in i..n {
                let v = A[(i, c)];
                A[(j, c)] -= mult * v;
            }
            y[j] -= mult * y[i];
        }
    }

    // Back substitution
    let mut w = vec![0.0; n];
    for x in (0..n).rev() {
        let mut sum = y[x];
        for j in (x + 1)..n {
            sum -= A[(x, j)] * w[j];
        }
        w[x] = sum / A[(x, x)];
    }

    Ok(w)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};

    /// Random strictly diagonally dominant matrix, hence well conditioned.
    fn random_well_conditioned(n: usize, rng: &mut StdRng) -> Mat<f64> {
        let mut a = Mat::from_fn(n, n, |_, _| rng.random_range(-1.0..1.0));
        for i in 0..n {
            a[(i, i)] = n as f64 + rng.random_range(1.0..2.0);
        }
        a
    }

    fn identity(n: usize) -> Mat<f64> {
        Mat::from_fn(n, n, |i, j| if i == j { 1.0 } else { 0.0 })
    }

    fn matvec(a: &Mat<f64>, w: &[f64]) -> Vec<f64> {
        (0..a.nrows())
            .map(|i| (0..a.ncols()).map(|j| a[(i, j)] * w[j]).sum())
            .collect()
    }

    #[test]
    fn recovers_known_solution() {
        let mut rng = StdRng::seed_from_u64(42);

        for n in [1usize, 2, 5, 12, 30] {
            let a = random_well_conditioned(n, &mut rng);
            let w: Vec<f64> = (0..n).map(|_| rng.random_range(-10.0..10.0)).collect();
            let y = matvec(&a, &w);

            let w_out = gauss_solve(a.clone(), y).unwrap();

            for (expected, found) in w.iter().zip(&w_out) {
                let scale = expected.abs().max(1.0);
                assert!(
                    (expected - found).abs() / scale < 1e-6,
                    "expected {expected}, found {found}"
                );
            }
        }
    }

    #[test]
    fn pivots_past_a_zero_diagonal() {
        let mut a = Mat::<f64>::zeros(2, 2);
        a[(0, 1)] = 1.0;
        a[(1, 0)] = 1.0;
        let w = gauss_solve(a, vec![3.0, 7.0]).unwrap();
        assert_eq!(w, vec![7.0, 3.0]);
    }

    #[test]
    fn identical_rows_are_singular() {
        let a = Mat::from_fn(3, 3, |i, j| {
            [[1.0, 2.0, 3.0], [1.0, 2.0, 3.0], [4.0, 5.0, 7.0]][i][j]
        });
        let err = gauss_solve(a, vec![1.0, 1.0, 1.0]).unwrap_err();
        assert!(matches!(err, MatrixError::SingularMatrix { row: 2, .. }));
    }

    #[test]
    fn singular_threshold_is_1e_4() {
        let mut a = identity(2);
        a[(0, 0)] = 5e-5;
        let err = gauss_solve(a.clone(), vec![1.0, 1.0]).unwrap_err();
        assert_eq!(err.singular_row(), Some(0));

        a[(0, 0)] = 2e-4;
        let w = gauss_solve(a, vec![1.0, 1.0]).unwrap();
        assert!((w[0] - 5000.0).abs() < 1e-9);
    }

    #[test]
    fn non_square_is_rejected() {
        let a = Mat::<f64>::zeros(2, 3);
        let err = gauss_solve(a, vec![0.0, 0.0]).unwrap_err();
        assert_eq!(err, MatrixError::DimensionMismatch { nrows: 2, ncols: 3 });
    }

    #[test]
    fn wrong_rhs_length_is_rejected() {
        let a = identity(3);
        let err = gauss_solve(a, vec![1.0]).unwrap_err();
        assert_eq!(err, MatrixError::LengthMismatch { expected: 3, found: 1 });
    }

    #[test]
    fn empty_system_solves_to_empty() {
        assert_eq!(gauss_solve(Mat::<f64>::zeros(0, 0), vec![]).unwrap(), Vec::<f64>::new());
    }
}
