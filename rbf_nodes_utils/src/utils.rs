/////////////////////////////////////////////////////////////////////////////////////////////
//
// Supplies distance helpers, activation matrix builders, and the runtime kernel registry.
//
// Created on: 19 Oct 2026     Author: Daniel Owen
//
// Copyright (c) 2026, Maptek Pty Ltd. All rights reserved. Licensed under the MIT License.
//
/////////////////////////////////////////////////////////////////////////////////////////////

use crate::{KernelFromParams, KernelFunction, KernelParams};
use faer::Mat;
use serde::{Deserialize, Serialize};

/// Calculates the euclidean distance between two points.
///
/// Accepts anything that iterates over `&f64`, so slices and faer row
/// iterators can be mixed freely. Extra trailing values in the longer
/// input are ignored.
///
/// # Examples
///
/// ```
/// use faer::mat;
/// use rbf_nodes_utils::get_distance;
///
/// let points = mat![
///     [1.0, 2.0],
///     [4.0, 6.0f64],
/// ];
///
/// let dist = get_distance(points.row(0).iter(), points.row(1).iter());
/// assert_eq!(dist, 5.0);
///
/// let live = [4.0, 6.0];
/// assert_eq!(get_distance(points.row(0).iter(), &live), 5.0);
/// ```
#[inline(always)]
pub fn get_distance<'a, 'b, T, S>(target: T, source: S) -> f64
where
    T: IntoIterator<Item = &'a f64>,
    S: IntoIterator<Item = &'b f64>,
{
    let mut target = target.into_iter();
    let mut source = source.into_iter();
    let mut dist = 0.0;
    for (t, s) in target.by_ref().zip(source.by_ref()) {
        let diff = t - s;
        dist += diff * diff;
    }
    debug_assert!(
        target.next().is_none() && source.next().is_none(),
        "get_distance called with inputs of different lengths"
    );
    dist.sqrt()
}

/// Builds the symmetric matrix of pairwise euclidean distances between the
/// rows of `points`. The diagonal is zero.
///
/// # Examples
///
/// ```
/// use faer::mat;
/// use rbf_nodes_utils::get_distance_matrix;
///
/// let points = mat![
///     [0.0, 0.0],
///     [3.0, 4.0],
///     [0.0, 1.0f64],
/// ];
///
/// let d = get_distance_matrix(&points);
///
/// assert_eq!(d[(0, 1)], 5.0);
/// assert_eq!(d[(1, 0)], 5.0);
/// assert_eq!(d[(0, 2)], 1.0);
/// assert_eq!(d[(2, 2)], 0.0);
/// ```
#[inline(always)]
pub fn get_distance_matrix(points: &Mat<f64>) -> Mat<f64> {
    let n = points.nrows();

    let mut distances = Mat::<f64>::zeros(n, n);

    for j in 0..n {
        let source = points.row(j);

        for i in (j + 1)..n {
            let dist = get_distance(points.row(i).iter(), source.iter());

            // Write both symmetric entries
            distances[(i, j)] = dist;
            distances[(j, i)] = dist;
        }
    }

    distances
}

/// Applies a typed kernel function to every entry of a distance matrix.
#[inline(always)]
pub fn get_activation_matrix_typed<K>(distances: &Mat<f64>, kernel_function: &K) -> Mat<f64>
where
    K: KernelFunction,
{
    Mat::from_fn(distances.nrows(), distances.ncols(), |i, j| {
        kernel_function.phi(distances[(i, j)])
    })
}

// K-free dispatcher generated from the kernel registry below.
// Assumes each kernel type implements `KernelFromParams::from_params(&KernelParams) -> K`.
macro_rules! for_each_kernel {
    ( registry = [ $( ($V:ident, $Kty:path) ),* $(,)? ] ) => {

        /// Runtime kernel selector built from the kernel registry.
        ///
        /// This is the value persisted with a solved model; it never carries
        /// parameters.
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
        pub enum KernelType {
            $( $V, )*
        }

        impl KernelType {
            /// Every registered kernel type, in registry order.
            pub fn all() -> &'static [KernelType] {
                &[ $( KernelType::$V, )* ]
            }
        }

        /// A concrete kernel together with its parameters.
        #[derive(Debug, Clone, Copy, PartialEq)]
        pub enum Kernel {
            $( $V($Kty), )*
        }

        impl Kernel {
            /// Instantiates the kernel selected by `params.kernel_type`.
            #[inline]
            pub fn from_params(params: &KernelParams) -> Self {
                match params.kernel_type {
                    $(
                        KernelType::$V => {
                            Kernel::$V(<$Kty as KernelFromParams>::from_params(params))
                        }
                    ),*
                }
            }

            /// Returns the [`KernelType`] of this kernel.
            #[inline]
            pub fn kernel_type(&self) -> KernelType {
                match self {
                    $( Kernel::$V(_) => KernelType::$V, )*
                }
            }

            /// Evaluates the kernel at distance `d`.
            #[inline(always)]
            pub fn phi(&self, d: f64) -> f64 {
                match self {
                    $( Kernel::$V(k) => k.phi(d), )*
                }
            }
        }

        /// Builds the activation matrix for the selected [`KernelType`] by
        /// applying the kernel to every entry of `distances`.
        #[inline(always)]
        pub fn get_activation_matrix(
            distances: &Mat<f64>,
            params: &KernelParams,
        ) -> Mat<f64> {
            match params.kernel_type {
                $(
                    KernelType::$V => {
                        // Convert uniform params -> concrete kernel type
                        let k = <$Kty as KernelFromParams>::from_params(params);
                        // Call the generic; type `K` is inferred as `$Kty`
                        get_activation_matrix_typed(distances, &k)
                    }
                ),*
            }
        }

        /// Evaluates the selected kernel function at distance `d`.
        #[inline(always)]
        pub fn kernel_phi(
            d: f64,
            params: &KernelParams,
        ) -> f64 {
            Kernel::from_params(params).phi(d)
        }
    };
}

for_each_kernel! {
    registry = [
        (Linear,              crate::kernels::LinearKernel),
        (Gaussian1,           crate::kernels::Gaussian1Kernel),
        (Gaussian2,           crate::kernels::Gaussian2Kernel),
        (ThinPlate,           crate::kernels::ThinPlateKernel),
        (MultiQuadric,        crate::kernels::MultiQuadricKernel),
        (InverseMultiQuadric, crate::kernels::InverseMultiQuadricKernel),
    ]
}
