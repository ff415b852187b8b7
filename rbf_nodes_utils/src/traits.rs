/////////////////////////////////////////////////////////////////////////////////////////////
//
// Declares the kernel evaluation trait and the trait for shared kernel parameter sets.
//
// Created on: 19 Oct 2026     Author: Daniel Owen
//
// Copyright (c) 2026, Maptek Pty Ltd. All rights reserved. Licensed under the MIT License.
//
/////////////////////////////////////////////////////////////////////////////////////////////

use crate::kernel_helpers::KernelParams;

/// A radial kernel: a scalar function of the distance between two points.
pub trait KernelFunction {
    /// Evaluates the kernel at distance `d`.
    fn phi(&self, d: f64) -> f64;

    /// Evaluates the kernel between two points of equal dimension.
    #[inline(always)]
    fn evaluate(&self, target: &[f64], source: &[f64]) -> f64 {
        self.phi(crate::get_distance(target, source))
    }
}

/// Converts a shared [`KernelParams`] configuration into a concrete kernel type.
pub trait KernelFromParams: Sized {
    /// Constructs `Self` from a set of uniform kernel parameters.
    fn from_params(p: &KernelParams) -> Self;
}
