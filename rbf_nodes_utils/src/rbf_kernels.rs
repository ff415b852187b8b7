/////////////////////////////////////////////////////////////////////////////////////////////
//
// Implements the concrete RBF kernel functions used for pose interpolation.
//
// Created on: 19 Oct 2026     Author: Daniel Owen
//
// Copyright (c) 2026, Maptek Pty Ltd. All rights reserved. Licensed under the MIT License.
//
/////////////////////////////////////////////////////////////////////////////////////////////

use crate::{DEFAULT_RADIUS, GAUSSIAN_WIDTH_SCALE, KernelFromParams, KernelFunction, KernelParams};

/// Replaces a radius of exactly zero with [`DEFAULT_RADIUS`].
#[inline(always)]
fn effective_radius(radius: f64) -> f64 {
    if radius == 0.0 { DEFAULT_RADIUS } else { radius }
}

/// Linear RBF kernel with `phi(d) = d`.
#[derive(Clone, Debug, Copy, PartialEq)]
pub struct LinearKernel;

impl KernelFunction for LinearKernel {
    #[inline(always)]
    fn phi(&self, d: f64) -> f64 {
        d
    }
}

impl KernelFromParams for LinearKernel {
    #[inline(always)]
    fn from_params(_: &KernelParams) -> Self {
        LinearKernel
    }
}

/// First gaussian RBF kernel with `phi(d) = exp(-(1/r)^2 * d)`.
///
/// Note the exponent is linear in `d`.
#[derive(Clone, Debug, Copy, PartialEq)]
pub struct Gaussian1Kernel {
    pub radius: f64,
    inv_r2: f64, // (1/r)^2
}

impl Gaussian1Kernel {
    #[inline(always)]
    pub fn new(radius: f64) -> Self {
        let radius = effective_radius(radius);
        Self {
            radius,
            inv_r2: (1.0 / radius).powi(2),
        }
    }
}

impl KernelFunction for Gaussian1Kernel {
    #[inline(always)]
    fn phi(&self, d: f64) -> f64 {
        (-self.inv_r2 * d).exp()
    }
}

impl KernelFromParams for Gaussian1Kernel {
    #[inline(always)]
    fn from_params(p: &KernelParams) -> Self {
        Self::new(p.radius)
    }
}

/// Second gaussian RBF kernel with `phi(d) = exp(-d^2 / (2 * (0.707 * r)^2))`.
#[derive(Clone, Debug, Copy, PartialEq)]
pub struct Gaussian2Kernel {
    pub radius: f64,
    two_sigma2: f64, // 2 * (0.707 * r)^2
}

impl Gaussian2Kernel {
    #[inline(always)]
    pub fn new(radius: f64) -> Self {
        let radius = effective_radius(radius);
        Self {
            radius,
            two_sigma2: 2.0 * (GAUSSIAN_WIDTH_SCALE * radius).powi(2),
        }
    }
}

impl KernelFunction for Gaussian2Kernel {
    #[inline(always)]
    fn phi(&self, d: f64) -> f64 {
        (-(d * d) / self.two_sigma2).exp()
    }
}

impl KernelFromParams for Gaussian2Kernel {
    #[inline(always)]
    fn from_params(p: &KernelParams) -> Self {
        Self::new(p.radius)
    }
}

/// Thin plate RBF kernel with `phi(d) = v^2 ln v` where `v = d / r`.
///
/// For `v <= 0` the scaled distance is returned as is.
#[derive(Clone, Debug, Copy, PartialEq)]
pub struct ThinPlateKernel {
    pub radius: f64,
}

impl ThinPlateKernel {
    #[inline(always)]
    pub fn new(radius: f64) -> Self {
        Self {
            radius: effective_radius(radius),
        }
    }
}

impl KernelFunction for ThinPlateKernel {
    #[inline(always)]
    fn phi(&self, d: f64) -> f64 {
        let v = d / self.radius;
        match v > 0.0 {
            true => v.powi(2) * v.ln(),
            false => v,
        }
    }
}

impl KernelFromParams for ThinPlateKernel {
    #[inline(always)]
    fn from_params(p: &KernelParams) -> Self {
        Self::new(p.radius)
    }
}

/// Multiquadric RBF kernel with `phi(d) = sqrt(d^2 + r^2)`.
#[derive(Clone, Debug, Copy, PartialEq)]
pub struct MultiQuadricKernel {
    pub radius: f64,
}

impl MultiQuadricKernel {
    #[inline(always)]
    pub fn new(radius: f64) -> Self {
        Self {
            radius: effective_radius(radius),
        }
    }
}

impl KernelFunction for MultiQuadricKernel {
    #[inline(always)]
    fn phi(&self, d: f64) -> f64 {
        (d * d + self.radius * self.radius).sqrt()
    }
}

impl KernelFromParams for MultiQuadricKernel {
    #[inline(always)]
    fn from_params(p: &KernelParams) -> Self {
        Self::new(p.radius)
    }
}

/// Inverse multiquadric RBF kernel with `phi(d) = 1 / sqrt(d^2 + r^2)`.
#[derive(Clone, Debug, Copy, PartialEq)]
pub struct InverseMultiQuadricKernel {
    pub radius: f64,
}

impl InverseMultiQuadricKernel {
    #[inline(always)]
    pub fn new(radius: f64) -> Self {
        Self {
            radius: effective_radius(radius),
        }
    }
}

impl KernelFunction for InverseMultiQuadricKernel {
    #[inline(always)]
    fn phi(&self, d: f64) -> f64 {
        1.0 / (d * d + self.radius * self.radius).sqrt()
    }
}

impl KernelFromParams for InverseMultiQuadricKernel {
    #[inline(always)]
    fn from_params(p: &KernelParams) -> Self {
        Self::new(p.radius)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const TOL: f64 = 1e-12;

    #[test]
    fn linear_is_identity() {
        for d in [0.0, 0.25, 1.0, 3.5, 100.0] {
            assert_eq!(LinearKernel.phi(d), d);
        }
    }

    #[test]
    fn gaussian1_is_one_at_origin() {
        for r in [0.1, 0.5, 1.0, 4.0] {
            assert_eq!(Gaussian1Kernel::new(r).phi(0.0), 1.0);
        }
    }

    #[test]
    fn gaussian1_exponent_is_linear_in_distance() {
        let k = Gaussian1Kernel::new(2.0);
        let expected = (-0.25f64 * 3.0).exp();
        assert!((k.phi(3.0) - expected).abs() < TOL);
    }

    #[test]
    fn gaussian2_at_one_sigma() {
        let r = 1.5;
        let k = Gaussian2Kernel::new(r);
        let sigma = GAUSSIAN_WIDTH_SCALE * r;
        assert!((k.phi(sigma) - (-0.5f64).exp()).abs() < TOL);
        assert_eq!(k.phi(0.0), 1.0);
    }

    #[test]
    fn thin_plate_matches_formula_and_passes_through_non_positive() {
        let k = ThinPlateKernel::new(2.0);
        assert!(k.phi(2.0).abs() < TOL); // v = 1, ln 1 = 0
        let v: f64 = 3.0 / 2.0;
        assert!((k.phi(3.0) - v * v * v.ln()).abs() < TOL);
        assert_eq!(k.phi(0.0), 0.0);
        assert_eq!(k.phi(-1.0), -0.5);
    }

    #[test]
    fn inverse_multiquadric_at_origin_is_inverse_radius() {
        for r in [0.2, 1.0, 3.0] {
            let k = InverseMultiQuadricKernel::new(r);
            assert!((k.phi(0.0) - 1.0 / r).abs() < TOL);
        }
    }

    #[test]
    fn multiquadric_is_hypotenuse() {
        let k = MultiQuadricKernel::new(3.0);
        assert!((k.phi(4.0) - 5.0).abs() < TOL);
    }

    #[test]
    fn zero_radius_is_replaced_by_default() {
        assert_eq!(ThinPlateKernel::new(0.0).radius, DEFAULT_RADIUS);
        assert_eq!(Gaussian1Kernel::new(0.0).radius, DEFAULT_RADIUS);
        assert_eq!(Gaussian2Kernel::new(0.0).radius, DEFAULT_RADIUS);
        assert_eq!(MultiQuadricKernel::new(0.0).radius, DEFAULT_RADIUS);
        assert!((InverseMultiQuadricKernel::new(0.0).phi(0.0) - 1.0).abs() < TOL);
    }

    #[test]
    fn evaluate_uses_euclidean_distance() {
        let d = LinearKernel.evaluate(&[1.0, 2.0], &[4.0, 6.0]);
        assert!((d - 5.0).abs() < TOL);
    }
}
