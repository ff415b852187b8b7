/////////////////////////////////////////////////////////////////////////////////////////////
//
// Declares the solver configuration: kernel selection, radius derivation and output policy.
//
// Created on: 19 Oct 2026     Author: Daniel Owen
//
// Copyright (c) 2026, Maptek Pty Ltd. All rights reserved. Licensed under the MIT License.
//
/////////////////////////////////////////////////////////////////////////////////////////////

//! Declares the solver configuration: kernel selection, radius derivation and output policy.
use crate::storage::StorageLimits;
use rbf_nodes_utils::{KernelParams, KernelType};
use serde::{Deserialize, Serialize};

/// How the kernel radius is derived.
///
/// All modes except [`RadiusMode::Custom`] derive the radius from the
/// statistics of the pairwise distances between the (normalized) poses.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RadiusMode {
    /// Mean pairwise pose distance.
    #[default]
    Mean,

    /// Variance of the pairwise pose distances.
    Variance,

    /// Standard deviation of the pairwise pose distances.
    StandardDeviation,

    /// The caller-supplied `custom_radius`.
    Custom,
}

/// Resolves the kernel radius for `mode`.
///
/// Used both when solving and when evaluating, so a persisted model always
/// evaluates with the radius it was solved with.
#[inline]
pub fn resolve_radius(mode: RadiusMode, mean_distance: f64, variance_distance: f64, custom_radius: f64) -> f64 {
    match mode {
        RadiusMode::Mean => mean_distance,
        RadiusMode::Variance => variance_distance,
        RadiusMode::StandardDeviation => variance_distance.sqrt(),
        RadiusMode::Custom => custom_radius,
    }
}

/// Settings for solving an RBF pose model.
///
/// ### Default Values
/// - `radius_mode`: [`RadiusMode::Mean`]
/// - `custom_radius`: `1.0`
/// - `allow_negative_weights`: `true`
/// - `storage_limits`: `None` (unbounded)
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SolverSettings {
    /// Kernel applied to pose distances.
    pub kernel_type: KernelType,

    /// How the kernel radius is derived.
    pub radius_mode: RadiusMode,

    /// Radius used when `radius_mode` is [`RadiusMode::Custom`].
    pub custom_radius: f64,

    /// When `false`, evaluated output channels below zero are clamped to zero.
    pub allow_negative_weights: bool,

    /// Host storage budget the solved matrices must fit in.
    pub storage_limits: Option<StorageLimits>,
}

impl SolverSettings {
    /// Returns a new [`SolverSettingsBuilder`] for the given kernel type.
    pub fn builder(kernel_type: KernelType) -> SolverSettingsBuilder {
        SolverSettingsBuilder::new(kernel_type)
    }

    /// Kernel parameters for the given radius.
    pub fn kernel_params(&self, radius: f64) -> KernelParams {
        KernelParams::builder(self.kernel_type).radius(radius).build()
    }
}

impl Default for SolverSettings {
    fn default() -> Self {
        SolverSettings::builder(KernelType::Gaussian2).build()
    }
}

/// A convenience builder for constructing a [`SolverSettings`] instance.
///
/// The builder should be called via the [`SolverSettings::builder`] method.
///
/// See [`SolverSettings`] for details on each field.
#[derive(Debug, Clone, Copy)]
pub struct SolverSettingsBuilder {
    pub kernel_type: KernelType,
    pub radius_mode: RadiusMode,
    pub custom_radius: f64,
    pub allow_negative_weights: bool,
    pub storage_limits: Option<StorageLimits>,
}

impl SolverSettingsBuilder {
    fn new(kernel_type: KernelType) -> Self {
        Self {
            kernel_type,
            radius_mode: RadiusMode::default(),
            custom_radius: 1.0,
            allow_negative_weights: true,
            storage_limits: None,
        }
    }

    /// Sets the radius mode.
    pub fn radius_mode(mut self, radius_mode: RadiusMode) -> Self {
        self.radius_mode = radius_mode;
        self
    }

    /// Sets the custom radius and switches to [`RadiusMode::Custom`].
    pub fn custom_radius(mut self, custom_radius: f64) -> Self {
        self.custom_radius = custom_radius;
        self.radius_mode = RadiusMode::Custom;
        self
    }

    /// Allows or forbids negative output channels.
    pub fn allow_negative_weights(mut self, allow: bool) -> Self {
        self.allow_negative_weights = allow;
        self
    }

    /// Limits the solved model to `slot_count` host storage slots.
    pub fn storage_slots(mut self, slot_count: usize) -> Self {
        self.storage_limits = Some(StorageLimits::new(slot_count));
        self
    }

    /// Builds and returns a [`SolverSettings`] instance.
    pub fn build(self) -> SolverSettings {
        SolverSettings {
            kernel_type: self.kernel_type,
            radius_mode: self.radius_mode,
            custom_radius: self.custom_radius,
            allow_negative_weights: self.allow_negative_weights,
            storage_limits: self.storage_limits,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn radius_modes() {
        assert_eq!(resolve_radius(RadiusMode::Mean, 2.0, 9.0, 5.0), 2.0);
        assert_eq!(resolve_radius(RadiusMode::Variance, 2.0, 9.0, 5.0), 9.0);
        assert_eq!(resolve_radius(RadiusMode::StandardDeviation, 2.0, 9.0, 5.0), 3.0);
        assert_eq!(resolve_radius(RadiusMode::Custom, 2.0, 9.0, 5.0), 5.0);
    }

    #[test]
    fn builder_defaults_and_overrides() {
        let s = SolverSettings::builder(KernelType::Linear).build();
        assert_eq!(s.radius_mode, RadiusMode::Mean);
        assert_eq!(RadiusMode::default(), RadiusMode::Mean);
        assert_eq!(s.custom_radius, 1.0);
        assert!(s.allow_negative_weights);
        assert!(s.storage_limits.is_none());

        let s = SolverSettings::builder(KernelType::ThinPlate)
            .custom_radius(0.5)
            .allow_negative_weights(false)
            .storage_slots(4)
            .build();
        assert_eq!(s.radius_mode, RadiusMode::Custom);
        assert_eq!(s.custom_radius, 0.5);
        assert!(!s.allow_negative_weights);
        assert_eq!(s.storage_limits.map(|l| l.max_storage_cells()), Some(128));
        assert_eq!(s.kernel_params(0.5).kernel_type, KernelType::ThinPlate);
    }
}
