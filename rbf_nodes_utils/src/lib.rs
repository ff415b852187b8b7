/////////////////////////////////////////////////////////////////////////////////////////////
//
// Re-exports kernel utilities, constants, and helper functions used across the rbf_nodes crates.
//
// Created on: 19 Oct 2026     Author: Daniel Owen
//
// Copyright (c) 2026, Maptek Pty Ltd. All rights reserved. Licensed under the MIT License.
//
/////////////////////////////////////////////////////////////////////////////////////////////

//! # Utilities for the [`rbf_nodes`] crate and its Python bindings
mod constants;
mod rbf_kernels;
mod traits;
mod utils;
mod kernel_helpers;

/// Implemented kernels for use in the [`rbf_nodes`] crate and its Python bindings.
pub mod kernels {
    pub use super::rbf_kernels::*;
}

pub use {
    constants::{DEFAULT_RADIUS, GAUSSIAN_WIDTH_SCALE},
    kernel_helpers::{KernelParams, KernelParamsBuilder},
    utils::{
        Kernel, KernelType, get_activation_matrix, get_activation_matrix_typed, get_distance,
        get_distance_matrix, kernel_phi,
    },
    traits::{KernelFromParams, KernelFunction},
};
