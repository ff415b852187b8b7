/////////////////////////////////////////////////////////////////////////////////////////////
//
// Exposes the public API and high-level documentation for RBF pose interpolation.
//
// Created on: 19 Oct 2026     Author: Daniel Owen
//
// Copyright (c) 2026, Maptek Pty Ltd. All rights reserved. Licensed under the MIT License.
//
/////////////////////////////////////////////////////////////////////////////////////////////

//! # Radial Basis Function (RBF) pose interpolation.
//!
//! A pose maps a handful of *driver* values (rotations, locations, custom
//! properties) to a handful of *driven* values (shape key weights, bone
//! transforms). Given a set of poses, this crate solves an RBF model that
//! blends the driven values smoothly as the drivers move between poses.
//!
//! Pose sets are small, typically tens of poses, so the weights are solved
//! directly with Gaussian elimination and partial pivoting on a dense
//! activation matrix.
//!
//! # Features
//! - Six kernels: linear, two Gaussians, thin plate, multi-quadric and
//!   inverse multi-quadric (see [`rbf_nodes_utils::KernelType`])
//! - Kernel radius from the pose distance mean, variance, standard deviation,
//!   or a custom value
//! - Optional clamping of negative outputs
//! - Fixed-size storage slot layout for hosts that persist matrices in
//!   32-value blocks
//! - JSON model files via [`SolverState::save_model`]
//! - Built on [`faer`](https://docs.rs/faer/latest/faer/) for dense matrix storage
//!
//! # Examples
//!
//! ```
//! use rbf_nodes::{PoseProperty, RbfNode, SolverSettings};
//! use rbf_nodes_utils::KernelType;
//!
//! let settings = SolverSettings::builder(KernelType::Gaussian2).build();
//! let mut node = RbfNode::builder("elbow_corrective", settings).build();
//!
//! // Elbow bend angle (radians) drives a corrective shape key.
//! for (angle, weight) in [(0.0, 0.0), (0.8, 0.4), (1.6, 1.0)] {
//!     node.add_pose(
//!         vec![PoseProperty::new("rotation_euler[0]", angle)],
//!         vec![PoseProperty::new("key_blocks[\"elbow\"].value", weight)],
//!     );
//! }
//!
//! node.activate()?;
//!
//! // The model reproduces every pose.
//! let out = node.evaluate(&[0.8]).unwrap();
//! assert!((out[0] - 0.4).abs() < 1e-9);
//!
//! // And blends in between.
//! let between = node.evaluate(&[1.2]).unwrap();
//! assert!(between[0] > 0.4 && between[0] < 1.0);
//! # Ok::<(), rbf_nodes::RbfError>(())
//! ```
pub mod config;

mod linalg;

pub mod matrix;

pub mod node;

pub mod pose;

pub mod progress;

mod rbf;

pub mod storage;

pub use {
    config::{RadiusMode, SolverSettings, SolverSettingsBuilder},
    linalg::SINGULAR_PIVOT_TOLERANCE,
    matrix::{Matrix, MatrixError},
    node::{RbfNode, RbfNodeBuilder},
    pose::{Pose, PoseProperty, PoseSet, PropertyKind, build_pose_matrices},
    rbf::{InconsistentState, ModelIOError, RbfError, SolverState, evaluate},
    storage::{STORAGE_SLOT_SIZE, StorageError, StorageLimits, StoredMatrix},
};
