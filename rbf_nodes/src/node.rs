/////////////////////////////////////////////////////////////////////////////////////////////
//
// Implements the RBF node: an owned pose set, its settings, and the activate/reset lifecycle.
//
// Created on: 19 Oct 2026     Author: Daniel Owen
//
// Copyright (c) 2026, Maptek Pty Ltd. All rights reserved. Licensed under the MIT License.
//
/////////////////////////////////////////////////////////////////////////////////////////////

use crate::{
    config::SolverSettings,
    pose::{Pose, PoseProperty, PoseSet},
    progress::ProgressSink,
    rbf::{ModelIOError, ModelIOResult, RbfError, SolverState},
};
use std::{path::Path, sync::Arc};

/// Convenience builder for constructing an [`RbfNode`].
///
/// The builder should be called via the [`RbfNode::builder`] method.
pub struct RbfNodeBuilder {
    name: String,
    settings: SolverSettings,
    progress_callback: Option<Arc<dyn ProgressSink>>,
}

impl RbfNodeBuilder {
    /// Optional callback for reporting solver progress.
    pub fn progress_callback(mut self, progress_callback: Arc<dyn ProgressSink>) -> Self {
        self.progress_callback = Some(progress_callback);
        self
    }

    /// Builds and returns the configured, inactive [`RbfNode`].
    pub fn build(self) -> RbfNode {
        RbfNode {
            name: self.name,
            poses: PoseSet::new(),
            settings: self.settings,
            state: None,
            active: false,
            progress_callback: self.progress_callback,
        }
    }
}

/// One RBF instance: its poses, settings and solved model.
///
/// The solved model is only ever replaced as a whole. A failed
/// [`RbfNode::activate`] deactivates the node but keeps the last good model
/// so the host can inspect or restore it.
#[derive(Debug)]
pub struct RbfNode {
    name: String,
    poses: PoseSet,
    settings: SolverSettings,
    state: Option<SolverState>,
    active: bool,
    progress_callback: Option<Arc<dyn ProgressSink>>,
}

impl RbfNode {
    /// Creates a new [`RbfNodeBuilder`].
    pub fn builder(name: impl Into<String>, settings: SolverSettings) -> RbfNodeBuilder {
        RbfNodeBuilder {
            name: name.into(),
            settings,
            progress_callback: None,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn poses(&self) -> &PoseSet {
        &self.poses
    }

    /// Adds a pose and returns its index. The current model is not touched;
    /// call [`RbfNode::activate`] to solve again.
    pub fn add_pose(&mut self, drivers: Vec<PoseProperty>, driven: Vec<PoseProperty>) -> usize {
        self.poses.add(drivers, driven)
    }

    pub fn remove_pose(&mut self, index: usize) -> Option<Pose> {
        self.poses.remove(index)
    }

    pub fn settings(&self) -> &SolverSettings {
        &self.settings
    }

    /// Replaces the settings. Takes effect on the next activation.
    pub fn set_settings(&mut self, settings: SolverSettings) {
        self.settings = settings;
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    /// The last successfully solved model, if any.
    pub fn state(&self) -> Option<&SolverState> {
        self.state.as_ref()
    }

    /// Solves the current poses and activates the node.
    ///
    /// On failure the node is deactivated and the previous model is left
    /// as it was.
    pub fn activate(&mut self) -> Result<(), RbfError> {
        match SolverState::solve(
            self.poses.as_slice(),
            &self.settings,
            self.progress_callback.as_deref(),
        ) {
            Ok(state) => {
                self.state = Some(state);
                self.active = true;
                Ok(())
            }
            Err(err) => {
                self.active = false;
                Err(err)
            }
        }
    }

    /// Drops the solved model and deactivates the node.
    pub fn reset(&mut self) {
        self.state = None;
        self.active = false;
    }

    /// Evaluates the active model. `None` while the node is inactive, has
    /// no model, or receives no usable driver values.
    pub fn evaluate(&self, live_driver_values: &[f64]) -> Option<Vec<f64>> {
        if !self.active {
            return None;
        }
        crate::rbf::evaluate(self.state.as_ref(), live_driver_values)
    }

    /// Saves the solved model, see [`SolverState::save_model`].
    pub fn save_model<P: AsRef<Path>>(&self, path: P) -> ModelIOResult<()> {
        match &self.state {
            Some(state) => state.save_model(path),
            None => Err(ModelIOError::NoModel {
                path: path.as_ref().to_path_buf(),
            }),
        }
    }

    /// Loads a model saved with [`RbfNode::save_model`] and activates the node.
    ///
    /// The node's kernel, radius and clamping settings are replaced by the
    /// ones the model was solved with. Storage limits are kept.
    pub fn load_model<P: AsRef<Path>>(&mut self, path: P) -> ModelIOResult<()> {
        let state = SolverState::load_model(path)?;
        self.settings.kernel_type = state.kernel_type;
        self.settings.radius_mode = state.radius_mode;
        self.settings.custom_radius = state.custom_radius;
        self.settings.allow_negative_weights = state.allow_negative_weights;
        self.state = Some(state);
        self.active = true;
        Ok(())
    }
}
