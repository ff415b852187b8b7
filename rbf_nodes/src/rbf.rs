/////////////////////////////////////////////////////////////////////////////////////////////
//
// Implements the RBF solver state: pose matrix assembly, weight solve, evaluation and model I/O.
//
// Created on: 19 Oct 2026     Author: Daniel Owen
//
// Copyright (c) 2026, Maptek Pty Ltd. All rights reserved. Licensed under the MIT License.
//
/////////////////////////////////////////////////////////////////////////////////////////////

use crate::{
    config::{RadiusMode, SolverSettings, resolve_radius},
    matrix::{Matrix, MatrixError, normalize_vector},
    pose::{Pose, PropertyKind, build_pose_matrices, ordered_poses},
    progress::{ProgressMsg, ProgressSink, progress_from_columns},
};

use rbf_nodes_utils::{Kernel, KernelParams, KernelType, get_distance};
use serde::{Deserialize, Serialize};
use std::{
    error::Error,
    fmt,
    fs::File,
    io::{self, BufReader, BufWriter, Write},
    path::{Path, PathBuf},
    time::Instant,
};

/// Errors that can occur while solving an RBF pose model.
#[derive(Debug, Clone, PartialEq)]
pub enum RbfError {
    /// There are no poses to solve.
    EmptyPoseSet,

    /// A pose has a different number of driver or driven values than the
    /// first pose.
    PropertyCountMismatch {
        pose_index: usize,
        kind: PropertyKind,
        expected: usize,
        found: usize,
    },

    /// The solved model would not fit in the host's storage slots.
    CapacityExceeded { cells: usize, max_cells: usize },

    /// The activation system for one driven output column could not be
    /// solved. `pose_index` is the stored index of the pose whose row broke
    /// down, when the failure is a singular pivot.
    Decomposition {
        output_column: usize,
        pose_index: Option<usize>,
        source: MatrixError,
    },
}

impl fmt::Display for RbfError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RbfError::EmptyPoseSet => write!(f, "no poses to solve"),
            RbfError::PropertyCountMismatch {
                pose_index,
                kind,
                expected,
                found,
            } => write!(
                f,
                "pose {} has {} {} values, expected {}",
                pose_index, found, kind, expected
            ),
            RbfError::CapacityExceeded { cells, max_cells } => write!(
                f,
                "solved model needs {} storage cells but only {} are available",
                cells, max_cells
            ),
            RbfError::Decomposition {
                output_column,
                pose_index: Some(pose_index),
                source,
            } => write!(
                f,
                "decomposition failed for output {}: pose {} is linearly dependent on another pose ({})",
                output_column, pose_index, source
            ),
            RbfError::Decomposition {
                output_column,
                pose_index: None,
                source,
            } => write!(f, "decomposition failed for output {}: {}", output_column, source),
        }
    }
}

impl Error for RbfError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            RbfError::Decomposition { source, .. } => Some(source),
            _ => None,
        }
    }
}

/// A solved RBF pose model.
///
/// Produced wholesale by [`SolverState::solve`]; there is no way to update
/// it in place. Evaluation only reads it.
///
/// Deserializing rejects a weight matrix that does not have one row per
/// stored pose.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "StoredSolverState")]
pub struct SolverState {
    /// Column-normalized driver matrix with one extra trailing row holding
    /// the per-column normalization factors.
    pub input_matrix_extended: Matrix,

    /// Solved weights, poses x driven values.
    pub weight_matrix: Matrix,

    /// Mean of the pairwise pose distances.
    pub mean_distance: f64,

    /// Population variance of the pairwise pose distances.
    pub variance_distance: f64,

    pub kernel_type: KernelType,

    pub radius_mode: RadiusMode,

    /// Only used when `radius_mode` is [`RadiusMode::Custom`].
    pub custom_radius: f64,

    /// When `false`, negative output channels evaluate to zero.
    pub allow_negative_weights: bool,
}

/// Unchecked persisted form of a [`SolverState`].
#[derive(Deserialize)]
struct StoredSolverState {
    input_matrix_extended: Matrix,
    weight_matrix: Matrix,
    mean_distance: f64,
    variance_distance: f64,
    kernel_type: KernelType,
    radius_mode: RadiusMode,
    custom_radius: f64,
    allow_negative_weights: bool,
}

/// A persisted model whose input and weight matrices disagree on the
/// number of poses.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InconsistentState {
    pub input_rows: usize,
    pub weight_rows: usize,
}

impl fmt::Display for InconsistentState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} input rows for {} weight rows (expected one extra input row)",
            self.input_rows, self.weight_rows
        )
    }
}

impl Error for InconsistentState {}

impl TryFrom<StoredSolverState> for SolverState {
    type Error = InconsistentState;

    fn try_from(s: StoredSolverState) -> Result<Self, Self::Error> {
        if s.input_matrix_extended.nrows() != s.weight_matrix.nrows() + 1 {
            return Err(InconsistentState {
                input_rows: s.input_matrix_extended.nrows(),
                weight_rows: s.weight_matrix.nrows(),
            });
        }

        Ok(Self {
            input_matrix_extended: s.input_matrix_extended,
            weight_matrix: s.weight_matrix,
            mean_distance: s.mean_distance,
            variance_distance: s.variance_distance,
            kernel_type: s.kernel_type,
            radius_mode: s.radius_mode,
            custom_radius: s.custom_radius,
            allow_negative_weights: s.allow_negative_weights,
        })
    }
}

impl SolverState {
    /// Solves the RBF weights for `poses`.
    ///
    /// Poses are taken in index order. Each driven output column is solved
    /// against a fresh copy of the activation matrix. Progress events go to
    /// `progress` when given.
    ///
    /// # Examples
    ///
    /// ```
    /// use rbf_nodes::{Pose, PoseProperty, SolverSettings, SolverState};
    /// use rbf_nodes_utils::KernelType;
    ///
    /// let pose = |index: usize, x: f64, y: f64| Pose {
    ///     index,
    ///     drivers: vec![PoseProperty::new("rotation_euler[0]", x)],
    ///     driven: vec![PoseProperty::new("value", y)],
    /// };
    /// let poses = vec![pose(0, 0.0, 0.0), pose(1, 1.0, 10.0)];
    ///
    /// let settings = SolverSettings::builder(KernelType::Linear)
    ///     .custom_radius(1.0)
    ///     .build();
    ///
    /// let state = SolverState::solve(&poses, &settings, None)?;
    /// let out = state.evaluate(&[0.5]).unwrap();
    ///
    /// assert!((out[0] - 5.0).abs() < 1e-9);
    /// # Ok::<(), rbf_nodes::RbfError>(())
    /// ```
    pub fn solve(
        poses: &[Pose],
        settings: &SolverSettings,
        progress: Option<&dyn ProgressSink>,
    ) -> Result<Self, RbfError> {
        let solver_start = Instant::now();

        let (mut driver_matrix, driven_matrix) = build_pose_matrices(poses)?;
        let ordered = ordered_poses(poses);
        let num_poses = driver_matrix.nrows();

        if let Some(sink) = progress {
            sink.emit(ProgressMsg::PosesAssembled {
                num_poses,
                driver_dims: driver_matrix.ncols(),
                driven_dims: driven_matrix.ncols(),
            });
        }

        // Column normalization; the factor count always matches here.
        let norms = driver_matrix.column_norms();
        driver_matrix.normalize(&norms, false);

        let input_matrix_extended =
            Matrix::from_fn(num_poses + 1, driver_matrix.ncols(), |i, j| {
                if i < num_poses {
                    driver_matrix.as_mat()[(i, j)]
                } else {
                    norms[j]
                }
            });

        if let Some(limits) = &settings.storage_limits {
            limits.check(&input_matrix_extended)?;
            limits.check(&driven_matrix)?;
        }

        let distances = Matrix::from(rbf_nodes_utils::get_distance_matrix(driver_matrix.as_mat()));
        let mean_distance = distances.mean();
        let variance_distance = distances.variance();

        let radius = resolve_radius(
            settings.radius_mode,
            mean_distance,
            variance_distance,
            settings.custom_radius,
        );
        let kernel_params = settings.kernel_params(radius);
        let activation = Matrix::from(rbf_nodes_utils::get_activation_matrix(
            distances.as_mat(),
            &kernel_params,
        ));

        let num_columns = driven_matrix.ncols();
        let mut weight_matrix = Matrix::zeros(num_poses, num_columns);

        for c in 0..num_columns {
            let y: Vec<f64> = driven_matrix.as_mat().col(c).iter().copied().collect();

            let w = activation.clone().solve(&y).map_err(|source| RbfError::Decomposition {
                output_column: c,
                pose_index: source.singular_row().map(|row| ordered[row].index),
                source,
            })?;

            let weights = weight_matrix.as_mat_mut();
            for (r, value) in w.into_iter().enumerate() {
                weights[(r, c)] = value;
            }

            if let Some(sink) = progress {
                sink.emit(ProgressMsg::ColumnSolved {
                    column: c,
                    num_columns,
                    progress: progress_from_columns(c + 1, num_columns),
                });
            }
        }

        let state = Self {
            input_matrix_extended,
            weight_matrix,
            mean_distance,
            variance_distance,
            kernel_type: settings.kernel_type,
            radius_mode: settings.radius_mode,
            custom_radius: settings.custom_radius,
            allow_negative_weights: settings.allow_negative_weights,
        };

        if let Some(sink) = progress {
            let msg = format!(
                "Took {:?} to solve RBF for {} poses using the following settings:\n\
                Kernel: {:?}, Radius mode: {:?}, Radius: {}\n\
                Driver values: {}, Driven values: {}",
                solver_start.elapsed(),
                num_poses,
                state.kernel_type,
                state.radius_mode,
                radius,
                state.driver_dimensions(),
                state.driven_dimensions(),
            );

            sink.emit(ProgressMsg::Message { message: msg });
        }

        Ok(state)
    }

    /// Number of poses the model was solved from.
    pub fn pose_count(&self) -> usize {
        self.input_matrix_extended.nrows().saturating_sub(1)
    }

    /// Number of driver values per pose.
    pub fn driver_dimensions(&self) -> usize {
        self.input_matrix_extended.ncols()
    }

    /// Number of driven values per pose.
    pub fn driven_dimensions(&self) -> usize {
        self.weight_matrix.ncols()
    }

    /// The per-column normalization factors stored in the last row of
    /// [`SolverState::input_matrix_extended`].
    pub fn norm_factors(&self) -> Vec<f64> {
        self.input_matrix_extended
            .row(self.pose_count())
            .unwrap_or_default()
    }

    /// The kernel radius this model evaluates with.
    pub fn radius(&self) -> f64 {
        resolve_radius(
            self.radius_mode,
            self.mean_distance,
            self.variance_distance,
            self.custom_radius,
        )
    }

    pub fn kernel_params(&self) -> KernelParams {
        KernelParams::builder(self.kernel_type)
            .radius(self.radius())
            .build()
    }

    /// Interpolates the driven values for a live set of driver values.
    ///
    /// Returns `None` when `live_driver_values` is empty or does not have
    /// one value per driver, e.g. while a driving object is missing, and
    /// when the weight matrix does not have one row per stored pose.
    pub fn evaluate(&self, live_driver_values: &[f64]) -> Option<Vec<f64>> {
        if live_driver_values.is_empty() || live_driver_values.len() != self.driver_dimensions() {
            return None;
        }
        if self.input_matrix_extended.nrows() == 0
            || self.weight_matrix.nrows() != self.pose_count()
        {
            return None;
        }

        let mut normalized = live_driver_values.to_vec();
        normalize_vector(&mut normalized, &self.norm_factors());

        let kernel = Kernel::from_params(&self.kernel_params());
        let stored = self.input_matrix_extended.as_mat();

        let activations: Vec<f64> = (0..self.pose_count())
            .map(|i| kernel.phi(get_distance(stored.row(i).iter(), &normalized)))
            .collect();

        let weights = self.weight_matrix.as_mat();
        let output = (0..self.driven_dimensions())
            .map(|j| {
                let value: f64 = activations
                    .iter()
                    .enumerate()
                    .map(|(i, a)| weights[(i, j)] * a)
                    .sum();
                if !self.allow_negative_weights && value < 0.0 {
                    0.0
                } else {
                    value
                }
            })
            .collect();

        Some(output)
    }

    /// Saves the model to a versioned **JSON envelope**.
    ///
    /// Files produced here are intended to be read back with [`SolverState::load_model`].
    ///
    /// ### Errors
    /// - Returns `ModelIOError::{Create, Serialize, Flush}` on I/O or serialization
    ///   failures.
    pub fn save_model<P: AsRef<Path>>(&self, path: P) -> ModelIOResult<()> {
        let path_ref = path.as_ref();
        let file = File::create(path_ref).map_err(|e| ModelIOError::Create {
            path: path_ref.to_path_buf(),
            source: e,
        })?;
        let mut w = BufWriter::new(file);

        let env = JsonEnvelopeRef {
            format: JSON_FORMAT_NAME,
            version: JSON_VERSION,
            model: self,
        };

        serde_json::to_writer_pretty(&mut w, &env).map_err(|e| ModelIOError::Serialize {
            path: path_ref.to_path_buf(),
            source: e,
        })?;
        w.flush().map_err(|e| ModelIOError::Flush {
            path: path_ref.to_path_buf(),
            source: e,
        })?;
        Ok(())
    }

    /// Loads a model from a versioned **JSON envelope**, validating format & version.
    ///
    /// ### Errors
    /// - Returns `ModelIOError::{Open, Parse, FormatMismatch, VersionMismatch, Inconsistent}`
    ///   as appropriate.
    pub fn load_model<P: AsRef<Path>>(path: P) -> ModelIOResult<Self> {
        let path_ref = path.as_ref();

        let file = File::open(path_ref).map_err(|e| ModelIOError::Open {
            path: path_ref.to_path_buf(),
            source: e,
        })?;
        let reader = BufReader::new(file);

        let env: JsonEnvelopeOwned<StoredSolverState> =
            serde_json::from_reader(reader).map_err(|e| ModelIOError::Parse {
                path: path_ref.to_path_buf(),
                source: e,
            })?;

        // Validate envelope
        if env.format != JSON_FORMAT_NAME {
            return Err(ModelIOError::FormatMismatch {
                path: path_ref.to_path_buf(),
                found: env.format,
                expected: JSON_FORMAT_NAME,
            });
        }

        if env.version != JSON_VERSION {
            return Err(ModelIOError::VersionMismatch {
                path: path_ref.to_path_buf(),
                found: env.version,
                expected: JSON_VERSION,
            });
        }

        Self::try_from(env.model).map_err(|e| ModelIOError::Inconsistent {
            path: path_ref.to_path_buf(),
            input_rows: e.input_rows,
            weight_rows: e.weight_rows,
        })
    }
}

/// Evaluates an optional model. `None` when the model has not been solved.
pub fn evaluate(state: Option<&SolverState>, live_driver_values: &[f64]) -> Option<Vec<f64>> {
    state?.evaluate(live_driver_values)
}

const JSON_FORMAT_NAME: &str = "rbf_nodes.json";
const JSON_VERSION: u32 = 1;

/// Borrowing envelope for SAVE (no clone of the model).
#[derive(Serialize)]
struct JsonEnvelopeRef<'a, T: ?Sized> {
    format: &'static str,
    version: u32,
    #[serde(flatten)]
    model: &'a T,
}

/// Owning envelope for LOAD (generic over the concrete model).
#[derive(Deserialize)]
struct JsonEnvelopeOwned<T> {
    format: String,
    version: u32,
    #[serde(flatten)]
    model: T,
}

pub(crate) type ModelIOResult<T> = std::result::Result<T, ModelIOError>;

/// Errors that can occur when saving or loading a [`SolverState`] model.
#[derive(Debug)]
pub enum ModelIOError {
    /// There is no solved model to save.
    NoModel { path: PathBuf },
    /// Failed to create the target file before writing a model.
    Create { path: PathBuf, source: io::Error },
    /// Failed to open an existing model file for reading.
    Open { path: PathBuf, source: io::Error },
    /// Failed to flush buffered output when finishing a write.
    Flush { path: PathBuf, source: io::Error },
    /// Error serializing the in-memory model to JSON.
    Serialize {
        path: PathBuf,
        source: serde_json::Error,
    },
    /// Error parsing JSON when reading a model from disk.
    Parse {
        path: PathBuf,
        source: serde_json::Error,
    },
    /// The JSON `format` field does not match the expected model format.
    FormatMismatch {
        path: PathBuf,
        found: String,
        expected: &'static str,
    },
    /// The JSON `version` field does not match the supported version.
    VersionMismatch {
        path: PathBuf,
        found: u32,
        expected: u32,
    },
    /// The stored matrices disagree on the number of poses.
    Inconsistent {
        path: PathBuf,
        input_rows: usize,
        weight_rows: usize,
    },
}

impl fmt::Display for ModelIOError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ModelIOError::NoModel { path } => {
                write!(f, "no solved model to write to {}", path.display())
            }
            ModelIOError::Create { path, source } => {
                write!(f, "creating {}: {}", path.display(), source)
            }
            ModelIOError::Open { path, source } => {
                write!(f, "opening {}: {}", path.display(), source)
            }
            ModelIOError::Flush { path, source } => {
                write!(f, "flushing {}: {}", path.display(), source)
            }
            ModelIOError::Serialize { path, source } => {
                write!(f, "serializing JSON to {}: {}", path.display(), source)
            }
            ModelIOError::Parse { path, source } => {
                write!(f, "parsing JSON in {}: {}", path.display(), source)
            }
            ModelIOError::FormatMismatch {
                path,
                found,
                expected,
            } => write!(
                f,
                "unsupported format {:?} (expected {:?}) in {}",
                found,
                expected,
                path.display()
            ),
            ModelIOError::VersionMismatch {
                path,
                found,
                expected,
            } => write!(
                f,
                "unsupported version {} (expected {}) in {}",
                found,
                expected,
                path.display()
            ),
            ModelIOError::Inconsistent {
                path,
                input_rows,
                weight_rows,
            } => write!(
                f,
                "inconsistent model in {}: {} input rows for {} weight rows",
                path.display(),
                input_rows,
                weight_rows
            ),
        }
    }
}

impl Error for ModelIOError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            ModelIOError::Create { source, .. }
            | ModelIOError::Open { source, .. }
            | ModelIOError::Flush { source, .. } => Some(source),
            ModelIOError::Serialize { source, .. } | ModelIOError::Parse { source, .. } => {
                Some(source)
            }
            ModelIOError::NoModel { .. }
            | ModelIOError::FormatMismatch { .. }
            | ModelIOError::VersionMismatch { .. }
            | ModelIOError::Inconsistent { .. } => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{pose::PoseSet, pose::PoseProperty, progress::CollectingSink};
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};

    fn props(prefix: &str, values: &[f64]) -> Vec<PoseProperty> {
        values
            .iter()
            .enumerate()
            .map(|(i, v)| PoseProperty::new(format!("{prefix}[{i}]"), *v))
            .collect()
    }

    fn pose_set(samples: &[(&[f64], &[f64])]) -> PoseSet {
        let mut set = PoseSet::new();
        for (drivers, driven) in samples {
            set.add(props("rotation_euler", drivers), props("value", driven));
        }
        set
    }

    fn linear_custom(radius: f64) -> SolverSettings {
        SolverSettings::builder(KernelType::Linear)
            .custom_radius(radius)
            .build()
    }

    fn temp_path(name: &str) -> PathBuf {
        std::env::temp_dir().join(format!("rbf_nodes_{}_{}.json", name, std::process::id()))
    }

    #[test]
    fn midpoint_interpolation_with_linear_kernel() {
        let set = pose_set(&[(&[0.0], &[0.0]), (&[1.0], &[10.0])]);
        let state = SolverState::solve(set.as_slice(), &linear_custom(1.0), None).unwrap();

        let out = state.evaluate(&[0.5]).unwrap();
        assert_eq!(out.len(), 1);
        assert!((out[0] - 5.0).abs() < 1e-9, "got {}", out[0]);
    }

    #[test]
    fn reproduces_every_pose_exactly() {
        let mut rng = StdRng::seed_from_u64(7);
        let drivers: [[f64; 3]; 6] = [
            [1.0, 0.0, 0.0],
            [0.0, 1.0, 0.0],
            [0.0, 0.0, 1.0],
            [1.0, 1.0, 0.0],
            [0.0, 1.0, 1.0],
            [1.0, 0.0, 1.0],
        ];
        let samples: Vec<(Vec<f64>, Vec<f64>)> = drivers
            .iter()
            .map(|d| (d.to_vec(), (0..2).map(|_| rng.random_range(0.0..5.0)).collect()))
            .collect();

        let mut set = PoseSet::new();
        for (d, v) in &samples {
            set.add(props("loc", d), props("shape", v));
        }

        for &kernel_type in &[KernelType::Linear, KernelType::Gaussian2] {
            let settings = SolverSettings::builder(kernel_type).build();
            let state = SolverState::solve(set.as_slice(), &settings, None).unwrap();
            assert_eq!(state.pose_count(), 6);
            assert_eq!(state.driver_dimensions(), 3);
            assert_eq!(state.driven_dimensions(), 2);

            for (d, v) in &samples {
                let out = state.evaluate(d).unwrap();
                for (expected, found) in v.iter().zip(&out) {
                    assert!(
                        (expected - found).abs() < 1e-6,
                        "{:?}: expected {}, found {}",
                        kernel_type,
                        expected,
                        found
                    );
                }
            }
        }
    }

    #[test]
    fn extended_matrix_holds_norm_row() {
        let set = pose_set(&[(&[3.0, 0.0], &[1.0]), (&[4.0, 2.0], &[2.0])]);
        let state = SolverState::solve(set.as_slice(), &linear_custom(1.0), None).unwrap();

        assert_eq!(state.input_matrix_extended.shape(), (3, 2));
        assert_eq!(state.norm_factors(), vec![5.0, 2.0]);
        assert_eq!(state.input_matrix_extended.row(0).unwrap(), vec![0.6, 0.0]);
        assert_eq!(state.input_matrix_extended.row(1).unwrap(), vec![0.8, 1.0]);
    }

    #[test]
    fn zero_norm_column_is_left_unnormalized() {
        let set = pose_set(&[(&[0.0, 1.0], &[1.0]), (&[0.0, 2.0], &[2.0])]);
        let state = SolverState::solve(set.as_slice(), &linear_custom(1.0), None).unwrap();
        assert_eq!(state.norm_factors()[0], 0.0);
        assert_eq!(state.input_matrix_extended.get(1, 0).unwrap(), 0.0);
        assert!(state.evaluate(&[0.0, 2.0]).is_some());
    }

    #[test]
    fn distance_statistics_and_radius_modes() {
        let set = pose_set(&[(&[0.0], &[0.0]), (&[1.0], &[1.0])]);
        let settings = SolverSettings::builder(KernelType::Gaussian1)
            .radius_mode(RadiusMode::StandardDeviation)
            .build();
        let state = SolverState::solve(set.as_slice(), &settings, None).unwrap();

        // Normalized drivers are [0] and [1]: distances [[0, 1], [1, 0]].
        assert_eq!(state.mean_distance, 0.5);
        assert_eq!(state.variance_distance, 0.25);
        assert_eq!(state.radius(), 0.5);
    }

    #[test]
    fn negative_channels_are_clamped_when_disallowed() {
        let samples: &[(&[f64], &[f64])] = &[(&[0.0], &[0.0]), (&[1.0], &[-10.0])];
        let set = pose_set(samples);

        let allowed = SolverSettings::builder(KernelType::Linear)
            .custom_radius(1.0)
            .build();
        let state = SolverState::solve(set.as_slice(), &allowed, None).unwrap();
        assert!(state.evaluate(&[0.5]).unwrap()[0] < 0.0);

        let clamped = SolverSettings::builder(KernelType::Linear)
            .custom_radius(1.0)
            .allow_negative_weights(false)
            .build();
        let state = SolverState::solve(set.as_slice(), &clamped, None).unwrap();
        assert_eq!(state.evaluate(&[0.5]).unwrap()[0], 0.0);
        assert_eq!(state.evaluate(&[1.0]).unwrap()[0], 0.0);
    }

    #[test]
    fn missing_model_or_live_values_give_no_result() {
        assert!(evaluate(None, &[0.5]).is_none());

        let set = pose_set(&[(&[0.0], &[0.0]), (&[1.0], &[10.0])]);
        let state = SolverState::solve(set.as_slice(), &linear_custom(1.0), None).unwrap();
        assert!(evaluate(Some(&state), &[]).is_none());
        assert!(state.evaluate(&[0.1, 0.2]).is_none());
        assert!(evaluate(Some(&state), &[0.5]).is_some());
    }

    #[test]
    fn evaluate_does_not_touch_the_state() {
        let set = pose_set(&[(&[0.0, 2.0], &[0.0]), (&[1.0, 0.0], &[10.0])]);
        let state = SolverState::solve(set.as_slice(), &linear_custom(1.0), None).unwrap();
        let before = state.clone();
        let live = vec![0.3, 1.2];
        let first = state.evaluate(&live).unwrap();
        let second = state.evaluate(&live).unwrap();
        assert_eq!(first, second);
        assert_eq!(state, before);
        assert_eq!(live, vec![0.3, 1.2]);
    }

    #[test]
    fn duplicate_poses_report_the_stored_pose_index() {
        let mut set = PoseSet::new();
        set.add(props("loc", &[0.0]), props("v", &[0.0]));
        let removed = set.add(props("loc", &[0.5]), props("v", &[0.0]));
        set.remove(removed);
        set.add(props("loc", &[1.0]), props("v", &[1.0]));
        let dup = set.add(props("loc", &[1.0]), props("v", &[2.0]));

        let settings = SolverSettings::builder(KernelType::Gaussian2).build();
        match SolverState::solve(set.as_slice(), &settings, None) {
            Err(RbfError::Decomposition {
                output_column,
                pose_index,
                source: MatrixError::SingularMatrix { row, .. },
            }) => {
                assert_eq!(output_column, 0);
                assert_eq!(row, 2);
                assert_eq!(pose_index, Some(dup));
            }
            other => panic!("unexpected result {:?}", other),
        }
    }

    #[test]
    fn capacity_is_enforced() {
        let set = pose_set(&[(&[0.0; 20], &[0.0]), (&[1.0; 20], &[1.0])]);
        let settings = SolverSettings::builder(KernelType::Linear)
            .storage_slots(1)
            .build();
        match SolverState::solve(set.as_slice(), &settings, None) {
            Err(RbfError::CapacityExceeded { cells, max_cells }) => {
                assert_eq!((cells, max_cells), (60, 32));
            }
            other => panic!("unexpected result {:?}", other),
        }

        let roomy = SolverSettings::builder(KernelType::Linear)
            .storage_slots(2)
            .build();
        assert!(SolverState::solve(set.as_slice(), &roomy, None).is_ok());
    }

    #[test]
    fn empty_and_mismatched_pose_sets_fail() {
        let settings = SolverSettings::default();
        assert_eq!(
            SolverState::solve(&[], &settings, None).unwrap_err(),
            RbfError::EmptyPoseSet
        );

        let set = pose_set(&[(&[0.0], &[0.0]), (&[1.0, 2.0], &[1.0])]);
        assert!(matches!(
            SolverState::solve(set.as_slice(), &settings, None),
            Err(RbfError::PropertyCountMismatch { pose_index: 1, .. })
        ));
    }

    #[test]
    fn progress_events_are_emitted() {
        let sink = CollectingSink::new();
        let set = pose_set(&[(&[0.0], &[0.0, 1.0]), (&[1.0], &[10.0, 2.0])]);
        SolverState::solve(set.as_slice(), &linear_custom(1.0), Some(&sink)).unwrap();

        let messages = sink.messages();
        assert_eq!(
            messages[0],
            ProgressMsg::PosesAssembled {
                num_poses: 2,
                driver_dims: 1,
                driven_dims: 2
            }
        );
        assert!(matches!(
            messages[2],
            ProgressMsg::ColumnSolved {
                column: 1,
                num_columns: 2,
                progress
            } if progress == 1.0
        ));
        assert!(matches!(messages.last(), Some(ProgressMsg::Message { .. })));
    }

    #[test]
    fn model_round_trips_through_json() {
        let set = pose_set(&[(&[0.0, 0.5], &[0.0]), (&[1.0, 0.0], &[10.0]), (&[0.2, 0.9], &[3.0])]);
        let settings = SolverSettings::builder(KernelType::InverseMultiQuadric)
            .radius_mode(RadiusMode::Variance)
            .allow_negative_weights(false)
            .build();
        let state = SolverState::solve(set.as_slice(), &settings, None).unwrap();

        let path = temp_path("round_trip");
        state.save_model(&path).unwrap();
        let loaded = SolverState::load_model(&path).unwrap();
        let _ = std::fs::remove_file(&path);

        assert_eq!(loaded, state);
        assert_eq!(loaded.evaluate(&[0.4, 0.4]), state.evaluate(&[0.4, 0.4]));
    }

    #[test]
    fn load_rejects_wrong_format_and_version() {
        let set = pose_set(&[(&[0.0], &[0.0]), (&[1.0], &[10.0])]);
        let state = SolverState::solve(set.as_slice(), &linear_custom(1.0), None).unwrap();

        let path = temp_path("envelope");
        state.save_model(&path).unwrap();
        let text = std::fs::read_to_string(&path).unwrap();

        std::fs::write(&path, text.replace("\"rbf_nodes.json\"", "\"other.json\"")).unwrap();
        assert!(matches!(
            SolverState::load_model(&path),
            Err(ModelIOError::FormatMismatch { .. })
        ));

        std::fs::write(&path, text.replace("\"version\": 1", "\"version\": 2")).unwrap();
        assert!(matches!(
            SolverState::load_model(&path),
            Err(ModelIOError::VersionMismatch { found: 2, .. })
        ));

        let _ = std::fs::remove_file(&path);
        assert!(matches!(
            SolverState::load_model(&path),
            Err(ModelIOError::Open { .. })
        ));
    }

    #[test]
    fn weight_rows_must_match_stored_poses() {
        let set = pose_set(&[(&[0.0], &[0.0]), (&[1.0], &[10.0])]);
        let state = SolverState::solve(set.as_slice(), &linear_custom(1.0), None).unwrap();

        let mut broken = state.clone();
        broken.weight_matrix = Matrix::zeros(1, 1);
        assert_eq!(broken.input_matrix_extended.nrows(), 3);
        assert!(broken.evaluate(&[0.5]).is_none());

        let text = serde_json::to_string(&broken).unwrap();
        assert!(serde_json::from_str::<SolverState>(&text).is_err());

        let text = serde_json::to_string(&state).unwrap();
        let restored: SolverState = serde_json::from_str(&text).unwrap();
        assert_eq!(restored, state);

        let path = temp_path("inconsistent");
        broken.save_model(&path).unwrap();
        let loaded = SolverState::load_model(&path);
        let _ = std::fs::remove_file(&path);
        assert!(matches!(
            loaded,
            Err(ModelIOError::Inconsistent {
                input_rows: 3,
                weight_rows: 1,
                ..
            })
        ));
    }
}
