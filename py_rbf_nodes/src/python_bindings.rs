/////////////////////////////////////////////////////////////////////////////////////////////
//
// Implements PyO3 bindings, settings wrappers, and NumPy conversion utilities for rbf_nodes.
//
// Created on: 19 Oct 2026     Author: Daniel Owen
//
// Copyright (c) 2026, Maptek Pty Ltd. All rights reserved. Licensed under the MIT License.
//
/////////////////////////////////////////////////////////////////////////////////////////////

use faer::Mat;
use numpy::{PyArray2, PyArrayMethods};
use pyo3::exceptions::{PyOSError, PyValueError};
use pyo3::prelude::*;
use rbf_nodes::{self, PoseProperty, progress};
use std::sync::Arc;

/// Convert a `faer::Mat<T>` to a NumPy array.
pub fn mat_to_numpy<'py, T>(mat: &Mat<T>, py: Python<'py>) -> Bound<'py, PyArray2<T>>
where
    T: numpy::Element + Copy,
{
    let (nrows, ncols) = mat.shape();

    let array = PyArray2::<T>::zeros(py, [nrows, ncols], false);
    let mut slice_mut = unsafe { array.as_array_mut() };

    for i in 0..nrows {
        for j in 0..ncols {
            slice_mut[[i, j]] = *mat.get(i, j);
        }
    }

    array
}

#[pyclass(eq, eq_int)]
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum KernelType {
    Linear,
    Gaussian1,
    Gaussian2,
    ThinPlate,
    MultiQuadric,
    InverseMultiQuadric,
}

impl From<KernelType> for rbf_nodes_utils::KernelType {
    fn from(v: KernelType) -> Self {
        match v {
            KernelType::Linear => rbf_nodes_utils::KernelType::Linear,
            KernelType::Gaussian1 => rbf_nodes_utils::KernelType::Gaussian1,
            KernelType::Gaussian2 => rbf_nodes_utils::KernelType::Gaussian2,
            KernelType::ThinPlate => rbf_nodes_utils::KernelType::ThinPlate,
            KernelType::MultiQuadric => rbf_nodes_utils::KernelType::MultiQuadric,
            KernelType::InverseMultiQuadric => rbf_nodes_utils::KernelType::InverseMultiQuadric,
        }
    }
}

impl From<rbf_nodes_utils::KernelType> for KernelType {
    fn from(v: rbf_nodes_utils::KernelType) -> Self {
        match v {
            rbf_nodes_utils::KernelType::Linear => KernelType::Linear,
            rbf_nodes_utils::KernelType::Gaussian1 => KernelType::Gaussian1,
            rbf_nodes_utils::KernelType::Gaussian2 => KernelType::Gaussian2,
            rbf_nodes_utils::KernelType::ThinPlate => KernelType::ThinPlate,
            rbf_nodes_utils::KernelType::MultiQuadric => KernelType::MultiQuadric,
            rbf_nodes_utils::KernelType::InverseMultiQuadric => KernelType::InverseMultiQuadric,
        }
    }
}

#[pyclass(eq, eq_int)]
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum RadiusMode {
    Mean,
    Variance,
    StandardDeviation,
    Custom,
}

impl From<RadiusMode> for rbf_nodes::RadiusMode {
    fn from(v: RadiusMode) -> Self {
        match v {
            RadiusMode::Mean => rbf_nodes::RadiusMode::Mean,
            RadiusMode::Variance => rbf_nodes::RadiusMode::Variance,
            RadiusMode::StandardDeviation => rbf_nodes::RadiusMode::StandardDeviation,
            RadiusMode::Custom => rbf_nodes::RadiusMode::Custom,
        }
    }
}

impl From<rbf_nodes::RadiusMode> for RadiusMode {
    fn from(v: rbf_nodes::RadiusMode) -> Self {
        match v {
            rbf_nodes::RadiusMode::Mean => RadiusMode::Mean,
            rbf_nodes::RadiusMode::Variance => RadiusMode::Variance,
            rbf_nodes::RadiusMode::StandardDeviation => RadiusMode::StandardDeviation,
            rbf_nodes::RadiusMode::Custom => RadiusMode::Custom,
        }
    }
}

#[pyclass]
#[derive(Debug, Clone, Copy)]
pub struct SolverSettings {
    inner: rbf_nodes::SolverSettings,
}

#[pymethods]
impl SolverSettings {
    #[new]
    #[pyo3(signature=(
        kernel_type = KernelType::Gaussian2,
        *,
        radius_mode = None,
        custom_radius = None,
        allow_negative_weights = true,
        storage_slots = None,
    ))]
    fn new(
        kernel_type: KernelType,
        radius_mode: Option<RadiusMode>,
        custom_radius: Option<f64>,
        allow_negative_weights: bool,
        storage_slots: Option<usize>,
    ) -> PyResult<Self> {
        let mut builder = rbf_nodes::SolverSettings::builder(kernel_type.into())
            .allow_negative_weights(allow_negative_weights);

        if let Some(radius) = custom_radius {
            builder = builder.custom_radius(radius);
        }
        // An explicit mode wins over the Custom mode implied by `custom_radius`.
        if let Some(mode) = radius_mode {
            builder = builder.radius_mode(mode.into());
        }
        if let Some(slots) = storage_slots {
            builder = builder.storage_slots(slots);
        }

        Ok(Self {
            inner: builder.build(),
        })
    }

    #[getter]
    fn kernel_type(&self) -> KernelType {
        self.inner.kernel_type.into()
    }

    #[getter]
    fn radius_mode(&self) -> RadiusMode {
        self.inner.radius_mode.into()
    }

    #[getter]
    fn custom_radius(&self) -> f64 {
        self.inner.custom_radius
    }

    #[getter]
    fn allow_negative_weights(&self) -> bool {
        self.inner.allow_negative_weights
    }

    #[getter]
    fn storage_slots(&self) -> Option<usize> {
        self.inner.storage_limits.map(|l| l.slot_count)
    }

    fn __repr__(&self) -> String {
        format!("{:?}", self.inner)
    }
}

#[pyclass]
pub struct PosesAssembled {
    #[pyo3(get)]
    pub num_poses: usize,
    #[pyo3(get)]
    pub driver_dims: usize,
    #[pyo3(get)]
    pub driven_dims: usize,
}

#[pyclass]
pub struct ColumnSolved {
    #[pyo3(get)]
    pub column: usize,
    #[pyo3(get)]
    pub num_columns: usize,
    #[pyo3(get)]
    pub progress: f64,
}

#[pyclass]
pub struct Message {
    #[pyo3(get)]
    pub message: String,
}

fn map_msg_to_py(py: Python<'_>, msg: progress::ProgressMsg) -> PyResult<Py<PyAny>> {
    let obj = match msg {
        progress::ProgressMsg::PosesAssembled {
            num_poses,
            driver_dims,
            driven_dims,
        } => Py::new(
            py,
            PosesAssembled {
                num_poses,
                driver_dims,
                driven_dims,
            },
        )?
        .into_any(),
        progress::ProgressMsg::ColumnSolved {
            column,
            num_columns,
            progress,
        } => Py::new(
            py,
            ColumnSolved {
                column,
                num_columns,
                progress,
            },
        )?
        .into_any(),
        progress::ProgressMsg::Message { message } => Py::new(py, Message { message })?.into_any(),
    };
    Ok(obj)
}

#[derive(Debug)]
struct PyProgressSink {
    callback: Option<Py<PyAny>>,
}

impl progress::ProgressSink for PyProgressSink {
    fn emit(&self, msg: progress::ProgressMsg) {
        if let Some(cb) = self.callback.as_ref() {
            Python::attach(|py| {
                let result = map_msg_to_py(py, msg).and_then(|obj| cb.call1(py, (obj,)));
                if let Err(e) = result {
                    e.print(py);
                }
            });
        }
    }
}

#[pyclass]
pub struct Progress {
    sink: Arc<dyn progress::ProgressSink>,
}

#[pymethods]
impl Progress {
    /// Create a synchronous progress sink.
    #[new]
    #[pyo3(signature=(callback=None))]
    fn new(callback: Option<Py<PyAny>>) -> PyResult<Self> {
        let sink: Arc<dyn progress::ProgressSink> = Arc::new(PyProgressSink { callback });
        Ok(Self { sink })
    }
}

impl Progress {
    pub fn __clone_sink__(&self) -> Arc<dyn progress::ProgressSink> {
        self.sink.clone()
    }
}

type PyPoseProperty = (String, f64, Option<f64>);

fn to_properties(values: Vec<PyPoseProperty>) -> Vec<PoseProperty> {
    values.into_iter().map(PoseProperty::from).collect()
}

fn rbf_error_to_py(err: rbf_nodes::RbfError) -> PyErr {
    PyValueError::new_err(err.to_string())
}

fn model_error_to_py(err: rbf_nodes::ModelIOError) -> PyErr {
    use rbf_nodes::ModelIOError::*;
    let io_to_py = |path: &std::path::PathBuf, e: &std::io::Error, action: &str| {
        let msg = format!("{} {}: {}", action, path.display(), e);
        if let Some(code) = e.raw_os_error() {
            PyOSError::new_err((code, msg))
        } else {
            PyOSError::new_err(msg)
        }
    };

    match err {
        Create { path, source } => io_to_py(&path, &source, "creating"),
        Open { path, source } => io_to_py(&path, &source, "opening"),
        Flush { path, source } => io_to_py(&path, &source, "flushing"),
        other => PyOSError::new_err(other.to_string()),
    }
}

#[pyclass]
pub struct RbfNode {
    inner: rbf_nodes::RbfNode,
}

#[pymethods]
impl RbfNode {
    #[new]
    #[pyo3(signature = (name, settings = None, *, progress_callback = None))]
    fn new(
        py: Python<'_>,
        name: String,
        settings: Option<SolverSettings>,
        progress_callback: Option<Py<Progress>>,
    ) -> PyResult<Self> {
        let settings = settings.map(|s| s.inner).unwrap_or_default();
        let builder = rbf_nodes::RbfNode::builder(name, settings);

        let builder = match progress_callback {
            Some(progress) => builder.progress_callback(progress.borrow(py).__clone_sink__()),
            None => builder,
        };

        Ok(Self {
            inner: builder.build(),
        })
    }

    #[getter]
    fn name(&self) -> &str {
        self.inner.name()
    }

    #[getter]
    fn settings(&self) -> SolverSettings {
        SolverSettings {
            inner: *self.inner.settings(),
        }
    }

    #[setter]
    fn set_settings(&mut self, settings: SolverSettings) {
        self.inner.set_settings(settings.inner);
    }

    /// Adds a pose from `(identifier, value, original)` tuples and returns its index.
    #[pyo3(signature = (drivers, driven))]
    fn add_pose(&mut self, drivers: Vec<PyPoseProperty>, driven: Vec<PyPoseProperty>) -> usize {
        self.inner
            .add_pose(to_properties(drivers), to_properties(driven))
    }

    /// Removes the pose with `index`. Returns `False` if there was none.
    fn remove_pose(&mut self, index: usize) -> bool {
        self.inner.remove_pose(index).is_some()
    }

    /// Indices of the current poses.
    fn pose_indices(&self) -> Vec<usize> {
        self.inner.poses().iter().map(|p| p.index).collect()
    }

    /// Solves the poses. Raises `ValueError` and deactivates the node on failure.
    fn activate(&mut self, py: Python<'_>) -> PyResult<()> {
        let inner = &mut self.inner;
        py.detach(|| inner.activate()).map_err(rbf_error_to_py)
    }

    fn reset(&mut self) {
        self.inner.reset();
    }

    #[getter]
    fn is_active(&self) -> bool {
        self.inner.is_active()
    }

    /// Interpolated driven values, or `None` when the node cannot evaluate.
    fn evaluate(&self, live_driver_values: Vec<f64>) -> Option<Vec<f64>> {
        self.inner.evaluate(&live_driver_values)
    }

    /// Solved weights (poses x driven values), or `None` before activation.
    fn weight_matrix<'py>(&self, py: Python<'py>) -> Option<Bound<'py, PyArray2<f64>>> {
        self.inner
            .state()
            .map(|state| mat_to_numpy(state.weight_matrix.as_mat(), py))
    }

    /// Normalized driver matrix with the trailing row of normalization factors.
    fn input_matrix<'py>(&self, py: Python<'py>) -> Option<Bound<'py, PyArray2<f64>>> {
        self.inner
            .state()
            .map(|state| mat_to_numpy(state.input_matrix_extended.as_mat(), py))
    }

    /// Kernel radius the model evaluates with.
    #[getter]
    fn radius(&self) -> Option<f64> {
        self.inner.state().map(|state| state.radius())
    }

    #[getter]
    fn mean_distance(&self) -> Option<f64> {
        self.inner.state().map(|state| state.mean_distance)
    }

    #[getter]
    fn variance_distance(&self) -> Option<f64> {
        self.inner.state().map(|state| state.variance_distance)
    }

    /// Weight matrix in fixed-size storage slots, zero padded.
    fn weight_storage_slots(&self) -> Option<Vec<Vec<f64>>> {
        self.inner.state().map(|state| {
            state
                .weight_matrix
                .to_storage_slots()
                .into_iter()
                .map(|slot| slot.to_vec())
                .collect()
        })
    }

    /// Saves the solved model. Raises `OSError` when there is none.
    fn save_model(&self, path: &str) -> PyResult<()> {
        self.inner.save_model(path).map_err(model_error_to_py)
    }

    /// Loads a saved model and activates the node.
    fn load_model(&mut self, path: &str) -> PyResult<()> {
        self.inner.load_model(path).map_err(model_error_to_py)
    }

    fn __len__(&self) -> usize {
        self.inner.poses().len()
    }
}
