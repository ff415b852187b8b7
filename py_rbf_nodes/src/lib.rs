/////////////////////////////////////////////////////////////////////////////////////////////
//
// Defines the Python extension module and submodules for the rbf_nodes pose solver API.
//
// Created on: 19 Oct 2026     Author: Daniel Owen
//
// Copyright (c) 2026, Maptek Pty Ltd. All rights reserved. Licensed under the MIT License.
//
/////////////////////////////////////////////////////////////////////////////////////////////

use pyo3::prelude::*;

mod python_bindings;

#[pymodule]
#[pyo3(name = "rbf_nodes")]
pub fn py_rbf_nodes(m: &Bound<'_, PyModule>) -> PyResult<()> {
    faer::set_global_parallelism(faer::Par::Seq);

    let prog = PyModule::new(m.py(), "progress")?;
    prog.add_class::<python_bindings::PosesAssembled>()?;
    prog.add_class::<python_bindings::ColumnSolved>()?;
    prog.add_class::<python_bindings::Message>()?;
    prog.add_class::<python_bindings::Progress>()?;

    m.add_submodule(&prog)?;
    m.py().import("sys")?.getattr("modules")?.set_item("rbf_nodes.progress", prog)?;

    m.add_class::<python_bindings::KernelType>()?;
    m.add_class::<python_bindings::RadiusMode>()?;
    m.add_class::<python_bindings::SolverSettings>()?;
    m.add_class::<python_bindings::RbfNode>()?;

    Ok(())
}
