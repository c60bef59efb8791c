// FFI Facade: The main entry point for Python.
// This file uses `pyo3` to define the `_core` Python
// module and expose the partition core as plain functions.

use pyo3::prelude::*;

pub mod analysis;
pub mod bindings;
pub mod compute;
pub mod config;
pub mod display;
pub mod flow;
pub mod store;

pub use compute::{PartitionError, PartitionReport, PartitionRequest, Partitioner, ResultTable};
pub use config::{PartitionConfig, TimeSelection};
pub use store::{Network, Pass};

/// Version string checked by the Python wrapper on import.
#[pyfunction]
fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

// --- Module Definition ---
/// This function defines the `_core` Python module.
/// The name `_core` is chosen to indicate it's an internal, compiled component.
#[pymodule]
fn _core(m: &Bound<'_, PyModule>) -> PyResult<()> {
    m.add_function(wrap_pyfunction!(core_version, m)?)?;
    m.add_function(wrap_pyfunction!(bindings::python::partition, m)?)?;
    m.add_function(wrap_pyfunction!(bindings::python::partition_config, m)?)?;
    m.add_function(wrap_pyfunction!(bindings::python::target_baseline, m)?)?;
    m.add_function(wrap_pyfunction!(bindings::python::conservation_residuals, m)?)?;
    m.add_function(wrap_pyfunction!(bindings::python::flow_edges, m)?)?;
    m.add_function(wrap_pyfunction!(bindings::python::total_currents, m)?)?;
    m.add_function(wrap_pyfunction!(bindings::python::trace_order, m)?)?;
    Ok(())
}
