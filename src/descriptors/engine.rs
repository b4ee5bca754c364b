//! The embedded Python module that hands SMILES to RDKit.

use std::ffi::CString;

use log::debug;
use pyo3::ffi::c_str;
use pyo3::prelude::*;
use pyo3::sync::PyOnceLock;
use pyo3::types::PyModule;
use serde::Deserialize;

use super::DescriptorError;

static MODULE: PyOnceLock<Py<PyModule>> = PyOnceLock::new();
static NAMES: PyOnceLock<Vec<String>> = PyOnceLock::new();

fn load(py: Python<'_>) -> PyResult<Py<PyModule>> {
    let code =
        CString::new(include_str!("../../python/rdkit_descriptors.py"))?;
    let module = PyModule::from_code(
        py,
        code.as_c_str(),
        c_str!("rdkit_descriptors.py"),
        c_str!("rdkit_descriptors"),
    )?;
    debug!("loaded RDKit descriptor module");
    Ok(module.unbind())
}

fn module(py: Python<'_>) -> PyResult<&'static Py<PyModule>> {
    MODULE.get_or_try_init(py, || load(py))
}

fn function<'py>(py: Python<'py>, name: &str) -> PyResult<Bound<'py, PyAny>> {
    module(py)?.bind(py).getattr(name)
}

fn engine_error(e: impl ToString) -> DescriptorError {
    DescriptorError::Engine(e.to_string())
}

/// The names of every RDKit descriptor, in the order [describe] returns
/// their values.
pub(crate) fn names() -> Result<&'static [String], DescriptorError> {
    Python::attach(|py| {
        NAMES
            .get_or_try_init(py, || {
                let json: String = function(py, "descriptor_names")
                    .and_then(|f| f.call0()?.extract())
                    .map_err(engine_error)?;
                serde_json::from_str(&json).map_err(engine_error)
            })
            .map(Vec::as_slice)
    })
}

#[derive(Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
enum Reply {
    Ok { values: Vec<Option<f64>> },
    Unparseable,
    Hydrogens { atom: usize, count: u32 },
    Charge { atom: usize, charge: i64 },
}

/// Run every RDKit descriptor on `smiles`. Values RDKit cannot compute come
/// back as NaN.
pub(crate) fn describe(smiles: &str) -> Result<Vec<f64>, DescriptorError> {
    let json: String = Python::attach(|py| {
        function(py, "describe")?.call1((smiles,))?.extract()
    })
    .map_err(engine_error)?;
    match serde_json::from_str(&json).map_err(engine_error)? {
        Reply::Ok { values } => {
            Ok(values.into_iter().map(|v| v.unwrap_or(f64::NAN)).collect())
        }
        Reply::Unparseable => Err(DescriptorError::Unparseable),
        Reply::Hydrogens { atom, count } => {
            Err(DescriptorError::TooManyHydrogens { atom, count })
        }
        Reply::Charge { atom, charge } => {
            Err(DescriptorError::ChargeOutOfRange { atom, charge })
        }
    }
}
