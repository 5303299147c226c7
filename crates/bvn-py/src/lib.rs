//! PyO3 bindings for the `bvn` rounding engine.
//!
//! Notes
//! - Keep bindings thin and predictable; the heavy lifting lives in the
//!   `bvn` crate. Python gets a single function taking and returning plain
//!   `list[float]` rather than trying to round-trip a mutable buffer view,
//!   since that is the natural shape for a PyO3 boundary (see DESIGN.md for
//!   why this departs from the in-place buffer contract at the Rust level).

use bvn::EngineError;
use pyo3::exceptions::{PyRuntimeError, PyValueError};
use pyo3::prelude::*;

fn to_py_err(err: EngineError) -> PyErr {
    match err {
        EngineError::InvalidShape { .. } | EngineError::InvalidSubset { .. } => {
            PyValueError::new_err(err.to_string())
        }
        EngineError::NotTerminating { .. } => PyRuntimeError::new_err(err.to_string()),
    }
}

/// Round a fractional paper-major assignment matrix into an integral one.
///
/// `flows` has length `npaps * nrevs`; `subsets[r]` is reviewer `r`'s
/// institution label (strictly positive). Returns a new list of the same
/// length holding only `0.0`/`1.0` entries.
#[pyfunction]
fn run_bvn(flows: Vec<f64>, subsets: Vec<i64>, npaps: usize, nrevs: usize) -> PyResult<Vec<f64>> {
    let mut flows = flows;
    bvn::run_bvn(&mut flows, &subsets, npaps, nrevs).map_err(to_py_err)?;
    Ok(flows)
}

#[pymodule]
fn bvn_native(_py: Python, m: &PyModule) -> PyResult<()> {
    m.add_function(wrap_pyfunction!(run_bvn, m)?)?;
    Ok(())
}
