mod pyevent;
mod pyhandler;
mod pyparser;

pub use pyevent::event_to_tuple;
pub use pyhandler::PyHandler;
pub use pyparser::PyParser;

use pyo3::prelude::*;

/// Creates a request parser; see [`PyParser::request`].
#[pyfunction]
fn request(callbacks: &Bound<'_, pyo3::types::PyDict>) -> PyResult<PyParser> {
    PyParser::request(callbacks)
}

/// Creates a response parser; see [`PyParser::response`].
#[pyfunction]
fn response(callbacks: &Bound<'_, pyo3::types::PyDict>) -> PyResult<PyParser> {
    PyParser::response(callbacks)
}

#[pymodule]
pub fn httpmodem(m: &Bound<'_, PyModule>) -> PyResult<()> {
    m.add_class::<PyParser>()?;
    m.add_function(wrap_pyfunction!(request, m)?)?;
    m.add_function(wrap_pyfunction!(response, m)?)?;
    Ok(())
}
