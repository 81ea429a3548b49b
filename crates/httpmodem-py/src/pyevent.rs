use ::httpmodem::{Event, FieldId};
use pyo3::prelude::*;
use pyo3::types::{PyBytes, PyString, PyTuple};

/// Name under which an event is reported to Python. Header pairs use
/// `"on_header"`; the end of a body is `"on_body"` with `None`.
fn callback_name(event: &Event) -> &'static str {
    match event {
        Event::Header { .. } => "on_header",
        other => other.field().callback_name(),
    }
}

/// Converts an event into `(name, *payload)`, e.g. `("on_url", b"/")`,
/// `("on_header", b"Host", b"example.com")` or `("on_body", None)`.
pub fn event_to_tuple<'py>(py: Python<'py>, event: &Event) -> PyResult<Bound<'py, PyTuple>> {
    let mut items: Vec<Bound<'py, PyAny>> = vec![PyString::new(py, callback_name(event)).into_any()];
    match event {
        Event::Header { field, value } => {
            items.push(PyBytes::new(py, field).into_any());
            items.push(PyBytes::new(py, value).into_any());
        }
        Event::BodyEnd => items.push(py.None().into_bound(py)),
        other => {
            if let Some(data) = other.data() {
                items.push(PyBytes::new(py, data).into_any());
            }
        }
    }
    PyTuple::new(py, items)
}

/// Inverse of the names above, for registering consumers.
pub(crate) fn field_for(name: &str) -> Option<FieldId> {
    match name {
        "on_header" => Some(FieldId::HeaderField),
        _ => FieldId::from_callback_name(name),
    }
}
