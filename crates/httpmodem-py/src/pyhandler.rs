use ::httpmodem::{BStr, Handler};
use pyo3::prelude::*;
use pyo3::types::{PyBytes, PyDict};

/// Replays events into the Python callables registered by name.
///
/// Callbacks run after the tokenizer has returned, so they may re-enter the
/// parser or raise; an exception stops the replay and propagates.
pub struct PyHandler<'py> {
    callbacks: Bound<'py, PyDict>,
}

impl<'py> PyHandler<'py> {
    pub fn new(callbacks: Bound<'py, PyDict>) -> Self {
        Self { callbacks }
    }

    fn callback(&self, name: &str) -> PyResult<Option<Bound<'py, PyAny>>> {
        self.callbacks.get_item(name)
    }

    fn signal(&self, name: &str) -> PyResult<()> {
        if let Some(callback) = self.callback(name)? {
            callback.call0()?;
        }
        Ok(())
    }

    fn data(&self, name: &str, data: &BStr) -> PyResult<()> {
        if let Some(callback) = self.callback(name)? {
            callback.call1((PyBytes::new(callback.py(), data),))?;
        }
        Ok(())
    }
}

impl Handler for PyHandler<'_> {
    type Error = PyErr;

    fn on_message_begin(&mut self) -> PyResult<()> {
        self.signal("on_message_begin")
    }

    fn on_url(&mut self, url: &BStr) -> PyResult<()> {
        self.data("on_url", url)
    }

    fn on_path(&mut self, path: &BStr) -> PyResult<()> {
        self.data("on_path", path)
    }

    fn on_query_string(&mut self, query: &BStr) -> PyResult<()> {
        self.data("on_query_string", query)
    }

    fn on_fragment(&mut self, fragment: &BStr) -> PyResult<()> {
        self.data("on_fragment", fragment)
    }

    /// `on_header(field, value)` gets the pair; `on_header_field` and
    /// `on_header_value` get their half, in that order.
    fn on_header(&mut self, field: &BStr, value: &BStr) -> PyResult<()> {
        if let Some(callback) = self.callback("on_header")? {
            let py = callback.py();
            callback.call1((PyBytes::new(py, field), PyBytes::new(py, value)))?;
        }
        self.data("on_header_field", field)?;
        self.data("on_header_value", value)
    }

    fn on_headers_complete(&mut self) -> PyResult<()> {
        self.signal("on_headers_complete")
    }

    fn on_body(&mut self, chunk: Option<&BStr>) -> PyResult<()> {
        match chunk {
            Some(chunk) => self.data("on_body", chunk),
            None => {
                if let Some(callback) = self.callback("on_body")? {
                    callback.call1((callback.py().None(),))?;
                }
                Ok(())
            }
        }
    }

    fn on_message_complete(&mut self) -> PyResult<()> {
        self.signal("on_message_complete")
    }
}
