use ::httpmodem::{
    Feed, FeedError, FieldSet, Method, ParserSession, ParserType, SessionOptions, Tokenizer,
};
use pyo3::exceptions::{PyMemoryError, PyTypeError, PyValueError};
use pyo3::prelude::*;
use pyo3::types::{PyDict, PyList};

use crate::pyevent::{event_to_tuple, field_for};
use crate::pyhandler::PyHandler;

/// A parser session bound to one connection, with the callbacks registered
/// when it was created.
///
/// Callback names are `on_message_begin`, `on_url`, `on_path`,
/// `on_query_string`, `on_fragment`, `on_header`, `on_header_field`,
/// `on_header_value`, `on_headers_complete`, `on_body` and
/// `on_message_complete`. Fields nobody registered for are never buffered.
#[pyclass(name = "Parser", module = "httpmodem")]
pub struct PyParser {
    session: ParserSession,
    callbacks: Py<PyDict>,
}

impl PyParser {
    fn new(kind: ParserType, callbacks: &Bound<'_, PyDict>) -> PyResult<Self> {
        let registered = PyDict::new(callbacks.py());
        let mut consumers = FieldSet::empty();
        for (name, callback) in callbacks.iter() {
            let name: String = name.extract()?;
            let field = field_for(&name)
                .ok_or_else(|| PyValueError::new_err(format!("unknown callback {name:?}")))?;
            if !callback.is_callable() {
                return Err(PyTypeError::new_err(format!("{name} is not callable")));
            }
            consumers.insert(field);
            registered.set_item(name, callback)?;
        }
        let options = SessionOptions {
            consumers,
            ..SessionOptions::default()
        };
        let session =
            ParserSession::new(kind, options).map_err(|err| PyValueError::new_err(err.to_string()))?;
        Ok(Self {
            session,
            callbacks: registered.unbind(),
        })
    }

    fn events<'py>(py: Python<'py>, feed: &Feed) -> PyResult<Bound<'py, PyList>> {
        let events = feed
            .events
            .iter()
            .map(|event| event_to_tuple(py, event))
            .collect::<PyResult<Vec<_>>>()?;
        PyList::new(py, events)
    }

    /// Runs `step` on the session, then replays its events into the
    /// callbacks with the parser no longer borrowed.
    fn replay(
        slf: &Bound<'_, Self>,
        step: impl FnOnce(&mut ParserSession) -> Result<Feed, FeedError>,
    ) -> PyResult<usize> {
        let py = slf.py();
        let (feed, callbacks) = {
            let mut this = slf.borrow_mut();
            let feed = step(&mut this.session).map_err(memory_error)?;
            (feed, this.callbacks.clone_ref(py))
        };
        let mut handler = PyHandler::new(callbacks.into_bound(py));
        feed.events.replay(&mut handler)?;
        Ok(feed.consumed)
    }
}

fn memory_error(err: FeedError) -> PyErr {
    PyMemoryError::new_err(err.to_string())
}

#[pymethods]
impl PyParser {
    #[staticmethod]
    pub fn request(callbacks: &Bound<'_, PyDict>) -> PyResult<Self> {
        Self::new(ParserType::Request, callbacks)
    }

    #[staticmethod]
    pub fn response(callbacks: &Bound<'_, PyDict>) -> PyResult<Self> {
        Self::new(ParserType::Response, callbacks)
    }

    /// Parses `data` and returns `(events, consumed)` without calling any
    /// callback. An empty `data` does nothing.
    pub fn feed<'py>(
        &mut self,
        py: Python<'py>,
        data: &[u8],
    ) -> PyResult<(Bound<'py, PyList>, usize)> {
        let feed = self.session.feed(data).map_err(memory_error)?;
        Ok((Self::events(py, &feed)?, feed.consumed))
    }

    /// Ends the stream and returns the final events without calling any
    /// callback.
    pub fn close<'py>(&mut self, py: Python<'py>) -> PyResult<Bound<'py, PyList>> {
        let feed = self.session.finish().map_err(memory_error)?;
        Self::events(py, &feed)
    }

    /// Parses `data`, then calls the registered callbacks in event order and
    /// returns the number of bytes consumed.
    ///
    /// The parser is not borrowed while callbacks run, so a callback may
    /// feed it again.
    pub fn execute(slf: &Bound<'_, Self>, data: &[u8]) -> PyResult<usize> {
        Self::replay(slf, |session| session.feed(data))
    }

    /// Ends the stream and calls the callbacks for whatever it completed:
    /// a body that ran until the connection closed, or the field that was
    /// cut off. A truncated message shows up in [`error`](Self::error).
    pub fn finish(slf: &Bound<'_, Self>) -> PyResult<()> {
        Self::replay(slf, ParserSession::finish).map(|_| ())
    }

    /// Description of the input error that stopped the parser, if any.
    pub fn error(&self) -> Option<String> {
        self.session
            .tokenizer()
            .error()
            .map(|error| error.to_string())
    }

    pub fn should_keep_alive(&self) -> bool {
        self.session.should_keep_alive()
    }

    pub fn is_upgrade(&self) -> bool {
        self.session.is_upgrade()
    }

    pub fn method(&self) -> Option<&'static str> {
        self.session.method().map(Method::as_str)
    }

    pub fn status_code(&self) -> u16 {
        self.session.status_code()
    }

    pub fn http_version(&self) -> (u8, u8) {
        self.session.http_version()
    }
}
