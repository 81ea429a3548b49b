//! Per-connection state and the feed driver.
//!
//! A [`ParserSession`] lives as long as the byte stream it parses. Each call to
//! [`ParserSession::feed`] runs the tokenizer exactly once over the supplied
//! bytes; the tokenizer's callbacks land in a [`Sink`] that applies the flush
//! policy to the session's buffers and appends finalized events to a queue
//! owned by that call. Partially received fields stay buffered in the session,
//! so a value split across two feeds is still reported once, whole.

use bstr::BString;

use crate::{
    buffer::FieldBuffer,
    error::{ConfigError, FeedError, ResourceError, TokenizerError},
    event::{Event, EventQueue},
    field::{FieldId, FieldSet, UrlMode},
    options::SessionOptions,
    policy::{self, Flush, Pending},
    tokenizer::{Callbacks, Http1Tokenizer, Method, ParserType, Tokenizer},
};

/// Result of one [`ParserSession::feed`] call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Feed {
    /// Bytes the tokenizer consumed. Less than the input length when the
    /// input was malformed or the connection was upgraded.
    pub consumed: usize,
    /// Every event finalized during the call, in order. When `error` is set
    /// these are still valid partial results.
    pub events: EventQueue,
    /// The tokenizer's own error, passed through as-is.
    pub error: Option<TokenizerError>,
    /// Length of the input this call was given; `0` for
    /// [`ParserSession::finish`].
    pub input_len: usize,
}

impl Feed {
    /// `true` when the whole input was consumed without error.
    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.error.is_none() && self.consumed == self.input_len
    }
}

#[derive(Debug)]
struct FieldBuffers {
    url: FieldBuffer,
    path: FieldBuffer,
    query_string: FieldBuffer,
    fragment: FieldBuffer,
    header_field: FieldBuffer,
    header_value: FieldBuffer,
}

impl FieldBuffers {
    fn new(limit: Option<usize>) -> Self {
        Self {
            url: FieldBuffer::new(FieldId::Url, limit),
            path: FieldBuffer::new(FieldId::Path, limit),
            query_string: FieldBuffer::new(FieldId::QueryString, limit),
            fragment: FieldBuffer::new(FieldId::Fragment, limit),
            header_field: FieldBuffer::new(FieldId::HeaderField, limit),
            header_value: FieldBuffer::new(FieldId::HeaderValue, limit),
        }
    }

    fn get(&self, field: FieldId) -> Option<&FieldBuffer> {
        match field {
            FieldId::Url => Some(&self.url),
            FieldId::Path => Some(&self.path),
            FieldId::QueryString => Some(&self.query_string),
            FieldId::Fragment => Some(&self.fragment),
            FieldId::HeaderField => Some(&self.header_field),
            FieldId::HeaderValue => Some(&self.header_value),
            _ => None,
        }
    }

    fn get_mut(&mut self, field: FieldId) -> Option<&mut FieldBuffer> {
        match field {
            FieldId::Url => Some(&mut self.url),
            FieldId::Path => Some(&mut self.path),
            FieldId::QueryString => Some(&mut self.query_string),
            FieldId::Fragment => Some(&mut self.fragment),
            FieldId::HeaderField => Some(&mut self.header_field),
            FieldId::HeaderValue => Some(&mut self.header_value),
            _ => None,
        }
    }

    fn clear(&mut self) {
        for buffer in [
            &mut self.url,
            &mut self.path,
            &mut self.query_string,
            &mut self.fragment,
            &mut self.header_field,
            &mut self.header_value,
        ] {
            buffer.clear();
        }
    }
}

/// Everything that must survive between feed calls.
#[derive(Debug)]
struct SessionState {
    consumers: FieldSet,
    buffers: FieldBuffers,
    pending: Pending,
    in_message: bool,
    /// At least one body event was emitted for the current message.
    body_seen: bool,
}

impl SessionState {
    fn new(options: &SessionOptions) -> Self {
        Self {
            consumers: options.consumers,
            buffers: FieldBuffers::new(options.max_field_len),
            pending: Pending::Idle,
            in_message: false,
            body_seen: false,
        }
    }

    fn flush(&mut self, flush: Flush, events: &mut EventQueue) -> Result<(), ResourceError> {
        match flush {
            Flush::Nothing => Ok(()),
            Flush::Url(field) => {
                let value = self
                    .buffers
                    .get_mut(field)
                    .map(FieldBuffer::flush)
                    .unwrap_or_default();
                events.push(Event::from_url_part(field, value))
            }
            Flush::HeaderPair => {
                let field = self.buffers.header_field.flush();
                let value = self.buffers.header_value.flush();
                events.push(Event::Header { field, value })
            }
        }
    }

    fn flush_pending(&mut self, events: &mut EventQueue) -> Result<(), ResourceError> {
        let decision = policy::on_boundary(self.pending);
        self.pending = decision.next;
        self.flush(decision.flush, events)
    }

    fn emit_signal(&self, field: FieldId, event: Event, events: &mut EventQueue) -> Result<(), ResourceError> {
        if self.consumers.contains(field) {
            events.push(event)
        } else {
            Ok(())
        }
    }

    fn on_data(
        &mut self,
        field: FieldId,
        data: &[u8],
        events: &mut EventQueue,
    ) -> Result<(), ResourceError> {
        if !self.consumers.wants(field) {
            return Ok(());
        }
        let decision = policy::on_data(self.pending, field);
        self.pending = decision.next;
        self.flush(decision.flush, events)?;

        if field == FieldId::Body {
            self.body_seen = true;
            return events.push(Event::Body(BString::from(data)));
        }
        match self.buffers.get_mut(field) {
            Some(buffer) => buffer.append(data),
            None => Ok(()),
        }
    }

    fn on_signal(&mut self, field: FieldId, events: &mut EventQueue) -> Result<(), ResourceError> {
        match field {
            FieldId::MessageBegin => {
                if self.in_message {
                    tracing::warn!(
                        pending = ?self.pending,
                        "message began before the previous one completed"
                    );
                }
                self.flush_pending(events)?;
                self.buffers.clear();
                self.body_seen = false;
                self.in_message = true;
                self.emit_signal(field, Event::MessageBegin, events)
            }
            FieldId::HeadersComplete => {
                self.flush_pending(events)?;
                self.emit_signal(field, Event::HeadersComplete, events)
            }
            FieldId::MessageComplete => {
                self.flush_pending(events)?;
                if core::mem::take(&mut self.body_seen) {
                    events.push(Event::BodyEnd)?;
                }
                self.in_message = false;
                self.emit_signal(field, Event::MessageComplete, events)
            }
            _ => Ok(()),
        }
    }

    /// Forgets everything about the current message.
    fn abort(&mut self) {
        self.buffers.clear();
        self.pending = Pending::Idle;
        self.body_seen = false;
        self.in_message = false;
    }
}

/// Callback adapter bound to one feed call.
struct Sink<'s> {
    state: &'s mut SessionState,
    events: EventQueue,
    failure: Option<ResourceError>,
}

impl Sink<'_> {
    fn flush_pending(&mut self) {
        if self.failure.is_none() {
            let result = self.state.flush_pending(&mut self.events);
            let _ = self.record(result);
        }
    }

    fn record(&mut self, result: Result<(), ResourceError>) -> Result<(), ResourceError> {
        if let Err(error) = &result {
            self.failure = Some(error.clone());
        }
        result
    }
}

impl Callbacks for Sink<'_> {
    type Error = ResourceError;

    fn on_signal(&mut self, field: FieldId) -> Result<(), ResourceError> {
        let result = self.state.on_signal(field, &mut self.events);
        self.record(result)
    }

    fn on_data(&mut self, field: FieldId, data: &[u8]) -> Result<(), ResourceError> {
        let result = self.state.on_data(field, data, &mut self.events);
        self.record(result)
    }
}

/// A long-lived parser bound to one connection's byte stream.
///
/// Sessions are single-writer: feed calls must not overlap, which `&mut self`
/// already guarantees within Rust.
///
/// ```
/// use httpmodem::{Event, ParserSession, SessionOptions};
///
/// let mut session = ParserSession::request(SessionOptions::default()).unwrap();
/// let first = session.feed(b"GET / HTTP/1.1\r\nHost: exa").unwrap();
/// assert_eq!(first.events.as_slice(), &[Event::MessageBegin, Event::Url("/".into())]);
///
/// let second = session.feed(b"mple.com\r\n\r\n").unwrap();
/// assert_eq!(
///     second.events.as_slice(),
///     &[
///         Event::Header {
///             field: "Host".into(),
///             value: "example.com".into(),
///         },
///         Event::HeadersComplete,
///         Event::MessageComplete,
///     ]
/// );
/// ```
#[derive(Debug)]
pub struct ParserSession<T: Tokenizer = Http1Tokenizer> {
    tokenizer: T,
    state: SessionState,
    url_mode: UrlMode,
}

impl ParserSession<Http1Tokenizer> {
    /// # Errors
    ///
    /// [`ConfigError::ConflictingUrlModes`] when the consumers mix `Url` with
    /// the split url parts.
    pub fn new(kind: ParserType, options: SessionOptions) -> Result<Self, ConfigError> {
        let url_mode = options.consumers.url_mode()?;
        Self::with_tokenizer(Http1Tokenizer::new(kind, url_mode), options)
    }

    /// # Errors
    ///
    /// See [`ParserSession::new`].
    pub fn request(options: SessionOptions) -> Result<Self, ConfigError> {
        Self::new(ParserType::Request, options)
    }

    /// # Errors
    ///
    /// See [`ParserSession::new`].
    pub fn response(options: SessionOptions) -> Result<Self, ConfigError> {
        Self::new(ParserType::Response, options)
    }
}

impl<T: Tokenizer> ParserSession<T> {
    /// Wraps an already configured tokenizer. The tokenizer must report the
    /// request target in the mode the consumers imply.
    ///
    /// # Errors
    ///
    /// See [`ParserSession::new`].
    pub fn with_tokenizer(tokenizer: T, options: SessionOptions) -> Result<Self, ConfigError> {
        Ok(Self {
            url_mode: options.consumers.url_mode()?,
            tokenizer,
            state: SessionState::new(&options),
        })
    }

    /// Runs the tokenizer once over `bytes` and returns the events it
    /// finalized.
    ///
    /// Fields still open when `bytes` runs out stay buffered and are reported
    /// by a later call. An empty `bytes` is a no-op; use
    /// [`ParserSession::finish`] when the stream ends.
    ///
    /// # Errors
    ///
    /// [`FeedError::Resource`] when a buffer or the queue cannot grow. The
    /// partial events of this call are discarded and the tokenizer refuses
    /// further input. Malformed input is not an error here: see
    /// [`Feed::error`].
    pub fn feed(&mut self, bytes: &[u8]) -> Result<Feed, FeedError> {
        if bytes.is_empty() {
            return Ok(Feed {
                consumed: 0,
                events: EventQueue::new(),
                error: self.tokenizer.error(),
                input_len: 0,
            });
        }
        self.drive(bytes.len(), |tokenizer, sink| tokenizer.execute(sink, bytes))
    }

    /// Tells the tokenizer the stream has ended.
    ///
    /// A response body delimited by the connection closing completes here.
    /// When the stream stopped inside a message, the field that was still
    /// being received is reported as it stands and [`Feed::error`] is
    /// [`TokenizerError::UnexpectedEof`].
    ///
    /// ```
    /// use httpmodem::{Event, ParserSession, SessionOptions, TokenizerError};
    ///
    /// let mut session = ParserSession::request(SessionOptions::default()).unwrap();
    /// session.feed(b"GET /abc").unwrap();
    /// let end = session.finish().unwrap();
    /// assert_eq!(end.events.as_slice(), &[Event::Url("/abc".into())]);
    /// assert_eq!(end.error, Some(TokenizerError::UnexpectedEof));
    /// ```
    ///
    /// # Errors
    ///
    /// See [`ParserSession::feed`].
    pub fn finish(&mut self) -> Result<Feed, FeedError> {
        self.drive(0, |tokenizer, sink| {
            tokenizer.finish(sink);
            sink.flush_pending();
            0
        })
    }

    fn drive(
        &mut self,
        input_len: usize,
        run: impl FnOnce(&mut T, &mut Sink<'_>) -> usize,
    ) -> Result<Feed, FeedError> {
        let mut sink = Sink {
            state: &mut self.state,
            events: EventQueue::new(),
            failure: None,
        };
        let consumed = run(&mut self.tokenizer, &mut sink);
        let Sink {
            events, failure, ..
        } = sink;

        if let Some(error) = failure {
            tracing::warn!(%error, consumed, "feed aborted, discarding partial events");
            self.state.abort();
            return Err(error.into());
        }

        let error = self.tokenizer.error();
        if let Some(error) = error {
            tracing::debug!(%error, consumed, input_len, "tokenizer reported an error");
        }
        tracing::trace!(consumed, events = events.len(), "feed");
        Ok(Feed {
            consumed,
            events,
            error,
            input_len,
        })
    }

    #[must_use]
    pub fn should_keep_alive(&self) -> bool {
        self.tokenizer.should_keep_alive()
    }

    #[must_use]
    pub fn is_upgrade(&self) -> bool {
        self.tokenizer.is_upgrade()
    }

    #[must_use]
    pub fn method(&self) -> Option<Method> {
        self.tokenizer.method()
    }

    #[must_use]
    pub fn status_code(&self) -> u16 {
        self.tokenizer.status_code()
    }

    #[must_use]
    pub fn http_version(&self) -> (u8, u8) {
        self.tokenizer.http_version()
    }

    #[must_use]
    pub fn consumers(&self) -> FieldSet {
        self.state.consumers
    }

    #[must_use]
    pub fn url_mode(&self) -> UrlMode {
        self.url_mode
    }

    /// Between `MessageBegin` and `MessageComplete`.
    #[must_use]
    pub fn in_message(&self) -> bool {
        self.state.in_message
    }

    /// A header name has been buffered but none of its value yet.
    #[must_use]
    pub fn pending_header_field(&self) -> bool {
        self.state.pending == Pending::HeaderField
    }

    /// Bytes currently buffered for `field`. Always `0` for fields that are
    /// never buffered.
    #[must_use]
    pub fn pending_bytes(&self, field: FieldId) -> usize {
        self.state.buffers.get(field).map_or(0, FieldBuffer::len)
    }

    #[must_use]
    pub fn tokenizer(&self) -> &T {
        &self.tokenizer
    }

    #[cfg(test)]
    pub(crate) fn buffer_capacity(&self, field: FieldId) -> usize {
        self.state.buffers.get(field).map_or(0, FieldBuffer::capacity)
    }

    #[cfg(test)]
    pub(crate) fn pending_fragments(&self, field: FieldId) -> usize {
        self.state
            .buffers
            .get(field)
            .map_or(0, FieldBuffer::fragments)
    }
}
