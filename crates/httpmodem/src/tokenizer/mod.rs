//! The seam between the event layer and a byte-level HTTP recognizer.
//!
//! A [`Tokenizer`] pushes fragments into a [`Callbacks`] implementation while
//! it runs. It may split one logical field into any number of fragments, both
//! within one `execute` call and across calls, and it cannot be suspended
//! from inside a callback. [`Http1Tokenizer`] is the bundled implementation.

mod http1;
mod method;

pub use http1::Http1Tokenizer;
pub use method::Method;

use crate::{error::TokenizerError, field::FieldId};

/// Which side of the exchange a session parses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ParserType {
    #[default]
    Request,
    Response,
}

/// Per-field callback table handed to [`Tokenizer::execute`].
///
/// Returning `Err` aborts the running `execute` call; the tokenizer records
/// [`TokenizerError::CallbackFailed`] and refuses further input.
pub trait Callbacks {
    type Error;

    /// `MessageBegin`, `HeadersComplete` or `MessageComplete`.
    fn on_signal(&mut self, field: FieldId) -> Result<(), Self::Error>;

    /// One fragment of a data field. `data` may be empty for a header value
    /// that has no bytes.
    fn on_data(&mut self, field: FieldId, data: &[u8]) -> Result<(), Self::Error>;
}

/// An incremental HTTP/1.x recognizer.
pub trait Tokenizer {
    /// Recognizes as much of `input` as possible and returns the number of
    /// bytes consumed. An empty `input` changes nothing.
    ///
    /// Consuming fewer bytes than supplied means the input was malformed (see
    /// [`Tokenizer::error`]) or the connection switched protocols (see
    /// [`Tokenizer::is_upgrade`]).
    fn execute<C: Callbacks>(&mut self, callbacks: &mut C, input: &[u8]) -> usize;

    /// The peer closed the stream. Completes a body that runs until the
    /// connection closes; records [`TokenizerError::UnexpectedEof`] when the
    /// stream stopped inside any other part of a message.
    fn finish<C: Callbacks>(&mut self, callbacks: &mut C);

    fn error(&self) -> Option<TokenizerError>;

    fn should_keep_alive(&self) -> bool;

    fn is_upgrade(&self) -> bool;

    /// Request method of the current message; `None` for responses or before
    /// the request line has been read.
    fn method(&self) -> Option<Method>;

    /// Status code of the current response; `0` for requests.
    fn status_code(&self) -> u16;

    /// `(major, minor)` of the current message.
    fn http_version(&self) -> (u8, u8);
}
