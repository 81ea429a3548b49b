use thiserror::Error;

use crate::field::FieldId;

/// Failure of a single [`feed`](crate::ParserSession::feed) call that is not
/// caused by the input bytes.
///
/// Malformed input is reported by the tokenizer itself through
/// [`Feed::error`](crate::Feed::error); this type only covers conditions under
/// which the partial event queue cannot be trusted and is discarded.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FeedError {
    #[error("resource exhausted: {0}")]
    Resource(#[from] ResourceError),
}

/// Buffer or queue growth failed.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ResourceError {
    #[error("could not grow the {field} buffer")]
    Allocation { field: FieldId },
    #[error("{field} exceeds the {limit} byte limit")]
    FieldTooLarge { field: FieldId, limit: usize },
    #[error("could not grow the event queue")]
    QueueAllocation,
}

/// Rejected session configuration.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigError {
    #[error("`on_url` cannot be combined with `on_path`, `on_query_string` or `on_fragment`")]
    ConflictingUrlModes,
}

/// Malformed input, as reported by the tokenizer.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenizerError {
    #[error("invalid method")]
    InvalidMethod,
    #[error("invalid character in url: {0:#04x}")]
    InvalidUrl(u8),
    #[error("invalid HTTP version")]
    InvalidVersion,
    #[error("invalid status code")]
    InvalidStatus,
    #[error("invalid character in header name: {0:#04x}")]
    InvalidHeaderToken(u8),
    #[error("invalid character in header value: {0:#04x}")]
    InvalidHeaderValue(u8),
    #[error("invalid Content-Length")]
    InvalidContentLength,
    #[error("invalid chunk size")]
    InvalidChunkSize,
    #[error("expected line feed")]
    LfExpected,
    #[error("unexpected end of input")]
    UnexpectedEof,
    #[error("{0} callback aborted the parse")]
    CallbackFailed(FieldId),
}
