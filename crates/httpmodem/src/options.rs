use crate::field::FieldSet;

/// Configuration for a [`ParserSession`](crate::ParserSession).
///
/// # Examples
///
/// ```rust
/// use httpmodem::{FieldId, FieldSet, ParserSession, SessionOptions};
///
/// let options = SessionOptions {
///     consumers: FieldSet::empty()
///         .with(FieldId::Path)
///         .with(FieldId::HeaderField)
///         .with(FieldId::MessageComplete),
///     max_field_len: Some(8 * 1024),
/// };
/// let session = ParserSession::request(options).unwrap();
/// assert!(session.consumers().contains(FieldId::Path));
/// ```
///
/// # Default
///
/// Every field is consumed with the request target reported as one `Url`, and
/// buffered fields are unbounded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionOptions {
    /// Fields a consumer is registered for.
    ///
    /// Fixed for the lifetime of the session. Fragments of fields outside the
    /// set are dropped on arrival and never allocate. Registering `Url` with
    /// any of `Path`, `QueryString` or `Fragment` is rejected.
    ///
    /// # Default
    ///
    /// [`FieldSet::combined_url`]
    pub consumers: FieldSet,

    /// Upper bound, in bytes, for any single buffered field (url parts,
    /// header names, header values). Body fragments are never buffered and
    /// are not limited.
    ///
    /// Exceeding it aborts the feed with
    /// [`ResourceError::FieldTooLarge`](crate::ResourceError::FieldTooLarge).
    ///
    /// # Default
    ///
    /// `None`
    pub max_field_len: Option<usize>,
}

impl Default for SessionOptions {
    fn default() -> Self {
        Self {
            consumers: FieldSet::combined_url(),
            max_field_len: None,
        }
    }
}
