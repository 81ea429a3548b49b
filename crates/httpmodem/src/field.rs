//! Field identifiers and the capability set of registered consumers.
//!
//! Every piece of HTTP structure the tokenizer reports is named by a
//! [`FieldId`]. Fields are partitioned into [`FieldGroup`]s; the flush policy
//! only ever coalesces fragments within a group.
//!
//! ```
//! use httpmodem::{FieldId, FieldSet, UrlMode};
//!
//! let consumers = FieldSet::empty()
//!     .with(FieldId::Path)
//!     .with(FieldId::HeaderField)
//!     .with(FieldId::Body);
//! assert!(consumers.contains(FieldId::Path));
//! assert!(!consumers.contains(FieldId::Fragment));
//! assert!(consumers.wants_headers());
//! assert_eq!(consumers.url_mode(), Ok(UrlMode::Split));
//! ```

use core::fmt;

use crate::error::ConfigError;

/// Every field or boundary signal the tokenizer can report.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[repr(u8)]
pub enum FieldId {
    MessageBegin,
    Url,
    Path,
    QueryString,
    Fragment,
    HeaderField,
    HeaderValue,
    HeadersComplete,
    Body,
    MessageComplete,
}

/// Disjoint groups used by the flush policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldGroup {
    /// `Url`, `Path`, `QueryString`, `Fragment`.
    Url,
    /// `HeaderField`, `HeaderValue`.
    HeaderPair,
    /// `Body`; never buffered.
    Body,
    /// Payload-free boundaries.
    Signal,
}

impl FieldId {
    pub const ALL: [FieldId; 10] = [
        FieldId::MessageBegin,
        FieldId::Url,
        FieldId::Path,
        FieldId::QueryString,
        FieldId::Fragment,
        FieldId::HeaderField,
        FieldId::HeaderValue,
        FieldId::HeadersComplete,
        FieldId::Body,
        FieldId::MessageComplete,
    ];

    #[must_use]
    pub const fn group(self) -> FieldGroup {
        match self {
            FieldId::Url | FieldId::Path | FieldId::QueryString | FieldId::Fragment => {
                FieldGroup::Url
            }
            FieldId::HeaderField | FieldId::HeaderValue => FieldGroup::HeaderPair,
            FieldId::Body => FieldGroup::Body,
            FieldId::MessageBegin | FieldId::HeadersComplete | FieldId::MessageComplete => {
                FieldGroup::Signal
            }
        }
    }

    /// Returns `true` for fields that never carry data.
    #[must_use]
    pub const fn is_signal(self) -> bool {
        matches!(self.group(), FieldGroup::Signal)
    }

    /// The conventional callback name a scripting host registers for this
    /// field, e.g. `"on_query_string"`.
    #[must_use]
    pub const fn callback_name(self) -> &'static str {
        match self {
            FieldId::MessageBegin => "on_message_begin",
            FieldId::Url => "on_url",
            FieldId::Path => "on_path",
            FieldId::QueryString => "on_query_string",
            FieldId::Fragment => "on_fragment",
            FieldId::HeaderField => "on_header_field",
            FieldId::HeaderValue => "on_header_value",
            FieldId::HeadersComplete => "on_headers_complete",
            FieldId::Body => "on_body",
            FieldId::MessageComplete => "on_message_complete",
        }
    }

    /// Inverse of [`FieldId::callback_name`].
    #[must_use]
    pub fn from_callback_name(name: &str) -> Option<FieldId> {
        FieldId::ALL
            .into_iter()
            .find(|field| field.callback_name() == name)
    }

    const fn bit(self) -> u16 {
        1 << self as u8
    }
}

impl fmt::Display for FieldId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.callback_name())
    }
}

/// How the request target is reported.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum UrlMode {
    /// One `Url` field holding the whole request target.
    #[default]
    Combined,
    /// `Path`, `QueryString` and `Fragment` reported separately.
    Split,
}

/// The set of fields a consumer registered for.
///
/// Fields outside the set are discarded as soon as the tokenizer reports
/// them: they are never buffered and never produce events.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct FieldSet(u16);

impl FieldSet {
    #[must_use]
    pub const fn empty() -> Self {
        Self(0)
    }

    /// Everything, with the request target reported as a single `Url`.
    #[must_use]
    pub const fn combined_url() -> Self {
        Self::empty()
            .with(FieldId::MessageBegin)
            .with(FieldId::Url)
            .with(FieldId::HeaderField)
            .with(FieldId::HeaderValue)
            .with(FieldId::HeadersComplete)
            .with(FieldId::Body)
            .with(FieldId::MessageComplete)
    }

    /// Everything, with the request target split into path, query string and
    /// fragment.
    #[must_use]
    pub const fn split_url() -> Self {
        Self::combined_url()
            .without(FieldId::Url)
            .with(FieldId::Path)
            .with(FieldId::QueryString)
            .with(FieldId::Fragment)
    }

    #[must_use]
    pub const fn with(self, field: FieldId) -> Self {
        Self(self.0 | field.bit())
    }

    #[must_use]
    pub const fn without(self, field: FieldId) -> Self {
        Self(self.0 & !field.bit())
    }

    pub fn insert(&mut self, field: FieldId) {
        self.0 |= field.bit();
    }

    #[must_use]
    pub const fn contains(self, field: FieldId) -> bool {
        self.0 & field.bit() != 0
    }

    #[must_use]
    pub const fn is_empty(self) -> bool {
        self.0 == 0
    }

    /// Header fields and values are delivered as one pair event, so
    /// registering either half enables the pair.
    #[must_use]
    pub const fn wants_headers(self) -> bool {
        self.contains(FieldId::HeaderField) || self.contains(FieldId::HeaderValue)
    }

    /// Whether fragments of `field` should be kept at all.
    #[must_use]
    pub const fn wants(self, field: FieldId) -> bool {
        match field.group() {
            FieldGroup::HeaderPair => self.wants_headers(),
            _ => self.contains(field),
        }
    }

    /// Derives the url decomposition mode from the registered consumers.
    ///
    /// # Errors
    ///
    /// [`ConfigError::ConflictingUrlModes`] when `Url` is registered together
    /// with any of `Path`, `QueryString` or `Fragment`.
    pub const fn url_mode(self) -> Result<UrlMode, ConfigError> {
        let split = self.contains(FieldId::Path)
            || self.contains(FieldId::QueryString)
            || self.contains(FieldId::Fragment);
        match (self.contains(FieldId::Url), split) {
            (true, true) => Err(ConfigError::ConflictingUrlModes),
            (_, true) => Ok(UrlMode::Split),
            (_, false) => Ok(UrlMode::Combined),
        }
    }

    pub fn iter(self) -> impl Iterator<Item = FieldId> {
        FieldId::ALL
            .into_iter()
            .filter(move |field| self.contains(*field))
    }
}

impl fmt::Debug for FieldSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set().entries(self.iter()).finish()
    }
}

impl FromIterator<FieldId> for FieldSet {
    fn from_iter<I: IntoIterator<Item = FieldId>>(iter: I) -> Self {
        let mut set = FieldSet::empty();
        for field in iter {
            set.insert(field);
        }
        set
    }
}

impl From<FieldId> for FieldSet {
    fn from(field: FieldId) -> Self {
        FieldSet::empty().with(field)
    }
}
