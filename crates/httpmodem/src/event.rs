//! Finalized events and the per-feed queue that carries them.
//!
//! Events are produced inside [`ParserSession::feed`](crate::ParserSession::feed)
//! while the tokenizer is running, but they are only handed out once it has
//! returned. Consumers therefore never run on the tokenizer's call stack and
//! are free to suspend between events.
//!
//! # Examples
//!
//! ```
//! use httpmodem::{Event, ParserSession, SessionOptions};
//!
//! let mut session = ParserSession::request(SessionOptions::default()).unwrap();
//! let feed = session
//!     .feed(b"GET /a?b=c HTTP/1.1\r\nHost: x\r\n\r\n")
//!     .unwrap();
//! assert_eq!(
//!     feed.events.into_vec(),
//!     vec![
//!         Event::MessageBegin,
//!         Event::Url("/a?b=c".into()),
//!         Event::Header {
//!             field: "Host".into(),
//!             value: "x".into(),
//!         },
//!         Event::HeadersComplete,
//!         Event::MessageComplete,
//!     ]
//! );
//! ```

use alloc::vec::Vec;

use bstr::{BStr, BString};

use crate::{error::ResourceError, field::FieldId};

/// One whole, ordered unit of HTTP structure.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event {
    MessageBegin,
    Url(BString),
    Path(BString),
    QueryString(BString),
    Fragment(BString),
    Header { field: BString, value: BString },
    HeadersComplete,
    /// One body fragment exactly as the tokenizer delivered it.
    Body(BString),
    /// Marks the end of the body stream; only emitted after at least one
    /// [`Event::Body`] of the same message.
    BodyEnd,
    MessageComplete,
}

impl Event {
    /// The field this event belongs to. [`Event::BodyEnd`] reports
    /// [`FieldId::Body`]; header pairs report [`FieldId::HeaderField`].
    #[must_use]
    pub fn field(&self) -> FieldId {
        match self {
            Event::MessageBegin => FieldId::MessageBegin,
            Event::Url(_) => FieldId::Url,
            Event::Path(_) => FieldId::Path,
            Event::QueryString(_) => FieldId::QueryString,
            Event::Fragment(_) => FieldId::Fragment,
            Event::Header { .. } => FieldId::HeaderField,
            Event::HeadersComplete => FieldId::HeadersComplete,
            Event::Body(_) | Event::BodyEnd => FieldId::Body,
            Event::MessageComplete => FieldId::MessageComplete,
        }
    }

    /// Signals carry no payload.
    #[must_use]
    pub fn is_signal(&self) -> bool {
        matches!(
            self,
            Event::MessageBegin | Event::HeadersComplete | Event::BodyEnd | Event::MessageComplete
        )
    }

    /// The single payload of a data event. `None` for signals and header
    /// pairs.
    #[must_use]
    pub fn data(&self) -> Option<&BStr> {
        match self {
            Event::Url(data)
            | Event::Path(data)
            | Event::QueryString(data)
            | Event::Fragment(data)
            | Event::Body(data) => Some(BStr::new(data)),
            _ => None,
        }
    }

    pub(crate) fn from_url_part(field: FieldId, data: BString) -> Self {
        match field {
            FieldId::Path => Event::Path(data),
            FieldId::QueryString => Event::QueryString(data),
            FieldId::Fragment => Event::Fragment(data),
            _ => Event::Url(data),
        }
    }
}

/// Events finalized during exactly one feed call, in emission order.
///
/// The queue can only grow while the feed that owns it is running; callers
/// receive it read-only.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EventQueue {
    events: Vec<Event>,
}

impl EventQueue {
    #[must_use]
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn push(&mut self, event: Event) -> Result<(), ResourceError> {
        self.events
            .try_reserve(1)
            .map_err(|_| ResourceError::QueueAllocation)?;
        self.events.push(event);
        Ok(())
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.events.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    pub fn iter(&self) -> core::slice::Iter<'_, Event> {
        self.events.iter()
    }

    #[must_use]
    pub fn as_slice(&self) -> &[Event] {
        &self.events
    }

    #[must_use]
    pub fn into_vec(self) -> Vec<Event> {
        self.events
    }
}

impl IntoIterator for EventQueue {
    type Item = Event;
    type IntoIter = alloc::vec::IntoIter<Event>;

    fn into_iter(self) -> Self::IntoIter {
        self.events.into_iter()
    }
}

impl<'a> IntoIterator for &'a EventQueue {
    type Item = &'a Event;
    type IntoIter = core::slice::Iter<'a, Event>;

    fn into_iter(self) -> Self::IntoIter {
        self.events.iter()
    }
}

impl core::ops::Index<usize> for EventQueue {
    type Output = Event;

    fn index(&self, index: usize) -> &Event {
        &self.events[index]
    }
}
