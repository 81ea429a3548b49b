//! Assembles replayed events into whole messages.

use alloc::vec::Vec;
use core::convert::Infallible;

use bstr::{BStr, BString, ByteSlice};

use crate::{event::EventQueue, replay::Handler};

/// One HTTP message as seen through its events.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Message {
    pub url: Option<BString>,
    pub path: Option<BString>,
    pub query_string: Option<BString>,
    pub fragment: Option<BString>,
    /// In arrival order; repeated names are kept.
    pub headers: Vec<(BString, BString)>,
    /// The concatenated body, if any body event was seen.
    pub body: Option<BString>,
    pub headers_complete: bool,
    pub complete: bool,
}

impl Message {
    /// First value of the header called `name`, compared ASCII
    /// case-insensitively.
    #[must_use]
    pub fn header(&self, name: &[u8]) -> Option<&BStr> {
        self.headers
            .iter()
            .find(|(field, _)| field.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_bstr())
    }
}

/// A [`Handler`] that builds [`Message`]s across any number of feeds.
///
/// ```
/// use httpmodem::{MessageCollector, ParserSession, SessionOptions};
///
/// let mut session = ParserSession::request(SessionOptions::default()).unwrap();
/// let mut collector = MessageCollector::new();
/// for chunk in [&b"POST /upload HTTP/1.1\r\nContent-Len"[..], b"gth: 5\r\n\r\nhel", b"lo"] {
///     collector.collect(&session.feed(chunk).unwrap().events);
/// }
/// let messages = collector.take_messages();
/// assert_eq!(messages.len(), 1);
/// assert_eq!(messages[0].url.as_ref().unwrap(), "/upload");
/// assert_eq!(messages[0].header(b"content-length").unwrap(), "5");
/// assert_eq!(messages[0].body.as_ref().unwrap(), "hello");
/// ```
#[derive(Debug, Clone, Default)]
pub struct MessageCollector {
    current: Option<Message>,
    finished: Vec<Message>,
}

impl MessageCollector {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Replays `events` into the collector.
    pub fn collect(&mut self, events: &EventQueue) {
        let Ok(()) = events.replay(self);
    }

    /// The message still being assembled, if any.
    #[must_use]
    pub fn current(&self) -> Option<&Message> {
        self.current.as_ref()
    }

    /// Completed messages since the last call, oldest first.
    pub fn take_messages(&mut self) -> Vec<Message> {
        core::mem::take(&mut self.finished)
    }

    fn message(&mut self) -> &mut Message {
        self.current.get_or_insert_with(Message::default)
    }
}

impl Handler for MessageCollector {
    type Error = Infallible;

    fn on_message_begin(&mut self) -> Result<(), Infallible> {
        self.current = Some(Message::default());
        Ok(())
    }

    fn on_url(&mut self, url: &BStr) -> Result<(), Infallible> {
        self.message().url = Some(url.into());
        Ok(())
    }

    fn on_path(&mut self, path: &BStr) -> Result<(), Infallible> {
        self.message().path = Some(path.into());
        Ok(())
    }

    fn on_query_string(&mut self, query: &BStr) -> Result<(), Infallible> {
        self.message().query_string = Some(query.into());
        Ok(())
    }

    fn on_fragment(&mut self, fragment: &BStr) -> Result<(), Infallible> {
        self.message().fragment = Some(fragment.into());
        Ok(())
    }

    fn on_header(&mut self, field: &BStr, value: &BStr) -> Result<(), Infallible> {
        self.message().headers.push((field.into(), value.into()));
        Ok(())
    }

    fn on_headers_complete(&mut self) -> Result<(), Infallible> {
        self.message().headers_complete = true;
        Ok(())
    }

    fn on_body(&mut self, chunk: Option<&BStr>) -> Result<(), Infallible> {
        let message = self.message();
        let body = message.body.get_or_insert_with(BString::default);
        if let Some(chunk) = chunk {
            body.extend_from_slice(chunk);
        }
        Ok(())
    }

    fn on_message_complete(&mut self) -> Result<(), Infallible> {
        let mut message = self.current.take().unwrap_or_default();
        message.complete = true;
        self.finished.push(message);
        Ok(())
    }
}
