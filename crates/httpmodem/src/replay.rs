//! Replaying a finished [`EventQueue`] into per-event callbacks.
//!
//! This is the consumption half of the feed/consume split: a host binding or
//! trampoline walks the queue after the tokenizer has returned, so handlers
//! may block, yield or re-enter the session freely.

use bstr::{BStr, ByteSlice};

use crate::event::{Event, EventQueue};

/// Receives replayed events. Every method defaults to doing nothing.
///
/// Returning `Err` stops the replay at that event.
#[allow(unused_variables)]
pub trait Handler {
    type Error;

    fn on_message_begin(&mut self) -> Result<(), Self::Error> {
        Ok(())
    }

    fn on_url(&mut self, url: &BStr) -> Result<(), Self::Error> {
        Ok(())
    }

    fn on_path(&mut self, path: &BStr) -> Result<(), Self::Error> {
        Ok(())
    }

    fn on_query_string(&mut self, query: &BStr) -> Result<(), Self::Error> {
        Ok(())
    }

    fn on_fragment(&mut self, fragment: &BStr) -> Result<(), Self::Error> {
        Ok(())
    }

    fn on_header(&mut self, field: &BStr, value: &BStr) -> Result<(), Self::Error> {
        Ok(())
    }

    fn on_headers_complete(&mut self) -> Result<(), Self::Error> {
        Ok(())
    }

    /// A body fragment, or `None` once the body has ended.
    fn on_body(&mut self, chunk: Option<&BStr>) -> Result<(), Self::Error> {
        Ok(())
    }

    fn on_message_complete(&mut self) -> Result<(), Self::Error> {
        Ok(())
    }
}

impl Event {
    /// Calls the [`Handler`] method matching this event.
    ///
    /// # Errors
    ///
    /// Whatever the handler returns.
    pub fn dispatch<H: Handler + ?Sized>(&self, handler: &mut H) -> Result<(), H::Error> {
        match self {
            Event::MessageBegin => handler.on_message_begin(),
            Event::Url(url) => handler.on_url(url.as_bstr()),
            Event::Path(path) => handler.on_path(path.as_bstr()),
            Event::QueryString(query) => handler.on_query_string(query.as_bstr()),
            Event::Fragment(fragment) => handler.on_fragment(fragment.as_bstr()),
            Event::Header { field, value } => handler.on_header(field.as_bstr(), value.as_bstr()),
            Event::HeadersComplete => handler.on_headers_complete(),
            Event::Body(chunk) => handler.on_body(Some(chunk.as_bstr())),
            Event::BodyEnd => handler.on_body(None),
            Event::MessageComplete => handler.on_message_complete(),
        }
    }
}

impl EventQueue {
    /// Dispatches every event in order.
    ///
    /// ```
    /// use bstr::BStr;
    /// use httpmodem::{Handler, ParserSession, SessionOptions};
    ///
    /// #[derive(Default)]
    /// struct Hosts(Vec<String>);
    ///
    /// impl Handler for Hosts {
    ///     type Error = core::convert::Infallible;
    ///
    ///     fn on_header(&mut self, field: &BStr, value: &BStr) -> Result<(), Self::Error> {
    ///         if field.eq_ignore_ascii_case(b"host") {
    ///             self.0.push(value.to_string());
    ///         }
    ///         Ok(())
    ///     }
    /// }
    ///
    /// let mut session = ParserSession::request(SessionOptions::default()).unwrap();
    /// let feed = session.feed(b"GET / HTTP/1.1\r\nHost: a\r\n\r\n").unwrap();
    /// let mut hosts = Hosts::default();
    /// feed.events.replay(&mut hosts).unwrap();
    /// assert_eq!(hosts.0, ["a"]);
    /// ```
    ///
    /// # Errors
    ///
    /// The first error a handler method returns; later events are not
    /// dispatched.
    pub fn replay<H: Handler + ?Sized>(&self, handler: &mut H) -> Result<(), H::Error> {
        self.iter().try_for_each(|event| event.dispatch(handler))
    }
}
