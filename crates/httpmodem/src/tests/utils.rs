use alloc::vec::Vec;

use crate::{Event, ParserSession, SessionOptions};

pub(crate) fn request_session() -> ParserSession {
    ParserSession::request(SessionOptions::default()).unwrap()
}

pub(crate) fn response_session() -> ParserSession {
    ParserSession::response(SessionOptions::default()).unwrap()
}

/// Feeds every non-empty chunk and collects the events, panicking on any
/// resource or tokenizer error.
pub(crate) fn feed_chunks<'a>(
    session: &mut ParserSession,
    chunks: impl IntoIterator<Item = &'a [u8]>,
) -> Vec<Event> {
    let mut events = Vec::new();
    for chunk in chunks {
        if chunk.is_empty() {
            continue;
        }
        let feed = session.feed(chunk).unwrap();
        assert_eq!(feed.error, None, "tokenizer error on {chunk:?}");
        assert_eq!(feed.consumed, chunk.len());
        events.extend(feed.events);
    }
    events
}

/// Cuts `bytes` into chunks whose sizes are derived from `seeds`; whatever
/// the seeds leave over becomes the last chunk.
pub(crate) fn split_by_seeds<'a>(bytes: &'a [u8], seeds: &[usize]) -> Vec<&'a [u8]> {
    let mut chunks = Vec::new();
    let mut rest = bytes;
    for seed in seeds {
        if rest.is_empty() {
            break;
        }
        let (head, tail) = rest.split_at(1 + seed % rest.len());
        chunks.push(head);
        rest = tail;
    }
    if !rest.is_empty() {
        chunks.push(rest);
    }
    chunks
}

/// Body fragments follow the input segmentation; everything else must not.
/// Joins adjacent [`Event::Body`] events so streams can be compared.
pub(crate) fn coalesce_bodies(events: Vec<Event>) -> Vec<Event> {
    let mut out: Vec<Event> = Vec::with_capacity(events.len());
    for event in events {
        if let (Event::Body(next), Some(Event::Body(previous))) = (&event, out.last_mut()) {
            previous.extend_from_slice(next);
            continue;
        }
        out.push(event);
    }
    out
}
