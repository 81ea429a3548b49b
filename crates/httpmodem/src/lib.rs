//! Event buffering and replay for an incremental HTTP/1.x tokenizer.
//!
//! A tokenizer reports fields as fragments that may be cut anywhere by TCP
//! segmentation. [`ParserSession`] collects those fragments, decides when a
//! logical field is complete, and hands back an [`EventQueue`] of whole values
//! for each feed call. Consumers then walk the queue, directly or through a
//! [`Handler`], once the tokenizer has returned.
//!
//! ```rust
//! use httpmodem::{Event, ParserSession, SessionOptions};
//!
//! let mut session = ParserSession::request(SessionOptions::default()).unwrap();
//! let feed = session
//!     .feed(b"GET /index.html HTTP/1.1\r\nHost: example.com\r\n\r\n")
//!     .unwrap();
//! assert_eq!(feed.events.len(), 5);
//! assert_eq!(feed.events[1], Event::Url("/index.html".into()));
//! assert!(session.should_keep_alive());
//! ```

#![no_std]
#![allow(missing_docs)]
extern crate alloc;

#[cfg(test)]
extern crate std;

mod buffer;
mod error;
mod event;
mod field;
mod options;
mod policy;
mod replay;
mod session;
mod tokenizer;

#[cfg(feature = "collect")]
mod message;

#[cfg(test)]
mod tests;

pub use bstr::{BStr, BString};
pub use error::{ConfigError, FeedError, ResourceError, TokenizerError};
pub use event::{Event, EventQueue};
pub use field::{FieldGroup, FieldId, FieldSet, UrlMode};
#[cfg(feature = "collect")]
pub use message::{Message, MessageCollector};
pub use options::SessionOptions;
pub use replay::Handler;
pub use session::{Feed, ParserSession};
pub use tokenizer::{Callbacks, Http1Tokenizer, Method, ParserType, Tokenizer};
