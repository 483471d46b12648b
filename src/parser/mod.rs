//! Streaming feed parsers.
//!
//! Every parser handed out by a factory implements [`GDataParser`]. A parser
//! is bound to exactly one forward-only stream: it reads lazily as the
//! caller asks for the envelope or the next entry, and it cannot be
//! restarted.
//!
//! - [`atom`] - the Atom feed/entry core shared by all feed kinds
//! - [`calendars`] - calendars meta-feed extensions
//! - [`events`] - events feed extensions

pub mod atom;
pub mod calendars;
pub mod events;

use std::fmt;

use serde::Serialize;

use crate::data::{Entity, Feed};
use crate::error::GDataError;

pub use atom::{AtomFeedParser, FeedExtensions};
pub use calendars::{CalendarsFeed, CalendarsFeedParser};
pub use events::{EventsFeed, EventsFeedParser};

/// Concrete parser family a factory resolved to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum ParserKind {
    /// Collection of calendars.
    MetaFeed,
    /// Collection of events.
    EventFeed,
}

impl fmt::Display for ParserKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParserKind::MetaFeed => f.write_str("meta-feed"),
            ParserKind::EventFeed => f.write_str("event-feed"),
        }
    }
}

/// A parser bound to one input stream.
pub trait GDataParser {
    fn kind(&self) -> ParserKind;

    /// Reads the feed-level metadata, stopping before the first entry.
    ///
    /// Later calls return the same envelope without touching the stream.
    ///
    /// # Errors
    ///
    /// Returns [`GDataError::Parse`] if the document is not a well-formed
    /// feed, or if the stream was already consumed by
    /// [`parse_standalone_entry`](Self::parse_standalone_entry).
    fn parse_feed_envelope(&mut self) -> Result<Feed, GDataError>;

    /// Reads the next entry of the feed, or `None` once the feed ends.
    ///
    /// Parses the envelope first if that has not happened yet. After an
    /// error or the end of the feed every call returns `Ok(None)`.
    fn read_next_entry(&mut self) -> Result<Option<Entity>, GDataError>;

    /// Parses a document whose root element is a single `<entry>`.
    fn parse_standalone_entry(&mut self) -> Result<Entity, GDataError>;
}

/// Lazy, single-pass iterator over the entries of a parser.
///
/// Yields at most one error, after which it is exhausted.
pub struct Entries<'p, P: ?Sized> {
    parser: &'p mut P,
    done: bool,
}

impl<'p, P: GDataParser + ?Sized> Entries<'p, P> {
    pub fn new(parser: &'p mut P) -> Self {
        Self {
            parser,
            done: false,
        }
    }
}

impl<P: GDataParser + ?Sized> Iterator for Entries<'_, P> {
    type Item = Result<Entity, GDataError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        match self.parser.read_next_entry() {
            Ok(Some(entity)) => Some(Ok(entity)),
            Ok(None) => {
                self.done = true;
                None
            }
            Err(e) => {
                self.done = true;
                Some(Err(e))
            }
        }
    }
}
