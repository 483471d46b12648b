//! Parser and serializer factory for calendar feeds.
//!
//! The factory picks a concrete parser or serializer by exact match on a
//! closed set of kinds. It holds nothing but a shared, immutable reference
//! to the XML engine, so one factory can serve any number of independent
//! calls from any thread.

use std::io::BufRead;
use std::sync::Arc;

use crate::data::{Entity, EntryKind};
use crate::error::GDataError;
use crate::parser::{CalendarsFeedParser, EventsFeedParser, GDataParser};
use crate::serializer::{BatchSerializer, EntrySerializer, EventEntrySerializer};
use crate::xml::{PullParser, QuickXmlEngine, WriterConfig, XmlEngine};

/// Creates parsers and serializers for one family of feeds.
pub trait GDataParserFactory: Send + Sync {
    /// Returns the parser registered for `kind`, bound to `stream`.
    ///
    /// The stream is not read until the parser is driven.
    ///
    /// # Errors
    ///
    /// - [`GDataError::InvalidArgument`] if no parser handles `kind`
    /// - [`GDataError::Parse`] if the XML engine cannot create a parser
    fn create_parser<'a, R: BufRead + 'a>(
        &self,
        kind: EntryKind,
        stream: R,
    ) -> Result<Box<dyn GDataParser + 'a>, GDataError>;

    /// Returns a serializer bound to `entity`.
    ///
    /// # Errors
    ///
    /// - [`GDataError::InvalidArgument`] if the entity cannot be serialized
    ///   on its own
    /// - [`GDataError::Serialize`] if the XML engine cannot create a writer
    fn create_serializer<'e>(
        &'e self,
        entity: &'e Entity,
    ) -> Result<Box<dyn EntrySerializer + 'e>, GDataError>;

    /// Returns a serializer for an ordered batch of entities.
    ///
    /// Entities are checked when the batch is serialized, through
    /// [`create_serializer`](Self::create_serializer).
    fn create_batch_serializer<'e>(
        &'e self,
        batch: &'e [Entity],
    ) -> Result<BatchSerializer<'e, Self>, GDataError>
    where
        Self: Sized;
}

/// Factory for the calendars meta-feed and events feeds.
#[derive(Debug, Clone)]
pub struct CalendarParserFactory {
    engine: Arc<dyn XmlEngine>,
}

impl Default for CalendarParserFactory {
    fn default() -> Self {
        Self::new(Arc::new(QuickXmlEngine::default()))
    }
}

impl CalendarParserFactory {
    pub fn new(engine: Arc<dyn XmlEngine>) -> Self {
        Self { engine }
    }

    /// Parser for the calendars meta-feed, whatever the stream contains.
    pub fn create_meta_feed_parser<R: BufRead>(
        &self,
        stream: R,
    ) -> Result<CalendarsFeedParser<R>, GDataError> {
        Ok(CalendarsFeedParser::new(self.pull_parser(stream)?))
    }

    /// Parser for an events feed. This is the default when no kind is given.
    pub fn create_default_feed_parser<R: BufRead>(
        &self,
        stream: R,
    ) -> Result<EventsFeedParser<R>, GDataError> {
        Ok(EventsFeedParser::new(self.pull_parser(stream)?))
    }

    fn pull_parser<R: BufRead>(&self, stream: R) -> Result<PullParser<R>, GDataError> {
        let config = self.engine.create_parser().map_err(|e| {
            tracing::warn!(error = %e, "XML engine could not create a parser");
            GDataError::Parse {
                message: "could not create XML pull parser".to_string(),
                source: Some(Box::new(e)),
            }
        })?;
        Ok(config.bind(stream))
    }

    fn writer_config(&self) -> Result<WriterConfig, GDataError> {
        self.engine.create_serializer().map_err(|e| {
            tracing::warn!(error = %e, "XML engine could not create a writer");
            GDataError::Serialize {
                message: "could not create XML serializer".to_string(),
                source: Some(Box::new(e)),
            }
        })
    }
}

impl GDataParserFactory for CalendarParserFactory {
    fn create_parser<'a, R: BufRead + 'a>(
        &self,
        kind: EntryKind,
        stream: R,
    ) -> Result<Box<dyn GDataParser + 'a>, GDataError> {
        tracing::debug!(%kind, "Creating parser");
        match kind {
            EntryKind::Calendar => Ok(Box::new(self.create_meta_feed_parser(stream)?)),
            EntryKind::Event => Ok(Box::new(self.create_default_feed_parser(stream)?)),
            EntryKind::CalendarLink => Err(GDataError::InvalidArgument(format!(
                "Unknown entry class '{}' specified.",
                kind
            ))),
        }
    }

    fn create_serializer<'e>(
        &'e self,
        entity: &'e Entity,
    ) -> Result<Box<dyn EntrySerializer + 'e>, GDataError> {
        match entity {
            Entity::Event(event) => {
                let config = self.writer_config()?;
                Ok(Box::new(EventEntrySerializer::new(config, event)))
            }
            other => Err(GDataError::InvalidArgument(format!(
                "Expected EventEntry, got {}",
                other.kind()
            ))),
        }
    }

    fn create_batch_serializer<'e>(
        &'e self,
        batch: &'e [Entity],
    ) -> Result<BatchSerializer<'e, Self>, GDataError> {
        tracing::debug!(entries = batch.len(), "Creating batch serializer");
        Ok(BatchSerializer::new(self, self.writer_config()?, batch))
    }
}
