//! Parsers and serializers for GData calendar feeds.
//!
//! [`CalendarParserFactory`] is the entry point. It turns a byte stream into
//! a pull-based parser for the calendars meta-feed or an events feed, and
//! turns event entries (alone or in a batch) into Atom documents.
//!
//! ```no_run
//! use gdata_calendar::{CalendarParserFactory, Entries, EntryKind, GDataParserFactory};
//!
//! # fn main() -> Result<(), gdata_calendar::GDataError> {
//! let factory = CalendarParserFactory::default();
//! let file = std::io::BufReader::new(std::fs::File::open("events.xml").unwrap());
//! let mut parser = factory.create_parser(EntryKind::Event, file)?;
//! for entity in Entries::new(parser.as_mut()) {
//!     println!("{:?}", entity?.base().and_then(|b| b.title.clone()));
//! }
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod data;
pub mod error;
pub mod factory;
pub mod parser;
pub mod serializer;
pub mod xml;

pub use data::{Entity, EntryKind};
pub use error::{EngineError, GDataError};
pub use factory::{CalendarParserFactory, GDataParserFactory};
pub use parser::{Entries, GDataParser, ParserKind};
pub use serializer::{BatchSerializer, EntrySerializer, GDataSerializer, SerializeFormat};
