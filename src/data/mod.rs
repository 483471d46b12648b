//! Entity model for calendar feeds.
//!
//! Entities are plain records. The only thing the factories look at is the
//! exact variant of [`Entity`] (or the [`EntryKind`] tag a caller passes
//! in); everything else is carried for the concrete parsers and serializers.
//!
//! - [`calendar`] - calendar meta-feed entries and event entries
//! - [`contacts`] - the contacts `gContact:calendarLink` element

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, FixedOffset, SecondsFormat};
use serde::Serialize;

use crate::error::GDataError;

/// Declares an enum whose variants map one-to-one onto protocol strings.
macro_rules! gdata_enum {
    ($(#[$meta:meta])* $name:ident { $($variant:ident => $value:literal),+ $(,)? }) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
        pub enum $name {
            $($variant),+
        }

        impl $name {
            /// The value as it appears on the wire.
            pub fn as_str(&self) -> &'static str {
                match self {
                    $(Self::$variant => $value),+
                }
            }

            /// Looks up a wire value. Unknown values yield `None`.
            pub fn from_wire(value: &str) -> Option<Self> {
                match value {
                    $($value => Some(Self::$variant),)+
                    _ => None,
                }
            }
        }
    };
}

pub mod calendar;
pub mod contacts;

pub use calendar::{
    AccessLevel, Attendee, AttendeeRel, AttendeeStatus, AttendeeType, CalendarEntry, EventEntry,
    EventStatus, EventTime, ExtendedProperty, OriginalEvent, Reminder, ReminderMethod,
    Transparency, Visibility, When,
};
pub use contacts::{CalendarLink, CalendarLinkType};

// ============================================================================
// Type tags
// ============================================================================

/// Runtime type tag of an entity.
///
/// This is a closed set: parsers and serializers are chosen by exact match
/// on it, never by string sniffing or open registration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum EntryKind {
    Calendar,
    Event,
    CalendarLink,
}

impl EntryKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            EntryKind::Calendar => "calendar",
            EntryKind::Event => "event",
            EntryKind::CalendarLink => "calendar-link",
        }
    }
}

impl fmt::Display for EntryKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EntryKind {
    type Err = GDataError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "calendar" | "calendar-feed" => Ok(EntryKind::Calendar),
            "event" => Ok(EntryKind::Event),
            "calendar-link" => Ok(EntryKind::CalendarLink),
            other => Err(GDataError::InvalidArgument(format!(
                "Unknown entry type '{}' specified.",
                other
            ))),
        }
    }
}

/// Any resource the factories can be handed.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Entity {
    Calendar(CalendarEntry),
    Event(EventEntry),
    CalendarLink(CalendarLink),
}

impl Entity {
    pub fn kind(&self) -> EntryKind {
        match self {
            Entity::Calendar(_) => EntryKind::Calendar,
            Entity::Event(_) => EntryKind::Event,
            Entity::CalendarLink(_) => EntryKind::CalendarLink,
        }
    }

    /// Atom fields shared by feed entries. Sub-elements have none.
    pub fn base(&self) -> Option<&EntryBase> {
        match self {
            Entity::Calendar(c) => Some(&c.base),
            Entity::Event(e) => Some(&e.base),
            Entity::CalendarLink(_) => None,
        }
    }
}

impl From<CalendarEntry> for Entity {
    fn from(entry: CalendarEntry) -> Self {
        Entity::Calendar(entry)
    }
}

impl From<EventEntry> for Entity {
    fn from(entry: EventEntry) -> Self {
        Entity::Event(entry)
    }
}

impl From<CalendarLink> for Entity {
    fn from(link: CalendarLink) -> Self {
        Entity::CalendarLink(link)
    }
}

// ============================================================================
// Atom entry and feed
// ============================================================================

/// Fields every Atom entry carries.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct EntryBase {
    pub id: Option<String>,
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title_type: Option<TextType>,
    pub summary: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub summary_type: Option<TextType>,
    /// For [`TextType::Xhtml`] this is the markup inside the xhtml `<div>`.
    pub content: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content_type: Option<TextType>,
    pub author: Option<String>,
    pub email: Option<String>,
    pub category: Option<String>,
    pub category_scheme: Option<String>,
    /// `<link rel="edit">`
    pub edit_uri: Option<String>,
    /// `<link rel="alternate" type="text/html">`
    pub html_uri: Option<String>,
    pub published: Option<DateTime<FixedOffset>>,
    pub updated: Option<DateTime<FixedOffset>>,
    /// `<gd:deleted/>` marks a tombstone in incremental feeds.
    pub deleted: bool,
    /// `gd:etag` attribute of the entry.
    pub etag: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub batch: Option<BatchInfo>,
}

gdata_enum! {
    /// `type` attribute of the Atom title, summary and content elements.
    TextType {
        Text => "text",
        Html => "html",
        Xhtml => "xhtml",
    }
}

gdata_enum! {
    /// `batch:operation type="..."`
    BatchOperation {
        Insert => "insert",
        Update => "update",
        Delete => "delete",
        Query => "query",
    }
}

/// Batch bookkeeping attached to an entry inside a batch feed.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct BatchInfo {
    pub operation: Option<BatchOperation>,
    /// Client-chosen id echoed back in the response.
    pub id: Option<String>,
    /// Only present on batch responses.
    pub status: Option<BatchStatus>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BatchStatus {
    pub code: u16,
    pub reason: Option<String>,
}

/// Feed-level metadata read before the first entry.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Feed {
    pub id: Option<String>,
    pub title: Option<String>,
    pub updated: Option<DateTime<FixedOffset>>,
    pub etag: Option<String>,
    /// openSearch:totalResults
    pub total_results: Option<u32>,
    pub start_index: Option<u32>,
    pub items_per_page: Option<u32>,
    /// `#feed` link
    pub feed_url: Option<String>,
    /// `#post` link
    pub post_url: Option<String>,
    /// `#batch` link
    pub batch_url: Option<String>,
    /// Next page. Never followed here.
    pub next_url: Option<String>,
    /// `gCal:timezone` on event feeds.
    pub timezone: Option<String>,
}

pub(crate) fn parse_timestamp(value: &str) -> Result<DateTime<FixedOffset>, GDataError> {
    DateTime::parse_from_rfc3339(value.trim())
        .map_err(|e| GDataError::malformed_by(format!("invalid timestamp '{}'", value), e))
}

/// RFC 3339 with at least milliseconds, `Z` for UTC. Finer fractions are kept.
pub(crate) fn format_timestamp(value: &DateTime<FixedOffset>) -> String {
    let precision = if value.timestamp_subsec_nanos() % 1_000_000 == 0 {
        SecondsFormat::Millis
    } else {
        SecondsFormat::AutoSi
    };
    value.to_rfc3339_opts(precision, true)
}
