//! Calendar meta-feed entries and event entries.

use std::fmt;

use chrono::{DateTime, FixedOffset, NaiveDate};
use serde::Serialize;

use super::{format_timestamp, parse_timestamp, EntryBase};
use crate::error::GDataError;

gdata_enum! {
    /// `gCal:accesslevel`
    AccessLevel {
        NoAccess => "none",
        Read => "read",
        FreeBusy => "freebusy",
        Respond => "respond",
        Contributor => "contributor",
        Editor => "editor",
        Owner => "owner",
        Root => "root",
    }
}

gdata_enum! {
    /// `gd:eventStatus`
    EventStatus {
        Canceled => "http://schemas.google.com/g/2005#event.canceled",
        Confirmed => "http://schemas.google.com/g/2005#event.confirmed",
        Tentative => "http://schemas.google.com/g/2005#event.tentative",
    }
}

gdata_enum! {
    /// `gd:visibility`
    Visibility {
        Default => "http://schemas.google.com/g/2005#event.default",
        Confidential => "http://schemas.google.com/g/2005#event.confidential",
        Private => "http://schemas.google.com/g/2005#event.private",
        Public => "http://schemas.google.com/g/2005#event.public",
    }
}

gdata_enum! {
    /// `gd:transparency`
    Transparency {
        Opaque => "http://schemas.google.com/g/2005#event.opaque",
        Transparent => "http://schemas.google.com/g/2005#event.transparent",
    }
}

gdata_enum! {
    /// `rel` of a `gd:who` element.
    AttendeeRel {
        Attendee => "http://schemas.google.com/g/2005#event.attendee",
        Organizer => "http://schemas.google.com/g/2005#event.organizer",
        Performer => "http://schemas.google.com/g/2005#event.performer",
        Speaker => "http://schemas.google.com/g/2005#event.speaker",
    }
}

gdata_enum! {
    /// `gd:attendeeStatus`
    AttendeeStatus {
        Accepted => "http://schemas.google.com/g/2005#event.accepted",
        Declined => "http://schemas.google.com/g/2005#event.declined",
        Invited => "http://schemas.google.com/g/2005#event.invited",
        Tentative => "http://schemas.google.com/g/2005#event.tentative",
    }
}

gdata_enum! {
    /// `gd:attendeeType`
    AttendeeType {
        Optional => "http://schemas.google.com/g/2005#event.optional",
        Required => "http://schemas.google.com/g/2005#event.required",
    }
}

gdata_enum! {
    /// `method` of a `gd:reminder`.
    ReminderMethod {
        Alert => "alert",
        Email => "email",
        Sms => "sms",
        Off => "none",
    }
}

/// An entry of the calendars meta-feed: one calendar the user can see.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct CalendarEntry {
    #[serde(flatten)]
    pub base: EntryBase,
    pub access_level: Option<AccessLevel>,
    /// `#RRGGBB`
    pub color: Option<String>,
    pub hidden: bool,
    pub selected: bool,
    pub timezone: Option<String>,
    pub override_name: Option<String>,
    /// Events feed of this calendar (`<link rel="alternate" type="application/atom+xml">`).
    pub alternate_uri: Option<String>,
    pub location: Option<String>,
}

/// A calendar event.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct EventEntry {
    #[serde(flatten)]
    pub base: EntryBase,
    pub status: Option<EventStatus>,
    pub visibility: Option<Visibility>,
    pub transparency: Option<Transparency>,
    pub when: Vec<When>,
    pub location: Option<String>,
    pub attendees: Vec<Attendee>,
    /// iCalendar RRULE/RDATE block, verbatim.
    pub recurrence: Option<String>,
    /// Reminders of a recurring event (single events keep them on `when`).
    pub reminders: Vec<Reminder>,
    /// Set on exceptions to a recurring event.
    pub original_event: Option<OriginalEvent>,
    pub send_event_notifications: bool,
    pub quick_add: bool,
    pub extended_properties: Vec<ExtendedProperty>,
}

/// Either an all-day date or an instant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum EventTime {
    Date(NaiveDate),
    DateTime(DateTime<FixedOffset>),
}

impl EventTime {
    pub fn parse(value: &str) -> Result<Self, GDataError> {
        let value = value.trim();
        if value.len() == 10 {
            NaiveDate::parse_from_str(value, "%Y-%m-%d")
                .map(EventTime::Date)
                .map_err(|e| GDataError::malformed_by(format!("invalid date '{}'", value), e))
        } else {
            parse_timestamp(value).map(EventTime::DateTime)
        }
    }

    pub fn is_all_day(&self) -> bool {
        matches!(self, EventTime::Date(_))
    }
}

impl fmt::Display for EventTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EventTime::Date(d) => write!(f, "{}", d.format("%Y-%m-%d")),
            EventTime::DateTime(dt) => f.write_str(&format_timestamp(dt)),
        }
    }
}

/// `gd:when`
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct When {
    pub start: EventTime,
    pub end: Option<EventTime>,
    pub reminders: Vec<Reminder>,
}

/// `gd:reminder`. At most one of the offsets is normally set.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Reminder {
    pub days: Option<u32>,
    pub hours: Option<u32>,
    pub minutes: Option<u32>,
    pub method: Option<ReminderMethod>,
}

/// `gd:who`
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Attendee {
    pub email: Option<String>,
    /// `valueString`, the display name.
    pub name: Option<String>,
    pub rel: Option<AttendeeRel>,
    pub status: Option<AttendeeStatus>,
    pub attendee_type: Option<AttendeeType>,
}

/// `gd:originalEvent`
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct OriginalEvent {
    pub id: Option<String>,
    pub href: Option<String>,
    pub original_start: Option<EventTime>,
}

/// `gd:extendedProperty`
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ExtendedProperty {
    pub name: String,
    pub value: String,
}
