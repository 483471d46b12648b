//! Calendars meta-feed: the list of calendars visible to the user.

use std::io::BufRead;

use crate::data::{AccessLevel, CalendarEntry, Entity, EntryBase};
use crate::error::GDataError;
use crate::xml::{Ns, PullParser, StartTag};

use super::atom::{bool_value, is_atom, string_attr, wire_value, AtomFeedParser, FeedExtensions};
use super::ParserKind;

/// Parser for the calendars meta-feed.
pub type CalendarsFeedParser<R> = AtomFeedParser<R, CalendarsFeed>;

/// `gCal` extensions of calendar entries.
#[derive(Debug)]
pub struct CalendarsFeed;

impl FeedExtensions for CalendarsFeed {
    type Entry = CalendarEntry;

    const KIND: ParserKind = ParserKind::MetaFeed;

    fn base(entry: &mut CalendarEntry) -> &mut EntryBase {
        &mut entry.base
    }

    fn into_entity(entry: CalendarEntry) -> Entity {
        Entity::Calendar(entry)
    }

    fn entry_element<R: BufRead>(
        pull: &mut PullParser<R>,
        tag: &StartTag,
        entry: &mut CalendarEntry,
    ) -> Result<bool, GDataError> {
        match (tag.ns, tag.name.as_str()) {
            (Ns::GCal, "accesslevel") => {
                entry.access_level = wire_value(tag, "value", AccessLevel::from_wire)
            }
            (Ns::GCal, "color") => entry.color = string_attr(tag, "value"),
            (Ns::GCal, "hidden") => entry.hidden = bool_value(tag),
            (Ns::GCal, "selected") => entry.selected = bool_value(tag),
            (Ns::GCal, "timezone") => entry.timezone = string_attr(tag, "value"),
            (Ns::GCal, "overridename") => entry.override_name = string_attr(tag, "value"),
            (Ns::GData, "where") => entry.location = string_attr(tag, "valueString"),
            _ if is_atom(tag, "link")
                && tag.attr("rel") == Some("alternate")
                && tag.attr("type") == Some("application/atom+xml") =>
            {
                entry.alternate_uri = string_attr(tag, "href")
            }
            _ => return Ok(false),
        }
        pull.skip(tag)?;
        Ok(true)
    }
}
