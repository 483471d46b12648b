//! Events feed: the entries of one calendar.

use std::io::BufRead;

use crate::data::{
    Attendee, AttendeeRel, AttendeeStatus, AttendeeType, Entity, EntryBase, EventEntry,
    EventStatus, EventTime, ExtendedProperty, Feed, OriginalEvent, Reminder, ReminderMethod,
    Transparency, Visibility, When,
};
use crate::error::GDataError;
use crate::xml::{Ns, PullParser, StartTag};

use super::atom::{
    bool_value, for_each_child, parse_number, string_attr, wire_value, AtomFeedParser,
    FeedExtensions,
};
use super::ParserKind;

/// Parser for an events feed. This is the default feed kind.
pub type EventsFeedParser<R> = AtomFeedParser<R, EventsFeed>;

/// `gd`/`gCal` extensions of event entries.
#[derive(Debug)]
pub struct EventsFeed;

impl FeedExtensions for EventsFeed {
    type Entry = EventEntry;

    const KIND: ParserKind = ParserKind::EventFeed;

    fn base(entry: &mut EventEntry) -> &mut EntryBase {
        &mut entry.base
    }

    fn into_entity(entry: EventEntry) -> Entity {
        Entity::Event(entry)
    }

    fn feed_element<R: BufRead>(
        pull: &mut PullParser<R>,
        tag: &StartTag,
        feed: &mut Feed,
    ) -> Result<bool, GDataError> {
        if !tag.is(Ns::GCal, "timezone") {
            return Ok(false);
        }
        feed.timezone = string_attr(tag, "value");
        pull.skip(tag)?;
        Ok(true)
    }

    fn entry_element<R: BufRead>(
        pull: &mut PullParser<R>,
        tag: &StartTag,
        entry: &mut EventEntry,
    ) -> Result<bool, GDataError> {
        match (tag.ns, tag.name.as_str()) {
            (Ns::GData, "when") => {
                let when = read_when(pull, tag)?;
                entry.when.push(when);
                return Ok(true);
            }
            (Ns::GData, "who") => {
                let attendee = read_who(pull, tag)?;
                entry.attendees.push(attendee);
                return Ok(true);
            }
            (Ns::GData, "originalEvent") => {
                entry.original_event = Some(read_original_event(pull, tag)?);
                return Ok(true);
            }
            (Ns::GData, "recurrence") => {
                entry.recurrence = Some(pull.read_text(tag)?);
                return Ok(true);
            }
            (Ns::GData, "eventStatus") => {
                entry.status = wire_value(tag, "value", EventStatus::from_wire)
            }
            (Ns::GData, "visibility") => {
                entry.visibility = wire_value(tag, "value", Visibility::from_wire)
            }
            (Ns::GData, "transparency") => {
                entry.transparency = wire_value(tag, "value", Transparency::from_wire)
            }
            (Ns::GData, "where") => {
                // Several gd:where may be present; the first named one wins
                if entry.location.is_none() {
                    entry.location = string_attr(tag, "valueString");
                }
            }
            (Ns::GData, "reminder") => entry.reminders.push(reminder(tag)?),
            (Ns::GData, "extendedProperty") => {
                if let Some(name) = string_attr(tag, "name") {
                    entry.extended_properties.push(ExtendedProperty {
                        name,
                        value: tag.attr("value").unwrap_or_default().to_string(),
                    });
                }
            }
            (Ns::GCal, "sendEventNotifications") => {
                entry.send_event_notifications = bool_value(tag)
            }
            (Ns::GCal, "quickadd") => entry.quick_add = bool_value(tag),
            _ => return Ok(false),
        }
        pull.skip(tag)?;
        Ok(true)
    }
}

fn event_time(tag: &StartTag, attr: &str) -> Result<Option<EventTime>, GDataError> {
    tag.attr(attr).map(EventTime::parse).transpose()
}

fn read_when<R: BufRead>(pull: &mut PullParser<R>, tag: &StartTag) -> Result<When, GDataError> {
    let start = event_time(tag, "startTime")?
        .ok_or_else(|| GDataError::malformed("gd:when is missing startTime"))?;
    let mut when = When {
        start,
        end: event_time(tag, "endTime")?,
        reminders: Vec::new(),
    };

    for_each_child(pull, tag, |pull, child| {
        if child.is(Ns::GData, "reminder") {
            when.reminders.push(reminder(&child)?);
        }
        pull.skip(&child)
    })?;
    Ok(when)
}

fn reminder(tag: &StartTag) -> Result<Reminder, GDataError> {
    let number = |name: &str| tag.attr(name).map(parse_number::<u32>).transpose();
    Ok(Reminder {
        days: number("days")?,
        hours: number("hours")?,
        minutes: number("minutes")?,
        method: wire_value(tag, "method", ReminderMethod::from_wire),
    })
}

fn read_who<R: BufRead>(pull: &mut PullParser<R>, tag: &StartTag) -> Result<Attendee, GDataError> {
    let mut attendee = Attendee {
        email: string_attr(tag, "email"),
        name: string_attr(tag, "valueString"),
        rel: wire_value(tag, "rel", AttendeeRel::from_wire),
        ..Attendee::default()
    };

    for_each_child(pull, tag, |pull, child| {
        match (child.ns, child.name.as_str()) {
            (Ns::GData, "attendeeStatus") => {
                attendee.status = wire_value(&child, "value", AttendeeStatus::from_wire)
            }
            (Ns::GData, "attendeeType") => {
                attendee.attendee_type = wire_value(&child, "value", AttendeeType::from_wire)
            }
            _ => {}
        }
        pull.skip(&child)
    })?;
    Ok(attendee)
}

fn read_original_event<R: BufRead>(
    pull: &mut PullParser<R>,
    tag: &StartTag,
) -> Result<OriginalEvent, GDataError> {
    let mut original = OriginalEvent {
        id: string_attr(tag, "id"),
        href: string_attr(tag, "href"),
        original_start: None,
    };

    for_each_child(pull, tag, |pull, child| {
        if child.is(Ns::GData, "when") {
            original.original_start = event_time(&child, "startTime")?;
        }
        pull.skip(&child)
    })?;
    Ok(original)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::{Entries, GDataParser};
    use crate::xml::{QuickXmlEngine, XmlEngine};
    use pretty_assertions::assert_eq;

    const EVENTS_FEED: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<feed xmlns="http://www.w3.org/2005/Atom"
      xmlns:openSearch="http://a9.com/-/spec/opensearch/1.1/"
      xmlns:gCal="http://schemas.google.com/gCal/2005"
      xmlns:gd="http://schemas.google.com/g/2005">
  <id>http://www.google.com/calendar/feeds/jo%40example.com/private/full</id>
  <title>Jo</title>
  <link rel="http://schemas.google.com/g/2005#batch" type="application/atom+xml"
        href="https://www.google.com/calendar/feeds/jo%40example.com/private/full/batch"/>
  <link rel="next" type="application/atom+xml"
        href="https://www.google.com/calendar/feeds/jo%40example.com/private/full?start-index=26"/>
  <gCal:timezone value="America/Los_Angeles"/>
  <openSearch:totalResults>3</openSearch:totalResults>
  <openSearch:itemsPerPage>25</openSearch:itemsPerPage>
  <entry gd:etag="&quot;FkkOQgZGeip7ImA6WhVR&quot;">
    <id>http://www.google.com/calendar/feeds/jo%40example.com/private/full/e1</id>
    <published>2009-03-10T09:00:00.000Z</published>
    <updated>2009-03-11T10:15:00.000Z</updated>
    <category scheme="http://schemas.google.com/g/2005#kind"
              term="http://schemas.google.com/g/2005#event"/>
    <title type="text">Tennis with Beth</title>
    <content type="text">Meet for a quick lesson.</content>
    <link rel="alternate" type="text/html" href="https://www.google.com/calendar/event?eid=e1"/>
    <link rel="edit" type="application/atom+xml"
          href="https://www.google.com/calendar/feeds/jo%40example.com/private/full/e1"/>
    <author><name>Jo March</name><email>jo@example.com</email></author>
    <gd:eventStatus value="http://schemas.google.com/g/2005#event.confirmed"/>
    <gd:visibility value="http://schemas.google.com/g/2005#event.private"/>
    <gd:transparency value="http://schemas.google.com/g/2005#event.opaque"/>
    <gd:when startTime="2009-04-17T15:00:00.000Z" endTime="2009-04-17T17:00:00.000Z">
      <gd:reminder minutes="10" method="alert"/>
      <gd:reminder hours="1" method="email"/>
    </gd:when>
    <gd:where valueString="Rolling Lawn Courts"/>
    <gd:who email="jo@example.com" rel="http://schemas.google.com/g/2005#event.organizer" valueString="Jo March">
      <gd:attendeeStatus value="http://schemas.google.com/g/2005#event.accepted"/>
    </gd:who>
    <gd:who email="beth@example.com" rel="http://schemas.google.com/g/2005#event.attendee">
      <gd:attendeeStatus value="http://schemas.google.com/g/2005#event.invited"/>
      <gd:attendeeType value="http://schemas.google.com/g/2005#event.optional"/>
    </gd:who>
    <gCal:sendEventNotifications value="true"/>
    <gd:extendedProperty name="sync-id" value="42"/>
  </entry>
  <entry>
    <id>http://www.google.com/calendar/feeds/jo%40example.com/private/full/e2</id>
    <title>Weekly review</title>
    <gd:recurrence>DTSTART;VALUE=DATE:20090420
RRULE:FREQ=WEEKLY</gd:recurrence>
    <gd:reminder days="1" method="sms"/>
    <gd:eventStatus value="http://schemas.google.com/g/2005#event.unheardOf"/>
  </entry>
  <entry>
    <id>http://www.google.com/calendar/feeds/jo%40example.com/private/full/e2_20090427</id>
    <title>Weekly review (moved)</title>
    <gd:deleted/>
    <gd:originalEvent id="e2" href="http://www.google.com/calendar/feeds/jo%40example.com/private/full/e2">
      <gd:when startTime="2009-04-27"/>
    </gd:originalEvent>
    <gd:when startTime="2009-04-28" endTime="2009-04-29"/>
  </entry>
</feed>"#;

    fn parser(xml: &str) -> EventsFeedParser<&[u8]> {
        let pull = QuickXmlEngine::default()
            .create_parser()
            .unwrap()
            .bind(xml.as_bytes());
        EventsFeedParser::new(pull)
    }

    fn events(xml: &str) -> Vec<EventEntry> {
        let mut p = parser(xml);
        Entries::new(&mut p)
            .map(|r| match r.unwrap() {
                Entity::Event(e) => e,
                other => panic!("expected an event, got {:?}", other),
            })
            .collect()
    }

    #[test]
    fn test_parses_envelope() {
        let mut p = parser(EVENTS_FEED);
        let feed = p.parse_feed_envelope().unwrap();

        assert_eq!(feed.timezone.as_deref(), Some("America/Los_Angeles"));
        assert_eq!(feed.total_results, Some(3));
        assert_eq!(feed.items_per_page, Some(25));
        assert!(feed.batch_url.as_deref().unwrap().ends_with("/batch"));
        assert!(feed.next_url.as_deref().unwrap().contains("start-index=26"));
    }

    #[test]
    fn test_parses_full_event() {
        let events = events(EVENTS_FEED);
        assert_eq!(events.len(), 3);

        let tennis = &events[0];
        assert_eq!(tennis.base.title.as_deref(), Some("Tennis with Beth"));
        assert_eq!(tennis.base.content.as_deref(), Some("Meet for a quick lesson."));
        assert_eq!(tennis.base.title_type, Some(crate::data::TextType::Text));
        assert_eq!(tennis.base.content_type, Some(crate::data::TextType::Text));
        assert_eq!(events[1].base.title_type, None);
        assert_eq!(
            tennis.base.category.as_deref(),
            Some("http://schemas.google.com/g/2005#event")
        );
        assert_eq!(
            tennis.base.html_uri.as_deref(),
            Some("https://www.google.com/calendar/event?eid=e1")
        );
        assert_eq!(tennis.base.etag.as_deref(), Some("\"FkkOQgZGeip7ImA6WhVR\""));
        assert_eq!(tennis.status, Some(EventStatus::Confirmed));
        assert_eq!(tennis.visibility, Some(Visibility::Private));
        assert_eq!(tennis.transparency, Some(Transparency::Opaque));
        assert_eq!(tennis.location.as_deref(), Some("Rolling Lawn Courts"));
        assert!(tennis.send_event_notifications);
        assert!(!tennis.quick_add);

        assert_eq!(tennis.when.len(), 1);
        let when = &tennis.when[0];
        assert_eq!(when.start.to_string(), "2009-04-17T15:00:00.000Z");
        assert_eq!(
            when.reminders,
            vec![
                Reminder {
                    minutes: Some(10),
                    method: Some(ReminderMethod::Alert),
                    ..Reminder::default()
                },
                Reminder {
                    hours: Some(1),
                    method: Some(ReminderMethod::Email),
                    ..Reminder::default()
                },
            ]
        );

        assert_eq!(
            tennis.attendees,
            vec![
                Attendee {
                    email: Some("jo@example.com".to_string()),
                    name: Some("Jo March".to_string()),
                    rel: Some(AttendeeRel::Organizer),
                    status: Some(AttendeeStatus::Accepted),
                    attendee_type: None,
                },
                Attendee {
                    email: Some("beth@example.com".to_string()),
                    name: None,
                    rel: Some(AttendeeRel::Attendee),
                    status: Some(AttendeeStatus::Invited),
                    attendee_type: Some(AttendeeType::Optional),
                },
            ]
        );
        assert_eq!(
            tennis.extended_properties,
            vec![ExtendedProperty {
                name: "sync-id".to_string(),
                value: "42".to_string()
            }]
        );
    }

    #[test]
    fn test_parses_recurring_event_and_exception() {
        let events = events(EVENTS_FEED);

        let weekly = &events[1];
        assert_eq!(
            weekly.recurrence.as_deref(),
            Some("DTSTART;VALUE=DATE:20090420\nRRULE:FREQ=WEEKLY")
        );
        assert_eq!(weekly.reminders[0].days, Some(1));
        assert_eq!(weekly.reminders[0].method, Some(ReminderMethod::Sms));
        // Unknown status values are dropped
        assert_eq!(weekly.status, None);
        assert!(weekly.when.is_empty());

        let moved = &events[2];
        assert!(moved.base.deleted);
        let original = moved.original_event.as_ref().unwrap();
        assert_eq!(original.id.as_deref(), Some("e2"));
        assert_eq!(
            original.original_start,
            Some(EventTime::parse("2009-04-27").unwrap())
        );
        assert!(moved.when[0].start.is_all_day());
        assert_eq!(moved.when[0].end.unwrap().to_string(), "2009-04-29");
    }

    #[test]
    fn test_standalone_entry() {
        let xml = r#"<entry xmlns="http://www.w3.org/2005/Atom"
                           xmlns:gd="http://schemas.google.com/g/2005"
                           xmlns:batch="http://schemas.google.com/gdata/batch">
            <id>e9</id>
            <title>Dentist</title>
            <batch:id>item-1</batch:id>
            <batch:operation type="insert"/>
            <batch:status code="201" reason="Created"/>
            <gd:when startTime="2009-05-01T08:00:00.000-07:00"/>
        </entry>"#;
        let mut p = parser(xml);
        let Entity::Event(event) = p.parse_standalone_entry().unwrap() else {
            panic!("expected an event");
        };
        assert_eq!(event.base.id.as_deref(), Some("e9"));

        let batch = event.base.batch.unwrap();
        assert_eq!(batch.id.as_deref(), Some("item-1"));
        assert_eq!(batch.operation, Some(crate::data::BatchOperation::Insert));
        let status = batch.status.unwrap();
        assert_eq!(status.code, 201);
        assert_eq!(status.reason.as_deref(), Some("Created"));

        // The stream is consumed
        assert!(p.parse_feed_envelope().is_err());
        assert!(p.parse_standalone_entry().is_err());
    }

    #[test]
    fn test_missing_start_time_is_malformed() {
        let xml = r#"<feed xmlns="http://www.w3.org/2005/Atom" xmlns:gd="http://schemas.google.com/g/2005">
            <entry><gd:when endTime="2009-04-17"/></entry>
            <entry><title>never reached</title></entry>
        </feed>"#;
        let mut p = parser(xml);
        let results: Vec<_> = Entries::new(&mut p).collect();
        assert_eq!(results.len(), 1);
        let err = results.into_iter().next().unwrap().unwrap_err();
        assert!(err.to_string().contains("startTime"));
    }

    #[test]
    fn test_truncated_document_is_malformed() {
        let xml = r#"<feed xmlns="http://www.w3.org/2005/Atom"><entry><title>Half"#;
        let mut p = parser(xml);
        assert!(p.read_next_entry().is_err());
        assert!(p.read_next_entry().unwrap().is_none());
    }
}
