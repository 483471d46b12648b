//! Event entry serializer.

use std::io::Write;

use crate::data::{
    format_timestamp, Attendee, BatchOperation, EventEntry, Reminder, TextType, When,
};
use crate::error::GDataError;
use crate::xml::{WriterConfig, XmlWriter, ATOM_NS, BATCH_NS, GCAL_NS, GD_NS, XHTML_NS};

use super::{EntrySerializer, GDataSerializer, SerializeFormat, ATOM_CONTENT_TYPE};

pub(crate) const KIND_SCHEME: &str = "http://schemas.google.com/g/2005#kind";
pub(crate) const EVENT_KIND: &str = "http://schemas.google.com/g/2005#event";

/// Writes one [`EventEntry`] as an Atom `<entry>`.
#[derive(Debug, Clone, Copy)]
pub struct EventEntrySerializer<'e> {
    config: WriterConfig,
    entry: &'e EventEntry,
}

impl<'e> EventEntrySerializer<'e> {
    pub fn new(config: WriterConfig, entry: &'e EventEntry) -> Self {
        Self { config, entry }
    }

    pub fn entry(&self) -> &'e EventEntry {
        self.entry
    }

    fn write(
        &self,
        w: &mut XmlWriter<'_>,
        format: SerializeFormat,
        namespaces: &[(&str, &str)],
    ) -> Result<(), GDataError> {
        let entry = self.entry;
        let base = &entry.base;

        let mut attrs = namespaces.to_vec();
        if format.writes_identity() {
            if let Some(etag) = base.etag.as_deref() {
                attrs.push(("gd:etag", etag));
            }
        }
        w.start("entry", &attrs)?;

        if format == SerializeFormat::Batch {
            let batch = base.batch.as_ref();
            let operation = batch
                .and_then(|b| b.operation)
                .unwrap_or(BatchOperation::Insert);
            w.optional_text_element("batch:id", batch.and_then(|b| b.id.as_deref()))?;
            w.empty("batch:operation", &[("type", operation.as_str())])?;

            // Deletes and queries only identify the target entry
            if matches!(operation, BatchOperation::Delete | BatchOperation::Query) {
                w.optional_text_element("id", base.id.as_deref())?;
                write_link(w, "edit", base.edit_uri.as_deref(), ATOM_CONTENT_TYPE)?;
                return w.end("entry");
            }
        }

        if format.writes_identity() {
            w.optional_text_element("id", base.id.as_deref())?;
        }
        if format.writes_server_fields() {
            if let Some(published) = &base.published {
                w.text_element("published", &format_timestamp(published))?;
            }
            if let Some(updated) = &base.updated {
                w.text_element("updated", &format_timestamp(updated))?;
            }
        }
        w.empty("category", &[("scheme", KIND_SCHEME), ("term", EVENT_KIND)])?;
        write_text_construct(w, "title", base.title.as_deref(), base.title_type)?;
        write_text_construct(w, "summary", base.summary.as_deref(), base.summary_type)?;
        write_text_construct(w, "content", base.content.as_deref(), base.content_type)?;

        if format.writes_server_fields() {
            write_link(w, "alternate", base.html_uri.as_deref(), "text/html")?;
        }
        if format.writes_identity() {
            write_link(w, "edit", base.edit_uri.as_deref(), ATOM_CONTENT_TYPE)?;
        }
        if format.writes_server_fields() {
            if base.author.is_some() || base.email.is_some() {
                w.start("author", &[])?;
                w.optional_text_element("name", base.author.as_deref())?;
                w.optional_text_element("email", base.email.as_deref())?;
                w.end("author")?;
            }
            if base.deleted {
                w.empty("gd:deleted", &[])?;
            }
        }

        if let Some(status) = entry.status {
            w.value_element("gd:eventStatus", status.as_str())?;
        }
        if let Some(visibility) = entry.visibility {
            w.value_element("gd:visibility", visibility.as_str())?;
        }
        if let Some(transparency) = entry.transparency {
            w.value_element("gd:transparency", transparency.as_str())?;
        }
        for when in &entry.when {
            write_when(w, when)?;
        }
        if let Some(location) = entry.location.as_deref() {
            w.empty("gd:where", &[("valueString", location)])?;
        }
        for attendee in &entry.attendees {
            write_who(w, attendee)?;
        }
        w.optional_text_element("gd:recurrence", entry.recurrence.as_deref())?;
        for reminder in &entry.reminders {
            write_reminder(w, reminder)?;
        }
        if let Some(original) = &entry.original_event {
            let mut attrs = Vec::new();
            if let Some(id) = original.id.as_deref() {
                attrs.push(("id", id));
            }
            if let Some(href) = original.href.as_deref() {
                attrs.push(("href", href));
            }
            match original.original_start {
                Some(start) => {
                    let start = start.to_string();
                    w.start("gd:originalEvent", &attrs)?;
                    w.empty("gd:when", &[("startTime", start.as_str())])?;
                    w.end("gd:originalEvent")?;
                }
                None => w.empty("gd:originalEvent", &attrs)?,
            }
        }
        if entry.send_event_notifications {
            w.value_element("gCal:sendEventNotifications", "true")?;
        }
        if entry.quick_add {
            w.value_element("gCal:quickadd", "true")?;
        }
        for property in &entry.extended_properties {
            w.empty(
                "gd:extendedProperty",
                &[
                    ("name", property.name.as_str()),
                    ("value", property.value.as_str()),
                ],
            )?;
        }

        w.end("entry")
    }
}

impl GDataSerializer for EventEntrySerializer<'_> {
    fn serialize(&self, sink: &mut dyn Write, format: SerializeFormat) -> Result<(), GDataError> {
        let mut namespaces = vec![("xmlns", ATOM_NS), ("xmlns:gd", GD_NS), ("xmlns:gCal", GCAL_NS)];
        if format == SerializeFormat::Batch {
            namespaces.push(("xmlns:batch", BATCH_NS));
        }

        let mut w = self.config.bind(sink);
        w.declaration()?;
        self.write(&mut w, format, &namespaces)?;

        tracing::debug!(%format, id = ?self.entry.base.id, "Serialized event entry");
        Ok(())
    }
}

impl EntrySerializer for EventEntrySerializer<'_> {
    fn write_entry(
        &self,
        writer: &mut XmlWriter<'_>,
        format: SerializeFormat,
    ) -> Result<(), GDataError> {
        self.write(writer, format, &[])
    }
}

/// Atom text construct, skipped when empty. An `xhtml` value is written as
/// markup inside the xhtml `<div>`.
fn write_text_construct(
    w: &mut XmlWriter<'_>,
    name: &str,
    text: Option<&str>,
    kind: Option<TextType>,
) -> Result<(), GDataError> {
    let text = match text {
        Some(t) if !t.is_empty() => t,
        _ => return Ok(()),
    };
    match kind {
        None => w.text_element(name, text),
        Some(TextType::Xhtml) => {
            w.start(name, &[("type", TextType::Xhtml.as_str())])?;
            w.start("div", &[("xmlns", XHTML_NS)])?;
            w.raw(text)?;
            w.end("div")?;
            w.end(name)
        }
        Some(kind) => {
            w.start(name, &[("type", kind.as_str())])?;
            w.text(text)?;
            w.end(name)
        }
    }
}

fn write_link(
    w: &mut XmlWriter<'_>,
    rel: &str,
    href: Option<&str>,
    media_type: &str,
) -> Result<(), GDataError> {
    match href {
        Some(href) if !href.is_empty() => {
            w.empty("link", &[("rel", rel), ("type", media_type), ("href", href)])
        }
        _ => Ok(()),
    }
}

fn write_when(w: &mut XmlWriter<'_>, when: &When) -> Result<(), GDataError> {
    let start = when.start.to_string();
    let end = when.end.map(|end| end.to_string());

    let mut attrs = vec![("startTime", start.as_str())];
    if let Some(end) = end.as_deref() {
        attrs.push(("endTime", end));
    }
    if when.reminders.is_empty() {
        return w.empty("gd:when", &attrs);
    }

    w.start("gd:when", &attrs)?;
    for reminder in &when.reminders {
        write_reminder(w, reminder)?;
    }
    w.end("gd:when")
}

fn write_reminder(w: &mut XmlWriter<'_>, reminder: &Reminder) -> Result<(), GDataError> {
    let days = reminder.days.map(|v| v.to_string());
    let hours = reminder.hours.map(|v| v.to_string());
    let minutes = reminder.minutes.map(|v| v.to_string());

    let mut attrs = Vec::new();
    if let Some(days) = days.as_deref() {
        attrs.push(("days", days));
    }
    if let Some(hours) = hours.as_deref() {
        attrs.push(("hours", hours));
    }
    if let Some(minutes) = minutes.as_deref() {
        attrs.push(("minutes", minutes));
    }
    if let Some(method) = reminder.method {
        attrs.push(("method", method.as_str()));
    }
    w.empty("gd:reminder", &attrs)
}

fn write_who(w: &mut XmlWriter<'_>, attendee: &Attendee) -> Result<(), GDataError> {
    let mut attrs = Vec::new();
    if let Some(email) = attendee.email.as_deref() {
        attrs.push(("email", email));
    }
    if let Some(rel) = attendee.rel {
        attrs.push(("rel", rel.as_str()));
    }
    if let Some(name) = attendee.name.as_deref() {
        attrs.push(("valueString", name));
    }
    if attendee.status.is_none() && attendee.attendee_type.is_none() {
        return w.empty("gd:who", &attrs);
    }

    w.start("gd:who", &attrs)?;
    if let Some(status) = attendee.status {
        w.value_element("gd:attendeeStatus", status.as_str())?;
    }
    if let Some(kind) = attendee.attendee_type {
        w.value_element("gd:attendeeType", kind.as_str())?;
    }
    w.end("gd:who")
}
