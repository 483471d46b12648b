//! Batch feeds: ordering, atomicity and round trips through the events parser.

use std::io::{self, Write};

use gdata_calendar::data::{
    BatchInfo, BatchOperation, CalendarEntry, CalendarLink, EntryBase, EventEntry, EventTime,
    When,
};
use gdata_calendar::{
    CalendarParserFactory, Entity, Entries, GDataError, GDataParserFactory, GDataSerializer,
    SerializeFormat,
};
use pretty_assertions::assert_eq;
use proptest::prelude::*;

fn event(id: &str, title: &str) -> Entity {
    Entity::Event(EventEntry {
        base: EntryBase {
            id: Some(id.to_string()),
            title: Some(title.to_string()),
            batch: Some(BatchInfo {
                operation: Some(BatchOperation::Update),
                id: Some(format!("batch-{}", id)),
                status: None,
            }),
            ..EntryBase::default()
        },
        when: vec![When {
            start: EventTime::parse("2009-04-17").unwrap(),
            end: None,
            reminders: Vec::new(),
        }],
        ..EventEntry::default()
    })
}

fn write_batch(factory: &CalendarParserFactory, entries: &[Entity]) -> Result<Vec<u8>, GDataError> {
    let mut out = Vec::new();
    factory
        .create_batch_serializer(entries)?
        .serialize(&mut out, SerializeFormat::Batch)?;
    Ok(out)
}

fn read_titles(factory: &CalendarParserFactory, xml: &[u8]) -> Vec<Option<String>> {
    let mut parser = factory.create_default_feed_parser(xml).unwrap();
    Entries::new(&mut parser)
        .map(|e| e.unwrap().base().unwrap().title.clone())
        .collect()
}

/// Sink that refuses every write.
struct ClosedSink;

impl Write for ClosedSink {
    fn write(&mut self, _buf: &[u8]) -> io::Result<usize> {
        Err(io::Error::new(io::ErrorKind::BrokenPipe, "closed"))
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

#[test]
fn test_entries_written_in_input_order() {
    let factory = CalendarParserFactory::default();
    let entries = [event("e1", "First"), event("e2", "Second"), event("e3", "Third")];

    let xml = String::from_utf8(write_batch(&factory, &entries).unwrap()).unwrap();

    let positions: Vec<usize> = ["<id>e1</id>", "<id>e2</id>", "<id>e3</id>"]
        .iter()
        .map(|needle| xml.find(needle).unwrap())
        .collect();
    assert!(positions.windows(2).all(|w| w[0] < w[1]), "{}", xml);
    assert_eq!(xml.matches("<entry>").count(), 3);
    assert_eq!(xml.matches("<batch:operation type=\"update\"/>").count(), 3);
    assert!(xml.contains("<batch:id>batch-e2</batch:id>"));
}

#[test]
fn test_batch_parses_back_with_batch_info() {
    let factory = CalendarParserFactory::default();
    let entries = [event("e1", "First"), event("e2", "Second")];
    let xml = write_batch(&factory, &entries).unwrap();

    let mut parser = factory.create_default_feed_parser(&xml[..]).unwrap();
    let parsed: Vec<Entity> = Entries::new(&mut parser)
        .collect::<Result<_, _>>()
        .unwrap();

    assert_eq!(parsed.len(), 2);
    for (original, parsed) in entries.iter().zip(&parsed) {
        let (Entity::Event(original), Entity::Event(parsed)) = (original, parsed) else {
            panic!("expected events");
        };
        assert_eq!(parsed.base.id, original.base.id);
        assert_eq!(parsed.base.title, original.base.title);
        assert_eq!(parsed.base.batch, original.base.batch);
        assert_eq!(parsed.when, original.when);
    }
}

#[test]
fn test_duplicates_are_kept() {
    let factory = CalendarParserFactory::default();
    let entries = [event("e1", "Same"), event("e1", "Same")];
    let xml = write_batch(&factory, &entries).unwrap();
    assert_eq!(
        read_titles(&factory, &xml),
        vec![Some("Same".to_string()), Some("Same".to_string())]
    );
}

#[test]
fn test_unsupported_entity_writes_nothing() {
    let factory = CalendarParserFactory::default();

    for unsupported in [
        Entity::CalendarLink(CalendarLink::default()),
        Entity::Calendar(CalendarEntry::default()),
    ] {
        let entries = [event("e1", "First"), unsupported, event("e3", "Third")];
        let batch = factory.create_batch_serializer(&entries).unwrap();

        let mut out = Vec::new();
        let err = batch
            .serialize(&mut out, SerializeFormat::Batch)
            .unwrap_err();
        assert!(err.is_invalid_argument());
        assert_eq!(out.len(), 0);
    }
}

#[test]
fn test_sink_failure_is_serialize_error() {
    let factory = CalendarParserFactory::default();
    let entries = [event("e1", "First")];
    let batch = factory.create_batch_serializer(&entries).unwrap();

    let err = batch
        .serialize(&mut ClosedSink, SerializeFormat::Batch)
        .unwrap_err();
    assert!(matches!(err, GDataError::Serialize { .. }));
    let cause = std::error::Error::source(&err)
        .and_then(|s| s.downcast_ref::<io::Error>())
        .unwrap();
    assert_eq!(cause.kind(), io::ErrorKind::BrokenPipe);
}

proptest! {
    #[test]
    fn prop_batch_preserves_order(titles in prop::collection::vec("[A-Za-z][A-Za-z0-9&<>]{0,15}", 0..8)) {
        let factory = CalendarParserFactory::default();
        let entries: Vec<Entity> = titles
            .iter()
            .enumerate()
            .map(|(i, title)| event(&format!("e{}", i), title))
            .collect();

        let xml = write_batch(&factory, &entries).unwrap();
        let expected: Vec<Option<String>> = titles.into_iter().map(Some).collect();
        prop_assert_eq!(read_titles(&factory, &xml), expected);
    }
}
