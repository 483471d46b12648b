//! Batch request feeds.
//!
//! A batch feed is an Atom `<feed>` whose entries each carry a
//! `batch:operation`. The batch serializer knows nothing about entry types:
//! it asks the factory that created it for a serializer per entity, so the
//! single-entity dispatch decides what a batch may contain.

use std::io::Write;

use crate::data::Entity;
use crate::error::GDataError;
use crate::factory::GDataParserFactory;
use crate::xml::{WriterConfig, ATOM_NS, BATCH_NS, GCAL_NS, GD_NS};

use super::{GDataSerializer, SerializeFormat};

/// Serializer over an ordered slice of entities.
///
/// Entries are written in input order, none skipped or merged. Output is
/// buffered: if any entity cannot be serialized, nothing reaches the sink.
pub struct BatchSerializer<'a, F> {
    factory: &'a F,
    config: WriterConfig,
    entries: &'a [Entity],
}

impl<'a, F: GDataParserFactory> BatchSerializer<'a, F> {
    pub fn new(factory: &'a F, config: WriterConfig, entries: &'a [Entity]) -> Self {
        Self {
            factory,
            config,
            entries,
        }
    }

    pub fn entries(&self) -> &'a [Entity] {
        self.entries
    }
}

impl<F: GDataParserFactory> GDataSerializer for BatchSerializer<'_, F> {
    /// Writes the batch feed. Only [`SerializeFormat::Batch`] is accepted.
    fn serialize(&self, sink: &mut dyn Write, format: SerializeFormat) -> Result<(), GDataError> {
        if format != SerializeFormat::Batch {
            return Err(GDataError::InvalidArgument(format!(
                "batch feeds must be written in batch format, not {}",
                format
            )));
        }

        // Resolve every entry first so an unsupported entity fails before any output
        let serializers = self
            .entries
            .iter()
            .enumerate()
            .map(|(index, entity)| {
                self.factory.create_serializer(entity).inspect_err(|e| {
                    tracing::debug!(index, kind = %entity.kind(), error = %e, "Batch entry rejected");
                })
            })
            .collect::<Result<Vec<_>, _>>()?;

        let mut buf = Vec::new();
        {
            let mut w = self.config.bind(&mut buf);
            w.declaration()?;
            w.start(
                "feed",
                &[
                    ("xmlns", ATOM_NS),
                    ("xmlns:gd", GD_NS),
                    ("xmlns:gCal", GCAL_NS),
                    ("xmlns:batch", BATCH_NS),
                ],
            )?;
            for serializer in &serializers {
                serializer.write_entry(&mut w, SerializeFormat::Batch)?;
            }
            w.end("feed")?;
        }

        sink.write_all(&buf).map_err(GDataError::write_failed)?;
        sink.flush().map_err(GDataError::write_failed)?;

        tracing::debug!(entries = serializers.len(), bytes = buf.len(), "Serialized batch feed");
        Ok(())
    }
}
