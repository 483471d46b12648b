//! Entry and batch serializers.
//!
//! A serializer is bound to the entity (or batch) it was created for and
//! writes one XML document per [`serialize`](GDataSerializer::serialize)
//! call:
//!
//! - [`event`] - single event entries
//! - [`batch`] - batch request feeds built from per-entity serializers

pub mod batch;
pub mod event;

use std::fmt;
use std::io::Write;
use std::str::FromStr;

use crate::error::GDataError;
use crate::xml::XmlWriter;

pub use batch::BatchSerializer;
pub use event::EventEntrySerializer;

/// Media type of every document written here.
pub const ATOM_CONTENT_TYPE: &str = "application/atom+xml";

/// How much of an entry to write.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SerializeFormat {
    /// New entry for a POST: no id, edit link or server timestamps.
    Create,
    /// Existing entry for a PUT: adds the id and edit link.
    Update,
    /// Everything the entry carries.
    Full,
    /// Entry inside a batch feed, with `batch:operation` and `batch:id`.
    Batch,
}

impl SerializeFormat {
    pub fn as_str(&self) -> &'static str {
        match self {
            SerializeFormat::Create => "create",
            SerializeFormat::Update => "update",
            SerializeFormat::Full => "full",
            SerializeFormat::Batch => "batch",
        }
    }

    /// Id, etag and edit link.
    pub(crate) fn writes_identity(&self) -> bool {
        !matches!(self, SerializeFormat::Create)
    }

    /// Server-maintained fields: timestamps, author, html link.
    pub(crate) fn writes_server_fields(&self) -> bool {
        matches!(self, SerializeFormat::Full)
    }
}

impl fmt::Display for SerializeFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SerializeFormat {
    type Err = GDataError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "create" => Ok(SerializeFormat::Create),
            "update" => Ok(SerializeFormat::Update),
            "full" => Ok(SerializeFormat::Full),
            "batch" => Ok(SerializeFormat::Batch),
            other => Err(GDataError::InvalidArgument(format!(
                "Unknown serialization format '{}'",
                other
            ))),
        }
    }
}

/// A serializer bound to one entity or batch.
pub trait GDataSerializer {
    fn content_type(&self) -> &'static str {
        ATOM_CONTENT_TYPE
    }

    /// Writes one complete XML document to `sink`.
    ///
    /// # Errors
    ///
    /// Returns [`GDataError::Serialize`] if the sink fails.
    fn serialize(&self, sink: &mut dyn Write, format: SerializeFormat) -> Result<(), GDataError>;
}

/// A serializer for a single entry, which can also be embedded in another
/// document.
pub trait EntrySerializer: GDataSerializer {
    /// Writes the `<entry>` element only. Namespace prefixes must already be
    /// declared by the enclosing document.
    fn write_entry(
        &self,
        writer: &mut XmlWriter<'_>,
        format: SerializeFormat,
    ) -> Result<(), GDataError>;
}
