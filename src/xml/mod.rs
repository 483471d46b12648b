//! Streaming XML engine used by every parser and serializer.
//!
//! The factories never talk to `quick-xml` directly. They ask an
//! [`XmlEngine`] for an unbound handle ([`ParserConfig`] or
//! [`WriterConfig`]) and bind that handle to the caller's stream or sink:
//!
//! - [`pull`] - namespace-aware pull parser producing owned events
//! - [`writer`] - thin element writer over `quick_xml::Writer`
//!
//! Handing out a handle can fail (an encoding the engine cannot speak, an
//! indent character it cannot emit). Those failures are [`EngineError`]s;
//! the factories wrap them before they reach callers.

mod pull;
mod writer;

pub use pull::{PullParser, StartTag, XmlAttribute, XmlEvent};
pub use writer::XmlWriter;

use std::fmt;
use std::io::{BufRead, Write};

use quick_xml::reader::Config as ReaderConfig;

use crate::config::{Config, ParserSettings, SerializerSettings};
use crate::error::EngineError;

pub const ATOM_NS: &str = "http://www.w3.org/2005/Atom";
pub const GD_NS: &str = "http://schemas.google.com/g/2005";
pub const GCAL_NS: &str = "http://schemas.google.com/gCal/2005";
pub const BATCH_NS: &str = "http://schemas.google.com/gdata/batch";
pub const OPENSEARCH_NS: &str = "http://a9.com/-/spec/opensearch/1.1/";
pub const XHTML_NS: &str = "http://www.w3.org/1999/xhtml";

/// Namespaces the parsers care about, resolved from the document's bindings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Ns {
    /// No namespace (unprefixed attributes, documents without `xmlns`).
    None,
    Atom,
    GData,
    GCal,
    Batch,
    OpenSearch,
    Xhtml,
    /// Bound to a namespace we do not interpret, or to an unknown prefix.
    Other,
}

impl Ns {
    pub(crate) fn from_uri(uri: &[u8]) -> Self {
        match uri {
            u if u == ATOM_NS.as_bytes() => Ns::Atom,
            u if u == GD_NS.as_bytes() => Ns::GData,
            u if u == GCAL_NS.as_bytes() => Ns::GCal,
            u if u == BATCH_NS.as_bytes() => Ns::Batch,
            u if u == OPENSEARCH_NS.as_bytes() => Ns::OpenSearch,
            u if u == XHTML_NS.as_bytes() => Ns::Xhtml,
            _ => Ns::Other,
        }
    }
}

// ============================================================================
// Engine
// ============================================================================

/// Provider of pull parsers and writers.
///
/// Implementations are immutable after construction and shared by every
/// parse/serialize call made through a factory.
pub trait XmlEngine: Send + Sync + fmt::Debug {
    /// Returns a parser handle, not yet bound to a stream.
    fn create_parser(&self) -> Result<ParserConfig, EngineError>;

    /// Returns a writer handle, not yet bound to a sink.
    fn create_serializer(&self) -> Result<WriterConfig, EngineError>;
}

/// Unbound pull parser produced by an [`XmlEngine`].
#[derive(Debug, Clone)]
pub struct ParserConfig {
    reader: ReaderConfig,
    max_depth: usize,
}

impl ParserConfig {
    /// Bind the parser to a forward-only byte stream. Nothing is read yet.
    pub fn bind<R: BufRead>(self, stream: R) -> PullParser<R> {
        PullParser::new(stream, self.reader, self.max_depth)
    }
}

/// Unbound writer produced by an [`XmlEngine`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WriterConfig {
    indent: Option<(u8, usize)>,
}

impl WriterConfig {
    pub fn bind<'w>(&self, sink: &'w mut dyn Write) -> XmlWriter<'w> {
        XmlWriter::new(sink, self.indent)
    }
}

/// The `quick-xml` backed engine.
#[derive(Debug, Clone, Default)]
pub struct QuickXmlEngine {
    parser: ParserSettings,
    serializer: SerializerSettings,
}

impl QuickXmlEngine {
    pub fn new(parser: ParserSettings, serializer: SerializerSettings) -> Self {
        Self { parser, serializer }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(config.parser.clone(), config.serializer.clone())
    }
}

impl XmlEngine for QuickXmlEngine {
    fn create_parser(&self) -> Result<ParserConfig, EngineError> {
        check_encoding(&self.parser.encoding)?;

        // SEC-002: quick-xml never expands <!ENTITY> declarations; custom
        // entity references fail to unescape instead of being resolved.
        let mut reader = ReaderConfig::default();
        reader.trim_text(self.parser.trim_text);
        reader.check_end_names = self.parser.check_end_names;

        Ok(ParserConfig {
            reader,
            max_depth: self.parser.max_depth,
        })
    }

    fn create_serializer(&self) -> Result<WriterConfig, EngineError> {
        check_encoding(&self.serializer.encoding)?;

        let indent_char = match self.serializer.indent_char {
            ' ' => b' ',
            '\t' => b'\t',
            other => return Err(EngineError::InvalidIndent(other)),
        };
        let indent = (self.serializer.indent > 0).then_some((indent_char, self.serializer.indent));

        Ok(WriterConfig { indent })
    }
}

fn check_encoding(encoding: &str) -> Result<(), EngineError> {
    if encoding.eq_ignore_ascii_case("utf-8") || encoding.eq_ignore_ascii_case("utf8") {
        Ok(())
    } else {
        Err(EngineError::UnsupportedEncoding(encoding.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_engine_creates_handles() {
        let engine = QuickXmlEngine::default();
        assert!(engine.create_parser().is_ok());
        assert_eq!(
            engine.create_serializer().unwrap(),
            WriterConfig { indent: None }
        );
    }

    #[test]
    fn test_encoding_is_case_insensitive() {
        assert!(check_encoding("utf-8").is_ok());
        assert!(check_encoding("UTF8").is_ok());
    }

    #[test]
    fn test_unsupported_encoding_rejected() {
        let engine = QuickXmlEngine::new(
            ParserSettings {
                encoding: "ISO-8859-1".to_string(),
                ..ParserSettings::default()
            },
            SerializerSettings::default(),
        );

        let err = engine.create_parser().unwrap_err();
        assert_eq!(err, EngineError::UnsupportedEncoding("ISO-8859-1".to_string()));
        // The writer side is configured separately
        assert!(engine.create_serializer().is_ok());
    }

    #[test]
    fn test_indent_settings() {
        let engine = QuickXmlEngine::new(
            ParserSettings::default(),
            SerializerSettings {
                indent: 4,
                indent_char: '\t',
                ..SerializerSettings::default()
            },
        );
        assert_eq!(
            engine.create_serializer().unwrap(),
            WriterConfig {
                indent: Some((b'\t', 4))
            }
        );
    }

    #[test]
    fn test_invalid_indent_char_rejected() {
        let engine = QuickXmlEngine::new(
            ParserSettings::default(),
            SerializerSettings {
                indent: 2,
                indent_char: '-',
                ..SerializerSettings::default()
            },
        );
        assert_eq!(
            engine.create_serializer().unwrap_err(),
            EngineError::InvalidIndent('-')
        );
    }

    #[test]
    fn test_namespace_lookup() {
        assert_eq!(Ns::from_uri(ATOM_NS.as_bytes()), Ns::Atom);
        assert_eq!(Ns::from_uri(GD_NS.as_bytes()), Ns::GData);
        assert_eq!(Ns::from_uri(b"http://example.com/ns"), Ns::Other);
    }
}
