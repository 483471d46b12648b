//! Error types shared by the parser and serializer factories.
//!
//! Every failure a factory, parser or serializer can produce travels through
//! [`GDataError`]. Engine failures ([`EngineError`]) never escape on their
//! own: they are wrapped into the parse or serialize variant with the
//! original error kept as the `source`, so callers see one channel no matter
//! which engine backend is configured.

use thiserror::Error;

/// Boxed cause carried by the wrapping variants.
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

// ============================================================================
// Error Types
// ============================================================================

/// Errors raised while creating or driving parsers and serializers.
#[derive(Debug, Error)]
pub enum GDataError {
    /// A parser could not be created, or the input was not a well-formed
    /// feed of the expected shape.
    #[error("{message}")]
    Parse {
        message: String,
        #[source]
        source: Option<BoxError>,
    },

    /// A serializer could not be created, or writing to the sink failed.
    #[error("{message}")]
    Serialize {
        message: String,
        #[source]
        source: Option<BoxError>,
    },

    /// The caller asked for an entry kind or entity outside the supported set.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),
}

impl GDataError {
    /// Malformed input with no underlying cause.
    pub(crate) fn malformed(message: impl Into<String>) -> Self {
        GDataError::Parse {
            message: message.into(),
            source: None,
        }
    }

    /// Malformed input caused by a lower-level error (XML, number, date).
    pub(crate) fn malformed_by<E>(message: impl Into<String>, cause: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        GDataError::Parse {
            message: message.into(),
            source: Some(Box::new(cause)),
        }
    }

    pub(crate) fn write_failed<E>(cause: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        GDataError::Serialize {
            message: "failed to write XML".to_string(),
            source: Some(Box::new(cause)),
        }
    }

    /// True for the invalid-argument (programming error) variant.
    pub fn is_invalid_argument(&self) -> bool {
        matches!(self, GDataError::InvalidArgument(_))
    }
}

/// Failures of the streaming XML engine to hand out a parser or writer.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EngineError {
    /// The engine only speaks UTF-8.
    #[error("unsupported document encoding '{0}' (only UTF-8 is available)")]
    UnsupportedEncoding(String),

    /// Indentation must use a space or a tab.
    #[error("invalid indent character {0:?}")]
    InvalidIndent(char),
}
