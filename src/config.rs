//! Configuration file parser for the XML engine settings.
//!
//! The config file is optional: a missing file yields `Config::default()`.
//! Unknown keys are ignored by serde, though we log a warning for each one
//! so typos do not go unnoticed.
use serde::Deserialize;
use std::path::Path;
use thiserror::Error;

// ============================================================================
// Error Types
// ============================================================================

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid TOML in config file: {0}")]
    Parse(#[from] toml::de::Error),

    /// SEC-014: Config file exceeds maximum allowed size.
    #[error("Config file too large: {0}")]
    TooLarge(String),
}

// ============================================================================
// Configuration Structs
// ============================================================================

/// Top-level configuration.
///
/// All fields use `#[serde(default)]` so any subset of keys can be specified.
#[derive(Debug, Clone, Default, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct Config {
    /// Pull parser settings.
    pub parser: ParserSettings,

    /// Writer settings.
    pub serializer: SerializerSettings,
}

/// Settings applied to every pull parser the engine creates.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct ParserSettings {
    /// Expected document encoding. Only UTF-8 is supported.
    pub encoding: String,

    /// Trim whitespace around text nodes. Off by default, since titles,
    /// content and recurrence rules are taken verbatim.
    pub trim_text: bool,

    /// Reject documents whose end tags do not match their start tags.
    pub check_end_names: bool,

    /// SEC-003: Maximum element nesting depth before parsing is aborted.
    pub max_depth: usize,
}

impl Default for ParserSettings {
    fn default() -> Self {
        Self {
            encoding: "UTF-8".to_string(),
            trim_text: false,
            check_end_names: true,
            max_depth: 64,
        }
    }
}

/// Settings applied to every writer the engine creates.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct SerializerSettings {
    /// Encoding announced in the XML declaration. Only UTF-8 is supported.
    pub encoding: String,

    /// Indent width. 0 = compact output.
    pub indent: usize,

    pub indent_char: char,
}

impl Default for SerializerSettings {
    fn default() -> Self {
        Self {
            encoding: "UTF-8".to_string(),
            indent: 0,
            indent_char: ' ',
        }
    }
}

impl Config {
    /// SEC-014: Maximum config file size (1 MB).
    const MAX_FILE_SIZE: u64 = 1_048_576;

    /// Load configuration from a TOML file.
    ///
    /// - Missing file → `Ok(Config::default())`
    /// - Empty file → `Ok(Config::default())`
    /// - Invalid TOML → `Err(ConfigError::Parse)` with line number info
    /// - Unknown keys → accepted, logged as warning
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        match std::fs::metadata(path) {
            Ok(meta) if meta.len() > Self::MAX_FILE_SIZE => {
                return Err(ConfigError::TooLarge(format!(
                    "Config file is {} bytes (max {} bytes)",
                    meta.len(),
                    Self::MAX_FILE_SIZE
                )));
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::debug!(path = %path.display(), "No config file found, using defaults");
                return Ok(Self::default());
            }
            Err(e) => return Err(ConfigError::Io(e)),
            Ok(_) => {}
        }

        let content = match std::fs::read_to_string(path) {
            Ok(c) => c,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                // Race condition: file deleted between metadata and read
                tracing::debug!(path = %path.display(), "Config file disappeared, using defaults");
                return Ok(Self::default());
            }
            Err(e) => return Err(ConfigError::Io(e)),
        };

        if content.trim().is_empty() {
            tracing::debug!(path = %path.display(), "Config file is empty, using defaults");
            return Ok(Self::default());
        }

        if let Ok(raw) = content.parse::<toml::Table>() {
            warn_unknown_keys(&raw);
        }

        let config: Config = toml::from_str(&content)?;
        tracing::info!(
            path = %path.display(),
            max_depth = config.parser.max_depth,
            indent = config.serializer.indent,
            "Loaded configuration"
        );
        Ok(config)
    }
}

fn warn_unknown_keys(raw: &toml::Table) {
    const SECTIONS: [(&str, &[&str]); 2] = [
        ("parser", &["encoding", "trim_text", "check_end_names", "max_depth"]),
        ("serializer", &["encoding", "indent", "indent_char"]),
    ];

    for (key, value) in raw {
        let Some((_, known)) = SECTIONS.iter().find(|(name, _)| *name == key.as_str()) else {
            tracing::warn!(key = %key, "Unknown key in config file, ignoring");
            continue;
        };
        if let Some(table) = value.as_table() {
            for inner in table.keys() {
                if !known.contains(&inner.as_str()) {
                    tracing::warn!(section = %key, key = %inner, "Unknown key in config file, ignoring");
                }
            }
        }
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn write_config(name: &str, content: &str) -> std::path::PathBuf {
        let dir = std::env::temp_dir().join(format!("gdata_config_test_{}", name));
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("config.toml");
        std::fs::write(&path, content).unwrap();
        path
    }

    fn cleanup(path: &Path) {
        if let Some(dir) = path.parent() {
            std::fs::remove_dir_all(dir).ok();
        }
    }

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.parser.encoding, "UTF-8");
        assert!(!config.parser.trim_text);
        assert!(config.parser.check_end_names);
        assert_eq!(config.parser.max_depth, 64);
        assert_eq!(config.serializer.indent, 0);
        assert_eq!(config.serializer.indent_char, ' ');
    }

    #[test]
    fn test_missing_file_returns_default() {
        let path = Path::new("/tmp/gdata_test_nonexistent_config.toml");
        let config = Config::load(path).unwrap();
        assert_eq!(config, Config::default());
    }

    #[test]
    fn test_whitespace_only_file_returns_default() {
        let path = write_config("whitespace", "   \n  \n  ");
        let config = Config::load(&path).unwrap();
        assert_eq!(config, Config::default());
        cleanup(&path);
    }

    #[test]
    fn test_partial_config_uses_defaults_for_missing() {
        let path = write_config("partial", "[serializer]\nindent = 2\n");

        let config = Config::load(&path).unwrap();
        assert_eq!(config.serializer.indent, 2);
        assert_eq!(config.serializer.indent_char, ' '); // default
        assert_eq!(config.parser, ParserSettings::default());

        cleanup(&path);
    }

    #[test]
    fn test_full_config() {
        let content = r#"
[parser]
encoding = "utf-8"
trim_text = true
check_end_names = false
max_depth = 12

[serializer]
encoding = "UTF-8"
indent = 1
indent_char = "\t"
"#;
        let path = write_config("full", content);

        let config = Config::load(&path).unwrap();
        assert_eq!(config.parser.encoding, "utf-8");
        assert!(config.parser.trim_text);
        assert!(!config.parser.check_end_names);
        assert_eq!(config.parser.max_depth, 12);
        assert_eq!(config.serializer.indent, 1);
        assert_eq!(config.serializer.indent_char, '\t');

        cleanup(&path);
    }

    #[test]
    fn test_invalid_toml_returns_error() {
        let path = write_config("invalid", "this is not [valid toml");

        let err = Config::load(&path).unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
        assert!(err.to_string().contains("Invalid TOML"));

        cleanup(&path);
    }

    #[test]
    fn test_unknown_keys_accepted() {
        let content = r#"
totally_fake_key = "should not fail"

[parser]
max_depth = 8
another_unknown = 42
"#;
        let path = write_config("unknown", content);

        let config = Config::load(&path).unwrap();
        assert_eq!(config.parser.max_depth, 8);

        cleanup(&path);
    }

    #[test]
    fn test_wrong_type_returns_error() {
        let path = write_config("wrongtype", "[parser]\nmax_depth = \"deep\"\n");
        assert!(Config::load(&path).is_err());
        cleanup(&path);
    }

    // SEC-014: File size limit
    #[test]
    fn test_too_large_file_rejected() {
        let path = write_config("too_large", &"a".repeat(1_048_577));

        let err = Config::load(&path).unwrap_err();
        assert!(matches!(err, ConfigError::TooLarge(_)));
        assert!(err.to_string().contains("too large"));

        cleanup(&path);
    }
}
