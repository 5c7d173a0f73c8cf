//! CLI Common Utilities
//!
//! Input resolution and configuration loading shared by command handlers.

use std::path::{Path, PathBuf};

use crate::config::{Config, ConfigLoader};
use crate::types::{Result, SrsError};

/// Where a command's primary text comes from
#[derive(Debug, Clone)]
pub enum InputSource {
    File(PathBuf),
    Inline(String),
}

impl InputSource {
    /// Exactly one of `--input` / `--text` must be given
    pub fn from_args(input: Option<PathBuf>, text: Option<String>) -> Result<Self> {
        match (input, text) {
            (Some(path), None) => Ok(Self::File(path)),
            (None, Some(text)) => Ok(Self::Inline(text)),
            (Some(_), Some(_)) => Err(SrsError::Config(
                "Use either --input or --text, not both".to_string(),
            )),
            (None, None) => Err(SrsError::Config(
                "No input given; pass --input FILE or --text TEXT".to_string(),
            )),
        }
    }

    pub fn read(&self) -> Result<String> {
        let content = match self {
            Self::File(path) => read_file(path)?,
            Self::Inline(text) => text.clone(),
        };

        if content.trim().is_empty() {
            return Err(SrsError::Config("Input is empty".to_string()));
        }
        Ok(content)
    }
}

/// Read a UTF-8 file with the path in the error message
pub fn read_file(path: &Path) -> Result<String> {
    std::fs::read_to_string(path).map_err(|e| {
        SrsError::Io(std::io::Error::new(
            e.kind(),
            format!("{}: {}", path.display(), e),
        ))
    })
}

/// Effective configuration: an explicit file, or the layered lookup
pub fn load_config(explicit: Option<&Path>) -> Result<Config> {
    match explicit {
        Some(path) => ConfigLoader::load_from_file(path),
        None => ConfigLoader::load(),
    }
}

/// Require an option that only some artifacts need
pub fn require_arg<'a>(value: Option<&'a str>, flag: &str, artifact: &str) -> Result<&'a str> {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .ok_or_else(|| SrsError::Config(format!("'{}' requires {}", artifact, flag)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_input_source_exclusive() {
        assert!(InputSource::from_args(None, None).is_err());
        assert!(InputSource::from_args(Some("a".into()), Some("b".into())).is_err());
        assert!(matches!(
            InputSource::from_args(None, Some("text".into())).unwrap(),
            InputSource::Inline(_)
        ));
    }

    #[test]
    fn test_read_file_and_empty_input() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("idea.txt");
        std::fs::write(&path, "A ticketing system").unwrap();

        let source = InputSource::File(path);
        assert_eq!(source.read().unwrap(), "A ticketing system");

        assert!(InputSource::Inline("   ".into()).read().is_err());
    }

    #[test]
    fn test_missing_file_mentions_path() {
        let err = read_file(Path::new("/definitely/missing.txt")).unwrap_err();
        assert!(err.to_string().contains("missing.txt"));
    }

    #[test]
    fn test_require_arg() {
        assert_eq!(require_arg(Some(" Go "), "--language", "code").unwrap(), "Go");
        let err = require_arg(None, "--language", "code").unwrap_err();
        assert!(err.to_string().contains("--language"));
    }
}
