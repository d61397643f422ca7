//! Parse options, optionally loaded from a TOML file.
//!
//! ```toml
//! recovery = "resync"      # or "abort"
//! max_errors = 50
//! max_nesting = 32
//! lint_bare_in_rooms = true
//! ```

use std::{fs, path::Path};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

/// Name of the options file picked up from the working directory by the CLI.
pub const DEFAULT_CONFIG_FILE: &str = "amble_syntax.toml";

/// How the parser reacts to a syntax error.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Recovery {
    /// Skip to the next statement keyword or closing brace and keep going.
    #[default]
    Resync,
    /// Stop at the first syntax error.
    Abort,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ParseOptions {
    pub recovery: Recovery,
    /// Stop collecting syntax errors once this many have been reported.
    pub max_errors: usize,
    /// Deepest allowed chain of `any(...)`/`all(...)` groups or nested schedule bodies.
    pub max_nesting: usize,
    /// Warn about bare `in rooms` conditions that probably belong to a preceding `ambient`.
    pub lint_bare_in_rooms: bool,
}

impl Default for ParseOptions {
    fn default() -> Self {
        Self {
            recovery: Recovery::Resync,
            max_errors: 50,
            max_nesting: 32,
            lint_bare_in_rooms: true,
        }
    }
}

impl ParseOptions {
    /// Options that stop at the first syntax error.
    pub fn strict() -> Self {
        Self {
            recovery: Recovery::Abort,
            ..Self::default()
        }
    }

    /// Read options from TOML text. Missing keys keep their defaults.
    ///
    /// # Errors
    /// Returns an error if `text` is not valid TOML or a value has the wrong type.
    pub fn from_toml_str(text: &str) -> Result<Self> {
        toml::from_str(text).with_context(|| "Failed to parse parse-options TOML")
    }

    /// Load options from `path`.
    ///
    /// # Errors
    /// Returns an error if the file cannot be read (a missing file included) or its contents are invalid.
    pub fn load(path: &Path) -> Result<Self> {
        let contents =
            fs::read_to_string(path).with_context(|| format!("Failed to read options file at {}", path.display()))?;
        Self::from_toml_str(&contents).with_context(|| format!("Invalid options in {}", path.display()))
    }

    /// Load options from `path` if it exists, otherwise fall back to defaults.
    ///
    /// # Errors
    /// Returns an error if the file exists but cannot be read or parsed.
    pub fn load_or_default(path: &Path) -> Result<Self> {
        if !path.exists() {
            log::debug!("no options file at {}, using defaults", path.display());
            return Ok(Self::default());
        }
        Self::load(path)
    }

    pub(crate) fn resync(&self) -> bool {
        self.recovery == Recovery::Resync
    }
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use super::*;

    #[test]
    fn partial_toml_keeps_defaults() {
        let opts = ParseOptions::from_toml_str("max_errors = 3").expect("valid toml");
        assert_eq!(opts.max_errors, 3);
        assert_eq!(opts.max_nesting, 32);
        assert_eq!(opts.recovery, Recovery::Resync);
        assert!(opts.lint_bare_in_rooms);
    }

    #[test]
    fn recovery_is_lowercase() {
        let opts = ParseOptions::from_toml_str("recovery = \"abort\"\nlint_bare_in_rooms = false").expect("valid toml");
        assert_eq!(opts.recovery, Recovery::Abort);
        assert!(!opts.lint_bare_in_rooms);
        assert!(ParseOptions::from_toml_str("recovery = \"Abort\"").is_err());
    }

    #[test]
    fn load_from_file() {
        let mut file = tempfile::NamedTempFile::new().expect("temp file");
        writeln!(file, "recovery = \"abort\"").expect("write");
        let opts = ParseOptions::load(file.path()).expect("load ok");
        assert_eq!(opts, ParseOptions::strict());
    }

    #[test]
    fn missing_file_handling() {
        let dir = tempfile::tempdir().expect("temp dir");
        let path = dir.path().join(DEFAULT_CONFIG_FILE);
        assert!(ParseOptions::load(&path).is_err());
        assert_eq!(ParseOptions::load_or_default(&path).expect("defaults"), ParseOptions::default());
    }
}
