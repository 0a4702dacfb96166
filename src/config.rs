//! Configuration for loading a rate table and answering conversions.
//!
//! Every field has a default, so an empty TOML document is a valid
//! configuration:
//!
//! ```toml
//! rates_path = "rates.txt"
//! delimiter = ";"
//! on_malformed = "abort"   # or "skip"
//! strategy = "depth-first" # or "breadth-first"
//! ```

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::loader::{MalformedPolicy, RateLoader, DEFAULT_DELIMITER};
use crate::search::SearchStrategy;
use crate::{Error, Result};

/// Converter configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ConverterConfig {
    /// Rate table to load at startup.
    #[serde(default = "default_rates_path")]
    pub rates_path: PathBuf,

    /// Field separator of the rate table.
    #[serde(default = "default_delimiter")]
    pub delimiter: char,

    /// What to do with lines that do not parse.
    #[serde(default)]
    pub on_malformed: MalformedPolicy,

    /// Route search used for conversions.
    #[serde(default)]
    pub strategy: SearchStrategy,
}

impl Default for ConverterConfig {
    fn default() -> Self {
        Self {
            rates_path: default_rates_path(),
            delimiter: default_delimiter(),
            on_malformed: MalformedPolicy::default(),
            strategy: SearchStrategy::default(),
        }
    }
}

fn default_rates_path() -> PathBuf {
    PathBuf::from("rates.txt")
}

fn default_delimiter() -> char {
    DEFAULT_DELIMITER
}

impl ConverterConfig {
    /// Parse a TOML document.
    pub fn from_toml_str(text: &str) -> Result<Self> {
        let config: Self = toml::from_str(text).map_err(|e| Error::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Read and parse a TOML file.
    ///
    /// A relative `rates_path` is resolved against the file's directory.
    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path).map_err(|e| {
            Error::Config(format!("cannot read {}: {e}", path.display()))
        })?;
        let mut config = Self::from_toml_str(&text)?;
        if config.rates_path.is_relative() {
            if let Some(dir) = path.parent() {
                config.rates_path = dir.join(&config.rates_path);
            }
        }
        Ok(config)
    }

    /// Reject delimiters that can occur inside a rate token such as `1e-3`.
    pub fn validate(&self) -> Result<()> {
        let d = self.delimiter;
        if d.is_whitespace() || d.is_ascii_digit() || matches!(d, '.' | 'e' | 'E' | '+' | '-') {
            return Err(Error::Config(format!(
                "delimiter {:?} would split unit names or rates",
                self.delimiter
            )));
        }
        Ok(())
    }

    /// Loader matching this configuration.
    pub fn loader(&self) -> RateLoader {
        RateLoader::new(self.delimiter, self.on_malformed)
    }
}
