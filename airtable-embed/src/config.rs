//! Configuration-related functionality.

use std::{ffi::OsStr, fmt, fs, path::Path, str::FromStr};

use eyre::{Result, WrapErr};
use log::debug;
use serde::{Deserialize, Serialize};

use crate::Error;

/// The Airtable REST API endpoint used unless overridden.
pub const DEFAULT_ENDPOINT: &str = "https://api.airtable.com/v0";

/// The largest number of records a table query may request, unless
/// configured otherwise.
pub const DEFAULT_MAX_RECORDS: u32 = 100;

/// How long to wait for the API before giving up on a request.
pub const DEFAULT_TIMEOUT_SECS: u64 = 10;

/// Read-only settings for rendering embeds.
///
/// A configuration is constructed once (usually loaded from a file) and handed
/// to a [`crate::Context`], which never mutates it.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    /// The ID of the Airtable base (`app...`) that all queries go to.
    #[serde(default)]
    pub base_id: String,
    /// The personal access token used as the bearer token.
    #[serde(default)]
    pub api_key: String,
    /// Upper bound on the `maxRecords` value sent for table queries.
    #[serde(default = "default_max_records")]
    pub max_records: u32,
    #[serde(default = "default_endpoint")]
    pub endpoint: String,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_max_records() -> u32 {
    DEFAULT_MAX_RECORDS
}

fn default_endpoint() -> String {
    DEFAULT_ENDPOINT.to_string()
}

fn default_timeout_secs() -> u64 {
    DEFAULT_TIMEOUT_SECS
}

impl Default for Config {
    fn default() -> Self {
        Self {
            base_id: String::new(),
            api_key: String::new(),
            max_records: DEFAULT_MAX_RECORDS,
            endpoint: default_endpoint(),
            timeout_secs: DEFAULT_TIMEOUT_SECS,
        }
    }
}

// The API key must never end up in logs.
impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Config")
            .field("base_id", &self.base_id)
            .field("api_key", &"<redacted>")
            .field("max_records", &self.max_records)
            .field("endpoint", &self.endpoint)
            .field("timeout_secs", &self.timeout_secs)
            .finish()
    }
}

/// The file formats from which a configuration can be loaded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum SupportedFormat {
    Json,
    Yaml,
}

impl FromStr for SupportedFormat {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let lower = s.to_lowercase();
        Ok(match lower.as_ref() {
            "json" => Self::Json,
            "yaml" | "yml" => Self::Yaml,
            _ => return Err(Error::UnsupportedFileType(s.to_string())),
        })
    }
}

impl Config {
    /// Constructor.
    pub fn new<B, K>(base_id: B, api_key: K) -> Self
    where
        B: AsRef<str>,
        K: AsRef<str>,
    {
        Self {
            base_id: base_id.as_ref().to_string(),
            api_key: api_key.as_ref().to_string(),
            ..Self::default()
        }
    }

    /// Convenience method for overriding the record ceiling.
    pub fn with_max_records(mut self, max_records: u32) -> Self {
        self.max_records = max_records;
        self
    }

    /// Convenience method for pointing requests at another API endpoint.
    pub fn with_endpoint<E: AsRef<str>>(mut self, endpoint: E) -> Self {
        self.endpoint = endpoint.as_ref().to_string();
        self
    }

    /// Convenience method for overriding the request timeout.
    pub fn with_timeout_secs(mut self, timeout_secs: u64) -> Self {
        self.timeout_secs = timeout_secs;
        self
    }

    /// Parses a configuration from a string in the given format.
    pub fn load_as(fmt: SupportedFormat, content: &str) -> Result<Self, Error> {
        Ok(match fmt {
            SupportedFormat::Json => serde_json::from_str(content)?,
            SupportedFormat::Yaml => serde_yaml::from_str(content)?,
        })
    }

    /// Loads a configuration from the given file, detecting its format from
    /// the file extension.
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let ext = path
            .extension()
            .and_then(OsStr::to_str)
            .ok_or_else(|| Error::CannotDetermineFileType(path.to_path_buf()))?;
        let fmt = SupportedFormat::from_str(ext)?;
        let content = fs::read_to_string(path)
            .map_err(|e| Error::Io(format!("while trying to read from {}", path.display()), e))?;
        let config = Self::load_as(fmt, &content)
            .wrap_err_with(|| Error::FailedToLoadConfig(path.to_path_buf()))?;
        debug!("Loaded configuration from {}", path.display());
        Ok(config)
    }
}
