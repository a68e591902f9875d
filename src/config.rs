use std::collections::HashMap;
use std::fs;
use std::path::Path;

use serde::Deserialize;
use tracing::{debug, trace, trace_span};

use crate::error::ConfigError;

pub const SETTINGS_FILE: &str = "appsettings.json";
pub const DEFAULT_CONNECTION: &str = "DefaultConnection";
pub const DATABASE_URL_VAR: &str = "DATABASE_URL";

/// Contents of `appsettings.json`.
#[derive(Deserialize, Debug, Default, Clone)]
#[serde(rename_all = "PascalCase")]
pub struct Settings {
    #[serde(default)]
    pub connection_strings: HashMap<String, String>,
}

impl Settings {
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_owned(),
            source,
        })?;

        Self::parse(path, &content)
    }

    fn parse(path: &Path, content: &str) -> Result<Self, ConfigError> {
        serde_json::from_str(content).map_err(|source| ConfigError::Parse {
            path: path.to_owned(),
            source,
        })
    }

    pub fn connection_string(&self, name: &str) -> Result<&str, ConfigError> {
        self.connection_strings
            .get(name)
            .map(|url| url.trim())
            .filter(|url| !url.is_empty())
            .ok_or_else(|| ConfigError::MissingConnectionString(name.to_owned()))
    }
}

/// Everything needed to open the database, passed explicitly to the connection layer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DatabaseConfig {
    pub url: String,
    pub pool_size: u32,
}

impl DatabaseConfig {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            pool_size: 1,
        }
    }

    pub fn from_settings(settings: &Settings) -> Result<Self, ConfigError> {
        settings
            .connection_string(DEFAULT_CONNECTION)
            .map(Self::new)
    }

    /// Loads the settings file, which must exist. A non-blank `override_url`
    /// then replaces its connection string.
    pub fn resolve(
        settings_path: impl AsRef<Path>,
        override_url: Option<String>,
    ) -> Result<Self, ConfigError> {
        let span = trace_span!("resolving database config");
        let _guard = span.enter();

        trace!("Loading settings file");
        let settings = Settings::load(settings_path)?;

        match override_url.filter(|url| !url.trim().is_empty()) {
            Some(url) => {
                debug!("Overriding {DEFAULT_CONNECTION} with {DATABASE_URL_VAR}");
                Ok(Self::new(url))
            }
            None => Self::from_settings(&settings),
        }
    }
}
