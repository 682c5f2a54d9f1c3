// Settings for the latencia binary
//
// Every value has a default so the tool runs without a settings file. The
// telemetry location is plain data handed to the loader, never a global.

use crate::loader::{DataFormat, LoaderConfig};
use crate::schema::{RulePack, SchemaResolver};
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::net::SocketAddr;
use std::path::{Path, PathBuf};

/// Settings loaded from an optional TOML file
///
/// # Example
/// ```toml
/// [data]
/// path = "data/telemetry.json"
/// format = "json"
///
/// [schema]
/// rules = "field-rules.toml"
///
/// [server]
/// listen = "0.0.0.0:8080"
/// route = "/api/metrics"
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub data: DataSettings,
    pub schema: SchemaSettings,
    pub server: ServerSettings,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DataSettings {
    /// Telemetry file, re-read on every request
    pub path: PathBuf,

    /// Source format; `auto` decides from extension and content
    pub format: DataFormat,
}

impl Default for DataSettings {
    fn default() -> Self {
        Self {
            path: PathBuf::from("data/telemetry.csv"),
            format: DataFormat::Auto,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SchemaSettings {
    /// Field rule pack; the embedded default pack when unset
    pub rules: Option<PathBuf>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerSettings {
    pub listen: String,

    /// The single route that accepts metrics requests
    pub route: String,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            listen: "127.0.0.1:8000".to_string(),
            route: "/".to_string(),
        }
    }
}

impl Settings {
    /// Load settings from a TOML file
    pub fn from_toml<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(path.as_ref()).with_context(|| {
            format!("Failed to read settings file: {}", path.as_ref().display())
        })?;
        let settings: Settings =
            toml::from_str(&content).with_context(|| "Failed to parse TOML settings")?;
        settings.validate().map_err(anyhow::Error::msg)?;
        Ok(settings)
    }

    /// Validate settings
    pub fn validate(&self) -> Result<(), String> {
        if self.data.path.as_os_str().is_empty() {
            return Err("data.path must not be empty".to_string());
        }

        if self.server.listen.parse::<SocketAddr>().is_err() {
            return Err(format!(
                "server.listen must be a socket address, got {:?}",
                self.server.listen
            ));
        }

        if !self.server.route.starts_with('/') {
            return Err(format!(
                "server.route must start with '/', got {:?}",
                self.server.route
            ));
        }

        Ok(())
    }

    pub fn loader_config(&self) -> LoaderConfig {
        LoaderConfig::new(&self.data.path).with_format(self.data.format)
    }

    /// Resolver from the configured rule pack, or the embedded default
    pub fn resolver(&self) -> Result<SchemaResolver> {
        let rules = match &self.schema.rules {
            Some(path) => RulePack::from_toml(path)
                .with_context(|| format!("Invalid field rule pack: {}", path.display()))?,
            None => RulePack::default_rules().context("Invalid embedded field rules")?,
        };
        Ok(SchemaResolver::new(rules))
    }

    pub fn listen_addr(&self) -> Result<SocketAddr> {
        self.server
            .listen
            .parse()
            .with_context(|| format!("Invalid listen address: {}", self.server.listen))
    }
}
