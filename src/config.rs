//! Source configuration loaded from `config/tidemark.toml` or environment variables.

use crate::source::{Direction, ObjectStore, ObjectStoreMedium, SourceResult};
use ::config::{Config, ConfigError, Environment, File};
use serde::Deserialize;
use std::path::Path;

const DEFAULT_CONFIG_FILE: &str = "config/tidemark.toml";
const ENV_PREFIX: &str = "TIDEMARK";

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct SourceConfig {
    /// Locator handed to [`crate::source::open`], e.g. `file://migrations`
    #[serde(default = "default_url")]
    pub url: String,
    /// Key prefix that object-store sources list migrations under
    #[serde(default)]
    pub prefix: String,
    /// Direction rendered by summary reports
    #[serde(default = "default_summary_direction")]
    pub summary_direction: Direction,
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            url: default_url(),
            prefix: String::new(),
            summary_direction: default_summary_direction(),
        }
    }
}

fn default_url() -> String {
    "file://migrations".to_string()
}

fn default_summary_direction() -> Direction {
    Direction::Up
}

fn env_source() -> Environment {
    Environment::with_prefix(ENV_PREFIX).separator("__")
}

impl SourceConfig {
    /// Load from `config/tidemark.toml`, overlaid with `TIDEMARK__SOURCE__*` env vars.
    ///
    /// # Errors
    ///
    /// Returns `SourceError::Config` when neither the file nor the
    /// environment yields a usable `[source]` section.
    pub fn load() -> SourceResult<Self> {
        Self::load_from(DEFAULT_CONFIG_FILE)
    }

    /// Same as [`SourceConfig::load`] with an explicit config file path.
    ///
    /// # Errors
    ///
    /// See [`SourceConfig::load`].
    pub fn load_from(path: impl AsRef<Path>) -> SourceResult<Self> {
        let path = path.as_ref();
        let builder = Config::builder()
            .add_source(File::from(path).required(false))
            .add_source(env_source());

        let settings = match builder.build() {
            Ok(cfg) => cfg,
            Err(err) => {
                // An unreadable file is not fatal; retry with the environment alone
                if path.exists() {
                    log::warn!(
                        "Failed to load {}, falling back to env: {err}",
                        path.display()
                    );
                }
                Config::builder()
                    .add_source(env_source())
                    .build()
                    .map_err(|env_err| {
                        ConfigError::Message(format!(
                            "Failed to load configuration from file and env: {err}, then env-only error: {env_err}"
                        ))
                    })?
            }
        };

        match settings.get::<SourceConfig>("source") {
            Ok(cfg) => Ok(cfg),
            Err(ConfigError::NotFound(_)) => Ok(Self::default()),
            Err(e) => Err(e.into()),
        }
    }

    /// Object-store medium reading `store` under the configured prefix
    #[must_use]
    pub fn object_store_medium<S: ObjectStore>(&self, store: S) -> ObjectStoreMedium<S> {
        ObjectStoreMedium::new(store, &self.prefix)
    }
}
