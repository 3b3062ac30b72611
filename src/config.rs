//! Server configuration sourced from environment variables.

use std::net::SocketAddr;
use std::path::PathBuf;

use crate::adapters::artifacts::LoadOptions;

const BIND_ENV: &str = "SCORECAST_BIND";
const ARTIFACT_DIR_ENV: &str = "SCORECAST_ARTIFACT_DIR";
const REQUIRE_MANIFEST_ENV: &str = "SCORECAST_REQUIRE_MANIFEST";
const LOG_MODE_ENV: &str = "SCORECAST_LOG_MODE";
const LOG_FILE_ENV: &str = "SCORECAST_LOG_FILE";

const DEFAULT_BIND: &str = "127.0.0.1:5000";
const DEFAULT_LOG_FILE: &str = "scorecast.log";

/// Error type for configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid {name} value {value:?}: {reason}")]
    Invalid {
        name: &'static str,
        value: String,
        reason: String,
    },
}

/// Where log output is written.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LogTarget {
    Stdout,
    File(PathBuf),
}

/// Runtime configuration for the server binary.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub bind: SocketAddr,
    pub artifact_dir: PathBuf,
    pub require_manifest: bool,
    pub log_target: LogTarget,
}

pub(crate) fn parse_bool(value: &str) -> bool {
    matches!(value, "1" | "true" | "TRUE" | "yes" | "YES")
}

impl ServerConfig {
    /// Read configuration from the process environment.
    ///
    /// # Errors
    /// Returns `ConfigError` if the bind address cannot be parsed.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Read configuration through an arbitrary variable lookup.
    ///
    /// # Errors
    /// Returns `ConfigError` if the bind address cannot be parsed.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let bind_raw = lookup(BIND_ENV).unwrap_or_else(|| DEFAULT_BIND.to_string());
        let bind = bind_raw
            .trim()
            .parse::<SocketAddr>()
            .map_err(|e| ConfigError::Invalid {
                name: BIND_ENV,
                value: bind_raw.clone(),
                reason: e.to_string(),
            })?;

        let artifact_dir = lookup(ARTIFACT_DIR_ENV)
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from("."));

        let require_manifest = lookup(REQUIRE_MANIFEST_ENV)
            .map(|v| parse_bool(v.trim()))
            .unwrap_or(false);

        let log_target = match lookup(LOG_MODE_ENV).as_deref() {
            Some("file") => LogTarget::File(
                lookup(LOG_FILE_ENV)
                    .map(PathBuf::from)
                    .unwrap_or_else(|| PathBuf::from(DEFAULT_LOG_FILE)),
            ),
            // stdout
            _ => LogTarget::Stdout,
        };

        Ok(Self {
            bind,
            artifact_dir,
            require_manifest,
            log_target,
        })
    }

    /// Artifact loading options derived from this configuration.
    #[must_use]
    pub fn load_options(&self) -> LoadOptions {
        LoadOptions {
            require_manifest: self.require_manifest,
        }
    }
}
