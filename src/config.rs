// In: src/config.rs

//! The single source of truth for all bridge configuration.
//!
//! `BridgeConfig` is created once at the application boundary (from the
//! environment, a JSON document, or Python keyword arguments) and decides
//! where the native library is loaded from and how host timestamps are
//! narrowed into the native time representation.

use std::env;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::error::BridgeError;

/// Environment variable holding an explicit path to the rrd shared library.
pub const LIBRARY_PATH_ENV: &str = "RRD_BRIDGE_LIBRARY";
/// Environment variable holding extra library directories (path-list syntax).
pub const SEARCH_PATH_ENV: &str = "RRD_BRIDGE_SEARCH_PATH";
/// Environment variable selecting the timestamp narrowing policy.
pub const TIME_CONVERSION_ENV: &str = "RRD_BRIDGE_TIME_CONVERSION";

//==================================================================================
// I. Core Configuration Enums
//==================================================================================

/// How a host 64-bit timestamp is narrowed into the native `time_t`.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, Default, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum TimeConversion {
    /// **Default:** timestamps that do not fit `time_t` are rejected with an
    /// `InvalidArgument` before any native call.
    #[default]
    Checked,

    /// Plain two's-complement truncation. On targets with a 64-bit `time_t`
    /// this is the identity; on 32-bit targets out-of-range values wrap.
    Truncate,
}

impl TimeConversion {
    /// Parses the policy name used in the environment and in Python kwargs.
    pub fn parse(value: &str) -> Result<Self, BridgeError> {
        match value.trim().to_lowercase().as_str() {
            "checked" => Ok(TimeConversion::Checked),
            "truncate" => Ok(TimeConversion::Truncate),
            other => Err(BridgeError::Config(format!(
                "Invalid time_conversion '{}'. Must be 'checked' or 'truncate'.",
                other
            ))),
        }
    }
}

//==================================================================================
// II. The Unified BridgeConfig
//==================================================================================

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "snake_case")]
pub struct BridgeConfig {
    /// Explicit location of the shared library. Tried first; a failure here
    /// falls through to the directory search.
    #[serde(default)]
    pub library_path: Option<PathBuf>,

    /// Directories searched, in order, for one of `library_names`.
    #[serde(default = "default_search_paths")]
    pub search_paths: Vec<PathBuf>,

    /// Base library names, most preferred first. `rrd_th` is the thread-safe build.
    #[serde(default = "default_library_names")]
    pub library_names: Vec<String>,

    #[serde(default)]
    pub time_conversion: TimeConversion,

    /// Level used by `enable_verbose_logging` (an `env_logger` filter string).
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

impl Default for BridgeConfig {
    fn default() -> Self {
        Self {
            library_path: None,
            search_paths: default_search_paths(),
            library_names: default_library_names(),
            time_conversion: TimeConversion::default(),
            log_level: default_log_level(),
        }
    }
}

impl BridgeConfig {
    /// Parses a JSON document. Missing fields take their defaults.
    pub fn from_json(json: &str) -> Result<Self, BridgeError> {
        let config: BridgeConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Builds the default config and applies the `RRD_BRIDGE_*` overrides.
    pub fn from_env() -> Result<Self, BridgeError> {
        let mut config = BridgeConfig::default();

        if let Some(path) = env::var_os(LIBRARY_PATH_ENV) {
            if !path.is_empty() {
                config.library_path = Some(PathBuf::from(path));
            }
        }

        // Extra directories go in front of the defaults.
        if let Some(paths) = env::var_os(SEARCH_PATH_ENV) {
            let mut extra: Vec<PathBuf> = env::split_paths(&paths)
                .filter(|p| !p.as_os_str().is_empty())
                .collect();
            extra.append(&mut config.search_paths);
            config.search_paths = extra;
        }

        if let Ok(value) = env::var(TIME_CONVERSION_ENV) {
            config.time_conversion = TimeConversion::parse(&value)?;
        }

        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<(), BridgeError> {
        if self.library_path.is_none() && self.library_names.is_empty() {
            return Err(BridgeError::Config(
                "library_names cannot be empty when no library_path is set.".to_string(),
            ));
        }
        Ok(())
    }
}

/// The loader's own search path: the dynamic-linker path variables first,
/// then the usual system library directories.
fn default_search_paths() -> Vec<PathBuf> {
    let mut paths = Vec::new();
    for var in ["LD_LIBRARY_PATH", "DYLD_LIBRARY_PATH"] {
        if let Some(value) = env::var_os(var) {
            paths.extend(env::split_paths(&value).filter(|p| !p.as_os_str().is_empty()));
        }
    }
    for dir in [
        "/usr/lib64",
        "/usr/local/lib64",
        "/usr/lib",
        "/usr/local/lib",
        "/usr/lib/x86_64-linux-gnu",
        "/usr/lib/aarch64-linux-gnu",
        "/opt/homebrew/lib",
    ] {
        paths.push(PathBuf::from(dir));
    }
    paths
}

fn default_library_names() -> Vec<String> {
    vec!["rrd_th".to_string(), "rrd".to_string()]
}

fn default_log_level() -> String {
    "info".to_string()
}
