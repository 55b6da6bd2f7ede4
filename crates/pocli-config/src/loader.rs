//! Precedence merge producing the effective configuration.
//!
//! # Design
//! - Layers stack as flags > environment > config file > built-in defaults.
//! - Inputs are captured up front in [`ConfigSources`] so resolution never
//!   touches process globals and can be exercised directly in tests.

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use tracing::debug;

use crate::defaults::{DEFAULT_HOST, DEFAULT_PORT, DEFAULT_TIMEOUT_SECS};
use crate::discover::{ConfigFile, discover_config_file};
use crate::env::layer_from_env;
use crate::error::{ConfigError, ConfigResult};
use crate::model::{ConfigLayer, Configuration, Credentials};

/// Everything resolution depends on.
#[derive(Debug, Clone, Default)]
pub struct ConfigSources {
    /// Config file named on the command line.
    pub explicit_file: Option<PathBuf>,
    /// Directory searched first for an implicit config file.
    pub working_dir: Option<PathBuf>,
    /// Per-user configuration root searched second.
    pub user_config_dir: Option<PathBuf>,
    /// Snapshot of the environment.
    pub env: HashMap<String, String>,
    /// Values supplied as invocation flags.
    pub flags: ConfigLayer,
}

impl ConfigSources {
    /// Capture the current process environment, working directory and user
    /// configuration root alongside the parsed flags.
    #[must_use]
    pub fn from_process(explicit_file: Option<PathBuf>, flags: ConfigLayer) -> Self {
        Self {
            explicit_file,
            working_dir: std::env::current_dir().ok(),
            user_config_dir: dirs::config_dir(),
            env: std::env::vars().collect(),
            flags,
        }
    }
}

/// Resolve the effective configuration.
///
/// # Errors
///
/// Returns an error when an explicit config file is missing or malformed,
/// when a discovered file exists but cannot be parsed, when an environment
/// variable is malformed, or when a resolved value fails validation.
pub fn resolve(sources: &ConfigSources) -> ConfigResult<Configuration> {
    let file = discover_config_file(
        sources.explicit_file.as_deref(),
        sources.working_dir.as_deref(),
        sources.user_config_dir.as_deref(),
    );
    let file_layer = match &file {
        ConfigFile::Explicit(path) | ConfigFile::Discovered(path) => {
            debug!(path = %path.display(), "loading config file");
            read_config_file(path)?
        }
        ConfigFile::Absent => {
            debug!("no config file found; using flags, environment and defaults");
            ConfigLayer::default()
        }
    };
    let env_layer = layer_from_env(&sources.env)?;

    let merged = sources.flags.clone().over(env_layer).over(file_layer);
    finalize(merged)
}

/// Parse a YAML config file into a layer.
///
/// # Errors
///
/// Returns [`ConfigError::FileRead`] if the file cannot be read and
/// [`ConfigError::FileParse`] if its contents are not a valid document.
pub fn read_config_file(path: &Path) -> ConfigResult<ConfigLayer> {
    let contents = fs::read_to_string(path).map_err(|source| ConfigError::FileRead {
        path: path.to_path_buf(),
        source,
    })?;
    if contents.trim().is_empty() {
        return Ok(ConfigLayer::default());
    }

    let layer: Option<ConfigLayer> =
        serde_yaml::from_str(&contents).map_err(|source| ConfigError::FileParse {
            path: path.to_path_buf(),
            source,
        })?;
    Ok(layer.unwrap_or_default())
}

fn finalize(layer: ConfigLayer) -> ConfigResult<Configuration> {
    let port = layer.port.unwrap_or(DEFAULT_PORT);
    if port == 0 {
        return Err(ConfigError::InvalidValue {
            key: "port",
            reason: "must be between 1 and 65535",
        });
    }

    let timeout = layer.timeout.unwrap_or(DEFAULT_TIMEOUT_SECS);
    if timeout == 0 {
        return Err(ConfigError::InvalidValue {
            key: "timeout",
            reason: "must be at least one second",
        });
    }

    let host = layer.host.unwrap_or_else(|| DEFAULT_HOST.to_string());
    if host.trim().is_empty() {
        return Err(ConfigError::InvalidValue {
            key: "host",
            reason: "must not be empty",
        });
    }

    Ok(Configuration {
        host,
        port,
        insecure: layer.insecure.unwrap_or(false),
        use_tls: layer.tls.unwrap_or(false),
        ca_certs: layer.ca_cert.unwrap_or_default(),
        auth_method: layer.auth.unwrap_or_default(),
        credentials: Credentials {
            client_id: layer.client_id,
            client_secret: layer.client_secret,
            token_url: layer.token_url,
            username: layer.username,
            password: layer.password,
        },
        timeout: Duration::from_secs(timeout),
    })
}
