//! Error types for configuration resolution.

use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// Primary error type for configuration resolution.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// A configuration file could not be read.
    #[error("failed to read config file '{}'", path.display())]
    FileRead {
        /// Path of the file that failed to load.
        path: PathBuf,
        /// Source IO error.
        source: io::Error,
    },
    /// A configuration file was not valid YAML for the expected keys.
    #[error("failed to parse config file '{}'", path.display())]
    FileParse {
        /// Path of the malformed file.
        path: PathBuf,
        /// Source YAML error.
        source: serde_yaml::Error,
    },
    /// An environment variable held a value that could not be parsed.
    #[error("invalid value '{value}' for environment variable {variable}: {reason}")]
    InvalidEnv {
        /// Fully prefixed variable name.
        variable: String,
        /// Raw value found in the environment.
        value: String,
        /// Human-readable reason for the failure.
        reason: String,
    },
    /// A resolved field failed validation.
    #[error("invalid value for '{key}': {reason}")]
    InvalidValue {
        /// Canonical key of the offending field.
        key: &'static str,
        /// Machine-readable reason for the failure.
        reason: &'static str,
    },
}

/// Convenience alias for configuration results.
pub type ConfigResult<T> = Result<T, ConfigError>;
