//! CLI error taxonomy and the shared application context.

use std::error::Error;
use std::fmt::{self, Display, Formatter};
use std::sync::Arc;

use pocli_config::ConfigError;

use crate::auth::AuthConfigError;
use crate::management::{PolicyService, RemoteError};
use crate::transport::TransportError;

/// CLI-level error type; one variant per failure class.
#[derive(Debug)]
pub(crate) enum CliError {
    /// Bad local input detected before any network call.
    Argument(String),
    /// Configuration could not be resolved.
    Config(ConfigError),
    /// The selected authentication method is missing fields.
    AuthConfig(AuthConfigError),
    /// The transport to the management service could not be built.
    Transport(TransportError),
    /// The management service (or the network) reported a failure.
    Remote(RemoteError),
    /// Local failure while rendering results.
    Failure(anyhow::Error),
}

/// Convenience alias for functions returning a `CliError`.
pub(crate) type CliResult<T> = Result<T, CliError>;

impl CliError {
    pub(crate) fn argument(message: impl Into<String>) -> Self {
        Self::Argument(message.into())
    }

    pub(crate) fn failure(error: impl Into<anyhow::Error>) -> Self {
        Self::Failure(error.into())
    }

    pub(crate) const fn exit_code(&self) -> i32 {
        match self {
            Self::Argument(_) | Self::Config(_) | Self::AuthConfig(_) => 2,
            Self::Transport(_) | Self::Remote(_) | Self::Failure(_) => 3,
        }
    }

    pub(crate) fn display_message(&self) -> String {
        match self {
            Self::Argument(message) => message.clone(),
            Self::Config(error) => error_chain(error),
            Self::AuthConfig(error) => error_chain(error),
            Self::Transport(error) => error_chain(error),
            Self::Remote(error) => error_chain(error),
            Self::Failure(error) => format!("{error:#}"),
        }
    }
}

impl Display for CliError {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> fmt::Result {
        formatter.write_str("cli error")
    }
}

impl Error for CliError {}

impl From<ConfigError> for CliError {
    fn from(error: ConfigError) -> Self {
        Self::Config(error)
    }
}

impl From<AuthConfigError> for CliError {
    fn from(error: AuthConfigError) -> Self {
        Self::AuthConfig(error)
    }
}

impl From<TransportError> for CliError {
    fn from(error: TransportError) -> Self {
        Self::Transport(error)
    }
}

impl From<RemoteError> for CliError {
    fn from(error: RemoteError) -> Self {
        Self::Remote(error)
    }
}

/// Join an error and its sources into one line.
fn error_chain(error: &(dyn Error + 'static)) -> String {
    std::iter::successors(Some(error), |&current| current.source())
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(": ")
}

/// Application context passed to command handlers.
#[derive(Clone)]
pub(crate) struct AppContext {
    pub(crate) service: Arc<dyn PolicyService>,
}
