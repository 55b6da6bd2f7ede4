//! Typed configuration models shared by every source.

use std::fmt::{self, Display, Formatter};
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use serde::{Deserialize, Deserializer};
use thiserror::Error;

/// Strategy used to present credentials to the management service.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(try_from = "String")]
pub enum AuthMethod {
    /// No credentials are sent.
    #[default]
    None,
    /// HTTP basic authentication with a username and password.
    Basic,
    /// `OAuth2` password grant against an external token endpoint.
    OAuth2,
}

impl AuthMethod {
    /// Canonical lower-case label for the method.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::None => "none",
            Self::Basic => "basic",
            Self::OAuth2 => "oauth2",
        }
    }
}

impl Display for AuthMethod {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> fmt::Result {
        formatter.write_str(self.as_str())
    }
}

/// Raised when an authentication method label is not recognised.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown auth method '{value}', must be one of \"none\"/\"passthrough\", \"basic\", \"oauth2\"")]
pub struct ParseAuthMethodError {
    /// The rejected label.
    pub value: String,
}

impl FromStr for AuthMethod {
    type Err = ParseAuthMethodError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "none" | "passthrough" => Ok(Self::None),
            "basic" => Ok(Self::Basic),
            "oauth2" => Ok(Self::OAuth2),
            _ => Err(ParseAuthMethodError {
                value: value.to_string(),
            }),
        }
    }
}

impl TryFrom<String> for AuthMethod {
    type Error = ParseAuthMethodError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

/// Credential fields gathered from configuration; which ones matter depends
/// on the selected [`AuthMethod`].
#[derive(Clone, Default, PartialEq, Eq)]
pub struct Credentials {
    /// `OAuth2` client identifier.
    pub client_id: Option<String>,
    /// `OAuth2` client secret.
    pub client_secret: Option<String>,
    /// `OAuth2` token endpoint.
    pub token_url: Option<String>,
    /// Service username (basic and `OAuth2`).
    pub username: Option<String>,
    /// Service password (basic and `OAuth2`).
    pub password: Option<String>,
}

impl fmt::Debug for Credentials {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> fmt::Result {
        formatter
            .debug_struct("Credentials")
            .field("client_id", &self.client_id)
            .field("client_secret", &self.client_secret.as_ref().map(|_| "<redacted>"))
            .field("token_url", &self.token_url)
            .field("username", &self.username)
            .field("password", &self.password.as_ref().map(|_| "<redacted>"))
            .finish()
    }
}

/// Effective configuration for one invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Configuration {
    /// Host running the management service.
    pub host: String,
    /// Port the management service listens on.
    pub port: u16,
    /// Use HTTPS without verifying the server certificate.
    pub insecure: bool,
    /// Use HTTPS with certificate verification.
    pub use_tls: bool,
    /// Extra CA certificates trusted in addition to the system roots.
    pub ca_certs: Vec<PathBuf>,
    /// Selected authentication strategy.
    pub auth_method: AuthMethod,
    /// Credential fields for the selected strategy.
    pub credentials: Credentials,
    /// Per-request timeout.
    pub timeout: Duration,
}

/// One source's view of the configuration. Every field is optional so layers
/// can be stacked; a `Some` in a higher layer hides the lower ones.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct ConfigLayer {
    /// `host` key.
    pub host: Option<String>,
    /// `port` key.
    pub port: Option<u16>,
    /// `auth` key.
    pub auth: Option<AuthMethod>,
    /// `client_id` key.
    pub client_id: Option<String>,
    /// `client_secret` key.
    pub client_secret: Option<String>,
    /// `token_url` key.
    pub token_url: Option<String>,
    /// `username` key.
    pub username: Option<String>,
    /// `password` key.
    pub password: Option<String>,
    /// `insecure` key.
    pub insecure: Option<bool>,
    /// `tls` key.
    pub tls: Option<bool>,
    /// `ca_cert` key; accepts a single path or a list.
    #[serde(deserialize_with = "one_or_many")]
    pub ca_cert: Option<Vec<PathBuf>>,
    /// `timeout` key, in seconds.
    pub timeout: Option<u64>,
}

impl ConfigLayer {
    /// Stack `self` on top of `lower`, keeping every value `self` sets.
    #[must_use]
    pub fn over(self, lower: Self) -> Self {
        Self {
            host: self.host.or(lower.host),
            port: self.port.or(lower.port),
            auth: self.auth.or(lower.auth),
            client_id: self.client_id.or(lower.client_id),
            client_secret: self.client_secret.or(lower.client_secret),
            token_url: self.token_url.or(lower.token_url),
            username: self.username.or(lower.username),
            password: self.password.or(lower.password),
            insecure: self.insecure.or(lower.insecure),
            tls: self.tls.or(lower.tls),
            ca_cert: self.ca_cert.or(lower.ca_cert),
            timeout: self.timeout.or(lower.timeout),
        }
    }
}

fn one_or_many<'de, D>(deserializer: D) -> Result<Option<Vec<PathBuf>>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum OneOrMany {
        One(PathBuf),
        Many(Vec<PathBuf>),
    }

    Ok(
        Option::<OneOrMany>::deserialize(deserializer)?.map(|value| match value {
            OneOrMany::One(path) => vec![path],
            OneOrMany::Many(paths) => paths,
        }),
    )
}
