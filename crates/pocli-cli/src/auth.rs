//! Authenticator variants and their construction from configuration.

use std::fmt;
use std::path::PathBuf;
use std::time::Duration;

use pocli_config::{AuthMethod, Credentials};
use reqwest::{RequestBuilder, Url};
use serde::Deserialize;
use thiserror::Error;
use tokio::sync::OnceCell;
use tracing::debug;

use crate::management::{RemoteError, RemoteResult, classify_problem};
use crate::transport::{TransportError, TransportMode, client_builder};

const TOKEN_OPERATION: &str = "oauth2 token request";

/// Raised when the selected method lacks what it needs.
#[derive(Debug, Error)]
pub(crate) enum AuthConfigError {
    #[error("{method} authentication requires '{field}' to be set")]
    MissingField {
        method: AuthMethod,
        field: &'static str,
    },
    #[error("invalid OAuth2 token URL '{value}'")]
    InvalidTokenUrl {
        value: String,
        source: url::ParseError,
    },
    #[error("failed to prepare the OAuth2 token client")]
    TokenClient { source: TransportError },
}

/// Credential presentation strategy bound to every outbound request.
pub(crate) enum Authenticator {
    Null,
    Basic(BasicAuthenticator),
    OAuth2(OAuth2Authenticator),
}

pub(crate) struct BasicAuthenticator {
    username: String,
    password: String,
}

pub(crate) struct OAuth2Authenticator {
    client_id: String,
    client_secret: String,
    token_url: Url,
    username: String,
    password: String,
    ca_certs: Vec<PathBuf>,
    http: reqwest::Client,
    token: OnceCell<String>,
}

#[derive(Deserialize)]
struct TokenResponse {
    access_token: String,
}

impl Authenticator {
    /// Construct the variant for `method`, taking only the fields it uses.
    pub(crate) fn build(
        method: AuthMethod,
        credentials: &Credentials,
        ca_certs: &[PathBuf],
        timeout: Duration,
    ) -> Result<Self, AuthConfigError> {
        match method {
            AuthMethod::None => Ok(Self::Null),
            AuthMethod::Basic => Ok(Self::Basic(BasicAuthenticator {
                username: required(method, "username", credentials.username.as_ref())?,
                password: required(method, "password", credentials.password.as_ref())?,
            })),
            AuthMethod::OAuth2 => {
                let client_id = required(method, "client_id", credentials.client_id.as_ref())?;
                let client_secret =
                    required(method, "client_secret", credentials.client_secret.as_ref())?;
                let token_url = required(method, "token_url", credentials.token_url.as_ref())?;
                let username = required(method, "username", credentials.username.as_ref())?;
                let password = required(method, "password", credentials.password.as_ref())?;

                let token_url = token_url
                    .parse::<Url>()
                    .map_err(|source| AuthConfigError::InvalidTokenUrl {
                        value: token_url.clone(),
                        source,
                    })?;
                let http = client_builder(TransportMode::Tls, ca_certs, timeout)
                    .and_then(|builder| {
                        builder
                            .build()
                            .map_err(|source| TransportError::Client { source })
                    })
                    .map_err(|source| AuthConfigError::TokenClient { source })?;

                Ok(Self::OAuth2(OAuth2Authenticator {
                    client_id,
                    client_secret,
                    token_url,
                    username,
                    password,
                    ca_certs: ca_certs.to_vec(),
                    http,
                    token: OnceCell::new(),
                }))
            }
        }
    }

    pub(crate) const fn method(&self) -> AuthMethod {
        match self {
            Self::Null => AuthMethod::None,
            Self::Basic(_) => AuthMethod::Basic,
            Self::OAuth2(_) => AuthMethod::OAuth2,
        }
    }

    /// Attach this authenticator's credentials to `request`.
    pub(crate) async fn authorize(&self, request: RequestBuilder) -> RemoteResult<RequestBuilder> {
        match self {
            Self::Null => Ok(request),
            Self::Basic(basic) => Ok(request.basic_auth(&basic.username, Some(&basic.password))),
            Self::OAuth2(oauth) => {
                let token = oauth.access_token().await?;
                Ok(request.bearer_auth(token))
            }
        }
    }
}

impl OAuth2Authenticator {
    /// Fetch the access token on first use and reuse it afterwards.
    async fn access_token(&self) -> RemoteResult<&str> {
        self.token
            .get_or_try_init(|| self.request_token())
            .await
            .map(String::as_str)
    }

    async fn request_token(&self) -> RemoteResult<String> {
        debug!(token_url = %self.token_url, "requesting OAuth2 access token");
        let response = self
            .http
            .post(self.token_url.clone())
            .basic_auth(&self.client_id, Some(&self.client_secret))
            .form(&[
                ("grant_type", "password"),
                ("username", self.username.as_str()),
                ("password", self.password.as_str()),
            ])
            .send()
            .await
            .map_err(|source| RemoteError::Request {
                operation: TOKEN_OPERATION,
                source,
            })?;

        if !response.status().is_success() {
            return Err(classify_problem(TOKEN_OPERATION, response).await);
        }

        let body = response
            .json::<TokenResponse>()
            .await
            .map_err(|source| RemoteError::Decode {
                operation: TOKEN_OPERATION,
                source,
            })?;
        Ok(body.access_token)
    }
}

fn required(
    method: AuthMethod,
    field: &'static str,
    value: Option<&String>,
) -> Result<String, AuthConfigError> {
    value
        .filter(|value| !value.trim().is_empty())
        .cloned()
        .ok_or(AuthConfigError::MissingField { method, field })
}

impl fmt::Debug for Authenticator {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Null => formatter.write_str("Null"),
            Self::Basic(basic) => formatter
                .debug_struct("Basic")
                .field("username", &basic.username)
                .finish_non_exhaustive(),
            Self::OAuth2(oauth) => formatter
                .debug_struct("OAuth2")
                .field("client_id", &oauth.client_id)
                .field("token_url", &oauth.token_url.as_str())
                .field("username", &oauth.username)
                .field("ca_certs", &oauth.ca_certs)
                .finish_non_exhaustive(),
        }
    }
}
