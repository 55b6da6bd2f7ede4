//! Client for the policy management service.
//!
//! # Design
//! - `PolicyService` is the seam between command handlers and the wire; the
//!   reqwest-backed `ManagementClient` is the only production implementation.
//! - Every call is a single request/response. Failures are returned as-is,
//!   never retried.

use std::fmt;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::header::CONTENT_TYPE;
use reqwest::{Client, RequestBuilder, Response, StatusCode, Url};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, info};
use uuid::Uuid;

use crate::auth::Authenticator;

/// Media type the service expects for OPA rule payloads.
pub(crate) const POLICY_MEDIA_TYPE: &str = "application/vnd.veraison.policy.opa";

/// A policy as stored by the management service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub(crate) struct Policy {
    pub(crate) uuid: Uuid,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub(crate) ctime: Option<DateTime<Utc>>,
    #[serde(default)]
    pub(crate) name: String,
    #[serde(rename = "type", default)]
    pub(crate) policy_type: String,
    #[serde(default)]
    pub(crate) rules: String,
    #[serde(default)]
    pub(crate) active: bool,
}

impl Policy {
    /// Rules payload as raw bytes.
    pub(crate) fn rules_bytes(&self) -> &[u8] {
        self.rules.as_bytes()
    }
}

/// Failure reported by (or while reaching) a remote endpoint.
#[derive(Debug, Error)]
pub(crate) enum RemoteError {
    #[error("{operation} request failed")]
    Request {
        operation: &'static str,
        source: reqwest::Error,
    },
    #[error("{operation} failed with status {status}: {message}")]
    Status {
        operation: &'static str,
        status: StatusCode,
        message: String,
    },
    #[error("failed to decode {operation} response")]
    Decode {
        operation: &'static str,
        source: reqwest::Error,
    },
    #[error("cannot build {operation} URL from endpoint '{endpoint}'")]
    Url {
        operation: &'static str,
        endpoint: String,
    },
}

pub(crate) type RemoteResult<T> = Result<T, RemoteError>;

/// Remote operations exposed by the management service.
#[async_trait]
pub(crate) trait PolicyService: Send + Sync {
    /// Base URL of the management API.
    fn endpoint(&self) -> &Url;
    async fn create_policy(
        &self,
        scheme: &str,
        rules: Vec<u8>,
        name: Option<&str>,
    ) -> RemoteResult<Policy>;
    async fn get_policy(&self, scheme: &str, id: Uuid) -> RemoteResult<Policy>;
    async fn get_active_policy(&self, scheme: &str) -> RemoteResult<Policy>;
    async fn get_policies(&self, scheme: &str, name: Option<&str>) -> RemoteResult<Vec<Policy>>;
    async fn activate_policy(&self, scheme: &str, id: Uuid) -> RemoteResult<()>;
    async fn deactivate_all_policies(&self, scheme: &str) -> RemoteResult<()>;
    async fn get_supported_schemes(&self) -> RemoteResult<Vec<String>>;
}

/// reqwest-backed management client bound to one authenticator.
pub(crate) struct ManagementClient {
    http: Client,
    endpoint: Url,
    authenticator: Authenticator,
}

impl ManagementClient {
    pub(crate) const fn new(http: Client, endpoint: Url, authenticator: Authenticator) -> Self {
        Self {
            http,
            endpoint,
            authenticator,
        }
    }

    fn url(&self, operation: &'static str, segments: &[&str]) -> RemoteResult<Url> {
        let mut url = self.endpoint.clone();
        url.path_segments_mut()
            .map_err(|()| RemoteError::Url {
                operation,
                endpoint: self.endpoint.to_string(),
            })?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    async fn send(&self, operation: &'static str, request: RequestBuilder) -> RemoteResult<Response> {
        let request = self.authenticator.authorize(request).await?;
        let response = request
            .send()
            .await
            .map_err(|source| RemoteError::Request { operation, source })?;
        debug!(operation, status = %response.status(), "management response");

        if response.status().is_success() {
            Ok(response)
        } else {
            Err(classify_problem(operation, response).await)
        }
    }

    async fn fetch<T: DeserializeOwned + Send>(
        &self,
        operation: &'static str,
        url: Url,
    ) -> RemoteResult<T> {
        self.send(operation, self.http.get(url))
            .await?
            .json::<T>()
            .await
            .map_err(|source| RemoteError::Decode { operation, source })
    }
}

#[async_trait]
impl PolicyService for ManagementClient {
    fn endpoint(&self) -> &Url {
        &self.endpoint
    }

    async fn create_policy(
        &self,
        scheme: &str,
        rules: Vec<u8>,
        name: Option<&str>,
    ) -> RemoteResult<Policy> {
        const OPERATION: &str = "create policy";
        let mut url = self.url(OPERATION, &["policy", scheme])?;
        if let Some(name) = name.filter(|name| !name.is_empty()) {
            url.query_pairs_mut().append_pair("name", name);
        }

        let request = self
            .http
            .post(url)
            .header(CONTENT_TYPE, POLICY_MEDIA_TYPE)
            .body(rules);
        let policy = self
            .send(OPERATION, request)
            .await?
            .json::<Policy>()
            .await
            .map_err(|source| RemoteError::Decode {
                operation: OPERATION,
                source,
            })?;
        info!(scheme, policy = %policy.uuid, "policy created");
        Ok(policy)
    }

    async fn get_policy(&self, scheme: &str, id: Uuid) -> RemoteResult<Policy> {
        const OPERATION: &str = "get policy";
        let id = id.to_string();
        let url = self.url(OPERATION, &["policy", scheme, id.as_str()])?;
        self.fetch(OPERATION, url).await
    }

    async fn get_active_policy(&self, scheme: &str) -> RemoteResult<Policy> {
        const OPERATION: &str = "get active policy";
        let url = self.url(OPERATION, &["policy", scheme])?;
        self.fetch(OPERATION, url).await
    }

    async fn get_policies(&self, scheme: &str, name: Option<&str>) -> RemoteResult<Vec<Policy>> {
        const OPERATION: &str = "list policies";
        let mut url = self.url(OPERATION, &["policies", scheme])?;
        if let Some(name) = name.filter(|name| !name.is_empty()) {
            url.query_pairs_mut().append_pair("name", name);
        }
        self.fetch(OPERATION, url).await
    }

    async fn activate_policy(&self, scheme: &str, id: Uuid) -> RemoteResult<()> {
        const OPERATION: &str = "activate policy";
        let id_segment = id.to_string();
        let url = self.url(OPERATION, &["policy", scheme, id_segment.as_str(), "activate"])?;
        self.send(OPERATION, self.http.post(url)).await?;
        info!(scheme, policy = %id, "policy activated");
        Ok(())
    }

    async fn deactivate_all_policies(&self, scheme: &str) -> RemoteResult<()> {
        const OPERATION: &str = "deactivate policies";
        let url = self.url(OPERATION, &["policies", scheme, "deactivate"])?;
        self.send(OPERATION, self.http.post(url)).await?;
        info!(scheme, "all policies deactivated");
        Ok(())
    }

    async fn get_supported_schemes(&self) -> RemoteResult<Vec<String>> {
        const OPERATION: &str = "list schemes";
        let url = self.url(OPERATION, &["schemes"])?;
        self.fetch(OPERATION, url).await
    }
}

impl fmt::Debug for ManagementClient {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter
            .debug_struct("ManagementClient")
            .field("endpoint", &self.endpoint.as_str())
            .field("authenticator", &self.authenticator)
            .finish_non_exhaustive()
    }
}

/// RFC 7807 problem body returned by the service on errors.
#[derive(Debug, Deserialize)]
struct ProblemDetails {
    #[serde(default)]
    title: Option<String>,
    #[serde(default)]
    detail: Option<String>,
}

/// Classify a non-success response into a remote error.
pub(crate) async fn classify_problem(operation: &'static str, response: Response) -> RemoteError {
    let status = response.status();
    let bytes = match response.bytes().await {
        Ok(bytes) => bytes.to_vec(),
        Err(err) => {
            debug!(operation, %status, error = %err, "failed to read error response body");
            Vec::new()
        }
    };

    let body_text = String::from_utf8_lossy(&bytes).trim().to_string();
    let problem = serde_json::from_slice::<ProblemDetails>(&bytes).ok();

    let message = problem
        .and_then(|problem| problem.detail.or(problem.title))
        .filter(|message| !message.is_empty())
        .unwrap_or_else(|| {
            if body_text.is_empty() {
                status
                    .canonical_reason()
                    .unwrap_or("no response body")
                    .to_string()
            } else {
                body_text
            }
        });

    RemoteError::Status {
        operation,
        status,
        message,
    }
}
