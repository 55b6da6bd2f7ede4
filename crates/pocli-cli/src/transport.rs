//! Endpoint and HTTP client construction for the three transport modes.

use std::fs;
use std::io;
use std::path::PathBuf;
use std::time::Duration;

use pocli_config::Configuration;
use reqwest::header::{HeaderMap, HeaderValue, InvalidHeaderValue};
use reqwest::{Certificate, Client, ClientBuilder, Url};
use thiserror::Error;
use tracing::{debug, warn};

use crate::auth::Authenticator;
use crate::management::ManagementClient;

/// Path of the management API beneath the service root.
pub(crate) const MANAGEMENT_PATH: &str = "/management/v1";
pub(crate) const HEADER_REQUEST_ID: &str = "x-request-id";

/// Failures while preparing the connection to the management service.
#[derive(Debug, Error)]
pub(crate) enum TransportError {
    #[error("failed to read CA certificate '{}'", path.display())]
    CertificateRead { path: PathBuf, source: io::Error },
    #[error("CA certificate '{}' is not a valid PEM certificate", path.display())]
    CertificateParse {
        path: PathBuf,
        source: reqwest::Error,
    },
    #[error("CA certificate file '{}' contains no PEM certificates", path.display())]
    CertificateMissing { path: PathBuf },
    #[error("invalid service endpoint '{value}'")]
    Endpoint {
        value: String,
        source: url::ParseError,
    },
    #[error("request identifier contains invalid characters")]
    RequestId { source: InvalidHeaderValue },
    #[error("failed to build HTTP client")]
    Client { source: reqwest::Error },
}

/// How the connection to the service is secured. Exactly one applies.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum TransportMode {
    /// Plain HTTP.
    Plain,
    /// HTTPS trusting the system roots plus any configured CA certificates.
    Tls,
    /// HTTPS accepting any server certificate. Development only; selected
    /// solely by the explicit `insecure` setting.
    InsecureTls,
}

impl TransportMode {
    /// `insecure` takes precedence over `use_tls`.
    pub(crate) const fn select(insecure: bool, use_tls: bool) -> Self {
        if insecure {
            Self::InsecureTls
        } else if use_tls {
            Self::Tls
        } else {
            Self::Plain
        }
    }

    pub(crate) const fn scheme(self) -> &'static str {
        match self {
            Self::Plain => "http",
            Self::Tls | Self::InsecureTls => "https",
        }
    }
}

/// Base URL of the management API, e.g. `https://host:port/management/v1`.
pub(crate) fn endpoint_url(config: &Configuration) -> Result<Url, TransportError> {
    let mode = TransportMode::select(config.insecure, config.use_tls);
    let value = format!(
        "{}://{}:{}{MANAGEMENT_PATH}",
        mode.scheme(),
        config.host,
        config.port
    );
    value
        .parse::<Url>()
        .map_err(|source| TransportError::Endpoint { value, source })
}

/// Build the management client bound to `authenticator`.
pub(crate) fn build_service(
    config: &Configuration,
    authenticator: Authenticator,
    request_id: &str,
) -> Result<ManagementClient, TransportError> {
    let mode = TransportMode::select(config.insecure, config.use_tls);
    let endpoint = endpoint_url(config)?;

    let mut default_headers = HeaderMap::new();
    let request_id =
        HeaderValue::from_str(request_id).map_err(|source| TransportError::RequestId { source })?;
    default_headers.insert(HEADER_REQUEST_ID, request_id);

    let http = client_builder(mode, &config.ca_certs, config.timeout)?
        .default_headers(default_headers)
        .build()
        .map_err(|source| TransportError::Client { source })?;

    debug!(endpoint = %endpoint, ?mode, auth = %authenticator.method(), "management client ready");
    Ok(ManagementClient::new(http, endpoint, authenticator))
}

/// Client builder configured for `mode`.
pub(crate) fn client_builder(
    mode: TransportMode,
    ca_certs: &[PathBuf],
    timeout: Duration,
) -> Result<ClientBuilder, TransportError> {
    let builder = Client::builder().timeout(timeout);
    match mode {
        TransportMode::Plain => {
            if !ca_certs.is_empty() {
                debug!("ignoring CA certificates for a plain HTTP connection");
            }
            Ok(builder)
        }
        TransportMode::Tls => Ok(load_certificates(ca_certs)?
            .into_iter()
            .fold(builder, ClientBuilder::add_root_certificate)),
        TransportMode::InsecureTls => {
            warn!("TLS certificate verification is disabled; only use --insecure for development");
            Ok(builder.danger_accept_invalid_certs(true))
        }
    }
}

/// Read PEM certificates from disk. A file may hold several certificates
/// but must hold at least one.
pub(crate) fn load_certificates(paths: &[PathBuf]) -> Result<Vec<Certificate>, TransportError> {
    let mut certificates = Vec::new();
    for path in paths {
        let pem = fs::read(path).map_err(|source| TransportError::CertificateRead {
            path: path.clone(),
            source,
        })?;
        let bundle =
            Certificate::from_pem_bundle(&pem).map_err(|source| TransportError::CertificateParse {
                path: path.clone(),
                source,
            })?;
        if bundle.is_empty() {
            return Err(TransportError::CertificateMissing { path: path.clone() });
        }
        debug!(path = %path.display(), count = bundle.len(), "loaded CA certificates");
        certificates.extend(bundle);
    }
    Ok(certificates)
}
