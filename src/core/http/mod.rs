// src/core/http/mod.rs

//! Builds target-host descriptors and HTTP clients from connector details.
//!
//! Nothing here is cached: every call derives a fresh host or client, so a
//! client's trust policy is fixed for its whole lifetime.

pub mod trust;

use crate::core::connector::ConnectorDetails;
use crate::core::error::ConnectorError;
use reqwest::{Method, Response};
use std::fmt;
use tracing::{debug, error, info, warn};
use url::Url;

pub use self::trust::TrustPolicy;

const USER_AGENT: &str = concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION"));

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, strum::Display, strum::EnumString, strum::AsRefStr)]
#[strum(serialize_all = "lowercase")]
pub enum Scheme {
    Http,
    Https,
}

/// Scheme, host and port of the endpoint a connector talks to.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct HostDescriptor {
    scheme: Scheme,
    host: String,
    port: u16,
}

impl HostDescriptor {
    pub fn new(scheme: Scheme, host: impl Into<String>, port: u16) -> Self {
        Self { scheme, host: host.into(), port }
    }

    pub fn scheme(&self) -> Scheme {
        self.scheme
    }

    pub fn host(&self) -> &str {
        &self.host
    }

    pub fn port(&self) -> u16 {
        self.port
    }

    pub fn base_url(&self) -> Result<Url, url::ParseError> {
        Url::parse(&self.to_string())
    }

    /// Resolves `path` (optionally with a query) against this host.
    ///
    /// The path only replaces the path and query of the URL; it can never
    /// point the request at another host.
    pub fn url(&self, path: &str) -> Result<Url, url::ParseError> {
        let mut url = self.base_url()?;
        let (path, query) = match path.split_once('?') {
            Some((path, query)) => (path, Some(query)),
            None => (path, None),
        };
        url.set_path(path);
        url.set_query(query);
        Ok(url)
    }
}

impl fmt::Display for HostDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.host.contains(':') && !self.host.starts_with('[') {
            write!(f, "{}://[{}]:{}", self.scheme, self.host, self.port)
        } else {
            write!(f, "{}://{}:{}", self.scheme, self.host, self.port)
        }
    }
}

/// Stateless builder for connector hosts and clients.
#[derive(Debug, Clone, Copy, Default)]
pub struct HttpHelper;

impl HttpHelper {
    pub fn new() -> Self {
        Self
    }

    pub fn build_http_host(&self, details: &ConnectorDetails) -> HostDescriptor {
        let scheme = if details.is_https() { Scheme::Https } else { Scheme::Http };
        HostDescriptor::new(scheme, details.host(), details.port())
    }

    /// Builds a client whose trust policy follows `details.is_verify_ssl()`.
    ///
    /// A client built for an `https` host refuses plain-HTTP URLs, including
    /// redirects to them.
    pub fn build_client(&self, host: &HostDescriptor, details: &ConnectorDetails) -> Result<HttpClient, ConnectorError> {
        let policy = TrustPolicy::for_connector(details);
        info!(%host, %policy, "Building HTTP client.");

        match (host.scheme(), policy.is_verifying()) {
            (Scheme::Https, false) => {
                warn!(%host, "Certificate and hostname verification are disabled for this connector.")
            }
            (Scheme::Http, true) => debug!(%host, "Plain HTTP target, TLS verification settings have no effect."),
            _ => {}
        }

        let tls = policy.client_config()?;
        let inner = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .use_preconfigured_tls(tls)
            .https_only(host.scheme() == Scheme::Https)
            .build()
            .map_err(|e| {
                error!(error = %e, "Failed to build HTTP client.");
                ConnectorError::ClientBuild(e)
            })?;

        Ok(HttpClient { inner, policy })
    }
}

/// HTTP client bound to a single trust policy.
///
/// Dropping the client closes its pooled connections.
#[derive(Debug)]
pub struct HttpClient {
    inner: reqwest::Client,
    policy: TrustPolicy,
}

impl HttpClient {
    pub fn trust_policy(&self) -> &TrustPolicy {
        &self.policy
    }

    pub async fn execute(&self, host: &HostDescriptor, method: Method, path: &str) -> Result<Response, ConnectorError> {
        let url = host.url(path)?;
        debug!(%url, %method, "Sending request.");

        match self.inner.request(method, url.clone()).send().await {
            Ok(response) => {
                info!(%url, status = %response.status(), "Received HTTP response.");
                Ok(response)
            }
            Err(e) => {
                let err = trust::classify_request_error(e, &self.policy);
                error!(%url, error = %err, "HTTP request failed.");
                Err(err)
            }
        }
    }

    pub async fn get(&self, host: &HostDescriptor, path: &str) -> Result<Response, ConnectorError> {
        self.execute(host, Method::GET, path).await
    }
}
