// src/core/error.rs

use std::path::PathBuf;
use thiserror::Error;

/// Failures while resolving configuration into typed values.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing required property `{key}`")]
    Missing { key: &'static str },

    #[error("property `{key}` must not be empty")]
    Empty { key: &'static str },

    #[error("property `{key}` is not a valid port: {value:?}")]
    InvalidPort { key: &'static str, value: String },

    #[error("property `{key}` must be `true` or `false`, got {value:?}")]
    InvalidFlag { key: &'static str, value: String },

    #[error("can't read configuration file {path}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Failures while building or using a connector client.
///
/// `Handshake` and `PeerUnverified` are kept apart so callers can tell an
/// untrusted issuer from a trusted certificate issued for another name.
#[derive(Debug, Error)]
pub enum ConnectorError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// Raised under the strict policy only. Covers untrusted chains as well
    /// as protocol-level TLS failures such as a plain-HTTP peer.
    #[error("TLS handshake failed: {0}")]
    Handshake(#[source] rustls::Error),

    #[error("peer not verified: certificate is not valid for {server_name}")]
    PeerUnverified { server_name: String },

    #[error("can't load trust store {path}: {reason}")]
    TrustStore { path: PathBuf, reason: String },

    #[error("invalid TLS configuration")]
    Tls(#[source] rustls::Error),

    #[error("failed to build HTTP client")]
    ClientBuild(#[source] reqwest::Error),

    #[error("invalid request URL")]
    Url(#[from] url::ParseError),

    #[error("HTTP request failed")]
    Request(#[source] reqwest::Error),
}

/// Failures raised by the static-analysis scanner wrapper.
#[derive(Debug, Error)]
pub enum ScannerError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("analysis engine failed")]
    Engine(#[source] Box<dyn std::error::Error + Send + Sync>),
}

impl ConnectorError {
    /// True for failures caused by certificate chain validation or any other
    /// TLS-level handshake problem.
    pub fn is_handshake(&self) -> bool {
        matches!(self, ConnectorError::Handshake(_))
    }

    /// True when the chain was trusted but issued for a different host.
    pub fn is_peer_unverified(&self) -> bool {
        matches!(self, ConnectorError::PeerUnverified { .. })
    }
}
