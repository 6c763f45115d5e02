// src/core/http/trust.rs

//! TLS trust policies for connector clients.
//!
//! A policy is chosen once, when the client is built. `Strict` validates the
//! certificate chain against a root store and then the hostname, reporting the
//! two failures separately. `TrustAll` accepts any certificate for any name
//! but still checks handshake signatures, so traffic stays encrypted.

use crate::core::connector::ConnectorDetails;
use crate::core::error::ConnectorError;
use chrono::{DateTime, Utc};
use rustls::client::danger::{HandshakeSignatureValid, ServerCertVerified, ServerCertVerifier};
use rustls::client::{verify_server_cert_signed_by_trust_anchor, verify_server_name};
use rustls::crypto::{WebPkiSupportedAlgorithms, verify_tls12_signature, verify_tls13_signature};
use rustls::pki_types::pem::PemObject;
use rustls::pki_types::{CertificateDer, ServerName, UnixTime};
use rustls::server::ParsedCertificate;
use rustls::{ClientConfig, DigitallySignedStruct, OtherError, RootCertStore, SignatureScheme};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, error, info, warn};
use x509_parser::prelude::*;

#[derive(Debug, Clone, PartialEq, Eq, strum::Display)]
#[strum(serialize_all = "kebab-case")]
pub enum TrustPolicy {
    /// Chain and hostname are verified. `trust_store` replaces the default
    /// roots when set.
    Strict { trust_store: Option<PathBuf> },
    /// Any certificate is accepted for any hostname.
    TrustAll,
}

impl TrustPolicy {
    pub fn for_connector(details: &ConnectorDetails) -> Self {
        if details.is_verify_ssl() {
            TrustPolicy::Strict {
                trust_store: details.trust_store().map(Path::to_path_buf),
            }
        } else {
            TrustPolicy::TrustAll
        }
    }

    pub fn is_verifying(&self) -> bool {
        matches!(self, TrustPolicy::Strict { .. })
    }

    /// Builds the rustls configuration that enforces this policy.
    pub fn client_config(&self) -> Result<ClientConfig, ConnectorError> {
        let provider = Arc::new(rustls::crypto::ring::default_provider());
        let algorithms = provider.signature_verification_algorithms;

        let verifier: Arc<dyn ServerCertVerifier> = match self {
            TrustPolicy::Strict { trust_store } => {
                let roots = match trust_store {
                    Some(path) => load_trust_store(path)?,
                    None => default_roots(),
                };
                Arc::new(StrictVerifier { roots: Arc::new(roots), algorithms })
            }
            TrustPolicy::TrustAll => Arc::new(AcceptAnyCertificate { algorithms }),
        };

        // The strict verifier runs the stock webpki checks in two steps, so both
        // variants are installed through the same custom-verifier hook.
        let mut config = ClientConfig::builder_with_provider(provider)
            .with_safe_default_protocol_versions()
            .map_err(ConnectorError::Tls)?
            .dangerous()
            .with_custom_certificate_verifier(verifier)
            .with_no_client_auth();
        config.alpn_protocols = vec![b"h2".to_vec(), b"http/1.1".to_vec()];
        Ok(config)
    }
}

fn default_roots() -> RootCertStore {
    RootCertStore {
        roots: webpki_roots::TLS_SERVER_ROOTS.to_vec(),
    }
}

/// Reads every certificate of a PEM bundle into a fresh root store.
pub fn load_trust_store(path: &Path) -> Result<RootCertStore, ConnectorError> {
    let trust_store_error = |reason: String| {
        error!(path = %path.display(), %reason, "Failed to load trust store.");
        ConnectorError::TrustStore { path: path.to_path_buf(), reason }
    };

    let mut roots = RootCertStore::empty();
    let certs = CertificateDer::pem_file_iter(path).map_err(|e| trust_store_error(e.to_string()))?;
    for cert in certs {
        let cert = cert.map_err(|e| trust_store_error(e.to_string()))?;
        roots.add(cert).map_err(|e| trust_store_error(e.to_string()))?;
    }
    if roots.is_empty() {
        return Err(trust_store_error("no certificates found".to_string()));
    }

    info!(path = %path.display(), anchors = roots.len(), "Loaded trust store.");
    Ok(roots)
}

/// Raised by [`StrictVerifier`] when the chain is trusted but the certificate
/// does not cover the requested name.
#[derive(Debug, Error)]
#[error("certificate is not valid for {server_name}")]
struct HostnameMismatch {
    server_name: String,
    #[source]
    cause: rustls::Error,
}

#[derive(Debug)]
struct StrictVerifier {
    roots: Arc<RootCertStore>,
    algorithms: WebPkiSupportedAlgorithms,
}

impl ServerCertVerifier for StrictVerifier {
    fn verify_server_cert(
        &self,
        end_entity: &CertificateDer<'_>,
        intermediates: &[CertificateDer<'_>],
        server_name: &ServerName<'_>,
        _ocsp_response: &[u8],
        now: UnixTime,
    ) -> Result<ServerCertVerified, rustls::Error> {
        let cert = ParsedCertificate::try_from(end_entity)?;

        verify_server_cert_signed_by_trust_anchor(&cert, &self.roots, intermediates, now, self.algorithms.all)
            .inspect_err(|e| debug!(server = %server_name.to_str(), error = %e, "Certificate chain rejected."))?;

        verify_server_name(&cert, server_name).map_err(|cause| {
            debug!(server = %server_name.to_str(), error = %cause, "Certificate hostname rejected.");
            rustls::Error::Other(OtherError(Arc::new(HostnameMismatch {
                server_name: server_name.to_str().into_owned(),
                cause,
            })))
        })?;

        Ok(ServerCertVerified::assertion())
    }

    fn verify_tls12_signature(
        &self,
        message: &[u8],
        cert: &CertificateDer<'_>,
        dss: &DigitallySignedStruct,
    ) -> Result<HandshakeSignatureValid, rustls::Error> {
        verify_tls12_signature(message, cert, dss, &self.algorithms)
    }

    fn verify_tls13_signature(
        &self,
        message: &[u8],
        cert: &CertificateDer<'_>,
        dss: &DigitallySignedStruct,
    ) -> Result<HandshakeSignatureValid, rustls::Error> {
        verify_tls13_signature(message, cert, dss, &self.algorithms)
    }

    fn supported_verify_schemes(&self) -> Vec<SignatureScheme> {
        self.algorithms.supported_schemes()
    }
}

#[derive(Debug)]
struct AcceptAnyCertificate {
    algorithms: WebPkiSupportedAlgorithms,
}

impl ServerCertVerifier for AcceptAnyCertificate {
    fn verify_server_cert(
        &self,
        end_entity: &CertificateDer<'_>,
        _intermediates: &[CertificateDer<'_>],
        server_name: &ServerName<'_>,
        _ocsp_response: &[u8],
        _now: UnixTime,
    ) -> Result<ServerCertVerified, rustls::Error> {
        let server = server_name.to_str();
        match parse_x509_certificate(end_entity.as_ref()) {
            Ok((_, x509)) => warn!(
                %server,
                subject = %x509.subject(),
                issuer = %x509.issuer(),
                not_after = %asn1_time_to_chrono_utc(&x509.validity().not_after),
                "Accepting server certificate without verification."
            ),
            Err(e) => warn!(%server, error = %e, "Accepting unparseable server certificate without verification."),
        }
        Ok(ServerCertVerified::assertion())
    }

    fn verify_tls12_signature(
        &self,
        message: &[u8],
        cert: &CertificateDer<'_>,
        dss: &DigitallySignedStruct,
    ) -> Result<HandshakeSignatureValid, rustls::Error> {
        verify_tls12_signature(message, cert, dss, &self.algorithms)
    }

    fn verify_tls13_signature(
        &self,
        message: &[u8],
        cert: &CertificateDer<'_>,
        dss: &DigitallySignedStruct,
    ) -> Result<HandshakeSignatureValid, rustls::Error> {
        verify_tls13_signature(message, cert, dss, &self.algorithms)
    }

    fn supported_verify_schemes(&self) -> Vec<SignatureScheme> {
        self.algorithms.supported_schemes()
    }
}

fn asn1_time_to_chrono_utc(time: &ASN1Time) -> DateTime<Utc> {
    DateTime::from_timestamp(time.timestamp(), 0).unwrap_or_default()
}

/// Maps a failed request onto the connector error taxonomy.
///
/// Handshake and peer-identity kinds are only reported under a verifying
/// policy; with `TrustAll` every TLS failure is a plain request error.
pub(crate) fn classify_request_error(err: reqwest::Error, policy: &TrustPolicy) -> ConnectorError {
    if !policy.is_verifying() {
        return ConnectorError::Request(err);
    }
    let Some(tls) = find_tls_error(&err) else {
        return ConnectorError::Request(err);
    };
    if let rustls::Error::Other(other) = tls {
        if let Some(mismatch) = other.0.downcast_ref::<HostnameMismatch>() {
            return ConnectorError::PeerUnverified {
                server_name: mismatch.server_name.clone(),
            };
        }
    }
    ConnectorError::Handshake(tls.clone())
}

fn find_tls_error<'a>(err: &'a (dyn std::error::Error + 'static)) -> Option<&'a rustls::Error> {
    let mut current = Some(err);
    while let Some(e) = current {
        if let Some(tls) = e.downcast_ref::<rustls::Error>() {
            return Some(tls);
        }
        // io::Error hides its payload from `source()`.
        current = match e.downcast_ref::<std::io::Error>().and_then(|io| io.get_ref()) {
            Some(inner) => Some(inner as &(dyn std::error::Error + 'static)),
            None => e.source(),
        };
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::config::Configuration;
    use rustls::CertificateError;

    fn details(verify: &str) -> ConnectorDetails {
        ConnectorDetails::from_config(&Configuration::from_pairs([
            ("connector.host", "localhost"),
            ("connector.port", "8443"),
            ("connector.useHttps", "true"),
            ("connector.verifySsl", verify),
        ]))
        .unwrap()
    }

    #[test]
    fn verification_flag_selects_policy() {
        assert_eq!(TrustPolicy::for_connector(&details("true")), TrustPolicy::Strict { trust_store: None });
        assert_eq!(TrustPolicy::for_connector(&details("false")), TrustPolicy::TrustAll);
        assert!(TrustPolicy::for_connector(&details("true")).is_verifying());
        assert!(!TrustPolicy::TrustAll.is_verifying());
    }

    #[test]
    fn policies_render_their_names() {
        assert_eq!(TrustPolicy::TrustAll.to_string(), "trust-all");
        assert_eq!(TrustPolicy::Strict { trust_store: None }.to_string(), "strict");
    }

    #[test]
    fn both_policies_build_a_config() {
        assert!(TrustPolicy::Strict { trust_store: None }.client_config().is_ok());
        assert!(TrustPolicy::TrustAll.client_config().is_ok());
    }

    #[test]
    fn missing_trust_store_is_an_error() {
        let policy = TrustPolicy::Strict {
            trust_store: Some(PathBuf::from("/no/such/bundle.pem")),
        };
        assert!(matches!(policy.client_config(), Err(ConnectorError::TrustStore { .. })));
    }

    #[test]
    fn trust_store_without_certificates_is_an_error() {
        let file = tempfile::NamedTempFile::new().unwrap();
        std::fs::write(file.path(), "not a certificate\n").unwrap();
        let err = load_trust_store(file.path()).unwrap_err();
        assert!(matches!(err, ConnectorError::TrustStore { ref reason, .. } if reason == "no certificates found"));
    }

    #[test]
    fn finds_rustls_error_inside_io_error() {
        let io = std::io::Error::new(
            std::io::ErrorKind::InvalidData,
            rustls::Error::InvalidCertificate(CertificateError::UnknownIssuer),
        );
        let found = find_tls_error(&io).cloned();
        assert_eq!(found, Some(rustls::Error::InvalidCertificate(CertificateError::UnknownIssuer)));
    }

    #[test]
    fn hostname_mismatch_is_recognised_through_other_error() {
        let tls = rustls::Error::Other(OtherError(Arc::new(HostnameMismatch {
            server_name: "127.0.0.1".to_string(),
            cause: rustls::Error::InvalidCertificate(CertificateError::NotValidForName),
        })));
        let io = std::io::Error::new(std::io::ErrorKind::InvalidData, tls);
        match find_tls_error(&io) {
            Some(rustls::Error::Other(other)) => {
                let mismatch = other.0.downcast_ref::<HostnameMismatch>().unwrap();
                assert_eq!(mismatch.server_name, "127.0.0.1");
            }
            other => panic!("unexpected: {other:?}"),
        }
    }
}
