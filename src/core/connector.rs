// src/core/connector.rs

use crate::core::config::{ConfigSource, GeneralOption};
use crate::core::error::ConfigError;
use std::path::{Path, PathBuf};

/// Resolved, typed description of how to reach and trust a remote endpoint.
///
/// Built once from a configuration source and never mutated afterwards.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConnectorDetails {
    host: String,
    port: u16,
    use_https: bool,
    verify_ssl: bool,
    trust_store: Option<PathBuf>,
}

impl ConnectorDetails {
    pub fn from_config(config: &impl ConfigSource) -> Result<Self, ConfigError> {
        let host = config
            .option(GeneralOption::Host)
            .ok_or(ConfigError::Missing { key: GeneralOption::Host.key() })?;
        let host = host.trim();
        if host.is_empty() {
            return Err(ConfigError::Empty { key: GeneralOption::Host.key() });
        }

        let port = config
            .option(GeneralOption::Port)
            .ok_or(ConfigError::Missing { key: GeneralOption::Port.key() })?;

        let trust_store = config
            .option(GeneralOption::TrustStore)
            .map(|path| path.trim().to_string())
            .filter(|path| !path.is_empty())
            .map(PathBuf::from);

        Ok(Self {
            host: host.to_string(),
            port: parse_port(GeneralOption::Port.key(), &port)?,
            use_https: parse_flag(config, GeneralOption::UseHttps)?,
            verify_ssl: parse_flag(config, GeneralOption::VerifySsl)?,
            trust_store,
        })
    }

    pub fn host(&self) -> &str {
        &self.host
    }

    pub fn port(&self) -> u16 {
        self.port
    }

    pub fn is_https(&self) -> bool {
        self.use_https
    }

    pub fn is_verify_ssl(&self) -> bool {
        self.verify_ssl
    }

    /// PEM bundle that replaces the default roots when verification is on.
    pub fn trust_store(&self) -> Option<&Path> {
        self.trust_store.as_deref()
    }
}

fn parse_port(key: &'static str, value: &str) -> Result<u16, ConfigError> {
    match value.trim().parse::<u16>() {
        Ok(port) if port != 0 => Ok(port),
        _ => Err(ConfigError::InvalidPort { key, value: value.to_string() }),
    }
}

fn parse_flag(config: &impl ConfigSource, option: GeneralOption) -> Result<bool, ConfigError> {
    let key = option.key();
    let value = config.option(option).ok_or(ConfigError::Missing { key })?;
    match value.trim().to_ascii_lowercase().as_str() {
        "true" => Ok(true),
        "false" => Ok(false),
        _ => Err(ConfigError::InvalidFlag { key, value }),
    }
}
