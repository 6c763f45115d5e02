// src/core/config.rs

//! String-keyed configuration, loaded from Java-style `.properties` files or
//! built directly from key/value pairs.

use crate::core::error::ConfigError;
use std::collections::{BTreeMap, HashMap};
use std::path::Path;
use tracing::{debug, info};

/// Every configuration key understood by the crate, with its default value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, strum::EnumIter, strum::IntoStaticStr)]
pub enum GeneralOption {
    #[strum(serialize = "connector.host")]
    Host,
    #[strum(serialize = "connector.port")]
    Port,
    #[strum(serialize = "connector.useHttps")]
    UseHttps,
    #[strum(serialize = "connector.verifySsl")]
    VerifySsl,
    #[strum(serialize = "connector.trustStore")]
    TrustStore,
    #[strum(serialize = "sonar.configurationFiles")]
    SonarProperties,
    #[strum(serialize = "sonar.verbose")]
    SonarVerbose,
}

impl GeneralOption {
    pub fn key(self) -> &'static str {
        self.into()
    }

    pub fn default_value(self) -> Option<&'static str> {
        match self {
            GeneralOption::UseHttps => Some("false"),
            // Verification stays on unless a deployment turns it off.
            GeneralOption::VerifySsl => Some("true"),
            GeneralOption::SonarProperties => Some("sonar-project.properties"),
            GeneralOption::SonarVerbose => Some("false"),
            GeneralOption::Host | GeneralOption::Port | GeneralOption::TrustStore => None,
        }
    }
}

/// A source of string properties.
pub trait ConfigSource {
    fn property(&self, key: &str) -> Option<String>;

    /// Looks up an option, falling back to its default.
    fn option(&self, option: GeneralOption) -> Option<String> {
        self.property(option.key())
            .or_else(|| option.default_value().map(str::to_string))
    }
}

impl ConfigSource for HashMap<String, String> {
    fn property(&self, key: &str) -> Option<String> {
        self.get(key).cloned()
    }
}

impl ConfigSource for BTreeMap<String, String> {
    fn property(&self, key: &str) -> Option<String> {
        self.get(key).cloned()
    }
}

/// An ordered set of properties. Later insertions override earlier ones.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Configuration {
    properties: BTreeMap<String, String>,
}

impl Configuration {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_pairs<I, K, V>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        let properties = pairs
            .into_iter()
            .map(|(k, v)| (k.into(), v.into()))
            .collect();
        Self { properties }
    }

    /// Loads every file in order; a key defined twice keeps the last value.
    pub fn load<P: AsRef<Path>>(paths: &[P]) -> Result<Self, ConfigError> {
        let mut config = Self::new();
        for path in paths {
            config.merge_file(path.as_ref())?;
        }
        Ok(config)
    }

    pub fn merge_file(&mut self, path: &Path) -> Result<(), ConfigError> {
        info!(path = %path.display(), "Loading properties file.");
        let properties = read_properties(path)?;
        debug!(count = properties.len(), "Properties loaded.");
        self.properties.extend(properties);
        Ok(())
    }

    pub fn set(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.properties.insert(key.into(), value.into());
    }

    pub fn properties(&self) -> &BTreeMap<String, String> {
        &self.properties
    }
}

impl ConfigSource for Configuration {
    fn property(&self, key: &str) -> Option<String> {
        self.properties.get(key).cloned()
    }
}

/// Reads a `.properties` file into a map.
pub fn read_properties(path: &Path) -> Result<BTreeMap<String, String>, ConfigError> {
    let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(parse_properties(&content))
}

/// Parses the `.properties` line format.
///
/// Blank lines and lines starting with `#` or `!` are skipped. The key ends at
/// the first `=`, `:` or whitespace; a trailing backslash joins the next line.
pub fn parse_properties(content: &str) -> BTreeMap<String, String> {
    let mut properties = BTreeMap::new();
    let mut logical = String::new();

    for raw in content.lines() {
        let line = if logical.is_empty() {
            raw.trim_start()
        } else {
            raw.trim()
        };
        if logical.is_empty() && (line.is_empty() || line.starts_with('#') || line.starts_with('!')) {
            continue;
        }

        match line.strip_suffix('\\') {
            Some(continued) => {
                logical.push_str(continued);
                continue;
            }
            None => logical.push_str(line),
        }

        if let Some((key, value)) = split_entry(&logical) {
            properties.insert(key, value);
        }
        logical.clear();
    }

    if let Some((key, value)) = split_entry(&logical) {
        properties.insert(key, value);
    }
    properties
}

fn split_entry(line: &str) -> Option<(String, String)> {
    let line = line.trim();
    if line.is_empty() {
        return None;
    }
    let end = line
        .find(|c: char| c == '=' || c == ':' || c.is_whitespace())
        .unwrap_or(line.len());
    let key = &line[..end];
    let mut rest = line[end..].trim_start();
    if let Some(stripped) = rest.strip_prefix(['=', ':']) {
        rest = stripped.trim_start();
    }
    Some((key.to_string(), rest.trim_end().to_string()))
}
