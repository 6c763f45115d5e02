// src/lib.rs

pub mod core;
pub mod logging;

pub use crate::core::config::{ConfigSource, Configuration, GeneralOption};
pub use crate::core::connector::ConnectorDetails;
pub use crate::core::error::{ConfigError, ConnectorError, ScannerError};
pub use crate::core::http::{HostDescriptor, HttpClient, HttpHelper, Scheme, TrustPolicy};
