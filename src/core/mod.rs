// src/core/mod.rs

/// Typed configuration: property sources, `.properties` loading and the
/// list of recognised keys.
pub mod config;

/// `ConnectorDetails`, the resolved description of a remote endpoint.
pub mod connector;

/// Error types shared by the connector and scanner modules.
pub mod error;

/// Host descriptors, HTTP clients and their TLS trust policies.
pub mod http;

/// Thin wrapper that drives an external static-analysis engine.
pub mod scanner;
