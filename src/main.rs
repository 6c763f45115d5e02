// src/main.rs

use clap::{Parser, Subcommand};
use color_eyre::eyre::{Result, WrapErr, eyre};
use connector_http::core::config::{Configuration, GeneralOption};
use connector_http::core::connector::ConnectorDetails;
use connector_http::core::http::{HttpHelper, Scheme};
use connector_http::logging::initialize_logging;
use std::path::PathBuf;
use strum::IntoEnumIterator;
use tracing::info;

#[derive(Parser)]
#[command(name = "connector-http", version, about = "Probe an HTTP(S) connector endpoint")]
struct Cli {
    /// Mirror log output to standard error
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Build the connector client from configuration and issue one GET request
    Probe {
        /// Properties file to load; later files override earlier ones
        #[arg(short, long = "config")]
        configs: Vec<PathBuf>,

        /// Override a single property, e.g. -D connector.verifySsl=false
        #[arg(short = 'D', value_name = "KEY=VALUE", value_parser = parse_override)]
        overrides: Vec<(String, String)>,

        /// Request path
        #[arg(default_value = "/")]
        path: String,
    },
    /// List the recognised configuration keys and their defaults
    Options,
}

fn parse_override(raw: &str) -> Result<(String, String), String> {
    raw.split_once('=')
        .map(|(k, v)| (k.trim().to_string(), v.trim().to_string()))
        .filter(|(k, _)| !k.is_empty())
        .ok_or_else(|| format!("expected KEY=VALUE, got {raw:?}"))
}

#[tokio::main]
async fn main() -> Result<()> {
    color_eyre::install()?;
    let cli = Cli::parse();
    let log_path = initialize_logging(cli.verbose)?;
    info!(log = %log_path.display(), "Logging initialized.");

    match cli.command {
        Command::Probe { configs, overrides, path } => probe(configs, overrides, &path).await,
        Command::Options => {
            for option in GeneralOption::iter() {
                println!("{:<28} {}", option.key(), option.default_value().unwrap_or("-"));
            }
            Ok(())
        }
    }
}

async fn probe(configs: Vec<PathBuf>, overrides: Vec<(String, String)>, path: &str) -> Result<()> {
    let mut configuration = Configuration::load(configs.as_slice()).wrap_err("failed to load configuration")?;
    for (key, value) in overrides {
        configuration.set(key, value);
    }

    let details = ConnectorDetails::from_config(&configuration).wrap_err("invalid connector configuration")?;
    let helper = HttpHelper::new();
    let host = helper.build_http_host(&details);
    let client = helper.build_client(&host, &details)?;

    let response = client.get(&host, path).await.map_err(|e| {
        let kind = if e.is_handshake() {
            "TLS handshake failure"
        } else if e.is_peer_unverified() {
            "peer identity failure"
        } else {
            "request failure"
        };
        eyre!(e).wrap_err(format!("{kind} while contacting {host}"))
    })?;

    println!("{} {}", host.url(path)?, response.status());
    if !client.trust_policy().is_verifying() && host.scheme() == Scheme::Https {
        eprintln!("warning: certificate verification was disabled for this request");
    }
    Ok(())
}
