//! CLI command implementations

pub mod bind;
pub mod deprovision;
pub mod info;
pub mod provision;
pub mod services;
pub mod unbind;

use anyhow::{Context, Result};
use camino::{Utf8Path, Utf8PathBuf};
use dbroker_core::config::{BrokerConfig, ConfigLoader};
use dbroker_core::params::{self, Parameters};
use dbroker_providers::{Broker, HttpResourceClient};
use std::fs;
use std::sync::Arc;

/// Load the broker configuration
pub fn load_config(path: Option<&Utf8Path>) -> Result<BrokerConfig> {
    ConfigLoader::new()
        .load(path)
        .context("Failed to load dbroker configuration")
}

/// Build a broker talking to the configured API server
pub fn connect(config_path: Option<&Utf8Path>) -> Result<Broker> {
    let config = load_config(config_path)?;
    let client = HttpResourceClient::from_config(&config.cluster)
        .context("Failed to create API client")?;
    Ok(Broker::from_config(&config, Arc::new(client))?)
}

/// Parse `--params`: inline JSON, or `@path` to read JSON from a file
pub fn read_params(raw: Option<&str>) -> Result<Parameters> {
    let Some(raw) = raw else {
        return Ok(Parameters::new());
    };

    let text = match raw.strip_prefix('@') {
        Some(path) => {
            let path = Utf8PathBuf::from(path);
            fs::read_to_string(&path)
                .with_context(|| format!("Failed to read parameters from {}", path))?
        }
        None => raw.to_string(),
    };
    params::parse(&text).context("Invalid --params")
}
