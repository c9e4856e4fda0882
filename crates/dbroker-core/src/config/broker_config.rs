//! Broker configuration types

use crate::error::{Error, Result};
use crate::waiter::WaitPolicy;
use camino::Utf8PathBuf;
use serde::{Deserialize, Serialize};
use std::fs;
use std::time::Duration;

/// Every service id the broker knows how to serve
pub const SERVICE_IDS: &[&str] = &[
    "mysql",
    "postgresql",
    "mongodb",
    "elasticsearch",
    "redis",
    "memcached",
];

/// Top-level broker configuration (dbroker.yaml)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct BrokerConfig {
    /// Connection to the resource-management API
    #[serde(default)]
    pub cluster: ClusterConfig,

    /// Namespace used when a request names none
    #[serde(default = "default_namespace")]
    pub namespace: String,

    /// Storage class for demo plans
    #[serde(default = "default_storage_class")]
    pub storage_class: String,

    /// Enabled service ids
    #[serde(default = "default_services")]
    pub services: Vec<String>,

    /// Poll timings
    #[serde(default)]
    pub wait: WaitConfig,
}

impl Default for BrokerConfig {
    fn default() -> Self {
        Self {
            cluster: ClusterConfig::default(),
            namespace: default_namespace(),
            storage_class: default_storage_class(),
            services: default_services(),
            wait: WaitConfig::default(),
        }
    }
}

fn default_namespace() -> String {
    "default".to_string()
}

fn default_storage_class() -> String {
    "standard".to_string()
}

fn default_services() -> Vec<String> {
    SERVICE_IDS.iter().map(|s| s.to_string()).collect()
}

impl BrokerConfig {
    /// Check values that serde cannot
    pub fn validate(&self) -> Result<()> {
        if self.namespace.trim().is_empty() {
            return Err(Error::invalid_config("namespace must not be empty"));
        }
        if self.wait.poll_interval_ms == 0 {
            return Err(Error::invalid_config("wait.poll-interval-ms must be positive"));
        }
        if let Some(unknown) = self
            .services
            .iter()
            .find(|s| !SERVICE_IDS.contains(&s.as_str()))
        {
            return Err(Error::invalid_config(format!(
                "unknown service {:?}; valid services: {}",
                unknown,
                SERVICE_IDS.join(", ")
            )));
        }
        Ok(())
    }
}

/// Connection settings for the resource-management API
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct ClusterConfig {
    /// API server base URL
    #[serde(default)]
    pub api_server: Option<String>,

    /// Bearer token
    #[serde(default)]
    pub token: Option<String>,

    /// File holding the bearer token (read on use)
    #[serde(default)]
    pub token_file: Option<Utf8PathBuf>,

    /// PEM bundle used to verify the API server
    #[serde(default)]
    pub ca_file: Option<Utf8PathBuf>,

    /// Skip TLS verification
    #[serde(default)]
    pub insecure_skip_tls_verify: bool,

    /// Per-request timeout in seconds
    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,
}

fn default_request_timeout() -> u64 {
    30
}

impl Default for ClusterConfig {
    fn default() -> Self {
        Self {
            api_server: None,
            token: None,
            token_file: None,
            ca_file: None,
            insecure_skip_tls_verify: false,
            request_timeout_secs: default_request_timeout(),
        }
    }
}

impl ClusterConfig {
    /// The bearer token, reading `token-file` when no inline token is set
    pub fn bearer_token(&self) -> Result<Option<String>> {
        if let Some(token) = &self.token {
            return Ok(Some(token.clone()));
        }
        match &self.token_file {
            Some(path) => Ok(Some(fs::read_to_string(path)?.trim().to_string())),
            None => Ok(None),
        }
    }

    /// Per-request timeout
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

/// Poll timings
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct WaitConfig {
    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,

    #[serde(default = "default_readiness_timeout_secs")]
    pub readiness_timeout_secs: u64,

    #[serde(default = "default_teardown_timeout_secs")]
    pub teardown_timeout_secs: u64,
}

impl Default for WaitConfig {
    fn default() -> Self {
        Self {
            poll_interval_ms: default_poll_interval_ms(),
            readiness_timeout_secs: default_readiness_timeout_secs(),
            teardown_timeout_secs: default_teardown_timeout_secs(),
        }
    }
}

fn default_poll_interval_ms() -> u64 {
    2000
}
fn default_readiness_timeout_secs() -> u64 {
    600
}
fn default_teardown_timeout_secs() -> u64 {
    300
}

impl WaitConfig {
    /// Policy for provisioning waits
    pub fn readiness(&self) -> WaitPolicy {
        WaitPolicy::new(
            Duration::from_millis(self.poll_interval_ms),
            Duration::from_secs(self.readiness_timeout_secs),
        )
    }

    /// Policy for teardown waits
    pub fn teardown(&self) -> WaitPolicy {
        WaitPolicy::new(
            Duration::from_millis(self.poll_interval_ms),
            Duration::from_secs(self.teardown_timeout_secs),
        )
    }
}
