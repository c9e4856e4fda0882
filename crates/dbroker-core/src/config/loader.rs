//! Configuration loading with precedence
//!
//! Sources, low to high:
//! 1. Built-in defaults
//! 2. `~/.dbroker/config.yaml`, or `./dbroker.yaml` when present, or an
//!    explicit path (which must exist)
//! 3. Environment variables (`DBROKER_*` prefix)
//! 4. In-cluster service account, when no API server was configured

use super::BrokerConfig;
use crate::error::{Error, Result};
use camino::{Utf8Path, Utf8PathBuf};
use std::env;
use std::fs;
use tracing::debug;

/// Configuration file name looked up in the working directory
pub const CONFIG_FILE_NAME: &str = "dbroker.yaml";

const SERVICE_ACCOUNT_DIR: &str = "/var/run/secrets/kubernetes.io/serviceaccount";

/// Loads `BrokerConfig` from files and the environment
pub struct ConfigLoader {
    /// Per-user config directory (~/.dbroker)
    config_dir: Option<Utf8PathBuf>,
    /// Directory searched for dbroker.yaml
    working_dir: Utf8PathBuf,
}

impl ConfigLoader {
    /// Loader using the home directory and the current directory
    pub fn new() -> Self {
        let config_dir = dirs::home_dir()
            .and_then(|h| Utf8PathBuf::from_path_buf(h).ok())
            .map(|h| h.join(".dbroker"));
        let working_dir = env::current_dir()
            .ok()
            .and_then(|d| Utf8PathBuf::from_path_buf(d).ok())
            .unwrap_or_else(|| Utf8PathBuf::from("."));
        Self {
            config_dir,
            working_dir,
        }
    }

    /// Loader with explicit directories
    pub fn with_dirs(config_dir: Option<Utf8PathBuf>, working_dir: Utf8PathBuf) -> Self {
        Self {
            config_dir,
            working_dir,
        }
    }

    /// Load configuration from `path`, or search the usual locations
    pub fn load(&self, path: Option<&Utf8Path>) -> Result<BrokerConfig> {
        let mut config = match path {
            Some(p) => self.load_yaml_file(p)?,
            None => match self.find_config() {
                Some(found) => self.load_yaml_file(&found)?,
                None => {
                    debug!("No configuration file found, using defaults");
                    BrokerConfig::default()
                }
            },
        };

        config = self.apply_env_overrides(config)?;
        config = Self::apply_in_cluster(config, Utf8Path::new(SERVICE_ACCOUNT_DIR));
        config.validate()?;
        Ok(config)
    }

    fn find_config(&self) -> Option<Utf8PathBuf> {
        let local = self.working_dir.join(CONFIG_FILE_NAME);
        if local.exists() {
            return Some(local);
        }
        self.config_dir
            .as_ref()
            .map(|d| d.join("config.yaml"))
            .filter(|p| p.exists())
    }

    fn load_yaml_file(&self, path: &Utf8Path) -> Result<BrokerConfig> {
        let content = fs::read_to_string(path).map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                Error::config_not_found(path.as_str())
            } else {
                Error::Io(e)
            }
        })?;
        debug!("Loading configuration from {}", path);
        serde_yaml_ng::from_str(&content)
            .map_err(|e| Error::invalid_config(format!("Failed to parse {}: {}", path, e)))
    }

    /// Apply `DBROKER_*` environment variable overrides
    fn apply_env_overrides(&self, mut config: BrokerConfig) -> Result<BrokerConfig> {
        if let Ok(val) = env::var("DBROKER_API_SERVER") {
            config.cluster.api_server = Some(val);
        }

        if let Ok(val) = env::var("DBROKER_TOKEN") {
            config.cluster.token = Some(val);
        }

        if let Ok(val) = env::var("DBROKER_NAMESPACE") {
            config.namespace = val;
        }

        if let Ok(val) = env::var("DBROKER_STORAGE_CLASS") {
            config.storage_class = val;
        }

        if let Ok(val) = env::var("DBROKER_SERVICES") {
            config.services = val
                .split(',')
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(str::to_string)
                .collect();
        }

        if let Ok(val) = env::var("DBROKER_POLL_INTERVAL_MS") {
            config.wait.poll_interval_ms = val.parse().map_err(|_| {
                Error::invalid_config("DBROKER_POLL_INTERVAL_MS must be a valid number")
            })?;
        }

        if let Ok(val) = env::var("DBROKER_READINESS_TIMEOUT_SECS") {
            config.wait.readiness_timeout_secs = val.parse().map_err(|_| {
                Error::invalid_config("DBROKER_READINESS_TIMEOUT_SECS must be a valid number")
            })?;
        }

        if let Ok(val) = env::var("DBROKER_TEARDOWN_TIMEOUT_SECS") {
            config.wait.teardown_timeout_secs = val.parse().map_err(|_| {
                Error::invalid_config("DBROKER_TEARDOWN_TIMEOUT_SECS must be a valid number")
            })?;
        }

        Ok(config)
    }

    /// Fill the API connection from the pod's service account
    fn apply_in_cluster(mut config: BrokerConfig, sa_dir: &Utf8Path) -> BrokerConfig {
        if config.cluster.api_server.is_some() {
            return config;
        }
        let (Ok(host), Ok(port)) = (
            env::var("KUBERNETES_SERVICE_HOST"),
            env::var("KUBERNETES_SERVICE_PORT"),
        ) else {
            return config;
        };

        let host = if host.contains(':') {
            format!("[{}]", host)
        } else {
            host
        };
        config.cluster.api_server = Some(format!("https://{}:{}", host, port));

        let token = sa_dir.join("token");
        if config.cluster.token.is_none() && config.cluster.token_file.is_none() && token.exists()
        {
            config.cluster.token_file = Some(token);
        }
        let ca = sa_dir.join("ca.crt");
        if config.cluster.ca_file.is_none() && ca.exists() {
            config.cluster.ca_file = Some(ca);
        }
        debug!("Using in-cluster API server {:?}", config.cluster.api_server);
        config
    }
}

impl Default for ConfigLoader {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;
    use tempfile::TempDir;

    fn create_temp_loader() -> (ConfigLoader, TempDir, TempDir) {
        let home = TempDir::new().unwrap();
        let work = TempDir::new().unwrap();
        let loader = ConfigLoader::with_dirs(
            Some(Utf8PathBuf::from_path_buf(home.path().to_path_buf()).expect("Invalid UTF-8 path")),
            Utf8PathBuf::from_path_buf(work.path().to_path_buf()).expect("Invalid UTF-8 path"),
        );
        (loader, home, work)
    }

    #[test]
    #[serial]
    fn test_load_defaults_without_files() {
        let (loader, _home, _work) = create_temp_loader();
        let config = loader.load(None).unwrap();
        assert_eq!(config, {
            let mut expected = BrokerConfig::default();
            expected.cluster = config.cluster.clone();
            expected
        });
        assert_eq!(config.storage_class, "standard");
    }

    #[test]
    #[serial]
    fn test_working_dir_file_wins_over_home() {
        let (loader, home, work) = create_temp_loader();
        fs::write(home.path().join("config.yaml"), "namespace: from-home\n").unwrap();
        fs::write(work.path().join(CONFIG_FILE_NAME), "namespace: from-work\n").unwrap();

        let config = loader.load(None).unwrap();
        assert_eq!(config.namespace, "from-work");
    }

    #[test]
    #[serial]
    fn test_home_config_used_when_no_local_file() {
        let (loader, home, _work) = create_temp_loader();
        fs::write(
            home.path().join("config.yaml"),
            "cluster:\n  api-server: https://api.example:6443\nstorage-class: fast\n",
        )
        .unwrap();

        let config = loader.load(None).unwrap();
        assert_eq!(
            config.cluster.api_server.as_deref(),
            Some("https://api.example:6443")
        );
        assert_eq!(config.storage_class, "fast");
    }

    #[test]
    #[serial]
    fn test_explicit_path_must_exist() {
        let (loader, _home, work) = create_temp_loader();
        let missing = Utf8PathBuf::from_path_buf(work.path().join("nope.yaml")).unwrap();
        assert!(matches!(
            loader.load(Some(&missing)),
            Err(Error::ConfigNotFound { .. })
        ));
    }

    #[test]
    #[serial]
    fn test_env_overrides() {
        let (loader, _home, _work) = create_temp_loader();

        env::set_var("DBROKER_NAMESPACE", "svc-test");
        env::set_var("DBROKER_STORAGE_CLASS", "local-path");
        env::set_var("DBROKER_SERVICES", "redis, memcached");
        env::set_var("DBROKER_READINESS_TIMEOUT_SECS", "90");
        env::set_var("DBROKER_POLL_INTERVAL_MS", "250");

        let config = loader.load(None).unwrap();
        assert_eq!(config.namespace, "svc-test");
        assert_eq!(config.storage_class, "local-path");
        assert_eq!(config.services, vec!["redis", "memcached"]);
        assert_eq!(config.wait.readiness_timeout_secs, 90);
        assert_eq!(config.wait.poll_interval_ms, 250);

        env::remove_var("DBROKER_NAMESPACE");
        env::remove_var("DBROKER_STORAGE_CLASS");
        env::remove_var("DBROKER_SERVICES");
        env::remove_var("DBROKER_READINESS_TIMEOUT_SECS");
        env::remove_var("DBROKER_POLL_INTERVAL_MS");
    }

    #[test]
    #[serial]
    fn test_invalid_env_number() {
        let (loader, _home, _work) = create_temp_loader();
        env::set_var("DBROKER_TEARDOWN_TIMEOUT_SECS", "soon");
        let result = loader.load(None);
        env::remove_var("DBROKER_TEARDOWN_TIMEOUT_SECS");
        assert!(matches!(result, Err(Error::InvalidConfig { .. })));
    }

    #[test]
    #[serial]
    fn test_in_cluster_detection() {
        let sa = TempDir::new().unwrap();
        fs::write(sa.path().join("token"), "sa-token").unwrap();
        fs::write(sa.path().join("ca.crt"), "pem").unwrap();
        let sa_dir = Utf8PathBuf::from_path_buf(sa.path().to_path_buf()).unwrap();

        env::set_var("KUBERNETES_SERVICE_HOST", "10.96.0.1");
        env::set_var("KUBERNETES_SERVICE_PORT", "443");
        let config = ConfigLoader::apply_in_cluster(BrokerConfig::default(), &sa_dir);
        env::remove_var("KUBERNETES_SERVICE_HOST");
        env::remove_var("KUBERNETES_SERVICE_PORT");

        assert_eq!(
            config.cluster.api_server.as_deref(),
            Some("https://10.96.0.1:443")
        );
        assert_eq!(config.cluster.token_file, Some(sa_dir.join("token")));
        assert_eq!(config.cluster.ca_file, Some(sa_dir.join("ca.crt")));
    }
}
