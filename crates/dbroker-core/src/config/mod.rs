//! Broker configuration

mod broker_config;
mod loader;

pub use broker_config::{BrokerConfig, ClusterConfig, WaitConfig, SERVICE_IDS};
pub use loader::{ConfigLoader, CONFIG_FILE_NAME};
