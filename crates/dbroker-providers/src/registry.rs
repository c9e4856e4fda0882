//! Service id → provider lookup

use crate::client::ResourceClient;
use crate::elasticsearch::{self, ElasticsearchProvider};
use crate::memcached::{self, MemcachedProvider};
use crate::mongodb::{self, MongoDbProvider};
use crate::mysql::{self, MySqlProvider};
use crate::postgres::{self, PostgresProvider};
use crate::redis::{self, RedisProvider};
use crate::traits::{Provider, ProviderContext};
use dbroker_core::config::BrokerConfig;
use dbroker_core::types::ResourceKind;
use dbroker_core::{Error, Result};
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::debug;

/// Create a provider instance by service id
pub fn create_provider(service_id: &str, ctx: ProviderContext) -> Result<Box<dyn Provider>> {
    match service_id {
        "mysql" => Ok(Box::new(MySqlProvider::new(ctx))),
        "postgresql" => Ok(Box::new(PostgresProvider::new(ctx))),
        "mongodb" => Ok(Box::new(MongoDbProvider::new(ctx))),
        "elasticsearch" => Ok(Box::new(ElasticsearchProvider::new(ctx))),
        "redis" => Ok(Box::new(RedisProvider::new(ctx))),
        "memcached" => Ok(Box::new(MemcachedProvider::new(ctx))),
        other => Err(Error::unknown_provider(other)),
    }
}

/// Resource kind and plans served under a service id
///
/// Answers catalog queries without a client.
pub fn service_catalog(service_id: &str) -> Result<(ResourceKind, &'static [&'static str])> {
    match service_id {
        "mysql" => Ok((ResourceKind::MySql, mysql::PLANS)),
        "postgresql" => Ok((ResourceKind::Postgres, postgres::PLANS)),
        "mongodb" => Ok((ResourceKind::MongoDb, mongodb::PLANS)),
        "elasticsearch" => Ok((ResourceKind::Elasticsearch, elasticsearch::PLANS)),
        "redis" => Ok((ResourceKind::Redis, redis::PLANS)),
        "memcached" => Ok((ResourceKind::Memcached, memcached::PLANS)),
        other => Err(Error::unknown_provider(other)),
    }
}

/// Providers keyed by service id
#[derive(Default)]
pub struct ProviderRegistry {
    providers: BTreeMap<&'static str, Box<dyn Provider>>,
}

impl ProviderRegistry {
    /// Empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry holding every service enabled in the configuration
    pub fn from_config(config: &BrokerConfig, client: Arc<dyn ResourceClient>) -> Result<Self> {
        let ctx = ProviderContext::from_config(config, client);
        let mut registry = Self::new();
        for service_id in &config.services {
            registry.register(create_provider(service_id, ctx.clone())?);
        }
        Ok(registry)
    }

    /// Add a provider, replacing any with the same service id
    pub fn register(&mut self, provider: Box<dyn Provider>) {
        debug!("Registering provider {}", provider.name());
        self.providers.insert(provider.name(), provider);
    }

    /// Look up a provider
    pub fn get(&self, service_id: &str) -> Result<&dyn Provider> {
        self.providers
            .get(service_id)
            .map(|p| &**p)
            .ok_or_else(|| Error::unknown_provider(service_id))
    }

    /// Registered providers in service id order
    pub fn providers(&self) -> impl Iterator<Item = &dyn Provider> {
        self.providers.values().map(|p| &**p)
    }

    pub fn len(&self) -> usize {
        self.providers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.providers.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::MockResourceClient;

    fn client() -> Arc<dyn ResourceClient> {
        Arc::new(MockResourceClient::new())
    }

    #[test]
    fn test_unknown_provider() {
        let registry = ProviderRegistry::new();
        assert!(matches!(
            registry.get("cassandra"),
            Err(Error::UnknownProvider { id }) if id == "cassandra"
        ));
        assert!(matches!(
            create_provider("cassandra", ProviderContext::new(client())),
            Err(Error::UnknownProvider { .. })
        ));
    }

    #[test]
    fn test_from_config_registers_enabled_services() {
        let config = BrokerConfig {
            services: vec!["redis".into(), "mysql".into()],
            ..Default::default()
        };
        let registry = ProviderRegistry::from_config(&config, client()).unwrap();

        assert_eq!(registry.len(), 2);
        assert_eq!(registry.get("redis").unwrap().name(), "redis");
        assert!(registry.get("postgresql").is_err());
        let names: Vec<_> = registry.providers().map(|p| p.name()).collect();
        assert_eq!(names, vec!["mysql", "redis"]);
    }

    #[test]
    fn test_every_known_service_has_a_provider() {
        for id in dbroker_core::config::SERVICE_IDS {
            let provider = create_provider(id, ProviderContext::new(client())).unwrap();
            assert_eq!(provider.name(), *id);
            assert!(!provider.plans().is_empty());

            let (kind, plans) = service_catalog(id).unwrap();
            assert_eq!(kind, provider.kind());
            assert_eq!(plans, provider.plans());
        }
    }
}
