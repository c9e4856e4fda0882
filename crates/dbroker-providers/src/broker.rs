//! Provisioning protocol over the provider registry
//!
//! The broker resolves the provider for a service id, turns instance ids
//! into resource names by reading the stored provisioning record, and
//! fetches the service and secret a bind needs.

use crate::client::ResourceClient;
use crate::registry::ProviderRegistry;
use crate::traits::Provider;
use dbroker_core::config::BrokerConfig;
use dbroker_core::params::{self, Parameters};
use dbroker_core::types::{ProvisionInfo, SecretData};
use dbroker_core::{Credentials, Error, Result};
use std::sync::Arc;
use tracing::{debug, info};

/// Broker facade
pub struct Broker {
    registry: ProviderRegistry,
    client: Arc<dyn ResourceClient>,
    default_namespace: String,
}

impl Broker {
    /// Create a broker over an existing registry
    pub fn new(
        registry: ProviderRegistry,
        client: Arc<dyn ResourceClient>,
        default_namespace: impl Into<String>,
    ) -> Self {
        Self {
            registry,
            client,
            default_namespace: default_namespace.into(),
        }
    }

    /// Create a broker with every service enabled in the configuration
    pub fn from_config(config: &BrokerConfig, client: Arc<dyn ResourceClient>) -> Result<Self> {
        let registry = ProviderRegistry::from_config(config, client.clone())?;
        Ok(Self::new(registry, client, config.namespace.clone()))
    }

    pub fn registry(&self) -> &ProviderRegistry {
        &self.registry
    }

    fn namespace<'a>(&'a self, namespace: Option<&'a str>) -> &'a str {
        namespace
            .filter(|ns| !ns.is_empty())
            .unwrap_or(&self.default_namespace)
    }

    /// Provision a new instance and wait until it is Running
    pub async fn provision(
        &self,
        service_id: &str,
        instance_id: &str,
        plan_id: &str,
        parameters: Parameters,
        namespace: Option<&str>,
    ) -> Result<ProvisionInfo> {
        let provider = self.registry.get(service_id)?;
        if !provider.supports_plan(plan_id) {
            return Err(Error::unknown_plan(service_id, plan_id));
        }

        self.ensure_unused(instance_id).await?;

        let namespace = self.namespace(namespace);
        let info = ProvisionInfo::new(instance_id, service_id, plan_id, parameters, namespace)?;
        provider.create(&info, namespace).await?;

        info!(
            "Provisioned {} instance {} as {:?}",
            service_id, instance_id, info.instance_name
        );
        Ok(info)
    }

    /// Remove an instance; unknown instances are already deprovisioned
    pub async fn deprovision(
        &self,
        service_id: &str,
        instance_id: &str,
        namespace: Option<&str>,
    ) -> Result<()> {
        let provider = self.registry.get(service_id)?;
        let Some(info) = provider
            .get_provision_info(instance_id, namespace.unwrap_or(""))
            .await?
        else {
            debug!("Instance {} not found, nothing to deprovision", instance_id);
            return Ok(());
        };

        provider
            .delete(&info.instance_name, self.namespace(Some(&info.namespace)))
            .await?;
        info!("Deprovisioned {} instance {}", service_id, instance_id);
        Ok(())
    }

    /// Issue credentials for an instance
    pub async fn bind(
        &self,
        service_id: &str,
        instance_id: &str,
        bind_parameters: &Parameters,
        namespace: Option<&str>,
    ) -> Result<Credentials> {
        let provider = self.registry.get(service_id)?;
        let info = self.require(provider, instance_id, namespace).await?;
        let namespace = self.namespace(Some(&info.namespace));

        let service = self
            .client
            .get_service(namespace, &info.instance_name)
            .await?;
        let secret = match provider.auth_secret_name(&info.instance_name) {
            Some(name) => self.client.get_secret(namespace, &name).await?.decode()?,
            None => SecretData::new(),
        };

        let merged = params::merge(&info.parameters, bind_parameters);
        provider.bind(&service, &merged, &secret)
    }

    /// Check that an instance exists; credentials are never stored
    pub async fn unbind(
        &self,
        service_id: &str,
        instance_id: &str,
        namespace: Option<&str>,
    ) -> Result<()> {
        let provider = self.registry.get(service_id)?;
        self.require(provider, instance_id, namespace).await?;
        Ok(())
    }

    /// Provisioning record of an instance, `None` when absent
    pub async fn lookup(
        &self,
        service_id: &str,
        instance_id: &str,
        namespace: Option<&str>,
    ) -> Result<Option<ProvisionInfo>> {
        let provider = self.registry.get(service_id)?;
        provider
            .get_provision_info(instance_id, namespace.unwrap_or(""))
            .await
    }

    /// Identifiers are unique across services and namespaces
    async fn ensure_unused(&self, instance_id: &str) -> Result<()> {
        for provider in self.registry.providers() {
            if let Some(existing) = provider.get_provision_info(instance_id, "").await? {
                debug!(
                    "Instance {} already exists as {} {:?}",
                    instance_id, existing.service_id, existing.instance_name
                );
                return Err(Error::AlreadyProvisioned {
                    instance_id: instance_id.to_string(),
                });
            }
        }
        Ok(())
    }

    async fn require(
        &self,
        provider: &dyn Provider,
        instance_id: &str,
        namespace: Option<&str>,
    ) -> Result<ProvisionInfo> {
        provider
            .get_provision_info(instance_id, namespace.unwrap_or(""))
            .await?
            .ok_or_else(|| Error::InstanceNotFound {
                instance_id: instance_id.to_string(),
            })
    }
}
