//! Provider trait definitions

use crate::client::ResourceClient;
use async_trait::async_trait;
use dbroker_core::config::BrokerConfig;
use dbroker_core::params::Parameters;
use dbroker_core::types::{ProvisionInfo, ResourceKind, SecretData, Service};
use dbroker_core::{Credentials, Result, WaitPolicy};
use std::sync::Arc;

/// Provider trait for database backends
#[async_trait]
pub trait Provider: Send + Sync {
    /// Service id the provider is registered under
    fn name(&self) -> &'static str;

    /// Kind of the backend resource
    fn kind(&self) -> ResourceKind;

    /// Plans the provider serves
    fn plans(&self) -> &'static [&'static str];

    /// Whether the plan is served
    fn supports_plan(&self, plan_id: &str) -> bool {
        self.plans().contains(&plan_id)
    }

    /// Name of the secret holding generated credentials, if the backend has one
    fn auth_secret_name(&self, instance_name: &str) -> Option<String> {
        Some(format!("{}-auth", instance_name))
    }

    /// Submit the backend resource and wait until it is Running
    async fn create(&self, info: &ProvisionInfo, namespace: &str) -> Result<()>;

    /// Tear the backend resource down; absent resources are not an error
    async fn delete(&self, name: &str, namespace: &str) -> Result<()>;

    /// Compose credentials from the service, bind parameters and secret data.
    ///
    /// Performs no I/O.
    fn bind(&self, service: &Service, params: &Parameters, secret: &SecretData)
        -> Result<Credentials>;

    /// Rebuild the provisioning record of an instance, `None` when absent.
    ///
    /// An empty namespace searches every namespace.
    async fn get_provision_info(
        &self,
        instance_id: &str,
        namespace: &str,
    ) -> Result<Option<ProvisionInfo>>;
}

/// Collaborators and settings shared by every provider
#[derive(Clone)]
pub struct ProviderContext {
    /// Resource-management client
    pub client: Arc<dyn ResourceClient>,

    /// Storage class used by demo plans
    pub storage_class: String,

    /// Wait applied after submission
    pub readiness: WaitPolicy,

    /// Wait applied to each teardown step
    pub teardown: WaitPolicy,
}

impl ProviderContext {
    /// Context with default storage class and wait policies
    pub fn new(client: Arc<dyn ResourceClient>) -> Self {
        Self {
            client,
            storage_class: "standard".to_string(),
            readiness: WaitPolicy::readiness(),
            teardown: WaitPolicy::teardown(),
        }
    }

    /// Context configured from the broker configuration
    pub fn from_config(config: &BrokerConfig, client: Arc<dyn ResourceClient>) -> Self {
        Self {
            client,
            storage_class: config.storage_class.clone(),
            readiness: config.wait.readiness(),
            teardown: config.wait.teardown(),
        }
    }

    pub fn with_storage_class(mut self, storage_class: impl Into<String>) -> Self {
        self.storage_class = storage_class.into();
        self
    }

    pub fn with_readiness(mut self, policy: WaitPolicy) -> Self {
        self.readiness = policy;
        self
    }

    pub fn with_teardown(mut self, policy: WaitPolicy) -> Self {
        self.teardown = policy;
        self
    }
}

impl std::fmt::Debug for ProviderContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProviderContext")
            .field("storage_class", &self.storage_class)
            .field("readiness", &self.readiness)
            .field("teardown", &self.teardown)
            .finish_non_exhaustive()
    }
}
