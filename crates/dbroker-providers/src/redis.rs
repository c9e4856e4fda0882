//! Redis provider
//!
//! Also serves the `memcached` cache plans: both are backed by a Redis
//! resource and bind with the `redis` scheme. Redis instances run without
//! authentication, so there is no credentials secret.

use crate::binding::anonymous_credentials;
use crate::lifecycle::{lookup_provision_info, submit_and_wait, teardown, TeardownMode};
use crate::plans::{custom_spec, ephemeral_demo_spec};
use crate::traits::{Provider, ProviderContext};
use async_trait::async_trait;
use dbroker_core::params::Parameters;
use dbroker_core::types::{DatabaseSpec, ProvisionInfo, ResourceKind, SecretData, Service};
use dbroker_core::{Credentials, Error, Result};

const SERVICE_ID: &str = "redis";
pub(crate) const PLANS: &[&str] = &["demo-redis", "redis", "demo-memcached", "memcached"];
const DEMO_VERSION: &str = "4.0-v1";

/// Redis provider
pub struct RedisProvider {
    ctx: ProviderContext,
}

impl RedisProvider {
    pub fn new(ctx: ProviderContext) -> Self {
        Self { ctx }
    }

    fn spec_for(&self, info: &ProvisionInfo) -> Result<DatabaseSpec> {
        match info.plan_id.as_str() {
            "demo-redis" | "demo-memcached" => Ok(ephemeral_demo_spec(DEMO_VERSION)),
            "redis" | "memcached" => custom_spec(info, false),
            other => Err(Error::unknown_plan(SERVICE_ID, other)),
        }
    }
}

#[async_trait]
impl Provider for RedisProvider {
    fn name(&self) -> &'static str {
        SERVICE_ID
    }

    fn kind(&self) -> ResourceKind {
        ResourceKind::Redis
    }

    fn plans(&self) -> &'static [&'static str] {
        PLANS
    }

    fn auth_secret_name(&self, _instance_name: &str) -> Option<String> {
        None
    }

    async fn create(&self, info: &ProvisionInfo, namespace: &str) -> Result<()> {
        let spec = self.spec_for(info)?;
        submit_and_wait(&self.ctx, ResourceKind::Redis, info, namespace, &spec).await
    }

    async fn delete(&self, name: &str, namespace: &str) -> Result<()> {
        teardown(
            &self.ctx,
            ResourceKind::Redis,
            name,
            namespace,
            TeardownMode::Direct,
        )
        .await
    }

    fn bind(
        &self,
        service: &Service,
        params: &Parameters,
        _secret: &SecretData,
    ) -> Result<Credentials> {
        anonymous_credentials(service, params, "redis", "db", Some("rdDatabase"))
    }

    async fn get_provision_info(
        &self,
        instance_id: &str,
        namespace: &str,
    ) -> Result<Option<ProvisionInfo>> {
        lookup_provision_info(&self.ctx, ResourceKind::Redis, instance_id, namespace).await
    }
}
