//! PostgreSQL provider
//!
//! `demo-ha-postgresql` runs a primary with two hot standbys.

use crate::binding::{login_credentials, LoginKeys};
use crate::lifecycle::{lookup_provision_info, submit_and_wait, teardown, TeardownMode};
use crate::plans::{custom_spec, durable_demo_spec};
use crate::traits::{Provider, ProviderContext};
use async_trait::async_trait;
use dbroker_core::params::Parameters;
use dbroker_core::types::{DatabaseSpec, ProvisionInfo, ResourceKind, SecretData, Service};
use dbroker_core::{Credentials, Error, Result};
use serde_json::Value;

const SERVICE_ID: &str = "postgresql";
pub(crate) const PLANS: &[&str] = &["demo-postgresql", "demo-ha-postgresql", "postgresql"];
const DEMO_VERSION: &str = "10.2-v1";
const HA_REPLICAS: u32 = 3;

const LOGIN: LoginKeys = LoginKeys {
    user_option: "pgsqlUser",
    default_user: "postgres",
    password_option: "pgsqlPassword",
    default_password_key: "POSTGRES_PASSWORD",
};

/// PostgreSQL provider
pub struct PostgresProvider {
    ctx: ProviderContext,
}

impl PostgresProvider {
    pub fn new(ctx: ProviderContext) -> Self {
        Self { ctx }
    }

    fn spec_for(&self, info: &ProvisionInfo) -> Result<DatabaseSpec> {
        match info.plan_id.as_str() {
            "demo-postgresql" => Ok(durable_demo_spec(DEMO_VERSION, &self.ctx.storage_class)),
            "demo-ha-postgresql" => {
                let mut spec = durable_demo_spec(DEMO_VERSION, &self.ctx.storage_class);
                spec.replicas = Some(HA_REPLICAS);
                spec.extra
                    .insert("standbyMode".to_string(), Value::from("Hot"));
                Ok(spec)
            }
            "postgresql" => custom_spec(info, true),
            other => Err(Error::unknown_plan(SERVICE_ID, other)),
        }
    }
}

#[async_trait]
impl Provider for PostgresProvider {
    fn name(&self) -> &'static str {
        SERVICE_ID
    }

    fn kind(&self) -> ResourceKind {
        ResourceKind::Postgres
    }

    fn plans(&self) -> &'static [&'static str] {
        PLANS
    }

    async fn create(&self, info: &ProvisionInfo, namespace: &str) -> Result<()> {
        let spec = self.spec_for(info)?;
        submit_and_wait(&self.ctx, ResourceKind::Postgres, info, namespace, &spec).await
    }

    async fn delete(&self, name: &str, namespace: &str) -> Result<()> {
        teardown(
            &self.ctx,
            ResourceKind::Postgres,
            name,
            namespace,
            TeardownMode::Dormant,
        )
        .await
    }

    fn bind(
        &self,
        service: &Service,
        params: &Parameters,
        secret: &SecretData,
    ) -> Result<Credentials> {
        login_credentials(
            service,
            params,
            secret,
            "postgresql",
            "postgres",
            &LOGIN,
            "pgsqlDatabase",
        )
    }

    async fn get_provision_info(
        &self,
        instance_id: &str,
        namespace: &str,
    ) -> Result<Option<ProvisionInfo>> {
        lookup_provision_info(&self.ctx, ResourceKind::Postgres, instance_id, namespace).await
    }
}
