//! MongoDB provider

use crate::binding::{login_credentials, LoginKeys};
use crate::lifecycle::{lookup_provision_info, submit_and_wait, teardown, TeardownMode};
use crate::plans::{custom_spec, durable_demo_spec};
use crate::traits::{Provider, ProviderContext};
use async_trait::async_trait;
use dbroker_core::params::Parameters;
use dbroker_core::types::{DatabaseSpec, ProvisionInfo, ResourceKind, SecretData, Service};
use dbroker_core::{Credentials, Error, Result};
use serde_json::json;

const SERVICE_ID: &str = "mongodb";
pub(crate) const PLANS: &[&str] = &["demo-mongodb", "demo-mongodb-cluster", "mongodb"];
const DEMO_VERSION: &str = "3.6-v1";
const CLUSTER_REPLICAS: u32 = 3;

const LOGIN: LoginKeys = LoginKeys {
    user_option: "mongodbUser",
    default_user: "root",
    password_option: "mongodbPassword",
    default_password_key: "password",
};

/// MongoDB provider
pub struct MongoDbProvider {
    ctx: ProviderContext,
}

impl MongoDbProvider {
    pub fn new(ctx: ProviderContext) -> Self {
        Self { ctx }
    }

    fn spec_for(&self, info: &ProvisionInfo) -> Result<DatabaseSpec> {
        match info.plan_id.as_str() {
            "demo-mongodb" => Ok(durable_demo_spec(DEMO_VERSION, &self.ctx.storage_class)),
            "demo-mongodb-cluster" => {
                let mut spec = durable_demo_spec(DEMO_VERSION, &self.ctx.storage_class);
                spec.replicas = Some(CLUSTER_REPLICAS);
                spec.extra
                    .insert("replicaSet".to_string(), json!({"name": "rs0"}));
                Ok(spec)
            }
            "mongodb" => custom_spec(info, true),
            other => Err(Error::unknown_plan(SERVICE_ID, other)),
        }
    }
}

#[async_trait]
impl Provider for MongoDbProvider {
    fn name(&self) -> &'static str {
        SERVICE_ID
    }

    fn kind(&self) -> ResourceKind {
        ResourceKind::MongoDb
    }

    fn plans(&self) -> &'static [&'static str] {
        PLANS
    }

    async fn create(&self, info: &ProvisionInfo, namespace: &str) -> Result<()> {
        let spec = self.spec_for(info)?;
        submit_and_wait(&self.ctx, ResourceKind::MongoDb, info, namespace, &spec).await
    }

    async fn delete(&self, name: &str, namespace: &str) -> Result<()> {
        teardown(
            &self.ctx,
            ResourceKind::MongoDb,
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
            "mongodb",
            "mongodb",
            &LOGIN,
            "mongodbDatabase",
        )
    }

    async fn get_provision_info(
        &self,
        instance_id: &str,
        namespace: &str,
    ) -> Result<Option<ProvisionInfo>> {
        lookup_provision_info(&self.ctx, ResourceKind::MongoDb, instance_id, namespace).await
    }
}
