//! MySQL provider

use crate::binding::{login_credentials, LoginKeys};
use crate::lifecycle::{lookup_provision_info, submit_and_wait, teardown, TeardownMode};
use crate::plans::{custom_spec, durable_demo_spec};
use crate::traits::{Provider, ProviderContext};
use async_trait::async_trait;
use dbroker_core::params::Parameters;
use dbroker_core::types::{DatabaseSpec, ProvisionInfo, ResourceKind, SecretData, Service};
use dbroker_core::{Credentials, Error, Result};

const SERVICE_ID: &str = "mysql";
pub(crate) const PLANS: &[&str] = &["demo-mysql", "mysql"];
const DEMO_VERSION: &str = "5.7";

const LOGIN: LoginKeys = LoginKeys {
    user_option: "mysqlUser",
    default_user: "root",
    password_option: "mysqlPassword",
    default_password_key: "password",
};

/// MySQL provider
pub struct MySqlProvider {
    ctx: ProviderContext,
}

impl MySqlProvider {
    pub fn new(ctx: ProviderContext) -> Self {
        Self { ctx }
    }

    fn spec_for(&self, info: &ProvisionInfo) -> Result<DatabaseSpec> {
        match info.plan_id.as_str() {
            "demo-mysql" => Ok(durable_demo_spec(DEMO_VERSION, &self.ctx.storage_class)),
            "mysql" => custom_spec(info, true),
            other => Err(Error::unknown_plan(SERVICE_ID, other)),
        }
    }
}

#[async_trait]
impl Provider for MySqlProvider {
    fn name(&self) -> &'static str {
        SERVICE_ID
    }

    fn kind(&self) -> ResourceKind {
        ResourceKind::MySql
    }

    fn plans(&self) -> &'static [&'static str] {
        PLANS
    }

    async fn create(&self, info: &ProvisionInfo, namespace: &str) -> Result<()> {
        let spec = self.spec_for(info)?;
        submit_and_wait(&self.ctx, ResourceKind::MySql, info, namespace, &spec).await
    }

    async fn delete(&self, name: &str, namespace: &str) -> Result<()> {
        teardown(
            &self.ctx,
            ResourceKind::MySql,
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
            "mysql",
            "mysql",
            &LOGIN,
            "mysqlDatabase",
        )
    }

    async fn get_provision_info(
        &self,
        instance_id: &str,
        namespace: &str,
    ) -> Result<Option<ProvisionInfo>> {
        lookup_provision_info(&self.ctx, ResourceKind::MySql, instance_id, namespace).await
    }
}
