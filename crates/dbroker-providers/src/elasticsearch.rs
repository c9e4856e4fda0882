//! Elasticsearch provider
//!
//! Credentials point at the REST endpoint, so the scheme is `http` and the
//! database component is an index name.

use crate::binding::{login_credentials, LoginKeys};
use crate::lifecycle::{lookup_provision_info, submit_and_wait, teardown, TeardownMode};
use crate::plans::{custom_spec, durable_demo_spec};
use crate::traits::{Provider, ProviderContext};
use async_trait::async_trait;
use dbroker_core::params::Parameters;
use dbroker_core::types::{DatabaseSpec, ProvisionInfo, ResourceKind, SecretData, Service};
use dbroker_core::{Credentials, Error, Result};
use serde_json::json;

const SERVICE_ID: &str = "elasticsearch";
pub(crate) const PLANS: &[&str] = &[
    "demo-elasticsearch",
    "demo-elasticsearch-cluster",
    "elasticsearch",
];
const DEMO_VERSION: &str = "6.3-v1";

const LOGIN: LoginKeys = LoginKeys {
    user_option: "esUser",
    default_user: "admin",
    password_option: "esPassword",
    default_password_key: "ADMIN_PASSWORD",
};

/// Elasticsearch provider
pub struct ElasticsearchProvider {
    ctx: ProviderContext,
}

impl ElasticsearchProvider {
    pub fn new(ctx: ProviderContext) -> Self {
        Self { ctx }
    }

    fn spec_for(&self, info: &ProvisionInfo) -> Result<DatabaseSpec> {
        match info.plan_id.as_str() {
            "demo-elasticsearch" => Ok(durable_demo_spec(DEMO_VERSION, &self.ctx.storage_class)),
            "demo-elasticsearch-cluster" => {
                // Dedicated node roles replace the flat replica count
                let mut spec = durable_demo_spec(DEMO_VERSION, &self.ctx.storage_class);
                let storage = spec.storage.take();
                spec.extra.insert(
                    "topology".to_string(),
                    json!({
                        "master": {"prefix": "master", "replicas": 1, "storage": storage},
                        "data": {"prefix": "data", "replicas": 2, "storage": storage},
                        "client": {"prefix": "client", "replicas": 1, "storage": storage},
                    }),
                );
                Ok(spec)
            }
            "elasticsearch" => custom_spec(info, !has_topology(info)),
            other => Err(Error::unknown_plan(SERVICE_ID, other)),
        }
    }
}

/// Topology specs carry storage per node role
fn has_topology(info: &ProvisionInfo) -> bool {
    info.parameters
        .get("spec")
        .and_then(|s| s.get("topology"))
        .is_some_and(|t| !t.is_null())
}

#[async_trait]
impl Provider for ElasticsearchProvider {
    fn name(&self) -> &'static str {
        SERVICE_ID
    }

    fn kind(&self) -> ResourceKind {
        ResourceKind::Elasticsearch
    }

    fn plans(&self) -> &'static [&'static str] {
        PLANS
    }

    async fn create(&self, info: &ProvisionInfo, namespace: &str) -> Result<()> {
        let spec = self.spec_for(info)?;
        submit_and_wait(&self.ctx, ResourceKind::Elasticsearch, info, namespace, &spec).await
    }

    async fn delete(&self, name: &str, namespace: &str) -> Result<()> {
        teardown(
            &self.ctx,
            ResourceKind::Elasticsearch,
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
        login_credentials(service, params, secret, "http", "db", &LOGIN, "esIndex")
    }

    async fn get_provision_info(
        &self,
        instance_id: &str,
        namespace: &str,
    ) -> Result<Option<ProvisionInfo>> {
        lookup_provision_info(
            &self.ctx,
            ResourceKind::Elasticsearch,
            instance_id,
            namespace,
        )
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::MockResourceClient;
    use std::sync::Arc;

    fn provider() -> ElasticsearchProvider {
        ElasticsearchProvider::new(ProviderContext::new(Arc::new(MockResourceClient::new())))
    }

    #[test]
    fn test_cluster_plan_uses_topology() {
        let info = ProvisionInfo::new(
            "es-1",
            SERVICE_ID,
            "demo-elasticsearch-cluster",
            Parameters::new(),
            "ns",
        )
        .unwrap();
        let spec = provider().spec_for(&info).unwrap();

        assert!(spec.storage.is_none());
        let topology = spec.extra.get("topology").unwrap();
        assert_eq!(topology["data"]["replicas"], 2);
        assert_eq!(
            topology["master"]["storage"]["storageClassName"],
            "standard"
        );
    }

    #[test]
    fn test_custom_topology_needs_no_top_level_storage() {
        let params = json!({"spec": {"version": "6.3-v1", "topology": {"data": {"replicas": 1}}}})
            .as_object()
            .cloned()
            .unwrap();
        let info = ProvisionInfo::new("es-2", SERVICE_ID, "elasticsearch", params, "ns").unwrap();
        assert!(provider().spec_for(&info).is_ok());
    }
}
