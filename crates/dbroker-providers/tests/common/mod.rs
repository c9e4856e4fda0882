//! Common test helpers for dbroker-providers integration tests
//!
//! Provides an in-memory resource-management API:
//! - `FakeResourceClient` stores resources, services and secrets in maps
//! - every call is recorded in a `CallLog` for ordering assertions
//! - failures can be injected for a single upcoming call

use async_trait::async_trait;
use dbroker_core::types::{
    DatabasePhase, DynamicResource, LabelSelector, ObjectMeta, ResourceKind, ResourceStatus,
    Secret, Service, API_VERSION, INSTANCE_ID_LABEL, PROVISION_INFO_ANNOTATION,
};
use dbroker_core::{ApiError, WaitPolicy};
use dbroker_providers::client::{ApiResult, ResourceClient};
use dbroker_providers::ProviderContext;
use serde_json::{json, Value};
use std::collections::BTreeMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

// ─── Call Recording ──────────────────────────────────────────────────────────

/// Records client calls as "op Kind ns/name" strings.
#[derive(Debug, Clone, Default)]
#[allow(dead_code)]
pub struct CallLog {
    pub calls: Arc<Mutex<Vec<String>>>,
}

#[allow(dead_code)]
impl CallLog {
    pub fn record(&self, entry: String) {
        self.calls.lock().unwrap().push(entry);
    }

    pub fn all(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    /// Calls whose text starts with `prefix`
    pub fn matching(&self, prefix: &str) -> Vec<String> {
        self.all()
            .into_iter()
            .filter(|c| c.starts_with(prefix))
            .collect()
    }

    /// Index of the first call starting with `prefix`
    pub fn position(&self, prefix: &str) -> Option<usize> {
        self.all().iter().position(|c| c.starts_with(prefix))
    }

    pub fn assert_called(&self, prefix: &str) {
        let calls = self.all();
        assert!(
            calls.iter().any(|c| c.starts_with(prefix)),
            "'{}' was never called. Actual calls: {:?}",
            prefix,
            calls
        );
    }

    pub fn assert_not_called(&self, prefix: &str) {
        let calls = self.all();
        assert!(
            !calls.iter().any(|c| c.starts_with(prefix)),
            "'{}' was called but should not have been. Actual calls: {:?}",
            prefix,
            calls
        );
    }
}

// ─── Fake Resource Client ────────────────────────────────────────────────────

type Key = (ResourceKind, String, String);

#[derive(Default)]
struct State {
    resources: BTreeMap<Key, DynamicResource>,
    services: BTreeMap<(String, String), Service>,
    secrets: BTreeMap<(String, String), Secret>,
    failures: Vec<(String, ApiError)>,
}

/// In-memory stand-in for the operator-managed API.
///
/// Created resources report Running immediately unless `stay_pending` was
/// called. Deleting a MySQL, Postgres, MongoDB or Elasticsearch resource
/// leaves a DormantDatabase of the same name behind, as the operator does.
#[derive(Clone, Default)]
#[allow(dead_code)]
pub struct FakeResourceClient {
    state: Arc<Mutex<State>>,
    pub log: CallLog,
    pending: Arc<Mutex<bool>>,
}

#[allow(dead_code)]
impl FakeResourceClient {
    pub fn new() -> Self {
        Self::default()
    }

    /// Never move created resources to Running
    pub fn stay_pending(&self) {
        *self.pending.lock().unwrap() = true;
    }

    /// Fail the next call whose log entry starts with `prefix`
    pub fn fail_next(&self, prefix: &str, error: ApiError) {
        self.state
            .lock()
            .unwrap()
            .failures
            .push((prefix.to_string(), error));
    }

    pub fn insert_resource(&self, kind: ResourceKind, resource: DynamicResource) {
        let key = (
            kind,
            resource.metadata.namespace.clone(),
            resource.metadata.name.clone(),
        );
        self.state.lock().unwrap().resources.insert(key, resource);
    }

    pub fn insert_service(&self, service: Service) {
        let key = (
            service.metadata.namespace.clone(),
            service.metadata.name.clone(),
        );
        self.state.lock().unwrap().services.insert(key, service);
    }

    pub fn insert_secret(&self, secret: Secret) {
        let key = (
            secret.metadata.namespace.clone(),
            secret.metadata.name.clone(),
        );
        self.state.lock().unwrap().secrets.insert(key, secret);
    }

    pub fn resource(&self, kind: ResourceKind, namespace: &str, name: &str) -> Option<DynamicResource> {
        self.state
            .lock()
            .unwrap()
            .resources
            .get(&(kind, namespace.to_string(), name.to_string()))
            .cloned()
    }

    pub fn resource_count(&self) -> usize {
        self.state.lock().unwrap().resources.len()
    }

    fn enter(&self, entry: String) -> ApiResult<()> {
        self.log.record(entry.clone());
        let mut state = self.state.lock().unwrap();
        if let Some(i) = state
            .failures
            .iter()
            .position(|(prefix, _)| entry.starts_with(prefix.as_str()))
        {
            let (_, error) = state.failures.remove(i);
            return Err(error);
        }
        Ok(())
    }
}

fn leaves_dormant(kind: ResourceKind) -> bool {
    matches!(
        kind,
        ResourceKind::MySql
            | ResourceKind::Postgres
            | ResourceKind::MongoDb
            | ResourceKind::Elasticsearch
    )
}

fn merge_patch(target: &mut Value, patch: &Value) {
    match (target, patch) {
        (Value::Object(target), Value::Object(patch)) => {
            for (key, value) in patch {
                if value.is_null() {
                    target.remove(key);
                } else {
                    merge_patch(target.entry(key.clone()).or_insert(Value::Null), value);
                }
            }
        }
        (target, patch) => *target = patch.clone(),
    }
}

#[async_trait]
impl ResourceClient for FakeResourceClient {
    async fn create(
        &self,
        kind: ResourceKind,
        resource: &DynamicResource,
    ) -> ApiResult<DynamicResource> {
        let ns = resource.metadata.namespace.clone();
        let name = resource.metadata.name.clone();
        self.enter(format!("create {} {}/{}", kind, ns, name))?;

        let pending = *self.pending.lock().unwrap();
        let mut state = self.state.lock().unwrap();
        let key = (kind, ns, name.clone());
        if state.resources.contains_key(&key) {
            return Err(ApiError::already_exists(kind.kind_name(), name));
        }
        let mut stored = resource.clone();
        stored.status = Some(ResourceStatus {
            phase: Some(if pending {
                DatabasePhase::Creating
            } else {
                DatabasePhase::Running
            }),
            reason: None,
        });
        state.resources.insert(key, stored.clone());
        Ok(stored)
    }

    async fn get(
        &self,
        kind: ResourceKind,
        namespace: &str,
        name: &str,
    ) -> ApiResult<DynamicResource> {
        self.enter(format!("get {} {}/{}", kind, namespace, name))?;
        self.resource(kind, namespace, name)
            .ok_or_else(|| ApiError::not_found(kind.kind_name(), name))
    }

    async fn patch(
        &self,
        kind: ResourceKind,
        namespace: &str,
        name: &str,
        patch: &Value,
    ) -> ApiResult<DynamicResource> {
        self.enter(format!("patch {} {}/{}", kind, namespace, name))?;
        let mut state = self.state.lock().unwrap();
        let resource = state
            .resources
            .get_mut(&(kind, namespace.to_string(), name.to_string()))
            .ok_or_else(|| ApiError::not_found(kind.kind_name(), name))?;
        if let Some(spec) = patch.get("spec") {
            merge_patch(&mut resource.spec, spec);
        }
        Ok(resource.clone())
    }

    async fn delete(&self, kind: ResourceKind, namespace: &str, name: &str) -> ApiResult<()> {
        self.enter(format!("delete {} {}/{}", kind, namespace, name))?;
        let mut state = self.state.lock().unwrap();
        let removed = state
            .resources
            .remove(&(kind, namespace.to_string(), name.to_string()))
            .ok_or_else(|| ApiError::not_found(kind.kind_name(), name))?;

        if leaves_dormant(kind) {
            let dormant = DynamicResource {
                api_version: API_VERSION.to_string(),
                kind: "DormantDatabase".to_string(),
                metadata: ObjectMeta::new(name, namespace),
                spec: json!({"origin": {"kind": kind.kind_name(), "spec": removed.spec}}),
                status: None,
            };
            state.resources.insert(
                (
                    ResourceKind::DormantDatabase,
                    namespace.to_string(),
                    name.to_string(),
                ),
                dormant,
            );
        }
        Ok(())
    }

    async fn list(
        &self,
        kind: ResourceKind,
        namespace: &str,
        selector: &LabelSelector,
    ) -> ApiResult<Vec<DynamicResource>> {
        self.enter(format!("list {} {}?{}", kind, namespace, selector))?;
        let state = self.state.lock().unwrap();
        Ok(state
            .resources
            .iter()
            .filter(|((k, ns, _), r)| {
                *k == kind
                    && (namespace.is_empty() || ns == namespace)
                    && selector.matches(&r.metadata.labels)
            })
            .map(|(_, r)| r.clone())
            .collect())
    }

    async fn get_service(&self, namespace: &str, name: &str) -> ApiResult<Service> {
        self.enter(format!("get Service {}/{}", namespace, name))?;
        self.state
            .lock()
            .unwrap()
            .services
            .get(&(namespace.to_string(), name.to_string()))
            .cloned()
            .ok_or_else(|| ApiError::not_found("Service", name))
    }

    async fn get_secret(&self, namespace: &str, name: &str) -> ApiResult<Secret> {
        self.enter(format!("get Secret {}/{}", namespace, name))?;
        self.state
            .lock()
            .unwrap()
            .secrets
            .get(&(namespace.to_string(), name.to_string()))
            .cloned()
            .ok_or_else(|| ApiError::not_found("Secret", name))
    }
}

// ─── Fixtures ────────────────────────────────────────────────────────────────

/// Wait policy short enough for paused-clock tests
#[allow(dead_code)]
pub fn fast_policy() -> WaitPolicy {
    WaitPolicy::new(Duration::from_millis(50), Duration::from_secs(5))
}

/// Provider context over `fake` with fast waits
#[allow(dead_code)]
pub fn fake_context(fake: &FakeResourceClient) -> ProviderContext {
    ProviderContext::new(Arc::new(fake.clone()))
        .with_storage_class("test-storage")
        .with_readiness(fast_policy())
        .with_teardown(fast_policy())
}

/// A stored resource labelled with `instance_id` and carrying a record
#[allow(dead_code)]
pub fn labelled_resource(
    kind: ResourceKind,
    name: &str,
    namespace: &str,
    instance_id: &str,
    service_id: &str,
    plan_id: &str,
) -> DynamicResource {
    let mut meta = ObjectMeta::new(name, namespace);
    meta.labels
        .insert(INSTANCE_ID_LABEL.to_string(), instance_id.to_string());
    meta.annotations.insert(
        PROVISION_INFO_ANNOTATION.to_string(),
        json!({
            "instanceId": instance_id,
            "instanceName": name,
            "serviceId": service_id,
            "planId": plan_id,
            "parameters": {},
            "namespace": namespace,
        })
        .to_string(),
    );
    DynamicResource {
        api_version: API_VERSION.to_string(),
        kind: kind.kind_name().to_string(),
        metadata: meta,
        spec: json!({"version": "1", "terminationPolicy": "Pause"}),
        status: Some(ResourceStatus {
            phase: Some(DatabasePhase::Running),
            reason: None,
        }),
    }
}

/// Parameters from a JSON object literal
#[allow(dead_code)]
pub fn params(value: Value) -> dbroker_core::params::Parameters {
    value.as_object().cloned().unwrap_or_default()
}
