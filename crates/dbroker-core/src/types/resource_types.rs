//! Declarative backend resource types
//!
//! Resources travel through the client as `DynamicResource` (kind-agnostic
//! metadata + JSON spec). Providers build their specs as `DatabaseSpec` and
//! convert at the boundary.

use crate::error::{Error, Result};
use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::fmt;

/// API group/version of every database resource
pub const API_VERSION: &str = "kubedb.com/v1alpha1";

/// Label carrying the instance identifier on every provisioned resource
pub const INSTANCE_ID_LABEL: &str = "dbroker.io/instance-id";

/// Annotation carrying the serialized `ProvisionInfo`
pub const PROVISION_INFO_ANNOTATION: &str = "dbroker.io/provision-info";

/// Resource kinds managed by the broker
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ResourceKind {
    MySql,
    Postgres,
    MongoDb,
    Elasticsearch,
    Redis,
    Memcached,
    DormantDatabase,
}

impl ResourceKind {
    /// Kind name as it appears in the `kind` field
    pub fn kind_name(&self) -> &'static str {
        match self {
            ResourceKind::MySql => "MySQL",
            ResourceKind::Postgres => "Postgres",
            ResourceKind::MongoDb => "MongoDB",
            ResourceKind::Elasticsearch => "Elasticsearch",
            ResourceKind::Redis => "Redis",
            ResourceKind::Memcached => "Memcached",
            ResourceKind::DormantDatabase => "DormantDatabase",
        }
    }

    /// Plural resource name used in API paths
    pub fn plural(&self) -> &'static str {
        match self {
            ResourceKind::MySql => "mysqls",
            ResourceKind::Postgres => "postgreses",
            ResourceKind::MongoDb => "mongodbs",
            ResourceKind::Elasticsearch => "elasticsearches",
            ResourceKind::Redis => "redises",
            ResourceKind::Memcached => "memcacheds",
            ResourceKind::DormantDatabase => "dormantdatabases",
        }
    }
}

impl fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.kind_name())
    }
}

/// Object metadata shared by every resource
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ObjectMeta {
    #[serde(default)]
    pub name: String,

    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub namespace: String,

    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub labels: BTreeMap<String, String>,

    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub annotations: BTreeMap<String, String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resource_version: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub uid: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub creation_timestamp: Option<DateTime<Utc>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub deletion_timestamp: Option<DateTime<Utc>>,
}

impl ObjectMeta {
    /// Create metadata for a namespaced object
    pub fn new(name: impl Into<String>, namespace: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            namespace: namespace.into(),
            ..Default::default()
        }
    }
}

/// Reconciliation phase reported by the operator
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DatabasePhase {
    Creating,
    Initializing,
    Running,
    Paused,
    Halted,
    Failed,
    #[serde(other)]
    Unknown,
}

impl fmt::Display for DatabasePhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DatabasePhase::Creating => write!(f, "Creating"),
            DatabasePhase::Initializing => write!(f, "Initializing"),
            DatabasePhase::Running => write!(f, "Running"),
            DatabasePhase::Paused => write!(f, "Paused"),
            DatabasePhase::Halted => write!(f, "Halted"),
            DatabasePhase::Failed => write!(f, "Failed"),
            DatabasePhase::Unknown => write!(f, "Unknown"),
        }
    }
}

/// Resource status
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ResourceStatus {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phase: Option<DatabasePhase>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

/// Controls what happens to data when the resource is deleted
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TerminationPolicy {
    /// Keep data in a dormant placeholder (recoverable)
    Pause,
    /// Delete workloads, keep volumes
    Delete,
    /// Delete everything (irreversible)
    WipeOut,
    /// Reject deletion
    DoNotTerminate,
}

impl TerminationPolicy {
    /// Whether deleting under this policy is irreversible
    pub fn is_irreversible(&self) -> bool {
        matches!(self, TerminationPolicy::WipeOut)
    }
}

/// Storage medium for a database
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum StorageType {
    Durable,
    Ephemeral,
}

/// Persistent volume claim template
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StorageSpec {
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub access_modes: Vec<String>,

    #[serde(default)]
    pub resources: StorageResources,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub storage_class_name: Option<String>,
}

/// Requested storage resources
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StorageResources {
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub requests: BTreeMap<String, String>,
}

impl StorageSpec {
    /// ReadWriteOnce claim of the given size
    pub fn new(size: impl Into<String>, storage_class: Option<&str>) -> Self {
        let mut requests = BTreeMap::new();
        requests.insert("storage".to_string(), size.into());
        Self {
            access_modes: vec!["ReadWriteOnce".to_string()],
            resources: StorageResources { requests },
            storage_class_name: storage_class.map(str::to_string),
        }
    }

    /// Requested size, if any
    pub fn size(&self) -> Option<&str> {
        self.resources.requests.get("storage").map(String::as_str)
    }
}

/// Desired state common to every database kind.
///
/// Engine-specific settings (topology, replica sets, pod templates) live in
/// `extra` and are passed through untouched.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DatabaseSpec {
    #[serde(default)]
    pub version: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub replicas: Option<u32>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub storage_type: Option<StorageType>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub storage: Option<StorageSpec>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub termination_policy: Option<TerminationPolicy>,

    #[serde(flatten)]
    pub extra: serde_json::Map<String, Value>,
}

impl DatabaseSpec {
    /// Spec with only a version set
    pub fn with_version(version: impl Into<String>) -> Self {
        Self {
            version: version.into(),
            ..Default::default()
        }
    }

    /// Whether the spec asks for persistent storage
    pub fn is_durable(&self) -> bool {
        !matches!(self.storage_type, Some(StorageType::Ephemeral))
    }
}

/// A resource as exchanged with the resource-management API
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DynamicResource {
    #[serde(default)]
    pub api_version: String,

    #[serde(default)]
    pub kind: String,

    #[serde(default)]
    pub metadata: ObjectMeta,

    #[serde(default)]
    pub spec: Value,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<ResourceStatus>,
}

impl DynamicResource {
    /// Build a resource of the given kind from a serializable spec
    pub fn new<S: Serialize>(kind: ResourceKind, metadata: ObjectMeta, spec: &S) -> Result<Self> {
        Ok(Self {
            api_version: API_VERSION.to_string(),
            kind: kind.kind_name().to_string(),
            metadata,
            spec: serde_json::to_value(spec)?,
            status: None,
        })
    }

    /// Resource name
    pub fn name(&self) -> &str {
        &self.metadata.name
    }

    /// Current phase, if the operator reported one
    pub fn phase(&self) -> Option<DatabasePhase> {
        self.status.as_ref().and_then(|s| s.phase)
    }

    /// Whether the resource reached the Running phase
    pub fn is_running(&self) -> bool {
        self.phase() == Some(DatabasePhase::Running)
    }

    /// Termination policy from the spec
    pub fn termination_policy(&self) -> Option<TerminationPolicy> {
        self.spec
            .get("terminationPolicy")
            .cloned()
            .and_then(|v| serde_json::from_value(v).ok())
    }

    /// Whether a dormant placeholder is marked for wipe-out
    pub fn wipe_out(&self) -> bool {
        self.spec
            .get("wipeOut")
            .and_then(Value::as_bool)
            .unwrap_or(false)
    }

    /// Value of the instance-id label
    pub fn instance_id(&self) -> Option<&str> {
        self.metadata
            .labels
            .get(INSTANCE_ID_LABEL)
            .map(String::as_str)
    }
}

/// Equality-based label selector
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LabelSelector(BTreeMap<String, String>);

impl LabelSelector {
    /// Selector matching one instance identifier
    pub fn instance(instance_id: &str) -> Self {
        Self::default().with(INSTANCE_ID_LABEL, instance_id)
    }

    /// Add a `key=value` requirement
    fn with(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.0.insert(key.into(), value.into());
        self
    }

    /// Whether the labels satisfy every requirement
    pub fn matches(&self, labels: &BTreeMap<String, String>) -> bool {
        self.0.iter().all(|(k, v)| labels.get(k) == Some(v))
    }

    /// Whether the selector has no requirements
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Display for LabelSelector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let parts: Vec<String> = self.0.iter().map(|(k, v)| format!("{}={}", k, v)).collect();
        f.write_str(&parts.join(","))
    }
}

/// Deserialize a JSON value into a spec, reporting failures against `key`
pub fn spec_from_value<S: DeserializeOwned>(key: &str, value: &Value) -> Result<S> {
    serde_json::from_value(value.clone()).map_err(|e| Error::invalid_parameter(key, e.to_string()))
}
