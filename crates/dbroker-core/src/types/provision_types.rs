//! Provisioning records
//!
//! A `ProvisionInfo` is never stored on its own: it is written onto the
//! backend resource as a label (instance id) plus an annotation (the full
//! record), and read back from there on every later request.

use super::{DatabaseSpec, ObjectMeta, INSTANCE_ID_LABEL, PROVISION_INFO_ANNOTATION};
use crate::error::{Error, Result};
use crate::params::{self, MetadataParams, Parameters, SPEC_KEY};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use sha2::{Digest, Sha256};

/// Maximum length of a DNS-1123 label
const MAX_NAME_LEN: usize = 63;

/// Hex digits of the instance-id digest appended to lossy names
const NAME_HASH_LEN: usize = 8;

/// Canonical, reconstructible record of a provisioning request
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProvisionInfo {
    /// Opaque identifier, unique per broker
    pub instance_id: String,

    /// DNS-safe resource name derived from the request
    pub instance_name: String,

    /// Service (backend) the instance belongs to
    pub service_id: String,

    /// Plan the instance was provisioned with
    pub plan_id: String,

    /// Caller-supplied parameters, kept verbatim
    #[serde(default)]
    pub parameters: Parameters,

    /// Namespace holding the resource
    #[serde(default)]
    pub namespace: String,
}

impl ProvisionInfo {
    /// Build a provisioning record from an inbound request
    pub fn new(
        instance_id: impl Into<String>,
        service_id: impl Into<String>,
        plan_id: impl Into<String>,
        parameters: Parameters,
        namespace: impl Into<String>,
    ) -> Result<Self> {
        let instance_id = instance_id.into();
        let service_id = service_id.into();

        if !is_label_value(&instance_id) {
            return Err(Error::invalid_provision_info(format!(
                "instance id {:?} cannot be used as a label value",
                instance_id
            )));
        }

        let meta = MetadataParams::from_parameters(&parameters)?;
        let instance_name = match meta.name {
            Some(name) if is_dns_label(&name) => name,
            Some(name) => {
                return Err(Error::invalid_parameter(
                    "metadata.name",
                    format!("{:?} is not a valid DNS-1123 label", name),
                ))
            }
            None => derive_instance_name(&service_id, &instance_id),
        };

        Ok(Self {
            instance_id,
            instance_name,
            service_id,
            plan_id: plan_id.into(),
            parameters,
            namespace: namespace.into(),
        })
    }

    /// Metadata for the backend resource: caller labels and annotations,
    /// then the instance-id label and the serialized record.
    pub fn to_object_meta(&self, namespace: &str) -> Result<ObjectMeta> {
        let meta = MetadataParams::from_parameters(&self.parameters)?;
        let mut object = ObjectMeta::new(&self.instance_name, namespace);
        object.labels = meta.labels;
        object.annotations = meta.annotations;

        let mut record = self.clone();
        record.namespace = namespace.to_string();
        object
            .labels
            .insert(INSTANCE_ID_LABEL.to_string(), self.instance_id.clone());
        object.annotations.insert(
            PROVISION_INFO_ANNOTATION.to_string(),
            serde_json::to_string(&record)?,
        );
        Ok(object)
    }

    /// The custom-plan spec carried in `parameters.spec`
    pub fn custom_spec(&self) -> Result<DatabaseSpec> {
        let raw = params::required_object(&self.parameters, SPEC_KEY)?;
        let spec: DatabaseSpec = super::spec_from_value(SPEC_KEY, &Value::Object(raw.clone()))?;
        if spec.version.is_empty() {
            return Err(Error::invalid_parameter("spec.version", "a version is required"));
        }
        Ok(spec)
    }

    /// Rebuild the record from a resource's metadata
    pub fn from_object_meta(meta: &ObjectMeta) -> Result<Self> {
        let raw = meta.annotations.get(PROVISION_INFO_ANNOTATION).ok_or_else(|| {
            Error::invalid_provision_info(format!(
                "{} has no {} annotation",
                meta.name, PROVISION_INFO_ANNOTATION
            ))
        })?;

        let mut info: ProvisionInfo = serde_json::from_str(raw).map_err(|e| {
            Error::invalid_provision_info(format!("{}: unreadable record: {}", meta.name, e))
        })?;

        if let Some(label) = meta.labels.get(INSTANCE_ID_LABEL) {
            if *label != info.instance_id {
                return Err(Error::invalid_provision_info(format!(
                    "{}: label {} does not match recorded instance {}",
                    meta.name, label, info.instance_id
                )));
            }
        }

        if !meta.namespace.is_empty() {
            info.namespace = meta.namespace.clone();
        }
        Ok(info)
    }
}

/// Derive a DNS-1123 label from service and instance identifiers
///
/// Ids that are already DNS-safe map to `<service>-<id>`. Any id that has
/// to be lowercased, rewritten or truncated gets a digest of the raw id
/// appended, so distinct ids never share a name.
pub fn derive_instance_name(service_id: &str, instance_id: &str) -> String {
    let raw = format!("{}-{}", service_id, instance_id);
    if is_dns_label(&raw) {
        return raw;
    }

    let mut base = String::with_capacity(raw.len());
    for c in raw.chars() {
        let c = c.to_ascii_lowercase();
        if c.is_ascii_alphanumeric() {
            base.push(c);
        } else if !base.ends_with('-') {
            base.push('-');
        }
    }
    base.truncate(MAX_NAME_LEN - NAME_HASH_LEN - 1);

    let digest = format!("{:x}", Sha256::digest(instance_id.as_bytes()));
    let base = base.trim_matches('-');
    if base.is_empty() {
        format!("x-{}", &digest[..NAME_HASH_LEN])
    } else {
        format!("{}-{}", base, &digest[..NAME_HASH_LEN])
    }
}

/// Whether `name` is a DNS-1123 label
pub fn is_dns_label(name: &str) -> bool {
    let edge_ok = |c: Option<char>| c.is_some_and(|c| c.is_ascii_lowercase() || c.is_ascii_digit());
    !name.is_empty()
        && name.len() <= MAX_NAME_LEN
        && name
            .chars()
            .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-')
        && edge_ok(name.chars().next())
        && edge_ok(name.chars().last())
}

/// Whether `value` is usable as a label value
pub fn is_label_value(value: &str) -> bool {
    let edge_ok = |c: Option<char>| c.is_some_and(|c| c.is_ascii_alphanumeric());
    !value.is_empty()
        && value.len() <= MAX_NAME_LEN
        && value
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.'))
        && edge_ok(value.chars().next())
        && edge_ok(value.chars().last())
}
