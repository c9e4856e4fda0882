//! Service endpoint and secret types read at bind time

use super::ObjectMeta;
use crate::error::{Error, Result};
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Decoded secret payload (key → value)
pub type SecretData = BTreeMap<String, String>;

/// Network service in front of a database
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Service {
    #[serde(default)]
    pub metadata: ObjectMeta,

    #[serde(default)]
    pub spec: ServiceSpec,

    #[serde(default)]
    pub status: ServiceStatus,
}

/// Service spec
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ServiceSpec {
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub service_type: Option<String>,

    #[serde(rename = "clusterIP", default, skip_serializing_if = "Option::is_none")]
    pub cluster_ip: Option<String>,

    #[serde(rename = "externalIPs", default, skip_serializing_if = "Vec::is_empty")]
    pub external_ips: Vec<String>,

    #[serde(default)]
    pub ports: Vec<ServicePort>,
}

/// One exposed port
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ServicePort {
    #[serde(default)]
    pub name: String,

    pub port: u16,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub protocol: Option<String>,
}

/// Service status
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServiceStatus {
    #[serde(default)]
    pub load_balancer: LoadBalancerStatus,
}

/// Load balancer status
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LoadBalancerStatus {
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub ingress: Vec<LoadBalancerIngress>,
}

/// Load balancer ingress point
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LoadBalancerIngress {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ip: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hostname: Option<String>,
}

impl Service {
    /// Create an empty service
    pub fn new(name: impl Into<String>, namespace: impl Into<String>) -> Self {
        Self {
            metadata: ObjectMeta::new(name, namespace),
            ..Default::default()
        }
    }

    /// Add a named port
    pub fn with_port(mut self, name: impl Into<String>, port: u16) -> Self {
        self.spec.ports.push(ServicePort {
            name: name.into(),
            port,
            protocol: Some("TCP".to_string()),
        });
        self
    }

    /// Set the cluster IP
    pub fn with_cluster_ip(mut self, ip: impl Into<String>) -> Self {
        self.spec.cluster_ip = Some(ip.into());
        self
    }

    /// Service name
    pub fn name(&self) -> &str {
        &self.metadata.name
    }

    /// Externally reachable host.
    ///
    /// Order: load balancer IP, load balancer hostname, first external IP,
    /// cluster IP (unless headless), then the in-cluster DNS name.
    pub fn reachable_host(&self) -> String {
        let ingress = self.status.load_balancer.ingress.first();
        if let Some(ip) = ingress.and_then(|i| i.ip.as_deref()).filter(|s| !s.is_empty()) {
            return ip.to_string();
        }
        if let Some(host) = ingress
            .and_then(|i| i.hostname.as_deref())
            .filter(|s| !s.is_empty())
        {
            return host.to_string();
        }
        if let Some(ip) = self.spec.external_ips.first().filter(|s| !s.is_empty()) {
            return ip.clone();
        }
        match self.spec.cluster_ip.as_deref() {
            Some(ip) if !ip.is_empty() && ip != "None" => ip.to_string(),
            _ => format!("{}.{}.svc", self.metadata.name, self.metadata.namespace),
        }
    }
}

/// Secret holding database credentials
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Secret {
    #[serde(default)]
    pub metadata: ObjectMeta,

    /// Base64-encoded values
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub data: BTreeMap<String, String>,

    /// Plain values, as accepted on write
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub string_data: BTreeMap<String, String>,
}

impl Secret {
    /// Build a secret from plain values
    pub fn from_plain(
        name: impl Into<String>,
        namespace: impl Into<String>,
        values: &[(&str, &str)],
    ) -> Self {
        let data = values
            .iter()
            .map(|(k, v)| (k.to_string(), STANDARD.encode(v)))
            .collect();
        Self {
            metadata: ObjectMeta::new(name, namespace),
            data,
            string_data: BTreeMap::new(),
        }
    }

    /// Decode every value; `stringData` entries win over `data`
    pub fn decode(&self) -> Result<SecretData> {
        let mut decoded = SecretData::new();
        for (key, value) in &self.data {
            let bytes = STANDARD
                .decode(value.trim())
                .map_err(|_| Error::InvalidSecret { key: key.clone() })?;
            let text =
                String::from_utf8(bytes).map_err(|_| Error::InvalidSecret { key: key.clone() })?;
            decoded.insert(key.clone(), text);
        }
        for (key, value) in &self.string_data {
            decoded.insert(key.clone(), value.clone());
        }
        Ok(decoded)
    }
}
