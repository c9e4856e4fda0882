//! reqwest-backed `ResourceClient`

use super::{ApiResult, ResourceClient};
use async_trait::async_trait;
use dbroker_core::config::ClusterConfig;
use dbroker_core::types::{DynamicResource, LabelSelector, ResourceKind, Secret, Service};
use dbroker_core::{ApiError, Error, Result};
use reqwest::header::{ACCEPT, CONTENT_TYPE};
use reqwest::{RequestBuilder, Response};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::{json, Value};
use std::fs;
use tracing::{debug, trace};
use url::Url;

const GROUP_VERSION: &str = "kubedb.com/v1alpha1";
const MERGE_PATCH: &str = "application/merge-patch+json";

/// Client for the resource-management REST API
pub struct HttpResourceClient {
    client: reqwest::Client,
    base_url: String,
    token: Option<String>,
}

/// List envelope
#[derive(Debug, Deserialize)]
struct ResourceList<T> {
    #[serde(default = "Vec::new")]
    items: Vec<T>,
}

/// Failure body returned by the API server
#[derive(Debug, Deserialize)]
struct StatusBody {
    #[serde(default)]
    message: Option<String>,
}

impl HttpResourceClient {
    /// Create a client for the API server at `base_url`
    pub fn new(base_url: impl Into<String>) -> Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent(concat!("dbroker/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| Error::invalid_config(format!("Failed to build HTTP client: {}", e)))?;
        Self::with_client(client, base_url)
    }

    /// Create a client from cluster connection settings
    pub fn from_config(cluster: &ClusterConfig) -> Result<Self> {
        let base_url = cluster.api_server.clone().ok_or_else(|| {
            Error::invalid_config(
                "cluster.api-server is not set and no in-cluster service account was found",
            )
        })?;

        let mut builder = reqwest::Client::builder()
            .user_agent(concat!("dbroker/", env!("CARGO_PKG_VERSION")))
            .timeout(cluster.request_timeout());

        if let Some(ca_file) = &cluster.ca_file {
            let pem = fs::read(ca_file)?;
            let cert = reqwest::Certificate::from_pem(&pem).map_err(|e| {
                Error::invalid_config(format!("Invalid CA bundle {}: {}", ca_file, e))
            })?;
            builder = builder.add_root_certificate(cert);
        }
        if cluster.insecure_skip_tls_verify {
            builder = builder.danger_accept_invalid_certs(true);
        }

        let client = builder
            .build()
            .map_err(|e| Error::invalid_config(format!("Failed to build HTTP client: {}", e)))?;

        let this = Self::with_client(client, base_url)?;
        Ok(match cluster.bearer_token()? {
            Some(token) => this.with_token(token),
            None => this,
        })
    }

    fn with_client(client: reqwest::Client, base_url: impl Into<String>) -> Result<Self> {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Url::parse(&base_url)
            .map_err(|e| Error::invalid_config(format!("Invalid API server URL {}: {}", base_url, e)))?;
        Ok(Self {
            client,
            base_url,
            token: None,
        })
    }

    /// Set the bearer token
    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        self.token = Some(token.into());
        self
    }

    fn url(&self, path: &str) -> ApiResult<Url> {
        Url::parse(&format!("{}{}", self.base_url, path))
            .map_err(|e| ApiError::Transport(format!("invalid request URL: {}", e)))
    }

    fn resource_url(&self, kind: ResourceKind, namespace: &str, name: Option<&str>) -> ApiResult<Url> {
        let mut path = if namespace.is_empty() {
            format!("/apis/{}/{}", GROUP_VERSION, kind.plural())
        } else {
            format!(
                "/apis/{}/namespaces/{}/{}",
                GROUP_VERSION,
                namespace,
                kind.plural()
            )
        };
        if let Some(name) = name {
            path.push('/');
            path.push_str(name);
        }
        self.url(&path)
    }

    fn core_url(&self, namespace: &str, plural: &str, name: &str) -> ApiResult<Url> {
        self.url(&format!("/api/v1/namespaces/{}/{}/{}", namespace, plural, name))
    }

    async fn send(&self, request: RequestBuilder, kind: &str, name: &str) -> ApiResult<Response> {
        let request = match &self.token {
            Some(token) => request.bearer_auth(token),
            None => request,
        };
        let response = request
            .header(ACCEPT, "application/json")
            .send()
            .await
            .map_err(|e| ApiError::Transport(e.to_string()))?;

        let status = response.status();
        trace!("{} {} -> {}", kind, name, status);
        if status.is_success() {
            return Ok(response);
        }

        let body = response.text().await.unwrap_or_default();
        let message = serde_json::from_str::<StatusBody>(&body)
            .ok()
            .and_then(|s| s.message)
            .unwrap_or(body);

        Err(match status.as_u16() {
            404 => ApiError::not_found(kind, name),
            409 => ApiError::already_exists(kind, name),
            400 | 422 => ApiError::Invalid {
                kind: kind.to_string(),
                name: name.to_string(),
                message,
            },
            code => ApiError::Status {
                status: code,
                message,
            },
        })
    }

    async fn decode<T: DeserializeOwned>(response: Response) -> ApiResult<T> {
        response
            .json::<T>()
            .await
            .map_err(|e| ApiError::Decode(e.to_string()))
    }
}

#[async_trait]
impl ResourceClient for HttpResourceClient {
    async fn create(
        &self,
        kind: ResourceKind,
        resource: &DynamicResource,
    ) -> ApiResult<DynamicResource> {
        let url = self.resource_url(kind, &resource.metadata.namespace, None)?;
        debug!("Creating {} {}", kind, resource.name());
        let response = self
            .send(
                self.client.post(url).json(resource),
                kind.kind_name(),
                resource.name(),
            )
            .await?;
        Self::decode(response).await
    }

    async fn get(
        &self,
        kind: ResourceKind,
        namespace: &str,
        name: &str,
    ) -> ApiResult<DynamicResource> {
        let url = self.resource_url(kind, namespace, Some(name))?;
        let response = self.send(self.client.get(url), kind.kind_name(), name).await?;
        Self::decode(response).await
    }

    async fn patch(
        &self,
        kind: ResourceKind,
        namespace: &str,
        name: &str,
        patch: &Value,
    ) -> ApiResult<DynamicResource> {
        let url = self.resource_url(kind, namespace, Some(name))?;
        debug!("Patching {} {}: {}", kind, name, patch);
        let body = serde_json::to_vec(patch).map_err(|e| ApiError::Decode(e.to_string()))?;
        let response = self
            .send(
                self.client
                    .patch(url)
                    .header(CONTENT_TYPE, MERGE_PATCH)
                    .body(body),
                kind.kind_name(),
                name,
            )
            .await?;
        Self::decode(response).await
    }

    async fn delete(&self, kind: ResourceKind, namespace: &str, name: &str) -> ApiResult<()> {
        let url = self.resource_url(kind, namespace, Some(name))?;
        debug!("Deleting {} {}", kind, name);
        let options = json!({
            "kind": "DeleteOptions",
            "apiVersion": "v1",
            "propagationPolicy": "Background"
        });
        self.send(self.client.delete(url).json(&options), kind.kind_name(), name)
            .await?;
        Ok(())
    }

    async fn list(
        &self,
        kind: ResourceKind,
        namespace: &str,
        selector: &LabelSelector,
    ) -> ApiResult<Vec<DynamicResource>> {
        let mut url = self.resource_url(kind, namespace, None)?;
        if !selector.is_empty() {
            url.query_pairs_mut()
                .append_pair("labelSelector", &selector.to_string());
        }
        let response = self.send(self.client.get(url), kind.kind_name(), "").await?;
        let list: ResourceList<DynamicResource> = Self::decode(response).await?;

        // List items may omit apiVersion and kind
        Ok(list
            .items
            .into_iter()
            .map(|mut item| {
                if item.kind.is_empty() {
                    item.kind = kind.kind_name().to_string();
                }
                if item.api_version.is_empty() {
                    item.api_version = GROUP_VERSION.to_string();
                }
                item
            })
            .collect())
    }

    async fn get_service(&self, namespace: &str, name: &str) -> ApiResult<Service> {
        let url = self.core_url(namespace, "services", name)?;
        let response = self.send(self.client.get(url), "Service", name).await?;
        Self::decode(response).await
    }

    async fn get_secret(&self, namespace: &str, name: &str) -> ApiResult<Secret> {
        let url = self.core_url(namespace, "secrets", name)?;
        let response = self.send(self.client.get(url), "Secret", name).await?;
        Self::decode(response).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resource_urls() {
        let client = HttpResourceClient::new("https://api.example:6443/").unwrap();

        let url = client
            .resource_url(ResourceKind::Postgres, "svc", Some("pg-1"))
            .unwrap();
        assert_eq!(
            url.as_str(),
            "https://api.example:6443/apis/kubedb.com/v1alpha1/namespaces/svc/postgreses/pg-1"
        );

        let url = client
            .resource_url(ResourceKind::DormantDatabase, "", None)
            .unwrap();
        assert_eq!(
            url.as_str(),
            "https://api.example:6443/apis/kubedb.com/v1alpha1/dormantdatabases"
        );

        let url = client.core_url("svc", "secrets", "pg-1-auth").unwrap();
        assert_eq!(
            url.as_str(),
            "https://api.example:6443/api/v1/namespaces/svc/secrets/pg-1-auth"
        );
    }

    #[test]
    fn test_invalid_base_url_is_config_error() {
        assert!(matches!(
            HttpResourceClient::new("not a url"),
            Err(Error::InvalidConfig { .. })
        ));
    }

    #[test]
    fn test_from_config_requires_api_server() {
        let cluster = ClusterConfig::default();
        assert!(matches!(
            HttpResourceClient::from_config(&cluster),
            Err(Error::InvalidConfig { .. })
        ));
    }
}
