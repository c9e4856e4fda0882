//! Resource-management API client
//!
//! Providers never talk HTTP directly. They go through `ResourceClient`,
//! which is handed to them at construction so tests can substitute a fake.

mod http;

pub use http::HttpResourceClient;

use async_trait::async_trait;
use dbroker_core::types::{DynamicResource, LabelSelector, ResourceKind, Secret, Service};
use dbroker_core::ApiError;
use serde_json::Value;

/// Result type for client calls
pub type ApiResult<T> = std::result::Result<T, ApiError>;

/// Operations the providers need from the resource-management API
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ResourceClient: Send + Sync {
    /// Create a resource in its metadata namespace
    async fn create(
        &self,
        kind: ResourceKind,
        resource: &DynamicResource,
    ) -> ApiResult<DynamicResource>;

    /// Fetch a resource by name
    async fn get(&self, kind: ResourceKind, namespace: &str, name: &str)
        -> ApiResult<DynamicResource>;

    /// Apply a JSON merge patch
    async fn patch(
        &self,
        kind: ResourceKind,
        namespace: &str,
        name: &str,
        patch: &Value,
    ) -> ApiResult<DynamicResource>;

    /// Delete a resource with background propagation
    async fn delete(&self, kind: ResourceKind, namespace: &str, name: &str) -> ApiResult<()>;

    /// List resources matching the selector; an empty namespace lists all
    async fn list(
        &self,
        kind: ResourceKind,
        namespace: &str,
        selector: &LabelSelector,
    ) -> ApiResult<Vec<DynamicResource>>;

    /// Fetch a core Service
    async fn get_service(&self, namespace: &str, name: &str) -> ApiResult<Service>;

    /// Fetch a core Secret
    async fn get_secret(&self, namespace: &str, name: &str) -> ApiResult<Secret>;
}
