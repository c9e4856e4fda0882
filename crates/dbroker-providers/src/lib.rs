//! Backend providers for dbroker
//!
//! Each provider turns provisioning requests into declarative database
//! resources managed by an operator, and composes connection credentials
//! from the resulting service and secret:
//!
//! - MySQL
//! - PostgreSQL (single node and hot-standby HA)
//! - MongoDB (standalone and replica set)
//! - Elasticsearch (single node and dedicated-role topology)
//! - Redis (also serving the redis-backed cache plans)
//! - Memcached

mod binding;
pub mod broker;
pub mod client;
pub mod elasticsearch;
pub mod lifecycle;
pub mod memcached;
pub mod mongodb;
pub mod mysql;
mod plans;
pub mod postgres;
pub mod redis;
pub mod registry;
pub mod traits;

pub use broker::Broker;
pub use client::{HttpResourceClient, ResourceClient};
pub use registry::{create_provider, service_catalog, ProviderRegistry};
pub use traits::{Provider, ProviderContext};
