//! # dbroker-core
//!
//! Core library for the dbroker database broker providing:
//! - Provisioning records (`ProvisionInfo`) and their label/annotation encoding
//! - Declarative backend resource, service and secret types
//! - Connection credentials and the URI builder
//! - Broker configuration loading (dbroker.yaml + environment)
//! - The reconciliation waiter used by every provider

pub mod config;
pub mod credentials;
pub mod error;
pub mod params;
pub mod types;
pub mod waiter;

pub use config::BrokerConfig;
pub use credentials::{build_uri, Credentials};
pub use error::{ApiError, Error, Result};
pub use waiter::{poll_for, poll_until, WaitPolicy};
