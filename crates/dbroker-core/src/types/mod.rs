//! Type definitions for provisioning records and backend resources

mod network_types;
mod provision_types;
mod resource_types;

pub use network_types::*;
pub use provision_types::*;
pub use resource_types::*;
