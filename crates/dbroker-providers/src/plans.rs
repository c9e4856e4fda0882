//! Spec helpers shared by the demo and custom plans

use dbroker_core::types::{
    DatabaseSpec, ProvisionInfo, StorageSpec, StorageType, TerminationPolicy,
};
use dbroker_core::{Error, Result};

/// Size of the volume claimed by demo plans
pub const DEMO_STORAGE_SIZE: &str = "1Gi";

/// Demo spec for an engine that keeps its data on a volume
pub fn durable_demo_spec(version: &str, storage_class: &str) -> DatabaseSpec {
    DatabaseSpec {
        storage_type: Some(StorageType::Durable),
        storage: Some(StorageSpec::new(DEMO_STORAGE_SIZE, Some(storage_class))),
        termination_policy: Some(TerminationPolicy::WipeOut),
        ..DatabaseSpec::with_version(version)
    }
}

/// Demo spec for an in-memory cache engine
pub fn ephemeral_demo_spec(version: &str) -> DatabaseSpec {
    DatabaseSpec {
        storage_type: Some(StorageType::Ephemeral),
        termination_policy: Some(TerminationPolicy::WipeOut),
        ..DatabaseSpec::with_version(version)
    }
}

/// Caller-supplied spec of a custom plan.
///
/// When `needs_storage` is set, durable specs must carry a volume claim.
pub fn custom_spec(info: &ProvisionInfo, needs_storage: bool) -> Result<DatabaseSpec> {
    let spec = info.custom_spec()?;
    if needs_storage && spec.is_durable() && spec.storage.is_none() {
        return Err(Error::invalid_parameter(
            "spec.storage",
            "durable storage requires a volume claim",
        ));
    }
    Ok(spec)
}
