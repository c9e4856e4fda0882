//! Error types for dbroker-core

use crate::types::ResourceKind;
use std::fmt;
use std::time::Duration;
use thiserror::Error;

/// Result type alias using dbroker-core's Error type
pub type Result<T> = std::result::Result<T, Error>;

/// Errors reported by a resource-management client
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ApiError {
    /// The addressed object does not exist
    #[error("{kind} \"{name}\" not found")]
    NotFound { kind: String, name: String },

    /// An object with the same name already exists
    #[error("{kind} \"{name}\" already exists")]
    AlreadyExists { kind: String, name: String },

    /// The API rejected the object as invalid
    #[error("{kind} \"{name}\" is invalid: {message}")]
    Invalid {
        kind: String,
        name: String,
        message: String,
    },

    /// Any other non-success response
    #[error("API request failed with status {status}: {message}")]
    Status { status: u16, message: String },

    /// The request never produced a response
    #[error("transport error: {0}")]
    Transport(String),

    /// The response body could not be decoded
    #[error("failed to decode API response: {0}")]
    Decode(String),
}

impl ApiError {
    /// Create a not found error
    pub fn not_found(kind: impl Into<String>, name: impl Into<String>) -> Self {
        Self::NotFound {
            kind: kind.into(),
            name: name.into(),
        }
    }

    /// Create an already exists error
    pub fn already_exists(kind: impl Into<String>, name: impl Into<String>) -> Self {
        Self::AlreadyExists {
            kind: kind.into(),
            name: name.into(),
        }
    }

    /// Whether the error means the object is absent
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }
}

/// Step of a teardown sequence, reported with `Error::Teardown`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TeardownStep {
    /// Reading the primary resource
    Inspect,
    /// Forcing the termination policy to WipeOut
    EnforceWipeOut,
    /// Deleting the primary resource
    DeletePrimary,
    /// Waiting for the dormant placeholder
    AwaitDormant,
    /// Marking the dormant placeholder for wipe-out
    WipeDormant,
    /// Deleting the dormant placeholder
    DeleteDormant,
    /// Waiting for the dormant placeholder to disappear
    AwaitRemoval,
}

impl fmt::Display for TeardownStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TeardownStep::Inspect => write!(f, "inspecting the resource"),
            TeardownStep::EnforceWipeOut => write!(f, "enforcing the WipeOut termination policy"),
            TeardownStep::DeletePrimary => write!(f, "deleting the resource"),
            TeardownStep::AwaitDormant => write!(f, "waiting for the dormant database"),
            TeardownStep::WipeDormant => write!(f, "wiping out the dormant database"),
            TeardownStep::DeleteDormant => write!(f, "deleting the dormant database"),
            TeardownStep::AwaitRemoval => write!(f, "waiting for the dormant database to go away"),
        }
    }
}

/// Core error types for dbroker
#[derive(Error, Debug)]
pub enum Error {
    /// The resource-management API rejected the desired-state object
    #[error("failed to submit {kind} \"{name}\": {source}")]
    Submission {
        kind: ResourceKind,
        name: String,
        #[source]
        source: ApiError,
    },

    /// A polling deadline elapsed
    #[error("timed out after {timeout:?} waiting for {what}")]
    ReadinessTimeout { what: String, timeout: Duration },

    /// A step of the delete sequence failed
    #[error("teardown of \"{name}\" failed while {step}: {source}")]
    Teardown {
        name: String,
        step: TeardownStep,
        #[source]
        source: Box<Error>,
    },

    /// The service exposes no ports
    #[error("no ports found on service \"{service}\"")]
    NoPortsFound { service: String },

    /// The credential secret lacks the expected key
    #[error("{key} not found in secret keys")]
    MissingSecretKey { key: String },

    /// No provider is registered for the identifier
    #[error("Unknown provider: {id}")]
    UnknownProvider { id: String },

    /// The provider does not serve the plan
    #[error("service {service} has no plan {plan}")]
    UnknownPlan { service: String, plan: String },

    /// A caller parameter is missing or has the wrong type
    #[error("invalid parameter {key}: {message}")]
    InvalidParameter { key: String, message: String },

    /// A provisioning record could not be built or read back
    #[error("invalid provision info: {message}")]
    InvalidProvisionInfo { message: String },

    /// A secret value is not valid base64 or UTF-8
    #[error("secret key {key} does not hold a valid value")]
    InvalidSecret { key: String },

    /// An instance with the identifier is already provisioned
    #[error("instance {instance_id} is already provisioned")]
    AlreadyProvisioned { instance_id: String },

    /// No resource carries the instance identifier
    #[error("instance {instance_id} not found")]
    InstanceNotFound { instance_id: String },

    /// More than one resource carries the instance identifier
    #[error("instance {instance_id} is recorded on {matches} resources")]
    InconsistentState { instance_id: String, matches: usize },

    /// Resource-management API failure outside of a submission
    #[error(transparent)]
    Api(#[from] ApiError),

    /// Configuration file not found
    #[error("Configuration file not found: {path}")]
    ConfigNotFound { path: String },

    /// Invalid configuration
    #[error("Invalid configuration: {message}")]
    InvalidConfig { message: String },

    /// YAML parsing error
    #[error("YAML parsing error: {0}")]
    Yaml(#[from] serde_yaml_ng::Error),

    /// JSON parsing error
    #[error("JSON parsing error: {0}")]
    Json(#[from] serde_json::Error),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Create a teardown error for a failed step
    pub fn teardown(name: impl Into<String>, step: TeardownStep, source: Error) -> Self {
        Self::Teardown {
            name: name.into(),
            step,
            source: Box::new(source),
        }
    }

    /// Create a missing secret key error
    pub fn missing_secret_key(key: impl Into<String>) -> Self {
        Self::MissingSecretKey { key: key.into() }
    }

    /// Create an invalid parameter error
    pub fn invalid_parameter(key: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidParameter {
            key: key.into(),
            message: message.into(),
        }
    }

    /// Create an invalid provision info error
    pub fn invalid_provision_info(message: impl Into<String>) -> Self {
        Self::InvalidProvisionInfo {
            message: message.into(),
        }
    }

    /// Create an unknown provider error
    pub fn unknown_provider(id: impl Into<String>) -> Self {
        Self::UnknownProvider { id: id.into() }
    }

    /// Create an unknown plan error
    pub fn unknown_plan(service: impl Into<String>, plan: impl Into<String>) -> Self {
        Self::UnknownPlan {
            service: service.into(),
            plan: plan.into(),
        }
    }

    /// Create a config not found error
    pub fn config_not_found(path: impl Into<String>) -> Self {
        Self::ConfigNotFound { path: path.into() }
    }

    /// Create an invalid config error
    pub fn invalid_config(message: impl Into<String>) -> Self {
        Self::InvalidConfig {
            message: message.into(),
        }
    }

    /// Broker response code for this error.
    ///
    /// Data faults map to 4xx and are never worth retrying; API and
    /// readiness failures map to 5xx.
    pub fn status_code(&self) -> u16 {
        match self {
            Error::NoPortsFound { .. }
            | Error::MissingSecretKey { .. }
            | Error::InvalidParameter { .. }
            | Error::InvalidSecret { .. }
            | Error::InvalidProvisionInfo { .. } => 400,
            Error::UnknownProvider { .. } | Error::InstanceNotFound { .. } => 404,
            Error::AlreadyProvisioned { .. } => 409,
            Error::UnknownPlan { .. } => 422,
            Error::Submission { source, .. } => match source {
                ApiError::AlreadyExists { .. } => 409,
                ApiError::Invalid { .. } => 422,
                _ => 502,
            },
            Error::Api(_) | Error::Teardown { .. } => 502,
            Error::ReadinessTimeout { .. } => 504,
            Error::InconsistentState { .. }
            | Error::ConfigNotFound { .. }
            | Error::InvalidConfig { .. }
            | Error::Yaml(_)
            | Error::Json(_)
            | Error::Io(_) => 500,
        }
    }
}
