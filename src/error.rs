//! Error kinds for registry access and sensor reads

use thiserror::Error;

/// Result of a registry or sensor operation
pub type Result<T> = std::result::Result<T, Error>;

/// Every platform failure is mapped into one of these at the call site
#[derive(Debug, Clone, PartialEq, Error)]
pub enum Error {
    /// The service registry could not be queried
    #[error("Failed to query service registry: {0}")]
    QueryFailed(String),

    /// No service with the requested name exists
    #[error("Service not found: '{0}'")]
    NotFound(String),

    /// A scan produced no service exposing the light property
    #[error("No ambient light sensor found")]
    NoSensorFound,

    /// The handle no longer owns a live service reference
    #[error("No valid sensor service")]
    InvalidHandle,

    /// The service does not expose the requested property
    #[error("Failed to get {0} property")]
    PropertyUnavailable(String),

    /// The property exists but is not numeric
    #[error("{key} is not a number (found {found})")]
    TypeMismatch { key: String, found: String },

    /// Object construction failed at the binding boundary
    #[error("Allocation failed: {0}")]
    AllocationFailure(String),
}
