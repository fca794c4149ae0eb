//! Error types for regionwatch.
//!
//! All errors are strongly typed using thiserror. None of them is fatal to the
//! process: local errors are returned to the caller, and failures reported by
//! the external location service are degraded into event-log entries.

use thiserror::Error;

use crate::coordinate::RegionId;
use crate::region::RegionKind;
use crate::store::MonitoringState;

/// Errors raised by the region store before any mutation happens.
#[allow(missing_docs)]
#[derive(Debug, Error, Clone, PartialEq)]
pub enum StoreError {
    #[error("Region already exists: {id}")]
    DuplicateRegion {
        id: RegionId,
    },

    #[error("Region not found: {id}")]
    NotFound {
        id: RegionId,
    },

    #[error("Invalid coordinate: latitude {latitude}, longitude {longitude}")]
    InvalidCoordinate {
        latitude: f64,
        longitude: f64,
    },

    #[error("Invalid radius: {radius}m (must be finite and positive)")]
    InvalidRadius {
        radius: f64,
    },
}

/// Errors raised by the monitoring state machine.
#[allow(missing_docs)]
#[derive(Debug, Error, Clone, PartialEq)]
pub enum LifecycleError {
    /// Checked before any store or map mutation.
    #[error("Region monitoring is not available for {kind:?} regions")]
    MonitoringUnavailable {
        kind: RegionKind,
    },

    #[error("Cannot {operation} region {id} while it is {from:?}")]
    InvalidTransition {
        id: RegionId,
        from: MonitoringState,
        operation: &'static str,
    },
}

/// Failures reported by the external location service.
#[allow(missing_docs)]
#[derive(Debug, Error, Clone, PartialEq)]
pub enum ServiceError {
    #[error("Monitoring failed: {message}")]
    MonitoringFailed {
        message: String,
    },

    #[error("Location service error: {message}")]
    LocationService {
        message: String,
    },
}

impl ServiceError {
    /// Creates a monitoring failure.
    #[must_use]
    pub fn monitoring_failed(message: impl Into<String>) -> Self {
        Self::MonitoringFailed {
            message: message.into(),
        }
    }

    /// Creates a generic delivery failure.
    #[must_use]
    pub fn location_service(message: impl Into<String>) -> Self {
        Self::LocationService {
            message: message.into(),
        }
    }
}

/// Errors from the serialized engine worker.
#[allow(missing_docs)]
#[derive(Debug, Error, Clone, PartialEq)]
pub enum RuntimeError {
    #[error("Engine worker disconnected ({path})")]
    Disconnected {
        path: String,
    },

    #[error("Queue full on {path} (capacity {capacity})")]
    QueueFull {
        path: String,
        capacity: usize,
    },

    #[error("Failed to spawn engine worker: {message}")]
    Spawn {
        message: String,
    },
}

/// Configuration loading and validation errors.
#[allow(missing_docs)]
#[derive(Debug, Error, Clone, PartialEq)]
pub enum ConfigError {
    #[error("Invalid value for '{field}': {reason}")]
    InvalidValue {
        field: &'static str,
        reason: String,
    },

    #[error("Failed to parse configuration: {message}")]
    Parse {
        message: String,
    },
}

/// Top-level error type for regionwatch.
#[allow(missing_docs)]
#[derive(Debug, Error, Clone, PartialEq)]
pub enum GeofenceError {
    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    #[error("Lifecycle error: {0}")]
    Lifecycle(#[from] LifecycleError),

    #[error("Service error: {0}")]
    Service(#[from] ServiceError),

    #[error("Runtime error: {0}")]
    Runtime(#[from] RuntimeError),

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),
}

impl GeofenceError {
    /// Returns true if this is a store error.
    #[must_use]
    pub const fn is_store(&self) -> bool {
        matches!(self, Self::Store(_))
    }

    /// Returns true if this is a lifecycle error.
    #[must_use]
    pub const fn is_lifecycle(&self) -> bool {
        matches!(self, Self::Lifecycle(_))
    }

    /// Returns true if this error came from the external service.
    #[must_use]
    pub const fn is_service(&self) -> bool {
        matches!(self, Self::Service(_))
    }

    /// Returns true if this is a runtime error.
    #[must_use]
    pub const fn is_runtime(&self) -> bool {
        matches!(self, Self::Runtime(_))
    }

    /// Returns true if the caller can recover locally, e.g. by picking another
    /// location or refreshing its region list.
    #[must_use]
    pub const fn is_recoverable(&self) -> bool {
        match self {
            Self::Store(_) | Self::Lifecycle(_) | Self::Service(_) => true,
            Self::Runtime(e) => matches!(e, RuntimeError::QueueFull { .. }),
            Self::Config(_) => false,
        }
    }

    /// Returns true if the region was already defined.
    #[must_use]
    pub const fn is_duplicate(&self) -> bool {
        matches!(self, Self::Store(StoreError::DuplicateRegion { .. }))
    }

    /// Returns true if the region was not found.
    #[must_use]
    pub const fn is_not_found(&self) -> bool {
        matches!(self, Self::Store(StoreError::NotFound { .. }))
    }
}

/// Result type alias for regionwatch operations.
pub type GeofenceResult<T> = Result<T, GeofenceError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_duplicate_region_message_names_id() {
        let err = StoreError::DuplicateRegion {
            id: RegionId::from_raw("10.000000, 10.000000"),
        };
        let msg = format!("{err}");
        assert!(msg.contains("already exists"));
        assert!(msg.contains("10.000000, 10.000000"));
    }

    #[test]
    fn test_invalid_transition_message() {
        let err = LifecycleError::InvalidTransition {
            id: RegionId::from_raw("1.000000, 2.000000"),
            from: MonitoringState::Monitoring,
            operation: "end relocation of",
        };
        let msg = format!("{err}");
        assert!(msg.contains("end relocation of"));
        assert!(msg.contains("Monitoring"));
    }

    #[test]
    fn test_geofence_error_from_store() {
        let err: GeofenceError = StoreError::NotFound {
            id: RegionId::from_raw("x"),
        }
        .into();
        assert!(err.is_store());
        assert!(err.is_not_found());
        assert!(!err.is_duplicate());
        assert!(err.is_recoverable());
    }

    #[test]
    fn test_geofence_error_from_lifecycle() {
        let err: GeofenceError = LifecycleError::MonitoringUnavailable {
            kind: RegionKind::Circular,
        }
        .into();
        assert!(err.is_lifecycle());
        assert!(err.is_recoverable());
        assert!(format!("{err}").contains("not available"));
    }

    #[test]
    fn test_runtime_errors_recoverability() {
        let full: GeofenceError = RuntimeError::QueueFull {
            path: "events".to_string(),
            capacity: 4,
        }
        .into();
        assert!(full.is_runtime());
        assert!(full.is_recoverable());

        let gone: GeofenceError = RuntimeError::Disconnected {
            path: "commands".to_string(),
        }
        .into();
        assert!(!gone.is_recoverable());
    }

    #[test]
    fn test_config_error_is_not_recoverable() {
        let err: GeofenceError = ConfigError::InvalidValue {
            field: "default_radius_meters",
            reason: "must be positive".to_string(),
        }
        .into();
        assert!(!err.is_recoverable());
        assert!(format!("{err}").contains("default_radius_meters"));
    }

    #[test]
    fn test_service_error_constructors() {
        let err = ServiceError::monitoring_failed("radio off");
        assert_eq!(
            err,
            ServiceError::MonitoringFailed {
                message: "radio off".to_string()
            }
        );
        assert!(format!("{}", ServiceError::location_service("denied")).contains("denied"));
    }
}
