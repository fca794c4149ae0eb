//! The external location-monitoring service and the events it delivers.
//!
//! Start/stop calls are fire-and-forget: an `Err` only means the request never
//! reached the service. Outcomes arrive later as [`LocationEvent`]s.

use serde::{Deserialize, Serialize};

use crate::coordinate::{Coordinate, RegionId};
use crate::error::ServiceError;
use crate::region::{Region, RegionKind};

/// Location authorization granted to the application.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
#[allow(missing_docs)]
pub enum AuthState {
    NotDetermined,
    Denied,
    AuthorizedWhenInUse,
    AuthorizedAlways,
}

impl AuthState {
    /// True for either authorized state.
    #[must_use]
    pub const fn is_authorized(&self) -> bool {
        matches!(self, Self::AuthorizedWhenInUse | Self::AuthorizedAlways)
    }
}

/// Drag state of an annotation on the map surface.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
#[allow(missing_docs)]
pub enum DragState {
    None,
    Starting,
    Dragging,
    Canceling,
    Ending,
}

/// Application foreground/background phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
#[allow(missing_docs)]
pub enum AppPhase {
    Foreground,
    Background,
}

/// Inbound events, consumed by one serialized handler.
#[allow(missing_docs)]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum LocationEvent {
    /// The device entered a monitored region.
    Entered {
        region_id: RegionId,
    },

    /// The device left a monitored region.
    Exited {
        region_id: RegionId,
    },

    /// Monitoring failed, optionally for a specific region.
    Failed {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        region_id: Option<RegionId>,
        error: String,
    },

    AuthChanged {
        status: AuthState,
    },

    /// New fixes, oldest first.
    LocationUpdated {
        locations: Vec<Coordinate>,
    },

    /// An annotation drag moved between states. `coordinate` is the pin
    /// position at the time of the change.
    DragStateChanged {
        region_id: RegionId,
        old: DragState,
        new: DragState,
        coordinate: Coordinate,
    },

    AppPhaseChanged {
        phase: AppPhase,
    },

    /// Generic delivery failure of the service itself.
    ServiceError {
        message: String,
    },
}

/// Platform location-monitoring service.
pub trait LocationService: Send + Sync {
    /// Current authorization, read once at startup.
    fn authorization_status(&self) -> AuthState;

    /// Prompts for always-authorization; the answer arrives as `AuthChanged`.
    fn request_always_authorization(&self);

    /// Starts watching a region.
    ///
    /// # Errors
    ///
    /// Transport failure only; monitoring failures arrive as events.
    fn start_monitoring(&self, region: &Region) -> Result<(), ServiceError>;

    /// Stops watching a region.
    ///
    /// # Errors
    ///
    /// Transport failure only.
    fn stop_monitoring(&self, region: &Region) -> Result<(), ServiceError>;

    /// Whether regions of this shape can be monitored on this device.
    fn is_monitoring_available(&self, kind: RegionKind) -> bool;

    /// Starts standard location updates.
    fn start_updating_location(&self);

    /// Stops standard location updates.
    fn stop_updating_location(&self);

    /// Whether the low-power significant-change feed exists.
    fn is_significant_change_available(&self) -> bool;

    /// Starts the significant-change feed.
    fn start_significant_change_monitoring(&self);

    /// Stops the significant-change feed.
    fn stop_significant_change_monitoring(&self);

    /// Regions the service is already watching, e.g. from a previous run.
    fn monitored_regions(&self) -> Vec<Region>;
}
