//! Abstract display traits.
//!
//! Overlays on the map hold no reference back to the annotation that asked for
//! them; the only link is the circle center. Implementations must be safe to
//! call from the engine worker thread.

use std::fmt;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::coordinate::{Coordinate, RegionId};
use crate::region::Annotation;

/// Opaque handle of an overlay placed on a map surface.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct OverlayHandle(Uuid);

impl OverlayHandle {
    /// Creates a new random handle.
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Wraps an existing UUID.
    #[must_use]
    pub const fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }
}

impl Default for OverlayHandle {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for OverlayHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A radius circle to draw.
#[allow(missing_docs)]
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CircleOverlay {
    pub center: Coordinate,
    /// Planar radius in meters.
    pub radius: f64,
}

/// An overlay currently on the map.
#[allow(missing_docs)]
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PlacedOverlay {
    pub handle: OverlayHandle,
    pub circle: CircleOverlay,
}

/// The map the regions are drawn on.
pub trait MapSurface: Send + Sync {
    /// Shows a pin for the annotation.
    fn add_annotation(&self, annotation: &Annotation);

    /// Removes the pin for a region. Unknown ids are ignored.
    fn remove_annotation(&self, region_id: &RegionId);

    /// Draws a circle and returns its handle.
    fn add_overlay(&self, circle: CircleOverlay) -> OverlayHandle;

    /// Removes an overlay. Returns false if it was not on the map.
    fn remove_overlay(&self, handle: OverlayHandle) -> bool;

    /// All overlays currently on the map.
    fn overlays(&self) -> Vec<PlacedOverlay>;

    /// Center of the visible map area.
    fn center_coordinate(&self) -> Coordinate;

    /// Moves the visible area to `center`, spanning `span_meters` each way.
    fn set_region(&self, center: Coordinate, span_meters: f64);
}

/// Sink for the notification counter (e.g. an app icon badge).
pub trait BadgeDisplay: Send + Sync {
    /// Shows `count`; zero clears the badge.
    fn set_badge_count(&self, count: u64);
}

/// User-visible notices raised by the engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Advisory {
    /// The user denied location access; nothing can be tracked.
    LocationAccessDenied,
}

impl Advisory {
    /// Text to present to the user.
    #[must_use]
    pub const fn message(&self) -> &'static str {
        match self {
            Self::LocationAccessDenied => "This app needs access to your location to monitor regions.",
        }
    }
}

/// Presents advisories (alerts, banners).
pub trait AdvisoryDisplay: Send + Sync {
    /// Presents one advisory.
    fn show_advisory(&self, advisory: Advisory);
}
