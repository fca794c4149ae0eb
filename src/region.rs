//! Regions and their map annotations.

use serde::{Deserialize, Serialize};

use crate::coordinate::{Coordinate, RegionId};
use crate::error::StoreError;

/// Radius used for newly added regions.
pub const DEFAULT_RADIUS_METERS: f64 = 1000.0;

/// Title shown on every region annotation.
pub const ANNOTATION_TITLE: &str = "Monitored Region";

/// Shape class of a region, as understood by the location service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
#[non_exhaustive]
pub enum RegionKind {
    /// Center plus radius.
    Circular,
}

/// A circular geofence.
///
/// # Examples
///
/// ```
/// use regionwatch::{Coordinate, Region};
///
/// let region = Region::new(Coordinate::new(37.0, -122.0), 250.0);
/// assert_eq!(region.id.as_str(), "37.000000, -122.000000");
/// assert!(region.notify_on_entry && region.notify_on_exit);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Region {
    /// Coordinate-derived identity.
    pub id: RegionId,
    /// Center of the circle.
    pub center: Coordinate,
    /// Radius in meters.
    pub radius: f64,
    /// Report crossings into the region.
    pub notify_on_entry: bool,
    /// Report crossings out of the region.
    pub notify_on_exit: bool,
}

impl Region {
    /// Creates a region with an id derived from `center`.
    #[must_use]
    pub fn new(center: Coordinate, radius: f64) -> Self {
        Self::with_id(center.region_id(), center, radius)
    }

    /// Creates a region with an explicit id, e.g. one reported by the service.
    #[must_use]
    pub fn with_id(id: RegionId, center: Coordinate, radius: f64) -> Self {
        Self {
            id,
            center,
            radius,
            notify_on_entry: true,
            notify_on_exit: true,
        }
    }

    /// Always circular; non-circular shapes are not modeled.
    #[must_use]
    pub const fn kind(&self) -> RegionKind {
        RegionKind::Circular
    }

    /// The replacement region after moving the center. Radius and notification
    /// flags carry over; the id is re-derived.
    #[must_use]
    pub fn relocated(&self, new_center: Coordinate) -> Self {
        Self {
            id: new_center.region_id(),
            center: new_center,
            radius: self.radius,
            notify_on_entry: self.notify_on_entry,
            notify_on_exit: self.notify_on_exit,
        }
    }

    /// Validates center and radius.
    ///
    /// # Errors
    ///
    /// Returns `InvalidCoordinate` or `InvalidRadius`.
    pub fn validate(&self) -> Result<(), StoreError> {
        self.center.validate()?;
        validate_radius(self.radius)
    }
}

pub(crate) fn validate_radius(radius: f64) -> Result<(), StoreError> {
    if radius.is_finite() && radius > 0.0 {
        Ok(())
    } else {
        Err(StoreError::InvalidRadius { radius })
    }
}

/// A change to an observable annotation property.
#[allow(missing_docs)]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PropertyChange {
    pub property: &'static str,
    pub old: String,
    pub new: String,
}

/// Display projection of a region (the map pin).
///
/// The radius is only changed through
/// [`RegionStore::set_radius`](crate::store::RegionStore::set_radius), which
/// keeps it equal to the region's.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Annotation {
    /// Id of the projected region.
    pub region_id: RegionId,
    /// Pin position; the region center.
    pub coordinate: Coordinate,
    radius: f64,
    /// Always [`ANNOTATION_TITLE`].
    pub title: String,
}

impl Annotation {
    /// Projects a region.
    #[must_use]
    pub fn for_region(region: &Region) -> Self {
        Self {
            region_id: region.id.clone(),
            coordinate: region.center,
            radius: region.radius,
            title: ANNOTATION_TITLE.to_string(),
        }
    }

    /// Radius in meters.
    #[must_use]
    pub const fn radius(&self) -> f64 {
        self.radius
    }

    /// `"Lat: %.4f, Lon: %.4f, Rad: %.1fm"`, derived on every call.
    #[must_use]
    pub fn subtitle(&self) -> String {
        format!(
            "Lat: {:.4}, Lon: {:.4}, Rad: {:.1}m",
            self.coordinate.latitude, self.coordinate.longitude, self.radius
        )
    }

    /// Sets the radius and reports the subtitle change, if any. Identity and
    /// coordinate are untouched.
    pub(crate) fn set_radius(&mut self, radius: f64) -> Option<PropertyChange> {
        let old = self.subtitle();
        self.radius = radius;
        let new = self.subtitle();
        (old != new).then_some(PropertyChange {
            property: "subtitle",
            old,
            new,
        })
    }
}
