//! Coordinates and coordinate-derived region identity.
//!
//! A region's identity is its center formatted to six fractional digits,
//! e.g. `"37.000000, -122.000000"`. The scheme is lossy: two distinct centers
//! that round to the same string name the same region.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::StoreError;

/// A geographic coordinate in degrees.
///
/// Equality is exact floating-point equality of both components; overlay
/// matching on the map surface relies on it.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinate {
    /// Latitude in degrees, [-90, 90].
    pub latitude: f64,
    /// Longitude in degrees, [-180, 180].
    pub longitude: f64,
}

impl Coordinate {
    /// Creates a coordinate without validating it.
    #[must_use]
    pub const fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
        }
    }

    /// Checks that both components are finite and within range.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::InvalidCoordinate` otherwise.
    pub fn validate(&self) -> Result<(), StoreError> {
        let lat_ok = self.latitude.is_finite() && (-90.0..=90.0).contains(&self.latitude);
        let lon_ok = self.longitude.is_finite() && (-180.0..=180.0).contains(&self.longitude);
        if lat_ok && lon_ok {
            Ok(())
        } else {
            Err(StoreError::InvalidCoordinate {
                latitude: self.latitude,
                longitude: self.longitude,
            })
        }
    }

    /// Derives the region id for a region centered here.
    #[must_use]
    pub fn region_id(&self) -> RegionId {
        RegionId::from_center(*self)
    }
}

impl fmt::Display for Coordinate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({:.6}, {:.6})", self.latitude, self.longitude)
    }
}

/// Identifier of a monitored region.
///
/// Ids created by this crate come from [`RegionId::from_center`]. Ids reported
/// by the location service are taken verbatim with [`RegionId::from_raw`].
///
/// # Examples
///
/// ```
/// use regionwatch::{Coordinate, RegionId};
///
/// let id = RegionId::from_center(Coordinate::new(37.0, -122.0));
/// assert_eq!(id.as_str(), "37.000000, -122.000000");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RegionId(String);

impl RegionId {
    /// Id recorded for failure events that carry no region.
    pub const UNKNOWN: &'static str = "unknown";

    /// Derives an id from a center coordinate.
    #[must_use]
    pub fn from_center(center: Coordinate) -> Self {
        Self(format!("{:.6}, {:.6}", center.latitude, center.longitude))
    }

    /// Wraps an id string as-is.
    #[must_use]
    pub fn from_raw(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// The placeholder id for region-less failures.
    #[must_use]
    pub fn unknown() -> Self {
        Self(Self::UNKNOWN.to_string())
    }

    /// Returns the id string.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RegionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<Coordinate> for RegionId {
    fn from(center: Coordinate) -> Self {
        Self::from_center(center)
    }
}

impl AsRef<str> for RegionId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}
