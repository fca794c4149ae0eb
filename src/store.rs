//! Region store.
//!
//! Owns every defined region together with its annotation, overlay flag and
//! monitoring state. Iteration follows insertion order; a relocated region is
//! re-inserted at the end.

use std::collections::{BTreeMap, HashMap};

use serde::{Deserialize, Serialize};

use crate::coordinate::{Coordinate, RegionId};
use crate::error::StoreError;
use crate::region::{validate_radius, Annotation, PropertyChange, Region};

/// Per-region monitoring state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MonitoringState {
    /// Stored but not (or no longer) watched by the service.
    Unmonitored,
    /// A start request was issued and not yet stopped.
    Monitoring,
    /// Drag in progress; monitoring of the old position has been stopped.
    Relocating,
}

/// Everything the engine tracks for one region.
///
/// Read-only outside the crate; the overlay flag and state only change through
/// the lifecycle and [`AnnotationSync`](crate::sync::AnnotationSync).
#[derive(Debug, Clone, PartialEq)]
pub struct RegionEntry {
    pub(crate) region: Region,
    pub(crate) annotation: Annotation,
    /// Single source of truth for whether the radius overlay is on the map.
    pub(crate) overlay_drawn: bool,
    pub(crate) state: MonitoringState,
}

impl RegionEntry {
    fn new(region: Region) -> Self {
        let annotation = Annotation::for_region(&region);
        Self {
            region,
            annotation,
            overlay_drawn: false,
            state: MonitoringState::Unmonitored,
        }
    }

    /// The stored region.
    #[must_use]
    pub const fn region(&self) -> &Region {
        &self.region
    }

    /// The region's map pin.
    #[must_use]
    pub const fn annotation(&self) -> &Annotation {
        &self.annotation
    }

    /// Whether the radius overlay is currently on the map.
    #[must_use]
    pub const fn overlay_drawn(&self) -> bool {
        self.overlay_drawn
    }

    /// Monitoring state.
    #[must_use]
    pub const fn state(&self) -> MonitoringState {
        self.state
    }
}

/// Insertion-ordered set of regions keyed by id.
#[derive(Debug, Default)]
pub struct RegionStore {
    by_id: HashMap<RegionId, u64>,
    entries: BTreeMap<u64, RegionEntry>,
    next_seq: u64,
}

impl RegionStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a region centered at `center`.
    ///
    /// # Errors
    ///
    /// `DuplicateRegion` if the derived id exists; `InvalidCoordinate` /
    /// `InvalidRadius` for unusable input. Nothing is mutated on error.
    pub fn add(&mut self, center: Coordinate, radius: f64) -> Result<Region, StoreError> {
        let region = Region::new(center, radius);
        self.insert(region.clone())?;
        Ok(region)
    }

    /// Inserts a fully formed region (ids reported by the service are kept).
    ///
    /// # Errors
    ///
    /// Same as [`RegionStore::add`].
    pub fn insert(&mut self, region: Region) -> Result<(), StoreError> {
        region.center.validate()?;
        validate_radius(region.radius)?;
        if self.by_id.contains_key(&region.id) {
            return Err(StoreError::DuplicateRegion { id: region.id });
        }

        let seq = self.next_seq;
        self.next_seq += 1;
        self.by_id.insert(region.id.clone(), seq);
        self.entries.insert(seq, RegionEntry::new(region));
        Ok(())
    }

    /// Removes a region along with its annotation and overlay flag.
    ///
    /// # Errors
    ///
    /// `NotFound` if absent.
    pub fn remove(&mut self, id: &RegionId) -> Result<RegionEntry, StoreError> {
        let seq = self
            .by_id
            .remove(id)
            .ok_or_else(|| StoreError::NotFound { id: id.clone() })?;
        self.entries
            .remove(&seq)
            .ok_or_else(|| StoreError::NotFound { id: id.clone() })
    }

    /// Replaces region `id` with one centered at `new_center` and the same
    /// radius. The returned region carries the new id.
    ///
    /// # Errors
    ///
    /// `NotFound` if `id` is absent; `DuplicateRegion` if the new id differs
    /// from `id` and is already taken; `InvalidCoordinate` for a bad center.
    /// The store is unchanged on error.
    pub fn relocate(&mut self, id: &RegionId, new_center: Coordinate) -> Result<Region, StoreError> {
        new_center.validate()?;
        let old = self
            .get(id)
            .ok_or_else(|| StoreError::NotFound { id: id.clone() })?;
        let moved = old.region.relocated(new_center);
        if moved.id != *id && self.by_id.contains_key(&moved.id) {
            return Err(StoreError::DuplicateRegion { id: moved.id });
        }

        self.remove(id)?;
        self.insert(moved.clone())?;
        Ok(moved)
    }

    /// Sets the radius of region `id` and its annotation together. Returns
    /// the annotation's subtitle change, `None` if the rendered subtitle is
    /// unchanged.
    ///
    /// # Errors
    ///
    /// `InvalidRadius` or `NotFound`; nothing is mutated on error.
    pub fn set_radius(&mut self, id: &RegionId, radius: f64) -> Result<Option<PropertyChange>, StoreError> {
        validate_radius(radius)?;
        let entry = self.entry_mut(id)?;
        entry.region.radius = radius;
        Ok(entry.annotation.set_radius(radius))
    }

    /// Regions in insertion order.
    #[must_use]
    pub fn list(&self) -> Vec<Region> {
        self.entries.values().map(|e| e.region.clone()).collect()
    }

    /// Entries in insertion order.
    pub fn entries(&self) -> impl Iterator<Item = &RegionEntry> {
        self.entries.values()
    }

    /// Entry for `id`, if present.
    #[must_use]
    pub fn get(&self, id: &RegionId) -> Option<&RegionEntry> {
        self.by_id.get(id).and_then(|seq| self.entries.get(seq))
    }

    pub(crate) fn get_mut(&mut self, id: &RegionId) -> Option<&mut RegionEntry> {
        let seq = self.by_id.get(id)?;
        self.entries.get_mut(seq)
    }

    /// Like [`RegionStore::get_mut`], failing with `NotFound`.
    ///
    /// # Errors
    ///
    /// `NotFound` if absent.
    pub(crate) fn entry_mut(&mut self, id: &RegionId) -> Result<&mut RegionEntry, StoreError> {
        self.get_mut(id)
            .ok_or_else(|| StoreError::NotFound { id: id.clone() })
    }

    /// Whether a region with this id is stored.
    #[must_use]
    pub fn contains(&self, id: &RegionId) -> bool {
        self.by_id.contains_key(id)
    }

    /// Number of stored regions.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the store holds no regions.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
