//! In-memory map surface.
//!
//! A thread-safe headless implementation of [`MapSurface`]. It renders nothing
//! but keeps the annotations, overlays and visible area observable, which is
//! what tests and embedded callers need.

use std::sync::{PoisonError, RwLock};

use crate::coordinate::{Coordinate, RegionId};
use crate::region::Annotation;

use super::traits::{CircleOverlay, MapSurface, OverlayHandle, PlacedOverlay};

#[derive(Debug)]
struct MapState {
    annotations: Vec<Annotation>,
    overlays: Vec<PlacedOverlay>,
    center: Coordinate,
    span_meters: Option<f64>,
}

/// Headless [`MapSurface`].
#[derive(Debug)]
pub struct InMemoryMapSurface {
    state: RwLock<MapState>,
}

impl Default for InMemoryMapSurface {
    fn default() -> Self {
        Self::new(Coordinate::new(0.0, 0.0))
    }
}

impl InMemoryMapSurface {
    /// Creates an empty map centered at `center`.
    #[must_use]
    pub fn new(center: Coordinate) -> Self {
        Self {
            state: RwLock::new(MapState {
                annotations: Vec::new(),
                overlays: Vec::new(),
                center,
                span_meters: None,
            }),
        }
    }

    /// Pans the map, as a user gesture would.
    pub fn set_center(&self, center: Coordinate) {
        self.state.write().unwrap_or_else(PoisonError::into_inner).center = center;
    }

    /// Annotations in the order they were added.
    #[must_use]
    pub fn annotations(&self) -> Vec<Annotation> {
        self.state.read().unwrap_or_else(PoisonError::into_inner).annotations.clone()
    }

    /// The pin for `region_id`, if shown.
    #[must_use]
    pub fn annotation(&self, region_id: &RegionId) -> Option<Annotation> {
        self.state
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .annotations
            .iter()
            .find(|a| a.region_id == *region_id)
            .cloned()
    }

    /// Number of overlays on the map.
    #[must_use]
    pub fn overlay_count(&self) -> usize {
        self.state.read().unwrap_or_else(PoisonError::into_inner).overlays.len()
    }

    /// Overlays whose center is exactly `coordinate`.
    #[must_use]
    pub fn overlays_at(&self, coordinate: Coordinate) -> Vec<PlacedOverlay> {
        self.state
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .overlays
            .iter()
            .filter(|o| o.circle.center == coordinate)
            .copied()
            .collect()
    }

    /// Last span passed to [`MapSurface::set_region`].
    #[must_use]
    pub fn span_meters(&self) -> Option<f64> {
        self.state.read().unwrap_or_else(PoisonError::into_inner).span_meters
    }
}

impl MapSurface for InMemoryMapSurface {
    fn add_annotation(&self, annotation: &Annotation) {
        let mut state = self.state.write().unwrap_or_else(PoisonError::into_inner);
        // Re-adding a region replaces its pin.
        state.annotations.retain(|a| a.region_id != annotation.region_id);
        state.annotations.push(annotation.clone());
    }

    fn remove_annotation(&self, region_id: &RegionId) {
        let mut state = self.state.write().unwrap_or_else(PoisonError::into_inner);
        state.annotations.retain(|a| a.region_id != *region_id);
    }

    fn add_overlay(&self, circle: CircleOverlay) -> OverlayHandle {
        let handle = OverlayHandle::new();
        let mut state = self.state.write().unwrap_or_else(PoisonError::into_inner);
        state.overlays.push(PlacedOverlay { handle, circle });
        handle
    }

    fn remove_overlay(&self, handle: OverlayHandle) -> bool {
        let mut state = self.state.write().unwrap_or_else(PoisonError::into_inner);
        let before = state.overlays.len();
        state.overlays.retain(|o| o.handle != handle);
        state.overlays.len() != before
    }

    fn overlays(&self) -> Vec<PlacedOverlay> {
        self.state.read().unwrap_or_else(PoisonError::into_inner).overlays.clone()
    }

    fn center_coordinate(&self) -> Coordinate {
        self.state.read().unwrap_or_else(PoisonError::into_inner).center
    }

    fn set_region(&self, center: Coordinate, span_meters: f64) {
        let mut state = self.state.write().unwrap_or_else(PoisonError::into_inner);
        state.center = center;
        state.span_meters = Some(span_meters);
    }
}
