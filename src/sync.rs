//! Overlay synchronization between the region store and the map surface.
//!
//! Each region owns at most one radius circle. Drawn overlays are tracked in a
//! registry keyed by region id. Removal additionally scans the map for circles
//! centered exactly on the annotation coordinate, which also clears leftovers
//! from earlier annotation instances at the same spot.
//!
//! Known risk: two regions whose centers compare equal share overlays in the
//! scan, so removing one also removes the other's circle while that region's
//! `overlay_drawn` flag stays set.

use std::collections::HashMap;

use tracing::debug;

use crate::coordinate::RegionId;
use crate::store::RegionEntry;
use crate::surface::{CircleOverlay, MapSurface, OverlayHandle};

/// Result of [`AnnotationSync::update_overlay`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OverlayOutcome {
    /// A new circle was drawn.
    Drawn(OverlayHandle),
    /// The flag was already set; nothing was sent to the map.
    AlreadyDrawn,
}

/// Reconciles region entries into overlay directives.
#[derive(Debug, Default)]
pub struct AnnotationSync {
    registry: HashMap<RegionId, OverlayHandle>,
}

impl AnnotationSync {
    /// Creates a sync with an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Draws the radius circle for `entry` unless it is already drawn.
    ///
    /// Idempotent: repeated calls while `overlay_drawn` is set are no-ops.
    pub(crate) fn update_overlay(&mut self, map: &dyn MapSurface, entry: &mut RegionEntry) -> OverlayOutcome {
        if entry.overlay_drawn {
            return OverlayOutcome::AlreadyDrawn;
        }

        let stale = self.remove_overlay(map, entry);
        if stale > 0 {
            debug!(region_id = %entry.region.id, stale, "cleared stale overlays before redraw");
        }

        let handle = map.add_overlay(CircleOverlay {
            center: entry.annotation.coordinate,
            radius: entry.annotation.radius(),
        });
        self.registry.insert(entry.region.id.clone(), handle);
        entry.overlay_drawn = true;
        debug!(region_id = %entry.region.id, %handle, "overlay drawn");
        OverlayOutcome::Drawn(handle)
    }

    /// Removes every overlay belonging to `entry` and clears its flag.
    ///
    /// Returns how many overlays left the map; zero matches is not an error.
    pub(crate) fn remove_overlay(&mut self, map: &dyn MapSurface, entry: &mut RegionEntry) -> usize {
        let mut handles: Vec<OverlayHandle> = Vec::new();
        if let Some(handle) = self.registry.remove(&entry.region.id) {
            handles.push(handle);
        }

        let coordinate = entry.annotation.coordinate;
        for placed in map.overlays() {
            if placed.circle.center == coordinate && !handles.contains(&placed.handle) {
                handles.push(placed.handle);
            }
        }

        let removed = handles.iter().filter(|h| map.remove_overlay(**h)).count();
        if !handles.is_empty() {
            self.registry.retain(|_, h| !handles.contains(h));
        }

        entry.overlay_drawn = false;
        if removed > 0 {
            debug!(region_id = %entry.region.id, removed, "overlays removed");
        }
        removed
    }

    /// Drops the registry entry for a region that no longer exists.
    pub(crate) fn forget(&mut self, region_id: &RegionId) {
        self.registry.remove(region_id);
    }

    /// Handle of the overlay drawn for `region_id`, if any.
    #[must_use]
    pub fn handle_for(&self, region_id: &RegionId) -> Option<OverlayHandle> {
        self.registry.get(region_id).copied()
    }

    /// Number of regions with a registered overlay.
    #[must_use]
    pub fn tracked(&self) -> usize {
        self.registry.len()
    }
}
