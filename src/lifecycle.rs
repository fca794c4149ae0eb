//! Monitoring lifecycle.
//!
//! Pairs every store mutation with exactly one start or stop request to the
//! location service and keeps the map in step through [`AnnotationSync`].
//!
//! Per region: `Unmonitored -> Monitoring` on add, `Monitoring -> Relocating`
//! when a drag starts, `Relocating -> Monitoring` (under the new id) when the
//! drag completes, and `Relocating -> Unmonitored` when it is abandoned. An
//! abandoned region is not resumed.
//!
//! Transport failures of start/stop requests are logged as `MonitoringFailed`
//! events; the store mutation that preceded them stands.

use std::sync::Arc;

use tracing::{debug, info, warn};

use crate::coordinate::{Coordinate, RegionId};
use crate::error::{GeofenceResult, LifecycleError, ServiceError, StoreError};
use crate::events::{EventKind, EventLog};
use crate::region::{PropertyChange, Region, RegionKind};
use crate::service::{DragState, LocationService};
use crate::store::{MonitoringState, RegionStore};
use crate::surface::MapSurface;
use crate::sync::AnnotationSync;

/// What a drag state change did.
#[derive(Debug, Clone, PartialEq)]
pub enum DragOutcome {
    /// Monitoring of the old position stopped; relocation in progress.
    Started,
    /// The region was replaced by one at the drop position.
    Relocated(Region),
    /// The drag ended without a drop; the region stays stopped.
    Abandoned,
    /// Transition with no lifecycle effect.
    Ignored,
}

/// Drives region creation, relocation and removal.
pub struct MonitoringLifecycle {
    store: RegionStore,
    sync: AnnotationSync,
    service: Arc<dyn LocationService>,
    map: Arc<dyn MapSurface>,
}

impl MonitoringLifecycle {
    /// Creates a lifecycle over an empty store.
    pub fn new(service: Arc<dyn LocationService>, map: Arc<dyn MapSurface>) -> Self {
        Self {
            store: RegionStore::new(),
            sync: AnnotationSync::new(),
            service,
            map,
        }
    }

    /// Regions and their per-region state.
    #[must_use]
    pub const fn store(&self) -> &RegionStore {
        &self.store
    }

    /// Overlay registry.
    #[must_use]
    pub const fn sync(&self) -> &AnnotationSync {
        &self.sync
    }

    /// Adds and starts monitoring a region.
    ///
    /// # Errors
    ///
    /// `MonitoringUnavailable` (checked first, nothing mutated), or the store's
    /// `DuplicateRegion` / validation errors (nothing mutated either).
    pub fn start_add(&mut self, center: Coordinate, radius: f64, log: &mut EventLog) -> GeofenceResult<Region> {
        if !self.service.is_monitoring_available(RegionKind::Circular) {
            warn!("region monitoring is not available");
            return Err(LifecycleError::MonitoringUnavailable {
                kind: RegionKind::Circular,
            }
            .into());
        }

        let region = self.store.add(center, radius)?;
        let entry = self.store.entry_mut(&region.id)?;
        self.map.add_annotation(&entry.annotation);

        if let Err(err) = self.service.start_monitoring(&region) {
            report_failure(log, &region.id, &err);
        }

        self.sync.update_overlay(&*self.map, entry);
        entry.state = MonitoringState::Monitoring;
        info!(region_id = %region.id, radius = region.radius, "region added");
        Ok(region)
    }

    /// Drag started: hide the overlay and stop monitoring the old position.
    ///
    /// # Errors
    ///
    /// `NotFound`, or `InvalidTransition` if a relocation is already running.
    pub fn begin_relocate(&mut self, id: &RegionId, log: &mut EventLog) -> GeofenceResult<()> {
        let entry = self.store.entry_mut(id)?;
        let previous = entry.state;
        if previous == MonitoringState::Relocating {
            return Err(LifecycleError::InvalidTransition {
                id: id.clone(),
                from: previous,
                operation: "begin relocation of",
            }
            .into());
        }

        self.sync.remove_overlay(&*self.map, entry);
        // An abandoned region was already stopped; one stop per start.
        if previous == MonitoringState::Monitoring {
            if let Err(err) = self.service.stop_monitoring(&entry.region) {
                report_failure(log, id, &err);
            }
        }
        entry.state = MonitoringState::Relocating;
        debug!(region_id = %id, ?previous, "relocation started");
        Ok(())
    }

    /// Drag completed at `new_center`: replace the region and monitor it.
    ///
    /// # Errors
    ///
    /// `NotFound`, `InvalidTransition` unless relocating, or `DuplicateRegion`
    /// if another region already sits at the new id. The region keeps
    /// relocating on error.
    pub fn end_relocate(
        &mut self,
        id: &RegionId,
        new_center: Coordinate,
        log: &mut EventLog,
    ) -> GeofenceResult<Region> {
        let state = self
            .store
            .get(id)
            .map(|e| e.state)
            .ok_or_else(|| StoreError::NotFound { id: id.clone() })?;
        if state != MonitoringState::Relocating {
            return Err(LifecycleError::InvalidTransition {
                id: id.clone(),
                from: state,
                operation: "end relocation of",
            }
            .into());
        }

        let region = self.store.relocate(id, new_center)?;
        self.sync.forget(id);
        self.map.remove_annotation(id);

        let entry = self.store.entry_mut(&region.id)?;
        self.map.add_annotation(&entry.annotation);

        if let Err(err) = self.service.start_monitoring(&region) {
            report_failure(log, &region.id, &err);
        }

        self.sync.update_overlay(&*self.map, entry);
        entry.state = MonitoringState::Monitoring;
        info!(old_id = %id, region_id = %region.id, "region relocated");
        Ok(region)
    }

    /// Drag ended without a drop. The region stays in the store, stopped.
    ///
    /// # Errors
    ///
    /// `NotFound`, or `InvalidTransition` unless relocating.
    pub fn abandon_relocate(&mut self, id: &RegionId) -> GeofenceResult<()> {
        let entry = self.store.entry_mut(id)?;
        if entry.state != MonitoringState::Relocating {
            return Err(LifecycleError::InvalidTransition {
                id: id.clone(),
                from: entry.state,
                operation: "abandon relocation of",
            }
            .into());
        }
        entry.state = MonitoringState::Unmonitored;
        warn!(region_id = %id, "relocation abandoned; region left unmonitored");
        Ok(())
    }

    /// Maps a map-surface drag transition onto the lifecycle.
    ///
    /// `new == Starting` begins a relocation; `Dragging -> Ending` completes
    /// it at `coordinate`. Any other terminal state while relocating abandons
    /// it. Transitions for ids no longer in the store are ignored unless a new
    /// drag starts on them.
    ///
    /// # Errors
    ///
    /// As for [`begin_relocate`](Self::begin_relocate) and
    /// [`end_relocate`](Self::end_relocate).
    pub fn drag_state_changed(
        &mut self,
        id: &RegionId,
        old: DragState,
        new: DragState,
        coordinate: Coordinate,
        log: &mut EventLog,
    ) -> GeofenceResult<DragOutcome> {
        if new == DragState::Starting {
            self.begin_relocate(id, log)?;
            return Ok(DragOutcome::Started);
        }

        let Some(state) = self.store.get(id).map(|e| e.state) else {
            debug!(region_id = %id, ?old, ?new, "drag state for unknown region ignored");
            return Ok(DragOutcome::Ignored);
        };
        if state != MonitoringState::Relocating {
            return Ok(DragOutcome::Ignored);
        }

        match (old, new) {
            (DragState::Dragging, DragState::Ending) => {
                self.end_relocate(id, coordinate, log).map(DragOutcome::Relocated)
            }
            (_, DragState::Ending | DragState::Canceling | DragState::None) => {
                self.abandon_relocate(id)?;
                Ok(DragOutcome::Abandoned)
            }
            _ => Ok(DragOutcome::Ignored),
        }
    }

    /// Changes a region's radius, keeping the annotation subtitle, the overlay
    /// and the service in step. A drawn overlay is redrawn at the new size; a
    /// monitored region is re-submitted under the same id, which replaces the
    /// service's copy.
    ///
    /// # Errors
    ///
    /// `InvalidRadius` or `NotFound` before any side effect.
    pub fn set_radius(
        &mut self,
        id: &RegionId,
        radius: f64,
        log: &mut EventLog,
    ) -> GeofenceResult<Option<PropertyChange>> {
        let change = self.store.set_radius(id, radius)?;
        if change.is_none() {
            return Ok(None);
        }

        let entry = self.store.entry_mut(id)?;
        self.map.add_annotation(&entry.annotation);
        if entry.overlay_drawn {
            self.sync.remove_overlay(&*self.map, entry);
            self.sync.update_overlay(&*self.map, entry);
        }
        if entry.state == MonitoringState::Monitoring {
            if let Err(err) = self.service.start_monitoring(&entry.region) {
                report_failure(log, id, &err);
            }
        }
        info!(region_id = %id, radius, "region radius changed");
        Ok(change)
    }

    /// Stops monitoring and removes a region with its overlay and pin.
    ///
    /// # Errors
    ///
    /// `NotFound` before any side effect.
    pub fn remove(&mut self, id: &RegionId, log: &mut EventLog) -> GeofenceResult<Region> {
        let entry = self.store.entry_mut(id)?;
        if entry.state == MonitoringState::Monitoring {
            if let Err(err) = self.service.stop_monitoring(&entry.region) {
                report_failure(log, id, &err);
            }
        }
        self.sync.remove_overlay(&*self.map, entry);
        self.map.remove_annotation(id);

        let removed = self.store.remove(id)?;
        self.sync.forget(id);
        info!(region_id = %id, "region removed");
        Ok(removed.region)
    }

    /// Adopts circular regions the service already monitors, without issuing
    /// new start requests. Returns how many were adopted.
    pub fn rehydrate(&mut self) -> usize {
        let mut adopted = 0;
        for region in self.service.monitored_regions() {
            if region.kind() != RegionKind::Circular || self.store.contains(&region.id) {
                continue;
            }
            let id = region.id.clone();
            if let Err(err) = self.store.insert(region) {
                warn!(region_id = %id, error = %err, "skipping monitored region");
                continue;
            }
            let Some(entry) = self.store.get_mut(&id) else {
                continue;
            };
            self.map.add_annotation(&entry.annotation);
            self.sync.update_overlay(&*self.map, entry);
            entry.state = MonitoringState::Monitoring;
            adopted += 1;
        }
        if adopted > 0 {
            info!(adopted, "rehydrated monitored regions");
        }
        adopted
    }
}

fn report_failure(log: &mut EventLog, id: &RegionId, err: &ServiceError) {
    warn!(region_id = %id, error = %err, "monitoring request failed");
    log.append(EventKind::MonitoringFailed, id.clone(), Some(err.to_string()));
}
