//! Geofence engine.
//!
//! The single-threaded owner of the region lifecycle, event log and
//! authorization gate. Every mutation goes through `&mut self`; callers that
//! need cross-thread access wrap the engine in a
//! [`GeofenceRuntime`](crate::runtime::GeofenceRuntime).

use std::sync::Arc;

use tracing::{debug, info, warn};

use crate::auth::AuthorizationGate;
use crate::config::GeofenceConfig;
use crate::coordinate::{Coordinate, RegionId};
use crate::error::{GeofenceResult, ServiceError};
use crate::events::{EventKind, EventLog, EventRecord};
use crate::lifecycle::{DragOutcome, MonitoringLifecycle};
use crate::region::{PropertyChange, Region};
use crate::service::{AppPhase, LocationEvent, LocationService};
use crate::store::RegionStore;
use crate::surface::{AdvisoryDisplay, BadgeDisplay, MapSurface};

/// External collaborators the engine talks to.
#[allow(missing_docs)]
#[derive(Clone)]
pub struct Collaborators {
    pub service: Arc<dyn LocationService>,
    pub map: Arc<dyn MapSurface>,
    pub badge: Arc<dyn BadgeDisplay>,
    pub advisory: Arc<dyn AdvisoryDisplay>,
}

/// Outcome of handling one inbound event.
#[derive(Debug, Clone, PartialEq)]
pub enum EventOutcome {
    /// A record was appended to the event log.
    Logged(EventRecord),
    /// A drag transition was applied.
    Drag(DragOutcome),
    /// The map zoomed to the first location fix.
    Zoomed(Coordinate),
    /// Handled without a visible effect (tracking swaps, diagnostics).
    Handled,
}

/// Region lifecycle and overlay synchronization engine.
pub struct GeofenceEngine {
    config: GeofenceConfig,
    lifecycle: MonitoringLifecycle,
    log: EventLog,
    gate: AuthorizationGate,
    collaborators: Collaborators,
    published_badge: Option<u64>,
}

impl GeofenceEngine {
    /// Creates an engine. Nothing is sent to the collaborators until
    /// [`start`](Self::start) or the first operation.
    pub fn new(config: GeofenceConfig, collaborators: Collaborators) -> Self {
        let lifecycle = MonitoringLifecycle::new(
            Arc::clone(&collaborators.service),
            Arc::clone(&collaborators.map),
        );
        Self {
            config,
            lifecycle,
            log: EventLog::new(),
            gate: AuthorizationGate::new(),
            collaborators,
            published_badge: None,
        }
    }

    /// Checks authorization once and adopts regions the service already
    /// monitors. Returns how many regions were adopted.
    pub fn start(&mut self) -> usize {
        self.gate.bootstrap(
            &*self.collaborators.service,
            &*self.collaborators.advisory,
        );
        let adopted = self.lifecycle.rehydrate();
        self.publish_badge();
        adopted
    }

    /// Adopts regions the service already monitors.
    pub fn rehydrate(&mut self) -> usize {
        self.lifecycle.rehydrate()
    }

    /// Adds a region of the configured default radius at the map center.
    ///
    /// # Errors
    ///
    /// See [`MonitoringLifecycle::start_add`].
    pub fn add_region_at_map_center(&mut self) -> GeofenceResult<Region> {
        let center = self.collaborators.map.center_coordinate();
        let radius = self.config.default_radius_meters;
        self.add_region(center, radius)
    }

    /// Adds a region at an explicit center and radius.
    ///
    /// # Errors
    ///
    /// See [`MonitoringLifecycle::start_add`].
    pub fn add_region(&mut self, center: Coordinate, radius: f64) -> GeofenceResult<Region> {
        let result = self.lifecycle.start_add(center, radius, &mut self.log);
        self.publish_badge();
        result
    }

    /// Changes a region's radius in place; the id is unchanged.
    ///
    /// # Errors
    ///
    /// See [`MonitoringLifecycle::set_radius`].
    pub fn set_region_radius(&mut self, id: &RegionId, radius: f64) -> GeofenceResult<Option<PropertyChange>> {
        let result = self.lifecycle.set_radius(id, radius, &mut self.log);
        self.publish_badge();
        result
    }

    /// Removes a region.
    ///
    /// # Errors
    ///
    /// `NotFound` if the id is unknown.
    pub fn remove_region(&mut self, id: &RegionId) -> GeofenceResult<Region> {
        let result = self.lifecycle.remove(id, &mut self.log);
        self.publish_badge();
        result
    }

    /// Applies one inbound event.
    ///
    /// Region events are logged whether or not the id is in the store, and
    /// never change the store.
    ///
    /// # Errors
    ///
    /// Only drag transitions can fail (see
    /// [`MonitoringLifecycle::drag_state_changed`]).
    pub fn handle_event(&mut self, event: LocationEvent) -> GeofenceResult<EventOutcome> {
        let outcome = match event {
            LocationEvent::Entered { region_id } => {
                self.record_region_event(EventKind::Entered, region_id, None)
            }
            LocationEvent::Exited { region_id } => {
                self.record_region_event(EventKind::Exited, region_id, None)
            }
            LocationEvent::Failed { region_id, error } => {
                let region_id = region_id.unwrap_or_else(RegionId::unknown);
                let detail = ServiceError::monitoring_failed(error).to_string();
                self.record_region_event(EventKind::MonitoringFailed, region_id, Some(detail))
            }
            LocationEvent::AuthChanged { status } => {
                self.gate.on_authorization_changed(
                    status,
                    &*self.collaborators.service,
                    &*self.collaborators.advisory,
                );
                EventOutcome::Handled
            }
            LocationEvent::LocationUpdated { locations } => self.location_updated(&locations),
            LocationEvent::DragStateChanged {
                region_id,
                old,
                new,
                coordinate,
            } => {
                let result = self
                    .lifecycle
                    .drag_state_changed(&region_id, old, new, coordinate, &mut self.log);
                self.publish_badge();
                EventOutcome::Drag(result?)
            }
            LocationEvent::AppPhaseChanged { phase } => {
                if phase == AppPhase::Foreground {
                    self.log.reset_counter();
                    self.publish_badge();
                }
                self.gate.on_app_phase_changed(phase, &*self.collaborators.service);
                EventOutcome::Handled
            }
            LocationEvent::ServiceError { message } => {
                let err = ServiceError::location_service(message);
                warn!(error = %err, "location service reported an error");
                EventOutcome::Handled
            }
        };
        Ok(outcome)
    }

    /// The event list became visible: zero the counter and return the records.
    pub fn show_event_log(&mut self) -> Vec<EventRecord> {
        self.log.reset_counter();
        self.publish_badge();
        self.log.snapshot()
    }

    /// Regions in insertion order.
    #[must_use]
    pub fn regions(&self) -> Vec<Region> {
        self.lifecycle.store().list()
    }

    /// Read access to the region store.
    #[must_use]
    pub const fn store(&self) -> &RegionStore {
        self.lifecycle.store()
    }

    /// The event log, newest first.
    #[must_use]
    pub const fn event_log(&self) -> &EventLog {
        &self.log
    }

    /// Events since the counter was last reset.
    #[must_use]
    pub const fn counter(&self) -> u64 {
        self.log.counter()
    }

    /// Authorization and tracking state.
    #[must_use]
    pub const fn gate(&self) -> &AuthorizationGate {
        &self.gate
    }

    /// Active configuration.
    #[must_use]
    pub const fn config(&self) -> &GeofenceConfig {
        &self.config
    }

    fn record_region_event(
        &mut self,
        kind: EventKind,
        region_id: RegionId,
        detail: Option<String>,
    ) -> EventOutcome {
        if !self.lifecycle.store().contains(&region_id) {
            debug!(%region_id, %kind, "event for a region not in the store");
        }
        let record = self.log.append(kind, region_id, detail).clone();
        info!(region_id = %record.region_id, kind = %record.kind, sequence = record.sequence, "region event");
        self.publish_badge();
        EventOutcome::Logged(record)
    }

    fn location_updated(&mut self, locations: &[Coordinate]) -> EventOutcome {
        match locations {
            [] => EventOutcome::Handled,
            // No previous fix in the batch: this is the first one, zoom to it.
            [first] => {
                self.collaborators
                    .map
                    .set_region(*first, self.config.initial_zoom_span_meters);
                debug!(location = %first, "zoomed to first location fix");
                EventOutcome::Zoomed(*first)
            }
            [.., previous, latest] => {
                debug!(from = %previous, to = %latest, "location updated");
                EventOutcome::Handled
            }
        }
    }

    fn publish_badge(&mut self) {
        let count = self.log.counter();
        if self.published_badge != Some(count) {
            self.collaborators.badge.set_badge_count(count);
            self.published_badge = Some(count);
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use super::*;
    use crate::error::ServiceError;
    use crate::region::RegionKind;
    use crate::service::{AuthState, DragState};
    use crate::surface::{Advisory, InMemoryMapSurface};

    #[derive(Default)]
    struct Service {
        calls: Mutex<Vec<String>>,
    }

    impl LocationService for Service {
        fn authorization_status(&self) -> AuthState {
            AuthState::AuthorizedAlways
        }
        fn request_always_authorization(&self) {}
        fn start_monitoring(&self, region: &Region) -> Result<(), ServiceError> {
            self.calls.lock().unwrap().push(format!("start {}", region.id));
            Ok(())
        }
        fn stop_monitoring(&self, region: &Region) -> Result<(), ServiceError> {
            self.calls.lock().unwrap().push(format!("stop {}", region.id));
            Ok(())
        }
        fn is_monitoring_available(&self, _kind: RegionKind) -> bool {
            true
        }
        fn start_updating_location(&self) {
            self.calls.lock().unwrap().push("start_updates".to_string());
        }
        fn stop_updating_location(&self) {}
        fn is_significant_change_available(&self) -> bool {
            false
        }
        fn start_significant_change_monitoring(&self) {}
        fn stop_significant_change_monitoring(&self) {}
        fn monitored_regions(&self) -> Vec<Region> {
            Vec::new()
        }
    }

    #[derive(Default)]
    struct Display {
        badges: Mutex<Vec<u64>>,
        advisories: Mutex<Vec<Advisory>>,
    }

    impl BadgeDisplay for Display {
        fn set_badge_count(&self, count: u64) {
            self.badges.lock().unwrap().push(count);
        }
    }

    impl AdvisoryDisplay for Display {
        fn show_advisory(&self, advisory: Advisory) {
            self.advisories.lock().unwrap().push(advisory);
        }
    }

    struct Harness {
        engine: GeofenceEngine,
        service: Arc<Service>,
        map: Arc<InMemoryMapSurface>,
        display: Arc<Display>,
    }

    fn harness() -> Harness {
        let service = Arc::new(Service::default());
        let map = Arc::new(InMemoryMapSurface::new(Coordinate::new(37.0, -122.0)));
        let display = Arc::new(Display::default());
        let engine = GeofenceEngine::new(
            GeofenceConfig::default(),
            Collaborators {
                service: service.clone(),
                map: map.clone(),
                badge: display.clone(),
                advisory: display.clone(),
            },
        );
        Harness {
            engine,
            service,
            map,
            display,
        }
    }

    #[test]
    fn add_at_map_center_uses_default_radius() {
        let mut h = harness();
        let region = h.engine.add_region_at_map_center().unwrap();
        assert_eq!(region.id.as_str(), "37.000000, -122.000000");
        assert_eq!(region.radius, 1000.0);
        assert_eq!(h.map.overlay_count(), 1);
    }

    #[test]
    fn start_bootstraps_tracking() {
        let mut h = harness();
        assert_eq!(h.engine.start(), 0);
        assert_eq!(*h.service.calls.lock().unwrap(), vec!["start_updates"]);
        assert_eq!(*h.display.badges.lock().unwrap(), vec![0]);
    }

    #[test]
    fn region_events_are_logged_and_counted() {
        let mut h = harness();
        let region = h.engine.add_region_at_map_center().unwrap();

        h.engine
            .handle_event(LocationEvent::Entered {
                region_id: region.id.clone(),
            })
            .unwrap();
        h.engine
            .handle_event(LocationEvent::Exited {
                region_id: region.id.clone(),
            })
            .unwrap();

        let snap = h.engine.event_log().snapshot();
        assert_eq!(snap[0].kind, EventKind::Exited);
        assert_eq!(snap[1].kind, EventKind::Entered);
        assert_eq!(h.engine.counter(), 2);
        assert_eq!(h.display.badges.lock().unwrap().last(), Some(&2));
    }

    #[test]
    fn failure_for_unknown_region_is_logged_without_store_change() {
        let mut h = harness();
        let ghost = RegionId::from_raw("1.000000, 1.000000");

        let outcome = h
            .engine
            .handle_event(LocationEvent::Failed {
                region_id: Some(ghost.clone()),
                error: "superseded".to_string(),
            })
            .unwrap();

        let EventOutcome::Logged(record) = outcome else {
            panic!("expected a logged record");
        };
        assert_eq!(record.region_id, ghost);
        assert_eq!(record.kind, EventKind::MonitoringFailed);
        assert!(h.engine.store().is_empty());
    }

    #[test]
    fn failure_without_region_uses_placeholder_id() {
        let mut h = harness();
        h.engine
            .handle_event(LocationEvent::Failed {
                region_id: None,
                error: "boom".to_string(),
            })
            .unwrap();
        let snap = h.engine.event_log().snapshot();
        assert_eq!(snap[0].region_id, RegionId::unknown());
        assert!(snap[0].detail.as_deref().unwrap().contains("boom"));
    }

    #[test]
    fn first_fix_zooms_and_later_batches_do_not() {
        let mut h = harness();
        let fix = Coordinate::new(48.0, 2.0);

        let outcome = h
            .engine
            .handle_event(LocationEvent::LocationUpdated { locations: vec![fix] })
            .unwrap();
        assert_eq!(outcome, EventOutcome::Zoomed(fix));
        assert_eq!(h.map.center_coordinate(), fix);
        assert_eq!(h.map.span_meters(), Some(1500.0));

        let outcome = h
            .engine
            .handle_event(LocationEvent::LocationUpdated {
                locations: vec![fix, Coordinate::new(49.0, 3.0)],
            })
            .unwrap();
        assert_eq!(outcome, EventOutcome::Handled);
        assert_eq!(h.map.center_coordinate(), fix);
    }

    #[test]
    fn foreground_and_log_view_reset_counter() {
        let mut h = harness();
        let id = RegionId::from_raw("a");
        h.engine
            .handle_event(LocationEvent::Entered { region_id: id.clone() })
            .unwrap();
        h.engine
            .handle_event(LocationEvent::AppPhaseChanged {
                phase: AppPhase::Foreground,
            })
            .unwrap();
        assert_eq!(h.engine.counter(), 0);

        h.engine
            .handle_event(LocationEvent::Entered { region_id: id })
            .unwrap();
        let records = h.engine.show_event_log();
        assert_eq!(records.len(), 2);
        assert_eq!(h.engine.counter(), 0);
        assert_eq!(*h.display.badges.lock().unwrap(), vec![1, 0, 1, 0]);
    }

    #[test]
    fn drag_events_relocate_through_engine() {
        let mut h = harness();
        let region = h.engine.add_region(Coordinate::new(10.0, 10.0), 1000.0).unwrap();
        let drop_at = Coordinate::new(20.0, 20.0);

        for (old, new) in [
            (DragState::None, DragState::Starting),
            (DragState::Starting, DragState::Dragging),
            (DragState::Dragging, DragState::Ending),
        ] {
            h.engine
                .handle_event(LocationEvent::DragStateChanged {
                    region_id: region.id.clone(),
                    old,
                    new,
                    coordinate: drop_at,
                })
                .unwrap();
        }

        let ids: Vec<_> = h.engine.regions().into_iter().map(|r| r.id).collect();
        assert_eq!(ids, vec![RegionId::from_raw("20.000000, 20.000000")]);
        assert_eq!(h.map.overlay_count(), 1);
    }

    #[test]
    fn radius_change_updates_pin_and_overlay() {
        let mut h = harness();
        let region = h.engine.add_region_at_map_center().unwrap();

        let change = h.engine.set_region_radius(&region.id, 400.0).unwrap();
        assert!(change.is_some());
        assert_eq!(h.engine.regions()[0].radius, 400.0);
        assert_eq!(h.engine.regions()[0].id, region.id);
        assert_eq!(h.map.overlays()[0].circle.radius, 400.0);
        assert!(h
            .map
            .annotation(&region.id)
            .unwrap()
            .subtitle()
            .ends_with("Rad: 400.0m"));
    }

    #[test]
    fn service_errors_stay_out_of_the_log() {
        let mut h = harness();
        let outcome = h
            .engine
            .handle_event(LocationEvent::ServiceError {
                message: "gps unavailable".to_string(),
            })
            .unwrap();
        assert_eq!(outcome, EventOutcome::Handled);
        assert!(h.engine.event_log().is_empty());
        assert_eq!(h.engine.counter(), 0);
    }

    #[test]
    fn denied_authorization_shows_advisory() {
        let mut h = harness();
        h.engine
            .handle_event(LocationEvent::AuthChanged {
                status: AuthState::Denied,
            })
            .unwrap();
        assert_eq!(
            *h.display.advisories.lock().unwrap(),
            vec![Advisory::LocationAccessDenied]
        );
    }
}
