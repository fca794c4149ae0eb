//! Recording fakes shared by the end-to-end tests.

#![allow(dead_code)]

use std::sync::{Arc, Mutex};

use tracing_subscriber::EnvFilter;

use regionwatch::{
    Advisory, AdvisoryDisplay, AuthState, BadgeDisplay, Collaborators, Coordinate, GeofenceConfig,
    GeofenceEngine, InMemoryMapSurface, LocationService, Region, RegionKind, ServiceError,
};

#[derive(Debug, Clone, PartialEq)]
pub enum Call {
    Start(String),
    Stop(String),
    RequestAlways,
    StartUpdates,
    StopUpdates,
    StartSignificant,
    StopSignificant,
}

pub struct FakeLocationService {
    pub auth: Mutex<AuthState>,
    pub available: Mutex<bool>,
    pub significant: bool,
    pub fail_transport: Mutex<bool>,
    pub monitored: Mutex<Vec<Region>>,
    calls: Mutex<Vec<Call>>,
}

impl Default for FakeLocationService {
    fn default() -> Self {
        Self {
            auth: Mutex::new(AuthState::AuthorizedAlways),
            available: Mutex::new(true),
            significant: true,
            fail_transport: Mutex::new(false),
            monitored: Mutex::new(Vec::new()),
            calls: Mutex::new(Vec::new()),
        }
    }
}

impl FakeLocationService {
    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    pub fn monitoring_calls(&self) -> Vec<Call> {
        self.calls()
            .into_iter()
            .filter(|c| matches!(c, Call::Start(_) | Call::Stop(_)))
            .collect()
    }

    fn record(&self, call: Call) {
        self.calls.lock().unwrap().push(call);
    }

    fn transport(&self) -> Result<(), ServiceError> {
        if *self.fail_transport.lock().unwrap() {
            Err(ServiceError::location_service("transport down"))
        } else {
            Ok(())
        }
    }
}

impl LocationService for FakeLocationService {
    fn authorization_status(&self) -> AuthState {
        *self.auth.lock().unwrap()
    }

    fn request_always_authorization(&self) {
        self.record(Call::RequestAlways);
    }

    fn start_monitoring(&self, region: &Region) -> Result<(), ServiceError> {
        self.record(Call::Start(region.id.to_string()));
        self.transport()?;
        self.monitored.lock().unwrap().push(region.clone());
        Ok(())
    }

    fn stop_monitoring(&self, region: &Region) -> Result<(), ServiceError> {
        self.record(Call::Stop(region.id.to_string()));
        self.transport()?;
        self.monitored.lock().unwrap().retain(|r| r.id != region.id);
        Ok(())
    }

    fn is_monitoring_available(&self, _kind: RegionKind) -> bool {
        *self.available.lock().unwrap()
    }

    fn start_updating_location(&self) {
        self.record(Call::StartUpdates);
    }

    fn stop_updating_location(&self) {
        self.record(Call::StopUpdates);
    }

    fn is_significant_change_available(&self) -> bool {
        self.significant
    }

    fn start_significant_change_monitoring(&self) {
        self.record(Call::StartSignificant);
    }

    fn stop_significant_change_monitoring(&self) {
        self.record(Call::StopSignificant);
    }

    fn monitored_regions(&self) -> Vec<Region> {
        self.monitored.lock().unwrap().clone()
    }
}

#[derive(Default)]
pub struct RecordingDisplay {
    pub badges: Mutex<Vec<u64>>,
    pub advisories: Mutex<Vec<Advisory>>,
}

impl RecordingDisplay {
    pub fn last_badge(&self) -> Option<u64> {
        self.badges.lock().unwrap().last().copied()
    }
}

impl BadgeDisplay for RecordingDisplay {
    fn set_badge_count(&self, count: u64) {
        self.badges.lock().unwrap().push(count);
    }
}

impl AdvisoryDisplay for RecordingDisplay {
    fn show_advisory(&self, advisory: Advisory) {
        self.advisories.lock().unwrap().push(advisory);
    }
}

pub struct Fixture {
    pub service: Arc<FakeLocationService>,
    pub map: Arc<InMemoryMapSurface>,
    pub display: Arc<RecordingDisplay>,
}

/// Routes engine diagnostics to the test output; `RUST_LOG=regionwatch=debug`.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

impl Fixture {
    pub fn new(service: FakeLocationService) -> Self {
        init_tracing();
        Self {
            service: Arc::new(service),
            map: Arc::new(InMemoryMapSurface::new(Coordinate::new(37.0, -122.0))),
            display: Arc::new(RecordingDisplay::default()),
        }
    }

    pub fn collaborators(&self) -> Collaborators {
        Collaborators {
            service: self.service.clone(),
            map: self.map.clone(),
            badge: self.display.clone(),
            advisory: self.display.clone(),
        }
    }

    pub fn engine(&self) -> GeofenceEngine {
        GeofenceEngine::new(GeofenceConfig::default(), self.collaborators())
    }
}
