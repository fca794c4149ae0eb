//! Authorization gate.
//!
//! Turns authorization changes and foreground/background transitions into
//! location-tracking requests. Standard updates run while authorized in the
//! foreground; in the background they are swapped for significant-change
//! monitoring when the service offers it.

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::service::{AppPhase, AuthState, LocationService};
use crate::surface::{Advisory, AdvisoryDisplay};

/// Which location feed is running.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
#[allow(missing_docs)]
pub enum TrackingMode {
    Idle,
    Standard,
    SignificantChange,
}

/// Authorization-driven tracking state.
#[derive(Debug)]
pub struct AuthorizationGate {
    status: Option<AuthState>,
    requested_always: bool,
    mode: TrackingMode,
    phase: AppPhase,
}

impl Default for AuthorizationGate {
    fn default() -> Self {
        Self::new()
    }
}

impl AuthorizationGate {
    /// Idle, foreground, nothing requested yet.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            status: None,
            requested_always: false,
            mode: TrackingMode::Idle,
            phase: AppPhase::Foreground,
        }
    }

    /// Last seen authorization, if any.
    #[must_use]
    pub const fn status(&self) -> Option<AuthState> {
        self.status
    }

    /// Location feed currently running.
    #[must_use]
    pub const fn mode(&self) -> TrackingMode {
        self.mode
    }

    /// Last seen app phase.
    #[must_use]
    pub const fn phase(&self) -> AppPhase {
        self.phase
    }

    /// Whether the last seen status grants location access.
    #[must_use]
    pub fn is_authorized(&self) -> bool {
        self.status.is_some_and(|s| s.is_authorized())
    }

    /// Evaluates the service's current status once, at startup.
    pub fn bootstrap(&mut self, service: &dyn LocationService, advisory: &dyn AdvisoryDisplay) {
        let status = service.authorization_status();
        self.on_authorization_changed(status, service, advisory);
    }

    /// Reacts to a new authorization status.
    pub fn on_authorization_changed(
        &mut self,
        status: AuthState,
        service: &dyn LocationService,
        advisory: &dyn AdvisoryDisplay,
    ) {
        info!(?status, "authorization changed");
        self.status = Some(status);

        match status {
            AuthState::NotDetermined => {
                if !self.requested_always {
                    self.requested_always = true;
                    service.request_always_authorization();
                }
            }
            AuthState::Denied => {
                self.stop_tracking(service);
                warn!("location access denied; tracking disabled");
                advisory.show_advisory(Advisory::LocationAccessDenied);
            }
            AuthState::AuthorizedWhenInUse | AuthState::AuthorizedAlways => {
                if self.mode == TrackingMode::Idle {
                    self.start_tracking(service);
                }
            }
        }
    }

    /// Swaps tracking feeds on a foreground/background transition.
    pub fn on_app_phase_changed(&mut self, phase: AppPhase, service: &dyn LocationService) {
        self.phase = phase;
        match (phase, self.mode) {
            (AppPhase::Background, TrackingMode::Standard) => {
                if service.is_significant_change_available() {
                    service.stop_updating_location();
                    service.start_significant_change_monitoring();
                    self.mode = TrackingMode::SignificantChange;
                    debug!("switched to significant-change monitoring");
                } else {
                    info!("significant-change monitoring unavailable; keeping standard updates");
                }
            }
            (AppPhase::Foreground, TrackingMode::SignificantChange) => {
                service.stop_significant_change_monitoring();
                service.start_updating_location();
                self.mode = TrackingMode::Standard;
                debug!("switched to standard location updates");
            }
            _ => {}
        }
    }

    fn start_tracking(&mut self, service: &dyn LocationService) {
        if self.phase == AppPhase::Background && service.is_significant_change_available() {
            service.start_significant_change_monitoring();
            self.mode = TrackingMode::SignificantChange;
        } else {
            service.start_updating_location();
            self.mode = TrackingMode::Standard;
        }
        debug!(mode = ?self.mode, "tracking started");
    }

    fn stop_tracking(&mut self, service: &dyn LocationService) {
        match self.mode {
            TrackingMode::Idle => {}
            TrackingMode::Standard => service.stop_updating_location(),
            TrackingMode::SignificantChange => service.stop_significant_change_monitoring(),
        }
        self.mode = TrackingMode::Idle;
    }
}
