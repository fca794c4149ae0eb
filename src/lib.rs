//! # regionwatch - geofence lifecycle and overlay synchronization
//!
//! regionwatch keeps a set of circular regions, their map overlays and a log
//! of monitoring events in lock-step with an external location-monitoring
//! service.
//!
//! ## Core Concepts
//!
//! - **Region**: a circular geofence whose id is derived from its center
//! - **Annotation**: the map pin projecting a region, with one radius overlay
//! - **MonitoringLifecycle**: one start/stop request per add, move or removal
//! - **EventLog**: newest-first log of enter/exit/failure events feeding a badge
//! - **GeofenceRuntime**: a worker thread that serializes commands and events
//!
//! ## Usage
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use regionwatch::{Collaborators, GeofenceConfig, GeofenceEngine, GeofenceRuntime, RuntimeConfig};
//!
//! let mut engine = GeofenceEngine::new(
//!     GeofenceConfig::default(),
//!     Collaborators { service, map, badge, advisory },
//! );
//! // Authorization check and adoption of regions monitored by a previous run.
//! engine.start();
//! let runtime = GeofenceRuntime::start(engine, &RuntimeConfig::default())?;
//!
//! // Hand this to the platform's location callbacks.
//! let events = runtime.event_sender();
//!
//! let region = runtime.add_region_at_map_center()?;
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

// Data model
pub mod coordinate;
pub mod error;
pub mod events;
pub mod region;
pub mod store;

// Collaborator seams
pub mod service;
pub mod surface;

// Synchronization and lifecycle
pub mod auth;
pub mod config;
pub mod engine;
pub mod lifecycle;
pub mod runtime;
pub mod sync;

pub use auth::{AuthorizationGate, TrackingMode};
pub use config::{GeofenceConfig, RuntimeConfig};
pub use coordinate::{Coordinate, RegionId};
pub use engine::{Collaborators, EventOutcome, GeofenceEngine};
pub use error::{
    ConfigError, GeofenceError, GeofenceResult, LifecycleError, RuntimeError, ServiceError, StoreError,
};
pub use events::{BadgeCounter, EventKind, EventLog, EventRecord};
pub use lifecycle::{DragOutcome, MonitoringLifecycle};
pub use region::{Annotation, PropertyChange, Region, RegionKind, ANNOTATION_TITLE, DEFAULT_RADIUS_METERS};
pub use runtime::{EventSender, GeofenceRuntime};
pub use service::{AppPhase, AuthState, DragState, LocationEvent, LocationService};
pub use store::{MonitoringState, RegionEntry, RegionStore};
pub use surface::{
    Advisory, AdvisoryDisplay, BadgeDisplay, CircleOverlay, InMemoryMapSurface, MapSurface, OverlayHandle,
    PlacedOverlay,
};
pub use sync::{AnnotationSync, OverlayOutcome};
