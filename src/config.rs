//! Engine and runtime configuration.
//!
//! Both structs have working defaults, can be loaded from JSON (missing fields
//! fall back to the defaults) and are validated before use.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::region::DEFAULT_RADIUS_METERS;

/// Span used when zooming to the first location fix.
pub const DEFAULT_ZOOM_SPAN_METERS: f64 = 1500.0;

/// Engine behavior.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GeofenceConfig {
    /// Radius for regions added at the map center.
    pub default_radius_meters: f64,
    /// Map span applied when the first location fix arrives.
    pub initial_zoom_span_meters: f64,
}

impl Default for GeofenceConfig {
    fn default() -> Self {
        Self {
            default_radius_meters: DEFAULT_RADIUS_METERS,
            initial_zoom_span_meters: DEFAULT_ZOOM_SPAN_METERS,
        }
    }
}

impl GeofenceConfig {
    /// Parses and validates a JSON document.
    ///
    /// # Errors
    ///
    /// `Parse` for malformed JSON, `InvalidValue` for out-of-range values.
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let cfg: Self = parse_json(json)?;
        cfg.validate()?;
        Ok(cfg)
    }

    /// # Errors
    ///
    /// `InvalidValue` when a distance is not finite and positive.
    pub fn validate(&self) -> Result<(), ConfigError> {
        positive("default_radius_meters", self.default_radius_meters)?;
        positive("initial_zoom_span_meters", self.initial_zoom_span_meters)
    }
}

/// Worker queue sizing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RuntimeConfig {
    /// Max queued commands before callers block.
    pub command_queue_capacity: usize,
    /// Max queued service events before new ones are dropped.
    pub event_queue_capacity: usize,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            command_queue_capacity: 1024,
            event_queue_capacity: 4096,
        }
    }
}

impl RuntimeConfig {
    /// Parses and validates a JSON document.
    ///
    /// # Errors
    ///
    /// `Parse` for malformed JSON, `InvalidValue` for zero capacities.
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let cfg: Self = parse_json(json)?;
        cfg.validate()?;
        Ok(cfg)
    }

    /// # Errors
    ///
    /// `InvalidValue` when a capacity is zero.
    pub fn validate(&self) -> Result<(), ConfigError> {
        non_zero("command_queue_capacity", self.command_queue_capacity)?;
        non_zero("event_queue_capacity", self.event_queue_capacity)
    }
}

fn parse_json<T: DeserializeOwned>(json: &str) -> Result<T, ConfigError> {
    serde_json::from_str(json).map_err(|e| ConfigError::Parse {
        message: e.to_string(),
    })
}

fn positive(field: &'static str, value: f64) -> Result<(), ConfigError> {
    if value.is_finite() && value > 0.0 {
        Ok(())
    } else {
        Err(ConfigError::InvalidValue {
            field,
            reason: format!("must be finite and positive, got {value}"),
        })
    }
}

fn non_zero(field: &'static str, value: usize) -> Result<(), ConfigError> {
    if value == 0 {
        Err(ConfigError::InvalidValue {
            field,
            reason: "must be at least 1".to_string(),
        })
    } else {
        Ok(())
    }
}
