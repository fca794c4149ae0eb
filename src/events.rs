//! Monitoring event log and badge counter.
//!
//! The log is append-only and newest-first by insertion: each append lands at
//! position 0 regardless of its timestamp. It is never evicted, so a long
//! running session grows it without bound.

use std::collections::VecDeque;
use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::coordinate::RegionId;

/// Kind of a logged monitoring event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
#[allow(missing_docs)]
pub enum EventKind {
    Entered,
    Exited,
    MonitoringFailed,
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Entered => write!(f, "entered"),
            Self::Exited => write!(f, "exited"),
            Self::MonitoringFailed => write!(f, "monitoring_failed"),
        }
    }
}

/// One logged event.
#[allow(missing_docs)]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EventRecord {
    pub event_id: Uuid,
    /// Insertion sequence, starting at 1.
    pub sequence: u64,
    pub timestamp: DateTime<Utc>,
    pub kind: EventKind,
    pub region_id: RegionId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
}

impl EventRecord {
    /// One-line description for the event list.
    #[must_use]
    pub fn describe(&self) -> String {
        let at = self.timestamp.format("%Y-%m-%d %H:%M:%S %z");
        match self.kind {
            EventKind::Entered => format!("didEnterRegion {} at {at}", self.region_id),
            EventKind::Exited => format!("didExitRegion {} at {at}", self.region_id),
            EventKind::MonitoringFailed => format!(
                "monitoringDidFailForRegion {}: {}",
                self.region_id,
                self.detail.as_deref().unwrap_or("unknown error")
            ),
        }
    }
}

/// Notification counter with explicit increment and reset.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct BadgeCounter(u64);

impl BadgeCounter {
    /// A counter at zero.
    #[must_use]
    pub const fn new() -> Self {
        Self(0)
    }

    /// Adds one and returns the new value.
    pub fn increment(&mut self) -> u64 {
        self.0 = self.0.saturating_add(1);
        self.0
    }

    /// Back to zero.
    pub fn reset(&mut self) {
        self.0 = 0;
    }

    /// Current value.
    #[must_use]
    pub const fn value(&self) -> u64 {
        self.0
    }
}

/// Newest-first event log.
#[derive(Debug, Default)]
pub struct EventLog {
    records: VecDeque<EventRecord>,
    counter: BadgeCounter,
    next_sequence: u64,
}

impl EventLog {
    /// An empty log with the counter at zero.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Prepends a record and bumps the counter.
    pub fn append(&mut self, kind: EventKind, region_id: RegionId, detail: Option<String>) -> &EventRecord {
        self.next_sequence += 1;
        let record = EventRecord {
            event_id: Uuid::new_v4(),
            sequence: self.next_sequence,
            timestamp: Utc::now(),
            kind,
            region_id,
            detail,
        };
        self.records.push_front(record);
        self.counter.increment();
        &self.records[0]
    }

    /// Zeroes the counter; records are kept.
    pub fn reset_counter(&mut self) {
        self.counter.reset();
    }

    /// Events appended since the last reset.
    #[must_use]
    pub const fn counter(&self) -> u64 {
        self.counter.value()
    }

    /// Copy of the records, newest first.
    #[must_use]
    pub fn snapshot(&self) -> Vec<EventRecord> {
        self.records.iter().cloned().collect()
    }

    /// Borrowing iterator, newest first.
    pub fn iter(&self) -> impl Iterator<Item = &EventRecord> {
        self.records.iter()
    }

    /// Number of records kept.
    #[must_use]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Whether nothing has been logged.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}
