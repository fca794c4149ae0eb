//! Serialized engine runtime.
//!
//! The location service delivers events on its own threads. This runtime owns
//! one [`GeofenceEngine`] on a dedicated worker thread and funnels both user
//! commands and service events through bounded channels, so every mutation
//! happens on that one thread.
//!
//! Event delivery uses `try_send` and never blocks the delivering thread; if
//! the queue is full the event is dropped, counted and reported as
//! `QueueFull`. Before handling a
//! command the worker drains the event queue, so a command observes every
//! event delivered before it was sent.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};

use crossbeam_channel::{bounded, select, Receiver, Sender, TrySendError};
use tracing::{debug, warn};

use crate::config::RuntimeConfig;
use crate::coordinate::{Coordinate, RegionId};
use crate::engine::GeofenceEngine;
use crate::error::{GeofenceResult, RuntimeError};
use crate::events::EventRecord;
use crate::region::{PropertyChange, Region};
use crate::service::LocationEvent;

enum Command {
    AddRegion {
        placement: Option<(Coordinate, f64)>,
        reply: Sender<GeofenceResult<Region>>,
    },
    RemoveRegion {
        id: RegionId,
        reply: Sender<GeofenceResult<Region>>,
    },
    SetRadius {
        id: RegionId,
        radius: f64,
        reply: Sender<GeofenceResult<Option<PropertyChange>>>,
    },
    ListRegions {
        reply: Sender<Vec<Region>>,
    },
    EventLog {
        mark_seen: bool,
        reply: Sender<Vec<EventRecord>>,
    },
    Counter {
        reply: Sender<u64>,
    },
    Rehydrate {
        reply: Sender<usize>,
    },
    Shutdown,
}

/// Cloneable handle the location service uses to deliver events.
#[derive(Debug, Clone)]
pub struct EventSender {
    tx: Sender<LocationEvent>,
    capacity: usize,
    dropped: Arc<AtomicU64>,
}

impl EventSender {
    /// Non-blocking enqueue. A rejected event is dropped and counted.
    ///
    /// # Errors
    ///
    /// `QueueFull` if the event queue is at capacity, `Disconnected` if the
    /// runtime is gone.
    pub fn deliver(&self, event: LocationEvent) -> Result<(), RuntimeError> {
        match self.tx.try_send(event) {
            Ok(()) => Ok(()),
            Err(TrySendError::Full(event)) => {
                self.dropped.fetch_add(1, Ordering::Relaxed);
                warn!(?event, "event queue full; dropping event");
                Err(RuntimeError::QueueFull {
                    path: "events".to_string(),
                    capacity: self.capacity,
                })
            }
            Err(TrySendError::Disconnected(_)) => {
                self.dropped.fetch_add(1, Ordering::Relaxed);
                Err(RuntimeError::Disconnected {
                    path: "events".to_string(),
                })
            }
        }
    }
}

/// Owns a [`GeofenceEngine`] on a dedicated worker thread.
pub struct GeofenceRuntime {
    command_tx: Sender<Command>,
    events: EventSender,
    join: Option<JoinHandle<()>>,
}

impl GeofenceRuntime {
    /// Moves `engine` onto a new worker thread.
    ///
    /// # Errors
    ///
    /// `InvalidValue` for a zero queue capacity, `Spawn` if the thread cannot
    /// be created.
    pub fn start(engine: GeofenceEngine, config: &RuntimeConfig) -> GeofenceResult<Self> {
        config.validate()?;

        let (command_tx, command_rx) = bounded::<Command>(config.command_queue_capacity);
        let (event_tx, event_rx) = bounded::<LocationEvent>(config.event_queue_capacity);

        let join = thread::Builder::new()
            .name("regionwatch-engine".to_string())
            .spawn(move || worker_loop(engine, &command_rx, &event_rx))
            .map_err(|e| RuntimeError::Spawn {
                message: e.to_string(),
            })?;

        Ok(Self {
            command_tx,
            events: EventSender {
                tx: event_tx,
                capacity: config.event_queue_capacity,
                dropped: Arc::new(AtomicU64::new(0)),
            },
            join: Some(join),
        })
    }

    /// A handle for delivering service events.
    #[must_use]
    pub fn event_sender(&self) -> EventSender {
        self.events.clone()
    }

    /// Delivers an event through the runtime's own sender.
    ///
    /// # Errors
    ///
    /// As for [`EventSender::deliver`].
    pub fn deliver(&self, event: LocationEvent) -> Result<(), RuntimeError> {
        self.events.deliver(event)
    }

    /// Events dropped because the queue was full or closed.
    #[must_use]
    pub fn dropped_events(&self) -> u64 {
        self.events.dropped.load(Ordering::Relaxed)
    }

    /// Adds a default-radius region at the current map center.
    ///
    /// # Errors
    ///
    /// Engine errors, or `Disconnected` if the worker is gone.
    pub fn add_region_at_map_center(&self) -> GeofenceResult<Region> {
        self.request("add_region", |reply| Command::AddRegion {
            placement: None,
            reply,
        })?
    }

    /// Adds a region at an explicit center and radius.
    ///
    /// # Errors
    ///
    /// Engine errors, or `Disconnected` if the worker is gone.
    pub fn add_region(&self, center: Coordinate, radius: f64) -> GeofenceResult<Region> {
        self.request("add_region", |reply| Command::AddRegion {
            placement: Some((center, radius)),
            reply,
        })?
    }

    /// Removes a region.
    ///
    /// # Errors
    ///
    /// Engine errors, or `Disconnected` if the worker is gone.
    pub fn remove_region(&self, id: &RegionId) -> GeofenceResult<Region> {
        self.request("remove_region", |reply| Command::RemoveRegion {
            id: id.clone(),
            reply,
        })?
    }

    /// Changes a region's radius.
    ///
    /// # Errors
    ///
    /// Engine errors, or `Disconnected` if the worker is gone.
    pub fn set_region_radius(&self, id: &RegionId, radius: f64) -> GeofenceResult<Option<PropertyChange>> {
        self.request("set_radius", |reply| Command::SetRadius {
            id: id.clone(),
            radius,
            reply,
        })?
    }

    /// Regions in insertion order.
    ///
    /// # Errors
    ///
    /// `Disconnected` if the worker is gone.
    pub fn regions(&self) -> GeofenceResult<Vec<Region>> {
        self.request("list_regions", |reply| Command::ListRegions { reply })
    }

    /// Event log, newest first, without touching the counter.
    ///
    /// # Errors
    ///
    /// `Disconnected` if the worker is gone.
    pub fn event_log(&self) -> GeofenceResult<Vec<EventRecord>> {
        self.request("event_log", |reply| Command::EventLog {
            mark_seen: false,
            reply,
        })
    }

    /// Event log for a now-visible list view; resets the counter.
    ///
    /// # Errors
    ///
    /// `Disconnected` if the worker is gone.
    pub fn show_event_log(&self) -> GeofenceResult<Vec<EventRecord>> {
        self.request("event_log", |reply| Command::EventLog {
            mark_seen: true,
            reply,
        })
    }

    /// Current badge counter.
    ///
    /// # Errors
    ///
    /// `Disconnected` if the worker is gone.
    pub fn counter(&self) -> GeofenceResult<u64> {
        self.request("counter", |reply| Command::Counter { reply })
    }

    /// Adopts regions the service already monitors.
    ///
    /// # Errors
    ///
    /// `Disconnected` if the worker is gone.
    pub fn rehydrate(&self) -> GeofenceResult<usize> {
        self.request("rehydrate", |reply| Command::Rehydrate { reply })
    }

    fn request<T>(&self, path: &str, build: impl FnOnce(Sender<T>) -> Command) -> GeofenceResult<T> {
        let disconnected = || RuntimeError::Disconnected {
            path: path.to_string(),
        };
        let (reply_tx, reply_rx) = bounded::<T>(1);
        self.command_tx
            .send(build(reply_tx))
            .map_err(|_| disconnected())?;
        Ok(reply_rx.recv().map_err(|_| disconnected())?)
    }
}

impl Drop for GeofenceRuntime {
    fn drop(&mut self) {
        // Event senders may outlive the runtime, so the event channel cannot be
        // relied on to close; stop the worker explicitly.
        let _ = self.command_tx.send(Command::Shutdown);
        if let Some(handle) = self.join.take() {
            let _ = handle.join();
        }
    }
}

fn worker_loop(mut engine: GeofenceEngine, command_rx: &Receiver<Command>, event_rx: &Receiver<LocationEvent>) {
    let mut running = true;
    let mut events_closed = false;

    while running {
        if events_closed {
            running = match command_rx.recv() {
                Ok(cmd) => handle_command(&mut engine, cmd),
                Err(_) => false,
            };
            continue;
        }

        select! {
            recv(command_rx) -> msg => {
                running = match msg {
                    Ok(cmd) => {
                        drain_events(&mut engine, event_rx);
                        handle_command(&mut engine, cmd)
                    }
                    Err(_) => false,
                };
            }
            recv(event_rx) -> msg => {
                match msg {
                    Ok(event) => apply_event(&mut engine, event),
                    Err(_) => events_closed = true,
                }
            }
        }
    }

    debug!("engine worker stopped");
}

fn drain_events(engine: &mut GeofenceEngine, event_rx: &Receiver<LocationEvent>) {
    while let Ok(event) = event_rx.try_recv() {
        apply_event(engine, event);
    }
}

fn apply_event(engine: &mut GeofenceEngine, event: LocationEvent) {
    if let Err(err) = engine.handle_event(event) {
        warn!(error = %err, "event rejected");
    }
}

/// Returns false on shutdown.
fn handle_command(engine: &mut GeofenceEngine, cmd: Command) -> bool {
    match cmd {
        Command::AddRegion { placement, reply } => {
            let result = match placement {
                Some((center, radius)) => engine.add_region(center, radius),
                None => engine.add_region_at_map_center(),
            };
            let _ = reply.send(result);
        }
        Command::RemoveRegion { id, reply } => {
            let _ = reply.send(engine.remove_region(&id));
        }
        Command::SetRadius { id, radius, reply } => {
            let _ = reply.send(engine.set_region_radius(&id, radius));
        }
        Command::ListRegions { reply } => {
            let _ = reply.send(engine.regions());
        }
        Command::EventLog { mark_seen, reply } => {
            let records = if mark_seen {
                engine.show_event_log()
            } else {
                engine.event_log().snapshot()
            };
            let _ = reply.send(records);
        }
        Command::Counter { reply } => {
            let _ = reply.send(engine.counter());
        }
        Command::Rehydrate { reply } => {
            let _ = reply.send(engine.rehydrate());
        }
        Command::Shutdown => return false,
    }
    true
}
