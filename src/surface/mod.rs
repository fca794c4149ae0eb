//! Display-side collaborators.
//!
//! These traits define what the engine needs from the map, the badge and the
//! advisory UI. An in-memory map surface is provided for tests and headless
//! embedding.

mod memory;
mod traits;

pub use memory::InMemoryMapSurface;
pub use traits::{
    Advisory, AdvisoryDisplay, BadgeDisplay, CircleOverlay, MapSurface, OverlayHandle, PlacedOverlay,
};
