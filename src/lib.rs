//! Tide-aware voyages across an infinite procedural archipelago.
//!
//! Re-exports modules for use by the binary and host games.

pub mod ascii;
pub mod config;
pub mod grid;
pub mod heightfield;
pub mod record;
pub mod relic;
pub mod route;
pub mod ship;
pub mod stage;
pub mod tide;
pub mod voyage;
