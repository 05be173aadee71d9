//! Pure economy engine for driftmine, an incremental ("clicker") game.
//!
//! This crate contains all simulation logic that is independent of any
//! database, web framework, or runtime. The caller loads a validated game
//! model and a persisted player snapshot, invokes engine operations with a
//! timestamp, and persists the snapshot the engine hands back. The engine
//! performs no I/O of its own.
//!
//! # Module Overview
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`decay`] | Offline time decay — wall-clock seconds to effective seconds |
//! | [`instance`] | Per-player simulation: accrual, purchases, derived values |
//! | [`model`] | Immutable, validated game definition (resources/buildings/upgrades) |
//! | [`state`] | Boundary data shapes: persisted snapshot and client payload |
//! | [`validate`] | Structural and referential validation of raw model JSON |

pub mod decay;
pub mod instance;
pub mod model;
pub mod state;
pub mod validate;
