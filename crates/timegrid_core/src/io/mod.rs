//! File access around the pure pipeline stages.
//!
//! # Responsibility
//! - Load timetable grids from CSV exports.
//! - Persist graphs between stages as node-link JSON.
//!
//! # Invariants
//! - Nothing in this module changes graph or grid semantics.

pub mod graph_store;
pub mod timetable;
