//! Timetable graph data model.
//!
//! # Responsibility
//! - Define the grid snapshot, node/edge attributes and entity spans shared by
//!   every pipeline stage.
//!
//! # Invariants
//! - Every non-empty grid cell maps to exactly one coarse node id.
//! - Entity spans are validated against their parent text before use.

pub mod edge;
pub mod entity;
pub mod grid;
pub mod node;
