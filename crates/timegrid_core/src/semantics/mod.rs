//! Semantic stages over the layout graph.
//!
//! # Responsibility
//! - Classify coarse nodes into calendar roles.
//! - Split annotated cells into fine-grained entity nodes.
//! - Link the date hierarchy `Year -> Month -> DayOfWeek -> Event`.
//!
//! # Invariants
//! - Every stage reads its input graph and returns a new one.

pub mod classify;
pub mod fine_grain;
pub mod linking;
