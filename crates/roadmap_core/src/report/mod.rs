//! Reporting views over project collections.
//!
//! # Responsibility
//! - Compute per-project start/end delays and rank slipped projects.
//! - Aggregate summary figures for dashboards.
//!
//! # Invariants
//! - Reports only consider main projects.
//! - All delay figures come from `delay::calculate_delay`.

pub mod delay;
pub mod summary;
