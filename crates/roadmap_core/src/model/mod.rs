//! Roadmap domain model.
//!
//! # Responsibility
//! - Define canonical data structures used by import, storage and reports.
//! - Keep the period vocabulary in one place.
//!
//! # Invariants
//! - Every project is identified by a stable `ProjectId`.
//! - The hierarchy has exactly two levels: main projects and sub-projects.

pub mod period;
pub mod phase;
pub mod project;
