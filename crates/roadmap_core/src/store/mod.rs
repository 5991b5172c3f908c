//! File-backed roadmap snapshots.

pub mod snapshot;
