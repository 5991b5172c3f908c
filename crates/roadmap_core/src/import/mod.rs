//! Bulk import entry points.
//!
//! # Responsibility
//! - Turn pasted tabular text into project hierarchies.
//!
//! # Invariants
//! - Import is synchronous and never fails as a whole.

pub mod tabular;
