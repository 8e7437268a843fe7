//! Display projections over the user collection.
//!
//! # Responsibility
//! - Filter and order records for display without mutating the collection.
//!
//! # Invariants
//! - Projections are pure: identical inputs yield identical output order.

pub mod projection;
