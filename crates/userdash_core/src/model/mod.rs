//! Domain model for the user dashboard.
//!
//! # Responsibility
//! - Define the canonical user record and its id-less add payload.
//! - Define the sort and status-filter configuration consumed by views.
//!
//! # Invariants
//! - Every stored record is identified by a unique `UserId`.
//! - Collection order is insertion order; display order lives in `view`.

pub mod user;
