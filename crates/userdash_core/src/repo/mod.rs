//! Repository layer abstractions and persistence implementations.
//!
//! # Responsibility
//! - Define the record-collection persistence contract used by the store.
//! - Isolate serialization and slot details from service orchestration.
//!
//! # Invariants
//! - The whole collection is read and written as one value.
//! - Unreadable persisted data is reported as absent, never as records.

pub mod user_repo;
