//! Core use-case services.
//!
//! # Responsibility
//! - Orchestrate repository, seed import, validation and projection calls.
//! - Keep UI/FFI layers decoupled from storage details.

pub mod user_store;
