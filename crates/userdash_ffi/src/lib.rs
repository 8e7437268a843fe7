//! Flutter-facing bindings for the user dashboard core.

pub mod api;
