//! Form validation for user add/edit submissions.
//!
//! # Responsibility
//! - Turn raw form input into a validated `UserDraft` or per-field errors.
//!
//! # Invariants
//! - Every violated field is reported at once; there is no partial success.
//! - Validation is pure and never touches storage.

pub mod user_form;
