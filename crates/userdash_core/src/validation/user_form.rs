//! User form input and validation rules.
//!
//! # Invariants
//! - An empty `ValidationErrors` is the only success signal.
//! - Messages are stable, user-facing strings.

use crate::model::user::{UserDraft, UserRecord};
use once_cell::sync::Lazy;
use regex::Regex;

pub const NAME_REQUIRED: &str = "Name is required";
pub const EMAIL_INVALID: &str = "Invalid email address";
pub const AGE_INVALID: &str = "Age must be a positive number";

static EMAIL_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[^\s@]+@[^\s@][^\s.@]*\.[^\s@]+$").expect("valid email regex")
});

/// Raw, unvalidated form input as typed by the user.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UserForm {
    pub name: String,
    pub email: String,
    /// Free text; coerced to a number during validation.
    pub age: String,
    pub is_active: bool,
}

impl UserForm {
    pub fn new(
        name: impl Into<String>,
        email: impl Into<String>,
        age: impl Into<String>,
        is_active: bool,
    ) -> Self {
        Self {
            name: name.into(),
            email: email.into(),
            age: age.into(),
            is_active,
        }
    }

    /// Pre-fills an edit form from an existing record.
    pub fn from_record(record: &UserRecord) -> Self {
        Self {
            name: record.name.clone(),
            email: record.email.clone(),
            age: record.age.to_string(),
            is_active: record.is_active,
        }
    }
}

/// Validated form field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FormField {
    Name,
    Email,
    Age,
}

impl FormField {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Name => "name",
            Self::Email => "email",
            Self::Age => "age",
        }
    }
}

/// Per-field validation messages; empty means the submission is valid.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ValidationErrors {
    pub name: Option<&'static str>,
    pub email: Option<&'static str>,
    pub age: Option<&'static str>,
}

impl ValidationErrors {
    pub fn is_empty(&self) -> bool {
        self.name.is_none() && self.email.is_none() && self.age.is_none()
    }

    pub fn get(&self, field: FormField) -> Option<&'static str> {
        match field {
            FormField::Name => self.name,
            FormField::Email => self.email,
            FormField::Age => self.age,
        }
    }

    /// Iterates reported fields in form order.
    pub fn iter(&self) -> impl Iterator<Item = (FormField, &'static str)> + '_ {
        [FormField::Name, FormField::Email, FormField::Age]
            .into_iter()
            .filter_map(|field| self.get(field).map(|message| (field, message)))
    }

    pub fn len(&self) -> usize {
        self.iter().count()
    }
}

/// Validates raw form input, reporting every violated field.
pub fn validate(form: &UserForm) -> ValidationErrors {
    ValidationErrors {
        name: form.name.trim().is_empty().then_some(NAME_REQUIRED),
        email: (!EMAIL_RE.is_match(&form.email)).then_some(EMAIL_INVALID),
        age: parse_age(&form.age).is_none().then_some(AGE_INVALID),
    }
}

/// Validates and converts form input into an add/edit payload.
///
/// The name is kept exactly as typed; only emptiness is judged on the
/// trimmed value.
pub fn validate_submission(form: &UserForm) -> Result<UserDraft, ValidationErrors> {
    let errors = validate(form);
    let age = match parse_age(&form.age) {
        Some(age) if errors.is_empty() => age,
        _ => return Err(errors),
    };

    Ok(UserDraft {
        name: form.name.clone(),
        email: form.email.clone(),
        age,
        is_active: form.is_active,
    })
}

/// Coerces age text to a positive whole number.
fn parse_age(raw: &str) -> Option<u32> {
    let value = coerce_number(raw)?;
    if !value.is_finite() || value <= 0.0 || value.fract() != 0.0 || value > f64::from(u32::MAX)
    {
        return None;
    }
    Some(value as u32)
}

/// Numeric-string coercion: surrounding whitespace is ignored, blank input is
/// zero, and `0x`/`0o`/`0b` prefixes select the radix.
fn coerce_number(raw: &str) -> Option<f64> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Some(0.0);
    }

    let radix_prefixed = [("0x", 16), ("0X", 16), ("0o", 8), ("0O", 8), ("0b", 2), ("0B", 2)]
        .into_iter()
        .find_map(|(prefix, radix)| trimmed.strip_prefix(prefix).map(|digits| (digits, radix)));
    if let Some((digits, radix)) = radix_prefixed {
        return u64::from_str_radix(digits, radix).ok().map(|v| v as f64);
    }

    // Rust accepts `inf`/`nan` spellings; those are not numbers here.
    if trimmed.chars().any(|c| c.is_ascii_alphabetic() && c != 'e' && c != 'E') {
        return None;
    }
    trimmed.parse::<f64>().ok()
}
