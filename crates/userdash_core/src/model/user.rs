//! User record model and view configuration types.
//!
//! # Responsibility
//! - Define the record shape persisted in durable storage.
//! - Define sort/filter configuration with the dashboard's toggle semantics.
//!
//! # Invariants
//! - `id` is assigned once (store creation or seed import) and never changes.
//! - Wire field names follow the dashboard JSON shape (`isActive`).

use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};
use uuid::Uuid;

/// Opaque unique identifier of a user record.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserId(String);

impl UserId {
    /// Wraps an existing identifier (seed import, persisted data, UI input).
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    /// Generates a fresh globally-unique identifier.
    pub fn generate() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }
}

impl Display for UserId {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.pad(&self.0)
    }
}

impl From<&str> for UserId {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

/// Canonical user record stored in the collection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserRecord {
    pub id: UserId,
    pub name: String,
    pub email: String,
    pub age: u32,
    /// Serialized as `isActive` to match the stored dashboard shape.
    #[serde(rename = "isActive")]
    pub is_active: bool,
}

/// Validated add/edit payload; carries every field except `id`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserDraft {
    pub name: String,
    pub email: String,
    pub age: u32,
    pub is_active: bool,
}

impl UserDraft {
    /// Builds a full record by attaching an identifier.
    pub fn into_record(self, id: UserId) -> UserRecord {
        UserRecord {
            id,
            name: self.name,
            email: self.email,
            age: self.age,
            is_active: self.is_active,
        }
    }
}

impl From<&UserRecord> for UserDraft {
    fn from(record: &UserRecord) -> Self {
        Self {
            name: record.name.clone(),
            email: record.email.clone(),
            age: record.age,
            is_active: record.is_active,
        }
    }
}

/// Sortable record column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum SortKey {
    Name,
    Email,
    Age,
    IsActive,
}

impl SortKey {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Name => "name",
            Self::Email => "email",
            Self::Age => "age",
            Self::IsActive => "isActive",
        }
    }

    /// Parses a column name as used by the UI and CLI.
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim() {
            "name" => Some(Self::Name),
            "email" => Some(Self::Email),
            "age" => Some(Self::Age),
            "isActive" | "is_active" | "active" => Some(Self::IsActive),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum SortDirection {
    #[default]
    #[serde(rename = "asc")]
    Ascending,
    #[serde(rename = "desc")]
    Descending,
}

impl SortDirection {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Ascending => "asc",
            Self::Descending => "desc",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "asc" | "ascending" => Some(Self::Ascending),
            "desc" | "descending" => Some(Self::Descending),
            _ => None,
        }
    }
}

/// Single active sort column plus direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SortConfig {
    pub key: SortKey,
    pub direction: SortDirection,
}

impl Default for SortConfig {
    fn default() -> Self {
        Self {
            key: SortKey::Name,
            direction: SortDirection::Ascending,
        }
    }
}

impl SortConfig {
    pub fn new(key: SortKey, direction: SortDirection) -> Self {
        Self { key, direction }
    }

    /// Returns the configuration after a header click on `key`.
    ///
    /// Clicking the active column while ascending flips to descending; every
    /// other click starts `key` ascending.
    pub fn toggled(self, key: SortKey) -> Self {
        let direction = if self.key == key && self.direction == SortDirection::Ascending {
            SortDirection::Descending
        } else {
            SortDirection::Ascending
        };
        Self { key, direction }
    }
}

/// Optional active-status filter; `None` keeps every record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct StatusFilter(pub Option<bool>);

impl StatusFilter {
    pub const ALL: Self = Self(None);
    pub const ACTIVE: Self = Self(Some(true));
    pub const INACTIVE: Self = Self(Some(false));

    pub fn matches(self, record: &UserRecord) -> bool {
        self.0.map_or(true, |wanted| record.is_active == wanted)
    }

    /// Parses the status select value (`""`, `"true"`, `"false"`).
    pub fn parse(value: &str) -> Result<Self, StatusFilterError> {
        match value.trim() {
            "" | "all" => Ok(Self::ALL),
            "true" | "active" => Ok(Self::ACTIVE),
            "false" | "inactive" => Ok(Self::INACTIVE),
            other => Err(StatusFilterError(other.to_string())),
        }
    }

    /// Returns the select value this filter renders as.
    pub fn as_select_value(self) -> &'static str {
        match self.0 {
            None => "",
            Some(true) => "true",
            Some(false) => "false",
        }
    }
}

/// Unknown status filter value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusFilterError(pub String);

impl Display for StatusFilterError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "unsupported status filter `{}`; expected all|true|false",
            self.0
        )
    }
}

impl Error for StatusFilterError {}

#[cfg(test)]
mod tests {
    use super::{SortConfig, SortDirection, SortKey, StatusFilter, UserId};

    #[test]
    fn toggling_active_key_flips_direction() {
        let config = SortConfig::default();
        let flipped = config.toggled(SortKey::Name);
        assert_eq!(flipped.direction, SortDirection::Descending);
        let back = flipped.toggled(SortKey::Name);
        assert_eq!(back.direction, SortDirection::Ascending);
    }

    #[test]
    fn toggling_other_key_starts_ascending() {
        let config = SortConfig::new(SortKey::Name, SortDirection::Descending);
        assert_eq!(
            config.toggled(SortKey::Age),
            SortConfig::new(SortKey::Age, SortDirection::Ascending)
        );
    }

    #[test]
    fn status_filter_parses_select_values() {
        assert_eq!(StatusFilter::parse("").unwrap(), StatusFilter::ALL);
        assert_eq!(StatusFilter::parse("true").unwrap(), StatusFilter::ACTIVE);
        assert_eq!(StatusFilter::parse("false").unwrap(), StatusFilter::INACTIVE);
        assert!(StatusFilter::parse("maybe").is_err());
        assert_eq!(StatusFilter::INACTIVE.as_select_value(), "false");
    }

    #[test]
    fn generated_ids_are_unique() {
        assert_ne!(UserId::generate(), UserId::generate());
    }
}
