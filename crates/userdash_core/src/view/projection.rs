//! Filter + sort projection and its memoization cache.
//!
//! # Invariants
//! - Filtering only removes records; sorting only reorders them.
//! - Sorting is stable in both directions: equal keys keep filtered order.
//! - The comparator is resolved once per projection from the sort key.

use crate::model::user::{SortConfig, SortDirection, SortKey, StatusFilter, UserId, UserRecord};
use feruca::{Collator, Tailoring};
use std::cmp::Ordering;

type Comparator = fn(&mut Collator, &UserRecord, &UserRecord) -> Ordering;

/// Projects `records` into display order.
pub fn project<'a>(
    records: &'a [UserRecord],
    filter: StatusFilter,
    sort: SortConfig,
) -> Vec<&'a UserRecord> {
    let compare = comparator_for(sort.key);
    let mut collator = root_collator();
    let mut ordered: Vec<&UserRecord> = records
        .iter()
        .filter(|record| filter.matches(record))
        .collect();

    // `sort_by` is stable; reversing the comparator keeps ties in place.
    match sort.direction {
        SortDirection::Ascending => ordered.sort_by(|a, b| compare(&mut collator, a, b)),
        SortDirection::Descending => ordered.sort_by(|a, b| compare(&mut collator, b, a)),
    }
    ordered
}

fn comparator_for(key: SortKey) -> Comparator {
    match key {
        SortKey::Name => by_name,
        SortKey::Email => by_email,
        SortKey::Age => by_age,
        SortKey::IsActive => by_active,
    }
}

fn by_name(collator: &mut Collator, a: &UserRecord, b: &UserRecord) -> Ordering {
    collator.collate(a.name.as_str(), b.name.as_str())
}

fn by_email(collator: &mut Collator, a: &UserRecord, b: &UserRecord) -> Ordering {
    collator.collate(a.email.as_str(), b.email.as_str())
}

fn by_age(_: &mut Collator, a: &UserRecord, b: &UserRecord) -> Ordering {
    a.age.cmp(&b.age)
}

// false < true
fn by_active(_: &mut Collator, a: &UserRecord, b: &UserRecord) -> Ordering {
    a.is_active.cmp(&b.is_active)
}

/// CLDR root collation: accents and case are secondary/tertiary differences,
/// lowercase sorts before uppercase, punctuation is not ignored, and
/// canonically equal strings fall back to code point order.
fn root_collator() -> Collator {
    Collator::new(Tailoring::default(), false, true)
}

/// Locale-style string ordering (CLDR root collation).
pub fn collate(a: &str, b: &str) -> Ordering {
    root_collator().collate(a, b)
}

/// Memoized projection keyed on collection revision, filter and sort.
///
/// Stores ids rather than borrowed records so it can live next to the
/// collection it describes.
#[derive(Debug, Default)]
pub struct ProjectionCache {
    key: Option<(u64, StatusFilter, SortConfig)>,
    ordered_ids: Vec<UserId>,
}

impl ProjectionCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the projected order, recomputing only when an input changed.
    ///
    /// `revision` must change whenever `records` changes.
    pub fn ordered<'a>(
        &mut self,
        records: &'a [UserRecord],
        revision: u64,
        filter: StatusFilter,
        sort: SortConfig,
    ) -> Vec<&'a UserRecord> {
        let key = (revision, filter, sort);
        if self.key != Some(key) {
            self.ordered_ids = project(records, filter, sort)
                .into_iter()
                .map(|record| record.id.clone())
                .collect();
            self.key = Some(key);
        }

        self.ordered_ids
            .iter()
            .filter_map(|id| records.iter().find(|record| &record.id == id))
            .collect()
    }

    /// Whether the next `ordered` call with these inputs is served from cache.
    pub fn is_fresh(&self, revision: u64, filter: StatusFilter, sort: SortConfig) -> bool {
        self.key == Some((revision, filter, sort))
    }

    pub fn invalidate(&mut self) {
        self.key = None;
        self.ordered_ids.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::{collate, project, ProjectionCache};
    use crate::model::user::{
        SortConfig, SortDirection, SortKey, StatusFilter, UserId, UserRecord,
    };
    use std::cmp::Ordering;

    fn user(id: &str, name: &str, age: u32, active: bool) -> UserRecord {
        UserRecord {
            id: UserId::new(id),
            name: name.to_string(),
            email: format!("{}@e.com", name.to_lowercase()),
            age,
            is_active: active,
        }
    }

    fn ids(records: &[&UserRecord]) -> Vec<String> {
        records.iter().map(|r| r.id.to_string()).collect()
    }

    #[test]
    fn collate_ignores_case_first_then_orders_lowercase_first() {
        assert_eq!(collate("alice", "Bob"), Ordering::Less);
        assert_eq!(collate("Bob", "alice"), Ordering::Greater);
        assert_eq!(collate("a", "A"), Ordering::Less);
        assert_eq!(collate("same", "same"), Ordering::Equal);
        assert_eq!(collate("ab", "abc"), Ordering::Less);
    }

    #[test]
    fn collate_orders_accented_letters_with_their_base_letter() {
        assert_eq!(collate("Émile", "Zed"), Ordering::Less);
        assert_eq!(collate("émile", "eve"), Ordering::Less);
        assert_eq!(collate("Ana", "Ángel"), Ordering::Less);
        assert_eq!(collate("e", "é"), Ordering::Less);
    }

    #[test]
    fn boolean_sort_puts_false_first_ascending() {
        let records = vec![user("1", "a", 1, true), user("2", "b", 2, false)];
        let sorted = project(
            &records,
            StatusFilter::ALL,
            SortConfig::new(SortKey::IsActive, SortDirection::Ascending),
        );
        assert_eq!(ids(&sorted), vec!["2", "1"]);
    }

    #[test]
    fn numeric_sort_is_not_lexicographic() {
        let records = vec![user("1", "a", 9, true), user("2", "b", 10, true)];
        let sorted = project(
            &records,
            StatusFilter::ALL,
            SortConfig::new(SortKey::Age, SortDirection::Ascending),
        );
        assert_eq!(ids(&sorted), vec!["1", "2"]);
    }

    #[test]
    fn cache_recomputes_only_when_inputs_change() {
        let records = vec![user("1", "b", 1, true), user("2", "a", 2, true)];
        let sort = SortConfig::default();
        let mut cache = ProjectionCache::new();

        assert!(!cache.is_fresh(0, StatusFilter::ALL, sort));
        let first = cache.ordered(&records, 0, StatusFilter::ALL, sort);
        assert_eq!(ids(&first), vec!["2", "1"]);
        assert!(cache.is_fresh(0, StatusFilter::ALL, sort));
        assert!(!cache.is_fresh(1, StatusFilter::ALL, sort));
        assert!(!cache.is_fresh(0, StatusFilter::ACTIVE, sort));

        let flipped = sort.toggled(SortKey::Name);
        let second = cache.ordered(&records, 0, StatusFilter::ALL, flipped);
        assert_eq!(ids(&second), vec!["1", "2"]);

        cache.invalidate();
        assert!(!cache.is_fresh(0, StatusFilter::ALL, flipped));
    }
}
