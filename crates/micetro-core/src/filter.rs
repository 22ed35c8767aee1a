// Custom-property filter predicates.
//
// Filters are written as a list of clauses, each a small property -> value
// map. Keys and values are sanitized once, on construction, and compared
// against sanitized record properties.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::sanitize::sanitize;

/// How a list of filter clauses is evaluated against one record.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FilterMode {
    /// Every property named by any clause must match. When the same
    /// property appears more than once, the last clause's value is the one
    /// required.
    #[default]
    AllOf,
    /// Legacy evaluation, configured as `filter_mode: last_property_wins`;
    /// it reproduces the results of the Ansible micetro inventory plugin.
    /// For each record property in turn, every clause overwrites the
    /// verdict (`clause[prop] == value`). Whatever the verdict is after the
    /// last property decides. Records without custom properties are always
    /// kept.
    LastPropertyWins,
}

/// Ordered, sanitized filter clauses plus their evaluation mode.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FilterSet {
    mode: FilterMode,
    clauses: Vec<IndexMap<String, String>>,
    /// `AllOf` view: clauses folded in order, later values overwrite.
    required: IndexMap<String, String>,
}

impl FilterSet {
    pub fn new<C, K, V>(mode: FilterMode, clauses: impl IntoIterator<Item = C>) -> Self
    where
        C: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: AsRef<str>,
    {
        let clauses: Vec<IndexMap<String, String>> = clauses
            .into_iter()
            .map(|clause| {
                clause
                    .into_iter()
                    .map(|(k, v)| (sanitize(k.as_ref()), sanitize(v.as_ref())))
                    .collect()
            })
            .collect();

        let mut required = IndexMap::new();
        for clause in &clauses {
            for (k, v) in clause {
                required.insert(k.clone(), v.clone());
            }
        }

        Self {
            mode,
            clauses,
            required,
        }
    }

    pub fn mode(&self) -> FilterMode {
        self.mode
    }

    pub fn is_empty(&self) -> bool {
        self.clauses.iter().all(IndexMap::is_empty)
    }

    /// Predicates a record must satisfy in [`FilterMode::AllOf`].
    pub fn required(&self) -> &IndexMap<String, String> {
        &self.required
    }

    /// Decide whether a record with these sanitized properties is kept.
    pub fn keeps(&self, properties: &[(String, String)]) -> bool {
        if self.is_empty() {
            return true;
        }

        match self.mode {
            FilterMode::AllOf => self.required.iter().all(|(key, want)| {
                properties
                    .iter()
                    .rev()
                    .find(|(k, _)| k == key)
                    .is_some_and(|(_, v)| v == want)
            }),
            FilterMode::LastPropertyWins => {
                let mut keep = true;
                for (key, value) in properties {
                    for clause in &self.clauses {
                        keep = clause.get(key) == Some(value);
                    }
                }
                keep
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn props(pairs: &[(&str, &str)]) -> Vec<(String, String)> {
        pairs
            .iter()
            .map(|(k, v)| (sanitize(k), sanitize(v)))
            .collect()
    }

    fn all_of(clauses: &[&[(&str, &str)]]) -> FilterSet {
        FilterSet::new(FilterMode::AllOf, clauses.iter().map(|c| c.iter().copied()))
    }

    #[test]
    fn empty_set_keeps_everything() {
        let filters = FilterSet::default();
        assert!(filters.is_empty());
        assert!(filters.keeps(&[]));
        assert!(filters.keeps(&props(&[("Location", "London")])));
    }

    #[test]
    fn clauses_are_sanitized_on_construction() {
        let filters = all_of(&[&[("Location", "New York, NY")]]);
        assert_eq!(
            filters.required().get("location").map(String::as_str),
            Some("new_york__ny")
        );
        assert!(filters.keeps(&props(&[("location", "new york, ny")])));
    }

    #[test]
    fn all_of_requires_every_property() {
        let filters = all_of(&[&[("Location", "London")], &[("Owner", "ops")]]);
        assert!(filters.keeps(&props(&[("Owner", "ops"), ("Location", "London")])));
        assert!(!filters.keeps(&props(&[("Location", "London")])));
        assert!(!filters.keeps(&props(&[("Location", "Paris"), ("Owner", "ops")])));
    }

    #[test]
    fn all_of_is_invariant_to_clause_order() {
        let record = props(&[("Location", "London"), ("Owner", "dev")]);
        let a = all_of(&[&[("Location", "London")], &[("Owner", "ops")]]);
        let b = all_of(&[&[("Owner", "ops")], &[("Location", "London")]]);
        assert_eq!(a.keeps(&record), b.keeps(&record));
        assert!(!a.keeps(&record));
    }

    #[test]
    fn all_of_uses_the_last_value_for_a_repeated_property() {
        let filters = all_of(&[&[("Location", "London")], &[("Location", "Paris")]]);
        assert!(filters.keeps(&props(&[("Location", "Paris")])));
        assert!(!filters.keeps(&props(&[("Location", "London")])));
    }

    #[test]
    fn all_of_drops_records_without_properties_when_filtering() {
        let filters = all_of(&[&[("Location", "London")]]);
        assert!(!filters.keeps(&[]));
    }

    #[test]
    fn last_property_wins_follows_the_final_property() {
        let filters = FilterSet::new(
            FilterMode::LastPropertyWins,
            [[("Location", "London")]],
        );
        // Matching property last: kept.
        assert!(filters.keeps(&props(&[("Owner", "ops"), ("Location", "London")])));
        // Matching property first, unrelated property last: dropped.
        assert!(!filters.keeps(&props(&[("Location", "London"), ("Owner", "ops")])));
        // No properties: nothing overwrites the initial verdict.
        assert!(filters.keeps(&[]));
    }

    #[test]
    fn last_property_wins_only_the_last_clause_counts() {
        let filters = FilterSet::new(
            FilterMode::LastPropertyWins,
            [vec![("Location", "London")], vec![("Owner", "ops")]],
        );
        // The second clause overwrites the first clause's verdict.
        assert!(!filters.keeps(&props(&[("Location", "London")])));
        assert!(filters.keeps(&props(&[("Owner", "ops")])));
    }
}
