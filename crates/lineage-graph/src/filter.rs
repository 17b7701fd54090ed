//! Filtered views over the history
//!
//! Pure and order-preserving. Recomputed from scratch on every change.

use crate::entry::{Action, HistoryEntry};
use crate::error::LineageError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Action-type filter
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum ActionFilter {
    /// Every action passes
    #[default]
    All,
    /// Only this action passes
    Only(Action),
}

impl ActionFilter {
    /// Whether `action` passes
    #[inline]
    #[must_use]
    pub fn admits(self, action: Action) -> bool {
        match self {
            ActionFilter::All => true,
            ActionFilter::Only(wanted) => wanted == action,
        }
    }
}

impl fmt::Display for ActionFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ActionFilter::All => f.write_str("all"),
            ActionFilter::Only(action) => action.fmt(f),
        }
    }
}

impl TryFrom<String> for ActionFilter {
    type Error = LineageError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<ActionFilter> for String {
    fn from(value: ActionFilter) -> Self {
        value.to_string()
    }
}

impl FromStr for ActionFilter {
    type Err = LineageError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.trim().eq_ignore_ascii_case("all") {
            Ok(ActionFilter::All)
        } else {
            s.parse().map(ActionFilter::Only)
        }
    }
}

/// Search term plus action filter
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FilterCriteria {
    /// Case-insensitive substring over modifier, field and comment
    #[serde(default)]
    pub search_term: String,
    /// Action restriction
    #[serde(default)]
    pub action_filter: ActionFilter,
}

impl FilterCriteria {
    /// Criteria that admit everything
    #[inline]
    #[must_use]
    pub fn all() -> Self {
        Self::default()
    }

    /// With search term
    #[inline]
    #[must_use]
    pub fn with_search(mut self, term: impl Into<String>) -> Self {
        self.search_term = term.into();
        self
    }

    /// With action filter
    #[inline]
    #[must_use]
    pub fn with_action(mut self, filter: ActionFilter) -> Self {
        self.action_filter = filter;
        self
    }

    /// Whether these criteria admit every entry
    #[inline]
    #[must_use]
    pub fn is_passthrough(&self) -> bool {
        self.search_term.is_empty() && self.action_filter == ActionFilter::All
    }

    /// Whether a single entry passes
    #[must_use]
    pub fn matches(&self, entry: &HistoryEntry) -> bool {
        self.action_filter.admits(entry.action)
            && search_hit(entry, &self.search_term.to_lowercase())
    }
}

fn search_hit(entry: &HistoryEntry, needle: &str) -> bool {
    if needle.is_empty() {
        return true;
    }
    let hit = |haystack: &str| haystack.to_lowercase().contains(needle);
    hit(&entry.modifier)
        || entry.field.as_deref().is_some_and(hit)
        || entry.comment.as_deref().is_some_and(hit)
}

/// Entries passing `criteria`, in their original order
#[must_use]
pub fn apply<'a, I>(entries: I, criteria: &FilterCriteria) -> Vec<HistoryEntry>
where
    I: IntoIterator<Item = &'a HistoryEntry>,
{
    if criteria.is_passthrough() {
        return entries.into_iter().cloned().collect();
    }

    let needle = criteria.search_term.to_lowercase();
    entries
        .into_iter()
        .filter(|e| criteria.action_filter.admits(e.action) && search_hit(e, &needle))
        .cloned()
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{DateTime, Utc};

    fn entry(id: &str, action: Action, modifier: &str) -> HistoryEntry {
        HistoryEntry::new(id, action, DateTime::<Utc>::UNIX_EPOCH).with_modifier(modifier)
    }

    fn sample() -> Vec<HistoryEntry> {
        vec![
            entry("a", Action::Created, "Alice"),
            entry("b", Action::Modified, "bob").with_change("Tone", None, Some("warm".into())),
            entry("c", Action::Modified, "carol").with_comment("Fixed TONE wording"),
            entry("d", Action::Star, "dave"),
        ]
    }

    fn ids(entries: &[HistoryEntry]) -> Vec<&str> {
        entries.iter().map(|e| e.id.as_str()).collect()
    }

    #[test]
    fn passthrough_keeps_everything() {
        let entries = sample();
        let out = apply(&entries, &FilterCriteria::all());
        assert_eq!(out, entries);
    }

    #[test]
    fn search_is_case_insensitive_over_three_fields() {
        let entries = sample();
        assert_eq!(ids(&apply(&entries, &FilterCriteria::all().with_search("alice"))), vec!["a"]);
        assert_eq!(
            ids(&apply(&entries, &FilterCriteria::all().with_search("tone"))),
            vec!["b", "c"]
        );
    }

    #[test]
    fn search_ignores_other_fields() {
        let entries = vec![entry("x", Action::Modified, "m").with_version("tone")];
        assert!(apply(&entries, &FilterCriteria::all().with_search("tone")).is_empty());
    }

    #[test]
    fn action_filter_and_search_combine() {
        let entries = sample();
        let criteria = FilterCriteria::all()
            .with_search("o")
            .with_action(ActionFilter::Only(Action::Modified));
        assert_eq!(ids(&apply(&entries, &criteria)), vec!["b", "c"]);
    }

    #[test]
    fn action_filter_parses() {
        assert_eq!("all".parse::<ActionFilter>().unwrap(), ActionFilter::All);
        assert_eq!(
            "merged".parse::<ActionFilter>().unwrap(),
            ActionFilter::Only(Action::Merged)
        );
        assert!("bogus".parse::<ActionFilter>().is_err());
    }

    #[test]
    fn criteria_deserialize_from_host_json() {
        let c: FilterCriteria =
            serde_json::from_str(r#"{"searchTerm":"x","actionFilter":"star"}"#).unwrap();
        assert_eq!(c.action_filter, ActionFilter::Only(Action::Star));
        let c: FilterCriteria = serde_json::from_str(r#"{"actionFilter":"all"}"#).unwrap();
        assert!(c.is_passthrough());
    }

    #[test]
    fn matches_agrees_with_apply() {
        let entries = sample();
        let criteria = FilterCriteria::all().with_search("TONE");
        let expected: Vec<_> = entries.iter().filter(|e| criteria.matches(e)).cloned().collect();
        assert_eq!(apply(&entries, &criteria), expected);
    }
}
