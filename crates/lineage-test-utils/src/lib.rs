//! Testing utilities for the lineage workspace
//!
//! Shared fixtures for history stores and the canonical branch/merge
//! scenarios.

#![allow(missing_docs)]

use chrono::{DateTime, Duration, Utc};
use lineage_graph::{Action, EntryId, HistoryEntry, HistoryStore};

/// Fixed base time so fixtures are reproducible
pub fn epoch() -> DateTime<Utc> {
    DateTime::<Utc>::UNIX_EPOCH
}

pub fn entry(id: &str, action: Action, parent: Option<&str>) -> HistoryEntry {
    let e = HistoryEntry::new(id, action, epoch());
    match parent {
        Some(p) => e.with_parent(p),
        None => e,
    }
}

/// Entries built from `(id, action, parent)` triples, one second apart
pub fn entries(rows: &[(&str, Action, Option<&str>)]) -> Vec<HistoryEntry> {
    rows.iter()
        .enumerate()
        .map(|(i, &(id, action, parent))| {
            let mut e = entry(id, action, parent);
            e.timestamp = epoch() + Duration::seconds(i64::try_from(i).unwrap());
            e
        })
        .collect()
}

pub fn store_from(rows: &[(&str, Action, Option<&str>)]) -> HistoryStore {
    HistoryStore::from_entries(entries(rows)).unwrap()
}

/// `A` created, `B` and `C` both modify `A`
pub fn three_entry_store() -> HistoryStore {
    store_from(&[
        ("A", Action::Created, None),
        ("B", Action::Modified, Some("A")),
        ("C", Action::Modified, Some("A")),
    ])
}

/// Three-entry scenario followed by a merge `M` of `B` and `C`
pub fn merged_store() -> HistoryStore {
    store_from(&[
        ("A", Action::Created, None),
        ("B", Action::Modified, Some("A")),
        ("C", Action::Modified, Some("A")),
        ("M", Action::Merged, None),
    ])
}

/// Two-tree history with a star and an unstar
pub fn two_tree_store() -> HistoryStore {
    store_from(&[
        ("r1", Action::Created, None),
        ("r1a", Action::Modified, Some("r1")),
        ("r2", Action::Created, None),
        ("r1b", Action::Star, Some("r1a")),
        ("r2a", Action::Unstared, Some("r2")),
    ])
}

pub fn ids(list: &[&str]) -> Vec<EntryId> {
    list.iter().map(|s| EntryId::from(*s)).collect()
}
