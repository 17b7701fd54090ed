//! Merge synthesis
//!
//! A merge is a new `merged` entry with no `parent_id`. It becomes a fresh
//! forest root; its incoming edges are reconstructed at build time from the
//! leaf set, never stored.

use crate::entry::{Action, EntryId, HistoryEntry};
use crate::error::ValidationError;
use crate::store::HistoryStore;
use chrono::{DateTime, Utc};
use indexmap::IndexSet;

/// Validates candidates and appends merge entries
#[derive(Debug, Clone)]
pub struct MergeOperation {
    modifier: String,
}

impl Default for MergeOperation {
    fn default() -> Self {
        Self::new("system")
    }
}

impl MergeOperation {
    /// Operation recording `modifier` on the entries it creates
    #[must_use]
    pub fn new(modifier: impl Into<String>) -> Self {
        Self {
            modifier: modifier.into(),
        }
    }

    /// Validate and append a merge of `candidates`
    ///
    /// # Errors
    /// [`ValidationError`] when fewer than two distinct candidates are given
    /// or one is unknown. The store is untouched on error.
    pub fn confirm<'a>(
        &self,
        store: &mut HistoryStore,
        candidates: impl IntoIterator<Item = &'a EntryId>,
    ) -> Result<HistoryEntry, ValidationError> {
        let entry = self.plan(store, candidates, EntryId::generate(), Utc::now())?;
        store.append(entry.clone());
        tracing::info!(id = %entry.id, version = ?entry.version, "merge recorded");
        Ok(entry)
    }

    /// Synthesise the merge entry without appending it
    ///
    /// # Errors
    /// As [`MergeOperation::confirm`]
    pub fn plan<'a>(
        &self,
        store: &HistoryStore,
        candidates: impl IntoIterator<Item = &'a EntryId>,
        id: EntryId,
        timestamp: DateTime<Utc>,
    ) -> Result<HistoryEntry, ValidationError> {
        let unique: IndexSet<&EntryId> = candidates.into_iter().collect();
        if unique.len() < 2 {
            return Err(ValidationError::TooFewCandidates {
                found: unique.len(),
            });
        }

        let sources = unique
            .iter()
            .map(|&cid| {
                store
                    .get(cid)
                    .ok_or_else(|| ValidationError::UnknownEntry(cid.clone()))
            })
            .collect::<Result<Vec<_>, _>>()?;

        let labels: Vec<&str> = sources.iter().map(|e| e.label()).collect();
        let ids: Vec<&str> = sources.iter().map(|e| e.id.as_str()).collect();

        Ok(HistoryEntry::new(id, Action::Merged, timestamp)
            .with_modifier(self.modifier.clone())
            .with_comment(format!("Merged versions {}", labels.join(", ")))
            .with_version(next_version_label(&sources))
            .with_summary(format!("Merged from {}", ids.join(", "))))
    }
}

/// `v{n + 1}` where `n` is the highest whole version among `sources`
///
/// Labels are free text, so the arithmetic stays in `f64`; numbers too
/// large to represent are ignored.
fn next_version_label(sources: &[&HistoryEntry]) -> String {
    let highest = sources
        .iter()
        .filter_map(|e| e.version_number())
        .filter(|n| n.is_finite())
        .fold(0.0_f64, f64::max);
    let next = highest.floor() + 1.0;
    format!("v{next:.0}")
}
