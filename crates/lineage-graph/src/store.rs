//! Append-only history store
//!
//! The single source of truth for lineage. Parents must exist before their
//! children are appended, so the declared lineage is a forest by
//! construction.

use crate::config::DEFAULT_CURRENT_NODE_ID;
use crate::entry::{EntryId, HistoryEntry};
use crate::error::LineageError;
use indexmap::IndexMap;

/// Ordered, append-only sequence of history entries
#[derive(Debug, Clone, Default)]
pub struct HistoryStore {
    entries: IndexMap<EntryId, HistoryEntry>,
}

impl HistoryStore {
    /// Empty store
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self {
            entries: IndexMap::new(),
        }
    }

    /// Load entries in order, rejecting forward references
    ///
    /// # Errors
    /// Returns the first [`LineageError`] encountered
    pub fn from_entries(
        entries: impl IntoIterator<Item = HistoryEntry>,
    ) -> Result<Self, LineageError> {
        let mut store = Self::new();
        for entry in entries {
            store.try_append(entry)?;
        }
        Ok(store)
    }

    /// Append an entry
    ///
    /// # Panics
    /// On a duplicate or reserved id, or a `parent_id` not already in the
    /// store. These can only come from a bug in entry construction.
    pub fn append(&mut self, entry: HistoryEntry) {
        if let Err(e) = self.try_append(entry) {
            panic!("history invariant violated: {e}");
        }
    }

    /// Append an entry, reporting invariant violations as values
    ///
    /// # Errors
    /// [`LineageError::ReservedId`], [`LineageError::DuplicateId`] or
    /// [`LineageError::UnknownParent`]
    pub fn try_append(&mut self, entry: HistoryEntry) -> Result<(), LineageError> {
        if entry.id.as_str() == DEFAULT_CURRENT_NODE_ID {
            return Err(LineageError::ReservedId(entry.id));
        }
        if self.entries.contains_key(&entry.id) {
            return Err(LineageError::DuplicateId(entry.id));
        }
        if let Some(parent) = &entry.parent_id {
            if !self.entries.contains_key(parent) {
                return Err(LineageError::UnknownParent {
                    id: entry.id,
                    parent: parent.clone(),
                });
            }
        }

        tracing::trace!(id = %entry.id, action = %entry.action, "appending history entry");
        self.entries.insert(entry.id.clone(), entry);
        Ok(())
    }

    /// All entries in insertion order
    pub fn all(&self) -> impl ExactSizeIterator<Item = &HistoryEntry> + Clone {
        self.entries.values()
    }

    /// Owned copy of all entries in insertion order
    #[must_use]
    pub fn to_vec(&self) -> Vec<HistoryEntry> {
        self.entries.values().cloned().collect()
    }

    /// Most recently appended entry (insertion order, not depth)
    #[inline]
    #[must_use]
    pub fn latest(&self) -> Option<&HistoryEntry> {
        self.entries.last().map(|(_, e)| e)
    }

    /// Look up by id
    #[inline]
    #[must_use]
    pub fn get(&self, id: &EntryId) -> Option<&HistoryEntry> {
        self.entries.get(id)
    }

    /// Whether the id is present
    #[inline]
    #[must_use]
    pub fn contains(&self, id: &EntryId) -> bool {
        self.entries.contains_key(id)
    }

    /// Number of entries
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the store is empty
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Entries with no declared parent
    pub fn roots(&self) -> impl Iterator<Item = &HistoryEntry> {
        self.entries.values().filter(|e| e.is_root())
    }

    /// Parent chain from `id` up to its root, starting with `id` itself
    ///
    /// # Errors
    /// [`LineageError::NotFound`] if `id` is not in the store
    pub fn ancestors(&self, id: &EntryId) -> Result<Vec<&HistoryEntry>, LineageError> {
        let mut current = self
            .entries
            .get(id)
            .ok_or_else(|| LineageError::NotFound(id.clone()))?;
        let mut chain = vec![current];

        // Parents always precede children, so the walk terminates.
        while let Some(parent) = current.parent_id.as_ref().and_then(|p| self.entries.get(p)) {
            chain.push(parent);
            current = parent;
        }
        Ok(chain)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entry::Action;
    use chrono::{DateTime, Utc};

    fn entry(id: &str, parent: Option<&str>) -> HistoryEntry {
        let e = HistoryEntry::new(id, Action::Modified, DateTime::<Utc>::UNIX_EPOCH);
        match parent {
            Some(p) => e.with_parent(p),
            None => e,
        }
    }

    #[test]
    fn append_preserves_order() {
        let mut store = HistoryStore::new();
        store.append(entry("a", None));
        store.append(entry("b", Some("a")));
        store.append(entry("c", Some("a")));

        let ids: Vec<_> = store.all().map(|e| e.id.as_str()).collect();
        assert_eq!(ids, vec!["a", "b", "c"]);
        assert_eq!(store.len(), 3);
    }

    #[test]
    fn latest_is_insertion_order() {
        let mut store = HistoryStore::new();
        store.append(entry("a", None));
        store.append(entry("b", Some("a")));
        store.append(entry("c", Some("b")));
        store.append(entry("d", Some("a")));

        assert_eq!(store.latest().unwrap().id.as_str(), "d");
    }

    #[test]
    fn empty_store_has_no_latest() {
        assert!(HistoryStore::new().latest().is_none());
    }

    #[test]
    fn try_append_rejects_forward_reference() {
        let mut store = HistoryStore::new();
        let err = store.try_append(entry("b", Some("a"))).unwrap_err();
        assert!(matches!(err, LineageError::UnknownParent { .. }));
        assert!(store.is_empty());
    }

    #[test]
    fn try_append_rejects_duplicate_id() {
        let mut store = HistoryStore::new();
        store.append(entry("a", None));
        let err = store.try_append(entry("a", None)).unwrap_err();
        assert_eq!(err, LineageError::DuplicateId(EntryId::from("a")));
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn try_append_rejects_current_node_id() {
        let mut store = HistoryStore::new();
        let err = store.try_append(entry(DEFAULT_CURRENT_NODE_ID, None)).unwrap_err();
        assert_eq!(err, LineageError::ReservedId(EntryId::from(DEFAULT_CURRENT_NODE_ID)));
        assert!(store.is_empty());
    }

    #[test]
    #[should_panic(expected = "history invariant violated")]
    fn append_panics_on_unknown_parent() {
        let mut store = HistoryStore::new();
        store.append(entry("b", Some("missing")));
    }

    #[test]
    fn ancestors_walk_to_root() {
        let store = HistoryStore::from_entries(vec![
            entry("a", None),
            entry("b", Some("a")),
            entry("c", Some("b")),
        ])
        .unwrap();

        let chain: Vec<_> = store
            .ancestors(&EntryId::from("c"))
            .unwrap()
            .into_iter()
            .map(|e| e.id.as_str())
            .collect();
        assert_eq!(chain, vec!["c", "b", "a"]);
    }

    #[test]
    fn ancestors_of_unknown_id() {
        let store = HistoryStore::new();
        assert!(store.ancestors(&EntryId::from("x")).is_err());
    }

    #[test]
    fn roots_lists_parentless_entries() {
        let store = HistoryStore::from_entries(vec![
            entry("a", None),
            entry("b", Some("a")),
            entry("m", None),
        ])
        .unwrap();
        let roots: Vec<_> = store.roots().map(|e| e.id.as_str()).collect();
        assert_eq!(roots, vec!["a", "m"]);
    }
}
