//! Version graph engine
//!
//! Owns the [`HistoryStore`] and wires the pipeline
//! store → filter → build → layout. Every input that can change the graph
//! rebuilds it from the top and publishes a new [`GraphSnapshot`]; earlier
//! snapshots stay valid for whoever still holds them.

use crate::config::EngineConfig;
use crate::entry::{EntryId, HistoryEntry, HistoryEntryInput};
use crate::error::ValidationError;
use crate::events::{EngineEvent, EventSink, NullSink};
use crate::filter::{self, FilterCriteria};
use crate::graph::{GraphBuilder, GraphSnapshot};
use crate::merge::MergeOperation;
use crate::selection::{
    Highlight, SelectionController, SelectionMode, SelectionOutcome, SelectionState,
};
use crate::store::HistoryStore;
use chrono::Utc;
use std::sync::Arc;

/// Single-threaded facade over the lineage subsystem
#[derive(Debug)]
pub struct VersionGraphEngine<S: EventSink = NullSink> {
    store: HistoryStore,
    criteria: FilterCriteria,
    selection: SelectionController,
    builder: GraphBuilder,
    merge: MergeOperation,
    snapshot: Arc<GraphSnapshot>,
    sink: S,
}

impl VersionGraphEngine<NullSink> {
    /// Engine over an empty store, discarding events
    #[must_use]
    pub fn new(config: EngineConfig) -> Self {
        Self::with_sink(config, NullSink)
    }
}

impl<S: EventSink> VersionGraphEngine<S> {
    /// Engine over an empty store
    #[must_use]
    pub fn with_sink(config: EngineConfig, sink: S) -> Self {
        Self::from_store(HistoryStore::new(), config, sink)
    }

    /// Engine over an existing store
    #[must_use]
    pub fn from_store(store: HistoryStore, config: EngineConfig, sink: S) -> Self {
        let merge = MergeOperation::new(config.merge_modifier.clone());
        let mut engine = Self {
            store,
            criteria: FilterCriteria::all(),
            selection: SelectionController::new(),
            builder: GraphBuilder::new(config),
            merge,
            snapshot: Arc::new(GraphSnapshot::default()),
            sink,
        };
        engine.rebuild();
        engine
    }

    /// Record a rubric change, assigning a fresh id and timestamp
    ///
    /// # Panics
    /// If `input.parent_id` names an entry that is not in the store.
    pub fn record_event(&mut self, input: HistoryEntryInput) -> EntryId {
        let entry = input.into_entry(EntryId::generate(), Utc::now());
        let id = entry.id.clone();
        self.append_entry(entry);
        id
    }

    /// Append a fully formed entry
    ///
    /// # Panics
    /// On a duplicate id or unknown parent, as [`HistoryStore::append`].
    pub fn append_entry(&mut self, entry: HistoryEntry) {
        let id = entry.id.clone();
        self.store.append(entry);
        self.sink.publish(&EngineEvent::EntryRecorded(id));
        self.rebuild();
    }

    /// Merge the given versions, independent of the selection mode
    ///
    /// # Errors
    /// [`ValidationError`] when fewer than two distinct known versions are
    /// given; nothing changes in that case.
    pub fn request_merge(&mut self, ids: &[EntryId]) -> Result<HistoryEntry, ValidationError> {
        match self.merge.confirm(&mut self.store, ids) {
            Ok(merged) => {
                self.sink.publish(&EngineEvent::MergeCompleted {
                    merged: merged.id.clone(),
                    sources: dedup(ids),
                });
                self.rebuild();
                Ok(merged)
            }
            Err(e) => {
                tracing::warn!(error = %e, "merge rejected");
                self.sink.publish(&EngineEvent::MergeRejected(e.clone()));
                Err(e)
            }
        }
    }

    /// Merge the current merge candidates and return to browsing
    ///
    /// # Errors
    /// As [`VersionGraphEngine::request_merge`]; the selection is left as
    /// it was so the user can adjust and retry.
    pub fn confirm_merge(&mut self) -> Result<HistoryEntry, ValidationError> {
        let candidates: Vec<EntryId> = self.selection.merge_candidates().iter().cloned().collect();
        let merged = self.request_merge(&candidates)?;
        self.selection.finish_merge();
        Ok(merged)
    }

    /// Replace the filter and rebuild
    pub fn set_filter(&mut self, criteria: FilterCriteria) {
        tracing::debug!(
            search = %criteria.search_term,
            action = %criteria.action_filter,
            "filter changed"
        );
        self.criteria = criteria;
        self.rebuild();
    }

    /// Current filter
    #[inline]
    #[must_use]
    pub fn filter(&self) -> &FilterCriteria {
        &self.criteria
    }

    /// Handle a node click
    ///
    /// Clicks on ids outside the store (such as the current-state node) are
    /// ignored and return `None`.
    pub fn select_node(&mut self, id: &EntryId, modifier_held: bool) -> Option<SelectionOutcome> {
        if !self.store.contains(id) || id.as_str() == self.config().current_node_id {
            return None;
        }
        let outcome = self.selection.select_node(id, modifier_held);
        if let SelectionOutcome::Focused(focused) = &outcome {
            self.sink.publish(&EngineEvent::VersionFocused(focused.clone()));
        }
        Some(outcome)
    }

    /// Enter or leave merge mode
    pub fn toggle_merge_mode(&mut self) -> SelectionMode {
        self.selection.toggle_merge_mode()
    }

    /// Leave merge mode without merging
    pub fn cancel_merge(&mut self) {
        self.selection.cancel_merge();
    }

    /// Latest published snapshot
    #[inline]
    #[must_use]
    pub fn snapshot(&self) -> Arc<GraphSnapshot> {
        Arc::clone(&self.snapshot)
    }

    /// Selection state for highlights and affordances
    #[inline]
    #[must_use]
    pub fn selection(&self) -> &SelectionState {
        self.selection.state()
    }

    /// Whether the merge confirm affordance is enabled
    #[inline]
    #[must_use]
    pub fn can_confirm_merge(&self) -> bool {
        self.selection.can_confirm()
    }

    /// Highlight for a node
    #[inline]
    #[must_use]
    pub fn highlight(&self, id: &EntryId) -> Highlight {
        self.selection.highlight(id)
    }

    /// Entry shown in the detail panel
    #[must_use]
    pub fn focused_entry(&self) -> Option<&HistoryEntry> {
        self.selection.focused().and_then(|id| self.store.get(id))
    }

    /// Underlying store
    #[inline]
    #[must_use]
    pub fn store(&self) -> &HistoryStore {
        &self.store
    }

    /// Configuration in use
    #[inline]
    #[must_use]
    pub fn config(&self) -> &EngineConfig {
        self.builder.config()
    }

    /// Event sink
    #[inline]
    #[must_use]
    pub fn sink(&self) -> &S {
        &self.sink
    }

    /// Consume the engine, returning the store
    #[must_use]
    pub fn into_store(self) -> HistoryStore {
        self.store
    }

    fn rebuild(&mut self) {
        let filtered = filter::apply(self.store.all(), &self.criteria);
        let snapshot = self.builder.build(&filtered, self.store.latest());
        self.sink.publish(&EngineEvent::SnapshotRebuilt(snapshot.stats()));
        self.snapshot = Arc::new(snapshot);
    }
}

fn dedup(ids: &[EntryId]) -> Vec<EntryId> {
    let mut out: Vec<EntryId> = Vec::with_capacity(ids.len());
    for id in ids {
        if !out.contains(id) {
            out.push(id.clone());
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entry::Action;
    use crate::filter::ActionFilter;
    use crate::graph::{EdgeKind, NodeKind};

    fn seeded() -> (VersionGraphEngine<Vec<EngineEvent>>, EntryId, EntryId, EntryId) {
        let mut engine = VersionGraphEngine::with_sink(EngineConfig::default(), Vec::new());
        let a = engine.record_event(HistoryEntryInput::new(Action::Created).with_modifier("ann"));
        let b = engine.record_event(
            HistoryEntryInput::new(Action::Modified)
                .with_parent(a.clone())
                .with_modifier("ben"),
        );
        let c = engine.record_event(
            HistoryEntryInput::new(Action::Modified)
                .with_parent(a.clone())
                .with_modifier("cat"),
        );
        (engine, a, b, c)
    }

    #[test]
    fn recording_rebuilds_snapshot() {
        let (engine, _, _, c) = seeded();
        let snapshot = engine.snapshot();
        assert_eq!(snapshot.stats().entry_nodes, 3);
        let current = snapshot.edges_of_kind(EdgeKind::Current).next().unwrap();
        assert_eq!(current.source, c);
    }

    #[test]
    fn old_snapshot_survives_rebuild() {
        let (mut engine, a, _, _) = seeded();
        let before = engine.snapshot();
        engine.record_event(HistoryEntryInput::new(Action::Star).with_parent(a));
        assert_eq!(before.stats().entry_nodes, 3);
        assert_eq!(engine.snapshot().stats().entry_nodes, 4);
    }

    #[test]
    fn merge_mode_round_trip() {
        let (mut engine, _, b, c) = seeded();
        engine.toggle_merge_mode();
        engine.select_node(&b, false);
        engine.select_node(&c, false);
        assert!(engine.can_confirm_merge());

        let merged = engine.confirm_merge().unwrap();
        assert_eq!(engine.selection().mode, SelectionMode::Browsing);
        assert!(engine.selection().merge_candidates.is_empty());

        let snapshot = engine.snapshot();
        let incoming: Vec<_> = snapshot
            .edges_into(&merged.id)
            .filter(|e| e.kind == EdgeKind::Merge)
            .map(|e| e.source.clone())
            .collect();
        assert_eq!(incoming, vec![b, c]);
        assert!(matches!(
            engine.sink().last(),
            Some(EngineEvent::SnapshotRebuilt(_))
        ));
    }

    #[test]
    fn failed_confirm_keeps_selection_and_store() {
        let (mut engine, _, b, _) = seeded();
        engine.toggle_merge_mode();
        engine.select_node(&b, false);
        let before = engine.snapshot();

        let err = engine.confirm_merge().unwrap_err();
        assert_eq!(err, ValidationError::TooFewCandidates { found: 1 });
        assert_eq!(engine.store().len(), 3);
        assert_eq!(engine.selection().mode, SelectionMode::MergeSelecting);
        assert_eq!(engine.selection().merge_candidates.len(), 1);
        assert!(Arc::ptr_eq(&before, &engine.snapshot()));
        assert!(matches!(
            engine.sink().last(),
            Some(EngineEvent::MergeRejected(_))
        ));
    }

    #[test]
    fn focus_publishes_version_focused() {
        let (mut engine, a, _, _) = seeded();
        engine.select_node(&a, false);
        assert_eq!(engine.focused_entry().unwrap().id, a);
        assert_eq!(engine.sink().last(), Some(&EngineEvent::VersionFocused(a)));
    }

    #[test]
    fn clicking_current_state_node_is_ignored() {
        let (mut engine, _, _, _) = seeded();
        let current = engine.snapshot().current_node().unwrap().id.clone();
        assert!(engine.select_node(&current, false).is_none());
        assert!(engine.selection().focused.is_none());
    }

    #[test]
    fn entry_sharing_configured_current_id_is_not_selectable() {
        let config = EngineConfig {
            current_node_id: "A".to_string(),
            ..EngineConfig::default()
        };
        let mut engine = VersionGraphEngine::new(config);
        engine.append_entry(HistoryEntry::new("A", Action::Created, Utc::now()));
        engine.append_entry(HistoryEntry::new("B", Action::Created, Utc::now()));

        assert!(engine.select_node(&EntryId::from("A"), false).is_none());
        let snapshot = engine.snapshot();
        assert_eq!(snapshot.nodes.iter().filter(|n| n.id.as_str() == "A").count(), 1);
        assert_eq!(snapshot.current_node().unwrap().id.as_str(), "A");
    }

    #[test]
    fn filter_hides_entries_but_keeps_anchor() {
        let (mut engine, _, _, c) = seeded();
        engine.set_filter(FilterCriteria::all().with_action(ActionFilter::Only(Action::Created)));

        let snapshot = engine.snapshot();
        assert_eq!(snapshot.node(&c).unwrap().kind, NodeKind::Backfill);
        assert_eq!(snapshot.stats().entry_nodes, 2);
        assert_eq!(snapshot.stats().lineage_edges, 0);
    }

    #[test]
    fn request_merge_reports_deduplicated_sources() {
        let (mut engine, _, b, c) = seeded();
        let merged = engine.request_merge(&[b.clone(), c.clone(), b.clone()]).unwrap();
        let completed = engine
            .sink()
            .iter()
            .find_map(|e| match e {
                EngineEvent::MergeCompleted { merged, sources } => {
                    Some((merged.clone(), sources.clone()))
                }
                _ => None,
            })
            .unwrap();
        assert_eq!(completed, (merged.id, vec![b, c]));
    }

    #[test]
    #[should_panic(expected = "history invariant violated")]
    fn recording_with_unknown_parent_panics() {
        let mut engine = VersionGraphEngine::new(EngineConfig::default());
        engine.record_event(HistoryEntryInput::new(Action::Modified).with_parent("ghost"));
    }
}
