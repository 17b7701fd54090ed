//! Subcommand implementations
//!
//! History files are JSON arrays of entries in append order.

use anyhow::{Context, Result};
use lineage_graph::{
    Action, EngineConfig, EntryId, FilterCriteria, GraphSnapshot, HistoryEntry, HistoryStore,
    NullSink, SnapshotStats, VersionGraphEngine,
};
use serde::Serialize;
use std::fs;
use std::path::Path;
use std::sync::Arc;

pub(crate) fn load_history(path: &Path) -> Result<HistoryStore> {
    let text = fs::read_to_string(path)
        .with_context(|| format!("reading history from {}", path.display()))?;
    let entries: Vec<HistoryEntry> = serde_json::from_str(&text)
        .with_context(|| format!("parsing history in {}", path.display()))?;
    let store = HistoryStore::from_entries(entries)
        .with_context(|| format!("loading history from {}", path.display()))?;
    tracing::debug!(entries = store.len(), path = %path.display(), "history loaded");
    Ok(store)
}

pub(crate) fn save_history(path: &Path, store: &HistoryStore) -> Result<()> {
    let text = serde_json::to_string_pretty(&store.to_vec())?;
    fs::write(path, text).with_context(|| format!("writing history to {}", path.display()))?;
    Ok(())
}

pub(crate) fn load_config(path: Option<&Path>) -> Result<EngineConfig> {
    match path {
        Some(p) => EngineConfig::from_path(p)
            .with_context(|| format!("loading config from {}", p.display())),
        None => Ok(EngineConfig::default()),
    }
}

pub(crate) fn render(
    store: HistoryStore,
    config: EngineConfig,
    criteria: FilterCriteria,
) -> Arc<GraphSnapshot> {
    let mut engine = VersionGraphEngine::from_store(store, config, NullSink);
    if !criteria.is_passthrough() {
        engine.set_filter(criteria);
    }
    engine.snapshot()
}

pub(crate) fn merge(
    store: HistoryStore,
    config: EngineConfig,
    ids: &[String],
) -> Result<(HistoryStore, HistoryEntry)> {
    let ids: Vec<EntryId> = ids.iter().map(|s| EntryId::from(s.as_str())).collect();
    let mut engine = VersionGraphEngine::from_store(store, config, NullSink);
    let merged = engine.request_merge(&ids).context("merge rejected")?;
    Ok((engine.into_store(), merged))
}

/// Summary printed by `lineage stats`
#[derive(Debug, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub(crate) struct HistoryStats {
    pub(crate) entries: usize,
    pub(crate) roots: usize,
    pub(crate) merges: usize,
    pub(crate) latest: Option<EntryId>,
    pub(crate) graph: SnapshotStats,
}

pub(crate) fn stats(store: HistoryStore, config: EngineConfig) -> HistoryStats {
    let entries = store.len();
    let roots = store.roots().count();
    let merges = store.all().filter(|e| e.action == Action::Merged).count();
    let latest = store.latest().map(|e| e.id.clone());
    let graph = render(store, config, FilterCriteria::all()).stats();
    HistoryStats {
        entries,
        roots,
        merges,
        latest,
        graph,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lineage_graph::{ActionFilter, EdgeKind, LayoutKind, ValidationError};
    use lineage_test_utils::three_entry_store;
    use tempfile::TempDir;

    fn write_store(dir: &TempDir, store: &HistoryStore) -> std::path::PathBuf {
        let path = dir.path().join("history.json");
        save_history(&path, store).unwrap();
        path
    }

    #[test]
    fn history_file_round_trips() {
        let dir = TempDir::new().unwrap();
        let path = write_store(&dir, &three_entry_store());
        let loaded = load_history(&path).unwrap();
        assert_eq!(loaded.to_vec(), three_entry_store().to_vec());
    }

    #[test]
    fn forward_reference_fails_to_load() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("history.json");
        fs::write(
            &path,
            r#"[{"id":"b","timestamp":"2024-01-01T00:00:00Z","action":"modified","parentId":"a"}]"#,
        )
        .unwrap();
        let err = load_history(&path).unwrap_err();
        assert!(format!("{err:#}").contains("unknown parent"));
    }

    #[test]
    fn render_applies_filter() {
        let snapshot = render(
            three_entry_store(),
            EngineConfig::default(),
            FilterCriteria::all().with_action(ActionFilter::Only(Action::Created)),
        );
        assert_eq!(snapshot.stats().entry_nodes, 2);
        assert_eq!(snapshot.stats().backfill_nodes, 1);
        assert_eq!(snapshot.edges_of_kind(EdgeKind::Current).count(), 1);
    }

    #[test]
    fn merge_appends_and_persists() {
        let dir = TempDir::new().unwrap();
        let (store, merged) = merge(
            three_entry_store(),
            EngineConfig::default().with_merge_modifier("cli"),
            &["B".to_string(), "C".to_string()],
        )
        .unwrap();
        assert_eq!(merged.modifier, "cli");

        let path = write_store(&dir, &store);
        let reloaded = load_history(&path).unwrap();
        assert_eq!(reloaded.len(), 4);
        assert_eq!(reloaded.latest().unwrap().id, merged.id);
    }

    #[test]
    fn merge_of_one_id_is_rejected() {
        let err = merge(three_entry_store(), EngineConfig::default(), &["B".to_string()])
            .unwrap_err();
        assert_eq!(
            err.downcast_ref::<ValidationError>(),
            Some(&ValidationError::TooFewCandidates { found: 1 })
        );
    }

    #[test]
    fn stats_counts_roots_and_merges() {
        let (store, _) = merge(
            three_entry_store(),
            EngineConfig::default(),
            &["B".to_string(), "C".to_string()],
        )
        .unwrap();
        let summary = stats(store, EngineConfig::default());
        assert_eq!(summary.entries, 4);
        assert_eq!(summary.roots, 2);
        assert_eq!(summary.merges, 1);
        assert_eq!(summary.graph.merge_edges, 2);
    }

    #[test]
    fn config_file_is_optional() {
        assert_eq!(load_config(None).unwrap(), EngineConfig::default());

        let dir = TempDir::new().unwrap();
        let path = dir.path().join("lineage.toml");
        fs::write(&path, "[layout]\nkind = \"tidy\"\n").unwrap();
        let config = load_config(Some(&path)).unwrap();
        assert_eq!(config.layout.kind, LayoutKind::Tidy);
    }
}
