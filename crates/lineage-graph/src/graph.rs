//! Graph construction
//!
//! Turns an ordered entry sequence into a [`GraphSnapshot`]:
//!
//! 1. Tree assembly into a [`Forest`] (declared lineage only)
//! 2. Levels from forest depth, positions from a [`LayoutStrategy`]
//! 3. Lineage edges `parent -> child`
//! 4. Merge edges `leaf -> merge entry`, reconstructed from leaf sets
//! 5. One synthetic current-state node fed by the latest entry
//!
//! Building is pure: entries are never aliased or mutated and every call
//! produces a fresh snapshot.

use crate::config::EngineConfig;
use crate::entry::{Action, EntryId, HistoryEntry};
use crate::layout::{self, LayoutStrategy, Position};
use crate::style::{self, EdgeStyle, NodeStyle};
use chrono::{DateTime, Utc};
use indexmap::IndexSet;
use petgraph::algo::toposort;
use petgraph::graphmap::DiGraphMap;
use petgraph::Direction;
use serde::Serialize;
use std::borrow::Cow;
use std::collections::HashMap;
use std::fmt;

/// Declared-lineage forest over an entry sequence
///
/// Entries whose parent is absent from the sequence are treated as roots.
/// Indices follow input order; an optional backfill entry is appended last
/// and is always a root.
#[derive(Debug)]
pub struct Forest<'a> {
    entries: Vec<&'a HistoryEntry>,
    lineage: DiGraphMap<usize, ()>,
    children: Vec<Vec<usize>>,
    roots: Vec<usize>,
    levels: Vec<usize>,
    backfill: Option<usize>,
}

impl<'a> Forest<'a> {
    /// Assemble the forest for `entries`
    #[must_use]
    pub fn assemble(entries: &'a [HistoryEntry]) -> Self {
        Self::assemble_with_backfill(entries, None)
    }

    /// Assemble, adding `backfill` as an extra root when it is not already
    /// part of `entries`
    #[must_use]
    pub fn assemble_with_backfill(
        entries: &'a [HistoryEntry],
        backfill: Option<&'a HistoryEntry>,
    ) -> Self {
        let mut ordered: Vec<&'a HistoryEntry> = Vec::with_capacity(entries.len() + 1);
        let mut index: HashMap<&'a EntryId, usize> = HashMap::with_capacity(entries.len() + 1);

        for entry in entries {
            if index.contains_key(&entry.id) {
                tracing::warn!(id = %entry.id, "duplicate entry id in build input, keeping first");
                continue;
            }
            index.insert(&entry.id, ordered.len());
            ordered.push(entry);
        }

        let mut backfill_idx = None;
        if let Some(extra) = backfill {
            if !index.contains_key(&extra.id) {
                backfill_idx = Some(ordered.len());
                index.insert(&extra.id, ordered.len());
                ordered.push(extra);
            }
        }

        let len = ordered.len();
        let mut lineage = DiGraphMap::with_capacity(len, len);
        for idx in 0..len {
            lineage.add_node(idx);
        }
        for (idx, entry) in ordered.iter().enumerate() {
            if Some(idx) == backfill_idx {
                continue;
            }
            let parent = entry
                .parent_id
                .as_ref()
                .and_then(|p| index.get(p).copied())
                .filter(|&p| p != idx);
            if let Some(p) = parent {
                lineage.add_edge(p, idx, ());
            }
        }

        let order = loop {
            match toposort(&lineage, None) {
                Ok(order) => break order,
                // Input that did not come from a store can carry parent
                // cycles. Cut at the reported member so every entry is placed.
                Err(cycle) => {
                    let member = cycle.node_id();
                    tracing::warn!(
                        id = %ordered[member].id,
                        "parent cycle in build input, treating as root"
                    );
                    let parents: Vec<usize> = lineage
                        .neighbors_directed(member, Direction::Incoming)
                        .collect();
                    for p in parents {
                        lineage.remove_edge(p, member);
                    }
                }
            }
        };

        let mut levels = vec![0; len];
        for &idx in &order {
            if let Some(p) = lineage.neighbors_directed(idx, Direction::Incoming).next() {
                levels[idx] = levels[p] + 1;
            }
        }

        let children = (0..len)
            .map(|idx| {
                let mut kids: Vec<usize> =
                    lineage.neighbors_directed(idx, Direction::Outgoing).collect();
                kids.sort_unstable();
                kids
            })
            .collect();
        let roots = (0..len)
            .filter(|&idx| {
                lineage
                    .neighbors_directed(idx, Direction::Incoming)
                    .next()
                    .is_none()
            })
            .collect();

        Self {
            entries: ordered,
            lineage,
            children,
            roots,
            levels,
            backfill: backfill_idx,
        }
    }

    /// Number of entries, including a backfill
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the forest is empty
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Entry at `idx`
    #[inline]
    #[must_use]
    pub fn entry(&self, idx: usize) -> &'a HistoryEntry {
        self.entries[idx]
    }

    /// Root indices, left to right
    #[inline]
    #[must_use]
    pub fn roots(&self) -> &[usize] {
        &self.roots
    }

    /// Children of `idx`, in input order
    #[inline]
    #[must_use]
    pub fn children(&self, idx: usize) -> &[usize] {
        &self.children[idx]
    }

    /// Parent of `idx` within the forest
    #[inline]
    #[must_use]
    pub fn parent(&self, idx: usize) -> Option<usize> {
        self.lineage
            .neighbors_directed(idx, Direction::Incoming)
            .next()
    }

    /// Depth of `idx`; roots are level 0
    #[inline]
    #[must_use]
    pub fn level(&self, idx: usize) -> usize {
        self.levels[idx]
    }

    /// Deepest level, `None` for an empty forest
    #[must_use]
    pub fn max_level(&self) -> Option<usize> {
        self.levels.iter().copied().max()
    }

    /// Whether `idx` has no children
    #[inline]
    #[must_use]
    pub fn is_leaf(&self, idx: usize) -> bool {
        self.children[idx].is_empty()
    }

    /// Whether `idx` is the backfilled entry
    #[inline]
    #[must_use]
    pub fn is_backfill(&self, idx: usize) -> bool {
        self.backfill == Some(idx)
    }
}

/// What a node stands for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum NodeKind {
    /// A history entry from the input
    Entry,
    /// The latest entry, added because the filter excluded it
    Backfill,
    /// The synthetic "present" marker
    CurrentState,
}

/// What an edge stands for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum EdgeKind {
    /// Declared `parent_id` relation
    Lineage,
    /// Reconstructed multi-parent relation into a merge entry
    Merge,
    /// Pointer from the latest entry to the current-state node
    Current,
}

impl EdgeKind {
    /// Wire name
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            EdgeKind::Lineage => "lineage",
            EdgeKind::Merge => "merge",
            EdgeKind::Current => "current",
        }
    }
}

impl fmt::Display for EdgeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Fields a detail panel shows for a node
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DisplayFields {
    /// Version label or short id
    pub label: String,
    /// Actor
    #[serde(skip_serializing_if = "Option::is_none")]
    pub modifier: Option<String>,
    /// Creation time
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<DateTime<Utc>>,
    /// Changed field
    #[serde(skip_serializing_if = "Option::is_none")]
    pub field: Option<String>,
    /// Comment
    #[serde(skip_serializing_if = "Option::is_none")]
    pub comment: Option<String>,
    /// Summary annotation
    #[serde(skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,
    /// Difference annotation
    #[serde(skip_serializing_if = "Option::is_none")]
    pub difference_summary: Option<String>,
}

impl DisplayFields {
    fn from_entry(entry: &HistoryEntry) -> Self {
        Self {
            label: entry.label().to_string(),
            modifier: Some(entry.modifier.clone()).filter(|m| !m.is_empty()),
            timestamp: Some(entry.timestamp),
            field: entry.field.clone(),
            comment: entry.comment.clone(),
            summary: entry.summary.clone(),
            difference_summary: entry.difference_summary.clone(),
        }
    }
}

/// Visualisation-ready node
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GraphNode {
    /// Entry id, or the configured current-state id
    pub id: EntryId,
    /// Entry, backfill or current state
    pub kind: NodeKind,
    /// Forest depth
    pub level: usize,
    /// Layout position
    pub position: Position,
    /// Horizontal extent; non-zero only for the current-state node
    pub span: f64,
    /// Recorded action, absent on the current-state node
    #[serde(skip_serializing_if = "Option::is_none")]
    pub action: Option<Action>,
    /// Detail panel fields
    pub display: DisplayFields,
    /// Style tag
    pub style: NodeStyle,
}

/// Directed edge
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GraphEdge {
    /// Deterministic id, `"{kind}:{source}->{target}"`
    pub id: String,
    /// Tail
    pub source: EntryId,
    /// Head
    pub target: EntryId,
    /// Lineage, merge or current
    pub kind: EdgeKind,
    /// Style tag
    pub style: EdgeStyle,
}

impl GraphEdge {
    fn new(source: &EntryId, target: &EntryId, kind: EdgeKind, style: EdgeStyle) -> Self {
        Self {
            id: format!("{kind}:{source}->{target}"),
            source: source.clone(),
            target: target.clone(),
            kind,
            style,
        }
    }
}

/// Counts per node and edge kind
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SnapshotStats {
    /// Entry and backfill nodes
    pub entry_nodes: usize,
    /// Backfill nodes
    pub backfill_nodes: usize,
    /// Lineage edges
    pub lineage_edges: usize,
    /// Merge edges
    pub merge_edges: usize,
    /// Current edges
    pub current_edges: usize,
    /// Deepest entry level
    pub max_level: usize,
}

/// Immutable node/edge set handed to the rendering surface
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct GraphSnapshot {
    /// Nodes: entries in input order, then backfill, then current state
    pub nodes: Vec<GraphNode>,
    /// Edges: lineage, then merge, then current
    pub edges: Vec<GraphEdge>,
}

impl GraphSnapshot {
    /// Node by id
    #[must_use]
    pub fn node(&self, id: &EntryId) -> Option<&GraphNode> {
        self.nodes.iter().find(|n| &n.id == id)
    }

    /// The synthetic current-state node
    #[must_use]
    pub fn current_node(&self) -> Option<&GraphNode> {
        self.nodes.iter().find(|n| n.kind == NodeKind::CurrentState)
    }

    /// Edges of one kind
    pub fn edges_of_kind(&self, kind: EdgeKind) -> impl Iterator<Item = &GraphEdge> {
        self.edges.iter().filter(move |e| e.kind == kind)
    }

    /// Edges ending at `id`
    pub fn edges_into<'s>(&'s self, id: &'s EntryId) -> impl Iterator<Item = &'s GraphEdge> {
        self.edges.iter().filter(move |e| &e.target == id)
    }

    /// Whether the snapshot is empty
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Counts per kind
    #[must_use]
    pub fn stats(&self) -> SnapshotStats {
        let mut stats = SnapshotStats::default();
        for node in &self.nodes {
            match node.kind {
                NodeKind::Entry => stats.entry_nodes += 1,
                NodeKind::Backfill => {
                    stats.entry_nodes += 1;
                    stats.backfill_nodes += 1;
                }
                NodeKind::CurrentState => continue,
            }
            stats.max_level = stats.max_level.max(node.level);
        }
        for edge in &self.edges {
            match edge.kind {
                EdgeKind::Lineage => stats.lineage_edges += 1,
                EdgeKind::Merge => stats.merge_edges += 1,
                EdgeKind::Current => stats.current_edges += 1,
            }
        }
        stats
    }
}

/// Builds snapshots with a fixed configuration and layout strategy
pub struct GraphBuilder {
    config: EngineConfig,
    strategy: Box<dyn LayoutStrategy>,
}

impl fmt::Debug for GraphBuilder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GraphBuilder")
            .field("config", &self.config)
            .field("strategy", &self.strategy.name())
            .finish()
    }
}

impl GraphBuilder {
    /// Builder using the strategy named by `config.layout.kind`
    #[must_use]
    pub fn new(config: EngineConfig) -> Self {
        let strategy = layout::strategy_for(config.layout.kind);
        Self { config, strategy }
    }

    /// Builder with an explicit layout strategy
    #[must_use]
    pub fn with_strategy(config: EngineConfig, strategy: Box<dyn LayoutStrategy>) -> Self {
        Self { config, strategy }
    }

    /// Configuration in use
    #[inline]
    #[must_use]
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Build a snapshot of `entries`
    ///
    /// `latest` is the store's most recently appended entry; it anchors the
    /// current-state edge and is backfilled when `entries` does not contain
    /// it.
    ///
    /// Entries whose id equals the configured current-state node id are
    /// left out, so every snapshot id is unique.
    #[must_use]
    pub fn build(&self, entries: &[HistoryEntry], latest: Option<&HistoryEntry>) -> GraphSnapshot {
        let current_id = EntryId::from(self.config.current_node_id.as_str());
        let entries: Cow<'_, [HistoryEntry]> = if entries.iter().any(|e| e.id == current_id) {
            tracing::warn!(
                id = %current_id,
                "entry id collides with the current-state node, hiding it"
            );
            Cow::Owned(entries.iter().filter(|e| e.id != current_id).cloned().collect())
        } else {
            Cow::Borrowed(entries)
        };
        let latest = latest.filter(|e| e.id != current_id);

        let forest = Forest::assemble_with_backfill(&entries, latest);
        if forest.is_empty() {
            return GraphSnapshot::default();
        }

        let layout_config = &self.config.layout;
        let positions = self.strategy.layout(&forest, layout_config);

        let mut nodes: Vec<GraphNode> = (0..forest.len())
            .map(|idx| {
                let entry = forest.entry(idx);
                GraphNode {
                    id: entry.id.clone(),
                    kind: if forest.is_backfill(idx) {
                        NodeKind::Backfill
                    } else {
                        NodeKind::Entry
                    },
                    level: forest.level(idx),
                    position: positions[idx],
                    span: 0.0,
                    action: Some(entry.action),
                    display: DisplayFields::from_entry(entry),
                    style: style::entry_node(entry.action),
                }
            })
            .collect();

        let mut edges = lineage_edges(&forest);
        edges.extend(merge_edges(&forest));

        let max_level = forest.max_level().unwrap_or(0);
        let (position, span) = layout::current_state_position(&positions, max_level, layout_config);
        nodes.push(GraphNode {
            id: current_id.clone(),
            kind: NodeKind::CurrentState,
            level: max_level + 1,
            position,
            span,
            action: None,
            display: DisplayFields {
                label: self.config.current_node_label.clone(),
                ..DisplayFields::default()
            },
            style: style::current_node(),
        });

        if let Some(anchor) = latest {
            edges.push(GraphEdge::new(
                &anchor.id,
                &current_id,
                EdgeKind::Current,
                style::current_edge(),
            ));
        }

        let snapshot = GraphSnapshot { nodes, edges };
        tracing::debug!(
            nodes = snapshot.nodes.len(),
            edges = snapshot.edges.len(),
            strategy = self.strategy.name(),
            "rebuilt version graph"
        );
        snapshot
    }
}

/// Build with a default-configured [`GraphBuilder`]
#[must_use]
pub fn build(entries: &[HistoryEntry], latest: Option<&HistoryEntry>) -> GraphSnapshot {
    GraphBuilder::new(EngineConfig::default()).build(entries, latest)
}

fn lineage_edges(forest: &Forest<'_>) -> Vec<GraphEdge> {
    let mut edges = Vec::new();
    for idx in 0..forest.len() {
        let child = forest.entry(idx);
        match forest.parent(idx) {
            Some(p) => edges.push(GraphEdge::new(
                &forest.entry(p).id,
                &child.id,
                EdgeKind::Lineage,
                style::lineage_edge(child.action),
            )),
            None => {
                let dangling = child.parent_id.as_ref().filter(|_| !forest.is_backfill(idx));
                if let Some(missing) = dangling {
                    tracing::trace!(
                        child = %child.id,
                        parent = %missing,
                        "dropping lineage edge with filtered-out parent"
                    );
                }
            }
        }
    }
    edges
}

/// Merge edges from the leaves that precede each merge entry
///
/// Leaf status is tracked while walking the sequence, so a merge sees the
/// lineage as it stood when it was recorded. Later merges therefore never
/// feed back into earlier ones.
fn merge_edges(forest: &Forest<'_>) -> Vec<GraphEdge> {
    let mut edges = Vec::new();
    let mut leaves: IndexSet<usize> = IndexSet::new();

    for idx in 0..forest.len() {
        let entry = forest.entry(idx);
        if entry.action == Action::Merged {
            if leaves.is_empty() {
                tracing::debug!(id = %entry.id, "merge entry has no preceding leaves");
            }
            edges.extend(leaves.iter().map(|&leaf| {
                GraphEdge::new(
                    &forest.entry(leaf).id,
                    &entry.id,
                    EdgeKind::Merge,
                    style::merge_edge(),
                )
            }));
        }
        if let Some(parent) = forest.parent(idx) {
            leaves.shift_remove(&parent);
        }
        leaves.insert(idx);
    }
    edges
}
