//! Rubric Version Graph
//!
//! Reconstructs a branching version graph from a flat, append-only rubric
//! change history and drives the interactions around it.
//!
//! # Core Concepts
//!
//! - [`HistoryStore`]: Append-only, insertion-ordered log of [`HistoryEntry`]
//! - [`FilterCriteria`]: Search and action filter applied before building
//! - [`GraphBuilder`]: Forest assembly, lineage and merge edges, current-state anchor
//! - [`LayoutStrategy`]: Per-node positions ([`CenteredLayout`], [`TidyLayout`])
//! - [`SelectionController`]: Focus, multi-select and merge mode
//! - [`MergeOperation`]: Validated synthesis of `merged` entries
//! - [`VersionGraphEngine`]: Wires the pipeline and publishes [`GraphSnapshot`]s
//!
//! # Example
//!
//! ```rust
//! use lineage_graph::{Action, EngineConfig, HistoryEntryInput, VersionGraphEngine};
//!
//! let mut engine = VersionGraphEngine::new(EngineConfig::default());
//! let root = engine.record_event(HistoryEntryInput::new(Action::Created));
//! let a = engine.record_event(HistoryEntryInput::new(Action::Modified).with_parent(root.clone()));
//! let b = engine.record_event(HistoryEntryInput::new(Action::Modified).with_parent(root));
//!
//! let merged = engine.request_merge(&[a, b]).unwrap();
//! assert_eq!(engine.snapshot().edges_into(&merged.id).count(), 2);
//! ```

#![warn(unreachable_pub)]
#![warn(missing_docs)]

pub mod config;
pub mod engine;
pub mod entry;
pub mod error;
pub mod events;
pub mod filter;
pub mod graph;
pub mod layout;
pub mod merge;
pub mod selection;
pub mod store;
pub mod style;

pub use config::{EngineConfig, LayoutConfig, LayoutKind, DEFAULT_CURRENT_NODE_ID};
pub use engine::VersionGraphEngine;
pub use entry::{Action, EntryId, HistoryEntry, HistoryEntryInput};
pub use error::{ConfigError, LineageError, ValidationError};
pub use events::{EngineEvent, EventSink, NullSink};
pub use filter::{ActionFilter, FilterCriteria};
pub use graph::{
    build, DisplayFields, EdgeKind, Forest, GraphBuilder, GraphEdge, GraphNode, GraphSnapshot,
    NodeKind, SnapshotStats,
};
pub use layout::{CenteredLayout, LayoutStrategy, Position, TidyLayout};
pub use merge::MergeOperation;
pub use selection::{
    Highlight, SelectionController, SelectionMode, SelectionOutcome, SelectionState,
};
pub use store::HistoryStore;
pub use style::{EdgeStyle, NodeStyle, Shape, Stroke};

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
