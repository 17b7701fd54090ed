//! Error types for the lineage graph
//!
//! Two families of failure exist:
//! - [`LineageError`]: the history itself is malformed (unknown parent,
//!   duplicate id). Inside the engine these are invariant violations and
//!   panic; hosts loading external files get them as values.
//! - [`ValidationError`]: a user request that cannot be honoured (merging
//!   fewer than two versions). Always recoverable, never mutates state.

use crate::entry::EntryId;

/// Structural errors in a history sequence
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum LineageError {
    /// Entry declares a parent that is not in the store yet
    #[error("entry '{id}' references unknown parent '{parent}'")]
    UnknownParent {
        /// Offending entry
        id: EntryId,
        /// Missing parent id
        parent: EntryId,
    },

    /// Entry id already present
    #[error("duplicate entry id '{0}'")]
    DuplicateId(EntryId),

    /// Entry id is reserved for the synthetic current-state node
    #[error("entry id '{0}' is reserved for the current-state node")]
    ReservedId(EntryId),

    /// Entry id not found
    #[error("entry not found: {0}")]
    NotFound(EntryId),

    /// Unrecognised action name
    #[error("unknown action '{0}'")]
    UnknownAction(String),
}

/// User-facing merge validation failures
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    /// Merge needs two or more distinct versions
    #[error("at least two versions required (got {found})")]
    TooFewCandidates {
        /// Number of distinct candidates supplied
        found: usize,
    },

    /// Candidate id is not in the store
    #[error("version '{0}' does not exist")]
    UnknownEntry(EntryId),
}

/// Configuration loading failures
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Config file could not be read
    #[error("failed to read config: {0}")]
    Io(#[from] std::io::Error),

    /// Config text is not valid TOML for [`crate::EngineConfig`]
    #[error("invalid config: {0}")]
    Parse(#[from] toml::de::Error),

    /// A value is outside its allowed range
    #[error("invalid value for '{field}': {reason}")]
    InvalidValue {
        /// Field name
        field: &'static str,
        /// Why it was rejected
        reason: String,
    },
}
