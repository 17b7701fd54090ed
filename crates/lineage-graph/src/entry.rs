//! History entries
//!
//! A [`HistoryEntry`] is one recorded change to a rubric. Entries are
//! immutable once appended to a [`crate::HistoryStore`]; the optional
//! `parent_id` is the only declared lineage.

use crate::error::LineageError;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Unique, never-reused entry identifier
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EntryId(String);

impl EntryId {
    /// Fresh random id
    #[must_use]
    pub fn generate() -> Self {
        Self(uuid::Uuid::new_v4().to_string())
    }

    /// Borrow as string slice
    #[inline]
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// First eight characters, for labels
    #[must_use]
    pub fn short(&self) -> &str {
        match self.0.char_indices().nth(8) {
            Some((idx, _)) => &self.0[..idx],
            None => &self.0,
        }
    }
}

impl fmt::Display for EntryId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for EntryId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

impl From<String> for EntryId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

/// Kind of change an entry records
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Action {
    /// Rubric first created
    Created,
    /// A field changed
    Modified,
    /// Synthesised from two or more versions
    Merged,
    /// Version starred
    Star,
    /// Star removed
    Unstared,
}

impl Action {
    /// All actions, in display order
    pub const ALL: [Action; 5] = [
        Action::Created,
        Action::Modified,
        Action::Merged,
        Action::Star,
        Action::Unstared,
    ];

    /// Wire name
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Action::Created => "created",
            Action::Modified => "modified",
            Action::Merged => "merged",
            Action::Star => "star",
            Action::Unstared => "unstared",
        }
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Action {
    type Err = LineageError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Action::ALL
            .into_iter()
            .find(|a| a.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| LineageError::UnknownAction(s.to_string()))
    }
}

/// One recorded change to the rubric
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoryEntry {
    /// Unique id
    pub id: EntryId,
    /// Creation time
    pub timestamp: DateTime<Utc>,
    /// Free-text actor name
    #[serde(default)]
    pub modifier: String,
    /// What happened
    pub action: Action,
    /// Changed field
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub field: Option<String>,
    /// Value before the change
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub old_value: Option<String>,
    /// Value after the change
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub new_value: Option<String>,
    /// Free-text comment
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub comment: Option<String>,
    /// Display-only version label
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
    /// Declared lineage
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent_id: Option<EntryId>,
    /// Annotation
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,
    /// Annotation describing the change relative to the parent
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub difference_summary: Option<String>,
}

impl HistoryEntry {
    /// Entry with only the required fields set
    #[must_use]
    pub fn new(id: impl Into<EntryId>, action: Action, timestamp: DateTime<Utc>) -> Self {
        Self {
            id: id.into(),
            timestamp,
            modifier: String::new(),
            action,
            field: None,
            old_value: None,
            new_value: None,
            comment: None,
            version: None,
            parent_id: None,
            summary: None,
            difference_summary: None,
        }
    }

    /// With parent
    #[inline]
    #[must_use]
    pub fn with_parent(mut self, parent: impl Into<EntryId>) -> Self {
        self.parent_id = Some(parent.into());
        self
    }

    /// With modifier
    #[inline]
    #[must_use]
    pub fn with_modifier(mut self, modifier: impl Into<String>) -> Self {
        self.modifier = modifier.into();
        self
    }

    /// With changed field and values
    #[must_use]
    pub fn with_change(
        mut self,
        field: impl Into<String>,
        old_value: Option<String>,
        new_value: Option<String>,
    ) -> Self {
        self.field = Some(field.into());
        self.old_value = old_value;
        self.new_value = new_value;
        self
    }

    /// With comment
    #[inline]
    #[must_use]
    pub fn with_comment(mut self, comment: impl Into<String>) -> Self {
        self.comment = Some(comment.into());
        self
    }

    /// With version label
    #[inline]
    #[must_use]
    pub fn with_version(mut self, version: impl Into<String>) -> Self {
        self.version = Some(version.into());
        self
    }

    /// With summary
    #[inline]
    #[must_use]
    pub fn with_summary(mut self, summary: impl Into<String>) -> Self {
        self.summary = Some(summary.into());
        self
    }

    /// Whether this entry is a lineage root
    #[inline]
    #[must_use]
    pub fn is_root(&self) -> bool {
        self.parent_id.is_none()
    }

    /// Version label, falling back to the short id
    #[must_use]
    pub fn label(&self) -> &str {
        self.version.as_deref().unwrap_or_else(|| self.id.short())
    }

    /// Numeric reading of the version label
    ///
    /// Accepts an optional `v`/`V` prefix followed by a decimal number
    /// (`"v3"`, `"2.1"`, `"v4-draft"`). Returns `None` when no number leads
    /// the label.
    #[must_use]
    pub fn version_number(&self) -> Option<f64> {
        let label = self.version.as_deref()?.trim();
        let digits = label
            .strip_prefix('v')
            .or_else(|| label.strip_prefix('V'))
            .unwrap_or(label);

        let mut end = 0;
        let mut seen_dot = false;
        for (idx, ch) in digits.char_indices() {
            if ch.is_ascii_digit() {
                end = idx + 1;
            } else if ch == '.' && !seen_dot {
                seen_dot = true;
            } else {
                break;
            }
        }
        if end == 0 {
            return None;
        }
        digits[..end].parse().ok()
    }
}

/// Inbound `recordEvent` payload
///
/// The engine assigns `id` and `timestamp` on record.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoryEntryInput {
    /// Free-text actor name
    #[serde(default)]
    pub modifier: String,
    /// What happened
    pub action: Option<Action>,
    /// Changed field
    #[serde(default)]
    pub field: Option<String>,
    /// Value before the change
    #[serde(default)]
    pub old_value: Option<String>,
    /// Value after the change
    #[serde(default)]
    pub new_value: Option<String>,
    /// Free-text comment
    #[serde(default)]
    pub comment: Option<String>,
    /// Display-only version label
    #[serde(default)]
    pub version: Option<String>,
    /// Declared lineage
    #[serde(default)]
    pub parent_id: Option<EntryId>,
    /// Annotation
    #[serde(default)]
    pub summary: Option<String>,
    /// Annotation describing the change relative to the parent
    #[serde(default)]
    pub difference_summary: Option<String>,
}

impl HistoryEntryInput {
    /// Input for the given action
    #[must_use]
    pub fn new(action: Action) -> Self {
        Self {
            action: Some(action),
            ..Self::default()
        }
    }

    /// With parent
    #[inline]
    #[must_use]
    pub fn with_parent(mut self, parent: impl Into<EntryId>) -> Self {
        self.parent_id = Some(parent.into());
        self
    }

    /// With modifier
    #[inline]
    #[must_use]
    pub fn with_modifier(mut self, modifier: impl Into<String>) -> Self {
        self.modifier = modifier.into();
        self
    }

    /// With comment
    #[inline]
    #[must_use]
    pub fn with_comment(mut self, comment: impl Into<String>) -> Self {
        self.comment = Some(comment.into());
        self
    }

    /// Materialise into an entry; a missing action defaults to `modified`
    #[must_use]
    pub fn into_entry(self, id: EntryId, timestamp: DateTime<Utc>) -> HistoryEntry {
        HistoryEntry {
            id,
            timestamp,
            modifier: self.modifier,
            action: self.action.unwrap_or(Action::Modified),
            field: self.field,
            old_value: self.old_value,
            new_value: self.new_value,
            comment: self.comment,
            version: self.version,
            parent_id: self.parent_id,
            summary: self.summary,
            difference_summary: self.difference_summary,
        }
    }
}
