//! Selection state machine
//!
//! Two modes:
//! - `Browsing` (initial): a plain click focuses one node and clears the
//!   multi-selection; a click with the multi-select modifier toggles
//!   membership without touching focus.
//! - `MergeSelecting`: every click toggles merge-candidate membership and
//!   the detail focus is suppressed.
//!
//! Leaving merge mode (cancel or a completed merge) clears the candidates.

use crate::entry::EntryId;
use indexmap::IndexSet;
use serde::Serialize;

/// Controller mode
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum SelectionMode {
    /// Focus and multi-select
    #[default]
    Browsing,
    /// Picking versions to merge
    MergeSelecting,
}

/// How the surface should highlight a node
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum Highlight {
    /// Not selected
    None,
    /// Drives the detail panel
    Focused,
    /// Member of the multi-selection
    MultiSelected,
    /// Picked for merging
    MergeCandidate,
}

/// Result of a click
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SelectionOutcome {
    /// Node became the sole focus
    Focused(EntryId),
    /// Multi-selection membership toggled
    MultiToggled {
        /// Clicked node
        id: EntryId,
        /// Membership after the click
        selected: bool,
    },
    /// Merge-candidate membership toggled
    CandidateToggled {
        /// Clicked node
        id: EntryId,
        /// Membership after the click
        selected: bool,
    },
}

/// Published selection state
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SelectionState {
    /// Current mode
    pub mode: SelectionMode,
    /// Node driving the detail panel
    pub focused: Option<EntryId>,
    /// Multi-selection, in click order
    pub multi_selected: IndexSet<EntryId>,
    /// Merge candidates, in click order
    pub merge_candidates: IndexSet<EntryId>,
}

/// Tracks focus, multi-select and merge mode
#[derive(Debug, Clone, Default)]
pub struct SelectionController {
    state: SelectionState,
}

fn toggle(set: &mut IndexSet<EntryId>, id: &EntryId) -> bool {
    if set.shift_remove(id) {
        false
    } else {
        set.insert(id.clone());
        true
    }
}

impl SelectionController {
    /// Controller in `Browsing` with nothing selected
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Current state
    #[inline]
    #[must_use]
    pub fn state(&self) -> &SelectionState {
        &self.state
    }

    /// Current mode
    #[inline]
    #[must_use]
    pub fn mode(&self) -> SelectionMode {
        self.state.mode
    }

    /// Focused node
    #[inline]
    #[must_use]
    pub fn focused(&self) -> Option<&EntryId> {
        self.state.focused.as_ref()
    }

    /// Merge candidates in click order
    #[inline]
    #[must_use]
    pub fn merge_candidates(&self) -> &IndexSet<EntryId> {
        &self.state.merge_candidates
    }

    /// Multi-selection in click order
    #[inline]
    #[must_use]
    pub fn multi_selected(&self) -> &IndexSet<EntryId> {
        &self.state.multi_selected
    }

    /// Handle a node click
    pub fn select_node(&mut self, id: &EntryId, modifier_held: bool) -> SelectionOutcome {
        match self.state.mode {
            SelectionMode::MergeSelecting => {
                let selected = toggle(&mut self.state.merge_candidates, id);
                SelectionOutcome::CandidateToggled {
                    id: id.clone(),
                    selected,
                }
            }
            SelectionMode::Browsing if modifier_held => {
                let selected = toggle(&mut self.state.multi_selected, id);
                SelectionOutcome::MultiToggled {
                    id: id.clone(),
                    selected,
                }
            }
            SelectionMode::Browsing => {
                self.state.multi_selected.clear();
                self.state.focused = Some(id.clone());
                SelectionOutcome::Focused(id.clone())
            }
        }
    }

    /// Enter merge mode from browsing, or cancel it
    ///
    /// Returns the mode after the toggle.
    pub fn toggle_merge_mode(&mut self) -> SelectionMode {
        match self.state.mode {
            SelectionMode::Browsing => {
                self.state.mode = SelectionMode::MergeSelecting;
                self.state.focused = None;
            }
            SelectionMode::MergeSelecting => self.cancel_merge(),
        }
        self.state.mode
    }

    /// Leave merge mode without merging
    pub fn cancel_merge(&mut self) {
        self.state.merge_candidates.clear();
        self.state.mode = SelectionMode::Browsing;
    }

    /// Leave merge mode after a successful merge
    pub fn finish_merge(&mut self) {
        self.cancel_merge();
    }

    /// Whether the confirm affordance should be enabled
    #[inline]
    #[must_use]
    pub fn can_confirm(&self) -> bool {
        self.state.mode == SelectionMode::MergeSelecting
            && self.state.merge_candidates.len() >= 2
    }

    /// Highlight for a node
    #[must_use]
    pub fn highlight(&self, id: &EntryId) -> Highlight {
        if self.state.merge_candidates.contains(id) {
            Highlight::MergeCandidate
        } else if self.state.focused.as_ref() == Some(id) {
            Highlight::Focused
        } else if self.state.multi_selected.contains(id) {
            Highlight::MultiSelected
        } else {
            Highlight::None
        }
    }

    /// Drop every selected id for which `known` is false
    pub fn retain_known(&mut self, known: impl Fn(&EntryId) -> bool) {
        if self.state.focused.as_ref().is_some_and(|id| !known(id)) {
            self.state.focused = None;
        }
        self.state.multi_selected.retain(|id| known(id));
        self.state.merge_candidates.retain(|id| known(id));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn id(s: &str) -> EntryId {
        EntryId::from(s)
    }

    #[test]
    fn starts_browsing_and_empty() {
        let ctl = SelectionController::new();
        assert_eq!(ctl.mode(), SelectionMode::Browsing);
        assert!(ctl.focused().is_none());
        assert!(!ctl.can_confirm());
    }

    #[test]
    fn plain_click_focuses_and_clears_multi() {
        let mut ctl = SelectionController::new();
        ctl.select_node(&id("a"), true);
        ctl.select_node(&id("b"), true);
        assert_eq!(ctl.multi_selected().len(), 2);

        let outcome = ctl.select_node(&id("c"), false);
        assert_eq!(outcome, SelectionOutcome::Focused(id("c")));
        assert_eq!(ctl.focused(), Some(&id("c")));
        assert!(ctl.multi_selected().is_empty());
    }

    #[test]
    fn modifier_click_toggles_without_changing_focus() {
        let mut ctl = SelectionController::new();
        ctl.select_node(&id("a"), false);

        assert_eq!(
            ctl.select_node(&id("b"), true),
            SelectionOutcome::MultiToggled { id: id("b"), selected: true }
        );
        assert_eq!(
            ctl.select_node(&id("b"), true),
            SelectionOutcome::MultiToggled { id: id("b"), selected: false }
        );
        assert_eq!(ctl.focused(), Some(&id("a")));
    }

    #[test]
    fn merge_mode_toggles_candidates_without_modifier() {
        let mut ctl = SelectionController::new();
        ctl.select_node(&id("a"), false);
        assert_eq!(ctl.toggle_merge_mode(), SelectionMode::MergeSelecting);
        assert!(ctl.focused().is_none());

        ctl.select_node(&id("x"), false);
        ctl.select_node(&id("y"), true);
        assert!(ctl.can_confirm());
        assert!(ctl.focused().is_none());

        ctl.select_node(&id("x"), false);
        assert_eq!(ctl.merge_candidates().len(), 1);
        assert!(!ctl.can_confirm());
    }

    #[test]
    fn cancel_clears_candidates_and_returns_to_browsing() {
        let mut ctl = SelectionController::new();
        ctl.toggle_merge_mode();
        ctl.select_node(&id("x"), false);
        ctl.cancel_merge();

        assert_eq!(ctl.mode(), SelectionMode::Browsing);
        assert!(ctl.merge_candidates().is_empty());
    }

    #[test]
    fn toggling_twice_cancels() {
        let mut ctl = SelectionController::new();
        ctl.toggle_merge_mode();
        ctl.select_node(&id("x"), false);
        assert_eq!(ctl.toggle_merge_mode(), SelectionMode::Browsing);
        assert!(ctl.merge_candidates().is_empty());
    }

    #[test]
    fn candidates_keep_click_order() {
        let mut ctl = SelectionController::new();
        ctl.toggle_merge_mode();
        for s in ["c", "a", "b"] {
            ctl.select_node(&id(s), false);
        }
        let order: Vec<_> = ctl.merge_candidates().iter().map(EntryId::as_str).collect();
        assert_eq!(order, vec!["c", "a", "b"]);
    }

    #[test]
    fn highlight_priorities() {
        let mut ctl = SelectionController::new();
        ctl.select_node(&id("f"), false);
        ctl.select_node(&id("m"), true);
        assert_eq!(ctl.highlight(&id("f")), Highlight::Focused);
        assert_eq!(ctl.highlight(&id("m")), Highlight::MultiSelected);
        assert_eq!(ctl.highlight(&id("z")), Highlight::None);

        ctl.toggle_merge_mode();
        ctl.select_node(&id("m"), false);
        assert_eq!(ctl.highlight(&id("m")), Highlight::MergeCandidate);
    }

    #[test]
    fn retain_known_drops_stale_ids() {
        let mut ctl = SelectionController::new();
        ctl.select_node(&id("gone"), false);
        ctl.select_node(&id("keep"), true);
        ctl.retain_known(|i| i.as_str() == "keep");

        assert!(ctl.focused().is_none());
        assert_eq!(ctl.multi_selected().len(), 1);
    }
}
