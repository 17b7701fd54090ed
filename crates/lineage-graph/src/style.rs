//! Style tags for nodes and edges
//!
//! The rendering surface paints whatever these tags describe; the engine
//! only classifies.

use crate::entry::Action;
use serde::{Deserialize, Serialize};

/// Edge stroke pattern
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Stroke {
    /// Continuous line
    Solid,
    /// Dashed line, used for virtual pointers
    Dashed,
}

/// Node outline shape
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Shape {
    /// Regular version
    Rounded,
    /// Merge result
    Diamond,
    /// Synthetic marker
    Pill,
}

/// Edge style tag
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct EdgeStyle {
    /// Stroke pattern
    pub stroke: Stroke,
    /// CSS colour
    pub color: &'static str,
    /// Stroke width in pixels
    pub width: f32,
    /// Whether the surface should animate the edge
    pub animated: bool,
}

/// Node style tag
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct NodeStyle {
    /// CSS colour
    pub color: &'static str,
    /// Outline shape
    pub shape: Shape,
}

/// Colour associated with an action
#[must_use]
pub fn action_color(action: Action) -> &'static str {
    match action {
        Action::Created => "#22c55e",
        Action::Modified => "#3b82f6",
        Action::Merged => "#a855f7",
        Action::Star => "#eab308",
        Action::Unstared => "#6b7280",
    }
}

/// Style for a lineage edge, keyed by the child's action
#[must_use]
pub fn lineage_edge(target_action: Action) -> EdgeStyle {
    EdgeStyle {
        stroke: Stroke::Solid,
        color: action_color(target_action),
        width: 2.0,
        animated: false,
    }
}

/// Style for a reconstructed merge edge
#[must_use]
pub fn merge_edge() -> EdgeStyle {
    EdgeStyle {
        stroke: Stroke::Solid,
        color: action_color(Action::Merged),
        width: 3.0,
        animated: false,
    }
}

/// Style for the pointer into the current-state node
#[must_use]
pub fn current_edge() -> EdgeStyle {
    EdgeStyle {
        stroke: Stroke::Dashed,
        color: "#94a3b8",
        width: 2.0,
        animated: true,
    }
}

/// Style for an entry node
#[must_use]
pub fn entry_node(action: Action) -> NodeStyle {
    NodeStyle {
        color: action_color(action),
        shape: if action == Action::Merged {
            Shape::Diamond
        } else {
            Shape::Rounded
        },
    }
}

/// Style for the current-state node
#[must_use]
pub fn current_node() -> NodeStyle {
    NodeStyle {
        color: "#94a3b8",
        shape: Shape::Pill,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lineage_color_follows_child_action() {
        assert_eq!(lineage_edge(Action::Star).color, action_color(Action::Star));
        assert_eq!(lineage_edge(Action::Modified).stroke, Stroke::Solid);
    }

    #[test]
    fn current_edge_is_dashed() {
        let style = current_edge();
        assert_eq!(style.stroke, Stroke::Dashed);
        assert!(style.animated);
    }

    #[test]
    fn merged_nodes_are_diamonds() {
        assert_eq!(entry_node(Action::Merged).shape, Shape::Diamond);
        assert_eq!(entry_node(Action::Created).shape, Shape::Rounded);
    }
}
