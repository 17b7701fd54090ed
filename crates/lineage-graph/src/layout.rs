//! Forest layout
//!
//! Positions are assigned per node from its level and subtree. Two
//! strategies are provided:
//!
//! - [`CenteredLayout`]: each tree starts at `root_index * root_spacing`,
//!   child `i` is offset by `i * child_spacing` from its parent's offset and a
//!   parent sits at the mean of its children. Cheap, but sibling subtrees of
//!   different widths can overlap.
//! - [`TidyLayout`]: leaves take consecutive slots across the whole forest,
//!   so nodes on the same level never collide.
//!
//! Positions are only a starting point; the surface lets users drag nodes.

use crate::config::{LayoutConfig, LayoutKind};
use crate::graph::Forest;
use serde::Serialize;

/// 2-D position
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct Position {
    /// Horizontal
    pub x: f64,
    /// Vertical, grows downward with level
    pub y: f64,
}

impl Position {
    /// New position
    #[inline]
    #[must_use]
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

/// Assigns a position to every forest index
pub trait LayoutStrategy: Send + Sync {
    /// Positions indexed like the forest
    fn layout(&self, forest: &Forest<'_>, config: &LayoutConfig) -> Vec<Position>;

    /// Strategy name, for logs
    fn name(&self) -> &'static str;
}

/// Strategy for a configured [`LayoutKind`]
#[must_use]
pub fn strategy_for(kind: LayoutKind) -> Box<dyn LayoutStrategy> {
    match kind {
        LayoutKind::Centered => Box::new(CenteredLayout),
        LayoutKind::Tidy => Box::new(TidyLayout),
    }
}

#[allow(clippy::cast_precision_loss)]
fn as_f64(n: usize) -> f64 {
    n as f64
}

fn y_for(forest: &Forest<'_>, idx: usize, config: &LayoutConfig) -> f64 {
    as_f64(forest.level(idx)) * config.level_spacing
}

#[derive(Debug, Clone, Copy)]
enum Step {
    Enter(usize),
    Exit(usize),
}

/// Pre- and post-order visits of the tree under `root`
///
/// Uses an explicit stack so arbitrarily deep histories are fine. Children
/// are entered left to right and every child exits before its parent.
fn walk(forest: &Forest<'_>, root: usize, mut visit: impl FnMut(Step)) {
    let mut stack = vec![Step::Enter(root)];
    while let Some(step) = stack.pop() {
        if let Step::Enter(idx) = step {
            stack.push(Step::Exit(idx));
            stack.extend(forest.children(idx).iter().rev().map(|&c| Step::Enter(c)));
        }
        visit(step);
    }
}

fn mean_child_x(children: &[usize], out: &[Position]) -> f64 {
    let sum: f64 = children.iter().map(|&c| out[c].x).sum();
    sum / as_f64(children.len())
}

/// Bottom-up centring without collision avoidance
#[derive(Debug, Clone, Copy, Default)]
pub struct CenteredLayout;

impl LayoutStrategy for CenteredLayout {
    fn layout(&self, forest: &Forest<'_>, config: &LayoutConfig) -> Vec<Position> {
        let mut out = vec![Position::default(); forest.len()];
        let mut offsets = vec![0.0; forest.len()];
        for (root_index, &root) in forest.roots().iter().enumerate() {
            offsets[root] = as_f64(root_index) * config.root_spacing;
            walk(forest, root, |step| match step {
                Step::Enter(idx) => {
                    for (i, &child) in forest.children(idx).iter().enumerate() {
                        offsets[child] = offsets[idx] + as_f64(i) * config.child_spacing;
                    }
                }
                Step::Exit(idx) => {
                    let children = forest.children(idx);
                    let x = if children.is_empty() {
                        offsets[idx]
                    } else {
                        mean_child_x(children, &out)
                    };
                    out[idx] = Position::new(x, y_for(forest, idx, config));
                }
            });
        }
        out
    }

    fn name(&self) -> &'static str {
        "centered"
    }
}

/// Leaf-slot layout; same-level nodes are at least `child_spacing` apart
#[derive(Debug, Clone, Copy, Default)]
pub struct TidyLayout;

impl LayoutStrategy for TidyLayout {
    fn layout(&self, forest: &Forest<'_>, config: &LayoutConfig) -> Vec<Position> {
        let mut out = vec![Position::default(); forest.len()];
        let tree_gap = (config.root_spacing - config.child_spacing).max(0.0);
        let mut cursor = 0.0;
        for (root_index, &root) in forest.roots().iter().enumerate() {
            if root_index > 0 {
                cursor += tree_gap;
            }
            walk(forest, root, |step| {
                let Step::Exit(idx) = step else { return };
                let children = forest.children(idx);
                let x = if children.is_empty() {
                    let slot = cursor;
                    cursor += config.child_spacing;
                    slot
                } else {
                    mean_child_x(children, &out)
                };
                out[idx] = Position::new(x, y_for(forest, idx, config));
            });
        }
        out
    }

    fn name(&self) -> &'static str {
        "tidy"
    }
}

/// Position and width of the current-state node
///
/// One level below `max_level`, centred across the horizontal span of
/// `positions`.
#[must_use]
pub fn current_state_position(
    positions: &[Position],
    max_level: usize,
    config: &LayoutConfig,
) -> (Position, f64) {
    let y = as_f64(max_level + 1) * config.level_spacing;
    let (min_x, max_x) = positions
        .iter()
        .fold(None, |acc: Option<(f64, f64)>, p| match acc {
            None => Some((p.x, p.x)),
            Some((lo, hi)) => Some((lo.min(p.x), hi.max(p.x))),
        })
        .unwrap_or((0.0, 0.0));
    (Position::new((min_x + max_x) / 2.0, y), max_x - min_x)
}
