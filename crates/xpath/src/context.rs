//! Per-step evaluation state.

/// The state needed to evaluate an expression against one node.
///
/// A fresh context is created for every step and every predicate candidate;
/// the navigator itself is passed alongside rather than stored, because greedy
/// evaluation needs it mutably while read-only evaluation borrows it shared.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExprContext<N> {
    pub current: N,
    pub greedy: bool,
    /// 1-based position of `current` within the node-set being filtered.
    pub position: usize,
    /// Size of the node-set being filtered. Only computed when a predicate
    /// calls `last()`.
    pub size: Option<usize>,
}

impl<N> ExprContext<N> {
    /// A read-only context for a single node.
    pub fn new(current: N) -> Self {
        Self {
            current,
            greedy: false,
            position: 1,
            size: Some(1),
        }
    }

    /// A greedy context for a node that is the last of `position` candidates.
    pub fn greedy(current: N, position: usize) -> Self {
        Self {
            current,
            greedy: true,
            position,
            size: Some(position),
        }
    }

    pub fn at(current: N, position: usize, size: Option<usize>) -> Self {
        Self {
            current,
            greedy: false,
            position,
            size,
        }
    }

    /// The same position bookkeeping for another node.
    pub fn with_current(self, current: N) -> Self {
        Self { current, ..self }
    }
}

/// Bounds on what greedy evaluation may create.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Limits {
    /// Largest position a positional predicate may materialize, e.g. `b[500]`.
    pub max_position: usize,
}

impl Default for Limits {
    fn default() -> Self {
        Self {
            max_position: 10_000,
        }
    }
}
