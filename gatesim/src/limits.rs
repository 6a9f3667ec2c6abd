//! Caps on how much of a netlist a layout may cover.

/// The largest circuit a [`crate::Circuit`] will lay out.
///
/// Neither traversal recurses, so depth is never bounded; the only cap is on the number of
/// reachable nodes. The default places no cap at all.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Limits {
    /// Maximum number of nodes the roots may reach.
    pub max_nodes: usize,
}

impl Default for Limits {
    fn default() -> Self {
        Self::UNBOUNDED
    }
}

impl Limits {
    /// No cap on reachable nodes.
    pub const UNBOUNDED: Self = Self { max_nodes: usize::MAX };

    /// Reject circuits whose roots reach more than `max_nodes` nodes.
    #[must_use]
    pub const fn nodes(max_nodes: usize) -> Self {
        Self { max_nodes }
    }
}
