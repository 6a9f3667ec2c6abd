//! Errors raised while building and evaluating a circuit.

use petgraph::graph::NodeIndex;
use thiserror::Error;

use crate::gate::Gate;

/// Convenience alias used throughout the crate.
pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Everything that can abort an evaluation.
///
/// Errors are raised at the point of detection and propagate to the caller;
/// no partial results are ever returned.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum Error {
    /// A gate was handed the wrong number of operands, or a node has more
    /// predecessors than its gate accepts.
    #[error("{gate} gate expects {expected} operand(s), found {found}")]
    Arity {
        /// The offending gate.
        gate: Gate,
        /// The gate's arity.
        expected: usize,
        /// The number of operands supplied.
        found: usize,
    },

    /// The external input vector does not match the circuit's requirement.
    #[error("circuit requires {expected} external input(s), found {found}")]
    InputCount {
        /// Number of external slots in the circuit.
        expected: usize,
        /// Number of values supplied.
        found: usize,
    },

    /// A successor cycle is reachable from the roots.
    #[error("cycle detected through node {}", .node.index())]
    Cycle {
        /// The node that was reached while still on the traversal stack.
        node: NodeIndex,
    },

    /// A node in the evaluated graph has no gate assigned.
    #[error("node {} has no gate", .node.index())]
    UngatedNode {
        /// The gate-less node.
        node: NodeIndex,
    },

    /// The circuit has no roots, or its roots reach no sink.
    #[error("circuit has no outputs to evaluate")]
    EmptyCircuit,

    /// A node handle does not refer to a node in the netlist.
    #[error("node {} does not exist", .node.index())]
    UnknownNode {
        /// The dangling handle.
        node: NodeIndex,
    },

    /// A reachable node is fed by a node that no root reaches.
    #[error("node {} is fed by node {}, which no root reaches", .node.index(), .predecessor.index())]
    UnrootedPredecessor {
        /// The reachable node.
        node: NodeIndex,
        /// Its unreachable predecessor.
        predecessor: NodeIndex,
    },

    /// More nodes are reachable than the configured limit.
    #[error("maximum nodes exceeded ({limit})")]
    NodeLimitExceeded {
        /// The configured node limit.
        limit: usize,
    },
}
