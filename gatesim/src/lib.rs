//! Evaluation of combinational boolean circuits built from simple gates.
//!
//! A circuit is a directed acyclic graph of nodes, each performing one [`Gate`]. Edges run from a
//! node to the nodes it feeds. A [`Circuit`] is evaluated from an ordered set of root nodes: every
//! node a root reaches takes part, and the reachable nodes that feed nothing (the sinks) are the
//! circuit's outputs.
//!
//! Gate operands that are not fed by a predecessor are external inputs, supplied by the caller as
//! one flat vector. The order of that vector is fixed by the graph's shape:
//!
//! - Reachable nodes are numbered depth-first, visiting roots in order and each node's successors
//!   in connection order. A node reached from several roots is numbered once, on first contact.
//! - Each node owns `arity - predecessors` consecutive external slots, handed out in number order.
//! - A node's operands are its external slots first, then its predecessors' results in connection
//!   order.
//!
//! Evaluation is demand-driven: each sink asks its predecessors for their values, transitively, and
//! every node is evaluated at most once per call however many sinks depend on it.
//!
//! ```
//! use gatesim::{Circuit, Gate, Netlist};
//!
//! // NOT feeding one operand of an AND.
//! let mut netlist = Netlist::new();
//! let a = netlist.add_gate(Gate::Not);
//! let b = netlist.add_gate(Gate::And);
//! netlist.connect(a, b).unwrap();
//!
//! let mut circuit = Circuit::new(netlist, [a]).unwrap();
//! assert_eq!(circuit.required_input_count().unwrap(), 2);
//!
//! // A reads the first input; B reads the second, then A's result.
//! assert_eq!(circuit.evaluate(&[true, false]).unwrap(), vec![false]);
//! assert_eq!(circuit.evaluate(&[false, true]).unwrap(), vec![true]);
//! ```

#![forbid(unsafe_code)]
#![warn(clippy::pedantic, clippy::nursery)]
#![warn(missing_docs)]

pub mod circuit;
pub mod error;
pub mod eval;
pub mod gate;
pub mod limits;
pub mod netlist;
pub mod traverse;

pub use circuit::Circuit;
pub use error::{Error, Result};
pub use eval::{Step, Trace};
pub use gate::{Gate, ParseGateError};
pub use limits::Limits;
pub use netlist::{Netlist, Node};
pub use petgraph::graph::NodeIndex;
pub use traverse::{Layout, Numbering};
