//! The node arena: gate nodes joined by ordered edges.

use std::fmt;

use itertools::Itertools;
use log::trace;
use petgraph::{prelude::*, stable_graph::StableGraph, visit::EdgeRef};

use crate::error::{Error, Result};
use crate::gate::Gate;

/// A netlist vertex.
///
/// A node is identified by its [`NodeIndex`] in the owning [`Netlist`], never by value. It may be
/// created without a gate while a circuit is under construction, but evaluating it is an error.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Node {
    gate: Option<Gate>,
}

impl Node {
    /// A node performing `gate`.
    #[must_use]
    pub const fn new(gate: Gate) -> Self {
        Self { gate: Some(gate) }
    }

    /// A node with no gate yet.
    #[must_use]
    pub const fn ungated() -> Self {
        Self { gate: None }
    }

    /// The gate this node performs, if assigned.
    #[must_use]
    pub const fn gate(&self) -> Option<Gate> {
        self.gate
    }
}

impl From<Gate> for Node {
    fn from(gate: Gate) -> Self {
        Self::new(gate)
    }
}

impl fmt::Display for Node {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.gate {
            Some(gate) => write!(f, "{} node", gate),
            None => f.write_str("gate-less node"),
        }
    }
}

/// An edge from a node to one of its successors.
///
/// The ordinal records when the edge was made; sorting a node's edges by it recovers connection
/// order, which petgraph's adjacency lists do not preserve.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord)]
struct Link {
    ordinal: u64,
}

/// An arena of gate nodes joined by non-owning, ordered edges.
///
/// Edges are stored once and read in both directions: an edge `a -> b` makes `b` a successor of
/// `a` and `a` a predecessor of `b`. Successor order is traversal order; predecessor order is
/// operand order.
///
/// Every mutation bumps [`Netlist::generation`], which is how a [`crate::Circuit`] knows its cached
/// numbering has gone stale.
#[derive(Clone, Debug, Default)]
pub struct Netlist {
    graph: StableGraph<Node, Link, Directed>,
    next_ordinal: u64,
    generation: u64,
}

impl Netlist {
    /// Create an empty netlist.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a node and return its handle.
    pub fn add_node(&mut self, node: Node) -> NodeIndex {
        let index = self.graph.add_node(node);
        self.generation += 1;
        trace!("added {} {}", node, index.index());
        index
    }

    /// Add a node performing `gate`.
    pub fn add_gate(&mut self, gate: Gate) -> NodeIndex {
        self.add_node(Node::new(gate))
    }

    /// Returns true if `node` is a node of this netlist.
    #[must_use]
    pub fn contains(&self, node: NodeIndex) -> bool {
        self.graph.contains_node(node)
    }

    /// Look up a node.
    ///
    /// # Errors
    ///
    /// Returns [`Error::UnknownNode`] if `node` is not in this netlist.
    pub fn node(&self, node: NodeIndex) -> Result<&Node> {
        self.graph.node_weight(node).ok_or(Error::UnknownNode { node })
    }

    /// The gate performed by `node`, if it has one.
    ///
    /// # Errors
    ///
    /// Returns [`Error::UnknownNode`] if `node` is not in this netlist.
    pub fn gate(&self, node: NodeIndex) -> Result<Option<Gate>> {
        self.node(node).map(Node::gate)
    }

    /// Assign or clear the gate of `node`, returning the previous gate.
    ///
    /// # Errors
    ///
    /// Returns [`Error::UnknownNode`] if `node` is not in this netlist.
    pub fn set_gate(&mut self, node: NodeIndex, gate: Option<Gate>) -> Result<Option<Gate>> {
        let weight = self.graph.node_weight_mut(node).ok_or(Error::UnknownNode { node })?;
        let previous = std::mem::replace(&mut weight.gate, gate);
        self.generation += 1;
        Ok(previous)
    }

    /// Make `to` a successor of `from` (and `from` a predecessor of `to`).
    ///
    /// The new edge goes to the end of both `from`'s successor list and `to`'s predecessor list.
    /// Connecting the same pair twice feeds `from` into two operand positions of `to`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::UnknownNode`] if either node is not in this netlist.
    pub fn connect(&mut self, from: NodeIndex, to: NodeIndex) -> Result<EdgeIndex> {
        for node in [from, to] {
            if !self.contains(node) {
                return Err(Error::UnknownNode { node });
            }
        }

        let link = Link { ordinal: self.next_ordinal };
        self.next_ordinal += 1;
        self.generation += 1;
        trace!("connected {} -> {}", from.index(), to.index());
        Ok(self.graph.add_edge(from, to, link))
    }

    /// Remove the most recently made edge from `from` to `to`.
    ///
    /// Returns whether an edge was removed.
    ///
    /// # Errors
    ///
    /// Returns [`Error::UnknownNode`] if either node is not in this netlist.
    pub fn disconnect(&mut self, from: NodeIndex, to: NodeIndex) -> Result<bool> {
        for node in [from, to] {
            if !self.contains(node) {
                return Err(Error::UnknownNode { node });
            }
        }

        let newest = self
            .graph
            .edges_directed(from, Outgoing)
            .filter(|edge| edge.target() == to)
            .max_by_key(|edge| *edge.weight())
            .map(|edge| edge.id());

        match newest {
            Some(edge) => {
                self.graph.remove_edge(edge);
                self.generation += 1;
                trace!("disconnected {} -> {}", from.index(), to.index());
                Ok(true)
            },
            None => Ok(false),
        }
    }

    /// The nodes `node` feeds, in connection order. Empty for an unknown node.
    #[must_use]
    pub fn successors(&self, node: NodeIndex) -> Vec<NodeIndex> {
        self.ordered_neighbours(node, Outgoing)
    }

    /// The nodes feeding `node`, in connection (operand) order. Empty for an unknown node.
    #[must_use]
    pub fn predecessors(&self, node: NodeIndex) -> Vec<NodeIndex> {
        self.ordered_neighbours(node, Incoming)
    }

    /// Returns true if `node` feeds nothing.
    #[must_use]
    pub fn is_sink(&self, node: NodeIndex) -> bool {
        self.graph.edges_directed(node, Outgoing).next().is_none()
    }

    /// Number of nodes in the arena, reachable or not.
    #[must_use]
    pub fn node_count(&self) -> usize {
        self.graph.node_count()
    }

    /// Number of edges in the arena.
    #[must_use]
    pub fn edge_count(&self) -> usize {
        self.graph.edge_count()
    }

    /// A counter that changes whenever the netlist is mutated.
    #[must_use]
    pub const fn generation(&self) -> u64 {
        self.generation
    }

    fn ordered_neighbours(&self, node: NodeIndex, direction: Direction) -> Vec<NodeIndex> {
        if !self.contains(node) {
            return Vec::new();
        }

        self.graph
            .edges_directed(node, direction)
            .sorted_by_key(|edge| *edge.weight())
            .map(|edge| match direction {
                Outgoing => edge.target(),
                Incoming => edge.source(),
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::{Netlist, Node};
    use crate::error::Error;
    use crate::gate::Gate;

    #[test]
    fn connection_order_is_preserved() {
        let mut netlist = Netlist::new();

        let node_source = netlist.add_gate(Gate::Buffer);
        let node_a = netlist.add_gate(Gate::Not);
        let node_b = netlist.add_gate(Gate::Not);
        let node_c = netlist.add_gate(Gate::Not);

        netlist.connect(node_source, node_b).expect("nodes to exist");
        netlist.connect(node_source, node_c).expect("nodes to exist");
        netlist.connect(node_source, node_a).expect("nodes to exist");

        assert_eq!(netlist.successors(node_source), vec![node_b, node_c, node_a]);
        assert_eq!(netlist.node_count(), 4);
        assert_eq!(netlist.edge_count(), 3);
        assert_eq!(netlist.predecessors(node_a), vec![node_source]);
        assert!(netlist.is_sink(node_a));
        assert!(!netlist.is_sink(node_source));
    }

    #[test]
    fn predecessor_order_is_operand_order() {
        let mut netlist = Netlist::new();

        let node_x = netlist.add_gate(Gate::Buffer);
        let node_y = netlist.add_gate(Gate::Buffer);
        let node_and = netlist.add_gate(Gate::And);

        netlist.connect(node_y, node_and).expect("nodes to exist");
        netlist.connect(node_x, node_and).expect("nodes to exist");

        assert_eq!(netlist.predecessors(node_and), vec![node_y, node_x]);
    }

    #[test]
    fn disconnect_removes_newest_parallel_edge() {
        let mut netlist = Netlist::new();

        let node_x = netlist.add_gate(Gate::Buffer);
        let node_y = netlist.add_gate(Gate::Buffer);
        let node_and = netlist.add_gate(Gate::And);

        netlist.connect(node_x, node_and).expect("nodes to exist");
        netlist.connect(node_y, node_and).expect("nodes to exist");
        netlist.connect(node_x, node_and).expect("nodes to exist");

        assert_eq!(netlist.disconnect(node_x, node_and), Ok(true));
        assert_eq!(netlist.predecessors(node_and), vec![node_x, node_y]);

        assert_eq!(netlist.disconnect(node_x, node_and), Ok(true));
        assert_eq!(netlist.predecessors(node_and), vec![node_y]);

        assert_eq!(netlist.disconnect(node_x, node_and), Ok(false));
    }

    #[test]
    fn mutations_bump_generation() {
        let mut netlist = Netlist::new();
        let start = netlist.generation();

        let node_a = netlist.add_node(Node::ungated());
        let node_b = netlist.add_gate(Gate::Not);
        let after_add = netlist.generation();
        assert!(after_add > start);

        netlist.connect(node_a, node_b).expect("nodes to exist");
        let after_connect = netlist.generation();
        assert!(after_connect > after_add);

        assert_eq!(netlist.set_gate(node_a, Some(Gate::Buffer)), Ok(None));
        let after_set = netlist.generation();
        assert!(after_set > after_connect);

        netlist.disconnect(node_a, node_b).expect("nodes to exist");
        assert!(netlist.generation() > after_set);

        // Reads leave it alone.
        let before_read = netlist.generation();
        let _ = netlist.successors(node_a);
        let _ = netlist.gate(node_b);
        assert_eq!(netlist.generation(), before_read);
    }

    #[test]
    fn unknown_nodes_are_rejected() {
        let mut netlist = Netlist::new();
        let node_a = netlist.add_gate(Gate::Not);

        let mut other = Netlist::new();
        other.add_gate(Gate::Not);
        other.add_gate(Gate::Not);
        let stranger = other.add_gate(Gate::Not);

        assert_eq!(netlist.connect(node_a, stranger), Err(Error::UnknownNode { node: stranger }));
        assert_eq!(netlist.gate(stranger), Err(Error::UnknownNode { node: stranger }));
        assert!(netlist.successors(stranger).is_empty());
        assert_eq!(netlist.edge_count(), 0);
    }

    #[test]
    fn node_display() {
        assert_eq!(Node::new(Gate::Nand).to_string(), "NAND node");
        assert_eq!(Node::ungated().to_string(), "gate-less node");
    }
}
