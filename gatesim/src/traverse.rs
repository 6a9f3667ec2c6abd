//! Node identification, sink discovery and external slot allocation.
//!
//! Numbering walks the successor graph depth-first from each root in root order, handing out ids
//! from one counter that carries on across roots. A node that already has an id is not visited
//! again, so a node reached from two roots is numbered once. External input slots are then handed
//! out in id order, which fixes the order callers supply values in: root order, then depth-first
//! pre-order over successors, each node's slots in one contiguous run.

use std::collections::{HashMap, HashSet};
use std::ops::Range;

use log::{debug, trace};
use petgraph::graph::NodeIndex;

use crate::error::{Error, Result};
use crate::gate::Gate;
use crate::limits::Limits;
use crate::netlist::Netlist;

/// Traversal ids for every node reachable from a set of roots.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Numbering {
    ids: HashMap<NodeIndex, usize>,
    order: Vec<NodeIndex>,
}

impl Numbering {
    /// The traversal id of `node`, if it was reached.
    #[must_use]
    pub fn id(&self, node: NodeIndex) -> Option<usize> {
        self.ids.get(&node).copied()
    }

    /// Returns true if `node` was reached.
    #[must_use]
    pub fn contains(&self, node: NodeIndex) -> bool {
        self.ids.contains_key(&node)
    }

    /// Reached nodes, indexed by traversal id.
    #[must_use]
    pub fn order(&self) -> &[NodeIndex] {
        &self.order
    }

    /// Number of reached nodes.
    #[must_use]
    pub fn len(&self) -> usize {
        self.order.len()
    }

    /// Returns true if nothing was reached.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }
}

/// A node on the numbering stack and how far through its successors the walk has got.
struct Frame {
    node: NodeIndex,
    successors: Vec<NodeIndex>,
    next: usize,
}

/// Number every node reachable from `roots`.
///
/// The walk keeps its own stack, so graph depth is bounded only by memory.
///
/// # Errors
///
/// - [`Error::UnknownNode`] if a root is not in `netlist`.
/// - [`Error::Cycle`] if a successor cycle is reachable.
/// - [`Error::NodeLimitExceeded`] if more than `limits.max_nodes` nodes are reachable.
pub fn number(netlist: &Netlist, roots: &[NodeIndex], limits: Limits) -> Result<Numbering> {
    fn enter(
        netlist: &Netlist,
        node: NodeIndex,
        limits: Limits,
        numbering: &mut Numbering,
        on_stack: &mut HashSet<NodeIndex>,
        stack: &mut Vec<Frame>,
    ) -> Result<()> {
        if numbering.len() >= limits.max_nodes {
            return Err(Error::NodeLimitExceeded { limit: limits.max_nodes });
        }

        let id = numbering.len();
        numbering.ids.insert(node, id);
        numbering.order.push(node);
        on_stack.insert(node);
        trace!("node {} is #{}", node.index(), id);

        stack.push(Frame {
            node,
            successors: netlist.successors(node),
            next: 0,
        });
        Ok(())
    }

    let mut numbering = Numbering::default();
    let mut on_stack = HashSet::new();
    let mut stack = Vec::new();

    for &root in roots {
        if !netlist.contains(root) {
            return Err(Error::UnknownNode { node: root });
        }
        if numbering.contains(root) {
            continue;
        }
        enter(netlist, root, limits, &mut numbering, &mut on_stack, &mut stack)?;

        while let Some(frame) = stack.last_mut() {
            let Some(&successor) = frame.successors.get(frame.next) else {
                on_stack.remove(&frame.node);
                stack.pop();
                continue;
            };
            frame.next += 1;

            if on_stack.contains(&successor) {
                return Err(Error::Cycle { node: successor });
            }
            if numbering.contains(successor) {
                continue;
            }
            enter(netlist, successor, limits, &mut numbering, &mut on_stack, &mut stack)?;
        }
    }

    Ok(numbering)
}

/// The numbered nodes with no successors, in order of first discovery.
#[must_use]
pub fn sinks(netlist: &Netlist, numbering: &Numbering) -> Vec<NodeIndex> {
    numbering
        .order()
        .iter()
        .copied()
        .filter(|&node| netlist.is_sink(node))
        .collect()
}

/// How one numbered node gets its operands.
#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) struct Plan {
    pub node: NodeIndex,
    pub gate: Gate,
    /// First external slot owned by this node.
    pub offset: usize,
    /// Number of external slots owned by this node.
    pub direct: usize,
    /// Traversal ids of the predecessors, in operand order.
    pub predecessors: Vec<usize>,
}

/// Everything evaluation needs to know about a netlist seen from a set of roots.
///
/// A layout is a snapshot: it does not borrow the netlist, and goes stale as soon as the netlist
/// or the root set changes.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Layout {
    numbering: Numbering,
    pub(crate) plans: Vec<Plan>,
    pub(crate) sinks: Vec<usize>,
    required: usize,
}

impl Layout {
    /// Number the netlist from `roots`, find its sinks and allocate external slots.
    ///
    /// # Errors
    ///
    /// - [`Error::EmptyCircuit`] if `roots` is empty or reaches no sink.
    /// - [`Error::UngatedNode`] if a reached node has no gate.
    /// - [`Error::Arity`] if a reached node has more predecessors than its gate takes.
    /// - [`Error::UnrootedPredecessor`] if a reached node is fed by a node no root reaches.
    /// - Anything [`number`] raises.
    pub fn build(netlist: &Netlist, roots: &[NodeIndex], limits: Limits) -> Result<Self> {
        if roots.is_empty() {
            return Err(Error::EmptyCircuit);
        }

        let numbering = number(netlist, roots, limits)?;

        let mut cursor = 0;
        let mut plans = Vec::with_capacity(numbering.len());
        for &node in numbering.order() {
            let gate = netlist.gate(node)?.ok_or(Error::UngatedNode { node })?;

            let predecessors = netlist
                .predecessors(node)
                .into_iter()
                .map(|predecessor| {
                    numbering
                        .id(predecessor)
                        .ok_or(Error::UnrootedPredecessor { node, predecessor })
                })
                .collect::<Result<Vec<_>>>()?;

            let direct = gate.arity().checked_sub(predecessors.len()).ok_or(Error::Arity {
                gate,
                expected: gate.arity(),
                found: predecessors.len(),
            })?;

            plans.push(Plan {
                node,
                gate,
                offset: cursor,
                direct,
                predecessors,
            });
            cursor += direct;
        }

        let sinks = sinks(netlist, &numbering)
            .into_iter()
            .filter_map(|node| numbering.id(node))
            .collect::<Vec<_>>();

        if sinks.is_empty() {
            return Err(Error::EmptyCircuit);
        }

        debug!(
            "laid out {} node(s) from {} root(s): {} sink(s), {} external input(s)",
            numbering.len(),
            roots.len(),
            sinks.len(),
            cursor
        );

        Ok(Self {
            numbering,
            plans,
            sinks,
            required: cursor,
        })
    }

    /// The traversal numbering this layout was built from.
    #[must_use]
    pub const fn numbering(&self) -> &Numbering {
        &self.numbering
    }

    /// The circuit's outputs, in the order evaluation reports them.
    #[must_use]
    pub fn sinks(&self) -> Vec<NodeIndex> {
        self.sinks.iter().map(|&id| self.plans[id].node).collect()
    }

    /// Total number of external inputs the circuit consumes.
    #[must_use]
    pub const fn required_input_count(&self) -> usize {
        self.required
    }

    /// The positions in the external input vector read by `node`.
    #[must_use]
    pub fn slots(&self, node: NodeIndex) -> Option<Range<usize>> {
        let plan = &self.plans[self.numbering.id(node)?];
        Some(plan.offset..plan.offset + plan.direct)
    }
}

#[cfg(test)]
mod tests {
    use super::{number, sinks, Layout};
    use crate::error::Error;
    use crate::gate::Gate;
    use crate::limits::Limits;
    use crate::netlist::{Netlist, Node};

    #[test]
    fn numbering_continues_across_roots() {
        let mut netlist = Netlist::new();

        let root_a = netlist.add_gate(Gate::Not);
        let root_b = netlist.add_gate(Gate::Not);
        let node_and = netlist.add_gate(Gate::And);
        let node_out = netlist.add_gate(Gate::Buffer);

        netlist.connect(root_a, node_and).expect("nodes to exist");
        netlist.connect(root_b, node_and).expect("nodes to exist");
        netlist.connect(node_and, node_out).expect("nodes to exist");

        let numbering = number(&netlist, &[root_a, root_b], Limits::default()).expect("graph to be a DAG");

        // The shared AND and its fan-out are numbered under root A and skipped under root B.
        assert_eq!(numbering.order(), &[root_a, node_and, node_out, root_b]);
        assert_eq!(numbering.id(root_b), Some(3));
        assert_eq!(numbering.id(node_out), Some(2));
    }

    #[test]
    fn numbering_follows_successor_order() {
        let mut netlist = Netlist::new();

        let root = netlist.add_gate(Gate::Buffer);
        let node_x = netlist.add_gate(Gate::Not);
        let node_y = netlist.add_gate(Gate::Not);
        let node_z = netlist.add_gate(Gate::Not);

        netlist.connect(root, node_y).expect("nodes to exist");
        netlist.connect(root, node_x).expect("nodes to exist");
        netlist.connect(node_y, node_z).expect("nodes to exist");

        let numbering = number(&netlist, &[root], Limits::default()).expect("graph to be a DAG");
        assert_eq!(numbering.order(), &[root, node_y, node_z, node_x]);
    }

    #[test]
    fn cycle_is_detected() {
        let mut netlist = Netlist::new();

        let node_a = netlist.add_gate(Gate::Buffer);
        let node_b = netlist.add_gate(Gate::Not);
        let node_c = netlist.add_gate(Gate::Not);

        netlist.connect(node_a, node_b).expect("nodes to exist");
        netlist.connect(node_b, node_c).expect("nodes to exist");
        netlist.connect(node_c, node_b).expect("nodes to exist");

        assert_eq!(
            number(&netlist, &[node_a], Limits::default()),
            Err(Error::Cycle { node: node_b })
        );
    }

    #[test]
    fn self_loop_is_a_cycle() {
        let mut netlist = Netlist::new();
        let node = netlist.add_gate(Gate::Or);
        netlist.connect(node, node).expect("node to exist");

        assert_eq!(number(&netlist, &[node], Limits::default()), Err(Error::Cycle { node }));
    }

    #[test]
    fn diamond_is_not_a_cycle() {
        let mut netlist = Netlist::new();

        let root = netlist.add_gate(Gate::Buffer);
        let node_l = netlist.add_gate(Gate::Not);
        let node_r = netlist.add_gate(Gate::Buffer);
        let node_join = netlist.add_gate(Gate::Xor);

        netlist.connect(root, node_l).expect("nodes to exist");
        netlist.connect(root, node_r).expect("nodes to exist");
        netlist.connect(node_l, node_join).expect("nodes to exist");
        netlist.connect(node_r, node_join).expect("nodes to exist");

        let numbering = number(&netlist, &[root], Limits::default()).expect("diamond to be a DAG");
        assert_eq!(numbering.order(), &[root, node_l, node_join, node_r]);
        assert_eq!(sinks(&netlist, &numbering), vec![node_join]);
    }

    #[test]
    fn sinks_in_discovery_order() {
        let mut netlist = Netlist::new();

        let root_a = netlist.add_gate(Gate::Buffer);
        let root_b = netlist.add_gate(Gate::Buffer);
        let node_p = netlist.add_gate(Gate::Not);
        let node_q = netlist.add_gate(Gate::Not);
        let node_r = netlist.add_gate(Gate::Not);

        netlist.connect(root_b, node_p).expect("nodes to exist");
        netlist.connect(root_a, node_q).expect("nodes to exist");
        netlist.connect(root_a, node_p).expect("nodes to exist");
        netlist.connect(root_b, node_r).expect("nodes to exist");

        let numbering = number(&netlist, &[root_a, root_b], Limits::default()).expect("graph to be a DAG");
        assert_eq!(sinks(&netlist, &numbering), vec![node_q, node_p, node_r]);
    }

    #[test]
    fn long_chain_is_numbered() {
        let mut netlist = Netlist::new();

        let root = netlist.add_gate(Gate::Buffer);
        let mut tail = root;
        for _ in 0..20_000 {
            let next = netlist.add_gate(Gate::Not);
            netlist.connect(tail, next).expect("nodes to exist");
            tail = next;
        }

        let numbering = number(&netlist, &[root], Limits::default()).expect("chain to be a DAG");
        assert_eq!(numbering.len(), 20_001);
        assert!(!numbering.is_empty());
        assert_eq!(numbering.id(tail), Some(20_000));
        assert_eq!(sinks(&netlist, &numbering), vec![tail]);
    }

    #[test]
    fn node_limit() {
        let mut netlist = Netlist::new();

        let root = netlist.add_gate(Gate::Buffer);
        let mut tail = root;
        for _ in 0..10 {
            let next = netlist.add_gate(Gate::Not);
            netlist.connect(tail, next).expect("nodes to exist");
            tail = next;
        }

        assert!(number(&netlist, &[root], Limits::nodes(11)).is_ok());
        assert_eq!(
            number(&netlist, &[root], Limits::nodes(10)),
            Err(Error::NodeLimitExceeded { limit: 10 })
        );
    }

    #[test]
    fn layout_allocates_slots_in_id_order() {
        let mut netlist = Netlist::new();

        let node_a = netlist.add_gate(Gate::Not);
        let node_b = netlist.add_gate(Gate::And);
        let node_c = netlist.add_gate(Gate::Or);

        netlist.connect(node_a, node_b).expect("nodes to exist");
        netlist.connect(node_c, node_b).expect("nodes to exist");

        let layout = Layout::build(&netlist, &[node_a, node_c], Limits::default()).expect("layout to succeed");

        assert_eq!(layout.numbering().order(), &[node_a, node_b, node_c]);
        assert_eq!(layout.required_input_count(), 3);
        assert_eq!(layout.slots(node_a), Some(0..1));
        assert_eq!(layout.slots(node_b), Some(1..1));
        assert_eq!(layout.slots(node_c), Some(1..3));
        assert_eq!(layout.sinks(), vec![node_b]);
    }

    #[test]
    fn layout_rejects_bad_nodes() {
        let mut netlist = Netlist::new();

        let node_a = netlist.add_gate(Gate::Not);
        let node_b = netlist.add_node(Node::ungated());
        netlist.connect(node_a, node_b).expect("nodes to exist");

        assert_eq!(
            Layout::build(&netlist, &[node_a], Limits::default()),
            Err(Error::UngatedNode { node: node_b })
        );

        netlist.set_gate(node_b, Some(Gate::Not)).expect("node to exist");
        let node_c = netlist.add_gate(Gate::Buffer);
        netlist.connect(node_c, node_b).expect("nodes to exist");

        assert_eq!(
            Layout::build(&netlist, &[node_a, node_c], Limits::default()),
            Err(Error::Arity { gate: Gate::Not, expected: 1, found: 2 })
        );
        assert_eq!(
            Layout::build(&netlist, &[node_a], Limits::default()),
            Err(Error::UnrootedPredecessor { node: node_b, predecessor: node_c })
        );
        assert_eq!(Layout::build(&netlist, &[], Limits::default()), Err(Error::EmptyCircuit));
    }
}
