//! Circuits: a netlist seen from a set of roots.

use log::debug;
use petgraph::prelude::*;

use crate::error::{Error, Result};
use crate::eval::{self, Trace};
use crate::gate::Gate;
use crate::limits::Limits;
use crate::netlist::{Netlist, Node};
use crate::traverse::Layout;

/// A layout and the netlist generation and root revision it was built from.
#[derive(Clone, Debug)]
struct Cached {
    generation: u64,
    revision: u64,
    layout: Layout,
}

/// A netlist evaluated from an ordered set of root nodes.
///
/// The circuit owns its netlist. Node numbering, the sink set and the external slot layout are
/// computed on demand and cached until the netlist or the root set changes; mutations made
/// through [`Circuit::netlist_mut`] are noticed as well as those made through the circuit's own
/// methods.
///
/// Mutation and evaluation both take `&mut self`, so they can never interleave.
#[derive(Clone, Debug)]
pub struct Circuit {
    netlist: Netlist,
    roots: Vec<NodeIndex>,
    revision: u64,
    limits: Limits,
    cache: Option<Cached>,
}

impl Circuit {
    /// Create a circuit over `netlist` with the given roots.
    ///
    /// # Errors
    ///
    /// Returns [`Error::UnknownNode`] if a root is not in `netlist`.
    pub fn new(netlist: Netlist, roots: impl IntoIterator<Item = NodeIndex>) -> Result<Self> {
        let roots = roots.into_iter().collect::<Vec<_>>();
        if let Some(&node) = roots.iter().find(|&&node| !netlist.contains(node)) {
            return Err(Error::UnknownNode { node });
        }

        Ok(Self {
            netlist,
            roots,
            revision: 0,
            limits: Limits::default(),
            cache: None,
        })
    }

    /// Replace the traversal limits.
    #[must_use]
    pub fn with_limits(mut self, limits: Limits) -> Self {
        self.limits = limits;
        self.reset();
        self
    }

    /// The traversal limits in force.
    #[must_use]
    pub const fn limits(&self) -> Limits {
        self.limits
    }

    /// The netlist this circuit evaluates.
    #[must_use]
    pub const fn netlist(&self) -> &Netlist {
        &self.netlist
    }

    /// Mutable access to the netlist. Any change invalidates the cached layout.
    pub fn netlist_mut(&mut self) -> &mut Netlist {
        &mut self.netlist
    }

    /// Add a node to the netlist. It takes part in evaluation once a root reaches it.
    pub fn add_node(&mut self, node: Node) -> NodeIndex {
        self.netlist.add_node(node)
    }

    /// Add a node performing `gate` to the netlist.
    pub fn add_gate(&mut self, gate: Gate) -> NodeIndex {
        self.netlist.add_gate(gate)
    }

    /// See [`Netlist::set_gate`].
    ///
    /// # Errors
    ///
    /// Returns [`Error::UnknownNode`] if `node` is not in the netlist.
    pub fn set_gate(&mut self, node: NodeIndex, gate: Option<Gate>) -> Result<Option<Gate>> {
        self.netlist.set_gate(node, gate)
    }

    /// See [`Netlist::connect`].
    ///
    /// # Errors
    ///
    /// Returns [`Error::UnknownNode`] if either node is not in the netlist.
    pub fn connect(&mut self, from: NodeIndex, to: NodeIndex) -> Result<EdgeIndex> {
        self.netlist.connect(from, to)
    }

    /// See [`Netlist::disconnect`].
    ///
    /// # Errors
    ///
    /// Returns [`Error::UnknownNode`] if either node is not in the netlist.
    pub fn disconnect(&mut self, from: NodeIndex, to: NodeIndex) -> Result<bool> {
        self.netlist.disconnect(from, to)
    }

    /// The roots, in traversal order.
    #[must_use]
    pub fn roots(&self) -> &[NodeIndex] {
        &self.roots
    }

    /// Append a root.
    ///
    /// # Errors
    ///
    /// Returns [`Error::UnknownNode`] if `node` is not in the netlist.
    pub fn add_root(&mut self, node: NodeIndex) -> Result<()> {
        if !self.netlist.contains(node) {
            return Err(Error::UnknownNode { node });
        }

        self.roots.push(node);
        self.revision += 1;
        Ok(())
    }

    /// Remove and return the root at `index`, or `None` if there is no such root.
    pub fn remove_root(&mut self, index: usize) -> Option<NodeIndex> {
        if index >= self.roots.len() {
            return None;
        }

        self.revision += 1;
        Some(self.roots.remove(index))
    }

    /// Drop the cached layout, forcing the next query to renumber from scratch.
    pub fn reset(&mut self) {
        self.cache = None;
    }

    /// The traversal id of `node`, if the cached numbering is current and reaches it.
    #[must_use]
    pub fn traversal_id(&self, node: NodeIndex) -> Option<usize> {
        self.cache
            .as_ref()
            .filter(|cached| self.is_current(cached))
            .and_then(|cached| cached.layout.numbering().id(node))
    }

    /// The current layout, rebuilt first if the netlist or roots changed since it was built.
    ///
    /// # Errors
    ///
    /// Anything [`Layout::build`] raises.
    pub fn layout(&mut self) -> Result<&Layout> {
        let cached = match self.cache.take() {
            Some(cached) if self.is_current(&cached) => cached,
            _ => {
                debug!(
                    "rebuilding layout (generation {}, revision {})",
                    self.netlist.generation(),
                    self.revision
                );
                Cached {
                    generation: self.netlist.generation(),
                    revision: self.revision,
                    layout: Layout::build(&self.netlist, &self.roots, self.limits)?,
                }
            },
        };

        Ok(&self.cache.insert(cached).layout)
    }

    /// The circuit's outputs: reachable nodes with no successors, in order of first discovery.
    ///
    /// # Errors
    ///
    /// Anything [`Layout::build`] raises.
    pub fn sinks(&mut self) -> Result<Vec<NodeIndex>> {
        Ok(self.layout()?.sinks())
    }

    /// Number of external inputs [`Circuit::evaluate`] expects.
    ///
    /// This is the sum, over every reachable node, of the operand slots not fed by a predecessor.
    ///
    /// # Errors
    ///
    /// Anything [`Layout::build`] raises.
    pub fn required_input_count(&mut self) -> Result<usize> {
        Ok(self.layout()?.required_input_count())
    }

    /// Evaluate the circuit, returning one value per sink in [`Circuit::sinks`] order.
    ///
    /// `inputs` fill the external operand slots in traversal-id order: roots in order, each
    /// followed depth-first by the successors it reaches first, and within one node in operand
    /// order. [`Layout::slots`] reports which positions a given node reads.
    ///
    /// # Errors
    ///
    /// - Anything [`Layout::build`] raises.
    /// - [`Error::InputCount`] if `inputs` has the wrong length.
    pub fn evaluate(&mut self, inputs: &[bool]) -> Result<Vec<bool>> {
        eval::evaluate(self.layout()?, inputs)
    }

    /// Like [`Circuit::evaluate`], also returning a record of every gate evaluation.
    ///
    /// # Errors
    ///
    /// See [`Circuit::evaluate`].
    pub fn evaluate_traced(&mut self, inputs: &[bool]) -> Result<(Vec<bool>, Trace)> {
        eval::evaluate_traced(self.layout()?, inputs)
    }

    fn is_current(&self, cached: &Cached) -> bool {
        cached.generation == self.netlist.generation() && cached.revision == self.revision
    }
}
