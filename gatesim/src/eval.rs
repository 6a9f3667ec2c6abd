//! Demand-driven evaluation of a laid-out netlist.
//!
//! Each sink is evaluated by demanding its predecessors' values. Results are memoized
//! for the duration of one call, so a node shared by several sinks is evaluated once. A node's
//! operands are its own external slots first, then its predecessors' results in operand order.

use log::{debug, trace};
use petgraph::graph::NodeIndex;

use crate::error::{Error, Result};
use crate::traverse::Layout;

/// One gate evaluation.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Step {
    /// The node evaluated.
    pub node: NodeIndex,
    /// The operands handed to its gate.
    pub operands: Vec<bool>,
    /// How many leading operands came from the external input vector.
    pub direct: usize,
    /// The gate's result.
    pub output: bool,
}

/// Every gate evaluation made by one call, in the order they completed.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Trace {
    /// The recorded evaluations.
    pub steps: Vec<Step>,
}

impl Trace {
    /// Number of external inputs read.
    #[must_use]
    pub fn inputs_consumed(&self) -> usize {
        self.steps.iter().map(|step| step.direct).sum()
    }

    /// Number of times `node` was evaluated.
    #[must_use]
    pub fn evaluations_of(&self, node: NodeIndex) -> usize {
        self.steps.iter().filter(|step| step.node == node).count()
    }
}

struct Evaluator<'a> {
    layout: &'a Layout,
    inputs: &'a [bool],
    memo: Vec<Option<bool>>,
    trace: Option<Trace>,
}

impl<'a> Evaluator<'a> {
    fn new(layout: &'a Layout, inputs: &'a [bool], trace: bool) -> Result<Self> {
        let expected = layout.required_input_count();
        if inputs.len() != expected {
            return Err(Error::InputCount { expected, found: inputs.len() });
        }

        Ok(Self {
            layout,
            inputs,
            memo: vec![None; layout.plans.len()],
            trace: trace.then(Trace::default),
        })
    }

    /// The value of node `target`, evaluating any predecessors not yet known.
    ///
    /// Predecessors are demanded through an explicit stack of ids: a node stays on the stack until
    /// all its predecessors have values, so nodes complete in post-order.
    fn value(&mut self, target: usize) -> Result<bool> {
        if let Some(value) = self.memo[target] {
            return Ok(value);
        }

        let layout = self.layout;
        let mut stack = vec![target];

        while let Some(&id) = stack.last() {
            if self.memo[id].is_some() {
                stack.pop();
                continue;
            }

            let plan = &layout.plans[id];
            let pending = plan
                .predecessors
                .iter()
                .copied()
                .find(|&predecessor| self.memo[predecessor].is_none());
            if let Some(predecessor) = pending {
                stack.push(predecessor);
                continue;
            }

            let direct = self
                .inputs
                .get(plan.offset..plan.offset + plan.direct)
                .ok_or(Error::InputCount {
                    expected: layout.required_input_count(),
                    found: self.inputs.len(),
                })?;

            let mut operands = Vec::with_capacity(plan.gate.arity());
            operands.extend_from_slice(direct);
            operands.extend(plan.predecessors.iter().filter_map(|&predecessor| self.memo[predecessor]));

            let output = plan.gate.evaluate(&operands)?;
            self.memo[id] = Some(output);
            trace!("{} {} {:?} => {}", plan.gate, plan.node.index(), operands, output);

            if let Some(trace) = &mut self.trace {
                trace.steps.push(Step {
                    node: plan.node,
                    operands,
                    direct: plan.direct,
                    output,
                });
            }
            stack.pop();
        }

        self.memo[target].ok_or(Error::UnknownNode { node: layout.plans[target].node })
    }

    fn run(mut self) -> Result<(Vec<bool>, Option<Trace>)> {
        let layout = self.layout;
        let outputs = layout
            .sinks
            .iter()
            .map(|&sink| self.value(sink))
            .collect::<Result<Vec<_>>>()?;

        Ok((outputs, self.trace))
    }
}

/// Evaluate every sink of `layout`, in sink order.
///
/// # Errors
///
/// - [`Error::InputCount`] if `inputs` is not exactly [`Layout::required_input_count`] long.
/// - [`Error::Arity`] if a gate rejects its operands.
pub fn evaluate(layout: &Layout, inputs: &[bool]) -> Result<Vec<bool>> {
    debug!("evaluating {} sink(s) from {} input(s)", layout.sinks.len(), inputs.len());
    let (outputs, _) = Evaluator::new(layout, inputs, false)?.run()?;
    Ok(outputs)
}

/// Like [`evaluate`], also recording every gate evaluation.
///
/// # Errors
///
/// See [`evaluate`].
pub fn evaluate_traced(layout: &Layout, inputs: &[bool]) -> Result<(Vec<bool>, Trace)> {
    debug!("evaluating {} sink(s) from {} input(s), traced", layout.sinks.len(), inputs.len());
    let (outputs, trace) = Evaluator::new(layout, inputs, true)?.run()?;
    Ok((outputs, trace.unwrap_or_default()))
}
