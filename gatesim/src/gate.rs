//! Boolean gates: the payload each netlist node evaluates.

use std::fmt;
use std::str::FromStr;

use crate::error::{Error, Result};

/// A stateless boolean function of fixed arity.
///
/// Gates hold no state and can be evaluated from any number of threads at once.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Gate {
    /// A one-input gate that passes its input through.
    Buffer,
    /// A one-input gate that inverts its input.
    Not,
    /// `a ∧ b`.
    And,
    /// `a ∨ b`.
    Or,
    /// `a ⊕ b`.
    Xor,
    /// `¬(a ∧ b)`.
    Nand,
    /// `¬(a ∨ b)`.
    Nor,
    /// `¬(a ⊕ b)`.
    Xnor,
}

impl Gate {
    /// Every gate variant, unary gates first.
    pub const ALL: [Self; 8] = [
        Self::Buffer,
        Self::Not,
        Self::And,
        Self::Or,
        Self::Xor,
        Self::Nand,
        Self::Nor,
        Self::Xnor,
    ];

    /// Returns the number of operands this gate takes.
    #[must_use]
    pub const fn arity(self) -> usize {
        match self {
            Self::Buffer | Self::Not => 1,
            Self::And | Self::Or | Self::Xor | Self::Nand | Self::Nor | Self::Xnor => 2,
        }
    }

    /// Returns the canonical upper-case name of this gate.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Buffer => "BUFFER",
            Self::Not => "NOT",
            Self::And => "AND",
            Self::Or => "OR",
            Self::Xor => "XOR",
            Self::Nand => "NAND",
            Self::Nor => "NOR",
            Self::Xnor => "XNOR",
        }
    }

    /// Apply this gate to its operands.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Arity`] if `inputs.len()` differs from [`Gate::arity`].
    pub fn evaluate(self, inputs: &[bool]) -> Result<bool> {
        match (self, inputs) {
            (Self::Buffer, &[a]) => Ok(a),
            (Self::Not, &[a]) => Ok(!a),
            (Self::And, &[a, b]) => Ok(a && b),
            (Self::Or, &[a, b]) => Ok(a || b),
            (Self::Xor, &[a, b]) => Ok(a ^ b),
            (Self::Nand, &[a, b]) => Ok(!(a && b)),
            (Self::Nor, &[a, b]) => Ok(!(a || b)),
            (Self::Xnor, &[a, b]) => Ok(!(a ^ b)),
            (_, _) => Err(Error::Arity {
                gate: self,
                expected: self.arity(),
                found: inputs.len(),
            }),
        }
    }
}

impl fmt::Display for Gate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A gate name that matched no variant.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
#[error("unknown gate name {0:?}")]
pub struct ParseGateError(String);

impl FromStr for Gate {
    type Err = ParseGateError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|gate| gate.name().eq_ignore_ascii_case(s))
            .ok_or_else(|| ParseGateError(s.to_owned()))
    }
}
