//! Variable and literal representations
//!
//! Literals use the AIGER encoding: `2 * variable + sign`, where a set sign
//! bit means negated. Variable 0 is reserved for the constant false, so the
//! literal with encoding 0 is false and the one with encoding 1 is true.

use crate::memory::Offset;
use std::{fmt, fmt::Display, ops};

/// A variable index.
#[derive(Debug, PartialEq, Eq, Clone, Copy, PartialOrd, Ord, Hash, Default)]
pub struct Variable(pub u32);

/// A variable plus a polarity bit.
#[derive(Debug, PartialEq, Eq, Clone, Copy, Hash, PartialOrd, Ord, Default)]
pub struct Literal {
    encoding: u32,
}

impl Variable {
    pub fn new(value: u32) -> Variable {
        Variable(value)
    }
    /// The reserved variable that is fixed to false in every frame.
    pub const CONSTANT: Variable = Variable(0);
    /// The positive literal of this variable.
    pub fn literal(self) -> Literal {
        Literal::from_raw(self.0 * 2)
    }
    /// Move this variable by `offset` variables, e.g. to another time frame.
    pub fn shift(self, offset: u32) -> Variable {
        Variable(self.0 + offset)
    }
    /// Move this variable back by `offset` variables.
    pub fn unshift(self, offset: u32) -> Variable {
        requires!(self.0 >= offset);
        Variable(self.0 - offset)
    }
    /// The size of an array that can be indexed by all variables up to and including this one.
    pub fn array_size_for_variables(self) -> usize {
        self.as_offset() + 1
    }
}

impl Offset for Variable {
    fn as_offset(&self) -> usize {
        self.0 as usize
    }
}

impl Display for Variable {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl Literal {
    /// The constant false.
    pub const FALSE: Literal = Literal { encoding: 0 };
    /// The constant true.
    pub const TRUE: Literal = Literal { encoding: 1 };

    /// Construct a literal from its AIGER encoding.
    pub fn from_raw(encoding: u32) -> Literal {
        Literal { encoding }
    }
    /// Construct a literal from a variable and a sign.
    pub fn from_variable(variable: Variable, negated: bool) -> Literal {
        Literal {
            encoding: variable.0 * 2 + negated as u32,
        }
    }
    /// The AIGER encoding.
    pub fn encoding(self) -> u32 {
        self.encoding
    }
    pub fn variable(self) -> Variable {
        Variable(self.encoding / 2)
    }
    pub fn is_negated(self) -> bool {
        self.encoding & 1 != 0
    }
    /// Move the variable by `offset` variables, preserving the polarity.
    pub fn shift(self, offset: u32) -> Literal {
        Literal::from_variable(self.variable().shift(offset), self.is_negated())
    }
    /// Move the variable back by `offset` variables, preserving the polarity.
    pub fn unshift(self, offset: u32) -> Literal {
        Literal::from_variable(self.variable().unshift(offset), self.is_negated())
    }
    /// The truth value of this literal given the value of its variable.
    pub fn evaluate(self, variable_value: bool) -> bool {
        variable_value != self.is_negated()
    }
}

impl Offset for Literal {
    fn as_offset(&self) -> usize {
        self.encoding as usize
    }
}

/// `~` marks negation, e.g. `~3`.
impl Display for Literal {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(
            f,
            "{}{}",
            if self.is_negated() { "~" } else { "" },
            self.variable()
        )
    }
}

impl ops::Neg for Literal {
    type Output = Literal;
    fn neg(self) -> Literal {
        Literal {
            encoding: self.encoding ^ 1,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn negation_flips_polarity_only() {
        let literal = Literal::from_raw(7);
        assert_eq!(-literal, Literal::from_raw(6));
        assert_eq!((-literal).variable(), literal.variable());
        assert_eq!(-(-literal), literal);
        assert_eq!(-Literal::FALSE, Literal::TRUE);
    }

    #[test]
    fn shifting_preserves_polarity() {
        let literal = Literal::from_variable(Variable(3), true);
        let shifted = literal.shift(10);
        assert_eq!(shifted.variable(), Variable(13));
        assert!(shifted.is_negated());
        assert_eq!(shifted.unshift(10), literal);
    }

    #[test]
    fn frame_blocks_are_disjoint() {
        let max_index = 5u32;
        let width = max_index + 1;
        for i in 0..8u32 {
            for j in 0..8u32 {
                if i == j {
                    continue;
                }
                for v in 0..=max_index {
                    let shifted = Variable(v).shift(i * width);
                    let low = j * width;
                    let high = (j + 1) * width - 1;
                    assert!(shifted.0 < low || shifted.0 > high);
                }
            }
        }
    }
}
