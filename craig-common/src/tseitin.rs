//! Tseitin gate encoders
//!
//! These are the only places that turn a boolean connective into clauses.
//! Each encoder appends clauses that define `label` as a function of two
//! operands.

use crate::{
    formula::Formula,
    literal::{Literal, Variable},
};

/// `label ⇔ x ∧ y`
pub fn tseitin_and(result: &mut Formula, label: Literal, x: Literal, y: Literal) {
    result.add_clause(&[-label, x]);
    result.add_clause(&[-label, y]);
    result.add_clause(&[label, -x, -y]);
}

/// `label ⇔ x ∨ y`
pub fn tseitin_or(result: &mut Formula, label: Literal, x: Literal, y: Literal) {
    result.add_clause(&[label, -x]);
    result.add_clause(&[label, -y]);
    result.add_clause(&[-label, x, y]);
}

/// `label ⇔ (x ⇔ y)`
pub fn tseitin_iff(result: &mut Formula, label: Literal, x: Literal, y: Literal) {
    result.add_clause(&[-label, -x, y]);
    result.add_clause(&[-label, x, -y]);
    result.add_clause(&[label, -x, -y]);
    result.add_clause(&[label, x, y]);
}

/// Hands out fresh label variables.
///
/// Labels are allocated above every variable of the unrolled circuit, so
/// they never collide with a frame. The counter only grows.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LabelAllocator {
    next_free: Variable,
}

impl LabelAllocator {
    /// Start allocating at `first`.
    pub fn new(first: Variable) -> LabelAllocator {
        requires!(first != Variable::CONSTANT);
        LabelAllocator { next_free: first }
    }
    /// A fresh positive label.
    pub fn fresh(&mut self) -> Literal {
        let label = self.next_free.literal();
        self.next_free = self.next_free.shift(1);
        label
    }
    /// The variable the next call to `fresh` will return.
    pub fn next_free(&self) -> Variable {
        self.next_free
    }
    /// The number of variables needed to cover all labels allocated so far.
    pub fn variable_count(&self) -> usize {
        self.next_free.0 as usize
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    /// Evaluate a formula under an assignment given as a function of variables.
    pub(crate) fn satisfies(formula: &Formula, value: impl Fn(Variable) -> bool) -> bool {
        formula.iter().all(|clause| {
            clause
                .iter()
                .any(|&literal| literal.evaluate(value(literal.variable())))
        })
    }

    fn check_encoder(
        encode: fn(&mut Formula, Literal, Literal, Literal),
        function: fn(bool, bool) -> bool,
    ) {
        let label = Variable(3).literal();
        let x = Variable(1).literal();
        let y = -Variable(2).literal();
        let mut formula = Formula::new();
        encode(&mut formula, label, x, y);
        for &x_value in &[false, true] {
            for &y_value in &[false, true] {
                for &label_value in &[false, true] {
                    let value = |variable: Variable| match variable.0 {
                        1 => x_value,
                        2 => y_value,
                        _ => label_value,
                    };
                    let expected = label_value == function(x_value, !y_value);
                    assert_eq!(satisfies(&formula, value), expected);
                }
            }
        }
    }

    #[test]
    fn and_defines_conjunction() {
        check_encoder(tseitin_and, |x, y| x && y);
    }

    #[test]
    fn or_defines_disjunction() {
        check_encoder(tseitin_or, |x, y| x || y);
    }

    #[test]
    fn iff_defines_equivalence() {
        check_encoder(tseitin_iff, |x, y| x == y);
    }

    #[test]
    fn clause_counts() {
        let (l, x, y) = (Literal::from_raw(6), Literal::from_raw(2), Literal::from_raw(4));
        let mut formula = Formula::new();
        tseitin_and(&mut formula, l, x, y);
        assert_eq!(formula.len(), 3);
        tseitin_or(&mut formula, l, x, y);
        assert_eq!(formula.len(), 6);
        tseitin_iff(&mut formula, l, x, y);
        assert_eq!(formula.len(), 10);
    }

    #[test]
    fn allocator_is_monotonic() {
        let mut allocator = LabelAllocator::new(Variable(10));
        assert_eq!(allocator.fresh(), Literal::from_raw(20));
        assert_eq!(allocator.fresh(), Literal::from_raw(22));
        assert_eq!(allocator.next_free(), Variable(12));
        assert_eq!(allocator.variable_count(), 12);
    }
}
