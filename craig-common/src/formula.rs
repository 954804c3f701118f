//! Container for clauses

use crate::{
    literal::{Literal, Variable},
    memory::{HeapSpace, Vector},
};
use craig_macros::HeapSpace;
use std::{
    cmp,
    io::{self, Write},
    ops::Range,
};

/// A conjunction of clauses, stored in a flat buffer.
///
/// Clause order is preserved: the solver numbers the roots of a proof in
/// the order in which their clauses were added.
#[derive(Debug, Clone, PartialEq, HeapSpace)]
pub struct Formula {
    /// The literals of all clauses, back to back
    data: Vector<Literal>,
    /// Maps clause index to the offset of its first literal in `data`.
    /// There is an extra value that points one beyond the last literal.
    offset: Vector<usize>,
}

impl Default for Formula {
    /// Create the empty conjunction.
    fn default() -> Formula {
        Formula {
            data: Vector::new(),
            offset: vector!(0),
        }
    }
}

impl Formula {
    pub fn new() -> Formula {
        Formula::default()
    }
    /// Append a clause.
    pub fn add_clause(&mut self, clause: &[Literal]) {
        self.data.extend_from_slice(clause);
        self.offset.push(self.data.len());
    }
    /// Append all clauses of another formula.
    pub fn extend(&mut self, other: &Formula) {
        for clause in other.iter() {
            self.add_clause(clause);
        }
    }
    /// Returns the number of clauses.
    pub fn len(&self) -> usize {
        self.offset.len() - 1
    }
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
    /// Returns the total number of literals in all clauses.
    pub fn literal_count(&self) -> usize {
        self.data.len()
    }
    fn range(&self, index: usize) -> Range<usize> {
        self.offset[index]..self.offset[index + 1]
    }
    /// Access the clause at the given position.
    pub fn clause(&self, index: usize) -> &[Literal] {
        requires!(index < self.len());
        &self.data[self.range(index)]
    }
    /// Iterate over the clauses in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = &[Literal]> + '_ {
        (0..self.len()).map(move |index| self.clause(index))
    }
    /// Replace every literal by the result of `f`.
    pub fn map_literals(&mut self, mut f: impl FnMut(Literal) -> Literal) {
        for literal in self.data.iter_mut() {
            *literal = f(*literal);
        }
    }
    /// Returns the highest variable mentioned in any clause.
    pub fn max_variable(&self) -> Option<Variable> {
        self.data
            .iter()
            .map(|literal| literal.variable())
            .fold(None, |max, variable| {
                Some(max.map_or(variable, |max| cmp::max(max, variable)))
            })
    }
    /// Returns true if some clause has exactly these literals (in any order).
    pub fn contains_clause(&self, needle: &[Literal]) -> bool {
        let mut needle: Vector<Literal> = needle.iter().cloned().collect();
        needle.sort_unique();
        self.iter().any(|clause| {
            let mut clause: Vector<Literal> = clause.iter().cloned().collect();
            clause.sort_unique();
            clause == needle
        })
    }
}

/// Print a formula for debugging, one clause per line.
pub fn puts_formula(name: &str, formula: &Formula) {
    puts!("{}\n", name);
    for clause in formula.iter() {
        puts!("  (");
        for literal in clause {
            puts!("{}, ", literal);
        }
        puts!(")\n");
    }
}

/// Write a formula in DIMACS format.
///
/// DIMACS variables start at 1, so variable `v` is written as `v + 1`.
pub fn write_dimacs(file: &mut impl Write, formula: &Formula, variables: usize) -> io::Result<()> {
    writeln!(file, "p cnf {} {}", variables, formula.len())?;
    for clause in formula.iter() {
        for &literal in clause {
            let variable = literal.variable().0 as i64 + 1;
            write!(
                file,
                "{} ",
                if literal.is_negated() { -variable } else { variable }
            )?;
        }
        writeln!(file, "0")?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lit(encoding: u32) -> Literal {
        Literal::from_raw(encoding)
    }

    #[test]
    fn clauses_keep_their_order() {
        let mut formula = Formula::new();
        formula.add_clause(&[lit(2), lit(5)]);
        formula.add_clause(&[]);
        formula.add_clause(&[lit(7)]);
        assert_eq!(formula.len(), 3);
        assert_eq!(formula.clause(0), &[lit(2), lit(5)]);
        assert!(formula.clause(1).is_empty());
        assert_eq!(formula.clause(2), &[lit(7)]);
        assert_eq!(formula.max_variable(), Some(Variable(3)));
        assert!(formula.contains_clause(&[lit(5), lit(2)]));
        assert!(!formula.contains_clause(&[lit(5)]));
    }

    #[test]
    fn map_and_extend() {
        let mut a = Formula::new();
        a.add_clause(&[lit(2), lit(3)]);
        let mut b = Formula::new();
        b.add_clause(&[lit(4)]);
        a.extend(&b);
        a.map_literals(|literal| literal.shift(10));
        assert_eq!(a.clause(0), &[lit(22), lit(23)]);
        assert_eq!(a.clause(1), &[lit(24)]);
    }

    #[test]
    fn dimacs_is_one_based() {
        let mut formula = Formula::new();
        formula.add_clause(&[lit(0), lit(3)]);
        let mut output = Vec::new();
        write_dimacs(&mut output, &formula, 2).unwrap();
        assert_eq!(String::from_utf8(output).unwrap(), "p cnf 2 1\n1 -2 0\n");
    }
}
