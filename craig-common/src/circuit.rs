//! The transition system and its CNF unrollings
//!
//! A circuit is an and-inverter graph with latches. Unrolling it to step
//! `i` moves every variable by `i` frames, where one frame holds
//! `max_index + 1` variables. Frames are disjoint, which the interpolation
//! loop relies on to tell the two partitions apart.

use crate::{
    formula::Formula,
    literal::{Literal, Variable},
    memory::{Array, HeapSpace, Vector},
    tseitin::{tseitin_and, tseitin_iff, LabelAllocator},
};
use craig_macros::HeapSpace;
use std::io::{self, Write};

/// A state element: `current` holds in this step, `next` defines its value
/// in the following step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Latch {
    pub current: Literal,
    pub next: Literal,
}

/// An AND gate `output ⇔ left ∧ right`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Gate {
    pub output: Literal,
    pub left: Literal,
    pub right: Literal,
}

impl Gate {
    /// Forces variable 0 to false in every frame: `0 ⇔ 0 ∧ ¬0`.
    pub const CONSTANT_FALSE: Gate = Gate {
        output: Literal::FALSE,
        left: Literal::FALSE,
        right: Literal::TRUE,
    };
}

/// A parsed circuit with a single bad-state output.
///
/// Never mutated after construction.
#[derive(Debug, Clone, PartialEq, HeapSpace)]
pub struct Circuit {
    /// The highest variable of one frame
    pub max_index: Variable,
    /// Input literals, in declaration order
    pub inputs: Vector<Literal>,
    pub latches: Vector<Latch>,
    /// AND gates, followed by the constant-false gate
    pub gates: Vector<Gate>,
    /// True exactly in the states that violate the property
    pub bad: Literal,
}

impl Circuit {
    /// Create a circuit, appending the gate for the reserved constant.
    pub fn new(
        max_index: Variable,
        inputs: Vector<Literal>,
        latches: Vector<Latch>,
        mut gates: Vector<Gate>,
        bad: Literal,
    ) -> Circuit {
        gates.push(Gate::CONSTANT_FALSE);
        let circuit = Circuit {
            max_index,
            inputs,
            latches,
            gates,
            bad,
        };
        invariant!(circuit.literals().all(|literal| literal.variable() <= max_index));
        circuit
    }
    /// The gates as declared in the input, without the constant gate.
    pub fn and_gates(&self) -> &[Gate] {
        &self.gates[0..self.gates.len() - 1]
    }
    fn literals(&self) -> impl Iterator<Item = Literal> + '_ {
        self.inputs
            .iter()
            .cloned()
            .chain(self.latches.iter().flat_map(|l| vec![l.current, l.next]))
            .chain(
                self.gates
                    .iter()
                    .flat_map(|g| vec![g.output, g.left, g.right]),
            )
            .chain(Some(self.bad))
    }
    /// The number of variables in one frame.
    pub fn frame_width(&self) -> u32 {
        self.max_index.0 + 1
    }
    /// The first variable of frame `step`.
    pub fn frame_offset(&self, step: usize) -> u32 {
        step as u32 * self.frame_width()
    }
    /// Move a literal of the base circuit to frame `step`.
    pub fn at(&self, literal: Literal, step: usize) -> Literal {
        literal.shift(self.frame_offset(step))
    }
    /// The number of variables of an unrolling with `frames` frames.
    pub fn variable_count(&self, frames: usize) -> usize {
        frames * self.frame_width() as usize
    }

    /// The gate definitions of frame `step`.
    pub fn circuit_cnf(&self, result: &mut Formula, step: usize) {
        for gate in &self.gates {
            tseitin_and(
                result,
                self.at(gate.output, step),
                self.at(gate.left, step),
                self.at(gate.right, step),
            );
        }
    }
    /// Every latch is false, plus the gate definitions of frame 0.
    pub fn initial_cnf(&self, result: &mut Formula) {
        for latch in &self.latches {
            result.add_clause(&[-latch.current]);
        }
        self.circuit_cnf(result, 0);
    }
    /// A single clause: the bad literal holds in some frame in `from..=to`.
    pub fn bad_cnf(&self, result: &mut Formula, from: usize, to: usize) {
        let clause: Vector<Literal> = (from..=to).map(|step| self.at(self.bad, step)).collect();
        result.add_clause(&clause);
    }
    /// Links each latch of frame `step + 1` to its next-state literal in
    /// frame `step`, plus the gate definitions of frame `step + 1`.
    pub fn transition_cnf(&self, result: &mut Formula, step: usize) {
        for latch in &self.latches {
            let current = self.at(latch.current, step + 1);
            let next = self.at(latch.next, step);
            result.add_clause(&[-current, next]);
            result.add_clause(&[current, -next]);
        }
        self.circuit_cnf(result, step + 1);
    }
    /// Labelled encoding of the gate definitions of frame 0.
    ///
    /// Every gate gets a label for its conjunction and one for the
    /// equivalence with its output. The returned label is the conjunction
    /// of all of these.
    pub fn initial_circuit_tseitin(
        &self,
        result: &mut Formula,
        labels: &mut LabelAllocator,
    ) -> Literal {
        let defined: Vector<Literal> = self
            .gates
            .iter()
            .map(|gate| {
                let conjunction = labels.fresh();
                tseitin_and(result, conjunction, gate.left, gate.right);
                let definition = labels.fresh();
                tseitin_iff(result, definition, gate.output, conjunction);
                definition
            })
            .collect();
        conjoin(result, labels, &defined)
    }
    /// Labelled encoding of the initial states; returns the top label.
    pub fn initial_tseitin(&self, result: &mut Formula, labels: &mut LabelAllocator) -> Literal {
        let reset: Vector<Literal> = self.latches.iter().map(|latch| -latch.current).collect();
        let reset = if reset.is_empty() {
            None
        } else {
            Some(conjoin(result, labels, &reset))
        };
        let circuit = self.initial_circuit_tseitin(result, labels);
        match reset {
            None => circuit,
            Some(reset) => {
                let top = labels.fresh();
                tseitin_and(result, top, reset, circuit);
                top
            }
        }
    }

    /// Compute the values of all variables of one frame.
    ///
    /// `state` holds the latch values and `inputs` the input values, both in
    /// declaration order.
    pub fn evaluate_frame(&self, state: &[bool], inputs: &[bool]) -> Array<Variable, bool> {
        requires!(state.len() == self.latches.len());
        requires!(inputs.len() == self.inputs.len());
        let mut known: Array<Variable, Option<bool>> =
            Array::new(None, self.max_index.array_size_for_variables());
        known[Variable::CONSTANT] = Some(false);
        for (&literal, &value) in self.inputs.iter().zip(inputs) {
            known[literal.variable()] = Some(value != literal.is_negated());
        }
        for (latch, &value) in self.latches.iter().zip(state) {
            known[latch.current.variable()] = Some(value != latch.current.is_negated());
        }
        let value = |known: &Array<Variable, Option<bool>>, literal: Literal| {
            known[literal.variable()].map(|value| literal.evaluate(value))
        };
        let mut progress = true;
        while progress {
            progress = false;
            for gate in self.and_gates() {
                if known[gate.output.variable()].is_some() {
                    continue;
                }
                if let (Some(left), Some(right)) = (value(&known, gate.left), value(&known, gate.right)) {
                    known[gate.output.variable()] = Some((left && right) != gate.output.is_negated());
                    progress = true;
                }
            }
        }
        let mut values = Array::new(false, known.size());
        for (index, value) in known.iter().enumerate() {
            values[Variable(index as u32)] = value.unwrap_or(false);
        }
        values
    }
    /// The latch values of the following step, given the values of one frame.
    pub fn next_state(&self, values: &Array<Variable, bool>) -> Vector<bool> {
        self.latches
            .iter()
            .map(|latch| latch.next.evaluate(values[latch.next.variable()]))
            .collect()
    }

    /// Print the circuit in ASCII AIGER format, omitting the constant gate.
    pub fn write_aag(&self, output: &mut impl Write) -> io::Result<()> {
        writeln!(
            output,
            "aag {} {} {} 1 {}",
            self.max_index,
            self.inputs.len(),
            self.latches.len(),
            self.and_gates().len()
        )?;
        for input in &self.inputs {
            writeln!(output, "{}", input.encoding())?;
        }
        for latch in &self.latches {
            writeln!(output, "{} {}", latch.current.encoding(), latch.next.encoding())?;
        }
        writeln!(output, "{}", self.bad.encoding())?;
        for gate in self.and_gates() {
            writeln!(
                output,
                "{} {} {}",
                gate.output.encoding(),
                gate.left.encoding(),
                gate.right.encoding()
            )?;
        }
        Ok(())
    }
}

/// Encode a left-leaning chain of conjunctions; a single operand needs no label.
fn conjoin(result: &mut Formula, labels: &mut LabelAllocator, operands: &[Literal]) -> Literal {
    requires!(!operands.is_empty());
    operands[1..].iter().fold(operands[0], |left, &right| {
        let label = labels.fresh();
        tseitin_and(result, label, left, right);
        label
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{input::Input, parser::parse_circuit, tseitin::tests::satisfies};

    fn circuit(text: &str) -> Circuit {
        parse_circuit(Input::from_text(text)).unwrap()
    }

    fn lit(encoding: u32) -> Literal {
        Literal::from_raw(encoding)
    }

    /// One input, one latch that stores `input ∧ latch`, bad is the latch.
    const SMALL: &str = "aag 3 1 1 1 1\n2\n4 6\n4\n6 2 4\n";

    #[test]
    fn unrolled_clauses() {
        let circuit = circuit(SMALL);
        assert_eq!(circuit.frame_width(), 4);
        assert_eq!(circuit.gates.len(), 2);

        let mut initial = Formula::new();
        circuit.initial_cnf(&mut initial);
        assert_eq!(initial.clause(0), &[lit(5)]);
        assert_eq!(initial.len(), 1 + 2 * 3);

        let mut bad = Formula::new();
        circuit.bad_cnf(&mut bad, 1, 3);
        assert_eq!(bad.len(), 1);
        assert_eq!(bad.clause(0), &[lit(4 + 8), lit(4 + 16), lit(4 + 24)]);

        let mut transition = Formula::new();
        circuit.transition_cnf(&mut transition, 1);
        assert_eq!(transition.clause(0), &[lit(4 + 16 + 1), lit(6 + 8)]);
        assert_eq!(transition.clause(1), &[lit(4 + 16), lit(6 + 8 + 1)]);
        // Gate of frame 2.
        assert!(transition.contains_clause(&[lit(6 + 16 + 1), lit(2 + 16)]));
        // Constant of frame 2.
        assert!(transition.contains_clause(&[lit(16 + 1)]));
    }

    #[test]
    fn initial_tseitin_defines_initial_states() {
        let circuit = circuit(SMALL);
        let mut formula = Formula::new();
        let mut labels = LabelAllocator::new(Variable(circuit.frame_width()));
        let top = circuit.initial_tseitin(&mut formula, &mut labels);
        let variables = labels.variable_count();
        assert!(variables <= 12);
        let mut models = 0;
        for bits in 0..(1u32 << variables) {
            let value = |variable: Variable| bits & (1 << variable.0) != 0;
            if !satisfies(&formula, value) {
                continue;
            }
            models += 1;
            let expected = !value(Variable(0))
                && !value(Variable(2))
                && value(Variable(3)) == (value(Variable(1)) && value(Variable(2)));
            assert_eq!(top.evaluate(value(top.variable())), expected);
        }
        // The labels are functions of the frame variables.
        assert_eq!(models, 1 << circuit.frame_width());
    }

    #[test]
    fn simulation_of_a_toggle() {
        let circuit = circuit("aag 1 0 1 1 0\n2 3\n2\n");
        let mut state = vector!(false);
        let mut bad = Vec::new();
        for _ in 0..4 {
            let values = circuit.evaluate_frame(&state, &[]);
            bad.push(circuit.bad.evaluate(values[circuit.bad.variable()]));
            state = circuit.next_state(&values);
        }
        assert_eq!(bad, vec![false, true, false, true]);
    }

    #[test]
    fn aag_output_omits_the_constant_gate() {
        let circuit = circuit(SMALL);
        let mut output = Vec::new();
        circuit.write_aag(&mut output).unwrap();
        assert_eq!(String::from_utf8(output).unwrap(), SMALL);
    }
}
