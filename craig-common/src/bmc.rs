//! Bounded model checking

use crate::{
    checker::Checker,
    circuit::Circuit,
    formula::{puts_formula, Formula},
    literal::Variable,
    solver::{SatResult, Solver},
    witness::Witness,
};

/// The initial states, `k` transitions, and a bad state in one of the
/// frames `0..=k`.
pub fn bmc_formula(circuit: &Circuit, k: usize) -> Formula {
    let mut formula = Formula::new();
    circuit.initial_cnf(&mut formula);
    circuit.bad_cnf(&mut formula, 0, k);
    for step in 0..k {
        circuit.transition_cnf(&mut formula, step);
    }
    formula
}

/// Returns true if no bad state is reachable within `k` steps.
///
/// On a violation the counterexample is stored in the checker.
pub fn bmc(checker: &mut Checker, k: usize) -> bool {
    let circuit = checker.circuit;
    let formula = bmc_formula(circuit, k);
    if checker.flags.verbosity >= 2 {
        puts_formula(&format!("BMC({})", k), &formula);
    }
    let mut solver = Solver::new();
    solver.reserve_variables(circuit.variable_count(k + 1));
    solver.add_formula(&formula);
    checker.sat_calls += 1;
    let result = solver.solve();
    checker.record(&solver);
    match result {
        SatResult::Unsatisfiable => true,
        SatResult::Satisfiable => {
            if checker.flags.verbosity >= 2 {
                print_model(&solver);
            }
            let witness = Witness::from_model(circuit, k + 1, |literal| solver.model_value(literal));
            log!(checker, 1, "bad state reached in step {}", witness.length);
            checker.witness = Some(witness);
            false
        }
    }
}

/// Print the values of all variables of the last model.
pub fn print_model(solver: &Solver) {
    comment!("model:");
    for index in 0..solver.variable_count() {
        let variable = Variable(index as u32);
        comment!("x_{}: {}", variable, solver.model_value(variable.literal()) as u8);
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::{checker::Flags, input::Input, parser::parse_circuit, witness::check_witness};

    pub(crate) fn circuit(text: &str) -> Circuit {
        parse_circuit(Input::from_text(text)).unwrap()
    }

    /// Two-bit counter, bad when both bits are set (first in step 3).
    pub(crate) const COUNTER: &str =
        "aag 6 0 2 1 4\n2 3\n4 13\n6\n6 2 4\n8 2 5\n10 3 4\n12 9 11\n";

    #[test]
    fn constant_false_output_is_never_violated() {
        let circuit = circuit("aag 0 0 0 1 0\n0\n");
        let mut checker = Checker::new(&circuit, Flags::default());
        for k in 0..4 {
            assert!(bmc(&mut checker, k));
        }
        assert!(checker.witness.is_none());
        assert_eq!(checker.sat_calls, 4);
        assert_eq!(checker.solver_statistics.solves, 4);
    }

    #[test]
    fn toggle_fails_at_step_one() {
        let circuit = circuit("aag 1 0 1 1 0\n2 3\n2\n");
        let mut checker = Checker::new(&circuit, Flags::default());
        assert!(bmc(&mut checker, 0));
        assert!(!bmc(&mut checker, 1));
        let witness = checker.witness.clone().unwrap();
        assert_eq!(witness.length, 1);
        assert_eq!(check_witness(&circuit, &witness), Ok(()));
    }

    #[test]
    fn violations_persist_at_larger_bounds() {
        let circuit = circuit(COUNTER);
        let mut checker = Checker::new(&circuit, Flags::default());
        let results: Vec<bool> = (0..7).map(|k| bmc(&mut checker, k)).collect();
        assert_eq!(results, vec![true, true, true, false, false, false, false]);
        let witness = checker.witness.unwrap();
        assert_eq!(witness.length, 3);
        assert_eq!(check_witness(&circuit, &witness), Ok(()));
    }

    #[test]
    fn witness_records_inputs() {
        // The latch stores the input, bad is the latch.
        let circuit = circuit("aag 2 1 1 1 0\n2\n4 2\n4\n");
        let mut checker = Checker::new(&circuit, Flags::default());
        assert!(bmc(&mut checker, 0));
        assert!(!bmc(&mut checker, 2));
        let witness = checker.witness.unwrap();
        assert!(witness.length >= 1 && witness.length <= 2);
        assert_eq!(witness.inputs.len(), witness.length + 1);
        assert_eq!(&*witness.inputs[witness.length - 1], "1");
        assert_eq!(check_witness(&circuit, &witness), Ok(()));
    }

    #[test]
    fn unrolling_size() {
        let circuit = circuit(COUNTER);
        let formula = bmc_formula(&circuit, 2);
        // 2 reset units, 5 gates of 3 clauses per frame, 2 latches of 2 clauses per transition, one bad clause.
        assert_eq!(formula.len(), 2 + 3 * 15 + 2 * 4 + 1);
        assert!(formula.max_variable().unwrap() < Variable(3 * 7));
    }
}
