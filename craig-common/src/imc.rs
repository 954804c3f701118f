//! Interpolation-based model checking
//!
//! For each depth `j`, partition B asserts a bad state within `j - 1`
//! transitions of frame 1, and partition A asserts that frame 0 is in the
//! current over-approximation `R` of the reachable states and takes one
//! transition. If A ∧ B is unsatisfiable, the interpolant over the shared
//! variables of frame 1 is moved back to frame 0 and added to `R`. Once the
//! interpolant adds nothing to `R`, the property holds.

use crate::{
    checker::{Checker, Verdict},
    bmc::{bmc, print_model},
    circuit::Circuit,
    formula::{puts_formula, Formula},
    interpolant::{Interpolant, Partition, PivotClasses, Traverser},
    literal::{Literal, Variable},
    memory::{HeapSpace, Vector},
    solver::{SatResult, Solver},
    tseitin::LabelAllocator,
};
use std::{cmp, collections::BTreeSet};

/// An over-approximation of the reachable states: the disjunction of the
/// `labels`, each defined by `clauses`.
#[derive(Debug, Clone, PartialEq)]
pub struct Reach {
    pub clauses: Formula,
    pub labels: Vector<Literal>,
}

impl Reach {
    /// Just the initial states.
    pub fn initial(circuit: &Circuit, labels: &mut LabelAllocator) -> Reach {
        let mut clauses = Formula::new();
        let top = circuit.initial_tseitin(&mut clauses, labels);
        Reach {
            clauses,
            labels: vector!(top),
        }
    }
    /// The clause asserting that some disjunct holds.
    pub fn disjunction(&self) -> &[Literal] {
        &self.labels
    }
    /// Returns true if the formula labelled `top` implies this
    /// over-approximation, i.e. `top ∧ ¬R` is unsatisfiable.
    pub fn implies(&self, checker: &mut Checker, definitions: &Formula, top: Literal, variables: usize) -> bool {
        let mut solver = Solver::new();
        solver.reserve_variables(variables);
        solver.add_formula(&self.clauses);
        for &label in &self.labels {
            solver.add_clause(&[-label]);
        }
        solver.add_formula(definitions);
        solver.add_clause(&[top]);
        checker.sat_calls += 1;
        let result = solver.solve();
        checker.record(&solver);
        result == SatResult::Unsatisfiable
    }
    /// Add a disjunct.
    pub fn add(&mut self, definitions: &Formula, top: Literal) {
        self.clauses.extend(definitions);
        self.labels.push(top);
    }
}

/// The variables of frame 1 that both partitions mention at depth `j`: the
/// next-state literals feeding frame 2 and the bad literal.
pub fn shared_variables(circuit: &Circuit, j: usize) -> BTreeSet<Variable> {
    let width = circuit.frame_width();
    let mut shared = BTreeSet::new();
    if j > 1 {
        for latch in &circuit.latches {
            shared.insert(latch.next.variable().shift(width));
        }
    }
    shared.insert(circuit.bad.variable().shift(width));
    shared
}

/// Partition B at depth `j`: a bad state in frames `1..=j`, reached by
/// transitions from frame 1.
pub fn b_partition(circuit: &Circuit, j: usize) -> Formula {
    let mut formula = Formula::new();
    circuit.bad_cnf(&mut formula, 1, j);
    for step in 1..j {
        circuit.transition_cnf(&mut formula, step);
    }
    formula
}

/// Check the property for all bounds.
pub fn imc(checker: &mut Checker) -> Verdict {
    log!(checker, 1, "running initial bmc");
    if !bmc(checker, 0) {
        return Verdict::Violated;
    }
    let mut j = 1;
    loop {
        if checker.flags.outer_bound.map_or(false, |bound| j > bound) {
            return Verdict::Exhausted;
        }
        match outer_check(checker, j) {
            Verdict::Spurious(next) => j = next,
            Verdict::Exhausted => j += 1,
            verdict => return verdict,
        }
    }
}

/// Check depth `j`, refining the over-approximation until it is a
/// fixpoint or a counterexample shows up.
///
/// Returns `Exhausted` if the inner bound runs out.
pub fn outer_check(checker: &mut Checker, j: usize) -> Verdict {
    requires!(j >= 1);
    log!(checker, 1, "outer loop: j={}", j);
    if !bmc(checker, j) {
        return Verdict::Violated;
    }
    let circuit = checker.circuit;
    let width = circuit.frame_width();
    let b = b_partition(circuit, j);
    let classes = PivotClasses {
        shared: shared_variables(circuit, j),
        lowest_b: Variable(2 * width),
        highest_b: Variable(circuit.frame_offset(j + 1) - 1),
    };
    if checker.flags.verbosity >= 2 {
        let shared: Vec<String> = classes.shared.iter().map(|v| v.to_string()).collect();
        comment!("shared variables: {{{}}}", shared.join(" "));
        puts_formula("B partition", &b);
    }
    let mut labels = LabelAllocator::new(Variable(circuit.frame_offset(j + 1)));
    let mut reach = Reach::initial(circuit, &mut labels);
    let mut iteration = 0;
    while checker.flags.inner_bound.map_or(true, |bound| iteration < bound) {
        log!(checker, 1, "inner iteration: {}", iteration);
        if let Some(verdict) = refine(checker, j, &b, &classes, &mut reach, &mut labels) {
            return verdict;
        }
        iteration += 1;
    }
    Verdict::Exhausted
}

/// One refinement step. Returns `None` if `reach` was extended.
fn refine(
    checker: &mut Checker,
    j: usize,
    b: &Formula,
    classes: &PivotClasses,
    reach: &mut Reach,
    labels: &mut LabelAllocator,
) -> Option<Verdict> {
    let circuit = checker.circuit;
    let mut solver = Solver::new();
    solver.reserve_variables(labels.variable_count());
    let mut traverser = Traverser::new(Partition::B);
    solver.add_formula(b);
    checker.sat_calls += 1;
    solver.solve_with_proof(&mut traverser);

    let mut a = reach.clauses.clone();
    circuit.transition_cnf(&mut a, 0);
    a.add_clause(reach.disjunction());
    if checker.flags.verbosity >= 2 {
        puts_formula("A partition", &a);
    }
    traverser.partition = Partition::A;
    solver.add_formula(&a);
    checker.sat_calls += 1;
    let result = solver.solve_with_proof(&mut traverser);
    checker.record(&solver);
    if result == SatResult::Satisfiable {
        log!(checker, 1, "spurious counterexample found");
        if checker.flags.verbosity >= 2 {
            print_model(&solver);
        }
        return Some(Verdict::Spurious(j + 1));
    }
    let root = match solver.empty_clause() {
        Some(root) => root,
        None => die!("refutation without an empty clause"),
    };

    log!(checker, 1, "computing interpolant");
    let mut interpolant = Formula::new();
    let top = match traverser
        .forest
        .compute_interpolant(root, classes, labels, &mut interpolant)
    {
        Interpolant::Label(label) => label,
        constant => {
            let label = labels.fresh();
            interpolant.add_clause(&[if constant == Interpolant::True { label } else { -label }]);
            label
        }
    };
    checker.forest_memory = cmp::max(checker.forest_memory, traverser.heap_space());
    log!(
        checker,
        1,
        "done, size: {} clauses from {} proof nodes",
        interpolant.len(),
        traverser.forest.node_count()
    );

    // Shared variables are in frame 1; R talks about frame 0.
    let width = circuit.frame_width();
    let unshift = |literal: Literal| {
        if classes.shared.contains(&literal.variable()) {
            literal.unshift(width)
        } else {
            literal
        }
    };
    interpolant.map_literals(unshift);
    let top = unshift(top);
    if checker.flags.verbosity >= 2 {
        puts_formula("Interpolant", &interpolant);
    }

    if reach.implies(checker, &interpolant, top, labels.variable_count()) {
        log!(checker, 1, "fixpoint reached");
        return Some(Verdict::Safe);
    }
    reach.add(&interpolant, top);
    None
}
