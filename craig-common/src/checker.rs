//! Options and state shared by the model checking procedures

use crate::{
    circuit::Circuit,
    memory::format_memory_usage,
    output::print_key_value,
    solver::{Solver, Statistics},
    witness::Witness,
};

/// Run-time configuration, usually from the command line.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Flags {
    /// 0 is quiet, 1 logs progress, 2 also dumps formulas and models
    pub verbosity: u8,
    /// Run BMC with this bound instead of interpolation
    pub bound: Option<usize>,
    /// Maximum number of refinements per unrolling depth
    pub inner_bound: Option<usize>,
    /// Maximum unrolling depth of the B partition
    pub outer_bound: Option<usize>,
    pub circuit_filename: String,
    /// Where to write the counterexample
    pub witness_filename: Option<String>,
}

/// The result of a model checking run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    /// A reachable state violates the property.
    Violated,
    /// The property holds in all reachable states.
    Safe,
    /// The over-approximation reaches a bad state, retry with this depth.
    Spurious(usize),
    /// A bound ran out before anything was decided.
    Exhausted,
}

impl Verdict {
    /// The final output line.
    pub fn answer(self) -> &'static str {
        match self {
            Verdict::Violated => "FAIL",
            Verdict::Safe => "OK",
            Verdict::Spurious(_) | Verdict::Exhausted => "UNKNOWN",
        }
    }
}

pub struct Checker<'a> {
    pub circuit: &'a Circuit,
    pub flags: Flags,
    /// The number of SAT solver calls so far
    pub sat_calls: usize,
    /// Heap memory of the largest resolution forest
    pub forest_memory: usize,
    /// The counterexample found by the last failing BMC run
    pub witness: Option<Witness>,
    /// Counters summed over all SAT solvers
    pub solver_statistics: Statistics,
}

impl<'a> Checker<'a> {
    pub fn new(circuit: &'a Circuit, flags: Flags) -> Checker<'a> {
        Checker {
            circuit,
            flags,
            sat_calls: 0,
            forest_memory: 0,
            witness: None,
            solver_statistics: Statistics::default(),
        }
    }
    /// Add the counters of a solver that is done.
    pub fn record(&mut self, solver: &Solver) {
        self.solver_statistics.accumulate(solver.statistics());
    }
    pub fn print_statistics(&self) {
        print_key_value("SAT calls", self.sat_calls);
        self.solver_statistics.print();
        print_key_value("forest memory (MB)", format_memory_usage(self.forest_memory));
    }
}
