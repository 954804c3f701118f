//! A CDCL SAT solver that logs resolution proofs
//!
//! The solver numbers every clause it reports: input clauses are announced
//! as roots, each learnt clause and the final refutation as a chain of
//! resolutions. Identifiers come from one counter, so the `n`-th event
//! (root or chain) defines clause `n`.
//!
//! Every call to `solve` starts from an empty trail and propagates the unit
//! clauses again. Learnt clauses survive between calls, so clauses can be
//! added incrementally.

use crate::{
    clause::ClauseId,
    formula::Formula,
    literal::{Literal, Variable},
    memory::{Array, HeapSpace, Vector},
    output::print_key_value,
};
use craig_macros::HeapSpace;
use std::{cmp::Reverse, mem};

/// Receives the resolution proof while the solver runs.
pub trait ProofTraverser {
    /// An input clause. Takes the next clause identifier.
    fn root(&mut self, clause: &[Literal]);
    /// A derived clause: resolve `clauses[0]` with `clauses[1]` on
    /// `pivots[0]`, the result with `clauses[2]` on `pivots[1]` and so on.
    /// Takes the next clause identifier.
    fn chain(&mut self, clauses: &[ClauseId], pivots: &[Variable]);
    /// The clause will not be part of any later chain.
    fn deleted(&mut self, clause: ClauseId);
}

/// Discards the proof.
pub struct NoProof;

impl ProofTraverser for NoProof {
    fn root(&mut self, _clause: &[Literal]) {}
    fn chain(&mut self, _clauses: &[ClauseId], _pivots: &[Variable]) {}
    fn deleted(&mut self, _clause: ClauseId) {}
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SatResult {
    Satisfiable,
    Unsatisfiable,
}

/// Index into the clause arena.
type ClauseRef = usize;

#[derive(Debug, Clone, HeapSpace)]
struct StoredClause {
    id: ClauseId,
    /// The first two literals are watched. For a reason clause the implied
    /// literal is first.
    literals: Vector<Literal>,
    learnt: bool,
    deleted: bool,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct Statistics {
    pub solves: u64,
    pub decisions: u64,
    pub propagations: u64,
    pub conflicts: u64,
    pub restarts: u64,
    pub deleted: u64,
}

impl Statistics {
    /// Add the counters of another run.
    pub fn accumulate(&mut self, other: Statistics) {
        self.solves += other.solves;
        self.decisions += other.decisions;
        self.propagations += other.propagations;
        self.conflicts += other.conflicts;
        self.restarts += other.restarts;
        self.deleted += other.deleted;
    }
    pub fn print(&self) {
        print_key_value("solves", self.solves);
        print_key_value("decisions", self.decisions);
        print_key_value("propagations", self.propagations);
        print_key_value("conflicts", self.conflicts);
        print_key_value("restarts", self.restarts);
        print_key_value("deleted clauses", self.deleted);
    }
}

/// The number of conflicts before the first restart.
const FIRST_RESTART: f64 = 100.0;
/// Growth of the restart interval.
const RESTART_FACTOR: f64 = 1.5;
/// Growth of the learnt clause limit after each reduction.
const LEARNT_FACTOR: f64 = 1.1;

#[derive(Debug, Clone, HeapSpace)]
pub struct Solver {
    /// Clauses added since the last call to `solve`
    pending: Formula,
    clauses: Vector<StoredClause>,
    /// Clauses with a single literal, propagated at the start of each solve
    units: Vector<ClauseRef>,
    /// Maps a literal to the clauses that watch it
    watches: Array<Literal, Vector<ClauseRef>>,
    /// Maps a literal to whether it is currently true
    assigned: Array<Literal, bool>,
    level: Array<Variable, u32>,
    reason: Array<Variable, Option<ClauseRef>>,
    /// Scratch space for conflict analysis
    seen: Array<Variable, bool>,
    /// The last value of each variable
    phase: Array<Variable, bool>,
    order: VariableOrder,
    trail: Vector<Literal>,
    /// Maps decision level to the trail length before its decision
    trail_limits: Vector<usize>,
    /// Trail prefix whose consequences have been propagated
    propagated: usize,
    next_id: ClauseId,
    empty_clause: Option<ClauseId>,
    model: Array<Variable, bool>,
    learnt_count: usize,
    max_learnts: f64,
    restart_limit: f64,
    statistics: Statistics,
}

impl Default for Solver {
    fn default() -> Solver {
        Solver {
            pending: Formula::new(),
            clauses: Vector::new(),
            units: Vector::new(),
            watches: Array::default(),
            assigned: Array::default(),
            level: Array::default(),
            reason: Array::default(),
            seen: Array::default(),
            phase: Array::default(),
            order: VariableOrder::new(),
            trail: Vector::new(),
            trail_limits: Vector::new(),
            propagated: 0,
            next_id: ClauseId::new(0),
            empty_clause: None,
            model: Array::default(),
            learnt_count: 0,
            max_learnts: 0.0,
            restart_limit: FIRST_RESTART,
            statistics: Statistics::default(),
        }
    }
}

impl Solver {
    pub fn new() -> Solver {
        Solver::default()
    }
    pub fn variable_count(&self) -> usize {
        self.level.size()
    }
    /// Make room for the variables below `count`.
    pub fn reserve_variables(&mut self, count: usize) {
        if count <= self.variable_count() {
            return;
        }
        self.watches.grow(2 * count, Vector::new());
        self.assigned.grow(2 * count, false);
        self.level.grow(count, 0);
        self.reason.grow(count, None);
        self.seen.grow(count, false);
        self.phase.grow(count, false);
        self.order.grow(count);
    }
    /// Add a clause. It becomes a proof root in the next call to `solve`.
    /// Ignored once the clauses are known to be unsatisfiable.
    pub fn add_clause(&mut self, clause: &[Literal]) {
        if self.empty_clause.is_none() {
            self.pending.add_clause(clause);
        }
    }
    /// Add all clauses of a formula.
    pub fn add_formula(&mut self, formula: &Formula) {
        for clause in formula.iter() {
            self.add_clause(clause);
        }
    }
    pub fn solve(&mut self) -> SatResult {
        self.solve_with_proof(&mut NoProof)
    }
    /// Decide the clauses added so far, reporting the proof to `traverser`.
    ///
    /// Roots of the clauses added since the last call are announced first, so
    /// the traverser can tell clauses added between two calls apart. A solver
    /// should report to the same traverser for its whole lifetime.
    pub fn solve_with_proof(&mut self, traverser: &mut dyn ProofTraverser) -> SatResult {
        self.statistics.solves += 1;
        if self.empty_clause.is_some() {
            return SatResult::Unsatisfiable;
        }
        self.reset_trail();
        let pending = mem::take(&mut self.pending);
        for clause in pending.iter() {
            let id = self.next_clause_id();
            traverser.root(clause);
            self.add_input_clause(id, clause);
        }
        if self.empty_clause.is_some() {
            return SatResult::Unsatisfiable;
        }
        if self.max_learnts == 0.0 {
            self.max_learnts = (self.clauses.len() as f64 / 3.0).max(1000.0);
        }
        for index in 0..self.units.len() {
            let unit = self.units[index];
            let literal = self.clauses[unit].literals[0];
            match self.value(literal) {
                Some(true) => (),
                Some(false) => {
                    self.refute(unit, traverser);
                    return SatResult::Unsatisfiable;
                }
                None => self.enqueue(literal, Some(unit)),
            }
        }
        self.search(traverser)
    }
    /// The value of a literal in the last model.
    ///
    /// Variables the solver never saw are false.
    pub fn model_value(&self, literal: Literal) -> bool {
        let variable = literal.variable();
        literal.evaluate(variable.0 < self.model.size() as u32 && self.model[variable])
    }
    /// The identifier of the empty clause, once unsatisfiability is known.
    pub fn empty_clause(&self) -> Option<ClauseId> {
        self.empty_clause
    }
    pub fn statistics(&self) -> Statistics {
        self.statistics
    }

    fn next_clause_id(&mut self) -> ClauseId {
        let id = self.next_id;
        self.next_id = id.next();
        id
    }
    fn add_input_clause(&mut self, id: ClauseId, clause: &[Literal]) {
        let mut literals: Vector<Literal> = clause.iter().cloned().collect();
        literals.sort_unique();
        // Sorted by encoding, so both literals of a variable are adjacent.
        if literals.windows(2).any(|pair| pair[0] == -pair[1]) {
            return;
        }
        if literals.is_empty() {
            if self.empty_clause.is_none() {
                self.empty_clause = Some(id);
            }
            return;
        }
        self.store_clause(id, literals, false);
    }
    fn store_clause(&mut self, id: ClauseId, literals: Vector<Literal>, learnt: bool) -> ClauseRef {
        if let Some(variable) = literals.iter().map(|literal| literal.variable()).max() {
            self.reserve_variables(variable.array_size_for_variables());
        }
        let cref = self.clauses.len();
        if literals.len() == 1 {
            self.units.push(cref);
        } else {
            self.watches[literals[0]].push(cref);
            self.watches[literals[1]].push(cref);
        }
        if learnt {
            self.learnt_count += 1;
        }
        self.clauses.push(StoredClause {
            id,
            literals,
            learnt,
            deleted: false,
        });
        cref
    }

    fn value(&self, literal: Literal) -> Option<bool> {
        if self.assigned[literal] {
            Some(true)
        } else if self.assigned[-literal] {
            Some(false)
        } else {
            None
        }
    }
    fn decision_level(&self) -> u32 {
        self.trail_limits.len() as u32
    }
    fn enqueue(&mut self, literal: Literal, reason: Option<ClauseRef>) {
        requires!(self.value(literal).is_none());
        let variable = literal.variable();
        self.assigned[literal] = true;
        self.level[variable] = self.decision_level();
        self.reason[variable] = reason;
        self.trail.push(literal);
    }
    fn unassign_from(&mut self, start: usize) {
        for index in start..self.trail.len() {
            let literal = self.trail[index];
            let variable = literal.variable();
            self.assigned[literal] = false;
            self.reason[variable] = None;
            self.phase[variable] = !literal.is_negated();
            self.order.insert(variable);
        }
        self.trail.truncate(start);
        self.propagated = start;
    }
    fn cancel_until(&mut self, level: u32) {
        if self.decision_level() > level {
            let start = self.trail_limits[level as usize];
            self.unassign_from(start);
            self.trail_limits.truncate(level as usize);
        }
    }
    fn reset_trail(&mut self) {
        self.unassign_from(0);
        self.trail_limits.clear();
    }

    fn search(&mut self, traverser: &mut dyn ProofTraverser) -> SatResult {
        let mut conflicts_since_restart = 0.0;
        loop {
            if let Some(conflict) = self.propagate() {
                self.statistics.conflicts += 1;
                conflicts_since_restart += 1.0;
                if self.decision_level() == 0 {
                    self.refute(conflict, traverser);
                    return SatResult::Unsatisfiable;
                }
                let (learnt, ids, pivots) = self.analyze(conflict);
                traverser.chain(&ids, &pivots);
                let id = self.next_clause_id();
                let (learnt, backtrack_level) = self.order_learnt(learnt);
                self.cancel_until(backtrack_level);
                let asserting = learnt[0];
                let cref = self.store_clause(id, learnt, true);
                self.enqueue(asserting, Some(cref));
                self.order.decay();
                continue;
            }
            if conflicts_since_restart >= self.restart_limit {
                self.statistics.restarts += 1;
                conflicts_since_restart = 0.0;
                self.restart_limit *= RESTART_FACTOR;
                self.cancel_until(0);
                if self.learnt_count as f64 >= self.max_learnts {
                    self.reduce_db(traverser);
                }
                continue;
            }
            match self.pick_branching_literal() {
                None => {
                    self.save_model();
                    return SatResult::Satisfiable;
                }
                Some(decision) => {
                    self.statistics.decisions += 1;
                    self.trail_limits.push(self.trail.len());
                    self.enqueue(decision, None);
                }
            }
        }
    }

    /// Propagate all assignments on the trail, returning a falsified clause
    /// if there is one.
    fn propagate(&mut self) -> Option<ClauseRef> {
        let mut conflict = None;
        while conflict.is_none() && self.propagated < self.trail.len() {
            let false_literal = -self.trail[self.propagated];
            self.propagated += 1;
            self.statistics.propagations += 1;
            let mut watchers = mem::take(&mut self.watches[false_literal]);
            let mut kept = 0;
            let mut index = 0;
            while index < watchers.len() {
                let cref = watchers[index];
                index += 1;
                let literals = &mut self.clauses[cref].literals;
                if literals[0] == false_literal {
                    literals.swap(0, 1);
                }
                let first = literals[0];
                if self.assigned[first] {
                    watchers[kept] = cref;
                    kept += 1;
                    continue;
                }
                let assigned = &self.assigned;
                let replacement = (2..literals.len()).find(|&k| !assigned[-literals[k]]);
                if let Some(k) = replacement {
                    literals.swap(1, k);
                    let watched = literals[1];
                    self.watches[watched].push(cref);
                    continue;
                }
                watchers[kept] = cref;
                kept += 1;
                if self.assigned[-first] {
                    conflict = Some(cref);
                    while index < watchers.len() {
                        watchers[kept] = watchers[index];
                        kept += 1;
                        index += 1;
                    }
                } else {
                    self.enqueue(first, Some(cref));
                }
            }
            watchers.truncate(kept);
            self.watches[false_literal] = watchers;
        }
        conflict
    }

    /// Derive a first-UIP clause from a conflict.
    ///
    /// Literals assigned at level 0 are kept, so the learnt clause is exactly
    /// the resolvent of the returned chain. The asserting literal is first.
    fn analyze(&mut self, conflict: ClauseRef) -> (Vector<Literal>, Vector<ClauseId>, Vector<Variable>) {
        let current_level = self.decision_level();
        let mut learnt = vector!(Literal::FALSE);
        let mut ids = vector!(self.clauses[conflict].id);
        let mut pivots = Vector::new();
        let mut open = 0;
        let mut index = self.trail.len();
        let mut clause = conflict;
        let mut resolved: Option<Literal> = None;
        loop {
            for k in 0..self.clauses[clause].literals.len() {
                let literal = self.clauses[clause].literals[k];
                if Some(literal) == resolved {
                    continue;
                }
                let variable = literal.variable();
                if self.seen[variable] {
                    continue;
                }
                self.seen[variable] = true;
                self.order.bump(variable);
                if self.level[variable] == current_level {
                    open += 1;
                } else {
                    learnt.push(literal);
                }
            }
            let uip = loop {
                index -= 1;
                let literal = self.trail[index];
                if self.seen[literal.variable()] {
                    break literal;
                }
            };
            self.seen[uip.variable()] = false;
            open -= 1;
            if open == 0 {
                learnt[0] = -uip;
                break;
            }
            let reason = self.reason[uip.variable()];
            invariant!(reason.is_some(), "implied literal without reason");
            clause = reason.unwrap_or(conflict);
            ids.push(self.clauses[clause].id);
            pivots.push(uip.variable());
            resolved = Some(uip);
        }
        for k in 1..learnt.len() {
            self.seen[learnt[k].variable()] = false;
        }
        (learnt, ids, pivots)
    }

    /// Move the literal with the highest level after the asserting literal
    /// and return the level where the clause becomes asserting.
    fn order_learnt(&self, mut learnt: Vector<Literal>) -> (Vector<Literal>, u32) {
        if learnt.len() == 1 {
            return (learnt, 0);
        }
        let mut highest = 1;
        for k in 2..learnt.len() {
            if self.level[learnt[k].variable()] > self.level[learnt[highest].variable()] {
                highest = k;
            }
        }
        learnt.swap(1, highest);
        let level = self.level[learnt[1].variable()];
        (learnt, level)
    }

    /// Derive the empty clause from a conflict at level 0 by resolving with
    /// the reasons of the trail, latest first.
    fn refute(&mut self, conflict: ClauseRef, traverser: &mut dyn ProofTraverser) {
        requires!(self.decision_level() == 0);
        let mut ids = vector!(self.clauses[conflict].id);
        let mut pivots = Vector::new();
        for &literal in &self.clauses[conflict].literals {
            self.seen[literal.variable()] = true;
        }
        for index in (0..self.trail.len()).rev() {
            let literal = self.trail[index];
            let variable = literal.variable();
            if !self.seen[variable] {
                continue;
            }
            self.seen[variable] = false;
            let reason = self.reason[variable];
            invariant!(reason.is_some(), "level 0 assignment without reason");
            if let Some(reason) = reason {
                ids.push(self.clauses[reason].id);
                pivots.push(variable);
                for &other in &self.clauses[reason].literals {
                    if other != literal {
                        self.seen[other.variable()] = true;
                    }
                }
            }
        }
        traverser.chain(&ids, &pivots);
        self.empty_clause = Some(self.next_clause_id());
    }

    fn is_locked(&self, cref: ClauseRef) -> bool {
        let first = self.clauses[cref].literals[0];
        self.assigned[first] && self.reason[first.variable()] == Some(cref)
    }

    /// Delete the longer half of the learnt clauses that are not reasons.
    fn reduce_db(&mut self, traverser: &mut dyn ProofTraverser) {
        requires!(self.decision_level() == 0);
        let mut candidates: Vector<ClauseRef> = (0..self.clauses.len())
            .filter(|&cref| {
                let clause = &self.clauses[cref];
                clause.learnt && !clause.deleted && clause.literals.len() > 2 && !self.is_locked(cref)
            })
            .collect();
        let clauses = &self.clauses;
        candidates.sort_by_key(|&cref| Reverse(clauses[cref].literals.len()));
        let half = candidates.len() / 2;
        for &cref in candidates.iter().take(half) {
            let clause = &mut self.clauses[cref];
            clause.deleted = true;
            clause.literals.clear();
            clause.literals.shrink_to_fit();
            traverser.deleted(clause.id);
            self.learnt_count -= 1;
            self.statistics.deleted += 1;
        }
        let clauses = &self.clauses;
        for watchers in self.watches.iter_mut() {
            watchers.retain(|&cref| !clauses[cref].deleted);
        }
        self.max_learnts *= LEARNT_FACTOR;
    }

    fn pick_branching_literal(&mut self) -> Option<Literal> {
        while let Some(variable) = self.order.pop() {
            if self.value(variable.literal()).is_none() {
                return Some(Literal::from_variable(variable, !self.phase[variable]));
            }
        }
        None
    }

    fn save_model(&mut self) {
        let mut model = Array::new(false, self.variable_count());
        for index in 0..self.variable_count() {
            let variable = Variable(index as u32);
            model[variable] = self.assigned[variable.literal()];
        }
        self.model = model;
    }
}

/// Sentinel position of a variable that is not in the heap.
const ABSENT: usize = usize::max_value();

/// A binary max-heap of variables ordered by activity.
#[derive(Debug, Clone, HeapSpace)]
struct VariableOrder {
    activity: Array<Variable, f64>,
    heap: Vector<Variable>,
    position: Array<Variable, usize>,
    increment: f64,
}

impl VariableOrder {
    fn new() -> VariableOrder {
        VariableOrder {
            activity: Array::default(),
            heap: Vector::new(),
            position: Array::default(),
            increment: 1.0,
        }
    }
    fn grow(&mut self, size: usize) {
        let old_size = self.position.size();
        self.activity.grow(size, 0.0);
        self.position.grow(size, ABSENT);
        for index in old_size..size {
            self.insert(Variable(index as u32));
        }
    }
    fn insert(&mut self, variable: Variable) {
        if self.position[variable] != ABSENT {
            return;
        }
        self.position[variable] = self.heap.len();
        self.heap.push(variable);
        self.sift_up(self.heap.len() - 1);
    }
    fn pop(&mut self) -> Option<Variable> {
        if self.heap.is_empty() {
            return None;
        }
        let top = self.heap[0];
        let last = self.heap.pop()?;
        self.position[top] = ABSENT;
        if !self.heap.is_empty() {
            self.heap[0] = last;
            self.position[last] = 0;
            self.sift_down(0);
        }
        Some(top)
    }
    fn bump(&mut self, variable: Variable) {
        self.activity[variable] += self.increment;
        if self.activity[variable] > 1e100 {
            for activity in self.activity.iter_mut() {
                *activity *= 1e-100;
            }
            self.increment *= 1e-100;
        }
        if self.position[variable] != ABSENT {
            self.sift_up(self.position[variable]);
        }
    }
    fn decay(&mut self) {
        self.increment /= 0.95;
    }
    fn sift_up(&mut self, mut index: usize) {
        let variable = self.heap[index];
        while index > 0 {
            let parent = (index - 1) / 2;
            if self.activity[self.heap[parent]] >= self.activity[variable] {
                break;
            }
            self.heap[index] = self.heap[parent];
            self.position[self.heap[index]] = index;
            index = parent;
        }
        self.heap[index] = variable;
        self.position[variable] = index;
    }
    fn sift_down(&mut self, mut index: usize) {
        let variable = self.heap[index];
        loop {
            let left = 2 * index + 1;
            if left >= self.heap.len() {
                break;
            }
            let right = left + 1;
            let child = if right < self.heap.len()
                && self.activity[self.heap[right]] > self.activity[self.heap[left]]
            {
                right
            } else {
                left
            };
            if self.activity[self.heap[child]] <= self.activity[variable] {
                break;
            }
            self.heap[index] = self.heap[child];
            self.position[self.heap[index]] = index;
            index = child;
        }
        self.heap[index] = variable;
        self.position[variable] = index;
    }
}
