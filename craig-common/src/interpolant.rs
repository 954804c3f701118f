//! Craig interpolants from resolution proofs
//!
//! The [Traverser](struct.Traverser.html) receives the proof of a solver and
//! builds one resolution tree per clause. Leaves of a tree refer to earlier
//! trees, so the forest is a DAG stored in an arena. Interpolants are
//! computed bottom-up and stored in each node exactly once.
//!
//! Input clauses from partition A get the interpolant false and those from B
//! true. A resolution step is combined according to its pivot: B-local
//! pivots conjoin, shared pivots split on the phase of the pivot, and all
//! other pivots disjoin. Non-constant interpolants are Tseitin-encoded, a
//! node then holds the label of its subformula.

use crate::{
    clause::ClauseId,
    config,
    formula::Formula,
    literal::{Literal, Variable},
    memory::{HeapSpace, Offset, Vector},
    solver::ProofTraverser,
    tseitin::{tseitin_and, tseitin_or, LabelAllocator},
};
use craig_macros::HeapSpace;
use std::collections::BTreeSet;

/// The side of the interpolation problem that supplies a clause.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Partition {
    A,
    B,
}

/// A constant, or the label of a Tseitin-encoded formula.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Interpolant {
    True,
    False,
    Label(Literal),
}

/// Index into the node arena.
pub type NodeRef = usize;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum NodeKind {
    /// An input clause; its interpolant is fixed when it is created.
    Premise,
    /// Stands for the tree of an earlier clause.
    Reference(ClauseId),
    /// Resolution on `pivot`; `negative` is the side with the negated pivot.
    Resolvent {
        pivot: Variable,
        negative: NodeRef,
        positive: NodeRef,
    },
}

#[derive(Debug, Clone, Copy)]
struct Node {
    kind: NodeKind,
    /// Written once
    interpolant: Option<Interpolant>,
}

/// How a pivot is eliminated.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PivotClass {
    ALocal,
    BLocal,
    Shared,
}

/// Classifies pivot variables.
#[derive(Debug, Clone, PartialEq)]
pub struct PivotClasses {
    /// Variables that both partitions mention
    pub shared: BTreeSet<Variable>,
    /// The lowest variable that only B mentions
    pub lowest_b: Variable,
    /// The highest variable that only B mentions
    pub highest_b: Variable,
}

impl PivotClasses {
    pub fn classify(&self, pivot: Variable) -> PivotClass {
        if pivot >= self.lowest_b && pivot <= self.highest_b {
            PivotClass::BLocal
        } else if self.shared.contains(&pivot) {
            PivotClass::Shared
        } else {
            PivotClass::ALocal
        }
    }
}

/// One resolution tree per clause, in the order of the clause identifiers.
#[derive(Debug, Clone, HeapSpace)]
pub struct ResolutionForest {
    nodes: Vector<Node>,
    /// Maps a clause identifier to the root of its tree
    roots: Vector<NodeRef>,
}

impl Default for ResolutionForest {
    fn default() -> ResolutionForest {
        ResolutionForest::new()
    }
}

impl ResolutionForest {
    pub fn new() -> ResolutionForest {
        ResolutionForest {
            nodes: Vector::new(),
            roots: Vector::new(),
        }
    }
    /// The number of trees.
    pub fn len(&self) -> usize {
        self.roots.len()
    }
    pub fn is_empty(&self) -> bool {
        self.roots.is_empty()
    }
    /// The number of nodes of all trees.
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }
    fn push(&mut self, kind: NodeKind, interpolant: Option<Interpolant>) -> NodeRef {
        self.nodes.push(Node { kind, interpolant });
        self.nodes.len() - 1
    }
    fn add_premise(&mut self, interpolant: Interpolant) {
        let node = self.push(NodeKind::Premise, Some(interpolant));
        self.roots.push(node);
    }
    fn reference(&mut self, clause: ClauseId) -> NodeRef {
        requires!(clause.as_offset() < self.roots.len(), "dangling clause {}", clause);
        self.push(NodeKind::Reference(clause), None)
    }
    fn resolvent(&mut self, pivot: Variable, negative: NodeRef, positive: NodeRef) -> NodeRef {
        self.push(
            NodeKind::Resolvent {
                pivot,
                negative,
                positive,
            },
            None,
        )
    }
    fn add_root(&mut self, node: NodeRef) {
        self.roots.push(node);
    }
    fn root(&self, clause: ClauseId) -> NodeRef {
        requires!(clause.as_offset() < self.roots.len(), "no tree for clause {}", clause);
        self.roots[clause.as_offset()]
    }
    /// The interpolant of a clause, if it has been computed.
    pub fn interpolant_of(&self, clause: ClauseId) -> Option<Interpolant> {
        self.nodes[self.root(clause)].interpolant
    }

    /// Compute the interpolant of a clause.
    ///
    /// Labels come from `labels`, their definitions are appended to `result`.
    /// Nodes that already have an interpolant are not visited again, so
    /// repeated calls and shared subtrees cost nothing.
    pub fn compute_interpolant(
        &mut self,
        clause: ClauseId,
        classes: &PivotClasses,
        labels: &mut LabelAllocator,
        result: &mut Formula,
    ) -> Interpolant {
        let root = self.root(clause);
        let mut stack = vector!(root);
        while !stack.is_empty() {
            let node = *stack.last();
            if self.nodes[node].interpolant.is_some() {
                stack.pop();
                continue;
            }
            match self.nodes[node].kind {
                NodeKind::Premise => {
                    invariant!(false, "premise without interpolant");
                    stack.pop();
                }
                NodeKind::Reference(target) => {
                    let target = self.root(target);
                    invariant!(target != node);
                    match self.nodes[target].interpolant {
                        Some(interpolant) => {
                            self.nodes[node].interpolant = Some(interpolant);
                            stack.pop();
                        }
                        None => stack.push(target),
                    }
                }
                NodeKind::Resolvent {
                    pivot,
                    negative,
                    positive,
                } => match (self.nodes[negative].interpolant, self.nodes[positive].interpolant) {
                    (Some(negative), Some(positive)) => {
                        let interpolant = match classes.classify(pivot) {
                            PivotClass::BLocal => resolve_b(negative, positive, labels, result),
                            PivotClass::Shared => {
                                resolve_shared(pivot, negative, positive, labels, result)
                            }
                            PivotClass::ALocal => resolve_a(negative, positive, labels, result),
                        };
                        self.nodes[node].interpolant = Some(interpolant);
                        stack.pop();
                    }
                    (negative_interpolant, positive_interpolant) => {
                        if positive_interpolant.is_none() {
                            stack.push(positive);
                        }
                        if negative_interpolant.is_none() {
                            stack.push(negative);
                        }
                    }
                },
            }
        }
        let interpolant = self.nodes[root].interpolant;
        invariant!(interpolant.is_some());
        interpolant.unwrap_or(Interpolant::True)
    }
}

/// Conjunction with constant propagation.
fn resolve_b(
    negative: Interpolant,
    positive: Interpolant,
    labels: &mut LabelAllocator,
    result: &mut Formula,
) -> Interpolant {
    match (negative, positive) {
        (Interpolant::False, _) | (_, Interpolant::False) => Interpolant::False,
        (Interpolant::True, other) | (other, Interpolant::True) => other,
        (Interpolant::Label(x), Interpolant::Label(y)) => {
            let label = labels.fresh();
            tseitin_and(result, label, x, y);
            Interpolant::Label(label)
        }
    }
}

/// Disjunction with constant propagation.
fn resolve_a(
    negative: Interpolant,
    positive: Interpolant,
    labels: &mut LabelAllocator,
    result: &mut Formula,
) -> Interpolant {
    match (negative, positive) {
        (Interpolant::True, _) | (_, Interpolant::True) => Interpolant::True,
        (Interpolant::False, other) | (other, Interpolant::False) => other,
        (Interpolant::Label(x), Interpolant::Label(y)) => {
            let label = labels.fresh();
            tseitin_or(result, label, x, y);
            Interpolant::Label(label)
        }
    }
}

/// `(pivot ∨ I⁺) ∧ (¬pivot ∨ I⁻)`, where `I⁺` belongs to the side that
/// contains the pivot positively.
///
/// A true side contributes nothing and a false side contributes just the
/// pivot literal.
fn resolve_shared(
    pivot: Variable,
    negative: Interpolant,
    positive: Interpolant,
    labels: &mut LabelAllocator,
    result: &mut Formula,
) -> Interpolant {
    let mut conjuncts = Vector::new();
    for &(literal, interpolant) in &[(pivot.literal(), positive), (-pivot.literal(), negative)] {
        match interpolant {
            Interpolant::True => (),
            Interpolant::False => conjuncts.push(literal),
            Interpolant::Label(other) => {
                let label = labels.fresh();
                tseitin_or(result, label, literal, other);
                conjuncts.push(label);
            }
        }
    }
    match conjuncts.len() {
        0 => Interpolant::True,
        1 => Interpolant::Label(conjuncts[0]),
        _ => {
            let label = labels.fresh();
            tseitin_and(result, label, conjuncts[0], conjuncts[1]);
            Interpolant::Label(label)
        }
    }
}

/// Builds the resolution forest from the proof events of a solver.
///
/// Set `partition` before each solve call to tag the roots of the clauses
/// added since the previous call.
#[derive(Debug, Clone, HeapSpace)]
pub struct Traverser {
    pub partition: Partition,
    /// The literals of each clause, emptied when it is deleted
    clauses: Vector<Vector<Literal>>,
    pub forest: ResolutionForest,
}

impl Traverser {
    pub fn new(partition: Partition) -> Traverser {
        Traverser {
            partition,
            clauses: Vector::new(),
            forest: ResolutionForest::new(),
        }
    }
    /// The literals of a clause, unless it was deleted.
    pub fn clause(&self, clause: ClauseId) -> &[Literal] {
        &self.clauses[clause.as_offset()]
    }
}

/// Resolve `resolvent` with `other` on `pivot`, returning whether the
/// resolvent contained the negated pivot.
fn resolve(resolvent: &mut Vector<Literal>, other: &[Literal], pivot: Variable) -> bool {
    let own = resolvent.iter().cloned().find(|literal| literal.variable() == pivot);
    requires!(own.is_some(), "pivot {} is not in the resolvent", pivot);
    let negated = own.map_or(false, Literal::is_negated);
    if config::CHECK_RESOLVENTS {
        let opposite = Literal::from_variable(pivot, !negated);
        invariant!(other.contains(&opposite), "pivot {} has the same phase in both clauses", pivot);
    }
    resolvent.retain(|literal| literal.variable() != pivot);
    for &literal in other {
        if literal.variable() != pivot {
            resolvent.push(literal);
        }
    }
    resolvent.sort_unique();
    negated
}

impl ProofTraverser for Traverser {
    fn root(&mut self, clause: &[Literal]) {
        let mut literals: Vector<Literal> = clause.iter().cloned().collect();
        literals.sort_unique();
        self.clauses.push(literals);
        self.forest.add_premise(match self.partition {
            Partition::A => Interpolant::False,
            Partition::B => Interpolant::True,
        });
    }
    fn chain(&mut self, clauses: &[ClauseId], pivots: &[Variable]) {
        requires!(clauses.len() == pivots.len() + 1);
        let mut resolvent = self.clauses[clauses[0].as_offset()].clone();
        let mut node = self.forest.reference(clauses[0]);
        for (&clause, &pivot) in clauses[1..].iter().zip(pivots) {
            let negated = resolve(&mut resolvent, &self.clauses[clause.as_offset()], pivot);
            let leaf = self.forest.reference(clause);
            node = if negated {
                self.forest.resolvent(pivot, node, leaf)
            } else {
                self.forest.resolvent(pivot, leaf, node)
            };
        }
        self.clauses.push(resolvent);
        self.forest.add_root(node);
    }
    fn deleted(&mut self, clause: ClauseId) {
        let literals = &mut self.clauses[clause.as_offset()];
        literals.clear();
        literals.shrink_to_fit();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::solver::{
        tests::{eager_solver, pigeonhole, XorShift},
        SatResult::{self, Satisfiable, Unsatisfiable},
        Solver,
    };

    fn lit(variable: u32, negated: bool) -> Literal {
        Literal::from_variable(Variable(variable), negated)
    }

    fn solve(formulas: &[&Formula], units: &[Literal]) -> SatResult {
        let mut solver = Solver::new();
        for formula in formulas {
            solver.add_formula(formula);
        }
        for &unit in units {
            solver.add_clause(&[unit]);
        }
        solver.solve()
    }

    fn formula(clauses: &[Vec<Literal>]) -> Formula {
        let mut formula = Formula::new();
        for clause in clauses {
            formula.add_clause(clause);
        }
        formula
    }

    /// Solve B, then A on the same solver, and compute the interpolant of
    /// the refutation. Returns `None` if A ∧ B is satisfiable.
    fn interpolate(
        a: &Formula,
        b: &Formula,
        classes: &PivotClasses,
        first_label: Variable,
    ) -> Option<(Interpolant, Formula)> {
        interpolate_with(&mut Solver::new(), a, b, classes, first_label)
    }

    fn interpolate_with(
        solver: &mut Solver,
        a: &Formula,
        b: &Formula,
        classes: &PivotClasses,
        first_label: Variable,
    ) -> Option<(Interpolant, Formula)> {
        let mut traverser = Traverser::new(Partition::B);
        solver.add_formula(b);
        solver.solve_with_proof(&mut traverser);
        traverser.partition = Partition::A;
        solver.add_formula(a);
        if solver.solve_with_proof(&mut traverser) == Satisfiable {
            return None;
        }
        let root = solver.empty_clause()?;
        let mut labels = LabelAllocator::new(first_label);
        let mut definitions = Formula::new();
        let interpolant =
            traverser
                .forest
                .compute_interpolant(root, classes, &mut labels, &mut definitions);
        Some((interpolant, definitions))
    }

    /// A ⇒ I, I ∧ B is unsatisfiable, and I only mentions shared variables
    /// and labels.
    fn assert_valid(
        a: &Formula,
        b: &Formula,
        classes: &PivotClasses,
        first_label: Variable,
        interpolant: Interpolant,
        definitions: &Formula,
    ) {
        let allowed = |variable: Variable| variable >= first_label || classes.shared.contains(&variable);
        for clause in definitions.iter() {
            assert!(clause.iter().all(|literal| allowed(literal.variable())));
        }
        match interpolant {
            Interpolant::True => assert_eq!(solve(&[b], &[]), Unsatisfiable),
            Interpolant::False => assert_eq!(solve(&[a], &[]), Unsatisfiable),
            Interpolant::Label(label) => {
                assert!(allowed(label.variable()));
                assert_eq!(solve(&[a, definitions], &[-label]), Unsatisfiable);
                assert_eq!(solve(&[b, definitions], &[label]), Unsatisfiable);
            }
        }
    }

    #[test]
    fn interpolant_of_a_chain() {
        // A: a, a → s    B: ¬s
        let a = formula(&[vec![lit(4, false)], vec![lit(4, true), lit(1, false)]]);
        let b = formula(&[vec![lit(1, true)]]);
        let classes = PivotClasses {
            shared: vec![Variable(1)].into_iter().collect(),
            lowest_b: Variable(5),
            highest_b: Variable(5),
        };
        let first_label = Variable(10);
        let (interpolant, definitions) = interpolate(&a, &b, &classes, first_label).unwrap();
        assert_valid(&a, &b, &classes, first_label, interpolant, &definitions);
        // The interpolant is equivalent to s.
        match interpolant {
            Interpolant::Label(label) => {
                let s = lit(1, false);
                assert_eq!(solve(&[&definitions], &[label, -s]), Unsatisfiable);
                assert_eq!(solve(&[&definitions], &[-label, s]), Unsatisfiable);
            }
            constant => panic!("unexpected interpolant {:?}", constant),
        }
    }

    #[test]
    fn b_alone_is_unsatisfiable() {
        let a = formula(&[vec![lit(4, false)]]);
        let b = formula(&[vec![lit(7, false)], vec![lit(7, true)]]);
        let classes = PivotClasses {
            shared: BTreeSet::new(),
            lowest_b: Variable(7),
            highest_b: Variable(9),
        };
        let (interpolant, definitions) = interpolate(&a, &b, &classes, Variable(10)).unwrap();
        assert_eq!(interpolant, Interpolant::True);
        assert!(definitions.is_empty());
    }

    #[test]
    fn a_alone_is_unsatisfiable() {
        let a = formula(&[vec![lit(4, false)], vec![lit(4, true)]]);
        let b = formula(&[vec![lit(7, false), lit(1, false)]]);
        let classes = PivotClasses {
            shared: vec![Variable(1)].into_iter().collect(),
            lowest_b: Variable(7),
            highest_b: Variable(9),
        };
        let (interpolant, _) = interpolate(&a, &b, &classes, Variable(10)).unwrap();
        assert_eq!(interpolant, Interpolant::False);
    }

    #[test]
    fn shared_pivot_cases() {
        let pivot = Variable(2);
        let mut labels = LabelAllocator::new(Variable(10));
        let mut result = Formula::new();
        assert_eq!(
            resolve_shared(pivot, Interpolant::True, Interpolant::True, &mut labels, &mut result),
            Interpolant::True
        );
        assert_eq!(
            resolve_shared(pivot, Interpolant::True, Interpolant::False, &mut labels, &mut result),
            Interpolant::Label(pivot.literal())
        );
        assert_eq!(
            resolve_shared(pivot, Interpolant::False, Interpolant::True, &mut labels, &mut result),
            Interpolant::Label(-pivot.literal())
        );
        assert!(result.is_empty());
        let other = lit(5, false);
        let label = resolve_shared(
            pivot,
            Interpolant::False,
            Interpolant::Label(other),
            &mut labels,
            &mut result,
        );
        // One disjunction and one conjunction.
        assert_eq!(result.len(), 6);
        assert_eq!(label, Interpolant::Label(lit(11, false)));
        assert_eq!(labels.next_free(), Variable(12));
    }

    #[test]
    fn constants_propagate_without_labels() {
        let mut labels = LabelAllocator::new(Variable(10));
        let mut result = Formula::new();
        let x = Interpolant::Label(lit(3, true));
        assert_eq!(resolve_b(Interpolant::True, x, &mut labels, &mut result), x);
        assert_eq!(resolve_b(x, Interpolant::False, &mut labels, &mut result), Interpolant::False);
        assert_eq!(resolve_a(Interpolant::False, x, &mut labels, &mut result), x);
        assert_eq!(resolve_a(x, Interpolant::True, &mut labels, &mut result), Interpolant::True);
        assert!(result.is_empty());
        assert_eq!(labels.next_free(), Variable(10));
    }

    #[test]
    fn memoized_interpolants_are_not_recomputed() {
        let a = formula(&[
            vec![lit(4, false), lit(1, false)],
            vec![lit(4, true), lit(2, false)],
        ]);
        let b = formula(&[vec![lit(1, true)], vec![lit(2, true)]]);
        let classes = PivotClasses {
            shared: vec![Variable(1), Variable(2)].into_iter().collect(),
            lowest_b: Variable(7),
            highest_b: Variable(9),
        };
        let mut solver = Solver::new();
        let mut traverser = Traverser::new(Partition::B);
        solver.add_formula(&b);
        solver.solve_with_proof(&mut traverser);
        traverser.partition = Partition::A;
        solver.add_formula(&a);
        assert_eq!(solver.solve_with_proof(&mut traverser), Unsatisfiable);
        let root = solver.empty_clause().unwrap();
        let mut labels = LabelAllocator::new(Variable(10));
        let mut definitions = Formula::new();
        let first = traverser.forest.compute_interpolant(root, &classes, &mut labels, &mut definitions);
        let clauses = definitions.len();
        let second = traverser.forest.compute_interpolant(root, &classes, &mut labels, &mut definitions);
        assert_eq!(first, second);
        assert_eq!(definitions.len(), clauses);
        assert_eq!(traverser.forest.interpolant_of(root), Some(first));
        assert_valid(&a, &b, &classes, Variable(10), first, &definitions);
    }

    #[test]
    fn deleted_clauses_keep_the_forest_intact() {
        // A: every pigeon sits in some hole.  B: no hole holds two pigeons.
        let (pigeons, holes) = (6, 5);
        let clauses = pigeonhole(pigeons, holes);
        let a = formula(&clauses[..pigeons as usize]);
        let b = formula(&clauses[pigeons as usize..]);
        let classes = PivotClasses {
            shared: (1..=pigeons * holes).map(Variable).collect(),
            lowest_b: Variable(100),
            highest_b: Variable(100),
        };
        let first_label = Variable(200);
        let mut solver = eager_solver();
        let (interpolant, definitions) =
            interpolate_with(&mut solver, &a, &b, &classes, first_label).unwrap();
        assert!(solver.statistics().deleted > 0);
        assert_valid(&a, &b, &classes, first_label, interpolant, &definitions);
    }

    #[test]
    fn random_partitions_yield_valid_interpolants() {
        // Shared 1..=3, A-local 4..=6, B-local 7..=9.
        let classes = PivotClasses {
            shared: (1..=3).map(Variable).collect(),
            lowest_b: Variable(7),
            highest_b: Variable(9),
        };
        let first_label = Variable(10);
        let mut random = XorShift(0x9e37_79b9_7f4a_7c15);
        let mut refuted = 0;
        for _ in 0..300 {
            let mut side = |first_local: u32| {
                let mut formula = Formula::new();
                for _ in 0..(5 + random.below(6)) {
                    let width = 1 + random.below(3);
                    let clause: Vector<Literal> = (0..width)
                        .map(|_| {
                            if random.below(2) == 0 {
                                random.literal(1, 3)
                            } else {
                                random.literal(first_local, 3)
                            }
                        })
                        .collect();
                    formula.add_clause(&clause);
                }
                formula
            };
            let a = side(4);
            let b = side(7);
            if let Some((interpolant, definitions)) = interpolate(&a, &b, &classes, first_label) {
                refuted += 1;
                assert_valid(&a, &b, &classes, first_label, interpolant, &definitions);
            }
        }
        assert!(refuted > 20);
    }
}
