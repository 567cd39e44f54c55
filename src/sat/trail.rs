#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
//! The assignment trail.
//!
//! The trail records assigned literals in order, partitioned into decision levels.
//! The propagator consumes it from `qhead` onwards and enqueues forced literals at
//! its end; backtracking is left to the search loop.

use crate::sat::assignment::VecAssignment;
use crate::sat::clause::ClauseRef;
use crate::sat::literal::{Literal, Variable};
use bit_vec::BitVec;
use std::ops::Index;

#[derive(Debug, Clone)]
pub struct Trail<L: Literal> {
    lits: Vec<L>,
    /// Index of the next literal the propagator has not looked at.
    pub qhead: usize,
    assignment: VecAssignment,
    levels: Vec<u32>,
    reasons: Vec<Option<ClauseRef>>,
    /// Trail length at the start of each decision level above 0.
    level_starts: Vec<usize>,
    level_seen: BitVec,
    touched_levels: Vec<usize>,
}

impl<L: Literal> Index<usize> for Trail<L> {
    type Output = L;

    fn index(&self, index: usize) -> &Self::Output {
        &self.lits[index]
    }
}

impl<L: Literal> Trail<L> {
    #[must_use]
    pub fn new(num_vars: usize) -> Self {
        Self {
            lits: Vec::with_capacity(num_vars),
            qhead: 0,
            assignment: VecAssignment::new(num_vars),
            levels: vec![0; num_vars + 1],
            reasons: vec![None; num_vars + 1],
            level_starts: Vec::new(),
            level_seen: BitVec::new(),
            touched_levels: Vec::new(),
        }
    }

    /// Makes room for variables up to and including `num_vars`.
    pub fn grow(&mut self, num_vars: usize) {
        self.assignment.grow(num_vars);
        if self.levels.len() < num_vars + 1 {
            self.levels.resize(num_vars + 1, 0);
            self.reasons.resize(num_vars + 1, None);
        }
    }

    #[must_use]
    pub fn num_vars(&self) -> usize {
        self.levels.len() - 1
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.lits.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.lits.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &L> {
        self.lits.iter()
    }

    #[must_use]
    pub fn value(&self, lit: L) -> Option<bool> {
        self.assignment.literal_value(lit)
    }

    #[must_use]
    pub const fn assignment(&self) -> &VecAssignment {
        &self.assignment
    }

    #[must_use]
    pub fn decision_level(&self) -> u32 {
        u32::try_from(self.level_starts.len()).expect("decision level overflowed u32")
    }

    #[must_use]
    pub fn level(&self, var: Variable) -> u32 {
        self.levels[var as usize]
    }

    #[must_use]
    pub fn reason(&self, var: Variable) -> Option<ClauseRef> {
        self.reasons[var as usize]
    }

    /// Whether `cref` is the reason of some assignment.
    #[must_use]
    pub fn is_reason(&self, cref: ClauseRef) -> bool {
        self.lits
            .iter()
            .any(|lit| self.reasons[lit.variable() as usize] == Some(cref))
    }

    pub fn new_decision_level(&mut self) {
        self.level_starts.push(self.lits.len());
    }

    /// Assigns `lit` true without checking for conflicts.
    ///
    /// The variable must be unassigned.
    pub fn unchecked_enqueue(&mut self, lit: L, reason: Option<ClauseRef>) {
        let var = lit.variable();
        debug_assert!(
            self.assignment[var].is_unassigned(),
            "variable {var} enqueued twice"
        );
        self.assignment.assign(lit);
        self.levels[var as usize] = self.decision_level();
        self.reasons[var as usize] = reason;
        self.lits.push(lit);
    }

    /// Undoes every assignment above `level`.
    pub fn backtrack_to(&mut self, level: u32) {
        let Some(&start) = self.level_starts.get(level as usize) else {
            return;
        };
        for lit in self.lits.drain(start..) {
            let var = lit.variable();
            self.assignment.unassign(var);
            self.reasons[var as usize] = None;
        }
        self.level_starts.truncate(level as usize);
        self.qhead = self.qhead.min(start);
    }

    /// Forgets the reasons of root-level assignments.
    ///
    /// Root-level facts never take part in conflict analysis, and dropping their
    /// reasons is what allows the clause database to relocate at level 0.
    pub fn release_root_reasons(&mut self) {
        let end = self.level_starts.first().copied().unwrap_or(self.lits.len());
        for lit in &self.lits[..end] {
            self.reasons[lit.variable() as usize] = None;
        }
    }

    /// Number of distinct decision levels among the assigned literals of `lits`.
    pub fn compute_lbd(&mut self, lits: impl IntoIterator<Item = L>) -> u32 {
        let levels = self.level_starts.len() + 1;
        if self.level_seen.len() < levels {
            self.level_seen.grow(levels - self.level_seen.len(), false);
        }

        let mut lbd = 0;
        for lit in lits {
            let var = lit.variable();
            if self.assignment[var].is_unassigned() {
                continue;
            }
            let level = self.levels[var as usize] as usize;
            if !self.level_seen[level] {
                self.level_seen.set(level, true);
                self.touched_levels.push(level);
                lbd += 1;
            }
        }

        for level in self.touched_levels.drain(..) {
            self.level_seen.set(level, false);
        }
        lbd
    }
}
