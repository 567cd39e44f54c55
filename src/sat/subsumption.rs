#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
//! Backward subsumption and self-subsuming resolution at decision level 0.
//!
//! Queued clauses are checked, one at a time, against every clause sharing their
//! least frequent variable. A clause `A` whose literals all occur in `B` makes `B`
//! redundant, and `B` is removed. If `B` contains `A` with exactly one literal
//! negated, that negated literal can be struck from `B`. Root-level assignments
//! take part as temporary unit clauses: they remove satisfied clauses and strike
//! false literals.
//!
//! The checks rely on the occurrence lists of the
//! [`ClauseDatabase`], which must be enabled with
//! [`init_occurrence_tracking`](ClauseDatabase::init_occurrence_tracking) first.

use crate::sat::clause::{ClauseRef, SubsumeResult, abstraction, subsumes};
use crate::sat::clause_database::{ClauseDatabase, Strengthened};
use crate::sat::configs::SubsumptionConfig;
use crate::sat::literal::Literal;
use crate::sat::propagation::Propagator;
use crate::sat::trail::Trail;
use rustc_hash::FxHashSet;
use smallvec::{SmallVec, smallvec};
use std::collections::VecDeque;
use tracing::debug;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SubsumptionStats {
    /// Pairs of clauses compared.
    pub checks: u64,
    pub subsumed: u64,
    /// Literals struck by self-subsuming resolution.
    pub strengthened: u64,
    /// Strengthenings that left a single literal.
    pub units: u64,
}

#[derive(Debug, Clone, Default)]
pub struct Subsumption {
    config: SubsumptionConfig,
    queue: VecDeque<ClauseRef>,
    queued: FxHashSet<ClauseRef>,
    /// Number of trail literals already used as unit subsumers.
    trail_checked: usize,
    stats: SubsumptionStats,
}

impl Subsumption {
    #[must_use]
    pub fn new(config: SubsumptionConfig) -> Self {
        Self {
            config,
            ..Self::default()
        }
    }

    /// Queues `cref` to be checked as a subsumer. Queuing twice has no effect.
    pub fn enqueue(&mut self, cref: ClauseRef) {
        if self.queued.insert(cref) {
            self.queue.push_back(cref);
        }
    }

    /// Queues every live clause of the database.
    pub fn enqueue_all<L: Literal>(&mut self, db: &ClauseDatabase<L>) {
        for cref in db.live_clauses() {
            self.enqueue(cref);
        }
    }

    fn pop(&mut self) -> Option<ClauseRef> {
        let cref = self.queue.pop_front()?;
        self.queued.remove(&cref);
        Some(cref)
    }

    #[must_use]
    pub fn queue_len(&self) -> usize {
        self.queue.len()
    }

    /// Drops all queued clauses. Needed before the database is defragmented.
    pub fn clear(&mut self) {
        self.queue.clear();
        self.queued.clear();
    }

    /// Restarts the scan of root-level assignments, e.g. after the trail was reset.
    pub fn reset_trail(&mut self) {
        self.trail_checked = 0;
    }

    #[must_use]
    pub const fn stats(&self) -> &SubsumptionStats {
        &self.stats
    }

    #[must_use]
    pub const fn config(&self) -> &SubsumptionConfig {
        &self.config
    }

    /// Runs until the queue is empty and every root-level assignment has been used
    /// as a unit subsumer.
    ///
    /// Subsumed clauses are detached and removed. Strengthened clauses are replaced
    /// by their shorter version, which is attached and queued in turn. Literals
    /// derived along the way are enqueued on the trail and propagated.
    ///
    /// Returns `false` if the formula was found unsatisfiable.
    ///
    /// # Panics
    ///
    /// If the database does not track occurrences.
    pub fn backward_subsumption_check<L: Literal>(
        &mut self,
        db: &mut ClauseDatabase<L>,
        propagator: &mut Propagator<L>,
        trail: &mut Trail<L>,
    ) -> bool {
        assert!(
            db.is_tracking_occurrences(),
            "backward subsumption needs occurrence lists"
        );
        debug_assert_eq!(trail.decision_level(), 0, "subsumption runs at the root");
        let before = self.stats;

        loop {
            let (subsumer, lits): (Option<ClauseRef>, SmallVec<[L; 8]>) =
                if let Some(cref) = self.pop() {
                    let clause = db.clause(cref);
                    if clause.is_deleted() {
                        continue;
                    }
                    (Some(cref), clause.literals().collect())
                } else if self.trail_checked < trail.len() {
                    let unit = trail[self.trail_checked];
                    self.trail_checked += 1;
                    (None, smallvec![unit])
                } else {
                    break;
                };

            if !self.check_subsumer(db, propagator, trail, subsumer, &lits) {
                debug!(stats = ?self.stats, "subsumption derived a conflict");
                return false;
            }
        }

        debug!(
            subsumed = self.stats.subsumed - before.subsumed,
            strengthened = self.stats.strengthened - before.strengthened,
            units = self.stats.units - before.units,
            "backward subsumption done"
        );
        true
    }

    /// Compares `lits` against the clauses of its least frequent variable.
    /// `subsumer` is `None` for a root-level assignment.
    fn check_subsumer<L: Literal>(
        &mut self,
        db: &mut ClauseDatabase<L>,
        propagator: &mut Propagator<L>,
        trail: &mut Trail<L>,
        subsumer: Option<ClauseRef>,
        lits: &[L],
    ) -> bool {
        let Some(best) = lits
            .iter()
            .map(|lit| lit.variable())
            .min_by_key(|&var| db.occurrences(var).len())
        else {
            return true;
        };
        let abs = abstraction(lits.iter().copied());
        let limit = self.config.subsumption_lim;

        for candidate in db.occurrences(best).to_vec() {
            if subsumer.is_some_and(|cref| db.clause(cref).is_deleted()) {
                break;
            }
            if Some(candidate) == subsumer {
                continue;
            }
            let clause = db.clause(candidate);
            if clause.is_deleted() || (limit != 0 && clause.len() >= limit) {
                continue;
            }

            self.stats.checks += 1;
            match subsumes(lits, abs, &clause) {
                SubsumeResult::Unrelated => {}
                SubsumeResult::Subsumes => {
                    let candidate_original = !clause.is_learnt();
                    if let Some(cref) = subsumer {
                        if candidate_original && db.clause(cref).is_learnt() {
                            db.make_persistent(cref);
                        }
                    }
                    propagator.detach_clause(db, candidate);
                    db.remove_clause(candidate);
                    self.stats.subsumed += 1;
                }
                SubsumeResult::Strengthens(lit) => {
                    self.stats.strengthened += 1;
                    if !self.strengthen(db, propagator, trail, candidate, lit.negated()) {
                        return false;
                    }
                }
            }
        }
        true
    }

    /// Strikes `lit` from `cref` and brings the watches and the trail up to date.
    fn strengthen<L: Literal>(
        &mut self,
        db: &mut ClauseDatabase<L>,
        propagator: &mut Propagator<L>,
        trail: &mut Trail<L>,
        cref: ClauseRef,
        lit: L,
    ) -> bool {
        propagator.detach_clause(db, cref);
        match db.strengthen(cref, lit) {
            Strengthened::Clause(new) => {
                propagator.attach_clause_under(db, trail, new);
                self.enqueue(new);
                Self::settle(db, propagator, trail, new)
            }
            Strengthened::Unit(unit) => {
                self.stats.units += 1;
                Self::assign_unit(db, propagator, trail, unit, None)
            }
        }
    }

    /// Handles a shortened clause that became unit or conflicting under the root
    /// assignment.
    fn settle<L: Literal>(
        db: &ClauseDatabase<L>,
        propagator: &mut Propagator<L>,
        trail: &mut Trail<L>,
        cref: ClauseRef,
    ) -> bool {
        let clause = db.clause(cref);
        if clause.literals().any(|lit| trail.value(lit) == Some(true)) {
            return true;
        }
        let mut open = clause.literals().filter(|&lit| trail.value(lit).is_none());
        match (open.next(), open.next()) {
            (None, _) => false,
            (Some(unit), None) => Self::assign_unit(db, propagator, trail, unit, Some(cref)),
            _ => true,
        }
    }

    fn assign_unit<L: Literal>(
        db: &ClauseDatabase<L>,
        propagator: &mut Propagator<L>,
        trail: &mut Trail<L>,
        unit: L,
        reason: Option<ClauseRef>,
    ) -> bool {
        match trail.value(unit) {
            Some(true) => true,
            Some(false) => false,
            None => {
                trail.unchecked_enqueue(unit, reason);
                propagator.propagate(trail, db).is_none()
            }
        }
    }
}
