#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
//! Clause quality bookkeeping and database reduction.
//!
//! Learnt clauses are ranked by their Literal Block Distance (LBD), the number of
//! distinct decision levels among their literals when they were last looked at,
//! and by an activity score that grows every time the clause takes part in a
//! conflict. Reduction periodically throws away the worse half of the learnt
//! clauses:
//! - clauses of length two are never candidates;
//! - a clause whose LBD recently improved is frozen and survives the next
//!   reduction once;
//! - if even the boundary clause of the worse half has a small LBD, the whole
//!   population is considered good and nothing is removed.

use crate::sat::clause::ClauseRef;
use crate::sat::clause_database::ClauseDatabase;
use crate::sat::configs::{ACTIVITY_RESCALE_FACTOR, ACTIVITY_RESCALE_LIMIT};
use crate::sat::literal::Literal;
use crate::sat::trail::Trail;
use ordered_float::OrderedFloat;
use std::cmp::Reverse;
use tracing::debug;

impl<L: Literal> ClauseDatabase<L> {
    /// Adds the current bump unit to the activity of `cref`, rescaling every learnt
    /// activity once the bumped value exceeds [`ACTIVITY_RESCALE_LIMIT`].
    #[allow(clippy::cast_possible_truncation)]
    pub fn bump_activity(&mut self, cref: ClauseRef) {
        let activity = self
            .arena
            .clause_mut(cref)
            .increase_activity(self.cla_inc as f32);
        if activity > ACTIVITY_RESCALE_LIMIT {
            self.rescale_activities();
        }
    }

    /// Scales all learnt activities and the bump unit down by the same factor,
    /// which keeps their relative order.
    fn rescale_activities(&mut self) {
        for &cref in &self.clauses {
            let mut clause = self.arena.clause_mut(cref);
            let view = clause.as_clause();
            if view.is_learnt() && !view.is_deleted() {
                let activity = view.activity();
                clause.set_activity(activity * ACTIVITY_RESCALE_FACTOR);
            }
        }
        self.cla_inc *= f64::from(ACTIVITY_RESCALE_FACTOR);
        self.stats.rescales += 1;
        debug!(cla_inc = self.cla_inc, "rescaled clause activities");
    }

    /// Recomputes the LBD of `cref` under the current trail. If it dropped by more
    /// than one, stores it and freezes the clause so the next reduction spares it.
    pub fn reduce_lbd(&mut self, trail: &mut Trail<L>, cref: ClauseRef) {
        let clause = self.arena.clause(cref);
        let stored = clause.lbd();
        let lbd = trail.compute_lbd(clause.literals());
        if lbd + 1 < stored {
            let mut clause = self.arena.clause_mut(cref);
            clause.set_lbd(lbd);
            clause.set_frozen(true);
        }
    }

    /// Updates the clauses involved in the last conflict analysis.
    ///
    /// For each learnt clause in `involved` the LBD is re-estimated and the
    /// activity bumped, each as enabled in the configuration. Original clauses are
    /// skipped. Afterwards the bump unit grows by `1 / clause_decay`, which decays
    /// all existing activities relative to future bumps. A bump unit beyond
    /// [`ACTIVITY_RESCALE_LIMIT`] triggers a rescale as well.
    ///
    /// # Arguments
    ///
    /// * `trail`: The trail at the time of the conflict, used for the LBD.
    /// * `involved`: Handles of the clauses that took part in the analysis.
    pub fn reestimate_clause_weights(&mut self, trail: &mut Trail<L>, involved: &[ClauseRef]) {
        for &cref in involved {
            let clause = self.arena.clause(cref);
            if !clause.is_learnt() || clause.is_deleted() {
                continue;
            }
            if self.config.reestimation_reduce_lbd {
                self.reduce_lbd(trail, cref);
            }
            if self.config.reestimation_bump_activity {
                self.bump_activity(cref);
            }
        }
        self.cla_inc /= self.config.clause_decay;
        if self.cla_inc > f64::from(ACTIVITY_RESCALE_LIMIT) {
            self.rescale_activities();
        }
    }

    /// Removes the worse half of the learnt clauses longer than two literals and
    /// returns their handles, so that the caller can detach them from the propagator.
    ///
    /// Candidates are ranked worst first by LBD descending, then activity
    /// ascending, ties keeping allocation order. The reduction is skipped when the
    /// candidate at the half-way boundary has an LBD of at most `persistent_lbd`.
    /// Frozen candidates in the worse half are unfrozen and kept; the next worse
    /// clauses are removed in their place so the quota is still met.
    pub fn reduce(&mut self) -> Vec<ClauseRef> {
        self.stats.reductions += 1;

        let mut candidates = self
            .clauses
            .iter()
            .copied()
            .filter_map(|cref| {
                let clause = self.arena.clause(cref);
                (clause.is_learnt() && !clause.is_deleted() && clause.len() > 2)
                    .then(|| (cref, clause.lbd(), clause.activity()))
            })
            .collect::<Vec<_>>();
        candidates.sort_by_key(|&(_, lbd, activity)| (Reverse(lbd), OrderedFloat(activity)));

        let quota = candidates.len() / 2;
        let boundary_lbd = quota.checked_sub(1).map(|i| candidates[i].1);
        if boundary_lbd.is_none_or(|lbd| lbd <= self.config.persistent_lbd) {
            self.stats.aborted_reductions += 1;
            debug!(
                candidates = candidates.len(),
                boundary_lbd, "learnt clauses good enough, skipping reduction"
            );
            return Vec::new();
        }

        let mut removed = Vec::with_capacity(quota);
        let mut unfrozen = 0_usize;
        for &(cref, ..) in &candidates {
            if removed.len() == quota {
                break;
            }
            if self.arena.clause(cref).is_frozen() {
                self.arena.clause_mut(cref).set_frozen(false);
                unfrozen += 1;
            } else {
                self.remove_clause(cref);
                removed.push(cref);
            }
        }

        self.stats.removed_by_reduce += removed.len() as u64;
        debug!(
            candidates = candidates.len(),
            removed = removed.len(),
            unfrozen,
            "reduced learnt clauses"
        );
        removed
    }
}
