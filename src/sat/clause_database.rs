#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
//! The clause database.
//!
//! The database owns every clause record (through a [`ClauseArena`]), the list of
//! live clause handles, the binary watch lists and, on demand, per-variable
//! occurrence lists. Long-clause watches belong to the
//! [`Propagator`](crate::sat::propagation::Propagator), which has to be told about
//! additions and removals by the caller.
//!
//! Removal only marks a record as deleted. The storage is reclaimed by
//! [`ClauseDatabase::defrag`], which invalidates every outstanding handle, so the
//! propagator has to be rebuilt afterwards and the trail must not hold reasons.
//!
//! Activity bumping, LBD reestimation and reduction live in
//! [`clause_management`](crate::sat::clause_management).

use crate::sat::certificate::Certificate;
use crate::sat::clause::{Clause, ClauseHeader, ClauseMut, ClauseRef};
use crate::sat::clause_storage::ClauseArena;
use crate::sat::configs::DatabaseConfig;
use crate::sat::literal::{DoubleLiteral, Literal, Variable};
use crate::sat::watch::{BinaryWatcher, WatchLists};
use smallvec::SmallVec;
use tracing::debug;

/// Counters kept by the database.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct DatabaseStats {
    pub reductions: u64,
    pub aborted_reductions: u64,
    pub removed_by_reduce: u64,
    pub defrags: u64,
    pub rescales: u64,
}

/// Result of striking a literal from a clause.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Strengthened<L: Literal> {
    /// The shortened clause, stored under a new handle.
    Clause(ClauseRef),
    /// Only this literal remained. Nothing was stored for it.
    Unit(L),
}

#[derive(Debug)]
pub struct ClauseDatabase<L: Literal = DoubleLiteral> {
    pub(crate) arena: ClauseArena<L>,
    /// Handles in allocation order. Deleted clauses stay here until
    /// [`cleanup`](Self::cleanup) or [`defrag`](Self::defrag).
    pub(crate) clauses: Vec<ClauseRef>,
    binary_watchers: WatchLists<BinaryWatcher<L>>,
    occurrences: Option<Vec<Vec<ClauseRef>>>,
    num_vars: usize,
    /// Current activity bump unit.
    pub(crate) cla_inc: f64,
    pub(crate) config: DatabaseConfig,
    pub(crate) certificate: Certificate,
    pub(crate) stats: DatabaseStats,
}

impl<L: Literal> Default for ClauseDatabase<L> {
    fn default() -> Self {
        Self::new(0, DatabaseConfig::default())
    }
}

impl<L: Literal> ClauseDatabase<L> {
    #[must_use]
    pub fn new(num_vars: usize, config: DatabaseConfig) -> Self {
        Self {
            arena: ClauseArena::new(config.page_words),
            clauses: Vec::new(),
            binary_watchers: WatchLists::new(num_vars),
            occurrences: None,
            num_vars,
            cla_inc: 1.0,
            config,
            certificate: Certificate::disabled(),
            stats: DatabaseStats::default(),
        }
    }

    /// Reports learnt clauses, strengthenings and removals to `certificate`.
    #[must_use]
    pub fn with_certificate(mut self, certificate: Certificate) -> Self {
        self.certificate = certificate;
        self
    }

    pub fn set_certificate(&mut self, certificate: Certificate) {
        self.certificate = certificate;
    }

    /// Makes room for variables up to and including `num_vars`.
    pub fn grow(&mut self, num_vars: usize) {
        if num_vars <= self.num_vars {
            return;
        }
        self.num_vars = num_vars;
        self.binary_watchers.grow(num_vars);
        if let Some(occurrences) = self.occurrences.as_mut() {
            occurrences.resize_with(num_vars + 1, Vec::new);
        }
    }

    /// Stores a clause.
    ///
    /// Learnt clauses start with an LBD equal to their length and are reported to
    /// the certificate. Binary clauses are registered in the binary watch lists;
    /// longer ones still need [`Propagator::attach_clause`](crate::sat::propagation::Propagator::attach_clause).
    ///
    /// # Arguments
    ///
    /// * `lits`: The literals of the clause, in the order they are stored.
    /// * `learnt`: Whether the clause was derived during search.
    ///
    /// # Panics
    ///
    /// If `lits` is empty.
    pub fn add_clause(&mut self, lits: &[L], learnt: bool) -> ClauseRef {
        let lbd = if learnt {
            u32::try_from(lits.len()).unwrap_or(u32::MAX)
        } else {
            0
        };
        if learnt {
            self.certificate.added(lits.iter().copied());
        }
        self.insert(lits, ClauseHeader::new(learnt, lbd))
    }

    /// Stores a learnt clause with a known LBD.
    pub fn add_learnt(&mut self, lits: &[L], lbd: u32) -> ClauseRef {
        self.certificate.added(lits.iter().copied());
        self.insert(lits, ClauseHeader::new(true, lbd))
    }

    fn insert(&mut self, lits: &[L], header: ClauseHeader) -> ClauseRef {
        if let Some(max_var) = lits.iter().map(|lit| lit.variable() as usize).max() {
            self.grow(max_var);
        }

        let cref = self.arena.allocate(lits, header);
        self.clauses.push(cref);

        if let [first, second] = *lits {
            self.binary_watchers[first.negated()].push(BinaryWatcher {
                clause: cref,
                other: second,
            });
            self.binary_watchers[second.negated()].push(BinaryWatcher {
                clause: cref,
                other: first,
            });
        }

        if let Some(occurrences) = self.occurrences.as_mut() {
            for lit in lits {
                occurrences[lit.variable() as usize].push(cref);
            }
        }
        cref
    }

    /// Deletes a clause.
    ///
    /// The record is only marked; it stays readable until the next
    /// [`defrag`](Self::defrag). A long clause must also be detached from the
    /// propagator by the caller.
    pub fn remove_clause(&mut self, cref: ClauseRef) {
        let clause = self.arena.clause(cref);
        debug_assert!(!clause.is_deleted(), "clause {cref:?} removed twice");
        self.certificate.removed(clause.literals());
        self.tombstone(cref);
    }

    /// Marks `cref` deleted and drops it from the binary and occurrence lists.
    fn tombstone(&mut self, cref: ClauseRef) {
        let lits: SmallVec<[L; 8]> = self.arena.clause(cref).literals().collect();

        if let [first, second] = lits[..] {
            for lit in [first, second] {
                let found = self
                    .binary_watchers
                    .remove_first(lit.negated(), |w| w.clause == cref);
                if !found {
                    debug!(clause = ?cref, literal = ?lit, "binary watcher already gone");
                }
            }
        }

        if let Some(occurrences) = self.occurrences.as_mut() {
            for lit in &lits {
                let list = &mut occurrences[lit.variable() as usize];
                if let Some(i) = list.iter().position(|&c| c == cref) {
                    list.swap_remove(i);
                }
            }
        }

        self.arena.clause_mut(cref).set_deleted();
    }

    /// Strikes `lit` from the clause `cref`.
    ///
    /// The old record is deleted and the shorter clause is stored under a new
    /// handle. It keeps the learnt and frozen flags and the activity of the old one,
    /// with its LBD capped by its new length. The new clause is not attached to the
    /// propagator. A clause shortened to a single literal is not stored at all.
    ///
    /// # Panics
    ///
    /// If the clause does not contain `lit`.
    pub fn strengthen(&mut self, cref: ClauseRef, lit: L) -> Strengthened<L> {
        let clause = self.arena.clause(cref);
        assert!(
            clause.contains(lit),
            "cannot strike {lit:?} from clause {cref:?}, it does not occur there"
        );
        let old: SmallVec<[L; 8]> = clause.literals().collect();
        let header = clause.header();
        let activity = clause.activity();

        self.certificate.strengthened(&old, lit);
        self.tombstone(cref);

        let lits: SmallVec<[L; 8]> = old.iter().copied().filter(|&l| l != lit).collect();
        if let [unit] = lits[..] {
            return Strengthened::Unit(unit);
        }

        let len = u32::try_from(lits.len()).unwrap_or(u32::MAX);
        let mut new_header = ClauseHeader::new(header.learnt(), header.lbd().min(len));
        new_header.set_frozen(header.frozen());
        let new = self.insert(&lits, new_header);
        self.arena.clause_mut(new).set_activity(activity);
        Strengthened::Clause(new)
    }

    /// Turns a learnt clause into an original one, so reduction never removes it.
    pub fn make_persistent(&mut self, cref: ClauseRef) {
        self.arena.clause_mut(cref).set_persistent();
    }

    /// Drops deleted clauses from the handle list and returns how many there were.
    pub fn cleanup(&mut self) -> usize {
        let before = self.clauses.len();
        let arena = &self.arena;
        self.clauses.retain(|&cref| !arena.clause(cref).is_deleted());
        before - self.clauses.len()
    }

    /// Compacts the arena.
    ///
    /// Every handle issued before the call becomes stale. Binary watch lists and
    /// occurrence lists are rebuilt here; the propagator has to be rebuilt with
    /// [`Propagator::rebuild`](crate::sat::propagation::Propagator::rebuild), and no
    /// trail entry may still use a clause as its reason.
    pub fn defrag(&mut self) {
        let before = self.arena.used_words();
        self.clauses = self.arena.relocate(true);
        self.rebuild_binary_watchers();
        if self.occurrences.is_some() {
            self.rebuild_occurrences();
        }
        self.stats.defrags += 1;
        debug!(
            clauses = self.clauses.len(),
            words_before = before,
            words_after = self.arena.used_words(),
            "defragmented clause arena"
        );
    }

    fn rebuild_binary_watchers(&mut self) {
        self.binary_watchers.clear();
        for &cref in &self.clauses {
            let clause = self.arena.clause(cref);
            if clause.len() == 2 {
                let (first, second) = (clause.first(), clause.second());
                self.binary_watchers[first.negated()].push(BinaryWatcher {
                    clause: cref,
                    other: second,
                });
                self.binary_watchers[second.negated()].push(BinaryWatcher {
                    clause: cref,
                    other: first,
                });
            }
        }
    }

    fn rebuild_occurrences(&mut self) {
        let mut occurrences = vec![Vec::new(); self.num_vars + 1];
        for &cref in &self.clauses {
            let clause = self.arena.clause(cref);
            if clause.is_deleted() {
                continue;
            }
            for lit in clause.literals() {
                occurrences[lit.variable() as usize].push(cref);
            }
        }
        self.occurrences = Some(occurrences);
    }

    /// Starts maintaining, for every variable, the clauses it occurs in.
    pub fn init_occurrence_tracking(&mut self, num_vars: usize) {
        self.grow(num_vars);
        self.rebuild_occurrences();
    }

    pub fn stop_occurrence_tracking(&mut self) {
        self.occurrences = None;
    }

    #[must_use]
    pub const fn is_tracking_occurrences(&self) -> bool {
        self.occurrences.is_some()
    }

    /// Live clauses containing `var`, or nothing when occurrences are not tracked.
    #[must_use]
    pub fn occurrences(&self, var: Variable) -> &[ClauseRef] {
        self.occurrences
            .as_ref()
            .and_then(|occurrences| occurrences.get(var as usize))
            .map_or(&[][..], Vec::as_slice)
    }

    /// Binary clauses containing `!lit`, i.e. those that may become unit when `lit`
    /// is assigned true.
    #[must_use]
    pub fn binary_watchers(&self, lit: L) -> &[BinaryWatcher<L>] {
        if lit.variable() as usize > self.num_vars {
            return &[];
        }
        &self.binary_watchers[lit]
    }

    /// # Panics
    ///
    /// If `cref` is stale.
    #[must_use]
    pub fn clause(&self, cref: ClauseRef) -> Clause<'_, L> {
        self.arena.clause(cref)
    }

    /// # Panics
    ///
    /// If `cref` is stale.
    pub fn clause_mut(&mut self, cref: ClauseRef) -> ClauseMut<'_, L> {
        self.arena.clause_mut(cref)
    }

    /// All handles, deleted clauses included until the next cleanup.
    #[must_use]
    pub fn clauses(&self) -> &[ClauseRef] {
        &self.clauses
    }

    pub fn live_clauses(&self) -> impl Iterator<Item = ClauseRef> + '_ {
        self.clauses
            .iter()
            .copied()
            .filter(|&cref| !self.arena.clause(cref).is_deleted())
    }

    #[must_use]
    pub fn num_clauses(&self) -> usize {
        self.live_clauses().count()
    }

    #[must_use]
    pub fn num_learnts(&self) -> usize {
        self.live_clauses()
            .filter(|&cref| self.arena.clause(cref).is_learnt())
            .count()
    }

    #[must_use]
    pub const fn num_vars(&self) -> usize {
        self.num_vars
    }

    #[must_use]
    pub const fn arena(&self) -> &ClauseArena<L> {
        &self.arena
    }

    #[must_use]
    pub const fn config(&self) -> &DatabaseConfig {
        &self.config
    }

    #[must_use]
    pub const fn stats(&self) -> &DatabaseStats {
        &self.stats
    }

    #[must_use]
    pub const fn certificate(&self) -> &Certificate {
        &self.certificate
    }

    pub const fn certificate_mut(&mut self) -> &mut Certificate {
        &mut self.certificate
    }

    #[must_use]
    pub const fn cla_inc(&self) -> f64 {
        self.cla_inc
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    type Lit = DoubleLiteral;

    fn lits(v: &[i32]) -> Vec<Lit> {
        v.iter().map(|&l| Lit::from_i32(l)).collect()
    }

    fn small_db() -> ClauseDatabase<Lit> {
        ClauseDatabase::new(4, DatabaseConfig::default().with_page_words(64))
    }

    #[test]
    fn test_add_clause_headers() {
        let mut db = small_db();
        let a = db.add_clause(&lits(&[1, 2, 3]), false);
        let b = db.add_clause(&lits(&[1, -2, 3, 4]), true);
        let c = db.add_learnt(&lits(&[-1, -3, 4]), 2);

        assert!(!db.clause(a).is_learnt());
        assert!(db.clause(b).is_learnt());
        assert_eq!(db.clause(b).lbd(), 4);
        assert_eq!(db.clause(c).lbd(), 2);
        assert_eq!(db.num_clauses(), 3);
        assert_eq!(db.num_learnts(), 2);
        assert_eq!(db.clauses(), &[a, b, c]);
    }

    #[test]
    fn test_binary_watchers() {
        let mut db = small_db();
        let b = db.add_clause(&lits(&[1, -2]), false);

        // assigning -1 makes the clause unit on -2
        let watchers = db.binary_watchers(Lit::from_i32(-1));
        assert_eq!(watchers.len(), 1);
        assert_eq!(watchers[0].clause, b);
        assert_eq!(watchers[0].other, Lit::from_i32(-2));
        assert_eq!(db.binary_watchers(Lit::from_i32(2))[0].other, Lit::from_i32(1));
        assert!(db.binary_watchers(Lit::from_i32(1)).is_empty());

        db.remove_clause(b);
        assert!(db.binary_watchers(Lit::from_i32(-1)).is_empty());
        assert!(db.binary_watchers(Lit::from_i32(2)).is_empty());
        assert!(db.clause(b).is_deleted());
    }

    #[test]
    fn test_grows_for_new_variables() {
        let mut db = small_db();
        db.add_clause(&lits(&[7, -9]), false);
        assert_eq!(db.num_vars(), 9);
        assert_eq!(db.binary_watchers(Lit::from_i32(-7)).len(), 1);
        assert!(db.binary_watchers(Lit::from_i32(100)).is_empty());
    }

    #[test]
    fn test_cleanup_drops_deleted_handles() {
        let mut db = small_db();
        let a = db.add_clause(&lits(&[1, 2, 3]), false);
        let b = db.add_clause(&lits(&[2, 3, 4]), false);
        db.remove_clause(a);
        assert_eq!(db.clauses().len(), 2);
        assert_eq!(db.cleanup(), 1);
        assert_eq!(db.clauses(), &[b]);
        assert_eq!(db.cleanup(), 0);
    }

    #[test]
    fn test_strengthen_keeps_metadata() {
        let mut db = small_db();
        let a = db.add_learnt(&lits(&[1, 2, 3, 4]), 4);
        db.clause_mut(a).set_activity(3.0);
        db.clause_mut(a).set_frozen(true);

        let Strengthened::Clause(b) = db.strengthen(a, Lit::from_i32(2)) else {
            panic!("expected a clause");
        };
        assert!(db.clause(a).is_deleted());
        let clause = db.clause(b);
        assert_eq!(clause.to_vec(), lits(&[1, 3, 4]));
        assert!(clause.is_learnt());
        assert!(clause.is_frozen());
        assert_eq!(clause.lbd(), 3);
        assert!((clause.activity() - 3.0).abs() < f32::EPSILON);
    }

    #[test]
    fn test_strengthen_to_binary_and_unit() {
        let mut db = small_db();
        let a = db.add_clause(&lits(&[1, 2, 3]), false);
        let Strengthened::Clause(b) = db.strengthen(a, Lit::from_i32(3)) else {
            panic!("expected a clause");
        };
        assert_eq!(db.binary_watchers(Lit::from_i32(-1))[0].clause, b);

        assert_eq!(db.strengthen(b, Lit::from_i32(1)), Strengthened::Unit(Lit::from_i32(2)));
        assert!(db.binary_watchers(Lit::from_i32(-1)).is_empty());
        assert_eq!(db.num_clauses(), 0);
    }

    #[test]
    #[should_panic(expected = "does not occur")]
    fn test_strengthen_requires_literal() {
        let mut db = small_db();
        let a = db.add_clause(&lits(&[1, 2, 3]), false);
        db.strengthen(a, Lit::from_i32(4));
    }

    #[test]
    fn test_occurrence_tracking() {
        let mut db = small_db();
        let a = db.add_clause(&lits(&[1, 2, 3]), false);
        db.init_occurrence_tracking(4);
        let b = db.add_clause(&lits(&[-1, 4]), false);

        assert_eq!(db.occurrences(1), &[a, b]);
        assert_eq!(db.occurrences(4), &[b]);

        db.remove_clause(a);
        assert_eq!(db.occurrences(1), &[b]);
        assert!(db.occurrences(2).is_empty());

        db.stop_occurrence_tracking();
        assert!(!db.is_tracking_occurrences());
        assert!(db.occurrences(1).is_empty());
    }

    #[test]
    fn test_defrag_rebuilds_lists() {
        let mut db = ClauseDatabase::<Lit>::new(4, DatabaseConfig::default().with_page_words(16));
        let a = db.add_clause(&lits(&[1, 2, 3]), false);
        let b = db.add_clause(&lits(&[-1, 2]), false);
        let c = db.add_learnt(&lits(&[2, 3, 4]), 2);
        db.init_occurrence_tracking(4);
        db.remove_clause(a);

        db.defrag();
        assert_eq!(db.stats().defrags, 1);
        assert_eq!(db.clauses().len(), 2);
        assert!(db.arena().try_clause(b).is_err());
        assert!(db.arena().try_clause(c).is_err());

        let new_b = db.clauses()[0];
        let new_c = db.clauses()[1];
        assert_eq!(db.clause(new_b).to_vec(), lits(&[-1, 2]));
        assert_eq!(db.clause(new_c).lbd(), 2);
        assert_eq!(db.binary_watchers(Lit::from_i32(1))[0].clause, new_b);
        assert_eq!(db.occurrences(3), &[new_c]);
    }

    #[test]
    fn test_make_persistent() {
        let mut db = small_db();
        let a = db.add_learnt(&lits(&[1, 2, 3]), 3);
        db.make_persistent(a);
        assert!(!db.clause(a).is_learnt());
        assert_eq!(db.num_learnts(), 0);
    }
}
