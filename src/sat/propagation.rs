#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
//! Unit propagation with two watched literals.
//!
//! Binary clauses are propagated straight from the database's binary watch lists.
//! Every longer clause gets one [`Watcher`] holding the two literals it currently
//! watches; the watcher is registered in the lists of the negations of both. When
//! a watched literal becomes false the propagator looks for a replacement that is
//! not false, and otherwise the clause is unit on its other watch or conflicting.
//!
//! Watchers live in a slab and watch lists store slab ids, so moving a watch from
//! one literal to another never touches the other list. Clause literals are never
//! reordered.

use crate::sat::clause::ClauseRef;
use crate::sat::clause_database::ClauseDatabase;
use crate::sat::literal::{DoubleLiteral, Literal};
use crate::sat::trail::Trail;
use crate::sat::watch::{WatchLists, Watcher, WatcherId};
use bit_vec::BitVec;
use ordered_float::OrderedFloat;
use smallvec::SmallVec;
use std::cmp::Reverse;
use tracing::{debug, trace};

#[derive(Debug, Clone, Default)]
pub struct Propagator<L: Literal = DoubleLiteral> {
    watchers: Vec<Watcher<L>>,
    /// Whether the slab slot of the same index holds an attached clause.
    live: BitVec,
    free: Vec<WatcherId>,
    /// `lists[lit]` holds the watchers of clauses watching `!lit`.
    lists: WatchLists<WatcherId>,
    num_attached: usize,
    num_propagations: u64,
}

impl<L: Literal> Propagator<L> {
    #[must_use]
    pub fn new(num_vars: usize) -> Self {
        Self {
            watchers: Vec::new(),
            live: BitVec::new(),
            free: Vec::new(),
            lists: WatchLists::new(num_vars),
            num_attached: 0,
            num_propagations: 0,
        }
    }

    /// Makes room for variables up to and including `num_vars`.
    pub fn grow(&mut self, num_vars: usize) {
        self.lists.grow(num_vars);
    }

    fn grow_for(&mut self, lits: [L; 2]) {
        if let Some(var) = lits.iter().map(|lit| lit.variable() as usize).max() {
            self.lists.grow(var);
        }
    }

    fn alloc(&mut self, watcher: Watcher<L>) -> WatcherId {
        if let Some(id) = self.free.pop() {
            self.watchers[id.index()] = watcher;
            self.live.set(id.index(), true);
            id
        } else {
            self.watchers.push(watcher);
            self.live.push(true);
            WatcherId::new(self.watchers.len() - 1)
        }
    }

    fn watch(&mut self, cref: ClauseRef, lits: [L; 2]) {
        self.grow_for(lits);
        let id = self.alloc(Watcher {
            clause: cref,
            watch0: lits[0],
            watch1: lits[1],
        });
        self.lists[lits[0].negated()].push(id);
        self.lists[lits[1].negated()].push(id);
        self.num_attached += 1;
    }

    /// Starts watching the first two literals of `cref`.
    ///
    /// Binary clauses are already watched by the database and are ignored here.
    ///
    /// # Panics
    ///
    /// If the clause has fewer than two literals.
    pub fn attach_clause(&mut self, db: &ClauseDatabase<L>, cref: ClauseRef) {
        let clause = db.clause(cref);
        assert!(
            clause.len() >= 2,
            "cannot watch clause {cref:?} of length {}",
            clause.len()
        );
        if clause.len() > 2 {
            self.watch(cref, [clause.first(), clause.second()]);
        }
    }

    /// Like [`attach_clause`](Self::attach_clause), but picks the two watches by
    /// their value under `trail`: true literals first, then unassigned ones, then
    /// false ones. Used for clauses created while literals are already assigned.
    ///
    /// # Panics
    ///
    /// If the clause has fewer than two literals.
    pub fn attach_clause_under(
        &mut self,
        db: &ClauseDatabase<L>,
        trail: &Trail<L>,
        cref: ClauseRef,
    ) {
        let clause = db.clause(cref);
        assert!(
            clause.len() >= 2,
            "cannot watch clause {cref:?} of length {}",
            clause.len()
        );
        if clause.len() == 2 {
            return;
        }
        let mut lits: SmallVec<[L; 8]> = clause.literals().collect();
        lits.sort_by_key(|&lit| match trail.value(lit) {
            Some(true) => 0,
            None => 1,
            Some(false) => 2,
        });
        self.watch(cref, [lits[0], lits[1]]);
    }

    /// Stops watching `cref`. Binary clauses are ignored.
    ///
    /// # Panics
    ///
    /// If the clause is longer than two literals and not attached.
    pub fn detach_clause(&mut self, db: &ClauseDatabase<L>, cref: ClauseRef) {
        let clause = db.clause(cref);
        assert!(
            clause.len() >= 2,
            "cannot unwatch clause {cref:?} of length {}",
            clause.len()
        );
        if clause.len() == 2 {
            return;
        }

        let found = clause.literals().find_map(|lit| {
            self.lists[lit.negated()]
                .iter()
                .copied()
                .find(|&id| self.watchers[id.index()].clause == cref)
        });
        let Some(id) = found else {
            panic!("clause {cref:?} is not attached");
        };

        let watcher = self.watchers[id.index()];
        for lit in [watcher.watch0, watcher.watch1] {
            let removed = self.lists.remove_first(lit.negated(), |&other| other == id);
            assert!(
                removed,
                "watcher of clause {cref:?} missing from the list of {lit:?}"
            );
        }
        self.live.set(id.index(), false);
        self.free.push(id);
        self.num_attached -= 1;
    }

    /// Attaches every live clause of the database, choosing watches under `trail`
    /// as [`attach_clause_under`](Self::attach_clause_under) does.
    pub fn attach_all(&mut self, db: &ClauseDatabase<L>, trail: &Trail<L>) {
        self.grow(db.num_vars());
        for cref in db.live_clauses() {
            if db.clause(cref).len() > 2 {
                self.attach_clause_under(db, trail, cref);
            }
        }
    }

    /// Forgets every watcher.
    pub fn detach_all(&mut self) {
        self.lists.clear();
        self.watchers.clear();
        self.live = BitVec::new();
        self.free.clear();
        self.num_attached = 0;
    }

    /// Re-attaches all clauses, e.g. after the database was defragmented.
    ///
    /// Literals assigned at the root level stay on the trail, so watches are picked
    /// by their value under `trail` rather than by position.
    pub fn rebuild(&mut self, db: &ClauseDatabase<L>, trail: &Trail<L>) {
        self.detach_all();
        self.attach_all(db, trail);
        debug!(watchers = self.num_attached, "rebuilt watch lists");
    }

    /// Orders every watch list by clause length ascending, then activity descending.
    pub fn sort_watchers(&mut self, db: &ClauseDatabase<L>) {
        let watchers = &self.watchers;
        for list in self.lists.iter_mut() {
            list.sort_by_cached_key(|&id| {
                let clause = db.clause(watchers[id.index()].clause);
                (clause.len(), Reverse(OrderedFloat(clause.activity())))
            });
        }
    }

    /// Propagates every literal on the trail from `qhead` onwards.
    ///
    /// Returns a clause all of whose literals are false if a conflict was found.
    /// On return `qhead` equals the trail length either way.
    pub fn propagate(&mut self, trail: &mut Trail<L>, db: &ClauseDatabase<L>) -> Option<ClauseRef> {
        self.grow(trail.num_vars());
        let start = trail.qhead;
        let mut conflict = None;

        while trail.qhead < trail.len() {
            let p = trail[trail.qhead];
            trail.qhead += 1;

            conflict = Self::propagate_binary(trail, db, p);
            if conflict.is_none() {
                conflict = self.propagate_long(trail, db, p);
            }
            if conflict.is_some() {
                break;
            }
        }

        self.num_propagations += (trail.qhead - start) as u64;
        if let Some(cref) = conflict {
            trace!(clause = ?cref, "conflict");
            trail.qhead = trail.len();
        }
        conflict
    }

    fn propagate_binary(trail: &mut Trail<L>, db: &ClauseDatabase<L>, p: L) -> Option<ClauseRef> {
        for watcher in db.binary_watchers(p) {
            match trail.value(watcher.other) {
                Some(true) => {}
                Some(false) => return Some(watcher.clause),
                None => trail.unchecked_enqueue(watcher.other, Some(watcher.clause)),
            }
        }
        None
    }

    fn propagate_long(
        &mut self,
        trail: &mut Trail<L>,
        db: &ClauseDatabase<L>,
        p: L,
    ) -> Option<ClauseRef> {
        let false_lit = p.negated();
        let mut list = std::mem::take(&mut self.lists[p]);
        let mut conflict = None;
        let mut kept = 0;
        let mut i = 0;

        while i < list.len() {
            let id = list[i];
            i += 1;

            let watcher = &mut self.watchers[id.index()];
            if watcher.watch0 != false_lit {
                std::mem::swap(&mut watcher.watch0, &mut watcher.watch1);
            }
            debug_assert_eq!(watcher.watch0, false_lit);

            let other = watcher.watch1;
            let other_value = trail.value(other);
            if other_value == Some(true) {
                list[kept] = id;
                kept += 1;
                continue;
            }

            let clause = db.clause(watcher.clause);
            debug_assert!(!clause.is_deleted(), "deleted clause {:?} still watched", watcher.clause);
            let replacement = clause
                .literals()
                .find(|&lit| lit != false_lit && lit != other && trail.value(lit) != Some(false));
            if let Some(lit) = replacement {
                watcher.watch0 = lit;
                self.lists[lit.negated()].push(id);
                continue;
            }

            list[kept] = id;
            kept += 1;
            if other_value == Some(false) {
                conflict = Some(watcher.clause);
                while i < list.len() {
                    list[kept] = list[i];
                    kept += 1;
                    i += 1;
                }
            } else {
                trail.unchecked_enqueue(other, Some(watcher.clause));
            }
        }

        list.truncate(kept);
        self.lists[p] = list;
        conflict
    }

    /// Number of literals taken off the trail so far.
    #[must_use]
    pub const fn num_propagations(&self) -> u64 {
        self.num_propagations
    }

    /// Number of attached long clauses.
    #[must_use]
    pub const fn num_watchers(&self) -> usize {
        self.num_attached
    }

    /// Whether `cref` is currently attached.
    #[must_use]
    pub fn is_attached(&self, cref: ClauseRef) -> bool {
        self.watcher_of(cref).is_some()
    }

    /// The watched literals of `cref`, if it is attached.
    #[must_use]
    pub fn watches(&self, cref: ClauseRef) -> Option<(L, L)> {
        self.watcher_of(cref).map(|w| (w.watch0, w.watch1))
    }

    fn watcher_of(&self, cref: ClauseRef) -> Option<&Watcher<L>> {
        self.watchers
            .iter()
            .zip(self.live.iter())
            .find(|&(w, live)| live && w.clause == cref)
            .map(|(w, _)| w)
    }
}
