#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
use crate::sat::clause::ClauseRef;
use crate::sat::literal::Literal;
use smallvec::SmallVec;
use std::ops::{Index, IndexMut};

/// Entry of a binary watch list: the clause and its other literal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct BinaryWatcher<L: Literal> {
    pub clause: ClauseRef,
    pub other: L,
}

/// The two watched literals of a clause of length three or more.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Watcher<L: Literal> {
    pub clause: ClauseRef,
    pub watch0: L,
    pub watch1: L,
}

/// Slot of a [`Watcher`] in the propagator's watcher slab.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct WatcherId(u32);

impl WatcherId {
    #[must_use]
    pub fn new(index: usize) -> Self {
        Self(u32::try_from(index).expect("watcher slab overflowed u32"))
    }

    #[must_use]
    pub const fn index(self) -> usize {
        self.0 as usize
    }
}

/// One list per literal, indexed by [`Literal::index`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WatchLists<T>(Vec<SmallVec<[T; 4]>>);

impl<T> Default for WatchLists<T> {
    fn default() -> Self {
        Self(Vec::new())
    }
}

impl<T> WatchLists<T> {
    #[must_use]
    pub fn new(num_vars: usize) -> Self {
        let mut lists = Self(Vec::new());
        lists.grow(num_vars);
        lists
    }

    /// Makes room for both literals of every variable up to `num_vars`.
    pub fn grow(&mut self, num_vars: usize) {
        let num_lits = (num_vars + 1) * 2;
        if self.0.len() < num_lits {
            self.0.resize_with(num_lits, SmallVec::new);
        }
    }

    #[must_use]
    pub fn num_vars(&self) -> usize {
        (self.0.len() / 2).saturating_sub(1)
    }

    pub fn clear(&mut self) {
        self.0.iter_mut().for_each(SmallVec::clear);
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut SmallVec<[T; 4]>> {
        self.0.iter_mut()
    }

    /// Total number of entries over all lists.
    #[must_use]
    pub fn total_len(&self) -> usize {
        self.0.iter().map(SmallVec::len).sum()
    }

    /// Removes the first entry of `lit`'s list matching `pred`, by swapping it with
    /// the last entry. Returns whether an entry was found.
    pub fn remove_first<L: Literal>(&mut self, lit: L, pred: impl FnMut(&T) -> bool) -> bool {
        let list = &mut self[lit];
        match list.iter().position(pred) {
            Some(i) => {
                list.swap_remove(i);
                true
            }
            None => false,
        }
    }
}

impl<T, L: Literal> Index<L> for WatchLists<T> {
    type Output = SmallVec<[T; 4]>;

    fn index(&self, index: L) -> &Self::Output {
        &self.0[index.index()]
    }
}

impl<T, L: Literal> IndexMut<L> for WatchLists<T> {
    fn index_mut(&mut self, index: L) -> &mut Self::Output {
        &mut self.0[index.index()]
    }
}
