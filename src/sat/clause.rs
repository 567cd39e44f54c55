#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
//! Clause records as they live inside the [`ClauseArena`](crate::sat::clause_storage::ClauseArena).
//!
//! A record is a run of `u32` words:
//!
//! ```text
//! [length] [flags | lbd] [activity (f32 bits)] [abstraction] [lit 0] ... [lit n-1]
//! ```
//!
//! The length is fixed when the record is written. Only the metadata words change
//! afterwards. Literals are stored through [`Literal::index`].

use crate::sat::literal::{Literal, Variable};
use itertools::Itertools;
use std::fmt;
use std::marker::PhantomData;

pub(crate) const LEN_WORD: usize = 0;
pub(crate) const FLAGS_WORD: usize = 1;
pub(crate) const ACTIVITY_WORD: usize = 2;
pub(crate) const ABSTRACTION_WORD: usize = 3;

/// Number of header words in front of the literals of every record.
pub const HEADER_WORDS: usize = 4;

/// Size of a record in words.
#[must_use]
pub const fn clause_words(len: usize) -> usize {
    HEADER_WORDS + len
}

/// Size of a record in bytes.
#[must_use]
pub const fn clause_bytes(len: usize) -> usize {
    clause_words(len) * size_of::<u32>()
}

/// Handle to a clause record.
///
/// Handles carry the generation of the arena that issued them. A relocation bumps
/// the generation, so using a handle across a defragmentation is caught instead of
/// reading whatever now occupies the old position.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ClauseRef {
    page: u32,
    offset: u32,
    generation: u32,
}

impl ClauseRef {
    pub(crate) const fn new(page: u32, offset: u32, generation: u32) -> Self {
        Self {
            page,
            offset,
            generation,
        }
    }

    #[must_use]
    pub const fn page(self) -> usize {
        self.page as usize
    }

    #[must_use]
    pub const fn offset(self) -> usize {
        self.offset as usize
    }

    #[must_use]
    pub const fn generation(self) -> u32 {
        self.generation
    }
}

impl fmt::Debug for ClauseRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "c{}:{}@{}", self.page, self.offset, self.generation)
    }
}

/// The flags word of a record.
///
/// Layout:
/// bit 0        deleted
/// bit 1        learnt
/// bit 2        frozen
/// bits 8..32   lbd (saturating)
#[derive(Clone, Copy, PartialEq, Eq, Default)]
pub struct ClauseHeader(u32);

impl ClauseHeader {
    const DELETED: u32 = 1;
    const LEARNT: u32 = 1 << 1;
    const FROZEN: u32 = 1 << 2;
    const LBD_SHIFT: u32 = 8;
    pub const LBD_MAX: u32 = (1 << 24) - 1;

    #[must_use]
    pub const fn new(learnt: bool, lbd: u32) -> Self {
        let lbd = if lbd > Self::LBD_MAX { Self::LBD_MAX } else { lbd };
        let learnt = if learnt { Self::LEARNT } else { 0 };
        Self(learnt | (lbd << Self::LBD_SHIFT))
    }

    pub(crate) const fn from_word(word: u32) -> Self {
        Self(word)
    }

    pub(crate) const fn word(self) -> u32 {
        self.0
    }

    #[must_use]
    pub const fn deleted(self) -> bool {
        self.0 & Self::DELETED != 0
    }

    #[must_use]
    pub const fn learnt(self) -> bool {
        self.0 & Self::LEARNT != 0
    }

    #[must_use]
    pub const fn frozen(self) -> bool {
        self.0 & Self::FROZEN != 0
    }

    #[must_use]
    pub const fn lbd(self) -> u32 {
        self.0 >> Self::LBD_SHIFT
    }

    pub const fn set_deleted(&mut self) {
        self.0 |= Self::DELETED;
    }

    pub const fn set_learnt(&mut self, learnt: bool) {
        self.0 = (self.0 & !Self::LEARNT) | if learnt { Self::LEARNT } else { 0 };
    }

    pub const fn set_frozen(&mut self, frozen: bool) {
        self.0 = (self.0 & !Self::FROZEN) | if frozen { Self::FROZEN } else { 0 };
    }

    pub const fn set_lbd(&mut self, lbd: u32) {
        let lbd = if lbd > Self::LBD_MAX { Self::LBD_MAX } else { lbd };
        self.0 = (self.0 & ((1 << Self::LBD_SHIFT) - 1)) | (lbd << Self::LBD_SHIFT);
    }
}

impl fmt::Debug for ClauseHeader {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClauseHeader")
            .field("deleted", &self.deleted())
            .field("learnt", &self.learnt())
            .field("frozen", &self.frozen())
            .field("lbd", &self.lbd())
            .finish()
    }
}

/// Bitwise OR of `1 << (var & 31)` over all literals.
pub fn abstraction<L: Literal>(lits: impl IntoIterator<Item = L>) -> u32 {
    lits.into_iter()
        .fold(0, |abs, lit| abs | 1 << (lit.variable() & 31))
}

/// Outcome of comparing a clause `A` against a clause `B`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SubsumeResult<L: Literal> {
    /// Neither subsumption nor self-subsuming resolution applies.
    Unrelated,
    /// Every literal of `A` occurs in `B`.
    Subsumes,
    /// `A` subsumes `B` except that `B` contains the negation of this literal of
    /// `A`; the negation can be struck from `B`.
    Strengthens(L),
}

/// Checks whether the literal set `a` (with abstraction `a_abs`) subsumes `b`, or
/// can strike exactly one literal from it.
pub fn subsumes<L: Literal>(a: &[L], a_abs: u32, b: &Clause<'_, L>) -> SubsumeResult<L> {
    if b.len() < a.len() || a_abs & !b.abstraction() != 0 {
        return SubsumeResult::Unrelated;
    }

    let mut strike = None;
    for &c in a {
        let mut found = false;
        for d in b.literals() {
            if c == d {
                found = true;
                break;
            }
            if strike.is_none() && c == d.negated() {
                strike = Some(c);
                found = true;
                break;
            }
        }
        if !found {
            return SubsumeResult::Unrelated;
        }
    }

    strike.map_or(SubsumeResult::Subsumes, SubsumeResult::Strengthens)
}

/// Read-only view of a clause record.
#[derive(Clone, Copy)]
pub struct Clause<'a, L: Literal> {
    words: &'a [u32],
    _lit: PhantomData<L>,
}

impl<'a, L: Literal> Clause<'a, L> {
    pub(crate) const fn from_words(words: &'a [u32]) -> Self {
        Self {
            words,
            _lit: PhantomData,
        }
    }

    #[must_use]
    pub const fn len(&self) -> usize {
        self.words[LEN_WORD] as usize
    }

    /// Records always hold at least one literal.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.len() == 0
    }

    #[must_use]
    pub const fn header(&self) -> ClauseHeader {
        ClauseHeader::from_word(self.words[FLAGS_WORD])
    }

    #[must_use]
    pub fn lit(&self, i: usize) -> L {
        debug_assert!(i < self.len());
        L::from_index(self.words[HEADER_WORDS + i] as usize)
    }

    pub fn literals(self) -> impl ExactSizeIterator<Item = L> + Clone + 'a {
        self.words[HEADER_WORDS..HEADER_WORDS + self.len()]
            .iter()
            .map(|&w| L::from_index(w as usize))
    }

    #[must_use]
    pub fn first(&self) -> L {
        self.lit(0)
    }

    #[must_use]
    pub fn second(&self) -> L {
        self.lit(1)
    }

    #[must_use]
    pub fn back(&self) -> L {
        self.lit(self.len() - 1)
    }

    #[must_use]
    pub fn contains(&self, lit: L) -> bool {
        self.literals().any(|l| l == lit)
    }

    #[must_use]
    pub fn contains_var(&self, var: Variable) -> bool {
        self.literals().any(|l| l.variable() == var)
    }

    #[must_use]
    pub const fn is_learnt(&self) -> bool {
        self.header().learnt()
    }

    #[must_use]
    pub const fn is_deleted(&self) -> bool {
        self.header().deleted()
    }

    #[must_use]
    pub const fn is_frozen(&self) -> bool {
        self.header().frozen()
    }

    #[must_use]
    pub const fn lbd(&self) -> u32 {
        self.header().lbd()
    }

    #[must_use]
    pub const fn activity(&self) -> f32 {
        f32::from_bits(self.words[ACTIVITY_WORD])
    }

    #[must_use]
    pub const fn abstraction(&self) -> u32 {
        self.words[ABSTRACTION_WORD]
    }

    #[must_use]
    pub fn to_vec(&self) -> Vec<L> {
        self.literals().collect()
    }

    /// See [`subsumes`].
    #[must_use]
    pub fn subsumes(&self, other: &Clause<'_, L>) -> SubsumeResult<L> {
        subsumes(&self.to_vec(), self.abstraction(), other)
    }
}

impl<L: Literal> fmt::Debug for Clause<'_, L> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Clause")
            .field("header", &self.header())
            .field("activity", &self.activity())
            .field("literals", &self.to_vec())
            .finish()
    }
}

/// DIMACS rendering, e.g. `1 -2 3 0`.
impl<L: Literal> fmt::Display for Clause<'_, L> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} 0", self.literals().map(L::to_i32).join(" "))
    }
}

/// Mutable view of a clause record. Only metadata can be changed.
pub struct ClauseMut<'a, L: Literal> {
    words: &'a mut [u32],
    _lit: PhantomData<L>,
}

impl<'a, L: Literal> ClauseMut<'a, L> {
    pub(crate) const fn from_words(words: &'a mut [u32]) -> Self {
        Self {
            words,
            _lit: PhantomData,
        }
    }

    #[must_use]
    pub fn as_clause(&self) -> Clause<'_, L> {
        Clause::from_words(self.words)
    }

    fn update_header(&mut self, f: impl FnOnce(&mut ClauseHeader)) {
        let mut header = ClauseHeader::from_word(self.words[FLAGS_WORD]);
        f(&mut header);
        self.words[FLAGS_WORD] = header.word();
    }

    pub fn set_deleted(&mut self) {
        self.update_header(ClauseHeader::set_deleted);
    }

    pub fn set_frozen(&mut self, frozen: bool) {
        self.update_header(|h| h.set_frozen(frozen));
    }

    pub fn set_lbd(&mut self, lbd: u32) {
        self.update_header(|h| h.set_lbd(lbd));
    }

    /// Turns a learnt clause into an original one.
    pub fn set_persistent(&mut self) {
        self.update_header(|h| {
            h.set_learnt(false);
            h.set_frozen(false);
        });
    }

    pub fn set_activity(&mut self, activity: f32) {
        self.words[ACTIVITY_WORD] = activity.to_bits();
    }

    /// Adds `inc` to the activity and returns the new value.
    pub fn increase_activity(&mut self, inc: f32) -> f32 {
        let activity = self.as_clause().activity() + inc;
        self.set_activity(activity);
        activity
    }
}
