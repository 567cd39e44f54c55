#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
//! Page based bump allocator for clause records.
//!
//! Records are written back to back into fixed-size pages of `u32` words. A page is
//! zeroed when it is opened, so a zero length word marks the end of the records
//! on that page. Nothing is ever freed individually: deleted clauses keep their
//! storage until [`ClauseArena::relocate`] copies the survivors into fresh pages.
//!
//! Every relocation or reset starts a new generation. Handles from an older
//! generation are rejected.

use crate::sat::clause::{
    ABSTRACTION_WORD, ACTIVITY_WORD, Clause, ClauseHeader, ClauseMut, ClauseRef, FLAGS_WORD,
    HEADER_WORDS, LEN_WORD, abstraction, clause_words,
};
use crate::sat::configs::DEFAULT_PAGE_WORDS;
use crate::sat::error::ArenaError;
use crate::sat::literal::Literal;
use std::marker::PhantomData;
use std::ops::Range;
use tracing::trace;

type Page = Box<[u32]>;

/// Word ranges of the records on a page, in allocation order.
fn records(page: &[u32]) -> impl Iterator<Item = Range<usize>> + '_ {
    let mut offset = 0;
    std::iter::from_fn(move || {
        let len = *page.get(offset)? as usize;
        if len == 0 {
            return None;
        }
        let range = offset..offset + clause_words(len);
        offset = range.end;
        Some(range)
    })
}

fn is_deleted(record: &[u32]) -> bool {
    ClauseHeader::from_word(record[FLAGS_WORD]).deleted()
}

#[derive(Debug)]
pub struct ClauseArena<L: Literal> {
    pages: Vec<Page>,
    /// Released pages kept around for reuse.
    spare: Vec<Page>,
    cursor: usize,
    page_words: usize,
    used_words: usize,
    generation: u32,
    _lit: PhantomData<L>,
}

impl<L: Literal> Default for ClauseArena<L> {
    fn default() -> Self {
        Self::new(DEFAULT_PAGE_WORDS)
    }
}

impl<L: Literal> ClauseArena<L> {
    /// Creates an arena with one empty page of `page_words` words.
    ///
    /// # Panics
    ///
    /// If a page could not hold a single one-literal clause.
    #[must_use]
    pub fn new(page_words: usize) -> Self {
        assert!(
            page_words >= clause_words(1),
            "arena pages of {page_words} words cannot hold a clause"
        );
        let mut arena = Self {
            pages: Vec::new(),
            spare: Vec::new(),
            cursor: 0,
            page_words,
            used_words: 0,
            generation: 0,
            _lit: PhantomData,
        };
        arena.new_page(page_words);
        arena
    }

    fn new_page(&mut self, min_words: usize) {
        let size = self.page_words.max(min_words);
        let page = match self.spare.iter().position(|p| p.len() >= size) {
            Some(i) => {
                let mut page = self.spare.swap_remove(i);
                page.fill(0);
                page
            }
            None => vec![0; size].into_boxed_slice(),
        };
        trace!(page = self.pages.len(), words = page.len(), "opening arena page");
        self.pages.push(page);
        self.cursor = 0;
    }

    /// Reserves room for a record of `words` words and returns its position.
    fn reserve(&mut self, words: usize) -> (usize, usize) {
        let fits = self
            .pages
            .last()
            .is_some_and(|page| self.cursor + words <= page.len());
        if !fits {
            if self.cursor == 0 {
                // the current page is still empty, hand it back instead of wasting it
                if let Some(page) = self.pages.pop() {
                    self.spare.push(page);
                }
            }
            self.new_page(words);
        }
        let position = (self.pages.len() - 1, self.cursor);
        self.cursor += words;
        self.used_words += words;
        position
    }

    fn make_ref(&self, page: usize, offset: usize) -> ClauseRef {
        ClauseRef::new(
            u32::try_from(page).expect("arena page count overflowed u32"),
            u32::try_from(offset).expect("arena page offset overflowed u32"),
            self.generation,
        )
    }

    /// Writes a new record holding `lits` and returns its handle.
    ///
    /// The activity starts at 0 and the abstraction is computed from `lits`.
    ///
    /// # Panics
    ///
    /// If `lits` is empty: a zero length would terminate the page scan.
    pub fn allocate(&mut self, lits: &[L], header: ClauseHeader) -> ClauseRef {
        assert!(!lits.is_empty(), "clause records need at least one literal");
        let words = clause_words(lits.len());
        let (page, offset) = self.reserve(words);

        let record = &mut self.pages[page][offset..offset + words];
        record[LEN_WORD] = u32::try_from(lits.len()).expect("clause length overflowed u32");
        record[FLAGS_WORD] = header.word();
        record[ACTIVITY_WORD] = 0f32.to_bits();
        record[ABSTRACTION_WORD] = abstraction(lits.iter().copied());
        for (word, lit) in record[HEADER_WORDS..].iter_mut().zip(lits) {
            *word = u32::try_from(lit.index()).expect("literal index overflowed u32");
        }

        self.make_ref(page, offset)
    }

    fn copy_record(&mut self, record: &[u32]) -> ClauseRef {
        let (page, offset) = self.reserve(record.len());
        self.pages[page][offset..offset + record.len()].copy_from_slice(record);
        self.make_ref(page, offset)
    }

    /// Handles of all records that are not deleted, in allocation order.
    #[must_use]
    pub fn collect(&self) -> Vec<ClauseRef> {
        self.pages
            .iter()
            .enumerate()
            .flat_map(|(p, page)| {
                records(page)
                    .filter(|range| !is_deleted(&page[range.clone()]))
                    .map(move |range| (p, range.start))
            })
            .map(|(p, offset)| self.make_ref(p, offset))
            .collect()
    }

    /// Copies every live record into fresh pages, preserving their order, and
    /// returns the new handles in the order [`collect`](Self::collect) would have
    /// produced before the call.
    ///
    /// All handles issued before this call become stale. Old pages are dropped
    /// when `free_old` is set and kept for reuse otherwise.
    pub fn relocate(&mut self, free_old: bool) -> Vec<ClauseRef> {
        let old_pages = std::mem::take(&mut self.pages);
        self.generation = self.generation.wrapping_add(1);
        self.used_words = 0;
        self.new_page(self.page_words);

        let mut relocated = Vec::new();
        for page in &old_pages {
            for range in records(page) {
                let record = &page[range];
                if !is_deleted(record) {
                    relocated.push(self.copy_record(record));
                }
            }
        }

        if !free_old {
            self.spare.extend(old_pages);
        }
        relocated
    }

    /// Drops every record and starts over with a single empty page. Handles issued
    /// before the call become stale.
    pub fn reset(&mut self, free: bool) {
        let pages = std::mem::take(&mut self.pages);
        if free {
            self.spare.clear();
        } else {
            self.spare.extend(pages);
        }
        self.generation = self.generation.wrapping_add(1);
        self.used_words = 0;
        self.new_page(self.page_words);
    }

    fn assert_current(&self, cref: ClauseRef) {
        assert_eq!(
            cref.generation(),
            self.generation,
            "stale clause reference {cref:?}: arena is at generation {}",
            self.generation
        );
    }

    fn record_range(&self, cref: ClauseRef) -> Range<usize> {
        let len = self.pages[cref.page()][cref.offset() + LEN_WORD] as usize;
        cref.offset()..cref.offset() + clause_words(len)
    }

    /// # Panics
    ///
    /// If `cref` is stale.
    #[must_use]
    pub fn clause(&self, cref: ClauseRef) -> Clause<'_, L> {
        self.assert_current(cref);
        let range = self.record_range(cref);
        Clause::from_words(&self.pages[cref.page()][range])
    }

    /// # Panics
    ///
    /// If `cref` is stale.
    pub fn clause_mut(&mut self, cref: ClauseRef) -> ClauseMut<'_, L> {
        self.assert_current(cref);
        let range = self.record_range(cref);
        ClauseMut::from_words(&mut self.pages[cref.page()][range])
    }

    /// Like [`clause`](Self::clause), but reports stale or foreign handles as errors.
    ///
    /// # Errors
    ///
    /// [`ArenaError::StaleReference`] when the handle predates the last relocation,
    /// [`ArenaError::OutOfBounds`] when it does not point at a record.
    pub fn try_clause(&self, cref: ClauseRef) -> Result<Clause<'_, L>, ArenaError> {
        if cref.generation() != self.generation {
            return Err(ArenaError::StaleReference {
                cref,
                generation: self.generation,
            });
        }
        let page = self
            .pages
            .get(cref.page())
            .ok_or(ArenaError::OutOfBounds(cref))?;
        let len = *page.get(cref.offset()).ok_or(ArenaError::OutOfBounds(cref))? as usize;
        if len == 0 {
            return Err(ArenaError::OutOfBounds(cref));
        }
        page.get(cref.offset()..cref.offset() + clause_words(len))
            .map(Clause::from_words)
            .ok_or(ArenaError::OutOfBounds(cref))
    }

    #[must_use]
    pub const fn generation(&self) -> u32 {
        self.generation
    }

    #[must_use]
    pub fn num_pages(&self) -> usize {
        self.pages.len()
    }

    #[must_use]
    pub const fn page_words(&self) -> usize {
        self.page_words
    }

    /// Words occupied by records, deleted ones included.
    #[must_use]
    pub const fn used_words(&self) -> usize {
        self.used_words
    }
}
