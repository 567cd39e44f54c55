//! Tuning knobs of the clause database and the subsumption engine.

/// Default page size of the clause arena, in `u32` words (16 MiB).
pub const DEFAULT_PAGE_WORDS: usize = 4 * 1024 * 1024;

/// Threshold above which clause activities are rescaled.
pub const ACTIVITY_RESCALE_LIMIT: f32 = 1e20;

/// Factor applied to every activity (and the bump unit) on rescale.
pub const ACTIVITY_RESCALE_FACTOR: f32 = 1e-20;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DatabaseConfig {
    /// Decay of the activity bump unit, `0 < clause_decay < 1`. The bump unit is
    /// divided by it after every reestimation.
    pub clause_decay: f64,
    /// Reduction is skipped when the boundary clause has at most this LBD.
    pub persistent_lbd: u32,
    pub reestimation_bump_activity: bool,
    pub reestimation_reduce_lbd: bool,
    /// Size of one arena page in words.
    pub page_words: usize,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            clause_decay: 0.999,
            persistent_lbd: 3,
            reestimation_bump_activity: true,
            reestimation_reduce_lbd: true,
            page_words: DEFAULT_PAGE_WORDS,
        }
    }
}

impl DatabaseConfig {
    #[must_use]
    pub fn with_clause_decay(mut self, clause_decay: f64) -> Self {
        assert!(
            clause_decay > 0.0 && clause_decay < 1.0,
            "clause decay must lie in (0, 1), got {clause_decay}"
        );
        self.clause_decay = clause_decay;
        self
    }

    #[must_use]
    pub const fn with_persistent_lbd(mut self, persistent_lbd: u32) -> Self {
        self.persistent_lbd = persistent_lbd;
        self
    }

    #[must_use]
    pub const fn with_reestimation(mut self, bump_activity: bool, reduce_lbd: bool) -> Self {
        self.reestimation_bump_activity = bump_activity;
        self.reestimation_reduce_lbd = reduce_lbd;
        self
    }

    #[must_use]
    pub const fn with_page_words(mut self, page_words: usize) -> Self {
        self.page_words = page_words;
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SubsumptionConfig {
    /// Clauses of this size or larger are not checked as subsumption candidates.
    /// `0` means no limit.
    pub subsumption_lim: usize,
}

impl Default for SubsumptionConfig {
    fn default() -> Self {
        Self {
            subsumption_lim: 1000,
        }
    }
}

impl SubsumptionConfig {
    #[must_use]
    pub const fn with_subsumption_lim(mut self, subsumption_lim: usize) -> Self {
        self.subsumption_lim = subsumption_lim;
        self
    }
}
