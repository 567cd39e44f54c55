//! Recoverable failures of the engine.
//!
//! Invariant violations (attaching a unit clause as a long watcher, detaching a clause
//! that was never attached, ...) are programming errors and panic instead.

use crate::sat::clause::ClauseRef;
use thiserror::Error;

/// Errors raised by the clause arena.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum ArenaError {
    /// The handle was issued before the last relocation or reset.
    #[error("stale clause reference {cref:?}: arena is at generation {generation}")]
    StaleReference { cref: ClauseRef, generation: u32 },

    /// The handle does not point at a clause record of this arena.
    #[error("clause reference {0:?} is outside of the arena")]
    OutOfBounds(ClauseRef),
}

/// Errors raised while writing a proof certificate.
#[derive(Debug, Error)]
pub enum CertificateError {
    #[error("failed to write proof certificate: {0}")]
    Io(#[from] std::io::Error),
}
