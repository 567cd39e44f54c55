#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
//! DRAT proof output.
//!
//! Every clause added to or removed from the database after the input formula is
//! reported as one line in the textual DRAT format: `1 -2 3 0` for an addition,
//! `d 1 -2 3 0` for a deletion. Writing never interrupts solving. The first I/O
//! error disables the certificate and is handed back by [`Certificate::finish`].

use crate::sat::error::CertificateError;
use crate::sat::literal::Literal;
use itertools::Itertools;
use std::fmt;
use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::Path;
use tracing::warn;

#[derive(Default)]
pub struct Certificate {
    sink: Option<BufWriter<Box<dyn Write + Send>>>,
    error: Option<io::Error>,
    additions: u64,
    deletions: u64,
}

impl fmt::Debug for Certificate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Certificate")
            .field("active", &self.is_active())
            .field("additions", &self.additions)
            .field("deletions", &self.deletions)
            .field("error", &self.error)
            .finish()
    }
}

impl Certificate {
    /// A certificate that drops everything.
    #[must_use]
    pub fn disabled() -> Self {
        Self::default()
    }

    pub fn to_writer(writer: impl Write + Send + 'static) -> Self {
        Self {
            sink: Some(BufWriter::new(Box::new(writer))),
            ..Self::default()
        }
    }

    /// # Errors
    ///
    /// If the file cannot be created.
    pub fn to_file(path: impl AsRef<Path>) -> Result<Self, CertificateError> {
        Ok(Self::to_writer(File::create(path)?))
    }

    #[must_use]
    pub const fn is_active(&self) -> bool {
        self.sink.is_some()
    }

    #[must_use]
    pub const fn additions(&self) -> u64 {
        self.additions
    }

    #[must_use]
    pub const fn deletions(&self) -> u64 {
        self.deletions
    }

    pub fn added<L: Literal>(&mut self, lits: impl IntoIterator<Item = L>) {
        if self.write_line("", lits) {
            self.additions += 1;
        }
    }

    pub fn removed<L: Literal>(&mut self, lits: impl IntoIterator<Item = L>) {
        if self.write_line("d ", lits) {
            self.deletions += 1;
        }
    }

    /// Records that `struck` was removed from the clause `lits`: the shortened
    /// clause is added before the old one is deleted.
    pub fn strengthened<L: Literal>(&mut self, lits: &[L], struck: L) {
        self.added(lits.iter().copied().filter(|&lit| lit != struck));
        self.removed(lits.iter().copied());
    }

    fn write_line<L: Literal>(&mut self, prefix: &str, lits: impl IntoIterator<Item = L>) -> bool {
        let Some(sink) = self.sink.as_mut() else {
            return false;
        };
        let body = lits.into_iter().map(L::to_i32).join(" ");
        let result = if body.is_empty() {
            writeln!(sink, "{prefix}0")
        } else {
            writeln!(sink, "{prefix}{body} 0")
        };
        match result {
            Ok(()) => true,
            Err(e) => {
                self.fail(e);
                false
            }
        }
    }

    fn fail(&mut self, error: io::Error) {
        warn!(%error, "proof certificate disabled after write error");
        self.sink = None;
        self.error.get_or_insert(error);
    }

    /// Flushes buffered lines and reports the first write error, if any.
    ///
    /// # Errors
    ///
    /// The first I/O error hit while writing or flushing.
    pub fn finish(&mut self) -> Result<(), CertificateError> {
        if let Some(sink) = self.sink.as_mut() {
            if let Err(e) = sink.flush() {
                self.fail(e);
            }
        }
        self.error.take().map_or(Ok(()), |e| Err(e.into()))
    }
}
