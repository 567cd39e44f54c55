#![allow(dead_code)]

use sat_engine::sat::clause::ClauseRef;
use sat_engine::sat::clause_database::ClauseDatabase;
use sat_engine::sat::configs::DatabaseConfig;
use sat_engine::sat::literal::{DoubleLiteral, Literal};
use sat_engine::sat::propagation::Propagator;
use sat_engine::sat::trail::Trail;
use std::io::{self, Write};
use std::sync::{Arc, Mutex};

pub type Lit = DoubleLiteral;

pub fn lit(l: i32) -> Lit {
    Lit::from_i32(l)
}

pub fn lits(v: &[i32]) -> Vec<Lit> {
    v.iter().map(|&l| lit(l)).collect()
}

pub fn sorted_dimacs(lits: impl IntoIterator<Item = Lit>) -> Vec<i32> {
    let mut v = lits.into_iter().map(Lit::to_i32).collect::<Vec<_>>();
    v.sort_unstable();
    v
}

/// Database, propagator and trail wired together the way a solver would hold them.
pub struct Engine {
    pub db: ClauseDatabase<Lit>,
    pub propagator: Propagator<Lit>,
    pub trail: Trail<Lit>,
}

impl Engine {
    pub fn new(num_vars: usize) -> Self {
        Self::with_config(num_vars, DatabaseConfig::default().with_page_words(4096))
    }

    pub fn with_config(num_vars: usize, config: DatabaseConfig) -> Self {
        Self {
            db: ClauseDatabase::new(num_vars, config),
            propagator: Propagator::new(num_vars),
            trail: Trail::new(num_vars),
        }
    }

    pub fn add(&mut self, clause: &[i32]) -> ClauseRef {
        let cref = self.db.add_clause(&lits(clause), false);
        self.propagator.attach_clause(&self.db, cref);
        cref
    }

    pub fn decide(&mut self, l: i32) -> Option<ClauseRef> {
        self.trail.new_decision_level();
        self.trail.unchecked_enqueue(lit(l), None);
        self.propagator.propagate(&mut self.trail, &self.db)
    }
}

/// A writer whose contents stay readable after it was handed to a certificate.
#[derive(Clone, Default)]
pub struct SharedBuffer(Arc<Mutex<Vec<u8>>>);

impl SharedBuffer {
    pub fn contents(&self) -> String {
        String::from_utf8(self.0.lock().unwrap().clone()).unwrap()
    }
}

impl Write for SharedBuffer {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}
