//! Core of a conflict-driven clause learning SAT engine: clause storage, the clause
//! database and its maintenance, two-watched-literal propagation and backward
//! subsumption with DRAT proof output.
//!
//! Search heuristics (decisions, conflict analysis, restarts) are left to the
//! embedding solver. A typical setup:
//!
//! ```
//! use sat_engine::sat::clause_database::ClauseDatabase;
//! use sat_engine::sat::configs::DatabaseConfig;
//! use sat_engine::sat::literal::{DoubleLiteral, Literal};
//! use sat_engine::sat::propagation::Propagator;
//! use sat_engine::sat::trail::Trail;
//!
//! let lit = DoubleLiteral::from_i32;
//! let mut db = ClauseDatabase::new(3, DatabaseConfig::default().with_page_words(1024));
//! let mut propagator = Propagator::new(3);
//! let mut trail = Trail::new(3);
//!
//! let clause = db.add_clause(&[lit(1), lit(2), lit(3)], false);
//! propagator.attach_clause(&db, clause);
//!
//! trail.unchecked_enqueue(lit(-1), None);
//! trail.unchecked_enqueue(lit(-2), None);
//! assert_eq!(propagator.propagate(&mut trail, &db), None);
//! assert_eq!(trail.value(lit(3)), Some(true));
//! ```

/// The `sat` module holds every component of the engine.
pub mod sat;
