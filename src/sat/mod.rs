#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
pub mod assignment;
pub mod certificate;
pub mod clause;
pub mod clause_database;
pub mod clause_management;
pub mod clause_storage;
pub mod configs;
pub mod error;
pub mod literal;
pub mod propagation;
pub mod subsumption;
pub mod trail;
pub mod watch;
