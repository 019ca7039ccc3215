//! Repository layer abstractions and persistence implementations.
//!
//! # Responsibility
//! - Define use-case oriented data access contracts.
//! - Isolate SQLite query details from service orchestration.
//!
//! # Invariants
//! - Repository writes enforce model `validate()` before persistence.
//! - Repository APIs return semantic errors (`LocationNotFound`,
//!   `ItemNotFound`) in addition to DB transport errors.
//! - Writes spanning both tables run in one immediate transaction.

pub mod item_repo;
pub mod location_repo;
