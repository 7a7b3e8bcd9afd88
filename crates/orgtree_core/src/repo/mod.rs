//! Repository layer abstractions and persistence implementations.
//!
//! # Responsibility
//! - Define use-case oriented data access contracts.
//! - Isolate SQLite query and transaction details from services.
//!
//! # Invariants
//! - Only `hierarchy_repo` writes `is_official`, `level` and `parent_id`.
//! - Repository APIs return semantic errors (`NotFound`) in addition to DB
//!   transport errors.
//! - Read paths reject invalid persisted rows instead of masking them.

pub mod employee_repo;
pub mod hierarchy_repo;
mod rows;
mod schema;

pub use schema::SchemaError;
