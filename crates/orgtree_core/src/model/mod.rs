//! Domain model for the organization registry.
//!
//! # Responsibility
//! - Define the employee record shared by directory and hierarchy code.
//! - Keep hierarchy invariant checks pure and storage-agnostic.
//!
//! # Invariants
//! - Every employee is identified by a stable `EmployeeId`.
//! - The supervisor tree is stored only as `parent_id` back-references;
//!   subordinate sets are always derived.

pub mod employee;
pub mod hierarchy;
