//! Core domain logic for the organization registry.
//! This crate is the single source of truth for hierarchy invariants.

pub mod config;
pub mod db;
pub mod logging;
pub mod model;
pub mod repo;
pub mod service;

pub use config::{ConfigError, CoreConfig};
pub use db::{open_db, open_db_in_memory, open_db_with, DbError, DbOptions};
pub use logging::{default_log_level, init_logging, logging_status, LoggingConfig, LoggingError};
pub use model::employee::{
    Employee, EmployeeId, EmployeeValidationError, InterimAssignment, NewEmployee,
};
pub use model::hierarchy::{find_violations, HierarchyViolation, ResolvedEmployee};
pub use repo::employee_repo::{
    EmployeeRepoError, EmployeeRepository, SqliteEmployeeRepository,
};
pub use repo::hierarchy_repo::{
    DemoteOutcome, HierarchyRepoError, HierarchyRepository, ReassignCase, ReassignOutcome,
    SeatChangeStep, SqliteHierarchyRepository,
};
pub use service::directory_service::{DirectoryError, EmployeeDirectory};
pub use service::hierarchy_mutator::{
    HierarchyError, HierarchyMutator, PromoteRequest, ReassignRequest,
};
pub use service::hierarchy_reader::HierarchyReader;
pub use service::ErrorKind;

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
