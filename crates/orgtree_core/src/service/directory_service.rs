//! Employee directory use-case service.
//!
//! # Responsibility
//! - Register employees and read them back.
//! - Maintain interim ("acting") assignments.
//!
//! # Invariants
//! - Registration never sets hierarchy fields.
//! - Interim title and unit are both required and trimmed.

use crate::model::employee::{
    non_blank, Employee, EmployeeId, EmployeeValidationError, InterimAssignment, NewEmployee,
};
use crate::repo::employee_repo::{EmployeeRepoError, EmployeeRepository};
use crate::service::ErrorKind;
use log::{info, warn};
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Errors from directory service operations.
#[derive(Debug)]
pub enum DirectoryError {
    /// Input failed field validation.
    Validation(EmployeeValidationError),
    /// NIP already registered.
    DuplicateNip(String),
    /// Employee does not exist.
    NotFound(EmployeeId),
    /// Repository-level failure.
    Repo(EmployeeRepoError),
}

impl DirectoryError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Validation(_) | Self::DuplicateNip(_) => ErrorKind::Validation,
            Self::NotFound(_) => ErrorKind::NotFound,
            Self::Repo(_) => ErrorKind::Internal,
        }
    }
}

impl Display for DirectoryError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Validation(err) => write!(f, "{err}"),
            Self::DuplicateNip(nip) => write!(f, "nip already registered: {nip}"),
            Self::NotFound(id) => write!(f, "employee not found: {id}"),
            Self::Repo(err) => write!(f, "{err}"),
        }
    }
}

impl Error for DirectoryError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Validation(err) => Some(err),
            Self::Repo(err) => Some(err),
            _ => None,
        }
    }
}

impl From<EmployeeRepoError> for DirectoryError {
    fn from(value: EmployeeRepoError) -> Self {
        match value {
            EmployeeRepoError::Validation(err) => Self::Validation(err),
            EmployeeRepoError::DuplicateNip(nip) => Self::DuplicateNip(nip),
            EmployeeRepoError::NotFound(id) => Self::NotFound(id),
            other => Self::Repo(other),
        }
    }
}

impl From<EmployeeValidationError> for DirectoryError {
    fn from(value: EmployeeValidationError) -> Self {
        Self::Validation(value)
    }
}

/// Employee directory service facade.
pub struct EmployeeDirectory<R: EmployeeRepository> {
    repo: R,
}

impl<R: EmployeeRepository> EmployeeDirectory<R> {
    /// Creates service from repository implementation.
    pub fn new(repo: R) -> Self {
        Self { repo }
    }

    /// Registers one plain, unassigned employee.
    pub fn register(&self, input: &NewEmployee) -> Result<Employee, DirectoryError> {
        let normalized = input.normalized()?;
        let employee = self.repo.create_employee(&normalized).map_err(|err| {
            let err = DirectoryError::from(err);
            warn!(
                "event=employee_register module=directory status=error error_kind={} error={}",
                err.kind().as_str(),
                err
            );
            err
        })?;
        info!(
            "event=employee_register module=directory status=ok employee_id={}",
            employee.id
        );
        Ok(employee)
    }

    /// Loads one employee.
    pub fn get(&self, id: EmployeeId) -> Result<Employee, DirectoryError> {
        self.repo
            .get_employee(id)?
            .ok_or(DirectoryError::NotFound(id))
    }

    /// Lists all employees ordered by id.
    pub fn list(&self) -> Result<Vec<Employee>, DirectoryError> {
        self.repo.list_employees().map_err(Into::into)
    }

    /// Marks one employee as acting in another position.
    pub fn assign_interim(
        &self,
        id: EmployeeId,
        title: impl Into<String>,
        unit: impl Into<String>,
    ) -> Result<Employee, DirectoryError> {
        let title: String = title.into();
        let unit: String = unit.into();
        let assignment = InterimAssignment {
            title: non_blank(&title, "interim title")?,
            unit: non_blank(&unit, "interim unit")?,
        };
        let employee = self.repo.set_interim(id, &assignment)?;
        info!(
            "event=interim_assign module=directory status=ok employee_id={}",
            id
        );
        Ok(employee)
    }

    /// Removes the interim assignment of one employee.
    pub fn clear_interim(&self, id: EmployeeId) -> Result<Employee, DirectoryError> {
        let employee = self.repo.clear_interim(id)?;
        info!(
            "event=interim_clear module=directory status=ok employee_id={}",
            id
        );
        Ok(employee)
    }
}
