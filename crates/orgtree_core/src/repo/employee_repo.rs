//! Employee directory repository contracts and SQLite implementation.
//!
//! # Responsibility
//! - Register employee rows and read them back.
//! - Maintain interim ("acting") assignment fields.
//!
//! # Invariants
//! - New rows are always plain, unassigned employees.
//! - Nothing in this repository writes `is_official`, `level` or `parent_id`.
//! - Listing is deterministic: `id ASC`.

use super::rows::{parse_employee_row, InvalidRow, EMPLOYEE_SELECT_SQL};
use super::schema::{ensure_employee_schema, SchemaError};
use crate::db::DbError;
use crate::model::employee::{
    Employee, EmployeeId, EmployeeValidationError, InterimAssignment, NewEmployee,
};
use rusqlite::{ffi, params, Connection, OptionalExtension};
use std::error::Error;
use std::fmt::{Display, Formatter};

pub type EmployeeRepoResult<T> = Result<T, EmployeeRepoError>;

/// Errors from employee directory persistence.
#[derive(Debug)]
pub enum EmployeeRepoError {
    Db(DbError),
    Schema(SchemaError),
    Validation(EmployeeValidationError),
    NotFound(EmployeeId),
    /// Another row already uses this NIP.
    DuplicateNip(String),
    InvalidData(String),
}

impl Display for EmployeeRepoError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Db(err) => write!(f, "{err}"),
            Self::Schema(err) => write!(f, "{err}"),
            Self::Validation(err) => write!(f, "{err}"),
            Self::NotFound(id) => write!(f, "employee not found: {id}"),
            Self::DuplicateNip(nip) => write!(f, "nip already registered: {nip}"),
            Self::InvalidData(message) => write!(f, "invalid persisted employee data: {message}"),
        }
    }
}

impl Error for EmployeeRepoError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Db(err) => Some(err),
            Self::Schema(err) => Some(err),
            Self::Validation(err) => Some(err),
            Self::NotFound(_) => None,
            Self::DuplicateNip(_) => None,
            Self::InvalidData(_) => None,
        }
    }
}

impl From<DbError> for EmployeeRepoError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<rusqlite::Error> for EmployeeRepoError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Db(DbError::Sqlite(value))
    }
}

impl From<SchemaError> for EmployeeRepoError {
    fn from(value: SchemaError) -> Self {
        Self::Schema(value)
    }
}

impl From<EmployeeValidationError> for EmployeeRepoError {
    fn from(value: EmployeeValidationError) -> Self {
        Self::Validation(value)
    }
}

impl From<InvalidRow> for EmployeeRepoError {
    fn from(value: InvalidRow) -> Self {
        Self::InvalidData(value.0)
    }
}

/// Repository interface for employee directory rows.
pub trait EmployeeRepository {
    /// Inserts one plain employee and returns the stored row.
    fn create_employee(&self, input: &NewEmployee) -> EmployeeRepoResult<Employee>;
    /// Loads one employee by id.
    fn get_employee(&self, id: EmployeeId) -> EmployeeRepoResult<Option<Employee>>;
    /// Lists every employee ordered by id.
    fn list_employees(&self) -> EmployeeRepoResult<Vec<Employee>>;
    /// Sets the interim assignment on one employee.
    fn set_interim(
        &self,
        id: EmployeeId,
        assignment: &InterimAssignment,
    ) -> EmployeeRepoResult<Employee>;
    /// Clears the interim assignment on one employee.
    fn clear_interim(&self, id: EmployeeId) -> EmployeeRepoResult<Employee>;
}

/// SQLite-backed employee directory.
pub struct SqliteEmployeeRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteEmployeeRepository<'conn> {
    /// Creates repository from migrated connection.
    pub fn try_new(conn: &'conn Connection) -> EmployeeRepoResult<Self> {
        ensure_employee_schema::<EmployeeRepoError>(conn)?;
        Ok(Self { conn })
    }
}

impl EmployeeRepository for SqliteEmployeeRepository<'_> {
    fn create_employee(&self, input: &NewEmployee) -> EmployeeRepoResult<Employee> {
        let input = input.normalized()?;

        let inserted = self.conn.execute(
            "INSERT INTO employees (nip, name, position, unit)
             VALUES (?1, ?2, ?3, ?4);",
            params![
                input.nip.as_str(),
                input.name.as_str(),
                input.position.as_str(),
                input.unit.as_str(),
            ],
        );
        match inserted {
            Ok(_) => {}
            Err(err) if is_unique_violation(&err) => {
                return Err(EmployeeRepoError::DuplicateNip(input.nip));
            }
            Err(err) => return Err(err.into()),
        }

        let id = self.conn.last_insert_rowid();
        load_required(self.conn, id)
    }

    fn get_employee(&self, id: EmployeeId) -> EmployeeRepoResult<Option<Employee>> {
        let mut stmt = self
            .conn
            .prepare(&format!("{EMPLOYEE_SELECT_SQL} WHERE id = ?1;"))?;
        let mut rows = stmt.query([id])?;
        if let Some(row) = rows.next()? {
            return Ok(Some(parse_employee_row::<EmployeeRepoError>(row)?));
        }
        Ok(None)
    }

    fn list_employees(&self) -> EmployeeRepoResult<Vec<Employee>> {
        let mut stmt = self
            .conn
            .prepare(&format!("{EMPLOYEE_SELECT_SQL} ORDER BY id ASC;"))?;
        let mut rows = stmt.query([])?;
        let mut employees = Vec::new();
        while let Some(row) = rows.next()? {
            employees.push(parse_employee_row::<EmployeeRepoError>(row)?);
        }
        Ok(employees)
    }

    fn set_interim(
        &self,
        id: EmployeeId,
        assignment: &InterimAssignment,
    ) -> EmployeeRepoResult<Employee> {
        let changed = self.conn.execute(
            "UPDATE employees
             SET is_interim = 1,
                 interim_title = ?2,
                 interim_unit = ?3,
                 updated_at = (strftime('%s', 'now') * 1000)
             WHERE id = ?1;",
            params![id, assignment.title.as_str(), assignment.unit.as_str()],
        )?;
        if changed == 0 {
            return Err(EmployeeRepoError::NotFound(id));
        }
        load_required(self.conn, id)
    }

    fn clear_interim(&self, id: EmployeeId) -> EmployeeRepoResult<Employee> {
        let changed = self.conn.execute(
            "UPDATE employees
             SET is_interim = 0,
                 interim_title = NULL,
                 interim_unit = NULL,
                 updated_at = (strftime('%s', 'now') * 1000)
             WHERE id = ?1;",
            [id],
        )?;
        if changed == 0 {
            return Err(EmployeeRepoError::NotFound(id));
        }
        load_required(self.conn, id)
    }
}

fn load_required(conn: &Connection, id: EmployeeId) -> EmployeeRepoResult<Employee> {
    conn.query_row(
        &format!("{EMPLOYEE_SELECT_SQL} WHERE id = ?1;"),
        [id],
        |row| Ok(parse_employee_row::<EmployeeRepoError>(row)),
    )
    .optional()?
    .transpose()?
    .ok_or(EmployeeRepoError::NotFound(id))
}

fn is_unique_violation(err: &rusqlite::Error) -> bool {
    matches!(
        err,
        rusqlite::Error::SqliteFailure(failure, _)
            if failure.extended_code == ffi::SQLITE_CONSTRAINT_UNIQUE
    )
}
