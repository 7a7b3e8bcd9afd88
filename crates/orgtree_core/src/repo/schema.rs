//! Connection readiness checks shared by employee-backed repositories.

use crate::db::migrations::latest_version;
use rusqlite::Connection;
use std::error::Error;
use std::fmt::{Display, Formatter};

const EMPLOYEE_COLUMNS: [&str; 11] = [
    "id",
    "nip",
    "name",
    "position",
    "unit",
    "is_official",
    "level",
    "parent_id",
    "is_interim",
    "interim_title",
    "interim_unit",
];

/// Connection is not migrated to the layout repositories expect.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SchemaError {
    /// Connection schema is not at the expected migrated version.
    UninitializedConnection {
        expected_version: u32,
        actual_version: u32,
    },
    /// Required table is missing.
    MissingRequiredTable(&'static str),
    /// Required column is missing from expected table.
    MissingRequiredColumn {
        table: &'static str,
        column: &'static str,
    },
}

impl Display for SchemaError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::UninitializedConnection {
                expected_version,
                actual_version,
            } => write!(
                f,
                "repository requires schema version {expected_version}, got {actual_version}"
            ),
            Self::MissingRequiredTable(table) => {
                write!(f, "repository requires table `{table}`")
            }
            Self::MissingRequiredColumn { table, column } => write!(
                f,
                "repository requires column `{column}` in table `{table}`"
            ),
        }
    }
}

impl Error for SchemaError {}

pub(crate) fn ensure_employee_schema<E>(conn: &Connection) -> Result<(), E>
where
    E: From<rusqlite::Error> + From<SchemaError>,
{
    let expected_version = latest_version();
    let actual_version: u32 = conn.query_row("PRAGMA user_version;", [], |row| row.get(0))?;
    if actual_version != expected_version {
        return Err(SchemaError::UninitializedConnection {
            expected_version,
            actual_version,
        }
        .into());
    }

    let present = column_names(conn, "employees")?;
    if present.is_empty() {
        return Err(SchemaError::MissingRequiredTable("employees").into());
    }
    if let Some(column) = EMPLOYEE_COLUMNS
        .into_iter()
        .find(|column| !present.iter().any(|name| name == column))
    {
        return Err(SchemaError::MissingRequiredColumn {
            table: "employees",
            column,
        }
        .into());
    }
    Ok(())
}

/// Column names of `table`; empty when the table does not exist.
fn column_names(conn: &Connection, table: &str) -> rusqlite::Result<Vec<String>> {
    let mut stmt = conn.prepare("SELECT name FROM pragma_table_info(?1);")?;
    let names = stmt
        .query_map([table], |row| row.get(0))?
        .collect::<rusqlite::Result<Vec<String>>>()?;
    Ok(names)
}
