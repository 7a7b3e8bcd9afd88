//! Shared SELECT lists and row decoding for the `employees` table.

use crate::model::employee::{Employee, InterimAssignment};
use crate::model::hierarchy::ResolvedEmployee;
use rusqlite::Row;

pub(crate) const EMPLOYEE_SELECT_SQL: &str = "SELECT
    id,
    nip,
    name,
    position,
    unit,
    is_official,
    level,
    parent_id,
    is_interim,
    interim_title,
    interim_unit
FROM employees";

/// Employee `e` joined with its direct supervisor `p`.
///
/// Supervisor columns carry the `parent__` prefix.
pub(crate) const RESOLVED_SELECT_SQL: &str = "SELECT
    e.id AS id,
    e.nip AS nip,
    e.name AS name,
    e.position AS position,
    e.unit AS unit,
    e.is_official AS is_official,
    e.level AS level,
    e.parent_id AS parent_id,
    e.is_interim AS is_interim,
    e.interim_title AS interim_title,
    e.interim_unit AS interim_unit,
    p.id AS parent__id,
    p.nip AS parent__nip,
    p.name AS parent__name,
    p.position AS parent__position,
    p.unit AS parent__unit,
    p.is_official AS parent__is_official,
    p.level AS parent__level,
    p.parent_id AS parent__parent_id,
    p.is_interim AS parent__is_interim,
    p.interim_title AS parent__interim_title,
    p.interim_unit AS parent__interim_unit
FROM employees e
LEFT JOIN employees p ON p.id = e.parent_id";

const PARENT_PREFIX: &str = "parent__";

/// Persisted row cannot be converted to a valid employee.
#[derive(Debug)]
pub(crate) struct InvalidRow(pub(crate) String);

pub(crate) fn parse_employee_row<E>(row: &Row<'_>) -> Result<Employee, E>
where
    E: From<rusqlite::Error> + From<InvalidRow>,
{
    parse_prefixed(row, "")
}

pub(crate) fn parse_resolved_row<E>(row: &Row<'_>) -> Result<ResolvedEmployee, E>
where
    E: From<rusqlite::Error> + From<InvalidRow>,
{
    let employee = parse_prefixed::<E>(row, "")?;
    let parent_present = row
        .get::<_, Option<i64>>(format!("{PARENT_PREFIX}id").as_str())?
        .is_some();
    let parent = if parent_present {
        Some(parse_prefixed::<E>(row, PARENT_PREFIX)?)
    } else {
        None
    };
    Ok(ResolvedEmployee { employee, parent })
}

fn parse_prefixed<E>(row: &Row<'_>, prefix: &str) -> Result<Employee, E>
where
    E: From<rusqlite::Error> + From<InvalidRow>,
{
    let column = |name: &str| format!("{prefix}{name}");

    let is_official = parse_flag(row.get(column("is_official").as_str())?, "is_official")?;
    let is_interim = parse_flag(row.get(column("is_interim").as_str())?, "is_interim")?;

    let level = match row.get::<_, Option<i64>>(column("level").as_str())? {
        None => None,
        Some(value) => Some(u32::try_from(value).map_err(|_| {
            InvalidRow(format!("invalid level `{value}` in employees.level"))
        })?),
    };

    let interim_title: Option<String> = row.get(column("interim_title").as_str())?;
    let interim_unit: Option<String> = row.get(column("interim_unit").as_str())?;
    let interim = match (is_interim, interim_title, interim_unit) {
        (true, Some(title), Some(unit)) => Some(InterimAssignment { title, unit }),
        (false, None, None) => None,
        _ => {
            return Err(InvalidRow(
                "interim flag disagrees with employees.interim_title/interim_unit".to_string(),
            )
            .into());
        }
    };

    let employee = Employee {
        id: row.get(column("id").as_str())?,
        nip: row.get(column("nip").as_str())?,
        name: row.get(column("name").as_str())?,
        position: row.get(column("position").as_str())?,
        unit: row.get(column("unit").as_str())?,
        is_official,
        level,
        parent_id: row.get(column("parent_id").as_str())?,
        interim,
    };
    employee
        .validate()
        .map_err(|err| InvalidRow(format!("employee {}: {err}", employee.id)))?;
    Ok(employee)
}

fn parse_flag(value: i64, column: &'static str) -> Result<bool, InvalidRow> {
    match value {
        0 => Ok(false),
        1 => Ok(true),
        other => Err(InvalidRow(format!(
            "invalid {column} value `{other}` in employees.{column}"
        ))),
    }
}
