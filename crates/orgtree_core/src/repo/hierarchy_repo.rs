//! Hierarchy repository contracts and SQLite implementation.
//!
//! # Responsibility
//! - Own every write to `is_official`, `level` and `parent_id`.
//! - Run each promote / reassign / demote as one ordered step list inside a
//!   single `IMMEDIATE` transaction.
//! - Serve hierarchy read queries with the direct supervisor resolved.
//!
//! # Invariants
//! - A mutation either commits all of its steps or none of them. Any early
//!   return drops the open transaction, which rolls it back.
//! - Subordinates are never stored; they are the rows whose `parent_id`
//!   matches, found through `idx_employees_parent_id`.
//! - No write closes a `parent_id` loop. Bulk re-links skip every row on the
//!   new official's own supervisor chain.
//! - In a seat change, detaching the outgoing official's subordinates runs
//!   before the unit re-link, so those rows are eligible for it.
//! - Rank ordering between parent and child is not enforced.

use super::rows::{
    parse_employee_row, parse_resolved_row, InvalidRow, EMPLOYEE_SELECT_SQL, RESOLVED_SELECT_SQL,
};
use super::schema::{ensure_employee_schema, SchemaError};
use crate::db::DbError;
use crate::model::employee::{Employee, EmployeeId};
use crate::model::hierarchy::ResolvedEmployee;
use log::debug;
use rusqlite::{params, Connection, Transaction, TransactionBehavior};
use serde::Serialize;
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Result type used by hierarchy repository operations.
pub type HierarchyRepoResult<T> = Result<T, HierarchyRepoError>;

/// Ordered steps of a promotion.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PromoteStep {
    /// Mark the employee official with the requested level and parent.
    ClaimSeat,
    /// Below the top level: adopt every unassigned employee of the unit.
    AdoptUnassigned,
}

pub const PROMOTE_STEPS: [PromoteStep; 2] = [PromoteStep::ClaimSeat, PromoteStep::AdoptUnassigned];

/// Ordered steps of a seat change (new occupant for an official seat).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SeatChangeStep {
    /// Outgoing official becomes a plain, unassigned employee.
    DemoteOutgoing,
    /// Outgoing official's direct subordinates lose their parent.
    DetachSubordinates,
    /// Incoming employee takes the seat.
    PromoteIncoming,
    /// Unassigned employees of the incoming official's unit report to them.
    RelinkUnassigned,
    /// Same unit only: the outgoing employee reports to their successor.
    AttachOutgoing,
}

/// Must stay in this order: `DetachSubordinates` feeds `RelinkUnassigned`,
/// and `AttachOutgoing` needs the resolved incoming official.
pub const SEAT_CHANGE_STEPS: [SeatChangeStep; 5] = [
    SeatChangeStep::DemoteOutgoing,
    SeatChangeStep::DetachSubordinates,
    SeatChangeStep::PromoteIncoming,
    SeatChangeStep::RelinkUnassigned,
    SeatChangeStep::AttachOutgoing,
];

impl SeatChangeStep {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::DemoteOutgoing => "demote_outgoing",
            Self::DetachSubordinates => "detach_subordinates",
            Self::PromoteIncoming => "promote_incoming",
            Self::RelinkUnassigned => "relink_unassigned",
            Self::AttachOutgoing => "attach_outgoing",
        }
    }
}

/// Ordered steps of a demotion.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DemoteStep {
    /// Direct subordinates become unassigned.
    DetachSubordinates,
    /// Official flag and level are cleared. `parent_id` is left as is.
    ClearSeat,
}

pub const DEMOTE_STEPS: [DemoteStep; 2] = [DemoteStep::DetachSubordinates, DemoteStep::ClearSeat];

/// Errors from hierarchy repository operations.
#[derive(Debug)]
pub enum HierarchyRepoError {
    /// Underlying SQLite/bootstrap error.
    Db(DbError),
    /// Connection is not migrated to the expected layout.
    Schema(SchemaError),
    /// Target employee does not exist.
    EmployeeNotFound(EmployeeId),
    /// Target employee exists but does not hold an official seat.
    NotAnOfficial(EmployeeId),
    /// Requested supervisor does not exist.
    ParentNotFound(EmployeeId),
    /// Assigning `parent_id` to `employee_id` would close a loop.
    CycleDetected {
        employee_id: EmployeeId,
        parent_id: EmployeeId,
    },
    /// Incoming employee of a seat change vanished after the outgoing
    /// official was already demoted in the same transaction.
    IncomingNotFound(EmployeeId),
    /// Storage failure inside one seat-change step.
    SeatChangeFailed {
        step: SeatChangeStep,
        source: DbError,
    },
    /// Persisted data cannot be converted to valid read model.
    InvalidData(String),
}

impl Display for HierarchyRepoError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Db(err) => write!(f, "{err}"),
            Self::Schema(err) => write!(f, "{err}"),
            Self::EmployeeNotFound(id) => write!(f, "employee not found: {id}"),
            Self::NotAnOfficial(id) => write!(f, "employee is not an official: {id}"),
            Self::ParentNotFound(id) => write!(f, "supervisor not found: {id}"),
            Self::CycleDetected {
                employee_id,
                parent_id,
            } => write!(
                f,
                "assigning supervisor {parent_id} to employee {employee_id} would create a cycle"
            ),
            Self::IncomingNotFound(id) => {
                write!(f, "incoming employee not found during seat change: {id}")
            }
            Self::SeatChangeFailed { step, source } => {
                write!(f, "seat change failed at step `{}`: {source}", step.as_str())
            }
            Self::InvalidData(message) => write!(f, "invalid hierarchy data: {message}"),
        }
    }
}

impl Error for HierarchyRepoError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Db(err) => Some(err),
            Self::Schema(err) => Some(err),
            Self::SeatChangeFailed { source, .. } => Some(source),
            Self::EmployeeNotFound(_)
            | Self::NotAnOfficial(_)
            | Self::ParentNotFound(_)
            | Self::CycleDetected { .. }
            | Self::IncomingNotFound(_)
            | Self::InvalidData(_) => None,
        }
    }
}

impl From<DbError> for HierarchyRepoError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<rusqlite::Error> for HierarchyRepoError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Db(DbError::Sqlite(value))
    }
}

impl From<SchemaError> for HierarchyRepoError {
    fn from(value: SchemaError) -> Self {
        Self::Schema(value)
    }
}

impl From<InvalidRow> for HierarchyRepoError {
    fn from(value: InvalidRow) -> Self {
        Self::InvalidData(value.0)
    }
}

/// Result of a committed promotion.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PromoteOutcome {
    /// Promoted employee as stored after commit.
    pub employee: Employee,
    /// Unassigned employees of the unit that now report to them.
    pub adopted: usize,
}

/// Which reassignment path ran.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ReassignCase {
    /// Same occupant, new level and/or parent.
    SameOccupant,
    /// Seat handed to another employee.
    NewOccupant,
}

/// Result of a committed reassignment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ReassignOutcome {
    pub case: ReassignCase,
    /// Former direct subordinates of the outgoing official that were detached.
    pub detached: usize,
    /// Unassigned employees re-linked to the incoming official.
    pub relinked: usize,
    /// Whether the outgoing employee now reports to their successor.
    pub outgoing_attached: bool,
}

impl ReassignOutcome {
    fn same_occupant() -> Self {
        Self {
            case: ReassignCase::SameOccupant,
            detached: 0,
            relinked: 0,
            outgoing_attached: false,
        }
    }
}

/// Result of a committed demotion.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct DemoteOutcome {
    /// Former direct subordinates that became unassigned.
    pub detached: usize,
}

/// Repository interface for hierarchy mutations and queries.
pub trait HierarchyRepository {
    /// Makes `employee_id` an official and adopts the unit's unassigned
    /// employees when `level > 1`.
    fn promote(
        &self,
        employee_id: EmployeeId,
        level: u32,
        parent_id: Option<EmployeeId>,
    ) -> HierarchyRepoResult<PromoteOutcome>;
    /// Changes level and parent of an official in place.
    fn update_seat(
        &self,
        official_id: EmployeeId,
        level: u32,
        parent_id: Option<EmployeeId>,
    ) -> HierarchyRepoResult<ReassignOutcome>;
    /// Hands the seat held by `official_id` to `incoming_id`.
    fn replace_occupant(
        &self,
        official_id: EmployeeId,
        incoming_id: EmployeeId,
        level: u32,
        parent_id: Option<EmployeeId>,
    ) -> HierarchyRepoResult<ReassignOutcome>;
    /// Detaches subordinates and clears the official seat.
    fn demote(&self, employee_id: EmployeeId) -> HierarchyRepoResult<DemoteOutcome>;
    /// Lists officials by `level ASC, id ASC`.
    fn list_officials(&self) -> HierarchyRepoResult<Vec<ResolvedEmployee>>;
    /// Loads one official; `None` if absent or not an official.
    fn get_official(&self, id: EmployeeId) -> HierarchyRepoResult<Option<ResolvedEmployee>>;
    /// Lists plain employees by `name ASC, id ASC`.
    fn list_promotable(&self) -> HierarchyRepoResult<Vec<Employee>>;
    /// Lists direct subordinates by `id ASC`.
    fn list_subordinates(&self, id: EmployeeId) -> HierarchyRepoResult<Vec<ResolvedEmployee>>;
    /// Lists employees of one unit by `name ASC, id ASC`.
    fn list_by_unit(
        &self,
        unit: &str,
        exclude_id: Option<EmployeeId>,
    ) -> HierarchyRepoResult<Vec<Employee>>;
    /// Loads every employee by `id ASC` from one read.
    fn snapshot(&self) -> HierarchyRepoResult<Vec<Employee>>;
}

/// SQLite-backed hierarchy repository.
pub struct SqliteHierarchyRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteHierarchyRepository<'conn> {
    /// Creates repository from migrated connection.
    pub fn try_new(conn: &'conn Connection) -> HierarchyRepoResult<Self> {
        ensure_employee_schema::<HierarchyRepoError>(conn)?;
        Ok(Self { conn })
    }

    fn begin(&self) -> HierarchyRepoResult<Transaction<'conn>> {
        // IMMEDIATE takes the write lock up front, so the reads that decide
        // a mutation see the same state the writes apply to.
        Ok(Transaction::new_unchecked(
            self.conn,
            TransactionBehavior::Immediate,
        )?)
    }
}

/// Working state threaded through the seat-change steps.
struct SeatChange {
    outgoing: Employee,
    incoming_id: EmployeeId,
    level: u32,
    parent_id: Option<EmployeeId>,
    incoming: Option<Employee>,
    outcome: ReassignOutcome,
}

impl HierarchyRepository for SqliteHierarchyRepository<'_> {
    fn promote(
        &self,
        employee_id: EmployeeId,
        level: u32,
        parent_id: Option<EmployeeId>,
    ) -> HierarchyRepoResult<PromoteOutcome> {
        let tx = self.begin()?;
        let employee = load_employee(&tx, employee_id)?
            .ok_or(HierarchyRepoError::EmployeeNotFound(employee_id))?;
        if let Some(parent_id) = parent_id {
            ensure_parent_assignable(&tx, employee_id, parent_id)?;
        }

        let mut adopted = 0;
        for step in PROMOTE_STEPS {
            match step {
                PromoteStep::ClaimSeat => {
                    claim_seat(&tx, employee_id, level, parent_id)?;
                }
                PromoteStep::AdoptUnassigned => {
                    if level > 1 {
                        adopted = relink_unassigned(&tx, &employee.unit, employee_id)?;
                    }
                }
            }
            debug!(
                "event=promote_step module=hierarchy employee_id={} step={:?}",
                employee_id, step
            );
        }

        let employee = load_employee(&tx, employee_id)?
            .ok_or(HierarchyRepoError::EmployeeNotFound(employee_id))?;
        tx.commit()?;
        Ok(PromoteOutcome { employee, adopted })
    }

    fn update_seat(
        &self,
        official_id: EmployeeId,
        level: u32,
        parent_id: Option<EmployeeId>,
    ) -> HierarchyRepoResult<ReassignOutcome> {
        let tx = self.begin()?;
        load_official(&tx, official_id)?;
        if let Some(parent_id) = parent_id {
            ensure_parent_assignable(&tx, official_id, parent_id)?;
        }

        claim_seat(&tx, official_id, level, parent_id)?;
        tx.commit()?;
        Ok(ReassignOutcome::same_occupant())
    }

    fn replace_occupant(
        &self,
        official_id: EmployeeId,
        incoming_id: EmployeeId,
        level: u32,
        parent_id: Option<EmployeeId>,
    ) -> HierarchyRepoResult<ReassignOutcome> {
        let tx = self.begin()?;
        let outgoing = load_official(&tx, official_id)?;
        if let Some(parent_id) = parent_id {
            if !employee_exists(&tx, parent_id)? {
                return Err(HierarchyRepoError::ParentNotFound(parent_id));
            }
        }

        let mut change = SeatChange {
            outgoing,
            incoming_id,
            level,
            parent_id,
            incoming: None,
            outcome: ReassignOutcome {
                case: ReassignCase::NewOccupant,
                detached: 0,
                relinked: 0,
                outgoing_attached: false,
            },
        };
        for step in SEAT_CHANGE_STEPS {
            run_seat_change_step(&tx, step, &mut change).map_err(|err| match err {
                HierarchyRepoError::Db(source) => {
                    HierarchyRepoError::SeatChangeFailed { step, source }
                }
                other => other,
            })?;
            debug!(
                "event=seat_change_step module=hierarchy official_id={} incoming_id={} step={}",
                official_id,
                incoming_id,
                step.as_str()
            );
        }

        tx.commit()?;
        Ok(change.outcome)
    }

    fn demote(&self, employee_id: EmployeeId) -> HierarchyRepoResult<DemoteOutcome> {
        let tx = self.begin()?;
        if !employee_exists(&tx, employee_id)? {
            return Err(HierarchyRepoError::EmployeeNotFound(employee_id));
        }

        let mut detached = 0;
        for step in DEMOTE_STEPS {
            match step {
                DemoteStep::DetachSubordinates => {
                    detached = detach_subordinates(&tx, employee_id)?;
                }
                DemoteStep::ClearSeat => {
                    tx.execute(
                        "UPDATE employees
                         SET is_official = 0,
                             level = NULL,
                             updated_at = (strftime('%s', 'now') * 1000)
                         WHERE id = ?1;",
                        [employee_id],
                    )?;
                }
            }
            debug!(
                "event=demote_step module=hierarchy employee_id={} step={:?}",
                employee_id, step
            );
        }

        tx.commit()?;
        Ok(DemoteOutcome { detached })
    }

    fn list_officials(&self) -> HierarchyRepoResult<Vec<ResolvedEmployee>> {
        query_resolved(
            self.conn,
            &format!("{RESOLVED_SELECT_SQL} WHERE e.is_official = 1 ORDER BY e.level ASC, e.id ASC;"),
            params![],
        )
    }

    fn get_official(&self, id: EmployeeId) -> HierarchyRepoResult<Option<ResolvedEmployee>> {
        let mut found = query_resolved(
            self.conn,
            &format!("{RESOLVED_SELECT_SQL} WHERE e.id = ?1 AND e.is_official = 1;"),
            params![id],
        )?;
        Ok(found.pop())
    }

    fn list_promotable(&self) -> HierarchyRepoResult<Vec<Employee>> {
        query_employees(
            self.conn,
            &format!("{EMPLOYEE_SELECT_SQL} WHERE is_official = 0 ORDER BY name ASC, id ASC;"),
            params![],
        )
    }

    fn list_subordinates(&self, id: EmployeeId) -> HierarchyRepoResult<Vec<ResolvedEmployee>> {
        query_resolved(
            self.conn,
            &format!("{RESOLVED_SELECT_SQL} WHERE e.parent_id = ?1 ORDER BY e.id ASC;"),
            params![id],
        )
    }

    fn list_by_unit(
        &self,
        unit: &str,
        exclude_id: Option<EmployeeId>,
    ) -> HierarchyRepoResult<Vec<Employee>> {
        query_employees(
            self.conn,
            &format!(
                "{EMPLOYEE_SELECT_SQL}
                 WHERE unit = ?1
                   AND (?2 IS NULL OR id <> ?2)
                 ORDER BY name ASC, id ASC;"
            ),
            params![unit, exclude_id],
        )
    }

    fn snapshot(&self) -> HierarchyRepoResult<Vec<Employee>> {
        query_employees(
            self.conn,
            &format!("{EMPLOYEE_SELECT_SQL} ORDER BY id ASC;"),
            params![],
        )
    }
}

fn run_seat_change_step(
    tx: &Transaction<'_>,
    step: SeatChangeStep,
    change: &mut SeatChange,
) -> HierarchyRepoResult<()> {
    match step {
        SeatChangeStep::DemoteOutgoing => {
            tx.execute(
                "UPDATE employees
                 SET is_official = 0,
                     level = NULL,
                     parent_id = NULL,
                     updated_at = (strftime('%s', 'now') * 1000)
                 WHERE id = ?1;",
                [change.outgoing.id],
            )?;
        }
        SeatChangeStep::DetachSubordinates => {
            change.outcome.detached = detach_subordinates(tx, change.outgoing.id)?;
        }
        SeatChangeStep::PromoteIncoming => {
            let incoming = load_employee(tx, change.incoming_id)?
                .ok_or(HierarchyRepoError::IncomingNotFound(change.incoming_id))?;
            if let Some(parent_id) = change.parent_id {
                ensure_no_cycle(tx, incoming.id, parent_id)?;
            }
            claim_seat(tx, incoming.id, change.level, change.parent_id)?;
            change.incoming = Some(incoming);
        }
        SeatChangeStep::RelinkUnassigned => {
            let incoming = change
                .incoming
                .as_ref()
                .ok_or(HierarchyRepoError::IncomingNotFound(change.incoming_id))?;
            change.outcome.relinked = relink_unassigned(tx, &incoming.unit, incoming.id)?;
        }
        SeatChangeStep::AttachOutgoing => {
            let incoming = change
                .incoming
                .as_ref()
                .ok_or(HierarchyRepoError::IncomingNotFound(change.incoming_id))?;
            if change.outgoing.unit == incoming.unit {
                ensure_no_cycle(tx, change.outgoing.id, incoming.id)?;
                tx.execute(
                    "UPDATE employees
                     SET parent_id = ?2,
                         updated_at = (strftime('%s', 'now') * 1000)
                     WHERE id = ?1;",
                    params![change.outgoing.id, incoming.id],
                )?;
                change.outcome.outgoing_attached = true;
            }
        }
    }
    Ok(())
}

fn load_employee(conn: &Connection, id: EmployeeId) -> HierarchyRepoResult<Option<Employee>> {
    let mut found = query_employees(
        conn,
        &format!("{EMPLOYEE_SELECT_SQL} WHERE id = ?1;"),
        params![id],
    )?;
    Ok(found.pop())
}

fn load_official(conn: &Connection, id: EmployeeId) -> HierarchyRepoResult<Employee> {
    let employee = load_employee(conn, id)?.ok_or(HierarchyRepoError::EmployeeNotFound(id))?;
    if !employee.is_official {
        return Err(HierarchyRepoError::NotAnOfficial(id));
    }
    Ok(employee)
}

fn employee_exists(conn: &Connection, id: EmployeeId) -> HierarchyRepoResult<bool> {
    let exists: i64 = conn.query_row(
        "SELECT EXISTS(SELECT 1 FROM employees WHERE id = ?1);",
        [id],
        |row| row.get(0),
    )?;
    Ok(exists == 1)
}

fn ensure_parent_assignable(
    conn: &Connection,
    employee_id: EmployeeId,
    parent_id: EmployeeId,
) -> HierarchyRepoResult<()> {
    if !employee_exists(conn, parent_id)? {
        return Err(HierarchyRepoError::ParentNotFound(parent_id));
    }
    ensure_no_cycle(conn, employee_id, parent_id)
}

/// Fails when `employee_id` is on the supervisor chain starting at `parent_id`.
fn ensure_no_cycle(
    conn: &Connection,
    employee_id: EmployeeId,
    parent_id: EmployeeId,
) -> HierarchyRepoResult<()> {
    // UNION (not UNION ALL) keeps the walk finite on pre-existing loops.
    let reached: i64 = conn.query_row(
        "WITH RECURSIVE chain(id) AS (
            SELECT ?1
            UNION
            SELECT e.parent_id
            FROM employees e
            INNER JOIN chain c ON e.id = c.id
            WHERE e.parent_id IS NOT NULL
        )
        SELECT EXISTS(SELECT 1 FROM chain WHERE id = ?2);",
        params![parent_id, employee_id],
        |row| row.get(0),
    )?;
    if reached == 1 {
        return Err(HierarchyRepoError::CycleDetected {
            employee_id,
            parent_id,
        });
    }
    Ok(())
}

fn claim_seat(
    conn: &Connection,
    employee_id: EmployeeId,
    level: u32,
    parent_id: Option<EmployeeId>,
) -> HierarchyRepoResult<()> {
    let changed = conn.execute(
        "UPDATE employees
         SET is_official = 1,
             level = ?2,
             parent_id = ?3,
             updated_at = (strftime('%s', 'now') * 1000)
         WHERE id = ?1;",
        params![employee_id, level, parent_id],
    )?;
    if changed == 0 {
        return Err(HierarchyRepoError::EmployeeNotFound(employee_id));
    }
    Ok(())
}

fn detach_subordinates(conn: &Connection, supervisor_id: EmployeeId) -> HierarchyRepoResult<usize> {
    let detached = conn.execute(
        "UPDATE employees
         SET parent_id = NULL,
             updated_at = (strftime('%s', 'now') * 1000)
         WHERE parent_id = ?1;",
        [supervisor_id],
    )?;
    Ok(detached)
}

/// Points every unassigned plain employee of `unit` at `official_id`.
///
/// Rows on the official's own supervisor chain are skipped.
fn relink_unassigned(
    conn: &Connection,
    unit: &str,
    official_id: EmployeeId,
) -> HierarchyRepoResult<usize> {
    let relinked = conn.execute(
        "WITH RECURSIVE chain(id) AS (
            SELECT ?2
            UNION
            SELECT e.parent_id
            FROM employees e
            INNER JOIN chain c ON e.id = c.id
            WHERE e.parent_id IS NOT NULL
        )
        UPDATE employees
        SET parent_id = ?2,
            updated_at = (strftime('%s', 'now') * 1000)
        WHERE unit = ?1
          AND is_official = 0
          AND parent_id IS NULL
          AND id NOT IN (SELECT id FROM chain);",
        params![unit, official_id],
    )?;
    Ok(relinked)
}

fn query_employees(
    conn: &Connection,
    sql: &str,
    params: &[&dyn rusqlite::ToSql],
) -> HierarchyRepoResult<Vec<Employee>> {
    let mut stmt = conn.prepare(sql)?;
    let mut rows = stmt.query(params)?;
    let mut employees = Vec::new();
    while let Some(row) = rows.next()? {
        employees.push(parse_employee_row::<HierarchyRepoError>(row)?);
    }
    Ok(employees)
}

fn query_resolved(
    conn: &Connection,
    sql: &str,
    params: &[&dyn rusqlite::ToSql],
) -> HierarchyRepoResult<Vec<ResolvedEmployee>> {
    let mut stmt = conn.prepare(sql)?;
    let mut rows = stmt.query(params)?;
    let mut employees = Vec::new();
    while let Some(row) = rows.next()? {
        employees.push(parse_resolved_row::<HierarchyRepoError>(row)?);
    }
    Ok(employees)
}
