use orgtree_core::db::open_db_in_memory;
use orgtree_core::{
    Employee, EmployeeDirectory, EmployeeId, ErrorKind, HierarchyError, HierarchyMutator,
    HierarchyReader, NewEmployee, PromoteRequest, SqliteEmployeeRepository,
    SqliteHierarchyRepository,
};
use rusqlite::Connection;

fn register(conn: &Connection, name: &str, unit: &str) -> EmployeeId {
    let directory = EmployeeDirectory::new(SqliteEmployeeRepository::try_new(conn).unwrap());
    let seq = directory.list().unwrap().len() + 1;
    directory
        .register(&NewEmployee::new(format!("{seq:018}"), name, "", unit))
        .unwrap()
        .id
}

fn load(conn: &Connection, id: EmployeeId) -> Employee {
    EmployeeDirectory::new(SqliteEmployeeRepository::try_new(conn).unwrap())
        .get(id)
        .unwrap()
}

fn mutator(conn: &Connection) -> HierarchyMutator<SqliteHierarchyRepository<'_>> {
    HierarchyMutator::new(SqliteHierarchyRepository::try_new(conn).unwrap())
}

fn promote(
    conn: &Connection,
    employee_id: EmployeeId,
    level: i64,
    parent_id: Option<EmployeeId>,
) -> Result<Employee, HierarchyError> {
    mutator(conn).promote(&PromoteRequest {
        employee_id,
        level,
        parent_id,
    })
}

fn all_rows(conn: &Connection) -> Vec<Employee> {
    EmployeeDirectory::new(SqliteEmployeeRepository::try_new(conn).unwrap())
        .list()
        .unwrap()
}

#[test]
fn promote_below_top_adopts_unassigned_employees_of_the_unit() {
    let conn = open_db_in_memory().unwrap();
    let a = register(&conn, "A", "Finance");
    let b = register(&conn, "B", "Finance");
    let c = register(&conn, "C", "Finance");
    let d = register(&conn, "D", "Finance");
    let outsider = register(&conn, "X", "Ops");
    promote(&conn, a, 1, None).unwrap();

    let promoted = promote(&conn, d, 2, Some(a)).unwrap();

    assert!(promoted.is_official);
    assert_eq!(promoted.level, Some(2));
    assert_eq!(promoted.parent_id, Some(a));
    assert_eq!(load(&conn, b).parent_id, Some(d));
    assert_eq!(load(&conn, c).parent_id, Some(d));
    assert_eq!(load(&conn, outsider).parent_id, None);
    assert_eq!(load(&conn, a).parent_id, None);
}

#[test]
fn top_level_promotion_adopts_nobody() {
    let conn = open_db_in_memory().unwrap();
    let head = register(&conn, "Head", "Finance");
    let staff = register(&conn, "Staff", "Finance");

    let promoted = promote(&conn, head, 1, None).unwrap();

    assert_eq!(promoted.level, Some(1));
    assert_eq!(load(&conn, staff).parent_id, None);
}

#[test]
fn promote_skips_already_assigned_employees() {
    let conn = open_db_in_memory().unwrap();
    let first = register(&conn, "First", "Ops");
    let second = register(&conn, "Second", "Ops");
    let staff = register(&conn, "Staff", "Ops");
    promote(&conn, first, 2, None).unwrap();
    assert_eq!(load(&conn, staff).parent_id, Some(first));

    promote(&conn, second, 2, None).unwrap();

    assert_eq!(load(&conn, staff).parent_id, Some(first));
}

#[test]
fn missing_employee_is_not_found_and_changes_nothing() {
    let conn = open_db_in_memory().unwrap();
    register(&conn, "B", "Finance");
    register(&conn, "C", "Finance");
    let before = all_rows(&conn);

    let err = promote(&conn, 999, 1, None).unwrap_err();

    assert!(matches!(err, HierarchyError::EmployeeNotFound(999)));
    assert_eq!(err.kind(), ErrorKind::NotFound);
    assert_eq!(all_rows(&conn), before);
}

#[test]
fn missing_parent_is_not_found_and_changes_nothing() {
    let conn = open_db_in_memory().unwrap();
    let d = register(&conn, "D", "Finance");
    register(&conn, "B", "Finance");
    let before = all_rows(&conn);

    let err = promote(&conn, d, 2, Some(404)).unwrap_err();

    assert!(matches!(err, HierarchyError::ParentNotFound(404)));
    assert_eq!(err.kind(), ErrorKind::NotFound);
    assert_eq!(all_rows(&conn), before);
}

#[test]
fn malformed_input_is_rejected_as_validation() {
    let conn = open_db_in_memory().unwrap();
    let d = register(&conn, "D", "Finance");

    let zero = promote(&conn, d, 0, None).unwrap_err();
    assert!(matches!(zero, HierarchyError::InvalidLevel(0)));
    assert_eq!(zero.kind(), ErrorKind::Validation);

    let own_parent = promote(&conn, d, 2, Some(d)).unwrap_err();
    assert!(matches!(own_parent, HierarchyError::SelfSupervision(id) if id == d));

    assert!(!load(&conn, d).is_official);
}

#[test]
fn parent_that_reports_to_employee_is_a_cycle() {
    let conn = open_db_in_memory().unwrap();
    let boss = register(&conn, "Boss", "Ops");
    let deputy = register(&conn, "Deputy", "Ops");
    promote(&conn, boss, 1, None).unwrap();
    promote(&conn, deputy, 2, Some(boss)).unwrap();

    let err = promote(&conn, boss, 1, Some(deputy)).unwrap_err();

    assert!(matches!(
        err,
        HierarchyError::CycleDetected { employee_id, parent_id }
            if employee_id == boss && parent_id == deputy
    ));
    assert_eq!(err.kind(), ErrorKind::Validation);
    assert_eq!(load(&conn, boss).parent_id, None);
}

#[test]
fn rank_inversion_is_accepted_and_audited_as_soft() {
    let conn = open_db_in_memory().unwrap();
    let senior = register(&conn, "Senior", "Ops");
    let junior = register(&conn, "Junior", "Ops");
    promote(&conn, junior, 5, None).unwrap();

    promote(&conn, senior, 3, Some(junior)).unwrap();

    let reader = HierarchyReader::new(SqliteHierarchyRepository::try_new(&conn).unwrap());
    let violations = reader.audit().unwrap();
    assert_eq!(violations.len(), 1);
    assert!(violations[0].is_soft());
}

#[test]
fn re_promoting_an_official_updates_the_seat() {
    let conn = open_db_in_memory().unwrap();
    let official = register(&conn, "Official", "Ops");
    promote(&conn, official, 3, None).unwrap();

    let updated = promote(&conn, official, 2, None).unwrap();

    assert_eq!(updated.level, Some(2));
}
