use orgtree_core::db::open_db_in_memory;
use orgtree_core::{
    DemoteOutcome, Employee, EmployeeDirectory, EmployeeId, ErrorKind, HierarchyError,
    HierarchyMutator, NewEmployee, PromoteRequest, SqliteEmployeeRepository,
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

fn all_rows(conn: &Connection) -> Vec<Employee> {
    EmployeeDirectory::new(SqliteEmployeeRepository::try_new(conn).unwrap())
        .list()
        .unwrap()
}

fn load(conn: &Connection, id: EmployeeId) -> Employee {
    all_rows(conn)
        .into_iter()
        .find(|employee| employee.id == id)
        .unwrap()
}

fn mutator(conn: &Connection) -> HierarchyMutator<SqliteHierarchyRepository<'_>> {
    HierarchyMutator::new(SqliteHierarchyRepository::try_new(conn).unwrap())
}

fn promote(conn: &Connection, employee_id: EmployeeId, level: i64, parent_id: Option<EmployeeId>) {
    mutator(conn)
        .promote(&PromoteRequest {
            employee_id,
            level,
            parent_id,
        })
        .unwrap();
}

#[test]
fn demote_detaches_exactly_the_direct_subordinates() {
    let conn = open_db_in_memory().unwrap();
    let head = register(&conn, "Head", "Board");
    promote(&conn, head, 1, None);
    let e = register(&conn, "E", "Ops");
    let f = register(&conn, "F", "Ops");
    let g = register(&conn, "G", "Ops");
    promote(&conn, e, 2, Some(head));
    let deputy = register(&conn, "Deputy", "Finance");
    promote(&conn, deputy, 3, Some(head));
    let before = all_rows(&conn);

    let outcome = mutator(&conn).demote(e).unwrap();

    assert_eq!(outcome, DemoteOutcome { detached: 2 });
    let demoted = load(&conn, e);
    assert!(!demoted.is_official);
    assert_eq!(demoted.level, None);
    assert_eq!(demoted.parent_id, Some(head));
    assert_eq!(load(&conn, f).parent_id, None);
    assert_eq!(load(&conn, g).parent_id, None);

    let changed: Vec<EmployeeId> = before
        .iter()
        .zip(all_rows(&conn))
        .filter(|(old, new)| old.parent_id != new.parent_id)
        .map(|(old, _)| old.id)
        .collect();
    assert_eq!(changed, vec![f, g]);
    assert_eq!(load(&conn, deputy).parent_id, Some(head));
}

#[test]
fn demote_does_not_promote_a_successor() {
    let conn = open_db_in_memory().unwrap();
    let e = register(&conn, "E", "Ops");
    let f = register(&conn, "F", "Ops");
    promote(&conn, e, 2, None);

    mutator(&conn).demote(e).unwrap();

    assert!(all_rows(&conn).iter().all(|employee| !employee.is_official));
    assert!(load(&conn, f).is_unassigned());
}

#[test]
fn demoting_a_plain_employee_is_allowed() {
    let conn = open_db_in_memory().unwrap();
    let plain = register(&conn, "Plain", "Ops");

    let outcome = mutator(&conn).demote(plain).unwrap();

    assert_eq!(outcome.detached, 0);
    assert!(!load(&conn, plain).is_official);
}

#[test]
fn missing_employee_is_not_found() {
    let conn = open_db_in_memory().unwrap();
    register(&conn, "Only", "Ops");
    let before = all_rows(&conn);

    let err = mutator(&conn).demote(404).unwrap_err();

    assert!(matches!(err, HierarchyError::EmployeeNotFound(404)));
    assert_eq!(err.kind(), ErrorKind::NotFound);
    assert_eq!(all_rows(&conn), before);
}
