use orgtree_core::db::open_db_in_memory;
use orgtree_core::{
    DirectoryError, EmployeeDirectory, EmployeeRepository, EmployeeValidationError, ErrorKind,
    InterimAssignment, NewEmployee, SqliteEmployeeRepository,
};
use rusqlite::Connection;

fn directory(conn: &Connection) -> EmployeeDirectory<SqliteEmployeeRepository<'_>> {
    EmployeeDirectory::new(SqliteEmployeeRepository::try_new(conn).unwrap())
}

#[test]
fn register_stores_plain_unassigned_employee() {
    let conn = open_db_in_memory().unwrap();
    let directory = directory(&conn);

    let stored = directory
        .register(&NewEmployee::new(
            " 198001012005011001 ",
            "  Budi Santoso ",
            "Analyst",
            " Finance ",
        ))
        .unwrap();

    assert_eq!(stored.nip, "198001012005011001");
    assert_eq!(stored.name, "Budi Santoso");
    assert_eq!(stored.unit, "Finance");
    assert!(!stored.is_official);
    assert_eq!(stored.level, None);
    assert_eq!(stored.parent_id, None);
    assert!(stored.is_unassigned());
    assert_eq!(directory.get(stored.id).unwrap(), stored);
}

#[test]
fn register_rejects_malformed_input() {
    let conn = open_db_in_memory().unwrap();
    let directory = directory(&conn);

    let short_nip = directory
        .register(&NewEmployee::new("12345", "Name", "", "Ops"))
        .unwrap_err();
    assert!(matches!(
        short_nip,
        DirectoryError::Validation(EmployeeValidationError::InvalidNip(_))
    ));
    assert_eq!(short_nip.kind(), ErrorKind::Validation);

    let blank_unit = directory
        .register(&NewEmployee::new("198001012005011001", "Name", "", "   "))
        .unwrap_err();
    assert!(matches!(
        blank_unit,
        DirectoryError::Validation(EmployeeValidationError::BlankField("unit"))
    ));

    assert!(directory.list().unwrap().is_empty());
}

#[test]
fn duplicate_nip_is_a_validation_error() {
    let conn = open_db_in_memory().unwrap();
    let directory = directory(&conn);

    directory
        .register(&NewEmployee::new("198001012005011001", "First", "", "Ops"))
        .unwrap();
    let err = directory
        .register(&NewEmployee::new("198001012005011001", "Second", "", "Ops"))
        .unwrap_err();

    assert!(matches!(err, DirectoryError::DuplicateNip(ref nip) if nip == "198001012005011001"));
    assert_eq!(err.kind(), ErrorKind::Validation);
    assert_eq!(directory.list().unwrap().len(), 1);
}

#[test]
fn list_is_ordered_by_id() {
    let conn = open_db_in_memory().unwrap();
    let directory = directory(&conn);

    let names = ["Zed", "Ann", "Mia"];
    let ids: Vec<_> = names
        .iter()
        .enumerate()
        .map(|(index, name)| {
            directory
                .register(&NewEmployee::new(format!("{:018}", index + 1), *name, "", "Ops"))
                .unwrap()
                .id
        })
        .collect();

    let listed: Vec<_> = directory.list().unwrap().into_iter().map(|e| e.id).collect();
    assert_eq!(listed, ids);
}

#[test]
fn interim_assignment_is_set_and_cleared() {
    let conn = open_db_in_memory().unwrap();
    let directory = directory(&conn);
    let employee = directory
        .register(&NewEmployee::new("198001012005011001", "Acting", "", "Ops"))
        .unwrap();

    let acting = directory
        .assign_interim(employee.id, " Head of Ops ", "Ops")
        .unwrap();
    assert_eq!(
        acting.interim,
        Some(InterimAssignment {
            title: "Head of Ops".to_string(),
            unit: "Ops".to_string(),
        })
    );
    assert!(!acting.is_official);

    let cleared = directory.clear_interim(employee.id).unwrap();
    assert_eq!(cleared.interim, None);
}

#[test]
fn interim_requires_title_and_existing_employee() {
    let conn = open_db_in_memory().unwrap();
    let directory = directory(&conn);

    let blank = directory.assign_interim(1, " ", "Ops").unwrap_err();
    assert!(matches!(
        blank,
        DirectoryError::Validation(EmployeeValidationError::BlankField("interim title"))
    ));

    let missing = directory.assign_interim(404, "Head", "Ops").unwrap_err();
    assert!(matches!(missing, DirectoryError::NotFound(404)));
    assert_eq!(missing.kind(), ErrorKind::NotFound);

    assert!(matches!(
        directory.clear_interim(404),
        Err(DirectoryError::NotFound(404))
    ));
    assert!(matches!(directory.get(404), Err(DirectoryError::NotFound(404))));
}

#[test]
fn repository_returns_none_for_unknown_id() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteEmployeeRepository::try_new(&conn).unwrap();

    assert_eq!(repo.get_employee(7).unwrap(), None);
}
