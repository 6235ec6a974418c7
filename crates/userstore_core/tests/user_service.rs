use std::cell::RefCell;
use std::error::Error;
use userstore_core::db::{open_db_in_memory, DbError};
use userstore_core::{
    RepoError, RepoResult, ServiceError, SqliteUserRepository, User, UserRepository, UserService,
    ValidationError,
};

fn sqlite_service(conn: &rusqlite::Connection) -> UserService<SqliteUserRepository<'_>> {
    UserService::new(SqliteUserRepository::new(conn))
}

#[test]
fn create_user_returns_entity_with_matching_fields_and_id() {
    let conn = open_db_in_memory().unwrap();
    let service = sqlite_service(&conn);

    let created = service.create_user("Alice", "a@b.com", 30).unwrap();

    assert!(created.id.is_some());
    assert_eq!(created.name, "Alice");
    assert_eq!(created.email, "a@b.com");
    assert_eq!(created.age, 30);
}

#[test]
fn create_then_find_by_id_roundtrip() {
    let conn = open_db_in_memory().unwrap();
    let service = sqlite_service(&conn);

    let created = service.create_user("Alice", "a@b.com", 30).unwrap();
    let found = service.find_by_id(created.id.unwrap()).unwrap();

    assert_eq!(found, created);
}

#[test]
fn validation_failures_name_the_violated_field_and_write_nothing() {
    let conn = open_db_in_memory().unwrap();
    let service = sqlite_service(&conn);

    let cases: &[(&str, &str, i64, &str)] = &[
        ("Al1ce", "a@b.com", 30, "The user's name is invalid"),
        ("", "a@b.com", 30, "The user's name is invalid"),
        ("Bob", "notanemail", 30, "The user's email is invalid"),
        ("Bob", "", 30, "The user's email is invalid"),
        ("Bob", "b@c.org", 17, "The user's age is out of range"),
        ("Bob", "b@c.org", 100, "The user's age is out of range"),
    ];

    for (name, email, age, expected) in cases {
        let err = service.create_user(name, email, *age).unwrap_err();
        assert!(
            matches!(err, ServiceError::Validation(_)),
            "expected validation error for ({name}, {email}, {age})"
        );
        assert_eq!(&err.to_string(), expected);
    }

    assert!(service.find_all().unwrap().is_empty());
}

#[test]
fn update_user_applies_the_same_field_rules() {
    let conn = open_db_in_memory().unwrap();
    let service = sqlite_service(&conn);

    let created = service.create_user("Alice", "a@b.com", 30).unwrap();
    let id = created.id.unwrap();

    let err = service.update_user(id, "Alice", "nomail", 30).unwrap_err();
    assert_eq!(err.to_string(), "The user's email is invalid");

    // The stored row is untouched after the rejected update.
    assert_eq!(service.find_by_id(id).unwrap().email, "a@b.com");
}

#[test]
fn update_of_missing_id_is_an_explicit_not_found_error() {
    let conn = open_db_in_memory().unwrap();
    let service = sqlite_service(&conn);

    let err = service.update_user(9, "Alice", "a@b.com", 30).unwrap_err();
    assert!(matches!(err, ServiceError::NotFound(9)));
    assert_eq!(err.to_string(), "The user could not be found");
    assert!(service.find_all().unwrap().is_empty());
}

#[test]
fn negative_id_is_rejected_before_touching_storage() {
    let conn = open_db_in_memory().unwrap();
    let service = sqlite_service(&conn);

    for err in [
        service.find_by_id(-1).unwrap_err(),
        service.update_user(-1, "Alice", "a@b.com", 30).unwrap_err(),
        service.delete_by_id(-1).unwrap_err(),
    ] {
        assert!(matches!(
            err,
            ServiceError::Validation(ValidationError::NegativeId(-1))
        ));
        assert_eq!(err.to_string(), "The user's ID must not be negative");
    }
}

#[test]
fn find_by_missing_id_fails_instead_of_returning_absent() {
    let conn = open_db_in_memory().unwrap();
    let service = sqlite_service(&conn);

    let err = service.find_by_id(42).unwrap_err();
    assert!(matches!(err, ServiceError::NotFound(42)));
}

#[test]
fn delete_by_id_reports_true_exactly_once() {
    let conn = open_db_in_memory().unwrap();
    let service = sqlite_service(&conn);

    let id = service.create_user("Alice", "a@b.com", 30).unwrap().id.unwrap();

    assert!(service.delete_by_id(id).unwrap());
    assert!(!service.delete_by_id(id).unwrap());
}

/// In-memory gateway fake proving the service is storage-agnostic.
struct InMemoryRepository {
    rows: RefCell<Vec<User>>,
    next_id: RefCell<i64>,
}

impl InMemoryRepository {
    fn new() -> Self {
        Self {
            rows: RefCell::new(Vec::new()),
            next_id: RefCell::new(1),
        }
    }
}

impl UserRepository for InMemoryRepository {
    fn create(&self, user: &User) -> RepoResult<User> {
        let mut next_id = self.next_id.borrow_mut();
        let created = User::with_id(*next_id, user.name.clone(), user.email.clone(), user.age);
        *next_id += 1;
        self.rows.borrow_mut().push(created.clone());
        Ok(created)
    }

    fn read_all(&self) -> RepoResult<Vec<User>> {
        Ok(self.rows.borrow().clone())
    }

    fn read_by_id(&self, id: i64) -> RepoResult<Option<User>> {
        Ok(self
            .rows
            .borrow()
            .iter()
            .find(|user| user.id == Some(id))
            .cloned())
    }

    fn update(&self, user: &User) -> RepoResult<u64> {
        let mut rows = self.rows.borrow_mut();
        match rows.iter_mut().find(|row| row.id == user.id) {
            Some(row) => {
                *row = user.clone();
                Ok(1)
            }
            None => Ok(0),
        }
    }

    fn delete(&self, id: i64) -> RepoResult<bool> {
        let mut rows = self.rows.borrow_mut();
        let before = rows.len();
        rows.retain(|row| row.id != Some(id));
        Ok(rows.len() < before)
    }
}

#[test]
fn service_behaves_identically_over_an_in_memory_fake() {
    let service = UserService::new(InMemoryRepository::new());

    let created = service.create_user("Alice", "a@b.com", 30).unwrap();
    let id = created.id.unwrap();

    assert_eq!(service.find_by_id(id).unwrap(), created);
    service.update_user(id, "Alicia", "alicia@b.com", 31).unwrap();
    assert_eq!(service.find_by_id(id).unwrap().name, "Alicia");
    assert!(service.delete_by_id(id).unwrap());
    assert!(!service.delete_by_id(id).unwrap());
}

/// Gateway stub failing every operation, for wrap-and-propagate checks.
struct FailingRepository;

impl FailingRepository {
    fn storage_error() -> RepoError {
        RepoError::Storage {
            detail: "could not reach the database",
            source: DbError::UnsupportedSchemaVersion {
                db_version: 2,
                latest_supported: 1,
            },
        }
    }
}

impl UserRepository for FailingRepository {
    fn create(&self, _user: &User) -> RepoResult<User> {
        Err(Self::storage_error())
    }

    fn read_all(&self) -> RepoResult<Vec<User>> {
        Err(Self::storage_error())
    }

    fn read_by_id(&self, _id: i64) -> RepoResult<Option<User>> {
        Err(Self::storage_error())
    }

    fn update(&self, _user: &User) -> RepoResult<u64> {
        Err(Self::storage_error())
    }

    fn delete(&self, _id: i64) -> RepoResult<bool> {
        Err(Self::storage_error())
    }
}

#[test]
fn storage_failures_are_wrapped_with_the_cause_retained() {
    let service = UserService::new(FailingRepository);

    let err = service.create_user("Alice", "a@b.com", 30).unwrap_err();
    assert!(matches!(err, ServiceError::Storage(_)));
    assert_eq!(err.to_string(), "could not reach the database");

    // The low-level cause stays reachable through the error chain.
    let repo_err = err.source().expect("service error should carry a cause");
    assert!(repo_err.source().is_some());

    assert!(matches!(
        service.find_all().unwrap_err(),
        ServiceError::Storage(_)
    ));
    assert!(matches!(
        service.find_by_id(1).unwrap_err(),
        ServiceError::Storage(_)
    ));
    assert!(matches!(
        service.delete_by_id(1).unwrap_err(),
        ServiceError::Storage(_)
    ));
}
