//! User persistence gateway and SQLite implementation.
//!
//! # Responsibility
//! - Provide single-operation CRUD transactions over the `users` table.
//! - Keep SQL details inside the persistence boundary.
//!
//! # Invariants
//! - Each operation acquires its own unit of work; no operation spans two.
//! - Read paths reject invalid persisted state instead of masking it.
//! - No retries, no partial commits.

use crate::db::DbError;
use crate::model::user::{User, UserId};
use log::{error, info};
use rusqlite::{params, Connection, OptionalExtension, Row};
use std::error::Error;
use std::fmt::{Display, Formatter};

const USER_SELECT_SQL: &str = "SELECT id, name, email, age FROM users";

pub type RepoResult<T> = Result<T, RepoError>;

/// Gateway error for user persistence operations.
///
/// `Storage` keeps a fixed operation description for the caller and the
/// low-level cause for diagnostics; the cause is never rendered to the
/// end user.
#[derive(Debug)]
pub enum RepoError {
    Storage {
        detail: &'static str,
        source: DbError,
    },
    InvalidData(String),
}

impl RepoError {
    fn storage(detail: &'static str, source: impl Into<DbError>) -> Self {
        Self::Storage {
            detail,
            source: source.into(),
        }
    }
}

impl Display for RepoError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Storage { detail, .. } => write!(f, "{detail}"),
            Self::InvalidData(message) => write!(f, "invalid persisted user data: {message}"),
        }
    }
}

impl Error for RepoError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Storage { source, .. } => Some(source),
            Self::InvalidData(_) => None,
        }
    }
}

/// Persistence gateway contract for user CRUD operations.
///
/// An interface seam so the service layer can be exercised against an
/// in-memory fake instead of SQLite.
pub trait UserRepository {
    /// Inserts the user and returns it with the store-assigned id.
    fn create(&self, user: &User) -> RepoResult<User>;
    /// Fetches every row in store-native order, fully materialized.
    fn read_all(&self) -> RepoResult<Vec<User>>;
    /// Fetches one row by primary key; an absent row is not an error.
    fn read_by_id(&self, id: UserId) -> RepoResult<Option<User>>;
    /// Overwrites all data columns of the row matching `user.id`.
    /// Returns the number of rows changed (0 when no row has that id).
    fn update(&self, user: &User) -> RepoResult<u64>;
    /// Deletes the row by id. Returns `false` without committing anything
    /// destructive when no row matches.
    fn delete(&self, id: UserId) -> RepoResult<bool>;
}

/// SQLite-backed user gateway.
///
/// Each call acquires a transaction on the shared connection via
/// `unchecked_transaction`; the guard rolls back on drop unless committed.
pub struct SqliteUserRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteUserRepository<'conn> {
    pub fn new(conn: &'conn Connection) -> Self {
        Self { conn }
    }
}

impl UserRepository for SqliteUserRepository<'_> {
    fn create(&self, user: &User) -> RepoResult<User> {
        info!("event=user_create module=repo status=start");

        let tx = self.conn.unchecked_transaction().map_err(|err| {
            error!("event=user_create module=repo status=error error_code=begin_failed error={err}");
            RepoError::storage("could not begin a unit of work to add the user", err)
        })?;

        tx.execute(
            "INSERT INTO users (name, email, age) VALUES (?1, ?2, ?3);",
            params![user.name.as_str(), user.email.as_str(), user.age],
        )
        .map_err(|err| {
            error!("event=user_create module=repo status=error error_code=insert_failed error={err}");
            RepoError::storage("could not add the user to the database", err)
        })?;

        let id = tx.last_insert_rowid();
        tx.commit().map_err(|err| {
            error!("event=user_create module=repo status=error error_code=commit_failed error={err}");
            RepoError::storage("could not add the user to the database", err)
        })?;

        info!("event=user_create module=repo status=ok id={id}");
        Ok(User::with_id(id, user.name.clone(), user.email.clone(), user.age))
    }

    fn read_all(&self) -> RepoResult<Vec<User>> {
        info!("event=user_read_all module=repo status=start");

        let result = (|| -> RepoResult<Vec<User>> {
            let mut stmt = self
                .conn
                .prepare(USER_SELECT_SQL)
                .map_err(read_all_error)?;
            let mut rows = stmt.query([]).map_err(read_all_error)?;
            let mut users = Vec::new();

            while let Some(row) = rows.next().map_err(read_all_error)? {
                users.push(parse_user_row(row)?);
            }

            Ok(users)
        })();

        match &result {
            Ok(users) => info!("event=user_read_all module=repo status=ok count={}", users.len()),
            Err(err) => error!("event=user_read_all module=repo status=error error={err}"),
        }

        result
    }

    fn read_by_id(&self, id: UserId) -> RepoResult<Option<User>> {
        info!("event=user_read_by_id module=repo status=start id={id}");

        let raw = self
            .conn
            .query_row(
                &format!("{USER_SELECT_SQL} WHERE id = ?1;"),
                params![id],
                row_to_user,
            )
            .optional()
            .map_err(|err| {
                error!("event=user_read_by_id module=repo status=error id={id} error={err}");
                RepoError::storage("could not read the user by ID from the database", err)
            })?;

        match raw {
            Some(raw) => {
                let user = check_user_row(raw)?;
                info!("event=user_read_by_id module=repo status=ok id={id} found=true");
                Ok(Some(user))
            }
            None => {
                info!("event=user_read_by_id module=repo status=ok id={id} found=false");
                Ok(None)
            }
        }
    }

    fn update(&self, user: &User) -> RepoResult<u64> {
        info!("event=user_update module=repo status=start id={:?}", user.id);

        let tx = self.conn.unchecked_transaction().map_err(|err| {
            error!("event=user_update module=repo status=error error_code=begin_failed error={err}");
            RepoError::storage("could not begin a unit of work to update the user", err)
        })?;

        let changed = tx
            .execute(
                "UPDATE users SET name = ?1, email = ?2, age = ?3 WHERE id = ?4;",
                params![user.name.as_str(), user.email.as_str(), user.age, user.id],
            )
            .map_err(|err| {
                error!("event=user_update module=repo status=error error_code=update_failed error={err}");
                RepoError::storage("could not update the user in the database", err)
            })?;

        tx.commit().map_err(|err| {
            error!("event=user_update module=repo status=error error_code=commit_failed error={err}");
            RepoError::storage("could not update the user in the database", err)
        })?;

        info!("event=user_update module=repo status=ok changed={changed}");
        Ok(changed as u64)
    }

    fn delete(&self, id: UserId) -> RepoResult<bool> {
        info!("event=user_delete module=repo status=start id={id}");

        let tx = self.conn.unchecked_transaction().map_err(|err| {
            error!("event=user_delete module=repo status=error error_code=begin_failed error={err}");
            RepoError::storage("could not begin a unit of work to delete the user", err)
        })?;

        let exists = tx
            .query_row(
                "SELECT EXISTS(SELECT 1 FROM users WHERE id = ?1);",
                params![id],
                |row| row.get::<_, i64>(0),
            )
            .map_err(|err| {
                error!("event=user_delete module=repo status=error error_code=lookup_failed error={err}");
                RepoError::storage("could not delete the user from the database", err)
            })?;

        if exists == 0 {
            info!("event=user_delete module=repo status=ok id={id} found=false");
            return Ok(false);
        }

        tx.execute("DELETE FROM users WHERE id = ?1;", params![id])
            .map_err(|err| {
                error!("event=user_delete module=repo status=error error_code=delete_failed error={err}");
                RepoError::storage("could not delete the user from the database", err)
            })?;

        tx.commit().map_err(|err| {
            error!("event=user_delete module=repo status=error error_code=commit_failed error={err}");
            RepoError::storage("could not delete the user from the database", err)
        })?;

        info!("event=user_delete module=repo status=ok id={id} found=true");
        Ok(true)
    }
}

fn read_all_error(err: rusqlite::Error) -> RepoError {
    RepoError::storage("could not read all users from the database", err)
}

// Row mapping runs in two stages: rusqlite column access inside the query
// closure, semantic checks afterwards.
fn row_to_user(row: &Row<'_>) -> rusqlite::Result<(i64, String, String, i64)> {
    Ok((
        row.get("id")?,
        row.get("name")?,
        row.get("email")?,
        row.get("age")?,
    ))
}

fn parse_user_row(row: &Row<'_>) -> RepoResult<User> {
    let raw = row_to_user(row).map_err(read_all_error)?;
    check_user_row(raw)
}

fn check_user_row((id, name, email, age): (i64, String, String, i64)) -> RepoResult<User> {
    if id < 0 {
        return Err(RepoError::InvalidData(format!(
            "negative key `{id}` in users.id"
        )));
    }
    Ok(User::with_id(id, name, email, age))
}
