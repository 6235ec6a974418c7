//! User validation and orchestration service.
//!
//! # Responsibility
//! - Enforce field-level invariants before delegating to the gateway.
//! - Translate gateway failures into the service vocabulary.
//!
//! # Invariants
//! - Fields are checked in order name -> email -> age; the first
//!   violation wins and names exactly one field.
//! - No user reaches the gateway without passing validation.
//! - The service is the sole caller of the persistence gateway.

use crate::model::user::{User, UserId};
use crate::repo::user_repo::{RepoError, UserRepository};
use log::{error, info, warn};
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Inclusive lower bound for a valid user age.
pub const MIN_AGE: i64 = 18;
/// Inclusive upper bound for a valid user age.
pub const MAX_AGE: i64 = 99;

pub type ServiceResult<T> = Result<T, ServiceError>;

/// A single violated field constraint.
///
/// Message texts are part of the observable contract: the console prints
/// them verbatim.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    Name,
    Email,
    AgeOutOfRange(i64),
    NegativeId(UserId),
}

impl Display for ValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Name => write!(f, "The user's name is invalid"),
            Self::Email => write!(f, "The user's email is invalid"),
            Self::AgeOutOfRange(_) => write!(f, "The user's age is out of range"),
            Self::NegativeId(_) => write!(f, "The user's ID must not be negative"),
        }
    }
}

impl Error for ValidationError {}

/// Service-layer error vocabulary.
#[derive(Debug)]
pub enum ServiceError {
    /// Input rejected before touching storage.
    Validation(ValidationError),
    /// Target row does not exist.
    NotFound(UserId),
    /// Gateway failure, cause retained for diagnostics.
    Storage(RepoError),
}

impl Display for ServiceError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Validation(err) => write!(f, "{err}"),
            Self::NotFound(_) => write!(f, "The user could not be found"),
            Self::Storage(err) => write!(f, "{err}"),
        }
    }
}

impl Error for ServiceError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Validation(err) => Some(err),
            Self::NotFound(_) => None,
            Self::Storage(err) => Some(err),
        }
    }
}

impl From<ValidationError> for ServiceError {
    fn from(value: ValidationError) -> Self {
        Self::Validation(value)
    }
}

impl From<RepoError> for ServiceError {
    fn from(value: RepoError) -> Self {
        Self::Storage(value)
    }
}

/// Validation and orchestration layer over a persistence gateway.
pub struct UserService<R: UserRepository> {
    repo: R,
}

impl<R: UserRepository> UserService<R> {
    /// Creates a service using the provided gateway implementation.
    pub fn new(repo: R) -> Self {
        Self { repo }
    }

    /// Validates the fields, persists a new user and returns it with the
    /// store-assigned id.
    pub fn create_user(
        &self,
        name: &str,
        email: &str,
        age: i64,
    ) -> ServiceResult<User> {
        info!("event=create_user module=service status=start name={name} age={age}");

        validate_fields(name, email, age).inspect_err(|err| {
            warn!("event=create_user module=service status=rejected reason={err}");
        })?;

        let created = self.repo.create(&User::new(name, email, age)).map_err(|err| {
            error!("event=create_user module=service status=error error={err}");
            ServiceError::Storage(err)
        })?;

        info!("event=create_user module=service status=ok id={:?}", created.id);
        Ok(created)
    }

    /// Returns every stored user.
    pub fn find_all(&self) -> ServiceResult<Vec<User>> {
        info!("event=find_all module=service status=start");

        let users = self.repo.read_all().map_err(|err| {
            error!("event=find_all module=service status=error error={err}");
            ServiceError::Storage(err)
        })?;

        info!("event=find_all module=service status=ok count={}", users.len());
        Ok(users)
    }

    /// Returns the user with the given id, failing when no row matches.
    pub fn find_by_id(&self, id: UserId) -> ServiceResult<User> {
        info!("event=find_by_id module=service status=start id={id}");

        validate_id(id).inspect_err(|err| {
            warn!("event=find_by_id module=service status=rejected reason={err}");
        })?;

        match self.repo.read_by_id(id)? {
            Some(user) => {
                info!("event=find_by_id module=service status=ok id={id}");
                Ok(user)
            }
            None => {
                warn!("event=find_by_id module=service status=not_found id={id}");
                Err(ServiceError::NotFound(id))
            }
        }
    }

    /// Overwrites all fields of the user with the given id.
    ///
    /// Fails with a not-found error when no row has that id; there is no
    /// upsert path.
    pub fn update_user(
        &self,
        id: UserId,
        name: &str,
        email: &str,
        age: i64,
    ) -> ServiceResult<()> {
        info!("event=update_user module=service status=start id={id}");

        validate_id(id).inspect_err(|err| {
            warn!("event=update_user module=service status=rejected reason={err}");
        })?;
        validate_fields(name, email, age).inspect_err(|err| {
            warn!("event=update_user module=service status=rejected reason={err}");
        })?;

        let changed = self
            .repo
            .update(&User::with_id(id, name, email, age))
            .map_err(|err| {
                error!("event=update_user module=service status=error error={err}");
                ServiceError::Storage(err)
            })?;

        if changed == 0 {
            warn!("event=update_user module=service status=not_found id={id}");
            return Err(ServiceError::NotFound(id));
        }

        info!("event=update_user module=service status=ok id={id}");
        Ok(())
    }

    /// Deletes the user with the given id.
    ///
    /// Returns `true` when a row was removed, `false` when no row had
    /// that id.
    pub fn delete_by_id(&self, id: UserId) -> ServiceResult<bool> {
        info!("event=delete_by_id module=service status=start id={id}");

        validate_id(id).inspect_err(|err| {
            warn!("event=delete_by_id module=service status=rejected reason={err}");
        })?;

        let deleted = self.repo.delete(id).map_err(|err| {
            error!("event=delete_by_id module=service status=error error={err}");
            ServiceError::Storage(err)
        })?;

        if deleted {
            info!("event=delete_by_id module=service status=ok id={id}");
        } else {
            warn!("event=delete_by_id module=service status=not_found id={id}");
        }

        Ok(deleted)
    }
}

fn validate_fields(name: &str, email: &str, age: i64) -> Result<(), ValidationError> {
    if name.trim().is_empty() || !name.chars().all(char::is_alphabetic) {
        return Err(ValidationError::Name);
    }

    if email.trim().is_empty() || !email.contains('@') {
        return Err(ValidationError::Email);
    }

    if !(MIN_AGE..=MAX_AGE).contains(&age) {
        return Err(ValidationError::AgeOutOfRange(age));
    }

    Ok(())
}

fn validate_id(id: UserId) -> Result<(), ValidationError> {
    if id < 0 {
        return Err(ValidationError::NegativeId(id));
    }
    Ok(())
}
