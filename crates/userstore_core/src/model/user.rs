//! User domain record.
//!
//! # Responsibility
//! - Define the single entity managed by this system.
//! - Provide the canonical text form rendered by the console.
//!
//! # Invariants
//! - `id` is `None` until the store assigns a key on first persistence.
//! - Once assigned, `id` is never regenerated; updates carry it unchanged.

use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};

/// Store-assigned surrogate key.
///
/// Kept as a type alias to make semantic intent explicit in signatures.
pub type UserId = i64;

/// Canonical user record.
///
/// Field constraints (enforced by the service layer before persistence):
/// `name` non-blank and all-alphabetic, `email` non-blank and containing
/// `@`, `age` in the inclusive range [18, 99].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    /// Surrogate key, absent before first persistence.
    pub id: Option<UserId>,
    pub name: String,
    pub email: String,
    pub age: i64,
}

impl User {
    /// Creates a transient user with no store identity yet.
    pub fn new(name: impl Into<String>, email: impl Into<String>, age: i64) -> Self {
        Self {
            id: None,
            name: name.into(),
            email: email.into(),
            age,
        }
    }

    /// Creates a user carrying an existing store identity.
    ///
    /// Used by update paths where the key was assigned earlier.
    pub fn with_id(
        id: UserId,
        name: impl Into<String>,
        email: impl Into<String>,
        age: i64,
    ) -> Self {
        Self {
            id: Some(id),
            name: name.into(),
            email: email.into(),
            age,
        }
    }
}

impl Display for User {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self.id {
            Some(id) => write!(
                f,
                "User[id={id}, name={}, email={}, age={}]",
                self.name, self.email, self.age
            ),
            None => write!(
                f,
                "User[id=-, name={}, email={}, age={}]",
                self.name, self.email, self.age
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::User;

    #[test]
    fn new_user_has_no_id() {
        let user = User::new("Alice", "a@b.com", 30);
        assert_eq!(user.id, None);
        assert_eq!(user.name, "Alice");
    }

    #[test]
    fn display_includes_all_fields() {
        let user = User::with_id(7, "Alice", "a@b.com", 30);
        assert_eq!(
            user.to_string(),
            "User[id=7, name=Alice, email=a@b.com, age=30]"
        );
    }

    #[test]
    fn display_marks_unassigned_id() {
        let user = User::new("Bob", "b@c.org", 45);
        assert_eq!(
            user.to_string(),
            "User[id=-, name=Bob, email=b@c.org, age=45]"
        );
    }

    #[test]
    fn serde_roundtrip_preserves_fields() {
        let user = User::with_id(3, "Carol", "c@d.net", 62);
        let json = serde_json::to_string(&user).unwrap();
        let back: User = serde_json::from_str(&json).unwrap();
        assert_eq!(back, user);
    }
}
