//! Row types for the `users` table.
//!
//! Rows stay internal to the adapter; [`UserRow::into_domain`] re-validates
//! stored values so corrupt rows surface as query errors instead of
//! malformed domain users.

use chrono::{DateTime, Utc};
use diesel::prelude::*;

use crate::domain::ports::UserPersistenceError;
use crate::domain::{EmailAddress, User, UserDraft, UserId, UserPatch, Username};

use super::schema::users;

/// Row struct for reading from the users table.
#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = users)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub(crate) struct UserRow {
    pub id: i64,
    pub username: String,
    pub email: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl UserRow {
    /// Convert the row into a domain user.
    pub(crate) fn into_domain(self) -> Result<User, UserPersistenceError> {
        let corrupt = |err: crate::domain::UserValidationError| {
            UserPersistenceError::query(format!("stored user {} is invalid: {err}", self.id))
        };
        let id = UserId::new(self.id).map_err(corrupt)?;
        let username = Username::from_stored(self.username.as_str()).map_err(corrupt)?;
        let email = EmailAddress::new(self.email.as_str()).map_err(corrupt)?;
        Ok(User::new(
            id,
            username,
            email,
            self.created_at,
            self.updated_at,
        ))
    }
}

/// Insertable struct for creating new user records.
#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = users)]
pub(crate) struct NewUserRow<'a> {
    pub username: &'a str,
    pub email: &'a str,
    pub password_digest: &'a str,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl<'a> From<&'a UserDraft> for NewUserRow<'a> {
    fn from(draft: &'a UserDraft) -> Self {
        Self {
            username: draft.username.as_str(),
            email: draft.email.as_str(),
            password_digest: draft.password_digest.as_str(),
            created_at: draft.created_at,
            updated_at: draft.created_at,
        }
    }
}

/// Changeset struct for updating existing user records.
///
/// `None` fields are left untouched.
#[derive(Debug, Clone, AsChangeset)]
#[diesel(table_name = users)]
pub(crate) struct UserChangeset<'a> {
    pub username: Option<&'a str>,
    pub email: Option<&'a str>,
    pub password_digest: Option<&'a str>,
    pub updated_at: DateTime<Utc>,
}

impl<'a> From<&'a UserPatch> for UserChangeset<'a> {
    fn from(patch: &'a UserPatch) -> Self {
        Self {
            username: patch.username.as_ref().map(Username::as_str),
            email: patch.email.as_ref().map(EmailAddress::as_str),
            password_digest: patch.password_digest.as_ref().map(|d| d.as_str()),
            updated_at: patch.updated_at,
        }
    }
}
