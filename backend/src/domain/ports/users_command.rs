//! Driving port for user write use-cases.

use async_trait::async_trait;

use crate::domain::{Error, NewUser, User, UserChanges, UserId};

/// Domain use-case port for creating, changing, and removing users.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait UsersCommand: Send + Sync {
    /// Register a new user. Fails with `conflict` when the email is taken.
    async fn create_user(&self, user: NewUser) -> Result<User, Error>;

    /// Apply `changes` to an existing user.
    async fn update_user(&self, id: UserId, changes: UserChanges) -> Result<User, Error>;

    /// Remove a user, returning the removed record.
    async fn delete_user(&self, id: UserId) -> Result<User, Error>;

    /// Remove every listed user that exists, returning the removed ids in
    /// ascending order.
    async fn bulk_delete_users(&self, ids: Vec<UserId>) -> Result<Vec<UserId>, Error>;
}
