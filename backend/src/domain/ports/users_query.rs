//! Driving port for user read use-cases.
//!
//! Inbound adapters (HTTP handlers, the Lambda bridge) call this port to read
//! users without importing persistence concerns.

use async_trait::async_trait;
use pagination::Paginated;

use crate::domain::{Error, ListUsersRequest, User, UserId};

/// Domain use-case port for reading users.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait UsersQuery: Send + Sync {
    /// Return one filtered, sorted page of users.
    async fn list_users(&self, request: ListUsersRequest) -> Result<Paginated<User>, Error>;

    /// Return the user with `id`, or a `not_found` error.
    async fn find_user(&self, id: UserId) -> Result<User, Error>;
}
