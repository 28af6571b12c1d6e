//! Port abstraction for user persistence adapters and their errors.
use async_trait::async_trait;

use crate::domain::{
    EmailAddress, SortDirection, SortField, User, UserDraft, UserFilter, UserId, UserPatch,
};

use super::define_port_error;

define_port_error! {
    /// Persistence errors raised by user repository adapters.
    pub enum UserPersistenceError {
        /// Repository connection could not be established.
        Connection { message: String } => "user repository connection failed: {message}",
        /// Query or mutation failed during execution.
        Query { message: String } => "user repository query failed: {message}",
        /// A unique email constraint rejected the write.
        DuplicateEmail { email: String } => "user with email {email} already exists",
    }
}

/// Window and ordering for one page of users.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserPageQuery {
    /// Row filters.
    pub filter: UserFilter,
    /// Primary sort column.
    pub sort_by: SortField,
    /// Direction for `sort_by`; the id tie-breaker follows it.
    pub direction: SortDirection,
    /// Rows to skip.
    pub offset: u64,
    /// Maximum rows to return.
    pub limit: u64,
}

/// Storage for user records.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait UserRepository: Send + Sync {
    /// Count users matching `filter`.
    async fn count(&self, filter: &UserFilter) -> Result<u64, UserPersistenceError>;

    /// Load one page of users matching the query.
    async fn list(&self, query: &UserPageQuery) -> Result<Vec<User>, UserPersistenceError>;

    /// Fetch a user by identifier.
    async fn find_by_id(&self, id: UserId) -> Result<Option<User>, UserPersistenceError>;

    /// Fetch the user registered with `email`.
    async fn find_by_email(
        &self,
        email: &EmailAddress,
    ) -> Result<Option<User>, UserPersistenceError>;

    /// Insert a user, returning the stored record.
    ///
    /// Fails with [`UserPersistenceError::DuplicateEmail`] when the email is
    /// already registered.
    async fn insert(&self, draft: &UserDraft) -> Result<User, UserPersistenceError>;

    /// Apply `patch` to the user, returning the updated record or `None`
    /// when no such user exists.
    async fn update(
        &self,
        id: UserId,
        patch: &UserPatch,
    ) -> Result<Option<User>, UserPersistenceError>;

    /// Delete a user, returning the removed record.
    async fn delete(&self, id: UserId) -> Result<Option<User>, UserPersistenceError>;

    /// Delete every listed user that exists, returning the removed ids.
    async fn delete_many(&self, ids: &[UserId]) -> Result<Vec<UserId>, UserPersistenceError>;
}
