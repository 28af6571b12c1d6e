//! User domain service.
//!
//! Implements the [`UsersQuery`] and [`UsersCommand`] driving ports on top of
//! any [`UserRepository`]. Pagination arithmetic, duplicate-email checks, and
//! password digesting live here; adapters only move rows.

use std::sync::Arc;

use async_trait::async_trait;
use mockable::Clock;
use pagination::Paginated;
use tracing::{debug, error, info, warn};

use crate::domain::ports::{
    UserPageQuery, UserPersistenceError, UserRepository, UsersCommand, UsersQuery,
};
use crate::domain::{
    EmailAddress, Error, ListUsersRequest, NewUser, PasswordDigest, User, UserChanges, UserDraft,
    UserId, UserPatch,
};

const DUPLICATE_EMAIL_MESSAGE: &str = "User with this email already exists";
const NO_USERS_MATCHED_MESSAGE: &str = "No users found for the given IDs";

/// User service implementing the read and write driving ports.
///
/// # Examples
/// ```
/// use std::sync::Arc;
///
/// use mockable::DefaultClock;
/// use user_service::domain::UserService;
/// use user_service::outbound::memory::InMemoryUserRepository;
///
/// let service = UserService::new(
///     Arc::new(InMemoryUserRepository::default()),
///     Arc::new(DefaultClock),
/// );
/// let _clone = service.clone();
/// ```
pub struct UserService<R> {
    repository: Arc<R>,
    clock: Arc<dyn Clock>,
}

impl<R> Clone for UserService<R> {
    fn clone(&self) -> Self {
        Self {
            repository: Arc::clone(&self.repository),
            clock: Arc::clone(&self.clock),
        }
    }
}

impl<R> UserService<R> {
    /// Create a service over `repository`, stamping records with `clock`.
    pub fn new(repository: Arc<R>, clock: Arc<dyn Clock>) -> Self {
        Self { repository, clock }
    }
}

fn user_not_found(id: UserId) -> Error {
    Error::not_found(format!("User with ID {id} not found"))
}

fn duplicate_email() -> Error {
    Error::conflict(DUPLICATE_EMAIL_MESSAGE)
}

fn map_persistence_error(operation: &'static str, err: UserPersistenceError) -> Error {
    error!(operation, error = %err, "user repository call failed");
    match err {
        UserPersistenceError::Connection { .. } => {
            Error::service_unavailable("user repository unavailable")
        }
        UserPersistenceError::Query { message } => {
            Error::internal(format!("user repository error: {message}"))
        }
        UserPersistenceError::DuplicateEmail { .. } => duplicate_email(),
    }
}

impl<R> UserService<R>
where
    R: UserRepository,
{
    async fn existing_user(&self, id: UserId) -> Result<User, Error> {
        self.repository
            .find_by_id(id)
            .await
            .map_err(|err| map_persistence_error("find user", err))?
            .ok_or_else(|| user_not_found(id))
    }

    /// Fail when `email` belongs to a user other than `owner`.
    async fn ensure_email_available(
        &self,
        email: &EmailAddress,
        owner: Option<UserId>,
    ) -> Result<(), Error> {
        let holder = self
            .repository
            .find_by_email(email)
            .await
            .map_err(|err| map_persistence_error("find user by email", err))?;
        match holder {
            Some(user) if Some(user.id()) != owner => {
                warn!(user_id = %user.id(), "email already registered");
                Err(duplicate_email())
            }
            _ => Ok(()),
        }
    }
}

#[async_trait]
impl<R> UsersQuery for UserService<R>
where
    R: UserRepository,
{
    async fn list_users(&self, request: ListUsersRequest) -> Result<Paginated<User>, Error> {
        let ListUsersRequest {
            page,
            sort_by,
            sort_type,
            filter,
        } = request;

        let total = self
            .repository
            .count(&filter)
            .await
            .map_err(|err| map_persistence_error("count users", err))?;
        if page.offset() >= total {
            return Ok(Paginated::new(Vec::new(), page, total));
        }

        let query = UserPageQuery {
            filter,
            sort_by,
            direction: sort_type,
            offset: page.offset(),
            limit: page.limit(),
        };
        let users = self
            .repository
            .list(&query)
            .await
            .map_err(|err| map_persistence_error("list users", err))?;
        Ok(Paginated::new(users, page, total))
    }

    async fn find_user(&self, id: UserId) -> Result<User, Error> {
        self.existing_user(id).await
    }
}

#[async_trait]
impl<R> UsersCommand for UserService<R>
where
    R: UserRepository,
{
    async fn create_user(&self, user: NewUser) -> Result<User, Error> {
        let NewUser {
            username,
            email,
            password,
        } = user;
        self.ensure_email_available(&email, None).await?;

        let draft = UserDraft {
            username,
            email,
            password_digest: PasswordDigest::digest(&password),
            created_at: self.clock.utc(),
        };
        let created = self
            .repository
            .insert(&draft)
            .await
            .map_err(|err| map_persistence_error("insert user", err))?;
        info!(user_id = %created.id(), "user created");
        Ok(created)
    }

    async fn update_user(&self, id: UserId, changes: UserChanges) -> Result<User, Error> {
        let existing = self.existing_user(id).await?;
        if changes.is_empty() {
            debug!(user_id = %id, "empty change set; refreshing updated_at only");
        }
        if let Some(email) = changes.email.as_ref() {
            if email != existing.email() {
                self.ensure_email_available(email, Some(id)).await?;
            }
        }

        let UserChanges {
            username,
            email,
            password,
        } = changes;
        let patch = UserPatch {
            username,
            email,
            password_digest: password.as_ref().map(PasswordDigest::digest),
            updated_at: self.clock.utc().max(existing.created_at()),
        };
        let updated = self
            .repository
            .update(id, &patch)
            .await
            .map_err(|err| map_persistence_error("update user", err))?
            .ok_or_else(|| user_not_found(id))?;
        info!(user_id = %id, "user updated");
        Ok(updated)
    }

    async fn delete_user(&self, id: UserId) -> Result<User, Error> {
        let deleted = self
            .repository
            .delete(id)
            .await
            .map_err(|err| map_persistence_error("delete user", err))?
            .ok_or_else(|| user_not_found(id))?;
        info!(user_id = %id, "user deleted");
        Ok(deleted)
    }

    async fn bulk_delete_users(&self, mut ids: Vec<UserId>) -> Result<Vec<UserId>, Error> {
        if ids.is_empty() {
            return Err(Error::invalid_request("No user IDs provided"));
        }
        ids.sort_unstable();
        ids.dedup();

        let mut deleted = self
            .repository
            .delete_many(&ids)
            .await
            .map_err(|err| map_persistence_error("delete users", err))?;
        if deleted.is_empty() {
            return Err(Error::not_found(NO_USERS_MATCHED_MESSAGE));
        }
        deleted.sort_unstable();
        info!(requested = ids.len(), deleted = deleted.len(), "users deleted");
        Ok(deleted)
    }
}

#[cfg(test)]
#[path = "user_service_tests.rs"]
mod tests;
