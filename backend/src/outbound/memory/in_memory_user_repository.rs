//! `UserRepository` backed by a map held in process memory.
//!
//! Mirrors the PostgreSQL adapter: sequential ids starting at 1, unique
//! emails, case-insensitive substring filters, and id tie-breaking when
//! sorting. Data is lost when the process exits.

use std::cmp::Ordering;
use std::collections::BTreeMap;

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::domain::ports::{UserPageQuery, UserPersistenceError, UserRepository};
use crate::domain::{
    EmailAddress, PasswordDigest, SortDirection, SortField, User, UserDraft, UserFilter, UserId,
    UserPatch,
};

#[derive(Debug, Clone)]
struct StoredUser {
    user: User,
    #[expect(dead_code, reason = "kept for parity with the database row")]
    password_digest: PasswordDigest,
}

#[derive(Debug, Default)]
struct Store {
    users: BTreeMap<UserId, StoredUser>,
    last_id: i64,
}

impl Store {
    fn email_owner(&self, email: &EmailAddress) -> Option<UserId> {
        self.users
            .values()
            .find(|stored| stored.user.email() == email)
            .map(|stored| stored.user.id())
    }

    fn next_id(&mut self) -> Result<UserId, UserPersistenceError> {
        let next = self
            .last_id
            .checked_add(1)
            .ok_or_else(|| UserPersistenceError::query("user id sequence exhausted"))?;
        let id = UserId::new(next).map_err(|err| UserPersistenceError::query(err.to_string()))?;
        self.last_id = next;
        Ok(id)
    }

    fn matching<'a>(&'a self, filter: &'a UserFilter) -> impl Iterator<Item = &'a User> + 'a {
        self.users
            .values()
            .map(|stored| &stored.user)
            .filter(move |user| {
                filter.matches(
                    user.username().as_str(),
                    user.email().as_str(),
                    user.created_at(),
                )
            })
    }
}

fn compare(left: &User, right: &User, sort_by: SortField) -> Ordering {
    let primary = match sort_by {
        SortField::Id => Ordering::Equal,
        SortField::Username => left.username().as_str().cmp(right.username().as_str()),
        SortField::Email => left.email().as_str().cmp(right.email().as_str()),
        SortField::CreatedAt => left.created_at().cmp(&right.created_at()),
        SortField::UpdatedAt => left.updated_at().cmp(&right.updated_at()),
    };
    primary.then_with(|| left.id().cmp(&right.id()))
}

fn window(value: u64) -> usize {
    usize::try_from(value).unwrap_or(usize::MAX)
}

/// Volatile implementation of the `UserRepository` port.
///
/// # Examples
/// ```
/// use user_service::outbound::memory::InMemoryUserRepository;
///
/// let repository = InMemoryUserRepository::default();
/// # let _ = repository;
/// ```
#[derive(Debug, Default)]
pub struct InMemoryUserRepository {
    store: RwLock<Store>,
}

#[async_trait]
impl UserRepository for InMemoryUserRepository {
    async fn count(&self, filter: &UserFilter) -> Result<u64, UserPersistenceError> {
        let store = self.store.read().await;
        let total = store.matching(filter).count();
        Ok(u64::try_from(total).unwrap_or(u64::MAX))
    }

    async fn list(&self, query: &UserPageQuery) -> Result<Vec<User>, UserPersistenceError> {
        let store = self.store.read().await;
        let mut users: Vec<User> = store.matching(&query.filter).cloned().collect();
        users.sort_by(|left, right| {
            let ordering = compare(left, right, query.sort_by);
            match query.direction {
                SortDirection::Asc => ordering,
                SortDirection::Desc => ordering.reverse(),
            }
        });
        Ok(users
            .into_iter()
            .skip(window(query.offset))
            .take(window(query.limit))
            .collect())
    }

    async fn find_by_id(&self, id: UserId) -> Result<Option<User>, UserPersistenceError> {
        let store = self.store.read().await;
        Ok(store.users.get(&id).map(|stored| stored.user.clone()))
    }

    async fn find_by_email(
        &self,
        email: &EmailAddress,
    ) -> Result<Option<User>, UserPersistenceError> {
        let store = self.store.read().await;
        Ok(store
            .email_owner(email)
            .and_then(|id| store.users.get(&id))
            .map(|stored| stored.user.clone()))
    }

    async fn insert(&self, draft: &UserDraft) -> Result<User, UserPersistenceError> {
        let mut store = self.store.write().await;
        if store.email_owner(&draft.email).is_some() {
            return Err(UserPersistenceError::duplicate_email(draft.email.as_str()));
        }
        let id = store.next_id()?;
        let user = User::new(
            id,
            draft.username.clone(),
            draft.email.clone(),
            draft.created_at,
            draft.created_at,
        );
        store.users.insert(
            id,
            StoredUser {
                user: user.clone(),
                password_digest: draft.password_digest.clone(),
            },
        );
        Ok(user)
    }

    async fn update(
        &self,
        id: UserId,
        patch: &UserPatch,
    ) -> Result<Option<User>, UserPersistenceError> {
        let mut store = self.store.write().await;
        if let Some(email) = patch.email.as_ref() {
            if store.email_owner(email).is_some_and(|owner| owner != id) {
                return Err(UserPersistenceError::duplicate_email(email.as_str()));
            }
        }
        let Some(stored) = store.users.get_mut(&id) else {
            return Ok(None);
        };
        let current = &stored.user;
        stored.user = User::new(
            id,
            patch
                .username
                .clone()
                .unwrap_or_else(|| current.username().clone()),
            patch
                .email
                .clone()
                .unwrap_or_else(|| current.email().clone()),
            current.created_at(),
            patch.updated_at,
        );
        if let Some(digest) = patch.password_digest.as_ref() {
            stored.password_digest = digest.clone();
        }
        Ok(Some(stored.user.clone()))
    }

    async fn delete(&self, id: UserId) -> Result<Option<User>, UserPersistenceError> {
        let mut store = self.store.write().await;
        Ok(store.users.remove(&id).map(|stored| stored.user))
    }

    async fn delete_many(&self, ids: &[UserId]) -> Result<Vec<UserId>, UserPersistenceError> {
        let mut store = self.store.write().await;
        Ok(ids
            .iter()
            .filter(|id| store.users.remove(id).is_some())
            .copied()
            .collect())
    }
}

#[cfg(test)]
#[path = "in_memory_user_repository_tests.rs"]
mod tests;
