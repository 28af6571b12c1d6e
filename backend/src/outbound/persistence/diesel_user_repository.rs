//! PostgreSQL-backed `UserRepository` implementation using Diesel ORM.
//!
//! Filtering, ordering, and paging all run in SQL. Inserts check the email
//! inside a transaction and still map unique violations, so a concurrent
//! writer that slips past the check surfaces as a duplicate email.

use async_trait::async_trait;
use diesel::pg::Pg;
use diesel::prelude::*;
use diesel_async::scoped_futures::ScopedFutureExt;
use diesel_async::{AsyncConnection, RunQueryDsl};

use crate::domain::ports::{UserPageQuery, UserPersistenceError, UserRepository};
use crate::domain::{
    EmailAddress, SortDirection, SortField, User, UserDraft, UserFilter, UserId, UserPatch,
};

use super::diesel_error_mapping::{map_diesel_error, map_pool_error, map_write_error};
use super::models::{NewUserRow, UserChangeset, UserRow};
use super::pool::DbPool;
use super::schema::users;

/// Diesel-backed implementation of the `UserRepository` port.
#[derive(Clone)]
pub struct DieselUserRepository {
    pool: DbPool,
}

impl DieselUserRepository {
    /// Create a new repository with the given connection pool.
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

/// Build a `%value%` pattern, escaping LIKE metacharacters in `value`.
fn contains_pattern(value: &str) -> String {
    let mut pattern = String::with_capacity(value.len() + 2);
    pattern.push('%');
    for ch in value.chars() {
        if matches!(ch, '%' | '_' | '\\') {
            pattern.push('\\');
        }
        pattern.push(ch);
    }
    pattern.push('%');
    pattern
}

fn apply_filter<'a, ST>(
    mut query: users::BoxedQuery<'a, Pg, ST>,
    filter: &UserFilter,
) -> users::BoxedQuery<'a, Pg, ST> {
    if let Some(username) = filter.username() {
        query = query.filter(users::username.ilike(contains_pattern(username)));
    }
    if let Some(email) = filter.email() {
        query = query.filter(users::email.ilike(contains_pattern(email)));
    }
    if let Some(from) = filter.created_from() {
        query = query.filter(users::created_at.ge(from));
    }
    if let Some(before) = filter.created_before() {
        query = query.filter(users::created_at.lt(before));
    }
    query
}

fn apply_order<'a, ST>(
    query: users::BoxedQuery<'a, Pg, ST>,
    sort_by: SortField,
    direction: SortDirection,
) -> users::BoxedQuery<'a, Pg, ST> {
    match (sort_by, direction) {
        (SortField::Id, SortDirection::Asc) => query.order_by(users::id.asc()),
        (SortField::Id, SortDirection::Desc) => query.order_by(users::id.desc()),
        (SortField::Username, SortDirection::Asc) => {
            query.order_by((users::username.asc(), users::id.asc()))
        }
        (SortField::Username, SortDirection::Desc) => {
            query.order_by((users::username.desc(), users::id.desc()))
        }
        (SortField::Email, SortDirection::Asc) => {
            query.order_by((users::email.asc(), users::id.asc()))
        }
        (SortField::Email, SortDirection::Desc) => {
            query.order_by((users::email.desc(), users::id.desc()))
        }
        (SortField::CreatedAt, SortDirection::Asc) => {
            query.order_by((users::created_at.asc(), users::id.asc()))
        }
        (SortField::CreatedAt, SortDirection::Desc) => {
            query.order_by((users::created_at.desc(), users::id.desc()))
        }
        (SortField::UpdatedAt, SortDirection::Asc) => {
            query.order_by((users::updated_at.asc(), users::id.asc()))
        }
        (SortField::UpdatedAt, SortDirection::Desc) => {
            query.order_by((users::updated_at.desc(), users::id.desc()))
        }
    }
}

fn to_sql_window(value: u64) -> i64 {
    i64::try_from(value).unwrap_or(i64::MAX)
}

fn rows_to_users(rows: Vec<UserRow>) -> Result<Vec<User>, UserPersistenceError> {
    rows.into_iter().map(UserRow::into_domain).collect()
}

#[async_trait]
impl UserRepository for DieselUserRepository {
    async fn count(&self, filter: &UserFilter) -> Result<u64, UserPersistenceError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let base = users::table.select(diesel::dsl::count_star()).into_boxed();
        let total: i64 = apply_filter(base, filter)
            .get_result(&mut conn)
            .await
            .map_err(map_diesel_error)?;
        u64::try_from(total)
            .map_err(|_| UserPersistenceError::query(format!("negative user count {total}")))
    }

    async fn list(&self, query: &UserPageQuery) -> Result<Vec<User>, UserPersistenceError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let base = users::table.select(UserRow::as_select()).into_boxed();
        let rows: Vec<UserRow> = apply_order(
            apply_filter(base, &query.filter),
            query.sort_by,
            query.direction,
        )
        .offset(to_sql_window(query.offset))
        .limit(to_sql_window(query.limit))
        .load(&mut conn)
        .await
        .map_err(map_diesel_error)?;
        rows_to_users(rows)
    }

    async fn find_by_id(&self, id: UserId) -> Result<Option<User>, UserPersistenceError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let row: Option<UserRow> = users::table
            .find(id.get())
            .select(UserRow::as_select())
            .first(&mut conn)
            .await
            .optional()
            .map_err(map_diesel_error)?;
        row.map(UserRow::into_domain).transpose()
    }

    async fn find_by_email(
        &self,
        email: &EmailAddress,
    ) -> Result<Option<User>, UserPersistenceError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let row: Option<UserRow> = users::table
            .filter(users::email.eq(email.as_str()))
            .select(UserRow::as_select())
            .first(&mut conn)
            .await
            .optional()
            .map_err(map_diesel_error)?;
        row.map(UserRow::into_domain).transpose()
    }

    async fn insert(&self, draft: &UserDraft) -> Result<User, UserPersistenceError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let email = draft.email.as_str();
        let inserted: Option<UserRow> = conn
            .transaction(|conn| {
                async move {
                    let taken: Option<i64> = users::table
                        .filter(users::email.eq(email))
                        .select(users::id)
                        .first(conn)
                        .await
                        .optional()?;
                    if taken.is_some() {
                        return Ok(None);
                    }
                    diesel::insert_into(users::table)
                        .values(NewUserRow::from(draft))
                        .returning(UserRow::as_returning())
                        .get_result(conn)
                        .await
                        .map(Some)
                }
                .scope_boxed()
            })
            .await
            .map_err(|err| map_write_error(err, email))?;

        inserted
            .ok_or_else(|| UserPersistenceError::duplicate_email(email))?
            .into_domain()
    }

    async fn update(
        &self,
        id: UserId,
        patch: &UserPatch,
    ) -> Result<Option<User>, UserPersistenceError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let email = patch.email.as_ref().map_or("", EmailAddress::as_str);
        let row: Option<UserRow> = diesel::update(users::table.find(id.get()))
            .set(UserChangeset::from(patch))
            .returning(UserRow::as_returning())
            .get_result(&mut conn)
            .await
            .optional()
            .map_err(|err| map_write_error(err, email))?;
        row.map(UserRow::into_domain).transpose()
    }

    async fn delete(&self, id: UserId) -> Result<Option<User>, UserPersistenceError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let row: Option<UserRow> = diesel::delete(users::table.find(id.get()))
            .returning(UserRow::as_returning())
            .get_result(&mut conn)
            .await
            .optional()
            .map_err(map_diesel_error)?;
        row.map(UserRow::into_domain).transpose()
    }

    async fn delete_many(&self, ids: &[UserId]) -> Result<Vec<UserId>, UserPersistenceError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let raw: Vec<i64> = ids.iter().map(|id| id.get()).collect();
        let deleted: Vec<i64> = diesel::delete(users::table.filter(users::id.eq_any(raw)))
            .returning(users::id)
            .get_results(&mut conn)
            .await
            .map_err(map_diesel_error)?;
        deleted
            .into_iter()
            .map(|id| {
                UserId::new(id).map_err(|err| UserPersistenceError::query(err.to_string()))
            })
            .collect()
    }
}
