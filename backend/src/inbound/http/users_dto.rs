//! Request and response shapes for the users endpoints.
//!
//! Timestamps render as `YYYY-MM-DD HH:MM:SS` in UTC. Password material is
//! accepted on input and never echoed.

use chrono::{DateTime, NaiveDate, Utc};
use pagination::{DEFAULT_PAGE, DEFAULT_PER_PAGE, PageMeta, PageRequest, PageRequestError, Paginated};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

use crate::domain::{
    EmailAddress, Error, ListUsersRequest, NewUser, Password, User, UserChanges, UserFilter,
    UserValidationError, Username, UsernamePolicy,
};

use super::validation::{FieldName, listing_error, page_parameter_error};

const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

fn format_timestamp(value: DateTime<Utc>) -> String {
    value.format(TIMESTAMP_FORMAT).to_string()
}

/// User as rendered in responses.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct UserDto {
    #[schema(example = 1)]
    pub id: i64,
    #[schema(example = "ada")]
    pub username: String,
    #[schema(example = "ada@example.com")]
    pub email: String,
    #[schema(example = "2024-06-01 12:00:00")]
    pub created_at: String,
    #[schema(example = "2024-06-01 12:00:00")]
    pub updated_at: String,
}

impl From<&User> for UserDto {
    fn from(user: &User) -> Self {
        Self {
            id: user.id().get(),
            username: user.username().as_str().to_owned(),
            email: user.email().as_str().to_owned(),
            created_at: format_timestamp(user.created_at()),
            updated_at: format_timestamp(user.updated_at()),
        }
    }
}

/// Body for `POST /api/users`.
#[derive(Debug, Clone, Deserialize, Serialize, ToSchema)]
pub struct CreateUserRequest {
    /// Between 3 and 50 characters.
    #[schema(example = "ada")]
    pub username: String,
    #[schema(example = "ada@example.com")]
    pub email: String,
    #[schema(example = "correct horse battery staple")]
    pub password: String,
}

impl TryFrom<CreateUserRequest> for NewUser {
    type Error = UserValidationError;

    fn try_from(value: CreateUserRequest) -> Result<Self, Self::Error> {
        Ok(Self {
            username: Username::new(value.username, UsernamePolicy::Create)?,
            email: EmailAddress::new(&value.email)?,
            password: Password::new(value.password)?,
        })
    }
}

/// Body for `PUT /api/users/{id}`; absent fields are left unchanged.
#[derive(Debug, Clone, Default, Deserialize, Serialize, ToSchema)]
#[serde(default)]
pub struct UpdateUserRequest {
    /// Between 3 and 20 characters.
    pub username: Option<String>,
    pub email: Option<String>,
    pub password: Option<String>,
}

impl TryFrom<UpdateUserRequest> for UserChanges {
    type Error = UserValidationError;

    fn try_from(value: UpdateUserRequest) -> Result<Self, Self::Error> {
        Ok(Self {
            username: value
                .username
                .map(|name| Username::new(name, UsernamePolicy::Update))
                .transpose()?,
            email: value.email.as_deref().map(EmailAddress::new).transpose()?,
            password: value.password.map(Password::new).transpose()?,
        })
    }
}

/// Query parameters for `GET /api/users`.
#[derive(Debug, Clone, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct ListUsersQuery {
    /// Page number, starting at 1.
    pub page: Option<u32>,
    /// Page size.
    pub items_per_page: Option<u32>,
    /// `asc` or `desc`.
    pub sort_type: Option<String>,
    /// `id`, `username`, `email`, `created_at` or `updated_at`.
    pub sort_by: Option<String>,
    /// Case-insensitive username substring.
    pub username: Option<String>,
    /// Case-insensitive email substring.
    pub email: Option<String>,
    /// Earliest creation date (inclusive), `YYYY-MM-DD`.
    pub start_date: Option<NaiveDate>,
    /// Latest creation date (inclusive), `YYYY-MM-DD`.
    pub end_date: Option<NaiveDate>,
}

impl TryFrom<ListUsersQuery> for ListUsersRequest {
    type Error = Error;

    fn try_from(query: ListUsersQuery) -> Result<Self, Self::Error> {
        let page = PageRequest::new(
            query.page.unwrap_or(DEFAULT_PAGE),
            query.items_per_page.unwrap_or(DEFAULT_PER_PAGE),
        )
        .map_err(|err| match err {
            PageRequestError::PageOutOfRange => page_parameter_error(FieldName::new("page")),
            PageRequestError::PerPageOutOfRange => {
                page_parameter_error(FieldName::new("items_per_page"))
            }
        })?;
        let filter = UserFilter::new(query.username, query.email, query.start_date, query.end_date)
            .map_err(|err| listing_error(&err))?;
        Self::parse(
            page,
            query.sort_by.as_deref().unwrap_or("id"),
            query.sort_type.as_deref().unwrap_or("asc"),
            filter,
        )
        .map_err(|err| listing_error(&err))
    }
}

/// Pagination metadata as rendered in responses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct PageMetaDto {
    pub current_page: u64,
    pub last_page: u64,
    pub first_item: u64,
    pub last_item: u64,
    pub items_per_page: u64,
    pub total: u64,
}

impl From<PageMeta> for PageMetaDto {
    fn from(meta: PageMeta) -> Self {
        Self {
            current_page: meta.current_page,
            last_page: meta.last_page,
            first_item: meta.first_item,
            last_item: meta.last_item,
            items_per_page: meta.items_per_page,
            total: meta.total,
        }
    }
}

/// `{"data": user, "status_code": 200}` envelope.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct UserEnvelope {
    pub data: UserDto,
    #[schema(example = 200)]
    pub status_code: u16,
}

impl UserEnvelope {
    /// Wrap `user` with a 200 status code.
    #[must_use]
    pub fn ok(user: &User) -> Self {
        Self {
            data: UserDto::from(user),
            status_code: 200,
        }
    }
}

/// Paginated users envelope.
///
/// A page without rows reports `status_code` 404 and zeroed metadata while
/// the HTTP status stays 200.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct UserPageEnvelope {
    pub data: Vec<UserDto>,
    pub meta: PageMetaDto,
    #[schema(example = 200)]
    pub status_code: u16,
}

impl From<Paginated<User>> for UserPageEnvelope {
    fn from(page: Paginated<User>) -> Self {
        if page.is_empty() {
            return Self {
                data: Vec::new(),
                meta: PageMeta::empty().into(),
                status_code: 404,
            };
        }
        let page = page.map(|user| UserDto::from(&user));
        Self {
            data: page.data,
            meta: page.meta.into(),
            status_code: 200,
        }
    }
}

/// Plain message body.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct MessageResponse {
    #[schema(example = "OK")]
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status_code: Option<u16>,
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;
    use rstest::rstest;

    use super::*;
    use crate::domain::{ErrorCode, SortDirection, SortField, UserId};

    fn user(id: i64) -> User {
        let at = Utc
            .with_ymd_and_hms(2024, 2, 29, 23, 5, 9)
            .single()
            .expect("valid timestamp");
        User::new(
            UserId::new(id).expect("valid id"),
            Username::new("grace", UsernamePolicy::Create).expect("valid username"),
            EmailAddress::new("grace@example.com").expect("valid email"),
            at,
            at,
        )
    }

    #[rstest]
    fn user_dto_formats_timestamps() {
        let dto = UserDto::from(&user(5));
        assert_eq!(dto.created_at, "2024-02-29 23:05:09");
        let json = serde_json::to_value(&dto).expect("serialises");
        assert!(json.get("password").is_none());
        assert!(json.get("password_digest").is_none());
    }

    #[rstest]
    fn list_query_defaults() {
        let request = ListUsersRequest::try_from(ListUsersQuery::default()).expect("defaults");
        assert_eq!(request.page.page(), 1);
        assert_eq!(request.page.per_page(), 10);
        assert_eq!(request.sort_by, SortField::Id);
        assert_eq!(request.sort_type, SortDirection::Asc);
    }

    #[rstest]
    #[case(ListUsersQuery { page: Some(0), ..ListUsersQuery::default() }, ErrorCode::ValidationFailed)]
    #[case(ListUsersQuery { items_per_page: Some(0), ..ListUsersQuery::default() }, ErrorCode::ValidationFailed)]
    #[case(ListUsersQuery { sort_by: Some("password".into()), ..ListUsersQuery::default() }, ErrorCode::InvalidRequest)]
    #[case(ListUsersQuery { sort_type: Some("sideways".into()), ..ListUsersQuery::default() }, ErrorCode::InvalidRequest)]
    fn list_query_rejects_bad_parameters(#[case] query: ListUsersQuery, #[case] code: ErrorCode) {
        let err = ListUsersRequest::try_from(query).expect_err("invalid query");
        assert_eq!(err.code(), code);
    }

    #[rstest]
    fn update_request_uses_update_username_limit() {
        let request = UpdateUserRequest {
            username: Some("a".repeat(21)),
            ..UpdateUserRequest::default()
        };
        let err = UserChanges::try_from(request).expect_err("too long");
        assert_eq!(err, UserValidationError::UsernameTooLong { max: 20 });
    }

    #[rstest]
    fn empty_page_reports_not_found_with_zero_meta() {
        let page = Paginated::<User>::new(
            Vec::new(),
            PageRequest::new(3, 10).expect("valid page"),
            12,
        );
        let envelope = UserPageEnvelope::from(page);
        assert_eq!(envelope.status_code, 404);
        assert_eq!(envelope.meta, PageMetaDto::from(PageMeta::empty()));
    }

    #[rstest]
    fn full_page_reports_meta() {
        let page = Paginated::new(
            vec![user(1), user(2)],
            PageRequest::new(1, 2).expect("valid page"),
            5,
        );
        let envelope = UserPageEnvelope::from(page);
        assert_eq!(envelope.status_code, 200);
        assert_eq!(envelope.data.len(), 2);
        assert_eq!(envelope.meta.last_page, 3);
        assert_eq!(envelope.meta.last_item, 2);
    }
}
