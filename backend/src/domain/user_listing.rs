//! Listing parameters for the users collection.
//!
//! Sorting and filtering arrive as loosely typed query parameters; this
//! module turns them into closed types before any adapter builds a query.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Days, NaiveDate, NaiveTime, Utc};
use pagination::PageRequest;

/// Failures raised while validating listing parameters.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum UserListingError {
    /// Sort field is not one of the sortable columns.
    #[error("Invalid sort field: {0}")]
    InvalidSortField(String),
    /// Sort direction is neither `asc` nor `desc`.
    #[error("Invalid sort type: {0}. Use 'asc' or 'desc'")]
    InvalidSortType(String),
    /// `start_date` falls after `end_date`.
    #[error("start_date {start} must not be after end_date {end}")]
    InvalidDateRange {
        /// Requested lower bound.
        start: NaiveDate,
        /// Requested upper bound.
        end: NaiveDate,
    },
}

/// Sortable user columns.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortField {
    /// Identifier (default).
    #[default]
    Id,
    /// Username.
    Username,
    /// Email address.
    Email,
    /// Creation timestamp.
    CreatedAt,
    /// Modification timestamp.
    UpdatedAt,
}

impl SortField {
    /// Column name as accepted in the `sort_by` parameter.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Id => "id",
            Self::Username => "username",
            Self::Email => "email",
            Self::CreatedAt => "created_at",
            Self::UpdatedAt => "updated_at",
        }
    }
}

impl FromStr for SortField {
    type Err = UserListingError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "id" => Ok(Self::Id),
            "username" => Ok(Self::Username),
            "email" => Ok(Self::Email),
            "created_at" => Ok(Self::CreatedAt),
            "updated_at" => Ok(Self::UpdatedAt),
            other => Err(UserListingError::InvalidSortField(other.to_owned())),
        }
    }
}

impl fmt::Display for SortField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Sort direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortDirection {
    /// Ascending (default).
    #[default]
    Asc,
    /// Descending.
    Desc,
}

impl FromStr for SortDirection {
    type Err = UserListingError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.eq_ignore_ascii_case("asc") {
            Ok(Self::Asc)
        } else if s.eq_ignore_ascii_case("desc") {
            Ok(Self::Desc)
        } else {
            Err(UserListingError::InvalidSortType(s.to_owned()))
        }
    }
}

impl fmt::Display for SortDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Asc => "asc",
            Self::Desc => "desc",
        })
    }
}

/// Optional filters on the users collection.
///
/// Text filters are case-insensitive substring matches. Date bounds are
/// whole UTC days and both are inclusive.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct UserFilter {
    username: Option<String>,
    email: Option<String>,
    start_date: Option<NaiveDate>,
    end_date: Option<NaiveDate>,
}

impl UserFilter {
    /// Build a filter, dropping blank text filters.
    ///
    /// # Errors
    /// Returns [`UserListingError::InvalidDateRange`] when `start_date` is
    /// after `end_date`.
    pub fn new(
        username: Option<String>,
        email: Option<String>,
        start_date: Option<NaiveDate>,
        end_date: Option<NaiveDate>,
    ) -> Result<Self, UserListingError> {
        if let (Some(start), Some(end)) = (start_date, end_date) {
            if start > end {
                return Err(UserListingError::InvalidDateRange { start, end });
            }
        }
        Ok(Self {
            username: non_blank(username),
            email: non_blank(email),
            start_date,
            end_date,
        })
    }

    /// Username substring filter.
    #[must_use]
    pub fn username(&self) -> Option<&str> {
        self.username.as_deref()
    }

    /// Email substring filter.
    #[must_use]
    pub fn email(&self) -> Option<&str> {
        self.email.as_deref()
    }

    /// Earliest creation day kept.
    #[must_use]
    pub const fn start_date(&self) -> Option<NaiveDate> {
        self.start_date
    }

    /// Latest creation day kept.
    #[must_use]
    pub const fn end_date(&self) -> Option<NaiveDate> {
        self.end_date
    }

    /// Inclusive lower bound on `created_at`.
    #[must_use]
    pub fn created_from(&self) -> Option<DateTime<Utc>> {
        self.start_date.map(start_of_day)
    }

    /// Exclusive upper bound on `created_at`: midnight after `end_date`.
    #[must_use]
    pub fn created_before(&self) -> Option<DateTime<Utc>> {
        self.end_date
            .and_then(|day| day.checked_add_days(Days::new(1)))
            .map(start_of_day)
    }

    /// Whether a user with the given fields passes the filter.
    ///
    /// Adapters that cannot push filters into a query use this directly.
    #[must_use]
    pub fn matches(&self, username: &str, email: &str, created_at: DateTime<Utc>) -> bool {
        contains_ignore_case(username, self.username())
            && contains_ignore_case(email, self.email())
            && self.created_from().map_or(true, |from| created_at >= from)
            && self
                .created_before()
                .map_or(true, |before| created_at < before)
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|raw| raw.trim().to_owned())
        .filter(|trimmed| !trimmed.is_empty())
}

fn start_of_day(day: NaiveDate) -> DateTime<Utc> {
    day.and_time(NaiveTime::MIN).and_utc()
}

fn contains_ignore_case(haystack: &str, needle: Option<&str>) -> bool {
    needle.map_or(true, |needle| {
        haystack.to_lowercase().contains(&needle.to_lowercase())
    })
}

/// Validated request for one page of users.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ListUsersRequest {
    /// Page window.
    pub page: PageRequest,
    /// Primary sort column; ties are broken by id.
    pub sort_by: SortField,
    /// Sort direction applied to `sort_by`.
    pub sort_type: SortDirection,
    /// Row filters.
    pub filter: UserFilter,
}

impl ListUsersRequest {
    /// Parse raw sort parameters into a request.
    ///
    /// # Errors
    /// Returns [`UserListingError`] for unknown sort fields or directions.
    ///
    /// # Examples
    /// ```
    /// use pagination::PageRequest;
    /// use user_service::domain::{ListUsersRequest, SortDirection, SortField, UserFilter};
    ///
    /// let request = ListUsersRequest::parse(
    ///     PageRequest::default(),
    ///     "created_at",
    ///     "DESC",
    ///     UserFilter::default(),
    /// )
    /// .expect("valid parameters");
    /// assert_eq!(request.sort_by, SortField::CreatedAt);
    /// assert_eq!(request.sort_type, SortDirection::Desc);
    /// ```
    pub fn parse(
        page: PageRequest,
        sort_by: &str,
        sort_type: &str,
        filter: UserFilter,
    ) -> Result<Self, UserListingError> {
        Ok(Self {
            page,
            sort_by: sort_by.parse()?,
            sort_type: sort_type.parse()?,
            filter,
        })
    }
}
