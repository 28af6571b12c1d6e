//! User data model.
//!
//! Value types validate on construction so the service and adapters only
//! ever handle well-formed users. Username limits differ between creation
//! and update, so [`Username`] takes the applicable [`UsernamePolicy`].

use std::fmt;
use std::str::FromStr;
use std::sync::OnceLock;

use chrono::{DateTime, Utc};
use regex::Regex;
use serde::{Deserialize, Serialize};
use zeroize::{Zeroize, ZeroizeOnDrop};

use super::password::PasswordDigest;

/// Minimum number of characters in a username.
pub const USERNAME_MIN: usize = 3;
/// Maximum number of characters in a username supplied on creation.
pub const USERNAME_CREATE_MAX: usize = 50;
/// Maximum number of characters in a username supplied on update.
pub const USERNAME_UPDATE_MAX: usize = 20;

/// Validation errors raised by the user value types.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum UserValidationError {
    /// Identifiers are positive integers.
    #[error("user id must be a positive integer")]
    InvalidId,
    /// Username is blank.
    #[error("The name field is required")]
    EmptyUsername,
    /// Username shorter than [`USERNAME_MIN`].
    #[error("Name must be at least {min} characters long")]
    UsernameTooShort {
        /// Minimum accepted length.
        min: usize,
    },
    /// Username longer than the policy allows.
    #[error("Name must be at most {max} characters long")]
    UsernameTooLong {
        /// Maximum accepted length.
        max: usize,
    },
    /// Email is blank.
    #[error("The email field is required")]
    EmptyEmail,
    /// Email is not of the form `local@domain.tld`.
    #[error("value is not a valid email address")]
    InvalidEmail,
    /// Password is empty.
    #[error("The password field is required")]
    EmptyPassword,
}

impl UserValidationError {
    /// Request field the error refers to.
    #[must_use]
    pub const fn field(&self) -> &'static str {
        match self {
            Self::InvalidId => "id",
            Self::EmptyUsername | Self::UsernameTooShort { .. } | Self::UsernameTooLong { .. } => {
                "username"
            }
            Self::EmptyEmail | Self::InvalidEmail => "email",
            Self::EmptyPassword => "password",
        }
    }

    /// Stable machine-readable reason.
    #[must_use]
    pub const fn reason(&self) -> &'static str {
        match self {
            Self::InvalidId => "invalid_id",
            Self::EmptyUsername | Self::EmptyEmail | Self::EmptyPassword => "required",
            Self::UsernameTooShort { .. } => "too_short",
            Self::UsernameTooLong { .. } => "too_long",
            Self::InvalidEmail => "invalid_format",
        }
    }
}

/// Database-assigned user identifier.
///
/// ## Invariants
/// - The wrapped value is strictly positive.
///
/// # Examples
/// ```
/// use user_service::domain::UserId;
///
/// let id: UserId = "42".parse().expect("valid id");
/// assert_eq!(id.get(), 42);
/// assert!(UserId::new(0).is_err());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "i64", into = "i64")]
pub struct UserId(i64);

impl UserId {
    /// Validate and wrap a raw identifier.
    ///
    /// # Errors
    /// Returns [`UserValidationError::InvalidId`] for zero or negative values.
    pub const fn new(id: i64) -> Result<Self, UserValidationError> {
        if id <= 0 {
            return Err(UserValidationError::InvalidId);
        }
        Ok(Self(id))
    }

    /// Raw identifier.
    #[must_use]
    pub const fn get(self) -> i64 {
        self.0
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for UserId {
    type Err = UserValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let raw = s
            .trim()
            .parse::<i64>()
            .map_err(|_| UserValidationError::InvalidId)?;
        Self::new(raw)
    }
}

impl TryFrom<i64> for UserId {
    type Error = UserValidationError;

    fn try_from(value: i64) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<UserId> for i64 {
    fn from(value: UserId) -> Self {
        value.0
    }
}

/// Length rules applied to a username.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UsernamePolicy {
    /// Limits for new registrations.
    Create,
    /// Limits for renames.
    Update,
}

impl UsernamePolicy {
    /// Longest accepted username under this policy.
    #[must_use]
    pub const fn max_len(self) -> usize {
        match self {
            Self::Create => USERNAME_CREATE_MAX,
            Self::Update => USERNAME_UPDATE_MAX,
        }
    }
}

/// Validated username.
///
/// Length is measured in characters on the value as supplied; blank input is
/// rejected before the length checks.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Username(String);

impl Username {
    /// Validate `value` against `policy`.
    ///
    /// # Errors
    /// Returns [`UserValidationError`] for blank, short, or long input.
    pub fn new(
        value: impl Into<String>,
        policy: UsernamePolicy,
    ) -> Result<Self, UserValidationError> {
        let value = value.into();
        if value.trim().is_empty() {
            return Err(UserValidationError::EmptyUsername);
        }
        let length = value.chars().count();
        if length < USERNAME_MIN {
            return Err(UserValidationError::UsernameTooShort { min: USERNAME_MIN });
        }
        let max = policy.max_len();
        if length > max {
            return Err(UserValidationError::UsernameTooLong { max });
        }
        Ok(Self(value))
    }

    /// Wrap a username loaded from storage.
    ///
    /// Stored rows were validated on the way in; only the widest limit is
    /// re-checked.
    ///
    /// # Errors
    /// Returns [`UserValidationError`] when the stored value is malformed.
    pub fn from_stored(value: impl Into<String>) -> Result<Self, UserValidationError> {
        Self::new(value, UsernamePolicy::Create)
    }

    /// Borrow the username.
    #[must_use]
    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }
}

impl AsRef<str> for Username {
    fn as_ref(&self) -> &str {
        self.as_str()
    }
}

impl fmt::Display for Username {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<Username> for String {
    fn from(value: Username) -> Self {
        value.0
    }
}

static EMAIL_RE: OnceLock<Regex> = OnceLock::new();

fn email_regex() -> &'static Regex {
    EMAIL_RE.get_or_init(|| {
        let pattern = r"^[A-Za-z0-9.!#$%&'*+/=?^_`{|}~-]+@[A-Za-z0-9](?:[A-Za-z0-9-]*[A-Za-z0-9])?(?:\.[A-Za-z0-9](?:[A-Za-z0-9-]*[A-Za-z0-9])?)*\.[A-Za-z]{2,}$";
        Regex::new(pattern).unwrap_or_else(|error| panic!("email regex failed to compile: {error}"))
    })
}

/// Normalised email address.
///
/// Surrounding whitespace is trimmed and the address is stored lower-cased,
/// so equality doubles as the uniqueness check.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct EmailAddress(String);

impl EmailAddress {
    /// Validate and normalise an address.
    ///
    /// # Errors
    /// Returns [`UserValidationError::EmptyEmail`] or
    /// [`UserValidationError::InvalidEmail`].
    pub fn new(value: impl AsRef<str>) -> Result<Self, UserValidationError> {
        let trimmed = value.as_ref().trim();
        if trimmed.is_empty() {
            return Err(UserValidationError::EmptyEmail);
        }
        if !email_regex().is_match(trimmed) {
            return Err(UserValidationError::InvalidEmail);
        }
        Ok(Self(trimmed.to_lowercase()))
    }

    /// Borrow the normalised address.
    #[must_use]
    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }
}

impl AsRef<str> for EmailAddress {
    fn as_ref(&self) -> &str {
        self.as_str()
    }
}

impl fmt::Display for EmailAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<EmailAddress> for String {
    fn from(value: EmailAddress) -> Self {
        value.0
    }
}

/// Plain-text password held only until it is digested.
///
/// The buffer is wiped on drop and the type deliberately has no `Serialize`
/// or `Display` implementation.
#[derive(Clone, PartialEq, Eq, Zeroize, ZeroizeOnDrop)]
pub struct Password(String);

impl Password {
    /// Wrap a non-empty password.
    ///
    /// # Errors
    /// Returns [`UserValidationError::EmptyPassword`] for empty input.
    pub fn new(value: impl Into<String>) -> Result<Self, UserValidationError> {
        let mut value = value.into();
        if value.is_empty() {
            value.zeroize();
            return Err(UserValidationError::EmptyPassword);
        }
        Ok(Self(value))
    }

    /// Expose the secret for hashing.
    #[must_use]
    pub fn expose(&self) -> &str {
        self.0.as_str()
    }
}

impl fmt::Debug for Password {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Password(***)")
    }
}

/// Stored user.
///
/// ## Invariants
/// - `created_at <= updated_at`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct User {
    id: UserId,
    username: Username,
    email: EmailAddress,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl User {
    /// Assemble a user from validated parts.
    #[must_use]
    pub const fn new(
        id: UserId,
        username: Username,
        email: EmailAddress,
        created_at: DateTime<Utc>,
        updated_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            username,
            email,
            created_at,
            updated_at,
        }
    }

    /// Identifier.
    #[must_use]
    pub const fn id(&self) -> UserId {
        self.id
    }

    /// Username.
    #[must_use]
    pub const fn username(&self) -> &Username {
        &self.username
    }

    /// Normalised email address.
    #[must_use]
    pub const fn email(&self) -> &EmailAddress {
        &self.email
    }

    /// Creation timestamp.
    #[must_use]
    pub const fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// Last modification timestamp.
    #[must_use]
    pub const fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }
}

/// Registration input.
#[derive(Debug, Clone)]
pub struct NewUser {
    /// Requested username.
    pub username: Username,
    /// Email address, unique across users.
    pub email: EmailAddress,
    /// Plain-text password; digested before storage.
    pub password: Password,
}

/// Partial update; `None` leaves the field untouched.
#[derive(Debug, Clone, Default)]
pub struct UserChanges {
    /// New username.
    pub username: Option<Username>,
    /// New email address.
    pub email: Option<EmailAddress>,
    /// New password.
    pub password: Option<Password>,
}

impl UserChanges {
    /// Whether no field is being changed.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.username.is_none() && self.email.is_none() && self.password.is_none()
    }
}

/// Record handed to a repository for insertion.
#[derive(Debug, Clone)]
pub struct UserDraft {
    /// Username to store.
    pub username: Username,
    /// Email to store.
    pub email: EmailAddress,
    /// Salted password digest.
    pub password_digest: PasswordDigest,
    /// Creation timestamp; also the initial update timestamp.
    pub created_at: DateTime<Utc>,
}

/// Field updates handed to a repository.
#[derive(Debug, Clone)]
pub struct UserPatch {
    /// Replacement username.
    pub username: Option<Username>,
    /// Replacement email.
    pub email: Option<EmailAddress>,
    /// Replacement password digest.
    pub password_digest: Option<PasswordDigest>,
    /// New modification timestamp.
    pub updated_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests;
