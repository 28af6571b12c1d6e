//! Domain primitives, ports, and the user service.
//!
//! Purpose: define strongly typed user values and the use-case ports that
//! inbound adapters drive. Nothing here depends on HTTP, Lambda, or Diesel.
//!
//! Public surface:
//! - Error / ErrorCode: transport-agnostic failure payload.
//! - TraceId: request correlation identifier.
//! - User and its value types (UserId, Username, EmailAddress, Password).
//! - Listing parameters (ListUsersRequest, SortField, SortDirection, UserFilter).
//! - UserService: implementation of the UsersQuery and UsersCommand ports.

pub mod error;
pub mod password;
pub mod ports;
pub mod trace_id;
pub mod user;
pub mod user_listing;
pub mod user_service;

pub use self::error::{Error, ErrorCode, ErrorValidationError, TRACE_ID_HEADER};
pub use self::password::{PasswordDigest, PasswordDigestError};
pub use self::trace_id::TraceId;
pub use self::user::{
    EmailAddress, NewUser, Password, USERNAME_CREATE_MAX, USERNAME_MIN, USERNAME_UPDATE_MAX, User,
    UserChanges, UserDraft, UserId, UserPatch, UserValidationError, Username, UsernamePolicy,
};
pub use self::user_listing::{
    ListUsersRequest, SortDirection, SortField, UserFilter, UserListingError,
};
pub use self::user_service::UserService;
