//! HTTP inbound adapter exposing the users REST endpoints.

pub mod error;
pub mod health;
pub mod state;
pub mod users;
pub mod users_dto;
pub mod validation;
pub mod welcome;

pub use error::ApiResult;
