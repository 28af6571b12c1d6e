//! PostgreSQL persistence adapter using Diesel ORM.
//!
//! Implements the domain's `UserRepository` port on top of `diesel-async`
//! with `bb8` pooling. Row structs (`models.rs`) and the table definition
//! (`schema.rs`) stay internal; only the repository and pool are exported.
//!
//! # Example
//!
//! ```no_run
//! # async fn demo() -> Result<(), user_service::outbound::persistence::PoolError> {
//! use user_service::outbound::persistence::{DbPool, DieselUserRepository, PoolConfig};
//!
//! let pool = DbPool::new(PoolConfig::new("postgres://localhost/users")).await?;
//! let repository = DieselUserRepository::new(pool);
//! # let _ = repository;
//! # Ok(())
//! # }
//! ```

mod diesel_error_mapping;
mod diesel_user_repository;
mod models;
mod pool;
mod schema;

pub use diesel_user_repository::DieselUserRepository;
pub use pool::{DEFAULT_CONNECTION_TIMEOUT, DEFAULT_MAX_CONNECTIONS, DbPool, PoolConfig, PoolError};
