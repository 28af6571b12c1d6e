//! In-process storage adapters.
//!
//! Used when no database is configured and throughout the HTTP tests.

mod in_memory_user_repository;

pub use in_memory_user_repository::InMemoryUserRepository;
