//! User service library.
//!
//! Hexagonal layout: [`domain`] holds the user model, ports and service;
//! [`inbound`] adapts HTTP and Lambda requests onto the ports; [`outbound`]
//! provides the PostgreSQL and in-memory repositories. [`server`] wires the
//! actix application used by both entry points.

pub mod doc;
pub mod domain;
pub mod inbound;
pub mod middleware;
pub mod outbound;
pub mod server;
pub mod settings;
pub mod telemetry;

/// Public OpenAPI surface used by Swagger UI and tooling.
pub use doc::ApiDoc;
pub use middleware::Trace;
