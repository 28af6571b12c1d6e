//! Inbound adapters that translate external requests into domain service
//! calls while keeping framework details at the edge.
//!
//! HTTP handlers live under [`http`]; [`lambda`] feeds API Gateway events
//! through the same handlers.

pub mod http;
pub mod lambda;
