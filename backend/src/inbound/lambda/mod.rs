//! AWS Lambda inbound adapter.
//!
//! The Lambda entry point runs the same actix application as the HTTP
//! server through [`ActixBridge`], wrapped in [`InvocationLogLayer`].

pub mod bridge;
pub mod context;
pub mod logging;

pub use bridge::{ActixBridge, BridgeError, BridgeRequest, BridgeResponse, strip_stage};
pub use context::LambdaFunctionInfo;
pub use logging::{InvocationLog, InvocationLogLayer, TaskLog, TaskLogLayer};
