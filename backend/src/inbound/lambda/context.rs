//! Function metadata extracted from the Lambda invocation context.

use std::time::{Duration, SystemTime};

use lambda_http::Context;
use serde::Serialize;

/// Metadata describing the running function and the current invocation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LambdaFunctionInfo {
    pub name: String,
    pub version: String,
    pub arn: String,
    pub memory_size: i32,
    pub aws_request_id: String,
    pub log_group: String,
    pub log_stream: String,
    /// Milliseconds left before the invocation deadline, as seen at `now`.
    pub remaining_time_ms: u64,
}

impl LambdaFunctionInfo {
    /// Capture the function metadata from `context`.
    #[must_use]
    pub fn from_context(context: &Context, now: SystemTime) -> Self {
        let config = &context.env_config;
        Self {
            name: config.function_name.clone(),
            version: config.version.clone(),
            arn: context.invoked_function_arn.clone(),
            memory_size: config.memory,
            aws_request_id: context.request_id.clone(),
            log_group: config.log_group.clone(),
            log_stream: config.log_stream.clone(),
            remaining_time_ms: remaining_millis(context.deadline(), now),
        }
    }
}

fn remaining_millis(deadline: SystemTime, now: SystemTime) -> u64 {
    let left = deadline.duration_since(now).unwrap_or(Duration::ZERO);
    u64::try_from(left.as_millis()).unwrap_or(u64::MAX)
}
