//! Invocation and task logging middleware.
//!
//! Both layers log `"Input Data"` with the payload size before the inner
//! service runs and `"Output Data"` with the result size afterwards. The raw
//! payload is only emitted at debug level. Failures are logged and then
//! propagated unchanged.

use std::fmt::Display;
use std::task::{Context as TaskContext, Poll};
use std::time::SystemTime;

use futures_util::future::BoxFuture;
use lambda_http::lambda_runtime::LambdaEvent;
use lambda_http::tower::{Layer, Service};
use lambda_http::{Body, Request, RequestExt, Response};
use serde::Serialize;
use tracing::{Instrument, debug, error, info, info_span};

use super::context::LambdaFunctionInfo;

fn body_bytes(body: &Body) -> &[u8] {
    <Body as AsRef<[u8]>>::as_ref(body)
}

fn body_len(body: &Body) -> usize {
    body_bytes(body).len()
}

fn serialized_len<T: Serialize>(value: &T) -> usize {
    serde_json::to_vec(value).map_or(0, |bytes| bytes.len())
}

/// Layer wrapping an HTTP Lambda handler with invocation logging.
#[derive(Debug, Clone, Copy, Default)]
pub struct InvocationLogLayer;

impl<S> Layer<S> for InvocationLogLayer {
    type Service = InvocationLog<S>;

    fn layer(&self, inner: S) -> Self::Service {
        InvocationLog { inner }
    }
}

/// Service produced by [`InvocationLogLayer`].
#[derive(Debug, Clone)]
pub struct InvocationLog<S> {
    inner: S,
}

impl<S> Service<Request> for InvocationLog<S>
where
    S: Service<Request, Response = Response<Body>>,
    S::Error: Display,
    S::Future: Send + 'static,
{
    type Response = Response<Body>;
    type Error = S::Error;
    type Future = BoxFuture<'static, Result<Self::Response, Self::Error>>;

    fn poll_ready(&mut self, cx: &mut TaskContext<'_>) -> Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx)
    }

    fn call(&mut self, request: Request) -> Self::Future {
        let lambda_function = request
            .lambda_context_ref()
            .map(|context| LambdaFunctionInfo::from_context(context, SystemTime::now()));
        let request_id = lambda_function
            .as_ref()
            .map(|info| info.aws_request_id.clone())
            .unwrap_or_default();
        let span = info_span!("invocation", aws_request_id = %request_id);

        span.in_scope(|| {
            info!(
                input_data_size = body_len(request.body()),
                lambda_function = ?lambda_function,
                method = %request.method(),
                path = %request.uri().path(),
                "Input Data"
            );
            debug!(
                input_data = %String::from_utf8_lossy(body_bytes(request.body())),
                "Input Data"
            );
        });

        let response = self.inner.call(request);
        Box::pin(
            async move {
                match response.await {
                    Ok(response) => {
                        info!(
                            output_data_size = body_len(response.body()),
                            status = response.status().as_u16(),
                            "Output Data"
                        );
                        Ok(response)
                    }
                    Err(err) => {
                        error!(error = %err, "Error in Lambda function");
                        Err(err)
                    }
                }
            }
            .instrument(span),
        )
    }
}

/// Layer wrapping a non-HTTP task handler with input and output logging.
#[derive(Debug, Clone, Copy, Default)]
pub struct TaskLogLayer;

impl<S> Layer<S> for TaskLogLayer {
    type Service = TaskLog<S>;

    fn layer(&self, inner: S) -> Self::Service {
        TaskLog { inner }
    }
}

/// Service produced by [`TaskLogLayer`].
#[derive(Debug, Clone)]
pub struct TaskLog<S> {
    inner: S,
}

impl<S, T> Service<LambdaEvent<T>> for TaskLog<S>
where
    T: Serialize,
    S: Service<LambdaEvent<T>>,
    S::Response: Serialize + Send + 'static,
    S::Error: Display,
    S::Future: Send + 'static,
{
    type Response = S::Response;
    type Error = S::Error;
    type Future = BoxFuture<'static, Result<Self::Response, Self::Error>>;

    fn poll_ready(&mut self, cx: &mut TaskContext<'_>) -> Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx)
    }

    fn call(&mut self, event: LambdaEvent<T>) -> Self::Future {
        let span = info_span!("task", aws_request_id = %event.context.request_id);
        span.in_scope(|| {
            info!(input_data_size = serialized_len(&event.payload), "Input Data");
        });

        let output = self.inner.call(event);
        Box::pin(
            async move {
                match output.await {
                    Ok(output) => {
                        info!(output_data_size = serialized_len(&output), "Output Data");
                        Ok(output)
                    }
                    Err(err) => {
                        error!(error = %err, "Error in Task function");
                        Err(err)
                    }
                }
            }
            .instrument(span),
        )
    }
}
