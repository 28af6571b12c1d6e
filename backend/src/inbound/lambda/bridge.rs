//! In-process bridge from Lambda HTTP events to the actix application.
//!
//! Actix services are `!Send`, so the application lives on a dedicated
//! thread running its own actix system. Lambda requests cross over a channel,
//! are rebuilt as actix requests, and are dispatched one at a time; the
//! buffered responses travel back the same way.

use std::fmt;
use std::thread;

use actix_service::{IntoServiceFactory, Service, ServiceFactory};
use actix_web::body::{BoxBody, MessageBody};
use actix_web::dev::{AppConfig, ServiceResponse};
use actix_web::HttpResponse;
use bytes::Bytes;
use lambda_http::{Body, Request, Response};
use tokio::sync::{mpsc, oneshot};
use tracing::{debug, error, warn};

/// Failures raised while moving a request across the bridge.
#[derive(Debug, thiserror::Error)]
pub enum BridgeError {
    /// The bridge thread could not be spawned.
    #[error("failed to spawn bridge thread: {0}")]
    Spawn(#[source] std::io::Error),
    /// The application factory failed to build the service.
    #[error("failed to start application: {0}")]
    Startup(String),
    /// The bridge thread has stopped.
    #[error("bridge is not running")]
    Closed,
    /// The Lambda request could not be expressed as an HTTP request.
    #[error("invalid request: {0}")]
    InvalidRequest(String),
    /// The application response could not be expressed as a Lambda response.
    #[error("invalid response: {0}")]
    InvalidResponse(String),
}

/// Strip the API Gateway stage prefix from `path`.
///
/// `root_path` is the stage prefix with surrounding slashes (`/dev/`); a
/// root path of `/` leaves the path untouched.
///
/// # Examples
/// ```
/// use user_service::inbound::lambda::strip_stage;
///
/// assert_eq!(strip_stage("/dev/api/users", "/dev/"), "/api/users");
/// assert_eq!(strip_stage("/api/users", "/"), "/api/users");
/// ```
#[must_use]
pub fn strip_stage(path: &str, root_path: &str) -> String {
    let stage = root_path.trim_end_matches('/');
    if stage.is_empty() {
        return path.to_owned();
    }
    match path.strip_prefix(stage) {
        Some("") => "/".to_owned(),
        Some(rest) if rest.starts_with('/') => rest.to_owned(),
        _ => path.to_owned(),
    }
}

/// Owned, thread-safe snapshot of an incoming request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BridgeRequest {
    method: String,
    uri: String,
    headers: Vec<(String, Vec<u8>)>,
    body: Bytes,
}

impl BridgeRequest {
    /// Capture a Lambda request, removing the stage prefix from its path.
    #[must_use]
    pub fn from_lambda(request: Request, root_path: &str) -> Self {
        let (parts, body) = request.into_parts();
        let path = strip_stage(parts.uri.path(), root_path);
        let uri = match parts.uri.query() {
            Some(query) => format!("{path}?{query}"),
            None => path,
        };
        let headers = parts
            .headers
            .iter()
            .map(|(name, value)| (name.as_str().to_owned(), value.as_bytes().to_vec()))
            .collect();
        let body = match body {
            Body::Empty => Bytes::new(),
            Body::Text(text) => Bytes::from(text),
            Body::Binary(bytes) => Bytes::from(bytes),
        };
        Self {
            method: parts.method.as_str().to_owned(),
            uri,
            headers,
            body,
        }
    }

    /// Path and query as forwarded to the application.
    #[must_use]
    pub fn uri(&self) -> &str {
        &self.uri
    }

    fn into_actix(self) -> Result<actix_http::Request, BridgeError> {
        let invalid = |err: &dyn fmt::Display| BridgeError::InvalidRequest(err.to_string());

        let (_sender, mut payload) = actix_http::h1::Payload::create(true);
        payload.unread_data(self.body);
        let mut request = actix_http::Request::with_payload(payload.into());

        let head = request.head_mut();
        head.method = actix_http::Method::from_bytes(self.method.as_bytes())
            .map_err(|err| invalid(&err))?;
        head.uri = self
            .uri
            .parse::<actix_http::Uri>()
            .map_err(|err| invalid(&err))?;
        for (name, value) in self.headers {
            let name = actix_http::header::HeaderName::from_bytes(name.as_bytes())
                .map_err(|err| invalid(&err))?;
            let value = actix_http::header::HeaderValue::from_bytes(&value)
                .map_err(|err| invalid(&err))?;
            head.headers.append(name, value);
        }
        Ok(request)
    }
}

/// Buffered application response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BridgeResponse {
    status: u16,
    headers: Vec<(String, Vec<u8>)>,
    body: Bytes,
}

impl BridgeResponse {
    async fn from_actix(response: HttpResponse<BoxBody>) -> Result<Self, BridgeError> {
        let status = response.status().as_u16();
        let headers = response
            .headers()
            .iter()
            .map(|(name, value)| (name.as_str().to_owned(), value.as_bytes().to_vec()))
            .collect();
        let body = actix_web::body::to_bytes(response.into_body())
            .await
            .map_err(|err| BridgeError::InvalidResponse(err.to_string()))?;
        Ok(Self {
            status,
            headers,
            body,
        })
    }

    /// Convert into a Lambda response. UTF-8 bodies are sent as text.
    ///
    /// # Errors
    /// Returns [`BridgeError::InvalidResponse`] when a status or header is
    /// rejected by the HTTP types.
    pub fn into_lambda(self) -> Result<Response<Body>, BridgeError> {
        let mut builder = Response::builder().status(self.status);
        for (name, value) in &self.headers {
            builder = builder.header(name.as_str(), value.as_slice());
        }
        let body = if self.body.is_empty() {
            Body::Empty
        } else {
            match String::from_utf8(self.body.to_vec()) {
                Ok(text) => Body::Text(text),
                Err(err) => Body::Binary(err.into_bytes()),
            }
        };
        builder
            .body(body)
            .map_err(|err| BridgeError::InvalidResponse(err.to_string()))
    }
}

struct Job {
    request: BridgeRequest,
    reply: oneshot::Sender<Result<BridgeResponse, BridgeError>>,
}

/// Handle to the application running on the bridge thread.
///
/// Cloning the handle shares the same application. The thread stops once
/// every handle has been dropped.
#[derive(Clone)]
pub struct ActixBridge {
    jobs: mpsc::UnboundedSender<Job>,
    root_path: String,
}

impl fmt::Debug for ActixBridge {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ActixBridge")
            .field("root_path", &self.root_path)
            .finish_non_exhaustive()
    }
}

impl ActixBridge {
    /// Spawn the bridge thread and build the application with `factory`.
    ///
    /// Resolves once the application service is ready.
    ///
    /// # Errors
    /// Returns [`BridgeError::Spawn`] if the thread cannot start and
    /// [`BridgeError::Startup`] if the application fails to initialise.
    pub async fn start<F, R, S, B>(
        root_path: impl Into<String>,
        factory: F,
    ) -> Result<Self, BridgeError>
    where
        F: FnOnce() -> R + Send + 'static,
        R: IntoServiceFactory<S, actix_http::Request>,
        S: ServiceFactory<
                actix_http::Request,
                Config = AppConfig,
                Response = ServiceResponse<B>,
                Error = actix_web::Error,
            > + 'static,
        S::InitError: fmt::Debug,
        B: MessageBody + 'static,
    {
        let (jobs, receiver) = mpsc::unbounded_channel();
        let (ready_tx, ready_rx) = oneshot::channel();

        thread::Builder::new()
            .name("actix-bridge".to_owned())
            .spawn(move || {
                let system = actix_web::rt::System::new();
                system.block_on(serve(factory, receiver, ready_tx));
            })
            .map_err(BridgeError::Spawn)?;

        ready_rx.await.map_err(|_| BridgeError::Closed)??;
        Ok(Self {
            jobs,
            root_path: root_path.into(),
        })
    }

    /// Forward a Lambda request to the application and return its response.
    ///
    /// # Errors
    /// Returns a [`BridgeError`] when the request cannot be converted, the
    /// bridge has stopped, or the response cannot be converted back.
    pub async fn handle(&self, request: Request) -> Result<Response<Body>, BridgeError> {
        let request = BridgeRequest::from_lambda(request, &self.root_path);
        let (reply, response) = oneshot::channel();
        self.jobs
            .send(Job { request, reply })
            .map_err(|_| BridgeError::Closed)?;
        response.await.map_err(|_| BridgeError::Closed)??.into_lambda()
    }
}

async fn serve<F, R, S, B>(
    factory: F,
    mut jobs: mpsc::UnboundedReceiver<Job>,
    ready: oneshot::Sender<Result<(), BridgeError>>,
) where
    F: FnOnce() -> R,
    R: IntoServiceFactory<S, actix_http::Request>,
    S: ServiceFactory<
            actix_http::Request,
            Config = AppConfig,
            Response = ServiceResponse<B>,
            Error = actix_web::Error,
        >,
    S::InitError: fmt::Debug,
    B: MessageBody + 'static,
{
    let service = match factory()
        .into_factory()
        .new_service(AppConfig::default())
        .await
    {
        Ok(service) => service,
        Err(err) => {
            error!(error = ?err, "application failed to start");
            if ready
                .send(Err(BridgeError::Startup(format!("{err:?}"))))
                .is_err()
            {
                warn!("bridge owner went away during startup");
            }
            return;
        }
    };
    if ready.send(Ok(())).is_err() {
        warn!("bridge owner went away during startup");
        return;
    }

    while let Some(Job { request, reply }) = jobs.recv().await {
        let response = dispatch(&service, request).await;
        if reply.send(response).is_err() {
            warn!("caller dropped before the response was ready");
        }
    }
    debug!("bridge channel closed");
}

async fn dispatch<S, B>(service: &S, request: BridgeRequest) -> Result<BridgeResponse, BridgeError>
where
    S: Service<actix_http::Request, Response = ServiceResponse<B>, Error = actix_web::Error>,
    B: MessageBody + 'static,
{
    let request = request.into_actix()?;
    let response = match service.call(request).await {
        Ok(response) => response.into_parts().1.map_into_boxed_body(),
        Err(err) => err.error_response(),
    };
    BridgeResponse::from_actix(response).await
}

#[cfg(test)]
mod tests {
    use actix_web::{App, HttpRequest, HttpResponse, web};
    use rstest::rstest;

    use super::*;

    #[rstest]
    #[case("/dev/api/users", "/dev/", "/api/users")]
    #[case("/dev", "/dev/", "/")]
    #[case("/dev/", "/dev/", "/")]
    #[case("/development/api", "/dev/", "/development/api")]
    #[case("/api/users", "/prod/", "/api/users")]
    #[case("/api/users", "/", "/api/users")]
    fn stage_prefix_is_stripped(#[case] path: &str, #[case] root: &str, #[case] expected: &str) {
        assert_eq!(strip_stage(path, root), expected);
    }

    #[rstest]
    fn captures_query_and_body() {
        let request = lambda_http::http::Request::builder()
            .method("POST")
            .uri("https://example.test/uat/api/users?page=2")
            .header("content-type", "application/json")
            .body(Body::Text("{}".to_owned()))
            .expect("valid request");
        let captured = BridgeRequest::from_lambda(request, "/uat/");
        assert_eq!(captured.uri(), "/api/users?page=2");
        assert_eq!(captured.method, "POST");
        assert_eq!(captured.body, Bytes::from_static(b"{}"));
    }

    #[rstest]
    #[case(Bytes::new(), Body::Empty)]
    #[case(Bytes::from_static(b"ok"), Body::Text("ok".to_owned()))]
    #[case(Bytes::from_static(&[0xff, 0x00]), Body::Binary(vec![0xff, 0x00]))]
    fn response_bodies_keep_their_encoding(#[case] body: Bytes, #[case] expected: Body) {
        let response = BridgeResponse {
            status: 200,
            headers: vec![("x-test".to_owned(), b"1".to_vec())],
            body,
        }
        .into_lambda()
        .expect("valid response");
        assert_eq!(response.body(), &expected);
        assert_eq!(
            response.headers().get("x-test").map(|v| v.as_bytes()),
            Some(&b"1"[..])
        );
    }

    async fn echo(req: HttpRequest, body: web::Bytes) -> HttpResponse {
        HttpResponse::Ok()
            .insert_header(("x-path", req.path().to_owned()))
            .body(body)
    }

    #[tokio::test]
    async fn dispatches_requests_through_the_application() {
        let bridge = ActixBridge::start("/dev/", || {
            App::new().route("/echo", web::post().to(echo))
        })
        .await
        .expect("bridge starts");

        let request = lambda_http::http::Request::builder()
            .method("POST")
            .uri("/dev/echo")
            .body(Body::Text("ping".to_owned()))
            .expect("valid request");
        let response = bridge.handle(request).await.expect("bridge responds");

        assert_eq!(response.status().as_u16(), 200);
        assert_eq!(response.body(), &Body::Text("ping".to_owned()));
        assert_eq!(
            response.headers().get("x-path").map(|v| v.as_bytes()),
            Some(&b"/echo"[..])
        );
    }

    #[tokio::test]
    async fn unknown_routes_come_back_as_not_found() {
        let bridge = ActixBridge::start("/", || App::new().route("/echo", web::post().to(echo)))
            .await
            .expect("bridge starts");

        let request = lambda_http::http::Request::builder()
            .method("GET")
            .uri("/missing")
            .body(Body::Empty)
            .expect("valid request");
        let response = bridge.handle(request).await.expect("bridge responds");
        assert_eq!(response.status().as_u16(), 404);
    }
}
