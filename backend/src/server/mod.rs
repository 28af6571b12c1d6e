//! Server construction and middleware wiring.
//!
//! [`build_app`] assembles the actix application shared by the HTTP server
//! and the Lambda bridge; [`create_server`] binds it to a socket.

mod config;
mod state_builders;

pub use config::ServerConfig;
pub use state_builders::{StartupError, build_http_state, connect_database};

use actix_cors::Cors;
use actix_web::body::MessageBody;
use actix_web::dev::{Server, ServiceFactory, ServiceRequest, ServiceResponse};
use actix_web::{App, HttpServer, web};
#[cfg(debug_assertions)]
use utoipa_swagger_ui::SwaggerUi;

use crate::Trace;
#[cfg(debug_assertions)]
use crate::doc::ApiDoc;
use crate::inbound::http::error::{json_error_handler, path_error_handler, query_error_handler};
use crate::inbound::http::health::{HealthState, health_check, live, ready};
use crate::inbound::http::state::HttpState;
use crate::inbound::http::users::{
    bulk_delete_users, create_user, delete_user, get_user, list_users, update_user,
};
use crate::inbound::http::welcome::{WelcomePage, welcome};

/// Everything [`build_app`] needs to assemble the application.
#[derive(Clone)]
pub struct AppDependencies {
    pub health_state: web::Data<HealthState>,
    pub http_state: web::Data<HttpState>,
    pub service_name: String,
    pub root_path: String,
    pub allowed_origins: Vec<String>,
}

impl AppDependencies {
    /// Bundle `http_state` with the presentation options from `config`.
    #[must_use]
    pub fn new(
        config: &ServerConfig,
        health_state: web::Data<HealthState>,
        http_state: web::Data<HttpState>,
    ) -> Self {
        Self {
            health_state,
            http_state,
            service_name: config.service_name.clone(),
            root_path: config.root_path.clone(),
            allowed_origins: config.allowed_origins.clone(),
        }
    }
}

fn cors(allowed_origins: &[String]) -> Cors {
    let cors = Cors::default()
        .allow_any_method()
        .allow_any_header()
        .max_age(3600);
    if allowed_origins.iter().any(|origin| origin == "*") {
        return cors.allow_any_origin();
    }
    allowed_origins
        .iter()
        .fold(cors, |cors, origin| cors.allowed_origin(origin))
        .supports_credentials()
}

/// Assemble the application: CORS, request tracing, extractor error
/// handlers, the `/api` routes, probes and the landing page.
pub fn build_app(
    deps: AppDependencies,
) -> App<
    impl ServiceFactory<
        ServiceRequest,
        Config = (),
        Response = ServiceResponse<impl MessageBody>,
        Error = actix_web::Error,
        InitError = (),
    >,
> {
    let AppDependencies {
        health_state,
        http_state,
        service_name,
        root_path,
        allowed_origins,
    } = deps;

    let api = web::scope("/api")
        .service(health_check)
        .service(list_users)
        .service(create_user)
        .service(bulk_delete_users)
        .service(get_user)
        .service(update_user)
        .service(delete_user);

    let welcome_page = web::Data::new(WelcomePage {
        name: service_name.clone(),
        root_path: root_path.clone(),
    });

    let app = App::new()
        .app_data(health_state)
        .app_data(http_state)
        .app_data(welcome_page)
        .app_data(web::JsonConfig::default().error_handler(json_error_handler))
        .app_data(web::QueryConfig::default().error_handler(query_error_handler))
        .app_data(web::PathConfig::default().error_handler(path_error_handler))
        .wrap(Trace::new(service_name))
        .wrap(cors(&allowed_origins))
        .service(api)
        .service(ready)
        .service(live)
        .service(welcome);

    #[cfg(debug_assertions)]
    let app = app.service(
        SwaggerUi::new("/docs/{_:.*}")
            .url("/api-docs/openapi.json", ApiDoc::for_root_path(&root_path)),
    );

    app
}

/// Construct an Actix HTTP server using the provided health state and configuration.
///
/// The users state is built once so every worker shares the same
/// repository.
///
/// # Errors
/// Propagates [`std::io::Error`] when binding the socket fails.
pub fn create_server(
    health_state: web::Data<HealthState>,
    config: ServerConfig,
) -> std::io::Result<Server> {
    let http_state = web::Data::new(build_http_state(config.db_pool.as_ref()));
    let deps = AppDependencies::new(&config, health_state.clone(), http_state);

    let server = HttpServer::new(move || build_app(deps.clone()))
        .bind(config.bind_addr)?
        .run();

    health_state.mark_ready();
    Ok(server)
}

#[cfg(test)]
mod tests {
    use actix_web::http::{StatusCode, header};
    use actix_web::test;
    use rstest::rstest;

    use super::*;

    fn deps(origins: &[&str]) -> AppDependencies {
        let config = ServerConfig::new(([127, 0, 0, 1], 0).into())
            .with_allowed_origins(origins.iter().map(|o| (*o).to_owned()).collect());
        AppDependencies::new(
            &config,
            web::Data::new(HealthState::new()),
            web::Data::new(build_http_state(None)),
        )
    }

    #[actix_web::test]
    async fn responses_carry_trace_header() {
        let app = test::init_service(build_app(deps(&["*"]))).await;
        let res = test::call_service(
            &app,
            test::TestRequest::get().uri("/api/health-check").to_request(),
        )
        .await;
        assert_eq!(res.status(), StatusCode::OK);
        assert!(res.headers().contains_key("trace-id"));
    }

    #[rstest]
    #[case(&["*"], "https://any.example", Some("*"))]
    #[case(&["https://app.example"], "https://app.example", Some("https://app.example"))]
    #[case(&["https://app.example"], "https://evil.example", None)]
    #[actix_web::test]
    async fn cors_follows_allowed_origins(
        #[case] origins: &[&str],
        #[case] origin: &str,
        #[case] expected: Option<&str>,
    ) {
        let app = test::init_service(build_app(deps(origins))).await;
        let res = test::call_service(
            &app,
            test::TestRequest::get()
                .uri("/api/health-check")
                .insert_header((header::ORIGIN, origin))
                .to_request(),
        )
        .await;
        let allowed = res
            .headers()
            .get(header::ACCESS_CONTROL_ALLOW_ORIGIN)
            .and_then(|v| v.to_str().ok());
        match expected {
            Some("*") => assert!(allowed.is_some()),
            other => assert_eq!(allowed, other),
        }
    }

    #[actix_web::test]
    async fn unknown_routes_are_not_found() {
        let app = test::init_service(build_app(deps(&["*"]))).await;
        let res = test::call_service(
            &app,
            test::TestRequest::get().uri("/api/nothing").to_request(),
        )
        .await;
        assert_eq!(res.status(), StatusCode::NOT_FOUND);
    }
}
