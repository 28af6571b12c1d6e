//! AWS Lambda entry point.
//!
//! Runs the actix application behind [`ActixBridge`] so API Gateway events
//! reach the same handlers as the HTTP server.

use actix_web::web;
use color_eyre::eyre::{Context, Result, eyre};
use lambda_http::tower::ServiceBuilder;
use lambda_http::{Request, service_fn};
use tracing::info;

use user_service::inbound::http::health::HealthState;
use user_service::inbound::lambda::{ActixBridge, InvocationLogLayer};
use user_service::server::{
    AppDependencies, ServerConfig, build_app, build_http_state, connect_database,
};
use user_service::settings::Settings;
use user_service::telemetry;

#[tokio::main]
async fn main() -> Result<()> {
    color_eyre::install()?;
    let settings = Settings::load("lambda").wrap_err("failed to load settings")?;
    telemetry::init(&settings.app, &settings.log).wrap_err("failed to initialise logging")?;

    let config = ServerConfig::from_settings(&settings.app).wrap_err("invalid server settings")?;
    let pool = connect_database(&settings.database)
        .await
        .wrap_err("failed to prepare the database")?;

    let health_state = web::Data::new(HealthState::new());
    health_state.mark_ready();
    let http_state = web::Data::new(build_http_state(pool.as_ref()));
    let deps = AppDependencies::new(&config, health_state, http_state);
    let bridge = ActixBridge::start(config.root_path(), move || build_app(deps))
        .await
        .wrap_err("failed to start the application bridge")?;

    info!(root_path = config.root_path(), "lambda runtime starting");
    let handler = ServiceBuilder::new()
        .layer(InvocationLogLayer)
        .service(service_fn(move |request: Request| {
            let bridge = bridge.clone();
            async move {
                bridge
                    .handle(request)
                    .await
                    .map_err(lambda_http::Error::from)
            }
        }));
    lambda_http::run(handler)
        .await
        .map_err(|err| eyre!("lambda runtime failed: {err}"))
}
