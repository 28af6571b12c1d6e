//! HTTP server entry point.

use actix_web::web;
use color_eyre::eyre::{Context, Result};
use tracing::info;

use user_service::inbound::http::health::HealthState;
use user_service::server::{ServerConfig, connect_database, create_server};
use user_service::settings::Settings;
use user_service::telemetry;

/// Application bootstrap.
#[actix_web::main]
async fn main() -> Result<()> {
    color_eyre::install()?;
    let settings = Settings::load("user-service").wrap_err("failed to load settings")?;
    let channel =
        telemetry::init(&settings.app, &settings.log).wrap_err("failed to initialise logging")?;

    let mut config =
        ServerConfig::from_settings(&settings.app).wrap_err("invalid server settings")?;
    if let Some(pool) = connect_database(&settings.database)
        .await
        .wrap_err("failed to prepare the database")?
    {
        config = config.with_db_pool(pool);
    }

    info!(
        bind_addr = %config.bind_addr(),
        environment = settings.app.environment(),
        log_channel = ?channel,
        "starting HTTP server"
    );
    let health_state = web::Data::new(HealthState::new());
    let server = create_server(health_state, config).wrap_err("failed to bind HTTP server")?;
    server.await.wrap_err("HTTP server stopped with an error")
}
