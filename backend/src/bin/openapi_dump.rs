//! Print the OpenAPI document as JSON.
//!
//! The server entry follows `APP_ENVIRONMENT`, matching the document served
//! by Swagger UI.

use std::io::{Write, stdout};

use color_eyre::eyre::{Context, Result};
use user_service::doc::ApiDoc;
use user_service::settings::Settings;

fn main() -> Result<()> {
    color_eyre::install()?;
    let settings = Settings::load("openapi-dump").wrap_err("failed to load settings")?;
    let doc = ApiDoc::for_root_path(settings.app.root_path());
    let json = doc
        .to_pretty_json()
        .wrap_err("failed to serialise OpenAPI document")?;
    writeln!(stdout().lock(), "{json}").wrap_err("failed to write OpenAPI document")?;
    Ok(())
}
