//! Lojavoz HTTP server
//!
//! The pipeline endpoint: receives a voice memo upload, transcribes it,
//! appends the transcript to the shared spreadsheet ledger

pub mod pipeline;
pub mod routes;
pub mod state;
pub mod temp;
pub mod types;

#[cfg(test)]
pub(crate) mod test_support;

use actix_cors::Cors;
use actix_web::{web, App, HttpServer};
use lojavoz_common::{AppConfig, Result};
use lojavoz_ledger::{Ledger, SheetsClient};
use lojavoz_transcribe::{SpeechToText, WhisperApiClient};
use std::sync::Arc;
use tracing::info;
use tracing_actix_web::TracingLogger;

use crate::state::AppState;

/// Build the production clients from configuration and serve
pub async fn start_server(config: AppConfig) -> Result<()> {
    config.ensure_directories()?;

    let transcriber: Arc<dyn SpeechToText> = Arc::new(WhisperApiClient::new(
        &config.openai_api_key,
        &config.whisper_model,
    )?);

    let credentials = config.resolve_google_credentials()?;
    let ledger: Arc<dyn Ledger> = Arc::new(SheetsClient::new(
        &credentials,
        &config.spreadsheet_id,
        &config.sheet_range,
    )?);

    serve(config, transcriber, ledger).await
}

/// Serve with injected clients (tests substitute fakes here)
pub async fn serve(
    config: AppConfig,
    transcriber: Arc<dyn SpeechToText>,
    ledger: Arc<dyn Ledger>,
) -> Result<()> {
    let bind_address = config.server_bind_address();
    let state = Arc::new(AppState::new(config, transcriber, ledger));

    info!("Server listening on http://{}", bind_address);

    HttpServer::new(move || {
        App::new()
            .wrap(TracingLogger::default())
            .wrap(Cors::permissive())
            .app_data(web::Data::new(Arc::clone(&state)))
            .service(routes::health::index)
            .service(routes::upload::upload)
    })
    .bind(&bind_address)?
    .run()
    .await?;

    Ok(())
}
