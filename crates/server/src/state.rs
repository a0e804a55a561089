use lojavoz_common::AppConfig;
use lojavoz_ledger::Ledger;
use lojavoz_transcribe::SpeechToText;
use std::sync::Arc;

use crate::pipeline::UploadPipeline;

/// Shared application state
pub struct AppState {
    /// Application configuration
    pub config: AppConfig,

    /// Upload processing pipeline
    pub pipeline: UploadPipeline,
}

impl AppState {
    /// Create new application state with injected clients
    pub fn new(
        config: AppConfig,
        transcriber: Arc<dyn SpeechToText>,
        ledger: Arc<dyn Ledger>,
    ) -> Self {
        let pipeline = UploadPipeline::new(transcriber, ledger, config.language.clone());

        Self { config, pipeline }
    }
}
