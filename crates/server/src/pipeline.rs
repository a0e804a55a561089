use lojavoz_common::Result;
use lojavoz_ledger::Ledger;
use lojavoz_transcribe::SpeechToText;
use std::path::Path;
use std::sync::Arc;
use tracing::{info, warn};

/// Transcribe-then-append orchestration for one upload.
///
/// The ledger is invoked only after a successful transcription; a failed
/// transcription never produces a ledger row. There is no compensating
/// action when the append itself fails after a successful transcription.
pub struct UploadPipeline {
    transcriber: Arc<dyn SpeechToText>,
    ledger: Arc<dyn Ledger>,
    language: String,
}

impl UploadPipeline {
    /// Create a pipeline over the injected clients
    pub fn new(
        transcriber: Arc<dyn SpeechToText>,
        ledger: Arc<dyn Ledger>,
        language: String,
    ) -> Self {
        Self {
            transcriber,
            ledger,
            language,
        }
    }

    /// Run one upload through transcription and the ledger append.
    /// Returns the recognized text untransformed.
    pub async fn execute(&self, audio_path: &Path, store: &str) -> Result<String> {
        info!("Transcribing upload: {}", audio_path.display());
        let transcript = self
            .transcriber
            .transcribe(audio_path, &self.language)
            .await?;

        info!("Transcription: {}", transcript);

        if let Err(e) = self.ledger.append_row(store, &transcript).await {
            warn!("Transcript lost to the ledger - Store: {}: {}", store, e);
            return Err(e);
        }

        Ok(transcript)
    }
}
