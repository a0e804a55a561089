use async_trait::async_trait;
use lojavoz_common::Result;
use std::path::Path;

/// Common trait for speech-to-text clients
#[async_trait]
pub trait SpeechToText: Send + Sync {
    /// Transcribe an audio file to text, given a language hint
    async fn transcribe(&self, audio_path: &Path, language: &str) -> Result<String>;
}
