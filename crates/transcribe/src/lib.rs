//! Lojavoz transcription client
//!
//! Speech-to-text via an OpenAI-compatible transcription endpoint

pub mod client;
pub mod stt_trait;
pub mod types;

// Re-export main types
pub use client::WhisperApiClient;
pub use stt_trait::SpeechToText;
