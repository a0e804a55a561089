//! Fake clients for pipeline and route tests

use async_trait::async_trait;
use lojavoz_common::{LojavozError, Result};
use lojavoz_ledger::Ledger;
use lojavoz_transcribe::SpeechToText;
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

/// Scripted transcription client
pub struct FakeStt {
    pub text: String,
    pub fail_with: Option<String>,
    pub calls: AtomicUsize,
}

impl FakeStt {
    pub fn returning(text: &str) -> Self {
        Self {
            text: text.to_string(),
            fail_with: None,
            calls: AtomicUsize::new(0),
        }
    }

    pub fn failing(message: &str) -> Self {
        Self {
            text: String::new(),
            fail_with: Some(message.to_string()),
            calls: AtomicUsize::new(0),
        }
    }
}

#[async_trait]
impl SpeechToText for FakeStt {
    async fn transcribe(&self, _audio_path: &Path, _language: &str) -> Result<String> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        match &self.fail_with {
            Some(message) => Err(LojavozError::transcription(message.clone())),
            None => Ok(self.text.clone()),
        }
    }
}

/// Scripted ledger client recording its arguments
pub struct FakeLedger {
    pub fail_with: Option<String>,
    pub calls: AtomicUsize,
    pub last_row: Mutex<Option<(String, String)>>,
}

impl FakeLedger {
    pub fn new() -> Self {
        Self {
            fail_with: None,
            calls: AtomicUsize::new(0),
            last_row: Mutex::new(None),
        }
    }

    pub fn failing(message: &str) -> Self {
        Self {
            fail_with: Some(message.to_string()),
            calls: AtomicUsize::new(0),
            last_row: Mutex::new(None),
        }
    }
}

#[async_trait]
impl Ledger for FakeLedger {
    async fn append_row(&self, store: &str, transcript: &str) -> Result<()> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        *self.last_row.lock().unwrap() = Some((store.to_string(), transcript.to_string()));
        match &self.fail_with {
            Some(message) => Err(LojavozError::ledger(message.clone())),
            None => Ok(()),
        }
    }
}
