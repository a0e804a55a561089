use async_trait::async_trait;
use thiserror::Error;
use tokio::sync::mpsc;

/// Recording errors
#[derive(Debug, Clone, Error)]
pub enum RecordingError {
    #[error("Microphone access denied")]
    PermissionDenied,

    #[error("No audio input device available")]
    DeviceUnavailable,

    #[error("Recording already in progress")]
    Busy,

    #[error("Audio stream error: {0}")]
    Stream(String),

    #[error("Failed to encode recording: {0}")]
    Encode(String),
}

/// One buffered fragment of captured audio (16-bit PCM, interleaved)
#[derive(Debug, Clone)]
pub struct AudioFrame {
    /// Raw samples
    pub samples: Vec<i16>,

    /// Sample rate in Hz
    pub sample_rate: u32,

    /// Number of channels
    pub channels: u16,
}

/// Configuration for audio capture
#[derive(Debug, Clone)]
pub struct CaptureConfig {
    /// Input device name (None = system default)
    pub device_name: Option<String>,

    /// How much audio each emitted frame holds
    pub flush_interval_ms: u64,
}

impl Default for CaptureConfig {
    fn default() -> Self {
        Self {
            device_name: None,
            flush_interval_ms: 200,
        }
    }
}

/// Audio capture capability
///
/// The production implementation talks to the default input device via
/// cpal; tests substitute a scripted fake so the recorder state machine
/// runs without a microphone.
#[async_trait]
pub trait AudioCapture: Send + Sync {
    /// Start capturing; returns the channel that will receive frames.
    /// The channel closes after `stop()`.
    async fn start(&mut self) -> Result<mpsc::Receiver<AudioFrame>, RecordingError>;

    /// Stop capturing and release the device
    async fn stop(&mut self) -> Result<(), RecordingError>;

    /// Whether a capture stream is currently open
    fn is_capturing(&self) -> bool;
}
