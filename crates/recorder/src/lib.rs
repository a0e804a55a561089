//! Lojavoz recorder
//!
//! Microphone capture behind a capability trait, plus the
//! idle → recording → ready state machine that turns captured frames
//! into a single uploadable WAV blob

pub mod capture;
pub mod cpal_capture;
pub mod recorder;

// Re-export main types
pub use capture::{AudioCapture, AudioFrame, CaptureConfig, RecordingError};
pub use cpal_capture::CpalCapture;
pub use recorder::{Recorder, RecorderState, RecordingBlob, RECORDING_FILENAME, RECORDING_MIME};
