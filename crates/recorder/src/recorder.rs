use std::io::Cursor;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tracing::debug;

use crate::capture::{AudioCapture, AudioFrame, RecordingError};

/// Filename the blob is uploaded under
pub const RECORDING_FILENAME: &str = "recording.wav";

/// Mime type of the finalized blob
pub const RECORDING_MIME: &str = "audio/wav";

/// Recorder lifecycle state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecorderState {
    Idle,
    Recording,
    Ready,
}

/// Finalized recording, ready for submission
#[derive(Debug, Clone)]
pub struct RecordingBlob {
    /// Complete WAV container bytes
    pub bytes: Vec<u8>,
}

/// Recorder state machine over an [`AudioCapture`] capability.
///
/// `idle → recording → ready → idle`; a new `start()` from `ready`
/// discards the previous blob. The input level (0–100) is published on a
/// watch channel on every received frame and reset to zero on `stop()`.
pub struct Recorder<C: AudioCapture> {
    capture: C,
    state: RecorderState,
    blob: Option<RecordingBlob>,
    level_tx: watch::Sender<f32>,
    pump: Option<JoinHandle<Vec<AudioFrame>>>,
}

impl<C: AudioCapture> Recorder<C> {
    /// Create an idle recorder over the given capture backend
    pub fn new(capture: C) -> Self {
        let (level_tx, _) = watch::channel(0.0);
        Self {
            capture,
            state: RecorderState::Idle,
            blob: None,
            level_tx,
            pump: None,
        }
    }

    /// Current state
    pub fn state(&self) -> RecorderState {
        self.state
    }

    /// Finalized blob, if any
    pub fn blob(&self) -> Option<&RecordingBlob> {
        self.blob.as_ref()
    }

    /// Move the finalized blob out (state stays `ready`)
    pub fn take_blob(&mut self) -> Option<RecordingBlob> {
        self.blob.take()
    }

    /// Subscribe to the live input-level readout
    pub fn level_watch(&self) -> watch::Receiver<f32> {
        self.level_tx.subscribe()
    }

    /// Start recording.
    ///
    /// Rejected with [`RecordingError::Busy`] while already recording, so a
    /// second capture stream is never opened. A capture failure leaves the
    /// state unchanged.
    pub async fn start(&mut self) -> Result<(), RecordingError> {
        if self.state == RecorderState::Recording {
            return Err(RecordingError::Busy);
        }

        let frames = self.capture.start().await?;

        // Starting from `ready` implicitly discards the previous blob
        self.blob = None;
        let _ = self.level_tx.send(0.0);

        let level_tx = self.level_tx.clone();
        self.pump = Some(tokio::spawn(pump_frames(frames, level_tx)));
        self.state = RecorderState::Recording;

        debug!("Recording started");
        Ok(())
    }

    /// Stop recording and finalize the buffered frames into one WAV blob.
    ///
    /// No-op from any state other than `recording`.
    pub async fn stop(&mut self) -> Result<Option<&RecordingBlob>, RecordingError> {
        if self.state != RecorderState::Recording {
            return Ok(None);
        }

        self.capture.stop().await?;

        let frames = match self.pump.take() {
            Some(pump) => pump
                .await
                .map_err(|e| RecordingError::Stream(format!("Frame pump failed: {}", e)))?,
            None => Vec::new(),
        };

        let _ = self.level_tx.send(0.0);

        let bytes = encode_wav(&frames)?;
        debug!(
            "Recording finalized - Frames: {}, Bytes: {}",
            frames.len(),
            bytes.len()
        );

        self.blob = Some(RecordingBlob { bytes });
        self.state = RecorderState::Ready;

        Ok(self.blob.as_ref())
    }
}

/// Collect frames in order, publishing a level sample per frame
async fn pump_frames(
    mut frames: mpsc::Receiver<AudioFrame>,
    level_tx: watch::Sender<f32>,
) -> Vec<AudioFrame> {
    let mut collected = Vec::new();

    while let Some(frame) = frames.recv().await {
        let _ = level_tx.send(frame_level(&frame));
        collected.push(frame);
    }

    collected
}

/// Average absolute amplitude of one frame, scaled to 0–100
fn frame_level(frame: &AudioFrame) -> f32 {
    if frame.samples.is_empty() {
        return 0.0;
    }

    let sum: f64 = frame
        .samples
        .iter()
        .map(|&s| (s as f64).abs())
        .sum();
    let mean = sum / frame.samples.len() as f64;

    ((mean / i16::MAX as f64) * 100.0).min(100.0) as f32
}

/// Finalize ordered frames into a single 16-bit PCM WAV container
fn encode_wav(frames: &[AudioFrame]) -> Result<Vec<u8>, RecordingError> {
    let (sample_rate, channels) = frames
        .first()
        .map(|f| (f.sample_rate, f.channels))
        .unwrap_or((16000, 1));

    let spec = hound::WavSpec {
        channels,
        sample_rate,
        bits_per_sample: 16,
        sample_format: hound::SampleFormat::Int,
    };

    let mut cursor = Cursor::new(Vec::new());
    {
        let mut writer = hound::WavWriter::new(&mut cursor, spec)
            .map_err(|e| RecordingError::Encode(e.to_string()))?;

        for frame in frames {
            for &sample in &frame.samples {
                writer
                    .write_sample(sample)
                    .map_err(|e| RecordingError::Encode(e.to_string()))?;
            }
        }

        writer
            .finalize()
            .map_err(|e| RecordingError::Encode(e.to_string()))?;
    }

    Ok(cursor.into_inner())
}
