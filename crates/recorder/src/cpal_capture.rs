use async_trait::async_trait;
use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use cpal::{
    BackendSpecificError, BuildStreamError, DefaultStreamConfigError, FromSample, Sample,
    SampleFormat, SizedSample,
};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::mpsc;
use tracing::warn;

use crate::capture::{AudioCapture, AudioFrame, CaptureConfig, RecordingError};

/// Frames buffered in the channel before the audio thread starts dropping
const CHANNEL_CAPACITY: usize = 64;

struct Session {
    stop: Arc<AtomicBool>,
    thread: Option<std::thread::JoinHandle<()>>,
}

/// Microphone capture against the default (or named) cpal input device.
///
/// The cpal stream is owned by a dedicated thread; the audio callback
/// converts samples to 16-bit PCM and emits one frame per flush interval.
pub struct CpalCapture {
    config: CaptureConfig,
    session: Option<Session>,
}

impl CpalCapture {
    /// Create capture with the given configuration
    pub fn new(config: CaptureConfig) -> Self {
        Self {
            config,
            session: None,
        }
    }
}

impl Default for CpalCapture {
    fn default() -> Self {
        Self::new(CaptureConfig::default())
    }
}

#[async_trait]
impl AudioCapture for CpalCapture {
    async fn start(&mut self) -> Result<mpsc::Receiver<AudioFrame>, RecordingError> {
        if self.session.is_some() {
            return Err(RecordingError::Busy);
        }

        let (tx, rx) = mpsc::channel(CHANNEL_CAPACITY);
        let (ready_tx, ready_rx) = std::sync::mpsc::channel();
        let stop = Arc::new(AtomicBool::new(false));

        let device_name = self.config.device_name.clone();
        let flush_interval_ms = self.config.flush_interval_ms;
        let thread_stop = Arc::clone(&stop);

        let thread = std::thread::spawn(move || {
            run_capture(device_name, flush_interval_ms, tx, ready_tx, thread_stop);
        });

        match ready_rx.recv() {
            Ok(Ok(())) => {
                self.session = Some(Session {
                    stop,
                    thread: Some(thread),
                });
                Ok(rx)
            }
            Ok(Err(e)) => {
                let _ = thread.join();
                Err(e)
            }
            Err(_) => {
                let _ = thread.join();
                Err(RecordingError::Stream(
                    "Capture thread terminated unexpectedly".to_string(),
                ))
            }
        }
    }

    async fn stop(&mut self) -> Result<(), RecordingError> {
        let Some(mut session) = self.session.take() else {
            return Ok(());
        };

        session.stop.store(true, Ordering::Relaxed);
        if let Some(thread) = session.thread.take() {
            thread
                .join()
                .map_err(|_| RecordingError::Stream("Capture thread panicked".to_string()))?;
        }

        Ok(())
    }

    fn is_capturing(&self) -> bool {
        self.session.is_some()
    }
}

/// Capture thread body: open the device, pump frames until told to stop,
/// then flush whatever tail is left in the buffer
fn run_capture(
    device_name: Option<String>,
    flush_interval_ms: u64,
    tx: mpsc::Sender<AudioFrame>,
    ready_tx: std::sync::mpsc::Sender<Result<(), RecordingError>>,
    stop: Arc<AtomicBool>,
) {
    let host = cpal::default_host();

    let device = match &device_name {
        Some(name) => host.input_devices().ok().and_then(|mut devices| {
            devices.find(|d| d.name().map(|n| &n == name).unwrap_or(false))
        }),
        None => host.default_input_device(),
    };

    let Some(device) = device else {
        let _ = ready_tx.send(Err(RecordingError::DeviceUnavailable));
        return;
    };

    let supported = match device.default_input_config() {
        Ok(c) => c,
        Err(e) => {
            let _ = ready_tx.send(Err(map_config_error(e)));
            return;
        }
    };

    let sample_format = supported.sample_format();
    let config = supported.config();
    let sample_rate = config.sample_rate.0;
    let channels = config.channels;
    let flush_samples =
        (sample_rate as usize * channels as usize * flush_interval_ms as usize) / 1000;

    let buffer: Arc<Mutex<Vec<i16>>> = Arc::new(Mutex::new(Vec::new()));

    let stream = match sample_format {
        SampleFormat::I16 => build_stream::<i16>(
            &device, &config, &buffer, &tx, flush_samples, sample_rate, channels,
        ),
        SampleFormat::U16 => build_stream::<u16>(
            &device, &config, &buffer, &tx, flush_samples, sample_rate, channels,
        ),
        SampleFormat::F32 => build_stream::<f32>(
            &device, &config, &buffer, &tx, flush_samples, sample_rate, channels,
        ),
        other => Err(RecordingError::Stream(format!(
            "Unsupported sample format: {:?}",
            other
        ))),
    };

    let stream = match stream {
        Ok(s) => s,
        Err(e) => {
            let _ = ready_tx.send(Err(e));
            return;
        }
    };

    if let Err(e) = stream.play() {
        let _ = ready_tx.send(Err(RecordingError::Stream(e.to_string())));
        return;
    }

    let _ = ready_tx.send(Ok(()));

    while !stop.load(Ordering::Relaxed) {
        std::thread::sleep(Duration::from_millis(50));
    }

    // Dropping the stream releases the device before the tail flush
    drop(stream);

    let tail: Vec<i16> = std::mem::take(&mut *buffer.lock().unwrap());
    if !tail.is_empty() {
        let _ = tx.blocking_send(AudioFrame {
            samples: tail,
            sample_rate,
            channels,
        });
    }
}

fn build_stream<T>(
    device: &cpal::Device,
    config: &cpal::StreamConfig,
    buffer: &Arc<Mutex<Vec<i16>>>,
    tx: &mpsc::Sender<AudioFrame>,
    flush_samples: usize,
    sample_rate: u32,
    channels: u16,
) -> Result<cpal::Stream, RecordingError>
where
    T: SizedSample,
    i16: FromSample<T>,
{
    let buffer = Arc::clone(buffer);
    let tx = tx.clone();

    let err_fn = |err: cpal::StreamError| {
        warn!("Audio stream error: {}", err);
    };

    device
        .build_input_stream(
            config,
            move |data: &[T], _: &cpal::InputCallbackInfo| {
                let mut buf = buffer.lock().unwrap();
                buf.extend(data.iter().map(|&s| i16::from_sample(s)));

                while buf.len() >= flush_samples {
                    let samples: Vec<i16> = buf.drain(..flush_samples).collect();
                    // try_send so the audio callback never blocks; a full
                    // channel drops the frame
                    let _ = tx.try_send(AudioFrame {
                        samples,
                        sample_rate,
                        channels,
                    });
                }
            },
            err_fn,
            None,
        )
        .map_err(map_build_error)
}

fn map_config_error(e: DefaultStreamConfigError) -> RecordingError {
    match e {
        DefaultStreamConfigError::DeviceNotAvailable => RecordingError::DeviceUnavailable,
        DefaultStreamConfigError::BackendSpecific { err } => backend_error(err),
        other => RecordingError::Stream(other.to_string()),
    }
}

fn map_build_error(e: BuildStreamError) -> RecordingError {
    match e {
        BuildStreamError::DeviceNotAvailable => RecordingError::DeviceUnavailable,
        BuildStreamError::BackendSpecific { err } => backend_error(err),
        other => RecordingError::Stream(other.to_string()),
    }
}

fn backend_error(err: BackendSpecificError) -> RecordingError {
    let description = err.description.to_lowercase();
    if description.contains("denied") || description.contains("permission") {
        RecordingError::PermissionDenied
    } else {
        RecordingError::Stream(err.description)
    }
}
