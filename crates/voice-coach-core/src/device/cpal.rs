use crate::{
    CoreResult, SessionError,
    device::{AudioDevice, PlayerEvent},
};

use std::{
    fs::File,
    io::{BufReader, BufWriter},
    panic::Location,
    path::{Path, PathBuf},
    sync::{
        Arc, Mutex,
        atomic::{AtomicBool, Ordering},
        mpsc::{Receiver, Sender, channel},
    },
    thread::JoinHandle,
    time::Duration,
};

use cpal::{
    Device, Stream, StreamConfig,
    traits::{DeviceTrait, HostTrait, StreamTrait},
};
use error_location::ErrorLocation;
use hound::{SampleFormat, WavSpec, WavWriter};
use rodio::{Decoder, OutputStream, Sink};
use tracing::{debug, error, info, instrument, warn};

type WavWriterHandle = Arc<Mutex<Option<WavWriter<BufWriter<File>>>>>;

/// Silence floor reported when a buffer has no measurable signal.
const SILENCE_DB: f32 = -60.0;

/// Interval at which the playback thread checks the stop flag.
const PLAYER_POLL_INTERVAL: Duration = Duration::from_millis(50);

/// CPAL-backed recorder and Rodio-backed player.
///
/// Capture runs on the CPAL audio callback thread, writing 16-bit WAV via
/// Hound and publishing a per-buffer RMS dBFS level on a channel the
/// controller drains for the waveform display. Playback runs on its own
/// thread holding the Rodio output stream, with an atomic stop flag and a
/// completion channel, so the device itself stays `Send`.
pub struct CpalAudioDevice {
    device: Device,
    config: StreamConfig,
    stream: Option<Stream>,
    writer: WavWriterHandle,
    recording_path: Option<PathBuf>,
    /// Signals the capture callback to stop writing. Set to `true` before
    /// dropping the stream to ensure no in-flight callback writes after
    /// the writer is finalized in `stop_recorder()`.
    shutdown: Arc<AtomicBool>,
    metering_rx: Option<Receiver<f32>>,
    player_stop: Option<Arc<AtomicBool>>,
    player_done_rx: Option<Receiver<()>>,
    player_handle: Option<JoinHandle<()>>,
}

impl CpalAudioDevice {
    /// Open the default input device.
    #[track_caller]
    #[instrument]
    pub fn new() -> CoreResult<Self> {
        let host = cpal::default_host();

        let device = host
            .default_input_device()
            .ok_or(SessionError::DeviceFailure {
                reason: "No microphone found".to_string(),
                location: ErrorLocation::from(Location::caller()),
            })?;

        let config = device
            .default_input_config()
            .map_err(|e| SessionError::DeviceFailure {
                reason: format!("Failed to get config: {}", e),
                location: ErrorLocation::from(Location::caller()),
            })?;

        info!(
            sample_rate = config.sample_rate(),
            channels = config.channels(),
            "Audio device initialized"
        );

        Ok(Self {
            device,
            config: config.into(),
            stream: None,
            writer: Arc::new(Mutex::new(None)),
            recording_path: None,
            shutdown: Arc::new(AtomicBool::new(false)),
            metering_rx: None,
            player_stop: None,
            player_done_rx: None,
            player_handle: None,
        })
    }

    fn wav_spec(&self) -> WavSpec {
        WavSpec {
            channels: self.config.channels,
            sample_rate: self.config.sample_rate,
            bits_per_sample: 16,
            sample_format: SampleFormat::Int,
        }
    }
}

/// RMS level of a sample buffer in dBFS.
fn buffer_level_db(data: &[f32]) -> f32 {
    if data.is_empty() {
        return SILENCE_DB;
    }
    let mean_square: f32 = data.iter().map(|s| s * s).sum::<f32>() / data.len() as f32;
    let rms = mean_square.sqrt();
    if rms <= 0.0 {
        SILENCE_DB
    } else {
        (20.0 * rms.log10()).max(SILENCE_DB)
    }
}

impl AudioDevice for CpalAudioDevice {
    #[track_caller]
    #[instrument(skip(self))]
    fn start_recorder(&mut self, path: &Path) -> CoreResult<PathBuf> {
        let spec = self.wav_spec();
        let wav_writer =
            WavWriter::create(path, spec).map_err(|e| SessionError::DeviceFailure {
                reason: format!("Failed to create WAV file: {}", e),
                location: ErrorLocation::from(Location::caller()),
            })?;

        {
            let mut writer = self.writer.lock().unwrap_or_else(|e| {
                error!("Writer lock poisoned, recovering: {}", e);
                e.into_inner()
            });
            *writer = Some(wav_writer);
        }

        // Reset shutdown flag for the new recording session
        self.shutdown.store(false, Ordering::Release);

        let (metering_tx, metering_rx): (Sender<f32>, Receiver<f32>) = channel();
        let writer = Arc::clone(&self.writer);
        let shutdown = Arc::clone(&self.shutdown);

        let stream = self
            .device
            .build_input_stream(
                &self.config,
                move |data: &[f32], _: &cpal::InputCallbackInfo| {
                    // Check shutdown flag before acquiring the lock: once
                    // stop_recorder() sets it, no new samples are written
                    // even if CPAL fires one more callback before the
                    // stream is dropped.
                    if shutdown.load(Ordering::Acquire) {
                        return;
                    }
                    // Recover from lock poison rather than silently
                    // dropping audio; the writer is still valid.
                    let mut guard = writer.lock().unwrap_or_else(|e| {
                        error!("Writer lock poisoned, recovering: {}", e);
                        e.into_inner()
                    });
                    if let Some(w) = guard.as_mut() {
                        for &sample in data {
                            let value = (sample.clamp(-1.0, 1.0) * i16::MAX as f32) as i16;
                            if let Err(e) = w.write_sample(value) {
                                error!("Failed to write sample: {}", e);
                                return;
                            }
                        }
                    }
                    // Best-effort metering; a full or closed channel just
                    // skips this reading.
                    let _ = metering_tx.send(buffer_level_db(data));
                },
                |err| {
                    error!("Audio stream error: {}", err);
                },
                None,
            )
            .map_err(|e| SessionError::DeviceFailure {
                reason: format!("Failed to build stream: {}", e),
                location: ErrorLocation::from(Location::caller()),
            })?;

        stream.play().map_err(|e| SessionError::DeviceFailure {
            reason: format!("Failed to start stream: {}", e),
            location: ErrorLocation::from(Location::caller()),
        })?;

        self.stream = Some(stream);
        self.metering_rx = Some(metering_rx);
        self.recording_path = Some(path.to_path_buf());

        info!(path = ?path, "Audio capture started");

        Ok(path.to_path_buf())
    }

    #[track_caller]
    #[instrument(skip(self))]
    fn stop_recorder(&mut self) -> CoreResult<PathBuf> {
        // Signal the callback to stop writing BEFORE dropping the stream,
        // so no callback touches the writer after it is finalized below.
        self.shutdown.store(true, Ordering::Release);

        if let Some(stream) = self.stream.take() {
            drop(stream);
            // Brief yield so any in-flight callback observes the shutdown
            // flag before the writer is taken. On most CPAL backends drop()
            // joins the audio thread and this is redundant.
            std::thread::sleep(Duration::from_millis(5));
        }
        self.metering_rx = None;

        let wav_writer = {
            let mut guard = self.writer.lock().unwrap_or_else(|e| {
                error!("Writer lock poisoned, recovering: {}", e);
                e.into_inner()
            });
            guard.take()
        };

        let path = self
            .recording_path
            .take()
            .ok_or(SessionError::DeviceFailure {
                reason: "No recording in progress".to_string(),
                location: ErrorLocation::from(Location::caller()),
            })?;

        match wav_writer {
            Some(w) => w.finalize().map_err(|e| SessionError::DeviceFailure {
                reason: format!("Failed to finalize WAV file: {}", e),
                location: ErrorLocation::from(Location::caller()),
            })?,
            None => {
                return Err(SessionError::DeviceFailure {
                    reason: "No recording in progress".to_string(),
                    location: ErrorLocation::from(Location::caller()),
                });
            }
        }

        info!(path = ?path, "Audio capture stopped");

        Ok(path)
    }

    #[track_caller]
    #[instrument(skip(self))]
    fn start_player(&mut self, source: &Path) -> CoreResult<()> {
        // Open the file here so a missing path fails the transition rather
        // than the playback thread.
        let file = File::open(source).map_err(|e| SessionError::DeviceFailure {
            reason: format!("Failed to open audio file: {}", e),
            location: ErrorLocation::from(Location::caller()),
        })?;

        let stop = Arc::new(AtomicBool::new(false));
        let (done_tx, done_rx) = channel();
        let thread_stop = Arc::clone(&stop);
        let path = source.to_path_buf();

        // Rodio's output stream is not Send; it lives entirely on this
        // thread. The handle signals completion over the done channel.
        let handle = std::thread::spawn(move || {
            let (_output, handle) = match OutputStream::try_default() {
                Ok(pair) => pair,
                Err(e) => {
                    error!(path = ?path, "Failed to open output stream: {}", e);
                    let _ = done_tx.send(());
                    return;
                }
            };
            let sink = match Sink::try_new(&handle) {
                Ok(sink) => sink,
                Err(e) => {
                    error!(path = ?path, "Failed to create sink: {}", e);
                    let _ = done_tx.send(());
                    return;
                }
            };
            match Decoder::new(BufReader::new(file)) {
                Ok(decoder) => sink.append(decoder),
                Err(e) => {
                    error!(path = ?path, "Failed to decode audio: {}", e);
                    let _ = done_tx.send(());
                    return;
                }
            }

            loop {
                if thread_stop.load(Ordering::Acquire) {
                    sink.stop();
                    break;
                }
                if sink.empty() {
                    break;
                }
                std::thread::sleep(PLAYER_POLL_INTERVAL);
            }

            debug!(path = ?path, "Playback thread finished");
            let _ = done_tx.send(());
        });

        self.player_stop = Some(stop);
        self.player_done_rx = Some(done_rx);
        self.player_handle = Some(handle);

        info!(source = ?source, "Playback started");

        Ok(())
    }

    #[instrument(skip(self))]
    fn stop_player(&mut self) -> CoreResult<()> {
        if let Some(stop) = self.player_stop.take() {
            stop.store(true, Ordering::Release);
        }
        if let Some(handle) = self.player_handle.take() {
            if handle.join().is_err() {
                warn!("Playback thread panicked");
            }
        }
        self.player_done_rx = None;

        Ok(())
    }

    fn poll_metering(&mut self) -> Vec<f32> {
        match self.metering_rx.as_ref() {
            Some(rx) => rx.try_iter().collect(),
            None => Vec::new(),
        }
    }

    fn poll_player(&mut self) -> Option<PlayerEvent> {
        let rx = self.player_done_rx.as_ref()?;
        if rx.try_recv().is_ok() {
            self.player_done_rx = None;
            self.player_stop = None;
            if let Some(handle) = self.player_handle.take() {
                if handle.join().is_err() {
                    warn!("Playback thread panicked");
                }
            }
            Some(PlayerEvent::Finished)
        } else {
            None
        }
    }
}

impl Drop for CpalAudioDevice {
    fn drop(&mut self) {
        // Backstop for teardown: make sure the capture callback and the
        // playback thread both observe shutdown.
        self.shutdown.store(true, Ordering::Release);
        if let Some(stop) = self.player_stop.take() {
            stop.store(true, Ordering::Release);
        }
    }
}
