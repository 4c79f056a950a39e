//! Recording session state machine.
//!
//! Governs the two recording interaction modes (press-to-toggle and
//! hold-to-record), playback of recorded and TTS audio, and the metering /
//! duration sampling that feeds the display. All state transitions go
//! through the controller; handlers never mutate flags directly.

use crate::{
    CoreResult, SessionError,
    device::{AudioDevice, PlayerEvent},
    session::MeteringWindow,
};

use std::{
    panic::Location,
    path::{Path, PathBuf},
    time::{Instant, SystemTime, UNIX_EPOCH},
};

use error_location::ErrorLocation;
use tracing::{debug, info, instrument, warn};
use uuid::Uuid;

/// Active recording mode. Press and Hold are mutually exclusive.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordingMode {
    /// Not recording.
    None,
    /// Tap-to-start, tap-to-stop; requires an explicit send afterwards.
    Press,
    /// Press-and-hold; auto-submits on release.
    Hold,
}

/// Result of a begin-recording request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StartOutcome {
    /// Recording started; a fresh session is active.
    Started,
    /// The request was dropped by a guard (already recording, playback or
    /// processing active). Not an error: rapid gesture sequences are
    /// expected to produce these.
    Ignored,
}

/// Result of an end-recording request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StopOutcome {
    /// Recording stopped; the finished file is at this path.
    Stopped(PathBuf),
    /// Stop did not match the active mode (or nothing was recording).
    Ignored,
}

/// Result of a playback toggle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlaybackOutcome {
    /// Playback started.
    Started,
    /// An active playback was stopped.
    Stopped,
    /// Dropped by a guard (a recording mode is active).
    Ignored,
}

/// Synthesized speech retained for replay.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TtsAudio {
    /// Absolute URL the audio was resolved from.
    pub url: String,
    /// Local file the audio was downloaded to for playback.
    pub local_path: PathBuf,
}

/// Construction-time state for [`RecordingController`].
///
/// Both flags are captured once at mount and are read-only afterwards;
/// there is no re-request flow on a denied permission.
#[derive(Debug, Clone)]
pub struct ControllerOptions {
    /// Whether a server URL is configured. Recording is disabled without one.
    pub server_configured: bool,
    /// Whether microphone access was granted.
    pub has_audio_permission: bool,
    /// Directory fresh recording files are created in.
    pub recording_dir: PathBuf,
}

/// Recording session controller.
///
/// Owns the audio device and every flag of the session. Transition rules:
///
/// - `in_progress` is set synchronously before the device start call and is
///   the double-start guard; the mode flag becomes active only after the
///   device call succeeds, and is rolled back on failure.
/// - Stops are validated against the mode-specific flag: releasing "hold"
///   while "press" is active is a no-op, and vice versa.
/// - Recording and playback are mutually exclusive at the guard level; the
///   device cannot do both at once.
pub struct RecordingController<D: AudioDevice> {
    device: D,
    mode: RecordingMode,
    in_progress: bool,
    playing: bool,
    processing: bool,
    server_configured: bool,
    has_audio_permission: bool,
    recording_dir: PathBuf,
    recorded_file: Option<PathBuf>,
    started_at: Option<Instant>,
    duration_seconds: u64,
    metering: MeteringWindow,
    last_tts: Option<TtsAudio>,
    session_id: Option<Uuid>,
}

impl<D: AudioDevice> RecordingController<D> {
    /// Create a controller around a device.
    pub fn new(device: D, options: ControllerOptions) -> Self {
        Self {
            device,
            mode: RecordingMode::None,
            in_progress: false,
            playing: false,
            processing: false,
            server_configured: options.server_configured,
            has_audio_permission: options.has_audio_permission,
            recording_dir: options.recording_dir,
            recorded_file: None,
            started_at: None,
            duration_seconds: 0,
            metering: MeteringWindow::new(),
            last_tts: None,
            session_id: None,
        }
    }

    /// Start a press-mode recording (tap to start, tap again to stop).
    #[track_caller]
    #[instrument(skip(self))]
    pub fn begin_press(&mut self) -> CoreResult<StartOutcome> {
        self.begin(RecordingMode::Press)
    }

    /// Start a hold-mode recording (released via [`end_hold`]).
    ///
    /// [`end_hold`]: RecordingController::end_hold
    #[track_caller]
    #[instrument(skip(self))]
    pub fn begin_hold(&mut self) -> CoreResult<StartOutcome> {
        self.begin(RecordingMode::Hold)
    }

    /// Stop a press-mode recording. The file is retained for review; it is
    /// never submitted automatically.
    #[track_caller]
    #[instrument(skip(self))]
    pub fn end_press(&mut self) -> CoreResult<StopOutcome> {
        self.end(RecordingMode::Press)
    }

    /// Stop a hold-mode recording. A `Stopped` outcome carries the path the
    /// caller must submit for transcription immediately, with no
    /// confirmation step.
    #[track_caller]
    #[instrument(skip(self))]
    pub fn end_hold(&mut self) -> CoreResult<StopOutcome> {
        self.end(RecordingMode::Hold)
    }

    #[track_caller]
    fn begin(&mut self, mode: RecordingMode) -> CoreResult<StartOutcome> {
        if !self.server_configured {
            return Err(SessionError::ServerUrlNotSet {
                location: ErrorLocation::from(Location::caller()),
            });
        }
        if !self.has_audio_permission {
            return Err(SessionError::PermissionDenied {
                location: ErrorLocation::from(Location::caller()),
            });
        }

        // Synchronous double-start guard. Gesture events can arrive while a
        // previous start is still settling; the mode flag alone is too late
        // to catch that.
        if self.in_progress {
            debug!(?mode, "Recording already in progress, ignoring start");
            return Ok(StartOutcome::Ignored);
        }
        if self.mode != RecordingMode::None {
            debug!(?mode, active = ?self.mode, "Already recording, ignoring start");
            return Ok(StartOutcome::Ignored);
        }
        if self.playing || self.processing {
            debug!(?mode, "Playback or processing active, ignoring start");
            return Ok(StartOutcome::Ignored);
        }

        let session_id = Uuid::new_v4();
        let path = self.fresh_recording_path();

        // Guard set before the device call; rolled back on failure below.
        self.in_progress = true;

        let path = match self.device.start_recorder(&path) {
            Ok(p) => p,
            Err(e) => {
                // The mode flag must never claim "recording" if the device
                // call failed.
                self.cleanup_recording();
                return Err(e);
            }
        };

        self.duration_seconds = 0;
        self.started_at = Some(Instant::now());
        self.metering.reset();
        self.mode = mode;
        self.session_id = Some(session_id);

        // A new recording invalidates the previous one.
        self.recorded_file = None;

        info!(session_id = %session_id, ?mode, path = ?path, "Recording started");

        Ok(StartOutcome::Started)
    }

    fn end(&mut self, mode: RecordingMode) -> CoreResult<StopOutcome> {
        if self.mode != mode || !self.in_progress {
            debug!(?mode, active = ?self.mode, "Stop does not match active mode, ignoring");
            return Ok(StopOutcome::Ignored);
        }

        let session_id = self.session_id.take();
        let elapsed = self.started_at.map(|t| t.elapsed());

        match self.device.stop_recorder() {
            Ok(path) => {
                self.cleanup_recording();
                self.mode = RecordingMode::None;
                self.recorded_file = Some(path.clone());

                if let (Some(id), Some(elapsed)) = (session_id, elapsed) {
                    info!(
                        session_id = %id,
                        duration_ms = elapsed.as_millis(),
                        path = ?path,
                        "Recording stopped"
                    );
                }

                Ok(StopOutcome::Stopped(path))
            }
            Err(e) => {
                self.cleanup_recording();
                self.mode = RecordingMode::None;
                Err(e)
            }
        }
    }

    /// Toggle playback of the most recent recording.
    ///
    /// Starting while already playing first stops the current playback;
    /// there are never two concurrent playbacks.
    #[track_caller]
    #[instrument(skip(self))]
    pub fn play_recording(&mut self) -> CoreResult<PlaybackOutcome> {
        // Guard before the file lookup: while recording, a play gesture is
        // uniformly ignored rather than surfacing a missing-file error.
        if self.mode != RecordingMode::None || self.in_progress {
            debug!("Recording active, ignoring playback request");
            return Ok(PlaybackOutcome::Ignored);
        }

        let path = self
            .recorded_file
            .clone()
            .ok_or(SessionError::NoRecordingAvailable {
                location: ErrorLocation::from(Location::caller()),
            })?;

        if self.playing {
            self.device.stop_player()?;
            self.playing = false;
            info!("Playback stopped");
            return Ok(PlaybackOutcome::Stopped);
        }

        self.device.start_player(&path)?;
        self.playing = true;
        info!(path = ?path, "Playing recording");

        Ok(PlaybackOutcome::Started)
    }

    /// Play synthesized speech and retain it for replay.
    ///
    /// The audio is retained even if playback fails, so a later replay can
    /// still be attempted.
    #[track_caller]
    #[instrument(skip(self, audio))]
    pub fn play_tts(&mut self, audio: TtsAudio) -> CoreResult<PlaybackOutcome> {
        if self.mode != RecordingMode::None || self.in_progress {
            debug!("Recording active, ignoring TTS playback request");
            return Ok(PlaybackOutcome::Ignored);
        }

        let path = audio.local_path.clone();
        let url = audio.url.clone();
        self.last_tts = Some(audio);

        if self.playing {
            self.device.stop_player()?;
            self.playing = false;
        }

        match self.device.start_player(&path) {
            Ok(()) => {
                self.playing = true;
                info!(url = %url, "Playing TTS audio");
                Ok(PlaybackOutcome::Started)
            }
            Err(e) => {
                self.playing = false;
                Err(e)
            }
        }
    }

    /// Replay the last TTS audio.
    #[track_caller]
    #[instrument(skip(self))]
    pub fn replay_tts(&mut self) -> CoreResult<PlaybackOutcome> {
        let audio = self.last_tts.clone().ok_or(SessionError::NoTtsAudio {
            location: ErrorLocation::from(Location::caller()),
        })?;
        self.play_tts(audio)
    }

    /// Stop any active playback.
    #[instrument(skip(self))]
    pub fn stop_playback(&mut self) -> CoreResult<()> {
        if self.playing {
            self.device.stop_player()?;
            self.playing = false;
            info!("Playback stopped");
        }
        Ok(())
    }

    /// Record a playback completion reported by the device.
    pub fn playback_finished(&mut self) {
        if self.playing {
            self.playing = false;
            debug!("Playback finished");
        }
    }

    /// Sample the wall-clock recording duration.
    ///
    /// Driven by a 1-second interval; uses elapsed wall-clock time rather
    /// than a tick count so the display stays accurate under scheduling
    /// jitter.
    pub fn tick(&mut self) {
        if let Some(started_at) = self.started_at {
            self.duration_seconds = started_at.elapsed().as_secs();
        }
    }

    /// Push a raw dBFS metering reading into the waveform window.
    ///
    /// Readings arriving outside an active recording are dropped.
    pub fn push_metering_db(&mut self, db: f32) {
        if self.in_progress {
            self.metering.push_db(db);
        }
    }

    /// Drain device callbacks: metering readings into the waveform window,
    /// and playback completion into the playing flag.
    pub fn poll_device_events(&mut self) -> Option<PlayerEvent> {
        for db in self.device.poll_metering() {
            if self.in_progress {
                self.metering.push_db(db);
            }
        }
        match self.device.poll_player() {
            Some(PlayerEvent::Finished) => {
                self.playback_finished();
                Some(PlayerEvent::Finished)
            }
            None => None,
        }
    }

    /// Mark a transcription submission as in flight (or complete).
    ///
    /// While set, begin-recording requests are ignored and the app must not
    /// issue another submit.
    pub fn set_processing(&mut self, processing: bool) {
        self.processing = processing;
    }

    /// Release the device unconditionally.
    ///
    /// Stops the recorder if a recording is in progress, stops the player,
    /// and resets every flag. Called on teardown so no native resource
    /// outlives the controller; failures are logged and swallowed because
    /// there is nothing left to roll back to.
    #[instrument(skip(self))]
    pub fn teardown(&mut self) {
        if self.in_progress {
            if let Err(e) = self.device.stop_recorder() {
                warn!(error = %e, "Failed to stop recorder during teardown");
            }
        }
        if let Err(e) = self.device.stop_player() {
            warn!(error = %e, "Failed to stop player during teardown");
        }
        self.cleanup_recording();
        self.mode = RecordingMode::None;
        self.playing = false;
        self.processing = false;

        info!("Recording session torn down");
    }

    /// Active recording mode.
    pub fn mode(&self) -> RecordingMode {
        self.mode
    }

    /// Whether any recording mode is active.
    pub fn is_recording(&self) -> bool {
        self.mode != RecordingMode::None
    }

    /// Whether playback is active.
    pub fn is_playing(&self) -> bool {
        self.playing
    }

    /// Whether a transcription submission is in flight.
    pub fn is_processing(&self) -> bool {
        self.processing
    }

    /// Seconds of wall-clock time the active recording has run.
    pub fn duration_seconds(&self) -> u64 {
        self.duration_seconds
    }

    /// The waveform metering window.
    pub fn metering(&self) -> &MeteringWindow {
        &self.metering
    }

    /// Path of the most recently finished recording, if any.
    pub fn recorded_file(&self) -> Option<&Path> {
        self.recorded_file.as_deref()
    }

    /// The last TTS audio, retained across recordings for replay.
    pub fn last_tts(&self) -> Option<&TtsAudio> {
        self.last_tts.as_ref()
    }

    fn fresh_recording_path(&self) -> PathBuf {
        let timestamp = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_millis())
            .unwrap_or_default();
        self.recording_dir
            .join(format!("recording_{}.wav", timestamp))
    }

    /// Clear timer, metering, and the in-progress guard. Shared by every
    /// stop path, including error paths.
    fn cleanup_recording(&mut self) {
        self.duration_seconds = 0;
        self.started_at = None;
        self.metering.reset();
        self.in_progress = false;
        self.session_id = None;
    }
}

/// Format a duration in seconds as `MM:SS` for the timer display.
pub fn format_duration(seconds: u64) -> String {
    format!("{:02}:{:02}", seconds / 60, seconds % 60)
}
