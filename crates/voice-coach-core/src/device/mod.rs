mod cpal;

pub use cpal::CpalAudioDevice;

use crate::CoreResult;

use std::path::{Path, PathBuf};

/// Event emitted by the playback half of the device.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlayerEvent {
    /// The current playback source ran to completion.
    Finished,
}

/// Contract for the shared recorder/player device.
///
/// The underlying hardware cannot record and play simultaneously; the
/// [`RecordingController`](crate::RecordingController) enforces that mutual
/// exclusion at the transition-guard level, so implementations may assume
/// the calls arrive strictly ordered (a stop always follows a successful
/// start, never two concurrent starts).
pub trait AudioDevice {
    /// Start capturing microphone audio into a WAV file at `path`.
    ///
    /// Returns the path the recording is being written to.
    fn start_recorder(&mut self, path: &Path) -> CoreResult<PathBuf>;

    /// Stop the active capture and finalize the WAV file.
    ///
    /// Returns the path of the finished recording.
    fn stop_recorder(&mut self) -> CoreResult<PathBuf>;

    /// Start playing the audio file at `source`.
    fn start_player(&mut self, source: &Path) -> CoreResult<()>;

    /// Stop any active playback. A no-op when nothing is playing.
    fn stop_player(&mut self) -> CoreResult<()>;

    /// Drain metering readings (dBFS) produced since the last poll.
    ///
    /// Readings are best-effort and may be skipped or coalesced; they feed
    /// the display-only waveform and have no correctness impact.
    fn poll_metering(&mut self) -> Vec<f32>;

    /// Poll for a playback completion event.
    fn poll_player(&mut self) -> Option<PlayerEvent>;
}
