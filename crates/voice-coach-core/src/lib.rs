//! Voice-coach Core Library
//!
//! Recording session state machine and audio device plumbing for the
//! voice-coach client. Owns the press/hold recording modes, the metering
//! window, duration tracking, and playback coordination on top of a
//! [`AudioDevice`] implementation (CPAL capture, Hound WAV output, Rodio
//! playback).
//!
//! # Example
//!
//! ```no_run
//! use voice_coach_core::{
//!     ControllerOptions, CoreResult, CpalAudioDevice, RecordingController,
//! };
//!
//! use std::{path::PathBuf, thread::sleep, time::Duration};
//!
//! fn main() -> CoreResult<()> {
//!     let device = CpalAudioDevice::new()?;
//!     let options = ControllerOptions {
//!         server_configured: true,
//!         has_audio_permission: true,
//!         recording_dir: PathBuf::from("/tmp"),
//!     };
//!     let mut controller = RecordingController::new(device, options);
//!
//!     controller.begin_press()?;
//!     sleep(Duration::from_secs(3));
//!     controller.end_press()?;
//!
//!     println!("Recorded: {:?}", controller.recorded_file());
//!     Ok(())
//! }
//! ```

mod device;
mod error;
mod session;

pub use {
    device::{AudioDevice, CpalAudioDevice, PlayerEvent},
    error::{Result as CoreResult, SessionError},
    session::{
        ControllerOptions, MeteringWindow, PlaybackOutcome, RecordingController, RecordingMode,
        StartOutcome, StopOutcome, TtsAudio, format_duration,
    },
};
