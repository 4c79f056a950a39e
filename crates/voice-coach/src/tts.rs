//! Speech synthesis flow.
//!
//! Sends text to the server, downloads the synthesized audio, and plays it
//! through the recording controller so playback rules (one player at a
//! time, replayable last audio) hold here too.

use crate::{ApiClient, AppError, AppResult, Notifier};

use std::panic::Location;

use error_location::ErrorLocation;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::{info, instrument};
use voice_coach_core::{AudioDevice, RecordingController, TtsAudio};

/// State for the interactive speech synthesis flow.
pub struct TtsFlow<D: AudioDevice> {
    pub(crate) api: ApiClient,
    pub(crate) controller: RecordingController<D>,
    pub(crate) notifier: Notifier,
}

impl<D: AudioDevice> TtsFlow<D> {
    /// Create a flow over the given client and controller.
    pub fn new(api: ApiClient, controller: RecordingController<D>, notifier: Notifier) -> Self {
        Self {
            api,
            controller,
            notifier,
        }
    }

    /// Synthesize and play the given text. Any audio already playing is
    /// stopped first; the new audio becomes the replay target.
    #[instrument(skip(self, text))]
    pub async fn speak(&mut self, text: &str) -> AppResult<()> {
        let trimmed = text.trim();
        if trimmed.is_empty() {
            return Err(AppError::Validation {
                reason: "Nothing to speak".to_string(),
                location: ErrorLocation::from(Location::caller()),
            });
        }

        let response = self.api.tts(trimmed).await?;
        let url = self.api.resolve_tts_url(&response.tts_url);
        let local_path = self.api.fetch_audio(&url).await?;

        self.controller.play_tts(TtsAudio { url, local_path })?;
        info!(text_len = trimmed.len(), "Speaking");
        Ok(())
    }

    /// Replay the last synthesized audio.
    #[instrument(skip(self))]
    pub fn replay(&mut self) -> AppResult<()> {
        self.controller.replay_tts()?;
        Ok(())
    }

    /// Stop playback if any audio is playing.
    pub fn stop(&mut self) -> AppResult<()> {
        Ok(self.controller.stop_playback()?)
    }

    /// Interactive loop: each line is spoken, `replay` replays, `quit`
    /// exits.
    #[instrument(skip(self))]
    pub async fn run(mut self) -> AppResult<()> {
        println!("Type text to speak. Commands: replay, stop, quit");

        let mut lines = BufReader::new(tokio::io::stdin()).lines();
        while let Some(line) = lines.next_line().await? {
            match line.trim() {
                "quit" | "q" => break,
                "replay" => {
                    if let Err(e) = self.replay() {
                        self.notifier.info("Nothing to replay", &e.to_string());
                    }
                }
                "stop" => {
                    if let Err(e) = self.stop() {
                        self.notifier.error("Playback failed", &e.to_string());
                    }
                }
                "" => {}
                text => {
                    if let Err(e) = self.speak(text).await {
                        self.notifier.error("Speech failed", &e.to_string());
                    }
                }
            }
        }

        self.controller.teardown();
        Ok(())
    }
}
