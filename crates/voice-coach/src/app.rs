use crate::{ApiClient, AppCommand, AppResult, Notifier};

use std::{path::PathBuf, time::Duration};

use tokio::sync::mpsc;
use tracing::{debug, error, info, instrument, warn};
use voice_coach_core::{
    AudioDevice, PlaybackOutcome, PlayerEvent, RecordingController, RecordingMode, StartOutcome,
    StopOutcome, TtsAudio, format_duration,
};

/// How often the metering and player channels are drained.
const DEVICE_POLL_INTERVAL: Duration = Duration::from_millis(100);

/// Main application state.
///
/// Owns the recording controller and the command channel. Recordings are
/// submitted for transcription on a background task so the event loop
/// stays responsive; the task reports back through the same channel.
pub struct App<D: AudioDevice> {
    pub(crate) controller: RecordingController<D>,
    pub(crate) api: ApiClient,
    pub(crate) notifier: Notifier,
    pub(crate) command_tx: mpsc::Sender<AppCommand>,
    pub(crate) command_rx: mpsc::Receiver<AppCommand>,
    pub(crate) transcribed_text: String,
    pub(crate) speak_transcription: bool,
}

impl<D: AudioDevice> App<D> {
    /// Run the main application event loop.
    #[instrument(skip(self))]
    pub(crate) async fn run(mut self) -> AppResult<()> {
        info!("Voice-Coach starting");

        let mut tick = tokio::time::interval(Duration::from_secs(1));
        let mut device_poll = tokio::time::interval(DEVICE_POLL_INTERVAL);

        loop {
            tokio::select! {
                Some(cmd) = self.command_rx.recv() => {
                    match cmd {
                        AppCommand::TogglePress => self.toggle_press(),
                        AppCommand::BeginHold => self.begin_hold(),
                        AppCommand::EndHold => self.end_hold(),
                        AppCommand::Send => self.send_recording(),
                        AppCommand::TogglePlayback => self.toggle_playback(),
                        AppCommand::ReplayTts => self.replay_tts(),
                        AppCommand::SetSpeak(enabled) => {
                            self.speak_transcription = enabled;
                            info!(enabled, "Speak transcription");
                        }
                        AppCommand::TranscriptionFinished { result } => {
                            self.handle_transcription_finished(result).await;
                        }
                        AppCommand::Shutdown => {
                            info!("Shutdown requested");
                            break;
                        }
                    }
                }

                _ = tick.tick() => {
                    self.controller.tick();
                    if self.controller.is_recording() {
                        debug!(
                            elapsed = %format_duration(self.controller.duration_seconds()),
                            "Recording"
                        );
                    }
                }

                _ = device_poll.tick() => {
                    if let Some(PlayerEvent::Finished) = self.controller.poll_device_events() {
                        debug!("Playback finished");
                    }
                }

                else => {
                    info!("Command channel closed, shutting down");
                    break;
                }
            }
        }

        self.controller.teardown();
        info!("Voice-Coach shut down successfully");

        Ok(())
    }

    /// Toggle a press-mode recording. The stopped recording is kept for
    /// review; `send` submits it.
    fn toggle_press(&mut self) {
        if self.controller.mode() == RecordingMode::Press {
            match self.controller.end_press() {
                Ok(StopOutcome::Stopped(path)) => {
                    info!(path = %path.display(), "Recording ready for review");
                }
                Ok(StopOutcome::Ignored) => {}
                Err(e) => {
                    error!(error = ?e, "Failed to stop recording");
                    self.notifier.error("Recording failed", &e.to_string());
                }
            }
            return;
        }

        match self.controller.begin_press() {
            Ok(StartOutcome::Started) => info!("Press recording started"),
            Ok(StartOutcome::Ignored) => debug!("Press ignored"),
            Err(e) => {
                error!(error = ?e, "Failed to start recording");
                self.notifier.error("Cannot record", &e.to_string());
            }
        }
    }

    fn begin_hold(&mut self) {
        match self.controller.begin_hold() {
            Ok(StartOutcome::Started) => info!("Hold recording started"),
            Ok(StartOutcome::Ignored) => debug!("Hold ignored"),
            Err(e) => {
                error!(error = ?e, "Failed to start recording");
                self.notifier.error("Cannot record", &e.to_string());
            }
        }
    }

    /// End a hold-mode recording and submit it immediately.
    fn end_hold(&mut self) {
        match self.controller.end_hold() {
            Ok(StopOutcome::Stopped(path)) => self.submit(path),
            Ok(StopOutcome::Ignored) => debug!("Release ignored"),
            Err(e) => {
                error!(error = ?e, "Failed to stop recording");
                self.notifier.error("Recording failed", &e.to_string());
            }
        }
    }

    /// Submit the reviewed press-mode recording.
    fn send_recording(&mut self) {
        if self.controller.is_processing() {
            debug!("Send ignored, transcription in progress");
            return;
        }
        let Some(path) = self.controller.recorded_file().map(PathBuf::from) else {
            self.notifier.info("Nothing to send", "Record something first");
            return;
        };
        self.submit(path);
    }

    /// Hand a recording to the server on a background task. The result
    /// comes back as `TranscriptionFinished` on the command channel.
    #[instrument(skip(self), fields(audio = %path.display()))]
    fn submit(&mut self, path: PathBuf) {
        self.controller.set_processing(true);

        let api = self.api.clone();
        let command_tx = self.command_tx.clone();

        tokio::task::spawn(async move {
            let result = api.transcribe(&path).await;
            if command_tx
                .send(AppCommand::TranscriptionFinished { result })
                .await
                .is_err()
            {
                warn!("Main loop gone, dropping transcription result");
            }
        });
    }

    /// Apply a finished transcription. On failure the previous text is
    /// left in place.
    pub(crate) async fn handle_transcription_finished(
        &mut self,
        result: AppResult<crate::api::TranscribeResponse>,
    ) {
        self.controller.set_processing(false);

        let response = match result {
            Ok(response) => response,
            Err(e) => {
                error!(error = ?e, "Transcription failed");
                self.notifier.error("Transcription failed", &e.to_string());
                return;
            }
        };

        info!(text_len = response.transcription.len(), "Transcription complete");
        self.transcribed_text = response.transcription;
        self.notifier.success("Transcribed", &self.transcribed_text);

        if self.speak_transcription {
            if let Some(relative) = response.tts_url {
                self.play_spoken_transcription(&relative).await;
            }
        }
    }

    async fn play_spoken_transcription(&mut self, relative: &str) {
        let url = self.api.resolve_tts_url(relative);
        let local_path = match self.api.fetch_audio(&url).await {
            Ok(path) => path,
            Err(e) => {
                error!(error = ?e, "Failed to fetch TTS audio");
                self.notifier.error("Playback failed", &e.to_string());
                return;
            }
        };

        if let Err(e) = self.controller.play_tts(TtsAudio { url, local_path }) {
            error!(error = ?e, "Failed to play TTS audio");
            self.notifier.error("Playback failed", &e.to_string());
        }
    }

    fn toggle_playback(&mut self) {
        match self.controller.play_recording() {
            Ok(PlaybackOutcome::Started) => info!("Playback started"),
            Ok(PlaybackOutcome::Stopped) => info!("Playback stopped"),
            Ok(PlaybackOutcome::Ignored) => debug!("Playback ignored"),
            Err(e) => {
                warn!(error = ?e, "Cannot play recording");
                self.notifier.info("Nothing to play", &e.to_string());
            }
        }
    }

    fn replay_tts(&mut self) {
        match self.controller.replay_tts() {
            Ok(PlaybackOutcome::Started) => info!("Replaying last audio"),
            Ok(_) => {}
            Err(e) => {
                warn!(error = ?e, "Cannot replay");
                self.notifier.info("Nothing to replay", &e.to_string());
            }
        }
    }
}
