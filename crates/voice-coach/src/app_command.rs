use crate::{AppResult, api::TranscribeResponse};

/// Commands sent from the input reader to the main application.
#[derive(Debug)]
pub enum AppCommand {
    /// Toggle press-mode recording on or off.
    TogglePress,
    /// Begin a hold-mode recording.
    BeginHold,
    /// End a hold-mode recording and submit it.
    EndHold,
    /// Submit the reviewed press-mode recording.
    Send,
    /// Toggle playback of the last recording.
    TogglePlayback,
    /// Replay the last synthesized audio.
    ReplayTts,
    /// Enable or disable speaking transcriptions back.
    SetSpeak(bool),
    /// A background transcription finished.
    TranscriptionFinished {
        /// Server response, or the error that ended the attempt.
        result: AppResult<TranscribeResponse>,
    },
    /// Request application shutdown.
    Shutdown,
}
