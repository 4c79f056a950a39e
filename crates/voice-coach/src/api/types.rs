//! Wire types for the voice-coach server API.

use serde::{Deserialize, Serialize};

/// Request body for speech synthesis.
#[derive(Debug, Clone, Serialize)]
pub struct TtsRequest {
    /// Text to synthesize.
    pub text: String,
}

/// Response from speech synthesis.
#[derive(Debug, Clone, Deserialize)]
pub struct TtsResponse {
    /// Server-relative URL of the synthesized audio.
    pub tts_url: String,
}

/// Response from transcribing a recording.
#[derive(Debug, Clone, Deserialize)]
pub struct TranscribeResponse {
    /// Recognized text.
    pub transcription: String,
    /// Spoken-back audio URL, present when the server was asked to speak
    /// the transcription.
    #[serde(default)]
    pub tts_url: Option<String>,
}

/// A training statement for the user to read aloud.
#[derive(Debug, Clone, Deserialize)]
pub struct Statement {
    /// One-based position in the statement list.
    pub line_number: u32,
    /// Text to read aloud.
    pub statement: String,
}

/// Acknowledgement for an uploaded training recording.
#[derive(Debug, Clone, Deserialize)]
pub struct UploadResponse {
    /// Human-readable server message.
    pub message: String,
}
