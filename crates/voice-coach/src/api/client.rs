use crate::{
    AppError, AppResult,
    api::{Statement, TranscribeResponse, TtsRequest, TtsResponse, UploadResponse},
    server_url::{resolve_tts_url, with_port},
};

use std::{
    env,
    panic::Location,
    path::{Path, PathBuf},
};

use error_location::ErrorLocation;
use reqwest::multipart::{Form, Part};
use tracing::{debug, instrument};
use uuid::Uuid;

/// Client for the voice-coach server.
///
/// Cheap to clone; the underlying reqwest client shares its connection pool
/// across clones, which the submit path relies on when it hands a clone to
/// a background task.
#[derive(Debug, Clone)]
pub struct ApiClient {
    http: reqwest::Client,
    base_url: String,
}

impl ApiClient {
    /// Create a client for the given server URL.
    pub fn new(server_url: &str) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: with_port(server_url),
        }
    }

    /// Synthesize speech for the given text.
    #[instrument(skip(self, text))]
    pub async fn tts(&self, text: &str) -> AppResult<TtsResponse> {
        let url = format!("{}tts", self.base_url);
        let response = self
            .http
            .post(&url)
            .json(&TtsRequest {
                text: text.to_string(),
            })
            .send()
            .await?;

        Self::check_status(&response)?;
        Ok(response.json().await?)
    }

    /// Upload a recording for transcription.
    #[instrument(skip(self), fields(audio = %audio_path.display()))]
    pub async fn transcribe(&self, audio_path: &Path) -> AppResult<TranscribeResponse> {
        let url = format!("{}transcribe", self.base_url);
        let form = Self::audio_form(audio_path, "file.wav").await?;
        let response = self.http.post(&url).multipart(form).send().await?;

        Self::check_status(&response)?;
        Ok(response.json().await?)
    }

    /// Fetch the training statement at the given line number.
    #[instrument(skip(self))]
    pub async fn statement(&self, line_number: u32) -> AppResult<Statement> {
        let url = format!("{}statements/{}", self.base_url, line_number);
        let response = self.http.get(&url).send().await?;

        Self::check_status(&response)?;
        Ok(response.json().await?)
    }

    /// Upload a training recording for the given statement.
    #[instrument(skip(self), fields(audio = %audio_path.display()))]
    pub async fn upload_statement_audio(
        &self,
        line_number: u32,
        audio_path: &Path,
    ) -> AppResult<UploadResponse> {
        let url = format!("{}upload-statement-audio/{}", self.base_url, line_number);
        let form = Self::audio_form(audio_path, "filename.wav").await?;
        let response = self.http.post(&url).multipart(form).send().await?;

        Self::check_status(&response)?;
        Ok(response.json().await?)
    }

    /// Resolve a server-relative TTS path against this client's base URL.
    pub fn resolve_tts_url(&self, relative: &str) -> String {
        resolve_tts_url(&self.base_url, relative)
    }

    /// Download synthesized audio to a temporary file the player can read.
    #[instrument(skip(self))]
    pub async fn fetch_audio(&self, url: &str) -> AppResult<PathBuf> {
        let response = self.http.get(url).send().await?;
        Self::check_status(&response)?;
        let bytes = response.bytes().await?;

        let path = env::temp_dir().join(format!("voice-coach-tts-{}.wav", Uuid::new_v4()));
        tokio::fs::write(&path, &bytes).await?;

        debug!(path = %path.display(), bytes = bytes.len(), "TTS audio downloaded");
        Ok(path)
    }

    async fn audio_form(audio_path: &Path, file_name: &'static str) -> AppResult<Form> {
        let bytes = tokio::fs::read(audio_path).await?;
        let part = Part::bytes(bytes)
            .file_name(file_name)
            .mime_str("audio/wav")
            .map_err(|e| AppError::Network {
                reason: format!("Failed to build multipart form: {}", e),
                location: ErrorLocation::from(Location::caller()),
            })?;
        Ok(Form::new().part("file", part))
    }

    #[track_caller]
    fn check_status(response: &reqwest::Response) -> AppResult<()> {
        let status = response.status();
        if status.is_success() {
            Ok(())
        } else {
            Err(AppError::Network {
                reason: format!("HTTP error! status: {}", status),
                location: ErrorLocation::from(Location::caller()),
            })
        }
    }
}
