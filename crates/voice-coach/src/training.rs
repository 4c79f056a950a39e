//! Training flow.
//!
//! Walks the user through the server's statement list one line at a time:
//! show the current statement, record the user reading it, upload the
//! recording, then advance. Advancing is gated on a successful upload for
//! the current statement, and the next statement is prefetched so the flow
//! never stalls on the happy path.

use crate::{
    ApiClient, AppError, AppResult, Notifier,
    api::{Statement, UploadResponse},
};

use std::{panic::Location, path::Path};

use error_location::ErrorLocation;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::{debug, info, instrument, warn};
use voice_coach_core::{AudioDevice, RecordingController, StartOutcome, StopOutcome};

/// Statement endpoints used by the training flow.
///
/// Split out so the flow can be driven against a scripted server in tests.
pub trait StatementsApi {
    /// Fetch the statement at the given line number.
    fn statement(&self, line_number: u32) -> impl Future<Output = AppResult<Statement>> + Send;

    /// Upload a recording of the given statement.
    fn upload_statement_audio(
        &self,
        line_number: u32,
        audio_path: &Path,
    ) -> impl Future<Output = AppResult<UploadResponse>> + Send;
}

impl StatementsApi for ApiClient {
    async fn statement(&self, line_number: u32) -> AppResult<Statement> {
        ApiClient::statement(self, line_number).await
    }

    async fn upload_statement_audio(
        &self,
        line_number: u32,
        audio_path: &Path,
    ) -> AppResult<UploadResponse> {
        ApiClient::upload_statement_audio(self, line_number, audio_path).await
    }
}

/// State for one pass through the statement list.
pub struct TrainingFlow<A: StatementsApi, D: AudioDevice> {
    pub(crate) api: A,
    pub(crate) controller: RecordingController<D>,
    pub(crate) notifier: Notifier,
    pub(crate) current: Option<Statement>,
    pub(crate) next: Option<Statement>,
    pub(crate) has_uploaded: bool,
}

impl<A: StatementsApi, D: AudioDevice> TrainingFlow<A, D> {
    /// Create a flow positioned before the first statement.
    pub fn new(api: A, controller: RecordingController<D>, notifier: Notifier) -> Self {
        Self {
            api,
            controller,
            notifier,
            current: None,
            next: None,
            has_uploaded: false,
        }
    }

    /// Load the first statement and prefetch the second. A failed prefetch
    /// is not fatal; advancing will surface the error instead.
    #[instrument(skip(self))]
    pub async fn load_initial(&mut self) -> AppResult<()> {
        self.current = Some(self.api.statement(1).await?);

        match self.api.statement(2).await {
            Ok(statement) => self.next = Some(statement),
            Err(e) => warn!(error = ?e, "Failed to prefetch next statement"),
        }

        Ok(())
    }

    /// Start recording the current statement.
    #[instrument(skip(self))]
    pub fn start_recording(&mut self) -> AppResult<StartOutcome> {
        Ok(self.controller.begin_press()?)
    }

    /// Stop the current recording.
    #[instrument(skip(self))]
    pub fn stop_recording(&mut self) -> AppResult<StopOutcome> {
        Ok(self.controller.end_press()?)
    }

    /// Upload the last recording for the current statement.
    #[instrument(skip(self))]
    pub async fn upload(&mut self) -> AppResult<UploadResponse> {
        let Some(current) = &self.current else {
            return Err(AppError::Validation {
                reason: "No statement loaded".to_string(),
                location: ErrorLocation::from(Location::caller()),
            });
        };
        let Some(path) = self.controller.recorded_file().map(Path::to_path_buf) else {
            return Err(AppError::Validation {
                reason: "Record the statement before uploading".to_string(),
                location: ErrorLocation::from(Location::caller()),
            });
        };

        let response = self
            .api
            .upload_statement_audio(current.line_number, &path)
            .await?;
        self.has_uploaded = true;

        info!(line_number = current.line_number, "Statement audio uploaded");
        Ok(response)
    }

    /// Advance to the next statement. Requires a successful upload for the
    /// current one. The statement after next is prefetched; a prefetch
    /// failure leaves the new current statement intact.
    #[instrument(skip(self))]
    pub async fn advance(&mut self) -> AppResult<&Statement> {
        if !self.has_uploaded {
            return Err(AppError::Validation {
                reason: "Upload required before advancing".to_string(),
                location: ErrorLocation::from(Location::caller()),
            });
        }
        let Some(next) = self.next.take() else {
            return Err(AppError::Validation {
                reason: "No more statements available".to_string(),
                location: ErrorLocation::from(Location::caller()),
            });
        };

        let upcoming = next.line_number + 1;
        self.has_uploaded = false;

        match self.api.statement(upcoming).await {
            Ok(statement) => self.next = Some(statement),
            Err(e) => {
                debug!(line_number = upcoming, error = ?e, "No further statement prefetched");
            }
        }

        Ok(self.current.insert(next))
    }

    /// Interactive loop reading commands from stdin.
    #[instrument(skip(self))]
    pub async fn run(mut self) -> AppResult<()> {
        self.load_initial().await?;
        self.show_current();

        let mut lines = BufReader::new(tokio::io::stdin()).lines();
        println!("Commands: record, stop, upload, next, quit");

        while let Some(line) = lines.next_line().await? {
            match line.trim() {
                "record" => match self.start_recording() {
                    Ok(StartOutcome::Started) => println!("Recording..."),
                    Ok(StartOutcome::Ignored) => {}
                    Err(e) => self.notifier.error("Cannot record", &e.to_string()),
                },
                "stop" => match self.stop_recording() {
                    Ok(StopOutcome::Stopped(_)) => println!("Recording stopped"),
                    Ok(StopOutcome::Ignored) => {}
                    Err(e) => self.notifier.error("Recording failed", &e.to_string()),
                },
                "upload" => match self.upload().await {
                    Ok(response) => {
                        self.notifier.success("Uploaded", &response.message);
                        println!("{}", response.message);
                    }
                    Err(e) => self.notifier.error("Upload failed", &e.to_string()),
                },
                "next" => match self.advance().await {
                    Ok(_) => self.show_current(),
                    Err(e) => self.notifier.error("Cannot advance", &e.to_string()),
                },
                "quit" | "q" => break,
                "" => {}
                other => println!("Unknown command: {}", other),
            }
        }

        self.controller.teardown();
        Ok(())
    }

    fn show_current(&self) {
        if let Some(statement) = &self.current {
            println!("[{}] {}", statement.line_number, statement.statement);
        }
    }
}
