//! HTTP client for the voice-coach server.

mod client;
mod types;

pub use {
    client::ApiClient,
    types::{Statement, TranscribeResponse, TtsRequest, TtsResponse, UploadResponse},
};
