//! Server URL normalization.
//!
//! The server runs on port 8000 and users tend to enter bare hostnames, so
//! saved URLs are normalized to carry both a scheme and the port, ending in
//! a trailing slash: `example.com` becomes `http://example.com:8000/`.

use crate::{AppError, AppResult};

use std::panic::Location;

use error_location::ErrorLocation;

/// Port the remote server listens on.
const SERVER_PORT: &str = ":8000";

/// Normalize a user-entered server URL for persistence.
///
/// Prepends `http://` when no scheme is present and appends `:8000/` when
/// the port is missing.
#[track_caller]
pub fn normalize_server_url(raw: &str) -> AppResult<String> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(AppError::Validation {
            reason: "Server URL cannot be empty".to_string(),
            location: ErrorLocation::from(Location::caller()),
        });
    }

    let mut url = trimmed.to_string();
    if !url.starts_with("http://") && !url.starts_with("https://") {
        url = format!("http://{}", url);
    }

    Ok(with_port(&url))
}

/// Ensure a URL carries the server port, with a trailing slash.
///
/// Applied again at request time so URLs saved before normalization existed
/// still reach the right port.
pub fn with_port(url: &str) -> String {
    if url.contains(SERVER_PORT) {
        url.to_string()
    } else {
        format!("{}{}/", url.trim_end_matches('/'), SERVER_PORT)
    }
}

/// Resolve a server-relative TTS path against the configured base.
pub fn resolve_tts_url(base: &str, relative: &str) -> String {
    format!("{}{}", base.trim_end_matches('/'), relative)
}
