//! Account signup, login, and logout.
//!
//! Credentials live in the local store as plaintext and login is a string
//! comparison against the stored record. The auth token is a fixed marker
//! string whose presence gates the recording flows.

use crate::{
    AppError, AppResult, Store,
    store::{KEY_USER, KEY_USER_TOKEN},
};

use std::panic::Location;

use error_location::ErrorLocation;
use serde::{Deserialize, Serialize};
use tracing::{info, instrument};

/// Stored user record.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoredUser {
    /// Account email address.
    pub email: String,
    /// Account password.
    pub password: String,
}

/// Create an account and sign the user in.
#[instrument(skip(store, password))]
#[track_caller]
pub fn signup(store: &mut Store, email: &str, password: &str) -> AppResult<()> {
    validate_credentials(email, password)?;

    let user = StoredUser {
        email: email.to_string(),
        password: password.to_string(),
    };
    let serialized = serde_json::to_string(&user).map_err(|e| AppError::Storage {
        reason: format!("Failed to serialize user: {}", e),
        location: ErrorLocation::from(Location::caller()),
    })?;

    store.set(KEY_USER, &serialized)?;
    store.set(KEY_USER_TOKEN, "signed_up")?;

    info!(email, "Account created");
    Ok(())
}

/// Sign in against the stored user record.
#[instrument(skip(store, password))]
#[track_caller]
pub fn login(store: &mut Store, email: &str, password: &str) -> AppResult<()> {
    validate_credentials(email, password)?;

    let Some(serialized) = store.get(KEY_USER) else {
        return Err(AppError::Validation {
            reason: "No account found. Sign up first".to_string(),
            location: ErrorLocation::from(Location::caller()),
        });
    };
    let user: StoredUser = serde_json::from_str(serialized).map_err(|e| AppError::Storage {
        reason: format!("Failed to parse stored user: {}", e),
        location: ErrorLocation::from(Location::caller()),
    })?;

    if user.email != email || user.password != password {
        return Err(AppError::Validation {
            reason: "Invalid email or password".to_string(),
            location: ErrorLocation::from(Location::caller()),
        });
    }

    store.set(KEY_USER_TOKEN, "logged_in")?;

    info!(email, "Logged in");
    Ok(())
}

/// Sign the user out by discarding the token. The stored user record
/// survives so the same credentials work on the next login.
#[instrument(skip(store))]
pub fn logout(store: &mut Store) -> AppResult<()> {
    store.remove(KEY_USER_TOKEN)?;
    info!("Logged out");
    Ok(())
}

/// Whether an auth token is present.
pub fn is_logged_in(store: &Store) -> bool {
    store.get(KEY_USER_TOKEN).is_some()
}

#[track_caller]
fn validate_credentials(email: &str, password: &str) -> AppResult<()> {
    if email.trim().is_empty() || password.is_empty() {
        return Err(AppError::Validation {
            reason: "Email and password are required".to_string(),
            location: ErrorLocation::from(Location::caller()),
        });
    }
    Ok(())
}
