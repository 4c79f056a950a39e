//! Voice-Coach: voice training client with transcription and speech feedback.

mod api;
mod app;
mod app_command;
mod auth;
mod error;
mod input;
mod notify;
mod server_url;
mod store;
mod training;
mod tts;

pub(crate) use {
    api::ApiClient,
    app::App,
    app_command::AppCommand,
    error::{AppError, Result as AppResult},
    notify::Notifier,
    store::Store,
    training::TrainingFlow,
    tts::TtsFlow,
};

use crate::{server_url::normalize_server_url, store::KEY_SERVER_URL};

use std::{panic::Location, path::PathBuf, process::ExitCode};

use clap::{Parser, Subcommand};
use directories::ProjectDirs;
use error_location::ErrorLocation;
use tokio::sync::mpsc;
use tracing::error;
use voice_coach_core::{ControllerOptions, CpalAudioDevice, RecordingController};

/// Voice training client.
#[derive(Debug, Parser)]
#[command(name = "voice-coach", version, about)]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Record speech and transcribe it (default).
    Transcribe,
    /// Read training statements aloud and upload the recordings.
    Train,
    /// Synthesize speech from text.
    Tts {
        /// Text to speak. Without it an interactive loop starts.
        text: Option<String>,
    },
    /// Sign in with a stored account.
    Login {
        /// Account email address.
        email: String,
        /// Account password.
        password: String,
    },
    /// Create an account and sign in.
    Signup {
        /// Account email address.
        email: String,
        /// Account password.
        password: String,
    },
    /// Sign out.
    Logout,
    /// Save the server URL.
    SetServer {
        /// Server address, with or without scheme and port.
        url: String,
    },
}

/// Application entry point.
#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter("voice_coach=debug")
        .init();

    let cli = Cli::parse();
    match run(cli.command.unwrap_or(Command::Transcribe)).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!(error = ?e, "Fatal error");
            eprintln!("Error: {}", e);
            ExitCode::FAILURE
        }
    }
}

async fn run(command: Command) -> AppResult<()> {
    let mut store = Store::load()?;

    match command {
        Command::Transcribe => transcribe(&store).await,
        Command::Train => train(&store).await,
        Command::Tts { text } => speak(&store, text).await,
        Command::Login { email, password } => {
            auth::login(&mut store, &email, &password)?;
            println!("Logged in as {}", email);
            Ok(())
        }
        Command::Signup { email, password } => {
            auth::signup(&mut store, &email, &password)?;
            println!("Account created for {}", email);
            Ok(())
        }
        Command::Logout => {
            auth::logout(&mut store)?;
            println!("Logged out");
            Ok(())
        }
        Command::SetServer { url } => {
            let normalized = normalize_server_url(&url)?;
            store.set(KEY_SERVER_URL, &normalized)?;
            println!("Server set to {}", normalized);
            Ok(())
        }
    }
}

async fn transcribe(store: &Store) -> AppResult<()> {
    require_login(store)?;
    let server_url = require_server_url(store)?;

    let controller = build_controller(store)?;
    let (command_tx, command_rx) = mpsc::channel(32);

    let input_tx = command_tx.clone();
    tokio::task::spawn(async move {
        input::forward_stdin(input_tx).await;
    });

    println!("Commands: press, hold, release, send, play, replay, speak on|off, quit");

    let app = App {
        controller,
        api: ApiClient::new(&server_url),
        notifier: Notifier::new(),
        command_tx,
        command_rx,
        transcribed_text: String::new(),
        speak_transcription: false,
    };

    app.run().await
}

async fn train(store: &Store) -> AppResult<()> {
    require_login(store)?;
    let server_url = require_server_url(store)?;

    let controller = build_controller(store)?;
    let flow = TrainingFlow::new(
        ApiClient::new(&server_url),
        controller,
        Notifier::new(),
    );

    flow.run().await
}

async fn speak(store: &Store, text: Option<String>) -> AppResult<()> {
    let server_url = require_server_url(store)?;

    let controller = build_controller(store)?;
    let mut flow = TtsFlow::new(ApiClient::new(&server_url), controller, Notifier::new());

    match text {
        Some(text) => {
            flow.speak(&text).await?;
            // Let the audio finish before tearing the device down.
            wait_for_playback(&mut flow).await;
            Ok(())
        }
        None => flow.run().await,
    }
}

async fn wait_for_playback<D: voice_coach_core::AudioDevice>(flow: &mut TtsFlow<D>) {
    use voice_coach_core::PlayerEvent;

    loop {
        tokio::time::sleep(std::time::Duration::from_millis(100)).await;
        if let Some(PlayerEvent::Finished) = flow.controller.poll_device_events() {
            break;
        }
        if !flow.controller.is_playing() {
            break;
        }
    }
    flow.controller.teardown();
}

#[track_caller]
fn require_login(store: &Store) -> AppResult<()> {
    if auth::is_logged_in(store) {
        Ok(())
    } else {
        Err(AppError::Validation {
            reason: "Not logged in. Run `voice-coach login` first".to_string(),
            location: ErrorLocation::from(Location::caller()),
        })
    }
}

#[track_caller]
fn require_server_url(store: &Store) -> AppResult<String> {
    store
        .get(KEY_SERVER_URL)
        .map(str::to_string)
        .ok_or_else(|| AppError::Validation {
            reason: "Server URL not set. Run `voice-coach set-server` first".to_string(),
            location: ErrorLocation::from(Location::caller()),
        })
}

fn build_controller(store: &Store) -> AppResult<RecordingController<CpalAudioDevice>> {
    let device = CpalAudioDevice::new().map_err(AppError::from)?;

    let recording_dir = recordings_dir()?;
    std::fs::create_dir_all(&recording_dir)?;

    Ok(RecordingController::new(
        device,
        ControllerOptions {
            server_configured: store.get(KEY_SERVER_URL).is_some(),
            has_audio_permission: true,
            recording_dir,
        },
    ))
}

#[track_caller]
fn recordings_dir() -> AppResult<PathBuf> {
    let dirs = ProjectDirs::from("com", "voice-coach", "Voice-Coach").ok_or_else(|| {
        AppError::Storage {
            reason: "Could not determine data directory".to_string(),
            location: ErrorLocation::from(Location::caller()),
        }
    })?;
    Ok(dirs.data_dir().join("recordings"))
}
