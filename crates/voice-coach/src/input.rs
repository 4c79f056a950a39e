//! Stdin command reader.
//!
//! Reads one command per line and forwards it to the main loop over the
//! command channel. Stands in for the touch gestures of a graphical
//! frontend: `press` toggles a press-mode recording, `hold`/`release`
//! bracket a hold-mode one.

use crate::AppCommand;

use tokio::{
    io::{AsyncBufReadExt, BufReader},
    sync::mpsc,
};
use tracing::{debug, info, warn};

/// Parse a single input line into a command.
///
/// Returns `None` for blank lines and unrecognized input.
pub fn parse(line: &str) -> Option<AppCommand> {
    match line.trim() {
        "press" | "p" => Some(AppCommand::TogglePress),
        "hold" | "h" => Some(AppCommand::BeginHold),
        "release" | "r" => Some(AppCommand::EndHold),
        "send" | "s" => Some(AppCommand::Send),
        "play" => Some(AppCommand::TogglePlayback),
        "replay" => Some(AppCommand::ReplayTts),
        "speak on" => Some(AppCommand::SetSpeak(true)),
        "speak off" => Some(AppCommand::SetSpeak(false)),
        "quit" | "q" => Some(AppCommand::Shutdown),
        _ => None,
    }
}

/// Forward stdin commands to the main loop until stdin closes or the
/// receiver goes away.
pub async fn forward_stdin(command_tx: mpsc::Sender<AppCommand>) {
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    loop {
        match lines.next_line().await {
            Ok(Some(line)) => {
                let Some(command) = parse(&line) else {
                    if !line.trim().is_empty() {
                        warn!(line, "Unrecognized command");
                    }
                    continue;
                };
                debug!(?command, "Input command");
                if command_tx.send(command).await.is_err() {
                    break;
                }
            }
            Ok(None) => {
                info!("Stdin closed, requesting shutdown");
                let _ = command_tx.send(AppCommand::Shutdown).await;
                break;
            }
            Err(e) => {
                warn!(error = ?e, "Failed to read stdin");
                break;
            }
        }
    }
}
