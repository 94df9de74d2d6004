//! Handoff of a channel's stream URL to an external media player

use std::process::Stdio;

use thiserror::Error;
use tokio::process::{Child, Command};
use tracing::info;

use crate::playlist::Channel;

#[derive(Error, Debug)]
pub enum PlayerError {
    #[error("failed to launch player '{0}': {1}. Is the player installed and in your PATH?")]
    LaunchError(String, String),
}

/// Build the player invocation for `channel`
pub fn player_command(command: &str, args: &[String], channel: &Channel) -> Command {
    let mut cmd = Command::new(command);

    // Only add mpv-specific args if using mpv
    if command.contains("mpv") {
        cmd.args(["--really-quiet", "--cache=yes"]);
        cmd.arg(format!("--force-media-title={}", channel.name));
    }

    if command.contains("vlc") {
        cmd.arg(format!("--meta-title={}", channel.name));
    }

    cmd.args(args);
    cmd.arg(&channel.url);

    // Suppress all output to not corrupt TUI
    cmd.stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::null());

    cmd
}

pub fn launch(command: &str, args: &[String], channel: &Channel) -> Result<Child, PlayerError> {
    info!(player = %command, channel = %channel.name, url = %channel.url, "launching player");

    player_command(command, args, channel)
        .spawn()
        .map_err(|e| PlayerError::LaunchError(command.to_string(), e.to_string()))
}
