//! Command-line interface for tictactoe_online.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Tic-tac-toe Online - play against a friend over a game server
#[derive(Parser, Debug)]
#[command(name = "tictactoe_online")]
#[command(about = "Online two-player tic-tac-toe client", long_about = None)]
#[command(version)]
pub struct Cli {
    /// Path to the TOML config file
    #[arg(short, long, default_value = "tictactoe_online.toml")]
    pub config: PathBuf,

    /// Game server URL; overrides the config file and environment
    #[arg(long)]
    pub server_url: Option<String>,

    /// Subcommand to run
    #[command(subcommand)]
    pub command: Command,
}

/// Available commands
#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Create a new room and wait for an opponent
    Create,

    /// Join an existing room
    Join {
        /// Room ID shared by the room creator
        room_id: String,
    },
}
