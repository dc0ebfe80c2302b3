//! Tic-tac-toe Online - terminal client
//!
//! Creates or joins a room, then reads moves from stdin.

#![warn(missing_docs)]

mod cli;

use anyhow::Result;
use clap::Parser;
use cli::{Cli, Command};
use tictactoe_online::{
    ClientConfig, Endpoint, GameClient, HttpRoomApi, InputCommand, Runtime, TextFrontend,
    UserCommand,
};
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::mpsc;
use tracing::{debug, info, instrument, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file
    dotenvy::dotenv().ok();

    initialize_tracing();

    let cli = Cli::parse();

    let mut config = ClientConfig::load_or_default(&cli.config)?.with_env_overrides();
    if let Some(server_url) = cli.server_url {
        config = config.with_server_url(server_url);
    }
    info!(server_url = %config.server_url(), "Starting tictactoe_online");

    let client = GameClient::from_config(&config)?;
    let api = HttpRoomApi::new(Endpoint::parse(config.server_url())?);

    let (commands_tx, commands_rx) = mpsc::channel(16);
    let first = match cli.command {
        Command::Create => UserCommand::CreateRoom,
        Command::Join { room_id } => UserCommand::JoinRoom(room_id),
    };
    commands_tx.send(InputCommand::Play(first)).await?;
    tokio::spawn(read_commands(commands_tx));

    Runtime::new(client, api, TextFrontend::new(std::io::stdout()))
        .run(commands_rx)
        .await?;

    info!("Goodbye");
    Ok(())
}

/// Forwards parsed stdin lines until EOF or the runtime stops listening.
#[instrument(skip_all)]
async fn read_commands(commands: mpsc::Sender<InputCommand>) {
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        let line = match lines.next_line().await {
            Ok(Some(line)) => line,
            Ok(None) => {
                debug!("Stdin closed");
                break;
            }
            Err(e) => {
                warn!(error = %e, "Failed to read stdin");
                break;
            }
        };
        if line.trim().is_empty() {
            continue;
        }
        match line.parse::<InputCommand>() {
            Ok(command) => {
                if commands.send(command).await.is_err() {
                    break;
                }
            }
            Err(e) => {
                debug!(error = %e, "Bad input");
                eprintln!("Commands: 0-8 or move N, reset, leave, create, join <ROOM_ID>, quit");
            }
        }
    }
    let _ = commands.send(InputCommand::Quit).await;
}

#[instrument]
fn initialize_tracing() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,tictactoe_online=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    info!("Tracing initialized");
}
