//! Text presentation and stdin command parsing.

use crate::client::{GameClient, UserCommand};
use crate::notify::{Notification, Severity};
use derive_more::{Display, Error};
use std::io::Write;
use std::str::FromStr;
use tracing::instrument;

/// Something that shows the client to the player.
pub trait Frontend: Send {
    /// Redraws the game.
    fn render(&mut self, client: &GameClient) -> std::io::Result<()>;

    /// Shows a transient notification.
    fn notify(&mut self, notification: &Notification) -> std::io::Result<()>;
}

/// Line-oriented frontend writing to any [`Write`].
#[derive(Debug)]
pub struct TextFrontend<W> {
    out: W,
}

impl<W: Write> TextFrontend<W> {
    /// Creates a frontend writing to `out`.
    pub fn new(out: W) -> Self {
        Self { out }
    }

    /// Consumes the frontend, returning the writer.
    pub fn into_inner(self) -> W {
        self.out
    }
}

impl<W: Write + Send> Frontend for TextFrontend<W> {
    fn render(&mut self, client: &GameClient) -> std::io::Result<()> {
        let store = client.store();
        writeln!(self.out)?;

        let Some(session) = store.session() else {
            if client.is_loading() {
                writeln!(self.out, "Contacting server...")?;
            } else {
                writeln!(self.out, "Not in a room. Commands: create, join <ROOM_ID>, quit")?;
            }
            return self.out.flush();
        };

        writeln!(self.out, "Room {} [{}]", session.room_id, client.connection_state())?;
        if let Some(mark) = store.my_symbol() {
            writeln!(self.out, "You are {mark}")?;
        }
        writeln!(self.out, "{}", store.board().display())?;
        if let Some(combo) = store.winning_combo() {
            writeln!(self.out, "Winning line: {:?}", combo)?;
        }
        writeln!(self.out, "{}", store.status_text())?;
        self.out.flush()
    }

    fn notify(&mut self, notification: &Notification) -> std::io::Result<()> {
        let marker = match notification.severity {
            Severity::Success => "*",
            Severity::Error => "!",
        };
        writeln!(self.out, "{marker} {}", notification.message)?;
        self.out.flush()
    }
}

/// One line of player input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InputCommand {
    /// Forward to the client.
    Play(UserCommand),
    /// Stop the program.
    Quit,
}

impl FromStr for InputCommand {
    type Err = InputError;

    #[instrument]
    fn from_str(line: &str) -> Result<Self, Self::Err> {
        let mut words = line.split_whitespace();
        let Some(head) = words.next() else {
            return Err(InputError::new("empty command"));
        };
        let arg = words.next();

        let command = match (head.to_ascii_lowercase().as_str(), arg) {
            ("quit" | "q" | "exit", None) => return Ok(InputCommand::Quit),
            ("create", None) => UserCommand::CreateRoom,
            ("join", Some(room_id)) => UserCommand::JoinRoom(room_id.to_string()),
            ("join", None) => UserCommand::JoinRoom(String::new()),
            ("reset", None) => UserCommand::ResetGame,
            ("leave", None) => UserCommand::LeaveRoom,
            ("move", Some(position)) => UserCommand::MakeMove(parse_position(position)?),
            (position, None) => UserCommand::MakeMove(parse_position(position)?),
            _ => return Err(InputError::new(format!("unrecognised command: {}", line.trim()))),
        };
        Ok(InputCommand::Play(command))
    }
}

fn parse_position(text: &str) -> Result<usize, InputError> {
    match text.parse::<usize>() {
        Ok(position) if position < 9 => Ok(position),
        _ => Err(InputError::new(format!("unrecognised command: {text}"))),
    }
}

/// Input that is not a command.
#[derive(Debug, Clone, Display, Error)]
#[display("Input error: {} at {}:{}", message, file, line)]
pub struct InputError {
    /// Error message.
    pub message: String,
    /// Line number where error occurred.
    pub line: u32,
    /// Source file where error occurred.
    pub file: &'static str,
}

impl InputError {
    /// Creates a new input error with caller location tracking.
    #[track_caller]
    pub fn new(message: impl Into<String>) -> Self {
        let loc = std::panic::Location::caller();
        Self {
            message: message.into(),
            line: loc.line(),
            file: loc.file(),
        }
    }
}
