//! Core domain types for tic-tac-toe snapshots.
//!
//! Every type here mirrors the server's JSON shape. The client never computes
//! these values; it only receives them and replaces its copy wholesale.

use serde::{Deserialize, Serialize};

/// Number of cells on the board.
pub const BOARD_CELLS: usize = 9;

/// Player mark.
#[derive(
    Debug,
    Clone,
    Copy,
    Default,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    strum::Display,
    strum::EnumString,
)]
pub enum Mark {
    /// Player X (goes first).
    #[default]
    X,
    /// Player O (goes second).
    O,
}

impl Mark {
    /// Returns the opponent mark.
    pub fn opponent(self) -> Self {
        match self {
            Mark::X => Mark::O,
            Mark::O => Mark::X,
        }
    }
}

/// A single board cell.
///
/// On the wire a cell is `""`, `"X"` or `"O"`. `null` is accepted as empty.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "Option<String>", into = "&'static str")]
pub enum Cell {
    /// Nobody has played here.
    #[default]
    Empty,
    /// Cell taken by a player.
    Occupied(Mark),
}

impl Cell {
    /// Returns the mark in this cell, if any.
    pub fn mark(self) -> Option<Mark> {
        match self {
            Cell::Empty => None,
            Cell::Occupied(mark) => Some(mark),
        }
    }
}

impl TryFrom<Option<String>> for Cell {
    type Error = String;

    fn try_from(value: Option<String>) -> Result<Self, Self::Error> {
        match value.as_deref() {
            None | Some("") => Ok(Cell::Empty),
            Some("X") => Ok(Cell::Occupied(Mark::X)),
            Some("O") => Ok(Cell::Occupied(Mark::O)),
            Some(other) => Err(format!("invalid cell value {other:?}")),
        }
    }
}

impl From<Cell> for &'static str {
    fn from(cell: Cell) -> Self {
        match cell {
            Cell::Empty => "",
            Cell::Occupied(Mark::X) => "X",
            Cell::Occupied(Mark::O) => "O",
        }
    }
}

/// 3x3 board in row-major order (0-8).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Board {
    cells: [Cell; BOARD_CELLS],
}

impl Board {
    /// Creates an empty board.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a board from explicit cells.
    pub fn from_cells(cells: [Cell; BOARD_CELLS]) -> Self {
        Self { cells }
    }

    /// Gets the cell at the given position (0-8).
    pub fn get(&self, pos: usize) -> Option<Cell> {
        self.cells.get(pos).copied()
    }

    /// Checks if a position is on the board and unoccupied.
    pub fn is_empty(&self, pos: usize) -> bool {
        matches!(self.get(pos), Some(Cell::Empty))
    }

    /// Returns all cells.
    pub fn cells(&self) -> &[Cell; BOARD_CELLS] {
        &self.cells
    }

    /// Formats the board as a human-readable grid, numbering free cells.
    pub fn display(&self) -> String {
        let mut result = String::new();
        for row in 0..3 {
            for col in 0..3 {
                let pos = row * 3 + col;
                let symbol = match self.cells[pos] {
                    Cell::Empty => pos.to_string(),
                    Cell::Occupied(mark) => mark.to_string(),
                };
                result.push_str(&symbol);
                if col < 2 {
                    result.push('|');
                }
            }
            if row < 2 {
                result.push_str("\n-+-+-\n");
            }
        }
        result
    }
}

/// Room status as reported by the server.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize, strum::Display,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum GameStatus {
    /// Fewer than two players in the room.
    #[default]
    Waiting,
    /// Both players present, game ongoing.
    Playing,
    /// Last move completed a line.
    Won,
    /// Board full without a line.
    Draw,
}

/// The most recent move applied by the server.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, derive_new::new)]
pub struct LastMove {
    /// Board index of the move.
    pub position: u8,
    /// Who played it.
    pub player: Mark,
}

/// A room member as listed in the snapshot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, derive_new::new)]
pub struct RoomPlayer {
    /// Server-issued player id.
    pub player_id: String,
    /// Mark assigned to that player.
    pub player_symbol: Mark,
}

/// Full authoritative game state at one point in time.
///
/// Fields the server leaves out take their initial values, never the values
/// of a previous snapshot.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GameSnapshot {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    room_id: Option<String>,
    #[serde(default)]
    board: Board,
    #[serde(default)]
    current_player: Mark,
    #[serde(rename = "game_status", default)]
    status: GameStatus,
    #[serde(default)]
    last_move: Option<LastMove>,
    #[serde(default)]
    winning_combo: Option<[u8; 3]>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    players: Vec<RoomPlayer>,
}

impl GameSnapshot {
    /// Creates a snapshot with the given board, turn and status.
    pub fn new(board: Board, current_player: Mark, status: GameStatus) -> Self {
        Self {
            board,
            current_player,
            status,
            ..Self::default()
        }
    }

    /// Sets the last move.
    #[must_use]
    pub fn with_last_move(mut self, last_move: LastMove) -> Self {
        self.last_move = Some(last_move);
        self
    }

    /// Sets the winning line.
    #[must_use]
    pub fn with_winning_combo(mut self, combo: [u8; 3]) -> Self {
        self.winning_combo = Some(combo);
        self
    }

    /// Sets the room member list.
    #[must_use]
    pub fn with_players(mut self, players: Vec<RoomPlayer>) -> Self {
        self.players = players;
        self
    }

    /// Room this snapshot belongs to, when the server includes it.
    pub fn room_id(&self) -> Option<&str> {
        self.room_id.as_deref()
    }

    /// Returns the board.
    pub fn board(&self) -> &Board {
        &self.board
    }

    /// Returns whose turn it is.
    pub fn current_player(&self) -> Mark {
        self.current_player
    }

    /// Returns the room status.
    pub fn status(&self) -> GameStatus {
        self.status
    }

    /// Returns the last move, if any.
    pub fn last_move(&self) -> Option<LastMove> {
        self.last_move
    }

    /// Returns the winning line, if any.
    pub fn winning_combo(&self) -> Option<[u8; 3]> {
        self.winning_combo
    }

    /// Returns the listed room members.
    pub fn players(&self) -> &[RoomPlayer] {
        &self.players
    }
}
