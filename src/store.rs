//! Game state store.
//!
//! Holds the last authoritative snapshot and the identities of the current
//! room membership. The snapshot is replaced, never patched.

use crate::error::StoreError;
use crate::games::tictactoe::{Board, GameSnapshot, GameStatus, LastMove, Mark};
use crate::session::{LocalIdentity, SessionIdentity};
use tracing::{debug, info, instrument};

/// Local copy of the room state.
#[derive(Debug, Clone, Default)]
pub struct GameStateStore {
    snapshot: GameSnapshot,
    session: Option<SessionIdentity>,
    local: Option<LocalIdentity>,
}

impl GameStateStore {
    /// Creates a store outside any room.
    pub fn new() -> Self {
        Self::default()
    }

    /// Records a new room membership.
    ///
    /// Fails if already in a room; identities are fixed for a membership.
    #[instrument(skip(self), fields(room_id = %session.room_id))]
    pub fn enter_room(
        &mut self,
        session: SessionIdentity,
        local: LocalIdentity,
    ) -> Result<(), StoreError> {
        if let Some(existing) = &self.session {
            return Err(StoreError::new(format!(
                "already in room {}",
                existing.room_id
            )));
        }
        info!(my_symbol = %local.my_symbol, "Entered room");
        self.session = Some(session);
        self.local = Some(local);
        Ok(())
    }

    /// Replaces the snapshot with `snapshot`.
    #[instrument(skip(self, snapshot), fields(status = %snapshot.status(), current_player = %snapshot.current_player()))]
    pub fn apply_snapshot(&mut self, snapshot: GameSnapshot) {
        debug!("Applying snapshot");
        self.snapshot = snapshot;
    }

    /// Returns to the initial state and forgets the room membership.
    #[instrument(skip(self))]
    pub fn reset(&mut self) {
        debug!("Resetting store");
        self.snapshot = GameSnapshot::default();
        self.session = None;
        self.local = None;
    }

    /// The current snapshot.
    pub fn snapshot(&self) -> &GameSnapshot {
        &self.snapshot
    }

    /// The board.
    pub fn board(&self) -> &Board {
        self.snapshot.board()
    }

    /// Whose turn it is.
    pub fn current_player(&self) -> Mark {
        self.snapshot.current_player()
    }

    /// Room status.
    pub fn status(&self) -> GameStatus {
        self.snapshot.status()
    }

    /// Last move, if any.
    pub fn last_move(&self) -> Option<LastMove> {
        self.snapshot.last_move()
    }

    /// Winning line, if any.
    pub fn winning_combo(&self) -> Option<[u8; 3]> {
        self.snapshot.winning_combo()
    }

    /// The winner: the last mover, only once the game is won.
    pub fn winner(&self) -> Option<Mark> {
        match self.snapshot.status() {
            GameStatus::Won => self.snapshot.last_move().map(|m| m.player),
            _ => None,
        }
    }

    /// Whether we are in a room.
    pub fn in_room(&self) -> bool {
        self.session.is_some()
    }

    /// Room/player ids of the membership.
    pub fn session(&self) -> Option<&SessionIdentity> {
        self.session.as_ref()
    }

    /// Our side of the board.
    pub fn local(&self) -> Option<LocalIdentity> {
        self.local
    }

    /// Our mark.
    pub fn my_symbol(&self) -> Option<Mark> {
        self.local.map(|l| l.my_symbol)
    }

    /// Whether we are the player to move.
    pub fn is_my_turn(&self) -> bool {
        self.snapshot.status() == GameStatus::Playing
            && self.my_symbol() == Some(self.snapshot.current_player())
    }

    /// Whether playing `position` would be a legal move for us.
    pub fn is_legal_move(&self, position: usize) -> bool {
        self.is_my_turn() && self.snapshot.board().is_empty(position)
    }

    /// One-line status for display.
    pub fn status_text(&self) -> String {
        match self.snapshot.status() {
            GameStatus::Waiting => "Waiting for opponent...".to_string(),
            GameStatus::Playing if self.is_my_turn() => "Your turn!".to_string(),
            GameStatus::Playing => "Opponent's turn".to_string(),
            GameStatus::Won => match self.winner() {
                Some(mark) => format!("{mark} wins!"),
                None => "Game over".to_string(),
            },
            GameStatus::Draw => "It's a draw!".to_string(),
        }
    }
}
