//! Room membership identities.

use crate::games::tictactoe::Mark;
use serde::{Deserialize, Serialize};
use tracing::instrument;

/// Unique identifier for a room.
pub type RoomId = String;

/// Unique identifier for a player within a room.
pub type PlayerId = String;

/// The room/player pair that scopes one connection.
///
/// Both ids are issued by the room API and stay fixed for the lifetime of
/// the membership.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, derive_new::new)]
pub struct SessionIdentity {
    /// Room id.
    pub room_id: RoomId,
    /// Player id.
    pub player_id: PlayerId,
}

impl SessionIdentity {
    /// Both ids are present.
    #[instrument(skip(self), fields(room_id = %self.room_id))]
    pub fn is_complete(&self) -> bool {
        !self.room_id.trim().is_empty() && !self.player_id.trim().is_empty()
    }
}

/// Which side of the board we play.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LocalIdentity {
    /// Our mark.
    pub my_symbol: Mark,
    /// The other player's mark.
    pub opponent_symbol: Mark,
}

impl LocalIdentity {
    /// Identity for a player holding `mark`.
    pub fn playing(mark: Mark) -> Self {
        Self {
            my_symbol: mark,
            opponent_symbol: mark.opponent(),
        }
    }

    /// The room creator plays X.
    pub fn creator() -> Self {
        Self::playing(Mark::X)
    }

    /// The joining player plays O.
    pub fn joiner() -> Self {
        Self::playing(Mark::O)
    }
}
