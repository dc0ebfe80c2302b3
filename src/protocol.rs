//! Wire messages exchanged over the room WebSocket.
//!
//! Every frame is a JSON text record with a `type` discriminator. Outbound
//! messages are a closed set; inbound messages tolerate unknown kinds so a
//! newer server does not break an older client.

use crate::error::ProtocolError;
use crate::games::tictactoe::GameSnapshot;
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};

/// Message sent by the client.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClientMessage {
    /// Place our mark at a board index.
    MakeMove {
        /// Board index (0-8).
        position: u8,
    },
    /// Ask the server to start a fresh game in this room.
    ResetGame,
    /// Liveness probe.
    Ping,
}

impl ClientMessage {
    /// Serializes the message to a text frame.
    #[instrument]
    pub fn encode(&self) -> Result<String, ProtocolError> {
        Ok(serde_json::to_string(self)?)
    }
}

/// Kind of an inbound message, from its `type` field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, strum::Display, strum::EnumString)]
#[strum(serialize_all = "snake_case")]
pub enum MessageKind {
    /// Initial state after connecting.
    GameState,
    /// A move was applied.
    GameUpdate,
    /// The second player arrived.
    PlayerJoined,
    /// The board was cleared.
    GameReset,
    /// The opponent disconnected.
    PlayerLeft,
    /// Server rejected something we sent.
    Error,
    /// Heartbeat answer.
    Pong,
}

impl MessageKind {
    /// Whether messages of this kind carry a snapshot in `data`.
    pub fn carries_snapshot(self) -> bool {
        matches!(
            self,
            MessageKind::GameState
                | MessageKind::GameUpdate
                | MessageKind::PlayerJoined
                | MessageKind::GameReset
                | MessageKind::PlayerLeft
        )
    }
}

/// Decoded inbound message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ServerMessage {
    /// Snapshot-bearing message.
    Snapshot {
        /// Which of the snapshot kinds this is.
        kind: MessageKind,
        /// The authoritative state.
        snapshot: GameSnapshot,
    },
    /// Server-side failure report.
    Error {
        /// Human-readable reason.
        message: String,
    },
    /// Heartbeat answer.
    Pong,
    /// A `type` this client does not know.
    Unknown {
        /// The raw `type` value.
        kind: String,
    },
}

#[derive(Debug, Deserialize)]
struct RawServerMessage {
    #[serde(rename = "type")]
    kind: String,
    #[serde(default)]
    data: Option<serde_json::Value>,
    #[serde(default)]
    message: Option<String>,
}

impl ServerMessage {
    /// Parses a text frame.
    ///
    /// Fails on invalid JSON, a missing `type`, or a snapshot kind whose
    /// `data` is absent or malformed.
    #[instrument(skip(text), fields(len = text.len()))]
    pub fn decode(text: &str) -> Result<Self, ProtocolError> {
        let raw: RawServerMessage = serde_json::from_str(text)?;

        let Ok(kind) = raw.kind.parse::<MessageKind>() else {
            debug!(kind = %raw.kind, "Unknown message type");
            return Ok(ServerMessage::Unknown { kind: raw.kind });
        };

        match kind {
            MessageKind::Error => Ok(ServerMessage::Error {
                message: raw.message.unwrap_or_else(|| "Server error".to_string()),
            }),
            MessageKind::Pong => Ok(ServerMessage::Pong),
            _ => {
                let data = raw
                    .data
                    .ok_or_else(|| ProtocolError::new(format!("{kind} message without data")))?;
                let snapshot: GameSnapshot = serde_json::from_value(data)?;
                Ok(ServerMessage::Snapshot { kind, snapshot })
            }
        }
    }

    /// Kind of this message, `None` for unknown kinds.
    pub fn kind(&self) -> Option<MessageKind> {
        match self {
            ServerMessage::Snapshot { kind, .. } => Some(*kind),
            ServerMessage::Error { .. } => Some(MessageKind::Error),
            ServerMessage::Pong => Some(MessageKind::Pong),
            ServerMessage::Unknown { .. } => None,
        }
    }
}
