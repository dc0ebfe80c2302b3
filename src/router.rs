//! Message router.
//!
//! Classifies each decoded inbound message and applies it: snapshots go to
//! the store first, then the notification for that kind is raised, so anyone
//! reacting to the notification already sees the new state.

use crate::games::tictactoe::GameSnapshot;
use crate::heartbeat::HeartbeatMonitor;
use crate::notify::{Notification, NotificationCenter, Severity};
use crate::protocol::{MessageKind, ServerMessage};
use crate::store::GameStateStore;
use std::time::Instant;
use tracing::{debug, instrument};

/// Where an inbound message goes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Route {
    /// Replace the snapshot, then optionally notify.
    Snapshot {
        /// Originating kind.
        kind: MessageKind,
        /// New authoritative state.
        snapshot: GameSnapshot,
        /// Notification raised after the state is applied.
        notice: Option<(&'static str, Severity)>,
    },
    /// Notify only.
    Notice {
        /// Text to show.
        message: String,
        /// Tone.
        severity: Severity,
    },
    /// Liveness bookkeeping only.
    Liveness,
    /// Unknown kind; dropped.
    Ignore,
}

/// Result of dispatching one message.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Dispatch {
    /// The store snapshot was replaced.
    pub state_changed: bool,
    /// Notification raised, if any.
    pub notification: Option<Notification>,
}

/// Stateless classifier and dispatcher.
#[derive(Debug, Clone, Copy, Default)]
pub struct MessageRouter;

impl MessageRouter {
    /// Notification text for snapshot kinds.
    pub fn snapshot_notice(kind: MessageKind) -> Option<(&'static str, Severity)> {
        match kind {
            MessageKind::GameUpdate => Some(("Opponent made a move!", Severity::Success)),
            MessageKind::PlayerJoined => {
                Some(("Opponent joined! Game starting...", Severity::Success))
            }
            MessageKind::GameReset => Some(("Game has been reset!", Severity::Success)),
            MessageKind::PlayerLeft => Some(("Opponent left the room", Severity::Error)),
            _ => None,
        }
    }

    /// Decides where `message` goes.
    pub fn classify(message: ServerMessage) -> Route {
        match message {
            ServerMessage::Snapshot { kind, snapshot } => Route::Snapshot {
                kind,
                snapshot,
                notice: Self::snapshot_notice(kind),
            },
            ServerMessage::Error { message } => Route::Notice {
                message,
                severity: Severity::Error,
            },
            ServerMessage::Pong => Route::Liveness,
            ServerMessage::Unknown { .. } => Route::Ignore,
        }
    }

    /// Classifies and applies `message`.
    #[instrument(skip_all, fields(kind = ?message.kind()))]
    pub fn dispatch(
        message: ServerMessage,
        store: &mut GameStateStore,
        notifications: &mut NotificationCenter,
        heartbeat: &mut HeartbeatMonitor,
        now: Instant,
    ) -> Dispatch {
        match Self::classify(message) {
            Route::Snapshot {
                kind,
                snapshot,
                notice,
            } => {
                debug!(%kind, "Applying server snapshot");
                store.apply_snapshot(snapshot);
                Dispatch {
                    state_changed: true,
                    notification: notice
                        .map(|(message, severity)| notifications.show(message, severity)),
                }
            }
            Route::Notice { message, severity } => Dispatch {
                state_changed: false,
                notification: Some(notifications.show(message, severity)),
            },
            Route::Liveness => {
                heartbeat.record_pong(now);
                Dispatch::default()
            }
            Route::Ignore => {
                debug!("Ignoring unknown message");
                Dispatch::default()
            }
        }
    }
}
