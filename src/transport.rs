//! Transport session: ownership of the single room connection.
//!
//! The session never touches a socket. It decides when a connection should
//! be opened or released and which lifecycle events still matter, and hands
//! those decisions to the runtime as [`TransportAction`]s.
//!
//! # Handle ownership
//!
//! Each connection is known by a [`ConnectionToken`]. Opening a new
//! connection always releases the previous token first, so at most one
//! token is live. Lifecycle events are tagged with the token they belong to;
//! events for any other token come from a released socket and are dropped.
//!
//! ```text
//! ┌──────────────┐  open   ┌────────────┐  on_open  ┌───────────┐
//! │ Disconnected │────────>│ Connecting │──────────>│ Connected │
//! └──────────────┘         └────────────┘           └───────────┘
//!        ▲                       │ on_close               │ on_close / close
//!        └───────────────────────┴────────────────────────┘
//! ```

use crate::endpoint::Endpoint;
use crate::error::SendError;
use crate::protocol::ClientMessage;
use crate::session::SessionIdentity;
use tracing::{debug, info, instrument, warn};

/// Identifies one connection handle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, derive_more::Display)]
#[display("conn#{_0}")]
pub struct ConnectionToken(u64);

/// Connection lifecycle as seen by the client.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, strum::Display)]
pub enum ConnectionState {
    /// No live connection.
    #[default]
    Disconnected,
    /// Connection requested, not yet open.
    Connecting,
    /// Connection open; sends are allowed.
    Connected,
}

/// Socket work the runtime must perform.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransportAction {
    /// Open a WebSocket to `url` and report its events under `token`.
    Connect {
        /// Handle the new connection is known by.
        token: ConnectionToken,
        /// Full `ws://` or `wss://` URL.
        url: String,
    },
    /// Release the connection known by `token`.
    Disconnect {
        /// Handle to release.
        token: ConnectionToken,
    },
    /// Write a text frame on the connection known by `token`.
    Send {
        /// Handle to write on.
        token: ConnectionToken,
        /// Encoded JSON frame.
        frame: String,
    },
}

/// Owner of the (at most one) live room connection.
#[derive(Debug, Clone)]
pub struct TransportSession {
    endpoint: Endpoint,
    state: ConnectionState,
    current: Option<ConnectionToken>,
    next_token: u64,
}

impl TransportSession {
    /// Creates a disconnected session against `endpoint`.
    pub fn new(endpoint: Endpoint) -> Self {
        Self {
            endpoint,
            state: ConnectionState::Disconnected,
            current: None,
            next_token: 0,
        }
    }

    /// Current lifecycle state.
    pub fn state(&self) -> ConnectionState {
        self.state
    }

    /// Whether sends are currently allowed.
    pub fn is_connected(&self) -> bool {
        self.state == ConnectionState::Connected
    }

    /// Token of the live or pending connection.
    pub fn current_token(&self) -> Option<ConnectionToken> {
        self.current
    }

    /// Whether `token` is the live or pending connection.
    pub fn is_current(&self, token: ConnectionToken) -> bool {
        self.current == Some(token)
    }

    /// Opens a connection scoped to `identity`.
    ///
    /// Any previous connection is released first. With an incomplete
    /// identity only that release happens and no connection is opened.
    #[instrument(skip(self), fields(room_id = %identity.room_id, player_id = %identity.player_id))]
    pub fn open(&mut self, identity: &SessionIdentity) -> Vec<TransportAction> {
        let mut actions = self.close();

        if !identity.is_complete() {
            debug!("Identity incomplete, not opening a connection");
            return actions;
        }

        self.next_token += 1;
        let token = ConnectionToken(self.next_token);
        let url = self.endpoint.room_socket_url(identity).to_string();

        self.current = Some(token);
        self.state = ConnectionState::Connecting;
        info!(%token, %url, "Opening room connection");

        actions.push(TransportAction::Connect { token, url });
        actions
    }

    /// Releases the current connection, if any.
    #[instrument(skip(self))]
    pub fn close(&mut self) -> Vec<TransportAction> {
        self.state = ConnectionState::Disconnected;
        match self.current.take() {
            Some(token) => {
                debug!(%token, "Releasing connection");
                vec![TransportAction::Disconnect { token }]
            }
            None => Vec::new(),
        }
    }

    /// The connection known by `token` finished its handshake.
    ///
    /// Returns `false` for stale tokens.
    #[instrument(skip(self))]
    pub fn on_open(&mut self, token: ConnectionToken) -> bool {
        if !self.is_current(token) {
            debug!(%token, "Ignoring open of released connection");
            return false;
        }
        self.state = ConnectionState::Connected;
        info!(%token, "Connection open");
        true
    }

    /// The connection known by `token` closed.
    ///
    /// Returns `false` for stale tokens.
    #[instrument(skip(self))]
    pub fn on_close(&mut self, token: ConnectionToken) -> bool {
        if !self.is_current(token) {
            debug!(%token, "Ignoring close of released connection");
            return false;
        }
        self.current = None;
        self.state = ConnectionState::Disconnected;
        info!(%token, "Connection closed");
        true
    }

    /// The connection known by `token` reported an error.
    ///
    /// State is unchanged; the close that follows drives recovery.
    /// Returns `false` for stale tokens.
    #[instrument(skip(self))]
    pub fn on_error(&mut self, token: ConnectionToken) -> bool {
        if !self.is_current(token) {
            return false;
        }
        warn!(%token, "Connection error");
        true
    }

    /// Encodes `message` for the live connection.
    ///
    /// Fails when not connected; the caller decides whether to tell the user.
    #[instrument(skip(self))]
    pub fn send(&self, message: &ClientMessage) -> Result<TransportAction, SendError> {
        let token = match (self.state, self.current) {
            (ConnectionState::Connected, Some(token)) => token,
            _ => {
                debug!(state = %self.state, "Send while not connected");
                return Err(SendError::new(format!("cannot send while {}", self.state)));
            }
        };
        let frame = message.encode()?;
        Ok(TransportAction::Send { token, frame })
    }
}
