//! Game client state machine.
//!
//! [`GameClient`] owns the transport session, heartbeat monitor, reconnect
//! supervisor, store and notifications, and exposes one dispatcher per event
//! type. Nothing here performs I/O: each dispatcher returns the
//! [`ClientAction`]s the runtime must carry out, and every asynchronous result
//! (socket event, timer, API response) re-enters as a [`ClientEvent`] tagged
//! with the token it was started under.
//!
//! # Flow
//!
//! ```text
//! request_room ──> RequestRoom ──(api)──> on_room_assigned ──> Connect
//!                                                               │
//!        on_frame <── frames ── on_connection_opened <──────────┘
//!           │
//!           └─> router ─> store ─> notification ─> Render
//!
//! on_connection_closed ─> supervisor ─> ScheduleReconnect ─> on_reconnect_due ─> Connect
//! ```

use crate::api::{RoomAssignment, RoomRequest};
use crate::config::ClientConfig;
use crate::endpoint::Endpoint;
use crate::error::ApiError;
use crate::heartbeat::HeartbeatMonitor;
use crate::notify::{Notification, NotificationCenter, NotificationId, Severity};
use crate::protocol::{ClientMessage, ServerMessage};
use crate::reconnect::{BackoffToken, ReconnectDecision, ReconnectPolicy, ReconnectSupervisor};
use crate::router::MessageRouter;
use crate::store::GameStateStore;
use crate::transport::{ConnectionState, ConnectionToken, TransportAction, TransportSession};
use std::time::{Duration, Instant};
use tracing::{debug, info, instrument, warn};

/// Shown when an action needs the connection and it is gone for good.
pub const CONNECTION_LOST_MESSAGE: &str = "Connection lost. Please refresh the page.";

/// Identifies one room API request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, derive_more::Display)]
#[display("request#{_0}")]
pub struct RequestId(u64);

/// Work the runtime must perform.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClientAction {
    /// Open a WebSocket.
    Connect {
        /// Handle for the new connection.
        token: ConnectionToken,
        /// Target URL.
        url: String,
    },
    /// Release a WebSocket.
    Disconnect {
        /// Handle to release.
        token: ConnectionToken,
    },
    /// Write a text frame.
    Send {
        /// Handle to write on.
        token: ConnectionToken,
        /// Encoded frame.
        frame: String,
    },
    /// Call the room API.
    RequestRoom {
        /// Id to report the result under.
        request: RequestId,
        /// What to ask for.
        kind: RoomRequest,
    },
    /// Report [`ClientEvent::ReconnectDue`] after `delay`.
    ScheduleReconnect {
        /// Token to report.
        token: BackoffToken,
        /// Time to wait.
        delay: Duration,
    },
    /// Show a notification, then report
    /// [`ClientEvent::NotificationExpired`] after `dismiss_after`.
    Notify {
        /// What to show.
        notification: Notification,
        /// Display time.
        dismiss_after: Duration,
    },
    /// State visible to the user changed.
    Render,
}

impl From<TransportAction> for ClientAction {
    fn from(action: TransportAction) -> Self {
        match action {
            TransportAction::Connect { token, url } => ClientAction::Connect { token, url },
            TransportAction::Disconnect { token } => ClientAction::Disconnect { token },
            TransportAction::Send { token, frame } => ClientAction::Send { token, frame },
        }
    }
}

/// Commands coming from the player.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UserCommand {
    /// Create a room.
    CreateRoom,
    /// Join the room with this id.
    JoinRoom(String),
    /// Place our mark.
    MakeMove(usize),
    /// Start a new game in the room.
    ResetGame,
    /// Leave the room.
    LeaveRoom,
}

/// Asynchronous results fed back by the runtime.
#[derive(Debug, Clone)]
pub enum ClientEvent {
    /// Room API request succeeded.
    RoomAssigned {
        /// Request id.
        request: RequestId,
        /// What was asked for.
        kind: RoomRequest,
        /// Issued ids.
        assignment: RoomAssignment,
    },
    /// Room API request failed.
    RoomRequestFailed {
        /// Request id.
        request: RequestId,
        /// What was asked for.
        kind: RoomRequest,
        /// Failure.
        error: ApiError,
    },
    /// WebSocket handshake completed.
    ConnectionOpened {
        /// Connection handle.
        token: ConnectionToken,
    },
    /// Text frame received.
    FrameReceived {
        /// Connection handle.
        token: ConnectionToken,
        /// Frame text.
        text: String,
    },
    /// WebSocket failed.
    ConnectionErrored {
        /// Connection handle.
        token: ConnectionToken,
        /// Failure description.
        reason: String,
    },
    /// WebSocket closed.
    ConnectionClosed {
        /// Connection handle.
        token: ConnectionToken,
    },
    /// A reconnect delay elapsed.
    ReconnectDue {
        /// Token the delay was scheduled with.
        token: BackoffToken,
    },
    /// The process-wide heartbeat timer fired.
    HeartbeatTick,
    /// A notification's display time elapsed.
    NotificationExpired {
        /// Notification id.
        id: NotificationId,
    },
    /// Player input.
    User(UserCommand),
}

/// The whole client: connection lifecycle plus local game state.
#[derive(Debug, Clone)]
pub struct GameClient {
    transport: TransportSession,
    heartbeat: HeartbeatMonitor,
    supervisor: ReconnectSupervisor,
    store: GameStateStore,
    notifications: NotificationCenter,
    pending_request: Option<RequestId>,
    next_request: u64,
}

impl GameClient {
    /// Creates a client outside any room.
    pub fn new(
        endpoint: Endpoint,
        heartbeat: HeartbeatMonitor,
        policy: ReconnectPolicy,
        notifications: NotificationCenter,
    ) -> Self {
        Self {
            transport: TransportSession::new(endpoint),
            heartbeat,
            supervisor: ReconnectSupervisor::new(policy),
            store: GameStateStore::new(),
            notifications,
            pending_request: None,
            next_request: 0,
        }
    }

    /// Creates a client from configuration.
    #[instrument(skip(config), fields(server_url = %config.server_url()))]
    pub fn from_config(config: &ClientConfig) -> Result<Self, crate::config::ConfigError> {
        let endpoint = Endpoint::parse(config.server_url())?;
        Ok(Self::new(
            endpoint,
            HeartbeatMonitor::new(config.heartbeat_interval()),
            ReconnectPolicy {
                base_delay: config.reconnect_base_delay(),
                max_attempts: *config.max_reconnect_attempts(),
            },
            NotificationCenter::new(config.notification_timeout()),
        ))
    }

    /// Local game state.
    pub fn store(&self) -> &GameStateStore {
        &self.store
    }

    /// Connection lifecycle state.
    pub fn connection_state(&self) -> ConnectionState {
        self.transport.state()
    }

    /// Reconnect supervisor.
    pub fn supervisor(&self) -> &ReconnectSupervisor {
        &self.supervisor
    }

    /// Heartbeat bookkeeping.
    pub fn heartbeat(&self) -> &HeartbeatMonitor {
        &self.heartbeat
    }

    /// Visible notification.
    pub fn notification(&self) -> Option<&Notification> {
        self.notifications.current()
    }

    /// Whether a room API request is in flight.
    pub fn is_loading(&self) -> bool {
        self.pending_request.is_some()
    }

    /// Routes `event` to its dispatcher.
    pub fn handle(&mut self, event: ClientEvent, now: Instant) -> Vec<ClientAction> {
        match event {
            ClientEvent::RoomAssigned {
                request,
                kind,
                assignment,
            } => self.on_room_assigned(request, kind, assignment),
            ClientEvent::RoomRequestFailed {
                request,
                kind,
                error,
            } => self.on_room_request_failed(request, kind, &error),
            ClientEvent::ConnectionOpened { token } => self.on_connection_opened(token),
            ClientEvent::FrameReceived { token, text } => self.on_frame(token, &text, now),
            ClientEvent::ConnectionErrored { token, reason } => {
                self.on_connection_error(token, &reason)
            }
            ClientEvent::ConnectionClosed { token } => self.on_connection_closed(token),
            ClientEvent::ReconnectDue { token } => self.on_reconnect_due(token),
            ClientEvent::HeartbeatTick => self.on_heartbeat_tick(now),
            ClientEvent::NotificationExpired { id } => self.on_notification_expired(id),
            ClientEvent::User(command) => self.on_user_command(command),
        }
    }

    /// Routes a player command.
    pub fn on_user_command(&mut self, command: UserCommand) -> Vec<ClientAction> {
        match command {
            UserCommand::CreateRoom => self.request_room(RoomRequest::Create),
            UserCommand::JoinRoom(room_id) => self.request_room(RoomRequest::Join { room_id }),
            UserCommand::MakeMove(position) => self.make_move(position),
            UserCommand::ResetGame => self.reset_game(),
            UserCommand::LeaveRoom => self.leave_room(),
        }
    }

    fn notify(&mut self, message: impl Into<String>, severity: Severity) -> ClientAction {
        let notification = self.notifications.show(message, severity);
        ClientAction::Notify {
            notification,
            dismiss_after: self.notifications.timeout(),
        }
    }

    /// Starts a room create or join.
    #[instrument(skip(self))]
    pub fn request_room(&mut self, kind: RoomRequest) -> Vec<ClientAction> {
        if self.store.in_room() {
            debug!("Already in a room, leave first");
            return Vec::new();
        }

        let kind = match kind {
            RoomRequest::Join { room_id } => {
                let room_id = room_id.trim().to_string();
                if room_id.is_empty() {
                    return vec![self.notify("Please enter a room ID", Severity::Error)];
                }
                RoomRequest::Join { room_id }
            }
            RoomRequest::Create => RoomRequest::Create,
        };

        self.next_request += 1;
        let request = RequestId(self.next_request);
        self.pending_request = Some(request);
        info!(%request, ?kind, "Requesting room");
        vec![ClientAction::RequestRoom { request, kind }, ClientAction::Render]
    }

    /// The room API issued ids for `request`.
    #[instrument(skip(self, assignment), fields(room_id = %assignment.room_id))]
    pub fn on_room_assigned(
        &mut self,
        request: RequestId,
        kind: RoomRequest,
        assignment: RoomAssignment,
    ) -> Vec<ClientAction> {
        if self.pending_request != Some(request) {
            debug!(%request, "Ignoring superseded room response");
            return Vec::new();
        }
        self.pending_request = None;

        let identity = assignment.identity();
        if let Err(e) = self.store.enter_room(identity.clone(), kind.local_identity()) {
            warn!(error = %e, "Room response while already in a room");
            return vec![ClientAction::Render];
        }

        self.supervisor.reset();
        let mut actions: Vec<ClientAction> = self
            .transport
            .open(&identity)
            .into_iter()
            .map(ClientAction::from)
            .collect();
        actions.push(self.notify(kind.success_message(), Severity::Success));
        actions.push(ClientAction::Render);
        actions
    }

    /// The room API request `request` failed.
    #[instrument(skip(self, error), fields(error = %error))]
    pub fn on_room_request_failed(
        &mut self,
        request: RequestId,
        kind: RoomRequest,
        error: &ApiError,
    ) -> Vec<ClientAction> {
        if self.pending_request != Some(request) {
            debug!(%request, "Ignoring superseded room failure");
            return Vec::new();
        }
        self.pending_request = None;
        warn!("Room request failed");
        let message = error.user_message(kind.failure_fallback());
        vec![self.notify(message, Severity::Error), ClientAction::Render]
    }

    /// The connection `token` finished its handshake.
    #[instrument(skip(self))]
    pub fn on_connection_opened(&mut self, token: ConnectionToken) -> Vec<ClientAction> {
        if !self.transport.on_open(token) {
            return Vec::new();
        }
        self.supervisor.on_open();
        vec![
            self.notify("Connected to game server", Severity::Success),
            ClientAction::Render,
        ]
    }

    /// A text frame arrived on `token`.
    #[instrument(skip(self, text), fields(len = text.len()))]
    pub fn on_frame(&mut self, token: ConnectionToken, text: &str, now: Instant) -> Vec<ClientAction> {
        if !self.transport.is_current(token) {
            debug!(%token, "Dropping frame from released connection");
            return Vec::new();
        }

        let message = match ServerMessage::decode(text) {
            Ok(message) => message,
            Err(e) => {
                warn!(error = %e, "Dropping undecodable frame");
                return Vec::new();
            }
        };

        let dispatch = MessageRouter::dispatch(
            message,
            &mut self.store,
            &mut self.notifications,
            &mut self.heartbeat,
            now,
        );

        let mut actions = Vec::new();
        if let Some(notification) = dispatch.notification {
            actions.push(ClientAction::Notify {
                notification,
                dismiss_after: self.notifications.timeout(),
            });
        }
        if dispatch.state_changed || !actions.is_empty() {
            actions.push(ClientAction::Render);
        }
        actions
    }

    /// The connection `token` reported an error.
    #[instrument(skip(self))]
    pub fn on_connection_error(&mut self, token: ConnectionToken, reason: &str) -> Vec<ClientAction> {
        if !self.transport.on_error(token) {
            return Vec::new();
        }
        warn!(reason, "Room connection failed");
        vec![self.notify("Connection error", Severity::Error), ClientAction::Render]
    }

    /// The connection `token` closed.
    #[instrument(skip(self))]
    pub fn on_connection_closed(&mut self, token: ConnectionToken) -> Vec<ClientAction> {
        if !self.transport.on_close(token) {
            return Vec::new();
        }

        let mut actions = Vec::new();
        match self.supervisor.on_close() {
            ReconnectDecision::Retry {
                attempt,
                max_attempts,
                delay,
                token,
            } => {
                actions.push(self.notify(
                    format!("Reconnecting... ({attempt}/{max_attempts})"),
                    Severity::Error,
                ));
                actions.push(ClientAction::ScheduleReconnect { token, delay });
            }
            ReconnectDecision::GiveUp { .. } => {
                actions.push(self.notify(CONNECTION_LOST_MESSAGE, Severity::Error));
            }
            ReconnectDecision::Ignore => {}
        }
        actions.push(ClientAction::Render);
        actions
    }

    /// The reconnect delay for `token` elapsed.
    #[instrument(skip(self))]
    pub fn on_reconnect_due(&mut self, token: BackoffToken) -> Vec<ClientAction> {
        if !self.supervisor.on_backoff_elapsed(token) {
            return Vec::new();
        }
        let Some(identity) = self.store.session().cloned() else {
            debug!("No room to reconnect to");
            return Vec::new();
        };
        let mut actions: Vec<ClientAction> = self
            .transport
            .open(&identity)
            .into_iter()
            .map(ClientAction::from)
            .collect();
        actions.push(ClientAction::Render);
        actions
    }

    /// The heartbeat timer fired.
    #[instrument(skip(self))]
    pub fn on_heartbeat_tick(&mut self, now: Instant) -> Vec<ClientAction> {
        self.heartbeat
            .tick(&self.transport, now)
            .map(ClientAction::from)
            .into_iter()
            .collect()
    }

    /// The display time of notification `id` elapsed.
    #[instrument(skip(self))]
    pub fn on_notification_expired(&mut self, id: NotificationId) -> Vec<ClientAction> {
        if self.notifications.dismiss(id) {
            vec![ClientAction::Render]
        } else {
            Vec::new()
        }
    }

    /// Plays our mark at `position`.
    ///
    /// Illegal moves are dropped without a message. A legal move while the
    /// connection is down raises the connection-lost notification.
    #[instrument(skip(self))]
    pub fn make_move(&mut self, position: usize) -> Vec<ClientAction> {
        if !self.store.is_legal_move(position) {
            debug!("Rejecting illegal move");
            return Vec::new();
        }
        let message = ClientMessage::MakeMove {
            position: position as u8,
        };
        match self.transport.send(&message) {
            Ok(action) => vec![action.into()],
            Err(e) => {
                warn!(error = %e, "Move not sent");
                vec![self.notify(CONNECTION_LOST_MESSAGE, Severity::Error)]
            }
        }
    }

    /// Asks the server for a new game. Dropped while disconnected.
    #[instrument(skip(self))]
    pub fn reset_game(&mut self) -> Vec<ClientAction> {
        match self.transport.send(&ClientMessage::ResetGame) {
            Ok(action) => vec![action.into()],
            Err(e) => {
                debug!(error = %e, "Reset not sent");
                Vec::new()
            }
        }
    }

    /// Leaves the room: releases the connection and forgets the membership.
    #[instrument(skip(self))]
    pub fn leave_room(&mut self) -> Vec<ClientAction> {
        let mut actions: Vec<ClientAction> = self
            .transport
            .close()
            .into_iter()
            .map(ClientAction::from)
            .collect();
        self.store.reset();
        self.supervisor.reset();
        self.pending_request = None;
        info!("Left room");
        actions.push(self.notify("Left the room", Severity::Success));
        actions.push(ClientAction::Render);
        actions
    }
}
