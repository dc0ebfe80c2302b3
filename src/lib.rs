//! Tic-tac-toe Online - client for a two-player room server
//!
//! Keeps a locally held game state in sync with an authoritative server over
//! a WebSocket, with heartbeat probes and automatic reconnection.
//!
//! # Architecture
//!
//! - **Transport**: ownership of the single room connection
//! - **Router**: classifies inbound messages into state updates and notifications
//! - **Store**: last authoritative snapshot plus derived queries
//! - **Heartbeat / Reconnect**: liveness probes and bounded linear backoff
//! - **Client**: the state machine tying the above together, free of I/O
//! - **Runtime**: tokio driver executing the client's actions
//!
//! # Example
//!
//! ```no_run
//! use tictactoe_online::{ClientConfig, Endpoint, GameClient, HttpRoomApi, Runtime, TextFrontend};
//!
//! # async fn example() -> anyhow::Result<()> {
//! let config = ClientConfig::default();
//! let client = GameClient::from_config(&config)?;
//! let api = HttpRoomApi::new(Endpoint::parse(config.server_url())?);
//! let (_commands_tx, commands_rx) = tokio::sync::mpsc::channel(16);
//! Runtime::new(client, api, TextFrontend::new(std::io::stdout()))
//!     .run(commands_rx)
//!     .await?;
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]
#![forbid(unsafe_code)]

// Private module declarations
mod api;
mod client;
mod config;
mod endpoint;
mod error;
mod frontend;
mod games;
mod heartbeat;
mod notify;
mod protocol;
mod reconnect;
mod router;
mod runtime;
mod session;
mod store;
mod transport;

// Crate-level exports - Room API
pub use api::{HttpRoomApi, RoomApi, RoomAssignment, RoomRequest};

// Crate-level exports - Client state machine
pub use client::{
    CONNECTION_LOST_MESSAGE, ClientAction, ClientEvent, GameClient, RequestId, UserCommand,
};

// Crate-level exports - Configuration
pub use config::{ClientConfig, ConfigError, SERVER_URL_ENV};
pub use endpoint::Endpoint;

// Crate-level exports - Errors
pub use error::{ApiError, ProtocolError, SendError, StoreError};

// Crate-level exports - Presentation
pub use frontend::{Frontend, InputCommand, InputError, TextFrontend};

// Crate-level exports - Game types (tic-tac-toe)
pub use games::tictactoe::{
    BOARD_CELLS, Board, Cell, GameSnapshot, GameStatus, LastMove, Mark, RoomPlayer,
};

// Crate-level exports - Connection core
pub use heartbeat::{DEFAULT_HEARTBEAT_INTERVAL, HeartbeatMonitor};
pub use notify::{DEFAULT_NOTIFICATION_TIMEOUT, Notification, NotificationCenter, NotificationId, Severity};
pub use protocol::{ClientMessage, MessageKind, ServerMessage};
pub use reconnect::{
    BackoffToken, DEFAULT_MAX_RECONNECT_ATTEMPTS, DEFAULT_RECONNECT_BASE_DELAY, ReconnectDecision,
    ReconnectPolicy, ReconnectSupervisor, SupervisorState,
};
pub use router::{Dispatch, MessageRouter, Route};
pub use runtime::Runtime;
pub use session::{LocalIdentity, PlayerId, RoomId, SessionIdentity};
pub use store::GameStateStore;
pub use transport::{ConnectionState, ConnectionToken, TransportAction, TransportSession};
