//! Server address handling.
//!
//! One base URL serves both the room API (`http`/`https`) and the room
//! WebSocket, whose scheme mirrors the base: `wss` behind `https`, `ws`
//! otherwise.

use crate::config::ConfigError;
use crate::session::SessionIdentity;
use reqwest::Url;
use tracing::{debug, instrument};

/// Base address of the game server.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endpoint {
    base: Url,
}

impl Endpoint {
    /// Parses a server base URL such as `http://localhost:8000`.
    #[instrument]
    pub fn parse(server_url: &str) -> Result<Self, ConfigError> {
        let base = Url::parse(server_url.trim())
            .map_err(|e| ConfigError::new(format!("Invalid server URL {server_url:?}: {e}")))?;

        if !matches!(base.scheme(), "http" | "https" | "ws" | "wss") {
            return Err(ConfigError::new(format!(
                "Unsupported server URL scheme {:?}",
                base.scheme()
            )));
        }
        if base.cannot_be_a_base() {
            return Err(ConfigError::new(format!(
                "Server URL {server_url:?} cannot carry a path"
            )));
        }

        debug!(base = %base, "Parsed server endpoint");
        Ok(Self { base })
    }

    /// Whether the server is reached over TLS.
    pub fn is_secure(&self) -> bool {
        matches!(self.base.scheme(), "https" | "wss")
    }

    /// URL of a room API route, e.g. `api/create-room`.
    pub fn api_url(&self, route: &str) -> Url {
        let mut url = self.with_scheme(if self.is_secure() { "https" } else { "http" });
        if let Ok(mut segments) = url.path_segments_mut() {
            segments.pop_if_empty();
            segments.extend(route.split('/').filter(|s| !s.is_empty()));
        }
        url
    }

    /// WebSocket URL of `/ws/{room_id}/{player_id}`.
    pub fn room_socket_url(&self, identity: &SessionIdentity) -> Url {
        let mut url = self.with_scheme(if self.is_secure() { "wss" } else { "ws" });
        if let Ok(mut segments) = url.path_segments_mut() {
            segments
                .pop_if_empty()
                .push("ws")
                .push(&identity.room_id)
                .push(&identity.player_id);
        }
        url
    }

    fn with_scheme(&self, scheme: &str) -> Url {
        let mut url = self.base.clone();
        // Switching between the special schemes http/https/ws/wss always succeeds.
        let _ = url.set_scheme(scheme);
        url.set_query(None);
        url.set_fragment(None);
        url
    }
}
