//! Room lifecycle HTTP API client.
//!
//! Only the identifiers the server hands out are used; everything else about
//! rooms lives on the server.

use crate::endpoint::Endpoint;
use crate::error::ApiError;
use crate::session::{LocalIdentity, SessionIdentity};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument, warn};

/// Request to enter a room.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RoomRequest {
    /// Create a fresh room; we play X.
    Create,
    /// Join an existing room; we play O.
    Join {
        /// Room to join.
        room_id: String,
    },
}

impl RoomRequest {
    /// Side of the board this request gives us.
    pub fn local_identity(&self) -> LocalIdentity {
        match self {
            RoomRequest::Create => LocalIdentity::creator(),
            RoomRequest::Join { .. } => LocalIdentity::joiner(),
        }
    }

    /// Notification shown once the room is entered.
    pub fn success_message(&self) -> &'static str {
        match self {
            RoomRequest::Create => "Room created! Share the room ID with your friend.",
            RoomRequest::Join { .. } => "Joined room successfully!",
        }
    }

    /// Notification shown when the server gave no reason for a failure.
    pub fn failure_fallback(&self) -> &'static str {
        match self {
            RoomRequest::Create => "Failed to create room. Please try again.",
            RoomRequest::Join { .. } => "Failed to join room. Please check the room ID.",
        }
    }
}

/// Identifiers issued by create/join.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoomAssignment {
    /// Room id.
    pub room_id: String,
    /// Our player id.
    pub player_id: String,
    /// Server message, informational only.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl RoomAssignment {
    /// The session identity these ids form.
    pub fn identity(&self) -> SessionIdentity {
        SessionIdentity::new(self.room_id.clone(), self.player_id.clone())
    }
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    #[serde(default)]
    detail: Option<serde_json::Value>,
}

/// Room lifecycle operations.
#[async_trait]
pub trait RoomApi: Send + Sync {
    /// `POST /api/create-room`.
    async fn create_room(&self) -> Result<RoomAssignment, ApiError>;

    /// `POST /api/join-room?room_id=<id>`.
    async fn join_room(&self, room_id: &str) -> Result<RoomAssignment, ApiError>;

    /// Performs `request`.
    async fn request(&self, request: &RoomRequest) -> Result<RoomAssignment, ApiError> {
        match request {
            RoomRequest::Create => self.create_room().await,
            RoomRequest::Join { room_id } => self.join_room(room_id).await,
        }
    }
}

/// [`RoomApi`] over HTTP.
#[derive(Debug, Clone)]
pub struct HttpRoomApi {
    endpoint: Endpoint,
    client: reqwest::Client,
}

impl HttpRoomApi {
    /// Creates a client for the server at `endpoint`.
    pub fn new(endpoint: Endpoint) -> Self {
        Self {
            endpoint,
            client: reqwest::Client::new(),
        }
    }

    async fn read_assignment(response: reqwest::Response) -> Result<RoomAssignment, ApiError> {
        let status = response.status();
        if status.is_success() {
            let assignment: RoomAssignment = response.json().await?;
            debug!(room_id = %assignment.room_id, "Room assigned");
            return Ok(assignment);
        }

        let body = response.text().await.unwrap_or_default();
        warn!(status = %status, body = %body, "Room request rejected");
        let error = ApiError::new(format!("HTTP {}", status));
        // FastAPI sends `detail` as a string for HTTPException, as a list for validation.
        let detail = serde_json::from_str::<ErrorBody>(&body)
            .ok()
            .and_then(|b| b.detail)
            .and_then(|d| d.as_str().map(str::to_string));
        Err(match detail {
            Some(detail) => error.with_detail(detail),
            None => error,
        })
    }
}

#[async_trait]
impl RoomApi for HttpRoomApi {
    #[instrument(skip(self))]
    async fn create_room(&self) -> Result<RoomAssignment, ApiError> {
        let url = self.endpoint.api_url("api/create-room");
        info!(%url, "Creating room");
        let response = self
            .client
            .post(url)
            .header("Content-Type", "application/json")
            .send()
            .await?;
        Self::read_assignment(response).await
    }

    #[instrument(skip(self))]
    async fn join_room(&self, room_id: &str) -> Result<RoomAssignment, ApiError> {
        let mut url = self.endpoint.api_url("api/join-room");
        url.query_pairs_mut().append_pair("room_id", room_id);
        info!(%url, room_id, "Joining room");
        let response = self
            .client
            .post(url)
            .header("Content-Type", "application/json")
            .send()
            .await?;
        Self::read_assignment(response).await
    }
}
