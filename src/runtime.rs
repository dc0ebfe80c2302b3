//! Tokio driver for [`GameClient`].
//!
//! Executes client actions against real sockets, the room API and timers,
//! and feeds every result back through one event channel. The client itself
//! is only touched from [`Runtime::run`], one event at a time.

use crate::api::RoomApi;
use crate::client::{ClientAction, ClientEvent, GameClient};
use crate::frontend::{Frontend, InputCommand};
use crate::transport::ConnectionToken;
use anyhow::Result;
use futures::{SinkExt, StreamExt};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::mpsc;
use tokio::time::MissedTickBehavior;
use tokio_tungstenite::connect_async;
use tokio_tungstenite::tungstenite::Message;
use tracing::{debug, info, instrument, warn};

/// Drives a [`GameClient`] until the player quits.
pub struct Runtime<A, F> {
    client: GameClient,
    api: Arc<A>,
    frontend: F,
    events_tx: mpsc::UnboundedSender<ClientEvent>,
    events_rx: mpsc::UnboundedReceiver<ClientEvent>,
    connections: HashMap<ConnectionToken, mpsc::UnboundedSender<String>>,
}

impl<A, F> Runtime<A, F>
where
    A: RoomApi + 'static,
    F: Frontend,
{
    /// Creates a runtime for `client`.
    pub fn new(client: GameClient, api: A, frontend: F) -> Self {
        let (events_tx, events_rx) = mpsc::unbounded_channel();
        Self {
            client,
            api: Arc::new(api),
            frontend,
            events_tx,
            events_rx,
            connections: HashMap::new(),
        }
    }

    /// Runs until `commands` yields [`InputCommand::Quit`] or closes.
    ///
    /// Returns the frontend so callers can inspect what was shown.
    #[instrument(skip_all)]
    pub async fn run(mut self, mut commands: mpsc::Receiver<InputCommand>) -> Result<F> {
        let period = self.client.heartbeat().interval();
        let mut heartbeat = tokio::time::interval_at(tokio::time::Instant::now() + period, period);
        heartbeat.set_missed_tick_behavior(MissedTickBehavior::Delay);

        info!(?period, "Client runtime started");
        self.frontend.render(&self.client)?;

        loop {
            let event = tokio::select! {
                command = commands.recv() => match command {
                    Some(InputCommand::Play(command)) => ClientEvent::User(command),
                    Some(InputCommand::Quit) | None => break,
                },
                Some(event) = self.events_rx.recv() => event,
                _ = heartbeat.tick() => ClientEvent::HeartbeatTick,
            };
            self.handle(event)?;
        }

        info!("Client runtime stopping");
        for action in self.client.leave_room() {
            if let ClientAction::Disconnect { token } = action {
                self.connections.remove(&token);
            }
        }
        Ok(self.frontend)
    }

    fn handle(&mut self, event: ClientEvent) -> Result<()> {
        if let ClientEvent::ConnectionClosed { token } = &event {
            self.connections.remove(token);
        }
        let actions = self.client.handle(event, Instant::now());
        for action in actions {
            self.execute(action)?;
        }
        Ok(())
    }

    fn execute(&mut self, action: ClientAction) -> Result<()> {
        match action {
            ClientAction::Connect { token, url } => {
                let (tx, rx) = mpsc::unbounded_channel();
                self.connections.insert(token, tx);
                tokio::spawn(run_connection(token, url, rx, self.events_tx.clone()));
            }
            ClientAction::Disconnect { token } => {
                // Dropping the outbound sender ends the connection task.
                if self.connections.remove(&token).is_some() {
                    debug!(%token, "Connection released");
                }
            }
            ClientAction::Send { token, frame } => match self.connections.get(&token) {
                Some(tx) if tx.send(frame).is_ok() => {}
                _ => warn!(%token, "Frame for a connection that is gone"),
            },
            ClientAction::RequestRoom { request, kind } => {
                let api = Arc::clone(&self.api);
                let events = self.events_tx.clone();
                tokio::spawn(async move {
                    let event = match api.request(&kind).await {
                        Ok(assignment) => ClientEvent::RoomAssigned {
                            request,
                            kind,
                            assignment,
                        },
                        Err(error) => ClientEvent::RoomRequestFailed {
                            request,
                            kind,
                            error,
                        },
                    };
                    let _ = events.send(event);
                });
            }
            ClientAction::ScheduleReconnect { token, delay } => {
                let events = self.events_tx.clone();
                tokio::spawn(async move {
                    tokio::time::sleep(delay).await;
                    let _ = events.send(ClientEvent::ReconnectDue { token });
                });
            }
            ClientAction::Notify {
                notification,
                dismiss_after,
            } => {
                self.frontend.notify(&notification)?;
                let events = self.events_tx.clone();
                let id = notification.id;
                tokio::spawn(async move {
                    tokio::time::sleep(dismiss_after).await;
                    let _ = events.send(ClientEvent::NotificationExpired { id });
                });
            }
            ClientAction::Render => self.frontend.render(&self.client)?,
        }
        Ok(())
    }
}

/// Owns one WebSocket for its whole life.
///
/// Always ends by reporting [`ClientEvent::ConnectionClosed`], whether the
/// handshake failed, the server closed, or the outbound sender was dropped.
#[instrument(skip(outbound, events))]
async fn run_connection(
    token: ConnectionToken,
    url: String,
    mut outbound: mpsc::UnboundedReceiver<String>,
    events: mpsc::UnboundedSender<ClientEvent>,
) {
    let ws = match connect_async(url.as_str()).await {
        Ok((ws, _)) => ws,
        Err(e) => {
            let _ = events.send(ClientEvent::ConnectionErrored {
                token,
                reason: e.to_string(),
            });
            let _ = events.send(ClientEvent::ConnectionClosed { token });
            return;
        }
    };

    let _ = events.send(ClientEvent::ConnectionOpened { token });
    let (mut ws_tx, mut ws_rx) = ws.split();

    loop {
        tokio::select! {
            frame = outbound.recv() => {
                let Some(frame) = frame else {
                    debug!("Outbound closed, sending close frame");
                    let _ = ws_tx.send(Message::Close(None)).await;
                    break;
                };
                if let Err(e) = ws_tx.send(Message::Text(frame.into())).await {
                    let _ = events.send(ClientEvent::ConnectionErrored {
                        token,
                        reason: e.to_string(),
                    });
                    break;
                }
            }
            msg = ws_rx.next() => match msg {
                Some(Ok(Message::Text(text))) => {
                    let _ = events.send(ClientEvent::FrameReceived {
                        token,
                        text: text.as_str().to_string(),
                    });
                }
                Some(Ok(Message::Close(_))) | None => break,
                Some(Ok(_)) => {}
                Some(Err(e)) => {
                    let _ = events.send(ClientEvent::ConnectionErrored {
                        token,
                        reason: e.to_string(),
                    });
                    break;
                }
            },
        }
    }

    let _ = events.send(ClientEvent::ConnectionClosed { token });
}
