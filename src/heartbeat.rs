//! Heartbeat monitor.
//!
//! Driven by one process-wide timer. Each tick sends a `ping` when the
//! transport is connected and does nothing otherwise, so ticking with no room
//! at all is fine. `pong` answers only update the bookkeeping here.

use crate::protocol::ClientMessage;
use crate::transport::{TransportAction, TransportSession};
use std::time::{Duration, Instant};
use tracing::{debug, instrument, warn};

/// Default interval between liveness probes.
pub const DEFAULT_HEARTBEAT_INTERVAL: Duration = Duration::from_secs(30);

/// Liveness probe bookkeeping.
#[derive(Debug, Clone)]
pub struct HeartbeatMonitor {
    interval: Duration,
    last_ping: Option<Instant>,
    last_pong: Option<Instant>,
    pings_sent: u64,
}

impl Default for HeartbeatMonitor {
    fn default() -> Self {
        Self::new(DEFAULT_HEARTBEAT_INTERVAL)
    }
}

impl HeartbeatMonitor {
    /// Shortest tick interval accepted.
    pub const MIN_INTERVAL: Duration = Duration::from_millis(1);

    /// Creates a monitor ticking every `interval`, at least [`Self::MIN_INTERVAL`].
    pub fn new(interval: Duration) -> Self {
        Self {
            interval: interval.max(Self::MIN_INTERVAL),
            last_ping: None,
            last_pong: None,
            pings_sent: 0,
        }
    }

    /// Tick interval the runtime should use.
    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Handles one timer tick.
    ///
    /// Returns the ping to send, or `None` when not connected.
    #[instrument(skip(self, transport), fields(state = %transport.state()))]
    pub fn tick(&mut self, transport: &TransportSession, now: Instant) -> Option<TransportAction> {
        if !transport.is_connected() {
            return None;
        }
        match transport.send(&ClientMessage::Ping) {
            Ok(action) => {
                self.last_ping = Some(now);
                self.pings_sent += 1;
                debug!(pings_sent = self.pings_sent, "Sending ping");
                Some(action)
            }
            Err(e) => {
                warn!(error = %e, "Ping not sent");
                None
            }
        }
    }

    /// Records a `pong` from the server.
    #[instrument(skip(self))]
    pub fn record_pong(&mut self, now: Instant) {
        self.last_pong = Some(now);
    }

    /// When the last ping went out.
    pub fn last_ping(&self) -> Option<Instant> {
        self.last_ping
    }

    /// When the last pong arrived.
    pub fn last_pong(&self) -> Option<Instant> {
        self.last_pong
    }

    /// Total pings sent by this process.
    pub fn pings_sent(&self) -> u64 {
        self.pings_sent
    }
}
