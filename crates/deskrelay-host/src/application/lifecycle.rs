//! Connection lifecycle: relay channel state and the handshake.
//!
//! ```text
//! Disconnected ─▶ Connecting ─▶ Connected ⇄ Reconnecting
//!                                   │            │
//!                                   └────────────┴──▶ Disconnected (closed / shutdown)
//! ```
//!
//! On every entry into `Connected` the host may announce itself with
//! `host-ready{computerName, machineId}`.  If the relay has not acknowledged
//! it (with a session code) when the retry timer fires, the announcement is
//! sent exactly once more.

use std::time::Duration;

use deskrelay_core::protocol::messages::{HostReady, InboundMessage};

/// What the relay adapter reports about the channel.
#[derive(Debug, Clone, PartialEq)]
pub enum ChannelEvent {
    /// First successful connection.
    Connected,
    /// Connection re-established after a drop.
    Reconnected,
    /// Socket dropped; the adapter keeps retrying.
    Disconnected { reason: String },
    /// Channel closed for good (peer close or local shutdown).
    Closed { reason: String },
    Message(InboundMessage),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    Disconnected,
    Connecting,
    Connected,
    Reconnecting,
}

/// Handshake and heartbeat parameters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HandshakeSettings {
    pub computer_name: String,
    pub machine_id: String,
    /// How long to wait for an acknowledgment before re-announcing once.
    pub retry_after: Duration,
    pub heartbeat_interval: Duration,
    /// Re-send `host-ready` after a reconnect even if the previous
    /// announcement was acknowledged.
    pub reannounce_on_reconnect: bool,
}

impl Default for HandshakeSettings {
    fn default() -> Self {
        Self {
            computer_name: "deskrelay-host".to_string(),
            machine_id: String::new(),
            retry_after: Duration::from_secs(5),
            heartbeat_interval: Duration::from_secs(5),
            reannounce_on_reconnect: true,
        }
    }
}

/// Tracks channel state and whether the current announcement was acknowledged.
#[derive(Debug)]
pub struct ConnectionLifecycle {
    settings: HandshakeSettings,
    state: ConnectionState,
    acknowledged: bool,
    session_code: Option<String>,
}

impl ConnectionLifecycle {
    pub fn new(settings: HandshakeSettings) -> Self {
        Self {
            settings,
            state: ConnectionState::Connecting,
            acknowledged: false,
            session_code: None,
        }
    }

    pub fn settings(&self) -> &HandshakeSettings {
        &self.settings
    }

    pub fn state(&self) -> ConnectionState {
        self.state
    }

    pub fn is_connected(&self) -> bool {
        self.state == ConnectionState::Connected
    }

    pub fn session_code(&self) -> Option<&str> {
        self.session_code.as_deref()
    }

    /// The `host-ready` payload.  Always carries the machine id.
    pub fn announcement(&self) -> HostReady {
        HostReady {
            computer_name: self.settings.computer_name.clone(),
            machine_id: self.settings.machine_id.clone(),
        }
    }

    /// First connection.  Always announces.
    pub fn on_connected(&mut self) -> bool {
        self.state = ConnectionState::Connected;
        self.acknowledged = false;
        true
    }

    /// Reconnection.  Returns `true` if the host should announce again.
    ///
    /// An unacknowledged host always re-announces; an acknowledged one does so
    /// only when `reannounce_on_reconnect` is set.
    pub fn on_reconnected(&mut self) -> bool {
        self.state = ConnectionState::Connected;
        let announce = self.settings.reannounce_on_reconnect || !self.acknowledged;
        if announce {
            self.acknowledged = false;
        }
        announce
    }

    pub fn on_disconnected(&mut self) {
        self.state = ConnectionState::Reconnecting;
    }

    pub fn on_closed(&mut self) {
        self.state = ConnectionState::Disconnected;
    }

    /// Records the relay's acknowledgment.  Returns `true` on the first
    /// acknowledgment of the current announcement.
    pub fn on_acknowledged(&mut self, session_code: &str) -> bool {
        let first = !self.acknowledged;
        self.acknowledged = true;
        self.session_code = Some(session_code.to_string());
        first
    }

    /// Whether the retry timer should re-send the announcement.
    pub fn retry_due(&self) -> bool {
        self.is_connected() && !self.acknowledged
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    fn lifecycle(reannounce: bool) -> ConnectionLifecycle {
        ConnectionLifecycle::new(HandshakeSettings {
            computer_name: "desk-01".to_string(),
            machine_id: "abc".to_string(),
            reannounce_on_reconnect: reannounce,
            ..HandshakeSettings::default()
        })
    }

    #[test]
    fn test_starts_connecting() {
        assert_eq!(lifecycle(true).state(), ConnectionState::Connecting);
    }

    #[test]
    fn test_retry_due_until_acknowledged() {
        let mut lc = lifecycle(true);
        assert!(lc.on_connected());
        assert!(lc.retry_due());

        assert!(lc.on_acknowledged("S1"));

        assert!(!lc.retry_due());
        assert_eq!(lc.session_code(), Some("S1"));
    }

    #[test]
    fn test_retry_not_due_while_disconnected() {
        let mut lc = lifecycle(true);
        lc.on_connected();
        lc.on_disconnected();
        assert!(!lc.retry_due());
        assert_eq!(lc.state(), ConnectionState::Reconnecting);
    }

    #[test]
    fn test_reconnect_reannounces_when_policy_set() {
        let mut lc = lifecycle(true);
        lc.on_connected();
        lc.on_acknowledged("S1");
        lc.on_disconnected();

        assert!(lc.on_reconnected());
        assert!(lc.retry_due());
    }

    #[test]
    fn test_reconnect_skips_announce_when_acknowledged_and_policy_off() {
        let mut lc = lifecycle(false);
        lc.on_connected();
        lc.on_acknowledged("S1");
        lc.on_disconnected();

        assert!(!lc.on_reconnected());
        assert!(!lc.retry_due());
    }

    #[test]
    fn test_reconnect_announces_when_never_acknowledged_even_if_policy_off() {
        let mut lc = lifecycle(false);
        lc.on_connected();
        lc.on_disconnected();
        assert!(lc.on_reconnected());
    }

    #[test]
    fn test_announcement_includes_machine_id() {
        let lc = lifecycle(true);
        let hello = lc.announcement();
        assert_eq!(hello.computer_name, "desk-01");
        assert_eq!(hello.machine_id, "abc");
    }

    #[test]
    fn test_duplicate_ack_is_not_first() {
        let mut lc = lifecycle(true);
        lc.on_connected();
        assert!(lc.on_acknowledged("S1"));
        assert!(!lc.on_acknowledged("S1"));
    }
}
