//! All DeskRelay relay-channel message types.
//!
//! Every frame on the relay channel is a JSON object of the shape
//! `{"event": "<kebab-case-name>", "data": {...}}`.  Payload field names are
//! camelCase on the wire and snake_case in Rust.
//!
//! Inbound messages (relay → host) are decoded by hand in
//! [`crate::protocol::codec`] because a few of them arrive in more than one
//! shape.  Outbound messages (host → relay) use serde's adjacently tagged
//! representation directly.

use serde::{Deserialize, Serialize};

// ── Shared value types ────────────────────────────────────────────────────────

/// Direction of a key transition in a `remote-key-event`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum KeyDirection {
    Down,
    Up,
}

impl KeyDirection {
    /// Wire / automation name: `"down"` or `"up"`.
    pub fn as_str(self) -> &'static str {
        match self {
            KeyDirection::Down => "down",
            KeyDirection::Up => "up",
        }
    }
}

/// Modifier snapshot the controller attaches to every key event.
///
/// Missing fields default to `false`, and a missing `modifiers` object is the
/// same as all four released.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ModifierFlags {
    pub shift: bool,
    pub control: bool,
    pub alt: bool,
    pub meta: bool,
}

impl ModifierFlags {
    /// Returns `true` if at least one modifier is set.
    pub fn any(&self) -> bool {
        self.shift || self.control || self.alt || self.meta
    }
}

/// Mouse button accepted by `remote-mouse-click`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MouseButton {
    Left,
    Right,
    Middle,
}

impl MouseButton {
    /// Parses a wire button name.  Only `left`, `right`, and `middle` are valid.
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "left" => Some(MouseButton::Left),
            "right" => Some(MouseButton::Right),
            "middle" => Some(MouseButton::Middle),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            MouseButton::Left => "left",
            MouseButton::Right => "right",
            MouseButton::Middle => "middle",
        }
    }
}

// ── Inbound payloads ──────────────────────────────────────────────────────────

/// `host-ready-ack` / `session-code`: the relay acknowledged our announcement.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HostReadyAck {
    pub session_code: String,
}

/// `connection-request`: a controller asks to take over this host.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConnectionRequest {
    pub client_id: String,
}

/// `controller-connected`: relay notification naming the paired controller.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ControllerConnected {
    pub controller_id: String,
}

/// Any message whose only payload is the sender id (`request-screen`,
/// `start-screen-recording`, `stop-screen-recording`,
/// `client-disconnect-request`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SenderRef {
    pub from: String,
}

/// `remote-mouse-move`: absolute pointer position in the controller's view.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MouseMoveRequest {
    pub x: f64,
    pub y: f64,
    #[serde(default)]
    pub screen_width: Option<f64>,
    #[serde(default)]
    pub screen_height: Option<f64>,
    #[serde(default)]
    pub from: Option<String>,
}

/// `remote-mouse-click`.  A missing button means `left`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MouseClickRequest {
    #[serde(default)]
    pub button: Option<String>,
    #[serde(default)]
    pub from: Option<String>,
}

/// `remote-mouse-scroll`.  Negative `deltaY` scrolls up.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScrollRequest {
    pub delta_y: f64,
    #[serde(default)]
    pub from: Option<String>,
}

/// `remote-key-event`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeyEventRequest {
    #[serde(rename = "type")]
    pub direction: KeyDirection,
    /// Browser `KeyboardEvent.key` value, e.g. `"a"`, `"ArrowUp"`, `" "`.
    pub key: String,
    #[serde(default)]
    pub modifiers: ModifierFlags,
    #[serde(default)]
    pub from: Option<String>,
}

/// Every message the relay can deliver to the host.
#[derive(Debug, Clone, PartialEq)]
pub enum InboundMessage {
    HostReadyAck(HostReadyAck),
    ConnectionRequest(ConnectionRequest),
    ControllerConnected(ControllerConnected),
    ControllerDisconnected,
    RequestScreen(SenderRef),
    RemoteMouseMove(MouseMoveRequest),
    RemoteMouseClick(MouseClickRequest),
    RemoteMouseScroll(ScrollRequest),
    RemoteKeyEvent(KeyEventRequest),
    StartScreenRecording(SenderRef),
    StopScreenRecording(SenderRef),
    ClientDisconnectRequest(SenderRef),
}

impl InboundMessage {
    /// Canonical wire event name.  Used for logging (never log payloads).
    pub fn event_name(&self) -> &'static str {
        match self {
            InboundMessage::HostReadyAck(_) => "host-ready-ack",
            InboundMessage::ConnectionRequest(_) => "connection-request",
            InboundMessage::ControllerConnected(_) => "controller-connected",
            InboundMessage::ControllerDisconnected => "controller-disconnected",
            InboundMessage::RequestScreen(_) => "request-screen",
            InboundMessage::RemoteMouseMove(_) => "remote-mouse-move",
            InboundMessage::RemoteMouseClick(_) => "remote-mouse-click",
            InboundMessage::RemoteMouseScroll(_) => "remote-mouse-scroll",
            InboundMessage::RemoteKeyEvent(_) => "remote-key-event",
            InboundMessage::StartScreenRecording(_) => "start-screen-recording",
            InboundMessage::StopScreenRecording(_) => "stop-screen-recording",
            InboundMessage::ClientDisconnectRequest(_) => "client-disconnect-request",
        }
    }
}

// ── Outbound payloads ─────────────────────────────────────────────────────────

/// `host-ready`: handshake announcement.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HostReady {
    pub computer_name: String,
    pub machine_id: String,
}

/// `connection-response`: outcome of a `connection-request`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConnectionResponse {
    pub client_id: String,
    pub accepted: bool,
}

/// `screen-data`: one streamed frame as a `data:image/jpeg;base64,` URL.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScreenData {
    pub to: String,
    pub image_data: String,
}

/// Status values reported through `recording-status`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RecordingStatusKind {
    Initializing,
    Recording,
    Stopping,
    Saving,
    Cancelled,
    Error,
}

/// Optional progress attached to a `recording-status`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RecordingProgress {
    /// Saving progress: chunk `current` of `total` has been written.
    Saving {
        current: u32,
        total: u32,
        percentage: u8,
    },
    /// Periodic progress while capturing.
    #[serde(rename_all = "camelCase")]
    Elapsed { elapsed_ms: u64, estimated_bytes: u64 },
}

/// `recording-status`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecordingStatus {
    pub to: String,
    pub status: RecordingStatusKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub progress: Option<RecordingProgress>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl RecordingStatus {
    /// A bare status update with neither progress nor error.
    pub fn plain(to: impl Into<String>, status: RecordingStatusKind) -> Self {
        Self {
            to: to.into(),
            status,
            progress: None,
            error: None,
        }
    }

    /// An `error` status carrying `reason`.
    pub fn failed(to: impl Into<String>, reason: impl Into<String>) -> Self {
        Self {
            to: to.into(),
            status: RecordingStatusKind::Error,
            progress: None,
            error: Some(reason.into()),
        }
    }
}

/// `recording-complete`: the recording file has been written.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecordingComplete {
    pub to: String,
    pub recording_id: String,
    /// Milliseconds between the accepted start and the stop request.
    pub duration: u64,
    pub file_size: u64,
    pub file_path: String,
}

/// `disconnect-client`: the host drops a controller.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DisconnectClient {
    pub client_id: String,
}

/// `host-disconnect-ack`: reply to `client-disconnect-request`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HostDisconnectAck {
    pub to: String,
}

/// `request-rejected`: explicit refusal of an input or screen message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RequestRejected {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub to: Option<String>,
    /// Event name of the refused message.
    pub event: String,
    pub reason: String,
}

/// Every message the host sends to the relay.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", content = "data", rename_all = "kebab-case")]
pub enum OutboundMessage {
    HostReady(HostReady),
    ConnectionResponse(ConnectionResponse),
    KeepAlive,
    ScreenData(ScreenData),
    RecordingStatus(RecordingStatus),
    RecordingComplete(RecordingComplete),
    DisconnectClient(DisconnectClient),
    HostDisconnectAck(HostDisconnectAck),
    RequestRejected(RequestRejected),
}

impl OutboundMessage {
    /// Wire event name, for logging.
    pub fn event_name(&self) -> &'static str {
        match self {
            OutboundMessage::HostReady(_) => "host-ready",
            OutboundMessage::ConnectionResponse(_) => "connection-response",
            OutboundMessage::KeepAlive => "keep-alive",
            OutboundMessage::ScreenData(_) => "screen-data",
            OutboundMessage::RecordingStatus(_) => "recording-status",
            OutboundMessage::RecordingComplete(_) => "recording-complete",
            OutboundMessage::DisconnectClient(_) => "disconnect-client",
            OutboundMessage::HostDisconnectAck(_) => "host-disconnect-ack",
            OutboundMessage::RequestRejected(_) => "request-rejected",
        }
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mouse_button_from_name_accepts_only_three_buttons() {
        assert_eq!(MouseButton::from_name("left"), Some(MouseButton::Left));
        assert_eq!(MouseButton::from_name("right"), Some(MouseButton::Right));
        assert_eq!(MouseButton::from_name("middle"), Some(MouseButton::Middle));
        assert_eq!(MouseButton::from_name("Left"), None);
        assert_eq!(MouseButton::from_name("button4"), None);
    }

    #[test]
    fn test_modifier_flags_any() {
        assert!(!ModifierFlags::default().any());
        let flags = ModifierFlags {
            alt: true,
            ..ModifierFlags::default()
        };
        assert!(flags.any());
    }

    #[test]
    fn test_outbound_event_name_matches_serialized_tag() {
        let messages = [
            OutboundMessage::KeepAlive,
            OutboundMessage::DisconnectClient(DisconnectClient {
                client_id: "c1".to_string(),
            }),
            OutboundMessage::RecordingStatus(RecordingStatus::plain(
                "c1",
                RecordingStatusKind::Stopping,
            )),
        ];
        for msg in messages {
            let value = serde_json::to_value(&msg).unwrap();
            assert_eq!(value["event"], msg.event_name());
        }
    }

    #[test]
    fn test_recording_status_omits_absent_progress_and_error() {
        let json = serde_json::to_value(RecordingStatus::plain("c1", RecordingStatusKind::Recording))
            .unwrap();
        assert_eq!(json, serde_json::json!({"to": "c1", "status": "recording"}));
    }

    #[test]
    fn test_elapsed_progress_uses_camel_case() {
        let progress = RecordingProgress::Elapsed {
            elapsed_ms: 4000,
            estimated_bytes: 2048,
        };
        let json = serde_json::to_value(&progress).unwrap();
        assert_eq!(json, serde_json::json!({"elapsedMs": 4000, "estimatedBytes": 2048}));
    }
}
