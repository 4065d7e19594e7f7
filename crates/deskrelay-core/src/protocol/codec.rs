//! JSON codec for relay-channel frames.
//!
//! Wire format (one WebSocket text frame per message):
//! ```text
//! {"event": "<kebab-case-name>", "data": <payload>}
//! ```
//! `data` may be absent for payload-less events such as `keep-alive` and
//! `controller-disconnected`.

use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::Value;
use thiserror::Error;

use crate::protocol::messages::{
    ConnectionRequest, ControllerConnected, HostReadyAck, InboundMessage, KeyEventRequest,
    MouseClickRequest, MouseMoveRequest, OutboundMessage, ScrollRequest, SenderRef,
};

/// Errors that can occur while encoding or decoding a frame.
#[derive(Debug, Error, PartialEq)]
pub enum ProtocolError {
    /// The frame is not a JSON object with a string `event` field.
    #[error("invalid frame: {0}")]
    InvalidFrame(String),

    /// The `event` name is not one the host understands.
    #[error("unknown event: {0}")]
    UnknownEvent(String),

    /// The event is known but its `data` does not have the expected shape.
    #[error("malformed payload for {event}: {reason}")]
    MalformedPayload { event: String, reason: String },

    /// Serialization of an outbound message failed.
    #[error("encode failed: {0}")]
    Encode(String),
}

#[derive(Deserialize)]
struct Envelope {
    event: String,
    #[serde(default)]
    data: Value,
}

// ── Public API ────────────────────────────────────────────────────────────────

/// Decodes one inbound text frame.
///
/// # Errors
///
/// Returns [`ProtocolError`] if the frame is not valid JSON, names an unknown
/// event, or carries a payload of the wrong shape.
///
/// # Examples
///
/// ```rust
/// use deskrelay_core::protocol::{decode_inbound, InboundMessage};
///
/// let msg = decode_inbound(r#"{"event":"request-screen","data":{"from":"c1"}}"#).unwrap();
/// assert_eq!(msg.event_name(), "request-screen");
/// ```
pub fn decode_inbound(frame: &str) -> Result<InboundMessage, ProtocolError> {
    let envelope: Envelope =
        serde_json::from_str(frame).map_err(|e| ProtocolError::InvalidFrame(e.to_string()))?;
    let event = envelope.event.as_str();
    let data = envelope.data;

    let msg = match event {
        // The relay has shipped both names; older builds send the bare code.
        "host-ready-ack" | "session-code" => {
            InboundMessage::HostReadyAck(HostReadyAck {
                session_code: bare_or_field(event, data, "sessionCode")?,
            })
        }
        "connection-request" => {
            InboundMessage::ConnectionRequest(payload::<ConnectionRequest>(event, data)?)
        }
        "controller-connected" => InboundMessage::ControllerConnected(ControllerConnected {
            controller_id: bare_or_field(event, data, "controllerId")?,
        }),
        "controller-disconnected" => InboundMessage::ControllerDisconnected,
        "request-screen" => InboundMessage::RequestScreen(payload::<SenderRef>(event, data)?),
        "remote-mouse-move" => {
            InboundMessage::RemoteMouseMove(payload::<MouseMoveRequest>(event, data)?)
        }
        "remote-mouse-click" => {
            InboundMessage::RemoteMouseClick(payload::<MouseClickRequest>(event, data)?)
        }
        "remote-mouse-scroll" => {
            InboundMessage::RemoteMouseScroll(payload::<ScrollRequest>(event, data)?)
        }
        "remote-key-event" => {
            InboundMessage::RemoteKeyEvent(payload::<KeyEventRequest>(event, data)?)
        }
        "start-screen-recording" => {
            InboundMessage::StartScreenRecording(payload::<SenderRef>(event, data)?)
        }
        "stop-screen-recording" => {
            InboundMessage::StopScreenRecording(payload::<SenderRef>(event, data)?)
        }
        "client-disconnect-request" => {
            InboundMessage::ClientDisconnectRequest(payload::<SenderRef>(event, data)?)
        }
        other => return Err(ProtocolError::UnknownEvent(other.to_string())),
    };
    Ok(msg)
}

/// Encodes one outbound message as a text frame.
///
/// # Errors
///
/// Returns [`ProtocolError::Encode`] if serialization fails.
pub fn encode_outbound(msg: &OutboundMessage) -> Result<String, ProtocolError> {
    serde_json::to_string(msg).map_err(|e| ProtocolError::Encode(e.to_string()))
}

// ── Helpers ───────────────────────────────────────────────────────────────────

fn payload<T: DeserializeOwned>(event: &str, data: Value) -> Result<T, ProtocolError> {
    serde_json::from_value(data).map_err(|e| ProtocolError::MalformedPayload {
        event: event.to_string(),
        reason: e.to_string(),
    })
}

/// Accepts either a bare JSON string or an object carrying `field`.
fn bare_or_field(event: &str, data: Value, field: &str) -> Result<String, ProtocolError> {
    let found = match &data {
        Value::String(s) => Some(s.clone()),
        Value::Object(map) => map.get(field).and_then(Value::as_str).map(str::to_string),
        _ => None,
    };
    found.ok_or_else(|| ProtocolError::MalformedPayload {
        event: event.to_string(),
        reason: format!("expected a string or an object with `{field}`"),
    })
}

// ── Tests ─────────────────────────────────────────────────────────────────────
