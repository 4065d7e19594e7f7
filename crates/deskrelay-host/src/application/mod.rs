//! Application layer use cases for the host agent.
//!
//! # What does the host do?
//!
//! - **`translate_input`** – Replays controller mouse and keyboard messages
//!   through an injected `InputAutomation` backend, tracking modifier state.
//!
//! - **`session_registry`** – Who the Active controller is, which connection
//!   requests are pending, and whether a sender is authorized.
//!
//! - **`stream_screen`** / **`frame`** – The periodic capture-and-send loop
//!   and the JPEG data-URL encoding of each frame.
//!
//! - **`record_screen`** – The single-recording state machine and the
//!   finalize-and-save step.
//!
//! - **`lifecycle`** / **`timers`** – Relay channel state, the `host-ready`
//!   handshake, and the named timers (heartbeat, handshake retry, streaming
//!   tick, recording progress).
//!
//! - **`agent`** – `HostAgent`, the event loop that owns all of the above and
//!   dispatches every inbound message.

pub mod agent;
pub mod frame;
pub mod lifecycle;
pub mod record_screen;
pub mod session_registry;
pub mod stream_screen;
pub mod timers;
pub mod translate_input;
