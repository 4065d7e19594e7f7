//! Infrastructure layer for the host agent.
//!
//! Contains the adapters behind the traits the application layer declares,
//! plus the process-level plumbing the binary needs.
//!
//! **Dependency rule**: this layer may depend on `application` and
//! `deskrelay_core`, but MUST NOT be imported by the `application` layer.
//!
//! # Sub-modules
//!
//! - **`relay`** – WebSocket client for the relay channel.  Reconnects on
//!   socket drops and reports `ChannelEvent`s into the agent's queue.
//!
//! - **`automation`** – `InputAutomation` / `ScreenCapture` implementations:
//!   a headless virtual desktop and a call-recording mock.
//!
//! - **`recorder`** – Motion-JPEG `RecordingSource` built on screen capture.
//!
//! - **`approver`** / **`save_target`** – the bundled connection approver and
//!   recording destination picker.
//!
//! - **`storage`** / **`identity`** – `config.toml` and the persisted
//!   `machine-id`.

pub mod approver;
pub mod automation;
pub mod identity;
pub mod recorder;
pub mod relay;
pub mod save_target;
pub mod storage;
