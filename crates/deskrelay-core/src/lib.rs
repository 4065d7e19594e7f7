//! # deskrelay-core
//!
//! Shared library for the DeskRelay host agent containing the relay message
//! types and their JSON codec, the key-name table, and the pure input state
//! used when replaying a controller's mouse and keyboard locally.
//!
//! It has zero dependencies on OS APIs, async runtimes, or network sockets.
//!
//! # Architecture overview (for beginners)
//!
//! DeskRelay lets a remote **controller** (usually a browser) drive this
//! computer, the **host**, through an intermediary **relay** server.  The
//! host never talks to the controller directly: every message is a named
//! event that the relay forwards.
//!
//! This crate defines:
//!
//! - **`protocol`** – The named events on the relay channel and how they are
//!   turned into JSON text frames and back.
//!
//! - **`domain`** – Pure logic: which modifier keys are held, how a pointer
//!   position in the controller's view maps onto the local screen, and how a
//!   wheel delta becomes discrete scroll ticks.
//!
//! - **`keymap`** – The fixed table that converts browser key identifiers
//!   (`"ArrowUp"`) into the names the OS-automation layer expects (`"up"`).

pub mod domain;
pub mod keymap;
pub mod protocol;

pub use domain::modifiers::{Modifier, ModifierState};
pub use domain::pointer::{scale_to_local, scroll_ticks, ScreenSize, ScrollDirection};
pub use keymap::{KeyClass, KeyMapper};
pub use protocol::codec::{decode_inbound, encode_outbound, ProtocolError};
pub use protocol::messages::{InboundMessage, OutboundMessage};
