//! deskrelay-host library entry point.
//!
//! Re-exports all public modules so that integration tests in `tests/`
//! and the binary entry point in `main.rs` share the same module tree.
//!
//! # What does the host agent do? (for beginners)
//!
//! The *host* is the computer being controlled.  It never listens for
//! connections itself; instead it dials out to a relay server, and a remote
//! *controller* (usually a browser) reaches it through that relay.
//!
//! The host agent:
//!
//! 1. Connects to the relay and announces itself with `host-ready`
//!    (computer name + persistent machine id).
//! 2. Asks the local user (or a configured policy) whether to accept each
//!    controller that requests a session.  At most one controller is Active.
//! 3. Replays the Active controller's mouse and keyboard events locally.
//! 4. On request, streams low-quality JPEG screenshots to the controller once
//!    a second.
//! 5. On request, records the screen and saves the recording to disk when the
//!    controller stops it.

/// Application layer: use cases and the agent event loop.
pub mod application;

/// Infrastructure layer: relay client, automation backends, recorder,
/// configuration and identity.
pub mod infrastructure;
