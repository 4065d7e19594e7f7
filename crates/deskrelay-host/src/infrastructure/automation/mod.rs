//! OS-automation adapters.
//!
//! - **`headless`** – `HeadlessDesktop`, a virtual screen the binary drives
//!   when no native backend is available.
//! - **`mock`** – `MockAutomation`, a call-recording double for tests.

pub mod headless;
pub mod mock;
