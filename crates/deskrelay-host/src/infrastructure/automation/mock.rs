//! Mock OS-automation backend for tests.
//!
//! # Why a mock backend?
//!
//! A real backend moves the cursor and presses keys on whatever desktop the
//! tests happen to run on, and its effects cannot be observed from Rust.
//! `MockAutomation` records every call in a `Mutex<Vec<...>>` instead, so a
//! test can assert exactly what was injected and in what order.  It also
//! implements [`ScreenCapture`] by returning a solid grey frame of the
//! configured screen size.
//!
//! # Usage in tests
//!
//! ```ignore
//! let automation = Arc::new(MockAutomation::new());
//! let translator = InputTranslator::new(automation.clone());
//!
//! translator.handle_move(&req)?;
//!
//! assert_eq!(automation.moves(), vec![(960, 540)]);
//! ```
//!
//! # `should_fail` flag
//!
//! With `should_fail = true` every call returns an error, which exercises
//! the rejection paths without a broken OS.

use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Mutex, PoisonError};

use async_trait::async_trait;
use deskrelay_core::{
    protocol::messages::{KeyDirection, MouseButton},
    Modifier, ScreenSize, ScrollDirection,
};

use crate::application::frame::{CaptureError, RawFrame, ScreenCapture};
use crate::application::translate_input::{AutomationError, InputAutomation};

/// Records all automation calls without touching the OS.
pub struct MockAutomation {
    /// Reported by `screen_size` and used as the captured frame size.
    pub screen: ScreenSize,
    /// Every `move_pointer` target.
    pub pointer_moves: Mutex<Vec<(i32, i32)>>,
    pub clicks: Mutex<Vec<MouseButton>>,
    /// One entry per wheel notch.
    pub scroll_ticks: Mutex<Vec<ScrollDirection>>,
    pub key_toggles: Mutex<Vec<(String, KeyDirection)>>,
    /// Each tap with the modifiers held for it.
    pub key_taps: Mutex<Vec<(String, Vec<Modifier>)>>,
    captures: AtomicU32,
    /// When `true`, every method returns an error.
    pub should_fail: bool,
}

impl Default for MockAutomation {
    fn default() -> Self {
        Self::with_screen(ScreenSize::new(1920, 1080))
    }
}

impl MockAutomation {
    /// A 1920×1080 mock that records everything.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_screen(screen: ScreenSize) -> Self {
        Self {
            screen,
            pointer_moves: Mutex::new(Vec::new()),
            clicks: Mutex::new(Vec::new()),
            scroll_ticks: Mutex::new(Vec::new()),
            key_toggles: Mutex::new(Vec::new()),
            key_taps: Mutex::new(Vec::new()),
            captures: AtomicU32::new(0),
            should_fail: false,
        }
    }

    /// A mock whose every call fails.
    pub fn failing() -> Self {
        Self {
            should_fail: true,
            ..Self::default()
        }
    }

    pub fn moves(&self) -> Vec<(i32, i32)> {
        snapshot(&self.pointer_moves)
    }

    pub fn clicked(&self) -> Vec<MouseButton> {
        snapshot(&self.clicks)
    }

    pub fn scrolls(&self) -> Vec<ScrollDirection> {
        snapshot(&self.scroll_ticks)
    }

    pub fn taps(&self) -> Vec<(String, Vec<Modifier>)> {
        snapshot(&self.key_taps)
    }

    pub fn toggles(&self) -> Vec<(String, KeyDirection)> {
        snapshot(&self.key_toggles)
    }

    pub fn capture_count(&self) -> u32 {
        self.captures.load(Ordering::Relaxed)
    }

    fn check(&self) -> Result<(), AutomationError> {
        if self.should_fail {
            return Err(AutomationError::Backend("mock failure".into()));
        }
        Ok(())
    }
}

fn snapshot<T: Clone>(log: &Mutex<Vec<T>>) -> Vec<T> {
    log.lock().unwrap_or_else(PoisonError::into_inner).clone()
}

fn push<T>(log: &Mutex<Vec<T>>, item: T) {
    log.lock().unwrap_or_else(PoisonError::into_inner).push(item);
}

impl InputAutomation for MockAutomation {
    fn screen_size(&self) -> Result<ScreenSize, AutomationError> {
        self.check()?;
        Ok(self.screen)
    }

    fn move_pointer(&self, x: i32, y: i32) -> Result<(), AutomationError> {
        self.check()?;
        push(&self.pointer_moves, (x, y));
        Ok(())
    }

    fn click(&self, button: MouseButton) -> Result<(), AutomationError> {
        self.check()?;
        push(&self.clicks, button);
        Ok(())
    }

    fn scroll_tick(&self, direction: ScrollDirection) -> Result<(), AutomationError> {
        self.check()?;
        push(&self.scroll_ticks, direction);
        Ok(())
    }

    fn key_toggle(&self, key: &str, direction: KeyDirection) -> Result<(), AutomationError> {
        self.check()?;
        push(&self.key_toggles, (key.to_string(), direction));
        Ok(())
    }

    fn key_tap(&self, key: &str, modifiers: &[Modifier]) -> Result<(), AutomationError> {
        self.check()?;
        push(&self.key_taps, (key.to_string(), modifiers.to_vec()));
        Ok(())
    }
}

#[async_trait]
impl ScreenCapture for MockAutomation {
    async fn capture(&self, _bounds: ScreenSize) -> Result<RawFrame, CaptureError> {
        if self.should_fail {
            return Err(CaptureError::Unavailable("mock failure".into()));
        }
        self.captures.fetch_add(1, Ordering::Relaxed);
        let ScreenSize { width, height } = self.screen;
        Ok(RawFrame {
            width,
            height,
            rgb: vec![0x80; width as usize * height as usize * 3],
        })
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
