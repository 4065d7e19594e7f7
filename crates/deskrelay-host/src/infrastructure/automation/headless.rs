//! Headless desktop: an in-process virtual screen used when no native
//! automation backend is compiled in.
//!
//! Injected input updates a pointer position and a set of held keys instead
//! of the real desktop, and captures render that state into a synthetic
//! frame (a gradient with a crosshair at the pointer).  This keeps the host
//! fully functional end to end, which is what the integration tests and
//! relay smoke tests run against.

use std::collections::BTreeSet;
use std::sync::{Mutex, MutexGuard, PoisonError};

use async_trait::async_trait;
use deskrelay_core::{
    protocol::messages::{KeyDirection, MouseButton},
    Modifier, ScreenSize, ScrollDirection,
};
use tracing::{debug, trace};

use crate::application::frame::{fit_within, CaptureError, RawFrame, ScreenCapture};
use crate::application::translate_input::{AutomationError, InputAutomation};

const CROSSHAIR_RADIUS: i64 = 6;

#[derive(Debug, Default)]
struct DesktopState {
    pointer: (i32, i32),
    held: BTreeSet<String>,
    clicks: u64,
    scroll_offset: i64,
    keystrokes: u64,
}

/// A snapshot of the virtual desktop, for logging and tests.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DesktopSnapshot {
    pub pointer: (i32, i32),
    pub held_keys: Vec<String>,
    pub clicks: u64,
    pub scroll_offset: i64,
    pub keystrokes: u64,
}

/// Virtual screen implementing both automation traits.
#[derive(Debug)]
pub struct HeadlessDesktop {
    size: ScreenSize,
    state: Mutex<DesktopState>,
}

impl HeadlessDesktop {
    pub fn new(size: ScreenSize) -> Self {
        Self {
            size,
            state: Mutex::new(DesktopState {
                pointer: (size.width as i32 / 2, size.height as i32 / 2),
                ..DesktopState::default()
            }),
        }
    }

    pub fn snapshot(&self) -> DesktopSnapshot {
        let state = self.lock();
        DesktopSnapshot {
            pointer: state.pointer,
            held_keys: state.held.iter().cloned().collect(),
            clicks: state.clicks,
            scroll_offset: state.scroll_offset,
            keystrokes: state.keystrokes,
        }
    }

    fn lock(&self) -> MutexGuard<'_, DesktopState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn render(&self, width: u32, height: u32) -> Vec<u8> {
        let (px, py) = self.lock().pointer;
        // Pointer position in frame pixels.
        let cx = i64::from(px) * i64::from(width) / i64::from(self.size.width.max(1));
        let cy = i64::from(py) * i64::from(height) / i64::from(self.size.height.max(1));

        let mut rgb = Vec::with_capacity(width as usize * height as usize * 3);
        for y in 0..i64::from(height) {
            for x in 0..i64::from(width) {
                let on_crosshair = (x == cx && (y - cy).abs() <= CROSSHAIR_RADIUS)
                    || (y == cy && (x - cx).abs() <= CROSSHAIR_RADIUS);
                if on_crosshair {
                    rgb.extend_from_slice(&[0xFF, 0xFF, 0xFF]);
                } else {
                    let r = (x * 255 / i64::from(width.max(1))) as u8;
                    let b = (y * 255 / i64::from(height.max(1))) as u8;
                    rgb.extend_from_slice(&[r, 0x30, b]);
                }
            }
        }
        rgb
    }
}

impl InputAutomation for HeadlessDesktop {
    fn screen_size(&self) -> Result<ScreenSize, AutomationError> {
        Ok(self.size)
    }

    fn move_pointer(&self, x: i32, y: i32) -> Result<(), AutomationError> {
        let max_x = self.size.width.saturating_sub(1) as i32;
        let max_y = self.size.height.saturating_sub(1) as i32;
        let mut state = self.lock();
        state.pointer = (x.clamp(0, max_x), y.clamp(0, max_y));
        trace!(x = state.pointer.0, y = state.pointer.1, "pointer moved");
        Ok(())
    }

    fn click(&self, button: MouseButton) -> Result<(), AutomationError> {
        let mut state = self.lock();
        state.clicks += 1;
        debug!(button = button.as_str(), "click");
        Ok(())
    }

    fn scroll_tick(&self, direction: ScrollDirection) -> Result<(), AutomationError> {
        let mut state = self.lock();
        state.scroll_offset += match direction {
            ScrollDirection::Up => -1,
            ScrollDirection::Down => 1,
        };
        Ok(())
    }

    fn key_toggle(&self, key: &str, direction: KeyDirection) -> Result<(), AutomationError> {
        let mut state = self.lock();
        match direction {
            KeyDirection::Down => {
                state.held.insert(key.to_string());
            }
            KeyDirection::Up => {
                state.held.remove(key);
            }
        }
        Ok(())
    }

    fn key_tap(&self, _key: &str, _modifiers: &[Modifier]) -> Result<(), AutomationError> {
        self.lock().keystrokes += 1;
        Ok(())
    }
}

#[async_trait]
impl ScreenCapture for HeadlessDesktop {
    async fn capture(&self, bounds: ScreenSize) -> Result<RawFrame, CaptureError> {
        let (width, height) = fit_within(self.size.width, self.size.height, bounds);
        if width == 0 || height == 0 {
            return Err(CaptureError::Unavailable("virtual screen has no area".into()));
        }
        Ok(RawFrame {
            width,
            height,
            rgb: self.render(width, height),
        })
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    fn desktop() -> HeadlessDesktop {
        HeadlessDesktop::new(ScreenSize::new(1920, 1080))
    }

    #[test]
    fn test_pointer_starts_centered() {
        assert_eq!(desktop().snapshot().pointer, (960, 540));
    }

    #[test]
    fn test_pointer_is_clamped_to_screen() {
        let d = desktop();
        d.move_pointer(5000, -20).unwrap();
        assert_eq!(d.snapshot().pointer, (1919, 0));
    }

    #[test]
    fn test_held_keys_follow_toggles() {
        // Arrange
        let d = desktop();

        // Act
        d.key_toggle("caps_lock", KeyDirection::Down).unwrap();
        d.key_toggle("shift", KeyDirection::Down).unwrap();
        d.key_toggle("shift", KeyDirection::Up).unwrap();

        // Assert
        assert_eq!(d.snapshot().held_keys, vec!["caps_lock".to_string()]);
    }

    #[test]
    fn test_scroll_offset_tracks_direction() {
        let d = desktop();
        d.scroll_tick(ScrollDirection::Down).unwrap();
        d.scroll_tick(ScrollDirection::Down).unwrap();
        d.scroll_tick(ScrollDirection::Up).unwrap();
        assert_eq!(d.snapshot().scroll_offset, 1);
    }

    #[tokio::test]
    async fn test_capture_fits_bounds_and_draws_pointer() {
        // Arrange
        let d = desktop();
        d.move_pointer(0, 0).unwrap();

        // Act
        let frame = d.capture(ScreenSize::new(960, 720)).await.unwrap();

        // Assert
        assert_eq!((frame.width, frame.height), (960, 540));
        assert_eq!(frame.rgb.len(), 960 * 540 * 3);
        assert_eq!(&frame.rgb[..3], &[0xFF, 0xFF, 0xFF]);
    }
}
