//! InputTranslator: replays controller mouse/keyboard messages locally.
//!
//! This use case sits at the application layer and delegates every actual
//! pointer movement or key injection to an [`InputAutomation`] trait object.
//! The OS-facing implementations live in the infrastructure layer.

use std::sync::Arc;

use deskrelay_core::{
    domain::pointer::{scale_to_local, scroll_ticks},
    protocol::messages::{
        KeyDirection, KeyEventRequest, MouseButton, MouseClickRequest, MouseMoveRequest,
        ScrollRequest,
    },
    KeyClass, KeyMapper, Modifier, ModifierState, ScreenSize, ScrollDirection,
};
use thiserror::Error;

/// Error reported by an OS-automation backend.
#[derive(Debug, Error)]
pub enum AutomationError {
    #[error("automation backend error: {0}")]
    Backend(String),
    #[error("automation backend unavailable")]
    Unavailable,
}

/// Error type for translating one controller input message.
#[derive(Debug, Error)]
pub enum InputError {
    /// `screenWidth`/`screenHeight` missing, zero, or not a number.
    #[error("remote screen size missing or zero")]
    InvalidRemoteSize,
    #[error("unsupported mouse button: {0}")]
    UnsupportedButton(String),
    #[error(transparent)]
    Automation(#[from] AutomationError),
}

/// The "OS automation" capability: pointer movement, clicks, wheel ticks and
/// key injection on the local desktop.
///
/// Key names are the automation names produced by [`KeyMapper`]
/// (`"up"`, `"space"`, `"a"`), not browser identifiers.
pub trait InputAutomation: Send + Sync {
    /// Size of the local (primary) screen in pixels.
    fn screen_size(&self) -> Result<ScreenSize, AutomationError>;

    /// Moves the pointer to an absolute local position.
    fn move_pointer(&self, x: i32, y: i32) -> Result<(), AutomationError>;

    /// Clicks `button` once at the current pointer position.
    fn click(&self, button: MouseButton) -> Result<(), AutomationError>;

    /// Scrolls one discrete wheel notch.
    fn scroll_tick(&self, direction: ScrollDirection) -> Result<(), AutomationError>;

    /// Presses or releases `key`.
    fn key_toggle(&self, key: &str, direction: KeyDirection) -> Result<(), AutomationError>;

    /// Taps `key` while holding `modifiers` (press + release).
    fn key_tap(&self, key: &str, modifiers: &[Modifier]) -> Result<(), AutomationError>;
}

/// What a key event turned into.  Returned for logging and tests.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum KeyAction {
    Tap { key: String, modifiers: Vec<Modifier> },
    Toggle { key: String, direction: KeyDirection },
    /// CapsLock release: deliberately nothing.
    Ignored,
}

/// The input translation use case.
///
/// Owns the [`ModifierState`] for the current session.
pub struct InputTranslator {
    automation: Arc<dyn InputAutomation>,
    modifiers: ModifierState,
}

impl InputTranslator {
    pub fn new(automation: Arc<dyn InputAutomation>) -> Self {
        Self {
            automation,
            modifiers: ModifierState::new(),
        }
    }

    /// Scales the controller's pointer position to the local screen and moves
    /// the pointer there.
    ///
    /// # Errors
    ///
    /// [`InputError::InvalidRemoteSize`] if the remote size is missing or
    /// zero (nothing is moved), or an automation failure.
    pub fn handle_move(&self, req: &MouseMoveRequest) -> Result<(i32, i32), InputError> {
        let local = self.automation.screen_size()?;
        let (x, y) = scale_to_local(req.x, req.y, req.screen_width, req.screen_height, local)
            .ok_or(InputError::InvalidRemoteSize)?;
        self.automation.move_pointer(x, y)?;
        Ok((x, y))
    }

    /// Clicks the requested button, `left` when omitted.
    pub fn handle_click(&self, req: &MouseClickRequest) -> Result<MouseButton, InputError> {
        let button = match req.button.as_deref() {
            None => MouseButton::Left,
            Some(name) => MouseButton::from_name(name)
                .ok_or_else(|| InputError::UnsupportedButton(name.to_string()))?,
        };
        self.automation.click(button)?;
        Ok(button)
    }

    /// Issues `ceil(|deltaY| / 100)` single-notch scrolls (at least one).
    pub fn handle_scroll(
        &self,
        req: &ScrollRequest,
    ) -> Result<(ScrollDirection, u32), InputError> {
        let (direction, ticks) = scroll_ticks(req.delta_y);
        for _ in 0..ticks {
            self.automation.scroll_tick(direction)?;
        }
        Ok((direction, ticks))
    }

    /// Replays one key transition.
    ///
    /// - CapsLock: down taps `caps_lock`, up does nothing.
    /// - Shift/Control/Alt/Meta: updates the tracked state and toggles the
    ///   modifier itself.
    /// - Other keys: a down with any modifier active becomes one combo tap;
    ///   everything else is a plain press or release.
    pub fn handle_key(&mut self, req: &KeyEventRequest) -> Result<KeyAction, InputError> {
        match KeyMapper::classify(&req.key) {
            KeyClass::CapsLock => {
                if req.direction == KeyDirection::Up {
                    return Ok(KeyAction::Ignored);
                }
                let key = KeyMapper::action_key(&req.key).into_owned();
                self.automation.key_tap(&key, &[])?;
                Ok(KeyAction::Tap {
                    key,
                    modifiers: Vec::new(),
                })
            }
            KeyClass::Modifier(modifier) => {
                self.modifiers.apply(modifier, req.direction);
                let key = modifier.action_name().to_string();
                self.automation.key_toggle(&key, req.direction)?;
                Ok(KeyAction::Toggle {
                    key,
                    direction: req.direction,
                })
            }
            KeyClass::Regular(key) => {
                let active = self.modifiers.active_with(&req.modifiers);
                if req.direction == KeyDirection::Down && !active.is_empty() {
                    self.automation.key_tap(&key, &active)?;
                    Ok(KeyAction::Tap {
                        key,
                        modifiers: active,
                    })
                } else {
                    self.automation.key_toggle(&key, req.direction)?;
                    Ok(KeyAction::Toggle {
                        key,
                        direction: req.direction,
                    })
                }
            }
        }
    }

    pub fn modifiers(&self) -> &ModifierState {
        &self.modifiers
    }

    /// Forgets all held modifiers (session teardown).
    pub fn reset(&mut self) {
        self.modifiers.reset();
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
