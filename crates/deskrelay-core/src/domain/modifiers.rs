//! Press state for the four modifier keys.
//!
//! The controller attaches a modifier snapshot to every key event, but the
//! host also remembers which modifiers it has itself pressed through explicit
//! `Shift`/`Control`/`Alt`/`Meta` key-down events.  A combo tap uses the union
//! of both, so a held modifier still applies when a browser drops the flag.

use crate::protocol::messages::{KeyDirection, ModifierFlags};

/// One of the four tracked modifier keys.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Modifier {
    Shift,
    Control,
    Alt,
    Meta,
}

impl Modifier {
    /// All modifiers in the order they are listed in a combo action.
    pub const ALL: [Modifier; 4] = [
        Modifier::Shift,
        Modifier::Control,
        Modifier::Alt,
        Modifier::Meta,
    ];

    /// Name understood by the OS-automation layer.  Meta maps to `command`.
    pub fn action_name(self) -> &'static str {
        match self {
            Modifier::Shift => "shift",
            Modifier::Control => "control",
            Modifier::Alt => "alt",
            Modifier::Meta => "command",
        }
    }

    /// Recognises the browser key identifiers `Shift`, `Control`, `Alt`, `Meta`.
    pub fn from_key(key: &str) -> Option<Self> {
        match key {
            "Shift" => Some(Modifier::Shift),
            "Control" => Some(Modifier::Control),
            "Alt" => Some(Modifier::Alt),
            "Meta" => Some(Modifier::Meta),
            _ => None,
        }
    }

    fn flag(self, flags: &ModifierFlags) -> bool {
        match self {
            Modifier::Shift => flags.shift,
            Modifier::Control => flags.control,
            Modifier::Alt => flags.alt,
            Modifier::Meta => flags.meta,
        }
    }
}

/// Pressed/released state for shift, control, alt and meta.
///
/// Mutated only by [`ModifierState::apply`] and cleared by
/// [`ModifierState::reset`] on session teardown.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ModifierState {
    pressed: ModifierFlags,
}

impl ModifierState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records a down/up transition for `modifier`.
    ///
    /// Returns `true` if the stored state changed.  A repeated down for a held
    /// key is a no-op on state.
    pub fn apply(&mut self, modifier: Modifier, direction: KeyDirection) -> bool {
        let pressed = direction == KeyDirection::Down;
        let slot = match modifier {
            Modifier::Shift => &mut self.pressed.shift,
            Modifier::Control => &mut self.pressed.control,
            Modifier::Alt => &mut self.pressed.alt,
            Modifier::Meta => &mut self.pressed.meta,
        };
        let changed = *slot != pressed;
        *slot = pressed;
        changed
    }

    /// Returns `true` if `modifier` is currently held.
    pub fn is_pressed(&self, modifier: Modifier) -> bool {
        modifier.flag(&self.pressed)
    }

    /// Returns `true` if any modifier is held.
    pub fn any_pressed(&self) -> bool {
        self.pressed.any()
    }

    /// Modifiers active for an event: the event's own flags OR the held state,
    /// in shift, control, alt, meta order.
    pub fn active_with(&self, event_flags: &ModifierFlags) -> Vec<Modifier> {
        Modifier::ALL
            .into_iter()
            .filter(|m| m.flag(event_flags) || self.is_pressed(*m))
            .collect()
    }

    /// Releases everything.  Called only on session teardown.
    pub fn reset(&mut self) {
        self.pressed = ModifierFlags::default();
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
