//! Browser key identifiers to OS-automation key names.
//!
//! Controllers send `KeyboardEvent.key` values (`"ArrowUp"`, `" "`, `"a"`).
//! The automation layer expects short lowercase names (`"up"`, `"space"`,
//! `"a"`).  Translation is one fixed table plus a single fallback rule:
//! identifiers not in the table are passed through lowercased.

use std::borrow::Cow;

use crate::domain::modifiers::Modifier;

/// Fixed translation table, keyed by browser identifier.
static KEY_TABLE: &[(&str, &str)] = &[
    ("ArrowUp", "up"),
    ("ArrowDown", "down"),
    ("ArrowLeft", "left"),
    ("ArrowRight", "right"),
    ("Backspace", "backspace"),
    ("Delete", "delete"),
    ("Insert", "insert"),
    ("Enter", "enter"),
    ("Tab", "tab"),
    ("Escape", "escape"),
    ("Home", "home"),
    ("End", "end"),
    ("PageUp", "pageup"),
    ("PageDown", "pagedown"),
    (" ", "space"),
    ("Control", "control"),
    ("Shift", "shift"),
    ("Alt", "alt"),
    ("Meta", "command"),
    ("CapsLock", "caps_lock"),
    ("PrintScreen", "printscreen"),
    ("F1", "f1"),
    ("F2", "f2"),
    ("F3", "f3"),
    ("F4", "f4"),
    ("F5", "f5"),
    ("F6", "f6"),
    ("F7", "f7"),
    ("F8", "f8"),
    ("F9", "f9"),
    ("F10", "f10"),
    ("F11", "f11"),
    ("F12", "f12"),
];

/// How the translator must treat a key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum KeyClass {
    /// CapsLock: tapped on down, ignored on up.
    CapsLock,
    /// One of the four tracked modifiers.
    Modifier(Modifier),
    /// Anything else, already translated to its automation name.
    Regular(String),
}

/// Stateless key translation.
pub struct KeyMapper;

impl KeyMapper {
    /// Automation name for a browser key identifier.
    ///
    /// Table hits are borrowed; misses fall back to `key.to_lowercase()`.
    pub fn action_key(key: &str) -> Cow<'static, str> {
        match KEY_TABLE.iter().find(|(from, _)| *from == key) {
            Some((_, to)) => Cow::Borrowed(to),
            None => Cow::Owned(key.to_lowercase()),
        }
    }

    /// Classifies a browser key identifier for dispatch.
    pub fn classify(key: &str) -> KeyClass {
        if key == "CapsLock" {
            return KeyClass::CapsLock;
        }
        if let Some(modifier) = Modifier::from_key(key) {
            return KeyClass::Modifier(modifier);
        }
        KeyClass::Regular(Self::action_key(key).into_owned())
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
