/// Keyboard key identifier.
///
/// Back-ends map platform key codes into these variants where possible.
/// Anything else arrives as `Key::Unknown(code)` with the platform code.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub enum Key {
    Escape,
    Enter,
    Tab,
    Backspace,
    Space,

    Insert,
    Delete,
    Home,
    End,
    PageUp,
    PageDown,

    ArrowUp,
    ArrowDown,
    ArrowLeft,
    ArrowRight,

    Shift,
    Control,
    Alt,
    Meta,

    // Letters
    A, B, C, D, E, F, G, H, I, J, K, L, M,
    N, O, P, Q, R, S, T, U, V, W, X, Y, Z,

    // Digits
    Digit0, Digit1, Digit2, Digit3, Digit4,
    Digit5, Digit6, Digit7, Digit8, Digit9,

    // Function keys
    F1, F2, F3, F4, F5, F6,
    F7, F8, F9, F10, F11, F12,

    Unknown(u32),
}

/// What happened to a key.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub enum KeyAction {
    Press,
    Release,
    /// Auto-repeat while held.
    Repeat,
}

impl KeyAction {
    /// `true` for the initial press only, not for auto-repeat.
    #[inline]
    pub fn is_press(self) -> bool {
        self == KeyAction::Press
    }
}

/// Modifier keys held during a key event.
#[derive(Debug, Copy, Clone, Default, Eq, PartialEq, Hash)]
pub struct Modifiers {
    pub shift: bool,
    pub ctrl: bool,
    pub alt: bool,
    pub meta: bool,
}

impl Modifiers {
    pub const NONE: Modifiers = Modifiers {
        shift: false,
        ctrl: false,
        alt: false,
        meta: false,
    };

    pub const CTRL: Modifiers = Modifiers {
        ctrl: true,
        ..Modifiers::NONE
    };

    pub const META: Modifiers = Modifiers {
        meta: true,
        ..Modifiers::NONE
    };

    pub fn any(&self) -> bool {
        self.shift || self.ctrl || self.alt || self.meta
    }

    /// Ctrl on Linux/Windows, Cmd (meta) on macOS; either counts.
    pub fn command(&self) -> bool {
        self.ctrl || self.meta
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn command_accepts_ctrl_or_meta() {
        assert!(Modifiers::CTRL.command());
        assert!(Modifiers::META.command());
        assert!(!Modifiers { shift: true, alt: true, ..Modifiers::NONE }.command());
        assert!(!Modifiers::default().any());
    }

    #[test]
    fn repeat_is_not_a_press() {
        assert!(KeyAction::Press.is_press());
        assert!(!KeyAction::Repeat.is_press());
        assert!(!KeyAction::Release.is_press());
    }
}
