use std::fmt;

/// Keyboard key in the engine's neutral vocabulary.
///
/// Layout-independent (physical position), mirroring what the desktop
/// backends report. Native keys with no counterpart here map to
/// [`KeyCode::Unknown`].
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub enum KeyCode {
    Escape,
    Enter,
    Tab,
    Backspace,
    Space,

    A, B, C, D, E, F, G, H, I, J, K, L, M,
    N, O, P, Q, R, S, T, U, V, W, X, Y, Z,

    Num0, Num1, Num2, Num3, Num4,
    Num5, Num6, Num7, Num8, Num9,

    F1, F2, F3, F4, F5, F6,
    F7, F8, F9, F10, F11, F12,

    LeftShift, RightShift,
    LeftControl, RightControl,
    LeftAlt, RightAlt,
    LeftSuper, RightSuper,

    Up, Down, Left, Right,

    /// Sentinel for native keys outside this vocabulary.
    Unknown,
}

impl KeyCode {
    /// Every key except the sentinel, in declaration order.
    pub const ALL: [KeyCode; 65] = [
        KeyCode::Escape, KeyCode::Enter, KeyCode::Tab, KeyCode::Backspace, KeyCode::Space,
        KeyCode::A, KeyCode::B, KeyCode::C, KeyCode::D, KeyCode::E, KeyCode::F, KeyCode::G,
        KeyCode::H, KeyCode::I, KeyCode::J, KeyCode::K, KeyCode::L, KeyCode::M, KeyCode::N,
        KeyCode::O, KeyCode::P, KeyCode::Q, KeyCode::R, KeyCode::S, KeyCode::T, KeyCode::U,
        KeyCode::V, KeyCode::W, KeyCode::X, KeyCode::Y, KeyCode::Z,
        KeyCode::Num0, KeyCode::Num1, KeyCode::Num2, KeyCode::Num3, KeyCode::Num4,
        KeyCode::Num5, KeyCode::Num6, KeyCode::Num7, KeyCode::Num8, KeyCode::Num9,
        KeyCode::F1, KeyCode::F2, KeyCode::F3, KeyCode::F4, KeyCode::F5, KeyCode::F6,
        KeyCode::F7, KeyCode::F8, KeyCode::F9, KeyCode::F10, KeyCode::F11, KeyCode::F12,
        KeyCode::LeftShift, KeyCode::RightShift,
        KeyCode::LeftControl, KeyCode::RightControl,
        KeyCode::LeftAlt, KeyCode::RightAlt,
        KeyCode::LeftSuper, KeyCode::RightSuper,
        KeyCode::Up, KeyCode::Down, KeyCode::Left, KeyCode::Right,
    ];

    /// Parses a key name as printed by `Display` (case-insensitive).
    ///
    /// Returns `None` for unrecognised names; `"unknown"` is not accepted.
    pub fn from_name(name: &str) -> Option<Self> {
        let name = name.trim();
        Self::ALL
            .iter()
            .copied()
            .find(|k| k.to_string().eq_ignore_ascii_case(name))
    }
}

/// Mouse button in the neutral vocabulary.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub enum MouseButton {
    Left,
    Right,
    Middle,
    Button4,
    Button5,

    /// Sentinel for native buttons outside this vocabulary.
    Unknown,
}

impl MouseButton {
    pub const ALL: [MouseButton; 5] = [
        MouseButton::Left,
        MouseButton::Right,
        MouseButton::Middle,
        MouseButton::Button4,
        MouseButton::Button5,
    ];
}

/// What happened to a key or button.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub enum InputAction {
    Release,
    Press,
    /// Key held long enough for the OS to auto-repeat.
    Repeat,

    /// Sentinel for native actions outside this vocabulary.
    Unknown,
}

impl InputAction {
    pub const ALL: [InputAction; 3] = [InputAction::Release, InputAction::Press, InputAction::Repeat];
}

impl fmt::Display for KeyCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}", self)
    }
}

impl fmt::Display for MouseButton {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}", self)
    }
}

impl fmt::Display for InputAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}", self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn all_excludes_sentinels() {
        assert!(!KeyCode::ALL.contains(&KeyCode::Unknown));
        assert!(!MouseButton::ALL.contains(&MouseButton::Unknown));
        assert!(!InputAction::ALL.contains(&InputAction::Unknown));
    }

    #[test]
    fn all_keys_are_distinct() {
        let set: std::collections::HashSet<_> = KeyCode::ALL.iter().collect();
        assert_eq!(set.len(), KeyCode::ALL.len());
    }

    #[test]
    fn from_name_is_case_insensitive() {
        assert_eq!(KeyCode::from_name("escape"), Some(KeyCode::Escape));
        assert_eq!(KeyCode::from_name(" F11 "), Some(KeyCode::F11));
        assert_eq!(KeyCode::from_name("leftcontrol"), Some(KeyCode::LeftControl));
        assert_eq!(KeyCode::from_name("Num7"), Some(KeyCode::Num7));
    }

    #[test]
    fn from_name_rejects_sentinel_and_garbage() {
        assert_eq!(KeyCode::from_name("Unknown"), None);
        assert_eq!(KeyCode::from_name("Hyper"), None);
        assert_eq!(KeyCode::from_name(""), None);
    }
}
