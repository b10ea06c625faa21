//! Mapping tables between the neutral vocabulary and winit's.
//!
//! Both shipped backends speak winit's physical key codes, mouse buttons and
//! element states, so this is the only translation layer in the engine.
//! Native → neutral is total; anything unlisted becomes `Unknown`.
//! Neutral → native is `None` only for the sentinels.

use winit::event::{ElementState, MouseButton as NativeButton};
use winit::keyboard::KeyCode as NativeKey;

use super::types::{InputAction, KeyCode, MouseButton};

// Single source for both directions so the tables cannot drift apart.
macro_rules! key_table {
    ($($neutral:ident <=> $native:ident),+ $(,)?) => {
        /// Translates a winit physical key code.
        pub fn key_from_native(code: NativeKey) -> KeyCode {
            match code {
                $(NativeKey::$native => KeyCode::$neutral,)+
                _ => KeyCode::Unknown,
            }
        }

        /// Translates a neutral key into winit's vocabulary.
        pub fn key_to_native(key: KeyCode) -> Option<NativeKey> {
            match key {
                $(KeyCode::$neutral => Some(NativeKey::$native),)+
                KeyCode::Unknown => None,
            }
        }
    };
}

key_table! {
    Escape <=> Escape,
    Enter <=> Enter,
    Tab <=> Tab,
    Backspace <=> Backspace,
    Space <=> Space,

    A <=> KeyA, B <=> KeyB, C <=> KeyC, D <=> KeyD, E <=> KeyE, F <=> KeyF,
    G <=> KeyG, H <=> KeyH, I <=> KeyI, J <=> KeyJ, K <=> KeyK, L <=> KeyL,
    M <=> KeyM, N <=> KeyN, O <=> KeyO, P <=> KeyP, Q <=> KeyQ, R <=> KeyR,
    S <=> KeyS, T <=> KeyT, U <=> KeyU, V <=> KeyV, W <=> KeyW, X <=> KeyX,
    Y <=> KeyY, Z <=> KeyZ,

    Num0 <=> Digit0, Num1 <=> Digit1, Num2 <=> Digit2, Num3 <=> Digit3, Num4 <=> Digit4,
    Num5 <=> Digit5, Num6 <=> Digit6, Num7 <=> Digit7, Num8 <=> Digit8, Num9 <=> Digit9,

    F1 <=> F1, F2 <=> F2, F3 <=> F3, F4 <=> F4, F5 <=> F5, F6 <=> F6,
    F7 <=> F7, F8 <=> F8, F9 <=> F9, F10 <=> F10, F11 <=> F11, F12 <=> F12,

    LeftShift <=> ShiftLeft,
    RightShift <=> ShiftRight,
    LeftControl <=> ControlLeft,
    RightControl <=> ControlRight,
    LeftAlt <=> AltLeft,
    RightAlt <=> AltRight,
    LeftSuper <=> SuperLeft,
    RightSuper <=> SuperRight,

    Up <=> ArrowUp,
    Down <=> ArrowDown,
    Left <=> ArrowLeft,
    Right <=> ArrowRight,
}

pub fn button_from_native(button: NativeButton) -> MouseButton {
    match button {
        NativeButton::Left => MouseButton::Left,
        NativeButton::Right => MouseButton::Right,
        NativeButton::Middle => MouseButton::Middle,
        NativeButton::Back => MouseButton::Button4,
        NativeButton::Forward => MouseButton::Button5,
        NativeButton::Other(_) => MouseButton::Unknown,
    }
}

pub fn button_to_native(button: MouseButton) -> Option<NativeButton> {
    match button {
        MouseButton::Left => Some(NativeButton::Left),
        MouseButton::Right => Some(NativeButton::Right),
        MouseButton::Middle => Some(NativeButton::Middle),
        MouseButton::Button4 => Some(NativeButton::Back),
        MouseButton::Button5 => Some(NativeButton::Forward),
        MouseButton::Unknown => None,
    }
}

/// Translates a native element state plus winit's key-repeat flag.
///
/// Repeat only exists for presses; a "repeated release" is reported as a
/// plain release.
pub fn action_from_native(state: ElementState, repeat: bool) -> InputAction {
    match (state, repeat) {
        (ElementState::Pressed, false) => InputAction::Press,
        (ElementState::Pressed, true) => InputAction::Repeat,
        (ElementState::Released, _) => InputAction::Release,
    }
}

pub fn action_to_native(action: InputAction) -> Option<(ElementState, bool)> {
    match action {
        InputAction::Press => Some((ElementState::Pressed, false)),
        InputAction::Repeat => Some((ElementState::Pressed, true)),
        InputAction::Release => Some((ElementState::Released, false)),
        InputAction::Unknown => None,
    }
}
