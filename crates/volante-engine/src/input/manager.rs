use std::rc::{Rc, Weak};

use crate::subsystem::Subsystem;
use crate::window::Window;

use super::KeyCode;

/// Polled input queries over the engine window.
///
/// Answers reflect the native state at call time ("currently held"); there is
/// no per-frame edge detection here. Holds the window weakly, so queries after
/// the window is gone report nothing pressed and a zero cursor.
#[derive(Debug)]
pub struct InputManager {
    window: Weak<Window>,
}

impl InputManager {
    pub fn new(window: &Rc<Window>) -> Self {
        Self {
            window: Rc::downgrade(window),
        }
    }

    pub fn is_key_pressed(&self, key: KeyCode) -> bool {
        self.window
            .upgrade()
            .is_some_and(|w| w.is_key_pressed(key))
    }

    /// Cursor position in physical pixels.
    pub fn mouse_position(&self) -> (f64, f64) {
        self.window
            .upgrade()
            .map(|w| w.cursor_pos())
            .unwrap_or((0.0, 0.0))
    }
}

impl Subsystem for InputManager {
    fn name(&self) -> &str {
        "input"
    }
}

#[cfg(test)]
mod tests {
    use winit::keyboard::KeyCode as NativeKey;

    use super::*;
    use crate::platform::{HeadlessPlatform, NativeEvent, Platform};
    use crate::window::WindowConfig;

    #[test]
    fn queries_pass_through_to_window() {
        let p = Rc::new(HeadlessPlatform::new());
        let dynp: Rc<dyn Platform> = p.clone();
        let w = Rc::new(Window::create(dynp, &WindowConfig::default()).unwrap());
        let input = InputManager::new(&w);
        let h = w.native_handle();

        p.push_event(NativeEvent::key_press(h, NativeKey::KeyQ));
        p.push_event(NativeEvent::CursorMoved { handle: h, x: 12.5, y: 40.0 });
        w.poll_events();

        assert!(input.is_key_pressed(KeyCode::Q));
        assert_eq!(input.mouse_position(), (12.5, 40.0));

        p.push_event(NativeEvent::key_release(h, NativeKey::KeyQ));
        w.poll_events();
        assert!(!input.is_key_pressed(KeyCode::Q));
    }

    #[test]
    fn queries_after_window_drop_report_nothing() {
        let p: Rc<dyn Platform> = Rc::new(HeadlessPlatform::new());
        let w = Rc::new(Window::create(p, &WindowConfig::default()).unwrap());
        let input = InputManager::new(&w);
        drop(w);
        assert!(!input.is_key_pressed(KeyCode::Escape));
        assert_eq!(input.mouse_position(), (0.0, 0.0));
    }
}
