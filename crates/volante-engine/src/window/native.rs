use std::fmt;
use std::rc::Rc;

use crate::input::translate;
use crate::input::{InputAction, KeyCode, MouseButton};
use crate::platform::{NativeHandle, Platform};
use crate::render::{Color, Viewport};

use super::registry::{self, CallbackSlots};
use super::{WindowConfig, WindowError};

/// One native window and its graphics context.
///
/// Owns the native handle for its whole lifetime: the handle is registered
/// for event routing on construction and unregistered, then destroyed, on
/// drop. There is no other way to destroy the native window; [`Window::close`]
/// only raises close intent.
///
/// Each event category has a single subscriber. Setting a callback replaces
/// the previous one; with no subscriber the category is dropped silently.
pub struct Window {
    platform: Rc<dyn Platform>,
    handle: NativeHandle,
    slots: Rc<CallbackSlots>,
    config: WindowConfig,
}

impl Window {
    /// Creates the native window and its context.
    ///
    /// The window starts hidden with its context current and vsync applied
    /// from `config`.
    pub fn create(platform: Rc<dyn Platform>, config: &WindowConfig) -> Result<Self, WindowError> {
        config.validate()?;

        let handle = platform.create_window(config)?;
        let slots = Rc::new(CallbackSlots::default());

        registry::register(handle, &slots);
        platform.subscribe(handle, registry::HOOKS);

        platform.make_current(handle);
        platform.set_vsync(handle, config.vsync);

        log::info!(
            "window {handle} created on {} backend: {}x{} \"{}\" (fullscreen: {}, vsync: {}, samples: {})",
            platform.name(),
            config.width,
            config.height,
            config.title,
            config.fullscreen,
            config.vsync,
            config.samples,
        );

        Ok(Self {
            platform,
            handle,
            slots,
            config: config.clone(),
        })
    }

    pub fn native_handle(&self) -> NativeHandle {
        self.handle
    }

    /// Configuration the window was created with.
    pub fn config(&self) -> &WindowConfig {
        &self.config
    }

    pub fn show(&self) {
        self.platform.show_window(self.handle);
    }

    pub fn hide(&self) {
        self.platform.hide_window(self.handle);
    }

    /// Raises close intent; the window stays alive until dropped.
    pub fn close(&self) {
        self.platform.request_close(self.handle);
    }

    pub fn should_close(&self) -> bool {
        self.platform.should_close(self.handle)
    }

    pub fn set_title(&self, title: &str) {
        self.platform.set_title(self.handle, title);
    }

    pub fn set_size(&self, width: u32, height: u32) {
        self.platform.set_size(self.handle, width, height);
    }

    pub fn size(&self) -> (u32, u32) {
        self.platform.window_size(self.handle)
    }

    pub fn framebuffer_size(&self) -> (u32, u32) {
        self.platform.framebuffer_size(self.handle)
    }

    /// Non-owning view of this window's graphics context.
    pub fn graphics_context(&self) -> GraphicsContext {
        GraphicsContext {
            platform: self.platform.clone(),
            handle: self.handle,
        }
    }

    pub fn swap_buffers(&self) {
        self.platform.swap_buffers(self.handle);
    }

    /// Pumps the native event queue.
    ///
    /// Registered callbacks run synchronously before this returns.
    pub fn poll_events(&self) {
        self.platform.poll_events();
    }

    /// Whether `key` is currently held. Always false for `KeyCode::Unknown`.
    pub fn is_key_pressed(&self, key: KeyCode) -> bool {
        translate::key_to_native(key)
            .is_some_and(|native| self.platform.key_state(self.handle, native))
    }

    /// Cursor position in physical pixels from the client area's top-left.
    pub fn cursor_pos(&self) -> (f64, f64) {
        self.platform.cursor_position(self.handle)
    }

    // ── Callbacks ─────────────────────────────────────────────────────────

    /// Subscribes to framebuffer resizes (physical pixels). Replaces any
    /// previous resize subscriber.
    pub fn set_resize_callback(&self, callback: impl FnMut(u32, u32) + 'static) {
        self.slots.resize.set(Box::new(callback));
    }

    /// Subscribes to key events. Replaces any previous key subscriber.
    pub fn set_key_callback(&self, callback: impl FnMut(KeyCode, InputAction) + 'static) {
        self.slots.key.set(Box::new(callback));
    }

    /// Subscribes to mouse button events. Replaces any previous subscriber.
    pub fn set_mouse_button_callback(&self, callback: impl FnMut(MouseButton, InputAction) + 'static) {
        self.slots.mouse_button.set(Box::new(callback));
    }

    /// Subscribes to cursor movement. Replaces any previous subscriber.
    pub fn set_cursor_pos_callback(&self, callback: impl FnMut(f64, f64) + 'static) {
        self.slots.cursor_pos.set(Box::new(callback));
    }

    pub fn clear_resize_callback(&self) {
        self.slots.resize.clear();
    }

    pub fn clear_key_callback(&self) {
        self.slots.key.clear();
    }

    pub fn clear_mouse_button_callback(&self) {
        self.slots.mouse_button.clear();
    }

    pub fn clear_cursor_pos_callback(&self) {
        self.slots.cursor_pos.clear();
    }
}

impl Drop for Window {
    fn drop(&mut self) {
        // Unregister first: the backend may reuse the handle immediately.
        registry::unregister(self.handle);
        self.platform.destroy_window(self.handle);
        log::info!("window {} destroyed", self.handle);
    }
}

impl fmt::Debug for Window {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Window")
            .field("handle", &self.handle)
            .field("backend", &self.platform.name())
            .field("config", &self.config)
            .finish()
    }
}

/// Non-owning handle to a window's graphics context.
///
/// Cloning is cheap. Outliving the window is allowed; calls then become no-ops
/// in the backend.
#[derive(Clone)]
pub struct GraphicsContext {
    platform: Rc<dyn Platform>,
    handle: NativeHandle,
}

impl GraphicsContext {
    pub fn native_handle(&self) -> NativeHandle {
        self.handle
    }

    pub fn make_current(&self) {
        self.platform.make_current(self.handle);
    }

    pub fn swap_buffers(&self) {
        self.platform.swap_buffers(self.handle);
    }

    pub fn set_vsync(&self, enabled: bool) {
        self.platform.set_vsync(self.handle, enabled);
    }

    pub fn set_viewport(&self, viewport: Viewport) {
        self.platform.set_viewport(self.handle, viewport);
    }

    pub fn clear(&self, color: Color) {
        self.platform.clear(self.handle, color);
    }

    pub fn framebuffer_size(&self) -> (u32, u32) {
        self.platform.framebuffer_size(self.handle)
    }
}

impl fmt::Debug for GraphicsContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GraphicsContext").field("handle", &self.handle).finish()
    }
}
