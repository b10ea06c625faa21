//! Native window/context providers.
//!
//! [`Platform`] is the capability surface the engine consumes from a windowing
//! + graphics backend. It is deliberately shaped like a C windowing API:
//! windows are opaque [`NativeHandle`]s, and event delivery goes through plain
//! function pointers ([`NativeHooks`]) that carry no per-window context. The
//! `window` module routes those calls back to the owning `Window` through its
//! handle registry.
//!
//! All methods take `&self`. Backends keep their mutable state behind
//! `RefCell`s and must not hold a borrow while invoking a hook, because hooks
//! run synchronously inside [`Platform::poll_events`] and may call straight back
//! into the platform (e.g. a resize hook setting the viewport).
//!
//! Two backends ship with the engine:
//! - [`desktop::WinitPlatform`]: desktop windows via winit, presenting with wgpu.
//! - [`headless::HeadlessPlatform`]: in-memory, scripted, for tests and CI.

use std::fmt;

use thiserror::Error;
use winit::event::{ElementState, MouseButton as NativeButton};
use winit::keyboard::KeyCode as NativeKey;

use crate::render::{Color, Viewport};
use crate::window::WindowConfig;

pub mod desktop;
pub mod headless;

pub use desktop::{GpuInit, WinitPlatform};
pub use headless::{GraphicsCommand, HeadlessPlatform, NativeEvent};

/// Opaque identifier of a native window.
///
/// Backends may reuse values after a window is destroyed.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash, Ord, PartialOrd)]
pub struct NativeHandle(pub u64);

impl fmt::Display for NativeHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "native#{}", self.0)
    }
}

/// Free-function callbacks a backend invokes while pumping events.
///
/// Mirrors the callback-per-category registration of native windowing APIs.
/// The functions receive the native handle and native vocabulary only.
#[derive(Debug, Copy, Clone)]
pub struct NativeHooks {
    /// Framebuffer resized, in physical pixels.
    pub on_resize: fn(NativeHandle, u32, u32),
    /// Key changed state; the flag is the OS auto-repeat marker.
    pub on_key: fn(NativeHandle, NativeKey, ElementState, bool),
    pub on_mouse_button: fn(NativeHandle, NativeButton, ElementState),
    /// Cursor moved, in physical pixels relative to the window's top-left.
    pub on_cursor_pos: fn(NativeHandle, f64, f64),
}

/// Failures reported by a native backend.
#[derive(Debug, Error)]
pub enum PlatformError {
    #[error("event loop unavailable: {0}")]
    EventLoop(String),

    #[error("failed to create native window: {0}")]
    WindowCreation(String),

    #[error("failed to create graphics context: {0}")]
    ContextCreation(String),
}

/// Native window + graphics context provider.
///
/// Calls with a handle the backend does not know are ignored (queries return
/// neutral defaults); only [`Platform::create_window`] reports errors.
pub trait Platform {
    /// Human-readable backend name for diagnostics.
    fn name(&self) -> &'static str;

    /// Creates a hidden native window plus graphics context.
    fn create_window(&self, config: &WindowConfig) -> Result<NativeHandle, PlatformError>;

    /// Destroys the window. Its handle may be reused afterwards.
    fn destroy_window(&self, handle: NativeHandle);

    /// Installs the event hooks for `handle`, replacing any previous set.
    fn subscribe(&self, handle: NativeHandle, hooks: NativeHooks);

    fn show_window(&self, handle: NativeHandle);
    fn hide_window(&self, handle: NativeHandle);

    /// Marks close intent. The window stays alive.
    fn request_close(&self, handle: NativeHandle);
    fn should_close(&self, handle: NativeHandle) -> bool;

    fn set_title(&self, handle: NativeHandle, title: &str);
    fn set_size(&self, handle: NativeHandle, width: u32, height: u32);

    /// Client-area size in logical units.
    fn window_size(&self, handle: NativeHandle) -> (u32, u32);

    /// Drawable size in physical pixels.
    fn framebuffer_size(&self, handle: NativeHandle) -> (u32, u32);

    /// Drains pending native events, invoking subscribed hooks synchronously.
    fn poll_events(&self);

    /// Makes `handle`'s context the target of subsequent graphics commands.
    fn make_current(&self, handle: NativeHandle);
    fn set_vsync(&self, handle: NativeHandle, enabled: bool);
    fn set_viewport(&self, handle: NativeHandle, viewport: Viewport);
    fn clear(&self, handle: NativeHandle, color: Color);

    /// Presents the current frame.
    fn swap_buffers(&self, handle: NativeHandle);

    fn key_state(&self, handle: NativeHandle, key: NativeKey) -> bool;
    fn cursor_position(&self, handle: NativeHandle) -> (f64, f64);
}
