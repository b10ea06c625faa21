//! Desktop backend: winit windows presented through wgpu surfaces.
//!
//! winit normally owns the thread through `run_app`. The engine drives its own
//! loop instead, so events are pumped with a zero timeout on every
//! [`Platform::poll_events`] call and buffered, then replayed through the
//! subscribed hooks once no winit or backend borrow is held.

mod gpu;
mod surface;

use std::cell::{Cell, RefCell};
use std::collections::{BTreeMap, HashSet};
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use winit::application::ApplicationHandler;
use winit::dpi::{LogicalSize, PhysicalSize};
use winit::event::{ElementState, KeyEvent, WindowEvent};
use winit::event_loop::{ActiveEventLoop, EventLoop};
use winit::keyboard::{KeyCode as NativeKey, PhysicalKey};
use winit::platform::pump_events::{EventLoopExtPumpEvents, PumpStatus};
use winit::window::{Fullscreen, Window, WindowId};

use crate::render::{Color, Viewport};
use crate::window::WindowConfig;

use super::{NativeHandle, NativeHooks, Platform, PlatformError};

pub use gpu::GpuInit;
use gpu::GpuDevice;
use surface::WindowSurface;

struct DesktopWindow {
    window: Arc<Window>,
    surface: WindowSurface,
    hooks: Option<NativeHooks>,
    keys_down: HashSet<NativeKey>,
    cursor: (f64, f64),
    close_requested: bool,
}

/// Collects window events during a pump; nothing is dispatched from inside
/// winit's callbacks.
#[derive(Default)]
struct EventCollector {
    events: Vec<(WindowId, WindowEvent)>,
}

impl ApplicationHandler for EventCollector {
    fn resumed(&mut self, _event_loop: &ActiveEventLoop) {}

    fn window_event(&mut self, _event_loop: &ActiveEventLoop, window_id: WindowId, event: WindowEvent) {
        self.events.push((window_id, event));
    }
}

/// Native event reduced to what the hooks carry.
enum Delivery {
    Resize(u32, u32),
    Key(NativeKey, ElementState, bool),
    MouseButton(winit::event::MouseButton, ElementState),
    CursorPos(f64, f64),
}

/// winit + wgpu [`Platform`].
///
/// winit allows one event loop per process, so at most one `WinitPlatform`
/// can be created.
pub struct WinitPlatform {
    event_loop: RefCell<EventLoop<()>>,
    instance: wgpu::Instance,
    gpu_init: GpuInit,
    gpu: RefCell<Option<GpuDevice>>,
    windows: RefCell<BTreeMap<NativeHandle, DesktopWindow>>,
    current: Cell<Option<NativeHandle>>,
}

impl WinitPlatform {
    pub fn new() -> Result<Self, PlatformError> {
        Self::with_gpu_init(GpuInit::default())
    }

    pub fn with_gpu_init(gpu_init: GpuInit) -> Result<Self, PlatformError> {
        let event_loop = EventLoop::new().map_err(|e| PlatformError::EventLoop(e.to_string()))?;

        // Use all backends to allow wgpu to select the optimal platform backend.
        let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor {
            backends: wgpu::Backends::all(),
            ..Default::default()
        });

        Ok(Self {
            event_loop: RefCell::new(event_loop),
            instance,
            gpu_init,
            gpu: RefCell::new(None),
            windows: RefCell::new(BTreeMap::new()),
            current: Cell::new(None),
        })
    }

    fn handle_of(id: WindowId) -> NativeHandle {
        NativeHandle(u64::from(id))
    }

    fn open_window(&self, config: &WindowConfig) -> Result<Arc<Window>, PlatformError> {
        let mut attrs = Window::default_attributes()
            .with_title(config.title.clone())
            .with_inner_size(LogicalSize::new(config.width, config.height))
            .with_visible(false);
        if config.fullscreen {
            attrs = attrs.with_fullscreen(Some(Fullscreen::Borderless(None)));
        }

        // The loop is pumped by the engine, so windows are created outside of
        // an `ActiveEventLoop`.
        #[allow(deprecated)]
        let window = self
            .event_loop
            .borrow()
            .create_window(attrs)
            .map_err(|e| PlatformError::WindowCreation(e.to_string()))?;
        Ok(Arc::new(window))
    }

    /// Creates the window's surface, acquiring the shared device on first use.
    fn attach_surface(&self, window: &Arc<Window>, config: &WindowConfig) -> anyhow::Result<WindowSurface> {
        let surface = WindowSurface::create(&self.instance, window.clone())?;

        let mut gpu = self.gpu.borrow_mut();
        if gpu.is_none() {
            let device = pollster::block_on(GpuDevice::request(&self.instance, &surface, &self.gpu_init))?;
            *gpu = Some(device);
        }
        let gpu = gpu.as_ref().context("gpu device unavailable")?;

        WindowSurface::configure(
            surface,
            gpu,
            &self.gpu_init,
            window.inner_size(),
            config.vsync,
            config.samples,
        )
    }

    fn with_window<R>(&self, handle: NativeHandle, f: impl FnOnce(&DesktopWindow) -> R) -> Option<R> {
        self.windows.borrow().get(&handle).map(f)
    }

    fn with_window_mut<R>(
        &self,
        handle: NativeHandle,
        f: impl FnOnce(&mut DesktopWindow) -> R,
    ) -> Option<R> {
        let r = self.windows.borrow_mut().get_mut(&handle).map(f);
        if r.is_none() {
            log::trace!("desktop: ignoring call for unknown window {handle}");
        }
        r
    }

    /// Runs `f` against the window's surface and the shared device.
    fn with_surface(&self, handle: NativeHandle, f: impl FnOnce(&mut WindowSurface, &GpuDevice)) {
        let gpu = self.gpu.borrow();
        let Some(gpu) = gpu.as_ref() else {
            return;
        };
        self.with_window_mut(handle, |w| f(&mut w.surface, gpu));
    }

    /// Applies `event` to the native state and returns the hook delivery, if
    /// the event maps onto one.
    fn apply(&self, handle: NativeHandle, event: WindowEvent) -> Option<(NativeHooks, Delivery)> {
        let gpu = self.gpu.borrow();
        let mut windows = self.windows.borrow_mut();
        let w = windows.get_mut(&handle)?;

        let delivery = match event {
            WindowEvent::Resized(size) => {
                if let Some(gpu) = gpu.as_ref() {
                    w.surface.resize(gpu, size);
                }
                Some(Delivery::Resize(size.width, size.height))
            }
            WindowEvent::ScaleFactorChanged { .. } => {
                let size: PhysicalSize<u32> = w.window.inner_size();
                if let Some(gpu) = gpu.as_ref() {
                    w.surface.resize(gpu, size);
                }
                Some(Delivery::Resize(size.width, size.height))
            }
            WindowEvent::KeyboardInput {
                event: KeyEvent { physical_key, state, repeat, .. },
                ..
            } => match physical_key {
                PhysicalKey::Code(code) => {
                    match state {
                        ElementState::Pressed => w.keys_down.insert(code),
                        ElementState::Released => w.keys_down.remove(&code),
                    };
                    Some(Delivery::Key(code, state, repeat))
                }
                PhysicalKey::Unidentified(native) => {
                    log::trace!("desktop: dropping unidentified key {native:?}");
                    None
                }
            },
            WindowEvent::MouseInput { state, button, .. } => Some(Delivery::MouseButton(button, state)),
            WindowEvent::CursorMoved { position, .. } => {
                w.cursor = (position.x, position.y);
                Some(Delivery::CursorPos(position.x, position.y))
            }
            WindowEvent::Focused(false) => {
                // Releases are not reported for keys let go while unfocused.
                w.keys_down.clear();
                None
            }
            WindowEvent::CloseRequested => {
                w.close_requested = true;
                None
            }
            _ => None,
        }?;

        w.hooks.map(|hooks| (hooks, delivery))
    }
}

impl Platform for WinitPlatform {
    fn name(&self) -> &'static str {
        "winit"
    }

    fn create_window(&self, config: &WindowConfig) -> Result<NativeHandle, PlatformError> {
        let window = self.open_window(config)?;
        let surface = self
            .attach_surface(&window, config)
            .map_err(|e| PlatformError::ContextCreation(format!("{e:#}")))?;
        let handle = Self::handle_of(window.id());

        log::debug!(
            "desktop: created {handle} ({}x{}, {}x msaa)",
            config.width,
            config.height,
            surface.samples()
        );
        self.windows.borrow_mut().insert(
            handle,
            DesktopWindow {
                window,
                surface,
                hooks: None,
                keys_down: HashSet::new(),
                cursor: (0.0, 0.0),
                close_requested: false,
            },
        );
        Ok(handle)
    }

    fn destroy_window(&self, handle: NativeHandle) {
        if self.current.get() == Some(handle) {
            self.current.set(None);
        }
        // Dropping the surface before the last `Arc<Window>` closes the window.
        if self.windows.borrow_mut().remove(&handle).is_some() {
            log::debug!("desktop: destroyed {handle}");
        }
    }

    fn subscribe(&self, handle: NativeHandle, hooks: NativeHooks) {
        self.with_window_mut(handle, |w| w.hooks = Some(hooks));
    }

    fn show_window(&self, handle: NativeHandle) {
        self.with_window(handle, |w| w.window.set_visible(true));
    }

    fn hide_window(&self, handle: NativeHandle) {
        self.with_window(handle, |w| w.window.set_visible(false));
    }

    fn request_close(&self, handle: NativeHandle) {
        self.with_window_mut(handle, |w| w.close_requested = true);
    }

    fn should_close(&self, handle: NativeHandle) -> bool {
        self.with_window(handle, |w| w.close_requested).unwrap_or(true)
    }

    fn set_title(&self, handle: NativeHandle, title: &str) {
        self.with_window(handle, |w| w.window.set_title(title));
    }

    fn set_size(&self, handle: NativeHandle, width: u32, height: u32) {
        // The resulting `Resized` event arrives through the next pump.
        self.with_window(handle, |w| {
            let _ = w.window.request_inner_size(LogicalSize::new(width, height));
        });
    }

    fn window_size(&self, handle: NativeHandle) -> (u32, u32) {
        self.with_window(handle, |w| {
            let size: LogicalSize<u32> = w.window.inner_size().to_logical(w.window.scale_factor());
            (size.width, size.height)
        })
        .unwrap_or((0, 0))
    }

    fn framebuffer_size(&self, handle: NativeHandle) -> (u32, u32) {
        self.with_window(handle, |w| {
            let size = w.window.inner_size();
            (size.width, size.height)
        })
        .unwrap_or((0, 0))
    }

    fn poll_events(&self) {
        let mut collector = EventCollector::default();
        let status = self
            .event_loop
            .borrow_mut()
            .pump_app_events(Some(Duration::ZERO), &mut collector);
        if let PumpStatus::Exit(code) = status {
            log::warn!("desktop: event loop exited with code {code}");
            for w in self.windows.borrow_mut().values_mut() {
                w.close_requested = true;
            }
        }

        for (id, event) in collector.events {
            let handle = Self::handle_of(id);
            // No borrow may be held here: hooks re-enter the platform.
            let Some((hooks, delivery)) = self.apply(handle, event) else {
                continue;
            };
            match delivery {
                Delivery::Resize(width, height) => (hooks.on_resize)(handle, width, height),
                Delivery::Key(key, state, repeat) => (hooks.on_key)(handle, key, state, repeat),
                Delivery::MouseButton(button, state) => (hooks.on_mouse_button)(handle, button, state),
                Delivery::CursorPos(x, y) => (hooks.on_cursor_pos)(handle, x, y),
            }
        }
    }

    fn make_current(&self, handle: NativeHandle) {
        if self.with_window(handle, |_| ()).is_some() {
            self.current.set(Some(handle));
        }
    }

    fn set_vsync(&self, handle: NativeHandle, enabled: bool) {
        self.with_surface(handle, |surface, gpu| surface.set_vsync(gpu, enabled));
    }

    fn set_viewport(&self, handle: NativeHandle, viewport: Viewport) {
        self.with_surface(handle, |surface, _| surface.set_viewport(viewport));
    }

    fn clear(&self, handle: NativeHandle, color: Color) {
        self.with_surface(handle, |surface, gpu| surface.clear(gpu, color));
    }

    fn swap_buffers(&self, handle: NativeHandle) {
        self.with_window(handle, |w| w.window.pre_present_notify());
        self.with_surface(handle, |surface, gpu| surface.present(gpu));
    }

    fn key_state(&self, handle: NativeHandle, key: NativeKey) -> bool {
        self.with_window(handle, |w| w.keys_down.contains(&key)).unwrap_or(false)
    }

    fn cursor_position(&self, handle: NativeHandle) -> (f64, f64) {
        self.with_window(handle, |w| w.cursor).unwrap_or((0.0, 0.0))
    }
}

impl Drop for WinitPlatform {
    fn drop(&mut self) {
        // Surfaces go before the device they were configured with.
        self.windows.get_mut().clear();
        *self.gpu.get_mut() = None;
    }
}
