//! In-memory backend.
//!
//! Windows are plain records, graphics calls are appended to a command log and
//! native events are injected by the caller, either immediately
//! ([`HeadlessPlatform::push_event`]) or on a specific future poll
//! ([`HeadlessPlatform::schedule`]). Native state (held keys, cursor, size,
//! close intent) is updated from each event before its hook fires, the same
//! order a desktop backend observes.

use std::cell::{Cell, RefCell};
use std::collections::{BTreeMap, BTreeSet, HashSet, VecDeque};

use winit::event::{ElementState, MouseButton as NativeButton};
use winit::keyboard::KeyCode as NativeKey;

use crate::render::{Color, Viewport};
use crate::window::WindowConfig;

use super::{NativeHandle, NativeHooks, Platform, PlatformError};

/// A native event as a backend would receive it from the OS.
#[derive(Debug, Copy, Clone, PartialEq)]
pub enum NativeEvent {
    Resized { handle: NativeHandle, width: u32, height: u32 },
    Key { handle: NativeHandle, key: NativeKey, state: ElementState, repeat: bool },
    MouseButton { handle: NativeHandle, button: NativeButton, state: ElementState },
    CursorMoved { handle: NativeHandle, x: f64, y: f64 },
    CloseRequested { handle: NativeHandle },
}

impl NativeEvent {
    pub fn handle(&self) -> NativeHandle {
        match *self {
            NativeEvent::Resized { handle, .. }
            | NativeEvent::Key { handle, .. }
            | NativeEvent::MouseButton { handle, .. }
            | NativeEvent::CursorMoved { handle, .. }
            | NativeEvent::CloseRequested { handle } => handle,
        }
    }

    pub fn key_press(handle: NativeHandle, key: NativeKey) -> Self {
        NativeEvent::Key { handle, key, state: ElementState::Pressed, repeat: false }
    }

    pub fn key_release(handle: NativeHandle, key: NativeKey) -> Self {
        NativeEvent::Key { handle, key, state: ElementState::Released, repeat: false }
    }
}

/// Graphics call recorded by the headless backend.
#[derive(Debug, Copy, Clone, PartialEq)]
pub enum GraphicsCommand {
    MakeCurrent,
    SetVsync(bool),
    SetViewport(Viewport),
    Clear(Color),
    SwapBuffers,
}

#[derive(Debug)]
struct HeadlessWindow {
    title: String,
    size: (u32, u32),
    framebuffer: (u32, u32),
    samples: u32,
    visible: bool,
    close_requested: bool,
    vsync: bool,
    keys_down: HashSet<NativeKey>,
    cursor: (f64, f64),
    hooks: Option<NativeHooks>,
}

/// Scripted in-memory [`Platform`].
#[derive(Debug, Default)]
pub struct HeadlessPlatform {
    windows: RefCell<BTreeMap<NativeHandle, HeadlessWindow>>,
    next_handle: Cell<u64>,
    reuse_handles: bool,
    free_handles: RefCell<BTreeSet<NativeHandle>>,

    queue: RefCell<VecDeque<NativeEvent>>,
    scheduled: RefCell<Vec<(u64, NativeEvent)>>,
    polls: Cell<u64>,

    commands: RefCell<Vec<(NativeHandle, GraphicsCommand)>>,
    current: Cell<Option<NativeHandle>>,
    fail_next_create: RefCell<Option<String>>,
}

impl HeadlessPlatform {
    pub fn new() -> Self {
        Self::default()
    }

    /// Backend that hands out the lowest freed handle before minting new ones,
    /// like native APIs that recycle pointers or ids.
    pub fn with_handle_reuse() -> Self {
        Self {
            reuse_handles: true,
            ..Self::default()
        }
    }

    /// Makes the next `create_window` call fail with `reason`.
    pub fn fail_next_window(&self, reason: impl Into<String>) {
        *self.fail_next_create.borrow_mut() = Some(reason.into());
    }

    /// Queues an event for the next `poll_events` call.
    pub fn push_event(&self, event: NativeEvent) {
        self.queue.borrow_mut().push_back(event);
    }

    /// Queues an event for delivery during the `poll`-th call to
    /// `poll_events` (1-based, counted since construction).
    ///
    /// Events scheduled for a poll that already happened go out on the next one.
    pub fn schedule(&self, poll: u64, event: NativeEvent) {
        self.scheduled.borrow_mut().push((poll, event));
    }

    /// Number of `poll_events` calls so far.
    pub fn polls(&self) -> u64 {
        self.polls.get()
    }

    pub fn is_alive(&self, handle: NativeHandle) -> bool {
        self.windows.borrow().contains_key(&handle)
    }

    pub fn live_windows(&self) -> Vec<NativeHandle> {
        self.windows.borrow().keys().copied().collect()
    }

    pub fn is_visible(&self, handle: NativeHandle) -> bool {
        self.with_window(handle, |w| w.visible).unwrap_or(false)
    }

    pub fn vsync(&self, handle: NativeHandle) -> Option<bool> {
        self.with_window(handle, |w| w.vsync)
    }

    pub fn title(&self, handle: NativeHandle) -> Option<String> {
        self.with_window(handle, |w| w.title.clone())
    }

    pub fn samples(&self, handle: NativeHandle) -> Option<u32> {
        self.with_window(handle, |w| w.samples)
    }

    /// Graphics commands issued against `handle`, in order.
    pub fn commands(&self, handle: NativeHandle) -> Vec<GraphicsCommand> {
        self.commands
            .borrow()
            .iter()
            .filter(|(h, _)| *h == handle)
            .map(|(_, c)| *c)
            .collect()
    }

    /// Drains the whole command log.
    pub fn take_commands(&self) -> Vec<(NativeHandle, GraphicsCommand)> {
        std::mem::take(&mut *self.commands.borrow_mut())
    }

    pub fn swap_count(&self, handle: NativeHandle) -> usize {
        self.commands(handle)
            .iter()
            .filter(|c| matches!(c, GraphicsCommand::SwapBuffers))
            .count()
    }

    /// Context targeted by the last `make_current`.
    pub fn current_context(&self) -> Option<NativeHandle> {
        self.current.get()
    }

    fn with_window<R>(&self, handle: NativeHandle, f: impl FnOnce(&HeadlessWindow) -> R) -> Option<R> {
        self.windows.borrow().get(&handle).map(f)
    }

    fn with_window_mut<R>(
        &self,
        handle: NativeHandle,
        f: impl FnOnce(&mut HeadlessWindow) -> R,
    ) -> Option<R> {
        let r = self.windows.borrow_mut().get_mut(&handle).map(f);
        if r.is_none() {
            log::trace!("headless: ignoring call for unknown window {handle}");
        }
        r
    }

    fn record(&self, handle: NativeHandle, cmd: GraphicsCommand) {
        if self.is_alive(handle) {
            self.commands.borrow_mut().push((handle, cmd));
        }
    }

    fn allocate_handle(&self) -> NativeHandle {
        if self.reuse_handles {
            if let Some(h) = self.free_handles.borrow_mut().pop_first() {
                return h;
            }
        }
        let id = self.next_handle.get() + 1;
        self.next_handle.set(id);
        NativeHandle(id)
    }

    /// Applies native-side state and returns the hooks to notify.
    fn apply(&self, event: &NativeEvent) -> Option<NativeHooks> {
        self.with_window_mut(event.handle(), |w| {
            match *event {
                NativeEvent::Resized { width, height, .. } => {
                    w.framebuffer = (width, height);
                    w.size = (width, height);
                }
                NativeEvent::Key { key, state, .. } => match state {
                    ElementState::Pressed => {
                        w.keys_down.insert(key);
                    }
                    ElementState::Released => {
                        w.keys_down.remove(&key);
                    }
                },
                NativeEvent::CursorMoved { x, y, .. } => w.cursor = (x, y),
                NativeEvent::CloseRequested { .. } => w.close_requested = true,
                NativeEvent::MouseButton { .. } => {}
            }
            w.hooks
        })
        .flatten()
    }
}

impl Platform for HeadlessPlatform {
    fn name(&self) -> &'static str {
        "headless"
    }

    fn create_window(&self, config: &WindowConfig) -> Result<NativeHandle, PlatformError> {
        if let Some(reason) = self.fail_next_create.borrow_mut().take() {
            return Err(PlatformError::WindowCreation(reason));
        }

        let handle = self.allocate_handle();
        let window = HeadlessWindow {
            title: config.title.clone(),
            size: (config.width, config.height),
            framebuffer: (config.width, config.height),
            samples: config.samples,
            visible: false,
            close_requested: false,
            vsync: false,
            keys_down: HashSet::new(),
            cursor: (0.0, 0.0),
            hooks: None,
        };
        self.windows.borrow_mut().insert(handle, window);
        log::debug!("headless: created window {handle} ({}x{})", config.width, config.height);
        Ok(handle)
    }

    fn destroy_window(&self, handle: NativeHandle) {
        if self.windows.borrow_mut().remove(&handle).is_none() {
            return;
        }
        if self.current.get() == Some(handle) {
            self.current.set(None);
        }
        if self.reuse_handles {
            self.free_handles.borrow_mut().insert(handle);
        }
        log::debug!("headless: destroyed window {handle}");
    }

    fn subscribe(&self, handle: NativeHandle, hooks: NativeHooks) {
        self.with_window_mut(handle, |w| w.hooks = Some(hooks));
    }

    fn show_window(&self, handle: NativeHandle) {
        self.with_window_mut(handle, |w| w.visible = true);
    }

    fn hide_window(&self, handle: NativeHandle) {
        self.with_window_mut(handle, |w| w.visible = false);
    }

    fn request_close(&self, handle: NativeHandle) {
        self.with_window_mut(handle, |w| w.close_requested = true);
    }

    fn should_close(&self, handle: NativeHandle) -> bool {
        self.with_window(handle, |w| w.close_requested).unwrap_or(true)
    }

    fn set_title(&self, handle: NativeHandle, title: &str) {
        self.with_window_mut(handle, |w| w.title = title.to_string());
    }

    fn set_size(&self, handle: NativeHandle, width: u32, height: u32) {
        // A real backend reports the new drawable size through an event.
        if self.is_alive(handle) {
            self.with_window_mut(handle, |w| w.size = (width, height));
            self.push_event(NativeEvent::Resized { handle, width, height });
        }
    }

    fn window_size(&self, handle: NativeHandle) -> (u32, u32) {
        self.with_window(handle, |w| w.size).unwrap_or((0, 0))
    }

    fn framebuffer_size(&self, handle: NativeHandle) -> (u32, u32) {
        self.with_window(handle, |w| w.framebuffer).unwrap_or((0, 0))
    }

    fn poll_events(&self) {
        let poll = self.polls.get() + 1;
        self.polls.set(poll);

        {
            let mut scheduled = self.scheduled.borrow_mut();
            let mut queue = self.queue.borrow_mut();
            let mut i = 0;
            while i < scheduled.len() {
                if scheduled[i].0 <= poll {
                    queue.push_back(scheduled.remove(i).1);
                } else {
                    i += 1;
                }
            }
        }

        // Snapshot the queue so hooks can push follow-up events (delivered next poll).
        let events: Vec<NativeEvent> = self.queue.borrow_mut().drain(..).collect();

        for event in events {
            let Some(hooks) = self.apply(&event) else {
                continue;
            };

            match event {
                NativeEvent::Resized { handle, width, height } => (hooks.on_resize)(handle, width, height),
                NativeEvent::Key { handle, key, state, repeat } => (hooks.on_key)(handle, key, state, repeat),
                NativeEvent::MouseButton { handle, button, state } => {
                    (hooks.on_mouse_button)(handle, button, state)
                }
                NativeEvent::CursorMoved { handle, x, y } => (hooks.on_cursor_pos)(handle, x, y),
                NativeEvent::CloseRequested { .. } => {}
            }
        }
    }

    fn make_current(&self, handle: NativeHandle) {
        if self.is_alive(handle) {
            self.current.set(Some(handle));
        }
        self.record(handle, GraphicsCommand::MakeCurrent);
    }

    fn set_vsync(&self, handle: NativeHandle, enabled: bool) {
        self.with_window_mut(handle, |w| w.vsync = enabled);
        self.record(handle, GraphicsCommand::SetVsync(enabled));
    }

    fn set_viewport(&self, handle: NativeHandle, viewport: Viewport) {
        self.record(handle, GraphicsCommand::SetViewport(viewport));
    }

    fn clear(&self, handle: NativeHandle, color: Color) {
        self.record(handle, GraphicsCommand::Clear(color));
    }

    fn swap_buffers(&self, handle: NativeHandle) {
        self.record(handle, GraphicsCommand::SwapBuffers);
    }

    fn key_state(&self, handle: NativeHandle, key: NativeKey) -> bool {
        self.with_window(handle, |w| w.keys_down.contains(&key))
            .unwrap_or(false)
    }

    fn cursor_position(&self, handle: NativeHandle) -> (f64, f64) {
        self.with_window(handle, |w| w.cursor).unwrap_or((0.0, 0.0))
    }
}
