//! Native handle → window routing.
//!
//! Backends deliver events through context-free function pointers. Each live
//! `Window` registers its callback slots here under its native handle; the
//! `dispatch_*` functions (installed as the backend's [`NativeHooks`]) look the
//! handle up, translate the native arguments and invoke the subscriber.
//!
//! Entries hold `Weak` references, so a stale entry can never reach a dropped
//! window. `Window::drop` still removes its entry before the native window is
//! destroyed, because the backend may hand the same handle to the next window.
//!
//! The table is thread-local: event pumping is single-threaded and windows are
//! not `Send`, so the pumping thread is the only one that can observe it.

use std::cell::{Cell, RefCell};
use std::collections::HashMap;
use std::rc::{Rc, Weak};

use winit::event::{ElementState, MouseButton as NativeButton};
use winit::keyboard::KeyCode as NativeKey;

use crate::input::translate;
use crate::input::{InputAction, KeyCode, MouseButton};
use crate::platform::{NativeHandle, NativeHooks};

pub type ResizeCallback = dyn FnMut(u32, u32);
pub type KeyCallback = dyn FnMut(KeyCode, InputAction);
pub type MouseButtonCallback = dyn FnMut(MouseButton, InputAction);
pub type CursorPosCallback = dyn FnMut(f64, f64);

/// Single-subscriber callback slot.
///
/// Setting replaces the previous subscriber. During dispatch the subscriber is
/// moved out of the slot, so it may freely replace or clear its own slot; the
/// generation counter tells dispatch whether to put it back afterwards.
pub(crate) struct Slot<F: ?Sized> {
    callback: RefCell<Option<Box<F>>>,
    generation: Cell<u64>,
}

impl<F: ?Sized> Default for Slot<F> {
    fn default() -> Self {
        Self {
            callback: RefCell::new(None),
            generation: Cell::new(0),
        }
    }
}

impl<F: ?Sized> Slot<F> {
    pub(crate) fn set(&self, callback: Box<F>) {
        self.generation.set(self.generation.get().wrapping_add(1));
        *self.callback.borrow_mut() = Some(callback);
    }

    pub(crate) fn clear(&self) {
        self.generation.set(self.generation.get().wrapping_add(1));
        *self.callback.borrow_mut() = None;
    }

    #[cfg(test)]
    pub(crate) fn is_set(&self) -> bool {
        self.callback.borrow().is_some()
    }

    /// Invokes the subscriber, if any. Returns whether one was invoked.
    fn dispatch(&self, call: impl FnOnce(&mut F)) -> bool {
        let generation = self.generation.get();
        let Some(mut callback) = self.callback.borrow_mut().take() else {
            return false;
        };

        call(&mut callback);

        if self.generation.get() == generation {
            *self.callback.borrow_mut() = Some(callback);
        }
        true
    }
}

/// The four event categories a window can subscribe to.
#[derive(Default)]
pub(crate) struct CallbackSlots {
    pub(crate) resize: Slot<ResizeCallback>,
    pub(crate) key: Slot<KeyCallback>,
    pub(crate) mouse_button: Slot<MouseButtonCallback>,
    pub(crate) cursor_pos: Slot<CursorPosCallback>,
}

thread_local! {
    static REGISTRY: RefCell<HashMap<NativeHandle, Weak<CallbackSlots>>> =
        RefCell::new(HashMap::new());
}

/// Hooks every window subscribes with.
pub(crate) const HOOKS: NativeHooks = NativeHooks {
    on_resize: dispatch_resize,
    on_key: dispatch_key,
    on_mouse_button: dispatch_mouse_button,
    on_cursor_pos: dispatch_cursor_pos,
};

pub(crate) fn register(handle: NativeHandle, slots: &Rc<CallbackSlots>) {
    REGISTRY.with(|r| {
        let previous = r.borrow_mut().insert(handle, Rc::downgrade(slots));
        if previous.is_some_and(|w| w.strong_count() > 0) {
            log::warn!("native handle {handle} was still registered to a live window; rerouting");
        }
    });
    log::trace!("registry: registered {handle}");
}

pub(crate) fn unregister(handle: NativeHandle) {
    REGISTRY.with(|r| r.borrow_mut().remove(&handle));
    log::trace!("registry: unregistered {handle}");
}

/// Whether `handle` currently routes to a live window.
pub fn is_registered(handle: NativeHandle) -> bool {
    REGISTRY.with(|r| {
        r.borrow()
            .get(&handle)
            .is_some_and(|w| w.strong_count() > 0)
    })
}

/// Handles of all windows currently reachable through the registry, sorted.
pub fn registered_handles() -> Vec<NativeHandle> {
    let mut handles: Vec<NativeHandle> = REGISTRY.with(|r| {
        r.borrow()
            .iter()
            .filter(|(_, w)| w.strong_count() > 0)
            .map(|(h, _)| *h)
            .collect()
    });
    handles.sort();
    handles
}

/// Resolves `handle` without holding the registry borrow past the lookup, so
/// subscribers may create or drop windows while being dispatched to.
fn lookup(handle: NativeHandle) -> Option<Rc<CallbackSlots>> {
    let weak = REGISTRY.with(|r| r.borrow().get(&handle).cloned());
    let slots = weak.and_then(|w| w.upgrade());
    if slots.is_none() {
        log::trace!("registry: dropping event for unregistered {handle}");
    }
    slots
}

pub(crate) fn dispatch_resize(handle: NativeHandle, width: u32, height: u32) {
    if let Some(slots) = lookup(handle) {
        slots.resize.dispatch(|cb| cb(width, height));
    }
}

pub(crate) fn dispatch_key(handle: NativeHandle, key: NativeKey, state: ElementState, repeat: bool) {
    if let Some(slots) = lookup(handle) {
        let key = translate::key_from_native(key);
        let action = translate::action_from_native(state, repeat);
        slots.key.dispatch(|cb| cb(key, action));
    }
}

pub(crate) fn dispatch_mouse_button(handle: NativeHandle, button: NativeButton, state: ElementState) {
    if let Some(slots) = lookup(handle) {
        let button = translate::button_from_native(button);
        let action = translate::action_from_native(state, false);
        slots.mouse_button.dispatch(|cb| cb(button, action));
    }
}

pub(crate) fn dispatch_cursor_pos(handle: NativeHandle, x: f64, y: f64) {
    if let Some(slots) = lookup(handle) {
        slots.cursor_pos.dispatch(|cb| cb(x, y));
    }
}
