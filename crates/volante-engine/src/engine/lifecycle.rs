use std::cell::{Cell, Ref, RefCell};
use std::fmt;
use std::rc::{Rc, Weak};

use crate::input::{InputManager, KeyCode};
use crate::platform::Platform;
use crate::render::{Color, Renderer};
use crate::subsystem::{LifecycleState, Subsystem};
use crate::time::FrameClock;
use crate::window::Window;
use crate::world::{EmptyWorld, World};

use super::{EngineConfig, EngineError};

thread_local! {
    static ENGINE_LIVE: Cell<bool> = const { Cell::new(false) };
}

/// Engine lifecycle. `ShutDown` is terminal.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum EngineState {
    Unstarted,
    Running,
    ShutDown,
}

/// Cloneable exit request that can be captured by callbacks.
///
/// Requests are cooperative: the loop observes them at its next condition
/// check, after the current frame has rendered.
#[derive(Debug, Clone)]
pub struct ExitHandle {
    running: Rc<Cell<bool>>,
}

impl ExitHandle {
    pub fn request(&self) {
        self.running.set(false);
    }
}

struct SubsystemSlot {
    name: String,
    subsystem: Weak<RefCell<dyn Subsystem>>,
    state: LifecycleState,
}

/// Application host: owns the window and subsystems and runs the main loop.
///
/// Only one engine may be live per thread; the event-pumping thread is the
/// only thread an engine can live on.
pub struct Engine {
    platform: Rc<dyn Platform>,
    state: EngineState,
    running: Rc<Cell<bool>>,
    clock: FrameClock,
    frames: u64,

    exit_key: Option<KeyCode>,
    clear_color: Color,

    // Released in reverse declaration order on shutdown: input, renderer,
    // world, window.
    window: Option<Rc<Window>>,
    world: Option<Box<dyn World>>,
    renderer: Option<Rc<RefCell<Renderer>>>,
    input: Option<Rc<RefCell<InputManager>>>,

    pending_world: Option<Box<dyn World>>,
    /// Ownership of subsystems added by the host.
    extra_subsystems: Vec<Rc<RefCell<dyn Subsystem>>>,
    /// Iteration order; non-owning.
    subsystems: Vec<SubsystemSlot>,
}

impl Engine {
    /// Creates an unstarted engine on top of `platform`.
    pub fn new(platform: Rc<dyn Platform>) -> Result<Self, EngineError> {
        if ENGINE_LIVE.get() {
            return Err(EngineError::AlreadyLive);
        }
        ENGINE_LIVE.set(true);

        Ok(Self {
            platform,
            state: EngineState::Unstarted,
            running: Rc::new(Cell::new(false)),
            clock: FrameClock::new(),
            frames: 0,
            exit_key: None,
            clear_color: Color::BLACK,
            window: None,
            world: None,
            renderer: None,
            input: None,
            pending_world: None,
            extra_subsystems: Vec::new(),
            subsystems: Vec::new(),
        })
    }

    /// Whether an engine is currently live on this thread.
    pub fn is_live() -> bool {
        ENGINE_LIVE.get()
    }

    /// Installs the world used from the next `initialize` on.
    pub fn set_world(&mut self, world: impl World + 'static) -> Result<(), EngineError> {
        self.ensure_unstarted()?;
        self.pending_world = Some(Box::new(world));
        Ok(())
    }

    /// Registers a host subsystem. It is initialized after the renderer and
    /// input manager, in registration order, and shut down before them.
    pub fn add_subsystem<S: Subsystem + 'static>(&mut self, subsystem: Rc<RefCell<S>>) -> Result<(), EngineError> {
        self.ensure_unstarted()?;
        self.extra_subsystems.push(subsystem);
        Ok(())
    }

    /// Brings the engine up.
    ///
    /// On error nothing stays behind: subsystems initialized so far are shut
    /// down in reverse order, the window is destroyed and the engine remains
    /// `Unstarted`. The world and host subsystems handed over before a failed
    /// call are consumed.
    pub fn initialize(&mut self, config: &EngineConfig) -> Result<(), EngineError> {
        self.ensure_unstarted()?;

        log::info!("initializing engine on {} backend", self.platform.name());

        let window = Rc::new(Window::create(self.platform.clone(), &config.window)?);
        window.graphics_context().make_current();

        let world = self.pending_world.take().unwrap_or_else(|| Box::new(EmptyWorld));
        let renderer = Rc::new(RefCell::new(Renderer::new(&window)));
        let input = Rc::new(RefCell::new(InputManager::new(&window)));

        let renderer_dyn: Rc<RefCell<dyn Subsystem>> = renderer.clone();
        let input_dyn: Rc<RefCell<dyn Subsystem>> = input.clone();
        self.push_slot(&renderer_dyn);
        self.push_slot(&input_dyn);
        for extra in self.extra_subsystems.clone() {
            self.push_slot(&extra);
        }

        let resize_target = Rc::downgrade(&renderer);

        self.window = Some(window.clone());
        self.world = Some(world);
        self.renderer = Some(renderer);
        self.input = Some(input);

        if let Err(err) = self.initialize_subsystems() {
            log::error!("engine initialization failed: {err}");
            self.teardown();
            return Err(err);
        }

        window.set_resize_callback(move |width, height| {
            let Some(renderer) = resize_target.upgrade() else {
                return;
            };
            match renderer.try_borrow_mut() {
                Ok(mut r) => r.set_viewport(0, 0, width, height),
                Err(_) => log::warn!("renderer busy; dropped resize to {width}x{height}"),
            };
        });

        window.show();

        self.exit_key = config.exit_key;
        self.clear_color = config.clear_color;
        self.clock.set_max_delta(config.max_frame_delta);
        self.frames = 0;
        self.state = EngineState::Running;
        self.running.set(true);
        self.clock.reset();

        log::info!("engine initialized with subsystems [{}]", self.subsystem_names().join(", "));
        Ok(())
    }

    /// Runs frames until an exit request or window close intent.
    pub fn run(&mut self) -> Result<(), EngineError> {
        self.ensure_started()?;
        log::info!("entering main loop");
        while self.step() {}
        log::info!("main loop exited after {} frames", self.frames);
        Ok(())
    }

    /// Runs at most `max_frames` iterations of the main loop and returns how
    /// many ran. Stops early under the same conditions as [`Engine::run`].
    pub fn run_frames(&mut self, max_frames: u64) -> Result<u64, EngineError> {
        self.ensure_started()?;
        let mut ran = 0;
        while ran < max_frames && self.step() {
            ran += 1;
        }
        Ok(ran)
    }

    /// Tears the engine down. Idempotent.
    ///
    /// Subsystems shut down in reverse initialization order, then the input
    /// manager, renderer, world and window are released in that order.
    pub fn shutdown(&mut self) {
        if self.state != EngineState::Running {
            return;
        }
        log::info!("shutting down engine");
        self.teardown();
        self.state = EngineState::ShutDown;
    }

    /// Asks the loop to stop before the next frame.
    pub fn request_exit(&self) {
        if self.running.replace(false) {
            log::info!("exit requested");
        }
    }

    /// Exit trigger for callbacks that cannot borrow the engine.
    pub fn exit_handle(&self) -> ExitHandle {
        ExitHandle {
            running: self.running.clone(),
        }
    }

    pub fn state(&self) -> EngineState {
        self.state
    }

    pub fn is_running(&self) -> bool {
        self.running.get()
    }

    /// Frames completed since the last successful `initialize`.
    pub fn frame_index(&self) -> u64 {
        self.frames
    }

    pub fn window(&self) -> Option<&Window> {
        self.window.as_deref()
    }

    pub fn renderer(&self) -> Option<Ref<'_, Renderer>> {
        self.renderer.as_ref().map(|r| r.borrow())
    }

    pub fn input(&self) -> Option<Ref<'_, InputManager>> {
        self.input.as_ref().map(|i| i.borrow())
    }

    /// Names of the registered subsystems, in initialization order.
    pub fn subsystem_names(&self) -> Vec<String> {
        self.subsystems.iter().map(|s| s.name.clone()).collect()
    }

    /// Lifecycle state per registered subsystem, in initialization order.
    pub fn subsystem_states(&self) -> Vec<(String, LifecycleState)> {
        self.subsystems.iter().map(|s| (s.name.clone(), s.state)).collect()
    }

    // ── Frame ─────────────────────────────────────────────────────────────

    /// One loop iteration. Returns false, without running a frame, once the
    /// loop condition fails.
    fn step(&mut self) -> bool {
        let Some(window) = self.window.clone() else {
            self.running.set(false);
            return false;
        };
        if !self.running.get() {
            return false;
        }
        if window.should_close() {
            log::info!("window close requested");
            self.running.set(false);
            return false;
        }

        let frame = self.clock.tick();
        log::trace!("frame {} dt={:.6}s", frame.frame_index, frame.dt);

        // Callbacks fire in here and may change the viewport or running flag.
        window.poll_events();

        self.update(frame.dt);
        self.render();
        self.frames += 1;
        true
    }

    fn update(&mut self, dt: f32) {
        let exit_pressed = match (&self.input, self.exit_key) {
            (Some(input), Some(key)) => {
                input.borrow_mut().update(dt);
                input.borrow().is_key_pressed(key)
            }
            (Some(input), None) => {
                input.borrow_mut().update(dt);
                false
            }
            (None, _) => false,
        };
        if exit_pressed {
            log::debug!("exit key held");
            self.request_exit();
        }

        for slot in &self.subsystems {
            if let Some(subsystem) = slot.subsystem.upgrade() {
                subsystem.borrow_mut().update(dt);
            }
        }

        if let Some(world) = self.world.as_mut() {
            world.update(dt);
        }
    }

    fn render(&mut self) {
        let (Some(renderer), Some(world)) = (&self.renderer, self.world.as_mut()) else {
            return;
        };
        let mut renderer = renderer.borrow_mut();
        renderer.begin_frame();
        renderer.clear(self.clear_color);
        world.render(&mut renderer);
        renderer.end_frame();
    }

    // ── Lifecycle helpers ─────────────────────────────────────────────────

    fn push_slot(&mut self, subsystem: &Rc<RefCell<dyn Subsystem>>) {
        let name = subsystem.borrow().name().to_string();
        self.subsystems.push(SubsystemSlot {
            name,
            subsystem: Rc::downgrade(subsystem),
            state: LifecycleState::Uninitialized,
        });
    }

    fn initialize_subsystems(&mut self) -> Result<(), EngineError> {
        for slot in &mut self.subsystems {
            let Some(subsystem) = slot.subsystem.upgrade() else {
                continue;
            };
            subsystem.borrow_mut().initialize()?;
            slot.state = LifecycleState::Initialized;
            log::debug!("subsystem `{}` initialized", slot.name);
        }
        Ok(())
    }

    /// Shuts down initialized subsystems in reverse order and releases every
    /// component. Leaves `state` to the caller.
    fn teardown(&mut self) {
        self.running.set(false);

        for slot in self.subsystems.iter_mut().rev() {
            if slot.state != LifecycleState::Initialized {
                continue;
            }
            if let Some(subsystem) = slot.subsystem.upgrade() {
                subsystem.borrow_mut().shutdown();
            }
            slot.state = LifecycleState::ShutDown;
            log::debug!("subsystem `{}` shut down", slot.name);
        }
        self.subsystems.clear();
        self.extra_subsystems.clear();

        self.input = None;
        self.renderer = None;
        self.world = None;
        self.window = None;
    }

    fn ensure_unstarted(&self) -> Result<(), EngineError> {
        match self.state {
            EngineState::Unstarted => Ok(()),
            EngineState::Running => Err(EngineError::AlreadyInitialized),
            EngineState::ShutDown => Err(EngineError::ShutDown),
        }
    }

    fn ensure_started(&self) -> Result<(), EngineError> {
        match self.state {
            EngineState::Running => Ok(()),
            EngineState::Unstarted => Err(EngineError::NotInitialized),
            EngineState::ShutDown => Err(EngineError::ShutDown),
        }
    }
}

impl Drop for Engine {
    fn drop(&mut self) {
        self.shutdown();
        ENGINE_LIVE.set(false);
    }
}

impl fmt::Debug for Engine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Engine")
            .field("backend", &self.platform.name())
            .field("state", &self.state)
            .field("running", &self.running.get())
            .field("frames", &self.frames)
            .field("subsystems", &self.subsystem_names())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::platform::HeadlessPlatform;

    #[test]
    fn second_live_engine_is_rejected() {
        let p = Rc::new(HeadlessPlatform::new());
        let first = Engine::new(p.clone()).unwrap();
        assert!(Engine::is_live());
        assert!(matches!(Engine::new(p.clone()), Err(EngineError::AlreadyLive)));
        drop(first);
        assert!(!Engine::is_live());
        assert!(Engine::new(p).is_ok());
    }

    #[test]
    fn run_before_initialize_is_an_error() {
        let mut engine = Engine::new(Rc::new(HeadlessPlatform::new())).unwrap();
        assert!(matches!(engine.run(), Err(EngineError::NotInitialized)));
        assert!(!engine.is_running());
    }

    #[test]
    fn shutdown_is_terminal() {
        let mut engine = Engine::new(Rc::new(HeadlessPlatform::new())).unwrap();
        engine.initialize(&EngineConfig::default()).unwrap();
        engine.shutdown();
        assert_eq!(engine.state(), EngineState::ShutDown);
        assert!(matches!(
            engine.initialize(&EngineConfig::default()),
            Err(EngineError::ShutDown)
        ));
        assert!(matches!(engine.run(), Err(EngineError::ShutDown)));
    }

    #[test]
    fn double_initialize_is_rejected() {
        let mut engine = Engine::new(Rc::new(HeadlessPlatform::new())).unwrap();
        engine.initialize(&EngineConfig::default()).unwrap();
        assert!(matches!(
            engine.initialize(&EngineConfig::default()),
            Err(EngineError::AlreadyInitialized)
        ));
    }

    #[test]
    fn exit_handle_stops_the_loop() {
        let mut engine = Engine::new(Rc::new(HeadlessPlatform::new())).unwrap();
        let exit = engine.exit_handle();
        engine.initialize(&EngineConfig::default()).unwrap();
        assert_eq!(engine.run_frames(3).unwrap(), 3);
        exit.request();
        assert_eq!(engine.run_frames(3).unwrap(), 0);
        assert!(engine.run().is_ok());
    }
}
