use std::cell::RefCell;
use std::rc::Rc;
use std::time::Duration;

use volante_engine::platform::{GraphicsCommand, HeadlessPlatform, NativeEvent, NativeHandle};
use volante_engine::window::registry;
use volante_engine::{
    Color, Engine, EngineConfig, EngineError, EngineState, KeyCode, LifecycleState, Renderer, Subsystem,
    SubsystemError, Viewport, World,
};
use winit::keyboard::KeyCode as NativeKey;

type Log = Rc<RefCell<Vec<String>>>;

struct Recorder {
    name: &'static str,
    log: Log,
    platform: Rc<HeadlessPlatform>,
    fail_init: bool,
}

impl Recorder {
    fn new(name: &'static str, log: &Log, platform: &Rc<HeadlessPlatform>) -> Rc<RefCell<Self>> {
        Rc::new(RefCell::new(Self {
            name,
            log: log.clone(),
            platform: platform.clone(),
            fail_init: false,
        }))
    }

    fn failing(name: &'static str, log: &Log, platform: &Rc<HeadlessPlatform>) -> Rc<RefCell<Self>> {
        let r = Self::new(name, log, platform);
        r.borrow_mut().fail_init = true;
        r
    }
}

impl Subsystem for Recorder {
    fn name(&self) -> &str {
        self.name
    }

    fn initialize(&mut self) -> Result<(), SubsystemError> {
        self.log.borrow_mut().push(format!("{}.init", self.name));
        if self.fail_init {
            return Err(SubsystemError::new(self.name, "refused"));
        }
        Ok(())
    }

    fn shutdown(&mut self) {
        let window_alive = !self.platform.live_windows().is_empty();
        self.log
            .borrow_mut()
            .push(format!("{}.shutdown(window_alive={window_alive})", self.name));
    }

    fn update(&mut self, _dt: f32) {
        self.log.borrow_mut().push(format!("{}.update", self.name));
    }
}

struct RecordingWorld {
    log: Log,
    dts: Rc<RefCell<Vec<f32>>>,
    paint: Option<Color>,
}

impl World for RecordingWorld {
    fn update(&mut self, dt: f32) {
        self.dts.borrow_mut().push(dt);
        self.log.borrow_mut().push("world.update".to_string());
    }

    fn render(&mut self, renderer: &mut Renderer) {
        if let Some(color) = self.paint {
            renderer.clear(color);
        }
        self.log.borrow_mut().push("world.render".to_string());
    }
}

fn engine_on(platform: &Rc<HeadlessPlatform>) -> Engine {
    Engine::new(platform.clone()).unwrap()
}

fn handle(engine: &Engine) -> NativeHandle {
    engine.window().unwrap().native_handle()
}

#[test]
fn frame_runs_subsystems_then_world_update_then_render() {
    let p = Rc::new(HeadlessPlatform::new());
    let log: Log = Rc::default();
    let mut engine = engine_on(&p);
    engine.add_subsystem(Recorder::new("a", &log, &p)).unwrap();
    engine
        .set_world(RecordingWorld {
            log: log.clone(),
            dts: Rc::default(),
            paint: Some(Color::TRANSPARENT),
        })
        .unwrap();

    let clear = Color::from_rgba_u8(10, 20, 30, 255);
    let config = EngineConfig {
        clear_color: clear,
        ..EngineConfig::default()
    };
    engine.initialize(&config).unwrap();
    let h = handle(&engine);
    log.borrow_mut().clear();
    p.take_commands();

    assert_eq!(engine.run_frames(2).unwrap(), 2);
    assert_eq!(engine.frame_index(), 2);

    let frame = ["a.update", "world.update", "world.render"];
    let expected: Vec<String> = frame.iter().chain(frame.iter()).map(|s| s.to_string()).collect();
    assert_eq!(*log.borrow(), expected);

    let cmds = p.commands(h);
    let one_frame = [
        GraphicsCommand::MakeCurrent,
        GraphicsCommand::Clear(clear),
        GraphicsCommand::Clear(Color::TRANSPARENT),
        GraphicsCommand::SwapBuffers,
    ];
    assert_eq!(cmds, [one_frame, one_frame].concat());
    assert_eq!(engine.renderer().unwrap().frames_presented(), 2);
}

#[test]
fn subsystems_initialize_in_order_and_shut_down_in_reverse() {
    let p = Rc::new(HeadlessPlatform::new());
    let log: Log = Rc::default();
    let mut engine = engine_on(&p);
    engine.add_subsystem(Recorder::new("a", &log, &p)).unwrap();
    engine.add_subsystem(Recorder::new("b", &log, &p)).unwrap();
    engine.initialize(&EngineConfig::default()).unwrap();

    assert_eq!(engine.subsystem_names(), ["renderer", "input", "a", "b"]);
    assert!(
        engine
            .subsystem_states()
            .iter()
            .all(|(_, s)| *s == LifecycleState::Initialized)
    );

    engine.shutdown();
    assert_eq!(
        *log.borrow(),
        [
            "a.init",
            "b.init",
            "b.shutdown(window_alive=true)",
            "a.shutdown(window_alive=true)",
        ]
    );
    assert!(p.live_windows().is_empty());
    assert!(registry::registered_handles().is_empty());
    assert_eq!(engine.state(), EngineState::ShutDown);
}

#[test]
fn shutdown_is_idempotent() {
    let p = Rc::new(HeadlessPlatform::new());
    let log: Log = Rc::default();
    let mut engine = engine_on(&p);
    engine.add_subsystem(Recorder::new("a", &log, &p)).unwrap();
    engine.initialize(&EngineConfig::default()).unwrap();
    engine.run_frames(1).unwrap();

    engine.shutdown();
    engine.shutdown();
    assert!(!engine.is_running());
    assert!(engine.subsystem_names().is_empty());
    assert_eq!(engine.state(), EngineState::ShutDown);
    drop(engine);

    let shutdowns = log.borrow().iter().filter(|e| e.starts_with("a.shutdown")).count();
    assert_eq!(shutdowns, 1);
    assert!(!Engine::is_live());
}

#[test]
fn shutdown_after_exit_request_still_releases_everything() {
    let p = Rc::new(HeadlessPlatform::new());
    let mut engine = engine_on(&p);
    engine.initialize(&EngineConfig::default()).unwrap();
    engine.request_exit();
    assert!(!engine.is_running());

    engine.shutdown();
    assert!(p.live_windows().is_empty());
    assert!(engine.window().is_none());
    assert_eq!(engine.state(), EngineState::ShutDown);
}

#[test]
fn holding_exit_key_stops_after_the_current_frame() {
    const K: u64 = 3;

    let p = Rc::new(HeadlessPlatform::new());
    let mut engine = engine_on(&p);
    engine.initialize(&EngineConfig::default()).unwrap();
    let h = handle(&engine);
    p.schedule(K, NativeEvent::key_press(h, NativeKey::Escape));

    engine.run().unwrap();

    assert_eq!(engine.frame_index(), K);
    assert_eq!(p.swap_count(h), K as usize);
    assert_eq!(p.polls(), K);
    assert!(!engine.is_running());
}

#[test]
fn other_keys_do_not_stop_the_loop() {
    let p = Rc::new(HeadlessPlatform::new());
    let mut engine = engine_on(&p);
    engine.initialize(&EngineConfig::default()).unwrap();
    let h = handle(&engine);
    p.schedule(1, NativeEvent::key_press(h, NativeKey::KeyW));

    assert_eq!(engine.run_frames(4).unwrap(), 4);
    assert!(engine.is_running());
    assert!(engine.input().unwrap().is_key_pressed(KeyCode::W));
}

#[test]
fn disabled_exit_key_is_ignored() {
    let p = Rc::new(HeadlessPlatform::new());
    let mut engine = engine_on(&p);
    let config = EngineConfig {
        exit_key: None,
        ..EngineConfig::default()
    };
    engine.initialize(&config).unwrap();
    p.schedule(1, NativeEvent::key_press(handle(&engine), NativeKey::Escape));

    assert_eq!(engine.run_frames(3).unwrap(), 3);
    assert!(engine.is_running());
}

#[test]
fn close_request_ends_the_loop_before_the_next_frame() {
    let p = Rc::new(HeadlessPlatform::new());
    let mut engine = engine_on(&p);
    engine.initialize(&EngineConfig::default()).unwrap();
    let h = handle(&engine);
    p.schedule(2, NativeEvent::CloseRequested { handle: h });

    engine.run().unwrap();
    assert_eq!(engine.frame_index(), 2);
    assert_eq!(p.swap_count(h), 2);
}

#[test]
fn resize_reaches_the_renderer_before_the_frame_renders() {
    let p = Rc::new(HeadlessPlatform::new());
    let mut engine = engine_on(&p);
    engine.initialize(&EngineConfig::default()).unwrap();
    let h = handle(&engine);
    p.take_commands();
    p.schedule(2, NativeEvent::Resized { handle: h, width: 640, height: 480 });

    engine.run_frames(2).unwrap();

    let cmds = p.commands(h);
    let resized = GraphicsCommand::SetViewport(Viewport::new(0, 0, 640, 480));
    let at = cmds.iter().position(|c| *c == resized).unwrap();
    let swaps_before = cmds[..at]
        .iter()
        .filter(|c| matches!(c, GraphicsCommand::SwapBuffers))
        .count();
    assert_eq!(swaps_before, 1);
    assert!(cmds[at..].contains(&GraphicsCommand::Clear(Color::BLACK)));
    assert_eq!(cmds.last(), Some(&GraphicsCommand::SwapBuffers));
    assert_eq!(engine.renderer().unwrap().viewport(), Viewport::full(640, 480));
}

#[test]
fn window_set_size_propagates_on_next_poll() {
    let p = Rc::new(HeadlessPlatform::new());
    let mut engine = engine_on(&p);
    engine.initialize(&EngineConfig::default()).unwrap();
    engine.window().unwrap().set_size(300, 200);

    engine.run_frames(1).unwrap();
    assert_eq!(engine.renderer().unwrap().viewport(), Viewport::full(300, 200));
    assert_eq!(engine.window().unwrap().framebuffer_size(), (300, 200));
}

#[test]
fn failed_initialize_leaves_nothing_behind() {
    let p = Rc::new(HeadlessPlatform::new());
    let log: Log = Rc::default();
    let mut engine = engine_on(&p);
    engine.add_subsystem(Recorder::new("a", &log, &p)).unwrap();
    engine.add_subsystem(Recorder::failing("f", &log, &p)).unwrap();
    engine.add_subsystem(Recorder::new("z", &log, &p)).unwrap();

    let err = engine.initialize(&EngineConfig::default()).unwrap_err();
    assert!(matches!(err, EngineError::Subsystem(ref e) if e.subsystem == "f"));

    assert_eq!(*log.borrow(), ["a.init", "f.init", "a.shutdown(window_alive=true)"]);
    assert!(p.live_windows().is_empty());
    assert!(registry::registered_handles().is_empty());
    assert!(!engine.is_running());
    assert_eq!(engine.state(), EngineState::Unstarted);
    assert!(engine.subsystem_names().is_empty());

    // The failed subsystems were consumed; a retry starts from the built-ins.
    engine.initialize(&EngineConfig::default()).unwrap();
    assert_eq!(engine.subsystem_names(), ["renderer", "input"]);
}

#[test]
fn window_failure_is_reported_and_recoverable() {
    let p = Rc::new(HeadlessPlatform::new());
    let mut engine = engine_on(&p);
    p.fail_next_window("no display");

    assert!(matches!(
        engine.initialize(&EngineConfig::default()),
        Err(EngineError::Window(_))
    ));
    assert!(!engine.is_running());
    assert!(engine.initialize(&EngineConfig::default()).is_ok());
}

#[test]
fn frame_deltas_are_non_negative_and_clamped() {
    let p = Rc::new(HeadlessPlatform::new());
    let dts: Rc<RefCell<Vec<f32>>> = Rc::default();
    let mut engine = engine_on(&p);
    engine
        .set_world(RecordingWorld {
            log: Rc::default(),
            dts: dts.clone(),
            paint: None,
        })
        .unwrap();
    let config = EngineConfig {
        max_frame_delta: Some(Duration::from_millis(1)),
        ..EngineConfig::default()
    };
    engine.initialize(&config).unwrap();

    engine.run_frames(3).unwrap();
    std::thread::sleep(Duration::from_millis(5));
    engine.run_frames(2).unwrap();

    let dts = dts.borrow();
    assert_eq!(dts.len(), 5);
    assert!(dts.iter().all(|dt| dt.is_finite() && *dt >= 0.0 && *dt <= 0.001));
    assert_eq!(dts[3], 0.001);
}

#[test]
fn first_delta_is_measured_from_the_end_of_initialize() {
    const IDLE: Duration = Duration::from_millis(80);

    let p = Rc::new(HeadlessPlatform::new());
    let dts: Rc<RefCell<Vec<f32>>> = Rc::default();
    let mut engine = engine_on(&p);
    engine
        .set_world(RecordingWorld {
            log: Rc::default(),
            dts: dts.clone(),
            paint: None,
        })
        .unwrap();

    std::thread::sleep(IDLE);
    let config = EngineConfig {
        max_frame_delta: None,
        ..EngineConfig::default()
    };
    engine.initialize(&config).unwrap();
    engine.run_frames(1).unwrap();

    let first = dts.borrow()[0];
    assert!(first >= 0.0);
    assert!(first < IDLE.as_secs_f32() / 2.0, "first dt {first} includes pre-initialize idle time");
}

#[test]
fn key_callback_can_request_exit() {
    let p = Rc::new(HeadlessPlatform::new());
    let mut engine = engine_on(&p);
    let exit = engine.exit_handle();
    engine.initialize(&EngineConfig::default()).unwrap();
    let h = handle(&engine);

    engine.window().unwrap().set_key_callback(move |key, _| {
        if key == KeyCode::Space {
            exit.request();
        }
    });
    p.schedule(2, NativeEvent::key_press(h, NativeKey::Space));

    engine.run().unwrap();
    assert_eq!(engine.frame_index(), 2);
}
