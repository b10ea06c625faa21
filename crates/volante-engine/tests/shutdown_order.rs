use std::cell::RefCell;
use std::rc::Rc;
use std::sync::Mutex;

use log::{LevelFilter, Log, Metadata, Record};
use volante_engine::{Engine, EngineConfig, HeadlessPlatform, Subsystem};

/// Keeps engine log lines so the teardown sequence can be read back.
struct Capture(Mutex<Vec<String>>);

impl Log for Capture {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.target().starts_with("volante_engine")
    }

    fn log(&self, record: &Record) {
        if self.enabled(record.metadata()) {
            if let Ok(mut lines) = self.0.lock() {
                lines.push(record.args().to_string());
            }
        }
    }

    fn flush(&self) {}
}

static CAPTURE: Capture = Capture(Mutex::new(Vec::new()));

struct Host(&'static str);

impl Subsystem for Host {
    fn name(&self) -> &str {
        self.0
    }
}

#[test]
fn built_in_subsystems_shut_down_after_hosts_input_before_renderer() {
    log::set_logger(&CAPTURE).unwrap();
    log::set_max_level(LevelFilter::Trace);

    let mut engine = Engine::new(Rc::new(HeadlessPlatform::new())).unwrap();
    engine.add_subsystem(Rc::new(RefCell::new(Host("a")))).unwrap();
    engine.add_subsystem(Rc::new(RefCell::new(Host("b")))).unwrap();
    engine.initialize(&EngineConfig::default()).unwrap();
    engine.run_frames(1).unwrap();
    engine.shutdown();

    let order: Vec<String> = CAPTURE
        .0
        .lock()
        .unwrap()
        .iter()
        .filter_map(|line| {
            line.strip_prefix("subsystem `")?
                .strip_suffix("` shut down")
                .map(str::to_string)
        })
        .collect();
    assert_eq!(order, ["b", "a", "input", "renderer"]);
}
