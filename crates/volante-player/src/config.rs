use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{bail, Context, Result};
use clap::Parser;
use serde::Deserialize;
use volante_engine::{Color, EngineConfig, KeyCode, WindowConfig};

/// Frames a headless run renders when `--frames` is not given. Nothing can
/// close a headless window from the outside.
pub const DEFAULT_HEADLESS_FRAMES: u64 = 60;

#[derive(Debug, Parser)]
#[command(name = "volante")]
#[command(about = "Opens a window and runs the Volante main loop", long_about = None)]
#[command(version)]
pub struct Cli {
    /// Window width in logical pixels
    #[arg(long)]
    pub width: Option<u32>,

    /// Window height in logical pixels
    #[arg(long)]
    pub height: Option<u32>,

    /// Window title
    #[arg(long)]
    pub title: Option<String>,

    /// Open a borderless fullscreen window
    #[arg(long, overrides_with = "windowed")]
    pub fullscreen: bool,

    /// Open a regular window even if the config file asks for fullscreen
    #[arg(long, overrides_with = "fullscreen")]
    pub windowed: bool,

    /// Wait for vertical sync when presenting
    #[arg(long, overrides_with = "no_vsync")]
    pub vsync: bool,

    /// Present without waiting for vertical sync
    #[arg(long, overrides_with = "vsync")]
    pub no_vsync: bool,

    /// MSAA samples per pixel
    #[arg(long)]
    pub samples: Option<u32>,

    /// Key that quits while held (e.g. "Escape", "Q"), or "none"
    #[arg(long, value_name = "KEY")]
    pub exit_key: Option<String>,

    /// TOML file with startup settings; flags override it
    #[arg(long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Run against the in-memory backend instead of a desktop window
    #[arg(long)]
    pub headless: bool,

    /// Stop after this many frames
    #[arg(long, value_name = "N")]
    pub frames: Option<u64>,

    /// Log filter in env_logger syntax (e.g. "debug", "volante_engine=trace")
    #[arg(long, value_name = "FILTER")]
    pub log: Option<String>,
}

/// Contents of the `--config` file.
///
/// ```toml
/// exit_key = "Q"
/// clear_color = "#1e1e2e"
/// max_frame_delta_ms = 250
///
/// [window]
/// width = 1280
/// height = 720
/// title = "demo"
/// ```
#[derive(Debug, Default, Deserialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct FileConfig {
    pub window: WindowConfig,
    pub exit_key: Option<String>,
    pub clear_color: Option<String>,
    pub max_frame_delta_ms: Option<u64>,
}

impl FileConfig {
    pub fn load(path: &Path) -> Result<Self> {
        let text = fs::read_to_string(path)
            .with_context(|| format!("failed to read config file {}", path.display()))?;
        Self::parse(&text).with_context(|| format!("invalid config file {}", path.display()))
    }

    pub fn parse(text: &str) -> Result<Self> {
        Ok(toml::from_str(text)?)
    }
}

/// Startup settings after layering defaults, the config file and flags.
#[derive(Debug, Clone, PartialEq)]
pub struct PlayerConfig {
    pub engine: EngineConfig,
    pub headless: bool,
    pub frames: Option<u64>,
}

impl PlayerConfig {
    /// Loads the file named by `--config`, if any, and applies the flags.
    pub fn from_cli(cli: Cli) -> Result<Self> {
        let file = match cli.config.as_deref() {
            Some(path) => FileConfig::load(path)?,
            None => FileConfig::default(),
        };
        Self::resolve(file, cli)
    }

    /// Defaults < file < flags.
    pub fn resolve(file: FileConfig, cli: Cli) -> Result<Self> {
        let mut engine = EngineConfig::with_window(file.window);

        if let Some(name) = file.exit_key.as_deref() {
            engine.exit_key = parse_exit_key(name)?;
        }
        if let Some(hex) = file.clear_color.as_deref() {
            engine.clear_color =
                Color::from_hex(hex).with_context(|| format!("invalid clear_color `{hex}`"))?;
        }
        if let Some(ms) = file.max_frame_delta_ms {
            engine.max_frame_delta = Some(Duration::from_millis(ms));
        }

        let window = &mut engine.window;
        if let Some(width) = cli.width {
            window.width = width;
        }
        if let Some(height) = cli.height {
            window.height = height;
        }
        if let Some(title) = cli.title {
            window.title = title;
        }
        if let Some(fullscreen) = switch(cli.fullscreen, cli.windowed) {
            window.fullscreen = fullscreen;
        }
        if let Some(vsync) = switch(cli.vsync, cli.no_vsync) {
            window.vsync = vsync;
        }
        if let Some(samples) = cli.samples {
            window.samples = samples;
        }
        if let Some(name) = cli.exit_key.as_deref() {
            engine.exit_key = parse_exit_key(name)?;
        }

        let frames = match (cli.frames, cli.headless) {
            (Some(n), _) => Some(n),
            (None, true) => Some(DEFAULT_HEADLESS_FRAMES),
            (None, false) => None,
        };

        Ok(Self {
            engine,
            headless: cli.headless,
            frames,
        })
    }
}

/// Resolves an `--x`/`--no-x` style pair. clap keeps only the last of the
/// two, so at most one is set.
fn switch(on: bool, off: bool) -> Option<bool> {
    match (on, off) {
        (true, _) => Some(true),
        (false, true) => Some(false),
        (false, false) => None,
    }
}

/// `"none"` disables the exit key.
fn parse_exit_key(name: &str) -> Result<Option<KeyCode>> {
    if name.trim().eq_ignore_ascii_case("none") {
        return Ok(None);
    }
    match KeyCode::from_name(name) {
        Some(KeyCode::Unknown) | None => bail!("unknown exit key `{name}`"),
        Some(key) => Ok(Some(key)),
    }
}
