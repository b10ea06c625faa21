use std::time::Duration;

use crate::input::KeyCode;
use crate::render::Color;
use crate::window::WindowConfig;

/// Startup configuration for [`Engine::initialize`](super::Engine::initialize).
#[derive(Debug, Clone, PartialEq)]
pub struct EngineConfig {
    pub window: WindowConfig,

    /// Key that ends the main loop while held. `None` disables it.
    pub exit_key: Option<KeyCode>,

    /// Color the frame buffer is cleared to before the world renders.
    pub clear_color: Color,

    /// Upper bound for a frame's delta time. `None` passes wall-clock deltas
    /// through unchanged.
    pub max_frame_delta: Option<Duration>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            window: WindowConfig::default(),
            exit_key: Some(KeyCode::Escape),
            clear_color: Color::BLACK,
            max_frame_delta: None,
        }
    }
}

impl EngineConfig {
    pub fn with_window(window: WindowConfig) -> Self {
        Self {
            window,
            ..Self::default()
        }
    }
}
