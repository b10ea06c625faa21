//! Volante engine crate.
//!
//! A minimal real-time application host: one native window, a renderer and
//! an input manager run as subsystems, and a user [`World`] driven by a fixed
//! poll → update → render loop. Windowing backends plug in through
//! [`Platform`]; `WinitPlatform` targets desktops and `HeadlessPlatform`
//! runs the same loop in memory.

pub mod engine;
pub mod input;
pub mod logging;
pub mod platform;
pub mod render;
pub mod subsystem;
pub mod time;
pub mod window;
pub mod world;

pub use engine::{Engine, EngineConfig, EngineError, EngineState, ExitHandle};
pub use input::{InputAction, InputManager, KeyCode, MouseButton};
pub use platform::{HeadlessPlatform, Platform, WinitPlatform};
pub use render::{Color, Renderer, Viewport};
pub use subsystem::{LifecycleState, Subsystem, SubsystemError};
pub use window::{Window, WindowConfig, WindowError};
pub use world::{EmptyWorld, World};
