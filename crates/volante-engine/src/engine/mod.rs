//! Engine lifecycle and main loop.
//!
//! [`Engine`] owns the window, world, renderer and input manager, sequences
//! subsystem initialization and teardown, and drives the frame loop:
//! poll → update (input, subsystems, world) → render.

mod config;
mod error;
mod lifecycle;

pub use config::EngineConfig;
pub use error::EngineError;
pub use lifecycle::{Engine, EngineState, ExitHandle};
