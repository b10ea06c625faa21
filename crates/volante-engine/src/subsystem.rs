//! Lifecycle contract shared by engine subsystems.

use thiserror::Error;

/// A component the engine initializes, updates every frame and shuts down.
///
/// The engine drives every transition: `initialize` once, `update` once or
/// more per frame while running, `shutdown` once. A subsystem is never
/// re-initialized after shutdown. Empty default bodies make each hook an
/// opt-in extension point.
pub trait Subsystem {
    /// Stable name used in logs and errors.
    fn name(&self) -> &str;

    fn initialize(&mut self) -> Result<(), SubsystemError> {
        Ok(())
    }

    fn shutdown(&mut self) {}

    fn update(&mut self, dt: f32) {
        let _ = dt;
    }
}

/// Where a subsystem is in its one-way lifecycle.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum LifecycleState {
    Uninitialized,
    Initialized,
    ShutDown,
}

/// A subsystem refused to initialize.
#[derive(Debug, Clone, Error)]
#[error("subsystem `{subsystem}` failed: {message}")]
pub struct SubsystemError {
    pub subsystem: String,
    pub message: String,
}

impl SubsystemError {
    pub fn new(subsystem: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            subsystem: subsystem.into(),
            message: message.into(),
        }
    }
}
