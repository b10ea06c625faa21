use thiserror::Error;

use crate::subsystem::SubsystemError;
use crate::window::WindowError;

/// Engine lifecycle failures.
#[derive(Debug, Error)]
pub enum EngineError {
    #[error("another engine is already live on this thread")]
    AlreadyLive,

    #[error("engine is already initialized")]
    AlreadyInitialized,

    #[error("engine is not initialized")]
    NotInitialized,

    #[error("engine has been shut down")]
    ShutDown,

    #[error("window creation failed: {0}")]
    Window(#[from] WindowError),

    #[error(transparent)]
    Subsystem(#[from] SubsystemError),
}
