use thiserror::Error;

use crate::platform::PlatformError;

/// Window construction failures.
#[derive(Debug, Error)]
pub enum WindowError {
    #[error("invalid window configuration: {0}")]
    InvalidConfig(String),

    #[error(transparent)]
    Platform(#[from] PlatformError),
}
