//! Window abstraction.
//!
//! [`Window`] wraps one native window from a [`Platform`](crate::platform::Platform)
//! backend and routes the backend's context-free event hooks back to the
//! window's callbacks through the handle [`registry`].

mod config;
mod error;
pub mod registry;
mod native;

pub use config::WindowConfig;
pub use error::WindowError;
pub use registry::{CursorPosCallback, KeyCallback, MouseButtonCallback, ResizeCallback};
pub use native::{GraphicsContext, Window};
