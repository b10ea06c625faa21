//! Input subsystem.
//!
//! The neutral vocabulary ([`KeyCode`], [`MouseButton`], [`InputAction`]) is
//! what engine code and window callbacks see. [`translate`] maps it to and
//! from the native backend vocabulary.

mod manager;
pub mod translate;
mod types;

pub use manager::InputManager;
pub use types::{InputAction, KeyCode, MouseButton};
