//! Frame rendering: the renderer subsystem and its value types.

mod color;
mod renderer;
mod viewport;

pub use color::Color;
pub use renderer::Renderer;
pub use viewport::Viewport;
