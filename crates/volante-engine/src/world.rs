//! Scene content hook.

use crate::render::Renderer;

/// Per-frame hook for whatever the host puts on screen.
///
/// The engine updates the world after input and every subsystem, and renders
/// it between clearing and presenting the frame. Both hooks default to no-ops.
pub trait World {
    fn update(&mut self, dt: f32) {
        let _ = dt;
    }

    fn render(&mut self, renderer: &mut Renderer) {
        let _ = renderer;
    }
}

/// World with nothing in it.
#[derive(Debug, Default)]
pub struct EmptyWorld;

impl World for EmptyWorld {}
