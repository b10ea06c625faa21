use crate::subsystem::{Subsystem, SubsystemError};
use crate::window::{GraphicsContext, Window};

use super::{Color, Viewport};

/// Frame-level renderer over a window's graphics context.
///
/// Draw-call architecture lives above this type; it only brackets frames,
/// clears and tracks the viewport.
#[derive(Debug)]
pub struct Renderer {
    context: GraphicsContext,
    viewport: Viewport,
    frames_presented: u64,
    in_frame: bool,
}

impl Renderer {
    pub fn new(window: &Window) -> Self {
        Self {
            context: window.graphics_context(),
            viewport: Viewport::default(),
            frames_presented: 0,
            in_frame: false,
        }
    }

    /// Starts a frame. Re-makes the context current, since anything between
    /// frames may have retargeted it.
    pub fn begin_frame(&mut self) {
        if self.in_frame {
            log::warn!("begin_frame called twice without end_frame");
        }
        self.context.make_current();
        self.in_frame = true;
    }

    /// Presents the frame.
    pub fn end_frame(&mut self) {
        self.context.swap_buffers();
        self.in_frame = false;
        self.frames_presented += 1;
    }

    pub fn set_viewport(&mut self, x: i32, y: i32, width: u32, height: u32) {
        self.viewport = Viewport::new(x, y, width, height);
        log::debug!("viewport set to {width}x{height} at ({x}, {y})");
        self.context.set_viewport(self.viewport);
    }

    pub fn clear(&mut self, color: Color) {
        self.context.clear(color);
    }

    /// Last viewport set on this renderer.
    pub fn viewport(&self) -> Viewport {
        self.viewport
    }

    pub fn frames_presented(&self) -> u64 {
        self.frames_presented
    }

    pub fn context(&self) -> &GraphicsContext {
        &self.context
    }
}

impl Subsystem for Renderer {
    fn name(&self) -> &str {
        "renderer"
    }

    fn initialize(&mut self) -> Result<(), SubsystemError> {
        self.context.make_current();
        let (width, height) = self.context.framebuffer_size();
        self.set_viewport(0, 0, width, height);
        log::info!("renderer initialized ({width}x{height})");
        Ok(())
    }

    fn shutdown(&mut self) {
        log::info!("renderer shut down after {} frames", self.frames_presented);
    }
}

#[cfg(test)]
mod tests {
    use std::rc::Rc;

    use super::*;
    use crate::platform::{GraphicsCommand, HeadlessPlatform, Platform};
    use crate::window::WindowConfig;

    fn setup() -> (Rc<HeadlessPlatform>, Window) {
        let p = Rc::new(HeadlessPlatform::new());
        let dynp: Rc<dyn Platform> = p.clone();
        let w = Window::create(dynp, &WindowConfig::new(320, 200, "r")).unwrap();
        p.take_commands();
        (p, w)
    }

    #[test]
    fn initialize_seeds_viewport_from_framebuffer() {
        let (p, w) = setup();
        let mut r = Renderer::new(&w);
        r.initialize().unwrap();
        assert_eq!(r.viewport(), Viewport::full(320, 200));
        assert!(p.commands(w.native_handle()).contains(&GraphicsCommand::SetViewport(Viewport::full(320, 200))));
    }

    #[test]
    fn frame_bracket_order() {
        let (p, w) = setup();
        let mut r = Renderer::new(&w);
        r.begin_frame();
        r.clear(Color::BLACK);
        r.end_frame();

        assert_eq!(
            p.commands(w.native_handle()),
            vec![
                GraphicsCommand::MakeCurrent,
                GraphicsCommand::Clear(Color::BLACK),
                GraphicsCommand::SwapBuffers,
            ]
        );
        assert_eq!(r.frames_presented(), 1);
    }
}
