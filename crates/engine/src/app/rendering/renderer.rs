use std::sync::Arc;

use pixels::{Error, Pixels, SurfaceTexture};
use winit::window::Window;

use crate::sim::Viewport;

use super::canvas::Canvas;

/// Presents a fixed-resolution frame buffer scaled into the window surface.
pub struct Renderer {
    window: Arc<Window>,
    pixels: Pixels<'static>,
    buffer: Viewport,
}

impl Renderer {
    pub fn new(window: Arc<Window>, buffer: Viewport) -> Result<Self, Error> {
        let size = window.inner_size();
        let pixels = Self::build_pixels(Arc::clone(&window), buffer, size.width, size.height)?;
        Ok(Self {
            window,
            pixels,
            buffer,
        })
    }

    pub fn resize(&mut self, width: u32, height: u32) -> Result<(), Error> {
        if width == 0 || height == 0 {
            return Ok(());
        }
        self.pixels = Self::build_pixels(Arc::clone(&self.window), self.buffer, width, height)?;
        Ok(())
    }

    pub fn draw(&mut self, paint: impl FnOnce(&mut Canvas<'_>)) -> Result<(), Error> {
        let Viewport { width, height } = self.buffer;
        let mut canvas = Canvas::new(self.pixels.frame_mut(), width, height);
        paint(&mut canvas);
        self.pixels.render()
    }

    fn build_pixels(
        window: Arc<Window>,
        buffer: Viewport,
        surface_width: u32,
        surface_height: u32,
    ) -> Result<Pixels<'static>, Error> {
        let surface = SurfaceTexture::new(surface_width.max(1), surface_height.max(1), window);
        Pixels::new(buffer.width, buffer.height, surface)
    }
}
