mod canvas;
mod font;
mod renderer;

pub use canvas::{text_height, text_width, wrap_text, Canvas, Rgba};
pub use renderer::Renderer;
