use anyhow::Result;

pub mod instance;
pub mod headless;

pub use instance::*;
pub use headless::*;

/// Everything the renderer needs for one frame.
#[derive(Debug, Clone, Copy)]
pub struct FrameView<'a> {
    /// Scene-ordered instances: background geometry first, cars last.
    pub instances: &'a [RenderInstance],
    pub interpolation_factor: f32,
    pub frame: u64,
    pub step: Option<u64>,
}

/// Consumer of composed frames. Uploading and drawing is the
/// implementation's business; the frame driver only logs its errors.
pub trait Renderer {
    fn render(&mut self, frame: &FrameView<'_>) -> Result<()>;
    fn get_name(&self) -> &'static str;
}
