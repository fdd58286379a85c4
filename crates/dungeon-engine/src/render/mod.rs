//! Turning a [`Frame`](crate::frame::Frame) into pixels.
//!
//! [`text`] and [`tessellate`] are plain CPU code and always available, so
//! draw lists can be inspected headless. The wgpu renderer and the winit
//! window loop are feature-gated behind `renderer`.

pub mod tessellate;
pub mod text;

#[cfg(feature = "renderer")]
pub mod app;
#[cfg(feature = "renderer")]
pub mod renderer;

#[cfg(feature = "renderer")]
pub use app::run_windowed;
#[cfg(feature = "renderer")]
pub use renderer::FrameRenderer;
pub use tessellate::{ScreenCamera, Tessellator, Vertex};
pub use text::{text_height, text_width, TextRenderer};
