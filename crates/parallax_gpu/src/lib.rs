//! # Parallax GPU
//!
//! wgpu backend for `parallax_core`: one pipeline per layer, shared proxy
//! buffers, streamed video textures and a renderer that replays a
//! [`parallax_core::FramePlan`] in a single render pass.

pub mod capture;
pub mod error;
pub mod pipelines;
pub mod renderer;
pub mod shaders;
pub mod textures;
pub mod uniforms;

pub use capture::OffscreenTarget;
pub use error::{RendererError, Result};
pub use pipelines::LayerPipelines;
pub use renderer::{request_device, LayerRenderer, RendererConfig};
pub use textures::TextureStore;
pub use uniforms::LayerUniforms;
