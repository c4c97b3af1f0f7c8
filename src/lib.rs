//! # RedLilium GL
//!
//! Thin owning wrappers around OpenGL objects.
//!
//! ## Overview
//!
//! This crate provides:
//! - [`Buffer`] - Fixed-size device memory with scoped mapped writes
//! - [`BufferTexture`] - A texture whose texels live in an owned buffer
//! - [`Texture`] - 1D/2D/3D image textures with format resolution
//! - [`Shader`] and [`ShaderProgram`] - Compiled stages and linked programs
//!   with uniforms and uniform blocks addressed by name
//! - [`VertexArray`] - Attribute layouts over borrowed or owned buffers
//!
//! Every driver call goes through a [`GlContext`], which owns a
//! [`GlBackend`]: the [`NativeBackend`] for a real driver, or the
//! [`RecordingBackend`] for testing without a GPU. Wrappers release their
//! driver object exactly once when dropped.
//!
//! ## Example
//!
//! ```ignore
//! use redlilium_gl::{Buffer, ContextConfig, GlContext};
//!
//! let ctx = GlContext::load_with(|name| window.get_proc_address(name), ContextConfig::default())?;
//! let buffer = Buffer::new(&ctx, 1024)?;
//! buffer.write_slice(0, &vertices);
//! ```

pub mod backend;
pub mod context;
pub mod error;
pub mod resources;
pub mod shader;
pub mod types;
pub mod vertex;

// Re-export main types for convenience
pub use backend::{GlBackend, GlCall, NativeBackend, RecordingBackend};
pub use context::{ContextConfig, GlContext};
pub use error::{GlError, GlResult};
pub use resources::{Buffer, BufferTexture, Texture};
pub use shader::{Shader, ShaderProgram, ShaderStage, UniformValue};
pub use types::{
    BufferTextureFormat, ChannelFormat, DepthFormat, EdgeMode, FilterMode, ResolvedFormat,
    TextureDimension, TextureFormat,
};
pub use vertex::{
    AttributeType, BorrowedBuffers, ComponentType, OwnedBuffers, VertexArray, VertexAttribute,
    VertexAttributeDescriptor, VertexBufferBinding, VertexStepMode,
};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Initialize the library.
///
/// Only logs the version; contexts are created with [`GlContext`].
pub fn init() {
    log::info!("RedLilium GL v{} initialized", VERSION);
}
