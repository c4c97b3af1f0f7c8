//! Resource wrappers that own driver memory.
//!
//! Each wrapper holds the [`GlContext`](crate::GlContext) it was created
//! with and releases its driver object exactly once when dropped.

mod buffer;
mod buffer_texture;
mod texture;

pub use buffer::Buffer;
pub use buffer_texture::BufferTexture;
pub use texture::Texture;
