//! Buffer-backed texture.

use crate::backend::{GlEnum, TextureHandle, TextureTarget};
use crate::context::GlContext;
use crate::error::{GlError, GlResult};
use crate::resources::Buffer;
use crate::types::BufferTextureFormat;

/// A texture whose texels live in an owned [`Buffer`].
pub struct BufferTexture {
    ctx: GlContext,
    handle: TextureHandle,
    format: BufferTextureFormat,
    internal_format: GlEnum,
    // Dropped after the texture is deleted.
    buffer: Buffer,
}

impl BufferTexture {
    /// Create a buffer texture of `size` bytes.
    ///
    /// When `data` is given, its first `min(size, data.len())` bytes are
    /// copied into the buffer.
    pub fn new(
        ctx: &GlContext,
        size: usize,
        format: BufferTextureFormat,
        data: Option<&[u8]>,
    ) -> GlResult<Self> {
        let internal_format = format.internal_format().ok_or_else(|| {
            GlError::UnsupportedFormat(format!("buffer texture format {:?}", format))
        })?;

        let buffer = Buffer::new(ctx, size)?;
        let backend = ctx.backend();
        let handle = backend.create_texture()?;
        backend.bind_texture(TextureTarget::Buffer, Some(handle));
        backend.tex_buffer(internal_format, buffer.handle());

        log::debug!(
            "Created buffer texture {} over buffer {} ({} bytes)",
            handle.raw(),
            buffer.handle().raw(),
            size
        );

        let texture = Self {
            ctx: ctx.clone(),
            handle,
            format,
            internal_format,
            buffer,
        };

        if let Some(data) = data {
            let len = size.min(data.len());
            texture.buffer.write_bytes(0, &data[..len]);
        }

        Ok(texture)
    }

    /// Bind to texture unit `unit`.
    pub fn bind(&self, unit: u32) {
        let backend = self.ctx.backend();
        backend.active_texture(unit);
        backend.bind_texture(TextureTarget::Buffer, Some(self.handle));
    }

    /// The backing buffer.
    pub fn buffer(&self) -> &Buffer {
        &self.buffer
    }

    /// The format the texel buffer is read as.
    pub fn format(&self) -> BufferTextureFormat {
        self.format
    }

    /// The resolved internal format.
    pub fn internal_format(&self) -> GlEnum {
        self.internal_format
    }

    pub fn handle(&self) -> TextureHandle {
        self.handle
    }
}

impl Drop for BufferTexture {
    fn drop(&mut self) {
        log::debug!("Deleting buffer texture {}", self.handle.raw());
        self.ctx.backend().delete_texture(self.handle);
    }
}

impl std::fmt::Debug for BufferTexture {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BufferTexture")
            .field("handle", &self.handle.raw())
            .field("format", &self.format)
            .field("buffer", &self.buffer)
            .finish()
    }
}

static_assertions::assert_not_impl_any!(BufferTexture: Clone, Send, Sync);
