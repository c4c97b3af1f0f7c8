//! GPU memory buffer.

use bytemuck::Pod;

use crate::backend::{BufferHandle, BufferTarget, BufferUsageHint, MapAccess};
use crate::context::GlContext;
use crate::error::GlResult;

/// A fixed-size block of device memory.
///
/// Storage is allocated at construction and released when the buffer is
/// dropped. Contents are written through scoped mappings, see
/// [`write`](Self::write).
///
/// # Example
///
/// ```ignore
/// let buffer = Buffer::new(&ctx, 1024)?;
/// buffer.write_slice(0, &[1.0f32, 2.0, 3.0]);
/// ```
pub struct Buffer {
    ctx: GlContext,
    handle: BufferHandle,
    size: usize,
}

impl Buffer {
    /// Allocate `size` bytes of uninitialized storage with static-draw usage.
    pub fn new(ctx: &GlContext, size: usize) -> GlResult<Self> {
        Self::with_usage(ctx, size, BufferUsageHint::StaticDraw)
    }

    /// Allocate `size` bytes of uninitialized storage with the given usage hint.
    pub fn with_usage(ctx: &GlContext, size: usize, usage: BufferUsageHint) -> GlResult<Self> {
        let backend = ctx.backend();
        let handle = backend.create_buffer()?;
        backend.bind_buffer(BufferTarget::CopyWrite, Some(handle));
        backend.buffer_data(BufferTarget::CopyWrite, size, None, usage);
        backend.bind_buffer(BufferTarget::CopyWrite, None);

        log::debug!("Created buffer {} ({} bytes, {:?})", handle.raw(), size, usage);

        Ok(Self {
            ctx: ctx.clone(),
            handle,
            size,
        })
    }

    /// Get the buffer size in bytes.
    pub fn size(&self) -> usize {
        self.size
    }

    /// Get the driver handle.
    pub fn handle(&self) -> BufferHandle {
        self.handle
    }

    /// Bind the buffer to `target`.
    pub fn bind(&self, target: BufferTarget) {
        self.ctx.backend().bind_buffer(target, Some(self.handle));
    }

    /// Map `size` bytes at `offset` and let `f` write them.
    ///
    /// A `size` of zero maps everything from `offset` to the end of the
    /// buffer. Mapping the whole buffer lets the driver discard all previous
    /// contents; any smaller range only discards that range.
    ///
    /// # Panics
    ///
    /// Panics if the driver refuses the mapping, which also happens when the
    /// range does not fit in the buffer.
    pub fn write<F>(&self, offset: usize, size: usize, f: F)
    where
        F: FnOnce(&mut [u8]),
    {
        let size = if size == 0 {
            self.size.saturating_sub(offset)
        } else {
            size
        };
        let access = if offset == 0 && size == self.size {
            MapAccess::WRITE | MapAccess::INVALIDATE_BUFFER
        } else {
            MapAccess::WRITE | MapAccess::INVALIDATE_RANGE
        };

        let backend = self.ctx.backend();
        backend.bind_buffer(BufferTarget::CopyWrite, Some(self.handle));
        let Some(mapped) = backend.map_buffer_range(BufferTarget::CopyWrite, offset, size, access)
        else {
            panic!(
                "failed to map {} bytes at offset {} of buffer {}",
                size,
                offset,
                self.handle.raw()
            );
        };

        // SAFETY: the driver guarantees `size` writable bytes at `mapped`
        // until the range is unmapped below, provided the callback does not
        // delete or reallocate this buffer through the backend.
        let bytes = unsafe { std::slice::from_raw_parts_mut(mapped.as_ptr(), size) };
        f(bytes);

        // The callback may have bound something else.
        backend.bind_buffer(BufferTarget::CopyWrite, Some(self.handle));
        if !backend.unmap_buffer(BufferTarget::CopyWrite) {
            log::warn!(
                "Buffer {} contents were lost while mapped",
                self.handle.raw()
            );
        }
        backend.bind_buffer(BufferTarget::CopyWrite, None);
    }

    /// Copy `data` into the buffer at `offset`.
    pub fn write_bytes(&self, offset: usize, data: &[u8]) {
        if data.is_empty() {
            return;
        }
        self.write(offset, data.len(), |mapped| mapped.copy_from_slice(data));
    }

    /// Copy a slice of plain-old-data values into the buffer at `offset`.
    pub fn write_slice<T: Pod>(&self, offset: usize, data: &[T]) {
        self.write_bytes(offset, bytemuck::cast_slice(data));
    }
}

impl Drop for Buffer {
    fn drop(&mut self) {
        log::debug!("Deleting buffer {}", self.handle.raw());
        self.ctx.backend().delete_buffer(self.handle);
    }
}

impl std::fmt::Debug for Buffer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Buffer")
            .field("handle", &self.handle.raw())
            .field("size", &self.size)
            .finish()
    }
}

// Buffers are tied to the context's thread and own their handle exclusively.
static_assertions::assert_not_impl_any!(Buffer: Clone, Send, Sync);

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::{GlCall, RecordingBackend};

    fn setup() -> (RecordingBackend, GlContext) {
        let backend = RecordingBackend::new();
        let ctx = GlContext::new(backend.clone());
        (backend, ctx)
    }

    #[test]
    fn test_buffer_creation_calls() {
        let (backend, ctx) = setup();
        let buffer = Buffer::new(&ctx, 64).unwrap();
        assert_eq!(buffer.size(), 64);
        assert_eq!(
            backend.calls(),
            vec![
                GlCall::CreateBuffer(buffer.handle()),
                GlCall::BindBuffer {
                    target: BufferTarget::CopyWrite,
                    buffer: Some(buffer.handle()),
                },
                GlCall::BufferData {
                    target: BufferTarget::CopyWrite,
                    size: 64,
                    with_data: false,
                    usage: BufferUsageHint::StaticDraw,
                },
                GlCall::BindBuffer {
                    target: BufferTarget::CopyWrite,
                    buffer: None,
                },
            ]
        );
    }

    #[test]
    fn test_full_write_invalidates_buffer() {
        let (backend, ctx) = setup();
        let buffer = Buffer::new(&ctx, 4).unwrap();
        backend.take_calls();

        buffer.write(0, 0, |bytes| bytes.copy_from_slice(&[1, 2, 3, 4]));

        let handle = buffer.handle();
        assert_eq!(
            backend.calls(),
            vec![
                GlCall::BindBuffer {
                    target: BufferTarget::CopyWrite,
                    buffer: Some(handle),
                },
                GlCall::MapBufferRange {
                    target: BufferTarget::CopyWrite,
                    offset: 0,
                    length: 4,
                    access: MapAccess::WRITE | MapAccess::INVALIDATE_BUFFER,
                },
                GlCall::BindBuffer {
                    target: BufferTarget::CopyWrite,
                    buffer: Some(handle),
                },
                GlCall::UnmapBuffer(BufferTarget::CopyWrite),
                GlCall::BindBuffer {
                    target: BufferTarget::CopyWrite,
                    buffer: None,
                },
            ]
        );
        assert_eq!(backend.buffer_contents(handle).unwrap(), vec![1, 2, 3, 4]);
    }

    #[test]
    fn test_partial_write_invalidates_range() {
        let (backend, ctx) = setup();
        let buffer = Buffer::new(&ctx, 8).unwrap();
        backend.take_calls();

        buffer.write_bytes(2, &[9, 9]);

        assert!(backend.calls().contains(&GlCall::MapBufferRange {
            target: BufferTarget::CopyWrite,
            offset: 2,
            length: 2,
            access: MapAccess::WRITE | MapAccess::INVALIDATE_RANGE,
        }));
        assert_eq!(
            backend.buffer_contents(buffer.handle()).unwrap(),
            vec![0, 0, 9, 9, 0, 0, 0, 0]
        );
    }

    #[test]
    fn test_write_slice_of_pod_values() {
        let (backend, ctx) = setup();
        let buffer = Buffer::new(&ctx, 8).unwrap();
        buffer.write_slice(0, &[1u32, 2u32]);
        let expected: Vec<u8> = bytemuck::cast_slice(&[1u32, 2u32]).to_vec();
        assert_eq!(backend.buffer_contents(buffer.handle()).unwrap(), expected);
    }

    #[test]
    fn test_empty_write_is_noop() {
        let (backend, ctx) = setup();
        let buffer = Buffer::new(&ctx, 8).unwrap();
        backend.take_calls();
        buffer.write_bytes(0, &[]);
        assert!(backend.calls().is_empty());
    }

    #[test]
    fn test_nested_write_into_another_buffer() {
        let (backend, ctx) = setup();
        let outer = Buffer::new(&ctx, 8).unwrap();
        let inner = Buffer::new(&ctx, 8).unwrap();
        backend.take_calls();

        outer.write(0, 0, |bytes| {
            bytes.fill(1);
            inner.write_bytes(0, &[2; 8]);
        });

        assert_eq!(backend.buffer_contents(outer.handle()).unwrap(), vec![1; 8]);
        assert_eq!(backend.buffer_contents(inner.handle()).unwrap(), vec![2; 8]);
        // Each unmap is preceded by binding the buffer it belongs to.
        let bound_before_unmap: Vec<_> = backend
            .calls()
            .windows(2)
            .filter(|pair| matches!(pair[1], GlCall::UnmapBuffer(_)))
            .map(|pair| pair[0].clone())
            .collect();
        assert_eq!(
            bound_before_unmap,
            vec![
                GlCall::BindBuffer {
                    target: BufferTarget::CopyWrite,
                    buffer: Some(inner.handle()),
                },
                GlCall::BindBuffer {
                    target: BufferTarget::CopyWrite,
                    buffer: Some(outer.handle()),
                },
            ]
        );
    }

    #[test]
    #[should_panic(expected = "failed to map")]
    fn test_refused_mapping_panics() {
        let backend = RecordingBackend::new().with_mapping_refused();
        let ctx = GlContext::new(backend);
        let buffer = Buffer::new(&ctx, 8).unwrap();
        buffer.write(0, 0, |_| {});
    }

    #[test]
    fn test_drop_deletes_once() {
        let (backend, ctx) = setup();
        let buffer = Buffer::new(&ctx, 8).unwrap();
        let handle = buffer.handle();
        drop(buffer);
        assert_eq!(
            backend.count_calls(|c| *c == GlCall::DeleteBuffer(handle)),
            1
        );
        assert_eq!(backend.live_objects(), 0);
    }

    #[test]
    fn test_buffer_debug() {
        let (_backend, ctx) = setup();
        let buffer = Buffer::new(&ctx, 1024).unwrap();
        let debug = format!("{:?}", buffer);
        assert!(debug.contains("Buffer"));
        assert!(debug.contains("1024"));
    }
}
