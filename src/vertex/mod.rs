//! Vertex arrays.
//!
//! [`VertexArray`] comes in two flavours, chosen at construction:
//!
//! - [`VertexArray::with_bindings`] configures every attribute immediately
//!   from buffers the caller owns. The array borrows those buffers, so they
//!   cannot be dropped while it is alive.
//! - [`VertexArray::with_owned_buffers`] allocates its own vertex, instance
//!   and index buffers. Attributes are registered one by one and turned into
//!   driver bindings by [`create_attribute_bindings`].
//!
//! [`create_attribute_bindings`]: VertexArray::create_attribute_bindings

mod layout;

use std::fmt;

use crate::backend::{BufferTarget, GlBackend, VertexArrayHandle};
use crate::context::GlContext;
use crate::error::GlResult;
use crate::resources::Buffer;

pub use layout::{
    compute_attribute_offsets, AttributeOffsets, AttributeType, ComponentType, VertexAttribute,
    VertexAttributeDescriptor, VertexBufferBinding, VertexStepMode,
};

/// Buffers borrowed by a vertex array for its whole lifetime.
#[derive(Debug)]
pub struct BorrowedBuffers<'a> {
    bindings: Vec<VertexBufferBinding<'a>>,
}

/// Buffers and attributes owned by a vertex array.
#[derive(Debug)]
pub struct OwnedBuffers {
    vertex: Buffer,
    instance: Buffer,
    index: Buffer,
    attributes: Vec<VertexAttribute>,
}

/// A vertex array object over borrowed or owned buffers.
pub struct VertexArray<S> {
    ctx: GlContext,
    handle: VertexArrayHandle,
    buffers: S,
}

impl<S> VertexArray<S> {
    /// Bind the array.
    pub fn bind(&self) {
        self.ctx.backend().bind_vertex_array(Some(self.handle));
    }

    pub fn handle(&self) -> VertexArrayHandle {
        self.handle
    }
}

impl<'a> VertexArray<BorrowedBuffers<'a>> {
    /// Create an array and configure every attribute of `bindings`.
    ///
    /// Each attribute is enabled with divisor 1 for instanced bindings and 0
    /// otherwise. The array is left bound.
    pub fn with_bindings(
        ctx: &GlContext,
        bindings: Vec<VertexBufferBinding<'a>>,
    ) -> GlResult<Self> {
        let backend = ctx.backend();
        let handle = backend.create_vertex_array()?;
        backend.bind_vertex_array(Some(handle));

        for binding in &bindings {
            backend.bind_buffer(BufferTarget::Array, Some(binding.buffer.handle()));
            let divisor = binding.instanced as u32;
            for attribute in &binding.attributes {
                set_attribute_pointer(backend, attribute, binding.stride);
                backend.vertex_attrib_divisor(attribute.location, divisor);
                backend.enable_vertex_attrib_array(attribute.location);
            }
        }
        backend.bind_buffer(BufferTarget::Array, None);

        log::debug!(
            "Created vertex array {} over {} buffers",
            handle.raw(),
            bindings.len()
        );

        Ok(Self {
            ctx: ctx.clone(),
            handle,
            buffers: BorrowedBuffers { bindings },
        })
    }

    /// The bindings the array was configured with.
    pub fn bindings(&self) -> &[VertexBufferBinding<'a>] {
        &self.buffers.bindings
    }
}

impl VertexArray<OwnedBuffers> {
    /// Create an array owning a vertex, an index and an instance buffer of
    /// the given byte sizes. No attributes are configured yet.
    pub fn with_owned_buffers(
        ctx: &GlContext,
        vertex_size: usize,
        index_size: usize,
        instance_size: usize,
    ) -> GlResult<Self> {
        let vertex = Buffer::new(ctx, vertex_size)?;
        let instance = Buffer::new(ctx, instance_size)?;
        let index = Buffer::new(ctx, index_size)?;
        let handle = ctx.backend().create_vertex_array()?;

        log::debug!("Created vertex array {} with owned buffers", handle.raw());

        Ok(Self {
            ctx: ctx.clone(),
            handle,
            buffers: OwnedBuffers {
                vertex,
                instance,
                index,
                attributes: Vec::new(),
            },
        })
    }

    /// Register an attribute. Takes effect at the next
    /// [`create_attribute_bindings`](Self::create_attribute_bindings).
    pub fn add_attribute(&mut self, attribute: VertexAttribute) {
        self.buffers.attributes.push(attribute);
    }

    /// Pack the registered attributes and configure the driver bindings.
    ///
    /// Per-vertex attributes read from the vertex buffer and per-instance
    /// attributes from the instance buffer, each tightly packed in
    /// registration order. The index buffer is attached to the array.
    pub fn create_attribute_bindings(&self) {
        let attributes = &self.buffers.attributes;
        let layout = compute_attribute_offsets(attributes);

        let backend = self.ctx.backend();
        backend.bind_vertex_array(Some(self.handle));
        for (attribute, &offset) in attributes.iter().zip(&layout.offsets) {
            let buffer = match attribute.step_mode {
                VertexStepMode::Vertex => &self.buffers.vertex,
                VertexStepMode::Instance => &self.buffers.instance,
            };
            backend.bind_buffer(BufferTarget::Array, Some(buffer.handle()));

            let stride = layout.stride(attribute.step_mode);
            let component_type = attribute.attribute_type.component_type().to_gl();
            match attribute.attribute_type {
                AttributeType::Float => backend.vertex_attrib_pointer(
                    attribute.location,
                    attribute.components,
                    component_type,
                    false,
                    stride,
                    offset,
                ),
                AttributeType::Int | AttributeType::UnsignedInt => backend
                    .vertex_attrib_i_pointer(
                        attribute.location,
                        attribute.components,
                        component_type,
                        stride,
                        offset,
                    ),
            }
            backend.vertex_attrib_divisor(attribute.location, attribute.step_mode.divisor());
        }
        backend.bind_buffer(BufferTarget::Array, None);
        backend.bind_buffer(BufferTarget::ElementArray, Some(self.buffers.index.handle()));

        log::trace!(
            "Vertex array {}: {} attributes, vertex stride {}, instance stride {}",
            self.handle.raw(),
            attributes.len(),
            layout.vertex_stride,
            layout.instance_stride
        );
    }

    /// Bind the array and enable every registered attribute.
    pub fn enable(&self) {
        let backend = self.ctx.backend();
        backend.bind_vertex_array(Some(self.handle));
        for attribute in &self.buffers.attributes {
            backend.enable_vertex_attrib_array(attribute.location);
        }
    }

    /// Disable every registered attribute of the bound array.
    pub fn disable(&self) {
        let backend = self.ctx.backend();
        for attribute in &self.buffers.attributes {
            backend.disable_vertex_attrib_array(attribute.location);
        }
    }

    /// Attributes in the order they were added.
    pub fn attributes(&self) -> &[VertexAttribute] {
        &self.buffers.attributes
    }

    /// Buffer holding per-vertex attributes.
    pub fn vertex_buffer(&self) -> &Buffer {
        &self.buffers.vertex
    }

    /// Buffer holding per-instance attributes.
    pub fn instance_buffer(&self) -> &Buffer {
        &self.buffers.instance
    }

    /// Element index buffer.
    pub fn index_buffer(&self) -> &Buffer {
        &self.buffers.index
    }
}

fn set_attribute_pointer(
    backend: &dyn GlBackend,
    attribute: &VertexAttributeDescriptor,
    stride: usize,
) {
    let component_type = attribute.component_type.to_gl();
    if attribute.integer {
        backend.vertex_attrib_i_pointer(
            attribute.location,
            attribute.components,
            component_type,
            stride,
            attribute.offset,
        );
    } else {
        backend.vertex_attrib_pointer(
            attribute.location,
            attribute.components,
            component_type,
            attribute.normalized,
            stride,
            attribute.offset,
        );
    }
}

impl<S> Drop for VertexArray<S> {
    fn drop(&mut self) {
        log::debug!("Deleting vertex array {}", self.handle.raw());
        self.ctx.backend().delete_vertex_array(self.handle);
    }
}

impl<S: fmt::Debug> fmt::Debug for VertexArray<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("VertexArray")
            .field("handle", &self.handle.raw())
            .field("buffers", &self.buffers)
            .finish()
    }
}

static_assertions::assert_not_impl_any!(VertexArray<OwnedBuffers>: Clone, Send, Sync);
static_assertions::assert_not_impl_any!(VertexArray<BorrowedBuffers<'static>>: Clone, Send, Sync);
