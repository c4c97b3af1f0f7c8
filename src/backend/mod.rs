//! Driver backend abstraction layer.
//!
//! Every side effect the wrappers produce goes through the [`GlBackend`]
//! trait, one method per driver entry point. The wrappers never touch
//! ambient driver state directly; they hold a [`GlContext`](crate::GlContext)
//! which owns a backend.
//!
//! # Available Backends
//!
//! - [`NativeBackend`]: forwards to the real driver through the `gl` crate
//! - [`RecordingBackend`]: records every call as a [`GlCall`] and simulates
//!   buffer storage, for testing without a GPU
//!
//! Handles are non-zero driver names. Typed targets are converted to driver
//! enums in [`conversion`]; values that are themselves resolved driver
//! constants (formats, filters, component types) travel as raw [`GlEnum`]s.

pub mod conversion;
pub mod native;
pub mod recording;

use std::num::NonZeroU32;
use std::ptr::NonNull;

use bitflags::bitflags;

use crate::error::GlResult;
use crate::shader::ShaderStage;

pub use native::NativeBackend;
pub use recording::{GlCall, RecordingBackend};

/// Raw driver enumeration value.
pub type GlEnum = u32;

macro_rules! gl_handle {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
        pub struct $name(NonZeroU32);

        impl $name {
            /// Wrap a driver object name. Returns `None` for the reserved name 0.
            pub fn from_raw(raw: u32) -> Option<Self> {
                NonZeroU32::new(raw).map(Self)
            }

            /// The driver object name.
            pub fn raw(&self) -> u32 {
                self.0.get()
            }
        }
    };
}

gl_handle!(
    /// Handle to a driver buffer object.
    BufferHandle
);
gl_handle!(
    /// Handle to a driver texture object.
    TextureHandle
);
gl_handle!(
    /// Handle to a driver shader object.
    ShaderHandle
);
gl_handle!(
    /// Handle to a driver program object.
    ProgramHandle
);
gl_handle!(
    /// Handle to a driver vertex array object.
    VertexArrayHandle
);

/// Location of an active uniform inside a linked program.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct UniformLocation(pub u32);

/// Buffer binding targets used by the wrappers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BufferTarget {
    /// Vertex attribute source.
    Array,
    /// Index source, stored in the bound vertex array.
    ElementArray,
    /// Scratch target used for allocation and mapped writes.
    CopyWrite,
    /// Uniform block storage.
    Uniform,
    /// Backing storage of a buffer texture.
    Texture,
}

/// Texture binding targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TextureTarget {
    Texture1D,
    Texture2D,
    Texture3D,
    /// Buffer-backed texture.
    Buffer,
}

/// Integer texture parameters set by the wrappers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TextureParameter {
    MagFilter,
    MinFilter,
    WrapS,
    WrapT,
    WrapR,
}

/// Allocation usage hint passed with buffer storage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum BufferUsageHint {
    /// Written rarely, drawn often.
    #[default]
    StaticDraw,
    /// Written repeatedly, drawn often.
    DynamicDraw,
    /// Written once per draw.
    StreamDraw,
}

bitflags! {
    /// Access flags for mapped buffer ranges.
    ///
    /// Bit values match the driver's `GL_MAP_*_BIT` constants.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct MapAccess: u32 {
        /// The range may be read.
        const READ = 0x0001;
        /// The range may be written.
        const WRITE = 0x0002;
        /// Previous contents of the range may be discarded.
        const INVALIDATE_RANGE = 0x0004;
        /// Previous contents of the whole buffer may be discarded.
        const INVALIDATE_BUFFER = 0x0008;
    }
}

/// Driver backend trait.
///
/// All methods assume the backend's context is current on the calling
/// thread. Methods that create objects return an error only when the driver
/// hands back the reserved name 0.
///
/// Deleting or reallocating a buffer implicitly unmaps it. Callers must not
/// do either while a [`Buffer::write`](crate::Buffer::write) into that buffer
/// is in progress, since the driver may free the mapped memory.
pub trait GlBackend: 'static {
    /// Get the backend name.
    fn name(&self) -> &'static str;

    // Buffers

    fn create_buffer(&self) -> GlResult<BufferHandle>;
    fn delete_buffer(&self, buffer: BufferHandle);
    fn bind_buffer(&self, target: BufferTarget, buffer: Option<BufferHandle>);
    /// Bind a byte range of a buffer to an indexed target.
    fn bind_buffer_range(
        &self,
        target: BufferTarget,
        index: u32,
        buffer: BufferHandle,
        offset: usize,
        size: usize,
    );
    /// (Re)allocate storage for the buffer bound to `target`.
    fn buffer_data(
        &self,
        target: BufferTarget,
        size: usize,
        data: Option<&[u8]>,
        usage: BufferUsageHint,
    );
    /// Map a range of the buffer bound to `target`.
    ///
    /// Returns `None` when the driver refuses the mapping. On success the
    /// pointer addresses `length` writable bytes until [`unmap_buffer`]
    /// is called for the same target.
    ///
    /// [`unmap_buffer`]: GlBackend::unmap_buffer
    fn map_buffer_range(
        &self,
        target: BufferTarget,
        offset: usize,
        length: usize,
        access: MapAccess,
    ) -> Option<NonNull<u8>>;
    /// Returns `false` if the store was corrupted while mapped.
    fn unmap_buffer(&self, target: BufferTarget) -> bool;

    // Textures

    fn create_texture(&self) -> GlResult<TextureHandle>;
    fn delete_texture(&self, texture: TextureHandle);
    /// Select texture unit `unit` (offset from unit zero).
    fn active_texture(&self, unit: u32);
    fn bind_texture(&self, target: TextureTarget, texture: Option<TextureHandle>);
    /// Attach a buffer as the store of the bound buffer texture.
    fn tex_buffer(&self, internal_format: GlEnum, buffer: BufferHandle);
    #[allow(clippy::too_many_arguments)]
    fn tex_image_1d(
        &self,
        target: TextureTarget,
        internal_format: GlEnum,
        width: u32,
        pixel_format: GlEnum,
        component_type: GlEnum,
        data: Option<&[u8]>,
    );
    #[allow(clippy::too_many_arguments)]
    fn tex_image_2d(
        &self,
        target: TextureTarget,
        internal_format: GlEnum,
        width: u32,
        height: u32,
        pixel_format: GlEnum,
        component_type: GlEnum,
        data: Option<&[u8]>,
    );
    #[allow(clippy::too_many_arguments)]
    fn tex_image_3d(
        &self,
        target: TextureTarget,
        internal_format: GlEnum,
        width: u32,
        height: u32,
        depth: u32,
        pixel_format: GlEnum,
        component_type: GlEnum,
        data: Option<&[u8]>,
    );
    fn tex_parameter_i(&self, target: TextureTarget, parameter: TextureParameter, value: GlEnum);
    fn tex_border_color(&self, target: TextureTarget, color: [f32; 4]);
    fn generate_mipmap(&self, target: TextureTarget);

    // Shaders and programs

    fn create_shader(&self, stage: ShaderStage) -> GlResult<ShaderHandle>;
    fn delete_shader(&self, shader: ShaderHandle);
    fn shader_source(&self, shader: ShaderHandle, sources: &[&str]);
    fn compile_shader(&self, shader: ShaderHandle);
    fn shader_compile_status(&self, shader: ShaderHandle) -> bool;
    fn shader_info_log(&self, shader: ShaderHandle) -> String;

    fn create_program(&self) -> GlResult<ProgramHandle>;
    fn delete_program(&self, program: ProgramHandle);
    fn attach_shader(&self, program: ProgramHandle, shader: ShaderHandle);
    fn detach_shader(&self, program: ProgramHandle, shader: ShaderHandle);
    fn link_program(&self, program: ProgramHandle);
    fn program_link_status(&self, program: ProgramHandle) -> bool;
    fn program_info_log(&self, program: ProgramHandle) -> String;
    fn use_program(&self, program: Option<ProgramHandle>);

    fn uniform_location(&self, program: ProgramHandle, name: &str) -> Option<UniformLocation>;
    fn uniform_block_index(&self, program: ProgramHandle, name: &str) -> Option<u32>;
    fn uniform_block_binding(&self, program: ProgramHandle, block_index: u32, binding: u32);

    fn uniform_1i(&self, location: UniformLocation, value: i32);
    fn uniform_1ui(&self, location: UniformLocation, value: u32);
    fn uniform_1f(&self, location: UniformLocation, value: f32);
    fn uniform_2f(&self, location: UniformLocation, value: [f32; 2]);
    fn uniform_3f(&self, location: UniformLocation, value: [f32; 3]);
    fn uniform_4f(&self, location: UniformLocation, value: [f32; 4]);
    /// Upload one column-major 4x4 matrix.
    fn uniform_matrix_4f(&self, location: UniformLocation, value: [f32; 16]);

    // Vertex arrays

    fn create_vertex_array(&self) -> GlResult<VertexArrayHandle>;
    fn delete_vertex_array(&self, vertex_array: VertexArrayHandle);
    fn bind_vertex_array(&self, vertex_array: Option<VertexArrayHandle>);
    /// Float attribute source (integers are converted, optionally normalized).
    fn vertex_attrib_pointer(
        &self,
        location: u32,
        components: u32,
        component_type: GlEnum,
        normalized: bool,
        stride: usize,
        offset: usize,
    );
    /// Integer attribute source (no conversion).
    fn vertex_attrib_i_pointer(
        &self,
        location: u32,
        components: u32,
        component_type: GlEnum,
        stride: usize,
        offset: usize,
    );
    fn vertex_attrib_divisor(&self, location: u32, divisor: u32);
    fn enable_vertex_attrib_array(&self, location: u32);
    fn disable_vertex_attrib_array(&self, location: u32);
}
