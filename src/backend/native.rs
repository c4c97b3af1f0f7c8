//! Native driver backend.
//!
//! Forwards every call to the OpenGL entry points loaded by the `gl` crate.
//! The entry points are process-global function pointers; the context they
//! act on is whichever one the windowing layer made current on this thread.

use std::ffi::{c_void, CString};
use std::marker::PhantomData;
use std::ptr::{self, NonNull};

use gl::types::{GLchar, GLint, GLsizei};

use super::conversion::{
    convert_buffer_target, convert_shader_stage, convert_texture_parameter,
    convert_texture_target, convert_usage_hint,
};
use super::{
    BufferHandle, BufferTarget, BufferUsageHint, GlBackend, GlEnum, MapAccess, ProgramHandle,
    ShaderHandle, TextureHandle, TextureParameter, TextureTarget, UniformLocation,
    VertexArrayHandle,
};
use crate::error::{GlError, GlResult};
use crate::shader::ShaderStage;

/// Backend that calls into the real driver.
#[derive(Debug)]
pub struct NativeBackend {
    // Entry points are only valid on the thread owning the current context.
    _not_send: PhantomData<*const ()>,
}

impl NativeBackend {
    /// Load driver entry points through `loader` (typically the windowing
    /// layer's `get_proc_address`).
    ///
    /// # Errors
    ///
    /// Returns [`GlError::InitializationFailed`] if core entry points could
    /// not be resolved, which usually means no context is current.
    pub fn load_with<F>(loader: F) -> GlResult<Self>
    where
        F: FnMut(&'static str) -> *const c_void,
    {
        gl::load_with(loader);

        let required = [
            ("glGenBuffers", gl::GenBuffers::is_loaded()),
            ("glMapBufferRange", gl::MapBufferRange::is_loaded()),
            ("glTexBuffer", gl::TexBuffer::is_loaded()),
            ("glCreateProgram", gl::CreateProgram::is_loaded()),
            ("glGenVertexArrays", gl::GenVertexArrays::is_loaded()),
            ("glVertexAttribDivisor", gl::VertexAttribDivisor::is_loaded()),
        ];
        let missing: Vec<_> = required
            .iter()
            .filter(|(_, loaded)| !loaded)
            .map(|(name, _)| *name)
            .collect();
        if !missing.is_empty() {
            return Err(GlError::InitializationFailed(format!(
                "missing driver entry points: {}",
                missing.join(", ")
            )));
        }

        log::info!("Loaded native OpenGL entry points");
        Ok(Self {
            _not_send: PhantomData,
        })
    }
}

fn read_info_log(length: GLint, fetch: impl FnOnce(GLsizei, *mut GLchar)) -> String {
    if length <= 0 {
        return String::new();
    }
    let mut buffer = vec![0u8; length as usize];
    fetch(length, buffer.as_mut_ptr().cast());
    // Driver logs are NUL-terminated.
    if let Some(end) = buffer.iter().position(|&b| b == 0) {
        buffer.truncate(end);
    }
    String::from_utf8_lossy(&buffer).trim_end().to_string()
}

fn data_ptr(data: Option<&[u8]>) -> *const c_void {
    data.map_or(ptr::null(), |bytes| bytes.as_ptr().cast())
}

fn c_name(name: &str) -> Option<CString> {
    match CString::new(name) {
        Ok(name) => Some(name),
        Err(_) => {
            log::warn!("Name {:?} contains a NUL byte and cannot be looked up", name);
            None
        }
    }
}

impl GlBackend for NativeBackend {
    fn name(&self) -> &'static str {
        "Native OpenGL"
    }

    fn create_buffer(&self) -> GlResult<BufferHandle> {
        let mut name = 0;
        unsafe { gl::GenBuffers(1, &mut name) };
        BufferHandle::from_raw(name)
            .ok_or_else(|| GlError::ResourceCreationFailed("glGenBuffers returned 0".into()))
    }

    fn delete_buffer(&self, buffer: BufferHandle) {
        let name = buffer.raw();
        unsafe { gl::DeleteBuffers(1, &name) };
    }

    fn bind_buffer(&self, target: BufferTarget, buffer: Option<BufferHandle>) {
        unsafe { gl::BindBuffer(convert_buffer_target(target), buffer.map_or(0, |b| b.raw())) };
    }

    fn bind_buffer_range(
        &self,
        target: BufferTarget,
        index: u32,
        buffer: BufferHandle,
        offset: usize,
        size: usize,
    ) {
        unsafe {
            gl::BindBufferRange(
                convert_buffer_target(target),
                index,
                buffer.raw(),
                offset as isize,
                size as isize,
            )
        };
    }

    fn buffer_data(
        &self,
        target: BufferTarget,
        size: usize,
        data: Option<&[u8]>,
        usage: BufferUsageHint,
    ) {
        unsafe {
            gl::BufferData(
                convert_buffer_target(target),
                size as isize,
                data_ptr(data),
                convert_usage_hint(usage),
            )
        };
    }

    fn map_buffer_range(
        &self,
        target: BufferTarget,
        offset: usize,
        length: usize,
        access: MapAccess,
    ) -> Option<NonNull<u8>> {
        let mapped = unsafe {
            gl::MapBufferRange(
                convert_buffer_target(target),
                offset as isize,
                length as isize,
                access.bits(),
            )
        };
        let mapped = NonNull::new(mapped.cast());
        if mapped.is_none() {
            log::trace!(
                "glMapBufferRange({:?}, {}, {}, {:?}) returned null",
                target,
                offset,
                length,
                access
            );
        }
        mapped
    }

    fn unmap_buffer(&self, target: BufferTarget) -> bool {
        unsafe { gl::UnmapBuffer(convert_buffer_target(target)) == gl::TRUE }
    }

    fn create_texture(&self) -> GlResult<TextureHandle> {
        let mut name = 0;
        unsafe { gl::GenTextures(1, &mut name) };
        TextureHandle::from_raw(name)
            .ok_or_else(|| GlError::ResourceCreationFailed("glGenTextures returned 0".into()))
    }

    fn delete_texture(&self, texture: TextureHandle) {
        let name = texture.raw();
        unsafe { gl::DeleteTextures(1, &name) };
    }

    fn active_texture(&self, unit: u32) {
        unsafe { gl::ActiveTexture(gl::TEXTURE0 + unit) };
    }

    fn bind_texture(&self, target: TextureTarget, texture: Option<TextureHandle>) {
        unsafe {
            gl::BindTexture(
                convert_texture_target(target),
                texture.map_or(0, |t| t.raw()),
            )
        };
    }

    fn tex_buffer(&self, internal_format: GlEnum, buffer: BufferHandle) {
        unsafe { gl::TexBuffer(gl::TEXTURE_BUFFER, internal_format, buffer.raw()) };
    }

    fn tex_image_1d(
        &self,
        target: TextureTarget,
        internal_format: GlEnum,
        width: u32,
        pixel_format: GlEnum,
        component_type: GlEnum,
        data: Option<&[u8]>,
    ) {
        unsafe {
            gl::TexImage1D(
                convert_texture_target(target),
                0,
                internal_format as GLint,
                width as GLsizei,
                0,
                pixel_format,
                component_type,
                data_ptr(data),
            )
        };
    }

    fn tex_image_2d(
        &self,
        target: TextureTarget,
        internal_format: GlEnum,
        width: u32,
        height: u32,
        pixel_format: GlEnum,
        component_type: GlEnum,
        data: Option<&[u8]>,
    ) {
        unsafe {
            gl::TexImage2D(
                convert_texture_target(target),
                0,
                internal_format as GLint,
                width as GLsizei,
                height as GLsizei,
                0,
                pixel_format,
                component_type,
                data_ptr(data),
            )
        };
    }

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
    ) {
        unsafe {
            gl::TexImage3D(
                convert_texture_target(target),
                0,
                internal_format as GLint,
                width as GLsizei,
                height as GLsizei,
                depth as GLsizei,
                0,
                pixel_format,
                component_type,
                data_ptr(data),
            )
        };
    }

    fn tex_parameter_i(&self, target: TextureTarget, parameter: TextureParameter, value: GlEnum) {
        unsafe {
            gl::TexParameteri(
                convert_texture_target(target),
                convert_texture_parameter(parameter),
                value as GLint,
            )
        };
    }

    fn tex_border_color(&self, target: TextureTarget, color: [f32; 4]) {
        unsafe {
            gl::TexParameterfv(
                convert_texture_target(target),
                gl::TEXTURE_BORDER_COLOR,
                color.as_ptr(),
            )
        };
    }

    fn generate_mipmap(&self, target: TextureTarget) {
        unsafe { gl::GenerateMipmap(convert_texture_target(target)) };
    }

    fn create_shader(&self, stage: ShaderStage) -> GlResult<ShaderHandle> {
        let name = unsafe { gl::CreateShader(convert_shader_stage(stage)) };
        ShaderHandle::from_raw(name)
            .ok_or_else(|| GlError::ResourceCreationFailed("failed to create shader object".into()))
    }

    fn delete_shader(&self, shader: ShaderHandle) {
        unsafe { gl::DeleteShader(shader.raw()) };
    }

    fn shader_source(&self, shader: ShaderHandle, sources: &[&str]) {
        let pointers: Vec<*const GLchar> = sources.iter().map(|s| s.as_ptr().cast()).collect();
        let lengths: Vec<GLint> = sources.iter().map(|s| s.len() as GLint).collect();
        unsafe {
            gl::ShaderSource(
                shader.raw(),
                sources.len() as GLsizei,
                pointers.as_ptr(),
                lengths.as_ptr(),
            )
        };
    }

    fn compile_shader(&self, shader: ShaderHandle) {
        unsafe { gl::CompileShader(shader.raw()) };
    }

    fn shader_compile_status(&self, shader: ShaderHandle) -> bool {
        let mut status = 0;
        unsafe { gl::GetShaderiv(shader.raw(), gl::COMPILE_STATUS, &mut status) };
        status != 0
    }

    fn shader_info_log(&self, shader: ShaderHandle) -> String {
        let mut length = 0;
        unsafe { gl::GetShaderiv(shader.raw(), gl::INFO_LOG_LENGTH, &mut length) };
        read_info_log(length, |size, buffer| unsafe {
            gl::GetShaderInfoLog(shader.raw(), size, ptr::null_mut(), buffer)
        })
    }

    fn create_program(&self) -> GlResult<ProgramHandle> {
        let name = unsafe { gl::CreateProgram() };
        ProgramHandle::from_raw(name).ok_or_else(|| {
            GlError::ResourceCreationFailed("failed to create program object".into())
        })
    }

    fn delete_program(&self, program: ProgramHandle) {
        unsafe { gl::DeleteProgram(program.raw()) };
    }

    fn attach_shader(&self, program: ProgramHandle, shader: ShaderHandle) {
        unsafe { gl::AttachShader(program.raw(), shader.raw()) };
    }

    fn detach_shader(&self, program: ProgramHandle, shader: ShaderHandle) {
        unsafe { gl::DetachShader(program.raw(), shader.raw()) };
    }

    fn link_program(&self, program: ProgramHandle) {
        unsafe { gl::LinkProgram(program.raw()) };
    }

    fn program_link_status(&self, program: ProgramHandle) -> bool {
        let mut status = 0;
        unsafe { gl::GetProgramiv(program.raw(), gl::LINK_STATUS, &mut status) };
        status != 0
    }

    fn program_info_log(&self, program: ProgramHandle) -> String {
        let mut length = 0;
        unsafe { gl::GetProgramiv(program.raw(), gl::INFO_LOG_LENGTH, &mut length) };
        read_info_log(length, |size, buffer| unsafe {
            gl::GetProgramInfoLog(program.raw(), size, ptr::null_mut(), buffer)
        })
    }

    fn use_program(&self, program: Option<ProgramHandle>) {
        unsafe { gl::UseProgram(program.map_or(0, |p| p.raw())) };
    }

    fn uniform_location(&self, program: ProgramHandle, name: &str) -> Option<UniformLocation> {
        let name = c_name(name)?;
        let location = unsafe { gl::GetUniformLocation(program.raw(), name.as_ptr()) };
        u32::try_from(location).ok().map(UniformLocation)
    }

    fn uniform_block_index(&self, program: ProgramHandle, name: &str) -> Option<u32> {
        let name = c_name(name)?;
        let index = unsafe { gl::GetUniformBlockIndex(program.raw(), name.as_ptr()) };
        (index != gl::INVALID_INDEX).then_some(index)
    }

    fn uniform_block_binding(&self, program: ProgramHandle, block_index: u32, binding: u32) {
        unsafe { gl::UniformBlockBinding(program.raw(), block_index, binding) };
    }

    fn uniform_1i(&self, location: UniformLocation, value: i32) {
        unsafe { gl::Uniform1i(location.0 as GLint, value) };
    }

    fn uniform_1ui(&self, location: UniformLocation, value: u32) {
        unsafe { gl::Uniform1ui(location.0 as GLint, value) };
    }

    fn uniform_1f(&self, location: UniformLocation, value: f32) {
        unsafe { gl::Uniform1f(location.0 as GLint, value) };
    }

    fn uniform_2f(&self, location: UniformLocation, [x, y]: [f32; 2]) {
        unsafe { gl::Uniform2f(location.0 as GLint, x, y) };
    }

    fn uniform_3f(&self, location: UniformLocation, [x, y, z]: [f32; 3]) {
        unsafe { gl::Uniform3f(location.0 as GLint, x, y, z) };
    }

    fn uniform_4f(&self, location: UniformLocation, [x, y, z, w]: [f32; 4]) {
        unsafe { gl::Uniform4f(location.0 as GLint, x, y, z, w) };
    }

    fn uniform_matrix_4f(&self, location: UniformLocation, value: [f32; 16]) {
        unsafe { gl::UniformMatrix4fv(location.0 as GLint, 1, gl::FALSE, value.as_ptr()) };
    }

    fn create_vertex_array(&self) -> GlResult<VertexArrayHandle> {
        let mut name = 0;
        unsafe { gl::GenVertexArrays(1, &mut name) };
        VertexArrayHandle::from_raw(name)
            .ok_or_else(|| GlError::ResourceCreationFailed("glGenVertexArrays returned 0".into()))
    }

    fn delete_vertex_array(&self, vertex_array: VertexArrayHandle) {
        let name = vertex_array.raw();
        unsafe { gl::DeleteVertexArrays(1, &name) };
    }

    fn bind_vertex_array(&self, vertex_array: Option<VertexArrayHandle>) {
        unsafe { gl::BindVertexArray(vertex_array.map_or(0, |v| v.raw())) };
    }

    fn vertex_attrib_pointer(
        &self,
        location: u32,
        components: u32,
        component_type: GlEnum,
        normalized: bool,
        stride: usize,
        offset: usize,
    ) {
        unsafe {
            gl::VertexAttribPointer(
                location,
                components as GLint,
                component_type,
                if normalized { gl::TRUE } else { gl::FALSE },
                stride as GLsizei,
                // Offset into the bound array buffer, passed as a pointer.
                offset as *const c_void,
            )
        };
    }

    fn vertex_attrib_i_pointer(
        &self,
        location: u32,
        components: u32,
        component_type: GlEnum,
        stride: usize,
        offset: usize,
    ) {
        unsafe {
            gl::VertexAttribIPointer(
                location,
                components as GLint,
                component_type,
                stride as GLsizei,
                offset as *const c_void,
            )
        };
    }

    fn vertex_attrib_divisor(&self, location: u32, divisor: u32) {
        unsafe { gl::VertexAttribDivisor(location, divisor) };
    }

    fn enable_vertex_attrib_array(&self, location: u32) {
        unsafe { gl::EnableVertexAttribArray(location) };
    }

    fn disable_vertex_attrib_array(&self, location: u32) {
        unsafe { gl::DisableVertexAttribArray(location) };
    }
}
