//! Recording backend for testing and development.
//!
//! This backend performs no GPU work. It records every state-changing call
//! as a [`GlCall`], hands out unique object names, keeps a byte store per
//! buffer so mapped writes can be inspected, and plays a tiny scripted driver
//! for the queries the wrappers make (compile/link status, uniform
//! locations, uniform-block indices).
//!
//! The backend is a cheap clonable handle: keep one clone in the test and
//! give another to [`GlContext::new`](crate::GlContext::new).

use std::collections::{HashMap, HashSet};
use std::ptr::NonNull;
use std::sync::Arc;

use parking_lot::Mutex;

use super::{
    BufferHandle, BufferTarget, BufferUsageHint, GlBackend, GlEnum, MapAccess, ProgramHandle,
    ShaderHandle, TextureHandle, TextureParameter, TextureTarget, UniformLocation,
    VertexArrayHandle,
};
use crate::error::{GlError, GlResult};
use crate::shader::ShaderStage;

/// Info log produced when a shader source has no entry point.
pub const MISSING_MAIN_LOG: &str = "ERROR: 0:1: 'main' : function not defined";

/// Info log produced when a program is linked with no stages attached.
pub const NO_STAGES_LOG: &str = "error: no shaders attached to program";

/// One recorded driver call.
///
/// Pure queries (status, info logs, name lookups) are not recorded.
#[derive(Debug, Clone, PartialEq)]
pub enum GlCall {
    CreateBuffer(BufferHandle),
    DeleteBuffer(BufferHandle),
    BindBuffer {
        target: BufferTarget,
        buffer: Option<BufferHandle>,
    },
    BindBufferRange {
        target: BufferTarget,
        index: u32,
        buffer: BufferHandle,
        offset: usize,
        size: usize,
    },
    BufferData {
        target: BufferTarget,
        size: usize,
        with_data: bool,
        usage: BufferUsageHint,
    },
    MapBufferRange {
        target: BufferTarget,
        offset: usize,
        length: usize,
        access: MapAccess,
    },
    UnmapBuffer(BufferTarget),

    CreateTexture(TextureHandle),
    DeleteTexture(TextureHandle),
    ActiveTexture(u32),
    BindTexture {
        target: TextureTarget,
        texture: Option<TextureHandle>,
    },
    TexBuffer {
        internal_format: GlEnum,
        buffer: BufferHandle,
    },
    TexImage1D {
        target: TextureTarget,
        internal_format: GlEnum,
        width: u32,
        pixel_format: GlEnum,
        component_type: GlEnum,
        with_data: bool,
    },
    TexImage2D {
        target: TextureTarget,
        internal_format: GlEnum,
        width: u32,
        height: u32,
        pixel_format: GlEnum,
        component_type: GlEnum,
        with_data: bool,
    },
    TexImage3D {
        target: TextureTarget,
        internal_format: GlEnum,
        width: u32,
        height: u32,
        depth: u32,
        pixel_format: GlEnum,
        component_type: GlEnum,
        with_data: bool,
    },
    TexParameter {
        target: TextureTarget,
        parameter: TextureParameter,
        value: GlEnum,
    },
    TexBorderColor {
        target: TextureTarget,
        color: [f32; 4],
    },
    GenerateMipmap(TextureTarget),

    CreateShader {
        shader: ShaderHandle,
        stage: ShaderStage,
    },
    DeleteShader(ShaderHandle),
    ShaderSource {
        shader: ShaderHandle,
        sources: Vec<String>,
    },
    CompileShader(ShaderHandle),
    CreateProgram(ProgramHandle),
    DeleteProgram(ProgramHandle),
    AttachShader {
        program: ProgramHandle,
        shader: ShaderHandle,
    },
    DetachShader {
        program: ProgramHandle,
        shader: ShaderHandle,
    },
    LinkProgram(ProgramHandle),
    UseProgram(Option<ProgramHandle>),
    UniformBlockBinding {
        program: ProgramHandle,
        block_index: u32,
        binding: u32,
    },
    Uniform1i(UniformLocation, i32),
    Uniform1ui(UniformLocation, u32),
    Uniform1f(UniformLocation, f32),
    Uniform2f(UniformLocation, [f32; 2]),
    Uniform3f(UniformLocation, [f32; 3]),
    Uniform4f(UniformLocation, [f32; 4]),
    UniformMatrix4f(UniformLocation, [f32; 16]),

    CreateVertexArray(VertexArrayHandle),
    DeleteVertexArray(VertexArrayHandle),
    BindVertexArray(Option<VertexArrayHandle>),
    VertexAttribPointer {
        location: u32,
        components: u32,
        component_type: GlEnum,
        normalized: bool,
        stride: usize,
        offset: usize,
    },
    VertexAttribIPointer {
        location: u32,
        components: u32,
        component_type: GlEnum,
        stride: usize,
        offset: usize,
    },
    VertexAttribDivisor {
        location: u32,
        divisor: u32,
    },
    EnableVertexAttribArray(u32),
    DisableVertexAttribArray(u32),
}

#[derive(Debug, Default)]
struct RecordingState {
    calls: Vec<GlCall>,
    last_name: u32,
    live: HashSet<u32>,

    buffer_stores: HashMap<BufferHandle, Vec<u8>>,
    bound_buffers: HashMap<BufferTarget, BufferHandle>,
    mapped: HashSet<BufferHandle>,
    // Stores replaced or deleted while mapped; kept so outstanding mapped
    // pointers stay valid.
    retired_stores: Vec<Vec<u8>>,
    refuse_mapping: bool,

    shader_sources: HashMap<ShaderHandle, String>,
    compiled: HashMap<ShaderHandle, Result<(), String>>,
    compile_errors: Vec<(String, String)>,
    attached: HashMap<ProgramHandle, Vec<ShaderHandle>>,
    linked: HashMap<ProgramHandle, Result<(), String>>,
    link_error: Option<String>,

    uniforms: HashMap<String, u32>,
    uniform_blocks: HashMap<String, u32>,
}

impl RecordingState {
    /// Drop `buffer`'s store, implicitly unmapping it.
    fn retire_store(&mut self, buffer: BufferHandle) -> Option<Vec<u8>> {
        let store = self.buffer_stores.remove(&buffer)?;
        if self.mapped.remove(&buffer) {
            log::trace!("RecordingBackend: buffer {} released while mapped", buffer.raw());
            self.retired_stores.push(store);
            return None;
        }
        Some(store)
    }

    fn record(&mut self, call: GlCall) {
        log::trace!("RecordingBackend: {:?}", call);
        self.calls.push(call);
    }

    fn allocate_name(&mut self) -> u32 {
        self.last_name += 1;
        self.live.insert(self.last_name);
        self.last_name
    }
}

/// Recording GPU backend.
#[derive(Debug, Clone, Default)]
pub struct RecordingBackend {
    state: Arc<Mutex<RecordingState>>,
}

impl RecordingBackend {
    /// Create a new recording backend with an empty script.
    pub fn new() -> Self {
        Self::default()
    }

    /// Report `name` as an active uniform at `location` in every program.
    pub fn with_uniform(self, name: impl Into<String>, location: u32) -> Self {
        self.state.lock().uniforms.insert(name.into(), location);
        self
    }

    /// Report `name` as an active uniform block with `index` in every program.
    pub fn with_uniform_block(self, name: impl Into<String>, index: u32) -> Self {
        self.state.lock().uniform_blocks.insert(name.into(), index);
        self
    }

    /// Fail compilation of any shader whose source contains `marker`,
    /// reporting `log` as the driver info log.
    pub fn with_compile_error(self, marker: impl Into<String>, log: impl Into<String>) -> Self {
        self.state
            .lock()
            .compile_errors
            .push((marker.into(), log.into()));
        self
    }

    /// Fail every link with `log` as the driver info log.
    pub fn with_link_error(self, log: impl Into<String>) -> Self {
        self.state.lock().link_error = Some(log.into());
        self
    }

    /// Refuse every buffer mapping, as a driver out of address space would.
    pub fn with_mapping_refused(self) -> Self {
        self.state.lock().refuse_mapping = true;
        self
    }

    /// All calls recorded so far.
    pub fn calls(&self) -> Vec<GlCall> {
        self.state.lock().calls.clone()
    }

    /// Return and forget all calls recorded so far.
    pub fn take_calls(&self) -> Vec<GlCall> {
        std::mem::take(&mut self.state.lock().calls)
    }

    /// Number of recorded calls matching `predicate`.
    pub fn count_calls(&self, predicate: impl Fn(&GlCall) -> bool) -> usize {
        self.state.lock().calls.iter().filter(|c| predicate(c)).count()
    }

    /// Number of created objects not yet deleted.
    pub fn live_objects(&self) -> usize {
        self.state.lock().live.len()
    }

    /// Current contents of a buffer's simulated store.
    pub fn buffer_contents(&self, buffer: BufferHandle) -> Option<Vec<u8>> {
        self.state.lock().buffer_stores.get(&buffer).cloned()
    }

    fn release(&self, name: u32, call: GlCall) {
        let mut state = self.state.lock();
        if !state.live.remove(&name) {
            log::warn!("RecordingBackend: deleting unknown object {}", name);
        }
        state.record(call);
    }
}

impl GlBackend for RecordingBackend {
    fn name(&self) -> &'static str {
        "Recording"
    }

    fn create_buffer(&self) -> GlResult<BufferHandle> {
        let mut state = self.state.lock();
        let name = state.allocate_name();
        let buffer = BufferHandle::from_raw(name)
            .ok_or_else(|| GlError::ResourceCreationFailed("name space exhausted".into()))?;
        state.buffer_stores.insert(buffer, Vec::new());
        state.record(GlCall::CreateBuffer(buffer));
        Ok(buffer)
    }

    fn delete_buffer(&self, buffer: BufferHandle) {
        self.state.lock().retire_store(buffer);
        self.release(buffer.raw(), GlCall::DeleteBuffer(buffer));
    }

    fn bind_buffer(&self, target: BufferTarget, buffer: Option<BufferHandle>) {
        let mut state = self.state.lock();
        match buffer {
            Some(buffer) => state.bound_buffers.insert(target, buffer),
            None => state.bound_buffers.remove(&target),
        };
        state.record(GlCall::BindBuffer { target, buffer });
    }

    fn bind_buffer_range(
        &self,
        target: BufferTarget,
        index: u32,
        buffer: BufferHandle,
        offset: usize,
        size: usize,
    ) {
        let mut state = self.state.lock();
        // Indexed binding also updates the generic binding point.
        state.bound_buffers.insert(target, buffer);
        state.record(GlCall::BindBufferRange {
            target,
            index,
            buffer,
            offset,
            size,
        });
    }

    fn buffer_data(
        &self,
        target: BufferTarget,
        size: usize,
        data: Option<&[u8]>,
        usage: BufferUsageHint,
    ) {
        let mut state = self.state.lock();
        if let Some(buffer) = state.bound_buffers.get(&target).copied() {
            let mut store = vec![0u8; size];
            if let Some(data) = data {
                let len = data.len().min(size);
                store[..len].copy_from_slice(&data[..len]);
            }
            state.retire_store(buffer);
            state.buffer_stores.insert(buffer, store);
        }
        state.record(GlCall::BufferData {
            target,
            size,
            with_data: data.is_some(),
            usage,
        });
    }

    fn map_buffer_range(
        &self,
        target: BufferTarget,
        offset: usize,
        length: usize,
        access: MapAccess,
    ) -> Option<NonNull<u8>> {
        let mut state = self.state.lock();
        state.record(GlCall::MapBufferRange {
            target,
            offset,
            length,
            access,
        });
        if state.refuse_mapping || length == 0 {
            return None;
        }
        let buffer = state.bound_buffers.get(&target).copied()?;
        if state.mapped.contains(&buffer) {
            return None;
        }
        let end = offset.checked_add(length)?;
        let store = state.buffer_stores.get_mut(&buffer)?;
        if end > store.len() {
            return None;
        }
        // A mapped store is never resized or freed; reallocating or deleting
        // the buffer moves it to `retired_stores` instead.
        let pointer = NonNull::new(store[offset..end].as_mut_ptr());
        state.mapped.insert(buffer);
        pointer
    }

    fn unmap_buffer(&self, target: BufferTarget) -> bool {
        let mut state = self.state.lock();
        state.record(GlCall::UnmapBuffer(target));
        match state.bound_buffers.get(&target).copied() {
            Some(buffer) => state.mapped.remove(&buffer),
            None => false,
        }
    }

    fn create_texture(&self) -> GlResult<TextureHandle> {
        let mut state = self.state.lock();
        let name = state.allocate_name();
        let texture = TextureHandle::from_raw(name)
            .ok_or_else(|| GlError::ResourceCreationFailed("name space exhausted".into()))?;
        state.record(GlCall::CreateTexture(texture));
        Ok(texture)
    }

    fn delete_texture(&self, texture: TextureHandle) {
        self.release(texture.raw(), GlCall::DeleteTexture(texture));
    }

    fn active_texture(&self, unit: u32) {
        self.state.lock().record(GlCall::ActiveTexture(unit));
    }

    fn bind_texture(&self, target: TextureTarget, texture: Option<TextureHandle>) {
        self.state
            .lock()
            .record(GlCall::BindTexture { target, texture });
    }

    fn tex_buffer(&self, internal_format: GlEnum, buffer: BufferHandle) {
        self.state.lock().record(GlCall::TexBuffer {
            internal_format,
            buffer,
        });
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
        self.state.lock().record(GlCall::TexImage1D {
            target,
            internal_format,
            width,
            pixel_format,
            component_type,
            with_data: data.is_some(),
        });
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
        self.state.lock().record(GlCall::TexImage2D {
            target,
            internal_format,
            width,
            height,
            pixel_format,
            component_type,
            with_data: data.is_some(),
        });
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
        self.state.lock().record(GlCall::TexImage3D {
            target,
            internal_format,
            width,
            height,
            depth,
            pixel_format,
            component_type,
            with_data: data.is_some(),
        });
    }

    fn tex_parameter_i(&self, target: TextureTarget, parameter: TextureParameter, value: GlEnum) {
        self.state.lock().record(GlCall::TexParameter {
            target,
            parameter,
            value,
        });
    }

    fn tex_border_color(&self, target: TextureTarget, color: [f32; 4]) {
        self.state
            .lock()
            .record(GlCall::TexBorderColor { target, color });
    }

    fn generate_mipmap(&self, target: TextureTarget) {
        self.state.lock().record(GlCall::GenerateMipmap(target));
    }

    fn create_shader(&self, stage: ShaderStage) -> GlResult<ShaderHandle> {
        let mut state = self.state.lock();
        let name = state.allocate_name();
        let shader = ShaderHandle::from_raw(name)
            .ok_or_else(|| GlError::ResourceCreationFailed("name space exhausted".into()))?;
        state.record(GlCall::CreateShader { shader, stage });
        Ok(shader)
    }

    fn delete_shader(&self, shader: ShaderHandle) {
        {
            let mut state = self.state.lock();
            state.shader_sources.remove(&shader);
            state.compiled.remove(&shader);
        }
        self.release(shader.raw(), GlCall::DeleteShader(shader));
    }

    fn shader_source(&self, shader: ShaderHandle, sources: &[&str]) {
        let mut state = self.state.lock();
        state.shader_sources.insert(shader, sources.concat());
        state.record(GlCall::ShaderSource {
            shader,
            sources: sources.iter().map(|s| s.to_string()).collect(),
        });
    }

    fn compile_shader(&self, shader: ShaderHandle) {
        let mut state = self.state.lock();
        let source = state.shader_sources.get(&shader).cloned().unwrap_or_default();
        let scripted = state
            .compile_errors
            .iter()
            .find(|(marker, _)| source.contains(marker.as_str()))
            .map(|(_, log)| log.clone());
        let result = match scripted {
            Some(log) => Err(log),
            None if !source.contains("void main") => Err(MISSING_MAIN_LOG.to_string()),
            None => Ok(()),
        };
        state.compiled.insert(shader, result);
        state.record(GlCall::CompileShader(shader));
    }

    fn shader_compile_status(&self, shader: ShaderHandle) -> bool {
        matches!(self.state.lock().compiled.get(&shader), Some(Ok(())))
    }

    fn shader_info_log(&self, shader: ShaderHandle) -> String {
        match self.state.lock().compiled.get(&shader) {
            Some(Err(log)) => log.clone(),
            _ => String::new(),
        }
    }

    fn create_program(&self) -> GlResult<ProgramHandle> {
        let mut state = self.state.lock();
        let name = state.allocate_name();
        let program = ProgramHandle::from_raw(name)
            .ok_or_else(|| GlError::ResourceCreationFailed("name space exhausted".into()))?;
        state.record(GlCall::CreateProgram(program));
        Ok(program)
    }

    fn delete_program(&self, program: ProgramHandle) {
        {
            let mut state = self.state.lock();
            state.attached.remove(&program);
            state.linked.remove(&program);
        }
        self.release(program.raw(), GlCall::DeleteProgram(program));
    }

    fn attach_shader(&self, program: ProgramHandle, shader: ShaderHandle) {
        let mut state = self.state.lock();
        state.attached.entry(program).or_default().push(shader);
        state.record(GlCall::AttachShader { program, shader });
    }

    fn detach_shader(&self, program: ProgramHandle, shader: ShaderHandle) {
        let mut state = self.state.lock();
        if let Some(attached) = state.attached.get_mut(&program) {
            attached.retain(|s| *s != shader);
        }
        state.record(GlCall::DetachShader { program, shader });
    }

    fn link_program(&self, program: ProgramHandle) {
        let mut state = self.state.lock();
        let has_stages = state
            .attached
            .get(&program)
            .is_some_and(|attached| !attached.is_empty());
        let result = match (&state.link_error, has_stages) {
            (Some(log), _) => Err(log.clone()),
            (None, false) => Err(NO_STAGES_LOG.to_string()),
            (None, true) => Ok(()),
        };
        state.linked.insert(program, result);
        state.record(GlCall::LinkProgram(program));
    }

    fn program_link_status(&self, program: ProgramHandle) -> bool {
        matches!(self.state.lock().linked.get(&program), Some(Ok(())))
    }

    fn program_info_log(&self, program: ProgramHandle) -> String {
        match self.state.lock().linked.get(&program) {
            Some(Err(log)) => log.clone(),
            _ => String::new(),
        }
    }

    fn use_program(&self, program: Option<ProgramHandle>) {
        self.state.lock().record(GlCall::UseProgram(program));
    }

    fn uniform_location(&self, _program: ProgramHandle, name: &str) -> Option<UniformLocation> {
        self.state
            .lock()
            .uniforms
            .get(name)
            .copied()
            .map(UniformLocation)
    }

    fn uniform_block_index(&self, _program: ProgramHandle, name: &str) -> Option<u32> {
        self.state.lock().uniform_blocks.get(name).copied()
    }

    fn uniform_block_binding(&self, program: ProgramHandle, block_index: u32, binding: u32) {
        self.state.lock().record(GlCall::UniformBlockBinding {
            program,
            block_index,
            binding,
        });
    }

    fn uniform_1i(&self, location: UniformLocation, value: i32) {
        self.state.lock().record(GlCall::Uniform1i(location, value));
    }

    fn uniform_1ui(&self, location: UniformLocation, value: u32) {
        self.state.lock().record(GlCall::Uniform1ui(location, value));
    }

    fn uniform_1f(&self, location: UniformLocation, value: f32) {
        self.state.lock().record(GlCall::Uniform1f(location, value));
    }

    fn uniform_2f(&self, location: UniformLocation, value: [f32; 2]) {
        self.state.lock().record(GlCall::Uniform2f(location, value));
    }

    fn uniform_3f(&self, location: UniformLocation, value: [f32; 3]) {
        self.state.lock().record(GlCall::Uniform3f(location, value));
    }

    fn uniform_4f(&self, location: UniformLocation, value: [f32; 4]) {
        self.state.lock().record(GlCall::Uniform4f(location, value));
    }

    fn uniform_matrix_4f(&self, location: UniformLocation, value: [f32; 16]) {
        self.state
            .lock()
            .record(GlCall::UniformMatrix4f(location, value));
    }

    fn create_vertex_array(&self) -> GlResult<VertexArrayHandle> {
        let mut state = self.state.lock();
        let name = state.allocate_name();
        let vertex_array = VertexArrayHandle::from_raw(name)
            .ok_or_else(|| GlError::ResourceCreationFailed("name space exhausted".into()))?;
        state.record(GlCall::CreateVertexArray(vertex_array));
        Ok(vertex_array)
    }

    fn delete_vertex_array(&self, vertex_array: VertexArrayHandle) {
        self.release(vertex_array.raw(), GlCall::DeleteVertexArray(vertex_array));
    }

    fn bind_vertex_array(&self, vertex_array: Option<VertexArrayHandle>) {
        self.state
            .lock()
            .record(GlCall::BindVertexArray(vertex_array));
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
        self.state.lock().record(GlCall::VertexAttribPointer {
            location,
            components,
            component_type,
            normalized,
            stride,
            offset,
        });
    }

    fn vertex_attrib_i_pointer(
        &self,
        location: u32,
        components: u32,
        component_type: GlEnum,
        stride: usize,
        offset: usize,
    ) {
        self.state.lock().record(GlCall::VertexAttribIPointer {
            location,
            components,
            component_type,
            stride,
            offset,
        });
    }

    fn vertex_attrib_divisor(&self, location: u32, divisor: u32) {
        self.state
            .lock()
            .record(GlCall::VertexAttribDivisor { location, divisor });
    }

    fn enable_vertex_attrib_array(&self, location: u32) {
        self.state
            .lock()
            .record(GlCall::EnableVertexAttribArray(location));
    }

    fn disable_vertex_attrib_array(&self, location: u32) {
        self.state
            .lock()
            .record(GlCall::DisableVertexAttribArray(location));
    }
}
