//! Shader stages and linked shader programs.
//!
//! A [`Shader`] is one compiled stage. A [`ShaderProgram`] links stages
//! together and keeps the names of the uniforms and uniform blocks the
//! caller registered, so later updates address them by name.
//!
//! # Example
//!
//! ```ignore
//! let vs = Shader::new(&ctx, ShaderStage::Vertex, &[VERTEX_SOURCE])?;
//! let fs = Shader::new(&ctx, ShaderStage::Fragment, &[FRAGMENT_SOURCE])?;
//! let mut program = ShaderProgram::new(&ctx, &[&vs, &fs])?;
//!
//! program.add_uniform("u_time")?;
//! program.add_uniform_buffer("Camera")?;
//!
//! program.use_program();
//! program.set_uniform("u_time", 1.5f32)?;
//! program.bind_uniform_buffer("Camera", &camera_buffer)?;
//! ```

mod uniform;

use std::collections::HashMap;
use std::fmt;
use std::path::Path;

use crate::backend::{BufferTarget, ProgramHandle, ShaderHandle, UniformLocation};
use crate::context::GlContext;
use crate::error::{GlError, GlResult};
use crate::resources::Buffer;

pub use uniform::UniformValue;

/// Programmable pipeline stage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ShaderStage {
    Vertex,
    Fragment,
}

impl fmt::Display for ShaderStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Vertex => write!(f, "vertex"),
            Self::Fragment => write!(f, "fragment"),
        }
    }
}

/// One compiled shader stage.
///
/// Stages stay independently owned after linking; drop them whenever the
/// programs built from them no longer need relinking.
pub struct Shader {
    ctx: GlContext,
    handle: ShaderHandle,
    stage: ShaderStage,
}

impl Shader {
    /// Compile `sources`, concatenated in order, as one stage.
    pub fn new(ctx: &GlContext, stage: ShaderStage, sources: &[&str]) -> GlResult<Self> {
        let backend = ctx.backend();
        let handle = backend.create_shader(stage)?;
        // Released by Drop if compilation fails.
        let shader = Self {
            ctx: ctx.clone(),
            handle,
            stage,
        };

        backend.shader_source(handle, sources);
        backend.compile_shader(handle);
        if !backend.shader_compile_status(handle) {
            let log = backend.shader_info_log(handle);
            log::error!("Failed to compile {} shader: {}", stage, log);
            return Err(GlError::ShaderCompilation { stage, log });
        }

        log::debug!("Compiled {} shader {}", stage, handle.raw());
        Ok(shader)
    }

    /// Read `path` and compile it as one stage.
    pub fn from_file(
        ctx: &GlContext,
        stage: ShaderStage,
        path: impl AsRef<Path>,
    ) -> GlResult<Self> {
        let path = path.as_ref();
        let source = std::fs::read_to_string(path).map_err(|source| GlError::ShaderSourceIo {
            path: path.to_path_buf(),
            source,
        })?;
        Self::new(ctx, stage, &[&source])
    }

    pub fn stage(&self) -> ShaderStage {
        self.stage
    }

    pub fn handle(&self) -> ShaderHandle {
        self.handle
    }
}

impl Drop for Shader {
    fn drop(&mut self) {
        log::debug!("Deleting {} shader {}", self.stage, self.handle.raw());
        self.ctx.backend().delete_shader(self.handle);
    }
}

impl fmt::Debug for Shader {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Shader")
            .field("handle", &self.handle.raw())
            .field("stage", &self.stage)
            .finish()
    }
}

/// A linked shader program.
pub struct ShaderProgram {
    ctx: GlContext,
    handle: ProgramHandle,
    // `None` caches a name the program does not use.
    uniforms: HashMap<String, Option<UniformLocation>>,
    uniform_blocks: HashMap<String, u32>,
}

impl ShaderProgram {
    /// Link `shaders` into a program.
    ///
    /// The stages are detached again after linking.
    pub fn new(ctx: &GlContext, shaders: &[&Shader]) -> GlResult<Self> {
        let backend = ctx.backend();
        let handle = backend.create_program()?;
        let program = Self {
            ctx: ctx.clone(),
            handle,
            uniforms: HashMap::new(),
            uniform_blocks: HashMap::new(),
        };

        for shader in shaders {
            backend.attach_shader(handle, shader.handle());
        }
        backend.link_program(handle);
        for shader in shaders {
            backend.detach_shader(handle, shader.handle());
        }

        if !backend.program_link_status(handle) {
            let log = backend.program_info_log(handle);
            log::error!("Failed to link shader program: {}", log);
            return Err(GlError::ProgramLink { log });
        }

        log::debug!(
            "Linked shader program {} from {} stages",
            handle.raw(),
            shaders.len()
        );
        Ok(program)
    }

    /// Make this the current program.
    pub fn use_program(&self) {
        self.ctx.backend().use_program(Some(self.handle));
    }

    /// Alias for [`use_program`](Self::use_program).
    pub fn bind(&self) {
        self.use_program();
    }

    /// Look up and cache the location of uniform `name`.
    ///
    /// A name the program does not use is cached as inactive, so setting it
    /// is a no-op. With strict uniform lookup it is an error instead.
    pub fn add_uniform(&mut self, name: &str) -> GlResult<()> {
        let location = self.ctx.backend().uniform_location(self.handle, name);
        if location.is_none() {
            if self.ctx.config().strict_uniform_lookup {
                return Err(GlError::InactiveUniform(name.to_string()));
            }
            log::warn!(
                "Uniform \"{}\" is not active in program {}",
                name,
                self.handle.raw()
            );
        }
        self.uniforms.insert(name.to_string(), location);
        Ok(())
    }

    /// Register uniform block `name` and bind it to the context's next
    /// binding slot. Returns the slot.
    ///
    /// An inactive block still takes a slot, but nothing is bound. A block
    /// that is already registered keeps its slot.
    pub fn add_uniform_buffer(&mut self, name: &str) -> GlResult<u32> {
        if let Some(&binding) = self.uniform_blocks.get(name) {
            return Ok(binding);
        }

        let backend = self.ctx.backend();
        let block_index = backend.uniform_block_index(self.handle, name);
        if block_index.is_none() && self.ctx.config().strict_uniform_lookup {
            return Err(GlError::InactiveUniformBlock(name.to_string()));
        }

        let binding = self.ctx.allocate_uniform_block_binding()?;
        match block_index {
            Some(index) => backend.uniform_block_binding(self.handle, index, binding),
            None => log::warn!(
                "Uniform block \"{}\" is not active in program {}",
                name,
                self.handle.raw()
            ),
        }
        self.uniform_blocks.insert(name.to_string(), binding);
        Ok(binding)
    }

    /// Cached location of a registered uniform, `None` if it is inactive.
    pub fn uniform_location(&self, name: &str) -> GlResult<Option<UniformLocation>> {
        self.uniforms
            .get(name)
            .copied()
            .ok_or_else(|| GlError::UnknownUniform(name.to_string()))
    }

    /// Binding slot of a registered uniform block.
    pub fn uniform_block_binding(&self, name: &str) -> GlResult<u32> {
        self.uniform_blocks
            .get(name)
            .copied()
            .ok_or_else(|| GlError::UnknownUniformBlock(name.to_string()))
    }

    /// Set a registered uniform. The program must be current.
    pub fn set_uniform<T: UniformValue>(&self, name: &str, value: T) -> GlResult<()> {
        if let Some(location) = self.uniform_location(name)? {
            value.upload(self.ctx.backend(), location);
        }
        Ok(())
    }

    /// Bind all of `buffer` to the slot of uniform block `name`.
    pub fn bind_uniform_buffer(&self, name: &str, buffer: &Buffer) -> GlResult<()> {
        self.bind_uniform_buffer_range(name, buffer, 0, buffer.size())
    }

    /// Bind `size` bytes of `buffer` at `offset` to the slot of uniform block `name`.
    pub fn bind_uniform_buffer_range(
        &self,
        name: &str,
        buffer: &Buffer,
        offset: usize,
        size: usize,
    ) -> GlResult<()> {
        let binding = self.uniform_block_binding(name)?;
        self.ctx.backend().bind_buffer_range(
            BufferTarget::Uniform,
            binding,
            buffer.handle(),
            offset,
            size,
        );
        Ok(())
    }

    pub fn handle(&self) -> ProgramHandle {
        self.handle
    }
}

impl Drop for ShaderProgram {
    fn drop(&mut self) {
        log::debug!("Deleting shader program {}", self.handle.raw());
        self.ctx.backend().delete_program(self.handle);
    }
}

impl fmt::Debug for ShaderProgram {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ShaderProgram")
            .field("handle", &self.handle.raw())
            .field("uniforms", &self.uniforms.len())
            .field("uniform_blocks", &self.uniform_blocks)
            .finish()
    }
}

static_assertions::assert_not_impl_any!(Shader: Clone, Send, Sync);
static_assertions::assert_not_impl_any!(ShaderProgram: Clone, Send, Sync);

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::{GlCall, RecordingBackend};
    use crate::context::ContextConfig;

    const VERTEX: &str = "#version 330 core\nvoid main() { gl_Position = vec4(0.0); }\n";
    const FRAGMENT: &str =
        "#version 330 core\nout vec4 color;\nvoid main() { color = vec4(1.0); }\n";

    fn link(ctx: &GlContext) -> ShaderProgram {
        let vs = Shader::new(ctx, ShaderStage::Vertex, &[VERTEX]).unwrap();
        let fs = Shader::new(ctx, ShaderStage::Fragment, &[FRAGMENT]).unwrap();
        ShaderProgram::new(ctx, &[&vs, &fs]).unwrap()
    }

    #[test]
    fn test_stage_display() {
        assert_eq!(ShaderStage::Vertex.to_string(), "vertex");
        assert_eq!(ShaderStage::Fragment.to_string(), "fragment");
    }

    #[test]
    fn test_sources_are_uploaded_in_order() {
        let backend = RecordingBackend::new();
        let ctx = GlContext::new(backend.clone());
        let shader = Shader::new(
            &ctx,
            ShaderStage::Vertex,
            &["#version 330 core\n", "void main() {}\n"],
        )
        .unwrap();
        assert!(backend.calls().contains(&GlCall::ShaderSource {
            shader: shader.handle(),
            sources: vec!["#version 330 core\n".into(), "void main() {}\n".into()],
        }));
    }

    #[test]
    fn test_failed_compile_releases_shader() {
        let backend = RecordingBackend::new().with_compile_error("syntax", "0:1: syntax error");
        let ctx = GlContext::new(backend.clone());
        let err =
            Shader::new(&ctx, ShaderStage::Fragment, &["syntax void main() {}"]).unwrap_err();
        match err {
            GlError::ShaderCompilation { stage, log } => {
                assert_eq!(stage, ShaderStage::Fragment);
                assert_eq!(log, "0:1: syntax error");
            }
            other => panic!("unexpected error: {other}"),
        }
        assert_eq!(backend.live_objects(), 0);
    }

    #[test]
    fn test_link_detaches_after_linking() {
        let backend = RecordingBackend::new();
        let ctx = GlContext::new(backend.clone());
        let vs = Shader::new(&ctx, ShaderStage::Vertex, &[VERTEX]).unwrap();
        let fs = Shader::new(&ctx, ShaderStage::Fragment, &[FRAGMENT]).unwrap();
        backend.take_calls();

        let program = ShaderProgram::new(&ctx, &[&vs, &fs]).unwrap();
        let p = program.handle();
        assert_eq!(
            backend.calls(),
            vec![
                GlCall::CreateProgram(p),
                GlCall::AttachShader {
                    program: p,
                    shader: vs.handle(),
                },
                GlCall::AttachShader {
                    program: p,
                    shader: fs.handle(),
                },
                GlCall::LinkProgram(p),
                GlCall::DetachShader {
                    program: p,
                    shader: vs.handle(),
                },
                GlCall::DetachShader {
                    program: p,
                    shader: fs.handle(),
                },
            ]
        );
    }

    #[test]
    fn test_failed_link_releases_program() {
        let backend = RecordingBackend::new().with_link_error("varying mismatch");
        let ctx = GlContext::new(backend.clone());
        let vs = Shader::new(&ctx, ShaderStage::Vertex, &[VERTEX]).unwrap();
        let err = ShaderProgram::new(&ctx, &[&vs]).unwrap_err();
        assert!(err.to_string().contains("varying mismatch"));
        assert_eq!(
            backend.count_calls(|c| matches!(c, GlCall::DeleteProgram(_))),
            1
        );
    }

    #[test]
    fn test_inactive_uniform_is_cached_and_silent() {
        let backend = RecordingBackend::new();
        let ctx = GlContext::new(backend.clone());
        let mut program = link(&ctx);

        program.add_uniform("unused").unwrap();
        assert_eq!(program.uniform_location("unused").unwrap(), None);

        backend.take_calls();
        program.set_uniform("unused", 3i32).unwrap();
        assert!(backend.calls().is_empty());
    }

    #[test]
    fn test_strict_lookup_rejects_inactive_names() {
        let backend = RecordingBackend::new();
        let ctx = GlContext::with_config(
            backend,
            ContextConfig::new().with_strict_uniform_lookup(true),
        );
        let mut program = link(&ctx);
        assert!(matches!(
            program.add_uniform("unused"),
            Err(GlError::InactiveUniform(_))
        ));
        assert!(matches!(
            program.add_uniform_buffer("Unused"),
            Err(GlError::InactiveUniformBlock(_))
        ));
        // A rejected block does not consume a slot.
        assert_eq!(ctx.allocate_uniform_block_binding().unwrap(), 0);
    }

    #[test]
    fn test_unregistered_names_fail() {
        let backend = RecordingBackend::new().with_uniform("u", 0);
        let ctx = GlContext::new(backend);
        let program = link(&ctx);
        let buffer = Buffer::new(&ctx, 16).unwrap();

        assert!(matches!(
            program.set_uniform("u", 1.0f32),
            Err(GlError::UnknownUniform(_))
        ));
        assert!(matches!(
            program.bind_uniform_buffer("Camera", &buffer),
            Err(GlError::UnknownUniformBlock(_))
        ));
    }

    #[test]
    fn test_uniform_block_slots_are_sequential_per_context() {
        let backend = RecordingBackend::new()
            .with_uniform_block("Camera", 0)
            .with_uniform_block("Lights", 1);
        let ctx = GlContext::new(backend.clone());
        let mut first = link(&ctx);
        let mut second = link(&ctx);

        assert_eq!(first.add_uniform_buffer("Camera").unwrap(), 0);
        assert_eq!(second.add_uniform_buffer("Camera").unwrap(), 1);
        assert_eq!(first.add_uniform_buffer("Lights").unwrap(), 2);

        assert_eq!(first.uniform_block_binding("Camera").unwrap(), 0);
        assert_eq!(first.uniform_block_binding("Lights").unwrap(), 2);
        assert!(backend.calls().contains(&GlCall::UniformBlockBinding {
            program: first.handle(),
            block_index: 1,
            binding: 2,
        }));
    }

    #[test]
    fn test_reregistered_block_keeps_its_slot() {
        let backend = RecordingBackend::new().with_uniform_block("Camera", 0);
        let ctx = GlContext::new(backend.clone());
        let mut program = link(&ctx);

        let first = program.add_uniform_buffer("Camera").unwrap();
        let second = program.add_uniform_buffer("Camera").unwrap();

        assert_eq!(first, second);
        assert_eq!(program.uniform_block_binding("Camera").unwrap(), first);
        assert_eq!(
            backend.count_calls(|c| matches!(c, GlCall::UniformBlockBinding { .. })),
            1
        );
        assert_eq!(ctx.allocate_uniform_block_binding().unwrap(), first + 1);
    }

    #[test]
    fn test_bind_uniform_buffer_ranges() {
        let backend = RecordingBackend::new().with_uniform_block("Camera", 3);
        let ctx = GlContext::with_config(
            backend.clone(),
            ContextConfig::new().with_first_uniform_block_binding(5),
        );
        let mut program = link(&ctx);
        let buffer = Buffer::new(&ctx, 256).unwrap();
        assert_eq!(program.add_uniform_buffer("Camera").unwrap(), 5);
        backend.take_calls();

        program.bind_uniform_buffer("Camera", &buffer).unwrap();
        program
            .bind_uniform_buffer_range("Camera", &buffer, 64, 128)
            .unwrap();

        assert_eq!(
            backend.calls(),
            vec![
                GlCall::BindBufferRange {
                    target: BufferTarget::Uniform,
                    index: 5,
                    buffer: buffer.handle(),
                    offset: 0,
                    size: 256,
                },
                GlCall::BindBufferRange {
                    target: BufferTarget::Uniform,
                    index: 5,
                    buffer: buffer.handle(),
                    offset: 64,
                    size: 128,
                },
            ]
        );
    }

    #[test]
    fn test_use_program_and_bind() {
        let backend = RecordingBackend::new();
        let ctx = GlContext::new(backend.clone());
        let program = link(&ctx);
        backend.take_calls();
        program.use_program();
        program.bind();
        assert_eq!(
            backend.calls(),
            vec![
                GlCall::UseProgram(Some(program.handle())),
                GlCall::UseProgram(Some(program.handle())),
            ]
        );
    }

    #[test]
    fn test_missing_file() {
        let ctx = GlContext::new(RecordingBackend::new());
        let err = Shader::from_file(&ctx, ShaderStage::Vertex, "does/not/exist.vert").unwrap_err();
        assert!(matches!(err, GlError::ShaderSourceIo { .. }));
    }
}
