//! Common utilities for integration tests.
//!
//! Every test runs against a [`RecordingBackend`], so the driver calls the
//! wrappers issue can be asserted without a GPU or a window.

#![allow(dead_code)]

use redlilium_gl::backend::GlCall;
use redlilium_gl::{
    ContextConfig, GlContext, RecordingBackend, Shader, ShaderProgram, ShaderStage,
};

/// Minimal vertex stage.
pub const VERTEX_SOURCE: &str = r#"#version 330 core
layout(location = 0) in vec3 a_position;
void main() {
    gl_Position = vec4(a_position, 1.0);
}
"#;

/// Minimal fragment stage with one float uniform.
pub const FRAGMENT_SOURCE: &str = r#"#version 330 core
uniform float u;
out vec4 color;
void main() {
    color = vec4(u);
}
"#;

/// Install the test logger once per process.
pub fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

/// A context over a recording backend, with the backend kept for inspection.
pub struct TestContext {
    pub backend: RecordingBackend,
    pub ctx: GlContext,
}

impl TestContext {
    pub fn new() -> Self {
        Self::with_backend(RecordingBackend::new(), ContextConfig::default())
    }

    pub fn with_backend(backend: RecordingBackend, config: ContextConfig) -> Self {
        init_logging();
        let ctx = GlContext::with_config(backend.clone(), config.with_label("test"));
        Self { backend, ctx }
    }

    /// Link the minimal vertex and fragment stages.
    pub fn link_program(&self) -> ShaderProgram {
        let vs = Shader::new(&self.ctx, ShaderStage::Vertex, &[VERTEX_SOURCE])
            .expect("vertex stage compiles");
        let fs = Shader::new(&self.ctx, ShaderStage::Fragment, &[FRAGMENT_SOURCE])
            .expect("fragment stage compiles");
        ShaderProgram::new(&self.ctx, &[&vs, &fs]).expect("program links")
    }

    /// Calls recorded since the last call to this method.
    pub fn take_calls(&self) -> Vec<GlCall> {
        self.backend.take_calls()
    }

    /// Number of delete calls of any kind.
    pub fn delete_count(&self) -> usize {
        self.backend.count_calls(|c| {
            matches!(
                c,
                GlCall::DeleteBuffer(_)
                    | GlCall::DeleteTexture(_)
                    | GlCall::DeleteShader(_)
                    | GlCall::DeleteProgram(_)
                    | GlCall::DeleteVertexArray(_)
            )
        })
    }
}

impl Default for TestContext {
    fn default() -> Self {
        Self::new()
    }
}
