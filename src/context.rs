//! Context handle shared by every wrapper.

use std::cell::Cell;
use std::ffi::c_void;
use std::fmt;
use std::rc::Rc;

use crate::backend::{GlBackend, NativeBackend};
use crate::error::{GlError, GlResult};

/// Configuration for a [`GlContext`].
#[derive(Debug, Clone, Default)]
pub struct ContextConfig {
    /// Fail uniform registration for names the program does not use,
    /// instead of logging a warning.
    pub strict_uniform_lookup: bool,
    /// First binding slot handed out to uniform blocks.
    pub first_uniform_block_binding: u32,
    /// Debug label used in log output.
    pub label: Option<String>,
}

impl ContextConfig {
    /// Create a configuration with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set strict uniform lookup.
    pub fn with_strict_uniform_lookup(mut self, strict: bool) -> Self {
        self.strict_uniform_lookup = strict;
        self
    }

    /// Set the first uniform-block binding slot.
    pub fn with_first_uniform_block_binding(mut self, binding: u32) -> Self {
        self.first_uniform_block_binding = binding;
        self
    }

    /// Set the debug label.
    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }
}

struct ContextInner {
    backend: Box<dyn GlBackend>,
    config: ContextConfig,
    next_uniform_block_binding: Cell<Option<u32>>,
}

/// Handle to one driver context.
///
/// Cloning is cheap and yields a handle to the same context. The handle is
/// `Rc`-based, so it and every wrapper holding it stay on the thread that
/// owns the driver context.
#[derive(Clone)]
pub struct GlContext {
    inner: Rc<ContextInner>,
}

impl GlContext {
    /// Create a context over `backend` with the default configuration.
    pub fn new(backend: impl GlBackend) -> Self {
        Self::with_config(backend, ContextConfig::default())
    }

    /// Create a context over `backend` with `config`.
    pub fn with_config(backend: impl GlBackend, config: ContextConfig) -> Self {
        log::info!(
            "Created GL context \"{}\" on {} backend",
            config.label.as_deref().unwrap_or("unnamed"),
            backend.name()
        );
        let first_binding = config.first_uniform_block_binding;
        Self {
            inner: Rc::new(ContextInner {
                backend: Box::new(backend),
                config,
                next_uniform_block_binding: Cell::new(Some(first_binding)),
            }),
        }
    }

    /// Load the native driver through a proc-address loader.
    ///
    /// The driver context must already be current on this thread.
    pub fn load_with<F>(loader: F, config: ContextConfig) -> GlResult<Self>
    where
        F: FnMut(&'static str) -> *const c_void,
    {
        let backend = NativeBackend::load_with(loader)?;
        Ok(Self::with_config(backend, config))
    }

    /// The backend every call goes through.
    pub fn backend(&self) -> &dyn GlBackend {
        self.inner.backend.as_ref()
    }

    /// The context configuration.
    pub fn config(&self) -> &ContextConfig {
        &self.inner.config
    }

    /// Take the next uniform-block binding slot.
    ///
    /// Slots increase monotonically for the lifetime of the context. Fails
    /// once `u32::MAX` has been handed out.
    pub fn allocate_uniform_block_binding(&self) -> GlResult<u32> {
        let binding = self
            .inner
            .next_uniform_block_binding
            .get()
            .ok_or(GlError::UniformBlockBindingsExhausted)?;
        self.inner
            .next_uniform_block_binding
            .set(binding.checked_add(1));
        Ok(binding)
    }
}

impl fmt::Debug for GlContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GlContext")
            .field("backend", &self.inner.backend.name())
            .field("config", &self.inner.config)
            .field(
                "next_uniform_block_binding",
                &self.inner.next_uniform_block_binding.get(),
            )
            .finish()
    }
}

static_assertions::assert_not_impl_any!(GlContext: Send, Sync);

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::RecordingBackend;

    #[test]
    fn test_config_builders() {
        let config = ContextConfig::new()
            .with_strict_uniform_lookup(true)
            .with_first_uniform_block_binding(4)
            .with_label("main");
        assert!(config.strict_uniform_lookup);
        assert_eq!(config.first_uniform_block_binding, 4);
        assert_eq!(config.label.as_deref(), Some("main"));
    }

    #[test]
    fn test_config_default() {
        let config = ContextConfig::default();
        assert!(!config.strict_uniform_lookup);
        assert_eq!(config.first_uniform_block_binding, 0);
        assert!(config.label.is_none());
    }

    #[test]
    fn test_binding_slots_are_shared_between_clones() {
        let ctx = GlContext::with_config(
            RecordingBackend::new(),
            ContextConfig::new().with_first_uniform_block_binding(2),
        );
        let other = ctx.clone();
        assert_eq!(ctx.allocate_uniform_block_binding().unwrap(), 2);
        assert_eq!(other.allocate_uniform_block_binding().unwrap(), 3);
        assert_eq!(ctx.allocate_uniform_block_binding().unwrap(), 4);
    }

    #[test]
    fn test_binding_slots_exhaust_without_wrapping() {
        let ctx = GlContext::with_config(
            RecordingBackend::new(),
            ContextConfig::new().with_first_uniform_block_binding(u32::MAX - 1),
        );
        assert_eq!(ctx.allocate_uniform_block_binding().unwrap(), u32::MAX - 1);
        assert_eq!(ctx.allocate_uniform_block_binding().unwrap(), u32::MAX);
        assert!(matches!(
            ctx.allocate_uniform_block_binding(),
            Err(GlError::UniformBlockBindingsExhausted)
        ));
        assert!(matches!(
            ctx.allocate_uniform_block_binding(),
            Err(GlError::UniformBlockBindingsExhausted)
        ));
    }

    #[test]
    fn test_debug_names_backend() {
        let ctx = GlContext::new(RecordingBackend::new());
        let debug = format!("{:?}", ctx);
        assert!(debug.contains("Recording"));
    }
}
