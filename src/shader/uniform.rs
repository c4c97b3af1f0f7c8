//! Values that can be assigned to uniforms.

use glam::{Mat4, Vec2, Vec3, Vec4};

use crate::backend::{GlBackend, UniformLocation};

/// A value with a matching single-value uniform call.
pub trait UniformValue {
    /// Issue the uniform call for this value at `location`.
    fn upload(&self, backend: &dyn GlBackend, location: UniformLocation);
}

impl UniformValue for i32 {
    fn upload(&self, backend: &dyn GlBackend, location: UniformLocation) {
        backend.uniform_1i(location, *self);
    }
}

impl UniformValue for u32 {
    fn upload(&self, backend: &dyn GlBackend, location: UniformLocation) {
        backend.uniform_1ui(location, *self);
    }
}

impl UniformValue for f32 {
    fn upload(&self, backend: &dyn GlBackend, location: UniformLocation) {
        backend.uniform_1f(location, *self);
    }
}

impl UniformValue for Vec2 {
    fn upload(&self, backend: &dyn GlBackend, location: UniformLocation) {
        backend.uniform_2f(location, self.to_array());
    }
}

impl UniformValue for Vec3 {
    fn upload(&self, backend: &dyn GlBackend, location: UniformLocation) {
        backend.uniform_3f(location, self.to_array());
    }
}

impl UniformValue for Vec4 {
    fn upload(&self, backend: &dyn GlBackend, location: UniformLocation) {
        backend.uniform_4f(location, self.to_array());
    }
}

impl UniformValue for Mat4 {
    fn upload(&self, backend: &dyn GlBackend, location: UniformLocation) {
        backend.uniform_matrix_4f(location, self.to_cols_array());
    }
}
