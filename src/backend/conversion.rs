//! Type conversions between wrapper types and driver enums.

use super::{BufferTarget, BufferUsageHint, GlEnum, TextureParameter, TextureTarget};
use crate::shader::ShaderStage;

/// Convert a buffer target to its driver enum.
pub fn convert_buffer_target(target: BufferTarget) -> GlEnum {
    match target {
        BufferTarget::Array => gl::ARRAY_BUFFER,
        BufferTarget::ElementArray => gl::ELEMENT_ARRAY_BUFFER,
        BufferTarget::CopyWrite => gl::COPY_WRITE_BUFFER,
        BufferTarget::Uniform => gl::UNIFORM_BUFFER,
        BufferTarget::Texture => gl::TEXTURE_BUFFER,
    }
}

/// Convert a texture target to its driver enum.
pub fn convert_texture_target(target: TextureTarget) -> GlEnum {
    match target {
        TextureTarget::Texture1D => gl::TEXTURE_1D,
        TextureTarget::Texture2D => gl::TEXTURE_2D,
        TextureTarget::Texture3D => gl::TEXTURE_3D,
        TextureTarget::Buffer => gl::TEXTURE_BUFFER,
    }
}

/// Convert a texture parameter name to its driver enum.
pub fn convert_texture_parameter(parameter: TextureParameter) -> GlEnum {
    match parameter {
        TextureParameter::MagFilter => gl::TEXTURE_MAG_FILTER,
        TextureParameter::MinFilter => gl::TEXTURE_MIN_FILTER,
        TextureParameter::WrapS => gl::TEXTURE_WRAP_S,
        TextureParameter::WrapT => gl::TEXTURE_WRAP_T,
        TextureParameter::WrapR => gl::TEXTURE_WRAP_R,
    }
}

/// Convert a usage hint to its driver enum.
pub fn convert_usage_hint(usage: BufferUsageHint) -> GlEnum {
    match usage {
        BufferUsageHint::StaticDraw => gl::STATIC_DRAW,
        BufferUsageHint::DynamicDraw => gl::DYNAMIC_DRAW,
        BufferUsageHint::StreamDraw => gl::STREAM_DRAW,
    }
}

/// Convert a shader stage to its driver enum.
pub fn convert_shader_stage(stage: ShaderStage) -> GlEnum {
    match stage {
        ShaderStage::Vertex => gl::VERTEX_SHADER,
        ShaderStage::Fragment => gl::FRAGMENT_SHADER,
    }
}
