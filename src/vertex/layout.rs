//! Vertex attribute descriptions.
//!
//! Two descriptions exist, one per vertex array flavour:
//!
//! - [`VertexAttributeDescriptor`] places an attribute at an explicit offset
//!   inside a [`VertexBufferBinding`], for arrays over borrowed buffers.
//! - [`VertexAttribute`] only names a scalar type and a step mode; offsets
//!   and strides are derived by [`compute_attribute_offsets`], for arrays
//!   that own their buffers.

use crate::backend::GlEnum;
use crate::resources::Buffer;

/// Scalar type of vertex data in a buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ComponentType {
    Byte,
    UnsignedByte,
    Short,
    UnsignedShort,
    Int,
    UnsignedInt,
    HalfFloat,
    Float,
}

impl ComponentType {
    /// Size of one component in bytes.
    pub fn size(&self) -> usize {
        match self {
            Self::Byte | Self::UnsignedByte => 1,
            Self::Short | Self::UnsignedShort | Self::HalfFloat => 2,
            Self::Int | Self::UnsignedInt | Self::Float => 4,
        }
    }

    pub fn to_gl(&self) -> GlEnum {
        match self {
            Self::Byte => gl::BYTE,
            Self::UnsignedByte => gl::UNSIGNED_BYTE,
            Self::Short => gl::SHORT,
            Self::UnsignedShort => gl::UNSIGNED_SHORT,
            Self::Int => gl::INT,
            Self::UnsignedInt => gl::UNSIGNED_INT,
            Self::HalfFloat => gl::HALF_FLOAT,
            Self::Float => gl::FLOAT,
        }
    }
}

/// An attribute at a fixed offset inside a bound buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct VertexAttributeDescriptor {
    /// Shader input location.
    pub location: u32,
    /// Components per vertex, 1 to 4.
    pub components: u32,
    pub component_type: ComponentType,
    /// Byte offset from the start of each element.
    pub offset: usize,
    /// Read as integers in the shader, without conversion.
    pub integer: bool,
    /// Normalize integer data when converting to float.
    pub normalized: bool,
}

impl VertexAttributeDescriptor {
    /// Float shader input converted from `component_type`.
    pub fn new(
        location: u32,
        components: u32,
        component_type: ComponentType,
        offset: usize,
    ) -> Self {
        Self {
            location,
            components,
            component_type,
            offset,
            integer: false,
            normalized: false,
        }
    }

    /// Float shader input read directly from float data.
    pub fn float(location: u32, components: u32, offset: usize) -> Self {
        Self::new(location, components, ComponentType::Float, offset)
    }

    /// Integer shader input read without conversion.
    pub fn integer(
        location: u32,
        components: u32,
        component_type: ComponentType,
        offset: usize,
    ) -> Self {
        Self {
            integer: true,
            ..Self::new(location, components, component_type, offset)
        }
    }

    /// Set normalization of integer data.
    pub fn with_normalized(mut self, normalized: bool) -> Self {
        self.normalized = normalized;
        self
    }
}

/// One borrowed buffer and the attributes read from it.
#[derive(Debug, Clone)]
pub struct VertexBufferBinding<'a> {
    pub buffer: &'a Buffer,
    pub attributes: Vec<VertexAttributeDescriptor>,
    /// Bytes between consecutive elements.
    pub stride: usize,
    /// Advance once per instance instead of once per vertex.
    pub instanced: bool,
}

impl<'a> VertexBufferBinding<'a> {
    /// Per-vertex binding with no attributes.
    pub fn new(buffer: &'a Buffer, stride: usize) -> Self {
        Self {
            buffer,
            attributes: Vec::new(),
            stride,
            instanced: false,
        }
    }

    /// Add an attribute.
    pub fn with_attribute(mut self, attribute: VertexAttributeDescriptor) -> Self {
        self.attributes.push(attribute);
        self
    }

    /// Set per-instance stepping.
    pub fn with_instanced(mut self, instanced: bool) -> Self {
        self.instanced = instanced;
        self
    }
}

/// Scalar type of an attribute in an owning vertex array.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AttributeType {
    Float,
    Int,
    UnsignedInt,
}

impl AttributeType {
    /// Size of one component in bytes.
    pub fn size(&self) -> usize {
        4
    }

    pub fn component_type(&self) -> ComponentType {
        match self {
            Self::Float => ComponentType::Float,
            Self::Int => ComponentType::Int,
            Self::UnsignedInt => ComponentType::UnsignedInt,
        }
    }
}

/// How often an attribute advances.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum VertexStepMode {
    /// Advance once per vertex.
    #[default]
    Vertex,
    /// Advance once per instance.
    Instance,
}

impl VertexStepMode {
    /// Attribute divisor for this step mode.
    pub fn divisor(&self) -> u32 {
        match self {
            Self::Vertex => 0,
            Self::Instance => 1,
        }
    }
}

/// An attribute of an owning vertex array.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct VertexAttribute {
    /// Shader input location.
    pub location: u32,
    /// Number of components, 1 to 4.
    pub components: u32,
    /// Scalar type of each component.
    pub attribute_type: AttributeType,
    /// Whether the attribute lives in the vertex or the instance buffer.
    pub step_mode: VertexStepMode,
}

impl VertexAttribute {
    /// Create an attribute.
    pub fn new(
        location: u32,
        components: u32,
        attribute_type: AttributeType,
        step_mode: VertexStepMode,
    ) -> Self {
        Self {
            location,
            components,
            attribute_type,
            step_mode,
        }
    }

    /// Size of the attribute in bytes.
    pub fn size(&self) -> usize {
        self.attribute_type.size() * self.components as usize
    }
}

/// Byte offsets of attributes packed into per-vertex and per-instance buffers.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct AttributeOffsets {
    /// Offset of each attribute inside its partition, in registration order.
    pub offsets: Vec<usize>,
    /// Total size of the per-vertex attributes.
    pub vertex_stride: usize,
    /// Total size of the per-instance attributes.
    pub instance_stride: usize,
}

impl AttributeOffsets {
    /// Stride of the partition `step_mode` selects.
    pub fn stride(&self, step_mode: VertexStepMode) -> usize {
        match step_mode {
            VertexStepMode::Vertex => self.vertex_stride,
            VertexStepMode::Instance => self.instance_stride,
        }
    }
}

/// Pack `attributes` tightly in registration order.
///
/// Per-vertex and per-instance attributes form independent partitions, each
/// starting at offset 0.
pub fn compute_attribute_offsets(attributes: &[VertexAttribute]) -> AttributeOffsets {
    let mut result = AttributeOffsets {
        offsets: Vec::with_capacity(attributes.len()),
        ..Default::default()
    };
    for attribute in attributes {
        let cursor = match attribute.step_mode {
            VertexStepMode::Vertex => &mut result.vertex_stride,
            VertexStepMode::Instance => &mut result.instance_stride,
        };
        result.offsets.push(*cursor);
        *cursor += attribute.size();
    }
    result
}
