//! Texture format descriptors and their driver resolution tables.

use crate::backend::GlEnum;

/// Texture dimensionality, fixed at construction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum TextureDimension {
    /// One-dimensional texture.
    D1,
    /// Two-dimensional texture.
    #[default]
    D2,
    /// Three-dimensional texture.
    D3,
}

/// Driver enums a format resolves to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ResolvedFormat {
    /// Storage format of the texture.
    pub internal_format: GlEnum,
    /// Layout of the pixels passed on upload.
    pub pixel_format: GlEnum,
    /// Scalar type of the pixels passed on upload.
    pub component_type: GlEnum,
}

/// Colour format of an image texture.
///
/// Not every combination of fields has a driver representation; see
/// [`validate`](Self::validate).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TextureFormat {
    /// Number of components, 1 to 4.
    pub components: u8,
    /// Bits per component: 8, 16 or 32.
    pub bits_per_component: u8,
    /// Components are signed.
    pub signed: bool,
    /// Integer components are read as normalized fixed point.
    pub normalized: bool,
    /// Components are floating point.
    pub floating_point: bool,
    /// Pixel data is stored in BGR(A) order.
    pub bgr: bool,
}

impl TextureFormat {
    /// Unsigned integer components, read without normalization.
    pub const fn uint(components: u8, bits_per_component: u8) -> Self {
        Self {
            components,
            bits_per_component,
            signed: false,
            normalized: false,
            floating_point: false,
            bgr: false,
        }
    }

    /// Signed integer components, read without normalization.
    pub const fn sint(components: u8, bits_per_component: u8) -> Self {
        Self {
            signed: true,
            ..Self::uint(components, bits_per_component)
        }
    }

    /// Unsigned normalized components.
    pub const fn unorm(components: u8, bits_per_component: u8) -> Self {
        Self {
            normalized: true,
            ..Self::uint(components, bits_per_component)
        }
    }

    /// Signed normalized components.
    pub const fn snorm(components: u8, bits_per_component: u8) -> Self {
        Self {
            signed: true,
            normalized: true,
            ..Self::uint(components, bits_per_component)
        }
    }

    /// Floating point components.
    pub const fn float(components: u8, bits_per_component: u8) -> Self {
        Self {
            signed: true,
            floating_point: true,
            ..Self::uint(components, bits_per_component)
        }
    }

    /// Set BGR pixel order.
    pub const fn with_bgr(mut self, bgr: bool) -> Self {
        self.bgr = bgr;
        self
    }

    /// Check the format against the driver's image format rules.
    pub fn validate(&self) -> bool {
        if !(1..=4).contains(&self.components) {
            return false;
        }
        if !matches!(self.bits_per_component, 8 | 16 | 32) {
            return false;
        }
        if self.bits_per_component == 8 && self.floating_point {
            return false;
        }
        if self.bits_per_component == 32 && self.normalized {
            return false;
        }
        if self.floating_point && (!self.signed || self.normalized) {
            return false;
        }
        true
    }

    /// Packed table key, or `None` when components or bit depth are out of range.
    ///
    /// Layout: `(components - 1) << 5 | (bits / 8 - 1) << 3 | float << 2 |
    /// normalized << 1 | signed`.
    pub fn key(&self) -> Option<usize> {
        if !(1..=4).contains(&self.components) || !matches!(self.bits_per_component, 8 | 16 | 32)
        {
            return None;
        }
        let components = (self.components - 1) as usize;
        let bits = (self.bits_per_component / 8 - 1) as usize;
        Some(
            components << 5
                | bits << 3
                | (self.floating_point as usize) << 2
                | (self.normalized as usize) << 1
                | self.signed as usize,
        )
    }

    /// Resolve to driver enums, or `None` when the format is unrepresentable.
    pub fn resolve(&self) -> Option<ResolvedFormat> {
        let key = self.key()?;
        let internal_format = INTERNAL_FORMATS[key]?;
        let component_type = COMPONENT_TYPES[key & 0x1f]?;
        Some(ResolvedFormat {
            internal_format,
            pixel_format: self.pixel_format(),
            component_type,
        })
    }

    fn pixel_format(&self) -> GlEnum {
        // Integer formats use the plain integer family whatever the BGR flag says.
        if self.normalized || self.floating_point {
            match (self.components, self.bgr) {
                (1, _) => gl::RED,
                (2, _) => gl::RG,
                (3, false) => gl::RGB,
                (3, true) => gl::BGR,
                (_, false) => gl::RGBA,
                (_, true) => gl::BGRA,
            }
        } else {
            match self.components {
                1 => gl::RED_INTEGER,
                2 => gl::RG_INTEGER,
                3 => gl::RGB_INTEGER,
                _ => gl::RGBA_INTEGER,
            }
        }
    }
}

/// Internal formats indexed by [`TextureFormat::key`].
const INTERNAL_FORMATS: [Option<GlEnum>; 128] = [
    // R, 8 bit
    Some(gl::R8UI),
    Some(gl::R8I),
    Some(gl::R8),
    Some(gl::R8_SNORM),
    None,
    None,
    None,
    None,
    // R, 16 bit
    Some(gl::R16UI),
    Some(gl::R16I),
    Some(gl::R16),
    Some(gl::R16_SNORM),
    None,
    Some(gl::R16F),
    None,
    None,
    // R, 24 bit
    None,
    None,
    None,
    None,
    None,
    None,
    None,
    None,
    // R, 32 bit
    Some(gl::R32UI),
    Some(gl::R32I),
    None,
    None,
    None,
    Some(gl::R32F),
    None,
    None,
    // RG, 8 bit
    Some(gl::RG8UI),
    Some(gl::RG8I),
    Some(gl::RG8),
    Some(gl::RG8_SNORM),
    None,
    None,
    None,
    None,
    // RG, 16 bit
    Some(gl::RG16UI),
    Some(gl::RG16I),
    Some(gl::RG16),
    Some(gl::RG16_SNORM),
    None,
    Some(gl::RG16F),
    None,
    None,
    // RG, 24 bit
    None,
    None,
    None,
    None,
    None,
    None,
    None,
    None,
    // RG, 32 bit
    Some(gl::RG32UI),
    Some(gl::RG32I),
    None,
    None,
    None,
    Some(gl::RG32F),
    None,
    None,
    // RGB, 8 bit
    Some(gl::RGB8UI),
    Some(gl::RGB8I),
    Some(gl::RGB8),
    Some(gl::RGB8_SNORM),
    None,
    None,
    None,
    None,
    // RGB, 16 bit
    Some(gl::RGB16UI),
    Some(gl::RGB16I),
    Some(gl::RGB16),
    Some(gl::RGB16_SNORM),
    None,
    Some(gl::RGB16F),
    None,
    None,
    // RGB, 24 bit
    None,
    None,
    None,
    None,
    None,
    None,
    None,
    None,
    // RGB, 32 bit
    Some(gl::RGB32UI),
    Some(gl::RGB32I),
    None,
    None,
    None,
    Some(gl::RGB32F),
    None,
    None,
    // RGBA, 8 bit
    Some(gl::RGBA8UI),
    Some(gl::RGBA8I),
    Some(gl::RGBA8),
    Some(gl::RGBA8_SNORM),
    None,
    None,
    None,
    None,
    // RGBA, 16 bit
    Some(gl::RGBA16UI),
    Some(gl::RGBA16I),
    Some(gl::RGBA16),
    Some(gl::RGBA16_SNORM),
    None,
    Some(gl::RGBA16F),
    None,
    None,
    // RGBA, 24 bit
    None,
    None,
    None,
    None,
    None,
    None,
    None,
    None,
    // RGBA, 32 bit
    Some(gl::RGBA32UI),
    Some(gl::RGBA32I),
    None,
    None,
    None,
    Some(gl::RGBA32F),
    None,
    None,
];

/// Pixel component types indexed by the low five bits of [`TextureFormat::key`].
const COMPONENT_TYPES: [Option<GlEnum>; 32] = [
    // 8 bit
    Some(gl::UNSIGNED_BYTE),
    Some(gl::BYTE),
    Some(gl::UNSIGNED_BYTE),
    Some(gl::BYTE),
    None,
    None,
    None,
    None,
    // 16 bit
    Some(gl::UNSIGNED_SHORT),
    Some(gl::SHORT),
    Some(gl::UNSIGNED_SHORT),
    Some(gl::SHORT),
    None,
    Some(gl::HALF_FLOAT),
    None,
    None,
    // 24 bit
    None,
    None,
    None,
    None,
    None,
    None,
    None,
    None,
    // 32 bit
    Some(gl::UNSIGNED_INT),
    Some(gl::INT),
    None,
    None,
    None,
    Some(gl::FLOAT),
    None,
    None,
];

/// Shorthand channel types for the 2D convenience constructor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ChannelFormat {
    /// 8-bit unsigned normalized.
    U8,
    /// 16-bit unsigned normalized.
    U16,
    /// 16-bit float.
    Float16,
    /// 32-bit float.
    Float32,
}

impl ChannelFormat {
    /// Build the full format for `components` channels.
    pub const fn to_format(self, components: u8) -> TextureFormat {
        match self {
            Self::U8 => TextureFormat::unorm(components, 8),
            Self::U16 => TextureFormat::unorm(components, 16),
            Self::Float16 => TextureFormat::float(components, 16),
            Self::Float32 => TextureFormat::float(components, 32),
        }
    }
}

/// Depth (and optional stencil) format of an image texture.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct DepthFormat {
    /// Depth bits: 16, 24 or 32.
    pub depth_bits: u8,
    /// Pack an 8-bit stencil with the depth.
    pub stencil: bool,
}

impl DepthFormat {
    /// 16-bit normalized depth.
    pub const DEPTH16: Self = Self::new(16, false);
    /// 24-bit normalized depth.
    pub const DEPTH24: Self = Self::new(24, false);
    /// 24-bit depth packed with 8-bit stencil.
    pub const DEPTH24_STENCIL8: Self = Self::new(24, true);
    /// 32-bit float depth.
    pub const DEPTH32F: Self = Self::new(32, false);
    /// 32-bit float depth with 8-bit stencil.
    pub const DEPTH32F_STENCIL8: Self = Self::new(32, true);

    /// Create a depth format. See [`resolve`](Self::resolve) for the
    /// supported combinations.
    pub const fn new(depth_bits: u8, stencil: bool) -> Self {
        Self {
            depth_bits,
            stencil,
        }
    }

    /// Resolve to driver enums.
    ///
    /// 16-bit depth has no packed stencil variant, so the stencil flag is
    /// ignored for it.
    pub fn resolve(&self) -> Option<ResolvedFormat> {
        let (internal_format, pixel_format, component_type) = match (self.depth_bits, self.stencil)
        {
            (32, true) => (
                gl::DEPTH32F_STENCIL8,
                gl::DEPTH_STENCIL,
                gl::FLOAT_32_UNSIGNED_INT_24_8_REV,
            ),
            (32, false) => (gl::DEPTH_COMPONENT32F, gl::DEPTH_COMPONENT, gl::FLOAT),
            (24, true) => (
                gl::DEPTH24_STENCIL8,
                gl::DEPTH_STENCIL,
                gl::UNSIGNED_INT_24_8,
            ),
            (24, false) => (
                gl::DEPTH_COMPONENT24,
                gl::DEPTH_COMPONENT,
                gl::UNSIGNED_INT,
            ),
            (16, _) => (
                gl::DEPTH_COMPONENT16,
                gl::DEPTH_COMPONENT,
                gl::UNSIGNED_SHORT,
            ),
            _ => return None,
        };
        Some(ResolvedFormat {
            internal_format,
            pixel_format,
            component_type,
        })
    }
}

/// Format of a buffer-backed texture.
///
/// A stricter subset of [`TextureFormat`]: three-component formats are not
/// available and there is no BGR ordering.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct BufferTextureFormat {
    /// Number of components: 1, 2 or 4.
    pub components: u8,
    /// Bits per component: 8, 16 or 32.
    pub bits_per_component: u8,
    /// Components are signed. Required for floating point.
    pub signed: bool,
    /// Unsigned integer components are read as normalized fixed point.
    pub normalized: bool,
    /// Components are floating point.
    pub floating_point: bool,
}

impl BufferTextureFormat {
    /// Unsigned integer components, read without normalization.
    pub const fn uint(components: u8, bits_per_component: u8) -> Self {
        Self {
            components,
            bits_per_component,
            signed: false,
            normalized: false,
            floating_point: false,
        }
    }

    /// Signed integer components, read without normalization.
    pub const fn sint(components: u8, bits_per_component: u8) -> Self {
        Self {
            signed: true,
            ..Self::uint(components, bits_per_component)
        }
    }

    /// Unsigned normalized components.
    pub const fn unorm(components: u8, bits_per_component: u8) -> Self {
        Self {
            normalized: true,
            ..Self::uint(components, bits_per_component)
        }
    }

    /// Floating point components.
    pub const fn float(components: u8, bits_per_component: u8) -> Self {
        Self {
            signed: true,
            floating_point: true,
            ..Self::uint(components, bits_per_component)
        }
    }

    /// Check the format against the driver's buffer texture rules.
    pub fn validate(&self) -> bool {
        if !matches!(self.components, 1 | 2 | 4) {
            return false;
        }
        if !matches!(self.bits_per_component, 8 | 16 | 32) {
            return false;
        }
        if self.bits_per_component == 32 && self.normalized {
            return false;
        }
        if self.bits_per_component == 8 && self.floating_point {
            return false;
        }
        if self.floating_point && !self.signed {
            return false;
        }
        if self.normalized && self.signed {
            return false;
        }
        true
    }

    /// Resolve to the internal format, or `None` when the format is invalid.
    pub fn internal_format(&self) -> Option<GlEnum> {
        if !self.validate() {
            return None;
        }
        let [r, rg, rgba] = match self.bits_per_component {
            8 if self.normalized => [gl::R8, gl::RG8, gl::RGBA8],
            8 if self.signed => [gl::R8I, gl::RG8I, gl::RGBA8I],
            8 => [gl::R8UI, gl::RG8UI, gl::RGBA8UI],
            16 if self.floating_point => [gl::R16F, gl::RG16F, gl::RGBA16F],
            16 if self.normalized => [gl::R16, gl::RG16, gl::RGBA16],
            16 if self.signed => [gl::R16I, gl::RG16I, gl::RGBA16I],
            16 => [gl::R16UI, gl::RG16UI, gl::RGBA16UI],
            _ if self.floating_point => [gl::R32F, gl::RG32F, gl::RGBA32F],
            _ if self.signed => [gl::R32I, gl::RG32I, gl::RGBA32I],
            _ => [gl::R32UI, gl::RG32UI, gl::RGBA32UI],
        };
        Some(match self.components {
            1 => r,
            2 => rg,
            _ => rgba,
        })
    }
}
