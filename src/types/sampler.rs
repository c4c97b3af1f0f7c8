//! Filter and edge modes for image textures.

use crate::backend::GlEnum;
use crate::error::{GlError, GlResult};

/// Texture filtering mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum FilterMode {
    /// Nearest texel.
    Nearest,
    /// Linear interpolation between texels.
    #[default]
    Linear,
    /// No filtering. Only valid for the mipmap slot.
    Disabled,
}

/// Wrap behaviour outside the [0, 1] texture coordinate range.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum EdgeMode {
    /// Clamp to the edge texel.
    Clamp,
    /// Repeat the texture.
    #[default]
    Repeat,
    /// Use the border colour.
    Border,
}

impl EdgeMode {
    /// The wrap enum for this mode.
    pub fn to_gl(self) -> GlEnum {
        match self {
            Self::Clamp => gl::CLAMP_TO_EDGE,
            Self::Repeat => gl::REPEAT,
            Self::Border => gl::CLAMP_TO_BORDER,
        }
    }
}

/// Resolve a (mag, min, mipmap) filter triple to the driver's (mag, min)
/// filter enums.
pub fn resolve_filter_modes(
    mag: FilterMode,
    min: FilterMode,
    mipmap: FilterMode,
) -> GlResult<(GlEnum, GlEnum)> {
    let mag_filter = match mag {
        FilterMode::Nearest => gl::NEAREST,
        FilterMode::Linear => gl::LINEAR,
        FilterMode::Disabled => {
            return Err(GlError::InvalidFilterMode {
                slot: "mag",
                mode: mag,
            })
        }
    };
    let min_filter = match (min, mipmap) {
        (FilterMode::Disabled, _) => {
            return Err(GlError::InvalidFilterMode {
                slot: "min",
                mode: min,
            })
        }
        (FilterMode::Nearest, FilterMode::Disabled) => gl::NEAREST,
        (FilterMode::Linear, FilterMode::Disabled) => gl::LINEAR,
        (FilterMode::Nearest, FilterMode::Nearest) => gl::NEAREST_MIPMAP_NEAREST,
        (FilterMode::Nearest, FilterMode::Linear) => gl::NEAREST_MIPMAP_LINEAR,
        (FilterMode::Linear, FilterMode::Nearest) => gl::LINEAR_MIPMAP_NEAREST,
        (FilterMode::Linear, FilterMode::Linear) => gl::LINEAR_MIPMAP_LINEAR,
    };
    Ok((mag_filter, min_filter))
}
