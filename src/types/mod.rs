//! Format and sampler types.
//!
//! This module contains the format descriptors, their validation predicates
//! and the lookup tables that resolve them to driver enums, plus the filter
//! and edge modes used by image textures.

mod format;
mod sampler;

pub use format::{
    BufferTextureFormat, ChannelFormat, DepthFormat, ResolvedFormat, TextureDimension,
    TextureFormat,
};
pub use sampler::{resolve_filter_modes, EdgeMode, FilterMode};
