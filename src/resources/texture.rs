//! Image texture.

use crate::backend::{TextureHandle, TextureParameter, TextureTarget};
use crate::context::GlContext;
use crate::error::{GlError, GlResult};
use crate::types::{
    resolve_filter_modes, ChannelFormat, DepthFormat, EdgeMode, FilterMode, ResolvedFormat,
    TextureDimension, TextureFormat,
};

/// A 1D, 2D or 3D image texture.
///
/// The dimensionality and format are fixed at construction. Storage is
/// (re)specified by [`write_pixels`](Self::write_pixels).
///
/// # Example
///
/// ```ignore
/// let mut texture = Texture::new_2d(&ctx, 256, 256, 4, ChannelFormat::U8, Some(&pixels), false)?;
/// texture.set_filter_mode(FilterMode::Linear, FilterMode::Linear, FilterMode::Linear)?;
/// texture.generate_mipmaps();
/// texture.bind(0);
/// ```
pub struct Texture {
    ctx: GlContext,
    handle: TextureHandle,
    dimension: TextureDimension,
    format: ResolvedFormat,
    width: u32,
    height: u32,
    depth: u32,
}

impl Texture {
    /// Create a colour texture with no storage.
    pub fn new(
        ctx: &GlContext,
        dimension: TextureDimension,
        format: TextureFormat,
    ) -> GlResult<Self> {
        Self::create(ctx, dimension, || {
            format
                .resolve()
                .ok_or_else(|| GlError::UnsupportedFormat(format!("texture format {:?}", format)))
        })
    }

    /// Create a depth (or depth-stencil) texture with no storage.
    pub fn new_depth(
        ctx: &GlContext,
        dimension: TextureDimension,
        format: DepthFormat,
    ) -> GlResult<Self> {
        Self::create(ctx, dimension, || {
            format
                .resolve()
                .ok_or_else(|| GlError::UnsupportedFormat(format!("depth format {:?}", format)))
        })
    }

    /// Create a colour texture and upload its initial pixels.
    ///
    /// `data = None` allocates storage without initializing it.
    pub fn with_pixels(
        ctx: &GlContext,
        width: u32,
        height: u32,
        depth: u32,
        dimension: TextureDimension,
        format: TextureFormat,
        data: Option<&[u8]>,
    ) -> GlResult<Self> {
        let mut texture = Self::new(ctx, dimension, format)?;
        texture.write_pixels(width, height, depth, data);
        Ok(texture)
    }

    /// Create a 2D texture from a shorthand channel format.
    pub fn new_2d(
        ctx: &GlContext,
        width: u32,
        height: u32,
        components: u8,
        channel: ChannelFormat,
        data: Option<&[u8]>,
        bgr: bool,
    ) -> GlResult<Self> {
        let format = channel.to_format(components).with_bgr(bgr);
        Self::with_pixels(ctx, width, height, 1, TextureDimension::D2, format, data)
    }

    fn create<F>(ctx: &GlContext, dimension: TextureDimension, resolve: F) -> GlResult<Self>
    where
        F: FnOnce() -> GlResult<ResolvedFormat>,
    {
        let backend = ctx.backend();
        let handle = backend.create_texture()?;
        let format = match resolve() {
            Ok(format) => format,
            Err(err) => {
                backend.delete_texture(handle);
                return Err(err);
            }
        };

        log::debug!(
            "Created {:?} texture {} (internal format {:#06x})",
            dimension,
            handle.raw(),
            format.internal_format
        );

        Ok(Self {
            ctx: ctx.clone(),
            handle,
            dimension,
            format,
            width: 0,
            height: 0,
            depth: 0,
        })
    }

    fn target(&self) -> TextureTarget {
        match self.dimension {
            TextureDimension::D1 => TextureTarget::Texture1D,
            TextureDimension::D2 => TextureTarget::Texture2D,
            TextureDimension::D3 => TextureTarget::Texture3D,
        }
    }

    /// Specify mip level 0 with new extents.
    ///
    /// Extents beyond the texture's dimensionality are stored but not passed
    /// to the driver. `data` is not checked against the extents.
    pub fn write_pixels(&mut self, width: u32, height: u32, depth: u32, data: Option<&[u8]>) {
        self.width = width;
        self.height = height;
        self.depth = depth;

        let target = self.target();
        let ResolvedFormat {
            internal_format,
            pixel_format,
            component_type,
        } = self.format;
        let backend = self.ctx.backend();
        backend.bind_texture(target, Some(self.handle));
        match self.dimension {
            TextureDimension::D1 => backend.tex_image_1d(
                target,
                internal_format,
                width,
                pixel_format,
                component_type,
                data,
            ),
            TextureDimension::D2 => backend.tex_image_2d(
                target,
                internal_format,
                width,
                height,
                pixel_format,
                component_type,
                data,
            ),
            TextureDimension::D3 => backend.tex_image_3d(
                target,
                internal_format,
                width,
                height,
                depth,
                pixel_format,
                component_type,
                data,
            ),
        }
    }

    /// Set magnification, minification and mipmap filtering.
    ///
    /// `mipmap = Disabled` samples only level 0. Fails without touching the
    /// texture if `mag` or `min` is `Disabled`.
    pub fn set_filter_mode(
        &self,
        mag: FilterMode,
        min: FilterMode,
        mipmap: FilterMode,
    ) -> GlResult<()> {
        let (mag_filter, min_filter) = resolve_filter_modes(mag, min, mipmap)?;
        let target = self.target();
        let backend = self.ctx.backend();
        backend.bind_texture(target, Some(self.handle));
        backend.tex_parameter_i(target, TextureParameter::MagFilter, mag_filter);
        backend.tex_parameter_i(target, TextureParameter::MinFilter, min_filter);
        Ok(())
    }

    /// Set the wrap mode on all three axes, and the border colour if given.
    pub fn set_edge_mode(&self, mode: EdgeMode, border_color: Option<[f32; 4]>) {
        let target = self.target();
        let wrap = mode.to_gl();
        let backend = self.ctx.backend();
        backend.bind_texture(target, Some(self.handle));
        backend.tex_parameter_i(target, TextureParameter::WrapS, wrap);
        backend.tex_parameter_i(target, TextureParameter::WrapT, wrap);
        backend.tex_parameter_i(target, TextureParameter::WrapR, wrap);
        if let Some(color) = border_color {
            backend.tex_border_color(target, color);
        }
    }

    /// Generate the mipmap chain from level 0.
    pub fn generate_mipmaps(&self) {
        let target = self.target();
        let backend = self.ctx.backend();
        backend.bind_texture(target, Some(self.handle));
        backend.generate_mipmap(target);
    }

    /// Bind to texture unit `unit`.
    pub fn bind(&self, unit: u32) {
        let backend = self.ctx.backend();
        backend.active_texture(unit);
        backend.bind_texture(self.target(), Some(self.handle));
    }

    /// Width in texels.
    pub fn width(&self) -> u32 {
        self.width
    }

    /// Height in texels, 1 for 1D textures.
    pub fn height(&self) -> u32 {
        self.height
    }

    /// Depth in texels, 1 unless the texture is 3D.
    pub fn depth(&self) -> u32 {
        self.depth
    }

    /// Dimensionality chosen at construction.
    pub fn dimension(&self) -> TextureDimension {
        self.dimension
    }

    /// The driver enums the format resolved to.
    pub fn resolved_format(&self) -> ResolvedFormat {
        self.format
    }

    /// Driver name of the texture.
    pub fn handle(&self) -> TextureHandle {
        self.handle
    }
}

impl Drop for Texture {
    fn drop(&mut self) {
        log::debug!("Deleting texture {}", self.handle.raw());
        self.ctx.backend().delete_texture(self.handle);
    }
}

impl std::fmt::Debug for Texture {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Texture")
            .field("handle", &self.handle.raw())
            .field("dimension", &self.dimension)
            .field("width", &self.width)
            .field("height", &self.height)
            .field("depth", &self.depth)
            .finish()
    }
}

static_assertions::assert_not_impl_any!(Texture: Clone, Send, Sync);

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::{GlCall, RecordingBackend};

    fn setup() -> (RecordingBackend, GlContext) {
        let backend = RecordingBackend::new();
        let ctx = GlContext::new(backend.clone());
        (backend, ctx)
    }

    #[test]
    fn test_invalid_format_releases_handle() {
        let (backend, ctx) = setup();
        let err = Texture::new(&ctx, TextureDimension::D2, TextureFormat::float(4, 8)).unwrap_err();
        assert!(matches!(err, GlError::UnsupportedFormat(_)));
        assert_eq!(backend.count_calls(|c| matches!(c, GlCall::DeleteTexture(_))), 1);
        assert_eq!(backend.live_objects(), 0);
    }

    #[test]
    fn test_write_pixels_by_dimension() {
        let (backend, ctx) = setup();
        let format = TextureFormat::unorm(4, 8);

        let mut texture = Texture::new(&ctx, TextureDimension::D1, format).unwrap();
        texture.write_pixels(8, 1, 1, None);
        let mut volume = Texture::new(&ctx, TextureDimension::D3, format).unwrap();
        volume.write_pixels(4, 4, 4, Some(&[0; 256]));

        let calls = backend.calls();
        assert!(calls.contains(&GlCall::TexImage1D {
            target: TextureTarget::Texture1D,
            internal_format: gl::RGBA8,
            width: 8,
            pixel_format: gl::RGBA,
            component_type: gl::UNSIGNED_BYTE,
            with_data: false,
        }));
        assert!(calls.contains(&GlCall::TexImage3D {
            target: TextureTarget::Texture3D,
            internal_format: gl::RGBA8,
            width: 4,
            height: 4,
            depth: 4,
            pixel_format: gl::RGBA,
            component_type: gl::UNSIGNED_BYTE,
            with_data: true,
        }));
        assert_eq!(volume.depth(), 4);
    }

    #[test]
    fn test_new_2d_uploads_pixels() {
        let (backend, ctx) = setup();
        let texture =
            Texture::new_2d(&ctx, 2, 3, 3, ChannelFormat::U8, Some(&[0; 18]), true).unwrap();
        assert_eq!((texture.width(), texture.height(), texture.depth()), (2, 3, 1));
        assert!(backend.calls().contains(&GlCall::TexImage2D {
            target: TextureTarget::Texture2D,
            internal_format: gl::RGB8,
            width: 2,
            height: 3,
            pixel_format: gl::BGR,
            component_type: gl::UNSIGNED_BYTE,
            with_data: true,
        }));
    }

    #[test]
    fn test_depth_texture() {
        let (_backend, ctx) = setup();
        let texture =
            Texture::new_depth(&ctx, TextureDimension::D2, DepthFormat::DEPTH24_STENCIL8).unwrap();
        assert_eq!(
            texture.resolved_format(),
            ResolvedFormat {
                internal_format: gl::DEPTH24_STENCIL8,
                pixel_format: gl::DEPTH_STENCIL,
                component_type: gl::UNSIGNED_INT_24_8,
            }
        );
    }

    #[test]
    fn test_filter_mode_calls() {
        let (backend, ctx) = setup();
        let texture = Texture::new(&ctx, TextureDimension::D2, TextureFormat::unorm(4, 8)).unwrap();
        backend.take_calls();

        texture
            .set_filter_mode(FilterMode::Nearest, FilterMode::Linear, FilterMode::Nearest)
            .unwrap();

        assert_eq!(
            backend.calls(),
            vec![
                GlCall::BindTexture {
                    target: TextureTarget::Texture2D,
                    texture: Some(texture.handle()),
                },
                GlCall::TexParameter {
                    target: TextureTarget::Texture2D,
                    parameter: TextureParameter::MagFilter,
                    value: gl::NEAREST,
                },
                GlCall::TexParameter {
                    target: TextureTarget::Texture2D,
                    parameter: TextureParameter::MinFilter,
                    value: gl::LINEAR_MIPMAP_NEAREST,
                },
            ]
        );
    }

    #[test]
    fn test_disabled_filter_issues_no_calls() {
        let (backend, ctx) = setup();
        let texture = Texture::new(&ctx, TextureDimension::D2, TextureFormat::unorm(4, 8)).unwrap();
        backend.take_calls();
        assert!(texture
            .set_filter_mode(FilterMode::Disabled, FilterMode::Linear, FilterMode::Disabled)
            .is_err());
        assert!(texture
            .set_filter_mode(FilterMode::Linear, FilterMode::Disabled, FilterMode::Disabled)
            .is_err());
        assert!(backend.calls().is_empty());
    }

    #[test]
    fn test_edge_mode_with_border() {
        let (backend, ctx) = setup();
        let texture =
            Texture::new(&ctx, TextureDimension::D3, TextureFormat::float(4, 16)).unwrap();
        backend.take_calls();

        texture.set_edge_mode(EdgeMode::Border, Some([1.0, 0.0, 0.0, 1.0]));

        let calls = backend.calls();
        assert_eq!(calls.len(), 5);
        for (call, parameter) in calls[1..4].iter().zip([
            TextureParameter::WrapS,
            TextureParameter::WrapT,
            TextureParameter::WrapR,
        ]) {
            assert_eq!(
                *call,
                GlCall::TexParameter {
                    target: TextureTarget::Texture3D,
                    parameter,
                    value: gl::CLAMP_TO_BORDER,
                }
            );
        }
        assert_eq!(
            calls[4],
            GlCall::TexBorderColor {
                target: TextureTarget::Texture3D,
                color: [1.0, 0.0, 0.0, 1.0],
            }
        );
    }

    #[test]
    fn test_edge_mode_without_border() {
        let (backend, ctx) = setup();
        let texture = Texture::new(&ctx, TextureDimension::D2, TextureFormat::unorm(1, 8)).unwrap();
        backend.take_calls();
        texture.set_edge_mode(EdgeMode::Repeat, None);
        assert_eq!(backend.calls().len(), 4);
        assert_eq!(
            backend.count_calls(|c| matches!(c, GlCall::TexBorderColor { .. })),
            0
        );
    }

    #[test]
    fn test_mipmaps_and_bind() {
        let (backend, ctx) = setup();
        let texture = Texture::new(&ctx, TextureDimension::D2, TextureFormat::unorm(4, 8)).unwrap();
        backend.take_calls();

        texture.generate_mipmaps();
        texture.bind(5);

        let handle = Some(texture.handle());
        assert_eq!(
            backend.calls(),
            vec![
                GlCall::BindTexture {
                    target: TextureTarget::Texture2D,
                    texture: handle,
                },
                GlCall::GenerateMipmap(TextureTarget::Texture2D),
                GlCall::ActiveTexture(5),
                GlCall::BindTexture {
                    target: TextureTarget::Texture2D,
                    texture: handle,
                },
            ]
        );
    }
}
