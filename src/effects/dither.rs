//! Ordered dithering with color depth reduction.

use crate::effect::parameter::{ClampedFloat, MinInt};
use crate::effect::{EffectBase, EffectKind, PostEffect};
use crate::errors::Result;
use crate::graph::context::EffectContext;
use crate::graph::host::{TextureAllocator, TextureDesc, TextureHandle};
use crate::graph::stage::InjectionPoint;

/// Upper bound of the automatic downscale search.
pub const MAX_DOWNSCALE: i32 = 16;

/// 4×4 Bayer threshold matrix used when no dither texture is set.
const DEFAULT_PATTERN: [u8; 16] = [
    0xB0, 0x70, 0x90, 0x50, //
    0x30, 0xF0, 0x10, 0xD0, //
    0x80, 0x40, 0xA0, 0x60, //
    0x00, 0xC0, 0x20, 0xE0,
];

/// A user supplied threshold texture.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DitherTexture {
    pub texture: TextureHandle,
    /// Width of the (square) threshold pattern in texels.
    pub size: u32,
}

/// Ordered dither effect.
#[derive(Debug, Clone)]
pub struct Dither {
    pub base: EffectBase,
    /// Threshold pattern; the built-in 4×4 pattern when `None`.
    pub dither_texture: Option<DitherTexture>,
    pub dither_scale: MinInt,
    pub color_bit_depth: MinInt,
    /// The pattern is scaled up until the image, divided by the scale, is no
    /// taller than this.
    pub vertical_resolution_limit: MinInt,
    pub gamma_correction: ClampedFloat,
    default_texture: Option<TextureHandle>,
}

impl Default for Dither {
    fn default() -> Self {
        Self {
            base: EffectBase::default(),
            dither_texture: None,
            dither_scale: MinInt::new(1, 1),
            color_bit_depth: MinInt::new(8, 1),
            vertical_resolution_limit: MinInt::new(1080, 1),
            gamma_correction: ClampedFloat::new(1.0, 0.0, 1.0),
            default_texture: None,
        }
    }
}

impl Dither {
    pub const KIND: EffectKind = EffectKind::new("dither");

    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Smallest scale, starting at `dither_scale`, that brings `height` under
    /// the vertical resolution limit. Never exceeds [`MAX_DOWNSCALE`] unless
    /// `dither_scale` itself does.
    #[must_use]
    pub fn downscale_for(&self, height: u32) -> i32 {
        let limit = i64::from(self.vertical_resolution_limit.get());
        let mut scale = self.dither_scale.get();
        while i64::from(height) / i64::from(scale) > limit && scale < MAX_DOWNSCALE {
            scale += 1;
        }
        scale
    }

    fn pattern_texture(&mut self, ctx: &mut EffectContext<'_>) -> Result<(TextureHandle, u32)> {
        if let Some(custom) = self.dither_texture {
            return Ok((custom.texture, custom.size));
        }
        if let Some(texture) = self.default_texture {
            return Ok((texture, 4));
        }

        // One RGBA texel per threshold, same value in every channel.
        let data: Vec<u8> = DEFAULT_PATTERN.iter().flat_map(|&v| [v, v, v, v]).collect();
        let desc = TextureDesc::new(
            4,
            4,
            wgpu::TextureFormat::Rgba8Unorm,
            wgpu::TextureUsages::TEXTURE_BINDING | wgpu::TextureUsages::COPY_DST,
        );
        let label = ctx.label("Pattern");
        let texture = ctx.builder.upload(&desc, &label, &data)?;
        self.default_texture = Some(texture);
        Ok((texture, 4))
    }
}

impl PostEffect for Dither {
    fn kind(&self) -> EffectKind {
        Self::KIND
    }

    fn shader_name(&self) -> &'static str {
        "Hidden/PostProcessing/Dither"
    }

    fn injection_point(&self) -> InjectionPoint {
        InjectionPoint::AfterPostProcessing
    }

    fn base(&self) -> &EffectBase {
        &self.base
    }

    fn base_mut(&mut self) -> &mut EffectBase {
        &mut self.base
    }

    fn apply_properties(&mut self, ctx: &mut EffectContext<'_>) -> Result<()> {
        let (texture, size) = self.pattern_texture(ctx)?;
        let downscale = self.downscale_for(ctx.camera.target_desc.height);

        let props = &mut ctx.material.properties;
        props.set_texture("_DitherTex", texture);
        props.set_float("_DitherTexSize", size as f32);
        props.set_float("_DownScale", downscale as f32);
        props.set_int("_ColorBitDepth", self.color_bit_depth.get());
        props.set_float("_GammaCorrection", self.gamma_correction.get());
        Ok(())
    }

    fn release(&mut self, allocator: &mut dyn TextureAllocator) {
        if let Some(texture) = self.default_texture.take() {
            allocator.release(texture);
        }
        self.base.reset_material();
    }
}
