//! Block compression artifacts (DCT quantization).

use crate::effect::parameter::{ClampedFloat, ClampedInt};
use crate::effect::{EffectBase, EffectKind, PostEffect, SubPassList};
use crate::errors::Result;
use crate::graph::context::EffectContext;
use crate::graph::host::TextureHandle;
use crate::graph::stage::InjectionPoint;

const PASS_DCT: u32 = 0;
const PASS_COMPRESS: u32 = 1;

/// Simulates lossy block compression.
///
/// The single chain step first transforms the source into an HDR scratch
/// texture (`_DCTTexture`), then quantizes and reconstructs it into the
/// destination.
#[derive(Debug, Clone)]
pub struct Compression {
    pub base: EffectBase,
    pub frequency: ClampedInt,
    pub levels: i32,
    pub block_size: ClampedInt,
    pub compression_gamma: ClampedFloat,
}

impl Default for Compression {
    fn default() -> Self {
        Self {
            base: EffectBase::default(),
            frequency: ClampedInt::new(8, 2, 16),
            levels: 10,
            block_size: ClampedInt::new(8, 2, 32),
            compression_gamma: ClampedFloat::new(1.0, 0.01, 5.0),
        }
    }
}

impl Compression {
    pub const KIND: EffectKind = EffectKind::new("compression");

    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl PostEffect for Compression {
    fn kind(&self) -> EffectKind {
        Self::KIND
    }

    fn shader_name(&self) -> &'static str {
        "Hidden/PostProcessing/Compression"
    }

    fn injection_point(&self) -> InjectionPoint {
        InjectionPoint::AfterRendering
    }

    fn base(&self) -> &EffectBase {
        &self.base
    }

    fn base_mut(&mut self) -> &mut EffectBase {
        &mut self.base
    }

    fn add_passes(&self, passes: &mut SubPassList) {
        passes.push(PASS_COMPRESS);
    }

    fn apply_properties(&mut self, ctx: &mut EffectContext<'_>) -> Result<()> {
        let props = &mut ctx.material.properties;
        props.set_float("_Frequency", self.frequency.get() as f32);
        props.set_float("_Levels", self.levels as f32);
        props.set_int("_BlockSize", self.block_size.get());
        props.set_float("_DCTGamma", self.compression_gamma.get());
        Ok(())
    }

    fn render(
        &mut self,
        ctx: &mut EffectContext<'_>,
        source: TextureHandle,
        destination: TextureHandle,
        pass_index: u32,
    ) -> Result<()> {
        let dct_desc = ctx
            .target_desc()
            .with_format(wgpu::TextureFormat::Rgba16Float)
            .with_usage(
                wgpu::TextureUsages::RENDER_ATTACHMENT | wgpu::TextureUsages::TEXTURE_BINDING,
            );
        let dct = ctx.create_transient(&dct_desc, "DCT");

        ctx.material.properties.remove("_DCTTexture");
        ctx.blit(source, dct, PASS_DCT)?;
        ctx.material.properties.set_texture("_DCTTexture", dct);
        ctx.blit(source, destination, pass_index)
    }
}
