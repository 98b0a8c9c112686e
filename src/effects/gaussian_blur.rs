//! Downsampled multi-iteration gaussian blur.

use glam::Vec4;

use crate::effect::parameter::ClampedInt;
use crate::effect::{EffectBase, EffectKind, PostEffect};
use crate::errors::Result;
use crate::graph::context::EffectContext;
use crate::graph::host::{TextureAllocator, TextureHandle};
use crate::graph::ping_pong::ScratchTexture;
use crate::graph::stage::InjectionPoint;

/// Kernel variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BlurMode {
    #[default]
    Standard,
    /// Variant tuned for mobile GPUs.
    Sgx,
}

/// Shader pass indices.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u32)]
pub enum BlurPass {
    Downsample = 0,
    BlurVertical = 1,
    BlurHorizontal = 2,
    BlurVerticalSgx = 3,
    BlurHorizontalSgx = 4,
    FinalBlit = 5,
}

/// Gaussian blur at reduced resolution.
///
/// The chain step downsamples the source into an effect-owned scratch pair,
/// runs `blur_iterations` vertical/horizontal rounds between them and
/// composites the result into the destination. The scratch pair persists
/// across frames and is reallocated when the camera size or the downsample
/// factor changes.
#[derive(Debug, Clone)]
pub struct GaussianBlur {
    pub base: EffectBase,
    pub mode: BlurMode,
    /// Resolution shift, `[0, 8]`.
    pub downsample: ClampedInt,
    /// `[1, 16]` blur rounds.
    pub blur_iterations: ClampedInt,
    pub blur_size: f32,
    scratch: [ScratchTexture; 2],
}

impl Default for GaussianBlur {
    fn default() -> Self {
        Self {
            base: EffectBase::default(),
            mode: BlurMode::Standard,
            downsample: ClampedInt::new(1, 0, 8),
            blur_iterations: ClampedInt::new(1, 1, 16),
            blur_size: 3.0,
            scratch: [
                ScratchTexture::new("GaussianBlur Downsample A"),
                ScratchTexture::new("GaussianBlur Downsample B"),
            ],
        }
    }
}

impl GaussianBlur {
    pub const KIND: EffectKind = EffectKind::new("gaussian_blur");

    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// `_Parameter` vector of one blur round.
    #[must_use]
    pub fn round_parameter(&self, iteration: u32) -> Vec4 {
        let width_mod = 1.0 / (1u32 << self.downsample.get()) as f32;
        let offset = iteration as f32;
        let size = self.blur_size * width_mod;
        Vec4::new(size + offset, -size - offset, self.base.blend(), 0.0)
    }

    fn passes(&self) -> (u32, u32) {
        match self.mode {
            BlurMode::Standard => (BlurPass::BlurVertical as u32, BlurPass::BlurHorizontal as u32),
            BlurMode::Sgx => (
                BlurPass::BlurVerticalSgx as u32,
                BlurPass::BlurHorizontalSgx as u32,
            ),
        }
    }

    /// Handles of the scratch pair, if allocated.
    #[must_use]
    pub fn scratch_handles(&self) -> Option<[TextureHandle; 2]> {
        Some([self.scratch[0].handle()?, self.scratch[1].handle()?])
    }
}

impl PostEffect for GaussianBlur {
    fn kind(&self) -> EffectKind {
        Self::KIND
    }

    fn shader_name(&self) -> &'static str {
        "Hidden/PostProcessing/GaussianBlur"
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

    fn visible_in_scene_view(&self) -> bool {
        false
    }

    fn render(
        &mut self,
        ctx: &mut EffectContext<'_>,
        source: TextureHandle,
        destination: TextureHandle,
        _pass_index: u32,
    ) -> Result<()> {
        let shift = self.downsample.get().unsigned_abs();
        let scratch_desc = ctx.target_desc().downsampled(shift).with_usage(
            wgpu::TextureUsages::RENDER_ATTACHMENT | wgpu::TextureUsages::TEXTURE_BINDING,
        );
        let a = self.scratch[0].ensure(&mut *ctx.builder, &scratch_desc)?;
        let b = self.scratch[1].ensure(&mut *ctx.builder, &scratch_desc)?;

        ctx.material.properties.set_texture("_SourceTexture", source);
        ctx.blit(source, a, BlurPass::Downsample as u32)?;

        let (vertical, horizontal) = self.passes();
        for iteration in 0..self.blur_iterations.get().unsigned_abs() {
            let parameter = self.round_parameter(iteration);
            ctx.material.properties.set_vector("_Parameter", parameter);
            ctx.blit(a, b, vertical)?;
            ctx.blit(b, a, horizontal)?;
        }

        ctx.blit(a, destination, BlurPass::FinalBlit as u32)?;
        ctx.material.properties.set_vector("_Parameter", Vec4::ZERO);
        Ok(())
    }

    fn release(&mut self, allocator: &mut dyn TextureAllocator) {
        for scratch in &mut self.scratch {
            scratch.release(allocator);
        }
        self.base.reset_material();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_parameter_widens_per_iteration() {
        let mut blur = GaussianBlur::new();
        blur.base.set_blend(0.5);
        blur.downsample.set(1);
        let first = blur.round_parameter(0);
        let second = blur.round_parameter(1);
        assert!((first.x - 1.5).abs() < 1e-6);
        assert!((first.y + 1.5).abs() < 1e-6);
        assert!((second.x - 2.5).abs() < 1e-6);
        assert!((first.z - 0.5).abs() < 1e-6);
    }

    #[test]
    fn hidden_from_previews() {
        assert!(!GaussianBlur::new().visible_in_scene_view());
    }
}
