//! Screen-space outlines from depth, normal and color discontinuities.

use glam::Vec4;

use crate::effect::parameter::ClampedFloat;
use crate::effect::{EffectBase, EffectKind, EffectRequirements, PostEffect};
use crate::errors::Result;
use crate::graph::context::EffectContext;
use crate::graph::host::TextureHandle;
use crate::graph::stage::InjectionPoint;

const PASS_EDGE_DETECTION: u32 = 0;
const PASS_COMPOSITE: u32 = 1;

/// Largest line width the shader supports.
pub const MAX_LINE_WIDTH: i32 = 32;

/// Outline effect.
///
/// Needs the camera depth and normal buffers. Edge detection writes a
/// transient texture that the composite pass samples as
/// `_EdgeDetectionTexture`.
#[derive(Debug, Clone)]
pub struct Outline {
    pub base: EffectBase,
    /// Line width in pixels, clamped to `[1, 32]` when applied.
    pub line_width: i32,
    /// Distance at which outlines are fully faded.
    pub range: f32,
    /// Fraction of `range` where fading starts.
    pub range_fade_start: ClampedFloat,
    pub depth_threshold: ClampedFloat,
    pub normal_threshold: ClampedFloat,
    pub color_threshold: ClampedFloat,
    pub background_color: Vec4,
    pub line_color: Vec4,
    pub distortion: ClampedFloat,
}

impl Default for Outline {
    fn default() -> Self {
        Self {
            base: EffectBase::default(),
            line_width: 1,
            range: 25.0,
            range_fade_start: ClampedFloat::new(0.5, 0.0, 0.999),
            depth_threshold: ClampedFloat::new(0.01, 0.0, 0.1),
            normal_threshold: ClampedFloat::new(0.2, 0.0, 1.0),
            color_threshold: ClampedFloat::new(0.2, 0.0, 1.0),
            background_color: Vec4::ZERO,
            line_color: Vec4::new(0.0, 0.0, 0.0, 1.0),
            distortion: ClampedFloat::new(0.005, 0.0, 0.02),
        }
    }
}

impl Outline {
    pub const KIND: EffectKind = EffectKind::new("outline");

    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl PostEffect for Outline {
    fn kind(&self) -> EffectKind {
        Self::KIND
    }

    fn shader_name(&self) -> &'static str {
        "Hidden/PostProcessing/Outline"
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

    fn requirements(&self) -> EffectRequirements {
        EffectRequirements::COLOR | EffectRequirements::DEPTH | EffectRequirements::NORMAL
    }

    fn apply_properties(&mut self, ctx: &mut EffectContext<'_>) -> Result<()> {
        let props = &mut ctx.material.properties;
        props.set_float("_Range", self.range);
        props.set_float("_RangeFadeStart", self.range_fade_start.get());
        props.set_float("_DepthThreshold", self.depth_threshold.get());
        props.set_float("_NormalThreshold", self.normal_threshold.get());
        props.set_float("_ColorThreshold", self.color_threshold.get());
        props.set_vector("_BackgroundColor", self.background_color);
        props.set_vector("_LineColor", self.line_color);
        props.set_float("_Distortion", self.distortion.get());
        props.set_int("_LineWidth", self.line_width.clamp(1, MAX_LINE_WIDTH));
        Ok(())
    }

    fn render(
        &mut self,
        ctx: &mut EffectContext<'_>,
        source: TextureHandle,
        destination: TextureHandle,
        _pass_index: u32,
    ) -> Result<()> {
        let edge_desc = ctx
            .target_desc()
            .with_format(wgpu::TextureFormat::Rgba8Unorm)
            .with_usage(
                wgpu::TextureUsages::RENDER_ATTACHMENT | wgpu::TextureUsages::TEXTURE_BINDING,
            );
        let edges = ctx.create_transient(&edge_desc, "Edge Detection");

        ctx.material.properties.remove("_EdgeDetectionTexture");
        ctx.blit(source, edges, PASS_EDGE_DETECTION)?;
        ctx.material
            .properties
            .set_texture("_EdgeDetectionTexture", edges);
        ctx.blit(source, destination, PASS_COMPOSITE)
    }
}
