//! Separable box blur and the edge bleed effect built on the same shader.

use crate::effect::parameter::ClampedFloat;
use crate::effect::{BLEND_PROPERTY, EffectBase, EffectKind, PostEffect, SubPassList};
use crate::errors::Result;
use crate::graph::context::EffectContext;
use crate::graph::stage::InjectionPoint;

const SHADER: &str = "Hidden/PostProcessing/BoxBlur";

const PASS_HORIZONTAL: u32 = 0;
const PASS_VERTICAL: u32 = 1;

// ─── Box Blur ─────────────────────────────────────────────────────────────────

/// Two-pass box blur. Each axis is a separate sub-pass, declared only when
/// its blur amount is positive.
#[derive(Debug, Clone)]
pub struct BoxBlur {
    pub base: EffectBase,
    pub injection_point: InjectionPoint,
    /// Horizontal blur in `[0, 0.1]` of the screen width.
    pub horizontal_blur: ClampedFloat,
    /// Vertical blur in `[0, 0.1]` of the screen height.
    pub vertical_blur: ClampedFloat,
}

impl Default for BoxBlur {
    fn default() -> Self {
        Self {
            base: EffectBase::default(),
            injection_point: InjectionPoint::AfterPostProcessing,
            horizontal_blur: ClampedFloat::new(0.0, 0.0, 0.1),
            vertical_blur: ClampedFloat::new(0.0, 0.0, 0.1),
        }
    }
}

impl BoxBlur {
    pub const KIND: EffectKind = EffectKind::new("box_blur");

    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl PostEffect for BoxBlur {
    fn kind(&self) -> EffectKind {
        Self::KIND
    }

    fn shader_name(&self) -> &'static str {
        SHADER
    }

    fn injection_point(&self) -> InjectionPoint {
        self.injection_point
    }

    fn base(&self) -> &EffectBase {
        &self.base
    }

    fn base_mut(&mut self) -> &mut EffectBase {
        &mut self.base
    }

    fn is_active(&self) -> bool {
        self.base.is_active(self.supports_blending())
            && (self.horizontal_blur.get() > 0.0 || self.vertical_blur.get() > 0.0)
    }

    fn add_passes(&self, passes: &mut SubPassList) {
        if self.horizontal_blur.get() > 0.0 {
            passes.push(PASS_HORIZONTAL);
        }
        if self.vertical_blur.get() > 0.0 {
            passes.push(PASS_VERTICAL);
        }
    }

    fn apply_properties(&mut self, ctx: &mut EffectContext<'_>) -> Result<()> {
        let props = &mut ctx.material.properties;
        props.set_float("_HorizontalBlur", self.horizontal_blur.get());
        props.set_float("_VerticalBlur", self.vertical_blur.get());
        Ok(())
    }
}

// ─── Edge Bleed ───────────────────────────────────────────────────────────────

/// Color bleeding along edges, as seen on analog video.
///
/// Runs the box blur shader with a negated blend weight, which makes the
/// shader add the blurred difference back instead of mixing towards it.
#[derive(Debug, Clone)]
pub struct EdgeBleed {
    pub base: EffectBase,
    /// Horizontal bleed in `[0, 0.03]`.
    pub horizontal_bleed: ClampedFloat,
    /// Vertical bleed in `[0, 0.03]`.
    pub vertical_bleed: ClampedFloat,
}

impl Default for EdgeBleed {
    fn default() -> Self {
        Self {
            base: EffectBase::default(),
            horizontal_bleed: ClampedFloat::new(0.0, 0.0, 0.03),
            vertical_bleed: ClampedFloat::new(0.0, 0.0, 0.03),
        }
    }
}

impl EdgeBleed {
    pub const KIND: EffectKind = EffectKind::new("edge_bleed");

    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl PostEffect for EdgeBleed {
    fn kind(&self) -> EffectKind {
        Self::KIND
    }

    fn shader_name(&self) -> &'static str {
        SHADER
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

    fn is_active(&self) -> bool {
        self.base.is_active(self.supports_blending())
            && (self.horizontal_bleed.get() > 0.0 || self.vertical_bleed.get() > 0.0)
    }

    fn add_passes(&self, passes: &mut SubPassList) {
        passes.push(PASS_HORIZONTAL);
        passes.push(PASS_VERTICAL);
    }

    fn apply_properties(&mut self, ctx: &mut EffectContext<'_>) -> Result<()> {
        let blend = self.base.blend();
        let props = &mut ctx.material.properties;
        props.set_float(BLEND_PROPERTY, -blend);
        props.set_float("_Intensity", blend);
        props.set_float("_HorizontalBlur", self.horizontal_bleed.get());
        props.set_float("_VerticalBlur", self.vertical_bleed.get());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn box_blur_needs_some_blur() {
        let mut blur = BoxBlur::new();
        blur.base.set_blend(1.0);
        assert!(!blur.is_active());
        blur.vertical_blur.set(0.05);
        assert!(blur.is_active());

        let mut passes = SubPassList::new();
        blur.add_passes(&mut passes);
        assert_eq!(passes.as_slice(), &[PASS_VERTICAL]);
    }

    #[test]
    fn blur_amounts_are_clamped() {
        let mut blur = BoxBlur::new();
        blur.horizontal_blur.set(1.0);
        assert!((blur.horizontal_blur.get() - 0.1).abs() < f32::EPSILON);
    }
}
