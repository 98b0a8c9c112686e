//! Single-pass color effects.

use std::sync::atomic::{AtomicU32, Ordering};

use crate::effect::parameter::{ClampedFloat, MinInt};
use crate::effect::{EffectBase, EffectKind, PostEffect};
use crate::errors::Result;
use crate::graph::context::EffectContext;
use crate::graph::stage::InjectionPoint;

// ─── Invert Colors ────────────────────────────────────────────────────────────

/// Inverts the image, blended by `blend`.
#[derive(Debug, Clone, Default)]
pub struct InvertColors {
    pub base: EffectBase,
}

impl InvertColors {
    pub const KIND: EffectKind = EffectKind::new("invert_colors");

    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl PostEffect for InvertColors {
    fn kind(&self) -> EffectKind {
        Self::KIND
    }

    fn shader_name(&self) -> &'static str {
        "Hidden/PostProcessing/InvertColors"
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
}

// ─── Brightness & Gamma ───────────────────────────────────────────────────────

// f32 bit patterns of the process-wide user preferences (1.0).
static GLOBAL_BRIGHTNESS: AtomicU32 = AtomicU32::new(0x3F80_0000);
static GLOBAL_GAMMA: AtomicU32 = AtomicU32::new(0x3F80_0000);

/// Brightness and gamma adjustment.
///
/// By default the values come from the process-wide user preferences set
/// with [`BrightnessGamma::set_global_preferences`] (typically a settings
/// menu), so every stack that contains this effect follows them.
#[derive(Debug, Clone)]
pub struct BrightnessGamma {
    pub base: EffectBase,
    pub use_global_preferences: bool,
    /// Local brightness in `[-1, 1]`.
    pub brightness: ClampedFloat,
    /// Local gamma in `[0.01, 2]`.
    pub gamma: ClampedFloat,
}

impl Default for BrightnessGamma {
    fn default() -> Self {
        Self {
            base: EffectBase::default(),
            use_global_preferences: true,
            brightness: ClampedFloat::new(1.0, -1.0, 1.0),
            gamma: ClampedFloat::new(1.0, 0.01, 2.0),
        }
    }
}

impl BrightnessGamma {
    pub const KIND: EffectKind = EffectKind::new("brightness_gamma");

    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_global_preferences(brightness: f32, gamma: f32) {
        GLOBAL_BRIGHTNESS.store(brightness.to_bits(), Ordering::Relaxed);
        GLOBAL_GAMMA.store(gamma.to_bits(), Ordering::Relaxed);
    }

    /// `(brightness, gamma)` user preferences.
    #[must_use]
    pub fn global_preferences() -> (f32, f32) {
        (
            f32::from_bits(GLOBAL_BRIGHTNESS.load(Ordering::Relaxed)),
            f32::from_bits(GLOBAL_GAMMA.load(Ordering::Relaxed)),
        )
    }

    /// The `(brightness, gamma)` pair this effect renders with.
    #[must_use]
    pub fn effective_values(&self) -> (f32, f32) {
        if self.use_global_preferences {
            Self::global_preferences()
        } else {
            (self.brightness.get(), self.gamma.get())
        }
    }
}

impl PostEffect for BrightnessGamma {
    fn kind(&self) -> EffectKind {
        Self::KIND
    }

    fn shader_name(&self) -> &'static str {
        "Hidden/PostProcessing/BrightnessGamma"
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
        let (brightness, gamma) = self.effective_values();
        let props = &mut ctx.material.properties;
        props.set_float("_Brightness", brightness);
        props.set_float("_Gamma", gamma);
        Ok(())
    }
}

// ─── Pixelate ─────────────────────────────────────────────────────────────────

/// Nearest-neighbour downscale to a fixed vertical resolution.
///
/// Pixelation does not blend: it is active whenever it is enabled.
#[derive(Debug, Clone)]
pub struct Pixelate {
    pub base: EffectBase,
    pub vertical_resolution: MinInt,
}

impl Default for Pixelate {
    fn default() -> Self {
        Self {
            base: EffectBase::default(),
            vertical_resolution: MinInt::new(1080, 1),
        }
    }
}

impl Pixelate {
    pub const KIND: EffectKind = EffectKind::new("pixelate");

    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl PostEffect for Pixelate {
    fn kind(&self) -> EffectKind {
        Self::KIND
    }

    fn shader_name(&self) -> &'static str {
        "Hidden/PostProcessing/Pixelate"
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

    fn supports_blending(&self) -> bool {
        false
    }

    fn apply_properties(&mut self, ctx: &mut EffectContext<'_>) -> Result<()> {
        ctx.material
            .properties
            .set_int("_VertResolution", self.vertical_resolution.get());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn local_values_override_preferences() {
        let mut effect = BrightnessGamma::new();
        effect.use_global_preferences = false;
        effect.brightness.set(0.25);
        effect.gamma.set(5.0);
        assert_eq!(effect.effective_values(), (0.25, 2.0));
    }

    #[test]
    fn pixelate_ignores_blend() {
        let effect = Pixelate::new();
        assert_eq!(effect.base.blend(), 0.0);
        assert!(effect.is_active());
    }
}
