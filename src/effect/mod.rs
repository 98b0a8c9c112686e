//! Effect Contract
//!
//! Every post-processing effect implements [`PostEffect`]. The trait mirrors
//! the render-node split of the host renderer:
//!
//! - **Query** (`kind`, `injection_point`, `is_active`, `requirements`):
//!   consulted by the scheduler while filtering and ordering the chain.
//! - **Setup** (`apply_properties`, `add_passes`): writes the material
//!   property block and declares the sub-passes for this frame.
//! - **Render** (`render`): declares the passes of one sub-pass into the
//!   host frame graph.
//!
//! Shared state (enable flag, blend weight, lazily created material) lives in
//! [`EffectBase`], which every effect embeds.

pub mod material;
pub mod parameter;
pub mod registry;

use std::fmt;

use bitflags::bitflags;
use smallvec::SmallVec;

use crate::errors::Result;
use crate::graph::context::{CameraFrame, EffectContext};
use crate::graph::host::{AsAny, ShaderLibrary, TextureAllocator, TextureHandle};
use crate::graph::stage::InjectionPoint;

pub use material::{Material, MaterialProperties, MaterialStatus, MaterialValue};
use material::MaterialSlot;
use parameter::ClampedFloat;

/// Sub-pass indices declared by an effect for one frame.
pub type SubPassList = SmallVec<[u32; 8]>;

/// Property written with the effect blend weight before `apply_properties`.
pub const BLEND_PROPERTY: &str = "_Blend";

// ─── Identity ─────────────────────────────────────────────────────────────────

/// Stable identity tag of an effect type.
///
/// Kinds are persisted in ordering tables, so the tag must never change once
/// shipped. Valid tags are non-empty and made of ASCII lowercase letters,
/// digits and `_ . : -`.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Debug)]
pub struct EffectKind(&'static str);

impl EffectKind {
    #[must_use]
    pub const fn new(tag: &'static str) -> Self {
        Self(tag)
    }

    #[inline]
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        self.0
    }

    /// Returns `true` if `tag` is a well-formed identity string.
    #[must_use]
    pub fn is_valid_tag(tag: &str) -> bool {
        !tag.is_empty()
            && tag.bytes().all(|b| {
                b.is_ascii_lowercase() || b.is_ascii_digit() || matches!(b, b'_' | b'.' | b':' | b'-')
            })
    }
}

impl fmt::Display for EffectKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.0)
    }
}

bitflags! {
    /// Camera buffers an effect needs from the host.
    #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default)]
    pub struct EffectRequirements: u32 {
        const COLOR  = 1 << 0;
        const DEPTH  = 1 << 1;
        const NORMAL = 1 << 2;
        const MOTION = 1 << 3;
    }
}

// ─── Shared State ─────────────────────────────────────────────────────────────

/// State shared by every effect.
#[derive(Debug, Clone, PartialEq)]
pub struct EffectBase {
    enabled: bool,
    blend: ClampedFloat,
    material: MaterialSlot,
}

impl Default for EffectBase {
    fn default() -> Self {
        Self {
            enabled: true,
            blend: ClampedFloat::new(0.0, 0.0, 1.0),
            material: MaterialSlot::default(),
        }
    }
}

impl EffectBase {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Base state with an initial blend weight.
    #[must_use]
    pub fn with_blend(blend: f32) -> Self {
        let mut base = Self::default();
        base.set_blend(blend);
        base
    }

    #[inline]
    #[must_use]
    pub fn enabled(&self) -> bool {
        self.enabled
    }

    /// Enables or disables the effect. Disabling drops the material.
    pub fn set_enabled(&mut self, enabled: bool) {
        if self.enabled && !enabled {
            self.material.reset();
        }
        self.enabled = enabled;
    }

    #[inline]
    #[must_use]
    pub fn blend(&self) -> f32 {
        self.blend.get()
    }

    /// Sets the blend weight, clamped into `[0, 1]`.
    #[inline]
    pub fn set_blend(&mut self, blend: f32) {
        self.blend.set(blend);
    }

    /// Generic activity test: enabled, and a positive blend weight when the
    /// effect blends with its input.
    #[inline]
    #[must_use]
    pub fn is_active(&self, supports_blending: bool) -> bool {
        self.enabled && (!supports_blending || self.blend.get() > 0.0)
    }

    /// The material, if it has been created.
    #[must_use]
    pub fn material(&self) -> Option<&Material> {
        self.material.material()
    }

    /// Returns `true` once shader resolution has failed for this instance.
    #[must_use]
    pub fn is_shader_missing(&self) -> bool {
        self.material.is_missing()
    }

    /// Drops the material; the shader is resolved again on next use.
    pub fn reset_material(&mut self) {
        self.material.reset();
    }

    pub(crate) fn ensure_material(
        &mut self,
        shader_name: &str,
        owner: EffectKind,
        shaders: &mut dyn ShaderLibrary,
    ) -> MaterialStatus {
        self.material.ensure(shader_name, owner.as_str(), shaders)
    }

    pub(crate) fn take_material(&mut self) -> Option<Material> {
        self.material.take()
    }

    pub(crate) fn restore_material(&mut self, material: Material) {
        self.material.restore(material);
    }
}

// ─── Effect Trait ─────────────────────────────────────────────────────────────

/// A post-processing effect.
///
/// Implementors embed an [`EffectBase`] and expose it through `base` /
/// `base_mut`; everything else has a default that matches a single-pass
/// fullscreen effect.
pub trait PostEffect: AsAny {
    /// Stable identity of the effect type.
    fn kind(&self) -> EffectKind;

    /// Name of the shader resolved through the host [`ShaderLibrary`].
    fn shader_name(&self) -> &'static str;

    fn injection_point(&self) -> InjectionPoint;

    fn base(&self) -> &EffectBase;

    fn base_mut(&mut self) -> &mut EffectBase;

    /// Whether the effect interpolates with its input by `blend`.
    ///
    /// Effects that do not blend are active whenever they are enabled.
    fn supports_blending(&self) -> bool {
        true
    }

    /// Render even when the camera has post-processing turned off.
    fn ignore_post_processing_flag(&self) -> bool {
        false
    }

    /// Render on editor preview cameras.
    fn visible_in_scene_view(&self) -> bool {
        true
    }

    fn requirements(&self) -> EffectRequirements {
        EffectRequirements::COLOR
    }

    /// Whether the effect contributes to the image this frame.
    ///
    /// Overrides must keep the base test and may only narrow it.
    fn is_active(&self) -> bool {
        self.base().is_active(self.supports_blending())
    }

    /// Declares this frame's sub-pass indices. Each index becomes one step of
    /// the ping-pong chain.
    fn add_passes(&self, passes: &mut SubPassList) {
        passes.push(0);
    }

    /// Writes effect parameters into `ctx.material.properties`.
    ///
    /// Called once per frame before any sub-pass, after the blend weight has
    /// been written to `_Blend`.
    fn apply_properties(&mut self, _ctx: &mut EffectContext<'_>) -> Result<()> {
        Ok(())
    }

    /// Declares the passes of one sub-pass, reading `source` and writing
    /// `destination`.
    fn render(
        &mut self,
        ctx: &mut EffectContext<'_>,
        source: TextureHandle,
        destination: TextureHandle,
        pass_index: u32,
    ) -> Result<()> {
        ctx.blit(source, destination, pass_index)
    }

    /// Drops the material so the shader is resolved again on next use.
    fn reset_material(&mut self) {
        self.base_mut().reset_material();
    }

    /// Releases everything the effect owns: its material and any persistent
    /// textures.
    fn release(&mut self, _allocator: &mut dyn TextureAllocator) {
        self.base_mut().reset_material();
    }

    /// Convenience forwarding to [`EffectBase::set_blend`].
    fn set_blend(&mut self, blend: f32) {
        self.base_mut().set_blend(blend);
    }

    /// Convenience forwarding to [`EffectBase::set_enabled`].
    fn set_enabled(&mut self, enabled: bool) {
        self.base_mut().set_enabled(enabled);
    }
}

/// Full visibility test for one camera: activity, the camera's
/// post-processing switch and preview-camera visibility.
#[must_use]
pub fn should_render(effect: &dyn PostEffect, camera: &CameraFrame) -> bool {
    effect.is_active()
        && (effect.ignore_post_processing_flag() || camera.post_processing_enabled)
        && (!camera.is_preview || effect.visible_in_scene_view() || camera.debug_view_active)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blend_is_clamped() {
        let mut base = EffectBase::with_blend(3.0);
        assert_eq!(base.blend(), 1.0);
        base.set_blend(-1.0);
        assert_eq!(base.blend(), 0.0);
    }

    #[test]
    fn blend_gates_activity_only_when_blending() {
        let mut base = EffectBase::new();
        assert!(!base.is_active(true));
        assert!(base.is_active(false));
        base.set_blend(0.0001);
        assert!(base.is_active(true));
        base.set_enabled(false);
        assert!(!base.is_active(true));
        assert!(!base.is_active(false));
    }

    #[test]
    fn tag_validation() {
        assert!(EffectKind::is_valid_tag("gaussian_blur"));
        assert!(EffectKind::is_valid_tag("studio.grid-3d"));
        assert!(!EffectKind::is_valid_tag(""));
        assert!(!EffectKind::is_valid_tag("Gaussian Blur"));
    }
}
