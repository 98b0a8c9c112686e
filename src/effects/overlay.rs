//! Texture overlays, in screen space and projected onto world geometry.

use glam::Vec4;

use crate::effect::{EffectBase, EffectKind, EffectRequirements, PostEffect};
use crate::errors::Result;
use crate::graph::context::EffectContext;
use crate::graph::host::{BuiltinTexture, TextureHandle};
use crate::graph::stage::InjectionPoint;

// ─── Screen-Space Overlay ─────────────────────────────────────────────────────

/// How the overlay combines with the image.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[repr(i32)]
pub enum OverlayBlendMode {
    #[default]
    Normal = 0,
    Multiply = 1,
    Screen = 2,
    Overlay = 3,
}

/// Fullscreen texture overlay. Without a texture the overlay is plain
/// white, which turns the effect into a tint.
#[derive(Debug, Clone)]
pub struct TextureOverlay {
    pub base: EffectBase,
    pub injection_point: InjectionPoint,
    pub blend_mode: OverlayBlendMode,
    pub texture: Option<TextureHandle>,
    pub tint: Vec4,
}

impl Default for TextureOverlay {
    fn default() -> Self {
        Self {
            base: EffectBase::default(),
            injection_point: InjectionPoint::BeforePostProcessing,
            blend_mode: OverlayBlendMode::Normal,
            texture: None,
            tint: Vec4::ONE,
        }
    }
}

impl TextureOverlay {
    pub const KIND: EffectKind = EffectKind::new("texture_overlay");

    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl PostEffect for TextureOverlay {
    fn kind(&self) -> EffectKind {
        Self::KIND
    }

    fn shader_name(&self) -> &'static str {
        "Hidden/PostProcessing/TextureOverlay"
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

    fn apply_properties(&mut self, ctx: &mut EffectContext<'_>) -> Result<()> {
        let props = &mut ctx.material.properties;
        props.set_int("_BlendMode", self.blend_mode as i32);
        props.set_texture_or("_OverlayTexture", self.texture, BuiltinTexture::White);
        props.set_vector("_Tint", self.tint);
        Ok(())
    }
}

// ─── World-Space Overlays ─────────────────────────────────────────────────────

/// Parameters shared by the world-projected overlays.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WorldGrid {
    /// World units per texture repeat.
    pub grid_scale: f32,
    pub grid_texture: Option<TextureHandle>,
    /// Distance from the camera at which the overlay has faded out.
    pub range: f32,
}

impl Default for WorldGrid {
    fn default() -> Self {
        Self {
            grid_scale: 1.0,
            grid_texture: None,
            range: 10.0,
        }
    }
}

impl WorldGrid {
    fn apply(&self, ctx: &mut EffectContext<'_>) {
        let props = &mut ctx.material.properties;
        props.set_float("_GridScale", self.grid_scale);
        props.set_texture_or("_GridTex", self.grid_texture, BuiltinTexture::White);
        props.set_float("_Range", self.range);
    }
}

/// Texture projected onto opaque geometry in world space, drawn before
/// transparents so they cover it.
#[derive(Debug, Clone, Default)]
pub struct WorldSpaceTextureOverlay {
    pub base: EffectBase,
    pub grid: WorldGrid,
}

impl WorldSpaceTextureOverlay {
    pub const KIND: EffectKind = EffectKind::new("world_space_texture_overlay");

    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl PostEffect for WorldSpaceTextureOverlay {
    fn kind(&self) -> EffectKind {
        Self::KIND
    }

    fn shader_name(&self) -> &'static str {
        "Hidden/PostProcessing/WorldSpaceTextureOverlay"
    }

    fn injection_point(&self) -> InjectionPoint {
        InjectionPoint::BeforeTransparents
    }

    fn base(&self) -> &EffectBase {
        &self.base
    }

    fn base_mut(&mut self) -> &mut EffectBase {
        &mut self.base
    }

    fn requirements(&self) -> EffectRequirements {
        EffectRequirements::COLOR | EffectRequirements::DEPTH
    }

    fn apply_properties(&mut self, ctx: &mut EffectContext<'_>) -> Result<()> {
        self.grid.apply(ctx);
        Ok(())
    }
}

/// World-space 3D grid.
#[derive(Debug, Clone, Default)]
pub struct Grid3D {
    pub base: EffectBase,
    pub grid: WorldGrid,
}

impl Grid3D {
    pub const KIND: EffectKind = EffectKind::new("grid_3d");

    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl PostEffect for Grid3D {
    fn kind(&self) -> EffectKind {
        Self::KIND
    }

    fn shader_name(&self) -> &'static str {
        "Shader Graphs/Grid3D"
    }

    fn injection_point(&self) -> InjectionPoint {
        InjectionPoint::BeforeTransparents
    }

    fn base(&self) -> &EffectBase {
        &self.base
    }

    fn base_mut(&mut self) -> &mut EffectBase {
        &mut self.base
    }

    fn requirements(&self) -> EffectRequirements {
        EffectRequirements::COLOR | EffectRequirements::DEPTH
    }

    fn apply_properties(&mut self, ctx: &mut EffectContext<'_>) -> Result<()> {
        self.grid.apply(ctx);
        Ok(())
    }
}
