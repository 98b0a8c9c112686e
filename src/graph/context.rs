//! Recording Contexts
//!
//! - [`CameraFrame`]: per-camera, per-frame inputs supplied by the host.
//! - [`FrameContext`]: what the feature and the schedulers borrow from the host
//!   while recording one camera.
//! - [`EffectContext`]: what an effect sees while it sets up its material and
//!   declares its passes. The effect's material is moved into the context for
//!   the duration of the effect and handed back afterwards, so the effect can
//!   mutate both itself and its property block.
//!
//! # Field-Level Borrow Splitting
//!
//! Contexts hold individual references to host subsystems rather than one
//! host object, so the borrow checker can split borrows across `builder`,
//! `shaders` and `camera` within the same call.

use crate::effect::{EffectKind, Material, MaterialProperties};
use crate::errors::Result;
use crate::graph::host::{
    FrameGraphBuilder, PassDesc, ShaderHandle, ShaderLibrary, TextureDesc, TextureHandle,
};
use crate::graph::stage::InjectionPoint;

// ─── Camera Frame ─────────────────────────────────────────────────────────────

/// Per-camera inputs for one frame.
#[derive(Clone, Debug, PartialEq)]
pub struct CameraFrame {
    /// Stable camera identifier, used to key per-camera effect history.
    pub id: u64,
    /// The camera color target the chain starts from and writes back into.
    pub color_target: TextureHandle,
    /// Descriptor of `color_target`. Chain buffers match its size and format.
    pub target_desc: TextureDesc,
    /// The camera's own post-processing switch.
    pub post_processing_enabled: bool,
    /// Editor preview camera.
    pub is_preview: bool,
    /// Preview camera is in the post-processing debug view, which shows
    /// effects normally hidden from previews.
    pub debug_view_active: bool,
    /// Seconds since the previous frame of this camera.
    pub delta_time: f32,
    /// Discard temporal history (camera cut, first frame).
    pub reset_history: bool,
}

impl CameraFrame {
    #[must_use]
    pub fn new(id: u64, color_target: TextureHandle, target_desc: TextureDesc) -> Self {
        Self {
            id,
            color_target,
            target_desc,
            post_processing_enabled: true,
            is_preview: false,
            debug_view_active: false,
            delta_time: 1.0 / 60.0,
            reset_history: false,
        }
    }

    #[must_use]
    pub fn preview(mut self) -> Self {
        self.is_preview = true;
        self
    }

    #[must_use]
    pub fn with_post_processing(mut self, enabled: bool) -> Self {
        self.post_processing_enabled = enabled;
        self
    }

    #[must_use]
    pub fn with_debug_view(mut self, active: bool) -> Self {
        self.debug_view_active = active;
        self
    }

    #[must_use]
    pub fn with_delta_time(mut self, delta_time: f32) -> Self {
        self.delta_time = delta_time;
        self
    }
}

// ─── Frame Context ────────────────────────────────────────────────────────────

/// Host subsystems borrowed while recording one camera.
pub struct FrameContext<'a> {
    pub builder: &'a mut dyn FrameGraphBuilder,
    pub shaders: &'a mut dyn ShaderLibrary,
    pub camera: &'a CameraFrame,
}

impl<'a> FrameContext<'a> {
    pub fn new(
        builder: &'a mut dyn FrameGraphBuilder,
        shaders: &'a mut dyn ShaderLibrary,
        camera: &'a CameraFrame,
    ) -> Self {
        Self {
            builder,
            shaders,
            camera,
        }
    }
}

// ─── Effect Context ───────────────────────────────────────────────────────────

/// Context handed to effect setup and render callbacks.
pub struct EffectContext<'a> {
    pub builder: &'a mut dyn FrameGraphBuilder,
    pub shaders: &'a mut dyn ShaderLibrary,
    pub camera: &'a CameraFrame,
    pub point: InjectionPoint,
    /// The effect's material, lent for the duration of the effect.
    pub material: Material,
    kind: EffectKind,
    label_prefix: &'a str,
}

impl<'a> EffectContext<'a> {
    pub fn new(
        builder: &'a mut dyn FrameGraphBuilder,
        shaders: &'a mut dyn ShaderLibrary,
        camera: &'a CameraFrame,
        point: InjectionPoint,
        kind: EffectKind,
        material: Material,
        label_prefix: &'a str,
    ) -> Self {
        Self {
            builder,
            shaders,
            camera,
            point,
            material,
            kind,
            label_prefix,
        }
    }

    #[inline]
    #[must_use]
    pub fn kind(&self) -> EffectKind {
        self.kind
    }

    /// Descriptor of the camera color target.
    #[inline]
    #[must_use]
    pub fn target_desc(&self) -> TextureDesc {
        self.camera.target_desc
    }

    /// Debug label `"<prefix> <kind> <what>"`.
    #[must_use]
    pub fn label(&self, what: &str) -> String {
        format!("{} {} {}", self.label_prefix, self.kind, what)
    }

    /// Fullscreen blit with the effect's own shader and current properties.
    pub fn blit(
        &mut self,
        source: TextureHandle,
        destination: TextureHandle,
        pass_index: u32,
    ) -> Result<()> {
        let name = self.label(&format!("#{pass_index}"));
        self.builder.add_pass(PassDesc::blit(
            name,
            source,
            destination,
            self.material.shader,
            pass_index,
            self.material.properties.clone(),
        ))
    }

    /// Compute dispatch of `kernel` writing `target`.
    pub fn dispatch(
        &mut self,
        shader: ShaderHandle,
        kernel: &'static str,
        groups: [u32; 3],
        target: TextureHandle,
        properties: MaterialProperties,
    ) -> Result<()> {
        let name = self.label(kernel);
        self.builder.add_pass(PassDesc::dispatch(
            name, shader, kernel, groups, target, properties,
        ))
    }

    /// Plain copy between two textures.
    pub fn copy(&mut self, source: TextureHandle, destination: TextureHandle) -> Result<()> {
        let name = self.label("Copy");
        self.builder
            .add_pass(PassDesc::copy(name, source, destination))
    }

    /// A texture that lives for the current frame only.
    pub fn create_transient(&mut self, desc: &TextureDesc, what: &str) -> TextureHandle {
        let label = self.label(what);
        self.builder.create_transient(desc, &label)
    }

    /// Gives the material back to its effect.
    pub(crate) fn into_material(self) -> Material {
        self.material
    }
}
