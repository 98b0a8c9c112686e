//! Histogram-based auto exposure.
//!
//! Each frame the camera color is reduced to a 128-bin log-luminance
//! histogram, a compute kernel turns the histogram into an exposure value
//! stored in a 1×1 texture, and a fullscreen pass applies it.
//!
//! Exposure adapts over time, so the value is kept per camera in a pair of
//! 1×1 textures used as a ping-pong: each frame reads the previous exposure
//! and writes the next one. The first frame of a camera (or any frame with
//! `reset_history`) uses the fixed kernel and seeds both textures, so
//! adaptation never starts from black.

use glam::{Vec2, Vec4};
use rustc_hash::FxHashMap;

use crate::effect::parameter::ClampedFloat;
use crate::effect::{EffectBase, EffectKind, MaterialProperties, PostEffect, SubPassList};
use crate::errors::{PostFxError, Result};
use crate::graph::context::EffectContext;
use crate::graph::host::{ShaderHandle, TextureAllocator, TextureDesc, TextureHandle};
use crate::graph::ping_pong::ScratchTexture;
use crate::graph::stage::InjectionPoint;

pub const HISTOGRAM_SHADER: &str = "Hidden/PostProcessing/ExposureHistogram";
pub const EXPOSURE_SHADER: &str = "Hidden/PostProcessing/AutoExposure";

pub const KERNEL_HISTOGRAM_CLEAR: &str = "KEyeHistogramClear";
pub const KERNEL_HISTOGRAM: &str = "KEyeHistogram";
pub const KERNEL_FIXED: &str = "KAutoExposureAvgLuminance_fixed";
pub const KERNEL_PROGRESSIVE: &str = "KAutoExposureAvgLuminance_progressive";

// ─── Log Histogram ────────────────────────────────────────────────────────────

/// Number of histogram bins. Must match the histogram compute shader.
pub const HISTOGRAM_BINS: u32 = 128;
/// Luminance range covered by the histogram, in EV.
pub const HISTOGRAM_RANGE_EV: (f32, f32) = (-9.0, 9.0);

const HISTOGRAM_THREADS: [u32; 2] = [16, 16];

/// Per-camera luminance histogram storage.
#[derive(Debug, Clone)]
pub struct LogHistogram {
    data: ScratchTexture,
}

impl LogHistogram {
    fn new(camera: u64) -> Self {
        Self {
            data: ScratchTexture::new(format!("AutoExposure Histogram {camera}")),
        }
    }

    /// `(scale, offset, width, height)` mapping log luminance into `[0, 1]`.
    #[must_use]
    pub fn scale_offset_res(desc: &TextureDesc) -> Vec4 {
        let (min_ev, max_ev) = HISTOGRAM_RANGE_EV;
        let scale = 1.0 / (max_ev - min_ev);
        let offset = -min_ev * scale;
        Vec4::new(scale, offset, desc.width as f32, desc.height as f32)
    }

    /// Clears the histogram and accumulates `source` into it.
    fn generate(
        &mut self,
        ctx: &mut EffectContext<'_>,
        shader: ShaderHandle,
        source: TextureHandle,
    ) -> Result<TextureHandle> {
        let desc = TextureDesc::new(
            HISTOGRAM_BINS,
            1,
            wgpu::TextureFormat::R32Uint,
            wgpu::TextureUsages::STORAGE_BINDING | wgpu::TextureUsages::TEXTURE_BINDING,
        );
        let histogram = self.data.ensure(&mut *ctx.builder, &desc)?;

        let mut clear = MaterialProperties::new();
        clear.set_texture("_HistogramBuffer", histogram);
        ctx.dispatch(
            shader,
            KERNEL_HISTOGRAM_CLEAR,
            [HISTOGRAM_BINS.div_ceil(HISTOGRAM_THREADS[0]), 1, 1],
            histogram,
            clear,
        )?;

        let target = ctx.target_desc();
        let mut accumulate = MaterialProperties::new();
        accumulate.set_texture("_HistogramBuffer", histogram);
        accumulate.set_texture("_Source", source);
        accumulate.set_vector("_ScaleOffsetRes", Self::scale_offset_res(&target));
        let groups = [
            (target.width / 2).max(1).div_ceil(HISTOGRAM_THREADS[0]),
            (target.height / 2).max(1).div_ceil(HISTOGRAM_THREADS[1]),
            1,
        ];
        ctx.dispatch(shader, KERNEL_HISTOGRAM, groups, histogram, accumulate)?;
        Ok(histogram)
    }

    fn release(&mut self, allocator: &mut dyn TextureAllocator) {
        self.data.release(allocator);
    }
}

// ─── Per-Camera State ─────────────────────────────────────────────────────────

#[derive(Debug, Clone)]
struct CameraExposure {
    histogram: LogHistogram,
    exposure: [ScratchTexture; 2],
    ping_pong: usize,
    frame_number: u64,
}

impl CameraExposure {
    fn new(camera: u64) -> Self {
        Self {
            histogram: LogHistogram::new(camera),
            exposure: [
                ScratchTexture::new(format!("AutoExposure {camera} A")),
                ScratchTexture::new(format!("AutoExposure {camera} B")),
            ],
            ping_pong: 0,
            frame_number: 0,
        }
    }

    fn release(&mut self, allocator: &mut dyn TextureAllocator) {
        self.histogram.release(allocator);
        for texture in &mut self.exposure {
            texture.release(allocator);
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
enum ComputeShaders {
    #[default]
    Unresolved,
    Ready {
        histogram: ShaderHandle,
        exposure: ShaderHandle,
    },
    Missing,
}

// ─── Auto Exposure ────────────────────────────────────────────────────────────

/// How exposure follows scene luminance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum EyeAdaptation {
    /// Adapt gradually with `speed_up` / `speed_down`.
    #[default]
    Progressive,
    /// Jump to the target exposure every frame.
    Fixed,
}

/// Auto exposure effect.
#[derive(Debug, Clone)]
pub struct AutoExposure {
    pub base: EffectBase,
    /// Lower and upper histogram percentiles averaged for the exposure.
    pub filtering: Vec2,
    /// Minimum average luminance in EV, `[-9, 9]`.
    pub min_luminance: ClampedFloat,
    /// Maximum average luminance in EV, `[-9, 9]`.
    pub max_luminance: ClampedFloat,
    /// Exposure bias (middle-grey key).
    pub key_value: f32,
    pub adaptation: EyeAdaptation,
    /// Adaptation speed from dark to light.
    pub speed_up: f32,
    /// Adaptation speed from light to dark.
    pub speed_down: f32,
    compute: ComputeShaders,
    cameras: FxHashMap<u64, CameraExposure>,
}

impl Default for AutoExposure {
    fn default() -> Self {
        Self {
            base: EffectBase::default(),
            filtering: Vec2::new(50.0, 95.0),
            min_luminance: ClampedFloat::new(0.0, -9.0, 9.0),
            max_luminance: ClampedFloat::new(0.0, -9.0, 9.0),
            key_value: 1.0,
            adaptation: EyeAdaptation::Progressive,
            speed_up: 2.0,
            speed_down: 1.0,
            compute: ComputeShaders::Unresolved,
            cameras: FxHashMap::default(),
        }
    }
}

impl AutoExposure {
    pub const KIND: EffectKind = EffectKind::new("auto_exposure");

    /// Minimum gap between the low and high percentiles.
    const MIN_PERCENT_DELTA: f32 = 1e-2;

    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Percentiles clamped to `1 <= low < high <= 99`.
    #[must_use]
    pub fn clamped_filtering(&self) -> (f32, f32) {
        let high = self.filtering.y.clamp(1.0 + Self::MIN_PERCENT_DELTA, 99.0);
        let low = self.filtering.x.clamp(1.0, high - Self::MIN_PERCENT_DELTA);
        (low, high)
    }

    /// `(min, max)` luminance, swapped if given in the wrong order.
    #[must_use]
    pub fn luminance_range(&self) -> (f32, f32) {
        let a = self.min_luminance.get();
        let b = self.max_luminance.get();
        (a.min(b), a.max(b))
    }

    /// Number of cameras with exposure history.
    #[must_use]
    pub fn tracked_cameras(&self) -> usize {
        self.cameras.len()
    }

    /// Drops the exposure history of one camera.
    pub fn release_camera(&mut self, camera: u64, allocator: &mut dyn TextureAllocator) {
        if let Some(mut data) = self.cameras.remove(&camera) {
            data.release(allocator);
        }
    }

    fn resolve_compute(&mut self, ctx: &mut EffectContext<'_>) -> Result<(ShaderHandle, ShaderHandle)> {
        match self.compute {
            ComputeShaders::Ready { histogram, exposure } => Ok((histogram, exposure)),
            ComputeShaders::Missing => Err(PostFxError::ShaderNotFound(EXPOSURE_SHADER.to_owned())),
            ComputeShaders::Unresolved => {
                let histogram = ctx.shaders.find(HISTOGRAM_SHADER);
                let exposure = ctx.shaders.find(EXPOSURE_SHADER);
                if let (Some(histogram), Some(exposure)) = (histogram, exposure) {
                    self.compute = ComputeShaders::Ready { histogram, exposure };
                    Ok((histogram, exposure))
                } else {
                    let missing = if histogram.is_none() {
                        HISTOGRAM_SHADER
                    } else {
                        EXPOSURE_SHADER
                    };
                    log::error!("Auto exposure disabled: compute shader '{missing}' not found");
                    self.compute = ComputeShaders::Missing;
                    Err(PostFxError::ShaderNotFound(missing.to_owned()))
                }
            }
        }
    }
}

impl PostEffect for AutoExposure {
    fn kind(&self) -> EffectKind {
        Self::KIND
    }

    fn shader_name(&self) -> &'static str {
        "Hidden/PostProcessing/AutoExposureBlit"
    }

    fn injection_point(&self) -> InjectionPoint {
        InjectionPoint::BeforePostProcessing
    }

    fn base(&self) -> &EffectBase {
        &self.base
    }

    fn base_mut(&mut self) -> &mut EffectBase {
        &mut self.base
    }

    fn is_active(&self) -> bool {
        self.base.is_active(self.supports_blending()) && self.compute != ComputeShaders::Missing
    }

    fn add_passes(&self, passes: &mut SubPassList) {
        if matches!(self.compute, ComputeShaders::Ready { .. }) {
            passes.push(0);
        }
    }

    fn apply_properties(&mut self, ctx: &mut EffectContext<'_>) -> Result<()> {
        self.resolve_compute(ctx).map(|_| ())
    }

    fn render(
        &mut self,
        ctx: &mut EffectContext<'_>,
        source: TextureHandle,
        destination: TextureHandle,
        pass_index: u32,
    ) -> Result<()> {
        let (histogram_shader, exposure_shader) = self.resolve_compute(ctx)?;
        let (low, high) = self.clamped_filtering();
        let (min_lum, max_lum) = self.luminance_range();
        let params1 = Vec4::new(low * 0.01, high * 0.01, min_lum.exp2(), max_lum.exp2());
        let params2 = Vec4::new(self.speed_down, self.speed_up, self.key_value, ctx.camera.delta_time);
        let fixed_adaptation = self.adaptation == EyeAdaptation::Fixed;

        let camera = ctx.camera.id;
        let data = self
            .cameras
            .entry(camera)
            .or_insert_with(|| CameraExposure::new(camera));

        let histogram = data.histogram.generate(ctx, histogram_shader, source)?;

        let exposure_desc = TextureDesc::new(
            1,
            1,
            wgpu::TextureFormat::R32Float,
            wgpu::TextureUsages::STORAGE_BINDING
                | wgpu::TextureUsages::TEXTURE_BINDING
                | wgpu::TextureUsages::COPY_SRC
                | wgpu::TextureUsages::COPY_DST,
        );
        let textures = [
            data.exposure[0].ensure(&mut *ctx.builder, &exposure_desc)?,
            data.exposure[1].ensure(&mut *ctx.builder, &exposure_desc)?,
        ];

        let first_frame = ctx.camera.reset_history || data.frame_number == 0;
        let kernel = if first_frame || fixed_adaptation {
            KERNEL_FIXED
        } else {
            KERNEL_PROGRESSIVE
        };

        let mut props = MaterialProperties::new();
        props.set_texture("_HistogramBuffer", histogram);
        props.set_vector("_Params1", params1);
        props.set_vector("_Params2", params2);
        props.set_vector("_ScaleOffsetRes", LogHistogram::scale_offset_res(&ctx.target_desc()));

        let current = if first_frame {
            let [first, second] = textures;
            ctx.dispatch(exposure_shader, kernel, [1, 1, 1], first, props)?;
            ctx.copy(first, second)?;
            data.ping_pong = 0;
            first
        } else {
            let read = textures[(data.ping_pong + 1) % 2];
            let write = textures[data.ping_pong % 2];
            props.set_texture("_Source", read);
            ctx.dispatch(exposure_shader, kernel, [1, 1, 1], write, props)?;
            data.ping_pong = (data.ping_pong + 1) % 2;
            write
        };
        data.frame_number += 1;

        ctx.material
            .properties
            .set_texture("_AutoExposureTex", current);
        ctx.blit(source, destination, pass_index)
    }

    fn reset_material(&mut self) {
        self.base.reset_material();
        if self.compute == ComputeShaders::Missing {
            self.compute = ComputeShaders::Unresolved;
        }
    }

    fn release(&mut self, allocator: &mut dyn TextureAllocator) {
        for data in self.cameras.values_mut() {
            data.release(allocator);
        }
        self.cameras.clear();
        self.compute = ComputeShaders::Unresolved;
        self.base.reset_material();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn filtering_is_clamped() {
        let mut exposure = AutoExposure::new();
        exposure.filtering = Vec2::new(120.0, 150.0);
        let (low, high) = exposure.clamped_filtering();
        assert!((high - 99.0).abs() < 1e-6);
        assert!((low - (99.0 - 0.01)).abs() < 1e-4);

        exposure.filtering = Vec2::new(0.0, 0.0);
        let (low, high) = exposure.clamped_filtering();
        assert!((high - 1.01).abs() < 1e-6);
        assert!((low - 1.0).abs() < 1e-6);
    }

    #[test]
    fn luminance_range_is_ordered() {
        let mut exposure = AutoExposure::new();
        exposure.min_luminance.set(3.0);
        exposure.max_luminance.set(-2.0);
        assert_eq!(exposure.luminance_range(), (-2.0, 3.0));
    }

    #[test]
    fn histogram_covers_eighteen_stops() {
        let desc = TextureDesc::new(
            64,
            32,
            wgpu::TextureFormat::Rgba16Float,
            wgpu::TextureUsages::TEXTURE_BINDING,
        );
        let sor = LogHistogram::scale_offset_res(&desc);
        assert!((sor.x - 1.0 / 18.0).abs() < 1e-6);
        assert!((sor.y - 0.5).abs() < 1e-6);
        assert_eq!((sor.z, sor.w), (64.0, 32.0));
    }
}
