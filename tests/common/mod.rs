//! Shared test host: a recording frame graph, a shader library with
//! configurable gaps, and a probe effect with scriptable behavior.

#![allow(dead_code)]

use std::collections::{HashMap, HashSet};

use myth_postfx::effect::SubPassList;
use myth_postfx::graph::scheduler::chain_links;
use myth_postfx::graph::{
    EffectContext, FrameContext, FrameReport, OrderingTable, PassCommand, PassScheduler,
    PostProcessFeature, ShaderHandle,
};
use myth_postfx::settings::PING_PONG_USAGE;
use myth_postfx::{
    CameraFrame, ChainReport, EffectBase, EffectKind, EffectRequirements, EffectStack, FrameGraphBuilder,
    InjectionPoint, PassDesc, PostEffect, PostFxError, PostFxSettings, Result, ShaderLibrary, TextureAllocator,
    TextureDesc, TextureHandle,
};

pub const CAMERA_TARGET: TextureHandle = TextureHandle(9_999);

pub fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

// ============================================================================
// Recording Host
// ============================================================================

#[derive(Default)]
pub struct RecordingHost {
    next_handle: u64,
    /// Persistent textures currently alive.
    pub live: Vec<TextureHandle>,
    /// Every persistent allocation, in order.
    pub allocations: Vec<(TextureHandle, TextureDesc, String)>,
    pub uploads: Vec<(TextureHandle, Vec<u8>)>,
    pub released: Vec<TextureHandle>,
    pub transients: Vec<(TextureHandle, TextureDesc, String)>,
    pub passes: Vec<PassDesc>,
    pub inputs: Vec<(InjectionPoint, EffectRequirements)>,
    pub fail_allocations: bool,
}

impl RecordingHost {
    pub fn new() -> Self {
        Self {
            next_handle: 1,
            ..Self::default()
        }
    }

    fn next(&mut self) -> TextureHandle {
        let handle = TextureHandle(self.next_handle);
        self.next_handle += 1;
        handle
    }

    /// Forgets everything recorded for the previous frame, keeping live textures.
    pub fn begin_frame(&mut self) {
        self.passes.clear();
        self.inputs.clear();
        self.transients.clear();
        self.allocations.clear();
        self.released.clear();
    }

    pub fn blits(&self) -> Vec<&PassDesc> {
        self.passes
            .iter()
            .filter(|pass| matches!(pass.command, PassCommand::Blit { .. }))
            .collect()
    }

    pub fn copies(&self) -> Vec<&PassDesc> {
        self.passes
            .iter()
            .filter(|pass| matches!(pass.command, PassCommand::Copy))
            .collect()
    }

    pub fn dispatches(&self) -> Vec<&PassDesc> {
        self.passes
            .iter()
            .filter(|pass| matches!(pass.command, PassCommand::Dispatch { .. }))
            .collect()
    }

    /// `(first read, write)` of every declared pass.
    pub fn links(&self) -> Vec<(TextureHandle, TextureHandle)> {
        chain_links(&self.passes)
    }

    pub fn blit_pass_indices(&self) -> Vec<u32> {
        self.passes
            .iter()
            .filter_map(|pass| match &pass.command {
                PassCommand::Blit { pass_index, .. } => Some(*pass_index),
                _ => None,
            })
            .collect()
    }
}

impl TextureAllocator for RecordingHost {
    fn allocate(&mut self, desc: &TextureDesc, label: &str) -> Result<TextureHandle> {
        if self.fail_allocations {
            return Err(PostFxError::Allocation {
                label: label.to_owned(),
                reason: "test host out of memory".to_owned(),
            });
        }
        let handle = self.next();
        self.live.push(handle);
        self.allocations.push((handle, *desc, label.to_owned()));
        Ok(handle)
    }

    fn upload(&mut self, desc: &TextureDesc, label: &str, data: &[u8]) -> Result<TextureHandle> {
        let handle = self.allocate(desc, label)?;
        self.uploads.push((handle, data.to_vec()));
        Ok(handle)
    }

    fn release(&mut self, handle: TextureHandle) {
        self.live.retain(|live| *live != handle);
        self.released.push(handle);
    }
}

impl FrameGraphBuilder for RecordingHost {
    fn create_transient(&mut self, desc: &TextureDesc, label: &str) -> TextureHandle {
        let handle = self.next();
        self.transients.push((handle, *desc, label.to_owned()));
        handle
    }

    fn add_pass(&mut self, pass: PassDesc) -> Result<()> {
        assert!(
            !pass.reads.contains(&pass.write),
            "pass '{}' reads and writes {:?}",
            pass.name,
            pass.write
        );
        self.passes.push(pass);
        Ok(())
    }

    fn configure_input(&mut self, point: InjectionPoint, requirements: EffectRequirements) {
        self.inputs.push((point, requirements));
    }
}

// ============================================================================
// Shader Library
// ============================================================================

#[derive(Default)]
pub struct TestShaders {
    handles: HashMap<String, ShaderHandle>,
    pub missing: HashSet<String>,
    pub lookups: Vec<String>,
}

impl TestShaders {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn without(mut self, name: &str) -> Self {
        self.missing.insert(name.to_owned());
        self
    }

    pub fn lookups_of(&self, name: &str) -> usize {
        self.lookups.iter().filter(|lookup| *lookup == name).count()
    }
}

impl ShaderLibrary for TestShaders {
    fn find(&mut self, name: &str) -> Option<ShaderHandle> {
        self.lookups.push(name.to_owned());
        if self.missing.contains(name) {
            return None;
        }
        let next = ShaderHandle(self.handles.len() as u64 + 1);
        Some(*self.handles.entry(name.to_owned()).or_insert(next))
    }
}

// ============================================================================
// Cameras
// ============================================================================

pub fn target_desc(width: u32, height: u32) -> TextureDesc {
    TextureDesc::new(width, height, wgpu::TextureFormat::Rgba16Float, PING_PONG_USAGE)
}

pub fn camera() -> CameraFrame {
    CameraFrame::new(1, CAMERA_TARGET, target_desc(1920, 1080))
}

// ============================================================================
// Probe Effect
// ============================================================================

/// Scriptable effect used to observe the scheduler.
pub struct Probe {
    pub base: EffectBase,
    pub kind: EffectKind,
    pub point: InjectionPoint,
    pub passes: Vec<u32>,
    pub fail_pass: Option<u32>,
    pub fail_setup: bool,
    pub requirements: EffectRequirements,
    pub shader: &'static str,
    pub visible_in_preview: bool,
    pub ignore_flag: bool,
    pub rendered: Vec<u32>,
    pub released: bool,
}

impl Probe {
    pub fn new(kind: &'static str) -> Self {
        Self {
            base: EffectBase::with_blend(1.0),
            kind: EffectKind::new(kind),
            point: InjectionPoint::AfterPostProcessing,
            passes: vec![0],
            fail_pass: None,
            fail_setup: false,
            requirements: EffectRequirements::COLOR,
            shader: "Hidden/Probe",
            visible_in_preview: true,
            ignore_flag: false,
            rendered: Vec::new(),
            released: false,
        }
    }

    pub fn at(mut self, point: InjectionPoint) -> Self {
        self.point = point;
        self
    }

    pub fn with_passes(mut self, passes: &[u32]) -> Self {
        self.passes = passes.to_vec();
        self
    }

    pub fn failing_at(mut self, pass: u32) -> Self {
        self.fail_pass = Some(pass);
        self
    }

    pub fn requiring(mut self, requirements: EffectRequirements) -> Self {
        self.requirements = requirements;
        self
    }

    pub fn with_blend(mut self, blend: f32) -> Self {
        self.base.set_blend(blend);
        self
    }

    pub fn with_shader(mut self, shader: &'static str) -> Self {
        self.shader = shader;
        self
    }

    pub fn hidden_in_preview(mut self) -> Self {
        self.visible_in_preview = false;
        self
    }
}

impl PostEffect for Probe {
    fn kind(&self) -> EffectKind {
        self.kind
    }

    fn shader_name(&self) -> &'static str {
        self.shader
    }

    fn injection_point(&self) -> InjectionPoint {
        self.point
    }

    fn base(&self) -> &EffectBase {
        &self.base
    }

    fn base_mut(&mut self) -> &mut EffectBase {
        &mut self.base
    }

    fn ignore_post_processing_flag(&self) -> bool {
        self.ignore_flag
    }

    fn visible_in_scene_view(&self) -> bool {
        self.visible_in_preview
    }

    fn requirements(&self) -> EffectRequirements {
        self.requirements
    }

    fn add_passes(&self, passes: &mut SubPassList) {
        passes.extend_from_slice(&self.passes);
    }

    fn apply_properties(&mut self, _ctx: &mut EffectContext<'_>) -> Result<()> {
        if self.fail_setup {
            return Err(PostFxError::InvalidEffect {
                kind: self.kind.as_str(),
                reason: "scripted setup failure".to_owned(),
            });
        }
        Ok(())
    }

    fn render(
        &mut self,
        ctx: &mut EffectContext<'_>,
        source: TextureHandle,
        destination: TextureHandle,
        pass_index: u32,
    ) -> Result<()> {
        if self.fail_pass == Some(pass_index) {
            return Err(PostFxError::InvalidEffect {
                kind: self.kind.as_str(),
                reason: format!("scripted failure in pass {pass_index}"),
            });
        }
        self.rendered.push(pass_index);
        ctx.blit(source, destination, pass_index)
    }

    fn release(&mut self, _allocator: &mut dyn TextureAllocator) {
        self.released = true;
        self.base.reset_material();
    }
}

// ============================================================================
// Effect Stacks
// ============================================================================

/// A stack whose host is never available.
pub struct UnavailableStack;

impl EffectStack for UnavailableStack {
    fn effects(&mut self) -> Result<&mut [Box<dyn PostEffect>]> {
        Err(PostFxError::HostUnavailable("scene not loaded".to_owned()))
    }
}

// ============================================================================
// Frame Drivers
// ============================================================================

/// Runs one frame of `feature` against a fresh pass list.
pub fn run_frame<S: EffectStack>(
    feature: &mut PostProcessFeature<S>,
    host: &mut RecordingHost,
    shaders: &mut TestShaders,
    camera: &CameraFrame,
) -> FrameReport {
    host.begin_frame();
    let mut frame = FrameContext::new(host, shaders, camera);
    feature.render_frame(&mut frame)
}

/// Runs one scheduler over `stack` against a fresh pass list.
pub fn run_chain(
    scheduler: &mut PassScheduler,
    stack: &mut dyn EffectStack,
    table: &mut OrderingTable,
    host: &mut RecordingHost,
    shaders: &mut TestShaders,
    camera: &CameraFrame,
    settings: &PostFxSettings,
) -> ChainReport {
    host.begin_frame();
    let effects = stack.effects().expect("test stack is available");
    let mut frame = FrameContext::new(host, shaders, camera);
    scheduler.record(effects, table, &mut frame, settings)
}
