//! Pass Scheduler
//!
//! One [`PassScheduler`] runs the chain of one injection point. Each frame it:
//!
//! 1. **Filters** the candidate effects down to the ones that render for this
//!    camera, resolving each effect's shader on first use.
//! 2. **Orders** them by their rank in the [`OrderingTable`].
//! 3. **Unions** their buffer requirements and hands them to the host.
//! 4. **Chains** their sub-passes through the ping-pong buffers.
//! 5. **Finalizes** by copying the chain result back into the camera target.
//!
//! # Ordering Cache
//!
//! Sorting is not done per frame. The scheduler keeps a list of every kind it
//! has seen, sorted by rank, together with the table version it was sorted
//! against. The list is re-sorted only when the version changes or a new kind
//! shows up; otherwise ordering is a linear walk over the cached list that
//! emits each kind's bucket of active effects. The sort is stable, so kinds
//! of equal rank keep the order in which they were first encountered.
//!
//! ```text
//!  camera ──► [fx0 #0] ──► A ──► [fx1 #0] ──► B ──► [fx1 #1] ──► A ──copy──► camera
//! ```
//!
//! # Failure Isolation
//!
//! A failing effect never takes the chain down with it. If setup or any
//! sub-pass returns an error, the error is logged, the remaining sub-passes
//! of that effect are skipped, the current source stays what it was before
//! the failing sub-pass, and the next effect continues from there.

use rustc_hash::{FxHashMap, FxHashSet};
use smallvec::SmallVec;

use crate::effect::{
    BLEND_PROPERTY, EffectKind, EffectRequirements, MaterialStatus, PostEffect, SubPassList,
    should_render,
};
use crate::graph::context::{EffectContext, FrameContext};
use crate::graph::host::{PassDesc, TextureAllocator, TextureHandle};
use crate::graph::ordering::OrderingTable;
use crate::graph::ping_pong::PingPongBuffers;
use crate::graph::stage::InjectionPoint;
use crate::settings::{PING_PONG_USAGE, PostFxSettings};

// ─── Chain Report ─────────────────────────────────────────────────────────────

/// What one scheduler recorded for one frame.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChainReport {
    pub point: InjectionPoint,
    /// Rendered effects, in chain order.
    pub effects: Vec<EffectKind>,
    /// Successfully declared sub-passes.
    pub sub_passes: usize,
    /// Effects whose setup or render callback failed.
    pub failed: Vec<EffectKind>,
    /// Union of the rendered effects' requirements (empty when idle).
    pub requirements: EffectRequirements,
    /// Whether the final copy into the camera target was declared.
    pub copied_to_target: bool,
    /// Whether the cached order was re-sorted this frame.
    pub resorted: bool,
    /// Shaders whose material was created this frame.
    pub instantiated_shaders: Vec<&'static str>,
}

impl ChainReport {
    #[must_use]
    pub fn idle(point: InjectionPoint) -> Self {
        Self {
            point,
            effects: Vec::new(),
            sub_passes: 0,
            failed: Vec::new(),
            requirements: EffectRequirements::empty(),
            copied_to_target: false,
            resorted: false,
            instantiated_shaders: Vec::new(),
        }
    }

    /// Returns `true` when nothing was declared.
    #[must_use]
    pub fn is_idle(&self) -> bool {
        self.effects.is_empty()
    }
}

// ─── Scheduler ────────────────────────────────────────────────────────────────

/// Chain scheduler of one injection point.
pub struct PassScheduler {
    point: InjectionPoint,
    buffers: PingPongBuffers,

    // Ordering cache
    sorted_kinds: Vec<EffectKind>,
    known_kinds: FxHashSet<EffectKind>,
    sorted_version: Option<u64>,

    // Per-frame scratch, reused across frames
    active: Vec<usize>,
    ordered: Vec<usize>,
    buckets: FxHashMap<EffectKind, SmallVec<[usize; 2]>>,
    passes: SubPassList,
}

impl PassScheduler {
    #[must_use]
    pub fn new(point: InjectionPoint, settings: &PostFxSettings) -> Self {
        Self {
            point,
            buffers: PingPongBuffers::new(&settings.label(point.name())),
            sorted_kinds: Vec::new(),
            known_kinds: FxHashSet::default(),
            sorted_version: None,
            active: Vec::new(),
            ordered: Vec::new(),
            buckets: FxHashMap::default(),
            passes: SubPassList::new(),
        }
    }

    #[inline]
    #[must_use]
    pub fn point(&self) -> InjectionPoint {
        self.point
    }

    #[must_use]
    pub fn buffers(&self) -> &PingPongBuffers {
        &self.buffers
    }

    /// The cached kind order (every kind seen so far, by rank).
    #[must_use]
    pub fn cached_order(&self) -> &[EffectKind] {
        &self.sorted_kinds
    }

    /// Records the chain for every effect in `pool` at this injection point.
    pub fn record(
        &mut self,
        pool: &mut [Box<dyn PostEffect>],
        ordering: &mut OrderingTable,
        frame: &mut FrameContext<'_>,
        settings: &PostFxSettings,
    ) -> ChainReport {
        let candidates: Vec<usize> = pool
            .iter()
            .enumerate()
            .filter(|(_, effect)| effect.injection_point() == self.point)
            .map(|(index, _)| index)
            .collect();
        self.record_candidates(pool, &candidates, ordering, frame, settings)
    }

    /// Records the chain for the effects of `pool` at the given indices.
    pub fn record_candidates(
        &mut self,
        pool: &mut [Box<dyn PostEffect>],
        candidates: &[usize],
        ordering: &mut OrderingTable,
        frame: &mut FrameContext<'_>,
        settings: &PostFxSettings,
    ) -> ChainReport {
        let mut report = ChainReport::idle(self.point);

        self.filter(pool, candidates, frame, &mut report);
        if self.active.is_empty() {
            return report;
        }

        self.order(pool, ordering, settings, &mut report);

        let requirements = self.ordered.iter().fold(EffectRequirements::COLOR, |acc, &index| {
            acc | pool[index].requirements()
        });
        report.requirements = requirements;
        report.effects = self.ordered.iter().map(|&index| pool[index].kind()).collect();
        frame.builder.configure_input(self.point, requirements);

        self.execute(pool, frame, settings, &mut report);
        report
    }

    /// Releases the ping-pong buffers.
    pub fn release(&mut self, allocator: &mut dyn TextureAllocator) {
        self.buffers.release(allocator);
    }

    // ─── Steps ────────────────────────────────────────────────────────────────

    fn filter(
        &mut self,
        pool: &mut [Box<dyn PostEffect>],
        candidates: &[usize],
        frame: &mut FrameContext<'_>,
        report: &mut ChainReport,
    ) {
        self.active.clear();
        for &index in candidates {
            let Some(effect) = pool.get_mut(index) else {
                continue;
            };
            if effect.injection_point() != self.point || !should_render(&**effect, frame.camera) {
                continue;
            }

            let shader_name = effect.shader_name();
            let kind = effect.kind();
            match effect
                .base_mut()
                .ensure_material(shader_name, kind, &mut *frame.shaders)
            {
                MaterialStatus::Ready => {}
                MaterialStatus::Created => report.instantiated_shaders.push(shader_name),
                MaterialStatus::Missing => continue,
            }
            self.active.push(index);
        }
    }

    fn order(
        &mut self,
        pool: &[Box<dyn PostEffect>],
        ordering: &mut OrderingTable,
        settings: &PostFxSettings,
        report: &mut ChainReport,
    ) {
        let mut new_kind = false;
        for &index in &self.active {
            let kind = pool[index].kind();
            if settings.auto_register_effects && ordering.add_if_missing(kind) {
                log::debug!(
                    "Registered '{kind}' in {} ordering",
                    self.point.name()
                );
            }
            if self.known_kinds.insert(kind) {
                self.sorted_kinds.push(kind);
                new_kind = true;
            }
        }

        if new_kind || self.sorted_version != Some(ordering.version()) {
            let table: &OrderingTable = ordering;
            self.sorted_kinds.sort_by_key(|kind| table.position(*kind));
            self.sorted_version = Some(table.version());
            report.resorted = true;
            log::debug!(
                "Re-sorted {} chain: {:?}",
                self.point.name(),
                self.sorted_kinds
            );
        }

        self.buckets.values_mut().for_each(SmallVec::clear);
        for &index in &self.active {
            self.buckets.entry(pool[index].kind()).or_default().push(index);
        }
        self.ordered.clear();
        for kind in &self.sorted_kinds {
            if let Some(bucket) = self.buckets.get(kind) {
                self.ordered.extend_from_slice(bucket);
            }
        }
    }

    fn execute(
        &mut self,
        pool: &mut [Box<dyn PostEffect>],
        frame: &mut FrameContext<'_>,
        settings: &PostFxSettings,
        report: &mut ChainReport,
    ) {
        let camera = frame.camera;
        let desc = camera.target_desc.with_usage(PING_PONG_USAGE);
        let target = camera.color_target;
        let mut source = target;
        // Buffers are allocated on the first declared sub-pass.
        let mut buffers_ready = false;

        for &index in &self.ordered {
            let effect = &mut pool[index];
            let kind = effect.kind();
            let Some(material) = effect.base_mut().take_material() else {
                continue;
            };

            let mut ctx = EffectContext::new(
                &mut *frame.builder,
                &mut *frame.shaders,
                camera,
                self.point,
                kind,
                material,
                &settings.label_prefix,
            );
            ctx.material
                .properties
                .set_float(BLEND_PROPERTY, effect.base().blend());

            if let Err(err) = effect.apply_properties(&mut ctx) {
                log::error!("Effect '{kind}' failed to set up its material: {err}");
                report.failed.push(kind);
                effect.base_mut().restore_material(ctx.into_material());
                continue;
            }

            self.passes.clear();
            effect.add_passes(&mut self.passes);
            if self.passes.is_empty() {
                log::warn!("Effect '{kind}' is active but declares no sub-passes");
            } else if !buffers_ready {
                if let Err(err) = self.buffers.ensure(&mut *ctx.builder, &desc) {
                    log::error!(
                        "Failed to allocate {} chain buffers: {err}",
                        self.point.name()
                    );
                    effect.base_mut().restore_material(ctx.into_material());
                    return;
                }
                buffers_ready = true;
            }

            for &pass_index in &self.passes {
                let Some(destination) = self.buffers.destination_for(source) else {
                    break;
                };
                match effect.render(&mut ctx, source, destination, pass_index) {
                    Ok(()) => {
                        source = destination;
                        report.sub_passes += 1;
                    }
                    Err(err) => {
                        log::error!(
                            "Effect '{kind}' failed in sub-pass {pass_index}, skipping its remaining sub-passes: {err}"
                        );
                        report.failed.push(kind);
                        break;
                    }
                }
            }

            effect.base_mut().restore_material(ctx.into_material());
        }

        if report.sub_passes > 0 && source != target {
            let name = settings.label(&format!("{} Final Copy", self.point.name()));
            match frame.builder.add_pass(PassDesc::copy(name, source, target)) {
                Ok(()) => report.copied_to_target = true,
                Err(err) => log::error!(
                    "Failed to copy {} chain result into the camera target: {err}",
                    self.point.name()
                ),
            }
        }
    }
}

/// Returns the read/write pairs of a chain in declaration order.
///
/// Convenience for hosts and tests that inspect declared passes.
#[must_use]
pub fn chain_links(passes: &[PassDesc]) -> Vec<(TextureHandle, TextureHandle)> {
    passes
        .iter()
        .filter_map(|pass| pass.reads.first().map(|read| (*read, pass.write)))
        .collect()
}
