//! Post-Processing Feature
//!
//! [`PostProcessFeature`] plugs the effect stack into the host frame. It owns
//! one [`PassScheduler`] per injection point and drives them against the
//! host's effect configuration:
//!
//! ```text
//! on_frame_begin ──► bucket effects by injection point
//! register       ──► enqueue the five chains in timeline order
//! record(point)  ──► scheduler(point).record_candidates(...)
//! ```
//!
//! The effect stack is queried once per frame. If it cannot be queried, the
//! frame renders no post-processing rather than failing.

use crate::effect::PostEffect;
use crate::graph::context::FrameContext;
use crate::graph::host::{EffectStack, PassQueue, ScheduledPass, TextureAllocator};
use crate::graph::ordering::EffectOrdering;
use crate::graph::scheduler::{ChainReport, PassScheduler};
use crate::graph::shader_refs::ShaderReferences;
use crate::graph::stage::InjectionPoint;
use crate::settings::PostFxSettings;

/// Reports of all five chains of one frame, in timeline order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FrameReport {
    pub chains: Vec<ChainReport>,
}

impl FrameReport {
    #[must_use]
    pub fn chain(&self, point: InjectionPoint) -> Option<&ChainReport> {
        self.chains.iter().find(|chain| chain.point == point)
    }

    /// Total sub-passes declared across all chains.
    #[must_use]
    pub fn sub_passes(&self) -> usize {
        self.chains.iter().map(|chain| chain.sub_passes).sum()
    }

    /// Returns `true` when no chain declared anything.
    #[must_use]
    pub fn is_idle(&self) -> bool {
        self.chains.iter().all(ChainReport::is_idle)
    }
}

/// Post-processing orchestrator over an injected effect stack.
pub struct PostProcessFeature<S: EffectStack> {
    stack: S,
    ordering: EffectOrdering,
    settings: PostFxSettings,
    schedulers: [PassScheduler; InjectionPoint::COUNT],
    shader_refs: ShaderReferences,

    // Frame pool: effect indices bucketed by injection point
    buckets: [Vec<usize>; InjectionPoint::COUNT],
    pool_len: Option<usize>,
}

impl<S: EffectStack> PostProcessFeature<S> {
    pub fn new(stack: S, ordering: EffectOrdering, settings: PostFxSettings) -> Self {
        let schedulers = InjectionPoint::ALL.map(|point| PassScheduler::new(point, &settings));
        Self {
            stack,
            ordering,
            settings,
            schedulers,
            shader_refs: ShaderReferences::default(),
            buckets: Default::default(),
            pool_len: None,
        }
    }

    // ─── Accessors ────────────────────────────────────────────────────────────

    #[must_use]
    pub fn stack(&self) -> &S {
        &self.stack
    }

    pub fn stack_mut(&mut self) -> &mut S {
        &mut self.stack
    }

    #[must_use]
    pub fn ordering(&self) -> &EffectOrdering {
        &self.ordering
    }

    /// Mutable ordering tables. Edit between frames, not during recording.
    pub fn ordering_mut(&mut self) -> &mut EffectOrdering {
        &mut self.ordering
    }

    #[must_use]
    pub fn settings(&self) -> &PostFxSettings {
        &self.settings
    }

    #[must_use]
    pub fn shader_references(&self) -> &ShaderReferences {
        &self.shader_refs
    }

    pub fn shader_references_mut(&mut self) -> &mut ShaderReferences {
        &mut self.shader_refs
    }

    #[must_use]
    pub fn scheduler(&self, point: InjectionPoint) -> &PassScheduler {
        &self.schedulers[point.index()]
    }

    // ─── Frame ────────────────────────────────────────────────────────────────

    /// Queries the effect stack and buckets its effects by injection point.
    ///
    /// Returns the number of effects in this frame's pool. A failed query
    /// yields an empty pool.
    pub fn on_frame_begin(&mut self) -> usize {
        for bucket in &mut self.buckets {
            bucket.clear();
        }
        self.pool_len = None;

        let effects = match self.stack.effects() {
            Ok(effects) => effects,
            Err(err) => {
                log::warn!("Effect stack unavailable, skipping post-processing this frame: {err}");
                return 0;
            }
        };

        for (index, effect) in effects.iter().enumerate() {
            self.buckets[effect.injection_point().index()].push(index);
        }
        self.pool_len = Some(effects.len());
        effects.len()
    }

    /// Enqueues the five chains into the host pass list in timeline order.
    pub fn register(&self, queue: &mut dyn PassQueue) {
        for point in InjectionPoint::ALL {
            queue.enqueue(ScheduledPass {
                point,
                event: point.host_event(),
            });
        }
    }

    /// Records the chain of one injection point.
    pub fn record(&mut self, point: InjectionPoint, frame: &mut FrameContext<'_>) -> ChainReport {
        let Some(pool_len) = self.pool_len else {
            return ChainReport::idle(point);
        };

        let effects = match self.stack.effects() {
            Ok(effects) => effects,
            Err(err) => {
                log::warn!("Effect stack unavailable while recording {}: {err}", point.name());
                return ChainReport::idle(point);
            }
        };

        let bucket = &mut self.buckets[point.index()];
        if is_stale(bucket, effects, pool_len, point) {
            log::debug!("Effect stack changed during the frame, re-bucketing {}", point.name());
            rebucket(bucket, effects, point);
        }
        if bucket.is_empty() {
            return ChainReport::idle(point);
        }

        let report = self.schedulers[point.index()].record_candidates(
            effects,
            &self.buckets[point.index()],
            self.ordering.table_mut(point),
            frame,
            &self.settings,
        );

        if self.settings.track_shader_references {
            for name in &report.instantiated_shaders {
                self.shader_refs.reference(name);
            }
        }
        report
    }

    /// Begins the frame and records all five chains in timeline order.
    pub fn render_frame(&mut self, frame: &mut FrameContext<'_>) -> FrameReport {
        self.on_frame_begin();
        let chains = InjectionPoint::ALL
            .into_iter()
            .map(|point| self.record(point, frame))
            .collect();
        FrameReport { chains }
    }

    /// Host hook after shaders were recompiled: every effect resolves its
    /// shader again on next use, including ones that previously failed.
    pub fn on_shaders_reloaded(&mut self) {
        match self.stack.effects() {
            Ok(effects) => {
                for effect in effects.iter_mut() {
                    effect.reset_material();
                }
            }
            Err(err) => log::warn!("Effect stack unavailable during shader reload: {err}"),
        }
    }

    /// Releases the chain buffers and every resource owned by the effects.
    pub fn release(&mut self, allocator: &mut dyn TextureAllocator) {
        for scheduler in &mut self.schedulers {
            scheduler.release(allocator);
        }
        match self.stack.effects() {
            Ok(effects) => {
                for effect in effects.iter_mut() {
                    effect.release(allocator);
                }
            }
            Err(err) => log::warn!("Effect stack unavailable during release: {err}"),
        }
        self.pool_len = None;
    }
}

/// Whether a bucket captured at frame begin no longer matches the live stack,
/// either because effects were added or removed or because one of them moved
/// to another injection point.
fn is_stale(
    bucket: &[usize],
    effects: &[Box<dyn PostEffect>],
    pool_len: usize,
    point: InjectionPoint,
) -> bool {
    if effects.len() != pool_len {
        return true;
    }
    let live = effects
        .iter()
        .filter(|effect| effect.injection_point() == point)
        .count();
    live != bucket.len()
        || bucket
            .iter()
            .any(|&index| effects[index].injection_point() != point)
}

fn rebucket(bucket: &mut Vec<usize>, effects: &[Box<dyn PostEffect>], point: InjectionPoint) {
    bucket.clear();
    bucket.extend(
        effects
            .iter()
            .enumerate()
            .filter(|(_, effect)| effect.injection_point() == point)
            .map(|(index, _)| index),
    );
}
