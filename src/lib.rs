#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::cast_precision_loss)]
#![allow(clippy::cast_possible_truncation)]
#![allow(clippy::cast_sign_loss)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]
#![allow(clippy::too_many_arguments)]

//! Post-processing effect stack for frame-graph renderers.
//!
//! Effects are grouped by [`InjectionPoint`]; within a point they run in the
//! order of that point's [`OrderingTable`], chained through a pair of
//! ping-pong buffers and copied back into the camera target at the end.
//! [`PostProcessFeature`] ties the five chains to the host frame.

pub mod effect;
pub mod effects;
pub mod errors;
pub mod graph;
pub mod settings;

pub use effect::parameter::{ClampedFloat, ClampedInt, MinFloat, MinInt, MinMaxFloat};
pub use effect::registry::{EffectInfo, EffectRegistry};
pub use effect::{
    EffectBase, EffectKind, EffectRequirements, Material, MaterialProperties, MaterialValue,
    PostEffect, SubPassList,
};
pub use errors::{PostFxError, Result};
pub use graph::{
    CameraFrame, ChainReport, EffectContext, EffectOrdering, EffectPool, EffectStack,
    FrameContext, FrameGraphBuilder, FrameReport, InjectionPoint, OrderingTable, PassDesc,
    PassQueue, PersistedOrdering, PostProcessFeature, ShaderLibrary, ShaderReferences,
    TextureAllocator, TextureDesc, TextureHandle,
};
pub use settings::PostFxSettings;
