//! Frame-Graph Integration
//!
//! Everything that turns the effect stack into passes of the host frame
//! graph: injection points, host interfaces, ordering tables, the per-point
//! pass schedulers and the orchestrating [`PostProcessFeature`].

pub mod context;
pub mod feature;
pub mod host;
pub mod ordering;
pub mod ping_pong;
pub mod scheduler;
pub mod shader_refs;
pub mod stage;

pub use context::{CameraFrame, EffectContext, FrameContext};
pub use feature::{FrameReport, PostProcessFeature};
pub use host::{
    AsAny, BuiltinTexture, EffectPool, EffectStack, FrameGraphBuilder, PassCommand, PassDesc,
    PassQueue, ScheduledPass, ShaderHandle, ShaderLibrary, TextureAllocator, TextureDesc,
    TextureHandle,
};
pub use ordering::{EffectOrdering, OrderingTable, PersistedOrdering};
pub use ping_pong::{PingPongBuffers, ScratchTexture};
pub use scheduler::{ChainReport, PassScheduler};
pub use shader_refs::ShaderReferences;
pub use stage::{HostRenderEvent, InjectionPoint};
