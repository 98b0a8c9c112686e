//! Host Interfaces
//!
//! The post-processing stack never talks to a GPU API directly. Everything it
//! needs from the host renderer is expressed by the traits in this module:
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────┐
//! │                       Host renderer                       │
//! │                                                          │
//! │  TextureAllocator   persistent textures (ping-pong, LUTs) │
//! │  FrameGraphBuilder  per-frame pass declaration            │
//! │  ShaderLibrary      shader name → handle                  │
//! │  PassQueue          per-frame list of injected chains     │
//! │  EffectStack        the live effect configuration         │
//! └──────────────────────────────────────────────────────────┘
//! ```
//!
//! Passes are declared, not executed: each [`PassDesc`] names the textures it
//! reads and the single texture it writes, which is all the host frame graph
//! needs to order execution.

use std::any::Any;

use smallvec::SmallVec;

use crate::effect::{EffectKind, EffectRequirements, MaterialProperties, PostEffect};
use crate::errors::Result;
use crate::graph::stage::{HostRenderEvent, InjectionPoint};

// ─── Handles ──────────────────────────────────────────────────────────────────

/// Opaque host handle to a texture (persistent or transient).
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub struct TextureHandle(pub u64);

/// Opaque host handle to a compiled shader.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub struct ShaderHandle(pub u64);

/// Textures every host provides without allocation.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub enum BuiltinTexture {
    White,
    Black,
}

// ─── Texture Descriptor ───────────────────────────────────────────────────────

/// Size, format and usage of a 2D texture.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub struct TextureDesc {
    pub width: u32,
    pub height: u32,
    pub format: wgpu::TextureFormat,
    pub usage: wgpu::TextureUsages,
}

impl TextureDesc {
    #[must_use]
    pub const fn new(
        width: u32,
        height: u32,
        format: wgpu::TextureFormat,
        usage: wgpu::TextureUsages,
    ) -> Self {
        Self {
            width,
            height,
            format,
            usage,
        }
    }

    /// Same size as `self` with a different format.
    #[must_use]
    pub const fn with_format(mut self, format: wgpu::TextureFormat) -> Self {
        self.format = format;
        self
    }

    /// Same format as `self` with a different usage.
    #[must_use]
    pub const fn with_usage(mut self, usage: wgpu::TextureUsages) -> Self {
        self.usage = usage;
        self
    }

    /// Dimensions divided by `2^shift`, never smaller than 1×1.
    #[must_use]
    pub fn downsampled(mut self, shift: u32) -> Self {
        let shift = shift.min(31);
        self.width = (self.width >> shift).max(1);
        self.height = (self.height >> shift).max(1);
        self
    }

    /// Returns `true` when both dimensions are non-zero.
    #[inline]
    #[must_use]
    pub const fn is_valid(&self) -> bool {
        self.width > 0 && self.height > 0
    }
}

// ─── Pass Declaration ─────────────────────────────────────────────────────────

/// What a declared pass does when the host executes it.
#[derive(Clone, Debug, PartialEq)]
pub enum PassCommand {
    /// Fullscreen draw of `shader` at `pass_index`, sampling the first read.
    Blit {
        shader: ShaderHandle,
        pass_index: u32,
        properties: MaterialProperties,
    },
    /// Plain texture copy from the first read into the write target.
    Copy,
    /// Compute dispatch of `kernel` in `shader`.
    Dispatch {
        shader: ShaderHandle,
        kernel: &'static str,
        groups: [u32; 3],
        properties: MaterialProperties,
    },
}

/// A single pass declared into the host frame graph.
#[derive(Clone, Debug, PartialEq)]
pub struct PassDesc {
    /// Debug name shown in GPU captures.
    pub name: String,
    /// Textures read by the pass. The frame graph derives dependencies from these.
    pub reads: SmallVec<[TextureHandle; 4]>,
    /// The one texture written by the pass.
    pub write: TextureHandle,
    pub command: PassCommand,
}

impl PassDesc {
    /// Fullscreen blit from `source` into `destination`.
    ///
    /// Every texture bound in `properties` is added to the read set.
    #[must_use]
    pub fn blit(
        name: impl Into<String>,
        source: TextureHandle,
        destination: TextureHandle,
        shader: ShaderHandle,
        pass_index: u32,
        properties: MaterialProperties,
    ) -> Self {
        let mut reads = SmallVec::new();
        reads.push(source);
        for texture in properties.textures() {
            if !reads.contains(&texture) {
                reads.push(texture);
            }
        }
        Self {
            name: name.into(),
            reads,
            write: destination,
            command: PassCommand::Blit {
                shader,
                pass_index,
                properties,
            },
        }
    }

    /// Plain copy from `source` into `destination`.
    #[must_use]
    pub fn copy(name: impl Into<String>, source: TextureHandle, destination: TextureHandle) -> Self {
        let mut reads = SmallVec::new();
        reads.push(source);
        Self {
            name: name.into(),
            reads,
            write: destination,
            command: PassCommand::Copy,
        }
    }

    /// Compute dispatch writing `target`.
    #[must_use]
    pub fn dispatch(
        name: impl Into<String>,
        shader: ShaderHandle,
        kernel: &'static str,
        groups: [u32; 3],
        target: TextureHandle,
        properties: MaterialProperties,
    ) -> Self {
        let reads = properties
            .textures()
            .filter(|texture| *texture != target)
            .collect();
        Self {
            name: name.into(),
            reads,
            write: target,
            command: PassCommand::Dispatch {
                shader,
                kernel,
                groups,
                properties,
            },
        }
    }
}

// ─── Host Traits ──────────────────────────────────────────────────────────────

/// Persistent texture storage owned by the host.
///
/// Textures allocated here survive across frames until explicitly released.
pub trait TextureAllocator {
    /// Allocates an uninitialized texture.
    fn allocate(&mut self, desc: &TextureDesc, label: &str) -> Result<TextureHandle>;

    /// Allocates a texture initialized with tightly packed `data`.
    fn upload(&mut self, desc: &TextureDesc, label: &str, data: &[u8]) -> Result<TextureHandle>;

    /// Releases a texture previously returned by `allocate` or `upload`.
    fn release(&mut self, handle: TextureHandle);
}

/// Per-frame pass declaration surface of the host frame graph.
pub trait FrameGraphBuilder: TextureAllocator {
    /// Creates a texture that lives for the current frame only.
    fn create_transient(&mut self, desc: &TextureDesc, label: &str) -> TextureHandle;

    /// Declares a pass. Execution is deferred to the host.
    fn add_pass(&mut self, pass: PassDesc) -> Result<()>;

    /// Declares which auxiliary camera buffers the chain at `point` needs this
    /// frame. Called before any pass of that chain is declared.
    fn configure_input(&mut self, point: InjectionPoint, requirements: EffectRequirements);
}

/// Shader lookup by deterministic name.
pub trait ShaderLibrary {
    fn find(&mut self, name: &str) -> Option<ShaderHandle>;
}

/// A chain enqueued into the host's per-frame pass list.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub struct ScheduledPass {
    pub point: InjectionPoint,
    pub event: HostRenderEvent,
}

/// The host's per-frame pass list.
pub trait PassQueue {
    fn enqueue(&mut self, pass: ScheduledPass);
}

impl PassQueue for Vec<ScheduledPass> {
    fn enqueue(&mut self, pass: ScheduledPass) {
        self.push(pass);
    }
}

// ─── Effect Stack ─────────────────────────────────────────────────────────────

/// Read-only query interface over the host's effect configuration.
///
/// The stack owns the effects; the post-processing feature borrows them for
/// the duration of a chain. An error means the host cannot be queried this
/// frame, in which case nothing is rendered.
pub trait EffectStack {
    fn effects(&mut self) -> Result<&mut [Box<dyn PostEffect>]>;
}

/// A plain, always-available effect stack.
#[derive(Default)]
pub struct EffectPool {
    effects: Vec<Box<dyn PostEffect>>,
}

impl EffectPool {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds an effect and returns `self` for chaining.
    #[must_use]
    pub fn with(mut self, effect: impl PostEffect + 'static) -> Self {
        self.push(effect);
        self
    }

    pub fn push(&mut self, effect: impl PostEffect + 'static) {
        self.effects.push(Box::new(effect));
    }

    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.effects.len()
    }

    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.effects.is_empty()
    }

    /// Removes every effect of `kind`, returning how many were removed.
    pub fn remove_kind(&mut self, kind: EffectKind) -> usize {
        let before = self.effects.len();
        self.effects.retain(|effect| effect.kind() != kind);
        before - self.effects.len()
    }

    /// First effect of concrete type `T`.
    #[must_use]
    pub fn get<T: PostEffect + 'static>(&self) -> Option<&T> {
        self.effects
            .iter()
            .find_map(|effect| (**effect).as_any().downcast_ref::<T>())
    }

    /// First effect of concrete type `T`, mutably.
    pub fn get_mut<T: PostEffect + 'static>(&mut self) -> Option<&mut T> {
        self.effects
            .iter_mut()
            .find_map(|effect| (**effect).as_any_mut().downcast_mut::<T>())
    }

    pub fn iter(&self) -> impl Iterator<Item = &dyn PostEffect> {
        self.effects.iter().map(|effect| &**effect)
    }
}

impl EffectStack for EffectPool {
    fn effects(&mut self) -> Result<&mut [Box<dyn PostEffect>]> {
        Ok(&mut self.effects)
    }
}

/// Object-safe access to the concrete type behind a `dyn PostEffect`.
pub trait AsAny {
    fn as_any(&self) -> &dyn Any;
    fn as_any_mut(&mut self) -> &mut dyn Any;
}

impl<T: Any> AsAny for T {
    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}
