//! Persistent Scratch Textures
//!
//! [`ScratchTexture`] is a single host texture that is reallocated only when
//! the requested descriptor changes. [`PingPongBuffers`] pairs two of them
//! for the chain of a scheduler: each sub-pass reads one buffer and writes
//! the other.
//!
//! Allocation is lazy. Nothing is allocated until `ensure` is called, which
//! the scheduler does once per frame and only when at least one effect is
//! active.

use crate::errors::Result;
use crate::graph::host::{TextureAllocator, TextureDesc, TextureHandle};

/// One persistent texture with reallocate-if-changed semantics.
#[derive(Debug, Clone, PartialEq)]
pub struct ScratchTexture {
    label: String,
    allocated: Option<(TextureHandle, TextureDesc)>,
}

impl ScratchTexture {
    #[must_use]
    pub fn new(label: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            allocated: None,
        }
    }

    /// Returns the texture for `desc`, (re)allocating it when the size,
    /// format or usage differs from the current allocation.
    pub fn ensure(
        &mut self,
        allocator: &mut dyn TextureAllocator,
        desc: &TextureDesc,
    ) -> Result<TextureHandle> {
        if let Some((handle, current)) = self.allocated {
            if current == *desc {
                return Ok(handle);
            }
            allocator.release(handle);
            self.allocated = None;
        }

        let handle = allocator.allocate(desc, &self.label)?;
        log::debug!(
            "Allocated '{}' ({}x{} {:?})",
            self.label,
            desc.width,
            desc.height,
            desc.format
        );
        self.allocated = Some((handle, *desc));
        Ok(handle)
    }

    #[inline]
    #[must_use]
    pub fn handle(&self) -> Option<TextureHandle> {
        self.allocated.map(|(handle, _)| handle)
    }

    #[inline]
    #[must_use]
    pub fn desc(&self) -> Option<TextureDesc> {
        self.allocated.map(|(_, desc)| desc)
    }

    #[must_use]
    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn release(&mut self, allocator: &mut dyn TextureAllocator) {
        if let Some((handle, _)) = self.allocated.take() {
            allocator.release(handle);
        }
    }
}

/// The A/B buffer pair of one pass chain.
#[derive(Debug, Clone, PartialEq)]
pub struct PingPongBuffers {
    buffers: [ScratchTexture; 2],
}

impl PingPongBuffers {
    /// Creates an unallocated pair labelled `"<prefix> A"` / `"<prefix> B"`.
    #[must_use]
    pub fn new(label_prefix: &str) -> Self {
        Self {
            buffers: [
                ScratchTexture::new(format!("{label_prefix} A")),
                ScratchTexture::new(format!("{label_prefix} B")),
            ],
        }
    }

    /// Ensures both buffers match `desc`.
    ///
    /// On failure nothing stays allocated, so a later frame retries from a
    /// clean state.
    pub fn ensure(
        &mut self,
        allocator: &mut dyn TextureAllocator,
        desc: &TextureDesc,
    ) -> Result<[TextureHandle; 2]> {
        let a = match self.buffers[0].ensure(allocator, desc) {
            Ok(handle) => handle,
            Err(err) => {
                self.release(allocator);
                return Err(err);
            }
        };
        let b = match self.buffers[1].ensure(allocator, desc) {
            Ok(handle) => handle,
            Err(err) => {
                self.release(allocator);
                return Err(err);
            }
        };
        Ok([a, b])
    }

    /// The buffer to write when reading `source`.
    ///
    /// Any texture that is not buffer A (including the camera target) maps to
    /// A, and A maps to B. Never returns `source`.
    #[must_use]
    pub fn destination_for(&self, source: TextureHandle) -> Option<TextureHandle> {
        let a = self.buffers[0].handle()?;
        let b = self.buffers[1].handle()?;
        Some(if source == a { b } else { a })
    }

    #[must_use]
    pub fn handles(&self) -> Option<[TextureHandle; 2]> {
        Some([self.buffers[0].handle()?, self.buffers[1].handle()?])
    }

    #[must_use]
    pub fn is_allocated(&self) -> bool {
        self.handles().is_some()
    }

    pub fn release(&mut self, allocator: &mut dyn TextureAllocator) {
        for buffer in &mut self.buffers {
            buffer.release(allocator);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::PostFxError;

    #[derive(Default)]
    struct CountingAllocator {
        next: u64,
        live: Vec<TextureHandle>,
        fail_after: Option<usize>,
    }

    impl TextureAllocator for CountingAllocator {
        fn allocate(&mut self, _desc: &TextureDesc, label: &str) -> Result<TextureHandle> {
            if self.fail_after == Some(self.live.len()) {
                return Err(PostFxError::Allocation {
                    label: label.to_owned(),
                    reason: "out of memory".to_owned(),
                });
            }
            self.next += 1;
            let handle = TextureHandle(self.next);
            self.live.push(handle);
            Ok(handle)
        }

        fn upload(&mut self, desc: &TextureDesc, label: &str, _data: &[u8]) -> Result<TextureHandle> {
            self.allocate(desc, label)
        }

        fn release(&mut self, handle: TextureHandle) {
            self.live.retain(|live| *live != handle);
        }
    }

    fn desc(width: u32) -> TextureDesc {
        TextureDesc::new(
            width,
            64,
            wgpu::TextureFormat::Rgba16Float,
            crate::settings::PING_PONG_USAGE,
        )
    }

    #[test]
    fn ensure_reuses_until_descriptor_changes() {
        let mut allocator = CountingAllocator::default();
        let mut buffers = PingPongBuffers::new("PostFx");

        let first = buffers.ensure(&mut allocator, &desc(128)).unwrap();
        let again = buffers.ensure(&mut allocator, &desc(128)).unwrap();
        assert_eq!(first, again);
        assert_eq!(allocator.live.len(), 2);

        let resized = buffers.ensure(&mut allocator, &desc(256)).unwrap();
        assert_ne!(first, resized);
        assert_eq!(allocator.live.len(), 2);

        buffers.release(&mut allocator);
        assert!(allocator.live.is_empty());
        assert!(!buffers.is_allocated());
    }

    #[test]
    fn destination_alternates() {
        let mut allocator = CountingAllocator::default();
        let mut buffers = PingPongBuffers::new("PostFx");
        assert_eq!(buffers.destination_for(TextureHandle(100)), None);

        let [a, b] = buffers.ensure(&mut allocator, &desc(32)).unwrap();
        let camera = TextureHandle(100);
        assert_eq!(buffers.destination_for(camera), Some(a));
        assert_eq!(buffers.destination_for(a), Some(b));
        assert_eq!(buffers.destination_for(b), Some(a));
    }

    #[test]
    fn failed_allocation_leaves_nothing_behind() {
        let mut allocator = CountingAllocator {
            fail_after: Some(1),
            ..Default::default()
        };
        let mut buffers = PingPongBuffers::new("PostFx");
        assert!(buffers.ensure(&mut allocator, &desc(32)).is_err());
        assert!(allocator.live.is_empty());
        assert!(!buffers.is_allocated());
    }
}
