//! Injection Point Definitions
//!
//! [`InjectionPoint`] names the five fixed places in the host's frame timeline
//! where post-processing chains may run. Effects are reorderable *within* an
//! injection point; the injection points themselves never move relative to
//! each other.
//!
//! # Timeline
//!
//! | Point | Host event | Typical content |
//! |-------|------------|-----------------|
//! | `BeforeSkybox` | before skybox | world-space overlays on opaque geometry |
//! | `BeforeTransparents` | before transparents | grids, decals that transparents should cover |
//! | `BeforePostProcessing` | before host post-processing | auto exposure, overlays in HDR |
//! | `AfterPostProcessing` | after host post-processing | blur, outline, dithering |
//! | `AfterRendering` | after host post-processing¹ | compression, final stylization |
//!
//! ¹ The host has no later event that still owns the camera color target, so
//! `AfterRendering` is injected at the same event as `AfterPostProcessing`
//! and always enqueued after it.

/// A fixed timeline slot for a post-processing chain.
#[derive(Debug, Hash, PartialEq, Eq, Clone, Copy, PartialOrd, Ord)]
#[derive(serde::Serialize, serde::Deserialize)]
#[repr(u8)]
pub enum InjectionPoint {
    /// Runs after opaque geometry, before the skybox is drawn.
    BeforeSkybox = 0,

    /// Runs after the skybox, before translucent objects.
    BeforeTransparents = 1,

    /// Runs before the host's own post-processing (HDR input).
    BeforePostProcessing = 2,

    /// Runs after the host's own post-processing.
    AfterPostProcessing = 3,

    /// Runs last, after every other injection point.
    AfterRendering = 4,
}

/// Render events exposed by the host's frame timeline.
#[derive(Debug, Hash, PartialEq, Eq, Clone, Copy, PartialOrd, Ord)]
pub enum HostRenderEvent {
    BeforeRenderingSkybox,
    BeforeRenderingTransparents,
    BeforeRenderingPostProcessing,
    AfterRenderingPostProcessing,
}

impl InjectionPoint {
    /// Number of injection points.
    pub const COUNT: usize = 5;

    /// Every injection point in timeline order.
    pub const ALL: [InjectionPoint; Self::COUNT] = [
        Self::BeforeSkybox,
        Self::BeforeTransparents,
        Self::BeforePostProcessing,
        Self::AfterPostProcessing,
        Self::AfterRendering,
    ];

    /// Returns the numeric index of the point (timeline order).
    #[inline]
    #[must_use]
    pub const fn index(self) -> usize {
        self as usize
    }

    /// Injection point name (for debugging and pass labels).
    #[inline]
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::BeforeSkybox => "BeforeSkybox",
            Self::BeforeTransparents => "BeforeTransparents",
            Self::BeforePostProcessing => "BeforePostProcessing",
            Self::AfterPostProcessing => "AfterPostProcessing",
            Self::AfterRendering => "AfterRendering",
        }
    }

    /// The host event this point is injected at.
    #[inline]
    #[must_use]
    pub const fn host_event(self) -> HostRenderEvent {
        match self {
            Self::BeforeSkybox => HostRenderEvent::BeforeRenderingSkybox,
            Self::BeforeTransparents => HostRenderEvent::BeforeRenderingTransparents,
            Self::BeforePostProcessing => HostRenderEvent::BeforeRenderingPostProcessing,
            Self::AfterPostProcessing | Self::AfterRendering => {
                HostRenderEvent::AfterRenderingPostProcessing
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_point_ordering() {
        assert!(InjectionPoint::BeforeSkybox < InjectionPoint::BeforeTransparents);
        assert!(InjectionPoint::BeforeTransparents < InjectionPoint::BeforePostProcessing);
        assert!(InjectionPoint::BeforePostProcessing < InjectionPoint::AfterPostProcessing);
        assert!(InjectionPoint::AfterPostProcessing < InjectionPoint::AfterRendering);
    }

    #[test]
    fn test_all_matches_index() {
        for (i, point) in InjectionPoint::ALL.iter().enumerate() {
            assert_eq!(point.index(), i);
        }
    }

    #[test]
    fn test_after_rendering_shares_host_event() {
        assert_eq!(
            InjectionPoint::AfterRendering.host_event(),
            InjectionPoint::AfterPostProcessing.host_event()
        );
        assert!(
            InjectionPoint::BeforePostProcessing.host_event()
                < InjectionPoint::AfterRendering.host_event()
        );
    }
}
