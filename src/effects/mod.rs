//! Built-in Effects
//!
//! | Effect | Injection point | Sub-passes |
//! |--------|-----------------|------------|
//! | [`WorldSpaceTextureOverlay`], [`Grid3D`] | `BeforeTransparents` | 1 |
//! | [`AutoExposure`] | `BeforePostProcessing` | 1 (+ 3 compute dispatches) |
//! | [`TextureOverlay`] | configurable (`BeforePostProcessing`) | 1 |
//! | [`BoxBlur`] | configurable (`AfterPostProcessing`) | 1 per blurred axis |
//! | [`EdgeBleed`] | `AfterPostProcessing` | 2 |
//! | [`InvertColors`], [`BrightnessGamma`], [`Pixelate`], [`Dither`] | `AfterPostProcessing` | 1 |
//! | [`GaussianBlur`] | `AfterPostProcessing` | 1 (downsample, N rounds, composite) |
//! | [`Outline`] | `AfterPostProcessing` | 1 (edge detection, composite) |
//! | [`Compression`] | `AfterRendering` | 1 (DCT, compress) |

pub mod auto_exposure;
pub mod box_blur;
pub mod compression;
pub mod dither;
pub mod gaussian_blur;
pub mod outline;
pub mod overlay;
pub mod simple;

pub use auto_exposure::{AutoExposure, EyeAdaptation, LogHistogram};
pub use box_blur::{BoxBlur, EdgeBleed};
pub use compression::Compression;
pub use dither::{Dither, DitherTexture};
pub use gaussian_blur::{BlurMode, GaussianBlur};
pub use outline::Outline;
pub use overlay::{Grid3D, OverlayBlendMode, TextureOverlay, WorldGrid, WorldSpaceTextureOverlay};
pub use simple::{BrightnessGamma, InvertColors, Pixelate};

use crate::effect::PostEffect;
use crate::effect::registry::{EffectInfo, EffectRegistry};
use crate::graph::stage::InjectionPoint;

fn boxed<T: PostEffect + Default + 'static>() -> Box<dyn PostEffect> {
    Box::new(T::default())
}

/// Registers every built-in effect in `registry`.
pub fn register_builtin(registry: &mut EffectRegistry) {
    use InjectionPoint::{AfterPostProcessing, AfterRendering, BeforePostProcessing, BeforeTransparents};

    let builtin = [
        EffectInfo::new(WorldSpaceTextureOverlay::KIND, "World Space Texture Overlay", BeforeTransparents)
            .with_factory(boxed::<WorldSpaceTextureOverlay>),
        EffectInfo::new(Grid3D::KIND, "Grid 3D", BeforeTransparents).with_factory(boxed::<Grid3D>),
        EffectInfo::new(AutoExposure::KIND, "Auto Exposure", BeforePostProcessing)
            .with_factory(boxed::<AutoExposure>),
        EffectInfo::new(TextureOverlay::KIND, "Texture Overlay", BeforePostProcessing)
            .with_factory(boxed::<TextureOverlay>),
        EffectInfo::new(BoxBlur::KIND, "Box Blur", AfterPostProcessing).with_factory(boxed::<BoxBlur>),
        EffectInfo::new(EdgeBleed::KIND, "Edge Bleed", AfterPostProcessing).with_factory(boxed::<EdgeBleed>),
        EffectInfo::new(InvertColors::KIND, "Invert Colors", AfterPostProcessing)
            .with_factory(boxed::<InvertColors>),
        EffectInfo::new(BrightnessGamma::KIND, "Brightness & Gamma Filter", AfterPostProcessing)
            .with_factory(boxed::<BrightnessGamma>),
        EffectInfo::new(Pixelate::KIND, "Pixelate", AfterPostProcessing).with_factory(boxed::<Pixelate>),
        EffectInfo::new(Dither::KIND, "Dither", AfterPostProcessing).with_factory(boxed::<Dither>),
        EffectInfo::new(GaussianBlur::KIND, "Gaussian Blur", AfterPostProcessing)
            .with_factory(boxed::<GaussianBlur>),
        EffectInfo::new(Outline::KIND, "Outline", AfterPostProcessing).with_factory(boxed::<Outline>),
        EffectInfo::new(Compression::KIND, "Compression", AfterRendering).with_factory(boxed::<Compression>),
    ];

    for info in builtin {
        if !registry.register(info) {
            log::warn!("Built-in effect '{}' was already registered", info.kind);
        }
    }
}
