//! Effect Registry
//!
//! Maps persisted identity strings back to [`EffectKind`]s. Ordering tables
//! store plain strings; on load, every string is resolved here and entries
//! that no longer name a registered effect are dropped.

use rustc_hash::FxHashMap;

use super::{EffectKind, PostEffect};
use crate::graph::stage::InjectionPoint;

/// Constructor of a default-configured effect instance.
pub type EffectFactory = fn() -> Box<dyn PostEffect>;

/// Static description of a registered effect type.
#[derive(Clone, Copy, Debug)]
pub struct EffectInfo {
    pub kind: EffectKind,
    /// Human readable name for tooling.
    pub display_name: &'static str,
    /// Injection point of a default-configured instance.
    pub default_point: InjectionPoint,
    pub factory: Option<EffectFactory>,
}

impl EffectInfo {
    #[must_use]
    pub const fn new(
        kind: EffectKind,
        display_name: &'static str,
        default_point: InjectionPoint,
    ) -> Self {
        Self {
            kind,
            display_name,
            default_point,
            factory: None,
        }
    }

    #[must_use]
    pub const fn with_factory(mut self, factory: EffectFactory) -> Self {
        self.factory = Some(factory);
        self
    }
}

/// Registered effect types, in registration order.
#[derive(Default)]
pub struct EffectRegistry {
    lookup: FxHashMap<&'static str, usize>,
    infos: Vec<EffectInfo>,
}

impl EffectRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry preloaded with every built-in effect.
    #[must_use]
    pub fn with_builtin_effects() -> Self {
        let mut registry = Self::new();
        crate::effects::register_builtin(&mut registry);
        registry
    }

    /// Registers an effect type. Returns `false` (and keeps the existing
    /// entry) if the tag is already taken or malformed.
    pub fn register(&mut self, info: EffectInfo) -> bool {
        let tag = info.kind.as_str();
        if !EffectKind::is_valid_tag(tag) {
            log::warn!("Refusing to register effect with malformed tag '{tag}'");
            return false;
        }
        if self.lookup.contains_key(tag) {
            return false;
        }
        self.lookup.insert(tag, self.infos.len());
        self.infos.push(info);
        true
    }

    /// Removes an effect type. Persisted entries naming it are dropped the
    /// next time an ordering is loaded.
    pub fn unregister(&mut self, kind: EffectKind) -> bool {
        let Some(index) = self.lookup.remove(kind.as_str()) else {
            return false;
        };
        self.infos.remove(index);
        for slot in self.lookup.values_mut() {
            if *slot > index {
                *slot -= 1;
            }
        }
        true
    }

    /// Resolves a persisted identity string.
    #[must_use]
    pub fn resolve(&self, tag: &str) -> Option<EffectKind> {
        self.lookup.get(tag).map(|&index| self.infos[index].kind)
    }

    #[must_use]
    pub fn info(&self, kind: EffectKind) -> Option<&EffectInfo> {
        self.lookup
            .get(kind.as_str())
            .map(|&index| &self.infos[index])
    }

    #[must_use]
    pub fn contains(&self, kind: EffectKind) -> bool {
        self.lookup.contains_key(kind.as_str())
    }

    /// Creates a default-configured instance, if the type has a factory.
    #[must_use]
    pub fn create(&self, kind: EffectKind) -> Option<Box<dyn PostEffect>> {
        self.info(kind).and_then(|info| info.factory).map(|factory| factory())
    }

    pub fn iter(&self) -> impl Iterator<Item = &EffectInfo> {
        self.infos.iter()
    }

    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.infos.len()
    }

    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.infos.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const A: EffectKind = EffectKind::new("a");
    const B: EffectKind = EffectKind::new("b");
    const C: EffectKind = EffectKind::new("c");

    fn registry() -> EffectRegistry {
        let mut registry = EffectRegistry::new();
        for kind in [A, B, C] {
            assert!(registry.register(EffectInfo::new(kind, "Test", InjectionPoint::AfterPostProcessing)));
        }
        registry
    }

    #[test]
    fn duplicate_and_malformed_tags_are_rejected() {
        let mut registry = registry();
        assert!(!registry.register(EffectInfo::new(A, "Again", InjectionPoint::BeforeSkybox)));
        assert!(!registry.register(EffectInfo::new(
            EffectKind::new("Bad Tag"),
            "Bad",
            InjectionPoint::BeforeSkybox
        )));
        assert_eq!(registry.len(), 3);
        assert_eq!(registry.info(A).map(|info| info.display_name), Some("Test"));
    }

    #[test]
    fn unregister_keeps_lookup_consistent() {
        let mut registry = registry();
        assert!(registry.unregister(A));
        assert!(!registry.unregister(A));
        assert_eq!(registry.resolve("a"), None);
        assert_eq!(registry.resolve("b"), Some(B));
        assert_eq!(registry.resolve("c"), Some(C));
        let kinds: Vec<_> = registry.iter().map(|info| info.kind).collect();
        assert_eq!(kinds, vec![B, C]);
    }

    #[test]
    fn builtin_effects_have_factories() {
        let registry = EffectRegistry::with_builtin_effects();
        assert!(!registry.is_empty());
        for info in registry.iter() {
            let effect = registry.create(info.kind).expect("builtin factory");
            assert_eq!(effect.kind(), info.kind);
            assert_eq!(effect.injection_point(), info.default_point);
        }
    }
}
