//! Effect Materials
//!
//! A [`Material`] is a resolved shader plus the property block written by the
//! effect every frame. Materials are created lazily the first time an effect
//! is scheduled and dropped when the effect is disabled or torn down.

use glam::Vec4;
use smallvec::SmallVec;

use crate::graph::host::{BuiltinTexture, ShaderHandle, ShaderLibrary, TextureHandle};

/// A single shader property value.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum MaterialValue {
    Float(f32),
    Int(i32),
    Vector(Vec4),
    Texture(TextureHandle),
    Builtin(BuiltinTexture),
}

/// Insertion-ordered shader property block.
///
/// Property blocks are small (a handful of entries per effect), so lookups are
/// linear and iteration order is deterministic.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct MaterialProperties {
    entries: SmallVec<[(&'static str, MaterialValue); 8]>,
}

impl MaterialProperties {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&mut self, name: &'static str, value: MaterialValue) {
        if let Some(slot) = self.entries.iter_mut().find(|(key, _)| *key == name) {
            slot.1 = value;
        } else {
            self.entries.push((name, value));
        }
    }

    #[inline]
    pub fn set_float(&mut self, name: &'static str, value: f32) {
        self.set(name, MaterialValue::Float(value));
    }

    #[inline]
    pub fn set_int(&mut self, name: &'static str, value: i32) {
        self.set(name, MaterialValue::Int(value));
    }

    #[inline]
    pub fn set_vector(&mut self, name: &'static str, value: Vec4) {
        self.set(name, MaterialValue::Vector(value));
    }

    #[inline]
    pub fn set_texture(&mut self, name: &'static str, texture: TextureHandle) {
        self.set(name, MaterialValue::Texture(texture));
    }

    /// Binds `texture` when present, otherwise the host builtin `fallback`.
    pub fn set_texture_or(
        &mut self,
        name: &'static str,
        texture: Option<TextureHandle>,
        fallback: BuiltinTexture,
    ) {
        match texture {
            Some(texture) => self.set_texture(name, texture),
            None => self.set(name, MaterialValue::Builtin(fallback)),
        }
    }

    #[must_use]
    pub fn get(&self, name: &str) -> Option<MaterialValue> {
        self.entries
            .iter()
            .find(|(key, _)| *key == name)
            .map(|(_, value)| *value)
    }

    #[must_use]
    pub fn get_float(&self, name: &str) -> Option<f32> {
        match self.get(name)? {
            MaterialValue::Float(value) => Some(value),
            _ => None,
        }
    }

    #[must_use]
    pub fn get_int(&self, name: &str) -> Option<i32> {
        match self.get(name)? {
            MaterialValue::Int(value) => Some(value),
            _ => None,
        }
    }

    #[must_use]
    pub fn get_vector(&self, name: &str) -> Option<Vec4> {
        match self.get(name)? {
            MaterialValue::Vector(value) => Some(value),
            _ => None,
        }
    }

    #[must_use]
    pub fn get_texture(&self, name: &str) -> Option<TextureHandle> {
        match self.get(name)? {
            MaterialValue::Texture(value) => Some(value),
            _ => None,
        }
    }

    /// Host textures bound in this block, in insertion order.
    pub fn textures(&self) -> impl Iterator<Item = TextureHandle> + '_ {
        self.entries.iter().filter_map(|(_, value)| match value {
            MaterialValue::Texture(texture) => Some(*texture),
            _ => None,
        })
    }

    pub fn remove(&mut self, name: &str) -> Option<MaterialValue> {
        let index = self.entries.iter().position(|(key, _)| *key == name)?;
        Some(self.entries.remove(index).1)
    }

    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&'static str, MaterialValue)> + '_ {
        self.entries.iter().copied()
    }
}

/// A resolved shader with its property block.
#[derive(Clone, Debug, PartialEq)]
pub struct Material {
    pub shader: ShaderHandle,
    pub properties: MaterialProperties,
}

impl Material {
    #[must_use]
    pub fn new(shader: ShaderHandle) -> Self {
        Self {
            shader,
            properties: MaterialProperties::default(),
        }
    }
}

/// Outcome of [`MaterialSlot::ensure`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MaterialStatus {
    /// The material already existed.
    Ready,
    /// The shader was resolved and the material created by this call.
    Created,
    /// The shader cannot be resolved; the effect must not render.
    Missing,
}

/// Lazily created material owned by an effect instance.
#[derive(Clone, Debug, Default, PartialEq)]
pub(crate) enum MaterialSlot {
    #[default]
    Unresolved,
    Ready(Material),
    /// Temporarily handed to an [`EffectContext`](crate::graph::EffectContext).
    Lent,
    Missing,
}

impl MaterialSlot {
    /// Resolves the shader on first use.
    ///
    /// A failed lookup is logged once for this instance and then remembered,
    /// so that the effect is skipped silently on subsequent frames until
    /// [`reset`](Self::reset) is called.
    pub(crate) fn ensure(
        &mut self,
        shader_name: &str,
        owner: &str,
        shaders: &mut dyn ShaderLibrary,
    ) -> MaterialStatus {
        match self {
            Self::Ready(_) | Self::Lent => MaterialStatus::Ready,
            Self::Missing => MaterialStatus::Missing,
            Self::Unresolved => {
                if let Some(shader) = shaders.find(shader_name) {
                    log::debug!("Created material for '{owner}' (shader '{shader_name}')");
                    *self = Self::Ready(Material::new(shader));
                    MaterialStatus::Created
                } else {
                    log::error!(
                        "Failed to find post-processing shader '{shader_name}' for effect '{owner}'"
                    );
                    *self = Self::Missing;
                    MaterialStatus::Missing
                }
            }
        }
    }

    pub(crate) fn take(&mut self) -> Option<Material> {
        match std::mem::replace(self, Self::Lent) {
            Self::Ready(material) => Some(material),
            other => {
                *self = other;
                None
            }
        }
    }

    pub(crate) fn restore(&mut self, material: Material) {
        if matches!(self, Self::Lent) {
            *self = Self::Ready(material);
        }
    }

    pub(crate) fn reset(&mut self) {
        *self = Self::Unresolved;
    }

    pub(crate) fn is_missing(&self) -> bool {
        matches!(self, Self::Missing)
    }

    pub(crate) fn material(&self) -> Option<&Material> {
        match self {
            Self::Ready(material) => Some(material),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Library(Option<ShaderHandle>, usize);

    impl ShaderLibrary for Library {
        fn find(&mut self, _name: &str) -> Option<ShaderHandle> {
            self.1 += 1;
            self.0
        }
    }

    #[test]
    fn set_overwrites_in_place() {
        let mut props = MaterialProperties::new();
        props.set_float("_Blend", 0.5);
        props.set_int("_Levels", 3);
        props.set_float("_Blend", 1.0);
        assert_eq!(props.len(), 2);
        assert_eq!(props.get_float("_Blend"), Some(1.0));
        assert_eq!(props.iter().next().map(|(name, _)| name), Some("_Blend"));
    }

    #[test]
    fn typed_getters_reject_other_types() {
        let mut props = MaterialProperties::new();
        props.set_int("_Levels", 3);
        assert_eq!(props.get_float("_Levels"), None);
        assert_eq!(props.get_int("_Levels"), Some(3));
    }

    #[test]
    fn missing_shader_is_looked_up_once() {
        let mut library = Library(None, 0);
        let mut slot = MaterialSlot::default();
        assert_eq!(slot.ensure("Hidden/X", "x", &mut library), MaterialStatus::Missing);
        assert_eq!(slot.ensure("Hidden/X", "x", &mut library), MaterialStatus::Missing);
        assert_eq!(library.1, 1);

        slot.reset();
        library.0 = Some(ShaderHandle(3));
        assert_eq!(slot.ensure("Hidden/X", "x", &mut library), MaterialStatus::Created);
        assert_eq!(slot.ensure("Hidden/X", "x", &mut library), MaterialStatus::Ready);
    }

    #[test]
    fn lent_material_comes_back() {
        let mut library = Library(Some(ShaderHandle(1)), 0);
        let mut slot = MaterialSlot::default();
        slot.ensure("Hidden/X", "x", &mut library);

        let material = slot.take().unwrap();
        assert!(slot.take().is_none());
        slot.restore(material);
        assert_eq!(slot.material().map(|m| m.shader), Some(ShaderHandle(1)));
    }
}
