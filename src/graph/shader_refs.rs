//! Shader Reference Tracking
//!
//! Effects resolve their shaders by name at runtime, so nothing in the asset
//! pipeline can see which shaders a project actually uses. While
//! `track_shader_references` is on, every shader the stack instantiates is
//! recorded here; build tooling serializes the list and keeps those shaders
//! in the player build.

use serde::{Deserialize, Serialize};

/// De-duplicated, insertion-ordered list of shader names.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ShaderReferences {
    names: Vec<String>,
}

impl ShaderReferences {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Records `name`. Returns `true` if it was not yet listed.
    pub fn reference(&mut self, name: &str) -> bool {
        if self.contains(name) {
            return false;
        }
        log::debug!("Tracking shader reference '{name}'");
        self.names.push(name.to_owned());
        true
    }

    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.names.iter().any(|listed| listed == name)
    }

    #[must_use]
    pub fn names(&self) -> &[String] {
        &self.names
    }

    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.names.len()
    }

    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    pub fn clear(&mut self) {
        self.names.clear();
    }

    /// Keeps only names for which `exists` returns `true`. Returns how many
    /// were removed.
    pub fn prune(&mut self, mut exists: impl FnMut(&str) -> bool) -> usize {
        let before = self.names.len();
        self.names.retain(|name| exists(name));
        before - self.names.len()
    }
}
