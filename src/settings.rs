//! Post-Processing Settings
//!
//! [`PostFxSettings`] configures how the effect stack behaves inside the host.
//! Runtime builds use [`PostFxSettings::default`]; editing contexts use
//! [`PostFxSettings::editor`], which lets the ordering tables grow
//! automatically and records every shader the stack instantiates.
//!
//! # Quick Start
//!
//! ```rust,ignore
//! use myth_postfx::PostFxSettings;
//!
//! // Player build: ordering tables are read-only during frames
//! let settings = PostFxSettings::default();
//!
//! // Editor: newly seen effects are appended to their ordering table
//! let settings = PostFxSettings::editor();
//!
//! // From a project file
//! let settings = PostFxSettings::from_json(r#"{ "auto_register_effects": true }"#)?;
//! ```

use serde::{Deserialize, Serialize};

use crate::errors::{PostFxError, Result};

/// Texture usages requested for the ping-pong chain buffers.
///
/// Both buffers are rendered into, sampled by the next sub-pass, and copied
/// back into the camera target at the end of the chain.
pub const PING_PONG_USAGE: wgpu::TextureUsages = wgpu::TextureUsages::RENDER_ATTACHMENT
    .union(wgpu::TextureUsages::TEXTURE_BINDING)
    .union(wgpu::TextureUsages::COPY_SRC)
    .union(wgpu::TextureUsages::COPY_DST);

/// Configuration of the post-processing stack.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PostFxSettings {
    /// Append effects missing from an ordering table when they are first
    /// scheduled.
    ///
    /// Ordering tables are meant to be edited outside of frame recording;
    /// enable this only in editing contexts.
    ///
    /// Default: `false`
    pub auto_register_effects: bool,

    /// Record the name of every shader the stack instantiates, so that build
    /// tooling can include them.
    ///
    /// Default: `false`
    pub track_shader_references: bool,

    /// Prefix used for debug labels of textures and passes.
    ///
    /// Default: `"PostFx"`
    pub label_prefix: String,
}

impl Default for PostFxSettings {
    fn default() -> Self {
        Self {
            auto_register_effects: false,
            track_shader_references: false,
            label_prefix: "PostFx".to_owned(),
        }
    }
}

impl PostFxSettings {
    /// Settings for editing contexts.
    #[must_use]
    pub fn editor() -> Self {
        Self {
            auto_register_effects: true,
            track_shader_references: true,
            ..Self::default()
        }
    }

    /// Parses settings from a JSON document. Missing fields take their
    /// default values.
    pub fn from_json(json: &str) -> Result<Self> {
        serde_json::from_str(json).map_err(PostFxError::Settings)
    }

    /// Builds a debug label under the configured prefix.
    #[must_use]
    pub fn label(&self, name: &str) -> String {
        format!("{} {}", self.label_prefix, name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_runtime_safe() {
        let settings = PostFxSettings::default();
        assert!(!settings.auto_register_effects);
        assert!(!settings.track_shader_references);
    }

    #[test]
    fn partial_json_keeps_defaults() {
        let settings = PostFxSettings::from_json(r#"{ "auto_register_effects": true }"#).unwrap();
        assert!(settings.auto_register_effects);
        assert!(!settings.track_shader_references);
        assert_eq!(settings.label_prefix, "PostFx");
    }

    #[test]
    fn malformed_json_is_an_error() {
        assert!(matches!(
            PostFxSettings::from_json("{ nope"),
            Err(PostFxError::Settings(_))
        ));
    }

    #[test]
    fn label_uses_prefix() {
        let settings = PostFxSettings::editor();
        assert_eq!(settings.label("Temp_A"), "PostFx Temp_A");
    }
}
