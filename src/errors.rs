//! Error Types
//!
//! This module defines the error types used throughout the post-processing stack.
//!
//! # Overview
//!
//! The main error type [`PostFxError`] covers the failure modes of the stack:
//! - Host failures (texture allocation, rejected pass declarations, an
//!   unavailable effect stack)
//! - Resource failures (shaders that cannot be resolved, missing textures)
//! - Configuration failures (malformed ordering or settings documents)
//!
//! None of these ever escape a frame: the scheduler logs them and falls back
//! to rendering nothing extra. They are surfaced as values so that effect
//! callbacks can use `?` freely.
//!
//! # Usage
//!
//! ```rust,ignore
//! use myth_postfx::errors::{PostFxError, Result};
//!
//! fn render_step() -> Result<()> {
//!     Ok(())
//! }
//! ```

use thiserror::Error;

/// The main error type for the post-processing stack.
#[derive(Error, Debug)]
pub enum PostFxError {
    // ========================================================================
    // Host Errors
    // ========================================================================
    /// The host could not allocate a texture.
    #[error("Texture allocation failed for '{label}': {reason}")]
    Allocation {
        /// Debug label of the requested texture
        label: String,
        /// Host-provided reason
        reason: String,
    },

    /// The host frame graph refused a pass declaration.
    #[error("Pass '{pass}' rejected by the frame graph: {reason}")]
    PassRejected {
        /// Name of the rejected pass
        pass: String,
        /// Host-provided reason
        reason: String,
    },

    /// The host effect stack could not be queried this frame.
    #[error("Effect stack unavailable: {0}")]
    HostUnavailable(String),

    // ========================================================================
    // Resource Errors
    // ========================================================================
    /// A shader referenced by an effect could not be resolved.
    #[error("Shader not found: '{0}'")]
    ShaderNotFound(String),

    /// An effect tried to use a texture it never allocated.
    #[error("Texture '{0}' is not allocated")]
    MissingTexture(&'static str),

    // ========================================================================
    // Configuration Errors
    // ========================================================================
    /// The persisted effect ordering document could not be parsed.
    #[error("Effect ordering parse error: {0}")]
    Ordering(#[source] serde_json::Error),

    /// The settings document could not be parsed.
    #[error("Settings parse error: {0}")]
    Settings(#[source] serde_json::Error),

    /// An effect is misconfigured in a way that prevents rendering.
    #[error("Invalid effect '{kind}': {reason}")]
    InvalidEffect {
        /// Stable identity of the effect
        kind: &'static str,
        /// What is wrong with it
        reason: String,
    },
}

/// Alias for `Result<T, PostFxError>`.
pub type Result<T> = std::result::Result<T, PostFxError>;
