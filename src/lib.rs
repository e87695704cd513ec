//! Streaming markdown rendering for terminal chat output.
//!
//! Invariant: a line handed to the output sink is final. [`StreamReconciler`] re-renders the
//! whole accumulated text on every fragment and only prints lines that have fallen out of the
//! withheld trailing window.
//!
//! # Public API Overview
//! - Drive a session with [`StreamReconciler`] over any line source.
//! - Render with [`GlowRenderer`] (one subprocess per call) or [`MarkdownRenderer`] (in process),
//!   both behind the [`Renderer`] trait.
//! - Read stream settings from the environment with [`StreamConfig::from_env`].
//! - Use the text helpers for ANSI-safe width, wrapping and truncation.

pub mod config;
pub mod error;
pub mod reconcile;
pub mod render;
pub mod terminal;
pub mod text;

pub use crate::config::{RendererKind, StreamConfig};
pub use crate::error::{RenderError, StreamError};
pub use crate::reconcile::{emit_range, flush_range, ReconcilerState, StreamReconciler};
pub use crate::render::{
    GlowRenderer, MarkdownRenderer, MarkdownTheme, RenderOptions, Renderer,
};
pub use crate::terminal::{render_width, terminal_columns};

/// ANSI-aware wrapping helper.
pub use crate::text::wrap_text_with_ansi;
/// ANSI-aware truncation helper.
pub use crate::text::truncate_to_width;
/// Visible width helper that ignores ANSI control sequences.
pub use crate::text::visible_width;

/// Builds the renderer selected by `config`.
pub fn renderer_for(config: &StreamConfig) -> Box<dyn Renderer> {
    match config.renderer {
        RendererKind::Glow => Box::new(GlowRenderer::new().with_timeout(config.render_timeout)),
        RendererKind::Builtin => Box::new(MarkdownRenderer::new()),
    }
}
