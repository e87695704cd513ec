//! Renderer capability.
//!
//! A renderer is a stateless, deterministic function from the full accumulated markdown text to
//! terminal lines. The streaming reconciler only ever sees this trait, so the subprocess
//! renderer ([`GlowRenderer`]) and the in-process one ([`MarkdownRenderer`]) are
//! interchangeable.

mod glow;
mod highlight;
mod markdown;

use std::path::PathBuf;

pub use crate::error::RenderError;
pub use glow::GlowRenderer;
pub use highlight::{highlight_code, prewarm_highlighting};
pub use markdown::{MarkdownRenderer, MarkdownTheme};

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RenderOptions {
    /// Wrap width in columns; `None` lets the renderer pick.
    pub width: Option<usize>,
    /// Style definition handed to the renderer (glow's `--style`).
    pub style: Option<PathBuf>,
}

impl RenderOptions {
    pub fn with_width(mut self, width: usize) -> Self {
        self.width = Some(width);
        self
    }

    pub fn with_style(mut self, style: impl Into<PathBuf>) -> Self {
        self.style = Some(style.into());
        self
    }
}

pub trait Renderer {
    fn render(&self, text: &str, options: &RenderOptions) -> Result<Vec<String>, RenderError>;
}

impl<R: Renderer + ?Sized> Renderer for &R {
    fn render(&self, text: &str, options: &RenderOptions) -> Result<Vec<String>, RenderError> {
        (**self).render(text, options)
    }
}

impl<R: Renderer + ?Sized> Renderer for Box<R> {
    fn render(&self, text: &str, options: &RenderOptions) -> Result<Vec<String>, RenderError> {
        (**self).render(text, options)
    }
}

/// Splits raw renderer output into lines.
///
/// `\n` and `\r\n` both terminate a line and a final terminator does not start an extra empty
/// line, so `"a\nb\n"` is two lines and `""` is none.
pub fn split_rendered_lines(output: &str) -> Vec<String> {
    output.lines().map(str::to_string).collect()
}
