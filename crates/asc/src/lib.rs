//! `asc`: ask an AI from the shell and watch the answer render as it streams.
//!
//! Each exchange runs the query tool (`sgpt`, or `perplexity` with `-p`), pipes its output
//! through the streaming reconciler, and saves the result as
//! `~/.asc/data/conversations/<id>.json`.
//!
//! ## Environment
//!
//! - `ASC_RENDERER=glow|builtin` picks the markdown renderer (default `glow`).
//! - `ASC_HELD_OUT_LINES` sets how many trailing rendered lines wait for the stream to settle.
//! - `ASC_RENDER_TIMEOUT_SEC` bounds each renderer run.
//! - `ASC_WIDTH_PADDING` is subtracted from the terminal width.
//! - `EDITOR` is used by `edit` and by `e` in the history browser.
//! - `RUST_LOG` overrides the log filter; logs go to stderr.

pub mod browser;
pub mod cli;
pub mod commands;
pub mod editor;
pub mod exchange;
pub mod logging;
pub mod preflight;
pub mod source;
