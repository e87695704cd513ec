//! ANSI-aware text helpers shared by the renderers and the history browser.
//!
//! Everything here is pure: strings in, strings out. Escape sequences never count toward a
//! line's visible width.

pub mod ansi;
pub mod width;
pub mod wrap;

pub use ansi::{extract_ansi_code, strip_ansi, AnsiCode, SgrState};
pub use width::{grapheme_width, visible_width};
pub use wrap::{truncate_to_width, wrap_text_with_ansi};
