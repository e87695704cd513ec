//! Code block highlighting for the in-process renderer.

use once_cell::sync::Lazy;
use syntect::easy::HighlightLines;
use syntect::highlighting::{Theme, ThemeSet};
use syntect::parsing::SyntaxSet;
use syntect::util::{as_24_bit_terminal_escaped, LinesWithEndings};

const THEME_NAME: &str = "base16-ocean.dark";
const RESET: &str = "\x1b[0m";

static SYNTAXES: Lazy<SyntaxSet> = Lazy::new(SyntaxSet::load_defaults_newlines);
static THEME: Lazy<Option<Theme>> = Lazy::new(|| {
    let mut themes = ThemeSet::load_defaults();
    themes.themes.remove(THEME_NAME)
});

/// Loads the syntax and theme sets ahead of the first code block.
pub fn prewarm_highlighting() {
    Lazy::force(&SYNTAXES);
    Lazy::force(&THEME);
}

/// Highlights `code` as `lang`, one ANSI-colored string per source line.
///
/// Returns `None` when the language is unknown or highlighting fails, so callers can fall back
/// to plain styling.
pub fn highlight_code(code: &str, lang: Option<&str>) -> Option<Vec<String>> {
    let token = lang.map(str::trim).filter(|token| !token.is_empty())?;
    let syntax = SYNTAXES
        .find_syntax_by_token(token)
        .or_else(|| SYNTAXES.find_syntax_by_extension(token))?;
    let theme = THEME.as_ref()?;

    let mut highlighter = HighlightLines::new(syntax, theme);
    let mut lines = Vec::new();
    for line in LinesWithEndings::from(code) {
        let ranges = highlighter.highlight_line(line, &SYNTAXES).ok()?;
        let escaped = as_24_bit_terminal_escaped(&ranges[..], false);
        let trimmed = escaped.trim_end_matches(['\n', '\r']);
        lines.push(format!("{trimmed}{RESET}"));
    }
    if code.is_empty() || code.ends_with('\n') {
        lines.push(String::new());
    }
    Some(lines)
}
