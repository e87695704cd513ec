//! Word wrapping and truncation that keep escape sequences intact.

use unicode_segmentation::UnicodeSegmentation;

use super::ansi::{extract_ansi_code, SgrState};
use super::width::{grapheme_width, next_escape_or_end, visible_width};

const ANSI_RESET: &str = "\x1b[0m";

/// Wraps every `\n`-separated line of `text` to at most `width` columns.
///
/// Styling active at a break is closed at the end of the line and re-opened on the next one.
/// Words wider than `width` are split at grapheme boundaries.
pub fn wrap_text_with_ansi(text: &str, width: usize) -> Vec<String> {
    if text.is_empty() || width == 0 {
        return vec![String::new()];
    }

    let mut carried = SgrState::default();
    let mut out = Vec::new();
    for line in text.split('\n') {
        let prefixed = format!("{}{line}", carried.reopen());
        wrap_line(&prefixed, width, &mut out);
        carried.process_text(line);
    }

    out.into_iter()
        .map(|line| line.trim_end_matches(' ').to_string())
        .collect()
}

fn wrap_line(line: &str, width: usize, out: &mut Vec<String>) {
    if visible_width(line) <= width {
        out.push(line.to_string());
        return;
    }

    let mut state = SgrState::default();
    let mut current = String::new();
    let mut current_width = 0;

    for token in tokenize(line) {
        let token_width = visible_width(&token);

        if current_width + token_width <= width {
            current.push_str(&token);
            current_width += token_width;
            state.process_text(&token);
            continue;
        }

        if current_width > 0 {
            push_line(out, &mut current, &state);
            current = state.reopen();
            current_width = 0;
        }

        if strip_is_blank(&token) {
            state.process_text(&token);
            current = state.reopen();
            continue;
        }

        if token_width <= width {
            current.push_str(&token);
            current_width = token_width;
            state.process_text(&token);
            continue;
        }

        let mut idx = 0;
        while idx < token.len() {
            if let Some(code) = extract_ansi_code(&token, idx) {
                current.push_str(code.code);
                state.process(&code);
                idx += code.len();
                continue;
            }
            let run_end = next_escape_or_end(&token, idx);
            for grapheme in token[idx..run_end].graphemes(true) {
                let cols = grapheme_width(grapheme);
                if current_width + cols > width && current_width > 0 {
                    push_line(out, &mut current, &state);
                    current = state.reopen();
                    current_width = 0;
                }
                current.push_str(grapheme);
                current_width += cols;
            }
            idx = run_end;
        }
    }

    if current_width > 0 || out.is_empty() {
        out.push(current);
    }
}

fn push_line(out: &mut Vec<String>, current: &mut String, state: &SgrState) {
    let mut line = std::mem::take(current);
    let trimmed_len = line.trim_end_matches(' ').len();
    line.truncate(trimmed_len);
    line.push_str(state.close());
    out.push(line);
}

fn strip_is_blank(token: &str) -> bool {
    super::ansi::strip_ansi(token).chars().all(|ch| ch == ' ')
}

/// Splits into alternating runs of spaces and non-spaces; escape sequences stick to the
/// following run.
fn tokenize(line: &str) -> Vec<String> {
    let mut tokens = Vec::new();
    let mut current = String::new();
    let mut pending = String::new();
    let mut in_space = false;
    let mut idx = 0;

    while idx < line.len() {
        if let Some(code) = extract_ansi_code(line, idx) {
            pending.push_str(code.code);
            idx += code.len();
            continue;
        }
        let Some(ch) = line[idx..].chars().next() else {
            break;
        };
        let is_space = ch == ' ';
        if is_space != in_space && !current.is_empty() {
            tokens.push(std::mem::take(&mut current));
        }
        current.push_str(&pending);
        pending.clear();
        in_space = is_space;
        current.push(ch);
        idx += ch.len_utf8();
    }

    current.push_str(&pending);
    if !current.is_empty() {
        tokens.push(current);
    }
    tokens
}

/// Shortens `text` to `max_width` columns, ending with `ellipsis` when anything was cut.
pub fn truncate_to_width(text: &str, max_width: usize, ellipsis: &str) -> String {
    if max_width == 0 {
        return String::new();
    }
    if visible_width(text) <= max_width {
        return text.to_string();
    }

    let ellipsis_width = visible_width(ellipsis);
    if ellipsis_width >= max_width {
        return ellipsis.chars().take(max_width).collect();
    }
    let target = max_width - ellipsis_width;

    let mut truncated = String::new();
    let mut used = 0;
    let mut styled = false;
    let mut idx = 0;
    'outer: while idx < text.len() {
        if let Some(code) = extract_ansi_code(text, idx) {
            truncated.push_str(code.code);
            styled = true;
            idx += code.len();
            continue;
        }
        let run_end = next_escape_or_end(text, idx);
        for grapheme in text[idx..run_end].graphemes(true) {
            let cols = grapheme_width(grapheme);
            if used + cols > target {
                break 'outer;
            }
            truncated.push_str(grapheme);
            used += cols;
        }
        idx = run_end;
    }

    if styled {
        truncated.push_str(ANSI_RESET);
    }
    truncated.push_str(ellipsis);
    truncated
}
