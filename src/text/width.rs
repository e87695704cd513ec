//! Grapheme and visible width.

use emojis::get as emoji_get;
use unicode_segmentation::UnicodeSegmentation;
use unicode_width::UnicodeWidthChar;

use super::ansi::extract_ansi_code;

const TAB_WIDTH: usize = 3;

pub fn grapheme_width(grapheme: &str) -> usize {
    if grapheme.is_empty() {
        return 0;
    }
    if grapheme == "\t" {
        return TAB_WIDTH;
    }
    if emoji_get(grapheme).is_some() {
        return 2;
    }

    grapheme
        .chars()
        .map(|ch| UnicodeWidthChar::width(ch).unwrap_or(0))
        .sum()
}

/// Terminal column width of `input`, ignoring escape sequences.
pub fn visible_width(input: &str) -> usize {
    let mut width = 0;
    let mut idx = 0;
    while idx < input.len() {
        if let Some(code) = extract_ansi_code(input, idx) {
            idx += code.len();
            continue;
        }

        let run_end = next_escape_or_end(input, idx);
        width += input[idx..run_end]
            .graphemes(true)
            .map(grapheme_width)
            .sum::<usize>();
        idx = run_end;
    }
    width
}

pub(crate) fn next_escape_or_end(input: &str, from: usize) -> usize {
    let mut idx = from;
    while idx < input.len() {
        if extract_ansi_code(input, idx).is_some() {
            break;
        }
        match input[idx..].chars().next() {
            Some(ch) => idx += ch.len_utf8(),
            None => break,
        }
    }
    idx
}
