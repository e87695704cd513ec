//! Escape sequence scanning and SGR carry-over.

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AnsiCodeKind {
    Csi,
    Osc,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnsiCode<'a> {
    pub code: &'a str,
    pub kind: AnsiCodeKind,
}

impl AnsiCode<'_> {
    pub fn len(&self) -> usize {
        self.code.len()
    }

    pub fn is_empty(&self) -> bool {
        self.code.is_empty()
    }

    /// `true` for Select Graphic Rendition sequences (`ESC [ ... m`).
    pub fn is_sgr(&self) -> bool {
        self.kind == AnsiCodeKind::Csi && self.code.ends_with('m')
    }
}

/// Returns the escape sequence starting at byte offset `pos`, if any.
pub fn extract_ansi_code(input: &str, pos: usize) -> Option<AnsiCode<'_>> {
    let bytes = input.as_bytes();
    if pos + 1 >= bytes.len() || bytes[pos] != 0x1b {
        return None;
    }

    match bytes[pos + 1] {
        b'[' => {
            let end = bytes[pos + 2..]
                .iter()
                .position(|b| (0x40..=0x7e).contains(b))?;
            Some(AnsiCode {
                code: &input[pos..pos + 2 + end + 1],
                kind: AnsiCodeKind::Csi,
            })
        }
        b']' => {
            let mut idx = pos + 2;
            while idx < bytes.len() {
                if bytes[idx] == 0x07 {
                    return Some(AnsiCode {
                        code: &input[pos..=idx],
                        kind: AnsiCodeKind::Osc,
                    });
                }
                if bytes[idx] == 0x1b && bytes.get(idx + 1) == Some(&b'\\') {
                    return Some(AnsiCode {
                        code: &input[pos..idx + 2],
                        kind: AnsiCodeKind::Osc,
                    });
                }
                idx += 1;
            }
            None
        }
        _ => None,
    }
}

/// Removes every recognized escape sequence from `input`.
pub fn strip_ansi(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    let mut idx = 0;
    while idx < input.len() {
        if let Some(code) = extract_ansi_code(input, idx) {
            idx += code.len();
            continue;
        }
        let Some(ch) = input[idx..].chars().next() else {
            break;
        };
        out.push(ch);
        idx += ch.len_utf8();
    }
    out
}

/// Tracks the SGR sequences in effect so styling can be re-opened after a line break.
///
/// A reset (`ESC[0m` / `ESC[m`) clears the state; any other SGR sequence is appended.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct SgrState {
    active: Vec<String>,
}

impl SgrState {
    pub fn process(&mut self, code: &AnsiCode<'_>) {
        if !code.is_sgr() {
            return;
        }
        let params = &code.code[2..code.code.len() - 1];
        if params.is_empty() || params == "0" {
            self.active.clear();
        } else {
            self.active.push(code.code.to_string());
        }
    }

    pub fn process_text(&mut self, text: &str) {
        let mut idx = 0;
        while idx < text.len() {
            if let Some(code) = extract_ansi_code(text, idx) {
                idx += code.len();
                self.process(&code);
                continue;
            }
            let Some(ch) = text[idx..].chars().next() else {
                break;
            };
            idx += ch.len_utf8();
        }
    }

    pub fn is_active(&self) -> bool {
        !self.active.is_empty()
    }

    /// Sequences that re-establish the current style on a fresh line.
    pub fn reopen(&self) -> String {
        self.active.concat()
    }

    /// Sequence that closes the current style at the end of a line.
    pub fn close(&self) -> &'static str {
        if self.is_active() {
            "\x1b[0m"
        } else {
            ""
        }
    }
}
