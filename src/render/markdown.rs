//! In-process markdown renderer.
//!
//! Walks the GFM syntax tree from the `markdown` crate and produces ANSI-styled lines wrapped
//! to the requested width. Top-level blocks are separated by exactly one blank line.

use markdown::{mdast, to_mdast, ParseOptions};

use super::highlight::highlight_code;
use super::{RenderError, RenderOptions, Renderer};
use crate::text::{visible_width, wrap_text_with_ansi};

const DEFAULT_WIDTH: usize = 80;
const CODE_INDENT: &str = "  ";
const QUOTE_PREFIX: &str = "│ ";

/// An opening and closing escape sequence pair.
///
/// Closers are attribute-specific (`22`, `23`, `39`, ...) rather than a full reset, so nested
/// styles keep the surrounding ones intact.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Style {
    open: &'static str,
    close: &'static str,
}

impl Style {
    pub const PLAIN: Self = Self::new("", "");

    pub const fn new(open: &'static str, close: &'static str) -> Self {
        Self { open, close }
    }

    pub fn apply(&self, text: &str) -> String {
        if self.open.is_empty() && self.close.is_empty() {
            return text.to_string();
        }
        format!("{}{text}{}", self.open, self.close)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MarkdownTheme {
    pub heading: Style,
    pub link: Style,
    pub link_url: Style,
    pub code: Style,
    pub code_block: Style,
    pub code_block_border: Style,
    pub quote: Style,
    pub quote_border: Style,
    pub hr: Style,
    pub list_bullet: Style,
    pub bold: Style,
    pub italic: Style,
    pub strikethrough: Style,
    pub underline: Style,
}

impl Default for MarkdownTheme {
    fn default() -> Self {
        Self {
            heading: Style::new("\x1b[35m", "\x1b[39m"),
            link: Style::new("\x1b[34m", "\x1b[39m"),
            link_url: Style::new("\x1b[90m", "\x1b[39m"),
            code: Style::new("\x1b[33m", "\x1b[39m"),
            code_block: Style::new("\x1b[32m", "\x1b[39m"),
            code_block_border: Style::new("\x1b[90m", "\x1b[39m"),
            quote: Style::new("\x1b[37m", "\x1b[39m"),
            quote_border: Style::new("\x1b[90m", "\x1b[39m"),
            hr: Style::new("\x1b[90m", "\x1b[39m"),
            list_bullet: Style::new("\x1b[36m", "\x1b[39m"),
            bold: Style::new("\x1b[1m", "\x1b[22m"),
            italic: Style::new("\x1b[3m", "\x1b[23m"),
            strikethrough: Style::new("\x1b[9m", "\x1b[29m"),
            underline: Style::new("\x1b[4m", "\x1b[24m"),
        }
    }
}

impl MarkdownTheme {
    /// A theme without any escape sequences.
    pub fn plain() -> Self {
        Self {
            heading: Style::PLAIN,
            link: Style::PLAIN,
            link_url: Style::PLAIN,
            code: Style::PLAIN,
            code_block: Style::PLAIN,
            code_block_border: Style::PLAIN,
            quote: Style::PLAIN,
            quote_border: Style::PLAIN,
            hr: Style::PLAIN,
            list_bullet: Style::PLAIN,
            bold: Style::PLAIN,
            italic: Style::PLAIN,
            strikethrough: Style::PLAIN,
            underline: Style::PLAIN,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct MarkdownRenderer {
    theme: MarkdownTheme,
    highlight: bool,
}

impl MarkdownRenderer {
    /// Default colors with syntax-highlighted code blocks.
    pub fn new() -> Self {
        Self {
            theme: MarkdownTheme::default(),
            highlight: true,
        }
    }

    pub fn with_theme(theme: MarkdownTheme) -> Self {
        Self {
            theme,
            highlight: false,
        }
    }

    pub fn with_highlighting(mut self, highlight: bool) -> Self {
        self.highlight = highlight;
        self
    }

    pub fn render_markdown(&self, text: &str, width: usize) -> Vec<String> {
        if text.trim().is_empty() {
            return Vec::new();
        }

        let normalized = text.replace('\t', "   ");
        let root = to_mdast(&normalized, &ParseOptions::gfm()).unwrap_or_else(|_| {
            mdast::Node::Text(mdast::Text {
                value: normalized.clone(),
                position: None,
            })
        });
        let nodes = match root {
            mdast::Node::Root(root) => root.children,
            other => vec![other],
        };

        let width = width.max(1);
        let pass = Pass {
            theme: &self.theme,
            highlight: self.highlight,
        };
        let lines = pass.render_blocks(&nodes, width);

        lines
            .iter()
            .flat_map(|line| wrap_text_with_ansi(line, width))
            .collect()
    }
}

impl Renderer for MarkdownRenderer {
    fn render(&self, text: &str, options: &RenderOptions) -> Result<Vec<String>, RenderError> {
        Ok(self.render_markdown(text, options.width.unwrap_or(DEFAULT_WIDTH)))
    }
}

struct Pass<'a> {
    theme: &'a MarkdownTheme,
    highlight: bool,
}

impl Pass<'_> {
    fn render_blocks(&self, nodes: &[mdast::Node], width: usize) -> Vec<String> {
        let mut lines = Vec::new();
        for node in nodes {
            let block = self.render_block(node, width);
            if block.is_empty() {
                continue;
            }
            if !lines.is_empty() {
                lines.push(String::new());
            }
            lines.extend(block);
        }
        lines
    }

    fn render_block(&self, node: &mdast::Node, width: usize) -> Vec<String> {
        match node {
            mdast::Node::Heading(heading) => {
                let text = self.render_inline(&heading.children);
                let styled = match heading.depth {
                    1 => self
                        .theme
                        .heading
                        .apply(&self.theme.bold.apply(&self.theme.underline.apply(&text))),
                    2 => self.theme.heading.apply(&self.theme.bold.apply(&text)),
                    depth => {
                        let marker = "#".repeat(usize::from(depth));
                        self.theme
                            .heading
                            .apply(&self.theme.bold.apply(&format!("{marker} {text}")))
                    }
                };
                vec![styled]
            }
            mdast::Node::Paragraph(paragraph) => split_lines(&self.render_inline(&paragraph.children)),
            mdast::Node::Code(code) => self.render_code(&code.value, code.lang.as_deref()),
            mdast::Node::Math(math) => self.render_code(&math.value, None),
            mdast::Node::List(list) => self.render_list(list, width),
            mdast::Node::Blockquote(quote) => self.render_blockquote(quote, width),
            mdast::Node::ThematicBreak(_) => vec![self.theme.hr.apply(&"─".repeat(width.min(80)))],
            mdast::Node::Table(table) => self.render_table(table, width),
            mdast::Node::Html(html) => split_lines(html.value.trim()),
            mdast::Node::Text(text) => split_lines(&text.value),
            _ => Vec::new(),
        }
    }

    fn render_inline(&self, nodes: &[mdast::Node]) -> String {
        let mut out = String::new();
        for node in nodes {
            match node {
                mdast::Node::Text(text) => out.push_str(&text.value),
                mdast::Node::Strong(strong) => {
                    out.push_str(&self.theme.bold.apply(&self.render_inline(&strong.children)));
                }
                mdast::Node::Emphasis(emphasis) => {
                    out.push_str(&self.theme.italic.apply(&self.render_inline(&emphasis.children)));
                }
                mdast::Node::Delete(delete) => {
                    out.push_str(
                        &self
                            .theme
                            .strikethrough
                            .apply(&self.render_inline(&delete.children)),
                    );
                }
                mdast::Node::InlineCode(code) => out.push_str(&self.theme.code.apply(&code.value)),
                mdast::Node::Link(link) => {
                    let label = self.render_inline(&link.children);
                    out.push_str(&self.theme.link.apply(&self.theme.underline.apply(&label)));
                    let plain = plain_text(&link.children);
                    let href = link.url.as_str();
                    let bare = href.strip_prefix("mailto:").unwrap_or(href);
                    if plain != href && plain != bare {
                        out.push_str(&self.theme.link_url.apply(&format!(" ({href})")));
                    }
                }
                mdast::Node::Image(image) => {
                    let alt = if image.alt.is_empty() {
                        image.url.as_str()
                    } else {
                        image.alt.as_str()
                    };
                    out.push_str(alt);
                }
                mdast::Node::Break(_) => out.push('\n'),
                mdast::Node::Html(html) => out.push_str(&html.value),
                mdast::Node::InlineMath(math) => out.push_str(&self.theme.code.apply(&math.value)),
                mdast::Node::Paragraph(paragraph) => {
                    out.push_str(&self.render_inline(&paragraph.children));
                }
                _ => {}
            }
        }
        out
    }

    fn render_code(&self, code: &str, lang: Option<&str>) -> Vec<String> {
        let mut lines = vec![self
            .theme
            .code_block_border
            .apply(&format!("```{}", lang.unwrap_or_default()))];

        let highlighted = if self.highlight {
            highlight_code(code, lang)
        } else {
            None
        };
        match highlighted {
            Some(highlighted) => {
                lines.extend(highlighted.into_iter().map(|line| format!("{CODE_INDENT}{line}")));
            }
            None => lines.extend(
                code.split('\n')
                    .map(|line| format!("{CODE_INDENT}{}", self.theme.code_block.apply(line))),
            ),
        }

        lines.push(self.theme.code_block_border.apply("```"));
        lines
    }

    fn render_list(&self, list: &mdast::List, width: usize) -> Vec<String> {
        let mut lines = Vec::new();
        let start = list.start.unwrap_or(1);

        for (index, node) in list.children.iter().enumerate() {
            let mdast::Node::ListItem(item) = node else {
                continue;
            };
            let mut bullet = if list.ordered {
                format!("{}. ", start as usize + index)
            } else {
                "- ".to_string()
            };
            match item.checked {
                Some(true) => bullet.push_str("[x] "),
                Some(false) => bullet.push_str("[ ] "),
                None => {}
            }

            let continuation = " ".repeat(visible_width(&bullet));
            let inner_width = width.saturating_sub(continuation.len()).max(1);
            let body = self.render_list_item(item, inner_width);
            let bullet = self.theme.list_bullet.apply(&bullet);

            if body.is_empty() {
                lines.push(bullet);
                continue;
            }
            for (line_index, line) in body.into_iter().enumerate() {
                if line_index == 0 {
                    lines.push(format!("{bullet}{line}"));
                } else if line.is_empty() {
                    lines.push(line);
                } else {
                    lines.push(format!("{continuation}{line}"));
                }
            }
        }

        lines
    }

    fn render_list_item(&self, item: &mdast::ListItem, width: usize) -> Vec<String> {
        let mut lines = Vec::new();
        for (index, child) in item.children.iter().enumerate() {
            let block = match child {
                mdast::Node::Paragraph(paragraph) => self
                    .render_inline(&paragraph.children)
                    .split('\n')
                    .flat_map(|line| wrap_text_with_ansi(line, width))
                    .collect(),
                other => self.render_block(other, width),
            };
            if index > 0 && item.spread && !lines.is_empty() {
                lines.push(String::new());
            }
            lines.extend(block);
        }
        lines
    }

    fn render_blockquote(&self, quote: &mdast::Blockquote, width: usize) -> Vec<String> {
        let inner_width = width.saturating_sub(visible_width(QUOTE_PREFIX)).max(1);
        let border = self.theme.quote_border.apply(QUOTE_PREFIX);

        self.render_blocks(&quote.children, inner_width)
            .iter()
            .flat_map(|line| wrap_text_with_ansi(line, inner_width))
            .map(|line| {
                format!(
                    "{border}{}",
                    self.theme.quote.apply(&self.theme.italic.apply(&line))
                )
            })
            .collect()
    }

    fn render_table(&self, table: &mdast::Table, width: usize) -> Vec<String> {
        let rows: Vec<Vec<String>> = table
            .children
            .iter()
            .filter_map(|node| match node {
                mdast::Node::TableRow(row) => Some(
                    row.children
                        .iter()
                        .map(|cell| match cell {
                            mdast::Node::TableCell(cell) => self.render_inline(&cell.children),
                            other => self.render_inline(std::slice::from_ref(other)),
                        })
                        .collect(),
                ),
                _ => None,
            })
            .collect();

        let columns = rows.iter().map(Vec::len).max().unwrap_or(0);
        if columns == 0 {
            return Vec::new();
        }

        let border_overhead = 3 * columns + 1;
        let available = width.saturating_sub(border_overhead);
        if available < columns {
            return rows.iter().map(|row| row.join(" | ")).collect();
        }

        let mut widths = vec![1usize; columns];
        for row in &rows {
            for (column, cell) in row.iter().enumerate() {
                widths[column] = widths[column].max(visible_width(cell));
            }
        }
        while widths.iter().sum::<usize>() > available {
            let Some((widest, _)) = widths
                .iter()
                .enumerate()
                .filter(|(_, width)| **width > 1)
                .max_by_key(|(_, width)| **width)
            else {
                break;
            };
            widths[widest] -= 1;
        }

        let rule = |left: &str, mid: &str, right: &str| {
            let cells: Vec<String> = widths.iter().map(|width| "─".repeat(*width)).collect();
            format!("{left}─{}─{right}", cells.join(&format!("─{mid}─")))
        };

        let mut lines = vec![rule("┌", "┬", "┐")];
        for (row_index, row) in rows.iter().enumerate() {
            let wrapped: Vec<Vec<String>> = (0..columns)
                .map(|column| {
                    let cell = row.get(column).map(String::as_str).unwrap_or_default();
                    wrap_text_with_ansi(cell, widths[column])
                })
                .collect();
            let height = wrapped.iter().map(Vec::len).max().unwrap_or(1);

            for line_index in 0..height {
                let parts: Vec<String> = wrapped
                    .iter()
                    .enumerate()
                    .map(|(column, cell_lines)| {
                        let text = cell_lines.get(line_index).map(String::as_str).unwrap_or_default();
                        let padded = format!(
                            "{text}{}",
                            " ".repeat(widths[column].saturating_sub(visible_width(text)))
                        );
                        if row_index == 0 {
                            self.theme.bold.apply(&padded)
                        } else {
                            padded
                        }
                    })
                    .collect();
                lines.push(format!("│ {} │", parts.join(" │ ")));
            }

            if row_index + 1 < rows.len() {
                lines.push(rule("├", "┼", "┤"));
            }
        }
        lines.push(rule("└", "┴", "┘"));
        lines
    }
}

fn split_lines(text: &str) -> Vec<String> {
    text.split('\n').map(str::to_string).collect()
}

fn plain_text(nodes: &[mdast::Node]) -> String {
    let mut out = String::new();
    for node in nodes {
        match node {
            mdast::Node::Text(text) => out.push_str(&text.value),
            mdast::Node::InlineCode(code) => out.push_str(&code.value),
            mdast::Node::Strong(strong) => out.push_str(&plain_text(&strong.children)),
            mdast::Node::Emphasis(emphasis) => out.push_str(&plain_text(&emphasis.children)),
            mdast::Node::Delete(delete) => out.push_str(&plain_text(&delete.children)),
            mdast::Node::Link(link) => out.push_str(&plain_text(&link.children)),
            _ => {}
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::{MarkdownRenderer, MarkdownTheme, Style};
    use crate::render::{RenderOptions, Renderer};
    use crate::text::visible_width;

    fn tagged_theme() -> MarkdownTheme {
        MarkdownTheme {
            heading: Style::new("<h>", "</h>"),
            link: Style::new("<l>", "</l>"),
            link_url: Style::new("<u>", "</u>"),
            bold: Style::new("<b>", "</b>"),
            italic: Style::new("<i>", "</i>"),
            underline: Style::new("<u>", "</u>"),
            quote: Style::new("<q>", "</q>"),
            list_bullet: Style::new("<li>", "</li>"),
            ..MarkdownTheme::plain()
        }
    }

    fn render(text: &str, width: usize) -> Vec<String> {
        MarkdownRenderer::with_theme(tagged_theme()).render_markdown(text, width)
    }

    #[test]
    fn headings_apply_styles_and_spacing() {
        let lines = render("# Title\nParagraph", 40);
        assert_eq!(lines, vec!["<h><b><u>Title</u></b></h>", "", "Paragraph"]);
    }

    #[test]
    fn link_renders_url_only_when_needed() {
        let lines = render("[x](x)\n\n[y](z)", 80);
        assert_eq!(lines[0], "<l><u>x</u></l>");
        assert_eq!(lines[2], "<l><u>y</u></l><u> (z)</u>");
    }

    #[test]
    fn list_renders_bullets_and_nesting() {
        let lines = render("- one\n- two\n  - inner", 80);
        assert_eq!(lines[0], "<li>- </li>one");
        assert_eq!(lines[1], "<li>- </li>two");
        assert_eq!(lines[2], "  <li>- </li>inner");
    }

    #[test]
    fn ordered_list_counts_from_start() {
        let lines = render("3. c\n4. d", 80);
        assert_eq!(lines, vec!["<li>3. </li>c", "<li>4. </li>d"]);
    }

    #[test]
    fn blockquote_is_prefixed() {
        let lines = render("> quote", 80);
        assert_eq!(lines, vec!["│ <q><i>quote</i></q>"]);
    }

    #[test]
    fn code_block_is_fenced_and_indented() {
        let lines = render("```\nlet x = 1;\n```", 80);
        assert_eq!(lines, vec!["```", "  let x = 1;", "```"]);
    }

    #[test]
    fn table_renders_borders_within_width() {
        let lines = MarkdownRenderer::with_theme(MarkdownTheme::plain())
            .render_markdown("| a | b |\n| - | - |\n| c | d |", 40);
        assert_eq!(lines.first().map(String::as_str), Some("┌───┬───┐"));
        assert_eq!(lines.last().map(String::as_str), Some("└───┴───┘"));
        assert!(lines.contains(&"│ a │ b │".to_string()));
    }

    #[test]
    fn paragraphs_wrap_to_width() {
        let text = "word ".repeat(40);
        for line in render(&text, 20) {
            assert!(visible_width(&line) <= 20);
        }
    }

    #[test]
    fn blank_input_renders_nothing() {
        let renderer = MarkdownRenderer::new();
        let lines = renderer
            .render("  \n", &RenderOptions::default())
            .expect("builtin renderer never fails");
        assert!(lines.is_empty());
    }

    #[test]
    fn rendering_is_deterministic() {
        let renderer = MarkdownRenderer::new();
        let options = RenderOptions::default().with_width(60);
        let text = "# Hi\n\nSome `code` and **bold**.\n\n```rust\nfn main() {}\n```\n";
        let first = renderer.render(text, &options).expect("render");
        let second = renderer.render(text, &options).expect("render");
        assert_eq!(first, second);
    }
}
