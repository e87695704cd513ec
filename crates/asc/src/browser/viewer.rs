use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;

use anyhow::{bail, Context, Result};
use asc_stream::{MarkdownRenderer, RendererKind};
use conversation_store::Conversation;
use tempfile::NamedTempFile;

/// Shows a conversation transcript in an external pager.
#[derive(Debug, Clone)]
pub struct Viewer {
    renderer: RendererKind,
    style: Option<PathBuf>,
    width: usize,
}

impl Viewer {
    pub fn new(renderer: RendererKind, style: Option<PathBuf>, width: usize) -> Self {
        Self {
            renderer,
            style,
            width,
        }
    }

    /// `glow -p` on the markdown transcript, or `less -R` on the in-process rendering.
    pub fn show(&self, conversation: &Conversation) -> Result<()> {
        let transcript = conversation.to_transcript();
        let contents = match self.renderer {
            RendererKind::Glow => transcript,
            RendererKind::Builtin => {
                let mut rendered = MarkdownRenderer::new()
                    .render_markdown(&transcript, self.width)
                    .join("\n");
                rendered.push('\n');
                rendered
            }
        };
        let file = transcript_file(&contents)?;
        let (program, args) = self.rendered_command(file.path());
        run_pager(&program, &args)
    }

    /// The raw markdown transcript in `less -SR`.
    pub fn show_raw(&self, conversation: &Conversation) -> Result<()> {
        let file = transcript_file(&conversation.to_transcript())?;
        let (program, args) = raw_command(file.path());
        run_pager(&program, &args)
    }

    pub fn rendered_command(&self, path: &Path) -> (String, Vec<String>) {
        match self.renderer {
            RendererKind::Glow => {
                let mut args = vec!["-p".to_string(), "-w".to_string(), self.width.to_string()];
                args.push(path.display().to_string());
                if let Some(style) = &self.style {
                    args.push("--style".to_string());
                    args.push(style.display().to_string());
                }
                ("glow".to_string(), args)
            }
            RendererKind::Builtin => (
                "less".to_string(),
                vec!["-R".to_string(), path.display().to_string()],
            ),
        }
    }
}

pub fn raw_command(path: &Path) -> (String, Vec<String>) {
    (
        "less".to_string(),
        vec!["-SR".to_string(), path.display().to_string()],
    )
}

/// A `conversation-*.md` temp file, removed when dropped.
fn transcript_file(contents: &str) -> Result<NamedTempFile> {
    let file = tempfile::Builder::new()
        .prefix("conversation-")
        .suffix(".md")
        .tempfile()
        .context("creating transcript file")?;
    fs::write(file.path(), contents).context("writing transcript file")?;
    Ok(file)
}

fn run_pager(program: &str, args: &[String]) -> Result<()> {
    tracing::debug!(program, ?args, "opening pager");
    let status = Command::new(program)
        .args(args)
        .status()
        .with_context(|| format!("launching `{program}`"))?;
    if !status.success() {
        bail!("`{program}` exited with {status}");
    }
    Ok(())
}
