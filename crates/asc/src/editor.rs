use std::fs;
use std::io::Write;
use std::process::Command;

use anyhow::{bail, Context, Result};

/// The editor command from `$EDITOR`, split on whitespace so `code -w` works.
pub fn editor_from_env() -> Result<Vec<String>> {
    let editor = std::env::var("EDITOR").unwrap_or_default();
    let command: Vec<String> = editor.split_whitespace().map(str::to_string).collect();
    if command.is_empty() {
        bail!("EDITOR is not set");
    }
    Ok(command)
}

/// Opens `initial` in `editor` and returns the saved text without trailing newlines.
pub fn edit_text(editor: &[String], initial: &str) -> Result<String> {
    let Some((program, args)) = editor.split_first() else {
        bail!("editor command is empty");
    };

    let mut file = tempfile::Builder::new()
        .prefix("edit-")
        .suffix(".txt")
        .tempfile()
        .context("creating temporary file for the editor")?;
    file.write_all(initial.as_bytes())
        .and_then(|()| file.flush())
        .context("writing message to the temporary file")?;

    tracing::info!(editor = %program, file = %file.path().display(), "opening editor");
    let status = Command::new(program)
        .args(args)
        .arg(file.path())
        .status()
        .with_context(|| format!("launching editor `{program}`"))?;
    if !status.success() {
        bail!("editor `{program}` exited with {status}");
    }

    let edited = fs::read_to_string(file.path()).context("reading the edited message")?;
    Ok(edited.trim_end_matches(['\n', '\r']).to_string())
}
