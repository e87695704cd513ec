use std::io::{self, Read, Write};
use std::process::{Child, Command, Stdio};
use std::thread::{self, JoinHandle};
use std::time::Duration;

use wait_timeout::ChildExt;

use super::{split_rendered_lines, RenderError, RenderOptions, Renderer};
use crate::config::DEFAULT_RENDER_TIMEOUT_SEC;

const GLOW_PROGRAM: &str = "glow";
const STDERR_EXCERPT_BYTES: usize = 2 * 1024;

/// Renders markdown by piping it through a fresh `glow` process on every call.
///
/// Color output is forced (`CLICOLOR_FORCE=1`) because stdout is a pipe, not a terminal.
#[derive(Debug, Clone)]
pub struct GlowRenderer {
    program: String,
    args: Vec<String>,
    pass_render_options: bool,
    env: Vec<(String, String)>,
    timeout: Duration,
}

impl Default for GlowRenderer {
    fn default() -> Self {
        Self::new()
    }
}

impl GlowRenderer {
    pub fn new() -> Self {
        Self {
            program: GLOW_PROGRAM.to_string(),
            args: Vec::new(),
            pass_render_options: true,
            env: vec![("CLICOLOR_FORCE".to_string(), "1".to_string())],
            timeout: Duration::from_secs(DEFAULT_RENDER_TIMEOUT_SEC),
        }
    }

    /// Any stdin-to-stdout filter used as a renderer. Width and style options are not
    /// forwarded to it.
    pub fn from_command<I, S>(program: impl Into<String>, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            program: program.into(),
            args: args.into_iter().map(Into::into).collect(),
            pass_render_options: false,
            env: Vec::new(),
            timeout: Duration::from_secs(DEFAULT_RENDER_TIMEOUT_SEC),
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn program(&self) -> &str {
        &self.program
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    fn command_args(&self, options: &RenderOptions) -> Vec<String> {
        let mut args = self.args.clone();
        if self.pass_render_options {
            if let Some(width) = options.width {
                args.push("-w".to_string());
                args.push(width.to_string());
            }
            if let Some(style) = options.style.as_ref() {
                args.push("--style".to_string());
                args.push(style.display().to_string());
            }
        }
        args
    }

    fn spawn(&self, options: &RenderOptions) -> Result<Child, RenderError> {
        Command::new(&self.program)
            .args(self.command_args(options))
            .envs(self.env.iter().map(|(key, value)| (key, value)))
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|source| RenderError::Spawn {
                program: self.program.clone(),
                source,
            })
    }
}

impl Renderer for GlowRenderer {
    fn render(&self, text: &str, options: &RenderOptions) -> Result<Vec<String>, RenderError> {
        let mut child = self.spawn(options)?;

        let writer = spawn_writer(child.stdin.take(), text.as_bytes().to_vec());
        let stdout = spawn_reader(child.stdout.take());
        let stderr = spawn_reader(child.stderr.take());

        let status = match child.wait_timeout(self.timeout) {
            Ok(Some(status)) => status,
            Ok(None) => {
                let _ = child.kill();
                let _ = child.wait();
                tracing::warn!(program = %self.program, timeout_secs = self.timeout.as_secs(), "renderer timed out");
                return Err(RenderError::Timeout {
                    program: self.program.clone(),
                    timeout: self.timeout,
                });
            }
            Err(source) => {
                let _ = child.kill();
                let _ = child.wait();
                return Err(RenderError::io(&self.program, "waiting for", source));
            }
        };

        let stdout = join_reader(stdout).map_err(|source| {
            RenderError::io(&self.program, "reading output of", source)
        })?;
        let stderr = join_reader(stderr).unwrap_or_default();

        if !status.success() {
            return Err(RenderError::Exit {
                program: self.program.clone(),
                status,
                stderr: stderr_excerpt(&stderr),
            });
        }

        match writer.join() {
            Ok(Ok(())) => {}
            Ok(Err(source)) if source.kind() == io::ErrorKind::BrokenPipe => {}
            Ok(Err(source)) => {
                return Err(RenderError::io(&self.program, "writing input to", source));
            }
            Err(_) => {
                return Err(RenderError::io(
                    &self.program,
                    "writing input to",
                    io::Error::other("stdin writer thread panicked"),
                ));
            }
        }

        if !stderr.is_empty() {
            tracing::debug!(program = %self.program, stderr = %stderr_excerpt(&stderr), "renderer wrote to stderr");
        }

        let output = String::from_utf8(stdout).map_err(|_| RenderError::InvalidUtf8 {
            program: self.program.clone(),
        })?;
        Ok(split_rendered_lines(&output))
    }
}

fn spawn_writer(stdin: Option<impl Write + Send + 'static>, input: Vec<u8>) -> JoinHandle<io::Result<()>> {
    thread::spawn(move || {
        let Some(mut stdin) = stdin else {
            return Ok(());
        };
        stdin.write_all(&input)?;
        stdin.flush()
    })
}

fn spawn_reader(pipe: Option<impl Read + Send + 'static>) -> JoinHandle<io::Result<Vec<u8>>> {
    thread::spawn(move || {
        let mut bytes = Vec::new();
        if let Some(mut pipe) = pipe {
            pipe.read_to_end(&mut bytes)?;
        }
        Ok(bytes)
    })
}

fn join_reader(handle: JoinHandle<io::Result<Vec<u8>>>) -> io::Result<Vec<u8>> {
    handle
        .join()
        .map_err(|_| io::Error::other("pipe reader thread panicked"))?
}

fn stderr_excerpt(bytes: &[u8]) -> String {
    let text = String::from_utf8_lossy(bytes);
    let text = text.trim();
    if text.len() <= STDERR_EXCERPT_BYTES {
        return text.to_string();
    }

    let mut cutoff = STDERR_EXCERPT_BYTES;
    while cutoff > 0 && !text.is_char_boundary(cutoff) {
        cutoff -= 1;
    }
    format!("{}[truncated]", &text[..cutoff])
}
