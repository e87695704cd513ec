use std::io::{self, BufRead, BufReader, Lines};
use std::process::{Child, ChildStdout, Command, ExitStatus, Stdio};

/// The AI command-line tool that answers a prompt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Provider {
    Sgpt,
    Perplexity,
}

impl Provider {
    pub fn from_flag(perplexity: bool) -> Self {
        if perplexity {
            Self::Perplexity
        } else {
            Self::Sgpt
        }
    }

    pub fn program(self) -> &'static str {
        match self {
            Self::Sgpt => "sgpt",
            Self::Perplexity => "perplexity",
        }
    }

    pub fn args(self, prompt: &str) -> Vec<String> {
        let flags: &[&str] = match self {
            Self::Sgpt => &["--stream"],
            Self::Perplexity => &["-g", "--stream", "--citation"],
        };
        flags
            .iter()
            .map(|flag| flag.to_string())
            .chain(std::iter::once(prompt.to_string()))
            .collect()
    }

    /// Whether the saved context is folded into the prompt.
    pub fn accepts_context(self) -> bool {
        matches!(self, Self::Sgpt)
    }
}

/// A running query tool, read line by line from its stdout.
///
/// Stderr is inherited so the tool's own diagnostics reach the user. When stdout ends the child
/// is reaped; a failing exit status is yielded as a final error. Dropping an unfinished process
/// kills it.
pub struct QueryProcess {
    program: String,
    child: Child,
    lines: Option<Lines<BufReader<ChildStdout>>>,
}

impl QueryProcess {
    pub fn spawn(provider: Provider, prompt: &str) -> io::Result<Self> {
        Self::spawn_command(provider.program(), provider.args(prompt))
    }

    pub fn spawn_command<I, S>(program: &str, args: I) -> io::Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<std::ffi::OsStr>,
    {
        let mut child = Command::new(program)
            .args(args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::inherit())
            .spawn()?;
        let stdout = child
            .stdout
            .take()
            .ok_or_else(|| io::Error::other(format!("{program} has no stdout pipe")))?;
        tracing::debug!(program, pid = child.id(), "query process started");

        Ok(Self {
            program: program.to_string(),
            child,
            lines: Some(BufReader::new(stdout).lines()),
        })
    }

    fn finish(&mut self) -> Option<io::Error> {
        self.lines = None;
        match self.child.wait() {
            Ok(status) if status.success() => {
                tracing::debug!(program = %self.program, "query process finished");
                None
            }
            Ok(status) => Some(io::Error::other(format!(
                "{} failed with {}",
                self.program,
                describe_status(status)
            ))),
            Err(error) => Some(error),
        }
    }
}

impl Iterator for QueryProcess {
    type Item = io::Result<String>;

    fn next(&mut self) -> Option<Self::Item> {
        let lines = self.lines.as_mut()?;
        match lines.next() {
            Some(Ok(line)) => Some(Ok(line)),
            Some(Err(error)) => {
                self.lines = None;
                Some(Err(error))
            }
            None => self.finish().map(Err),
        }
    }
}

impl Drop for QueryProcess {
    fn drop(&mut self) {
        if let Ok(None) = self.child.try_wait() {
            let _ = self.child.kill();
            let _ = self.child.wait();
        }
    }
}

fn describe_status(status: ExitStatus) -> String {
    match status.code() {
        Some(code) => format!("exit code {code}"),
        None => "termination by signal".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::Provider;

    #[test]
    fn provider_commands_match_the_tools() {
        assert_eq!(Provider::Sgpt.args("q"), vec!["--stream", "q"]);
        assert_eq!(
            Provider::Perplexity.args("q"),
            vec!["-g", "--stream", "--citation", "q"]
        );
        assert!(Provider::Sgpt.accepts_context());
        assert!(!Provider::Perplexity.accepts_context());
    }

    #[cfg(unix)]
    #[test]
    fn lines_are_streamed_then_exit_status_checked() {
        let lines: Vec<_> = super::QueryProcess::spawn_command("sh", ["-c", "echo one; echo two"])
            .expect("sh spawns")
            .collect();
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[1].as_ref().expect("line"), "two");

        let failing: Vec<_> = super::QueryProcess::spawn_command("sh", ["-c", "echo partial; exit 3"])
            .expect("sh spawns")
            .collect();
        assert_eq!(failing.len(), 2);
        let error = failing[1].as_ref().expect_err("exit status surfaces");
        assert!(error.to_string().contains("exit code 3"));
    }
}
