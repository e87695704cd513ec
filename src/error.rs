use std::process::ExitStatus;
use std::time::Duration;

use thiserror::Error;

use crate::reconcile::ReconcilerState;

#[derive(Debug, Error)]
pub enum RenderError {
    #[error("failed to launch renderer `{program}`: {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("I/O error while {operation} renderer `{program}`: {source}")]
    Io {
        program: String,
        operation: &'static str,
        #[source]
        source: std::io::Error,
    },

    #[error("renderer `{program}` exited with {status}: {stderr}")]
    Exit {
        program: String,
        status: ExitStatus,
        stderr: String,
    },

    #[error("renderer `{program}` timed out after {}s", timeout.as_secs())]
    Timeout { program: String, timeout: Duration },

    #[error("renderer `{program}` produced output that is not valid UTF-8")]
    InvalidUtf8 { program: String },
}

impl RenderError {
    #[must_use]
    pub fn io(program: impl Into<String>, operation: &'static str, source: std::io::Error) -> Self {
        Self::Io {
            program: program.into(),
            operation,
            source,
        }
    }
}

#[derive(Debug, Error)]
pub enum StreamError {
    #[error("reading fragment {fragment_index} from the source failed: {source}")]
    Source {
        fragment_index: usize,
        #[source]
        source: std::io::Error,
    },

    #[error("rendering fragment {fragment_index} failed: {source}")]
    Render {
        fragment_index: usize,
        #[source]
        source: RenderError,
    },

    #[error("writing rendered output failed: {0}")]
    Output(#[source] std::io::Error),

    #[error("cannot {operation} a reconciler in state {state:?}")]
    InvalidState {
        operation: &'static str,
        state: ReconcilerState,
    },
}

impl StreamError {
    /// Index of the fragment the failure is attributed to, when there is one.
    #[must_use]
    pub fn fragment_index(&self) -> Option<usize> {
        match self {
            Self::Source { fragment_index, .. } | Self::Render { fragment_index, .. } => {
                Some(*fragment_index)
            }
            Self::Output(_) | Self::InvalidState { .. } => None,
        }
    }
}
