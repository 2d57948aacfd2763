use crate::command::ExitCode;
use std::io;

/// Errors produced while resolving, wiring up or running a command line.
///
/// The `Display` output of every variant is the exact diagnostic printed to the
/// user, so callers can write `{err}` straight to the error stream.
#[derive(Debug, thiserror::Error)]
pub enum ShellError {
    /// Neither a built-in nor an executable reachable through `PATH`.
    #[error("{0}: command not found")]
    CommandNotFound(String),

    /// A redirection target could not be opened.
    #[error("redirection error: {path}: {source}")]
    Redirection {
        path: String,
        #[source]
        source: io::Error,
    },

    /// The OS refused to start an external command.
    #[error("{name}: {source}")]
    Spawn {
        name: String,
        #[source]
        source: io::Error,
    },

    /// Waiting for an external command failed.
    #[error("{name}: failed to wait for process: {source}")]
    Wait {
        name: String,
        #[source]
        source: io::Error,
    },

    /// A pipeline stage finished with a non-zero status.
    #[error("{name}: exited with status {code}")]
    StageFailed { name: String, code: ExitCode },

    /// A `|` with no command on one side.
    #[error("syntax error near unexpected token `|'")]
    EmptyStage,

    /// A pipeline was constructed with fewer than two stages.
    #[error("pipeline needs at least two stages, got {0}")]
    PipelineTooShort(usize),

    /// Allocating an OS pipe failed.
    #[error("failed to create pipe: {0}")]
    Pipe(#[source] io::Error),

    #[error(transparent)]
    Io(#[from] io::Error),
}

impl ShellError {
    /// Exit status a shell reports for this error.
    pub fn exit_code(&self) -> ExitCode {
        match self {
            ShellError::CommandNotFound(_) => 127,
            ShellError::StageFailed { code, .. } => *code,
            _ => 1,
        }
    }
}
