use crate::command::{ExitCode, exit_code_of};
use crate::error::ShellError;
use crate::io_adapters::IoStreams;
use log::debug;
use std::path::PathBuf;
use std::process::{Child, Command};

/// Command that is not a builtin.
#[derive(Debug, Clone)]
pub struct ExternalCommand {
    name: String,
    path: PathBuf,
    args: Vec<String>,
}

impl ExternalCommand {
    /// `name` is what the user typed; `path` is where it was resolved to.
    pub fn new(name: impl Into<String>, path: PathBuf, args: Vec<String>) -> Self {
        Self {
            name: name.into(),
            path,
            args,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Start the process with its standard streams bound to `io`.
    ///
    /// `io` is consumed, so the parent's copies of any pipe ends are closed as
    /// soon as the child has been started.
    pub fn spawn(&self, io: IoStreams) -> Result<Child, ShellError> {
        let mut cmd = Command::new(&self.path);
        cmd.args(&self.args)
            .stdin(io.stdin.into_stdio())
            .stdout(io.stdout.into_stdio())
            .stderr(io.stderr.into_stdio());
        #[cfg(unix)]
        {
            use std::os::unix::process::CommandExt;
            cmd.arg0(&self.name);
        }
        debug!("spawning {} ({})", self.name, self.path.display());
        cmd.spawn().map_err(|source| ShellError::Spawn {
            name: self.name.clone(),
            source,
        })
    }

    /// Spawn and wait for completion.
    pub fn run(&self, io: IoStreams) -> Result<ExitCode, ShellError> {
        let mut child = self.spawn(io)?;
        let status = child.wait().map_err(|source| ShellError::Wait {
            name: self.name.clone(),
            source,
        })?;
        Ok(exit_code_of(status))
    }
}
