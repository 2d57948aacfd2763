use crate::builtin::Builtin;
use crate::env::Environment;
use std::path::PathBuf;
use std::process::ExitStatus;

/// Conventional process exit code type used by this crate.
///
/// A value of 0 indicates success; any non-zero value indicates failure.
/// This mirrors the convention used by POSIX shells and many command-line tools.
pub type ExitCode = i32;

/// What a command name refers to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CommandKind {
    Builtin(Builtin),
    External(PathBuf),
    NotFound,
}

impl CommandKind {
    /// Resolve `name`: built-ins win over anything on `PATH`.
    pub fn resolve(name: &str, env: &mut Environment) -> Self {
        if let Some(builtin) = Builtin::from_name(name) {
            return CommandKind::Builtin(builtin);
        }
        match env.find_executable(name) {
            Some(path) => CommandKind::External(path),
            None => CommandKind::NotFound,
        }
    }

    pub fn is_builtin(&self) -> bool {
        matches!(self, CommandKind::Builtin(_))
    }
}

/// Convert a finished process status into a shell exit code.
pub fn exit_code_of(status: ExitStatus) -> ExitCode {
    match status.code() {
        Some(x) => x,
        None => terminated_by_signal(status),
    }
}

#[cfg(unix)]
fn terminated_by_signal(exit_status: ExitStatus) -> i32 {
    use std::os::unix::process::ExitStatusExt;
    if let Some(signal) = ExitStatusExt::signal(&exit_status) {
        128 + signal
    } else if ExitStatusExt::core_dumped(&exit_status) {
        255
    } else {
        -1
    }
}

#[cfg(not(unix))]
fn terminated_by_signal(_exit_status: ExitStatus) -> i32 {
    -1
}
