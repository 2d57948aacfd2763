use crate::command::ExitCode;
use crate::env::Environment;
use crate::io_adapters::IoStreams;
use anyhow::{Result, anyhow, bail};
use std::env;
use std::io::{Read, Write};
use std::path::PathBuf;

/// Names of the commands the shell implements itself.
pub const BUILTIN_NAMES: [&str; 5] = ["echo", "exit", "type", "pwd", "cd"];

/// Standard streams handed to a built-in.
///
/// Built-ins never touch the process-wide streams directly; whoever runs them
/// decides what these point at (terminal, redirection file or pipe).
pub struct BuiltinIo<'a> {
    pub stdin: &'a mut dyn Read,
    pub stdout: &'a mut dyn Write,
    pub stderr: &'a mut dyn Write,
}

/// Built-in commands known to the shell at compile time.
///
/// Builtins are executed directly in-process without spawning a child process.
pub(crate) trait BuiltinCommand: Sized {
    /// Canonical name of the command, e.g. "echo" or "cd".
    fn name() -> &'static str;

    /// Build the command from its arguments. Built-ins take no flags.
    fn from_args(args: &[String]) -> Self;

    /// Executes the command using provided IO streams and environment.
    ///
    /// Return value should follow shell conventions: 0 for success, non-zero for error.
    fn execute(self, io: &mut BuiltinIo<'_>, env: &mut Environment) -> Result<ExitCode>;
}

/// Run a built-in, turning an error into a diagnostic and status 1.
fn run<T: BuiltinCommand>(args: &[String], io: &mut BuiltinIo<'_>, env: &mut Environment) -> ExitCode {
    let code = match T::from_args(args).execute(io, env) {
        Ok(code) => code,
        Err(e) => {
            let _ = writeln!(io.stderr, "{e}");
            1
        }
    };
    let _ = io.stdout.flush();
    let _ = io.stderr.flush();
    code
}

/// One of the five built-in commands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Builtin {
    Echo,
    Exit,
    Type,
    Pwd,
    Cd,
}

impl Builtin {
    pub const ALL: [Builtin; 5] = [
        Builtin::Echo,
        Builtin::Exit,
        Builtin::Type,
        Builtin::Pwd,
        Builtin::Cd,
    ];

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|builtin| builtin.name() == name)
    }

    pub fn name(self) -> &'static str {
        match self {
            Builtin::Echo => Echo::name(),
            Builtin::Exit => Exit::name(),
            Builtin::Type => Type::name(),
            Builtin::Pwd => Pwd::name(),
            Builtin::Cd => Cd::name(),
        }
    }

    /// Execute with the given streams and return the exit status.
    ///
    /// `exit` does not return: it ends the whole process with status 0, even
    /// when it is one stage of a pipeline.
    pub fn run(self, args: &[String], io: &mut BuiltinIo<'_>, env: &mut Environment) -> ExitCode {
        match self {
            Builtin::Echo => run::<Echo>(args, io, env),
            Builtin::Exit => run::<Exit>(args, io, env),
            Builtin::Type => run::<Type>(args, io, env),
            Builtin::Pwd => run::<Pwd>(args, io, env),
            Builtin::Cd => run::<Cd>(args, io, env),
        }
    }

    /// Execute bound to owned streams, closing them once the built-in returns.
    pub fn run_with_streams(self, args: &[String], io: IoStreams, env: &mut Environment) -> ExitCode {
        let mut stdin = io.stdin.into_reader();
        let mut stdout = io.stdout.into_writer();
        let mut stderr = io.stderr.into_writer();
        let mut builtin_io = BuiltinIo {
            stdin: &mut *stdin,
            stdout: &mut *stdout,
            stderr: &mut *stderr,
        };
        self.run(args, &mut builtin_io, env)
    }
}

/// Run the built-in called `name`, or return `None` when there is no such built-in.
pub fn run_builtin(
    name: &str,
    args: &[String],
    io: &mut BuiltinIo<'_>,
    env: &mut Environment,
) -> Option<ExitCode> {
    Builtin::from_name(name).map(|builtin| builtin.run(args, io, env))
}

pub fn is_builtin(name: &str) -> bool {
    Builtin::from_name(name).is_some()
}

/// Print the current working directory to standard output.
pub struct Pwd;

impl BuiltinCommand for Pwd {
    fn name() -> &'static str {
        "pwd"
    }

    fn from_args(_args: &[String]) -> Self {
        Pwd
    }

    fn execute(self, io: &mut BuiltinIo<'_>, _env: &mut Environment) -> Result<ExitCode> {
        let dir = env::current_dir().map_err(|e| anyhow!("pwd: {e}"))?;
        writeln!(io.stdout, "{}", dir.display())?;
        Ok(0)
    }
}

/// Change the current working directory.
///
/// No target is a no-op; `~` means the home directory.
pub struct Cd {
    pub target: Option<String>,
}

impl BuiltinCommand for Cd {
    fn name() -> &'static str {
        "cd"
    }

    fn from_args(args: &[String]) -> Self {
        Cd {
            target: args.first().cloned(),
        }
    }

    fn execute(self, _io: &mut BuiltinIo<'_>, env: &mut Environment) -> Result<ExitCode> {
        let Some(target) = self.target else {
            return Ok(0);
        };

        let dir = if target == "~" {
            env.home_dir()
                .ok_or_else(|| anyhow!("cd: could not find home directory"))?
        } else {
            PathBuf::from(&target)
        };

        env::set_current_dir(&dir)
            .map_err(|_| anyhow!("cd: {}: No such file or directory", dir.display()))?;
        Ok(0)
    }
}

/// Exit shell process
pub struct Exit;

impl BuiltinCommand for Exit {
    fn name() -> &'static str {
        "exit"
    }

    fn from_args(_args: &[String]) -> Self {
        Exit
    }

    fn execute(self, _io: &mut BuiltinIo<'_>, _env: &mut Environment) -> Result<ExitCode> {
        std::process::exit(0)
    }
}

/// Write the arguments to standard output, separated by spaces, with a trailing newline.
pub struct Echo {
    pub args: Vec<String>,
}

impl BuiltinCommand for Echo {
    fn name() -> &'static str {
        "echo"
    }

    fn from_args(args: &[String]) -> Self {
        Echo {
            args: args.to_vec(),
        }
    }

    fn execute(self, io: &mut BuiltinIo<'_>, _env: &mut Environment) -> Result<ExitCode> {
        writeln!(io.stdout, "{}", self.args.join(" "))?;
        Ok(0)
    }
}

/// Report whether a name is a built-in or where it resolves on `PATH`.
pub struct Type {
    pub name: Option<String>,
}

impl BuiltinCommand for Type {
    fn name() -> &'static str {
        "type"
    }

    fn from_args(args: &[String]) -> Self {
        Type {
            name: args.first().cloned(),
        }
    }

    fn execute(self, io: &mut BuiltinIo<'_>, env: &mut Environment) -> Result<ExitCode> {
        let Some(name) = self.name else {
            bail!("type: missing argument");
        };

        if is_builtin(&name) {
            writeln!(io.stdout, "{name} is a shell builtin")?;
            return Ok(0);
        }
        match env.find_executable(&name) {
            Some(path) => {
                writeln!(io.stdout, "{name} is {}", path.display())?;
                Ok(0)
            }
            None => {
                writeln!(io.stdout, "{name}: not found")?;
                Ok(1)
            }
        }
    }
}
