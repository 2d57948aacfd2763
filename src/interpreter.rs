use crate::command::{CommandKind, ExitCode};
use crate::completion::ShellHelper;
use crate::env::Environment;
use crate::error::ShellError;
use crate::external::ExternalCommand;
use crate::io_adapters::IoStreams;
use crate::lexer::tokenize;
use crate::parser::{self, CommandLine};
use crate::pipeline::{self, Pipeline};
use log::{debug, warn};
use rustyline::error::ReadlineError;
use rustyline::history::DefaultHistory;
use rustyline::{CompletionType, Config, Editor, Result};
use std::cell::RefCell;
use std::io::Write;
use std::rc::Rc;

/// Reads lines, runs them, and keeps the state that outlives a single line.
///
/// The [`Environment`] is shared with the line editor's completion helper so
/// both see the same exec-path cache.
///
/// Example
/// ```no_run
/// use pipeshell::Interpreter;
/// let mut sh = Interpreter::default();
/// let code = sh.execute_line("echo hello | cat");
/// assert_eq!(code, 0);
/// ```
pub struct Interpreter {
    env: Rc<RefCell<Environment>>,
}

impl Default for Interpreter {
    fn default() -> Self {
        Self::new(Environment::new())
    }
}

impl Interpreter {
    pub fn new(env: Environment) -> Self {
        Self {
            env: Rc::new(RefCell::new(env)),
        }
    }

    /// Run one line against the shell's own standard streams.
    pub fn execute_line(&mut self, line: &str) -> ExitCode {
        self.execute_with(line, IoStreams::inherit())
    }

    /// Run one line with `io` as its standard streams.
    ///
    /// Redirections are applied to `io` before anything runs. A redirection
    /// that cannot be opened is reported and skipped; the command still runs.
    pub fn execute_with(&mut self, line: &str, io: IoStreams) -> ExitCode {
        if line.trim().is_empty() {
            return 0;
        }

        let CommandLine {
            stages,
            redirections,
        } = parser::parse_line(line);
        debug!("stages: {stages:?}, redirections: {redirections:?}");

        let mut io = io;
        for spec in &redirections {
            if let Err(err) = io.redirect(spec) {
                warn!("{err}");
                let _ = writeln!(io.diagnostics(), "{err}");
            }
        }

        let mut env = self.env.borrow_mut();
        match stages.as_slice() {
            [single] => run_command(single, io, &mut env),
            _ => run_pipeline(&stages, io, &mut env),
        }
    }

    /// Interactive loop. Returns on end of input; `exit` ends the process directly.
    pub fn repl(&mut self, prompt: &str) -> Result<()> {
        let config = Config::builder()
            .completion_type(CompletionType::List)
            .build();
        let mut rl: Editor<ShellHelper, DefaultHistory> = Editor::with_config(config)?;
        rl.set_helper(Some(ShellHelper::new(Rc::clone(&self.env))));

        loop {
            match rl.readline(prompt) {
                Ok(line) => {
                    if !line.trim().is_empty() {
                        rl.add_history_entry(line.as_str())?;
                    }
                    let code = self.execute_line(&line);
                    debug!("{line:?} finished with status {code}");
                }
                Err(ReadlineError::Interrupted) => continue,
                Err(ReadlineError::Eof) => break,
                Err(err) => return Err(err),
            }
        }

        Ok(())
    }
}

fn run_command(text: &str, io: IoStreams, env: &mut Environment) -> ExitCode {
    let (name, args) = tokenize(text);
    if name.is_empty() {
        return 0;
    }

    match CommandKind::resolve(&name, env) {
        CommandKind::Builtin(builtin) => builtin.run_with_streams(&args, io, env),
        CommandKind::External(path) => {
            let mut diagnostics = io.diagnostics();
            match ExternalCommand::new(name, path, args).run(io) {
                Ok(code) => code,
                Err(err) => report_error(&mut *diagnostics, err),
            }
        }
        CommandKind::NotFound => report_error(&mut *io.diagnostics(), ShellError::CommandNotFound(name)),
    }
}

fn run_pipeline(stages: &[String], io: IoStreams, env: &mut Environment) -> ExitCode {
    let mut diagnostics = io.diagnostics();
    match Pipeline::parse(stages, env) {
        Ok(pipeline) => pipeline::report(pipeline.run(io, env), &mut *diagnostics),
        Err(err) => report_error(&mut *diagnostics, err),
    }
}

fn report_error(diagnostics: &mut dyn Write, err: ShellError) -> ExitCode {
    let _ = writeln!(diagnostics, "{err}");
    err.exit_code()
}
