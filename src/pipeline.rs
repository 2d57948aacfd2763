use crate::builtin::Builtin;
use crate::command::{CommandKind, ExitCode, exit_code_of};
use crate::env::Environment;
use crate::error::ShellError;
use crate::external::ExternalCommand;
use crate::io_adapters::{InputStream, IoStreams, OutputStream};
use crate::lexer::tokenize;
use log::debug;
use std::io::Write;
use std::process::Child;
use std::sync::OnceLock;
use std::thread;

/// Lifecycle of one stage.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StageState {
    Pending,
    Running,
    Succeeded,
    Failed,
}

/// One command within a pipeline.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PipelineStage {
    pub name: String,
    pub args: Vec<String>,
    pub kind: CommandKind,
}

impl PipelineStage {
    /// Tokenize a stage's text and resolve its command.
    pub fn parse(text: &str, env: &mut Environment) -> Result<Self, ShellError> {
        let (name, args) = tokenize(text);
        if name.is_empty() {
            return Err(ShellError::EmptyStage);
        }
        let kind = CommandKind::resolve(&name, env);
        Ok(Self { name, args, kind })
    }

    pub fn is_builtin(&self) -> bool {
        self.kind.is_builtin()
    }
}

/// Result of running a pipeline: every stage's final state plus the first
/// error any stage reported.
#[derive(Debug)]
pub struct PipelineOutcome {
    pub states: Vec<StageState>,
    pub error: Option<ShellError>,
}

impl PipelineOutcome {
    pub fn succeeded(&self) -> bool {
        self.error.is_none()
    }

    pub fn exit_code(&self) -> ExitCode {
        self.error.as_ref().map_or(0, ShellError::exit_code)
    }

    pub fn into_result(self) -> Result<(), ShellError> {
        match self.error {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }
}

/// An ordered list of at least two stages.
#[derive(Debug)]
pub struct Pipeline {
    stages: Vec<PipelineStage>,
}

impl Pipeline {
    pub fn new(stages: Vec<PipelineStage>) -> Result<Self, ShellError> {
        if stages.len() < 2 {
            return Err(ShellError::PipelineTooShort(stages.len()));
        }
        Ok(Self { stages })
    }

    /// Build a pipeline from raw stage texts as produced by the splitter.
    pub fn parse<S: AsRef<str>>(texts: &[S], env: &mut Environment) -> Result<Self, ShellError> {
        let stages = texts
            .iter()
            .map(|text| PipelineStage::parse(text.as_ref(), env))
            .collect::<Result<Vec<_>, _>>()?;
        Self::new(stages)
    }

    pub fn stages(&self) -> &[PipelineStage] {
        &self.stages
    }

    /// Run every stage and wait for all of them.
    ///
    /// `io` describes the pipeline as a whole: the first stage reads its
    /// `stdin`, the last stage writes its `stdout`, and every stage shares its
    /// `stderr`. Every supervising thread is joined before this returns.
    ///
    /// Stages start left to right. A built-in runs inline, so nothing to its
    /// right is launched until it returns.
    pub fn run(self, io: IoStreams, env: &mut Environment) -> PipelineOutcome {
        let mut states = vec![StageState::Pending; self.stages.len()];
        let wired = match wire_stages(self.stages.len(), io) {
            Ok(wired) => wired,
            Err(err) => {
                return PipelineOutcome {
                    states,
                    error: Some(err),
                };
            }
        };

        let first_error = OnceLock::new();
        thread::scope(|scope| {
            let first_error = &first_error;
            let mut supervisors = Vec::new();

            for (idx, (stage, stage_io)) in self.stages.iter().zip(wired).enumerate() {
                debug!("stage {idx} ({}) running", stage.name);
                states[idx] = StageState::Running;

                match &stage.kind {
                    CommandKind::Builtin(builtin) => {
                        states[idx] = run_builtin_stage(*builtin, stage, stage_io, env, first_error);
                    }
                    CommandKind::External(path) => {
                        let command = ExternalCommand::new(&stage.name, path.clone(), stage.args.clone());
                        match command.spawn(stage_io) {
                            Ok(child) => {
                                let handle = scope.spawn(move || supervise(&command, child, first_error));
                                supervisors.push((idx, handle));
                            }
                            Err(err) => states[idx] = fail(first_error, err),
                        }
                    }
                    CommandKind::NotFound => {
                        let err = ShellError::CommandNotFound(stage.name.clone());
                        let _ = writeln!(stage_io.stderr.into_writer(), "{err}");
                        states[idx] = fail(first_error, err);
                    }
                }
            }

            for (idx, handle) in supervisors {
                states[idx] = handle.join().unwrap_or(StageState::Failed);
            }
        });

        for (idx, state) in states.iter().enumerate() {
            debug!("stage {idx} finished: {state:?}");
        }
        PipelineOutcome {
            states,
            error: first_error.into_inner(),
        }
    }
}

/// Give each stage its streams: stage `i` writes into pipe `i` and stage
/// `i + 1` reads from it.
fn wire_stages(count: usize, io: IoStreams) -> Result<Vec<IoStreams>, ShellError> {
    let IoStreams { stdin, stdout, stderr } = io;
    let mut wired = Vec::with_capacity(count);
    let mut input = stdin;

    for _ in 1..count {
        let (reader, writer) = os_pipe::pipe().map_err(ShellError::Pipe)?;
        wired.push(IoStreams {
            stdin: input,
            stdout: OutputStream::Pipe(writer),
            stderr: stderr.try_clone()?,
        });
        input = InputStream::Pipe(reader);
    }
    wired.push(IoStreams { stdin: input, stdout, stderr });
    Ok(wired)
}

fn run_builtin_stage(
    builtin: Builtin,
    stage: &PipelineStage,
    io: IoStreams,
    env: &mut Environment,
    first_error: &OnceLock<ShellError>,
) -> StageState {
    let code = builtin.run_with_streams(&stage.args, io, env);
    settle(first_error, &stage.name, code)
}

fn supervise(command: &ExternalCommand, mut child: Child, first_error: &OnceLock<ShellError>) -> StageState {
    match child.wait() {
        Ok(status) => settle(first_error, command.name(), exit_code_of(status)),
        Err(source) => fail(
            first_error,
            ShellError::Wait {
                name: command.name().to_string(),
                source,
            },
        ),
    }
}

fn settle(first_error: &OnceLock<ShellError>, name: &str, code: ExitCode) -> StageState {
    if code == 0 {
        return StageState::Succeeded;
    }
    fail(
        first_error,
        ShellError::StageFailed {
            name: name.to_string(),
            code,
        },
    )
}

/// Record `err` unless an earlier failure was already recorded.
fn fail(first_error: &OnceLock<ShellError>, err: ShellError) -> StageState {
    debug!("stage failed: {err}");
    let _ = first_error.set(err);
    StageState::Failed
}

/// Report a failed pipeline on `diagnostics`, returning the line's exit code.
///
/// An unresolved stage has already printed its own message.
pub(crate) fn report(outcome: PipelineOutcome, diagnostics: &mut dyn Write) -> ExitCode {
    let code = outcome.exit_code();
    match outcome.into_result() {
        Ok(()) | Err(ShellError::CommandNotFound(_)) => {}
        Err(err) => {
            let _ = writeln!(diagnostics, "{err}");
        }
    }
    code
}
