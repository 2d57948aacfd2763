use argh::FromArgs;
use log::info;
use pipeshell::{Interpreter, logging};
use std::path::PathBuf;
use std::process::ExitCode;

#[derive(FromArgs)]
/// Interactive shell with pipelines, redirection and tab completion.
struct Args {
    #[argh(option, default = "String::from(\"$ \")")]
    /// text printed before each input line
    prompt: String,

    #[argh(option)]
    /// file receiving log records; defaults to shell_debug.log in the temp directory
    log_file: Option<PathBuf>,

    #[argh(option, short = 'c')]
    /// run a single line, then exit with its status
    command: Option<String>,
}

fn main() -> anyhow::Result<ExitCode> {
    let args: Args = argh::from_env();
    let log_file = args.log_file.unwrap_or_else(logging::default_log_file);
    logging::init(&log_file);

    let mut sh = Interpreter::default();
    if let Some(line) = args.command {
        let code = sh.execute_line(&line);
        info!("{line:?} finished with status {code}");
        return Ok(ExitCode::from(u8::try_from(code).unwrap_or(1)));
    }

    info!("starting interactive shell");
    sh.repl(&args.prompt)?;
    Ok(ExitCode::SUCCESS)
}
