use env_logger::{Builder, Env, Target};
use log::LevelFilter;
use std::fs::OpenOptions;
use std::path::{Path, PathBuf};

/// `shell_debug.log` in the system temp directory.
pub fn default_log_file() -> PathBuf {
    std::env::temp_dir().join("shell_debug.log")
}

/// Send log records to `path` (appending), filtered by `RUST_LOG` with `info`
/// as the default. The shell owns the terminal, so records stay off it unless
/// the file cannot be opened; then only warnings and errors go to stderr.
pub fn init(path: &Path) {
    let env = Env::default().default_filter_or("info");
    match OpenOptions::new().create(true).append(true).open(path) {
        Ok(file) => {
            let _ = Builder::from_env(env)
                .target(Target::Pipe(Box::new(file)))
                .try_init();
        }
        Err(e) => {
            let _ = Builder::from_env(env)
                .filter_level(LevelFilter::Warn)
                .target(Target::Stderr)
                .try_init();
            log::warn!("cannot open log file {}: {e}", path.display());
        }
    }
}
