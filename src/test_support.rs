use crate::env::Environment;
use crate::exec_path::{ExecPathCache, ExecutableLocator};
use std::ffi::OsStr;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard, OnceLock};
use std::time::{SystemTime, UNIX_EPOCH};

/// Serialises tests that read or change the process working directory.
pub(crate) fn lock_current_dir() -> MutexGuard<'static, ()> {
    static MUTEX: OnceLock<Mutex<()>> = OnceLock::new();
    MUTEX
        .get_or_init(|| Mutex::new(()))
        .lock()
        .unwrap_or_else(|poisoned| poisoned.into_inner())
}

pub(crate) fn make_unique_temp_dir(tag: &str) -> io::Result<PathBuf> {
    let mut p = std::env::temp_dir();
    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap()
        .as_nanos();
    p.push(format!("pipeshell_{}_{}_{}", tag, std::process::id(), nanos));
    fs::create_dir_all(&p)?;
    Ok(p)
}

pub(crate) fn write_executable(path: &Path, contents: &str) -> io::Result<()> {
    fs::write(path, contents)?;
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        fs::set_permissions(path, fs::Permissions::from_mode(0o755))?;
    }
    Ok(())
}

/// Locator answering from a fixed table instead of scanning `PATH`.
pub(crate) struct FixedLocator {
    pub(crate) entries: Vec<(String, PathBuf)>,
}

impl ExecutableLocator for FixedLocator {
    fn locate(&self, _search_path: &OsStr, name: &str) -> Option<PathBuf> {
        self.entries
            .iter()
            .find(|(known, _)| known == name)
            .map(|(_, path)| path.clone())
    }

    fn list(&self, _search_path: &OsStr) -> Vec<String> {
        self.entries.iter().map(|(name, _)| name.clone()).collect()
    }
}

/// Environment whose `PATH` lookups only know the given commands.
pub(crate) fn env_with_commands(commands: &[(&str, &str)]) -> Environment {
    let locator = FixedLocator {
        entries: commands
            .iter()
            .map(|(name, path)| (name.to_string(), PathBuf::from(path)))
            .collect(),
    };
    Environment::with_exec_paths(ExecPathCache::new(Box::new(locator)))
}
