use crate::exec_path::ExecPathCache;
use std::collections::HashMap;
use std::env as stdenv;
use std::ffi::OsString;
use std::path::PathBuf;

/// The shell's view of the process environment.
///
/// The environment contains:
/// - `vars`: per-shell overrides consulted before the live process environment.
/// - `exec_paths`: the memo of resolved `PATH` lookups, shared by command
///   execution, `type` and completion.
///
/// Lookups fall through to `std::env` on every call, so a `PATH` changed after
/// start-up is seen by the next resolution.
#[derive(Debug, Default)]
pub struct Environment {
    /// Overrides for environment variables (e.g., PATH, HOME).
    pub vars: HashMap<String, String>,
    /// Memoized command name to executable path mapping.
    pub exec_paths: ExecPathCache,
}

impl Environment {
    /// Environment with no overrides, resolving commands through the real `PATH`.
    pub fn new() -> Self {
        Self::default()
    }

    /// Environment using a specific exec-path cache.
    pub fn with_exec_paths(exec_paths: ExecPathCache) -> Self {
        Self {
            vars: HashMap::new(),
            exec_paths,
        }
    }

    /// Get the value of an environment variable.
    ///
    /// Looks up the key in `self.vars` first, falling back to `std::env::var`.
    pub fn get_var(&self, key: &str) -> Option<String> {
        self.vars
            .get(key)
            .cloned()
            .or_else(|| stdenv::var(key).ok())
    }

    /// Set or override an environment variable in `self.vars`.
    pub fn set_var(&mut self, key: impl Into<String>, val: impl Into<String>) {
        self.vars.insert(key.into(), val.into());
    }

    /// The user's home directory, used for `~` expansion.
    pub fn home_dir(&self) -> Option<PathBuf> {
        self.get_var("HOME")
            .or_else(|| self.get_var("USERPROFILE"))
            .filter(|home| !home.is_empty())
            .map(PathBuf::from)
    }

    /// Current value of `PATH`, empty when unset.
    pub fn search_path(&self) -> OsString {
        match self.vars.get("PATH") {
            Some(path) => OsString::from(path),
            None => stdenv::var_os("PATH").unwrap_or_default(),
        }
    }

    /// Resolve a command name to an executable through the exec-path cache.
    pub fn find_executable(&mut self, name: &str) -> Option<PathBuf> {
        let search_path = self.search_path();
        self.exec_paths.resolve(&search_path, name)
    }

    /// Every executable name reachable through `PATH`.
    pub fn executable_names(&self) -> Vec<String> {
        self.exec_paths.executable_names(&self.search_path())
    }
}

#[cfg(test)]
mod tests {
    use crate::env::Environment;
    use crate::test_support::env_with_commands;
    use std::path::PathBuf;

    #[test]
    fn test_env_set_and_get_var() {
        let mut env = Environment::new();

        // initially absent
        assert_eq!(env.get_var("SOME_RANDOM_ENV_VAR_12345"), None);

        env.set_var("KEY", "VALUE");

        assert_eq!(env.get_var("KEY"), Some("VALUE".to_string()));
    }

    #[test]
    fn test_env_reads_from_process_env() {
        let env = Environment::new();
        assert!(env.get_var("PATH").is_some());
    }

    #[test]
    fn test_home_dir_prefers_override() {
        let mut env = Environment::new();
        env.set_var("HOME", "/home/tester");
        assert_eq!(env.home_dir(), Some(PathBuf::from("/home/tester")));
    }

    #[test]
    fn test_empty_home_is_no_home() {
        let mut env = Environment::new();
        env.set_var("HOME", "");
        env.set_var("USERPROFILE", "");
        assert_eq!(env.home_dir(), None);
    }

    #[test]
    fn test_search_path_override() {
        let mut env = Environment::new();
        env.set_var("PATH", "/opt/tools");
        assert_eq!(env.search_path(), "/opt/tools");
    }

    #[test]
    fn test_find_executable_goes_through_cache() {
        let mut env = env_with_commands(&[("grep", "/usr/bin/grep")]);
        assert_eq!(env.find_executable("grep"), Some(PathBuf::from("/usr/bin/grep")));
        assert!(env.exec_paths.cached("grep").is_some());
        assert_eq!(env.find_executable("nope"), None);
        assert_eq!(env.executable_names(), vec!["grep".to_string()]);
    }
}
