use log::debug;
use std::borrow::Cow;
use std::collections::HashMap;
use std::ffi::OsStr;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

/// Collaborator that searches the directories of a `PATH` value.
///
/// Kept behind a trait so the cache can be exercised against a stub.
pub trait ExecutableLocator {
    /// Find the executable that `name` refers to.
    fn locate(&self, search_path: &OsStr, name: &str) -> Option<PathBuf>;

    /// Names of every executable file in the `PATH` directories.
    ///
    /// Directories that cannot be read are skipped.
    fn list(&self, search_path: &OsStr) -> Vec<String>;
}

/// Locator backed by the real filesystem.
#[derive(Debug, Default, Clone, Copy)]
pub struct PathLocator;

impl ExecutableLocator for PathLocator {
    fn locate(&self, search_path: &OsStr, name: &str) -> Option<PathBuf> {
        find_command_path(search_path, Path::new(name)).map(Cow::into_owned)
    }

    fn list(&self, search_path: &OsStr) -> Vec<String> {
        let mut names = Vec::new();
        for dir in std::env::split_paths(search_path) {
            let entries = match fs::read_dir(&dir) {
                Ok(entries) => entries,
                Err(e) => {
                    debug!("skipping {}: {e}", dir.display());
                    continue;
                }
            };
            for entry in entries.flatten() {
                if !is_executable(&entry.path()) {
                    continue;
                }
                if let Some(name) = entry.file_name().to_str() {
                    names.push(name.to_string());
                }
            }
        }
        names
    }
}

/// Memo of command name to resolved executable path.
///
/// Entries are only ever added. A failed lookup is not remembered, so a
/// command installed after start-up is found on the next attempt. Names that
/// contain a path separator are resolved every time because they depend on the
/// working directory.
///
/// Not synchronised: it is only touched from the interpreter's own thread.
/// Put it behind a lock before sharing it with anything concurrent.
pub struct ExecPathCache {
    entries: HashMap<String, PathBuf>,
    locator: Box<dyn ExecutableLocator>,
}

impl ExecPathCache {
    pub fn new(locator: Box<dyn ExecutableLocator>) -> Self {
        Self {
            entries: HashMap::new(),
            locator,
        }
    }

    /// Resolve `name`, consulting the cache first.
    pub fn resolve(&mut self, search_path: &OsStr, name: &str) -> Option<PathBuf> {
        if name.is_empty() {
            return None;
        }
        if let Some(path) = self.entries.get(name) {
            debug!("exec path cache hit: {name}");
            return Some(path.clone());
        }

        let path = self.locator.locate(search_path, name)?;
        if !name.contains(std::path::is_separator) {
            debug!("exec path cache insert: {name} -> {}", path.display());
            self.entries.insert(name.to_string(), path.clone());
        }
        Some(path)
    }

    /// Executable names visible through `search_path`.
    pub fn executable_names(&self, search_path: &OsStr) -> Vec<String> {
        self.locator.list(search_path)
    }

    /// Cached path for `name`, without triggering a lookup.
    pub fn cached(&self, name: &str) -> Option<&Path> {
        self.entries.get(name).map(PathBuf::as_path)
    }
}

impl Default for ExecPathCache {
    fn default() -> Self {
        Self::new(Box::new(PathLocator))
    }
}

impl fmt::Debug for ExecPathCache {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ExecPathCache")
            .field("entries", &self.entries)
            .finish_non_exhaustive()
    }
}

/// Resolve a command path the way a typical shell would.
///
/// Behavior:
/// - Absolute path: returns it if it is an executable file.
/// - `./foo`, or any path with more than one component: checked relative to the
///   current directory.
/// - Single path component: search each directory in `search_paths` (PATH)
///   and return the first executable match.
/// - Empty path: returns `None`.
pub fn find_command_path<'a>(search_paths: &OsStr, path: &'a Path) -> Option<Cow<'a, Path>> {
    if path.is_absolute() {
        return find_by_path(path).map(Cow::Borrowed);
    }

    let mut components = path.components();
    let first = components.next();
    let second = components.next();
    match (first, second) {
        (None, None) => None,
        (Some(x), None) => find_in_path(search_paths, x.as_os_str()).map(Cow::Owned),
        _ => find_by_path(path).map(Cow::Borrowed),
    }
}

fn find_in_path(search_paths: &OsStr, cmd: &OsStr) -> Option<PathBuf> {
    std::env::split_paths(search_paths)
        .map(|dir| dir.join(cmd))
        .find(|candidate| is_executable(candidate))
}

fn find_by_path(path: &Path) -> Option<&Path> {
    if is_executable(path) { Some(path) } else { None }
}

#[cfg(unix)]
pub(crate) fn is_executable(path: &Path) -> bool {
    use std::os::unix::fs::PermissionsExt;
    fs::metadata(path)
        .map(|meta| meta.is_file() && meta.permissions().mode() & 0o111 != 0)
        .unwrap_or(false)
}

#[cfg(not(unix))]
pub(crate) fn is_executable(path: &Path) -> bool {
    path.is_file()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{lock_current_dir, make_unique_temp_dir, write_executable};
    use std::cell::Cell;
    use std::rc::Rc;

    fn osstr(s: &str) -> &OsStr {
        OsStr::new(s)
    }

    /// Locator stub that answers from a fixed table and counts lookups.
    struct CountingLocator {
        known: Vec<(&'static str, &'static str)>,
        lookups: Rc<Cell<usize>>,
    }

    impl ExecutableLocator for CountingLocator {
        fn locate(&self, _search_path: &OsStr, name: &str) -> Option<PathBuf> {
            self.lookups.set(self.lookups.get() + 1);
            self.known
                .iter()
                .find(|(known, _)| *known == name)
                .map(|(_, path)| PathBuf::from(path))
        }

        fn list(&self, _search_path: &OsStr) -> Vec<String> {
            self.known.iter().map(|(name, _)| name.to_string()).collect()
        }
    }

    fn counting_cache() -> (ExecPathCache, Rc<Cell<usize>>) {
        let lookups = Rc::new(Cell::new(0));
        let locator = CountingLocator {
            known: vec![("ls", "/bin/ls")],
            lookups: lookups.clone(),
        };
        (ExecPathCache::new(Box::new(locator)), lookups)
    }

    #[test]
    fn test_cache_scans_path_once() {
        let (mut cache, lookups) = counting_cache();
        let first = cache.resolve(osstr("/bin"), "ls");
        let second = cache.resolve(osstr("/bin"), "ls");
        assert_eq!(first, Some(PathBuf::from("/bin/ls")));
        assert_eq!(first, second);
        assert_eq!(lookups.get(), 1);
        assert_eq!(cache.cached("ls"), Some(Path::new("/bin/ls")));
    }

    #[test]
    fn test_cache_does_not_remember_failures() {
        let (mut cache, lookups) = counting_cache();
        assert_eq!(cache.resolve(osstr("/bin"), "missing"), None);
        assert_eq!(cache.resolve(osstr("/bin"), "missing"), None);
        assert_eq!(lookups.get(), 2);
        assert_eq!(cache.cached("missing"), None);
    }

    #[test]
    fn test_cache_skips_names_with_separators() {
        let lookups = Rc::new(Cell::new(0));
        let locator = CountingLocator {
            known: vec![("./tool", "./tool")],
            lookups: lookups.clone(),
        };
        let mut cache = ExecPathCache::new(Box::new(locator));
        cache.resolve(osstr(""), "./tool");
        cache.resolve(osstr(""), "./tool");
        assert_eq!(lookups.get(), 2);
        assert_eq!(cache.cached("./tool"), None);
    }

    #[test]
    fn test_empty_name_never_resolves() {
        let (mut cache, lookups) = counting_cache();
        assert_eq!(cache.resolve(osstr("/bin"), ""), None);
        assert_eq!(lookups.get(), 0);
    }

    #[test]
    #[cfg(unix)]
    fn absolute_existing_true() {
        let path = Path::new("/bin/sh");
        let res = find_command_path(osstr("/bin"), path);
        assert!(res.is_some(), "Expected to find /bin/sh via absolute path");
        assert_eq!(res.unwrap().as_ref(), path);
    }

    #[test]
    #[cfg(unix)]
    fn absolute_nonexisting() {
        let res = find_command_path(osstr("/bin"), Path::new("/bin/nonexisting"));
        assert!(res.is_none());
    }

    #[test]
    #[cfg(unix)]
    fn single_component_found_in_path() {
        let found = find_command_path(osstr("/bin"), Path::new("sh"))
            .expect("Expected to find 'sh' in /bin via PATH search");
        assert!(found.as_ref().ends_with("sh"));
        assert!(found.as_ref().starts_with("/bin"));
    }

    #[test]
    #[cfg(unix)]
    fn single_component_not_found_in_path() {
        let res = find_command_path(osstr("/bin"), Path::new("nonexisting"));
        assert!(res.is_none(), "Expected not to find 'nonexisting' in PATH");
    }

    #[test]
    #[cfg(unix)]
    fn non_executable_file_is_skipped() {
        let dir = make_unique_temp_dir("exec_plain").expect("temp dir");
        fs::write(dir.join("notes"), "text").expect("write file");
        let res = find_command_path(dir.as_os_str(), Path::new("notes"));
        assert!(res.is_none());
        let _ = fs::remove_dir_all(dir);
    }

    #[test]
    #[cfg(unix)]
    fn current_dir_with_dot_prefix() {
        let _lock = lock_current_dir();
        let cwd_before = std::env::current_dir().expect("cwd");
        let tmp_base = make_unique_temp_dir("exec_dot").expect("temp dir");
        write_executable(&tmp_base.join("foo"), "#!/bin/sh\n").expect("touch foo");

        std::env::set_current_dir(&tmp_base).expect("set cwd");
        let res = find_command_path(osstr("/bin"), Path::new("./foo")).map(Cow::into_owned);
        std::env::set_current_dir(&cwd_before).ok();

        assert_eq!(res.as_deref(), Some(Path::new("./foo")));
        let _ = fs::remove_dir_all(tmp_base);
    }

    #[test]
    #[cfg(unix)]
    fn empty_path_is_none() {
        let res = find_command_path(osstr("/bin"), Path::new(""));
        assert!(res.is_none(), "Empty path should not resolve to anything");
    }

    #[test]
    #[cfg(unix)]
    fn list_skips_unreadable_dirs_and_plain_files() {
        let dir = make_unique_temp_dir("exec_list").expect("temp dir");
        write_executable(&dir.join("runme"), "#!/bin/sh\n").expect("write script");
        fs::write(dir.join("readme"), "text").expect("write file");

        let search = std::env::join_paths([dir.clone(), dir.join("does-not-exist")])
            .expect("join paths");
        let names = PathLocator.list(&search);
        assert_eq!(names, vec!["runme".to_string()]);
        let _ = fs::remove_dir_all(dir);
    }
}
