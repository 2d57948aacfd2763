use crate::builtin::BUILTIN_NAMES;
use crate::env::Environment;
use crate::trie::Trie;
use log::debug;
use rustyline::completion::{Completer, Pair};
use rustyline::highlight::Highlighter;
use rustyline::hint::Hinter;
use rustyline::validate::Validator;
use rustyline::{Context, Helper};
use std::cell::RefCell;
use std::fs;
use std::io::{self, Write};
use std::path::Path;
use std::rc::Rc;

/// What a completion request produced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Completion {
    /// Blank line: nothing to do.
    Nothing,
    /// No candidate matches; ring the bell.
    NoMatch,
    /// First request for an ambiguous command prefix; ring the bell.
    Ambiguous,
    /// Replace the text from byte offset `start` up to the cursor with `text`.
    Insert { start: usize, text: String },
    /// Second request for the same ambiguous prefix: show these, leave the line alone.
    Listed(Vec<String>),
    /// Several paths with nothing more in common. Each candidate replaces the
    /// text from byte offset `start` up to the cursor.
    Choices { start: usize, candidates: Vec<String> },
}

/// State of the double-request protocol for command names.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct CompletionSession {
    last_prefix: Option<String>,
    bell_sent: bool,
}

impl CompletionSession {
    /// Start a request for `prefix`. Returns `true` when the prefix differs
    /// from the previous request, which restarts the protocol.
    fn begin(&mut self, prefix: &str) -> bool {
        if self.last_prefix.as_deref() == Some(prefix) {
            return false;
        }
        self.last_prefix = Some(prefix.to_string());
        self.bell_sent = false;
        true
    }

    fn reset(&mut self) {
        *self = Self::default();
    }

    pub fn last_prefix(&self) -> Option<&str> {
        self.last_prefix.as_deref()
    }

    /// Whether the bell for the current ambiguous prefix has already rung.
    pub fn bell_sent(&self) -> bool {
        self.bell_sent
    }
}

/// Tab completion over a line and a cursor position; knows nothing about
/// terminals.
///
/// The first word completes against built-ins and every executable on `PATH`.
/// When such a prefix is ambiguous the first request only rings the bell and
/// an immediate second request with the same prefix lists every candidate.
/// Later words complete as filesystem paths.
#[derive(Debug, Default)]
pub struct CompletionEngine {
    session: CompletionSession,
    index: Option<Trie>,
}

impl CompletionEngine {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn session(&self) -> &CompletionSession {
        &self.session
    }

    /// Complete the word under the cursor. `pos` is a byte offset into `line`.
    pub fn complete(&mut self, line: &str, pos: usize, env: &Environment) -> Completion {
        let head = &line[..floor_char_boundary(line, pos)];
        if head.trim().is_empty() {
            return Completion::Nothing;
        }

        let at_word_end = !head.ends_with(char::is_whitespace);
        let word = if at_word_end {
            head.split_whitespace().next_back().unwrap_or("")
        } else {
            ""
        };
        let in_command = at_word_end && head.split_whitespace().nth(1).is_none();
        let word_start = head.len() - word.len();

        if in_command {
            self.complete_command(&strip_control(word), word_start, env)
        } else {
            self.session.reset();
            complete_path(word, word_start, env)
        }
    }

    /// The whole typed word is replaced, so stray control characters in it go away.
    fn complete_command(&mut self, prefix: &str, word_start: usize, env: &Environment) -> Completion {
        if self.session.begin(prefix) || self.index.is_none() {
            self.index = Some(build_index(env));
        }
        let candidates = self
            .index
            .as_ref()
            .map(|index| index.with_prefix(prefix))
            .unwrap_or_default();
        debug!("{} command candidates for {prefix:?}", candidates.len());

        match candidates.len() {
            0 => Completion::NoMatch,
            1 => Completion::Insert {
                start: word_start,
                text: format!("{} ", candidates[0]),
            },
            _ if !self.session.bell_sent => {
                self.session.bell_sent = true;
                Completion::Ambiguous
            }
            _ => {
                self.session.bell_sent = false;
                Completion::Listed(candidates)
            }
        }
    }
}

fn build_index(env: &Environment) -> Trie {
    let mut index: Trie = BUILTIN_NAMES.into_iter().collect();
    for name in env.executable_names() {
        index.insert(&name);
    }
    debug!("completion index rebuilt with {} names", index.len());
    index
}

/// Complete `word`, which starts at byte `word_start`, as a filesystem path.
fn complete_path(word: &str, word_start: usize, env: &Environment) -> Completion {
    let typed = strip_control(word);
    let expanded = expand_home(&typed, env);
    let (dir, base) = match expanded.rfind('/') {
        Some(idx) => (&expanded[..=idx], &expanded[idx + 1..]),
        None => ("", expanded.as_str()),
    };
    let search_dir = if dir.is_empty() { Path::new(".") } else { Path::new(dir) };
    let candidates = matching_entries(search_dir, base);
    debug!("{} path candidates in {}", candidates.len(), search_dir.display());
    // replacements cover the typed base name only
    let start = word_start + word.rfind('/').map_or(0, |idx| idx + 1);

    match candidates.len() {
        0 => Completion::NoMatch,
        1 => {
            let only = &candidates[0];
            let text = if only.ends_with('/') {
                only.clone()
            } else {
                format!("{only} ")
            };
            Completion::Insert { start, text }
        }
        _ => {
            let common = longest_common_prefix(&candidates).to_string();
            if common.len() > base.len() {
                Completion::Insert { start, text: common }
            } else {
                Completion::Choices { start, candidates }
            }
        }
    }
}

/// Sorted names in `dir` starting with `base`; directories get a trailing `/`.
/// An unreadable directory has no entries.
fn matching_entries(dir: &Path, base: &str) -> Vec<String> {
    let Ok(entries) = fs::read_dir(dir) else {
        return Vec::new();
    };
    let mut names: Vec<String> = entries
        .flatten()
        .filter_map(|entry| {
            let name = entry.file_name().into_string().ok()?;
            if !name.starts_with(base) {
                return None;
            }
            if entry.path().is_dir() {
                Some(format!("{name}/"))
            } else {
                Some(name)
            }
        })
        .collect();
    names.sort();
    names
}

fn expand_home(word: &str, env: &Environment) -> String {
    match (word.strip_prefix("~/"), env.home_dir()) {
        (Some(rest), Some(home)) => {
            let home = home.to_string_lossy();
            format!("{}/{rest}", home.trim_end_matches('/'))
        }
        _ => word.to_string(),
    }
}

fn longest_common_prefix(words: &[String]) -> &str {
    let Some((first, rest)) = words.split_first() else {
        return "";
    };
    let mut end = first.len();
    for word in rest {
        let shared = first
            .char_indices()
            .zip(word.chars())
            .take_while(|((_, a), b)| a == b)
            .last()
            .map_or(0, |((idx, ch), _)| idx + ch.len_utf8());
        end = end.min(shared);
    }
    &first[..end]
}

fn strip_control(word: &str) -> String {
    word.chars().filter(|c| !c.is_control()).collect()
}

fn floor_char_boundary(line: &str, pos: usize) -> usize {
    let mut pos = pos.min(line.len());
    while !line.is_char_boundary(pos) {
        pos -= 1;
    }
    pos
}

/// `rustyline` helper backed by a [`CompletionEngine`].
pub struct ShellHelper {
    engine: RefCell<CompletionEngine>,
    env: Rc<RefCell<Environment>>,
}

impl ShellHelper {
    pub fn new(env: Rc<RefCell<Environment>>) -> Self {
        Self {
            engine: RefCell::new(CompletionEngine::new()),
            env,
        }
    }
}

fn candidate(text: String) -> Pair {
    Pair {
        display: text.clone(),
        replacement: text,
    }
}

/// Print `names` on their own line below the prompt.
fn print_listing(names: &[String]) -> io::Result<()> {
    let mut out = io::stdout().lock();
    write!(out, "\r\n{}\r\n", names.join("  "))?;
    out.flush()
}

impl Helper for ShellHelper {}

impl Completer for ShellHelper {
    type Candidate = Pair;

    fn complete(&self, line: &str, pos: usize, _ctx: &Context<'_>) -> rustyline::Result<(usize, Vec<Pair>)> {
        let completion = {
            let env = self.env.borrow();
            self.engine.borrow_mut().complete(line, pos, &env)
        };

        // An empty candidate list makes rustyline ring the bell; a single empty
        // replacement leaves the line untouched without one.
        Ok(match completion {
            Completion::Nothing => (pos, vec![candidate(String::new())]),
            Completion::NoMatch | Completion::Ambiguous => (pos, Vec::new()),
            Completion::Insert { start, text } => (start, vec![candidate(text)]),
            Completion::Listed(names) => {
                print_listing(&names)?;
                (pos, vec![candidate(String::new())])
            }
            Completion::Choices { start, candidates } => {
                (start, candidates.into_iter().map(candidate).collect())
            }
        })
    }
}

impl Hinter for ShellHelper {
    type Hint = String;
}

impl Highlighter for ShellHelper {}

impl Validator for ShellHelper {}
