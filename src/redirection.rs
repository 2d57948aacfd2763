use crate::lexer::split_into_words;
use log::{debug, warn};
use regex::Regex;
use std::sync::OnceLock;

/// Which stream a redirection rebinds, and how the file is opened.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RedirectionKind {
    StdoutTruncate,
    StdoutAppend,
    StderrTruncate,
    StderrAppend,
}

impl RedirectionKind {
    /// True for `>>`-style operators.
    pub fn appends(self) -> bool {
        matches!(self, RedirectionKind::StdoutAppend | RedirectionKind::StderrAppend)
    }

    /// True when the redirection targets standard error.
    pub fn is_stderr(self) -> bool {
        matches!(self, RedirectionKind::StderrTruncate | RedirectionKind::StderrAppend)
    }
}

/// A single redirection extracted from a line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RedirectionSpec {
    pub kind: RedirectionKind,
    pub target: String,
}

/// Operators in the order they are searched for.
const OPERATORS: [(&str, RedirectionKind); 6] = [
    ("2>>", RedirectionKind::StderrAppend),
    ("1>>", RedirectionKind::StdoutAppend),
    (">>", RedirectionKind::StdoutAppend),
    ("2>", RedirectionKind::StderrTruncate),
    ("1>", RedirectionKind::StdoutTruncate),
    (">", RedirectionKind::StdoutTruncate),
];

fn patterns() -> &'static [(Regex, RedirectionKind)] {
    static PATTERNS: OnceLock<Vec<(Regex, RedirectionKind)>> = OnceLock::new();
    PATTERNS.get_or_init(|| {
        OPERATORS
            .iter()
            .filter_map(|(op, kind)| {
                let source = format!(r"(^|\s+){}(\s+|$)", regex::escape(op));
                match Regex::new(&source) {
                    Ok(re) => Some((re, *kind)),
                    Err(e) => {
                        warn!("skipping redirection operator {op}: {e}");
                        None
                    }
                }
            })
            .collect()
    })
}

/// Remove redirection operators from `line`.
///
/// Operators are searched in priority order, not textual order. Each match
/// cuts the text at the operator, so anything after a target is dropped.
///
/// Returns the trimmed command text and the specs in extraction order. The
/// target is the first whitespace-delimited word after the operator, with
/// quotes removed; a quoted target containing a space is therefore cut at the
/// space. An operator with no target is dropped without producing a spec.
pub fn extract_redirections(line: &str) -> (String, Vec<RedirectionSpec>) {
    let mut command = line.to_string();
    let mut specs = Vec::new();

    for (pattern, kind) in patterns() {
        while let Some(found) = pattern.find(&command) {
            let target = command[found.end()..]
                .split_whitespace()
                .next()
                .map(unquote)
                .unwrap_or_default();
            command.truncate(found.start());

            if target.is_empty() {
                warn!("redirection {kind:?} has no target, ignoring it");
                continue;
            }
            debug!("redirection {kind:?} -> {target}");
            specs.push(RedirectionSpec { kind: *kind, target });
        }
    }

    (command.trim().to_string(), specs)
}

fn unquote(word: &str) -> String {
    split_into_words(word).concat()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn spec(kind: RedirectionKind, target: &str) -> RedirectionSpec {
        RedirectionSpec {
            kind,
            target: target.to_string(),
        }
    }

    #[test]
    fn test_stdout_truncate() {
        let (cmd, specs) = extract_redirections("echo hi > out.txt");
        assert_eq!(cmd, "echo hi");
        assert_eq!(specs, vec![spec(RedirectionKind::StdoutTruncate, "out.txt")]);
    }

    #[test]
    fn test_stderr_append() {
        let (cmd, specs) = extract_redirections("cmd 2>> err.log");
        assert_eq!(cmd, "cmd");
        assert_eq!(specs, vec![spec(RedirectionKind::StderrAppend, "err.log")]);
    }

    #[test]
    fn test_explicit_descriptor_forms() {
        let (_, specs) = extract_redirections("ls 1> a");
        assert_eq!(specs, vec![spec(RedirectionKind::StdoutTruncate, "a")]);
        let (_, specs) = extract_redirections("ls 1>> a");
        assert_eq!(specs, vec![spec(RedirectionKind::StdoutAppend, "a")]);
        let (_, specs) = extract_redirections("ls 2> a");
        assert_eq!(specs, vec![spec(RedirectionKind::StderrTruncate, "a")]);
        let (_, specs) = extract_redirections("ls >> a");
        assert_eq!(specs, vec![spec(RedirectionKind::StdoutAppend, "a")]);
    }

    #[test]
    fn test_priority_order_not_textual_order() {
        let (cmd, specs) = extract_redirections("ls /missing > out.txt 2> err.txt");
        assert_eq!(cmd, "ls /missing");
        assert_eq!(
            specs,
            vec![
                spec(RedirectionKind::StderrTruncate, "err.txt"),
                spec(RedirectionKind::StdoutTruncate, "out.txt"),
            ]
        );
    }

    #[test]
    fn test_operator_needs_surrounding_whitespace() {
        let (cmd, specs) = extract_redirections("echo a>b");
        assert_eq!(cmd, "echo a>b");
        assert!(specs.is_empty());
    }

    #[test]
    fn test_quoted_target_without_space() {
        let (_, specs) = extract_redirections("echo hi > 'out.txt'");
        assert_eq!(specs, vec![spec(RedirectionKind::StdoutTruncate, "out.txt")]);
    }

    #[test]
    fn test_quoted_target_with_space_is_cut() {
        let (_, specs) = extract_redirections("echo hi > \"my file.txt\"");
        assert_eq!(specs, vec![spec(RedirectionKind::StdoutTruncate, "my")]);
    }

    #[test]
    fn test_text_after_target_is_dropped() {
        let (cmd, _) = extract_redirections("echo a > f b");
        assert_eq!(cmd, "echo a");
    }

    #[test]
    fn test_missing_target_is_tolerated() {
        let (cmd, specs) = extract_redirections("echo hi >");
        assert_eq!(cmd, "echo hi");
        assert!(specs.is_empty());
    }

    #[test]
    fn test_no_redirection() {
        let (cmd, specs) = extract_redirections("  echo plain  ");
        assert_eq!(cmd, "echo plain");
        assert!(specs.is_empty());
    }

    #[test]
    fn test_kind_helpers() {
        assert!(RedirectionKind::StderrAppend.appends());
        assert!(RedirectionKind::StderrAppend.is_stderr());
        assert!(!RedirectionKind::StdoutTruncate.appends());
        assert!(!RedirectionKind::StdoutTruncate.is_stderr());
    }
}
