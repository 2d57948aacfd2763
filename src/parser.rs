use crate::lexer::{Piece, QuoteScanner};
use crate::redirection::{RedirectionSpec, extract_redirections};

/// A submitted line broken into its redirections and pipeline stages.
///
/// Stage strings are raw command text (quotes still in place); they are
/// tokenized only when the stage is about to run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandLine {
    /// Stage command texts in left-to-right order. Never empty.
    pub stages: Vec<String>,
    /// Redirections in extraction (priority) order.
    pub redirections: Vec<RedirectionSpec>,
}

impl CommandLine {
    /// True when the line holds more than one stage.
    pub fn is_pipeline(&self) -> bool {
        self.stages.len() > 1
    }
}

/// Split a line on top-level `|`.
///
/// A `|` inside quotes or after a backslash does not split. A line without a
/// top-level `|` yields a single element equal to the trimmed input; when the
/// line does split, the stage texts are returned untrimmed.
pub fn split_pipeline(line: &str) -> Vec<String> {
    let mut stages = Vec::new();
    let mut start = 0;

    for (offset, piece) in QuoteScanner::new(line, |c| c == '|') {
        if let Piece::Delimiter(_) = piece {
            stages.push(line[start..offset].to_string());
            start = offset + 1;
        }
    }

    if stages.is_empty() {
        return vec![line.trim().to_string()];
    }
    stages.push(line[start..].to_string());
    stages
}

/// Extract redirections first, then split what is left into stages.
pub fn parse_line(line: &str) -> CommandLine {
    let (command_text, redirections) = extract_redirections(line);
    CommandLine {
        stages: split_pipeline(&command_text),
        redirections,
    }
}
