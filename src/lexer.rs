use std::str::CharIndices;

/// Quoting context of the scanner.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum QuoteState {
    Normal,
    InSingleQuote,
    InDoubleQuote,
}

/// One classified piece of the input.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Piece {
    /// A character that belongs to the current word.
    Char(char),
    /// An escape inside double quotes that is kept verbatim (`\` followed by the char).
    Pair(char, char),
    /// An unquoted, unescaped delimiter.
    Delimiter(char),
    /// Quote marks and escape introducers, which are consumed without output.
    Syntax,
}

/// Iterator over `(byte offset, piece)` pairs of a line.
///
/// Word splitting, pipeline splitting and redirection-target clean-up all go
/// through this one state machine; each picks its own delimiter.
///
/// An unterminated quote is accepted silently: the rest of the line is treated
/// as if the quote had been closed at the end. A trailing lone backslash is
/// dropped.
pub(crate) struct QuoteScanner<'a, F> {
    chars: CharIndices<'a>,
    state: QuoteState,
    escaped: bool,
    is_delimiter: F,
}

impl<'a, F> QuoteScanner<'a, F>
where
    F: Fn(char) -> bool,
{
    pub(crate) fn new(line: &'a str, is_delimiter: F) -> Self {
        QuoteScanner {
            chars: line.char_indices(),
            state: QuoteState::Normal,
            escaped: false,
            is_delimiter,
        }
    }

    fn classify(&mut self, ch: char) -> Piece {
        if self.escaped {
            self.escaped = false;
            return match self.state {
                QuoteState::InDoubleQuote if matches!(ch, '\\' | '"' | '$') => Piece::Char(ch),
                QuoteState::InDoubleQuote => Piece::Pair('\\', ch),
                _ => Piece::Char(ch),
            };
        }

        match (self.state, ch) {
            (QuoteState::InSingleQuote, '\\') => Piece::Char(ch),
            (_, '\\') => {
                self.escaped = true;
                Piece::Syntax
            }
            (QuoteState::Normal, '\'') => {
                self.state = QuoteState::InSingleQuote;
                Piece::Syntax
            }
            (QuoteState::InSingleQuote, '\'') => {
                self.state = QuoteState::Normal;
                Piece::Syntax
            }
            (QuoteState::Normal, '"') => {
                self.state = QuoteState::InDoubleQuote;
                Piece::Syntax
            }
            (QuoteState::InDoubleQuote, '"') => {
                self.state = QuoteState::Normal;
                Piece::Syntax
            }
            (QuoteState::Normal, c) if (self.is_delimiter)(c) => Piece::Delimiter(c),
            (_, c) => Piece::Char(c),
        }
    }
}

impl<F> Iterator for QuoteScanner<'_, F>
where
    F: Fn(char) -> bool,
{
    type Item = (usize, Piece);

    fn next(&mut self) -> Option<Self::Item> {
        let (offset, ch) = self.chars.next()?;
        Some((offset, self.classify(ch)))
    }
}

/// Split a line into words with quotes removed and escapes resolved.
///
/// Words are separated by unquoted spaces; empty words are never produced.
pub fn split_into_words(line: &str) -> Vec<String> {
    let mut words = Vec::new();
    let mut current = String::new();

    for (_, piece) in QuoteScanner::new(line, |c| c == ' ') {
        match piece {
            Piece::Char(c) => current.push(c),
            Piece::Pair(a, b) => {
                current.push(a);
                current.push(b);
            }
            Piece::Delimiter(_) => {
                if !current.is_empty() {
                    words.push(std::mem::take(&mut current));
                }
            }
            Piece::Syntax => {}
        }
    }

    if !current.is_empty() {
        words.push(current);
    }
    words
}

/// Tokenize a line into a command name and its arguments.
///
/// The name is empty when the line holds no words.
pub fn tokenize(line: &str) -> (String, Vec<String>) {
    let mut words = split_into_words(line).into_iter();
    let name = words.next().unwrap_or_default();
    (name, words.collect())
}
