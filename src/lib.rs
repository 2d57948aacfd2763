//! A small interactive shell.
//!
//! A line goes through three steps before anything runs: redirections are cut
//! out ([`redirection`]), the rest is split into pipeline stages on unquoted
//! `|` ([`parser`]), and each stage is tokenized with shell quoting rules
//! ([`lexer`]). Single commands run directly; longer lines go through the
//! [`pipeline`] engine, which connects stages with OS pipes and runs external
//! stages concurrently.
//!
//! Built-ins (`echo`, `exit`, `type`, `pwd`, `cd`) run in-process against
//! explicit stream handles. Everything else is looked up on `PATH` through a
//! memoizing [`exec_path::ExecPathCache`].
//!
//! The main entry point is [`Interpreter`], which runs single lines or an
//! interactive `rustyline` session with tab completion ([`completion`]).

pub mod builtin;
pub mod command;
pub mod completion;
pub mod env;
pub mod error;
pub mod exec_path;
mod external;
mod interpreter;
pub mod io_adapters;
pub mod lexer;
pub mod logging;
pub mod parser;
pub mod pipeline;
pub mod redirection;
#[cfg(test)]
mod test_support;
mod trie;

pub use error::ShellError;
pub use external::ExternalCommand;
/// Just a convenient re-export of the interactive command runner.
///
/// See [`Interpreter`] for the high-level API.
pub use interpreter::Interpreter;
pub use trie::Trie;
