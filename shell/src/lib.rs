//! A tiny, embeddable shell-like command runner.
//!
//! This crate provides the building blocks of `minishell`: a line reader,
//! a parser that splits a line into stages on `|` and `;`, built-in commands
//! implemented in Rust (`exit`, `echo`, `cd`, `cp`, `mv`) and a fork/exec
//! launcher for everything else. `cp` and `mv` are backed by the
//! [`copyfile`] transfer engine.
//!
//! The main entry point is [`Interpreter`], which executes commands by name with
//! arguments using a set of pluggable factories and drives the read/dispatch
//! loop through any [`LineSource`]. The public modules [`command`] and
//! [`env`] expose traits and types for implementing your own commands and for
//! interacting with the process environment.

mod builtin;
pub mod command;
pub mod env;
mod error;
mod external;
mod interpreter;
mod line_reader;
mod parser;
pub mod prompt;

/// Just a convenient re-export of the interactive command runner.
///
/// See [`Interpreter`] for the high-level API and examples.
pub use interpreter::Interpreter;

pub use builtin::join_quoted;
pub use command::{CommandLine, CommandResult, ExitCode};
pub use error::ShellError;
pub use external::{SpawnOutcome, spawn};
pub use line_reader::{LineReader, LineSource, Terminal};
pub use parser::{parse_line, split_spaces};
