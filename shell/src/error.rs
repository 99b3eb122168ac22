use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// Failures raised by built-ins and the process spawner.
///
/// File transfer failures come from [`copyfile::TransferError`] and are
/// wrapped with command context rather than duplicated here.
#[derive(Debug, Error)]
pub enum ShellError {
    #[error("{command}: too many arguments (expected at most {max})")]
    TooManyArguments { command: &'static str, max: usize },
    #[error("unbalanced quotes")]
    UnbalancedQuotes,
    #[error("cannot change directory to {}", path.display())]
    ChangeDirFailed { path: PathBuf, source: io::Error },
    #[error("HOME is not set and the current user has no home directory")]
    HomeNotFound,
    #[error("empty command")]
    EmptyCommand,
    #[error("argument {argument:?} contains a NUL byte")]
    InvalidArgument { argument: String },
    #[error("creating a process for {program} failed")]
    ProcessCreationFailed { program: String, source: nix::Error },
    #[error("waiting for process {pid} failed")]
    WaitFailed { pid: i32, source: nix::Error },
}
