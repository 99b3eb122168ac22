use crate::env::Environment;
use anyhow::Result;
use std::io::Write;

/// Conventional process exit code type used by this crate.
///
/// A value of 0 indicates success; any non-zero value indicates failure.
/// This mirrors the convention used by POSIX shells and many command-line tools.
pub type ExitCode = i32;

/// What the shell loop learns from one dispatched command.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CommandResult {
    pub code: ExitCode,
    /// Only `exit` sets this.
    pub quit_requested: bool,
}

impl CommandResult {
    pub fn new(code: ExitCode) -> Self {
        Self {
            code,
            quit_requested: false,
        }
    }

    pub fn quit(code: ExitCode) -> Self {
        Self {
            code,
            quit_requested: true,
        }
    }

    pub fn is_success(&self) -> bool {
        self.code == 0
    }
}

/// One command stage: the command name followed by its arguments.
///
/// Produced fresh for every input line and never modified after parsing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandLine(Vec<String>);

impl CommandLine {
    pub fn new(tokens: Vec<String>) -> Self {
        Self(tokens)
    }

    pub fn name(&self) -> Option<&str> {
        self.0.first().map(String::as_str)
    }

    pub fn args(&self) -> &[String] {
        self.0.get(1..).unwrap_or_default()
    }

    pub fn tokens(&self) -> &[String] {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl<S: Into<String>> FromIterator<S> for CommandLine {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        Self(iter.into_iter().map(Into::into).collect())
    }
}

/// Object-safe trait for any command that can be executed by the shell.
///
/// This is implemented by built-ins via a blanket impl and by external commands.
pub trait ExecutableCommand {
    /// Executes the command. Built-ins write their output to `stdout`;
    /// external programs inherit the shell's own standard streams.
    fn execute(self: Box<Self>, stdout: &mut dyn Write, env: &mut Environment)
    -> Result<ExitCode>;
}

/// Factory that tries to create a command from a name and its arguments.
///
/// Returns `None` when the factory doesn't recognize the `name`.
pub trait CommandFactory {
    /// Attempt to create a command instance for the provided name and arguments.
    fn try_create(
        &self,
        env: &Environment,
        name: &str,
        args: &[&str],
    ) -> Option<Box<dyn ExecutableCommand>>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_command_line_splits_name_and_args() {
        let line: CommandLine = ["cp", "-a", "x", "y"].into_iter().collect();
        assert_eq!(line.name(), Some("cp"));
        assert_eq!(line.args(), ["-a", "x", "y"]);
    }

    #[test]
    fn test_command_line_without_args() {
        let line: CommandLine = ["exit"].into_iter().collect();
        assert!(line.args().is_empty());
        assert!(CommandLine::new(Vec::new()).name().is_none());
    }
}
