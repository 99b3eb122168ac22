use crate::command::{CommandFactory, ExecutableCommand, ExitCode};
use crate::env::Environment;
use crate::error::ShellError;
use crate::interpreter::Factory;
use anyhow::{Context, Result};
use argh::{EarlyExit, FromArgs};
use copyfile::TransferRequest;
use std::env;
use std::io::Write;
use std::path::PathBuf;
use tracing::{debug, warn};

/// Built-in commands known to the shell at compile time.
///
/// Builtins are parsed using the [`argh`] crate (`FromArgs`) and executed directly
/// in-process without spawning a child process.
pub(crate) trait BuiltinCommand: Sized + FromArgs {
    /// Canonical name of the command, e.g. "echo" or "cd".
    fn name() -> &'static str;

    /// Executes the command using the provided output stream and environment.
    ///
    /// Return value should follow shell conventions: 0 for success, non-zero for error.
    fn execute(self, stdout: &mut dyn Write, env: &mut Environment) -> Result<ExitCode>;
}

impl<T: BuiltinCommand> ExecutableCommand for T {
    fn execute(
        self: Box<Self>,
        stdout: &mut dyn Write,
        env: &mut Environment,
    ) -> Result<ExitCode> {
        T::execute(*self, stdout, env).with_context(|| format!("{} command failed", T::name()))
    }
}

/// Stand-in for a builtin whose arguments did not parse (or asked for `--help`).
struct InvalidArgs {
    output: String,
    is_error: bool,
}

impl ExecutableCommand for InvalidArgs {
    fn execute(
        self: Box<Self>,
        stdout: &mut dyn Write,
        _env: &mut Environment,
    ) -> Result<ExitCode> {
        writeln!(stdout, "{}", self.output.trim_end())?;
        Ok(if self.is_error { 1 } else { 0 })
    }
}

impl<T: BuiltinCommand + 'static> CommandFactory for Factory<T> {
    fn try_create(
        &self,
        _env: &Environment,
        name: &str,
        args: &[&str],
    ) -> Option<Box<dyn ExecutableCommand>> {
        if name == T::name() {
            Some(match T::from_args(&[name], args) {
                Ok(cmd) => Box::new(cmd),
                Err(EarlyExit { output, status }) => Box::new(InvalidArgs {
                    output,
                    is_error: status.is_err(),
                }),
            })
        } else {
            None
        }
    }
}

/// Exit the shell.
///
/// Arguments are taken verbatim, so `exit` ends the shell whatever they are.
/// The first non-empty argument is the status; one that is not a number
/// exits with 1.
pub struct Exit {
    pub args: Vec<String>,
}

impl Exit {
    fn status(&self) -> ExitCode {
        let Some(arg) = self.args.iter().find(|arg| !arg.is_empty()) else {
            return 0;
        };
        arg.parse().unwrap_or_else(|_| {
            warn!(argument = %arg, "exit status is not a number");
            1
        })
    }
}

impl FromArgs for Exit {
    fn from_args(_command_name: &[&str], args: &[&str]) -> Result<Self, EarlyExit> {
        Ok(Self {
            args: args.iter().map(|arg| arg.to_string()).collect(),
        })
    }
}

impl BuiltinCommand for Exit {
    fn name() -> &'static str {
        "exit"
    }

    fn execute(self, _stdout: &mut dyn Write, env: &mut Environment) -> Result<ExitCode> {
        env.should_exit = true;
        Ok(self.status())
    }
}

#[derive(FromArgs)]
/// write the arguments to standard output, separated by spaces.
/// a word starting with a double quote is joined with the following words
/// up to the one ending with a double quote.
pub struct Echo {
    #[argh(switch, short = 'n')]
    /// do not output the trailing newline.
    pub no_newline: bool,

    #[argh(positional, greedy)]
    /// values to print, separated by spaces.
    pub args: Vec<String>,
}

impl BuiltinCommand for Echo {
    fn name() -> &'static str {
        "echo"
    }

    fn execute(self, stdout: &mut dyn Write, _env: &mut Environment) -> Result<ExitCode> {
        let s = join_quoted(&self.args)?.join(" ");
        if self.no_newline {
            write!(stdout, "{}", s)?;
        } else {
            writeln!(stdout, "{}", s)?;
        }
        Ok(0)
    }
}

/// Re-joins words that were split on spaces inside a double-quoted span and
/// strips the quotes.
pub fn join_quoted(args: &[String]) -> Result<Vec<String>, ShellError> {
    let mut words = Vec::with_capacity(args.len());
    let mut iter = args.iter();
    while let Some(arg) = iter.next() {
        let Some(rest) = arg.strip_prefix('"') else {
            if arg.ends_with('"') {
                return Err(ShellError::UnbalancedQuotes);
            }
            words.push(arg.clone());
            continue;
        };
        if let Some(inner) = rest.strip_suffix('"') {
            words.push(inner.to_string());
            continue;
        }

        let mut span = rest.to_string();
        loop {
            let next = iter.next().ok_or(ShellError::UnbalancedQuotes)?;
            span.push(' ');
            if let Some(last) = next.strip_suffix('"') {
                span.push_str(last);
                break;
            }
            span.push_str(next);
        }
        words.push(span);
    }
    Ok(words)
}

#[derive(FromArgs)]
/// Change the current working directory.
/// If no target is provided, changes to the directory specified by the HOME environment variable.
pub struct Cd {
    #[argh(positional, greedy)]
    /// directory to switch to; absolute or relative to the current directory. Defaults to $HOME when omitted.
    pub targets: Vec<String>,
}

impl BuiltinCommand for Cd {
    fn name() -> &'static str {
        "cd"
    }

    fn execute(self, _stdout: &mut dyn Write, env: &mut Environment) -> Result<ExitCode> {
        let target = match self.targets.as_slice() {
            [] => env.home_dir().ok_or(ShellError::HomeNotFound)?,
            [t] => PathBuf::from(t),
            _ => {
                return Err(ShellError::TooManyArguments {
                    command: "cd",
                    max: 1,
                }
                .into());
            }
        };

        let new_dir = env.current_dir.join(target);
        env::set_current_dir(&new_dir).map_err(|source| ShellError::ChangeDirFailed {
            path: new_dir.clone(),
            source,
        })?;
        env.current_dir = env::current_dir().unwrap_or(new_dir);
        debug!(cwd = %env.current_dir.display(), "changed directory");
        Ok(0)
    }
}

#[derive(FromArgs)]
/// Copy a regular file. With -m the file is moved instead.
pub struct Cp {
    #[argh(switch, short = 'a')]
    /// preserve permissions, ownership and timestamps of the source.
    pub preserve: bool,

    #[argh(switch, short = 'm')]
    /// move the file instead of copying it.
    pub move_file: bool,

    #[argh(positional)]
    /// the file to copy.
    pub source: String,

    #[argh(positional)]
    /// destination file or directory.
    pub destination: String,
}

impl BuiltinCommand for Cp {
    fn name() -> &'static str {
        "cp"
    }

    fn execute(self, stdout: &mut dyn Write, env: &mut Environment) -> Result<ExitCode> {
        if self.move_file {
            let mv = Mv {
                move_file: true,
                source: self.source,
                destination: self.destination,
            };
            return BuiltinCommand::execute(mv, stdout, env);
        }

        let written = TransferRequest::new(
            env.current_dir.join(&self.source),
            env.current_dir.join(&self.destination),
        )
        .preserve_attributes(self.preserve)
        .copy()
        .context("copy failed")?;
        debug!(destination = %written.display(), preserve = self.preserve, "copied");
        Ok(0)
    }
}

#[derive(FromArgs)]
/// Move or rename a regular file.
pub struct Mv {
    #[argh(switch, short = 'm')]
    /// accepted for symmetry with cp -m; has no further effect.
    pub move_file: bool,

    #[argh(positional)]
    /// the file to move.
    pub source: String,

    #[argh(positional)]
    /// destination file or directory.
    pub destination: String,
}

impl BuiltinCommand for Mv {
    fn name() -> &'static str {
        "mv"
    }

    fn execute(self, _stdout: &mut dyn Write, env: &mut Environment) -> Result<ExitCode> {
        let outcome = TransferRequest::new(
            env.current_dir.join(&self.source),
            env.current_dir.join(&self.destination),
        )
        .rename_or_copy()
        .context("move failed")?;
        debug!(?outcome, "moved");
        Ok(0)
    }
}
