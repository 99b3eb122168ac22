use crate::command::{CommandFactory, CommandLine, CommandResult, ExitCode};
use crate::env::Environment;
use crate::error::ShellError;
use crate::line_reader::LineSource;
use crate::parser::parse_line;
use crate::prompt;
use std::io::{self, Write};
use std::ops::ControlFlow;
use tracing::{debug, warn};

/// Factory allows creating instances of ExecutableCommand.
///
/// Only support commands defined in this crate: BuiltinCommand and ExternalCommand.
pub(crate) struct Factory<T> {
    _phantom: std::marker::PhantomData<T>,
}

impl<T> Default for Factory<T> {
    fn default() -> Self {
        Self {
            _phantom: std::marker::PhantomData,
        }
    }
}

/// A minimal shell-like interpreter that can execute built-in and external commands.
///
/// The interpreter maintains an [`Environment`] and a list of [`CommandFactory`] objects
/// that are queried in order to create commands by name. See [`Default`] for the
/// factories included out of the box.
///
/// Example
/// ```
/// use minishell::Interpreter;
/// let mut sh = Interpreter::default();
/// let code = sh.run("echo", &["hello", "world"]).unwrap();
/// assert_eq!(code, 0);
/// ```
pub struct Interpreter {
    env: Environment,
    commands: Vec<Box<dyn CommandFactory>>,
}

impl Interpreter {
    /// Create a new interpreter with a custom set of command factories.
    pub fn new(commands: Vec<Box<dyn CommandFactory>>) -> Self {
        Self::with_environment(Environment::new(), commands)
    }

    pub fn with_environment(env: Environment, commands: Vec<Box<dyn CommandFactory>>) -> Self {
        Self { env, commands }
    }

    /// Builtins in lookup order, with the external launcher last.
    pub fn default_commands() -> Vec<Box<dyn CommandFactory>> {
        use crate::builtin::*;
        use crate::external::ExternalCommand;
        vec![
            Box::new(Factory::<Exit>::default()),
            Box::new(Factory::<Echo>::default()),
            Box::new(Factory::<Cd>::default()),
            Box::new(Factory::<Cp>::default()),
            Box::new(Factory::<Mv>::default()),
            Box::new(Factory::<ExternalCommand>::default()),
        ]
    }

    pub fn env(&self) -> &Environment {
        &self.env
    }

    /// Run a single command invocation by name with arguments, writing
    /// builtin output to the process's standard output.
    pub fn run(&mut self, name: &str, args: &[&str]) -> anyhow::Result<ExitCode> {
        let mut stdout = io::stdout().lock();
        self.run_with_output(name, args, &mut stdout)
    }

    /// Same as [`Interpreter::run`] with builtin output going to `stdout`.
    pub fn run_with_output(
        &mut self,
        name: &str,
        args: &[&str],
        stdout: &mut dyn Write,
    ) -> anyhow::Result<ExitCode> {
        for factory in &self.commands {
            if let Some(cmd) = factory.try_create(&self.env, name, args) {
                return cmd.execute(stdout, &mut self.env);
            }
        }
        Err(anyhow::anyhow!("command not found: {}", name))
    }

    /// Runs one parsed stage and reports whether the shell should stop.
    pub fn dispatch(
        &mut self,
        line: &CommandLine,
        stdout: &mut dyn Write,
    ) -> anyhow::Result<CommandResult> {
        let name = line.name().ok_or(ShellError::EmptyCommand)?;
        let args: Vec<&str> = line.args().iter().map(String::as_str).collect();
        debug!(name, ?args, "dispatching");

        let code = self.run_with_output(name, &args, stdout)?;
        if std::mem::take(&mut self.env.should_exit) {
            Ok(CommandResult::quit(code))
        } else {
            Ok(CommandResult::new(code))
        }
    }

    /// Parses `line` and dispatches its stages in order.
    ///
    /// A failing stage is reported on `stderr`, sets the last status to 1 and
    /// drops the rest of the line. `Break` carries the status passed to `exit`.
    /// A line without stages leaves the last status alone.
    pub fn execute_line(
        &mut self,
        line: &str,
        stdout: &mut dyn Write,
        stderr: &mut dyn Write,
    ) -> ControlFlow<ExitCode> {
        for stage in parse_line(line) {
            match self.dispatch(&stage, stdout) {
                Ok(result) => {
                    self.env.last_status = result.code;
                    if result.quit_requested {
                        flush(stdout);
                        return ControlFlow::Break(result.code);
                    }
                }
                Err(err) => {
                    flush(stdout);
                    report(stderr, &err);
                    self.env.last_status = 1;
                    break;
                }
            }
        }
        flush(stdout);
        ControlFlow::Continue(())
    }

    /// Reads and executes lines from `input` until `exit` or end of input.
    ///
    /// Returns the status the shell process should exit with.
    pub fn repl(&mut self, input: &mut dyn LineSource) -> anyhow::Result<ExitCode> {
        let mut stdout = io::stdout();
        let mut stderr = io::stderr();
        self.repl_with_output(input, &mut stdout, &mut stderr)
    }

    pub fn repl_with_output(
        &mut self,
        input: &mut dyn LineSource,
        stdout: &mut dyn Write,
        stderr: &mut dyn Write,
    ) -> anyhow::Result<ExitCode> {
        loop {
            let prompt = prompt::render(&self.env);
            let Some(line) = input.next_line(&prompt)? else {
                debug!(status = self.env.last_status, "end of input");
                return Ok(self.env.last_status);
            };
            if let ControlFlow::Break(code) = self.execute_line(&line, stdout, stderr) {
                return Ok(code);
            }
        }
    }
}

impl Default for Interpreter {
    /// Create an interpreter with the default set of commands:
    /// - built-ins: `exit`, `echo`, `cd`, `cp`, `mv`
    /// - external command launcher
    fn default() -> Self {
        Self::new(Self::default_commands())
    }
}

fn flush(stdout: &mut dyn Write) {
    if let Err(err) = stdout.flush() {
        warn!(%err, "flushing standard output failed");
    }
}

/// Prints an error and its causes, outermost first.
fn report(stderr: &mut dyn Write, err: &anyhow::Error) {
    let _ = writeln!(stderr, "error: {err}");
    for cause in err.chain().skip(1) {
        let _ = writeln!(stderr, "  caused by: {cause}");
    }
    let _ = stderr.flush();
}
