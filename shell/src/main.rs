use argh::FromArgs;
use minishell::{Interpreter, LineReader, LineSource, Terminal};
use std::io::{self, IsTerminal};
use std::process::ExitCode;
use tracing::warn;
use tracing_subscriber::EnvFilter;

#[derive(FromArgs)]
/// A minimal interactive shell with exit, echo, cd, cp and mv built in.
struct ShellArgs {}

fn init_logging() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();
}

fn input() -> Box<dyn LineSource> {
    if io::stdin().is_terminal() {
        match Terminal::new() {
            Ok(terminal) => return Box::new(terminal),
            Err(err) => warn!(%err, "line editing unavailable"),
        }
    }
    Box::new(LineReader::new(io::stdin()))
}

fn main() -> ExitCode {
    let ShellArgs {} = argh::from_env();
    init_logging();

    let mut shell = Interpreter::default();
    match shell.repl(input().as_mut()) {
        Ok(code) => ExitCode::from((code & 0xff) as u8),
        Err(err) => {
            eprintln!("minishell: {err:?}");
            ExitCode::FAILURE
        }
    }
}
