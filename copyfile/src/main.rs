use std::process::ExitCode;

use anyhow::{Context, Result, bail};
use argh::FromArgs;
use copyfile::{MoveOutcome, TransferRequest};
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(FromArgs, Debug)]
/// Copy a regular file, or move it with -m.
struct CopyfileArgs {
    #[argh(switch, short = 'm')]
    /// move the file instead of copying it.
    move_file: bool,

    #[argh(switch, short = 'a')]
    /// copy permissions, ownership and timestamps of the original file.
    preserve: bool,

    #[argh(positional)]
    /// the file to be copied.
    src: String,

    #[argh(positional)]
    /// the destination file or directory.
    dst: String,
}

fn run(args: &CopyfileArgs) -> Result<()> {
    if args.move_file && args.preserve {
        bail!("you can not use flags -m and -a simultaneously");
    }

    let request = TransferRequest::new(&args.src, &args.dst).preserve_attributes(args.preserve);
    if args.move_file {
        let target = request.effective_destination().context("move failed")?;
        let renamed = request.rename_or_copy().context("move failed")? == MoveOutcome::Renamed;
        info!(src = %args.src, dst = %target.display(), renamed, "moved");
    } else {
        let written = request.copy().context("copy failed")?;
        info!(src = %args.src, dst = %written.display(), "copied");
    }
    Ok(())
}

fn init_logging() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn main() -> ExitCode {
    init_logging();
    let args: CopyfileArgs = argh::from_env();
    match run(&args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("copyfile: {err:?}");
            eprintln!("Try copyfile --help for more information");
            ExitCode::FAILURE
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Result<CopyfileArgs, argh::EarlyExit> {
        CopyfileArgs::from_args(&["copyfile"], args)
    }

    #[test]
    fn test_flags_may_appear_anywhere() {
        let args = parse(&["a.txt", "-a", "b.txt"]).unwrap();
        assert!(args.preserve);
        assert!(!args.move_file);
        assert_eq!(args.src, "a.txt");
        assert_eq!(args.dst, "b.txt");
    }

    #[test]
    fn test_too_many_arguments_is_a_usage_error() {
        let exit = parse(&["a", "b", "c"]).unwrap_err();
        assert!(exit.status.is_err());
    }

    #[test]
    fn test_help_is_not_an_error() {
        let exit = parse(&["--help"]).unwrap_err();
        assert!(exit.status.is_ok());
        assert!(exit.output.contains("-m"));
    }

    #[test]
    fn test_move_and_preserve_together_are_rejected() {
        let args = parse(&["-m", "-a", "a", "b"]).unwrap();
        let err = run(&args).unwrap_err();
        assert!(err.to_string().contains("simultaneously"));
    }
}
