use crate::command::{CommandFactory, ExecutableCommand, ExitCode};
use crate::env::Environment;
use crate::error::ShellError;
use crate::interpreter::Factory;
use anyhow::Result;
use nix::libc;
use nix::sys::wait::{WaitStatus, waitpid};
use nix::errno::Errno;
use nix::unistd::{ForkResult, Pid, fork};
use std::ffi::{CStr, CString};
use std::ptr;
use std::io::{self, Write};
use tracing::{debug, warn};

/// Status a child reports when its program image could not be loaded.
const EXEC_FAILED: ExitCode = 127;

/// How a spawned child was left by [`spawn`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SpawnOutcome {
    /// The child was waited for and finished with this status.
    Exited(ExitCode),
    /// The child was not waited for; reaping it is up to the caller.
    Detached(Pid),
}

/// Any program that is not a builtin, looked up through `PATH` by `execvp`.
pub(crate) struct ExternalCommand {
    argv: Vec<String>,
}

impl ExecutableCommand for ExternalCommand {
    fn execute(
        self: Box<Self>,
        stdout: &mut dyn Write,
        _env: &mut Environment,
    ) -> Result<ExitCode> {
        // The child writes straight to the inherited descriptors.
        stdout.flush()?;
        match spawn(&self.argv, true)? {
            SpawnOutcome::Exited(code) => Ok(code),
            SpawnOutcome::Detached(_) => Ok(0),
        }
    }
}

/// Accepts every name, so it has to be the last factory consulted.
impl CommandFactory for Factory<ExternalCommand> {
    fn try_create(
        &self,
        _env: &Environment,
        name: &str,
        args: &[&str],
    ) -> Option<Box<dyn ExecutableCommand>> {
        let argv = std::iter::once(name)
            .chain(args.iter().copied())
            .map(str::to_owned)
            .collect();
        Some(Box::new(ExternalCommand { argv }))
    }
}

/// Forks and runs `argv[0]` with `argv` as its argument vector.
///
/// With `wait` the parent blocks until the child is gone and gets its status
/// back (`128 + signal` for a signalled child). Without it the child's pid is
/// returned right after the fork.
///
/// If the program cannot be executed the child reports the reason on standard
/// error and exits with 127; it never returns into the caller.
pub fn spawn(argv: &[String], wait: bool) -> Result<SpawnOutcome, ShellError> {
    let program = argv.first().ok_or(ShellError::EmptyCommand)?;
    let c_argv = argv
        .iter()
        .map(|arg| {
            CString::new(arg.as_bytes()).map_err(|_| ShellError::InvalidArgument {
                argument: arg.clone(),
            })
        })
        .collect::<Result<Vec<_>, _>>()?;
    let mut argv_ptrs: Vec<*const libc::c_char> = c_argv.iter().map(|arg| arg.as_ptr()).collect();
    argv_ptrs.push(ptr::null());

    if let Err(err) = io::stdout().flush() {
        warn!(%err, "flushing standard output before fork failed");
    }

    // SAFETY: the child does not allocate. It only reads the argument strings
    // and pointer array built above and calls execvp, write and _exit.
    match unsafe { fork() } {
        Ok(ForkResult::Parent { child }) => {
            debug!(%program, pid = child.as_raw(), wait, "spawned");
            if wait {
                wait_for(child).map(SpawnOutcome::Exited)
            } else {
                Ok(SpawnOutcome::Detached(child))
            }
        }
        Ok(ForkResult::Child) => exec_or_exit(&c_argv[0], &argv_ptrs),
        Err(source) => Err(ShellError::ProcessCreationFailed {
            program: program.clone(),
            source,
        }),
    }
}

fn exec_or_exit(program: &CStr, argv: &[*const libc::c_char]) -> ! {
    // SAFETY: `argv` points into strings owned by the caller and ends with a
    // null pointer. execvp only returns on failure.
    unsafe {
        libc::execvp(program.as_ptr(), argv.as_ptr());
    }
    let reason = Errno::last().desc();
    // SAFETY: plain writes of live buffers to the inherited stderr, then exit
    // without running any of the parent's atexit handlers or destructors.
    unsafe {
        let parts: [&[u8]; 4] = [program.to_bytes(), b": ", reason.as_bytes(), b"\n"];
        for part in parts {
            libc::write(libc::STDERR_FILENO, part.as_ptr().cast(), part.len());
        }
        libc::_exit(EXEC_FAILED)
    }
}

fn wait_for(child: Pid) -> Result<ExitCode, ShellError> {
    loop {
        match waitpid(child, None) {
            Ok(WaitStatus::Exited(_, code)) => {
                debug!(pid = child.as_raw(), code, "child exited");
                return Ok(code);
            }
            Ok(WaitStatus::Signaled(_, signal, _)) => {
                warn!(pid = child.as_raw(), ?signal, "child killed by signal");
                return Ok(128 + signal as ExitCode);
            }
            Ok(_) | Err(Errno::EINTR) => continue,
            Err(source) => {
                return Err(ShellError::WaitFailed {
                    pid: child.as_raw(),
                    source,
                });
            }
        }
    }
}
