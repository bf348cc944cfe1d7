use crate::error::SpawnError;
use std::ffi::OsStr;
use std::io;

/// Status a finished child (or the shell itself) reports; zero means it succeeded.
pub type ExitCode = i32;

/// A child process the shell has started.
pub trait Job {
    /// OS process id, used for logging.
    fn id(&self) -> u32;

    /// Block until the process terminates.
    fn wait(&mut self) -> io::Result<ExitCode>;

    /// Collect the exit code if the process has already terminated, without blocking.
    fn try_wait(&mut self) -> io::Result<Option<ExitCode>>;
}

/// Starts programs on behalf of the shell.
///
/// The default implementation is [`crate::ProcessLauncher`]; the seam exists so the
/// dispatch loop can be exercised without creating real processes.
pub trait Launcher {
    /// Start `argv[0]` with the whole of `argv` as its arguments (program name first),
    /// inheriting the shell's environment and standard streams.
    ///
    /// `argv` is never empty.
    fn launch(&mut self, argv: &[&OsStr]) -> Result<Box<dyn Job>, SpawnError>;
}
