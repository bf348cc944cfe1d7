use crate::command::{ExitCode, Job, Launcher};
use crate::error::SpawnError;
use std::ffi::OsStr;
use std::io;
use std::process::{Child, Command, ExitStatus};

/// Launches programs as real child processes.
///
/// The program name is looked up in `PATH` by the OS the way `execvp` does. Environment,
/// working directory and the three standard streams are inherited from the shell.
#[derive(Debug, Default)]
pub struct ProcessLauncher;

impl Launcher for ProcessLauncher {
    fn launch(&mut self, argv: &[&OsStr]) -> Result<Box<dyn Job>, SpawnError> {
        let (program, args) = argv
            .split_first()
            .ok_or_else(|| SpawnError::Load(io::Error::from(io::ErrorKind::InvalidInput)))?;
        let child = Command::new(program)
            .args(args)
            .spawn()
            .map_err(SpawnError::classify)?;
        Ok(Box::new(child))
    }
}

impl Job for Child {
    fn id(&self) -> u32 {
        Child::id(self)
    }

    fn wait(&mut self) -> io::Result<ExitCode> {
        Child::wait(self).map(status_code)
    }

    fn try_wait(&mut self) -> io::Result<Option<ExitCode>> {
        Ok(Child::try_wait(self)?.map(status_code))
    }
}

fn status_code(exit_status: ExitStatus) -> ExitCode {
    exit_status
        .code()
        .unwrap_or_else(|| terminated_by_signal(exit_status))
}

/// Killed children report `128 + signal`, as POSIX shells print in `$?`.
#[cfg(unix)]
fn terminated_by_signal(exit_status: ExitStatus) -> ExitCode {
    use std::os::unix::process::ExitStatusExt;
    exit_status.signal().map_or(-1, |signal| 128 + signal)
}

#[cfg(not(unix))]
fn terminated_by_signal(_exit_status: ExitStatus) -> ExitCode {
    -1
}
