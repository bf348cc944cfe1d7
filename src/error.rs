use std::io;
use thiserror::Error;

/// Errors produced while turning an argument vector into a running process.
#[derive(Debug, Error)]
pub enum SpawnError {
    /// The process could not be created at all (resource exhaustion). Fatal to the shell.
    #[error("Fork failed: {0}")]
    Create(#[source] io::Error),
    /// The program image could not be loaded: missing, not executable, malformed.
    /// Only the command fails; the shell carries on.
    #[error("exec failed: {0}")]
    Load(#[source] io::Error),
}

#[cfg(unix)]
const EXHAUSTION_ERRNOS: &[i32] = &[libc::EMFILE, libc::ENFILE];

#[cfg(not(unix))]
const EXHAUSTION_ERRNOS: &[i32] = &[];

impl SpawnError {
    /// Sort an error returned by the OS spawn call into one of the two classes.
    ///
    /// Running out of processes, memory or file descriptors means the process could not
    /// be created; everything else comes from loading the program image.
    pub fn classify(err: io::Error) -> Self {
        let exhausted = matches!(
            err.kind(),
            io::ErrorKind::WouldBlock | io::ErrorKind::OutOfMemory
        ) || err
            .raw_os_error()
            .is_some_and(|code| EXHAUSTION_ERRNOS.contains(&code));
        if exhausted {
            SpawnError::Create(err)
        } else {
            SpawnError::Load(err)
        }
    }
}

/// Errors that end the shell loop.
#[derive(Debug, Error)]
pub enum ShellError {
    /// Process creation failed; the shell must exit with status 1.
    #[error("Fork failed: {0}")]
    Create(#[source] io::Error),
    /// Reading the next line failed.
    #[error("failed to read input: {0}")]
    Input(#[source] io::Error),
    /// Writing the prompt or a notice failed.
    #[error("failed to write output: {0}")]
    Output(#[source] io::Error),
}
