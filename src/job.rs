//! Foreground/background selection and bookkeeping for background children.

use crate::command::Job;
use crate::lexer::ArgVector;

/// Trailing token that sends a command to the background.
pub const BACKGROUND_MARKER: &[u8] = b"&";

/// Whether the shell waits for a command.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    Foreground,
    Background,
}

/// Strip a trailing `&` token from `argv`.
///
/// Only a standalone last token counts: `sleep 1&` keeps `1&` as an argument.
pub fn detach_marker(argv: &mut ArgVector<'_>) -> Mode {
    if argv.last() == Some(BACKGROUND_MARKER) {
        argv.pop();
        Mode::Background
    } else {
        Mode::Foreground
    }
}

/// Background children that have not been collected yet.
#[derive(Default)]
pub struct BackgroundJobs {
    jobs: Vec<Box<dyn Job>>,
}

impl BackgroundJobs {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, job: Box<dyn Job>) {
        self.jobs.push(job);
    }

    /// Number of children still being tracked.
    pub fn len(&self) -> usize {
        self.jobs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.jobs.is_empty()
    }

    /// Collect every child that has already terminated, without blocking.
    ///
    /// Returns how many were collected. A child whose status cannot be polled is dropped.
    pub fn reap(&mut self) -> usize {
        let before = self.jobs.len();
        self.jobs.retain_mut(|job| match job.try_wait() {
            Ok(Some(code)) => {
                log::debug!("background process {} exited with {}", job.id(), code);
                false
            }
            Ok(None) => true,
            Err(e) => {
                log::warn!("failed to poll background process {}: {}", job.id(), e);
                false
            }
        });
        before - self.jobs.len()
    }
}
