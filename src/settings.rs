/// Default prompt printed before every read.
pub const DEFAULT_PROMPT: &str = "osh> ";

/// Default size of the line buffer, terminator included.
pub const DEFAULT_MAX_LINE: usize = 80;

/// Runtime configuration of the shell loop.
///
/// The defaults reproduce the classic behaviour: an `osh> ` prompt, lines bounded to
/// 80 bytes including the terminator, and background children reaped opportunistically.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    /// Prompt printed (and flushed) before each read.
    pub prompt: String,
    /// Buffer size including the terminator. At most `max_line - 1` bytes are read per line.
    pub max_line: usize,
    /// When set, finished background children are collected at the top of every iteration.
    /// When cleared, background children are spawned and forgotten.
    pub reap_background: bool,
}

impl Settings {
    /// Number of bytes a single read may return, newline included.
    pub fn line_capacity(&self) -> usize {
        self.max_line.saturating_sub(1)
    }

    /// Check that the buffer can hold at least one byte plus the terminator.
    pub fn validate(&self) -> anyhow::Result<()> {
        anyhow::ensure!(
            self.max_line >= 2,
            "max line length must be at least 2, got {}",
            self.max_line
        );
        Ok(())
    }
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            prompt: DEFAULT_PROMPT.to_string(),
            max_line: DEFAULT_MAX_LINE,
            reap_background: true,
        }
    }
}
