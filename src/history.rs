use crate::input::BoundedLine;

/// The whole line that asks for the previous command to run again.
pub const RECALL_TOKEN: &[u8] = b"!!\n";

/// Single-slot command history.
///
/// Holds the most recent line that was not a recall request, or nothing before the
/// first command. Recalling never modifies the slot, so `!!` twice replays the same
/// command twice.
#[derive(Debug, Default)]
pub struct History {
    last: Option<BoundedLine>,
}

impl History {
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether `line` is the recall token on its own.
    pub fn is_recall(line: &BoundedLine) -> bool {
        line.as_bytes() == RECALL_TOKEN
    }

    /// Overwrite the slot with `line`.
    pub fn record(&mut self, line: &BoundedLine) {
        self.last = Some(line.clone());
    }

    /// The remembered line, or `None` if nothing has been entered yet.
    pub fn recall(&self) -> Option<&BoundedLine> {
        self.last.as_ref()
    }
}
