//! Prompting and bounded line acquisition.
//!
//! A read returns at most `capacity` bytes and stops right after the first newline, the
//! way `fgets` fills a fixed buffer. Whatever does not fit stays in the source and comes
//! back as the next line.

use rustyline::DefaultEditor;
use rustyline::error::ReadlineError;
use std::fmt;
use std::io::{self, BufRead, Write};

/// One raw input line, newline included when one was read.
///
/// Never longer than the capacity of the source that produced it.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct BoundedLine {
    bytes: Vec<u8>,
}

impl BoundedLine {
    /// Cut the next line off the front of `input`.
    ///
    /// Takes bytes up to and including the first newline, but never more than `capacity`.
    /// Returns the line together with the number of bytes taken.
    pub fn take(input: &[u8], capacity: usize) -> (Self, usize) {
        let used = line_end(input, capacity);
        (
            Self {
                bytes: input[..used].to_vec(),
            },
            used,
        )
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    /// The line without its trailing newline.
    pub fn text(&self) -> &[u8] {
        self.bytes.strip_suffix(b"\n").unwrap_or(&self.bytes)
    }
}

impl From<&str> for BoundedLine {
    /// Wrap an already bounded piece of text. Meant for tests and callers that did their own reading.
    fn from(s: &str) -> Self {
        Self {
            bytes: s.as_bytes().to_vec(),
        }
    }
}

impl fmt::Display for BoundedLine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", String::from_utf8_lossy(self.text()))
    }
}

/// Number of bytes of `input` that make up the next line.
fn line_end(input: &[u8], capacity: usize) -> usize {
    let window = &input[..input.len().min(capacity)];
    match window.iter().position(|&b| b == b'\n') {
        Some(i) => i + 1,
        None => window.len(),
    }
}

/// Somewhere lines come from.
pub trait LineSource {
    /// Show `prompt` and return the next line, or `None` once input is exhausted.
    fn read_line(&mut self, prompt: &str, out: &mut dyn Write) -> io::Result<Option<BoundedLine>>;
}

/// Reads raw bytes from any buffered reader. Used for piped stdin and in tests.
pub struct BufferedSource<R> {
    reader: R,
    capacity: usize,
}

impl<R: BufRead> BufferedSource<R> {
    /// `capacity` is the number of bytes a single line may hold, newline included.
    pub fn new(reader: R, capacity: usize) -> Self {
        Self { reader, capacity }
    }

    fn read_bounded(&mut self) -> io::Result<Option<BoundedLine>> {
        let mut bytes = Vec::new();
        while bytes.len() < self.capacity {
            let available = match self.reader.fill_buf() {
                Ok(buf) => buf,
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => return Err(e),
            };
            if available.is_empty() {
                break;
            }
            let used = line_end(available, self.capacity - bytes.len());
            let done = available[used - 1] == b'\n';
            bytes.extend_from_slice(&available[..used]);
            self.reader.consume(used);
            if done {
                break;
            }
        }
        if bytes.is_empty() {
            Ok(None)
        } else {
            Ok(Some(BoundedLine { bytes }))
        }
    }
}

impl<R: BufRead> LineSource for BufferedSource<R> {
    fn read_line(&mut self, prompt: &str, out: &mut dyn Write) -> io::Result<Option<BoundedLine>> {
        write!(out, "{}", prompt)?;
        out.flush()?;
        self.read_bounded()
    }
}

/// Something that shows a prompt and returns one edited line.
///
/// Implemented for rustyline's [`DefaultEditor`].
pub trait LineEditor {
    fn readline(&mut self, prompt: &str) -> rustyline::Result<String>;
}

impl LineEditor for DefaultEditor {
    fn readline(&mut self, prompt: &str) -> rustyline::Result<String> {
        DefaultEditor::readline(self, prompt)
    }
}

/// Interactive source backed by a line editor.
///
/// Lines from the editor get their newline back so they look exactly like piped input.
/// Nothing is added to the editor's own history. An interrupt throws the partial line
/// away and prompts again without producing a line.
pub struct EditorSource<E = DefaultEditor> {
    editor: E,
    capacity: usize,
    pending: Vec<u8>,
}

impl EditorSource<DefaultEditor> {
    pub fn new(capacity: usize) -> rustyline::Result<Self> {
        Ok(Self::with_editor(DefaultEditor::new()?, capacity))
    }
}

impl<E: LineEditor> EditorSource<E> {
    pub fn with_editor(editor: E, capacity: usize) -> Self {
        Self {
            editor,
            capacity,
            pending: Vec::new(),
        }
    }

    fn next_edited_line(&mut self, prompt: &str) -> io::Result<Option<Vec<u8>>> {
        loop {
            match self.editor.readline(prompt) {
                Ok(line) => {
                    let mut bytes = line.into_bytes();
                    bytes.push(b'\n');
                    return Ok(Some(bytes));
                }
                Err(ReadlineError::Interrupted) => log::debug!("line discarded by interrupt"),
                Err(ReadlineError::Eof) => return Ok(None),
                Err(ReadlineError::Io(e)) => return Err(e),
                Err(e) => return Err(io::Error::other(e.to_string())),
            }
        }
    }
}

impl<E: LineEditor> LineSource for EditorSource<E> {
    fn read_line(&mut self, prompt: &str, out: &mut dyn Write) -> io::Result<Option<BoundedLine>> {
        if self.pending.is_empty() {
            match self.next_edited_line(prompt)? {
                Some(bytes) => self.pending = bytes,
                None => return Ok(None),
            }
        } else {
            // leftover of an over-long line
            write!(out, "{}", prompt)?;
            out.flush()?;
        }
        let (line, used) = BoundedLine::take(&self.pending, self.capacity);
        self.pending.drain(..used);
        Ok(Some(line))
    }
}
