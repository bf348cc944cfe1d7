//! Splitting of a raw line into an argument vector.
//!
//! Only the space and the newline separate arguments. There is no quoting or escaping:
//! `echo "a b"` yields the three tokens `echo`, `"a` and `b"`. Tabs and every other byte
//! belong to the token they appear in.

use std::ffi::OsStr;

const DELIMITERS: &[u8] = b" \n";

/// Arguments of one command line, borrowed from the line they were cut from.
///
/// Token 0, when present, names the program. The end of the vector is its length; there
/// is no sentinel entry.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ArgVector<'a> {
    tokens: Vec<&'a [u8]>,
}

impl<'a> ArgVector<'a> {
    pub fn len(&self) -> usize {
        self.tokens.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }

    /// The program name, if there is any token at all.
    pub fn program(&self) -> Option<&'a [u8]> {
        self.tokens.first().copied()
    }

    pub fn last(&self) -> Option<&'a [u8]> {
        self.tokens.last().copied()
    }

    /// Drop the last token, returning it.
    pub fn pop(&mut self) -> Option<&'a [u8]> {
        self.tokens.pop()
    }

    pub fn tokens(&self) -> &[&'a [u8]] {
        &self.tokens
    }

    /// The tokens as OS strings, program name first.
    pub fn to_os_strs(&self) -> Vec<&'a OsStr> {
        self.tokens.iter().map(|t| token_to_os_str(t)).collect()
    }
}

#[cfg(unix)]
fn token_to_os_str(token: &[u8]) -> &OsStr {
    use std::os::unix::ffi::OsStrExt;
    OsStr::from_bytes(token)
}

#[cfg(not(unix))]
fn token_to_os_str(token: &[u8]) -> &OsStr {
    // Non-UTF-8 tokens cannot be represented without copying; they become empty.
    OsStr::new(std::str::from_utf8(token).unwrap_or(""))
}

/// Split `line` into maximal runs of bytes that are neither a space nor a newline.
///
/// An empty or blank line gives an empty vector.
pub fn split_into_tokens(line: &[u8]) -> ArgVector<'_> {
    ArgVector {
        tokens: line
            .split(|b| DELIMITERS.contains(b))
            .filter(|t| !t.is_empty())
            .collect(),
    }
}
