//! Streaming removal of injected markup regions.
//!
//! [`MarkupStripper`] wraps any [`Read`] and yields the same bytes with every
//! `begin ..= end` region removed. Matching is done by a two-state automaton
//! that never holds more than `begin.len()` unconfirmed bytes, so the input
//! is never buffered as a whole and any read size works, down to one byte.
//!
//! ```
//! use std::io::Read;
//! use fineprint_core::strip::MarkupStripper;
//!
//! let input = b"keep<!--x-->drop<!--/x-->keep".as_slice();
//! let mut stripper = MarkupStripper::new(input, "<!--x-->", "<!--/x-->")?;
//! let mut out = String::new();
//! stripper.read_to_string(&mut out)?;
//! assert_eq!(out, "keepkeep");
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

use crate::errors::{FinePrintError, Result};
use std::collections::VecDeque;
use std::io::{self, Read};

/// Opening marker of the toolbar the Wayback Machine injects into captures
pub const WAYBACK_BEGIN_MARKER: &str = "<!-- BEGIN WAYBACK TOOLBAR INSERT -->";
/// Closing marker of the Wayback toolbar
pub const WAYBACK_END_MARKER: &str = "<!-- END WAYBACK TOOLBAR INSERT -->";

const READ_CHUNK: usize = 4096;

/// A literal marker with its KMP failure table
#[derive(Debug, Clone)]
struct Marker {
    bytes: Vec<u8>,
    failure: Vec<usize>,
}

impl Marker {
    fn new(bytes: Vec<u8>) -> Self {
        let mut failure = vec![0; bytes.len()];
        let mut k = 0;
        for i in 1..bytes.len() {
            while k > 0 && bytes[i] != bytes[k] {
                k = failure[k - 1];
            }
            if bytes[i] == bytes[k] {
                k += 1;
            }
            failure[i] = k;
        }
        Self { bytes, failure }
    }

    fn len(&self) -> usize {
        self.bytes.len()
    }

    /// Longest marker prefix that is a suffix of `bytes[..matched] + byte`.
    fn step(&self, mut matched: usize, byte: u8) -> usize {
        loop {
            if matched < self.bytes.len() && self.bytes[matched] == byte {
                return matched + 1;
            }
            if matched == 0 {
                return 0;
            }
            matched = self.failure[matched - 1];
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    /// Passing bytes through; `pending` bytes of `begin` are held back
    Copying { pending: usize },
    /// Inside a marked region; `matched` bytes of `end` have been seen
    Skipping { matched: usize },
}

/// The strip automaton, independent of any reader
#[derive(Debug, Clone)]
struct StripMachine {
    begin: Marker,
    end: Marker,
    state: State,
}

impl StripMachine {
    fn new(begin: Vec<u8>, end: Vec<u8>) -> Self {
        Self {
            begin: Marker::new(begin),
            end: Marker::new(end),
            state: State::Copying { pending: 0 },
        }
    }

    fn feed(&mut self, input: &[u8], out: &mut VecDeque<u8>) {
        for &byte in input {
            self.state = match self.state {
                State::Copying { pending } => {
                    let next = self.begin.step(pending, byte);
                    if next <= pending {
                        // Held-back bytes that can no longer start a marker.
                        let released = pending + 1 - next;
                        let held = &self.begin.bytes[..pending];
                        out.extend(held.iter().chain(std::iter::once(&byte)).take(released));
                    }
                    if next == self.begin.len() {
                        State::Skipping { matched: 0 }
                    } else {
                        State::Copying { pending: next }
                    }
                }
                State::Skipping { matched } => {
                    let next = self.end.step(matched, byte);
                    if next == self.end.len() {
                        State::Copying { pending: 0 }
                    } else {
                        State::Skipping { matched: next }
                    }
                }
            };
        }
    }

    /// End of input: an unconfirmed `begin` prefix is real data, an open
    /// region is dropped.
    fn finish(&mut self, out: &mut VecDeque<u8>) {
        if let State::Copying { pending } = self.state {
            out.extend(&self.begin.bytes[..pending]);
        }
        self.state = State::Copying { pending: 0 };
    }
}

/// Reader adapter removing every `begin ..= end` region from its input
///
/// Regions are not nested: inside a region only `end` is looked for. A
/// region left open at end of input is discarded, while a trailing partial
/// `begin` is passed through.
pub struct MarkupStripper<R> {
    inner: R,
    machine: StripMachine,
    out: VecDeque<u8>,
    done: bool,
}

impl<R: Read> MarkupStripper<R> {
    /// Strip regions delimited by the given markers
    ///
    /// # Errors
    ///
    /// `EmptyMarker` if either marker is empty.
    pub fn new(inner: R, begin: impl Into<Vec<u8>>, end: impl Into<Vec<u8>>) -> Result<Self> {
        let begin = begin.into();
        let end = end.into();
        if begin.is_empty() {
            return Err(FinePrintError::EmptyMarker { which: "begin" });
        }
        if end.is_empty() {
            return Err(FinePrintError::EmptyMarker { which: "end" });
        }
        Ok(Self::from_markers(inner, begin, end))
    }

    /// Strip the Wayback Machine toolbar
    pub fn wayback(inner: R) -> Self {
        Self::from_markers(
            inner,
            WAYBACK_BEGIN_MARKER.as_bytes().to_vec(),
            WAYBACK_END_MARKER.as_bytes().to_vec(),
        )
    }

    fn from_markers(inner: R, begin: Vec<u8>, end: Vec<u8>) -> Self {
        Self {
            inner,
            machine: StripMachine::new(begin, end),
            out: VecDeque::new(),
            done: false,
        }
    }

    pub fn into_inner(self) -> R {
        self.inner
    }
}

impl<R: Read> Read for MarkupStripper<R> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        if buf.is_empty() {
            return Ok(0);
        }

        let mut chunk = [0u8; READ_CHUNK];
        while self.out.is_empty() && !self.done {
            let n = match self.inner.read(&mut chunk) {
                Ok(n) => n,
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => return Err(e),
            };
            if n == 0 {
                self.machine.finish(&mut self.out);
                self.done = true;
            } else {
                self.machine.feed(&chunk[..n], &mut self.out);
            }
        }

        let n = buf.len().min(self.out.len());
        for (slot, byte) in buf.iter_mut().zip(self.out.drain(..n)) {
            *slot = byte;
        }
        Ok(n)
    }
}
