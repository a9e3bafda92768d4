//! Frame reassembly over a fragmenting transport.
//!
//! BLE notifications carry at most one MTU of payload, and serial bridges
//! cut the glove's text stream wherever their UART buffer happens to fill.
//! A single notification may hold half a frame, exactly one frame, or
//! several frames back to back. [`FrameReassembler`] buffers the text and
//! hands back complete frames in arrival order.
//!
//! # Boundary Detection
//!
//! Two policies are applied, newline first:
//!
//! ```text
//! chunk contains '\n' ──► split on \r?\n, keep the trailing partial line
//!         │
//!         no
//!         ▼
//! buffer has >= 5 comma-separated tokens ──► whole buffer is one frame
//!         │
//!         no
//!         ▼
//! buffer longer than limit ──► discard (safety valve)
//! ```
//!
//! Cheap bridges disagree on line termination, so the five-token rule is
//! applied according to what the stream has shown so far:
//!
//! - [`FramingMode::Detecting`]: a chunk that lands in an empty buffer and
//!   carries five tokens is a whole packet and is emitted at once. A buffer
//!   that reached five tokens over several chunks is held for one more
//!   chunk, since its last field may still be arriving.
//! - [`FramingMode::LineDelimited`], latched by the first newline: a
//!   five-token buffer is held until the next chunk. A newline completes it
//!   as a line.
//! - [`FramingMode::FieldCount`], latched by the first emitted packet: the
//!   buffer is emitted as soon as it holds five tokens.
//!
//! A held five-token buffer is never dropped in favour of line framing. When
//! the chunk after it starts another field group (a separator but no
//! newline) the held text is emitted as a packet and the stream switches to
//! [`FramingMode::FieldCount`].
//!
//! # Example
//!
//! ```
//! use glovelink_protocol::FrameReassembler;
//!
//! let mut reassembler = FrameReassembler::new();
//!
//! assert!(reassembler.push("10,20,3").is_empty());
//! assert_eq!(reassembler.push("0,40,50\n60,7"), vec!["10,20,30,40,50"]);
//! assert_eq!(reassembler.push("0,80,90,100\r\n"), vec!["60,70,80,90,100"]);
//! assert!(reassembler.is_empty());
//! ```

use glovelink_core::constants::{
    CARRIAGE_RETURN, CHANNEL_COUNT, DEFAULT_REASSEMBLY_LIMIT, FIELD_SEPARATOR, LINE_TERMINATOR,
};
use glovelink_core::{Error, Result};
use tracing::{debug, warn};

/// Framing policy inferred from the stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FramingMode {
    /// No newline and no unterminated packet seen yet.
    Detecting,

    /// Frames end at `\n` or `\r\n`.
    LineDelimited,

    /// Frames are bare five-field packets with no terminator.
    FieldCount,
}

/// Stateful buffer turning raw chunks into complete frame strings.
///
/// The buffer never holds more than the configured number of characters
/// after a call to [`push`](FrameReassembler::push) returns: any overflow
/// drops the buffered text and increments
/// [`overflow_count`](FrameReassembler::overflow_count).
#[derive(Debug)]
pub struct FrameReassembler {
    /// Text received but not yet confirmed to form a complete frame.
    buffer: String,

    /// Safety threshold in characters.
    limit: usize,

    mode: FramingMode,

    /// Number of safety-valve resets since construction.
    overflows: u64,
}

impl FrameReassembler {
    /// Create a reassembler with the default 50 character limit.
    pub fn new() -> Self {
        Self::with_limit(DEFAULT_REASSEMBLY_LIMIT)
    }

    /// Create a reassembler with a custom safety threshold.
    pub fn with_limit(limit: usize) -> Self {
        Self {
            buffer: String::with_capacity(limit + 1),
            limit,
            mode: FramingMode::Detecting,
            overflows: 0,
        }
    }

    /// Append a chunk and return every frame it completes, in order.
    ///
    /// Blank lines are skipped. Frames are returned without their
    /// terminator.
    pub fn push(&mut self, chunk: &str) -> Vec<String> {
        let mut frames = Vec::new();

        if chunk.contains(LINE_TERMINATOR) {
            self.latch(FramingMode::LineDelimited);
            self.buffer.push_str(chunk);
            self.split_lines(&mut frames);
        } else {
            // A held packet followed by the start of the next one
            if is_field_complete(&self.buffer) && chunk.contains(FIELD_SEPARATOR) {
                self.latch(FramingMode::FieldCount);
                self.take_buffer_into(&mut frames);
            }

            let whole_packet = self.buffer.is_empty();
            self.buffer.push_str(chunk);

            if is_field_complete(&self.buffer) && self.emits_at_field_count(whole_packet) {
                self.latch(FramingMode::FieldCount);
                self.take_buffer_into(&mut frames);
            }
        }

        self.enforce_limit();
        frames
    }

    /// Append raw bytes from the transport.
    ///
    /// The wire format is ASCII; invalid UTF-8 is replaced rather than
    /// rejected so the decoder can drop the affected frame on its own.
    pub fn push_bytes(&mut self, chunk: &[u8]) -> Vec<String> {
        self.push(&String::from_utf8_lossy(chunk))
    }

    /// Take a held five-token buffer at end of stream.
    ///
    /// Returns `None` and discards the buffer if it cannot be a frame.
    pub fn flush(&mut self) -> Option<String> {
        let held = std::mem::take(&mut self.buffer);
        let held = held.strip_suffix(CARRIAGE_RETURN).unwrap_or(held.as_str());
        is_field_complete(held).then(|| held.to_string())
    }

    /// Drop buffered text and forget the detected framing mode.
    ///
    /// The overflow counter is kept.
    pub fn clear(&mut self) {
        self.buffer.clear();
        self.mode = FramingMode::Detecting;
    }

    /// Text currently held.
    pub fn buffered(&self) -> &str {
        &self.buffer
    }

    /// Number of characters currently held.
    pub fn len(&self) -> usize {
        self.buffer.chars().count()
    }

    /// Returns `true` if no text is held.
    pub fn is_empty(&self) -> bool {
        self.buffer.is_empty()
    }

    /// Configured safety threshold in characters.
    pub fn limit(&self) -> usize {
        self.limit
    }

    /// Framing policy inferred so far.
    pub fn mode(&self) -> FramingMode {
        self.mode
    }

    /// Number of safety-valve resets.
    pub fn overflow_count(&self) -> u64 {
        self.overflows
    }

    fn latch(&mut self, mode: FramingMode) {
        if self.mode != mode {
            debug!(from = ?self.mode, to = ?mode, "framing mode detected");
            self.mode = mode;
        }
    }

    fn emits_at_field_count(&self, whole_packet: bool) -> bool {
        match self.mode {
            FramingMode::Detecting => whole_packet,
            FramingMode::LineDelimited => false,
            FramingMode::FieldCount => true,
        }
    }

    /// Move every newline-terminated line out of the buffer.
    fn split_lines(&mut self, frames: &mut Vec<String>) {
        let Some(last_newline) = self.buffer.rfind(LINE_TERMINATOR) else {
            return;
        };

        let remainder = self.buffer.split_off(last_newline + 1);
        let complete = std::mem::replace(&mut self.buffer, remainder);

        frames.extend(
            complete
                .split(LINE_TERMINATOR)
                .map(|line| line.strip_suffix(CARRIAGE_RETURN).unwrap_or(line))
                .filter(|line| !line.is_empty())
                .map(str::to_owned),
        );
    }

    fn take_buffer_into(&mut self, frames: &mut Vec<String>) {
        let mut frame = std::mem::take(&mut self.buffer);
        if frame.ends_with(CARRIAGE_RETURN) {
            frame.pop();
        }
        if !frame.is_empty() {
            frames.push(frame);
        }
    }

    fn check_limit(&self) -> Result<()> {
        let len = self.len();
        if len > self.limit {
            return Err(Error::BufferOverflow {
                len,
                limit: self.limit,
            });
        }
        Ok(())
    }

    fn enforce_limit(&mut self) {
        if let Err(error) = self.check_limit() {
            warn!(%error, "discarding unterminated data");
            self.overflows += 1;
            self.buffer.clear();
        }
    }
}

impl Default for FrameReassembler {
    fn default() -> Self {
        Self::new()
    }
}

/// Returns `true` if the text splits into at least five comma-separated tokens.
fn is_field_complete(text: &str) -> bool {
    text.split(FIELD_SEPARATOR).count() >= CHANNEL_COUNT
}
