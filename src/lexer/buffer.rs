//! A bounded-lookahead character buffer over an input stream.
//!
//! This is the character-level collaborator every higher stage of the lexer
//! builds on: it turns an arbitrary `Iterator<Item = char>` into something
//! that supports `peek(k)`, `consume()`, and `putback()`, which is what lets
//! the lexer recognize multi-character operators (`<<=`, `->`, `...`) and
//! what lets the parser's declaration/expression disambiguation rewind a few
//! characters without the caller re-reading the underlying stream.

use std::collections::VecDeque;

/// The sentinel character returned once the underlying stream is exhausted.
/// Matches the original implementation's use of the NUL byte to signal EOF
/// without making every caller match on `Option<char>`.
pub const EOF: char = '\0';

/// The default circular-buffer capacity (§4.3: "Default capacity 8
/// characters").
pub const DEFAULT_CAPACITY: usize = 8;

/// Raised when the buffer is misused: a non-positive capacity at
/// construction, or a negative lookahead offset.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BufferError {
	InvalidCapacity(i64),
	NegativeOffset(i64),
}

/// A circular buffer providing bounded character lookahead over a source.
///
/// Internally this keeps a `VecDeque<char>` rather than hand-rolling a fixed
/// `Vec` with head/tail indices (the original C++ implementation's
/// approach) because Rust's `VecDeque` already *is* a growable ring buffer;
/// reimplementing the index arithmetic by hand would only reproduce bugs the
/// standard type has already ironed out. The refill/growth *policy* below —
/// refill once the fill ratio drops under 50%, double capacity on a
/// putback that overflows it — is carried over from the original design.
pub struct LookaheadBuffer<I: Iterator<Item = char>> {
	source: I,
	buffer: VecDeque<char>,
	capacity: usize,
	initial_capacity: usize,
	source_exhausted: bool,
}

impl<I: Iterator<Item = char>> LookaheadBuffer<I> {
	/// Creates a buffer with the default capacity (§4.3).
	pub fn new(source: I) -> Self {
		Self::with_capacity(source, DEFAULT_CAPACITY).unwrap_or_else(|_| unreachable!("DEFAULT_CAPACITY is always positive"))
	}

	/// Creates a buffer with an explicit capacity. Fails if `capacity` is
	/// not positive.
	pub fn with_capacity(source: I, capacity: usize) -> Result<Self, BufferError> {
		if capacity == 0 {
			return Err(BufferError::InvalidCapacity(0));
		}
		let mut buffer = Self { source, buffer: VecDeque::with_capacity(capacity), capacity, initial_capacity: capacity, source_exhausted: false };
		buffer.fill();
		Ok(buffer)
	}

	/// Tops the buffer up from the underlying source until it's full or the
	/// source is exhausted.
	fn fill(&mut self) {
		while self.buffer.len() < self.capacity && !self.source_exhausted {
			match self.source.next() {
				Some(ch) => self.buffer.push_back(ch),
				None => self.source_exhausted = true,
			}
		}
	}

	/// Whether the buffer has dropped below half capacity and should be
	/// topped up (§4.3: "refills from the stream when its fill ratio falls
	/// below 50%").
	fn needs_refill(&self) -> bool {
		!self.source_exhausted && self.buffer.len() * 2 < self.capacity
	}

	/// Returns the character `offset` positions ahead of the current read
	/// position without consuming it. Offset `0` is the next character that
	/// `consume()` would return. Returns [`EOF`] if the stream ends before
	/// reaching that offset.
	pub fn peek(&mut self, offset: i64) -> Result<char, BufferError> {
		if offset < 0 {
			return Err(BufferError::NegativeOffset(offset));
		}
		let offset = offset as usize;
		while self.buffer.len() <= offset && !self.source_exhausted {
			self.fill();
			if self.buffer.len() <= offset && !self.source_exhausted {
				// fill() only stops early once the source is exhausted, so
				// this branch exists purely to keep the loop terminating
				// under a pathological Iterator that yields an unbounded
				// number of `None`s before eventually exhausting.
				break;
			}
		}
		Ok(self.buffer.get(offset).copied().unwrap_or(EOF))
	}

	/// Consumes and returns the next character, or [`EOF`] if the stream has
	/// ended.
	pub fn consume(&mut self) -> char {
		if self.buffer.is_empty() {
			self.fill();
		}
		let Some(ch) = self.buffer.pop_front() else {
			return EOF;
		};
		if self.needs_refill() {
			self.fill();
		}
		ch
	}

	/// Pushes `ch` back onto the front of the buffer, logically rewinding
	/// the read position by one character. Growing the capacity here (§4.3:
	/// "triggers capacity growth if full") means a caller can put back more
	/// characters than the configured capacity without losing any — the
	/// capacity is a *performance* tuning knob, not a hard ceiling on
	/// correctness.
	pub fn putback(&mut self, ch: char) {
		if self.buffer.len() >= self.capacity {
			self.capacity *= 2;
		}
		self.buffer.push_front(ch);
	}

	/// True while there is at least one more character to read, whether
	/// already buffered or still pending in the source.
	#[must_use]
	pub fn has_more(&self) -> bool {
		!self.buffer.is_empty() || !self.source_exhausted
	}

	/// Resets the capacity back to what this buffer was constructed with,
	/// undoing any growth from `putback` overflow. The already-buffered
	/// characters are left in place: `source` is a one-way iterator, so a
	/// character pulled out of it ahead of the read cursor can never be
	/// recovered once dropped, and "the stream position is unaffected"
	/// (§4.3) means exactly that nothing gets lost here, not that the
	/// lookahead cache is discarded.
	pub fn clear(&mut self) {
		self.capacity = self.initial_capacity;
	}

	/// The buffer's current capacity (may have grown past its initial value
	/// due to `putback`).
	#[must_use]
	pub fn capacity(&self) -> usize {
		self.capacity
	}
}

impl std::fmt::Display for BufferError {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		match self {
			Self::InvalidCapacity(got) => write!(f, "lookahead buffer capacity must be positive, got {got}"),
			Self::NegativeOffset(got) => write!(f, "peek offset must be non-negative, got {got}"),
		}
	}
}

impl std::error::Error for BufferError {}

#[cfg(test)]
mod tests {
	use super::{BufferError, LookaheadBuffer, DEFAULT_CAPACITY, EOF};

	#[test]
	fn peek_does_not_consume() {
		let mut buffer = LookaheadBuffer::new("abc".chars());
		assert_eq!(buffer.peek(0).unwrap(), 'a');
		assert_eq!(buffer.peek(0).unwrap(), 'a');
		assert_eq!(buffer.consume(), 'a');
		assert_eq!(buffer.peek(0).unwrap(), 'b');
	}

	#[test]
	fn peek_beyond_input_returns_eof_sentinel() {
		let mut buffer = LookaheadBuffer::new("ab".chars());
		assert_eq!(buffer.peek(5).unwrap(), EOF);
	}

	#[test]
	fn negative_offset_is_rejected() {
		let mut buffer = LookaheadBuffer::new("ab".chars());
		assert_eq!(buffer.peek(-1), Err(BufferError::NegativeOffset(-1)));
	}

	#[test]
	fn non_positive_capacity_is_rejected() {
		let result = LookaheadBuffer::with_capacity("ab".chars(), 0);
		assert!(result.is_err());
	}

	#[test]
	fn consume_then_putback_round_trips_through_peek() {
		let mut buffer = LookaheadBuffer::new("xyz".chars());
		let consumed = buffer.consume();
		buffer.putback(consumed);
		assert_eq!(buffer.peek(0).unwrap(), consumed);
	}

	#[test]
	fn putback_beyond_capacity_grows_the_buffer() {
		let mut buffer = LookaheadBuffer::with_capacity("a".chars(), 1).unwrap();
		let initial_capacity = buffer.capacity();
		for ch in "zyxwvuts".chars() {
			buffer.putback(ch);
		}
		assert!(buffer.capacity() > initial_capacity);
		assert_eq!(buffer.peek(0).unwrap(), 's');
	}

	#[test]
	fn capacity_one_processes_arbitrarily_long_input() {
		let long_input = "x".repeat(10_000);
		let mut buffer = LookaheadBuffer::with_capacity(long_input.chars(), 1).unwrap();
		let mut count = 0;
		while buffer.has_more() {
			buffer.consume();
			count += 1;
		}
		assert_eq!(count, 10_000);
	}

	#[test]
	fn has_more_becomes_false_exactly_at_eof() {
		let mut buffer = LookaheadBuffer::new("ab".chars());
		assert!(buffer.has_more());
		buffer.consume();
		assert!(buffer.has_more());
		buffer.consume();
		assert!(!buffer.has_more());
		assert_eq!(buffer.consume(), EOF);
	}

	#[test]
	fn clear_resets_grown_capacity_without_losing_buffered_characters() {
		let mut buffer = LookaheadBuffer::with_capacity("abcdef".chars(), 2).unwrap();
		buffer.putback('z');
		assert!(buffer.capacity() > 2);
		let _ = buffer.peek(3);
		buffer.clear();
		assert_eq!(buffer.capacity(), 2);
		assert_eq!(buffer.consume(), 'z');
	}

	#[test]
	fn default_capacity_matches_spec() {
		let buffer = LookaheadBuffer::new("".chars());
		assert_eq!(buffer.capacity(), DEFAULT_CAPACITY);
	}
}
