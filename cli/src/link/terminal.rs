//! Terminal text buffer.
//!
//! Device log text is queued here as it arrives and drained into the UI on
//! the flush cadence. The cumulative queued length is tracked; once it
//! reaches the threshold the displayed terminal is cleared and the count
//! starts over, which keeps the display bounded.

use crate::constants::TERMINAL_CLEAR_THRESHOLD;

/// Queued terminal text.
#[derive(Debug, Clone)]
pub struct TerminalBuffer {
    queued: String,
    queued_total: usize,
    threshold: usize,
}

impl Default for TerminalBuffer {
    fn default() -> Self {
        Self::new(TERMINAL_CLEAR_THRESHOLD)
    }
}

impl TerminalBuffer {
    /// Buffer that clears the display every `threshold` queued bytes.
    #[must_use]
    pub fn new(threshold: usize) -> Self {
        Self {
            queued: String::new(),
            queued_total: 0,
            threshold,
        }
    }

    /// Queue a chunk. Returns `true` when the display must be cleared.
    pub fn push(&mut self, chunk: &[u8]) -> bool {
        if chunk.is_empty() {
            return false;
        }
        self.queued.push_str(&String::from_utf8_lossy(chunk));
        self.queued_total += chunk.len();

        if self.queued_total >= self.threshold {
            self.queued_total = 0;
            return true;
        }
        false
    }

    /// Take everything queued since the last drain.
    pub fn drain(&mut self) -> Option<String> {
        if self.queued.is_empty() {
            None
        } else {
            Some(std::mem::take(&mut self.queued))
        }
    }

    /// Bytes counted toward the clear threshold.
    #[must_use]
    pub fn queued_total(&self) -> usize {
        self.queued_total
    }

    /// Whether text is waiting to be drained.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.queued.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_push_and_drain() {
        let mut buffer = TerminalBuffer::default();
        assert!(!buffer.push(b"hello "));
        assert!(!buffer.push(b"world"));

        assert_eq!(buffer.drain().as_deref(), Some("hello world"));
        assert_eq!(buffer.drain(), None);
        assert_eq!(buffer.queued_total(), 11);
    }

    #[test]
    fn test_clear_on_crossing_chunk_only() {
        let mut buffer = TerminalBuffer::new(10);
        assert!(!buffer.push(b"12345"));
        assert!(!buffer.push(b"1234"));
        assert_eq!(buffer.queued_total(), 9);

        assert!(buffer.push(b"12"));
        assert_eq!(buffer.queued_total(), 0);

        assert!(!buffer.push(b"1"));
        assert_eq!(buffer.queued_total(), 1);
    }

    #[test]
    fn test_exact_threshold_clears() {
        let mut buffer = TerminalBuffer::new(4);
        assert!(buffer.push(b"abcd"));
        assert_eq!(buffer.queued_total(), 0);
    }

    #[test]
    fn test_empty_chunk_is_noop() {
        let mut buffer = TerminalBuffer::new(1);
        assert!(!buffer.push(b""));
        assert!(buffer.is_empty());
    }

    #[test]
    fn test_invalid_utf8_is_replaced() {
        let mut buffer = TerminalBuffer::default();
        buffer.push(&[b'o', b'k', 0xFF]);
        assert_eq!(buffer.drain().as_deref(), Some("ok\u{FFFD}"));
    }
}
