//! C3 — stream a reader and emit text segments delimited by a
//! preference-ordered set of separator strings, longest match wins.

use std::collections::VecDeque;

use tokio::io::{AsyncRead, AsyncReadExt};
use tracing::trace;

use crate::cancel::CancelToken;
use crate::error::{PipelineError, Result};

const READ_CHUNK_BYTES: usize = 8 * 1024;

/// Ordered set of break strings. Separators may share prefixes (`"\n\n"` vs
/// `"\n\n# "`); matching always prefers the longest separator that the
/// accumulating buffer can complete.
#[derive(Debug, Clone)]
pub struct BreakSet {
    breaks: Vec<Vec<char>>,
}

impl BreakSet {
    /// Break strings are kept sorted by descending length — not required
    /// for correctness (every break is checked every character), but it
    /// documents the "longest wins" intent and keeps the common case (a
    /// long, specific break shadowing a short generic one) first.
    pub fn new(mut breaks: Vec<String>) -> Self {
        breaks.retain(|b| !b.is_empty());
        breaks.sort_by_key(|b| std::cmp::Reverse(b.chars().count()));
        Self {
            breaks: breaks.into_iter().map(|b| b.chars().collect()).collect(),
        }
    }

    /// `(buffer currently ends with some break string, buffer's tail could
    /// still grow into a longer break string with more characters)`.
    ///
    /// The second element is the reason "longest match wins" needs a
    /// lookahead: after matching the short break `"\n\n"`, the buffer's
    /// tail (`"\n\n"`) is also a strict prefix of the longer break
    /// `"\n\n# "`, so the splitter must keep reading instead of committing
    /// immediately.
    fn match_state(&self, buffer: &[char]) -> (bool, bool) {
        let mut complete = false;
        let mut extensible = false;

        for b in &self.breaks {
            let lb = b.len();
            if lb == 0 {
                continue;
            }

            if buffer.len() >= lb && buffer[buffer.len() - lb..] == b[..] {
                complete = true;
            }

            if !extensible {
                let max_j = (lb.saturating_sub(1)).min(buffer.len());
                for j in (1..=max_j).rev() {
                    if buffer[buffer.len() - j..] == b[..j] {
                        extensible = true;
                        break;
                    }
                }
            }
        }

        (complete, extensible)
    }
}

/// Streams a byte source and emits text segments one at a time.
///
/// Owns a small internal pushback buffer so "longest match wins" lookahead
/// never discards characters: once more chars are read than belong to the
/// emitted segment, the excess is queued for the next call.
pub struct SegmentSplitter<R> {
    source: R,
    breaks: BreakSet,
    pending: VecDeque<char>,
    byte_buf: Vec<u8>,
    byte_pos: usize,
    partial_utf8: Vec<u8>,
    exhausted: bool,
}

impl<R: AsyncRead + Unpin> SegmentSplitter<R> {
    pub fn new(source: R, breaks: BreakSet) -> Self {
        Self {
            source,
            breaks,
            pending: VecDeque::new(),
            byte_buf: Vec::new(),
            byte_pos: 0,
            partial_utf8: Vec::new(),
            exhausted: false,
        }
    }

    /// Read the next segment, or `None` at end of input.
    pub async fn read_next_segment(&mut self, cancel: &CancelToken) -> Result<Option<String>> {
        cancel.check()?;

        if self.exhausted && self.pending.is_empty() {
            return Ok(None);
        }

        let mut buffer: Vec<char> = Vec::new();
        let mut committed_len: Option<usize> = None;

        loop {
            cancel.check()?;

            let Some(ch) = self.next_char().await? else {
                if buffer.is_empty() {
                    return Ok(None);
                }
                return Ok(Some(self.finish_segment(buffer, committed_len)));
            };
            buffer.push(ch);

            let (complete, extensible) = self.breaks.match_state(&buffer);
            if complete {
                committed_len = Some(buffer.len());
            }

            if !extensible {
                if committed_len.is_some() {
                    trace!(buffer_len = buffer.len(), committed_len, "segment boundary found");
                    return Ok(Some(self.finish_segment(buffer, committed_len)));
                }
                // No break matched yet at all; keep accumulating.
            }
        }
    }

    fn finish_segment(&mut self, mut buffer: Vec<char>, committed_len: Option<usize>) -> String {
        if let Some(len) = committed_len {
            if len < buffer.len() {
                let remainder = buffer.split_off(len);
                for c in remainder.into_iter().rev() {
                    self.pending.push_front(c);
                }
            }
        }
        buffer.into_iter().collect()
    }

    async fn next_char(&mut self) -> Result<Option<char>> {
        if let Some(c) = self.pending.pop_front() {
            return Ok(Some(c));
        }

        loop {
            if self.byte_pos < self.byte_buf.len() {
                let remaining_len = self.byte_buf.len() - self.byte_pos;
                let mut probe = self.partial_utf8.clone();
                for take in 1..=4.min(remaining_len) {
                    probe.truncate(self.partial_utf8.len());
                    probe.extend_from_slice(
                        &self.byte_buf[self.byte_pos..self.byte_pos + take],
                    );
                    match std::str::from_utf8(&probe) {
                        Ok(s) => {
                            let c = s.chars().next().expect("non-empty utf8 probe");
                            self.byte_pos += take;
                            self.partial_utf8.clear();
                            return Ok(Some(c));
                        }
                        Err(e) if e.error_len().is_some() => {
                            return Err(PipelineError::SourceIo(std::io::Error::new(
                                std::io::ErrorKind::InvalidData,
                                "invalid UTF-8 in source stream",
                            )));
                        }
                        Err(_) => continue, // incomplete sequence, try a longer window
                    }
                }
                // Exhausted the 4-byte max without a complete char: carry the
                // whole remaining window forward and refill.
                self.partial_utf8 = probe;
                self.byte_pos = self.byte_buf.len();
            }

            if self.exhausted {
                if self.partial_utf8.is_empty() {
                    return Ok(None);
                }
                return Err(PipelineError::SourceIo(std::io::Error::new(
                    std::io::ErrorKind::UnexpectedEof,
                    "truncated UTF-8 sequence at end of source stream",
                )));
            }

            let mut chunk = vec![0u8; READ_CHUNK_BYTES];
            let n = self
                .source
                .read(&mut chunk)
                .await
                .map_err(PipelineError::SourceIo)?;
            if n == 0 {
                self.exhausted = true;
                self.byte_buf.clear();
                self.byte_pos = 0;
                continue;
            }
            chunk.truncate(n);
            self.byte_buf = chunk;
            self.byte_pos = 0;
        }
    }
}
