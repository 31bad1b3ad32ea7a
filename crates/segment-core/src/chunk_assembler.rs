//! C4 — group segments into chunks bounded by a max-tokens budget, breaking
//! early on configured stop-signal segments.

use tokio::io::AsyncRead;
use tracing::debug;

use crate::cancel::CancelToken;
use crate::error::Result;
use crate::model::Chunk;
use crate::splitter::SegmentSplitter;
use crate::tokenizer::Tokenizer;

/// Configuration for [`ChunkAssembler`].
#[derive(Debug, Clone)]
pub struct ChunkingConfig {
    max_tokens_per_chunk: usize,
    stop_signals: Vec<String>,
}

impl ChunkingConfig {
    /// `max_tokens_per_chunk` is clamped to at least 1 (a chunk budget of
    /// zero cannot hold anything).
    pub fn new(max_tokens_per_chunk: usize, stop_signals: Vec<String>) -> Self {
        Self {
            max_tokens_per_chunk: max_tokens_per_chunk.max(1),
            stop_signals,
        }
    }

    pub fn max_tokens_per_chunk(&self) -> usize {
        self.max_tokens_per_chunk
    }

    pub fn stop_signals(&self) -> &[String] {
        &self.stop_signals
    }

    fn starts_with_stop_signal(&self, segment: &str) -> bool {
        self.stop_signals.iter().any(|s| segment.starts_with(s.as_str()))
    }
}

/// Groups segments from a [`SegmentSplitter`] into token-budgeted chunks.
pub struct ChunkAssembler<R> {
    splitter: SegmentSplitter<R>,
    tokenizer: std::sync::Arc<dyn Tokenizer>,
    config: ChunkingConfig,
    buffered_segment: Option<String>,
}

impl<R: AsyncRead + Unpin> ChunkAssembler<R> {
    pub fn new(
        splitter: SegmentSplitter<R>,
        tokenizer: std::sync::Arc<dyn Tokenizer>,
        config: ChunkingConfig,
    ) -> Self {
        Self {
            splitter,
            tokenizer,
            config,
            buffered_segment: None,
        }
    }

    /// Read the next chunk, or `None` at end of input.
    pub async fn read_next_chunk(&mut self, cancel: &CancelToken) -> Result<Option<Chunk>> {
        cancel.check()?;

        let mut content = match self.buffered_segment.take() {
            Some(segment) => segment,
            None => match self.splitter.read_next_segment(cancel).await? {
                Some(segment) => segment,
                None => return Ok(None),
            },
        };

        let mut tokens = self.tokenizer.count_tokens(&content);

        if tokens >= self.config.max_tokens_per_chunk {
            debug!(
                tokens,
                max = self.config.max_tokens_per_chunk,
                "single segment already meets or exceeds the chunk budget"
            );
            return Ok(Some(Chunk::new(content, tokens)));
        }

        // A chunk whose seed segment is not itself stop-signal-led (e.g. a
        // lone heading) may still absorb one stop-signal-led segment that
        // follows it, so a heading never ends up alone in its own chunk.
        // The exemption is spent the moment any segment is appended.
        let mut may_absorb_one_stop_signal = !self.config.starts_with_stop_signal(&content);

        loop {
            cancel.check()?;
            let Some(next_segment) = self.splitter.read_next_segment(cancel).await? else {
                break;
            };

            let next_is_stop_signal = self.config.starts_with_stop_signal(&next_segment);
            if next_is_stop_signal && !may_absorb_one_stop_signal {
                self.buffered_segment = Some(next_segment);
                break;
            }

            let candidate = format!("{content}{next_segment}");
            let candidate_tokens = self.tokenizer.count_tokens(&candidate);

            if candidate_tokens <= self.config.max_tokens_per_chunk {
                content = candidate;
                tokens = candidate_tokens;
                may_absorb_one_stop_signal = false;
            } else {
                self.buffered_segment = Some(next_segment);
                break;
            }
        }

        Ok(Some(Chunk::new(content, tokens)))
    }
}
