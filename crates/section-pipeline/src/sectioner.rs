//! C5 — the centerpiece: group embedded chunks into sections using a
//! look-ahead buffer, a running centroid, cosine similarity, and a
//! statistically derived split threshold.

use std::collections::VecDeque;
use std::sync::Arc;

use segment_core::{CancelToken, ChunkAssembler, PipelineError, Result};
use segment_core::vector;
use tokio::io::AsyncRead;
use tracing::debug;
use uuid::Uuid;

use crate::config::SectioningConfig;
use crate::embedding::EmbeddingService;
use crate::section_model::{PendingChunk, Section, SectionChunk};

struct OpenSection {
    chunks: Vec<PendingChunk>,
    centroid: Vec<f32>,
}

impl OpenSection {
    fn opened_with(chunk: PendingChunk) -> Self {
        Self {
            centroid: chunk.embedding.clone(),
            chunks: vec![chunk],
        }
    }

    fn token_sum(&self) -> usize {
        self.chunks.iter().map(|c| c.tokens).sum()
    }
}

/// Streams a chunk source and yields sections one at a time.
pub struct Sectioner<R> {
    assembler: ChunkAssembler<R>,
    embedder: Arc<dyn EmbeddingService>,
    config: SectioningConfig,
    file_id: Uuid,
    queue: VecDeque<PendingChunk>,
    open: Option<OpenSection>,
    primed: bool,
    chunker_exhausted: bool,
    finished: bool,
}

impl<R: AsyncRead + Unpin> Sectioner<R> {
    pub(crate) fn new(
        assembler: ChunkAssembler<R>,
        embedder: Arc<dyn EmbeddingService>,
        config: SectioningConfig,
        file_id: Uuid,
    ) -> Self {
        Self {
            assembler,
            embedder,
            config,
            file_id,
            queue: VecDeque::new(),
            open: None,
            primed: false,
            chunker_exhausted: false,
            finished: false,
        }
    }

    /// Read the next section, or `None` once the source is exhausted and any
    /// open section has already been flushed.
    pub async fn next_section(&mut self, cancel: &CancelToken) -> Result<Option<Section>> {
        cancel.check()?;

        if self.finished {
            return Ok(None);
        }

        if !self.primed {
            self.prime(cancel).await?;
            self.primed = true;
        }

        loop {
            cancel.check()?;

            if self.queue.is_empty() {
                self.finished = true;
                return Ok(self.take_open_section());
            }

            let candidate = self.queue.pop_front().expect("checked non-empty above");
            self.refill_one(cancel).await?;

            let Some(open) = self.open.take() else {
                self.open = Some(OpenSection::opened_with(candidate));
                continue;
            };

            let sim = vector::cosine(&candidate.embedding, &open.centroid)?;
            let threshold = self.split_threshold(&open)?;
            let similarity_driven =
                sim < threshold && self.similarity_split_allowed(&open, &candidate);
            let budget_driven =
                open.token_sum() + candidate.tokens > self.config.max_tokens_per_section;

            if similarity_driven || budget_driven {
                debug!(
                    similarity_driven,
                    budget_driven,
                    sim,
                    threshold,
                    "closing section"
                );
                let finished_section = self.finalize(open);
                self.open = Some(OpenSection::opened_with(candidate));
                return Ok(Some(finished_section));
            }

            let mut open = open;
            let n = open.chunks.len();
            vector::update_centroid_in_place(&mut open.centroid, &candidate.embedding, n)?;
            open.chunks.push(candidate);
            self.open = Some(open);
        }
    }

    async fn prime(&mut self, cancel: &CancelToken) -> Result<()> {
        for _ in 0..self.config.lookahead_buffer_size {
            cancel.check()?;
            match self.pull_and_embed(cancel).await? {
                Some(pending) => self.queue.push_back(pending),
                None => {
                    self.chunker_exhausted = true;
                    break;
                }
            }
        }
        Ok(())
    }

    async fn refill_one(&mut self, cancel: &CancelToken) -> Result<()> {
        if self.chunker_exhausted {
            return Ok(());
        }
        match self.pull_and_embed(cancel).await? {
            Some(pending) => self.queue.push_back(pending),
            None => self.chunker_exhausted = true,
        }
        Ok(())
    }

    async fn pull_and_embed(&mut self, cancel: &CancelToken) -> Result<Option<PendingChunk>> {
        cancel.check()?;
        let Some(chunk) = self.assembler.read_next_chunk(cancel).await? else {
            return Ok(None);
        };
        cancel.check()?;
        let embedding = self.embedder.embed(&chunk.content, cancel).await?;
        if embedding.len() != self.embedder.dimensions() {
            return Err(PipelineError::DimensionMismatch {
                expected: self.embedder.dimensions(),
                actual: embedding.len(),
            });
        }
        Ok(Some(PendingChunk {
            content: chunk.content,
            tokens: chunk.tokens,
            embedding,
        }))
    }

    /// Split-threshold calculation (§4.3): a statistical cut over recent
    /// similarities, tightened as the open section's token usage approaches
    /// the budget, clamped to `[min_similarity_threshold, 0.95]`.
    fn split_threshold(&self, open: &OpenSection) -> Result<f64> {
        let mut samples: Vec<f64> = self
            .queue
            .iter()
            .map(|c| vector::cosine(&c.embedding, &open.centroid))
            .collect::<Result<Vec<_>>>()?;

        if samples.len() < 5 {
            let extra: Vec<f64> = open
                .chunks
                .iter()
                .map(|c| vector::cosine(&c.embedding, &open.centroid))
                .collect::<Result<Vec<_>>>()?;
            samples.extend(extra);
        }

        let base = if samples.len() < 3 {
            self.config.min_similarity_threshold
        } else {
            let m = vector::mean(&samples);
            let sd = vector::std_dev(&samples, false);
            let statistical = m - self.config.std_dev_multiplier * sd;
            statistical.max(self.config.min_similarity_threshold)
        };

        let ratio = open.token_sum() as f64 / self.config.max_tokens_per_section as f64;
        let threshold = if ratio < self.config.token_strictness_threshold {
            base
        } else {
            let excess = (ratio - self.config.token_strictness_threshold)
                / (1.0 - self.config.token_strictness_threshold);
            let multiplier = 1.0 + 0.5 * excess * excess;
            base * multiplier
        };

        Ok(threshold.clamp(self.config.min_similarity_threshold, 0.95))
    }

    /// Minimum-requirements policy, including stop-signal softening.
    fn similarity_split_allowed(&self, open: &OpenSection, candidate: &PendingChunk) -> bool {
        if open.chunks.len() < self.config.min_chunks_per_section {
            return false;
        }
        if open.token_sum() < self.config.min_tokens_per_section {
            return false;
        }

        if !self.config.stop_signals.is_empty() && open.chunks.len() <= 2 {
            let candidate_is_stop = self.starts_with_stop_signal(&candidate.content);
            let last_is_stop = open
                .chunks
                .last()
                .map(|c| self.starts_with_stop_signal(&c.content))
                .unwrap_or(false);

            if candidate_is_stop && !last_is_stop {
                let softened_min = (1.5 * self.config.min_tokens_per_section as f64).ceil() as usize;
                if open.token_sum() < softened_min {
                    return false;
                }
            }
        }

        true
    }

    fn starts_with_stop_signal(&self, content: &str) -> bool {
        self.config
            .stop_signals
            .iter()
            .any(|s| content.starts_with(s.as_str()))
    }

    fn take_open_section(&mut self) -> Option<Section> {
        let file_id = self.file_id;
        self.open.take().map(|open| Self::finalize_with(open, file_id))
    }

    fn finalize(&self, open: OpenSection) -> Section {
        Self::finalize_with(open, self.file_id)
    }

    fn finalize_with(open: OpenSection, file_id: Uuid) -> Section {
        let chunks = open
            .chunks
            .into_iter()
            .enumerate()
            .map(|(chunk_index, c)| SectionChunk {
                content: c.content,
                tokens: c.tokens,
                embedding: c.embedding,
                chunk_index,
            })
            .collect();
        Section {
            id: Uuid::new_v4(),
            file_id,
            chunks,
        }
    }
}
