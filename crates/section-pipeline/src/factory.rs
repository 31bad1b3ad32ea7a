//! Public construction surface: wires a byte source, a tokenizer and an
//! embedding service into a fully configured [`Sectioner`].

use std::sync::Arc;

use segment_core::{BreakSet, ChunkAssembler, ChunkingConfig, SegmentSplitter, Tokenizer};
use tokio::io::AsyncRead;
use uuid::Uuid;

use crate::config::SectioningConfig;
use crate::embedding::EmbeddingService;
use crate::sectioner::Sectioner;

/// Break-string list for [`SegmentSplitter`] plus, where applicable, the
/// stop-signal list fed to [`ChunkingConfig`].
pub struct SplitterPreset {
    breaks: Vec<String>,
    stop_signals: Vec<String>,
}

impl SplitterPreset {
    /// Heading, paragraph and sentence boundaries for Markdown documents.
    ///
    /// Heading markers are folded into the end of the preceding segment
    /// (`"\n\n# "` is itself a break string, matching §4.1's examples), but
    /// list-item markers are deliberately left at the *start* of their own
    /// segment — the break between list items is plain `"\n"` — so the
    /// accompanying stop-signal list can force a chunk boundary before each
    /// item instead.
    pub fn markdown() -> Self {
        Self {
            breaks: vec![
                "\n\n# ".into(),
                "\n\n## ".into(),
                "\n\n### ".into(),
                "\n\n#### ".into(),
                "\n\n##### ".into(),
                "\n\n###### ".into(),
                "\n# ".into(),
                "\n## ".into(),
                "\n### ".into(),
                "\n#### ".into(),
                "\n##### ".into(),
                "\n###### ".into(),
                "\n\n".into(),
                "\n".into(),
                ". ".into(),
                "! ".into(),
                "? ".into(),
            ],
            // Heading markers are not listed here: they already get their own
            // dedicated break strings above, so a heading never shares a
            // chunk-opening segment with ordinary stop-signal handling.
            stop_signals: vec![
                "- ".into(),
                "* ".into(),
                "+ ".into(),
                "> ".into(),
                "```".into(),
            ],
        }
    }

    /// An arbitrary ordered break-string list with no stop signals. Chain
    /// [`SplitterPreset::with_stop_signals`] to add them.
    pub fn custom(breaks: Vec<String>) -> Self {
        Self {
            breaks,
            stop_signals: Vec::new(),
        }
    }

    pub fn with_stop_signals(mut self, stop_signals: Vec<String>) -> Self {
        self.stop_signals = stop_signals;
        self
    }
}

/// Construct a [`Sectioner`] over `source_reader`, tagging every yielded
/// section with `file_id`.
pub fn build_sectioner<R>(
    source_reader: R,
    file_id: Uuid,
    tokenizer: Arc<dyn Tokenizer>,
    embedding_service: Arc<dyn EmbeddingService>,
    max_tokens_per_chunk: usize,
    sectioning_config: SectioningConfig,
    preset: SplitterPreset,
) -> Sectioner<R>
where
    R: AsyncRead + Unpin,
{
    let break_set = BreakSet::new(preset.breaks);
    let splitter = SegmentSplitter::new(source_reader, break_set);
    let chunking_config = ChunkingConfig::new(max_tokens_per_chunk, preset.stop_signals);
    let assembler = ChunkAssembler::new(splitter, tokenizer, chunking_config);
    Sectioner::new(assembler, embedding_service, sectioning_config.clamped(), file_id)
}
