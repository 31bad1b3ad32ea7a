//! Integration tests for the literal boundary scenarios a complete pipeline
//! run (splitter → chunker → sectioner) must handle correctly.

use std::sync::Arc;
use std::time::{Duration, Instant};

use section_pipeline::testkit::{FakeEmbeddingService, WordCountTokenizer};
use section_pipeline::{build_sectioner, SectioningConfig, SplitterPreset};
use segment_core::{CancelToken, PipelineError};
use uuid::Uuid;
use tokio::io::AsyncRead;

async fn drain<R: AsyncRead + Unpin>(
    mut sectioner: section_pipeline::Sectioner<R>,
    cancel: &CancelToken,
) -> Result<Vec<section_pipeline::Section>, PipelineError> {
    let mut out = Vec::new();
    while let Some(section) = sectioner.next_section(cancel).await? {
        out.push(section);
    }
    Ok(out)
}

fn loose_config() -> SectioningConfig {
    SectioningConfig {
        min_chunks_per_section: 1,
        min_tokens_per_section: 1,
        ..SectioningConfig::default()
    }
}

#[tokio::test]
async fn empty_input_yields_zero_sections() {
    let sectioner = build_sectioner(
        std::io::Cursor::new(Vec::<u8>::new()),
        Uuid::new_v4(),
        Arc::new(WordCountTokenizer),
        Arc::new(FakeEmbeddingService::constant(4)),
        100,
        loose_config(),
        SplitterPreset::markdown(),
    );
    let (token, _handle) = CancelToken::new();
    let sections = drain(sectioner, &token).await.unwrap();
    assert!(sections.is_empty());
}

#[tokio::test]
async fn small_whole_document_forms_one_section() {
    let text = "# Test Heading\n\nThis is a simple paragraph.";
    let sectioner = build_sectioner(
        std::io::Cursor::new(text.as_bytes().to_vec()),
        Uuid::new_v4(),
        Arc::new(WordCountTokenizer),
        Arc::new(FakeEmbeddingService::constant(4)),
        100,
        SectioningConfig {
            max_tokens_per_section: 200,
            ..loose_config()
        },
        SplitterPreset::markdown(),
    );
    let (token, _handle) = CancelToken::new();
    let sections = drain(sectioner, &token).await.unwrap();

    assert_eq!(sections.len(), 1);
    assert!(!sections[0].chunks.is_empty());
    let joined: String = sections[0].chunks.iter().map(|c| c.content.clone()).collect();
    assert_eq!(joined, text);
}

#[tokio::test]
async fn token_bounded_chunking_splits_paragraphs() {
    let text = "# Test Heading\n\nThis is paragraph one.\n\nThis two.\n\nThis three.";
    let sectioner = build_sectioner(
        std::io::Cursor::new(text.as_bytes().to_vec()),
        Uuid::new_v4(),
        Arc::new(WordCountTokenizer),
        Arc::new(FakeEmbeddingService::constant(4)),
        10,
        SectioningConfig {
            max_tokens_per_section: 1000,
            ..loose_config()
        },
        SplitterPreset::markdown(),
    );
    let (token, _handle) = CancelToken::new();
    let sections = drain(sectioner, &token).await.unwrap();

    let all_chunks: Vec<_> = sections.iter().flat_map(|s| s.chunks.iter()).collect();
    assert!(all_chunks.len() > 1);
    for chunk in &all_chunks {
        assert!(chunk.tokens <= 10, "chunk exceeded budget: {} tokens", chunk.tokens);
    }
    assert!(all_chunks[0].content.contains("Heading"));
    assert!(all_chunks[0].content.contains("paragraph one"));

    let joined: String = all_chunks.iter().map(|c| c.content.clone()).collect();
    assert_eq!(joined, text);
}

#[tokio::test]
async fn section_budget_produces_three_sections() {
    let paragraph = |word: &str| word.repeat(20);
    let text = format!(
        "{}\n\n{}\n\n{}",
        paragraph("alpha "),
        paragraph("alpha "),
        paragraph("alpha ")
    );
    let sectioner = build_sectioner(
        std::io::Cursor::new(text.into_bytes()),
        Uuid::new_v4(),
        Arc::new(WordCountTokenizer),
        Arc::new(FakeEmbeddingService::constant(4)),
        100,
        SectioningConfig {
            max_tokens_per_section: 25,
            ..loose_config()
        },
        SplitterPreset::markdown(),
    );
    let (token, _handle) = CancelToken::new();
    let sections = drain(sectioner, &token).await.unwrap();
    assert_eq!(sections.len(), 3);
}

#[tokio::test]
async fn list_items_each_force_their_own_chunk() {
    let text = "# Test List\n\n- First item\n- Second item\n- Third item";
    let sectioner = build_sectioner(
        std::io::Cursor::new(text.as_bytes().to_vec()),
        Uuid::new_v4(),
        Arc::new(WordCountTokenizer),
        Arc::new(FakeEmbeddingService::constant(4)),
        6,
        SectioningConfig {
            max_tokens_per_section: 1000,
            ..loose_config()
        },
        SplitterPreset::markdown(),
    );
    let (token, _handle) = CancelToken::new();
    let sections = drain(sectioner, &token).await.unwrap();

    let all_chunks: Vec<_> = sections.iter().flat_map(|s| s.chunks.iter()).collect();
    assert!(all_chunks[0].content.contains("Heading") || all_chunks[0].content.contains("Test List"));
    assert!(all_chunks[0].content.contains("First item"));
    assert!(!all_chunks[0].content.contains("Second item"));

    let joined: String = all_chunks.iter().map(|c| c.content.clone()).collect();
    assert_eq!(joined, text);
}

/// Round-trip equality is defined up to a trailing CR/LF normalization
/// (spec.md §9's open question): emitted content is never altered, but the
/// comparison trims trailing `\r`/`\n` from both sides before asserting
/// equality.
#[tokio::test]
async fn round_trip_holds_up_to_trailing_newline_normalization() {
    let text = "# Heading\n\nA paragraph of body text.\n";
    let sectioner = build_sectioner(
        std::io::Cursor::new(text.as_bytes().to_vec()),
        Uuid::new_v4(),
        Arc::new(WordCountTokenizer),
        Arc::new(FakeEmbeddingService::constant(4)),
        100,
        SectioningConfig {
            max_tokens_per_section: 200,
            ..loose_config()
        },
        SplitterPreset::markdown(),
    );
    let (token, _handle) = CancelToken::new();
    let sections = drain(sectioner, &token).await.unwrap();

    let joined: String = sections
        .iter()
        .flat_map(|s| s.chunks.iter())
        .map(|c| c.content.clone())
        .collect();

    assert_eq!(joined, text, "emitted content must not itself be altered");
    assert_eq!(
        joined.trim_end_matches(['\r', '\n']),
        text.trim_end_matches(['\r', '\n'])
    );
}

/// A slow source that yields a handful of bytes at a time with a small
/// delay, so cancellation mid-stream is observable within a bounded time.
struct SlowReader {
    remaining: std::collections::VecDeque<u8>,
}

impl SlowReader {
    fn new(text: &str) -> Self {
        Self {
            remaining: text.bytes().collect(),
        }
    }
}

impl AsyncRead for SlowReader {
    fn poll_read(
        mut self: std::pin::Pin<&mut Self>,
        cx: &mut std::task::Context<'_>,
        buf: &mut tokio::io::ReadBuf<'_>,
    ) -> std::task::Poll<std::io::Result<()>> {
        // Yield a handful of bytes per call; this gives the executor
        // opportunities to interleave the cancellation-triggering task.
        for _ in 0..8 {
            match self.remaining.pop_front() {
                Some(b) => buf.put_slice(&[b]),
                None => break,
            }
        }
        cx.waker().wake_by_ref();
        std::task::Poll::Ready(Ok(()))
    }
}

#[tokio::test]
async fn cancellation_mid_stream_terminates_with_cancelled_and_keeps_partial_output() {
    let mut body = String::new();
    for i in 0..10_000 {
        body.push_str(&format!("paragraph number {i} with a little padding text\n\n"));
    }

    let mut sectioner = build_sectioner(
        SlowReader::new(&body),
        Uuid::new_v4(),
        Arc::new(WordCountTokenizer),
        Arc::new(FakeEmbeddingService::constant(4)),
        50,
        SectioningConfig {
            max_tokens_per_section: 80,
            lookahead_buffer_size: 10,
            ..loose_config()
        },
        SplitterPreset::markdown(),
    );

    let (token, handle) = CancelToken::new();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(200)).await;
        handle.cancel();
    });

    let start = Instant::now();
    let mut sections = Vec::new();
    let result = loop {
        match sectioner.next_section(&token).await {
            Ok(Some(section)) => sections.push(section),
            Ok(None) => break Ok(()),
            Err(e) => break Err(e),
        }
    };

    assert!(matches!(result, Err(PipelineError::Cancelled)));
    assert!(!sections.is_empty(), "some sections should already be yielded");
    assert!(
        start.elapsed() < Duration::from_secs(5),
        "cancellation should be observed promptly"
    );
}
