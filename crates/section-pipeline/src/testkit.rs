//! Test doubles shared by this crate's unit tests and its `tests/`
//! integration suite: a deterministic word-count tokenizer and a fake
//! embedding service whose output is either constant or keyword-sensitive.

use futures::future::BoxFuture;

use segment_core::{CancelToken, Result, Tokenizer};

use crate::embedding::EmbeddingService;

/// Counts tokens as whitespace-separated words. Deterministic and
/// dependency-free, useful anywhere a real BPE tokenizer would be overkill.
pub struct WordCountTokenizer;

impl Tokenizer for WordCountTokenizer {
    fn encode(&self, text: &str) -> Vec<u32> {
        text.split_whitespace().map(|_| 0u32).collect()
    }

    fn decode(&self, token_ids: &[u32]) -> String {
        vec!["word"; token_ids.len()].join(" ")
    }
}

/// An embedding service that never calls out to a real model. Returns a
/// constant unit-ish vector by default, or — when constructed with
/// [`FakeEmbeddingService::keyword_sensitive`] — an orthogonal vector for any
/// text containing the configured keyword, so tests can force a low-similarity
/// boundary without depending on a real embedding model's behavior.
pub struct FakeEmbeddingService {
    dimensions: usize,
    keyword: Option<String>,
}

impl FakeEmbeddingService {
    pub fn constant(dimensions: usize) -> Self {
        Self {
            dimensions,
            keyword: None,
        }
    }

    pub fn keyword_sensitive(dimensions: usize, keyword: &str) -> Self {
        Self {
            dimensions,
            keyword: Some(keyword.to_string()),
        }
    }

    fn vector_for(&self, text: &str) -> Vec<f32> {
        let base = vec![1.0f32; self.dimensions];
        match &self.keyword {
            Some(k) if text.contains(k.as_str()) => {
                let mut v = vec![0.0f32; self.dimensions];
                if let Some(first) = v.first_mut() {
                    *first = 1.0;
                }
                v
            }
            _ => base,
        }
    }
}

impl EmbeddingService for FakeEmbeddingService {
    fn embed<'a>(&'a self, text: &'a str, cancel: &'a CancelToken) -> BoxFuture<'a, Result<Vec<f32>>> {
        Box::pin(async move {
            cancel.check()?;
            Ok(self.vector_for(text))
        })
    }

    fn dimensions(&self) -> usize {
        self.dimensions
    }
}
