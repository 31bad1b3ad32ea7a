//! C1 reference implementation: a [`Tokenizer`] backed by `tiktoken-rs`'s
//! `cl100k_base` byte-pair encoding, the same encoding the teacher repo uses
//! for its own chunk-sizing (`count_tokens`/`tokenizer()` in
//! `indexing/chunking.rs`).

use std::sync::OnceLock;

use segment_core::{PipelineError, Tokenizer};
use tiktoken_rs::CoreBPE;
use tracing::warn;

pub struct Cl100kTokenizer {
    bpe: CoreBPE,
}

impl Cl100kTokenizer {
    pub fn new() -> Result<Self, PipelineError> {
        let bpe = tiktoken_rs::cl100k_base()
            .map_err(|e| PipelineError::InvalidConfig(format!("failed to load cl100k_base tokenizer: {e}")))?;
        Ok(Self { bpe })
    }

    /// A process-wide shared instance, since loading the BPE ranks is not
    /// free and the tokenizer holds no per-call state.
    pub fn shared() -> &'static Cl100kTokenizer {
        static INSTANCE: OnceLock<Cl100kTokenizer> = OnceLock::new();
        INSTANCE.get_or_init(|| Cl100kTokenizer::new().expect("cl100k_base tokenizer must load"))
    }
}

impl Tokenizer for Cl100kTokenizer {
    fn encode(&self, text: &str) -> Vec<u32> {
        self.bpe
            .encode_ordinary(text)
            .into_iter()
            .map(|t| t as u32)
            .collect()
    }

    fn decode(&self, token_ids: &[u32]) -> String {
        let ids: Vec<usize> = token_ids.iter().map(|&t| t as usize).collect();
        match self.bpe.decode(ids) {
            Ok(text) => text,
            Err(e) => {
                warn!(error = %e, "tiktoken decode failed for a token id sequence");
                String::new()
            }
        }
    }

    fn count_tokens(&self, text: &str) -> usize {
        self.bpe.encode_ordinary(text).len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trips_ascii_text() {
        let tokenizer = Cl100kTokenizer::new().unwrap();
        let text = "the quick brown fox jumps over the lazy dog";
        let ids = tokenizer.encode(text);
        assert_eq!(tokenizer.decode(&ids), text);
    }

    #[test]
    fn count_tokens_matches_encode_length() {
        let tokenizer = Cl100kTokenizer::new().unwrap();
        let text = "a somewhat longer sentence with punctuation, and more words.";
        assert_eq!(tokenizer.count_tokens(text), tokenizer.encode(text).len());
    }

    #[test]
    fn empty_text_has_zero_tokens() {
        let tokenizer = Cl100kTokenizer::new().unwrap();
        assert_eq!(tokenizer.count_tokens(""), 0);
    }

    #[test]
    fn shared_instance_is_reusable() {
        let a = Cl100kTokenizer::shared();
        let b = Cl100kTokenizer::shared();
        assert_eq!(a.count_tokens("hello"), b.count_tokens("hello"));
    }
}
