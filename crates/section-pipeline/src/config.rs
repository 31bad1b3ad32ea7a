//! Sectioning configuration. Every field is clamped into its documented
//! range at construction time, silently — per the error-handling design,
//! clamping never surfaces as a caller-visible failure.

use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SectioningConfig {
    pub max_tokens_per_section: usize,
    pub lookahead_buffer_size: usize,
    pub std_dev_multiplier: f64,
    pub min_similarity_threshold: f64,
    pub token_strictness_threshold: f64,
    pub min_chunks_per_section: usize,
    pub min_tokens_per_section: usize,
    pub stop_signals: Vec<String>,
}

impl Default for SectioningConfig {
    fn default() -> Self {
        Self {
            max_tokens_per_section: 4000,
            lookahead_buffer_size: 100,
            std_dev_multiplier: 1.0,
            min_similarity_threshold: 0.65,
            token_strictness_threshold: 0.75,
            min_chunks_per_section: 2,
            min_tokens_per_section: 50,
            stop_signals: Vec::new(),
        }
    }
}

impl SectioningConfig {
    /// Apply the documented clamps. Called once by the factory; safe to call
    /// again on an already-clamped config (idempotent).
    pub fn clamped(mut self) -> Self {
        self.max_tokens_per_section = self.max_tokens_per_section.max(1);
        self.lookahead_buffer_size = self.lookahead_buffer_size.clamp(10, 500);
        self.std_dev_multiplier = self.std_dev_multiplier.clamp(0.5, 3.0);
        self.min_similarity_threshold = self.min_similarity_threshold.clamp(0.4, 0.9);
        self.token_strictness_threshold = self.token_strictness_threshold.clamp(0.5, 0.95);
        self.min_chunks_per_section = self.min_chunks_per_section.clamp(1, 10);
        self.min_tokens_per_section = self.min_tokens_per_section.clamp(10, 500);
        self
    }
}
