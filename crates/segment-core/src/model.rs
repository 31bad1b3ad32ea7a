/// One or more consecutive segments bundled together, bounded by
/// `max_tokens_per_chunk`. The atomic unit fed to embedding and sectioning.
#[derive(Debug, Clone, PartialEq)]
pub struct Chunk {
    pub content: String,
    pub tokens: usize,
}

impl Chunk {
    pub fn new(content: String, tokens: usize) -> Self {
        Self { content, tokens }
    }
}
