use uuid::Uuid;

/// A chunk as it appears inside a yielded [`Section`]: its embedding plus the
/// zero-based position it occupies within that section. The position is
/// assigned at section-yield time — chunks never hold a back-reference to
/// a section while they're still part of the open, in-progress one.
#[derive(Debug, Clone)]
pub struct SectionChunk {
    pub content: String,
    pub tokens: usize,
    pub embedding: Vec<f32>,
    pub chunk_index: usize,
}

/// An ordered, non-empty sequence of chunks plus a freshly generated id.
#[derive(Debug, Clone)]
pub struct Section {
    pub id: Uuid,
    /// Identifier of the source document this section was produced from,
    /// threaded through from the factory call so a downstream store can
    /// correlate sections back to their file without the core knowing
    /// anything about persistence.
    pub file_id: Uuid,
    pub chunks: Vec<SectionChunk>,
}

impl Section {
    pub fn token_count(&self) -> usize {
        self.chunks.iter().map(|c| c.tokens).sum()
    }

    pub fn chunk_count(&self) -> usize {
        self.chunks.len()
    }
}

/// A chunk that has been embedded but not yet assigned to a yielded section:
/// either sitting in the look-ahead queue or already a member of the
/// currently open section.
#[derive(Debug, Clone)]
pub(crate) struct PendingChunk {
    pub content: String,
    pub tokens: usize,
    pub embedding: Vec<f32>,
}
