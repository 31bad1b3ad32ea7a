//! Embeddings and similarity-driven sectioning: the semantic half of the
//! streaming pipeline (C2 embedding contract, C5 sectioner), built on top of
//! `segment-core`'s splitter and chunk assembler.

pub mod config;
pub mod embedding;
pub mod factory;
pub mod sectioner;
pub mod section_model;
pub mod testkit;

pub use config::SectioningConfig;
pub use embedding::EmbeddingService;
pub use factory::{build_sectioner, SplitterPreset};
pub use sectioner::Sectioner;
pub use section_model::{Section, SectionChunk};
