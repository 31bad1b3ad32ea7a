//! C2 reference implementation: an [`EmbeddingService`] backed by
//! `ollama-rs`, grounded on the teacher's
//! `EmbeddingClient::generate_with_ollama` (`indexing-core/src/indexing/embedding.rs`).
//!
//! Unlike the teacher's blocking-runtime shim (which spins up a fresh
//! current-thread runtime per call and blocks on it), this is a genuine
//! `async fn` returning a boxed future — the embedding call is a suspension
//! point the caller's cancellation signal must be able to reach while it is
//! in flight, and a nested runtime can't observe an outer `CancelToken`.

use futures::future::BoxFuture;
use ollama_rs::generation::embeddings::request::GenerateEmbeddingsRequest;
use ollama_rs::Ollama;
use section_pipeline::EmbeddingService;
use segment_core::{CancelToken, PipelineError, Result};
use tracing::instrument;

/// Embeds text via a locally or remotely running Ollama server.
///
/// A single instance reports one fixed `dimensions()` for its lifetime
/// (resolved on construction, per the embedding service contract in
/// spec.md §6) and is safe to share across independent pipeline runs —
/// `ollama_rs::Ollama` clones cheaply and carries no per-call state.
pub struct OllamaEmbeddingService {
    client: Ollama,
    model: String,
    dimensions: usize,
}

impl OllamaEmbeddingService {
    /// Connect to an Ollama server at `host:port` and resolve `model`'s
    /// embedding dimension by issuing one probe embedding. Fails with
    /// [`PipelineError::EmbeddingFailed`] (non-retryable) if the probe fails
    /// or returns a degenerate vector.
    pub async fn connect(host: impl Into<String>, port: u16, model: impl Into<String>) -> Result<Self> {
        let client = Ollama::new(host.into(), port);
        let model = model.into();

        let probe = generate_and_normalize(&client, &model, "dimension probe").await?;
        let dimensions = probe.len();
        if dimensions == 0 {
            return Err(PipelineError::embedding_failed(
                format!("Ollama model '{model}' returned a zero-dimension embedding"),
                false,
            ));
        }

        Ok(Self {
            client,
            model,
            dimensions,
        })
    }

    /// Connect to a locally running Ollama server on its default port,
    /// mirroring the teacher's `Ollama::default()` usage.
    pub async fn connect_local(model: impl Into<String>) -> Result<Self> {
        Self::connect("http://localhost", 11434, model).await
    }

    pub fn model_name(&self) -> &str {
        &self.model
    }
}

impl EmbeddingService for OllamaEmbeddingService {
    #[instrument(skip(self, text, cancel), fields(model = %self.model, chars = text.len()))]
    fn embed<'a>(&'a self, text: &'a str, cancel: &'a CancelToken) -> BoxFuture<'a, Result<Vec<f32>>> {
        Box::pin(async move {
            cancel.check()?;

            let embed_call = generate_and_normalize(&self.client, &self.model, text);
            let vector = tokio::select! {
                biased;
                _ = cancel.cancelled() => return Err(PipelineError::Cancelled),
                result = embed_call => result?,
            };

            if vector.len() != self.dimensions {
                return Err(PipelineError::DimensionMismatch {
                    expected: self.dimensions,
                    actual: vector.len(),
                });
            }

            cancel.check()?;
            Ok(vector)
        })
    }

    fn dimensions(&self) -> usize {
        self.dimensions
    }
}

/// Issue one embedding request and L2-normalize the result, matching the
/// teacher's `generate_with_ollama` + `l2_normalize` pair.
async fn generate_and_normalize(client: &Ollama, model: &str, text: &str) -> Result<Vec<f32>> {
    let request = GenerateEmbeddingsRequest::new(model.to_string(), text.into());
    let response = client.generate_embeddings(request).await.map_err(|e| {
        PipelineError::embedding_failed(format!("Ollama embedding request failed: {e}"), true)
    })?;

    let mut vector = response.embeddings.into_iter().next().ok_or_else(|| {
        PipelineError::embedding_failed(
            format!("Ollama returned no embeddings for model '{model}'"),
            true,
        )
    })?;

    l2_normalize(&mut vector).map_err(|e| PipelineError::embedding_failed(e, false))?;
    Ok(vector)
}

fn l2_normalize(values: &mut [f32]) -> std::result::Result<(), String> {
    let norm = values.iter().map(|v| v * v).sum::<f32>().sqrt();
    if norm == 0.0 || !norm.is_finite() {
        return Err("embedding vector norm must be finite and non-zero to normalize".to_string());
    }
    for v in values.iter_mut() {
        *v /= norm;
    }
    Ok(())
}
