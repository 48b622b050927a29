// Text embedder trait — the swap-ready abstraction.
//
// The default implementation runs a local ONNX sentence transformer.
// Tests substitute a deterministic hash-based embedder so the pipeline
// can be exercised without model files.

use anyhow::Result;
use async_trait::async_trait;

/// Trait for turning report text into fixed-length vectors.
#[async_trait]
pub trait TextEmbedder: Send + Sync {
    /// Embed a batch of texts, returning one vector per text in order.
    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>>;
}
