//! The `Embedder` capability: turns symbol/document text into vectors
//! for `codemesh-store::Store::similarity_search`.

use crate::error::AiError;

/// What kind of text is being embedded, so a provider can pick a
/// task-specific instruction prefix if its API supports one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EmbeddingKind {
    Symbol,
    Query,
}

#[async_trait::async_trait]
pub trait Embedder: Send + Sync {
    /// Embed a batch of texts, preserving order and length.
    async fn embed_batch(
        &self,
        texts: &[String],
        kind: EmbeddingKind,
    ) -> Result<Vec<Vec<f32>>, AiError>;

    /// Dimensionality of vectors this embedder returns.
    fn dimensions(&self) -> usize;

    /// Model identifier stored alongside embeddings (`symbol_embeddings.model`).
    fn model_name(&self) -> &str;
}
