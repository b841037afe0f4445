use crate::error::ModelError;
use crate::llm::ChatMessage;
use crate::{PdfChunk, SearchCandidate, SearchError, SearchQuery};
use async_trait::async_trait;

#[async_trait]
pub trait VectorIndex: Send + Sync {
    async fn index_vector_chunks(
        &self,
        chunks: &[PdfChunk],
        embeddings: &[Vec<f32>],
    ) -> Result<(), SearchError>;

    /// Returns at most `query.top_k` hits scoring above `query.score_threshold`,
    /// best first.
    async fn search_vector(
        &self,
        query_vector: &[f32],
        query: &SearchQuery,
    ) -> Result<Vec<SearchCandidate>, SearchError>;

    async fn chunk_count(&self) -> usize;
}

#[async_trait]
pub trait LanguageModel: Send + Sync {
    async fn generate(&self, messages: &[ChatMessage]) -> Result<String, ModelError>;
}
