//! In-process vector index scoped to one uploaded document.

use crate::traits::VectorIndex;
use crate::{PdfChunk, SearchCandidate, SearchError, SearchQuery};
use async_trait::async_trait;
use tokio::sync::RwLock;

#[derive(Debug, Clone)]
struct IndexedChunk {
    chunk: PdfChunk,
    embedding: Vec<f32>,
}

#[derive(Debug, Default)]
pub struct InMemoryVectorIndex {
    entries: RwLock<Vec<IndexedChunk>>,
}

impl InMemoryVectorIndex {
    pub fn new() -> Self {
        Self::default()
    }
}

fn normalized(vector: &[f32]) -> Option<Vec<f32>> {
    let magnitude = vector.iter().map(|value| value * value).sum::<f32>().sqrt();
    if magnitude == 0.0 || !magnitude.is_finite() {
        return None;
    }
    Some(vector.iter().map(|value| value / magnitude).collect())
}

/// Relevance in `[0, 1]` derived from the squared euclidean distance of the
/// unit-normalised vectors: `1 - d² / √2`. Identical directions score 1.
pub fn relevance_score(a: &[f32], b: &[f32]) -> f32 {
    let (Some(a), Some(b)) = (normalized(a), normalized(b)) else {
        return 0.0;
    };
    let squared_distance: f32 = a
        .iter()
        .zip(b.iter())
        .map(|(left, right)| (left - right) * (left - right))
        .sum();
    (1.0 - squared_distance / std::f32::consts::SQRT_2).clamp(0.0, 1.0)
}

#[async_trait]
impl VectorIndex for InMemoryVectorIndex {
    async fn index_vector_chunks(
        &self,
        chunks: &[PdfChunk],
        embeddings: &[Vec<f32>],
    ) -> Result<(), SearchError> {
        if chunks.len() != embeddings.len() {
            return Err(SearchError::Request(format!(
                "embedding count {} doesn't match chunk count {}",
                embeddings.len(),
                chunks.len()
            )));
        }

        let mut entries = self.entries.write().await;
        let expected = entries
            .first()
            .map(|entry| entry.embedding.len())
            .or_else(|| embeddings.first().map(Vec::len));

        if let Some(bad) = embeddings.iter().find(|embedding| Some(embedding.len()) != expected) {
            return Err(SearchError::Request(format!(
                "embedding dimension {} != {}",
                bad.len(),
                expected.unwrap_or_default()
            )));
        }

        entries.extend(chunks.iter().zip(embeddings).map(|(chunk, embedding)| IndexedChunk {
            chunk: chunk.clone(),
            embedding: embedding.clone(),
        }));

        Ok(())
    }

    async fn search_vector(
        &self,
        query_vector: &[f32],
        query: &SearchQuery,
    ) -> Result<Vec<SearchCandidate>, SearchError> {
        let entries = self.entries.read().await;
        if let Some(first) = entries.first() {
            if first.embedding.len() != query_vector.len() {
                return Err(SearchError::Request(format!(
                    "query vector dim {} is not {}",
                    query_vector.len(),
                    first.embedding.len()
                )));
            }
        }

        let mut hits = entries
            .iter()
            .map(|entry| SearchCandidate {
                chunk: entry.chunk.clone(),
                score: relevance_score(&entry.embedding, query_vector),
            })
            .filter(|hit| hit.score > query.score_threshold)
            .collect::<Vec<_>>();

        hits.sort_by(|left, right| right.score.total_cmp(&left.score));
        hits.truncate(query.top_k);
        Ok(hits)
    }

    async fn chunk_count(&self) -> usize {
        self.entries.read().await.len()
    }
}
