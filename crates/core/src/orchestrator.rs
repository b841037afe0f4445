use crate::embeddings::Embedder;
use crate::ingest::ingest_pdf;
use crate::llm::ChatMessage;
use crate::prompt::{collect_sources, render_system_prompt};
use crate::registry::{SessionId, SessionStoreRegistry};
use crate::traits::{LanguageModel, VectorIndex};
use crate::{
    Answer, IngestError, IngestionOptions, IngestionSummary, InMemoryVectorIndex, RetrievalOptions,
    SearchError, SearchQuery,
};
use std::path::Path;
use std::sync::Arc;
use tracing::{debug, info};

pub const NO_ANSWER: &str = "No answer found";

/// Runs the upload → question flow for every session.
pub struct QaCoordinator {
    embedder: Arc<dyn Embedder>,
    llm: Arc<dyn LanguageModel>,
    registry: Arc<SessionStoreRegistry>,
    ingestion: IngestionOptions,
    retrieval: RetrievalOptions,
}

impl QaCoordinator {
    pub fn new(embedder: Arc<dyn Embedder>, llm: Arc<dyn LanguageModel>) -> Self {
        Self {
            embedder,
            llm,
            registry: Arc::new(SessionStoreRegistry::default()),
            ingestion: IngestionOptions::default(),
            retrieval: RetrievalOptions::default(),
        }
    }

    pub fn with_registry(mut self, registry: Arc<SessionStoreRegistry>) -> Self {
        self.registry = registry;
        self
    }

    pub fn with_ingestion_options(mut self, options: IngestionOptions) -> Self {
        self.ingestion = options;
        self
    }

    pub fn with_retrieval_options(mut self, options: RetrievalOptions) -> Self {
        self.retrieval = options;
        self
    }

    pub fn registry(&self) -> &Arc<SessionStoreRegistry> {
        &self.registry
    }

    /// Indexes the PDF at `path` and makes it the session's only store.
    ///
    /// On failure the session keeps whatever store it had before.
    pub async fn ingest_pdf(&self, session: SessionId, path: &Path) -> Result<IngestionSummary, IngestError> {
        let owned_path = path.to_path_buf();
        let options = self.ingestion.clone();
        let report = tokio::task::spawn_blocking(move || ingest_pdf(&owned_path, &options))
            .await
            .map_err(|error| IngestError::Task(error.to_string()))??;

        if report.chunks.is_empty() {
            return Err(IngestError::PdfParse(format!(
                "no text chunks produced from {}",
                path.display()
            )));
        }

        let texts = report
            .chunks
            .iter()
            .map(|chunk| chunk.text.as_str())
            .collect::<Vec<_>>();
        let embeddings = self.embedder.embed_batch(&texts).await?;

        let index = InMemoryVectorIndex::new();
        index.index_vector_chunks(&report.chunks, &embeddings).await?;

        let source_path = report.fingerprint.source_path.clone();
        let replaced = self
            .registry
            .replace(session, Arc::new(index), source_path.clone())
            .await;

        info!(
            %session,
            source = %source_path,
            documents = report.documents.len(),
            chunks = report.chunks.len(),
            replaced,
            "indexed pdf"
        );

        Ok(IngestionSummary {
            source_path,
            document_count: report.documents.len(),
            chunk_count: report.chunks.len(),
            replaced,
        })
    }

    pub async fn has_store(&self, session: &SessionId) -> bool {
        self.registry.contains(session).await
    }

    /// Drops the session's store. Returns whether one existed.
    pub async fn reset(&self, session: &SessionId) -> bool {
        self.registry.evict(session).await
    }

    pub async fn ask(&self, session: &SessionId, question: &str) -> Result<Answer, SearchError> {
        let index = self
            .registry
            .get(session)
            .await
            .ok_or(SearchError::MissingStore)?;

        if question.trim().is_empty() {
            return Err(SearchError::EmptyQuery);
        }

        let query = SearchQuery::new(question, &self.retrieval);
        let query_vector = self.embedder.embed(&query.text).await?;
        let hits = index.search_vector(&query_vector, &query).await?;

        debug!(
            %session,
            hits = hits.len(),
            scores = ?hits.iter().map(|hit| hit.score).collect::<Vec<_>>(),
            "retrieved context"
        );

        let messages = [
            ChatMessage::system(render_system_prompt(&hits)),
            ChatMessage::user(query.text.as_str()),
        ];
        let generated = self.llm.generate(&messages).await?;
        let answer = if generated.trim().is_empty() {
            NO_ANSWER.to_string()
        } else {
            generated
        };

        Ok(Answer {
            answer,
            sources: collect_sources(&hits, self.retrieval.source_preview_chars),
        })
    }
}
