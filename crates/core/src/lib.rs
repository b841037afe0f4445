pub mod chunking;
pub mod embeddings;
pub mod error;
pub mod extractor;
pub mod ingest;
pub mod llm;
pub mod models;
pub mod orchestrator;
pub mod prompt;
pub mod registry;
pub mod stores;
pub mod traits;

#[cfg(any(test, feature = "test-util"))]
pub mod test_pdf;

pub use chunking::{build_chunks, split_documents, split_text, ChunkingConfig};
pub use embeddings::{
    CharacterNgramEmbedder, Embedder, OllamaEmbedder, DEFAULT_EMBEDDING_DIMENSIONS,
    DEFAULT_OLLAMA_EMBEDDING_MODEL,
};
pub use error::{IngestError, ModelError, SearchError};
pub use extractor::{extract_page_texts, PageText};
pub use ingest::{ingest_pdf, load_and_split, persist_upload, upload_path, IngestionReport};
pub use llm::{ChatMessage, OllamaClient, RetryPolicy, Role, DEFAULT_CHAT_MODEL, DEFAULT_OLLAMA_URL};
pub use models::{
    Answer, DocumentFingerprint, IngestionOptions, IngestionSummary, PageDocument, PdfChunk,
    RetrievalOptions, SearchCandidate, SearchQuery, SourceRecord,
};
pub use orchestrator::{QaCoordinator, NO_ANSWER};
pub use registry::{SessionId, SessionStoreRegistry};
pub use stores::InMemoryVectorIndex;
pub use traits::{LanguageModel, VectorIndex};
