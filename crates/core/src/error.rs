use thiserror::Error;

#[derive(Debug, Error)]
pub enum IngestError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("pdf parse error: {0}")]
    PdfParse(String),

    #[error("path has no file name: {0}")]
    MissingFileName(String),

    #[error("invalid chunking config: {0}")]
    InvalidChunkConfig(String),

    #[error("embedding failed: {0}")]
    Model(#[from] ModelError),

    #[error("indexing failed: {0}")]
    Index(#[from] SearchError),

    #[error("background task failed: {0}")]
    Task(String),
}

#[derive(Debug, Error)]
pub enum SearchError {
    #[error("No vector store found. Please upload a PDF first.")]
    MissingStore,

    #[error("model error: {0}")]
    Model(#[from] ModelError),

    #[error("query is empty")]
    EmptyQuery,

    #[error("search request failed: {0}")]
    Request(String),
}

/// Failures at the embedding / language-model HTTP boundary.
#[derive(Debug, Error)]
pub enum ModelError {
    #[error("invalid response from {backend} ({status}): {details}")]
    BackendResponse {
        backend: String,
        status: u16,
        details: String,
    },

    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("url parse error: {0}")]
    Url(#[from] url::ParseError),

    #[error("{backend} returned no content")]
    EmptyResponse { backend: String },

    #[error("embedding count {actual} doesn't match input count {expected}")]
    CountMismatch { expected: usize, actual: usize },
}

impl ModelError {
    /// Whether retrying the same request could succeed.
    pub fn is_transient(&self) -> bool {
        match self {
            ModelError::BackendResponse { status, .. } => *status >= 500 || *status == 429,
            ModelError::Http(error) => error.is_connect() || error.is_timeout() || error.is_request(),
            _ => false,
        }
    }
}

pub type Result<T, E = IngestError> = std::result::Result<T, E>;
