use serde::{Deserialize, Serialize};

/// Identity of an uploaded file, derived from where it was saved.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DocumentFingerprint {
    pub document_id: String,
    pub source_path: String,
}

/// One loader document: a page, or a slice of a page when the page is long.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PageDocument {
    pub source: String,
    pub page: u32,
    pub text: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PdfChunk {
    pub chunk_id: String,
    pub document_id: String,
    pub source: String,
    pub page: u32,
    pub chunk_index: u64,
    pub text: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SearchQuery {
    pub text: String,
    pub top_k: usize,
    /// Hits must score strictly above this relevance.
    pub score_threshold: f32,
}

impl SearchQuery {
    pub fn new(text: impl Into<String>, options: &RetrievalOptions) -> Self {
        Self {
            text: text.into(),
            top_k: options.top_k,
            score_threshold: options.score_threshold,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchCandidate {
    pub chunk: PdfChunk,
    pub score: f32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceRecord {
    pub source: String,
    pub page_content: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Answer {
    pub answer: String,
    pub sources: Vec<SourceRecord>,
}

#[derive(Debug, Clone)]
pub struct IngestionOptions {
    pub page_max_chars: usize,
    pub page_overlap_chars: usize,
    pub chunk_max_chars: usize,
    pub chunk_overlap_chars: usize,
}

impl Default for IngestionOptions {
    fn default() -> Self {
        Self {
            page_max_chars: 4_000,
            page_overlap_chars: 200,
            chunk_max_chars: 512,
            chunk_overlap_chars: 50,
        }
    }
}

#[derive(Debug, Clone)]
pub struct RetrievalOptions {
    pub top_k: usize,
    pub score_threshold: f32,
    pub source_preview_chars: usize,
}

impl Default for RetrievalOptions {
    fn default() -> Self {
        Self {
            top_k: 10,
            score_threshold: 0.3,
            source_preview_chars: 500,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct IngestionSummary {
    pub source_path: String,
    pub document_count: usize,
    pub chunk_count: usize,
    /// True when an earlier store for the same session was dropped.
    pub replaced: bool,
}
