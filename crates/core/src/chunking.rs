use crate::error::IngestError;
use crate::models::{DocumentFingerprint, IngestionOptions, PageDocument, PdfChunk};
use sha2::{Digest, Sha256};
use tracing::warn;

/// Separators tried in order; the empty separator splits into characters.
pub const DEFAULT_SEPARATORS: [&str; 4] = ["\n\n", "\n", " ", ""];

#[derive(Debug, Clone, Copy)]
pub struct ChunkingConfig {
    pub max_chars: usize,
    pub overlap_chars: usize,
}

impl ChunkingConfig {
    pub fn new(max_chars: usize, overlap_chars: usize) -> Result<Self, IngestError> {
        if max_chars == 0 {
            return Err(IngestError::InvalidChunkConfig(
                "chunk size must be greater than zero".to_string(),
            ));
        }
        if overlap_chars > max_chars {
            return Err(IngestError::InvalidChunkConfig(format!(
                "overlap {overlap_chars} is larger than chunk size {max_chars}"
            )));
        }
        Ok(Self {
            max_chars,
            overlap_chars,
        })
    }

    pub fn for_pages(options: &IngestionOptions) -> Result<Self, IngestError> {
        Self::new(options.page_max_chars, options.page_overlap_chars)
    }

    pub fn for_chunks(options: &IngestionOptions) -> Result<Self, IngestError> {
        Self::new(options.chunk_max_chars, options.chunk_overlap_chars)
    }
}

fn char_len(text: &str) -> usize {
    text.chars().count()
}

/// Recursively splits `text` into pieces of at most `max_chars` characters,
/// preferring paragraph, then line, then word boundaries. Consecutive pieces
/// share up to `overlap_chars` characters of trailing context.
pub fn split_text(text: &str, config: ChunkingConfig) -> Vec<String> {
    split_recursive(text, &DEFAULT_SEPARATORS, config)
}

fn split_recursive(text: &str, separators: &[&str], config: ChunkingConfig) -> Vec<String> {
    let mut separator = separators.last().copied().unwrap_or("");
    let mut remaining: &[&str] = &[];
    for (index, candidate) in separators.iter().enumerate() {
        if candidate.is_empty() {
            separator = *candidate;
            break;
        }
        if text.contains(candidate) {
            separator = *candidate;
            remaining = &separators[index + 1..];
            break;
        }
    }

    let splits = split_keeping_separator(text, separator);

    let mut output = Vec::new();
    let mut fitting = Vec::new();
    for piece in splits {
        if char_len(&piece) < config.max_chars {
            fitting.push(piece);
            continue;
        }

        if !fitting.is_empty() {
            output.extend(merge_splits(&fitting, config));
            fitting.clear();
        }
        if remaining.is_empty() {
            output.push(piece);
        } else {
            output.extend(split_recursive(&piece, remaining, config));
        }
    }

    if !fitting.is_empty() {
        output.extend(merge_splits(&fitting, config));
    }

    output
}

/// Splits at `separator`, attaching each separator to the start of the piece
/// that follows it. Empty pieces are dropped.
fn split_keeping_separator(text: &str, separator: &str) -> Vec<String> {
    if separator.is_empty() {
        return text.chars().map(String::from).collect();
    }

    let mut pieces = Vec::new();
    let mut start = 0;
    for (boundary, _) in text.match_indices(separator) {
        pieces.push(text[start..boundary].to_string());
        start = boundary;
    }
    pieces.push(text[start..].to_string());

    pieces.retain(|piece| !piece.is_empty());
    pieces
}

/// Greedily packs pieces into chunks, carrying the tail of each finished
/// chunk into the next one as overlap.
fn merge_splits(splits: &[String], config: ChunkingConfig) -> Vec<String> {
    let mut chunks = Vec::new();
    let mut current: Vec<&str> = Vec::new();
    let mut total = 0usize;

    for piece in splits {
        let piece_len = char_len(piece);
        if total + piece_len > config.max_chars {
            if total > config.max_chars {
                warn!(
                    size = total,
                    limit = config.max_chars,
                    "created a chunk longer than the configured size"
                );
            }
            if !current.is_empty() {
                if let Some(chunk) = join_trimmed(&current) {
                    chunks.push(chunk);
                }
                while total > config.overlap_chars
                    || (total + piece_len > config.max_chars && total > 0)
                {
                    let dropped = current.remove(0);
                    total -= char_len(dropped);
                }
            }
        }
        current.push(piece);
        total += piece_len;
    }

    if let Some(chunk) = join_trimmed(&current) {
        chunks.push(chunk);
    }

    chunks
}

fn join_trimmed(pieces: &[&str]) -> Option<String> {
    let joined = pieces.concat();
    let trimmed = joined.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}

/// Splits each loader document further, keeping its source metadata.
pub fn split_documents(documents: &[PageDocument], config: ChunkingConfig) -> Vec<PageDocument> {
    documents
        .iter()
        .flat_map(|document| {
            split_text(&document.text, config)
                .into_iter()
                .map(|text| PageDocument {
                    source: document.source.clone(),
                    page: document.page,
                    text,
                })
        })
        .collect()
}

pub fn build_chunks(
    fingerprint: &DocumentFingerprint,
    documents: &[PageDocument],
    config: ChunkingConfig,
) -> Vec<PdfChunk> {
    split_documents(documents, config)
        .into_iter()
        .enumerate()
        .map(|(index, piece)| {
            let chunk_index = index as u64;
            PdfChunk {
                chunk_id: make_chunk_id(&fingerprint.document_id, piece.page, chunk_index, &piece.text),
                document_id: fingerprint.document_id.clone(),
                source: piece.source,
                page: piece.page,
                chunk_index,
                text: piece.text,
            }
        })
        .collect()
}

fn make_chunk_id(document_id: &str, page: u32, index: u64, text: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(document_id.as_bytes());
    hasher.update(page.to_le_bytes());
    hasher.update(index.to_le_bytes());
    hasher.update(text.as_bytes());
    format!("{:x}", hasher.finalize())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(max_chars: usize, overlap_chars: usize) -> ChunkingConfig {
        ChunkingConfig::new(max_chars, overlap_chars).expect("valid config")
    }

    #[test]
    fn overlap_larger_than_size_is_rejected() {
        assert!(matches!(
            ChunkingConfig::new(10, 20),
            Err(IngestError::InvalidChunkConfig(_))
        ));
        assert!(ChunkingConfig::new(0, 0).is_err());
    }

    #[test]
    fn short_text_is_a_single_trimmed_chunk() {
        let chunks = split_text("  Pump maintenance guide \n", config(512, 50));
        assert_eq!(chunks, vec!["Pump maintenance guide".to_string()]);
    }

    #[test]
    fn empty_text_yields_nothing() {
        assert!(split_text("   \n\n  ", config(512, 50)).is_empty());
    }

    #[test]
    fn separator_starts_the_following_piece() {
        let pieces = split_keeping_separator("a b  c", " ");
        assert_eq!(pieces, vec!["a", " b", " ", " c"]);
    }

    #[test]
    fn paragraphs_are_preferred_split_points() {
        let text = "First paragraph about pumps.\n\nSecond paragraph about valves.";
        let chunks = split_text(text, config(35, 0));
        assert_eq!(
            chunks,
            vec![
                "First paragraph about pumps.".to_string(),
                "Second paragraph about valves.".to_string()
            ]
        );
    }

    #[test]
    fn chunks_respect_size_and_overlap() {
        let text = (0..200)
            .map(|index| format!("word{index}"))
            .collect::<Vec<_>>()
            .join(" ");
        let chunks = split_text(&text, config(512, 50));

        assert!(chunks.len() > 1);
        for chunk in &chunks {
            assert!(chunk.chars().count() <= 512, "chunk too long: {}", chunk.len());
        }
        for pair in chunks.windows(2) {
            let tail_word = pair[0].split_whitespace().last().unwrap_or_default();
            assert!(
                pair[1].contains(tail_word),
                "expected overlap of {tail_word:?} into next chunk"
            );
        }
    }

    #[test]
    fn unbroken_text_falls_back_to_characters() {
        let text = "x".repeat(30);
        let chunks = split_text(&text, config(10, 2));
        assert!(chunks.iter().all(|chunk| chunk.chars().count() <= 10));
        assert_eq!(chunks[0].len(), 10);
        assert!(chunks.len() >= 3);
    }

    #[test]
    fn multibyte_text_is_measured_in_characters() {
        let text = "é".repeat(20);
        let chunks = split_text(&text, config(8, 0));
        assert!(chunks.iter().all(|chunk| chunk.chars().count() <= 8));
        assert_eq!(chunks.concat(), text);
    }

    #[test]
    fn chunks_carry_source_and_page() {
        let fingerprint = DocumentFingerprint {
            document_id: "doc-1".to_string(),
            source_path: "pdf/manual.pdf".to_string(),
        };
        let documents = vec![
            PageDocument {
                source: "pdf/manual.pdf".to_string(),
                page: 1,
                text: "Pumps.".to_string(),
            },
            PageDocument {
                source: "pdf/manual.pdf".to_string(),
                page: 2,
                text: "Valves.".to_string(),
            },
        ];

        let chunks = build_chunks(&fingerprint, &documents, config(512, 50));
        assert_eq!(chunks.len(), 2);
        assert_eq!(chunks[1].page, 2);
        assert_eq!(chunks[1].chunk_index, 1);
        assert_eq!(chunks[1].source, "pdf/manual.pdf");
        assert_ne!(chunks[0].chunk_id, chunks[1].chunk_id);
    }
}
