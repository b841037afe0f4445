use crate::chunking::{build_chunks, split_documents, ChunkingConfig};
use crate::{extract_page_texts, DocumentFingerprint, IngestError, IngestionOptions, PageDocument, PdfChunk};
use sha2::{Digest, Sha256};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Where an upload named `file_name` lands inside `upload_dir`.
///
/// Only the final path component of the client-supplied name is kept, so
/// `../../etc/passwd` becomes `passwd`. Uploads sharing a name overwrite
/// each other.
pub fn upload_path(upload_dir: &Path, file_name: &str) -> Result<PathBuf, IngestError> {
    let name = Path::new(file_name)
        .file_name()
        .and_then(|name| name.to_str())
        .map(str::trim)
        .filter(|name| !name.is_empty())
        .ok_or_else(|| IngestError::MissingFileName(file_name.to_string()))?;

    Ok(upload_dir.join(name))
}

/// Writes an uploaded file to `upload_dir`, creating the directory if needed.
pub fn persist_upload(upload_dir: &Path, file_name: &str, bytes: &[u8]) -> Result<PathBuf, IngestError> {
    let path = upload_path(upload_dir, file_name)?;
    fs::create_dir_all(upload_dir)?;
    fs::write(&path, bytes)?;
    Ok(path)
}

pub struct IngestionReport {
    pub fingerprint: DocumentFingerprint,
    /// Loader documents: pages, with very long pages split further.
    pub documents: Vec<PageDocument>,
    pub chunks: Vec<PdfChunk>,
}

/// Extracts page text and applies the loader's coarse page split.
pub fn load_and_split(path: &Path, options: &IngestionOptions) -> Result<Vec<PageDocument>, IngestError> {
    let page_config = ChunkingConfig::for_pages(options)?;
    let source = path.to_string_lossy().to_string();

    let pages = extract_page_texts(path)?
        .into_iter()
        .map(|page| PageDocument {
            source: source.clone(),
            page: page.number,
            text: page.text,
        })
        .collect::<Vec<_>>();

    Ok(split_documents(&pages, page_config))
}

pub fn ingest_pdf(path: &Path, options: &IngestionOptions) -> Result<IngestionReport, IngestError> {
    let chunk_config = ChunkingConfig::for_chunks(options)?;
    let fingerprint = build_document_fingerprint(path);
    let documents = load_and_split(path, options)?;
    let chunks = build_chunks(&fingerprint, &documents, chunk_config);

    debug!(
        path = %path.display(),
        documents = documents.len(),
        chunks = chunks.len(),
        "split pdf"
    );

    Ok(IngestionReport {
        fingerprint,
        documents,
        chunks,
    })
}

fn build_document_fingerprint(path: &Path) -> DocumentFingerprint {
    DocumentFingerprint {
        document_id: generate_document_id(path),
        source_path: path.to_string_lossy().to_string(),
    }
}

fn generate_document_id(path: &Path) -> String {
    let mut hasher = Sha256::new();
    hasher.update(path.to_string_lossy().as_bytes());
    format!("{:x}", hasher.finalize())
}

#[cfg(test)]
mod tests {
    use super::{ingest_pdf, persist_upload, upload_path};
    use crate::test_pdf::write_pdf;
    use crate::{IngestError, IngestionOptions};
    use std::fs;
    use std::path::Path;
    use tempfile::tempdir;

    #[test]
    fn upload_path_keeps_only_the_file_name() -> Result<(), Box<dyn std::error::Error>> {
        let dir = Path::new("pdf");
        assert_eq!(upload_path(dir, "../../etc/report.pdf")?, dir.join("report.pdf"));
        assert!(matches!(
            upload_path(dir, ".."),
            Err(IngestError::MissingFileName(_))
        ));
        assert!(upload_path(dir, "").is_err());
        Ok(())
    }

    #[test]
    fn persist_upload_creates_directory_and_overwrites() -> Result<(), Box<dyn std::error::Error>> {
        let dir = tempdir()?;
        let upload_dir = dir.path().join("pdf");

        persist_upload(&upload_dir, "a.pdf", b"first")?;
        let path = persist_upload(&upload_dir, "a.pdf", b"second")?;

        assert_eq!(fs::read(path)?, b"second");
        Ok(())
    }

    #[test]
    fn ingest_counts_documents_and_chunks() -> Result<(), Box<dyn std::error::Error>> {
        let dir = tempdir()?;
        let path = dir.path().join("manual.pdf");
        let long_line = "The hydraulic pump must be primed before start. ".repeat(4);
        write_pdf(
            &path,
            &[
                &[long_line.as_str(), long_line.as_str(), long_line.as_str()],
                &["Valve torque is 40 Nm."],
            ],
        )?;

        let report = ingest_pdf(&path, &IngestionOptions::default())?;

        assert_eq!(report.documents.len(), 2);
        assert!(report.chunks.len() >= 3);
        assert!(report.chunks.iter().all(|chunk| chunk.text.chars().count() <= 512));
        assert!(report
            .chunks
            .iter()
            .all(|chunk| chunk.source == path.to_string_lossy()));
        assert_eq!(report.fingerprint.source_path, path.to_string_lossy());
        assert!(report
            .chunks
            .iter()
            .all(|chunk| chunk.document_id == report.fingerprint.document_id));
        Ok(())
    }

    #[test]
    fn unreadable_pdf_fails() -> Result<(), Box<dyn std::error::Error>> {
        let dir = tempdir()?;
        let path = dir.path().join("unreadable.pdf");
        fs::write(&path, b"%PDF-1.4\n%broken")?;

        let result = ingest_pdf(&path, &IngestionOptions::default());
        assert!(matches!(result, Err(IngestError::PdfParse(_))));
        Ok(())
    }
}
