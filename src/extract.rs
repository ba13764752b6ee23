//! Text extraction for discovered documents.
//!
//! PDFs go through `pdf-extract` on a blocking thread; everything else is
//! read as UTF-8 with invalid sequences replaced. Any failure is returned
//! as an [`ExtractError`] and the pipeline skips the file.

use docvec_core::models::DocumentKind;

use crate::walker::DocumentFile;

/// Extraction error. Never fatal to a run.
#[derive(Debug)]
pub enum ExtractError {
    Io(std::io::Error),
    Pdf(String),
}

impl std::fmt::Display for ExtractError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ExtractError::Io(e) => write!(f, "read failed: {}", e),
            ExtractError::Pdf(e) => write!(f, "PDF extraction failed: {}", e),
        }
    }
}

impl std::error::Error for ExtractError {}

impl From<std::io::Error> for ExtractError {
    fn from(e: std::io::Error) -> Self {
        ExtractError::Io(e)
    }
}

/// Read `file` from disk and return its text.
pub async fn extract_file(file: &DocumentFile) -> Result<String, ExtractError> {
    let bytes = tokio::fs::read(&file.path).await?;
    match file.kind {
        DocumentKind::Text => Ok(decode_text(&bytes)),
        DocumentKind::Pdf => tokio::task::spawn_blocking(move || extract_pdf(&bytes))
            .await
            .map_err(|e| ExtractError::Pdf(format!("extractor task failed: {}", e)))?,
    }
}

/// Extract text from in-memory bytes of the given kind.
pub fn extract_bytes(bytes: &[u8], kind: DocumentKind) -> Result<String, ExtractError> {
    match kind {
        DocumentKind::Text => Ok(decode_text(bytes)),
        DocumentKind::Pdf => extract_pdf(bytes),
    }
}

fn extract_pdf(bytes: &[u8]) -> Result<String, ExtractError> {
    pdf_extract::extract_text_from_mem(bytes).map_err(|e| ExtractError::Pdf(e.to_string()))
}

fn decode_text(bytes: &[u8]) -> String {
    String::from_utf8_lossy(bytes).into_owned()
}
