use std::path::{Path, PathBuf};

use log::{debug, info};

use crate::error::ContentError;
use crate::transcript::TranscriptService;

/// Where a piece of study material comes from
#[derive(Debug, Clone)]
pub enum StudySource {
    /// Pasted text
    Text(String),
    /// A PDF document on disk
    Pdf(PathBuf),
    /// A YouTube video id or URL; its transcript becomes the study text
    YouTube(String),
}

impl StudySource {
    /// Resolve the source to plain study text
    pub async fn load(&self, transcripts: &TranscriptService) -> Result<String, ContentError> {
        match self {
            StudySource::Text(text) => {
                let trimmed = text.trim();
                if trimmed.is_empty() {
                    return Err(ContentError::EmptyText);
                }
                Ok(trimmed.to_string())
            }
            StudySource::Pdf(path) => extract_pdf_text(path).await,
            StudySource::YouTube(video) => {
                info!("Loading transcript for {}", video);
                Ok(transcripts.transcript(video).await?)
            }
        }
    }
}

/// Extract the text layer of a PDF, off the async runtime
pub async fn extract_pdf_text(path: &Path) -> Result<String, ContentError> {
    let owned = path.to_path_buf();
    let text = tokio::task::spawn_blocking(move || pdf_extract::extract_text(&owned))
        .await
        .map_err(|e| ContentError::Pdf(e.to_string()))?
        .map_err(|e| ContentError::Pdf(e.to_string()))?;

    let cleaned = collapse_blank_lines(&text);
    if cleaned.is_empty() {
        return Err(ContentError::EmptyPdf(path.display().to_string()));
    }
    debug!("Extracted {} chars from {}", cleaned.len(), path.display());
    Ok(cleaned)
}

/// Trim every line and keep at most one empty line between paragraphs
fn collapse_blank_lines(text: &str) -> String {
    let mut output = String::with_capacity(text.len());
    let mut blank_run = 0;
    for line in text.lines().map(str::trim) {
        if line.is_empty() {
            blank_run += 1;
            continue;
        }
        if !output.is_empty() {
            output.push_str(if blank_run > 0 { "\n\n" } else { "\n" });
        }
        output.push_str(line);
        blank_run = 0;
    }
    output
}
