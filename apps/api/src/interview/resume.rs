//! Résumé intake: accept a PDF upload and capture its text once.
//!
//! Extraction is CPU-bound and runs inside `tokio::task::spawn_blocking`.

use bytes::Bytes;
use tracing::warn;

use crate::errors::AppError;
use crate::models::interview::ResumeSnapshot;

/// Hard ceiling on the uploaded résumé.
pub const MAX_RESUME_BYTES: usize = 5 * 1024 * 1024;
pub const PDF_CONTENT_TYPE: &str = "application/pdf";

/// Checks the upload before any parsing work is done.
pub fn check_upload(content_type: Option<&str>, data: &[u8]) -> Result<(), AppError> {
    if content_type != Some(PDF_CONTENT_TYPE) {
        return Err(AppError::Validation("Only PDF files are allowed".to_string()));
    }
    if data.is_empty() {
        return Err(AppError::Validation("Resume file is empty".to_string()));
    }
    if data.len() > MAX_RESUME_BYTES {
        return Err(AppError::Validation(format!(
            "Resume file exceeds the {} MB limit",
            MAX_RESUME_BYTES / (1024 * 1024)
        )));
    }
    Ok(())
}

/// Validates the upload and extracts its text into a snapshot.
pub async fn extract_resume(
    filename: String,
    content_type: Option<&str>,
    data: Bytes,
) -> Result<ResumeSnapshot, AppError> {
    check_upload(content_type, &data)?;

    let text = tokio::task::spawn_blocking(move || pdf_extract::extract_text_from_mem(&data))
        .await
        .map_err(|e| {
            // pdf-extract can panic on malformed documents.
            if e.is_panic() {
                AppError::Validation("Resume PDF could not be read".to_string())
            } else {
                AppError::Internal(anyhow::anyhow!("PDF extraction task failed: {e}"))
            }
        })?
        .map_err(|e| {
            warn!("Could not read PDF '{filename}': {e}");
            AppError::Validation("Resume PDF could not be read".to_string())
        })?;

    let content = normalize_text(&text);
    if content.is_empty() {
        return Err(AppError::Validation(
            "Resume contains no extractable text".to_string(),
        ));
    }

    Ok(ResumeSnapshot { filename, content })
}

/// Trims each line and collapses runs of blank lines left by PDF layout.
fn normalize_text(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    let mut blank_run = false;
    for line in raw.lines().map(str::trim_end) {
        if line.trim().is_empty() {
            blank_run = true;
            continue;
        }
        if !out.is_empty() {
            out.push_str(if blank_run { "\n\n" } else { "\n" });
        }
        out.push_str(line.trim_start());
        blank_run = false;
    }
    out
}
