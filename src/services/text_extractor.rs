use lopdf::Document;

use crate::{
    errors::{AppError, AppResult},
    models::domain::ExtractedDocument,
};

pub const PDF_CONTENT_TYPE: &str = "application/pdf";

/// Check if a file is a PDF based on its magic bytes
pub fn is_pdf(data: &[u8]) -> bool {
    data.starts_with(b"%PDF")
}

/// Extracts page text in page order. Pages whose text layer cannot be read
/// contribute nothing, but still count towards the page table.
pub fn extract_pdf_text(data: &[u8]) -> AppResult<ExtractedDocument> {
    if !is_pdf(data) {
        return Err(AppError::ValidationError("Not a pdf file.".to_string()));
    }

    let doc = Document::load_mem(data)
        .map_err(|e| AppError::ValidationError(format!("Problem parsing pdf: {}", e)))?;

    let mut page_numbers: Vec<u32> = doc.get_pages().keys().copied().collect();
    page_numbers.sort_unstable();

    let pages = page_numbers.iter().map(|page_number| {
        doc.extract_text(&[*page_number]).unwrap_or_else(|e| {
            log::warn!("Failed to extract text from page {}: {}", page_number, e);
            String::new()
        })
    });

    Ok(ExtractedDocument::from_pages(pages))
}

/// Runs [`extract_pdf_text`] on the blocking pool.
pub async fn extract_pdf_text_blocking(data: Vec<u8>) -> AppResult<ExtractedDocument> {
    tokio::task::spawn_blocking(move || extract_pdf_text(&data)).await?
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::fixtures::pdf_with_pages;

    #[test]
    fn test_is_pdf() {
        assert!(is_pdf(b"%PDF-1.4"));
        assert!(!is_pdf(b"Not a PDF"));
        assert!(!is_pdf(b"%PD"));
    }

    #[test]
    fn rejects_non_pdf_bytes() {
        let result = extract_pdf_text(b"plain text");
        assert!(matches!(result, Err(AppError::ValidationError(_))));
    }

    #[test]
    fn rejects_truncated_pdf() {
        let result = extract_pdf_text(b"%PDF-1.5\n%garbage");
        assert!(result.is_err());
    }

    #[test]
    fn extracts_text_per_page() {
        let bytes = pdf_with_pages(&["First page body", "Second page body"]);
        let doc = extract_pdf_text(&bytes).expect("generated pdf should parse");

        assert_eq!(doc.total_pages(), 2);
        assert!(doc.text.contains("First page body"));
        assert!(doc.text.contains("Second page body"));
        assert!(doc.page_lengths[0] < doc.page_lengths[1]);
        assert_eq!(*doc.page_lengths.last().unwrap(), doc.text.len());
    }

    #[tokio::test]
    async fn blocking_wrapper_returns_same_result() {
        let bytes = pdf_with_pages(&["Only page"]);
        let doc = extract_pdf_text_blocking(bytes).await.unwrap();
        assert_eq!(doc.total_pages(), 1);
    }
}
