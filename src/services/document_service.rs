use std::sync::Arc;

use crate::{
    errors::{AppError, AppResult},
    models::domain::{ExtractedDocument, LinkSource, TokenWindow},
    services::{
        link_service::{parse_link, DocumentFetcher},
        text_extractor::extract_pdf_text_blocking,
        token_window::TokenWindower,
        transcription_service::TranscriptionService,
    },
};

/// Turns uploads and links into token windows ready for quiz generation.
pub struct DocumentService {
    windower: TokenWindower,
    fetcher: Arc<dyn DocumentFetcher>,
    transcription: Arc<TranscriptionService>,
}

impl DocumentService {
    pub fn new(
        windower: TokenWindower,
        fetcher: Arc<dyn DocumentFetcher>,
        transcription: Arc<TranscriptionService>,
    ) -> Self {
        Self {
            windower,
            fetcher,
            transcription,
        }
    }

    pub fn max_tokens(&self) -> usize {
        self.windower.max_tokens()
    }

    pub async fn process_pdf(&self, bytes: Vec<u8>) -> AppResult<TokenWindow> {
        let document = extract_pdf_text_blocking(bytes).await?;
        if document.is_blank() {
            return Err(AppError::ValidationError("Problem parsing pdf.".to_string()));
        }

        log::info!(
            "Extracted {} bytes of text from {} pages",
            document.text.len(),
            document.total_pages()
        );
        self.window(document).await
    }

    pub async fn process_link(&self, link: &str) -> AppResult<(LinkSource, TokenWindow)> {
        let source = parse_link(link)?;

        let document = match &source {
            LinkSource::Arxiv { id, pdf_url } => {
                let bytes = self.fetcher.fetch_pdf(pdf_url).await?;
                let document = extract_pdf_text_blocking(bytes).await.map_err(|e| {
                    log::warn!("arXiv document {} could not be parsed: {}", id, e);
                    AppError::ValidationError("Not a recognised arXiv document.".to_string())
                })?;
                if document.is_blank() {
                    return Err(AppError::ValidationError(
                        "Not a recognised arXiv document.".to_string(),
                    ));
                }
                document
            }
            LinkSource::YouTube { video_id, .. } => {
                let transcript = self.transcription.transcribe_video(video_id).await?;
                if transcript.trim().is_empty() {
                    return Err(AppError::ValidationError(
                        "Could not transcribe the video.".to_string(),
                    ));
                }
                ExtractedDocument::single_page(transcript)
            }
        };

        let window = self.window(document).await?;
        Ok((source, window))
    }

    async fn window(&self, document: ExtractedDocument) -> AppResult<TokenWindow> {
        let windower = self.windower.clone();
        tokio::task::spawn_blocking(move || windower.window(document)).await?
    }
}
