use async_trait::async_trait;
use once_cell::sync::Lazy;
use regex::Regex;
use url::{Position, Url};

use crate::{
    errors::{AppError, AppResult},
    models::domain::LinkSource,
};

static ARXIV_PATH_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^/(?:abs|pdf|ps|src|tb)/(?:hep-th/)?((\d+\.\d+)|\d+)")
        .expect("ARXIV_PATH_REGEX is a valid regex pattern")
});

static YOUTUBE_ID_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?:v=|/)([0-9A-Za-z_-]{11})(?:[^0-9A-Za-z_-]|$)")
        .expect("YOUTUBE_ID_REGEX is a valid regex pattern")
});

pub const UNSUPPORTED_LINK_MESSAGE: &str =
    "Unsupported URL. Only arxiv and YouTube links are currently supported.";

/// Classifies a submitted link and derives the URL its content is fetched from.
pub fn parse_link(link: &str) -> AppResult<LinkSource> {
    let url = Url::parse(link.trim())
        .map_err(|_| AppError::ValidationError(UNSUPPORTED_LINK_MESSAGE.to_string()))?;
    let host = url.host_str().unwrap_or_default().to_ascii_lowercase();

    if host.contains("arxiv.org") {
        let id = ARXIV_PATH_REGEX
            .captures(url.path())
            .and_then(|caps| caps.get(1))
            .map(|m| m.as_str().to_string())
            .ok_or_else(|| AppError::ValidationError("Invalid arXiv link.".to_string()))?;

        return Ok(LinkSource::Arxiv {
            pdf_url: format!("https://arxiv.org/pdf/{}.pdf", id),
            id,
        });
    }

    if host.contains("youtube.com") || host.contains("youtu.be") {
        let video_id = YOUTUBE_ID_REGEX
            .captures(&url[Position::BeforePath..])
            .and_then(|caps| caps.get(1))
            .map(|m| m.as_str().to_string())
            .ok_or_else(|| AppError::ValidationError("Invalid YouTube link.".to_string()))?;

        return Ok(LinkSource::YouTube {
            embed_url: format!("https://www.youtube.com/embed/{}", video_id),
            video_id,
        });
    }

    Err(AppError::ValidationError(
        UNSUPPORTED_LINK_MESSAGE.to_string(),
    ))
}

/// Downloads remote documents.
#[async_trait]
pub trait DocumentFetcher: Send + Sync {
    async fn fetch_pdf(&self, url: &str) -> AppResult<Vec<u8>>;
}

pub struct HttpDocumentFetcher {
    http: reqwest::Client,
}

impl HttpDocumentFetcher {
    pub fn new() -> Self {
        Self {
            http: reqwest::Client::new(),
        }
    }
}

impl Default for HttpDocumentFetcher {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl DocumentFetcher for HttpDocumentFetcher {
    async fn fetch_pdf(&self, url: &str) -> AppResult<Vec<u8>> {
        log::info!("Downloading {}", url);
        let response = self.http.get(url).send().await?;

        let status = response.status();
        if !status.is_success() {
            log::warn!("Download of {} failed with {}", url, status);
            return Err(AppError::UpstreamError(format!(
                "Document download returned {}",
                status
            )));
        }

        Ok(response.bytes().await?.to_vec())
    }
}
