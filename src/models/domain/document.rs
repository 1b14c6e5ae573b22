use serde::{Deserialize, Serialize};

/// Text pulled out of a source document, with the cumulative byte length of
/// the text after each page.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ExtractedDocument {
    pub text: String,
    pub page_lengths: Vec<usize>,
}

impl ExtractedDocument {
    pub fn from_pages<I, S>(pages: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut text = String::new();
        let mut page_lengths = Vec::new();
        for page in pages {
            text.push_str(page.as_ref());
            page_lengths.push(text.len());
        }
        Self { text, page_lengths }
    }

    /// A document without page structure, such as a transcript.
    pub fn single_page(text: impl Into<String>) -> Self {
        let text = text.into();
        let page_lengths = vec![text.len()];
        Self { text, page_lengths }
    }

    pub fn total_pages(&self) -> usize {
        self.page_lengths.len().max(1)
    }

    pub fn is_blank(&self) -> bool {
        self.text.trim().is_empty()
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageRange {
    pub start: usize,
    pub end: usize,
}

/// The part of a document forwarded to the model.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TokenWindow {
    pub full_text: String,
    pub total_tokens: usize,
    pub window_text: String,
    pub pages: PageRange,
    pub total_pages: usize,
    /// Index of the first windowed token; `None` when the whole text fit.
    pub sample_start: Option<usize>,
}

impl TokenWindow {
    pub fn is_truncated(&self) -> bool {
        self.sample_start.is_some()
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum LinkSource {
    Arxiv { id: String, pdf_url: String },
    #[serde(rename = "youtube")]
    YouTube { video_id: String, embed_url: String },
}

impl LinkSource {
    pub fn kind(&self) -> &'static str {
        match self {
            LinkSource::Arxiv { .. } => "arxiv",
            LinkSource::YouTube { .. } => "youtube",
        }
    }

    /// The URL a client can show alongside the quiz.
    pub fn source_url(&self) -> &str {
        match self {
            LinkSource::Arxiv { pdf_url, .. } => pdf_url,
            LinkSource::YouTube { embed_url, .. } => embed_url,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn from_pages_records_cumulative_lengths() {
        let doc = ExtractedDocument::from_pages(["abc", "de", "", "fghi"]);

        assert_eq!(doc.text, "abcdefghi");
        assert_eq!(doc.page_lengths, vec![3, 5, 5, 9]);
        assert_eq!(doc.total_pages(), 4);
    }

    #[test]
    fn single_page_document_reports_one_page() {
        let doc = ExtractedDocument::single_page("transcript text");
        assert_eq!(doc.total_pages(), 1);
        assert_eq!(doc.page_lengths, vec![15]);
    }

    #[test]
    fn blank_document_detected() {
        assert!(ExtractedDocument::from_pages([" \n", "\t"]).is_blank());
        assert!(!ExtractedDocument::single_page("x").is_blank());
    }

    #[test]
    fn link_source_reports_kind_and_url() {
        let arxiv = LinkSource::Arxiv {
            id: "1234.5678".to_string(),
            pdf_url: "https://arxiv.org/pdf/1234.5678.pdf".to_string(),
        };
        assert_eq!(arxiv.kind(), "arxiv");
        assert_eq!(arxiv.source_url(), "https://arxiv.org/pdf/1234.5678.pdf");

        let video = LinkSource::YouTube {
            video_id: "dQw4w9WgXcQ".to_string(),
            embed_url: "https://www.youtube.com/embed/dQw4w9WgXcQ".to_string(),
        };
        assert_eq!(video.kind(), "youtube");
    }
}
