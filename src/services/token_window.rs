use std::sync::Arc;

use tiktoken_rs::CoreBPE;

use crate::{
    errors::{AppError, AppResult},
    models::domain::{ExtractedDocument, PageRange, TokenWindow},
};

/// Every special token tiktoken defines. Which of them an encoding actually
/// reserves is checked against the loaded BPE.
const KNOWN_SPECIAL_TOKENS: [&str; 5] = [
    tiktoken_rs::ENDOFTEXT,
    tiktoken_rs::FIM_PREFIX,
    tiktoken_rs::FIM_MIDDLE,
    tiktoken_rs::FIM_SUFFIX,
    tiktoken_rs::ENDOFPROMPT,
];

/// Tokens dropped per edge, at most, when a window slice splits a multi-byte
/// character.
const MAX_EDGE_TRIM: usize = 3;

pub trait Tokenizer: Send + Sync {
    fn encode(&self, text: &str) -> AppResult<Vec<usize>>;
    fn decode(&self, tokens: &[usize]) -> AppResult<String>;
}

pub struct TiktokenTokenizer {
    bpe: CoreBPE,
    disallowed_special: Vec<&'static str>,
}

impl TiktokenTokenizer {
    pub fn for_model(model: &str) -> AppResult<Self> {
        let bpe = tiktoken_rs::get_bpe_from_model(model).map_err(|e| {
            AppError::InternalError(format!("Failed to load tokenizer for '{}': {}", model, e))
        })?;

        // The encoding's special tokens, except `<|endoftext|>` which is
        // encoded as plain text.
        let disallowed_special = KNOWN_SPECIAL_TOKENS
            .into_iter()
            .filter(|token| *token != tiktoken_rs::ENDOFTEXT)
            .filter(|token| bpe.encode_with_special_tokens(token).len() == 1)
            .collect();

        Ok(Self {
            bpe,
            disallowed_special,
        })
    }
}

impl Tokenizer for TiktokenTokenizer {
    fn encode(&self, text: &str) -> AppResult<Vec<usize>> {
        if let Some(token) = self
            .disallowed_special
            .iter()
            .find(|token| text.contains(**token))
        {
            return Err(AppError::ValidationError(format!(
                "Text contains the disallowed special token {}",
                token
            )));
        }
        Ok(self.bpe.encode_ordinary(text))
    }

    fn decode(&self, tokens: &[usize]) -> AppResult<String> {
        self.bpe
            .decode(tokens.to_vec())
            .map_err(|e| AppError::InternalError(format!("Failed to decode tokens: {}", e)))
    }
}

/// Picks the slice of a document that fits the model's token budget.
#[derive(Clone)]
pub struct TokenWindower {
    tokenizer: Arc<dyn Tokenizer>,
    max_tokens: usize,
}

impl TokenWindower {
    pub fn new(tokenizer: Arc<dyn Tokenizer>, max_tokens: usize) -> Self {
        Self {
            tokenizer,
            max_tokens,
        }
    }

    pub fn max_tokens(&self) -> usize {
        self.max_tokens
    }

    pub fn window(&self, document: ExtractedDocument) -> AppResult<TokenWindow> {
        let tokens = self.tokenizer.encode(&document.text)?;
        let total_tokens = tokens.len();
        let total_pages = document.total_pages();

        if total_tokens <= self.max_tokens {
            return Ok(TokenWindow {
                window_text: document.text.clone(),
                full_text: document.text,
                total_tokens,
                pages: PageRange {
                    start: 1,
                    end: total_pages,
                },
                total_pages,
                sample_start: None,
            });
        }

        // Fixed offset keeps repeated runs on the same document cacheable.
        let sample_start = total_tokens / 3;
        let sample_end = (sample_start + self.max_tokens).min(total_tokens);
        let window_text = self.decode_span(&tokens, sample_start, sample_end)?;
        let pages = locate_pages(&document, &window_text);

        log::debug!(
            "Windowed {} of {} tokens starting at {} (pages {}-{})",
            sample_end - sample_start,
            total_tokens,
            sample_start,
            pages.start,
            pages.end
        );

        Ok(TokenWindow {
            full_text: document.text,
            total_tokens,
            window_text,
            pages,
            total_pages,
            sample_start: Some(sample_start),
        })
    }

    fn decode_span(&self, tokens: &[usize], start: usize, end: usize) -> AppResult<String> {
        let mut last_err = None;
        for trim in 0..=(2 * MAX_EDGE_TRIM) {
            for front in trim.saturating_sub(MAX_EDGE_TRIM)..=trim.min(MAX_EDGE_TRIM) {
                let back = trim - front;
                if start + front >= end.saturating_sub(back) {
                    continue;
                }
                match self.tokenizer.decode(&tokens[start + front..end - back]) {
                    Ok(text) => {
                        if trim > 0 {
                            log::warn!(
                                "Dropped {} edge tokens to decode window at {}",
                                trim,
                                start
                            );
                        }
                        return Ok(text);
                    }
                    Err(e) => last_err = Some(e),
                }
            }
        }
        Err(last_err.unwrap_or_else(|| {
            AppError::InternalError("Token window is empty".to_string())
        }))
    }
}

/// Maps the window back to 1-based page numbers through the cumulative page
/// length table. A window that cannot be found verbatim reports every page.
pub fn locate_pages(document: &ExtractedDocument, window_text: &str) -> PageRange {
    let last_page = document.total_pages();
    let Some(skip_length) = document.text.find(window_text) else {
        log::warn!("Window text not found in source; reporting full page range");
        return PageRange {
            start: 1,
            end: last_page,
        };
    };

    let first_page_past = |offset: usize| {
        document
            .page_lengths
            .iter()
            .position(|&length| length > offset)
            .map(|i| i + 1)
            .unwrap_or(last_page)
    };

    PageRange {
        start: first_page_past(skip_length),
        end: first_page_past(skip_length + window_text.len()),
    }
}
