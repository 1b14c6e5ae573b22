use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

use crate::models::domain::{
    session::UserAnswerSet, AuthSession, AuthUser, LinkSource, PageRange, QuizItem, QuizMode,
    QuizSession, TokenWindow,
};

#[derive(Debug, Clone, Serialize)]
pub struct ProcessPdfResponse {
    pub total_pages: usize,
    pub processed_pages: PageRange,
    pub text: String,
    pub max_tokens: usize,
    pub total_tokens: usize,
}

impl ProcessPdfResponse {
    pub fn new(window: TokenWindow, max_tokens: usize) -> Self {
        Self {
            total_pages: window.total_pages,
            processed_pages: window.pages,
            text: window.window_text,
            max_tokens,
            total_tokens: window.total_tokens,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ProcessLinkResponse {
    pub text: String,
    pub max_tokens: usize,
    pub total_tokens: usize,
    pub source: &'static str,
    pub source_url: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub total_pages: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub processed_pages: Option<PageRange>,
}

impl ProcessLinkResponse {
    pub fn new(source: &LinkSource, window: TokenWindow, max_tokens: usize) -> Self {
        let paged = matches!(source, LinkSource::Arxiv { .. });
        Self {
            source: source.kind(),
            source_url: source.source_url().to_string(),
            total_pages: paged.then_some(window.total_pages),
            processed_pages: paged.then_some(window.pages),
            text: window.window_text,
            max_tokens,
            total_tokens: window.total_tokens,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct SessionDto {
    pub id: Uuid,
    pub mode: QuizMode,
    pub items: Vec<QuizItem>,
    pub answers: UserAnswerSet,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub draft: Option<Vec<QuizItem>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<QuizSession> for SessionDto {
    fn from(session: QuizSession) -> Self {
        SessionDto {
            id: session.id,
            mode: session.mode,
            items: session.quiz.items,
            answers: session.answers,
            draft: session.draft,
            created_at: session.created_at,
            updated_at: session.updated_at,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct GradeDto {
    pub correct: usize,
    pub total: usize,
    pub summary: String,
    pub results: Vec<crate::models::domain::session::QuestionResult>,
}

impl From<crate::models::domain::Grade> for GradeDto {
    fn from(grade: crate::models::domain::Grade) -> Self {
        GradeDto {
            summary: grade.to_string(),
            correct: grade.correct,
            total: grade.total,
            results: grade.results,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct UserResponse {
    pub user: Option<AuthUser>,
}

#[derive(Debug, Clone, Serialize)]
pub struct LoginResponse {
    pub user: AuthUser,
    pub session: AuthSession,
}
