use std::sync::Arc;

use uuid::Uuid;

use crate::{
    errors::{AppError, AppResult},
    models::domain::{Grade, Quiz, QuizItem, QuizSession},
    repositories::SessionRepository,
    services::quiz_generator::QuizGenerator,
};

pub struct SessionService {
    repository: Arc<dyn SessionRepository>,
    generator: QuizGenerator,
}

impl SessionService {
    pub fn new(repository: Arc<dyn SessionRepository>, generator: QuizGenerator) -> Self {
        Self {
            repository,
            generator,
        }
    }

    pub async fn get_session(&self, id: &Uuid) -> AppResult<QuizSession> {
        self.repository
            .find_by_id(id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Session with id '{}' not found", id)))
    }

    pub async fn create_from_passage(&self, passage: &str) -> AppResult<QuizSession> {
        let quiz = self.generator.generate(passage).await?;
        self.start(quiz).await
    }

    pub async fn create_from_items(&self, items: Vec<QuizItem>) -> AppResult<QuizSession> {
        let quiz = Quiz::new(items);
        quiz.validate()?;
        self.start(quiz).await
    }

    pub async fn import(&self, exported: &str) -> AppResult<QuizSession> {
        let quiz = Quiz::from_export_json(exported)?;
        self.start(quiz).await
    }

    pub async fn create_demo(&self) -> AppResult<QuizSession> {
        self.start(Quiz::demo()?).await
    }

    async fn start(&self, quiz: Quiz) -> AppResult<QuizSession> {
        let session = self.repository.create(QuizSession::new(quiz)).await?;
        log::info!(
            "Started session {} with {} questions",
            session.id,
            session.quiz.len()
        );
        Ok(session)
    }

    /// Loads a session, applies `change` and stores the result. Nothing is
    /// written when `change` fails.
    async fn modify<F>(&self, id: &Uuid, change: F) -> AppResult<QuizSession>
    where
        F: FnOnce(&mut QuizSession) -> AppResult<()>,
    {
        let mut session = self.get_session(id).await?;
        change(&mut session)?;
        self.repository.update(session).await
    }

    pub async fn select_answer(
        &self,
        id: &Uuid,
        index: usize,
        option_text: Option<String>,
    ) -> AppResult<QuizSession> {
        self.modify(id, |session| session.select_answer(index, option_text))
            .await
    }

    pub async fn enter_edit(&self, id: &Uuid) -> AppResult<QuizSession> {
        self.modify(id, QuizSession::enter_edit).await
    }

    pub async fn update_draft(&self, id: &Uuid, items: Vec<QuizItem>) -> AppResult<QuizSession> {
        self.modify(id, |session| session.update_draft(items)).await
    }

    pub async fn save_edits(&self, id: &Uuid) -> AppResult<QuizSession> {
        self.modify(id, QuizSession::save_edits).await
    }

    pub async fn cancel_edits(&self, id: &Uuid) -> AppResult<QuizSession> {
        self.modify(id, QuizSession::cancel_edits).await
    }

    /// Generates a new quiz for an existing session. The previous quiz is kept
    /// if generation fails.
    pub async fn regenerate(&self, id: &Uuid, passage: &str) -> AppResult<QuizSession> {
        self.get_session(id).await?;
        let quiz = self.generator.generate(passage).await?;
        self.modify(id, |session| {
            session.replace_quiz(quiz);
            Ok(())
        })
        .await
    }

    pub async fn grade(&self, id: &Uuid) -> AppResult<Grade> {
        let grade = self.get_session(id).await?.grade()?;
        log::debug!("Session {} graded {}", id, grade);
        Ok(grade)
    }

    pub async fn export(&self, id: &Uuid) -> AppResult<String> {
        self.get_session(id).await?.export()
    }

    pub async fn delete_session(&self, id: &Uuid) -> AppResult<()> {
        self.repository.delete(id).await
    }

    pub async fn session_count(&self) -> AppResult<usize> {
        self.repository.count().await
    }
}
