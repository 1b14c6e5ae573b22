use std::{collections::BTreeMap, fmt};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{
    errors::{AppError, AppResult},
    models::domain::quiz::{Quiz, QuizItem},
};

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum QuizMode {
    #[default]
    Preview,
    Edit,
}

impl fmt::Display for QuizMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            QuizMode::Preview => write!(f, "preview"),
            QuizMode::Edit => write!(f, "edit"),
        }
    }
}

/// Question index to the selected option text.
pub type UserAnswerSet = BTreeMap<usize, String>;

#[derive(Clone, Debug, PartialEq, Eq, Deserialize, Serialize)]
pub struct QuestionResult {
    pub index: usize,
    pub selected: Option<String>,
    pub correct_text: String,
    pub is_correct: bool,
}

#[derive(Clone, Debug, PartialEq, Eq, Deserialize, Serialize)]
pub struct Grade {
    pub correct: usize,
    pub total: usize,
    pub results: Vec<QuestionResult>,
}

impl fmt::Display for Grade {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} out of {}", self.correct, self.total)
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Deserialize, Serialize)]
pub struct QuizSession {
    pub id: Uuid,
    pub quiz: Quiz,
    pub answers: UserAnswerSet,
    pub mode: QuizMode,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub draft: Option<Vec<QuizItem>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl QuizSession {
    pub fn new(quiz: Quiz) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            quiz,
            answers: UserAnswerSet::new(),
            mode: QuizMode::Preview,
            draft: None,
            created_at: now,
            updated_at: now,
        }
    }

    fn require_mode(&self, mode: QuizMode, action: &str) -> AppResult<()> {
        if self.mode != mode {
            return Err(AppError::InvalidState(format!(
                "Cannot {} while the quiz is in {} mode",
                action, self.mode
            )));
        }
        Ok(())
    }

    fn touch(&mut self) {
        self.updated_at = Utc::now();
    }

    /// Records (or clears, with `None`) the selected option text for one question.
    pub fn select_answer(&mut self, index: usize, option_text: Option<String>) -> AppResult<()> {
        self.require_mode(QuizMode::Preview, "answer questions")?;

        let item = self.quiz.items.get(index).ok_or_else(|| {
            AppError::ValidationError(format!(
                "Question index {} is out of range for a quiz of {} questions",
                index,
                self.quiz.len()
            ))
        })?;

        match option_text {
            Some(text) => {
                if !item.has_option_text(&text) {
                    return Err(AppError::ValidationError(format!(
                        "'{}' is not an option of question {}",
                        text,
                        index + 1
                    )));
                }
                self.answers.insert(index, text);
            }
            None => {
                self.answers.remove(&index);
            }
        }
        self.touch();
        Ok(())
    }

    /// Swaps in a freshly generated quiz. Answers and any draft are dropped.
    pub fn replace_quiz(&mut self, quiz: Quiz) {
        self.quiz = quiz;
        self.answers.clear();
        self.mode = QuizMode::Preview;
        self.draft = None;
        self.touch();
    }

    pub fn enter_edit(&mut self) -> AppResult<()> {
        self.require_mode(QuizMode::Preview, "start editing")?;
        self.draft = Some(self.quiz.items.clone());
        self.mode = QuizMode::Edit;
        self.touch();
        Ok(())
    }

    pub fn update_draft(&mut self, items: Vec<QuizItem>) -> AppResult<()> {
        self.require_mode(QuizMode::Edit, "update the draft")?;
        if items.len() != self.quiz.len() {
            return Err(AppError::ValidationError(format!(
                "Draft has {} questions but the quiz has {}",
                items.len(),
                self.quiz.len()
            )));
        }
        Quiz::new(items.clone()).validate()?;
        self.draft = Some(items);
        self.touch();
        Ok(())
    }

    /// Writes the draft back into the quiz and returns to preview.
    pub fn save_edits(&mut self) -> AppResult<()> {
        self.require_mode(QuizMode::Edit, "save edits")?;
        if let Some(items) = self.draft.take() {
            self.quiz = Quiz::new(items);
            self.answers.clear();
        }
        self.mode = QuizMode::Preview;
        self.touch();
        Ok(())
    }

    pub fn cancel_edits(&mut self) -> AppResult<()> {
        self.require_mode(QuizMode::Edit, "cancel edits")?;
        self.draft = None;
        self.mode = QuizMode::Preview;
        self.touch();
        Ok(())
    }

    pub fn grade(&self) -> AppResult<Grade> {
        self.require_mode(QuizMode::Preview, "grade the quiz")?;

        let results: Vec<QuestionResult> = self
            .quiz
            .items
            .iter()
            .enumerate()
            .map(|(index, item)| {
                let selected = self.answers.get(&index).cloned();
                let correct_text = item.correct_text().unwrap_or_default().to_string();
                let is_correct = selected.as_deref() == Some(correct_text.as_str());
                QuestionResult {
                    index,
                    selected,
                    correct_text,
                    is_correct,
                }
            })
            .collect();

        Ok(Grade {
            correct: results.iter().filter(|r| r.is_correct).count(),
            total: self.quiz.len(),
            results,
        })
    }

    pub fn export(&self) -> AppResult<String> {
        self.require_mode(QuizMode::Preview, "export the quiz")?;
        self.quiz.to_export_json()
    }
}
