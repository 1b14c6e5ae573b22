use std::collections::BTreeSet;

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::errors::{AppError, AppResult};

pub const OPTIONS_PER_ITEM: usize = 4;

#[derive(Clone, Debug, PartialEq, Eq, Deserialize, Serialize, JsonSchema)]
pub struct QuizOption {
    pub id: u8,
    pub text: String,
}

/// One multiple-choice question. `options` is kept in display order.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize, Serialize, JsonSchema)]
#[serde(deny_unknown_fields)]
pub struct QuizItem {
    pub question: String,
    pub options: Vec<QuizOption>,
    pub correct_option: u8,
}

impl QuizItem {
    pub fn correct_text(&self) -> Option<&str> {
        self.options
            .iter()
            .find(|opt| opt.id == self.correct_option)
            .map(|opt| opt.text.as_str())
    }

    pub fn has_option_text(&self, text: &str) -> bool {
        self.options.iter().any(|opt| opt.text == text)
    }

    /// Checks the shape every item must keep: four distinct options whose
    /// ids are exactly 1..=4 and a correct id among them.
    pub fn validate(&self) -> AppResult<()> {
        if self.question.trim().is_empty() {
            return Err(AppError::ValidationError(
                "Question text must not be empty".to_string(),
            ));
        }

        if self.options.len() != OPTIONS_PER_ITEM {
            return Err(AppError::ValidationError(format!(
                "Expected {} options, found {}",
                OPTIONS_PER_ITEM,
                self.options.len()
            )));
        }

        let ids: BTreeSet<u8> = self.options.iter().map(|opt| opt.id).collect();
        let expected: BTreeSet<u8> = (1..=OPTIONS_PER_ITEM as u8).collect();
        if ids != expected {
            return Err(AppError::ValidationError(
                "Option ids must be exactly 1, 2, 3 and 4".to_string(),
            ));
        }

        if self.options.iter().any(|opt| opt.text.trim().is_empty()) {
            return Err(AppError::ValidationError(
                "Option text must not be empty".to_string(),
            ));
        }

        let texts: BTreeSet<&str> = self.options.iter().map(|opt| opt.text.trim()).collect();
        if texts.len() != OPTIONS_PER_ITEM {
            return Err(AppError::ValidationError(
                "Option texts must be distinct".to_string(),
            ));
        }

        if !ids.contains(&self.correct_option) {
            return Err(AppError::ValidationError(format!(
                "correct_option {} does not match any option id",
                self.correct_option
            )));
        }

        Ok(())
    }
}

/// An ordered list of quiz items. Replaced wholesale, never merged.
#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(transparent)]
pub struct Quiz {
    pub items: Vec<QuizItem>,
}

impl Quiz {
    pub fn new(items: Vec<QuizItem>) -> Self {
        Self { items }
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn validate(&self) -> AppResult<()> {
        for (index, item) in self.items.iter().enumerate() {
            item.validate().map_err(|e| match e {
                AppError::ValidationError(msg) => {
                    AppError::ValidationError(format!("Question {}: {}", index + 1, msg))
                }
                other => other,
            })?;
        }
        Ok(())
    }

    /// Pretty-printed JSON array in the `question, options, correct_option` shape.
    pub fn to_export_json(&self) -> AppResult<String> {
        Ok(serde_json::to_string_pretty(&self.items)?)
    }

    pub fn from_export_json(json: &str) -> AppResult<Self> {
        let items: Vec<QuizItem> = serde_json::from_str(json)
            .map_err(|e| AppError::ValidationError(format!("Invalid quiz JSON: {}", e)))?;
        let quiz = Quiz::new(items);
        quiz.validate()?;
        Ok(quiz)
    }

    pub fn demo() -> AppResult<Self> {
        Self::from_export_json(include_str!("../../../assets/demo_quiz.json"))
    }
}
