use std::{collections::HashSet, sync::Arc};

use futures::future::try_join_all;
use rand::{seq::SliceRandom, Rng};
use schemars::JsonSchema;
use serde::Deserialize;

use crate::{
    constants::prompts::{
        QUIZ_QUESTIONS_PROMPT, QUIZ_QUESTIONS_SCHEMA_NAME, SINGLE_MCQ_PROMPT,
        SINGLE_MCQ_SCHEMA_NAME,
    },
    errors::{AppError, AppResult},
    models::domain::{Quiz, QuizItem, QuizOption, OPTIONS_PER_ITEM},
    services::model_service::{predict, LanguageModel, StructuredPrompt},
};

/// Five question stems generated from a passage.
#[derive(Debug, Default, Deserialize, JsonSchema)]
pub struct QuizQuestions {
    /// Question, often between 5 and 15 words
    #[serde(default)]
    pub question_1: Option<String>,
    /// Question, often between 5 and 15 words
    #[serde(default)]
    pub question_2: Option<String>,
    /// Question, often between 5 and 15 words
    #[serde(default)]
    pub question_3: Option<String>,
    /// Question, often between 5 and 15 words
    #[serde(default)]
    pub question_4: Option<String>,
    /// Question, often between 5 and 15 words
    #[serde(default)]
    pub question_5: Option<String>,
}

impl QuizQuestions {
    /// Non-blank stems in field order.
    pub fn into_stems(self) -> Vec<String> {
        [
            self.question_1,
            self.question_2,
            self.question_3,
            self.question_4,
            self.question_5,
        ]
        .into_iter()
        .flatten()
        .map(|stem| stem.trim().to_string())
        .filter(|stem| !stem.is_empty())
        .collect()
    }
}

/// One correct answer and three distractors for a single stem.
#[derive(Debug, Clone, Deserialize, JsonSchema)]
pub struct SingleMcq {
    /// Correct answer, often between 1 and 10 words
    pub correct: String,
    /// Incorrect answer, often between 1 and 10 words
    pub incorrect_1: String,
    /// Incorrect answer, often between 1 and 10 words
    pub incorrect_2: String,
    /// Incorrect answer, often between 1 and 10 words
    pub incorrect_3: String,
}

impl SingleMcq {
    fn into_answers(self) -> AppResult<[String; OPTIONS_PER_ITEM]> {
        let answers = [
            self.correct,
            self.incorrect_1,
            self.incorrect_2,
            self.incorrect_3,
        ]
        .map(|answer| answer.trim().to_string());

        if answers.iter().any(|answer| answer.is_empty()) {
            return Err(AppError::UpstreamError(
                "Model returned a blank answer".to_string(),
            ));
        }
        let distinct: HashSet<&str> = answers.iter().map(String::as_str).collect();
        if distinct.len() != OPTIONS_PER_ITEM {
            return Err(AppError::UpstreamError(
                "Model returned duplicate answers".to_string(),
            ));
        }
        Ok(answers)
    }
}

/// Builds an item from generated answers. Ids are a random permutation of
/// 1..=4 assigned in (correct, incorrect_1, incorrect_2, incorrect_3) order,
/// then the options are shuffled again for display.
pub fn assemble_item<R: Rng + ?Sized>(
    question: String,
    answers: [String; OPTIONS_PER_ITEM],
    rng: &mut R,
) -> QuizItem {
    let mut ids: Vec<u8> = (1..=OPTIONS_PER_ITEM as u8).collect();
    ids.shuffle(rng);
    let correct_option = ids[0];

    let mut options: Vec<QuizOption> = ids
        .into_iter()
        .zip(answers)
        .map(|(id, text)| QuizOption { id, text })
        .collect();
    options.shuffle(rng);

    QuizItem {
        question,
        options,
        correct_option,
    }
}

#[derive(Clone)]
pub struct QuizGenerator {
    model: Arc<dyn LanguageModel>,
}

impl QuizGenerator {
    pub fn new(model: Arc<dyn LanguageModel>) -> Self {
        Self { model }
    }

    pub async fn generate(&self, passage: &str) -> AppResult<Quiz> {
        if passage.trim().is_empty() {
            return Err(AppError::ValidationError(
                "Passage must not be empty".to_string(),
            ));
        }

        let stems = self.generate_stems(passage).await?;
        if stems.is_empty() {
            log::warn!("Model returned no usable question stems");
            return Ok(Quiz::default());
        }
        if stems.len() < 5 {
            log::info!("Model returned {} of 5 question stems", stems.len());
        }

        let answer_sets =
            try_join_all(stems.iter().map(|stem| self.generate_answers(passage, stem))).await?;

        let mut rng = rand::thread_rng();
        let items = stems
            .into_iter()
            .zip(answer_sets)
            .map(|(stem, answers)| assemble_item(stem, answers, &mut rng))
            .collect();

        Ok(Quiz::new(items))
    }

    async fn generate_stems(&self, passage: &str) -> AppResult<Vec<String>> {
        let prompt = StructuredPrompt::for_output::<QuizQuestions>(
            QUIZ_QUESTIONS_SCHEMA_NAME,
            QUIZ_QUESTIONS_PROMPT,
            &[("Text", passage)],
        );
        let questions: QuizQuestions = predict(self.model.as_ref(), prompt).await?;
        Ok(questions.into_stems())
    }

    async fn generate_answers(
        &self,
        passage: &str,
        stem: &str,
    ) -> AppResult<[String; OPTIONS_PER_ITEM]> {
        let prompt = StructuredPrompt::for_output::<SingleMcq>(
            SINGLE_MCQ_SCHEMA_NAME,
            SINGLE_MCQ_PROMPT,
            &[("Document", passage), ("Question", stem)],
        );
        let mcq: SingleMcq = predict(self.model.as_ref(), prompt).await?;
        mcq.into_answers()
    }
}
