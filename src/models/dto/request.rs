use serde::Deserialize;
use validator::Validate;

use crate::models::domain::QuizItem;

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct GenerateQuizRequest {
    #[validate(length(min = 1, message = "No passage provided to generate quiz from."))]
    pub passage: String,
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct ProcessLinkRequest {
    #[validate(url(message = "Link must be a valid URL"))]
    pub link: String,
}

/// Starts a session either from a passage (generated) or from existing items.
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CreateSessionRequest {
    #[validate(length(min = 1, message = "Passage must not be empty"))]
    pub passage: Option<String>,

    pub items: Option<Vec<QuizItem>>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SelectAnswerRequest {
    pub option_text: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct UpdateDraftRequest {
    pub items: Vec<QuizItem>,
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct RegisterUserRequest {
    #[validate(length(min = 3, max = 50))]
    pub username: String,

    #[validate(email(message = "Invalid email format"))]
    pub email: String,

    #[validate(length(min = 6, max = 128))]
    pub password: String,

    #[serde(rename = "userType")]
    #[validate(length(min = 1))]
    pub user_type: String,
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct LoginUserRequest {
    #[validate(email(message = "Invalid email format"))]
    pub email: String,

    #[validate(length(min = 1))]
    pub password: String,
}
