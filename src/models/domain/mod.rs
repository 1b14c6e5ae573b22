pub mod document;
pub mod quiz;
pub mod session;
pub mod user;
pub use document::{ExtractedDocument, LinkSource, PageRange, TokenWindow};
pub use quiz::{Quiz, QuizItem, QuizOption, OPTIONS_PER_ITEM};
pub use session::{Grade, QuestionResult, QuizMode, QuizSession, UserAnswerSet};
pub use user::{AuthSession, AuthUser, UserType};
