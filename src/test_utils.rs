pub mod fixtures {
    use lopdf::{
        content::{Content, Operation},
        dictionary, Document, Object, Stream,
    };

    use crate::models::domain::{Quiz, QuizItem, QuizOption};

    /// An item whose option `n` reads "`question` option n". Options are
    /// listed in a fixed non-sorted display order.
    pub fn sample_item(question: &str, correct: u8) -> QuizItem {
        QuizItem {
            question: question.to_string(),
            options: [3u8, 1, 4, 2]
                .into_iter()
                .map(|id| QuizOption {
                    id,
                    text: format!("{} option {}", question, id),
                })
                .collect(),
            correct_option: correct,
        }
    }

    pub fn sample_quiz() -> Quiz {
        Quiz::new(vec![
            sample_item("What is the powerhouse of the cell?", 2),
            sample_item("Which gas do plants absorb?", 4),
            sample_item("Where does photosynthesis happen?", 1),
        ])
    }

    /// A minimal PDF with one text line per page.
    pub fn pdf_with_pages(pages: &[&str]) -> Vec<u8> {
        let mut doc = Document::with_version("1.5");
        let pages_id = doc.new_object_id();

        let font_id = doc.add_object(dictionary! {
            "Type" => "Font",
            "Subtype" => "Type1",
            "BaseFont" => "Courier",
            "Encoding" => "WinAnsiEncoding",
        });
        let resources_id = doc.add_object(dictionary! {
            "Font" => dictionary! {
                "F1" => font_id,
            },
        });

        let mut kids: Vec<Object> = Vec::new();
        for text in pages {
            let content = Content {
                operations: vec![
                    Operation::new("BT", vec![]),
                    Operation::new("Tf", vec!["F1".into(), 12.into()]),
                    Operation::new("Td", vec![72.into(), 720.into()]),
                    Operation::new("Tj", vec![Object::string_literal(*text)]),
                    Operation::new("ET", vec![]),
                ],
            };
            let content_id = doc.add_object(Stream::new(
                dictionary! {},
                content.encode().expect("content should encode"),
            ));
            let page_id = doc.add_object(dictionary! {
                "Type" => "Page",
                "Parent" => pages_id,
                "Contents" => content_id,
                "Resources" => resources_id,
            });
            kids.push(page_id.into());
        }

        let count = kids.len() as i64;
        doc.objects.insert(
            pages_id,
            Object::Dictionary(dictionary! {
                "Type" => "Pages",
                "Kids" => kids,
                "Count" => count,
                "Resources" => resources_id,
                "MediaBox" => vec![0.into(), 0.into(), 595.into(), 842.into()],
            }),
        );
        let catalog_id = doc.add_object(dictionary! {
            "Type" => "Catalog",
            "Pages" => pages_id,
        });
        doc.trailer.set("Root", catalog_id);

        let mut bytes = Vec::new();
        doc.save_to(&mut bytes).expect("pdf should serialize");
        bytes
    }
}

pub mod fakes {
    use std::{
        collections::{HashMap, HashSet},
        sync::atomic::{AtomicUsize, Ordering},
    };

    use async_trait::async_trait;
    use serde_json::json;
    use tokio::sync::RwLock;

    use crate::{
        auth::{IdentityProvider, NewUser},
        constants::prompts::QUIZ_QUESTIONS_SCHEMA_NAME,
        errors::{AppError, AppResult, AuthError},
        models::domain::{AuthSession, AuthUser},
        services::{
            model_service::{LanguageModel, StructuredPrompt},
            token_window::Tokenizer,
        },
    };

    struct StoredUser {
        user: AuthUser,
        password: String,
    }

    /// Identity provider backed by maps. New users start unconfirmed.
    #[derive(Default)]
    pub struct InMemoryIdentityProvider {
        users: RwLock<HashMap<String, StoredUser>>,
        tokens: RwLock<HashMap<String, String>>,
        expired: RwLock<HashSet<String>>,
    }

    impl InMemoryIdentityProvider {
        pub fn new() -> Self {
            Self::default()
        }

        pub async fn confirm(&self, email: &str) {
            if let Some(stored) = self.users.write().await.get_mut(email) {
                stored.user.email_verified = true;
            }
        }

        pub async fn expire(&self, token: &str) {
            self.expired.write().await.insert(token.to_string());
        }
    }

    #[async_trait]
    impl IdentityProvider for InMemoryIdentityProvider {
        async fn sign_up(&self, user: NewUser<'_>) -> AppResult<AuthUser> {
            let mut users = self.users.write().await;
            if users.contains_key(user.email) {
                return Err(AuthError::Provider("User already registered".to_string()).into());
            }
            let created = AuthUser {
                id: format!("user-{}", users.len() + 1),
                email: Some(user.email.to_string()),
                username: Some(user.username.to_string()),
                user_type: Some(user.user_type.as_str().to_string()),
                email_verified: false,
                created_at: Some(chrono::Utc::now().to_rfc3339()),
            };
            users.insert(
                user.email.to_string(),
                StoredUser {
                    user: created.clone(),
                    password: user.password.to_string(),
                },
            );
            Ok(created)
        }

        async fn sign_in(&self, email: &str, password: &str) -> AppResult<(AuthUser, AuthSession)> {
            let users = self.users.read().await;
            let stored = users
                .get(email)
                .filter(|stored| stored.password == password)
                .ok_or_else(|| AuthError::Provider("Invalid login credentials".to_string()))?;
            if !stored.user.email_verified {
                return Err(AuthError::EmailNotConfirmed.into());
            }

            let access_token = format!("token-{}", uuid::Uuid::new_v4());
            self.tokens
                .write()
                .await
                .insert(access_token.clone(), email.to_string());
            Ok((
                stored.user.clone(),
                AuthSession {
                    access_token,
                    refresh_token: "refresh".to_string(),
                    expires_at: Some(chrono::Utc::now().timestamp() + 3600),
                },
            ))
        }

        async fn current_user(&self, access_token: &str) -> AppResult<AuthUser> {
            if self.expired.read().await.contains(access_token) {
                return Err(AuthError::TokenExpired.into());
            }
            let tokens = self.tokens.read().await;
            let email = tokens
                .get(access_token)
                .ok_or_else(|| AuthError::Provider("invalid JWT".to_string()))?;
            self.users
                .read()
                .await
                .get(email)
                .map(|stored| stored.user.clone())
                .ok_or_else(|| AuthError::Provider("User not found".to_string()).into())
        }

        async fn sign_out(&self, access_token: &str) -> AppResult<()> {
            self.tokens.write().await.remove(access_token);
            Ok(())
        }
    }

    /// One token per ASCII character, so token offsets equal byte offsets.
    pub struct CharTokenizer;

    impl Tokenizer for CharTokenizer {
        fn encode(&self, text: &str) -> AppResult<Vec<usize>> {
            Ok(text.chars().map(|c| c as usize).collect())
        }

        fn decode(&self, tokens: &[usize]) -> AppResult<String> {
            tokens
                .iter()
                .map(|&t| {
                    u32::try_from(t)
                        .ok()
                        .and_then(char::from_u32)
                        .ok_or_else(|| AppError::InternalError(format!("bad token {}", t)))
                })
                .collect()
        }
    }

    /// Answers the stems prompt with five questions and every answers prompt
    /// with options derived from the question it was given.
    #[derive(Default)]
    pub struct ScriptedLanguageModel {
        calls: AtomicUsize,
    }

    impl ScriptedLanguageModel {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl LanguageModel for ScriptedLanguageModel {
        async fn complete_json(&self, prompt: StructuredPrompt) -> AppResult<String> {
            self.calls.fetch_add(1, Ordering::SeqCst);

            if prompt.name == QUIZ_QUESTIONS_SCHEMA_NAME {
                return Ok(json!({
                    "question_1": "What does the passage describe first?",
                    "question_2": "Which process is mentioned second?",
                    "question_3": "Who is credited with the discovery?",
                    "question_4": "When did the event take place?",
                    "question_5": "Why does the author mention energy?",
                })
                .to_string());
            }

            let stem = prompt.input.rsplit("Question:\n").next().unwrap_or_default();
            Ok(json!({
                "correct": format!("Right answer to {}", stem),
                "incorrect_1": format!("First distractor for {}", stem),
                "incorrect_2": format!("Second distractor for {}", stem),
                "incorrect_3": format!("Third distractor for {}", stem),
            })
            .to_string())
        }
    }
}

pub mod stubs {
    use std::path::{Path, PathBuf};

    use async_trait::async_trait;

    use crate::{
        errors::AppResult,
        services::{
            link_service::DocumentFetcher,
            transcription_service::{AudioFetcher, Transcriber},
        },
    };

    use super::fixtures::pdf_with_pages;

    /// Serves the same small paper for every download.
    pub struct StubDocumentFetcher;

    #[async_trait]
    impl DocumentFetcher for StubDocumentFetcher {
        async fn fetch_pdf(&self, _url: &str) -> AppResult<Vec<u8>> {
            Ok(pdf_with_pages(&[
                "Abstract. We study quantum fields.",
                "Results. The fields are curved.",
            ]))
        }
    }

    pub struct StubAudioFetcher;

    #[async_trait]
    impl AudioFetcher for StubAudioFetcher {
        async fn fetch_audio(&self, video_id: &str) -> AppResult<PathBuf> {
            Ok(PathBuf::from(format!("{}.m4a", video_id)))
        }
    }

    /// Transcript text names the audio file it came from.
    pub struct StubTranscriber;

    #[async_trait]
    impl Transcriber for StubTranscriber {
        async fn transcribe(&self, audio: &Path) -> AppResult<String> {
            Ok(format!("Lecture recorded in {}", audio.display()))
        }
    }
}

/// Application state wired entirely with in-memory fakes.
pub fn test_state() -> crate::app_state::AppState {
    test_state_with_identity(std::sync::Arc::new(fakes::InMemoryIdentityProvider::new()))
}

pub fn test_state_with_identity(
    identity: std::sync::Arc<fakes::InMemoryIdentityProvider>,
) -> crate::app_state::AppState {
    use std::sync::Arc;

    use crate::{
        app_state::{AppComponents, AppState},
        config::Config,
        repositories::InMemorySessionRepository,
        services::cache::InMemoryCache,
    };

    AppState::with_components(
        Config::test_config(),
        AppComponents {
            tokenizer: Arc::new(fakes::CharTokenizer),
            model: Arc::new(fakes::ScriptedLanguageModel::new()),
            document_fetcher: Arc::new(stubs::StubDocumentFetcher),
            audio_fetcher: Arc::new(stubs::StubAudioFetcher),
            transcriber: Arc::new(stubs::StubTranscriber),
            cache: Arc::new(InMemoryCache::new()),
            sessions: Arc::new(InMemorySessionRepository::new()),
            identity,
        },
    )
}

pub mod test_helpers {
    use actix_web::http::StatusCode;

    /// Asserts that a status code represents an error (4xx or 5xx)
    pub fn assert_error_status(status: StatusCode) {
        assert!(
            status.is_client_error() || status.is_server_error(),
            "Expected error status, got: {}",
            status
        );
    }

    /// Asserts that a status code represents success (2xx)
    pub fn assert_success_status(status: StatusCode) {
        assert!(
            status.is_success(),
            "Expected success status, got: {}",
            status
        );
    }
}

#[cfg(test)]
mod tests {
    use super::{fakes::*, fixtures::*};
    use crate::services::token_window::Tokenizer;

    #[test]
    fn sample_quiz_is_valid() {
        let quiz = sample_quiz();
        assert_eq!(quiz.len(), 3);
        assert!(quiz.validate().is_ok());
    }

    #[test]
    fn sample_item_marks_requested_option_correct() {
        let item = sample_item("Q", 4);
        assert_eq!(item.correct_text(), Some("Q option 4"));
    }

    #[test]
    fn char_tokenizer_round_trips() {
        let tokens = CharTokenizer.encode("abc").unwrap();
        assert_eq!(tokens, vec![97, 98, 99]);
        assert_eq!(CharTokenizer.decode(&tokens).unwrap(), "abc");
    }

    #[test]
    fn generated_pdf_has_header() {
        assert!(pdf_with_pages(&["x"]).starts_with(b"%PDF"));
    }
}
