use std::sync::Arc;

use crate::{
    auth::{IdentityProvider, SupabaseIdentityProvider},
    config::Config,
    errors::AppResult,
    repositories::{InMemorySessionRepository, SessionRepository},
    services::{
        auth_service::AuthService,
        cache::{DiskCache, ResponseCache},
        document_service::DocumentService,
        link_service::{DocumentFetcher, HttpDocumentFetcher},
        model_service::{CachedLanguageModel, LanguageModel, OpenAiModelService},
        quiz_generator::QuizGenerator,
        session_service::SessionService,
        token_window::{TiktokenTokenizer, TokenWindower, Tokenizer},
        transcription_service::{
            AudioFetcher, Transcriber, TranscriptionService, WhisperTranscriber, YtDlpAudioFetcher,
        },
    },
};

#[derive(Clone)]
pub struct AppState {
    pub document_service: Arc<DocumentService>,
    pub quiz_generator: QuizGenerator,
    pub session_service: Arc<SessionService>,
    pub auth_service: Arc<AuthService>,
    pub config: Arc<Config>,
}

/// The swappable edges of the application. Production wiring fills these
/// from [`Config`]; tests substitute in-memory fakes.
pub struct AppComponents {
    pub tokenizer: Arc<dyn Tokenizer>,
    pub model: Arc<dyn LanguageModel>,
    pub document_fetcher: Arc<dyn DocumentFetcher>,
    pub audio_fetcher: Arc<dyn AudioFetcher>,
    pub transcriber: Arc<dyn Transcriber>,
    pub cache: Arc<dyn ResponseCache>,
    pub sessions: Arc<dyn SessionRepository>,
    pub identity: Arc<dyn IdentityProvider>,
}

impl AppState {
    pub fn new(config: Config) -> AppResult<Self> {
        let cache: Arc<dyn ResponseCache> = Arc::new(DiskCache::new(config.cache_dir.clone()));

        let openai: Arc<dyn LanguageModel> = Arc::new(OpenAiModelService::new(&config));
        let model: Arc<dyn LanguageModel> = if config.llm_response_cache {
            log::info!("Caching model responses in {}", config.cache_dir.display());
            Arc::new(CachedLanguageModel::new(
                openai,
                cache.clone(),
                config.quiz_model.clone(),
            ))
        } else {
            openai
        };

        let components = AppComponents {
            tokenizer: Arc::new(TiktokenTokenizer::for_model(&config.tokenizer_model)?),
            model,
            document_fetcher: Arc::new(HttpDocumentFetcher::new()),
            audio_fetcher: Arc::new(YtDlpAudioFetcher::from_config(&config)),
            transcriber: Arc::new(WhisperTranscriber::new(&config)),
            cache,
            sessions: Arc::new(InMemorySessionRepository::new()),
            identity: Arc::new(SupabaseIdentityProvider::new(&config)),
        };

        Ok(Self::with_components(config, components))
    }

    pub fn with_components(config: Config, components: AppComponents) -> Self {
        let transcription = Arc::new(TranscriptionService::new(
            components.audio_fetcher,
            components.transcriber,
            components.cache,
            config.transcription_model.clone(),
        ));
        let document_service = Arc::new(DocumentService::new(
            TokenWindower::new(components.tokenizer, config.max_tokens),
            components.document_fetcher,
            transcription,
        ));

        let quiz_generator = QuizGenerator::new(components.model);
        let session_service = Arc::new(SessionService::new(
            components.sessions,
            quiz_generator.clone(),
        ));
        let auth_service = Arc::new(AuthService::new(components.identity));

        Self {
            document_service,
            quiz_generator,
            session_service,
            auth_service,
            config: Arc::new(config),
        }
    }
}
