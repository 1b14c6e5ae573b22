use std::{env, path::PathBuf};
use secrecy::SecretString;

pub const DEFAULT_MAX_TOKENS: usize = 3000;

#[derive(Clone, Debug)]
pub struct Config {
    pub web_server_host: String,
    pub web_server_port: u16,
    pub cors_allowed_origin: String,
    pub openai_api_key: SecretString,
    pub openai_api_base: String,
    pub quiz_model: String,
    pub tokenizer_model: String,
    pub max_tokens: usize,
    pub transcription_model: String,
    pub transcript_sample_seconds: u32,
    pub yt_dlp_bin: String,
    pub audio_dir: PathBuf,
    pub cache_dir: PathBuf,
    pub llm_response_cache: bool,
    pub max_upload_mb: usize,
    pub supabase_api_url: String,
    pub supabase_api_key: SecretString,
}

impl Config {
    pub fn from_env() -> Self {
        Self {
            web_server_host: env::var("WEB_SERVER_HOST")
                .unwrap_or_else(|_| "localhost".to_string()),
            web_server_port: env::var("WEB_SERVER_PORT")
                .ok()
                .and_then(|p| p.parse().ok())
                .unwrap_or(8080),
            cors_allowed_origin: env::var("CORS_ALLOWED_ORIGIN")
                .unwrap_or_else(|_| "http://localhost:5173".to_string()),
            openai_api_key: SecretString::from(env::var("OPENAI_API_KEY")
                .unwrap_or_else(|_| "openai_api_key".to_string())),
            openai_api_base: env::var("OPENAI_API_BASE")
                .unwrap_or_else(|_| "https://api.openai.com/v1".to_string()),
            quiz_model: env::var("QUIZ_MODEL").unwrap_or_else(|_| "gpt-4o-mini".to_string()),
            tokenizer_model: env::var("TOKENIZER_MODEL")
                .unwrap_or_else(|_| "gpt-3.5-turbo".to_string()),
            max_tokens: env::var("MAX_TOKENS")
                .ok()
                .and_then(|t| t.parse().ok())
                .unwrap_or(DEFAULT_MAX_TOKENS),
            transcription_model: env::var("TRANSCRIPTION_MODEL")
                .unwrap_or_else(|_| "whisper-1".to_string()),
            transcript_sample_seconds: env::var("TRANSCRIPT_SAMPLE_SECONDS")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(6 * 60),
            yt_dlp_bin: env::var("YT_DLP_BIN").unwrap_or_else(|_| "yt-dlp".to_string()),
            audio_dir: env::var("AUDIO_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(|_| PathBuf::from(".audio")),
            cache_dir: env::var("CACHE_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(|_| PathBuf::from(".cache")),
            llm_response_cache: env::var("LLM_RESPONSE_CACHE")
                .map(|v| matches!(v.to_ascii_lowercase().as_str(), "1" | "true" | "yes"))
                .unwrap_or(false),
            max_upload_mb: env::var("MAX_UPLOAD_MB")
                .ok()
                .and_then(|m| m.parse().ok())
                .unwrap_or(50),
            supabase_api_url: env::var("SUPABASE_API_URL")
                .unwrap_or_else(|_| "http://localhost:54321".to_string()),
            supabase_api_key: SecretString::from(env::var("SUPABASE_API_KEY")
                .unwrap_or_else(|_| "supabase_api_key".to_string())),
        }
    }

    pub fn max_upload_bytes(&self) -> usize {
        self.max_upload_mb * 1024 * 1024
    }

    /// Validate that production-critical configuration is set
    /// Panics if required secrets are using default values
    pub fn validate_for_production(&self) {
        use secrecy::ExposeSecret;

        if self.openai_api_key.expose_secret() == "openai_api_key" {
            panic!(
                "FATAL: OPENAI_API_KEY is using default value! Set OPENAI_API_KEY environment variable."
            );
        }

        if self.supabase_api_key.expose_secret() == "supabase_api_key" {
            panic!(
                "FATAL: SUPABASE_API_KEY is using default value! Set SUPABASE_API_KEY environment variable."
            );
        }

        if self.max_tokens == 0 {
            panic!("FATAL: MAX_TOKENS must be greater than zero.");
        }
    }

    #[cfg(test)]
    pub fn test_config() -> Self {
        Self {
            web_server_host: "127.0.0.1".to_string(),
            web_server_port: 8080,
            cors_allowed_origin: "http://localhost:5173".to_string(),
            openai_api_key: SecretString::from("test_openai_key".to_string()),
            openai_api_base: "http://127.0.0.1:9/v1".to_string(),
            quiz_model: "gpt-4o-mini".to_string(),
            tokenizer_model: "gpt-3.5-turbo".to_string(),
            max_tokens: DEFAULT_MAX_TOKENS,
            transcription_model: "whisper-1".to_string(),
            transcript_sample_seconds: 360,
            yt_dlp_bin: "yt-dlp".to_string(),
            audio_dir: PathBuf::from(".audio-test"),
            cache_dir: PathBuf::from(".cache-test"),
            llm_response_cache: false,
            max_upload_mb: 1,
            supabase_api_url: "http://127.0.0.1:9".to_string(),
            supabase_api_key: SecretString::from("test_supabase_key".to_string()),
        }
    }
}
