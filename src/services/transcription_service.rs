use std::{
    path::{Path, PathBuf},
    sync::Arc,
};

use async_trait::async_trait;
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use tokio::process::Command;

use crate::{
    config::Config,
    errors::{AppError, AppResult},
    services::cache::ResponseCache,
};

const AUDIO_EXTENSION: &str = "m4a";

/// Produces a local audio file for a YouTube video.
#[async_trait]
pub trait AudioFetcher: Send + Sync {
    async fn fetch_audio(&self, video_id: &str) -> AppResult<PathBuf>;
}

/// Converts an audio file into plain text.
#[async_trait]
pub trait Transcriber: Send + Sync {
    async fn transcribe(&self, audio: &Path) -> AppResult<String>;
}

/// Downloads the leading sample of a video's best m4a audio stream with
/// `yt-dlp`.
pub struct YtDlpAudioFetcher {
    bin: String,
    audio_dir: PathBuf,
    sample_seconds: u32,
}

impl YtDlpAudioFetcher {
    pub fn new(bin: impl Into<String>, audio_dir: impl Into<PathBuf>, sample_seconds: u32) -> Self {
        Self {
            bin: bin.into(),
            audio_dir: audio_dir.into(),
            sample_seconds,
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(
            config.yt_dlp_bin.clone(),
            config.audio_dir.clone(),
            config.transcript_sample_seconds,
        )
    }

    fn audio_path(&self, video_id: &str) -> PathBuf {
        self.audio_dir
            .join(format!("{}.{}", video_id, AUDIO_EXTENSION))
    }
}

#[async_trait]
impl AudioFetcher for YtDlpAudioFetcher {
    async fn fetch_audio(&self, video_id: &str) -> AppResult<PathBuf> {
        let path = self.audio_path(video_id);
        if tokio::fs::try_exists(&path).await.unwrap_or(false) {
            log::debug!("Reusing downloaded audio {}", path.display());
            return Ok(path);
        }

        tokio::fs::create_dir_all(&self.audio_dir).await?;

        let output = Command::new(&self.bin)
            .arg("-f")
            .arg(format!("bestaudio[ext={}]", AUDIO_EXTENSION))
            .arg("--download-sections")
            .arg(format!("*0-{}", self.sample_seconds))
            .arg("-o")
            .arg(&path)
            .arg(format!("https://www.youtube.com/watch?v={}", video_id))
            .output()
            .await
            .map_err(|e| {
                log::error!("Failed to start {}: {}", self.bin, e);
                AppError::InternalError("Audio downloader is unavailable".to_string())
            })?;

        if !output.status.success() {
            log::warn!(
                "{} exited with {} for video {}: {}",
                self.bin,
                output.status,
                video_id,
                String::from_utf8_lossy(&output.stderr).trim()
            );
            return Err(AppError::ValidationError(
                "Invalid YouTube link. Could not download the video's audio.".to_string(),
            ));
        }

        log::info!("Downloaded audio sample for video {}", video_id);
        Ok(path)
    }
}

#[derive(Debug, Deserialize)]
struct TranscriptionBody {
    text: String,
}

/// OpenAI-compatible `/audio/transcriptions` client.
pub struct WhisperTranscriber {
    http: reqwest::Client,
    api_base: String,
    api_key: SecretString,
    model: String,
}

impl WhisperTranscriber {
    pub fn new(config: &Config) -> Self {
        Self {
            http: reqwest::Client::new(),
            api_base: config.openai_api_base.trim_end_matches('/').to_string(),
            api_key: config.openai_api_key.clone(),
            model: config.transcription_model.clone(),
        }
    }
}

#[async_trait]
impl Transcriber for WhisperTranscriber {
    async fn transcribe(&self, audio: &Path) -> AppResult<String> {
        let bytes = tokio::fs::read(audio).await?;
        let file_name = audio
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| format!("audio.{}", AUDIO_EXTENSION));

        let file = reqwest::multipart::Part::bytes(bytes)
            .file_name(file_name)
            .mime_str("audio/mp4")?;
        let form = reqwest::multipart::Form::new()
            .text("model", self.model.clone())
            .part("file", file);

        let response = self
            .http
            .post(format!("{}/audio/transcriptions", self.api_base))
            .bearer_auth(self.api_key.expose_secret())
            .multipart(form)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            log::error!("Transcription failed with {}: {}", status, body);
            return Err(AppError::UpstreamError(format!(
                "Transcription service returned {}",
                status
            )));
        }

        let body: TranscriptionBody = response.json().await?;
        Ok(body.text)
    }
}

/// Transcribes videos, consulting the cache before downloading anything.
pub struct TranscriptionService {
    fetcher: Arc<dyn AudioFetcher>,
    transcriber: Arc<dyn Transcriber>,
    cache: Arc<dyn ResponseCache>,
    model: String,
}

impl TranscriptionService {
    pub fn new(
        fetcher: Arc<dyn AudioFetcher>,
        transcriber: Arc<dyn Transcriber>,
        cache: Arc<dyn ResponseCache>,
        model: impl Into<String>,
    ) -> Self {
        Self {
            fetcher,
            transcriber,
            cache,
            model: model.into(),
        }
    }

    pub async fn transcribe_video(&self, video_id: &str) -> AppResult<String> {
        let key = format!("{}:{}", self.model, video_id);
        if let Some(transcript) = self.cache.get(&key).await? {
            log::debug!("Using cached transcript for video {}", video_id);
            return Ok(transcript);
        }

        let audio = self.fetcher.fetch_audio(video_id).await?;
        let transcript = self.transcriber.transcribe(&audio).await?;

        if let Err(e) = self.cache.put(&key, &transcript).await {
            log::warn!("Failed to cache transcript for video {}: {}", video_id, e);
        }
        Ok(transcript)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use super::*;
    use crate::services::cache::InMemoryCache;

    #[derive(Default)]
    struct CountingFetcher {
        calls: AtomicUsize,
    }

    #[async_trait]
    impl AudioFetcher for CountingFetcher {
        async fn fetch_audio(&self, video_id: &str) -> AppResult<PathBuf> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(PathBuf::from(format!("/tmp/{}.m4a", video_id)))
        }
    }

    struct EchoTranscriber;

    #[async_trait]
    impl Transcriber for EchoTranscriber {
        async fn transcribe(&self, audio: &Path) -> AppResult<String> {
            Ok(format!("transcript of {}", audio.display()))
        }
    }

    struct FailingTranscriber;

    #[async_trait]
    impl Transcriber for FailingTranscriber {
        async fn transcribe(&self, _audio: &Path) -> AppResult<String> {
            Err(AppError::UpstreamError("whisper down".to_string()))
        }
    }

    #[tokio::test]
    async fn second_request_is_served_from_cache() {
        let fetcher = Arc::new(CountingFetcher::default());
        let cache = Arc::new(InMemoryCache::new());
        let service = TranscriptionService::new(
            fetcher.clone(),
            Arc::new(EchoTranscriber),
            cache.clone(),
            "whisper-1",
        );

        let first = service.transcribe_video("dQw4w9WgXcQ").await.unwrap();
        let second = service.transcribe_video("dQw4w9WgXcQ").await.unwrap();

        assert_eq!(first, "transcript of /tmp/dQw4w9WgXcQ.m4a");
        assert_eq!(first, second);
        assert_eq!(fetcher.calls.load(Ordering::SeqCst), 1);
        assert_eq!(
            cache.get("whisper-1:dQw4w9WgXcQ").await.unwrap(),
            Some(first)
        );
    }

    #[tokio::test]
    async fn cache_hit_skips_download() {
        let fetcher = Arc::new(CountingFetcher::default());
        let cache = Arc::new(InMemoryCache::new());
        cache.put("whisper-1:abcdefghijk", "cached").await.unwrap();

        let service =
            TranscriptionService::new(fetcher.clone(), Arc::new(EchoTranscriber), cache, "whisper-1");

        assert_eq!(service.transcribe_video("abcdefghijk").await.unwrap(), "cached");
        assert_eq!(fetcher.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn failed_transcription_is_not_cached() {
        let cache = Arc::new(InMemoryCache::new());
        let service = TranscriptionService::new(
            Arc::new(CountingFetcher::default()),
            Arc::new(FailingTranscriber),
            cache.clone(),
            "whisper-1",
        );

        assert!(matches!(
            service.transcribe_video("abcdefghijk").await,
            Err(AppError::UpstreamError(_))
        ));
        assert_eq!(cache.len().await, 0);
    }

    /// Reads miss and writes fail, like a full disk.
    struct FullDiskCache;

    #[async_trait]
    impl ResponseCache for FullDiskCache {
        async fn get(&self, _key: &str) -> AppResult<Option<String>> {
            Ok(None)
        }

        async fn put(&self, _key: &str, _value: &str) -> AppResult<()> {
            Err(AppError::InternalError("disk full".to_string()))
        }
    }

    #[tokio::test]
    async fn cache_write_failure_keeps_transcript() {
        let service = TranscriptionService::new(
            Arc::new(CountingFetcher::default()),
            Arc::new(EchoTranscriber),
            Arc::new(FullDiskCache),
            "whisper-1",
        );

        assert_eq!(
            service.transcribe_video("abcdefghijk").await.unwrap(),
            "transcript of /tmp/abcdefghijk.m4a"
        );
    }

    #[tokio::test]
    async fn existing_audio_file_is_reused() {
        let dir = tempfile::tempdir().unwrap();
        let existing = dir.path().join("abcdefghijk.m4a");
        tokio::fs::write(&existing, b"audio").await.unwrap();

        let fetcher = YtDlpAudioFetcher::new("/nonexistent/yt-dlp", dir.path(), 360);
        assert_eq!(fetcher.fetch_audio("abcdefghijk").await.unwrap(), existing);
    }

    #[tokio::test]
    async fn missing_downloader_is_an_internal_error() {
        let dir = tempfile::tempdir().unwrap();
        let fetcher = YtDlpAudioFetcher::new("/nonexistent/yt-dlp", dir.path(), 360);

        assert!(matches!(
            fetcher.fetch_audio("abcdefghijk").await,
            Err(AppError::InternalError(_))
        ));
    }
}
