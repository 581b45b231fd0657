//! Transcription pipeline orchestrator.
//!
//! One linear run per request: extract the video ID, try captions, fall
//! back to audio download plus speech-to-text, then optionally format.
//! Every stage failure is converted into a typed error; the HTTP layer
//! decides what the client sees.

use crate::audio::{AudioFetcher, YtDlpDownloader};
use crate::captions::{CaptionOutcome, CaptionSource, YoutubeCaptionSource};
use crate::chunking::{Chunker, TokenCounter};
use crate::config::{FallbackPolicy, Settings};
use crate::error::{Result, TekstError};
use crate::formatting::{OpenAiCompleter, TranscriptFormatter};
use crate::transcription::{create_transcriber, Transcriber};
use crate::video::{extract_video_id, VideoId};
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, instrument, warn};

/// The end-to-end transcript pipeline for one deployment configuration.
pub struct Orchestrator {
    captions: Arc<dyn CaptionSource>,
    audio: Arc<dyn AudioFetcher>,
    transcriber: Arc<dyn Transcriber>,
    /// None when formatting is disabled; the raw transcript is returned.
    formatter: Option<TranscriptFormatter>,
    fallback_policy: FallbackPolicy,
}

impl Orchestrator {
    /// Wire up production collaborators from settings.
    pub fn new(settings: &Settings) -> Result<Self> {
        let captions = Arc::new(YoutubeCaptionSource::new(
            &settings.captions,
            &settings.network,
        ));
        let audio = Arc::new(YtDlpDownloader::new(&settings.audio, &settings.network));
        let transcriber = create_transcriber(&settings.transcription);

        let formatter = if settings.formatting.enabled {
            let counter = TokenCounter::new(settings.formatting.counter)?;
            let chunker = Chunker::new(counter, settings.formatting.max_chunk_tokens);
            let completer = Arc::new(OpenAiCompleter::new(
                &settings.formatting.model,
                Duration::from_secs(settings.formatting.request_timeout_secs),
            ));
            Some(TranscriptFormatter::new(
                chunker,
                completer,
                settings.formatting.max_concurrent,
            ))
        } else {
            None
        };

        Ok(Self {
            captions,
            audio,
            transcriber,
            formatter,
            fallback_policy: settings.captions.fallback_policy,
        })
    }

    /// Build an orchestrator from explicit collaborators.
    pub fn with_components(
        captions: Arc<dyn CaptionSource>,
        audio: Arc<dyn AudioFetcher>,
        transcriber: Arc<dyn Transcriber>,
        formatter: Option<TranscriptFormatter>,
        fallback_policy: FallbackPolicy,
    ) -> Self {
        Self {
            captions,
            audio,
            transcriber,
            formatter,
            fallback_policy,
        }
    }

    /// Run the full pipeline for one video URL.
    #[instrument(skip(self), fields(url = %url))]
    pub async fn transcribe_url(&self, url: &str) -> Result<String> {
        let video_id = extract_video_id(url).ok_or(TekstError::InvalidUrl)?;
        info!("Processing video {}", video_id);

        let raw = match self.captions.fetch(&video_id).await {
            Ok(CaptionOutcome::Available(text)) => {
                info!("Using platform captions");
                text
            }
            Ok(CaptionOutcome::Disabled) => {
                info!("Captions disabled, falling back to speech-to-text");
                self.transcribe_audio(&video_id).await?
            }
            Err(e) if self.fallback_policy == FallbackPolicy::AnyError => {
                warn!("Caption fetch failed ({}), falling back to speech-to-text", e);
                self.transcribe_audio(&video_id).await?
            }
            Err(e) => return Err(e),
        };

        match &self.formatter {
            Some(formatter) => Ok(formatter.format(&raw).await),
            None => Ok(raw),
        }
    }

    /// Slow path: download the audio and transcribe it.
    async fn transcribe_audio(&self, video_id: &VideoId) -> Result<String> {
        // The temp dir scopes the audio file to this request; dropping it
        // deletes the file on success, failure, and early return alike.
        let temp_dir = tempfile::tempdir()?;

        let audio_path = self.audio.fetch(video_id, temp_dir.path()).await?;
        self.transcriber.transcribe(&audio_path).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::path::{Path, PathBuf};
    use std::sync::atomic::{AtomicUsize, Ordering};

    const URL: &str = "https://www.youtube.com/watch?v=dQw4w9WgXcQ";

    struct FakeCaptions {
        outcome: Result<CaptionOutcome>,
        calls: AtomicUsize,
    }

    impl FakeCaptions {
        fn available(text: &str) -> Arc<Self> {
            Arc::new(Self {
                outcome: Ok(CaptionOutcome::Available(text.to_string())),
                calls: AtomicUsize::new(0),
            })
        }

        fn disabled() -> Arc<Self> {
            Arc::new(Self {
                outcome: Ok(CaptionOutcome::Disabled),
                calls: AtomicUsize::new(0),
            })
        }

        fn failing() -> Arc<Self> {
            Arc::new(Self {
                outcome: Err(TekstError::Captions("rate limited".to_string())),
                calls: AtomicUsize::new(0),
            })
        }
    }

    #[async_trait]
    impl CaptionSource for FakeCaptions {
        async fn fetch(&self, _video_id: &VideoId) -> Result<CaptionOutcome> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            match &self.outcome {
                Ok(outcome) => Ok(outcome.clone()),
                Err(_) => Err(TekstError::Captions("rate limited".to_string())),
            }
        }
    }

    struct FakeAudio {
        fail: bool,
        calls: AtomicUsize,
    }

    impl FakeAudio {
        fn ok() -> Arc<Self> {
            Arc::new(Self {
                fail: false,
                calls: AtomicUsize::new(0),
            })
        }

        fn failing() -> Arc<Self> {
            Arc::new(Self {
                fail: true,
                calls: AtomicUsize::new(0),
            })
        }
    }

    #[async_trait]
    impl AudioFetcher for FakeAudio {
        async fn fetch(&self, video_id: &VideoId, output_dir: &Path) -> Result<PathBuf> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if self.fail {
                return Err(TekstError::AudioDownload("video unavailable".to_string()));
            }
            let path = output_dir.join(format!("{}.mp3", video_id));
            std::fs::write(&path, b"fake audio")?;
            Ok(path)
        }
    }

    struct FakeTranscriber {
        text: String,
        calls: AtomicUsize,
    }

    impl FakeTranscriber {
        fn new(text: &str) -> Arc<Self> {
            Arc::new(Self {
                text: text.to_string(),
                calls: AtomicUsize::new(0),
            })
        }
    }

    #[async_trait]
    impl Transcriber for FakeTranscriber {
        async fn transcribe(&self, _audio_path: &Path) -> Result<String> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(self.text.clone())
        }
    }

    fn orchestrator(
        captions: Arc<FakeCaptions>,
        audio: Arc<FakeAudio>,
        transcriber: Arc<FakeTranscriber>,
        policy: FallbackPolicy,
    ) -> Orchestrator {
        Orchestrator::with_components(captions, audio, transcriber, None, policy)
    }

    #[tokio::test]
    async fn test_captions_path_skips_audio_and_stt() {
        let captions = FakeCaptions::available("hello from captions");
        let audio = FakeAudio::ok();
        let transcriber = FakeTranscriber::new("unused");

        let orch = orchestrator(
            captions.clone(),
            audio.clone(),
            transcriber.clone(),
            FallbackPolicy::DisabledOnly,
        );

        let result = orch.transcribe_url(URL).await.unwrap();
        assert_eq!(result, "hello from captions");
        assert_eq!(captions.calls.load(Ordering::SeqCst), 1);
        assert_eq!(audio.calls.load(Ordering::SeqCst), 0);
        assert_eq!(transcriber.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_disabled_captions_fall_back_to_stt() {
        let captions = FakeCaptions::disabled();
        let audio = FakeAudio::ok();
        let transcriber = FakeTranscriber::new("spoken words");

        let orch = orchestrator(
            captions,
            audio.clone(),
            transcriber.clone(),
            FallbackPolicy::DisabledOnly,
        );

        let result = orch.transcribe_url(URL).await.unwrap();
        assert_eq!(result, "spoken words");
        assert_eq!(audio.calls.load(Ordering::SeqCst), 1);
        assert_eq!(transcriber.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_audio_failure_is_terminal_and_skips_stt() {
        let captions = FakeCaptions::disabled();
        let audio = FakeAudio::failing();
        let transcriber = FakeTranscriber::new("unused");

        let orch = orchestrator(
            captions,
            audio.clone(),
            transcriber.clone(),
            FallbackPolicy::DisabledOnly,
        );

        let err = orch.transcribe_url(URL).await.unwrap_err();
        assert!(matches!(err, TekstError::AudioDownload(_)));
        assert_eq!(audio.calls.load(Ordering::SeqCst), 1);
        assert_eq!(transcriber.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_strict_policy_surfaces_caption_errors() {
        let captions = FakeCaptions::failing();
        let audio = FakeAudio::ok();
        let transcriber = FakeTranscriber::new("unused");

        let orch = orchestrator(
            captions,
            audio.clone(),
            transcriber,
            FallbackPolicy::DisabledOnly,
        );

        let err = orch.transcribe_url(URL).await.unwrap_err();
        assert!(matches!(err, TekstError::Captions(_)));
        assert_eq!(audio.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_permissive_policy_falls_back_on_caption_errors() {
        let captions = FakeCaptions::failing();
        let audio = FakeAudio::ok();
        let transcriber = FakeTranscriber::new("recovered via fallback");

        let orch = orchestrator(
            captions,
            audio.clone(),
            transcriber.clone(),
            FallbackPolicy::AnyError,
        );

        let result = orch.transcribe_url(URL).await.unwrap();
        assert_eq!(result, "recovered via fallback");
        assert_eq!(audio.calls.load(Ordering::SeqCst), 1);
        assert_eq!(transcriber.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_formatting_runs_when_enabled() {
        use crate::chunking::{Chunker, TokenCounter};
        use crate::formatting::{Completer, TranscriptFormatter};

        struct UppercaseCompleter;

        #[async_trait]
        impl Completer for UppercaseCompleter {
            async fn complete(&self, _system: &str, user: &str) -> Result<String> {
                Ok(user.to_uppercase())
            }
        }

        let formatter = TranscriptFormatter::new(
            Chunker::new(TokenCounter::Chars, 100),
            Arc::new(UppercaseCompleter),
            4,
        );

        let orch = Orchestrator::with_components(
            FakeCaptions::available("hello from captions"),
            FakeAudio::ok(),
            FakeTranscriber::new("unused"),
            Some(formatter),
            FallbackPolicy::DisabledOnly,
        );

        let result = orch.transcribe_url(URL).await.unwrap();
        assert_eq!(result, "HELLO FROM CAPTIONS");
    }

    #[tokio::test]
    async fn test_invalid_url_never_reaches_captions() {
        let captions = FakeCaptions::available("unused");
        let audio = FakeAudio::ok();
        let transcriber = FakeTranscriber::new("unused");

        let orch = orchestrator(
            captions.clone(),
            audio,
            transcriber,
            FallbackPolicy::DisabledOnly,
        );

        let err = orch.transcribe_url("https://example.com/nope").await.unwrap_err();
        assert!(matches!(err, TekstError::InvalidUrl));
        assert_eq!(captions.calls.load(Ordering::SeqCst), 0);
    }
}
