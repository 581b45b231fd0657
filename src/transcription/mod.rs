//! Speech-to-text fallback.
//!
//! Used when platform captions are unavailable. Two interchangeable
//! strategies sit behind one trait:
//!
//! - **whisper-api** (default): OpenAI Whisper over the API.
//! - **whisper-local**: a locally installed whisper CLI, no network.

mod whisper_api;
mod whisper_local;

pub use whisper_api::WhisperApiTranscriber;
pub use whisper_local::LocalWhisperTranscriber;

use crate::config::{SttProvider, TranscriptionSettings};
use crate::error::Result;
use async_trait::async_trait;
use std::path::Path;
use std::sync::Arc;

/// Trait for transcription services.
#[async_trait]
pub trait Transcriber: Send + Sync {
    /// Transcribe an audio file to plain text.
    async fn transcribe(&self, audio_path: &Path) -> Result<String>;
}

/// Create a transcriber for the configured provider.
pub fn create_transcriber(settings: &TranscriptionSettings) -> Arc<dyn Transcriber> {
    match settings.provider {
        SttProvider::WhisperApi => Arc::new(WhisperApiTranscriber::new(&settings.model)),
        SttProvider::WhisperLocal => {
            Arc::new(LocalWhisperTranscriber::new(&settings.local_model))
        }
    }
}
