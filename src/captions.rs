//! YouTube caption fetching.
//!
//! The fast path of the pipeline: ask the platform for the video's caption
//! track and join the timed entries into one text blob. "Captions disabled"
//! is a distinct outcome, not an error, so the orchestrator can fall back
//! to speech-to-text silently.

use crate::config::{CaptionSettings, NetworkSettings};
use crate::error::{Result, TekstError};
use crate::video::VideoId;
use async_trait::async_trait;
use tracing::{debug, instrument};
use yt_transcript_rs::api::YouTubeTranscriptApi;
use yt_transcript_rs::errors::{CouldNotRetrieveTranscript, CouldNotRetrieveTranscriptReason};

/// Outcome of a caption lookup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CaptionOutcome {
    /// Captions exist; entry texts joined with single spaces, in the
    /// order the platform returned them. No punctuation normalization.
    Available(String),
    /// Captions are turned off for this video.
    Disabled,
}

/// Source of platform captions for a video.
#[async_trait]
pub trait CaptionSource: Send + Sync {
    async fn fetch(&self, video_id: &VideoId) -> Result<CaptionOutcome>;
}

/// Caption source backed by YouTube's caption tracks.
pub struct YoutubeCaptionSource {
    languages: Vec<String>,
    proxy: Option<String>,
}

impl YoutubeCaptionSource {
    pub fn new(captions: &CaptionSettings, network: &NetworkSettings) -> Self {
        Self {
            languages: captions.languages.clone(),
            proxy: network.proxy.clone(),
        }
    }

    /// Build the API client, routing through the configured proxy if any.
    fn build_api(&self) -> Result<YouTubeTranscriptApi> {
        let http_client = match &self.proxy {
            Some(addr) => {
                let proxy = reqwest::Proxy::all(addr)
                    .map_err(|e| TekstError::Captions(format!("Invalid proxy: {}", e)))?;
                Some(reqwest::Client::builder().proxy(proxy).build()?)
            }
            None => None,
        };

        YouTubeTranscriptApi::new(None, None, http_client)
            .map_err(|e| TekstError::Captions(format!("Failed to create caption client: {}", e)))
    }
}

#[async_trait]
impl CaptionSource for YoutubeCaptionSource {
    #[instrument(skip(self), fields(video_id = %video_id))]
    async fn fetch(&self, video_id: &VideoId) -> Result<CaptionOutcome> {
        let api = self.build_api()?;
        let languages: Vec<&str> = self.languages.iter().map(|s| s.as_str()).collect();

        match api.fetch_transcript(video_id.as_str(), &languages, false).await {
            Ok(fetched) => {
                let parts = fetched.parts();
                debug!("Fetched {} caption entries", parts.len());
                let text = parts
                    .iter()
                    .map(|p| p.text.as_str())
                    .collect::<Vec<_>>()
                    .join(" ");
                Ok(CaptionOutcome::Available(text))
            }
            Err(CouldNotRetrieveTranscript {
                reason: Some(CouldNotRetrieveTranscriptReason::TranscriptsDisabled),
                ..
            }) => Ok(CaptionOutcome::Disabled),
            Err(e) => Err(TekstError::Captions(e.to_string())),
        }
    }
}
