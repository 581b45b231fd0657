//! Local whisper CLI transcription.
//!
//! Runs the `whisper` command against the audio file and reads its JSON
//! output. Keeps transcription entirely off the network for deployments
//! where audio must not leave the host.

use super::Transcriber;
use crate::error::{Result, TekstError};
use async_trait::async_trait;
use serde::Deserialize;
use std::path::Path;
use std::process::Stdio;
use tokio::process::Command;
use tracing::{info, instrument};

/// Subset of the whisper CLI's JSON output we care about.
#[derive(Debug, Deserialize)]
struct WhisperOutput {
    text: String,
}

/// In-host transcriber backed by the whisper CLI.
pub struct LocalWhisperTranscriber {
    model: String,
}

impl LocalWhisperTranscriber {
    pub fn new(model: &str) -> Self {
        Self {
            model: model.to_string(),
        }
    }
}

#[async_trait]
impl Transcriber for LocalWhisperTranscriber {
    #[instrument(skip(self), fields(audio_path = %audio_path.display()))]
    async fn transcribe(&self, audio_path: &Path) -> Result<String> {
        info!("Transcribing locally with whisper model {}", self.model);

        let temp_dir = tempfile::tempdir()?;

        let result = Command::new("whisper")
            .arg(audio_path)
            .arg("--model").arg(&self.model)
            .arg("--output_dir").arg(temp_dir.path())
            .arg("--output_format").arg("json")
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .output()
            .await;

        let output = match result {
            Ok(o) => o,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(TekstError::ToolNotFound("whisper".into()));
            }
            Err(e) => {
                return Err(TekstError::Transcription(format!(
                    "whisper execution failed: {e}"
                )));
            }
        };

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(TekstError::Transcription(format!(
                "whisper failed: {stderr}"
            )));
        }

        let stem = audio_path
            .file_stem()
            .and_then(|s| s.to_str())
            .ok_or_else(|| TekstError::Transcription("Invalid audio filename".to_string()))?;
        let json_path = temp_dir.path().join(format!("{}.json", stem));

        let content = tokio::fs::read_to_string(&json_path).await.map_err(|e| {
            TekstError::Transcription(format!("Failed to read whisper output: {e}"))
        })?;

        let parsed: WhisperOutput = serde_json::from_str(&content).map_err(|e| {
            TekstError::Transcription(format!("Failed to parse whisper output: {e}"))
        })?;

        Ok(parsed.text.trim().to_string())
    }
}
