//! Pre-flight checks before expensive operations.
//!
//! Validates that required tools and configuration are available
//! before starting operations that would otherwise fail midway.

use crate::config::{Settings, SttProvider};
use crate::error::{Result, TekstError};
use std::process::Command;

/// Requirements for different operations.
#[derive(Debug, Clone, Copy)]
pub enum Operation {
    /// One-shot transcription needs the full pipeline.
    Transcribe,
    /// The server needs credentials; tool failures surface per request.
    Serve,
}

/// Run pre-flight checks for the given operation.
///
/// Returns Ok(()) if all checks pass, or an error describing what's missing.
pub fn check(operation: Operation, settings: &Settings) -> Result<()> {
    match operation {
        Operation::Transcribe => {
            check_api_key()?;
            check_tool("yt-dlp")?;
            check_tool("ffmpeg")?;
            if settings.transcription.provider == SttProvider::WhisperLocal {
                check_tool("whisper")?;
            }
        }
        Operation::Serve => {
            check_api_key()?;
            if settings.auth.secret.is_none() {
                return Err(TekstError::Config(
                    "SECRET_CODE not set. Set it with: export SECRET_CODE='...'".to_string(),
                ));
            }
        }
    }
    Ok(())
}

/// Check if OpenAI API key is configured.
fn check_api_key() -> Result<()> {
    match std::env::var("OPENAI_API_KEY") {
        Ok(key) if !key.is_empty() => Ok(()),
        Ok(_) => Err(TekstError::Config(
            "OPENAI_API_KEY is empty. Set it with: export OPENAI_API_KEY='sk-...'".to_string(),
        )),
        Err(_) => Err(TekstError::Config(
            "OPENAI_API_KEY not set. Set it with: export OPENAI_API_KEY='sk-...'".to_string(),
        )),
    }
}

/// Check if an external tool is available.
fn check_tool(name: &str) -> Result<()> {
    // ffmpeg uses -version (single dash), others use --version
    let version_arg = match name {
        "ffmpeg" | "ffprobe" => "-version",
        _ => "--version",
    };
    match Command::new(name).arg(version_arg).output() {
        Ok(output) if output.status.success() => Ok(()),
        Ok(_) => Err(TekstError::ToolNotFound(format!(
            "{} is installed but not working correctly",
            name
        ))),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            Err(TekstError::ToolNotFound(name.to_string()))
        }
        Err(e) => Err(TekstError::ToolNotFound(format!("{}: {}", name, e))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_serve_requires_secret() {
        let mut settings = Settings::default();
        settings.auth.secret = None;
        // The api-key check may pass or fail depending on the test
        // environment, but a missing secret must never pass.
        if std::env::var("OPENAI_API_KEY").is_ok_and(|k| !k.is_empty()) {
            assert!(check(Operation::Serve, &settings).is_err());
        }
    }
}
