//! Configuration settings for Tekst.

use crate::error::{Result, TekstError};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Root configuration structure.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct Settings {
    pub server: ServerSettings,
    pub auth: AuthSettings,
    pub network: NetworkSettings,
    pub captions: CaptionSettings,
    pub audio: AudioSettings,
    pub transcription: TranscriptionSettings,
    pub formatting: FormattingSettings,
}

/// HTTP server settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerSettings {
    /// Host to bind to.
    pub host: String,
    /// Port to bind to.
    pub port: u16,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8080,
        }
    }
}

/// Request authentication settings.
///
/// The secret is compared against the Bearer token by exact string
/// equality. Usually supplied via the SECRET_CODE environment variable.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct AuthSettings {
    pub secret: Option<String>,
}

/// Outbound network settings.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct NetworkSettings {
    /// Proxy address applied to caption fetches and audio downloads.
    pub proxy: Option<String>,
}

/// What to do when a caption fetch fails with something other than
/// "captions disabled".
#[derive(Debug, Clone, Copy, Serialize, Deserialize, Default, PartialEq, Eq)]
#[serde(rename_all = "kebab-case")]
pub enum FallbackPolicy {
    /// Only a "captions disabled" signal triggers the speech-to-text
    /// fallback; any other caption failure is fatal for the request.
    #[default]
    DisabledOnly,
    /// Any caption failure triggers the fallback.
    AnyError,
}

impl std::str::FromStr for FallbackPolicy {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "disabled-only" | "strict" => Ok(FallbackPolicy::DisabledOnly),
            "any-error" | "permissive" => Ok(FallbackPolicy::AnyError),
            _ => Err(format!("Unknown fallback policy: {}", s)),
        }
    }
}

/// Caption lookup settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CaptionSettings {
    /// Preferred caption languages, in order.
    pub languages: Vec<String>,
    /// Whether generic caption failures also fall back to speech-to-text.
    pub fallback_policy: FallbackPolicy,
}

impl Default for CaptionSettings {
    fn default() -> Self {
        Self {
            languages: vec!["en".to_string()],
            fallback_policy: FallbackPolicy::default(),
        }
    }
}

/// Audio download settings.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct AudioSettings {
    /// Path to a browser-cookie export passed to yt-dlp, for videos that
    /// refuse anonymous downloads.
    pub cookies_file: Option<String>,
}

impl AudioSettings {
    /// Expanded cookies file path, if configured.
    pub fn cookies_path(&self) -> Option<PathBuf> {
        self.cookies_file.as_deref().map(Settings::expand_path)
    }
}

/// Speech-to-text provider.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, Default, PartialEq, Eq)]
#[serde(rename_all = "kebab-case")]
pub enum SttProvider {
    /// OpenAI Whisper API (default).
    #[default]
    WhisperApi,
    /// Local whisper CLI invoked as a subprocess.
    WhisperLocal,
}

impl std::str::FromStr for SttProvider {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "whisper-api" | "api" | "openai" => Ok(SttProvider::WhisperApi),
            "whisper-local" | "local" => Ok(SttProvider::WhisperLocal),
            _ => Err(format!("Unknown transcription provider: {}", s)),
        }
    }
}

impl std::fmt::Display for SttProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SttProvider::WhisperApi => write!(f, "whisper-api"),
            SttProvider::WhisperLocal => write!(f, "whisper-local"),
        }
    }
}

/// Speech-to-text fallback settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TranscriptionSettings {
    /// Transcription provider (whisper-api, whisper-local).
    pub provider: SttProvider,
    /// Whisper API model.
    pub model: String,
    /// Model name for the local whisper CLI.
    pub local_model: String,
}

impl Default for TranscriptionSettings {
    fn default() -> Self {
        Self {
            provider: SttProvider::default(),
            model: "whisper-1".to_string(),
            local_model: "tiny".to_string(),
        }
    }
}

/// How chunk sizes are measured against the budget.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, Default, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ChunkCounter {
    /// GPT-class BPE token count.
    #[default]
    Tokens,
    /// Plain character count, for simplified deployments.
    Chars,
}

/// Transcript formatting settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FormattingSettings {
    /// Whether to run the raw transcript through the completion model at
    /// all. When off, the service returns raw transcript text.
    pub enabled: bool,
    /// Chat-completion model used to punctuate chunks.
    pub model: String,
    /// Maximum size per chunk, in `counter` units.
    pub max_chunk_tokens: usize,
    /// Unit for the chunk budget.
    pub counter: ChunkCounter,
    /// Maximum concurrent chunk-formatting calls per request.
    pub max_concurrent: usize,
    /// Per-call timeout for completion requests, in seconds.
    pub request_timeout_secs: u64,
}

impl Default for FormattingSettings {
    fn default() -> Self {
        Self {
            enabled: true,
            model: "gpt-4o-mini".to_string(),
            max_chunk_tokens: 16_000,
            counter: ChunkCounter::default(),
            max_concurrent: 4,
            request_timeout_secs: 300,
        }
    }
}

impl Settings {
    /// Load settings from the default configuration file, then overlay
    /// environment variables.
    pub fn load() -> Result<Self> {
        Self::load_from(None)
    }

    /// Load settings from a specific path, or the default location if None.
    pub fn load_from(path: Option<&PathBuf>) -> Result<Self> {
        let config_path = match path {
            Some(p) => p.clone(),
            None => Self::default_config_path(),
        };

        let mut settings = if config_path.exists() {
            let content = std::fs::read_to_string(&config_path)?;
            toml::from_str(&content)?
        } else {
            Settings::default()
        };

        settings.apply_env();
        settings.validate()?;
        Ok(settings)
    }

    /// Overlay environment variables on top of file-based settings.
    fn apply_env(&mut self) {
        if let Ok(secret) = std::env::var("SECRET_CODE") {
            if !secret.is_empty() {
                self.auth.secret = Some(secret);
            }
        }
        if let Ok(proxy) = std::env::var("PROXY") {
            if !proxy.is_empty() {
                self.network.proxy = Some(proxy);
            }
        }
        if let Ok(cookies) = std::env::var("COOKIES_FILE") {
            if !cookies.is_empty() {
                self.audio.cookies_file = Some(cookies);
            }
        }
    }

    /// Reject configurations that would fail at request time.
    fn validate(&self) -> Result<()> {
        if let Some(proxy) = &self.network.proxy {
            url::Url::parse(proxy).map_err(|e| {
                TekstError::Config(format!("Invalid proxy address '{}': {}", proxy, e))
            })?;
        }
        if self.formatting.max_chunk_tokens == 0 {
            return Err(TekstError::Config(
                "formatting.max_chunk_tokens must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }

    /// Get the default configuration file path.
    pub fn default_config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("tekst")
            .join("config.toml")
    }

    /// Expand shell variables in paths (e.g., ~).
    pub fn expand_path(path: &str) -> PathBuf {
        PathBuf::from(shellexpand::tilde(path).to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let settings = Settings::default();
        assert_eq!(settings.server.port, 8080);
        assert_eq!(settings.captions.fallback_policy, FallbackPolicy::DisabledOnly);
        assert!(settings.formatting.enabled);
        assert_eq!(settings.formatting.max_chunk_tokens, 16_000);
    }

    #[test]
    fn test_parse_toml() {
        let settings: Settings = toml::from_str(
            r#"
            [captions]
            languages = ["de", "en"]
            fallback_policy = "any-error"

            [formatting]
            enabled = false
            counter = "chars"
            max_chunk_tokens = 4096

            [transcription]
            provider = "whisper-local"
            "#,
        )
        .unwrap();

        assert_eq!(settings.captions.languages, vec!["de", "en"]);
        assert_eq!(settings.captions.fallback_policy, FallbackPolicy::AnyError);
        assert!(!settings.formatting.enabled);
        assert_eq!(settings.formatting.counter, ChunkCounter::Chars);
        assert_eq!(settings.formatting.max_chunk_tokens, 4096);
        assert_eq!(settings.transcription.provider, SttProvider::WhisperLocal);
    }

    #[test]
    fn test_validate_rejects_bad_proxy() {
        let mut settings = Settings::default();
        settings.network.proxy = Some("not a proxy".to_string());
        assert!(settings.validate().is_err());
    }

    #[test]
    fn test_policy_from_str() {
        assert_eq!("any-error".parse::<FallbackPolicy>(), Ok(FallbackPolicy::AnyError));
        assert_eq!("strict".parse::<FallbackPolicy>(), Ok(FallbackPolicy::DisabledOnly));
        assert!("bogus".parse::<FallbackPolicy>().is_err());
    }
}
