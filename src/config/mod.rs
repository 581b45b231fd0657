//! Configuration module for Tekst.
//!
//! Settings load from an optional TOML file, then environment variables
//! (SECRET_CODE, PROXY, COOKIES_FILE) are overlaid. Everything is read
//! once at startup and shared read-only afterwards.

mod settings;

pub use settings::{
    AudioSettings, AuthSettings, CaptionSettings, ChunkCounter, FallbackPolicy,
    FormattingSettings, NetworkSettings, ServerSettings, Settings, SttProvider,
    TranscriptionSettings,
};
