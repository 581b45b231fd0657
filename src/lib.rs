//! Tekst - YouTube transcript service
//!
//! A small HTTP service that turns a YouTube video URL into a cleaned,
//! punctuated transcript. The name "Tekst" is the Norwegian word for
//! "text" (TV captions are "teksting").
//!
//! # Overview
//!
//! One authenticated endpoint does all the work:
//!
//! 1. Extract the 11-character video ID from the URL.
//! 2. Fetch platform captions (the fast path).
//! 3. If captions are unavailable, download the audio and run
//!    speech-to-text (the slow path).
//! 4. Optionally punctuate the raw transcript with a completion model,
//!    chunk by chunk, concurrently.
//!
//! # Architecture
//!
//! - `config` - Configuration management
//! - `video` - Video ID extraction from URLs
//! - `captions` - Platform caption fetching
//! - `audio` - Audio download via yt-dlp
//! - `transcription` - Speech-to-text fallback strategies
//! - `chunking` - Bounded-size transcript chunking
//! - `formatting` - Concurrent chunk formatting
//! - `orchestrator` - Pipeline coordination
//! - `cli` - Command line interface and HTTP server
//!
//! # Example
//!
//! ```rust,no_run
//! use tekst::config::Settings;
//! use tekst::orchestrator::Orchestrator;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let settings = Settings::load()?;
//!     let orchestrator = Orchestrator::new(&settings)?;
//!
//!     let text = orchestrator
//!         .transcribe_url("https://www.youtube.com/watch?v=dQw4w9WgXcQ")
//!         .await?;
//!     println!("{}", text);
//!
//!     Ok(())
//! }
//! ```

pub mod audio;
pub mod captions;
pub mod chunking;
pub mod cli;
pub mod config;
pub mod error;
pub mod formatting;
pub mod openai;
pub mod orchestrator;
pub mod transcription;
pub mod video;

pub use error::{Result, TekstError};
