//! Audio acquisition.
//!
//! Downloads a video's best-available audio stream with yt-dlp and
//! normalizes it to MP3. The caller supplies the output directory; per
//! request that is a temporary directory, so the file disappears with it
//! on every exit path.

use crate::config::{AudioSettings, NetworkSettings};
use crate::error::{Result, TekstError};
use crate::video::VideoId;
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use tokio::process::Command;
use tracing::{debug, info, instrument};

/// Fetches the audio track of a video into a caller-supplied directory.
#[async_trait]
pub trait AudioFetcher: Send + Sync {
    async fn fetch(&self, video_id: &VideoId, output_dir: &Path) -> Result<PathBuf>;
}

/// yt-dlp backed audio downloader.
pub struct YtDlpDownloader {
    cookies_file: Option<PathBuf>,
    proxy: Option<String>,
}

impl YtDlpDownloader {
    pub fn new(audio: &AudioSettings, network: &NetworkSettings) -> Self {
        Self {
            cookies_file: audio.cookies_path(),
            proxy: network.proxy.clone(),
        }
    }
}

#[async_trait]
impl AudioFetcher for YtDlpDownloader {
    #[instrument(skip(self, output_dir), fields(video_id = %video_id))]
    async fn fetch(&self, video_id: &VideoId, output_dir: &Path) -> Result<PathBuf> {
        std::fs::create_dir_all(output_dir)?;

        let url = video_id.watch_url();
        let target_path = output_dir.join(format!("{}.mp3", video_id));
        let template = output_dir.join(format!("{}.%(ext)s", video_id));

        info!("Downloading audio from {}", url);

        let mut command = Command::new("yt-dlp");
        command
            .arg("--extract-audio")
            .arg("--audio-format").arg("mp3")
            .arg("--audio-quality").arg("0")
            .arg("--output").arg(template.to_str().unwrap_or_default())
            .arg("--no-playlist")
            .arg("--quiet")
            .arg("--no-warnings");

        if let Some(proxy) = &self.proxy {
            command.arg("--proxy").arg(proxy);
        }
        if let Some(cookies) = &self.cookies_file {
            command.arg("--cookies").arg(cookies);
        }

        let result = command
            .arg(&url)
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .output()
            .await;

        let output = match result {
            Ok(o) => o,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(TekstError::ToolNotFound("yt-dlp".into()));
            }
            Err(e) => {
                return Err(TekstError::AudioDownload(format!(
                    "yt-dlp execution failed: {e}"
                )));
            }
        };

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(TekstError::AudioDownload(format!("yt-dlp failed: {stderr}")));
        }

        // yt-dlp may leave a non-mp3 container behind when ffmpeg extraction
        // was skipped; find what it wrote and normalize.
        let downloaded = find_audio_file(output_dir, video_id.as_str())?;

        if downloaded != target_path {
            normalize_to_mp3(&downloaded, &target_path).await?;
            let _ = std::fs::remove_file(&downloaded);
        }

        Ok(target_path)
    }
}

/// Locates a downloaded audio file by video ID.
fn find_audio_file(dir: &Path, video_id: &str) -> Result<PathBuf> {
    for ext in &["mp3", "opus", "m4a", "webm", "ogg"] {
        let candidate = dir.join(format!("{}.{}", video_id, ext));
        if candidate.exists() {
            return Ok(candidate);
        }
    }

    // Fallback: scan directory for matching prefix
    let entries = std::fs::read_dir(dir)
        .map_err(|e| TekstError::AudioDownload(format!("Cannot read directory: {e}")))?;

    for entry in entries.flatten() {
        let name = entry.file_name();
        if name.to_string_lossy().starts_with(video_id) {
            return Ok(entry.path());
        }
    }

    Err(TekstError::AudioDownload(
        "Audio file not found after download".into(),
    ))
}

/// Converts an audio file to MP3 using ffmpeg.
async fn normalize_to_mp3(source: &Path, dest: &Path) -> Result<()> {
    debug!("Converting {:?} to MP3", source);

    let result = Command::new("ffmpeg")
        .arg("-i").arg(source)
        .arg("-vn")
        .arg("-codec:a").arg("libmp3lame")
        .arg("-qscale:a").arg("2")
        .arg("-y")
        .arg("-loglevel").arg("error")
        .arg(dest)
        .stdout(Stdio::null())
        .stderr(Stdio::piped())
        .output()
        .await;

    match result {
        Ok(out) if out.status.success() => Ok(()),
        Ok(out) => {
            let err = String::from_utf8_lossy(&out.stderr);
            Err(TekstError::AudioDownload(format!(
                "ffmpeg conversion failed: {err}"
            )))
        }
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            Err(TekstError::ToolNotFound("ffmpeg".into()))
        }
        Err(e) => Err(TekstError::AudioDownload(format!("ffmpeg error: {e}"))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_find_audio_file_prefers_known_extensions() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("dQw4w9WgXcQ.m4a"), b"x").unwrap();

        let found = find_audio_file(dir.path(), "dQw4w9WgXcQ").unwrap();
        assert_eq!(found, dir.path().join("dQw4w9WgXcQ.m4a"));
    }

    #[test]
    fn test_find_audio_file_falls_back_to_prefix_scan() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("dQw4w9WgXcQ.aac"), b"x").unwrap();

        let found = find_audio_file(dir.path(), "dQw4w9WgXcQ").unwrap();
        assert_eq!(found, dir.path().join("dQw4w9WgXcQ.aac"));
    }

    #[test]
    fn test_find_audio_file_missing_is_error() {
        let dir = tempfile::tempdir().unwrap();
        assert!(find_audio_file(dir.path(), "dQw4w9WgXcQ").is_err());
    }
}
