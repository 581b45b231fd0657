//! One-shot transcription from the command line.
//!
//! Runs the same pipeline the server exposes, printing the final text to
//! stdout. Handy for smoke-testing a deployment configuration.

use crate::cli::{preflight, Output};
use crate::config::Settings;
use crate::orchestrator::Orchestrator;

pub async fn run_transcribe(url: &str, settings: Settings) -> anyhow::Result<()> {
    preflight::check(preflight::Operation::Transcribe, &settings)?;

    let orchestrator = Orchestrator::new(&settings)?;

    let spinner = Output::spinner("Transcribing...");
    let result = orchestrator.transcribe_url(url).await;
    spinner.finish_and_clear();

    match result {
        Ok(text) => {
            println!("{}", text);
            Ok(())
        }
        Err(e) => {
            Output::error(&format!("Transcription failed: {}", e));
            Err(e.into())
        }
    }
}
