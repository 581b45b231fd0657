//! Transcript formatting.
//!
//! Fans the raw transcript out into bounded-size chunks, sends each chunk
//! to a chat-completion service concurrently, and reassembles the results
//! strictly by chunk index. A failed chunk degrades to an inline marker;
//! formatting never fails a request.

use crate::chunking::{Chunker, TranscriptChunk};
use crate::error::{Result, TekstError};
use crate::openai::create_client_with_timeout;
use async_openai::types::{
    ChatCompletionRequestMessage, ChatCompletionRequestSystemMessageArgs,
    ChatCompletionRequestUserMessageArgs, CreateChatCompletionRequestArgs,
};
use async_trait::async_trait;
use futures::stream::{self, StreamExt};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, instrument, warn};

/// System instruction sent with every chunk.
const FORMAT_SYSTEM_PROMPT: &str = "Format and punctuate the transcript.";

/// A text-completion service invoked once per chunk.
#[async_trait]
pub trait Completer: Send + Sync {
    async fn complete(&self, system: &str, user: &str) -> Result<String>;
}

/// OpenAI chat-completion backend.
pub struct OpenAiCompleter {
    client: async_openai::Client<async_openai::config::OpenAIConfig>,
    model: String,
}

impl OpenAiCompleter {
    pub fn new(model: &str, timeout: Duration) -> Self {
        Self {
            client: create_client_with_timeout(timeout),
            model: model.to_string(),
        }
    }
}

#[async_trait]
impl Completer for OpenAiCompleter {
    async fn complete(&self, system: &str, user: &str) -> Result<String> {
        let messages: Vec<ChatCompletionRequestMessage> = vec![
            ChatCompletionRequestSystemMessageArgs::default()
                .content(system.to_string())
                .build()
                .map_err(|e| TekstError::Formatting(e.to_string()))?
                .into(),
            ChatCompletionRequestUserMessageArgs::default()
                .content(user.to_string())
                .build()
                .map_err(|e| TekstError::Formatting(e.to_string()))?
                .into(),
        ];

        let request = CreateChatCompletionRequestArgs::default()
            .model(&self.model)
            .messages(messages)
            .build()
            .map_err(|e| TekstError::Formatting(e.to_string()))?;

        let response = self
            .client
            .chat()
            .create(request)
            .await
            .map_err(|e| TekstError::OpenAI(format!("Completion request failed: {}", e)))?;

        response
            .choices
            .first()
            .and_then(|c| c.message.content.as_ref())
            .cloned()
            .ok_or_else(|| TekstError::Formatting("Empty response from completion service".into()))
    }
}

/// Formats a transcript by chunking it and punctuating each chunk
/// through the completion service.
pub struct TranscriptFormatter {
    chunker: Chunker,
    completer: Arc<dyn Completer>,
    max_concurrent: usize,
}

impl TranscriptFormatter {
    pub fn new(chunker: Chunker, completer: Arc<dyn Completer>, max_concurrent: usize) -> Self {
        Self {
            chunker,
            completer,
            max_concurrent: max_concurrent.max(1),
        }
    }

    /// Format the whole transcript. Infallible by design: each chunk's
    /// failure is isolated to that chunk's slot in the output.
    #[instrument(skip_all, fields(chars = text.len()))]
    pub async fn format(&self, text: &str) -> String {
        let chunks = self.chunker.chunk(text);
        debug!("Formatting {} chunks", chunks.len());

        let mut results = self.format_chunks(chunks).await;

        // Reassemble by original index, not completion order.
        results.sort_by_key(|(index, _)| *index);

        results
            .into_iter()
            .map(|(index, result)| match result {
                Ok(formatted) => formatted,
                Err(e) => {
                    warn!("Chunk {} formatting failed: {}", index, e);
                    format!("[formatting error: {}]", e)
                }
            })
            .collect::<Vec<_>>()
            .join(" ")
    }

    /// Dispatch all chunk calls concurrently; per-chunk results carry the
    /// chunk index so assembly can restore ordering.
    async fn format_chunks(&self, chunks: Vec<TranscriptChunk>) -> Vec<(usize, Result<String>)> {
        stream::iter(chunks.into_iter())
            .map(|chunk| {
                let completer = self.completer.clone();
                async move {
                    let result = completer.complete(FORMAT_SYSTEM_PROMPT, &chunk.text).await;
                    (chunk.index, result)
                }
            })
            .buffer_unordered(self.max_concurrent)
            .collect()
            .await
    }
}
