//! Transcript chunking.
//!
//! Splits a raw transcript into bounded-size chunks so each fits a
//! completion model's input limit. Splitting happens only on whitespace
//! word boundaries; rejoining all chunks with single spaces reproduces
//! the original word sequence exactly.

use crate::config::ChunkCounter;
use crate::error::{Result, TekstError};
use tiktoken_rs::CoreBPE;

/// A bounded-size contiguous slice of transcript text.
#[derive(Debug, Clone)]
pub struct TranscriptChunk {
    /// Position in the original ordering. The one invariant that must
    /// survive concurrent formatting.
    pub index: usize,
    /// Chunk text, words joined with single spaces.
    pub text: String,
    /// Estimated size in counter units.
    pub token_count: usize,
}

/// Counts a word against the chunk budget.
pub enum TokenCounter {
    /// GPT-class BPE token count.
    Bpe(Box<CoreBPE>),
    /// Plain character count for simplified deployments.
    Chars,
}

impl TokenCounter {
    pub fn new(kind: ChunkCounter) -> Result<Self> {
        match kind {
            ChunkCounter::Tokens => {
                let bpe = tiktoken_rs::o200k_base()
                    .map_err(|e| TekstError::Config(format!("Failed to load tokenizer: {e}")))?;
                Ok(TokenCounter::Bpe(Box::new(bpe)))
            }
            ChunkCounter::Chars => Ok(TokenCounter::Chars),
        }
    }

    /// Size estimate for one word plus its trailing separator.
    fn count(&self, word: &str) -> usize {
        match self {
            TokenCounter::Bpe(bpe) => bpe.encode_with_special_tokens(&format!("{word} ")).len(),
            TokenCounter::Chars => word.chars().count() + 1,
        }
    }
}

/// Word-boundary splitter with a per-chunk size budget.
pub struct Chunker {
    counter: TokenCounter,
    max_tokens: usize,
}

impl Chunker {
    pub fn new(counter: TokenCounter, max_tokens: usize) -> Self {
        Self {
            counter,
            max_tokens,
        }
    }

    /// Split `text` into ordered chunks.
    ///
    /// Words accumulate into the current chunk while the running estimate
    /// stays at or under the budget; the overflow word starts the next
    /// chunk. A single word that alone exceeds the budget still forms its
    /// own chunk. Empty input yields no chunks.
    pub fn chunk(&self, text: &str) -> Vec<TranscriptChunk> {
        let mut chunks: Vec<(String, usize)> = Vec::new();
        let mut current: Vec<&str> = Vec::new();
        let mut current_tokens = 0usize;

        for word in text.split_whitespace() {
            let word_tokens = self.counter.count(word);

            if !current.is_empty() && current_tokens + word_tokens > self.max_tokens {
                chunks.push((current.join(" "), current_tokens));
                current = Vec::new();
                current_tokens = 0;
            }

            current.push(word);
            current_tokens += word_tokens;
        }

        if !current.is_empty() {
            chunks.push((current.join(" "), current_tokens));
        }

        chunks
            .into_iter()
            .enumerate()
            .map(|(index, (text, token_count))| TranscriptChunk {
                index,
                text,
                token_count,
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn chars_chunker(budget: usize) -> Chunker {
        Chunker::new(TokenCounter::Chars, budget)
    }

    #[test]
    fn test_empty_input_yields_no_chunks() {
        assert!(chars_chunker(100).chunk("").is_empty());
        assert!(chars_chunker(100).chunk("   \n\t ").is_empty());
    }

    #[test]
    fn test_short_input_is_one_chunk() {
        let chunks = chars_chunker(100).chunk("hello world");
        assert_eq!(chunks.len(), 1);
        assert_eq!(chunks[0].index, 0);
        assert_eq!(chunks[0].text, "hello world");
    }

    #[test]
    fn test_chunking_is_lossless() {
        let text = "the quick brown fox jumps over the lazy dog and keeps on running";
        let chunks = chars_chunker(12).chunk(text);
        assert!(chunks.len() > 1);

        let rejoined = chunks
            .iter()
            .map(|c| c.text.as_str())
            .collect::<Vec<_>>()
            .join(" ");
        assert_eq!(rejoined, text);

        // Indices are the original ordering, with no gaps.
        for (i, chunk) in chunks.iter().enumerate() {
            assert_eq!(chunk.index, i);
        }
    }

    #[test]
    fn test_chunks_respect_budget() {
        let text = "alpha beta gamma delta epsilon zeta eta theta";
        let budget = 15;
        for chunk in chars_chunker(budget).chunk(text) {
            assert!(
                chunk.token_count <= budget,
                "chunk '{}' over budget",
                chunk.text
            );
        }
    }

    #[test]
    fn test_oversized_word_forms_own_chunk() {
        let chunks = chars_chunker(5).chunk("hi incomprehensibilities yo");
        assert_eq!(chunks.len(), 3);
        assert_eq!(chunks[1].text, "incomprehensibilities");
        assert!(chunks[1].token_count > 5);
        assert_eq!(chunks[2].text, "yo");
    }

    #[test]
    fn test_whitespace_is_normalized() {
        let chunks = chars_chunker(100).chunk("  a \n b\t\tc  ");
        assert_eq!(chunks.len(), 1);
        assert_eq!(chunks[0].text, "a b c");
    }

    #[test]
    fn test_bpe_counter_smoke() {
        let counter = TokenCounter::new(crate::config::ChunkCounter::Tokens).unwrap();
        let chunker = Chunker::new(counter, 16_000);
        let chunks = chunker.chunk("hello world");
        assert_eq!(chunks.len(), 1);
        assert!(chunks[0].token_count >= 2);
    }
}
