//! Decoding of the OpenAI-compatible server-sent event stream.
//!
//! Network reads split the body at arbitrary byte offsets, so bytes are held in a
//! [`LineBuffer`] until a newline completes a line. Only complete lines reach the
//! [`FragmentDecoder`]. A line that does not decode is dropped and decoding carries
//! on with the next one; a single split or corrupted event never stalls the stream.

use std::sync::Arc;

use async_stream::try_stream;
use futures::{Stream, StreamExt};
use serde::Deserialize;

use super::base::{StreamFragment, Usage};
use crate::errors::{MinicodeError, Result};

const DATA_PREFIX: &str = "data:";
const DONE_MARKER: &str = "[DONE]";

/// Called with the raw text of every dropped line
pub type MalformedLineHook = Arc<dyn Fn(&str) + Send + Sync>;

/// Accumulates raw bytes and hands out complete lines.
#[derive(Debug, Default)]
pub struct LineBuffer {
    pending: Vec<u8>,
}

impl LineBuffer {
    /// Append a chunk, returning every line it completed (without the newline).
    pub fn push(&mut self, chunk: &[u8]) -> Vec<Vec<u8>> {
        self.pending.extend_from_slice(chunk);

        let mut lines = Vec::new();
        while let Some(pos) = self.pending.iter().position(|&b| b == b'\n') {
            let mut line: Vec<u8> = self.pending.drain(..=pos).collect();
            line.pop();
            if line.last() == Some(&b'\r') {
                line.pop();
            }
            lines.push(line);
        }
        lines
    }

    /// Take whatever is left once the body has ended.
    pub fn finish(&mut self) -> Option<Vec<u8>> {
        let mut rest = std::mem::take(&mut self.pending);
        if rest.last() == Some(&b'\r') {
            rest.pop();
        }
        (!rest.is_empty()).then_some(rest)
    }
}

#[derive(Debug, Deserialize)]
struct ChatChunk {
    #[serde(default)]
    choices: Option<Vec<ChunkChoice>>,
    #[serde(default)]
    usage: Option<WireUsage>,
}

#[derive(Debug, Deserialize)]
struct ChunkChoice {
    #[serde(default)]
    delta: Option<ChunkDelta>,
}

#[derive(Debug, Deserialize)]
struct ChunkDelta {
    #[serde(default)]
    content: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct WireUsage {
    prompt_tokens: Option<u32>,
    completion_tokens: Option<u32>,
    total_tokens: Option<u32>,
    completion_tokens_details: Option<CompletionTokensDetails>,
}

#[derive(Debug, Deserialize)]
struct CompletionTokensDetails {
    reasoning_tokens: Option<u32>,
}

/// What one complete line amounts to
#[derive(Debug, Clone, PartialEq)]
pub enum Decoded {
    Content(String),
    Done,
    Nothing,
}

/// Turns complete event lines into content and keeps the latest usage totals.
#[derive(Default)]
pub struct FragmentDecoder {
    usage: Option<Usage>,
    // Set once a report carried `total_tokens`; the total is then never derived again.
    explicit_total: bool,
    on_malformed: Option<MalformedLineHook>,
}

impl FragmentDecoder {
    pub fn new(on_malformed: Option<MalformedLineHook>) -> Self {
        Self {
            usage: None,
            explicit_total: false,
            on_malformed,
        }
    }

    /// Most recently observed usage totals
    pub fn usage(&self) -> Option<Usage> {
        self.usage
    }

    pub fn decode(&mut self, line: &[u8]) -> Decoded {
        let Ok(text) = std::str::from_utf8(line) else {
            self.malformed(&String::from_utf8_lossy(line));
            return Decoded::Nothing;
        };

        // Blank separators, comments (": keep-alive") and non-data fields
        let Some(data) = text.strip_prefix(DATA_PREFIX) else {
            return Decoded::Nothing;
        };
        let data = data.trim();
        if data.is_empty() {
            return Decoded::Nothing;
        }
        if data == DONE_MARKER {
            return Decoded::Done;
        }

        let chunk: ChatChunk = match serde_json::from_str(data) {
            Ok(chunk) => chunk,
            Err(_) => {
                self.malformed(text);
                return Decoded::Nothing;
            }
        };

        if let Some(usage) = chunk.usage {
            self.observe(usage);
        }

        let content = chunk
            .choices
            .into_iter()
            .flatten()
            .next()
            .and_then(|choice| choice.delta)
            .and_then(|delta| delta.content)
            .unwrap_or_default();

        if content.is_empty() {
            Decoded::Nothing
        } else {
            Decoded::Content(content)
        }
    }

    // A later report only overrides what it carries.
    fn observe(&mut self, wire: WireUsage) {
        let mut usage = self.usage.unwrap_or_default();
        if let Some(prompt) = wire.prompt_tokens {
            usage.prompt_tokens = prompt;
        }
        if let Some(completion) = wire.completion_tokens {
            usage.completion_tokens = completion;
        }
        match wire.total_tokens {
            Some(total) => {
                usage.total_tokens = total;
                self.explicit_total = true;
            }
            None if !self.explicit_total => {
                usage.total_tokens = usage.prompt_tokens.saturating_add(usage.completion_tokens);
            }
            None => {}
        }
        if let Some(reasoning) = wire
            .completion_tokens_details
            .and_then(|details| details.reasoning_tokens)
        {
            usage.reasoning_tokens = Some(reasoning);
        }
        self.usage = Some(usage);
    }

    fn malformed(&self, line: &str) {
        tracing::trace!(line, "skipping malformed stream line");
        if let Some(hook) = &self.on_malformed {
            hook(line);
        }
    }
}

/// Decode a raw byte stream into fragments.
///
/// Exactly one `done` fragment ends the sequence, on `[DONE]` or when the body runs
/// out. A read error ends the sequence with a `Transport` error and no `done` fragment.
pub fn fragments<S, B, E>(
    body: S,
    on_malformed: Option<MalformedLineHook>,
) -> impl Stream<Item = Result<StreamFragment>> + Send
where
    S: Stream<Item = std::result::Result<B, E>> + Send + 'static,
    B: AsRef<[u8]> + Send,
    E: std::fmt::Display + Send,
{
    try_stream! {
        let mut body = Box::pin(body);
        let mut buffer = LineBuffer::default();
        let mut decoder = FragmentDecoder::new(on_malformed);

        loop {
            let (lines, finished) = match body.next().await {
                Some(chunk) => {
                    let chunk = chunk.map_err(|e| {
                        MinicodeError::Transport(format!("stream interrupted: {}", e))
                    })?;
                    (buffer.push(chunk.as_ref()), false)
                }
                None => (buffer.finish().into_iter().collect::<Vec<_>>(), true),
            };

            for line in lines {
                tracing::trace!(line = %String::from_utf8_lossy(&line), "stream line");
                match decoder.decode(&line) {
                    Decoded::Content(content) => {
                        yield StreamFragment::delta(content);
                    }
                    Decoded::Done => {
                        yield StreamFragment::done(decoder.usage());
                        return;
                    }
                    Decoded::Nothing => {}
                }
            }

            if finished {
                break;
            }
        }

        yield StreamFragment::done(decoder.usage());
    }
}
