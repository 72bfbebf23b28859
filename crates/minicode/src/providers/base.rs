use async_trait::async_trait;
use futures::stream::BoxStream;
use futures::StreamExt;
use serde::{Deserialize, Serialize};

use crate::errors::Result;
use crate::models::message::Message;

/// Token accounting reported by the inference service
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Usage {
    pub prompt_tokens: u32,
    pub completion_tokens: u32,
    pub total_tokens: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reasoning_tokens: Option<u32>,
}

impl Usage {
    pub fn new(prompt_tokens: u32, completion_tokens: u32, total_tokens: u32) -> Self {
        Self {
            prompt_tokens,
            completion_tokens,
            total_tokens,
            reasoning_tokens: None,
        }
    }
}

/// One incremental unit of a streamed completion.
///
/// Every fragment before the last has `done == false`. The last one has
/// `done == true`, empty content, and carries the usage totals if any were reported.
#[derive(Debug, Clone, PartialEq)]
pub struct StreamFragment {
    pub content: String,
    pub done: bool,
    pub usage: Option<Usage>,
}

impl StreamFragment {
    pub fn delta<S: Into<String>>(content: S) -> Self {
        Self {
            content: content.into(),
            done: false,
            usage: None,
        }
    }

    pub fn done(usage: Option<Usage>) -> Self {
        Self {
            content: String::new(),
            done: true,
            usage,
        }
    }
}

/// A live, single-use sequence of fragments. Dropping it releases the connection.
pub type FragmentStream = BoxStream<'static, Result<StreamFragment>>;

/// Base trait for streaming chat providers
#[async_trait]
pub trait Provider: Send + Sync {
    /// Open one streamed completion for `messages`.
    ///
    /// `model` overrides the provider's configured default. A rejected request
    /// fails here, before any fragment is produced.
    async fn stream(&self, messages: &[Message], model: Option<&str>) -> Result<FragmentStream>;
}

/// A fully drained completion
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Completion {
    pub text: String,
    pub usage: Option<Usage>,
}

/// Drive a fragment stream to its end, concatenating content in arrival order.
///
/// Errors on the stream propagate unchanged; no completion is synthesized for them.
pub async fn collect(mut stream: FragmentStream) -> Result<Completion> {
    let mut completion = Completion::default();
    while let Some(fragment) = stream.next().await {
        let fragment = fragment?;
        if fragment.done {
            completion.usage = fragment.usage;
            break;
        }
        completion.text.push_str(&fragment.content);
    }
    Ok(completion)
}
