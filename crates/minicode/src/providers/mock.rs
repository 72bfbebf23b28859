use async_trait::async_trait;
use futures::stream::{self, StreamExt};
use std::sync::{Arc, Mutex};

use crate::errors::{MinicodeError, Result};
use crate::models::message::Message;
use crate::providers::base::{FragmentStream, Provider, StreamFragment, Usage};

/// What the mock does for one call
#[derive(Debug, Clone)]
pub enum MockReply {
    /// Stream the text word by word, then a done fragment
    Text(String),
    /// Reject the request with a transport error carrying this status
    Reject(String),
    /// Stream the text, then fail mid-stream without a done fragment
    Interrupted(String),
}

impl MockReply {
    pub fn text<S: Into<String>>(text: S) -> Self {
        MockReply::Text(text.into())
    }
}

#[derive(Debug, Clone)]
pub struct RecordedCall {
    pub messages: Vec<Message>,
    pub model: Option<String>,
}

/// A mock provider that replays pre-configured replies and records every call
pub struct MockProvider {
    replies: Arc<Mutex<Vec<MockReply>>>,
    calls: Arc<Mutex<Vec<RecordedCall>>>,
}

impl MockProvider {
    pub fn new(replies: Vec<MockReply>) -> Self {
        Self {
            replies: Arc::new(Mutex::new(replies)),
            calls: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Handle onto the recorded calls, usable after the provider is moved away
    pub fn calls(&self) -> Arc<Mutex<Vec<RecordedCall>>> {
        self.calls.clone()
    }
}

fn words(text: &str) -> Vec<Result<StreamFragment>> {
    text.split_inclusive(' ')
        .map(|word| Ok(StreamFragment::delta(word)))
        .collect()
}

#[async_trait]
impl Provider for MockProvider {
    async fn stream(&self, messages: &[Message], model: Option<&str>) -> Result<FragmentStream> {
        self.calls.lock().unwrap().push(RecordedCall {
            messages: messages.to_vec(),
            model: model.map(str::to_string),
        });

        let reply = {
            let mut replies = self.replies.lock().unwrap();
            if replies.is_empty() {
                MockReply::Text(String::new())
            } else {
                replies.remove(0)
            }
        };

        match reply {
            MockReply::Text(text) => {
                let mut fragments = words(&text);
                fragments.push(Ok(StreamFragment::done(Some(Usage::new(1, 1, 2)))));
                Ok(stream::iter(fragments).boxed())
            }
            MockReply::Reject(status) => Err(MinicodeError::Transport(status)),
            MockReply::Interrupted(text) => {
                let mut fragments = words(&text);
                fragments.push(Err(MinicodeError::Transport(
                    "stream interrupted: connection reset".to_string(),
                )));
                Ok(stream::iter(fragments).boxed())
            }
        }
    }
}
