//! Conversation data shared between the streaming client and the orchestrator.
//!
//! Messages are plain data. Their order inside a conversation is the model
//! context, so callers only ever append.
pub mod message;
