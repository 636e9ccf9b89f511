pub mod openai;

use std::sync::Arc;

use async_trait::async_trait;
use thiserror::Error;

use crate::message::Conversation;

pub use openai::OpenAiClient;

/// The chat-completion service: one conversation in, one text response out.
#[async_trait]
pub trait LlmClient: Send + Sync {
    async fn complete(&self, conversation: &Conversation, max_tokens: u32)
    -> Result<String, LlmError>;

    /// Model id the requests are sent to.
    fn model(&self) -> &str;
}

#[async_trait]
impl LlmClient for Arc<dyn LlmClient> {
    async fn complete(
        &self,
        conversation: &Conversation,
        max_tokens: u32,
    ) -> Result<String, LlmError> {
        (**self).complete(conversation, max_tokens).await
    }

    fn model(&self) -> &str {
        (**self).model()
    }
}

#[derive(Debug, Error)]
pub enum LlmError {
    #[error("http error: {0}")]
    Http(String),
    #[error("service returned {status}: {body}")]
    Status { status: u16, body: String },
    #[error("response error: {0}")]
    Response(String),
    #[error("serialization error: {0}")]
    Serialization(String),
}
