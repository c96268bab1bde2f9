use async_trait::async_trait;
use slide_chatgpt::{ChatRequest, OpenAiModelClient};

use crate::error::GenerationError;

/// The text-completion collaborator. One call per generated deck.
#[async_trait]
pub trait CompletionClient: Send + Sync {
    /// Returns the reply text, or `None` if the provider sent no content.
    async fn complete(&self, request: ChatRequest) -> Result<Option<String>, GenerationError>;
}

/// Adapter wrapping `OpenAiModelClient` into `CompletionClient`.
/// Built without a key it fails every call with `MissingCredential`.
pub struct OpenAiAdapter {
    inner: Option<OpenAiModelClient>,
}

impl OpenAiAdapter {
    pub fn new(api_key: Option<String>, model: String, base_url: String) -> Self {
        let inner = api_key
            .filter(|key| !key.is_empty())
            .map(|key| OpenAiModelClient::new_with_model(key, model).with_base_url(base_url));
        Self { inner }
    }
}

#[async_trait]
impl CompletionClient for OpenAiAdapter {
    async fn complete(&self, request: ChatRequest) -> Result<Option<String>, GenerationError> {
        let client = self
            .inner
            .as_ref()
            .ok_or(GenerationError::MissingCredential)?;
        client
            .complete(&request)
            .await
            .map_err(|e| GenerationError::Transport(e.to_string()))
    }
}

/// Client that answers every request with the same canned reply.
pub struct StaticClient {
    reply: Option<String>,
}

impl StaticClient {
    pub fn new(reply: impl Into<String>) -> Self {
        Self {
            reply: Some(reply.into()),
        }
    }

    /// A client whose replies carry no content.
    pub fn empty() -> Self {
        Self { reply: None }
    }
}

#[async_trait]
impl CompletionClient for StaticClient {
    async fn complete(&self, _request: ChatRequest) -> Result<Option<String>, GenerationError> {
        Ok(self.reply.clone())
    }
}
