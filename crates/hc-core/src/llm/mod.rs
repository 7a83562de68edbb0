//! LLM integration
//!
//! Thin chat-completions client plus the context-aware smart reply used
//! for free-text questions the scripted flow cannot answer.

mod client;
mod types;

pub use client::ChatClient;
pub use types::{ChatCompletionRequest, ChatCompletionResponse, ChatMessage, Usage};

use tracing::debug;

use crate::catalog::{DEFAULT_SEARCH_THRESHOLD, ServiceCatalog};
use crate::Result;

const SYSTEM_PROMPT: &str =
    "You are a helpful healthcare assistant. Provide concise, accurate, and empathetic \
     responses.";

const MAX_REPLY_TOKENS: u64 = 150;

/// Generates an assistant reply with service-catalog context injected
#[derive(Debug, Clone)]
pub struct SmartReply {
    client: ChatClient,
}

impl SmartReply {
    pub fn new(client: ChatClient) -> Self {
        Self { client }
    }

    /// Answer a free-text question, grounding the model with the names of
    /// any catalog services matching the message.
    pub async fn reply(&self, catalog: &ServiceCatalog, message: &str) -> Result<String> {
        let mut messages = vec![ChatMessage::system(SYSTEM_PROMPT)];

        let hits = catalog.search(message, DEFAULT_SEARCH_THRESHOLD);
        if !hits.is_empty() {
            let names: Vec<&str> = hits
                .tests
                .iter()
                .chain(&hits.packages)
                .chain(&hits.iv_therapies)
                .map(|hit| hit.record.name.as_str())
                .collect();
            debug!("Smart reply context: {} matching services", names.len());
            messages.push(ChatMessage::system(format!(
                "Context: Relevant Services: {}",
                names.join(", ")
            )));
        }

        messages.push(ChatMessage::user(message));

        let request = ChatCompletionRequest {
            model: self.client.model().to_string(),
            messages,
            max_tokens: Some(MAX_REPLY_TOKENS),
            temperature: Some(0.7),
        };

        let response = self.client.chat(request).await?;

        response
            .first_text()
            .map(|text| text.trim().to_string())
            .ok_or_else(|| crate::Error::Llm("Empty chat completion response".to_string()))
    }
}
