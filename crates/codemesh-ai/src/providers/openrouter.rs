//! OpenRouter-backed `SummaryBridge`, using the OpenAI-compatible chat
//! completion wire format.

use crate::error::AiError;
use crate::summarize::{CodebaseFact, SummaryBridge, SummaryContext};
use serde::{Deserialize, Serialize};

const OPENROUTER_URL: &str = "https://openrouter.ai/api/v1/chat/completions";

pub struct OpenRouterProvider {
    client: reqwest::Client,
    api_key: String,
    model: String,
}

impl OpenRouterProvider {
    pub fn new(api_key: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            api_key: api_key.into(),
            model: model.into(),
        }
    }

    /// Reads `OPENROUTER_API_KEY`/`OPENROUTER_MODEL` from the environment,
    /// defaulting to a low-cost model. Returns `None` when no key is set,
    /// so callers fall back to `TemplateSummary` per the
    /// "missing embedder → stage skipped, not failure" pattern.
    pub fn from_env() -> Option<Self> {
        let api_key = std::env::var("OPENROUTER_API_KEY").ok()?;
        let model = std::env::var("OPENROUTER_MODEL")
            .unwrap_or_else(|_| "anthropic/claude-3-haiku-20240307".to_string());
        Some(Self::new(api_key, model))
    }

    async fn chat_completion(
        &self,
        system: &str,
        user: String,
        temperature: f32,
        max_tokens: u32,
    ) -> Result<String, AiError> {
        let request = ChatRequest {
            model: self.model.clone(),
            messages: vec![
                ChatMessage {
                    role: "system".to_string(),
                    content: system.to_string(),
                },
                ChatMessage {
                    role: "user".to_string(),
                    content: user,
                },
            ],
            temperature,
            max_tokens,
        };

        let response = self
            .client
            .post(OPENROUTER_URL)
            .header("Authorization", format!("Bearer {}", self.api_key))
            .header("HTTP-Referer", "https://codemesh.dev")
            .header("X-Title", "codemesh")
            .json(&request)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(AiError::BadResponse(format!(
                "openrouter returned {status}: {body}"
            )));
        }

        let parsed: ChatResponse = response.json().await?;
        let content = parsed
            .choices
            .into_iter()
            .next()
            .map(|c| c.message.content)
            .ok_or_else(|| AiError::BadResponse("no choices in openrouter response".to_string()))?;
        Ok(content.trim().to_string())
    }
}

#[derive(Debug, Serialize)]
struct ChatRequest {
    model: String,
    messages: Vec<ChatMessage>,
    temperature: f32,
    max_tokens: u32,
}

#[derive(Debug, Serialize, Deserialize)]
struct ChatMessage {
    role: String,
    content: String,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatMessage,
}

#[async_trait::async_trait]
impl SummaryBridge for OpenRouterProvider {
    async fn summarize_symbol(&self, context: &SummaryContext) -> Result<String, AiError> {
        let prompt = format!(
            r#"Summarize this code element in 1-2 sentences.

Name: {}
Kind: {}
Language: {}
File: {}
Signature: {}
Existing doc comment: {}
Called by: {}
Calls/references: {}
"#,
            context.qualified_name,
            context.kind,
            context.language,
            context.file_path,
            context.signature.as_deref().unwrap_or("(none)"),
            context.doc.as_deref().unwrap_or("(none)"),
            context.incoming.join(", "),
            context.outgoing.join(", "),
        );

        self.chat_completion(
            "You are a code documentation expert. Provide concise, clear summaries.",
            prompt,
            0.3,
            150,
        )
        .await
    }

    async fn answer_question(
        &self,
        question: &str,
        facts: &[CodebaseFact],
    ) -> Result<String, AiError> {
        let facts_block = facts
            .iter()
            .map(|f| format!("- {}", f.description))
            .collect::<Vec<_>>()
            .join("\n");

        let prompt = format!(
            r#"Question: {question}

Relevant facts gathered from the code index:
{facts_block}

Answer clearly and concisely using only the facts above. If they are insufficient, say what else would be needed."#
        );

        self.chat_completion(
            "You are a codebase assistant. Answer questions using only the provided facts.",
            prompt,
            0.2,
            1000,
        )
        .await
    }

    fn name(&self) -> &str {
        "openrouter"
    }
}
