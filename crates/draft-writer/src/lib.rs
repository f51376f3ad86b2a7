//! Drafts a video description and candidate titles with an OpenAI-compatible
//! chat-completions endpoint.

mod error;
pub mod prompts;

pub use error::GenerationError;
pub use prompts::{Prompt, compact_transcript, format_title_list};

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

/// Default endpoint, overridable with `OPENAI_API_ADDRESS`
pub const DEFAULT_OPENAI_API_ADDRESS: &str = "https://api.openai.com";

pub const DEFAULT_MODEL: &str = "gpt-4o-2024-05-13";

/// Sampling temperature for both drafting calls
pub const TEMPERATURE: f32 = 0.2;

pub const TOP_P: f32 = 1.0;

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: [ChatMessage<'a>; 2],
    temperature: f32,
    top_p: f32,
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ResponseMessage,
}

#[derive(Debug, Deserialize)]
struct ResponseMessage {
    content: Option<String>,
}

/// Chat-completions client with a fixed, near-deterministic sampling setup
#[derive(Debug, Clone)]
pub struct DraftWriter {
    http: reqwest::Client,
    base_url: String,
    api_key: String,
    model: String,
}

impl DraftWriter {
    pub fn new(base_url: impl Into<String>, api_key: impl Into<String>) -> Self {
        Self::with_http_client(reqwest::Client::new(), base_url, api_key)
    }

    pub fn with_http_client(
        http: reqwest::Client,
        base_url: impl Into<String>,
        api_key: impl Into<String>,
    ) -> Self {
        Self {
            http,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_key: api_key.into(),
            model: DEFAULT_MODEL.to_string(),
        }
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    /// Draft a description from a transcript, following the layout of `exemplar`
    pub async fn draft_description(
        &self,
        transcript: &str,
        exemplar: &str,
    ) -> Result<String, GenerationError> {
        info!(transcript_chars = transcript.chars().count(), "Drafting description");
        self.complete(&prompts::description_prompt(transcript, exemplar))
            .await
    }

    /// Suggest titles for a video described by `description`, in the style of `past_titles`
    pub async fn draft_titles(
        &self,
        description: &str,
        past_titles: &[String],
    ) -> Result<String, GenerationError> {
        info!(past_titles = past_titles.len(), "Drafting titles");
        self.complete(&prompts::titles_prompt(description, past_titles))
            .await
    }

    async fn complete(&self, prompt: &Prompt) -> Result<String, GenerationError> {
        let request = ChatRequest {
            model: &self.model,
            messages: [
                ChatMessage {
                    role: "system",
                    content: &prompt.system,
                },
                ChatMessage {
                    role: "user",
                    content: &prompt.user,
                },
            ],
            temperature: TEMPERATURE,
            top_p: TOP_P,
        };

        let response = self
            .http
            .post(format!("{}/v1/chat/completions", self.base_url))
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            return Err(GenerationError::Status { status, body });
        }

        let completion: ChatResponse = response.json().await?;
        let text = completion
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .ok_or(GenerationError::EmptyResponse)?;

        debug!(chars = text.chars().count(), "Completion received");
        Ok(text)
    }
}
