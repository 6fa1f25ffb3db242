//! Groq chat-completion client (OpenAI-compatible API)

use async_trait::async_trait;
use reqwest_middleware::ClientWithMiddleware;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use super::{NarrativeAnalyzer, SYSTEM_PROMPT, parse_assessment, user_prompt};
use crate::Result;
use crate::client::{build_http_client, ensure_success};
use crate::config::NarrativeConfig;
use crate::error::CitySenseError;
use crate::models::NarrativeAssessment;

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    temperature: f32,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatReply,
}

#[derive(Debug, Deserialize)]
struct ChatReply {
    #[serde(default)]
    content: Option<String>,
}

/// Content of the first choice of a chat-completion response
pub fn first_choice_content(body: &str) -> Result<String> {
    let response: ChatResponse = serde_json::from_str(body)
        .map_err(|e| CitySenseError::api(format!("Invalid chat completion response: {e}")))?;

    response
        .choices
        .into_iter()
        .next()
        .and_then(|choice| choice.message.content)
        .ok_or_else(|| CitySenseError::api("Chat completion returned no content"))
}

pub struct GroqAnalyzer {
    client: ClientWithMiddleware,
    base_url: String,
    model: String,
    api_key: Option<String>,
    temperature: f32,
}

impl GroqAnalyzer {
    pub fn new(config: &NarrativeConfig) -> Result<Self> {
        let client = build_http_client(config.timeout_seconds, config.max_retries, None)?;
        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            model: config.model.clone(),
            api_key: config.api_key.clone(),
            temperature: config.temperature,
        })
    }

    fn completions_url(&self) -> String {
        format!("{}/chat/completions", self.base_url)
    }
}

#[async_trait]
impl NarrativeAnalyzer for GroqAnalyzer {
    #[tracing::instrument(name = "narrative_analysis", level = "debug", skip(self))]
    async fn analyze(
        &self,
        address: &str,
        latitude: f64,
        longitude: f64,
    ) -> Result<NarrativeAssessment> {
        let api_key = self.api_key.as_deref().ok_or_else(|| {
            CitySenseError::config(
                "Narrative API key is not configured (CITYSENSE_NARRATIVE__API_KEY)",
            )
        })?;

        let prompt = user_prompt(address, latitude, longitude);
        let request = ChatRequest {
            model: &self.model,
            messages: vec![
                ChatMessage {
                    role: "system",
                    content: SYSTEM_PROMPT,
                },
                ChatMessage {
                    role: "user",
                    content: &prompt,
                },
            ],
            temperature: self.temperature,
        };

        let response = self
            .client
            .post(self.completions_url())
            .bearer_auth(api_key)
            .json(&request)
            .send()
            .await?;
        let response = ensure_success(response, "Groq").await?;
        let body = response.text().await?;

        let reply = first_choice_content(&body)?;
        match parse_assessment(&reply) {
            Ok(assessment) => {
                info!("Successfully analyzed location: {address}");
                Ok(assessment)
            }
            Err(e) => {
                warn!("Error analyzing location {address}: {e}");
                Err(e)
            }
        }
    }
}
