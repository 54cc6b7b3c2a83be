//! Oracle port: send a conversation to a chat endpoint and return its reply.
//!
//! The [`Oracle`] trait is the only view the build loop has of the remote
//! model. Tests use scripted oracles that replay canned replies.

use std::time::Duration;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument, warn};

use crate::core::conversation::Message;
use crate::core::endpoint::chat_completions_url;
use crate::error::ProtocolError;
use crate::io::config::BuildConfig;

/// Abstraction over reasoning backends.
pub trait Oracle {
    /// Return the single textual reply to `messages`.
    fn complete(&self, messages: &[Message]) -> Result<String>;
}

/// Oracle backed by an OpenAI-compatible `chat/completions` endpoint.
pub struct ChatCompletionsOracle {
    client: reqwest::blocking::Client,
    endpoint: String,
    api_key: String,
    model: String,
    temperature: f64,
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: &'a [Message],
    temperature: f64,
}

#[derive(Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<Choice>,
}

#[derive(Deserialize)]
struct Choice {
    message: Option<ChoiceMessage>,
}

#[derive(Deserialize)]
struct ChoiceMessage {
    content: Option<String>,
}

impl ChatCompletionsOracle {
    pub fn new(cfg: &BuildConfig) -> Result<Self> {
        let client = reqwest::blocking::Client::builder()
            .timeout(Duration::from_secs(cfg.request_timeout_secs))
            .build()
            .context("build http client")?;
        Ok(Self::with_client(
            client,
            &cfg.api_url,
            &cfg.api_key,
            &cfg.model,
            cfg.temperature,
        ))
    }

    pub fn with_client(
        client: reqwest::blocking::Client,
        api_url: &str,
        api_key: &str,
        model: &str,
        temperature: f64,
    ) -> Self {
        Self {
            client,
            endpoint: chat_completions_url(api_url),
            api_key: api_key.to_string(),
            model: model.to_string(),
            temperature,
        }
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

impl Oracle for ChatCompletionsOracle {
    #[instrument(skip_all, fields(model = %self.model, messages = messages.len()))]
    fn complete(&self, messages: &[Message]) -> Result<String> {
        let request = ChatRequest {
            model: &self.model,
            messages,
            temperature: self.temperature,
        };
        let response = self
            .client
            .post(&self.endpoint)
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()
            .with_context(|| format!("send chat request to {}", self.endpoint))?;

        let status = response.status();
        let body = response.text().context("read chat response body")?;
        debug!(status = status.as_u16(), bytes = body.len(), "chat response received");
        if !status.is_success() {
            warn!(status = status.as_u16(), "oracle returned an error status");
            return Err(ProtocolError::Status {
                status: status.as_u16(),
                body,
            }
            .into());
        }
        Ok(parse_reply(&body)?)
    }
}

/// Extract `choices[0].message.content` from a chat response body, trimmed.
pub fn parse_reply(body: &str) -> Result<String, ProtocolError> {
    let missing = || ProtocolError::MissingContent {
        body: body.to_string(),
    };
    let parsed: ChatResponse = serde_json::from_str(body).map_err(|_| missing())?;
    parsed
        .choices
        .into_iter()
        .next()
        .and_then(|choice| choice.message)
        .and_then(|message| message.content)
        .map(|content| content.trim().to_string())
        .filter(|content| !content.is_empty())
        .ok_or_else(missing)
}
