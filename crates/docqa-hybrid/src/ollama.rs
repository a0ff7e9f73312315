//! Blocking client for an Ollama chat endpoint.

use std::time::Duration;

use reqwest::blocking::Client;
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::debug;

use docqa_core::config::GeneratorSettings;
use docqa_core::error::{Error, Result};
use docqa_core::traits::LabelGenerator;

pub struct OllamaGenerator {
    client: Client,
    base_url: String,
    model: String,
}

#[derive(Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Deserialize)]
struct ChatResponse {
    message: ChatReply,
}

#[derive(Deserialize)]
struct ChatReply {
    content: String,
}

impl OllamaGenerator {
    pub fn new(settings: &GeneratorSettings) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(settings.timeout_secs))
            .build()
            .map_err(|e| Error::InvalidConfig(format!("cannot build HTTP client: {e}")))?;
        Ok(Self {
            client,
            base_url: settings.base_url.trim_end_matches('/').to_string(),
            model: settings.model.clone(),
        })
    }

    fn map_transport(&self, e: reqwest::Error) -> Error {
        if e.is_timeout() {
            Error::Timeout(format!("{} at {}", self.model, self.base_url))
        } else if e.is_decode() {
            Error::Operation(format!("unexpected reply from {}: {e}", self.model))
        } else {
            Error::ModelUnavailable(format!("{} at {}: {e}", self.model, self.base_url))
        }
    }
}

impl LabelGenerator for OllamaGenerator {
    fn complete(&self, system_prompt: &str, user_prompt: &str) -> Result<String> {
        let url = format!("{}/api/chat", self.base_url);
        let body = json!({
            "model": self.model,
            "messages": [
                ChatMessage { role: "system", content: system_prompt },
                ChatMessage { role: "user", content: user_prompt },
            ],
            "stream": false,
            "options": { "temperature": 0 },
        });
        let response = self.client.post(&url).json(&body).send().map_err(|e| self.map_transport(e))?;
        let status = response.status();
        if !status.is_success() {
            let text = response.text().unwrap_or_default();
            return Err(Error::ModelUnavailable(format!("{} returned {status}: {text}", self.model)));
        }
        let reply: ChatResponse = response.json().map_err(|e| self.map_transport(e))?;
        debug!(model = %self.model, chars = reply.message.content.len(), "generator replied");
        Ok(reply.message.content)
    }
}
