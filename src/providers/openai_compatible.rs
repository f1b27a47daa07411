use async_trait::async_trait;
use reqwest::Client;
use serde_json::{json, Value};
use tracing::{debug, error, info};
use zeroize::Zeroize;

use super::{build_http_client, validate_base_url, ProviderError, HTTP_TIMEOUT};
use crate::traits::{ModelProvider, ProviderResponse, TokenUsage};
use crate::utils::truncate_str;

pub struct OpenAiCompatibleProvider {
    client: Client,
    base_url: String,
    api_key: String,
}

impl Drop for OpenAiCompatibleProvider {
    fn drop(&mut self) {
        self.api_key.zeroize();
    }
}

impl OpenAiCompatibleProvider {
    pub fn new(base_url: &str, api_key: &str) -> Result<Self, String> {
        validate_base_url(base_url)?;

        let client = build_http_client(HTTP_TIMEOUT)?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key: api_key.to_string(),
        })
    }
}

/// Pull the first choice's text and the usage block out of a chat-completions body.
fn parse_completion(model: &str, data: &Value) -> anyhow::Result<ProviderResponse> {
    let choice = data["choices"]
        .get(0)
        .ok_or_else(|| anyhow::anyhow!("No choices in response"))?;

    let content = choice["message"]["content"]
        .as_str()
        .map(|s| s.to_string());

    let usage = data.get("usage").and_then(|u| {
        Some(TokenUsage {
            input_tokens: u.get("prompt_tokens")?.as_u64()? as u32,
            output_tokens: u.get("completion_tokens")?.as_u64()? as u32,
            model: model.to_string(),
        })
    });

    Ok(ProviderResponse { content, usage })
}

#[async_trait]
impl ModelProvider for OpenAiCompatibleProvider {
    async fn chat(&self, model: &str, messages: &[Value]) -> anyhow::Result<ProviderResponse> {
        let body = json!({
            "model": model,
            "messages": messages,
        });

        let url = format!("{}/chat/completions", self.base_url);
        info!(model, url = %url, "Calling LLM API");

        let resp = match self
            .client
            .post(&url)
            .header("Authorization", format!("Bearer {}", self.api_key))
            .json(&body)
            .send()
            .await
        {
            Ok(r) => r,
            Err(e) => {
                error!("HTTP request failed: {}", e);
                return Err(ProviderError::network(&e).into());
            }
        };

        let status = resp.status();
        let text = resp.text().await?;

        if !status.is_success() {
            error!(status = %status, "Provider API error: {}", text);
            return Err(ProviderError::from_status(status.as_u16(), &text).into());
        }

        debug!("Provider response: {}", truncate_str(&text, 2000));

        let data: Value = serde_json::from_str(&text)?;
        parse_completion(model, &data)
    }
}
