use async_trait::async_trait;
use serde_json::{json, Value};
use tracing::info;

/// Sends an ordered list of chat messages to an LLM and gets back one completion.
#[async_trait]
pub trait ModelProvider: Send + Sync {
    async fn chat(&self, model: &str, messages: &[Value]) -> anyhow::Result<ProviderResponse>;
}

/// Token usage statistics from an LLM API response.
#[derive(Debug, Clone, Default)]
pub struct TokenUsage {
    pub input_tokens: u32,
    pub output_tokens: u32,
    pub model: String,
}

/// The LLM's response.
#[derive(Debug, Clone)]
pub struct ProviderResponse {
    pub content: Option<String>,
    pub usage: Option<TokenUsage>,
}

/// Run one system/user exchange and return the trimmed completion text.
///
/// A missing or blank completion is an error: callers never get an empty answer.
pub async fn complete(
    provider: &dyn ModelProvider,
    model: &str,
    system: &str,
    user: &str,
) -> anyhow::Result<String> {
    let messages = [
        json!({"role": "system", "content": system}),
        json!({"role": "user", "content": user}),
    ];
    let response = provider.chat(model, &messages).await?;

    if let Some(usage) = &response.usage {
        info!(
            model = %usage.model,
            input_tokens = usage.input_tokens,
            output_tokens = usage.output_tokens,
            "LLM token usage"
        );
    }

    let text = response
        .content
        .map(|c| c.trim().to_string())
        .unwrap_or_default();
    if text.is_empty() {
        anyhow::bail!("model returned no completion");
    }
    Ok(text)
}
